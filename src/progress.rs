//! Upload progress accounting

use serde::Serialize;

/// Progress event payload for a directory upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadProgress {
    pub total: usize,
    pub completed: usize,
    pub current_file: String,
    pub percent: u32,
}

impl UploadProgress {
    pub fn new(total: usize, completed: usize, current_file: impl Into<String>) -> Self {
        UploadProgress {
            total,
            completed,
            current_file: current_file.into(),
            percent: percent_complete(completed, total),
        }
    }
}

/// floor(completed * 100 / total); 0 for an empty upload.
pub fn percent_complete(completed: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((completed.min(total) as u64 * 100) / total as u64) as u32
}

pub type ProgressCallback = Box<dyn Fn(UploadProgress) + Send + Sync>;

/// Counter shared by one upload run. Never goes backwards.
pub(crate) struct ProgressTracker {
    total: usize,
    completed: usize,
    callback: Option<ProgressCallback>,
}

impl ProgressTracker {
    pub(crate) fn new(total: usize, callback: Option<ProgressCallback>) -> Self {
        ProgressTracker {
            total,
            completed: 0,
            callback,
        }
    }

    pub(crate) fn start(&self) {
        self.emit(String::new());
    }

    pub(crate) fn file_done(&mut self, file_name: &str) {
        if self.completed < self.total {
            self.completed += 1;
        }
        self.emit(file_name.to_string());
    }

    #[cfg(test)]
    pub(crate) fn completed(&self) -> usize {
        self.completed
    }

    fn emit(&self, current_file: String) {
        if let Some(ref cb) = self.callback {
            cb(UploadProgress::new(self.total, self.completed, current_file));
        }
    }
}
