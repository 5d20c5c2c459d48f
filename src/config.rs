//! Bucket credentials and upload tuning

use crate::error::{DriveError, DriveResult};
use serde::{Deserialize, Serialize};

pub const ENV_ACCOUNT_ID: &str = "R2_ACCOUNT_ID";
pub const ENV_ACCESS_KEY_ID: &str = "R2_ACCESS_KEY_ID";
pub const ENV_SECRET_ACCESS_KEY: &str = "R2_SECRET_ACCESS_KEY";
pub const ENV_BUCKET_NAME: &str = "R2_BUCKET_NAME";
pub const ENV_ENDPOINT_URL: &str = "R2_ENDPOINT_URL";
pub const ENV_REGION: &str = "R2_REGION";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct R2Config {
    pub account_id: String,
    pub bucket: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    /// Overrides the Cloudflare endpoint, for MinIO and other S3-compatible stores.
    #[serde(default)]
    pub endpoint_url: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
}

impl R2Config {
    /// Load credentials from `R2_*` environment variables.
    pub fn from_env() -> DriveResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> DriveResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or(DriveError::ConfigMissing(name))
        };

        // Checked in this order so the first missing name is reported
        let access_key_id = required(ENV_ACCESS_KEY_ID)?;
        let secret_access_key = required(ENV_SECRET_ACCESS_KEY)?;
        let account_id = required(ENV_ACCOUNT_ID)?;
        let bucket = required(ENV_BUCKET_NAME)?;

        Ok(R2Config {
            account_id,
            bucket,
            access_key_id,
            secret_access_key,
            endpoint_url: lookup(ENV_ENDPOINT_URL).filter(|v| !v.is_empty()),
            region: lookup(ENV_REGION).filter(|v| !v.is_empty()),
        })
    }

    /// Refuse configs with blank credentials before any request is built.
    pub fn validate(&self) -> DriveResult<()> {
        if self.access_key_id.trim().is_empty() {
            return Err(DriveError::ConfigMissing(ENV_ACCESS_KEY_ID));
        }
        if self.secret_access_key.trim().is_empty() {
            return Err(DriveError::ConfigMissing(ENV_SECRET_ACCESS_KEY));
        }
        // A custom endpoint does not need the Cloudflare account id
        if self.endpoint_url.is_none() && self.account_id.trim().is_empty() {
            return Err(DriveError::ConfigMissing(ENV_ACCOUNT_ID));
        }
        if self.bucket.trim().is_empty() {
            return Err(DriveError::ConfigMissing(ENV_BUCKET_NAME));
        }
        Ok(())
    }

    pub fn endpoint(&self) -> String {
        match &self.endpoint_url {
            Some(url) => url.clone(),
            None => format!("https://{}.r2.cloudflarestorage.com", self.account_id),
        }
    }

    pub fn region_name(&self) -> &str {
        self.region.as_deref().unwrap_or("auto")
    }
}

/// Tuning for directory uploads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadOptions {
    /// Number of files uploaded at once. 1 keeps uploads strictly sequential.
    pub concurrency: usize,
}

impl Default for UploadOptions {
    fn default() -> Self {
        UploadOptions { concurrency: 1 }
    }
}

impl UploadOptions {
    pub fn with_concurrency(concurrency: usize) -> Self {
        UploadOptions {
            concurrency: concurrency.max(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn loads_all_required_variables() {
        let config = R2Config::from_lookup(lookup_from(&[
            ("R2_ACCOUNT_ID", "acc"),
            ("R2_ACCESS_KEY_ID", "key"),
            ("R2_SECRET_ACCESS_KEY", "secret"),
            ("R2_BUCKET_NAME", "media"),
        ]))
        .unwrap();

        assert_eq!(config.bucket, "media");
        assert_eq!(config.endpoint(), "https://acc.r2.cloudflarestorage.com");
        assert_eq!(config.region_name(), "auto");
    }

    #[test]
    fn missing_variable_is_reported_by_name() {
        let err = R2Config::from_lookup(lookup_from(&[
            ("R2_ACCOUNT_ID", "acc"),
            ("R2_ACCESS_KEY_ID", "key"),
            ("R2_SECRET_ACCESS_KEY", "  "),
            ("R2_BUCKET_NAME", "media"),
        ]))
        .unwrap_err();

        assert!(matches!(err, DriveError::ConfigMissing("R2_SECRET_ACCESS_KEY")));
    }

    #[test]
    fn custom_endpoint_skips_account_id_check() {
        let config = R2Config {
            account_id: String::new(),
            bucket: "b".to_string(),
            access_key_id: "k".to_string(),
            secret_access_key: "s".to_string(),
            endpoint_url: Some("http://127.0.0.1:9000".to_string()),
            region: Some("us-east-1".to_string()),
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.endpoint(), "http://127.0.0.1:9000");
    }

    #[test]
    fn upload_concurrency_is_at_least_one() {
        assert_eq!(UploadOptions::with_concurrency(0).concurrency, 1);
        assert_eq!(UploadOptions::default().concurrency, 1);
    }
}
