//! R2 upload operations (simple, multipart)

use super::types::{sdk_error, R2Store};
use crate::error::{StoreError, StoreResult};
use crate::storage::ObjectBody;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use log::{debug, info, warn};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt, SeekFrom};
use tokio::sync::Semaphore;

impl R2Store {
    /// Buffers go out as one PUT. Files are streamed from disk, and large
    /// ones are split into a multipart upload.
    pub(super) async fn upload_body(
        &self,
        key: &str,
        body: ObjectBody,
        content_type: &str,
    ) -> StoreResult<()> {
        match body {
            ObjectBody::Bytes(bytes) => {
                self.put_stream(key, ByteStream::from(bytes), content_type)
                    .await
            }
            ObjectBody::File { path, size } if size > 0 && size >= self.multipart.threshold => {
                self.upload_multipart(key, &path, size, content_type).await
            }
            ObjectBody::File { path, .. } => {
                let stream = ByteStream::from_path(&path)
                    .await
                    .map_err(|e| StoreError::transport("put_object", key, e))?;
                self.put_stream(key, stream, content_type).await
            }
        }
    }

    async fn put_stream(&self, key: &str, body: ByteStream, content_type: &str) -> StoreResult<()> {
        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body);

        if !content_type.is_empty() {
            request = request.content_type(content_type);
        }

        request
            .send()
            .await
            .map_err(|e| sdk_error("put_object", key, e))?;

        Ok(())
    }

    async fn upload_multipart(
        &self,
        key: &str,
        path: &Path,
        size: u64,
        content_type: &str,
    ) -> StoreResult<()> {
        let mut request = self
            .client
            .create_multipart_upload()
            .bucket(&self.bucket)
            .key(key);

        if !content_type.is_empty() {
            request = request.content_type(content_type);
        }

        let response = request
            .send()
            .await
            .map_err(|e| sdk_error("create_multipart_upload", key, e))?;
        let upload_id = response
            .upload_id()
            .ok_or_else(|| {
                StoreError::transport("create_multipart_upload", key, "no upload id returned")
            })?
            .to_string();

        let part_size = self.multipart.part_size.max(1);
        let total_parts = size.div_ceil(part_size);
        info!(
            "upload_multipart_start: {} size={} parts={}",
            key, size, total_parts
        );

        match self
            .upload_parts(key, &upload_id, path, size, part_size)
            .await
        {
            Ok(parts) => {
                self.complete_multipart(key, &upload_id, parts).await?;
                info!("upload_multipart_done: {}", key);
                Ok(())
            }
            Err(e) => {
                // If any part failed, abort the upload
                if let Err(abort_err) = self
                    .client
                    .abort_multipart_upload()
                    .bucket(&self.bucket)
                    .key(key)
                    .upload_id(&upload_id)
                    .send()
                    .await
                {
                    warn!("upload_multipart_abort_failed: {} {}", key, abort_err);
                }
                Err(e)
            }
        }
    }

    /// Upload every part, at most `concurrency` at once. Once a part fails
    /// no further parts are started.
    async fn upload_parts(
        &self,
        key: &str,
        upload_id: &str,
        path: &Path,
        size: u64,
        part_size: u64,
    ) -> StoreResult<Vec<CompletedPart>> {
        let semaphore = Arc::new(Semaphore::new(self.multipart.concurrency.max(1)));
        let failed = Arc::new(AtomicBool::new(false));
        let total_parts = size.div_ceil(part_size);
        let mut handles = Vec::with_capacity(total_parts as usize);

        for part_number in 1..=total_parts {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| StoreError::transport("upload_part", key, e))?;
            if failed.load(Ordering::SeqCst) {
                break;
            }

            let store = self.clone();
            let key = key.to_string();
            let upload_id = upload_id.to_string();
            let path = path.to_path_buf();
            let failed = failed.clone();

            handles.push(tokio::spawn(async move {
                let _permit = permit;
                let start = (part_number - 1) * part_size;
                let len = part_size.min(size - start);

                let result = store
                    .upload_part(&key, &upload_id, &path, part_number as i32, start, len)
                    .await;
                if result.is_err() {
                    failed.store(true, Ordering::SeqCst);
                }
                result
            }));
        }

        let mut parts = Vec::with_capacity(handles.len());
        let mut first_error = None;
        for handle in handles {
            match handle.await {
                Ok(Ok(part)) => parts.push(part),
                Ok(Err(e)) => {
                    first_error.get_or_insert(e);
                }
                Err(e) => {
                    first_error.get_or_insert(StoreError::transport("upload_part", key, e));
                }
            }
        }

        if let Some(e) = first_error {
            return Err(e);
        }

        // Sort parts by part number (required by S3/R2)
        parts.sort_by_key(|part| part.part_number());
        Ok(parts)
    }

    async fn upload_part(
        &self,
        key: &str,
        upload_id: &str,
        path: &Path,
        part_number: i32,
        start: u64,
        len: u64,
    ) -> StoreResult<CompletedPart> {
        let data = read_range(path, start, len)
            .await
            .map_err(|e| StoreError::transport("upload_part", key, e))?;

        let response = self
            .client
            .upload_part()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(upload_id)
            .part_number(part_number)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| sdk_error("upload_part", key, e))?;
        debug!("upload_part_done: {} part={} size={}", key, part_number, len);

        Ok(CompletedPart::builder()
            .part_number(part_number)
            .e_tag(response.e_tag().unwrap_or_default())
            .build())
    }

    async fn complete_multipart(
        &self,
        key: &str,
        upload_id: &str,
        parts: Vec<CompletedPart>,
    ) -> StoreResult<()> {
        let completed_upload = CompletedMultipartUpload::builder()
            .set_parts(Some(parts))
            .build();

        self.client
            .complete_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(upload_id)
            .multipart_upload(completed_upload)
            .send()
            .await
            .map_err(|e| sdk_error("complete_multipart_upload", key, e))?;

        Ok(())
    }
}

async fn read_range(path: &Path, start: u64, len: u64) -> std::io::Result<Vec<u8>> {
    let mut file = File::open(path).await?;
    file.seek(SeekFrom::Start(start)).await?;

    let mut buffer = vec![0u8; len as usize];
    file.read_exact(&mut buffer).await?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::R2Config;
    use crate::r2::MultipartSettings;
    use crate::storage::ObjectStore;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn store_for(server: &MockServer) -> R2Store {
        R2Store::from_config(&R2Config {
            account_id: "acc".to_string(),
            bucket: "media".to_string(),
            access_key_id: "key".to_string(),
            secret_access_key: "secret".to_string(),
            endpoint_url: Some(server.uri()),
            region: Some("us-east-1".to_string()),
        })
        .unwrap()
        .with_multipart(MultipartSettings {
            threshold: 20,
            part_size: 10,
            concurrency: 2,
        })
    }

    const INITIATED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<InitiateMultipartUploadResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/">
  <Bucket>media</Bucket>
  <Key>videos/big.bin</Key>
  <UploadId>upload-1</UploadId>
</InitiateMultipartUploadResult>"#;

    const COMPLETED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<CompleteMultipartUploadResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/">
  <Location>http://localhost/media/videos/big.bin</Location>
  <Bucket>media</Bucket>
  <Key>videos/big.bin</Key>
  <ETag>"final"</ETag>
</CompleteMultipartUploadResult>"#;

    fn write_file(dir: &tempfile::TempDir, name: &str, len: usize) -> ObjectBody {
        let path = dir.path().join(name);
        std::fs::write(&path, vec![7u8; len]).unwrap();
        ObjectBody::File {
            path,
            size: len as u64,
        }
    }

    #[test]
    fn default_multipart_settings() {
        let settings = MultipartSettings::default();
        assert_eq!(settings.threshold, 100 * 1024 * 1024);
        assert_eq!(settings.part_size, 20 * 1024 * 1024);
        assert_eq!(settings.concurrency, 6);
    }

    #[tokio::test]
    async fn small_file_is_a_single_put() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/media/docs/small.txt"))
            .respond_with(ResponseTemplate::new(200).insert_header("ETag", "\"small\""))
            .expect(1)
            .mount(&server)
            .await;

        let tmp = tempfile::tempdir().unwrap();
        let body = write_file(&tmp, "small.txt", 5);
        store_for(&server)
            .put_object("docs/small.txt", body, "text/plain")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn large_file_is_uploaded_in_parts() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/media/videos/big.bin"))
            .and(query_param("uploadId", "upload-1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/xml")
                    .set_body_string(COMPLETED),
            )
            .with_priority(1)
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/media/videos/big.bin"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/xml")
                    .set_body_string(INITIATED),
            )
            .with_priority(2)
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("PUT"))
            .and(path("/media/videos/big.bin"))
            .and(query_param("uploadId", "upload-1"))
            .respond_with(ResponseTemplate::new(200).insert_header("ETag", "\"part\""))
            .expect(3)
            .mount(&server)
            .await;

        let tmp = tempfile::tempdir().unwrap();
        let body = write_file(&tmp, "big.bin", 25);
        store_for(&server)
            .put_object("videos/big.bin", body, "application/octet-stream")
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        let mut part_numbers: Vec<String> = requests
            .iter()
            .filter(|r| r.method.as_str() == "PUT")
            .filter_map(|r| {
                r.url
                    .query_pairs()
                    .find(|(k, _)| k == "partNumber")
                    .map(|(_, v)| v.into_owned())
            })
            .collect();
        part_numbers.sort();
        assert_eq!(part_numbers, vec!["1", "2", "3"]);
    }

    #[tokio::test]
    async fn failed_part_aborts_the_upload() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/media/videos/big.bin"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/xml")
                    .set_body_string(INITIATED),
            )
            .mount(&server)
            .await;

        Mock::given(method("PUT"))
            .and(path("/media/videos/big.bin"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        Mock::given(method("DELETE"))
            .and(path("/media/videos/big.bin"))
            .and(query_param("uploadId", "upload-1"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let tmp = tempfile::tempdir().unwrap();
        let body = write_file(&tmp, "big.bin", 25);
        let err = store_for(&server)
            .put_object("videos/big.bin", body, "application/octet-stream")
            .await
            .unwrap_err();
        assert!(!err.is_not_found());
    }
}
