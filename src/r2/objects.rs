//! R2 object operations (copy, delete)

use super::types::{sdk_error, R2Store};
use crate::error::StoreResult;

/// Encode a key for the copy-source header - each segment individually, `/` kept
fn encode_uri_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

impl R2Store {
    pub(super) async fn delete(&self, key: &str) -> StoreResult<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| sdk_error("delete_object", key, e))?;
        Ok(())
    }

    /// Server-side copy within the bucket
    pub(super) async fn copy(&self, source_key: &str, dest_key: &str) -> StoreResult<()> {
        let copy_source = format!("{}/{}", self.bucket, encode_uri_path(source_key));

        self.client
            .copy_object()
            .bucket(&self.bucket)
            .copy_source(copy_source)
            .key(dest_key)
            .send()
            .await
            .map_err(|e| sdk_error("copy_object", source_key, e))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::encode_uri_path;
    use crate::config::R2Config;
    use crate::error::StoreError;
    use crate::r2::R2Store;
    use crate::storage::ObjectStore;
    use wiremock::matchers::{method, path};
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
    }

    #[test]
    fn copy_source_keeps_separators() {
        assert_eq!(encode_uri_path("docs/my file.txt"), "docs/my%20file.txt");
        assert_eq!(encode_uri_path("a/b+c/d"), "a/b%2Bc/d");
    }

    #[tokio::test]
    async fn delete_sends_request_for_key() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/media/docs/x.txt"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        store_for(&server).delete_object("docs/x.txt").await.unwrap();
    }

    #[tokio::test]
    async fn copy_of_missing_source_maps_to_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/media/archive/x.txt"))
            .respond_with(
                ResponseTemplate::new(404)
                    .insert_header("content-type", "application/xml")
                    .set_body_string(
                        r#"<?xml version="1.0" encoding="UTF-8"?>
<Error><Code>NoSuchKey</Code><Message>The specified key does not exist.</Message></Error>"#,
                    ),
            )
            .mount(&server)
            .await;

        let err = store_for(&server)
            .copy_object("docs/x.txt", "archive/x.txt")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(ref key) if key == "docs/x.txt"));
    }
}
