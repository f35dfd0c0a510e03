/// HTTP(S), S3 and Azure Blob access over a blocking reqwest client.
///
/// S3 objects are addressed with path-style URLs on `S3_ENDPOINT` and are
/// not signed, which covers public buckets, MinIO and presigned gateways.
/// Azure blobs are addressed on `{account}.blob.core.windows.net` with the
/// SAS token, if any, appended as the query string.

use reqwest::blocking::Client;
use tracing::debug;

use super::{HTTP_TIMEOUT, StorageSettings};
use crate::error::SourceError;

pub struct HttpBackend {
    client: Client,
    s3_endpoint: String,
    azure_account: Option<String>,
    azure_sas_token: Option<String>,
}

impl HttpBackend {
    pub fn new(settings: &StorageSettings) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(SourceError::Client)?;

        Ok(Self {
            client,
            s3_endpoint: settings.s3_endpoint.trim_end_matches('/').to_string(),
            azure_account: settings.azure_account.clone(),
            azure_sas_token: settings.azure_sas_token.clone(),
        })
    }

    /// Path-style object URL: `{endpoint}/{bucket}/{key}`.
    pub fn s3_url(&self, bucket: &str, key: &str) -> String {
        format!("{}/{}/{}", self.s3_endpoint, bucket, encode_path(key))
    }

    pub fn azure_url(&self, container: &str, blob: &str) -> Result<String, SourceError> {
        let account = self.azure_account.as_deref().ok_or(SourceError::AzureNotConfigured)?;
        let mut url = format!("https://{}.blob.core.windows.net/{}/{}", account, container, encode_path(blob));
        if let Some(sas) = self.azure_sas_token.as_deref() {
            url.push('?');
            url.push_str(sas.trim_start_matches('?'));
        }
        Ok(url)
    }

    pub fn get(&self, url: &str, locator: &str) -> Result<Vec<u8>, SourceError> {
        debug!(locator, "GET");
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|source| SourceError::Request { locator: locator.to_string(), source })?;

        if !response.status().is_success() {
            return Err(SourceError::Http { locator: locator.to_string(), status: response.status().as_u16() });
        }

        let body = response
            .bytes()
            .map_err(|source| SourceError::Request { locator: locator.to_string(), source })?;
        Ok(body.to_vec())
    }

    /// Uploads `bytes`; `block_blob` adds the header Azure requires on PUT.
    pub fn put(&self, url: &str, bytes: &[u8], locator: &str, block_blob: bool) -> Result<(), SourceError> {
        debug!(locator, bytes = bytes.len(), "PUT");
        let mut request = self
            .client
            .put(url)
            .header("Content-Type", "application/json")
            .body(bytes.to_vec());
        if block_blob {
            request = request.header("x-ms-blob-type", "BlockBlob");
        }

        let response = request
            .send()
            .map_err(|source| SourceError::Request { locator: locator.to_string(), source })?;

        if !response.status().is_success() {
            return Err(SourceError::Http { locator: locator.to_string(), status: response.status().as_u16() });
        }
        Ok(())
    }
}

/// Percent-encodes each path segment, keeping the slashes.
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
