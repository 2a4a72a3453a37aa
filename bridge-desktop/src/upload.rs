//! Upload Transport Implementation using Reqwest

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    upload::{FilePayload, UploadTransport},
};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Form field every file part is attached under
pub const DEFAULT_FILE_FIELD: &str = "files";

/// Reqwest-based upload transport
///
/// Sends the whole batch as one `multipart/form-data` POST, one part per file
/// in submission order, and returns the JSON body as-is. No request timeout is
/// set; uploads of large galleries are allowed to take as long as they take.
pub struct ReqwestUploadTransport {
    client: Client,
    endpoint: String,
    field_name: String,
    bearer_token: Option<String>,
}

impl ReqwestUploadTransport {
    /// Create a transport posting to `endpoint`
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built (for
    /// example when no TLS backend is available).
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .user_agent("tripmate-core/0.1.0")
            .build()
            .map_err(|e| BridgeError::OperationFailed(format!("HTTP client: {}", e)))?;

        Ok(Self::with_client(client, endpoint))
    }

    /// Create a transport on top of an existing client
    pub fn with_client(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            field_name: DEFAULT_FILE_FIELD.to_string(),
            bearer_token: None,
        }
    }

    /// Attach files under a different form field
    pub fn with_field_name(mut self, field_name: impl Into<String>) -> Self {
        self.field_name = field_name.into();
        self
    }

    /// Send `Authorization: Bearer <token>` with every upload
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn build_form(&self, files: Vec<FilePayload>) -> Result<Form> {
        let mut form = Form::new();
        for file in files {
            let part = Part::bytes(file.data.to_vec())
                .file_name(file.name.clone())
                .mime_str(&file.mime_type)
                .map_err(|e| {
                    BridgeError::OperationFailed(format!(
                        "Invalid MIME type {:?} for {}: {}",
                        file.mime_type, file.name, e
                    ))
                })?;
            form = form.part(self.field_name.clone(), part);
        }
        Ok(form)
    }
}

#[async_trait]
impl UploadTransport for ReqwestUploadTransport {
    async fn upload(&self, files: Vec<FilePayload>) -> Result<Value> {
        let file_count = files.len();
        let form = self.build_form(files)?;

        debug!(endpoint = %self.endpoint, file_count, "Submitting upload batch");

        let mut request = self.client.post(&self.endpoint).multipart(form);
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            warn!(error = %e, "Upload request failed");
            if e.is_connect() {
                BridgeError::OperationFailed(format!("Connection failed: {}", e))
            } else {
                BridgeError::OperationFailed(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| status.to_string());
            warn!(status = status.as_u16(), "Upload rejected by remote");
            return Err(BridgeError::UploadRejected {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| BridgeError::OperationFailed(format!("Invalid upload response: {}", e)))
    }
}
