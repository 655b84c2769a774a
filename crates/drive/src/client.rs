//! Google Drive REST client.

use std::time::Duration;

use bytes::Bytes;
use parcel_core::delivery::DeliveryBundle;
use parcel_core::provider::{
    CapacityOracle, Credential, DeliveryReport, DeliverySink, ProviderError,
};
use parcel_shared::DriveConfig;
use reqwest::{Client, RequestBuilder, Response, StatusCode, header::CONTENT_TYPE};
use tracing::{debug, warn};

use crate::types::{AboutResponse, FOLDER_MIME_TYPE, FileMetadata, FileResource};

/// Drive client acting with a widget owner's access token.
#[derive(Debug, Clone)]
pub struct DriveClient {
    http: Client,
    api_base: String,
    upload_base: String,
}

impl DriveClient {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &DriveConfig) -> Result<Self, ProviderError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ProviderError::unavailable(format!("http client: {e}")))?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            upload_base: config.upload_base.trim_end_matches('/').to_string(),
        })
    }

    /// Create a folder and return its id.
    ///
    /// # Errors
    ///
    /// Returns `CredentialInvalid` on 401 and `Unavailable` otherwise.
    pub async fn create_folder(
        &self,
        credential: &Credential,
        name: &str,
    ) -> Result<String, ProviderError> {
        let request = self
            .http
            .post(format!("{}/files", self.api_base))
            .json(&FileMetadata {
                name,
                mime_type: Some(FOLDER_MIME_TYPE),
                description: None,
            });

        let folder: FileResource = send_json(request, credential, "create folder").await?;
        Ok(folder.id)
    }

    /// Upload raw bytes and return the new file id.
    ///
    /// # Errors
    ///
    /// Returns `CredentialInvalid` on 401 and `Unavailable` otherwise.
    pub async fn upload_media(
        &self,
        credential: &Credential,
        mime_type: &str,
        content: Bytes,
    ) -> Result<String, ProviderError> {
        let request = self
            .http
            .post(format!("{}/files", self.upload_base))
            .query(&[("uploadType", "media")])
            .header(CONTENT_TYPE, mime_type)
            .body(content);

        let file: FileResource = send_json(request, credential, "upload media").await?;
        Ok(file.id)
    }

    /// Name a file, describe it, and move it into a folder.
    ///
    /// # Errors
    ///
    /// Returns `CredentialInvalid` on 401 and `Unavailable` otherwise.
    pub async fn update_metadata(
        &self,
        credential: &Credential,
        file_id: &str,
        name: &str,
        description: &str,
        folder_id: &str,
    ) -> Result<(), ProviderError> {
        let request = self
            .http
            .patch(format!("{}/files/{file_id}", self.api_base))
            .query(&[("addParents", folder_id), ("removeParents", "root")])
            .json(&FileMetadata {
                name,
                mime_type: None,
                description: Some(description),
            });

        let _: FileResource = send_json(request, credential, "update metadata").await?;
        Ok(())
    }
}

impl CapacityOracle for DriveClient {
    async fn available_capacity(&self, credential: &Credential) -> Result<u64, ProviderError> {
        let request = self
            .http
            .get(format!("{}/about", self.api_base))
            .query(&[("fields", "storageQuota")]);

        let about: AboutResponse = send_json(request, credential, "storage quota").await?;
        about
            .storage_quota
            .available()
            .ok_or_else(|| ProviderError::unavailable("malformed storage quota"))
    }
}

impl DeliverySink for DriveClient {
    async fn deliver(&self, bundle: &DeliveryBundle) -> Result<DeliveryReport, ProviderError> {
        let credential = &bundle.credential;
        let visitor = &bundle.visitor;

        let folder_name = format!("{} <{}>", visitor.display_name(), visitor.email());
        let folder_id = self.create_folder(credential, &folder_name).await?;

        let mut remote_ids = Vec::with_capacity(bundle.files.len());
        for staged in &bundle.files {
            let file_id = self
                .upload_media(credential, &staged.file.mime_type, staged.content.clone())
                .await?;
            self.update_metadata(
                credential,
                &file_id,
                &staged.file.filename,
                visitor.message(),
                &folder_id,
            )
            .await?;
            debug!(
                session_id = %bundle.session_id,
                file_id = %staged.file.id,
                remote_id = %file_id,
                "File uploaded to Drive"
            );
            remote_ids.push(file_id);
        }

        Ok(DeliveryReport {
            folder_id: Some(folder_id),
            remote_ids,
        })
    }
}

async fn send_json<T: serde::de::DeserializeOwned>(
    request: RequestBuilder,
    credential: &Credential,
    what: &str,
) -> Result<T, ProviderError> {
    let response = request
        .bearer_auth(credential.access_token())
        .send()
        .await
        .map_err(|e| ProviderError::unavailable(format!("{what}: {e}")))?;

    let response = check_status(response, what).await?;
    response
        .json::<T>()
        .await
        .map_err(|e| ProviderError::unavailable(format!("{what}: invalid response: {e}")))
}

async fn check_status(response: Response, what: &str) -> Result<Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::UNAUTHORIZED {
        return Err(ProviderError::CredentialInvalid);
    }

    let body = response.text().await.unwrap_or_default();
    warn!(status = %status, what, body = %body, "Drive request failed");
    Err(ProviderError::unavailable(format!("{what}: HTTP {status}")))
}
