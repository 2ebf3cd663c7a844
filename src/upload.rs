use crate::api::ImageApi;
use crate::errors::{UploadError, ValidationError};
use crate::models::{SelectedFile, UploadForm};
use tracing::{error, info};

pub const UPLOAD_LABEL: &str = "Upload Image";
pub const BUSY_LABEL: &str = "Uploading...";

/// The upload button together with its hidden file input.
#[derive(Debug, Clone)]
pub struct UploadControl {
    idle_label: String,
    label: String,
    busy: bool,
    selection: Option<SelectedFile>,
}

impl Default for UploadControl {
    fn default() -> Self {
        Self::new(UPLOAD_LABEL)
    }
}

impl UploadControl {
    pub fn new(label: impl Into<String>) -> Self {
        let label = label.into();
        Self {
            idle_label: label.clone(),
            label,
            busy: false,
            selection: None,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn selection(&self) -> Option<&SelectedFile> {
        self.selection.as_ref()
    }

    pub fn select(&mut self, file: SelectedFile) {
        self.selection = Some(file);
    }

    /// Sends the selected file. The selection is consumed by every attempt,
    /// and the label is restored even if the returned future is dropped
    /// before the service answers.
    pub async fn submit<A: ImageApi>(
        &mut self,
        api: &A,
        username: Option<&str>,
        category: Option<&str>,
    ) -> Result<(), UploadError> {
        let file = self.selection.take().ok_or(ValidationError::MissingFile)?;
        let username = username
            .map(str::trim)
            .filter(|username| !username.is_empty())
            .ok_or(ValidationError::MissingUsername)?;

        let _busy = BusyLabel::engage(self);
        let file_name = file.file_name.clone();
        let form = UploadForm {
            file,
            username: username.to_string(),
            category: category.map(str::to_string),
        };

        match api.upload(form).await {
            Ok(()) => {
                info!("uploaded {file_name} for {username}");
                Ok(())
            }
            Err(err) => {
                error!("upload of {file_name} failed: {err}");
                Err(err.into())
            }
        }
    }
}

struct BusyLabel<'a> {
    control: &'a mut UploadControl,
}

impl<'a> BusyLabel<'a> {
    fn engage(control: &'a mut UploadControl) -> Self {
        control.busy = true;
        control.label = BUSY_LABEL.to_string();
        Self { control }
    }
}

impl Drop for BusyLabel<'_> {
    fn drop(&mut self) {
        self.control.busy = false;
        self.control.label = self.control.idle_label.clone();
    }
}

/// Text of the blocking acknowledgement shown after an attempt.
pub fn acknowledgement(result: &Result<(), UploadError>) -> String {
    match result {
        Ok(()) => "Image uploaded successfully!".to_string(),
        Err(UploadError::Invalid(err)) => err.to_string(),
        Err(UploadError::Failed(_)) => "Upload failed. Please try again.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ListingQuery;
    use crate::errors::FetchError;
    use crate::fetcher::testing::StubApi;
    use crate::models::{Category, CreateCategoryRequest, CreateCategoryResponse};
    use std::time::Duration;

    fn photo() -> SelectedFile {
        SelectedFile {
            file_name: "cat.png".into(),
            content_type: Some("image/png".into()),
            bytes: vec![1, 2, 3],
        }
    }

    struct HangingApi;

    impl ImageApi for HangingApi {
        async fn list_images(&self, _query: &ListingQuery) -> Result<Vec<u8>, FetchError> {
            Ok(Vec::new())
        }

        async fn list_categories(&self, _username: &str) -> Result<Vec<Category>, FetchError> {
            Ok(Vec::new())
        }

        async fn create_category(
            &self,
            _request: &CreateCategoryRequest,
        ) -> Result<CreateCategoryResponse, FetchError> {
            Ok(CreateCategoryResponse::default())
        }

        async fn upload(&self, _form: UploadForm) -> Result<(), FetchError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn successful_upload_sends_fields_and_resets() {
        let api = StubApi::with_body("[]");
        let mut control = UploadControl::default();
        control.select(photo());

        control.submit(&api, Some("ann"), Some("pets")).await.unwrap();

        let uploads = api.uploads.lock().unwrap();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].username, "ann");
        assert_eq!(uploads[0].category.as_deref(), Some("pets"));
        assert_eq!(uploads[0].file, photo());
        assert_eq!(control.label(), UPLOAD_LABEL);
        assert!(control.selection().is_none());
    }

    #[tokio::test]
    async fn network_failure_restores_label_and_clears_selection() {
        let api = StubApi::failing(FetchError::Network("connection refused".into()));
        let mut control = UploadControl::default();
        control.select(photo());

        let result = control.submit(&api, Some("ann"), None).await;

        assert!(matches!(result, Err(UploadError::Failed(FetchError::Network(_)))));
        assert_eq!(acknowledgement(&result), "Upload failed. Please try again.");
        assert_eq!(control.label(), UPLOAD_LABEL);
        assert!(!control.is_busy());
        assert!(control.selection().is_none());
    }

    #[tokio::test]
    async fn abandoned_upload_still_resets_the_control() {
        let mut control = UploadControl::new("Upload");
        control.select(photo());

        let outcome = tokio::time::timeout(
            Duration::from_millis(20),
            control.submit(&HangingApi, Some("ann"), None),
        )
        .await;

        assert!(outcome.is_err());
        assert_eq!(control.label(), "Upload");
        assert!(!control.is_busy());
        assert!(control.selection().is_none());
    }

    #[tokio::test]
    async fn missing_username_is_a_validation_error() {
        let api = StubApi::with_body("[]");
        let mut control = UploadControl::default();
        control.select(photo());

        let result = control.submit(&api, Some("  "), None).await;

        assert_eq!(result, Err(UploadError::Invalid(ValidationError::MissingUsername)));
        assert!(api.uploads.lock().unwrap().is_empty());
        assert!(control.selection().is_none());
    }

    #[tokio::test]
    async fn nothing_selected_is_a_validation_error() {
        let api = StubApi::with_body("[]");
        let mut control = UploadControl::default();
        let result = control.submit(&api, Some("ann"), None).await;
        assert_eq!(acknowledgement(&result), "Please select a file to upload");
    }
}
