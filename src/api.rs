use crate::errors::FetchError;
use crate::models::{Category, CreateCategoryRequest, CreateCategoryResponse, UploadForm};
use reqwest::{
    multipart::{Form, Part},
    Client,
};
use std::future::Future;
use tracing::{debug, warn};
use url::Url;

pub const IMAGES_PATH: &str = "/api/images";
pub const UPLOAD_PATH: &str = "/api/upload";
pub const CATEGORIES_PATH: &str = "/api/categories";

/// Parameters of one `GET /api/images` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingQuery {
    pub username: Option<String>,
    pub category: Option<String>,
}

impl ListingQuery {
    /// `username` and `category` are only attached when a username is known.
    pub fn target(&self, base: &Url) -> Url {
        let mut url = endpoint(base, IMAGES_PATH);
        if let Some(username) = &self.username {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("username", username);
            if let Some(category) = &self.category {
                pairs.append_pair("category", category);
            }
        }
        url
    }
}

/// The external image service the pages talk to.
pub trait ImageApi: Send + Sync {
    /// Returns the raw body of a successful listing response.
    fn list_images(
        &self,
        query: &ListingQuery,
    ) -> impl Future<Output = Result<Vec<u8>, FetchError>> + Send;

    fn list_categories(
        &self,
        username: &str,
    ) -> impl Future<Output = Result<Vec<Category>, FetchError>> + Send;

    fn create_category(
        &self,
        request: &CreateCategoryRequest,
    ) -> impl Future<Output = Result<CreateCategoryResponse, FetchError>> + Send;

    fn upload(&self, form: UploadForm) -> impl Future<Output = Result<(), FetchError>> + Send;
}

#[derive(Debug, Clone)]
pub struct HttpImageApi {
    client: Client,
    base: Url,
}

impl HttpImageApi {
    pub fn new(base: Url) -> Self {
        Self {
            client: Client::new(),
            base,
        }
    }
}

impl ImageApi for HttpImageApi {
    async fn list_images(&self, query: &ListingQuery) -> Result<Vec<u8>, FetchError> {
        let target = query.target(&self.base);
        debug!("fetching image list from {target}");
        let response = self.client.get(target).send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn list_categories(&self, username: &str) -> Result<Vec<Category>, FetchError> {
        let mut target = endpoint(&self.base, CATEGORIES_PATH);
        target.query_pairs_mut().append_pair("username", username);
        let response = self.client.get(target).send().await?.error_for_status()?;
        let body = response.bytes().await?;

        Ok(serde_json::from_slice(&body).unwrap_or_else(|err| {
            debug!("ignoring malformed category list: {err}");
            Vec::new()
        }))
    }

    async fn create_category(
        &self,
        request: &CreateCategoryRequest,
    ) -> Result<CreateCategoryResponse, FetchError> {
        let response = self
            .client
            .post(endpoint(&self.base, CATEGORIES_PATH))
            .json(request)
            .send()
            .await?;
        let status = response.status();
        let body = response.bytes().await?;

        // Rejections such as duplicates come back as 4xx with a JSON verdict.
        match serde_json::from_slice::<CreateCategoryResponse>(&body) {
            Ok(verdict) => Ok(verdict),
            Err(_) if !status.is_success() => Err(FetchError::Status(status.as_u16())),
            Err(err) => {
                warn!("malformed category response: {err}");
                Ok(CreateCategoryResponse::default())
            }
        }
    }

    async fn upload(&self, form: UploadForm) -> Result<(), FetchError> {
        let mut part = Part::bytes(form.file.bytes).file_name(form.file.file_name);
        if let Some(content_type) = form.file.content_type.as_deref() {
            part = part.mime_str(content_type)?;
        }

        let mut body = Form::new()
            .part("file", part)
            .text("username", form.username);
        if let Some(category) = form.category {
            body = body.text("category", category);
        }

        self.client
            .post(endpoint(&self.base, UPLOAD_PATH))
            .multipart(body)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

fn endpoint(base: &Url, path: &str) -> Url {
    let mut url = base.clone();
    url.set_path(path);
    url.set_query(None);
    url
}
