use serde::{Deserialize, Serialize};

/// Body of `GET /api/images`: either a bare list or `{ "images": [...] }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ListingBody {
    Bare(Vec<String>),
    Wrapped { images: Vec<String> },
}

impl ListingBody {
    pub fn into_urls(self) -> Vec<String> {
        match self {
            Self::Bare(urls) => urls,
            Self::Wrapped { images } => images,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateCategoryRequest {
    pub username: String,
    pub category_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CreateCategoryResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// A file picked on the authorization page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Fields of the multipart `POST /api/upload` body.
#[derive(Debug, Clone)]
pub struct UploadForm {
    pub file: SelectedFile,
    pub username: String,
    pub category: Option<String>,
}
