pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;
pub mod state;
pub mod uploader;
pub mod utils;

pub use error::UploadError;
pub use models::{FileField, ImageInfo, UploadErrorCode, UploadForm, UploadRequest, UploadedFile};
pub use uploader::{delete_file, ImageUploader};
