pub mod file_utils;
pub mod image_utils;
pub mod validation_utils;
