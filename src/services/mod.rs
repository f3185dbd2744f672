pub mod cleanup_service;
pub mod multipart_service;
pub mod system_service;
pub mod upload_service;
