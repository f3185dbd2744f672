use thiserror::Error;

// 图片上传校验错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    #[error("没有上传任何文件")]
    NoFileUploaded,

    #[error("上传的文件大小超过服务器允许的最大值")]
    FileTooLarge,

    #[error("请求的文件索引越界: {index} (文件数量: {count})")]
    IndexOutOfBounds { index: usize, count: usize },

    #[error("上传的文件扩展名不正确: '{extension}' (允许: jpg, jpeg, png)")]
    InvalidExtension { extension: String },

    #[error("上传的文件不是图片")]
    NotAnImage,

    #[error("尚未设置任何文件")]
    NoFileSet,
}

pub type Result<T> = std::result::Result<T, UploadError>;
