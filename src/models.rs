use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FileInfo {
    pub filename: String,
    pub url: String,
    pub upload_time: String,
    pub size: u64,
    pub extension: String,
    pub width: u32,
    pub height: u32,
    pub mime_type: String,
}

/// 上传接口的查询参数: `field` 为表单字段名, `name` 为输出文件名(不含扩展名),
/// `index` 只在多文件字段中使用。
#[derive(Debug, Default, Deserialize)]
pub struct UploadQuery {
    pub field: Option<String>,
    pub name: Option<String>,
    pub index: Option<usize>,
}

/// 探测到的图片元数据
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub format: String,
    pub mime_type: String,
}

/// 上传平台报告的错误码, 数值与常见的 multipart 上传约定一致
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadErrorCode {
    Ok = 0,
    IniSize = 1,
    FormSize = 2,
    Partial = 3,
    NoFile = 4,
    NoTmpDir = 6,
    CantWrite = 7,
    Extension = 8,
}

impl UploadErrorCode {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Ok),
            1 => Some(Self::IniSize),
            2 => Some(Self::FormSize),
            3 => Some(Self::Partial),
            4 => Some(Self::NoFile),
            6 => Some(Self::NoTmpDir),
            7 => Some(Self::CantWrite),
            8 => Some(Self::Extension),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }
}

// 一个已经落到临时目录的上传文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub name: String,
    pub staging_path: PathBuf,
    pub error: UploadErrorCode,
    pub size: u64,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, staging_path: impl Into<PathBuf>, size: u64) -> Self {
        Self {
            name: name.into(),
            staging_path: staging_path.into(),
            error: UploadErrorCode::Ok,
            size,
        }
    }

    /// 只带错误码的条目 (没有文件内容)
    pub fn failed(name: impl Into<String>, error: UploadErrorCode) -> Self {
        Self {
            name: name.into(),
            staging_path: PathBuf::new(),
            error,
            size: 0,
        }
    }
}

/// 表单中一个字段下的文件: `<input type="file">` 对应 `Single`,
/// `<input type="file" multiple>` (字段名以 `[]` 结尾) 对应 `Multiple`。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileField {
    Single(UploadedFile),
    Multiple(Vec<UploadedFile>),
}

impl FileField {
    pub fn files(&self) -> &[UploadedFile] {
        match self {
            FileField::Single(file) => std::slice::from_ref(file),
            FileField::Multiple(files) => files,
        }
    }

    pub fn count(&self) -> usize {
        self.files().len()
    }

    /// 字段级别的文件: 单文件字段的唯一文件, 多文件字段的第一个文件
    pub fn primary(&self) -> Option<&UploadedFile> {
        self.files().first()
    }

    pub fn get(&self, index: usize) -> Option<&UploadedFile> {
        self.files().get(index)
    }
}

/// 已解析的 multipart 提交: 字段名 -> 文件
#[derive(Debug, Clone, Default)]
pub struct UploadForm {
    fields: HashMap<String, FileField>,
}

impl UploadForm {
    pub fn new() -> Self {
        Self::default()
    }

    // 同名字段会被替换, 被替换字段的临时文件随之删除
    pub fn insert(&mut self, key: impl Into<String>, field: FileField) {
        let key = key.into();
        if let Some(replaced) = self.fields.insert(key.clone(), field) {
            let paths: Vec<PathBuf> = replaced
                .files()
                .iter()
                .map(|file| file.staging_path.clone())
                .filter(|path| is_staged(path))
                .collect();
            let removed = remove_staged(&paths);
            if removed > 0 {
                log::debug!("字段 {} 被替换, 删除了 {} 个临时文件", key, removed);
            }
        }
    }

    pub fn insert_single(&mut self, key: impl Into<String>, file: UploadedFile) {
        self.insert(key, FileField::Single(file));
    }

    // 追加到多文件字段; 同名的单文件字段会被替换
    pub fn push_multiple(&mut self, key: impl Into<String>, file: UploadedFile) {
        let key = key.into();
        match self.fields.get_mut(&key) {
            Some(FileField::Multiple(files)) => files.push(file),
            _ => self.insert(key, FileField::Multiple(vec![file])),
        }
    }

    pub fn get(&self, key: &str) -> Option<&FileField> {
        self.fields.get(key)
    }

    /// 字段下的文件数量, 字段不存在时为 0
    pub fn count_files(&self, key: &str) -> usize {
        self.fields.get(key).map(FileField::count).unwrap_or(0)
    }

    /// 仍然存在于临时目录中的文件
    pub fn staged_paths(&self) -> Vec<PathBuf> {
        self.fields
            .values()
            .flat_map(|field| field.files().iter())
            .map(|file| file.staging_path.clone())
            .filter(|path| is_staged(path))
            .collect()
    }

    /// 删除请求结束时仍未被移动的临时文件, 返回删除数量
    pub fn discard_staged(&self) -> usize {
        remove_staged(&self.staged_paths())
    }
}

/// 一次校验请求: 提交的字段、可选的文件索引和可选的输出文件名
#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    pub field: Option<FileField>,
    pub index: Option<usize>,
    pub output_name: Option<String>,
}

impl UploadRequest {
    pub fn new(field: Option<FileField>) -> Self {
        Self {
            field,
            ..Default::default()
        }
    }

    pub fn single(file: UploadedFile) -> Self {
        Self::new(Some(FileField::Single(file)))
    }

    pub fn from_form(form: &UploadForm, key: &str) -> Self {
        Self::new(form.get(key).cloned())
    }

    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    pub fn with_output_name(mut self, name: impl Into<String>) -> Self {
        self.output_name = Some(name.into());
        self
    }

    // 当前请求对应的错误码: 指定索引且存在时取该文件, 否则取字段级别的文件
    pub(crate) fn error_signal(&self) -> Option<UploadErrorCode> {
        let field = self.field.as_ref()?;
        let file = self
            .index
            .and_then(|i| field.get(i))
            .or_else(|| field.primary())?;
        Some(file.error)
    }
}

pub fn is_staged(path: &Path) -> bool {
    !path.as_os_str().is_empty() && path.is_file()
}

fn remove_staged(paths: &[PathBuf]) -> usize {
    let mut removed = 0;
    for path in paths {
        match std::fs::remove_file(path) {
            Ok(_) => removed += 1,
            Err(e) => log::warn!("删除临时文件失败 {}: {}", path.display(), e),
        }
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_conversion() {
        assert_eq!(UploadErrorCode::from_code(4), Some(UploadErrorCode::NoFile));
        assert_eq!(UploadErrorCode::from_code(1), Some(UploadErrorCode::IniSize));
        assert_eq!(UploadErrorCode::from_code(5), None);
        assert_eq!(UploadErrorCode::CantWrite.code(), 7);
    }

    #[test]
    fn test_count_files() {
        let mut form = UploadForm::new();
        form.insert_single("avatar", UploadedFile::new("a.png", "/tmp/a", 10));
        form.push_multiple("photos", UploadedFile::new("1.jpg", "/tmp/1", 1));
        form.push_multiple("photos", UploadedFile::new("2.jpg", "/tmp/2", 1));
        form.push_multiple("photos", UploadedFile::new("3.jpg", "/tmp/3", 1));

        assert_eq!(form.count_files("avatar"), 1);
        assert_eq!(form.count_files("photos"), 3);
        assert_eq!(form.count_files("missing"), 0);
    }

    #[test]
    fn test_error_signal_prefers_indexed_file() {
        let field = FileField::Multiple(vec![
            UploadedFile::new("1.jpg", "/tmp/1", 1),
            UploadedFile::failed("2.jpg", UploadErrorCode::IniSize),
        ]);
        let request = UploadRequest::new(Some(field.clone()));
        assert_eq!(request.error_signal(), Some(UploadErrorCode::Ok));

        let request = UploadRequest::new(Some(field.clone())).with_index(1);
        assert_eq!(request.error_signal(), Some(UploadErrorCode::IniSize));

        // 越界索引回退到字段级别的错误码
        let request = UploadRequest::new(Some(field)).with_index(9);
        assert_eq!(request.error_signal(), Some(UploadErrorCode::Ok));

        assert_eq!(UploadRequest::new(None).error_signal(), None);
    }

    #[test]
    fn test_replaced_field_removes_its_staging_file() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.upload");
        let second = dir.path().join("second.upload");
        let third = dir.path().join("third.upload");
        std::fs::write(&first, b"1").unwrap();
        std::fs::write(&second, b"2").unwrap();
        std::fs::write(&third, b"3").unwrap();

        let mut form = UploadForm::new();
        form.insert_single("image", UploadedFile::new("a.png", &first, 1));
        form.insert_single("image", UploadedFile::new("b.png", &second, 1));
        assert!(!first.exists());
        assert_eq!(form.staged_paths(), vec![second.clone()]);

        // 普通字段之后出现同名的多文件字段
        form.push_multiple("image", UploadedFile::new("c.png", &third, 1));
        assert!(!second.exists());
        assert_eq!(form.count_files("image"), 1);
        assert_eq!(form.staged_paths(), vec![third]);
    }

    #[test]
    fn test_discard_staged() {
        let dir = tempfile::tempdir().unwrap();
        let staged = dir.path().join("x.upload");
        std::fs::write(&staged, b"data").unwrap();

        let mut form = UploadForm::new();
        form.insert_single("image", UploadedFile::new("x.png", &staged, 4));
        form.insert_single("empty", UploadedFile::failed("", UploadErrorCode::NoFile));

        assert_eq!(form.staged_paths(), vec![staged.clone()]);
        assert_eq!(form.discard_staged(), 1);
        assert!(!staged.exists());
        assert!(form.staged_paths().is_empty());
    }
}
