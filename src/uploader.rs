//! 单个图片上传的校验、移动和删除。
//!
//! `ImageUploader` 在构造时固定目标目录, 每次 `set_file` 先清空上一次的状态,
//! 校验通过后才记录目标路径、扩展名和临时文件路径。校验失败通过
//! [`UploadError`] 返回; 移动和删除文件的失败只以 `bool` 表示。

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, UploadError};
use crate::models::{ImageInfo, UploadErrorCode, UploadRequest};
use crate::utils::{file_utils, image_utils};

// 校验通过的文件; 字段要么全部存在, 要么整体为 None
#[derive(Debug, Clone)]
struct ResolvedFile {
    target_path: PathBuf,
    extension: String,
    staging_path: Option<PathBuf>,
    image: ImageInfo,
}

#[derive(Debug)]
pub struct ImageUploader {
    target_folder: PathBuf,
    resolved: Option<ResolvedFile>,
}

impl ImageUploader {
    pub fn new(target_folder: impl Into<PathBuf>) -> Self {
        Self {
            target_folder: target_folder.into(),
            resolved: None,
        }
    }

    /// 校验一个上传文件。检查按顺序进行, 第一个失败的检查决定返回的错误。
    pub fn set_file(&mut self, request: &UploadRequest) -> Result<()> {
        self.unset_file();

        let field = match (&request.field, request.error_signal()) {
            (Some(field), Some(signal)) if signal != UploadErrorCode::NoFile => field,
            _ => {
                log::warn!("没有上传任何文件");
                return Err(UploadError::NoFileUploaded);
            }
        };

        if request.error_signal() == Some(UploadErrorCode::IniSize) {
            log::warn!("上传文件超过服务器允许的最大值");
            return Err(UploadError::FileTooLarge);
        }

        let file = match request.index {
            Some(index) => field.get(index).ok_or_else(|| {
                log::warn!("请求的文件索引越界: {} (共 {} 个文件)", index, field.count());
                UploadError::IndexOutOfBounds {
                    index,
                    count: field.count(),
                }
            })?,
            None => field.primary().ok_or(UploadError::NoFileUploaded)?,
        };

        let name = file_utils::base_name(&file.name);
        let extension = file_utils::file_extension(name);

        let target_name = match request.output_name.as_deref() {
            Some(out) if !out.is_empty() => format!("{}.{}", out, extension),
            _ => name.to_string(),
        };
        let target_path = self.target_folder.join(&target_name);

        if !file_utils::is_allowed_image_extension(&extension) {
            log::warn!("不支持的文件扩展名: '{}' ({})", extension, file.name);
            return Err(UploadError::InvalidExtension { extension });
        }

        let image = image_utils::probe_image(&file.staging_path).ok_or_else(|| {
            log::warn!("上传的文件不是图片: {}", file.name);
            UploadError::NotAnImage
        })?;

        log::info!(
            "图片校验通过: {} -> {} ({}x{}, {})",
            file.name,
            target_path.display(),
            image.width,
            image.height,
            image.format
        );

        self.resolved = Some(ResolvedFile {
            target_path,
            extension,
            staging_path: Some(file.staging_path.clone()),
            image,
        });

        Ok(())
    }

    /// 目标文件名 (含扩展名, 不含目录)
    pub fn file_name(&self) -> Result<String> {
        let resolved = self.verify_file_presence()?;
        Ok(resolved
            .target_path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default())
    }

    pub fn file_extension(&self) -> Result<String> {
        Ok(self.verify_file_presence()?.extension.clone())
    }

    pub fn target_path(&self) -> Result<&Path> {
        Ok(&self.verify_file_presence()?.target_path)
    }

    pub fn image_info(&self) -> Result<&ImageInfo> {
        Ok(&self.verify_file_presence()?.image)
    }

    /// 把临时文件移动到目标路径, 返回是否移动成功。
    ///
    /// 临时文件只能被移动一次; 再次调用返回 `false`。
    pub fn save_file(&mut self) -> Result<bool> {
        let Some(resolved) = self.resolved.as_mut() else {
            return Err(UploadError::NoFileSet);
        };

        let Some(staging_path) = resolved.staging_path.take() else {
            log::warn!("临时文件已被移动: {}", resolved.target_path.display());
            return Ok(false);
        };

        let moved = move_file(&staging_path, &resolved.target_path);
        if moved {
            log::info!(
                "文件保存成功: {} -> {}",
                staging_path.display(),
                resolved.target_path.display()
            );
        } else {
            // 移动失败时保留临时文件路径, 由调用方决定是否重试
            resolved.staging_path = Some(staging_path);
        }
        Ok(moved)
    }

    fn verify_file_presence(&self) -> Result<&ResolvedFile> {
        self.resolved.as_ref().ok_or(UploadError::NoFileSet)
    }

    fn unset_file(&mut self) {
        self.resolved = None;
    }
}

// 先尝试 rename, 跨设备等失败时退回到复制后删除
fn move_file(from: &Path, to: &Path) -> bool {
    match fs::rename(from, to) {
        Ok(_) => true,
        Err(rename_err) => {
            log::debug!("rename 失败 {}: {}, 尝试复制", from.display(), rename_err);
            match fs::copy(from, to) {
                Ok(_) => {
                    if let Err(e) = fs::remove_file(from) {
                        log::warn!("删除临时文件失败 {}: {}", from.display(), e);
                    }
                    true
                }
                Err(e) => {
                    log::error!("移动文件失败 {} -> {}: {}", from.display(), to.display(), e);
                    false
                }
            }
        }
    }
}

/// 删除一个图片文件。扩展名不在白名单中时不做任何操作并返回 `false`。
pub fn delete_file(path: impl AsRef<Path>) -> bool {
    let path = path.as_ref();
    let extension = file_utils::path_extension(path);
    if !file_utils::is_allowed_image_extension(&extension) {
        log::warn!("拒绝删除非图片文件: {}", path.display());
        return false;
    }

    match fs::remove_file(path) {
        Ok(_) => {
            log::info!("文件删除成功: {}", path.display());
            true
        }
        Err(e) => {
            log::error!("删除文件失败 {}: {}", path.display(), e);
            false
        }
    }
}
