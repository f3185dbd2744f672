use actix_multipart::{Field, Multipart};
use actix_web::Error;
use futures_util::TryStreamExt;
use std::path::{Path, PathBuf};
use tokio::fs as tokio_fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::models::{UploadErrorCode, UploadForm, UploadedFile};

pub const STAGING_SUFFIX: &str = "upload";

/// 把 multipart 请求中的文件部分写入临时目录, 返回解析好的表单。
///
/// 字段名以 `[]` 结尾时按多文件字段收集。解析失败时已写入的临时文件会被删除。
pub async fn parse_upload_form(mut payload: Multipart, config: &ServerConfig) -> Result<UploadForm, Error> {
    let mut form = UploadForm::new();

    match read_parts(&mut payload, config, &mut form).await {
        Ok(()) => Ok(form),
        Err(e) => {
            log::error!("解析上传表单失败: {}", e);
            form.discard_staged();
            Err(e)
        }
    }
}

async fn read_parts(payload: &mut Multipart, config: &ServerConfig, form: &mut UploadForm) -> Result<(), Error> {
    let mut part_count = 0;

    while let Some(mut field) = payload.try_next().await? {
        part_count += 1;

        let content_disposition = field.content_disposition();
        let name = content_disposition
            .as_ref()
            .and_then(|cd| cd.get_name())
            .map(|s| s.to_string());
        let filename = content_disposition
            .as_ref()
            .and_then(|cd| cd.get_filename())
            .map(|s| s.to_string());

        let (Some(name), Some(filename)) = (name, filename) else {
            // 普通表单字段, 忽略内容
            drain_field(&mut field).await?;
            continue;
        };

        let (key, multiple) = field_key(&name);
        log::debug!("处理第 {} 个表单部分: {} ({})", part_count, key, filename);

        let file = stage_file(&mut field, &filename, config).await?;
        if multiple {
            form.push_multiple(key, file);
        } else {
            form.insert_single(key, file);
        }
    }

    Ok(())
}

// 返回去掉 `[]` 后的字段名以及是否为多文件字段
pub fn field_key(name: &str) -> (&str, bool) {
    match name.strip_suffix("[]") {
        Some(key) => (key, true),
        None => (name, false),
    }
}

pub fn staging_file_path(temp_dir: &Path) -> PathBuf {
    temp_dir.join(format!("{}.{}", Uuid::new_v4(), STAGING_SUFFIX))
}

async fn stage_file(field: &mut Field, filename: &str, config: &ServerConfig) -> Result<UploadedFile, Error> {
    let staging_path = staging_file_path(&config.temp_dir);

    let mut async_file = match tokio_fs::File::create(&staging_path).await {
        Ok(file) => file,
        Err(e) => {
            log::error!("创建临时文件失败 {}: {}", staging_path.display(), e);
            drain_field(field).await?;
            return Ok(UploadedFile::failed(filename, UploadErrorCode::CantWrite));
        }
    };

    let mut total_size: u64 = 0;
    let mut error = UploadErrorCode::Ok;

    while let Some(chunk) = field.try_next().await? {
        if error != UploadErrorCode::Ok {
            continue;
        }

        total_size += chunk.len() as u64;
        if total_size > config.max_file_size {
            log::warn!("上传文件超过大小限制: {} (> {} bytes)", filename, config.max_file_size);
            error = UploadErrorCode::IniSize;
            continue;
        }

        if let Err(e) = async_file.write_all(&chunk).await {
            log::error!("写入临时文件失败 {}: {}", staging_path.display(), e);
            error = UploadErrorCode::CantWrite;
        }
    }

    if error == UploadErrorCode::Ok {
        if let Err(e) = async_file.flush().await {
            log::error!("flush临时文件失败 {}: {}", staging_path.display(), e);
            error = UploadErrorCode::CantWrite;
        }
    }
    drop(async_file);

    if error == UploadErrorCode::Ok && filename.is_empty() && total_size == 0 {
        error = UploadErrorCode::NoFile;
    }

    if error != UploadErrorCode::Ok {
        if let Err(e) = tokio_fs::remove_file(&staging_path).await {
            log::warn!("删除临时文件失败 {}: {}", staging_path.display(), e);
        }
        return Ok(UploadedFile::failed(filename, error));
    }

    log::info!("临时文件写入完成: {} -> {} ({} bytes)", filename, staging_path.display(), total_size);
    Ok(UploadedFile::new(filename, staging_path, total_size))
}

async fn drain_field(field: &mut Field) -> Result<(), Error> {
    while field.try_next().await?.is_some() {}
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_key() {
        assert_eq!(field_key("photos[]"), ("photos", true));
        assert_eq!(field_key("avatar"), ("avatar", false));
        assert_eq!(field_key("[]"), ("", true));
    }

    #[test]
    fn test_staging_file_path() {
        let a = staging_file_path(Path::new("/tmp/staging"));
        let b = staging_file_path(Path::new("/tmp/staging"));
        assert_ne!(a, b);
        assert_eq!(a.parent(), Some(Path::new("/tmp/staging")));
        assert_eq!(a.extension().and_then(|e| e.to_str()), Some(STAGING_SUFFIX));
    }
}
