use actix_multipart::Multipart;
use actix_web::{web, Error, HttpResponse};
use std::path::PathBuf;
use tokio::fs as tokio_fs;

use crate::error::UploadError;
use crate::models::{ApiResponse, FileField, FileInfo, UploadForm, UploadQuery, UploadRequest};
use crate::services::multipart_service;
use crate::state::AppState;
use crate::uploader::ImageUploader;
use crate::utils::validation_utils;

pub const DEFAULT_FIELD: &str = "image";

// 单个请求处理失败的原因
#[derive(Debug)]
pub enum UploadFailure {
    Invalid(UploadError),
    SaveFailed { name: String, saved: Vec<FileInfo> },
    Internal(String),
}

impl From<UploadError> for UploadFailure {
    fn from(err: UploadError) -> Self {
        UploadFailure::Invalid(err)
    }
}

impl std::fmt::Display for UploadFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UploadFailure::Invalid(e) => write!(f, "{}", e),
            UploadFailure::SaveFailed { name, .. } => write!(f, "保存文件失败: {}", name),
            UploadFailure::Internal(msg) => write!(f, "{}", msg),
        }
    }
}

pub async fn handle_image_upload(
    state: web::Data<AppState>,
    payload: Multipart,
    query: UploadQuery,
) -> Result<HttpResponse, Error> {
    let field = query.field.clone().unwrap_or_else(|| DEFAULT_FIELD.to_string());

    if let Some(name) = query.name.as_deref() {
        if !validation_utils::is_valid_output_name(name) {
            state.record_error();
            return Ok(HttpResponse::BadRequest().json(ApiResponse::<()> {
                success: false,
                message: "输出文件名包含非法字符".to_string(),
                data: None,
            }));
        }
    }

    log::info!("=== 开始图片上传过程 === 字段: {}", field);

    let form = multipart_service::parse_upload_form(payload, &state.config).await?;
    let staged = form.staged_paths();
    let requests = build_requests(&form, &field, &query);
    let target_folder = state.config.upload_dir.clone();
    let public_path = state.config.public_path.clone();

    let result = tokio::task::spawn_blocking(move || save_images(target_folder, &public_path, &requests))
        .await
        .unwrap_or_else(|e| Err(UploadFailure::Internal(format!("阻塞任务失败: {}", e))));

    let discarded = discard_staging_files(&staged).await;
    if discarded > 0 {
        log::info!("请求结束, 清理了 {} 个未使用的临时文件", discarded);
    }

    match result {
        Ok(files) => {
            for file in &files {
                state.record_saved(file.size);
            }
            log::info!("=== 图片上传过程结束 === 成功保存 {} 个文件", files.len());
            Ok(HttpResponse::Ok().json(ApiResponse {
                success: true,
                message: format!("成功上传 {} 个文件", files.len()),
                data: Some(files),
            }))
        }
        Err(failure) => {
            log::error!("图片上传失败: {}", failure);
            state.record_error();
            let message = failure.to_string();
            Ok(match failure {
                UploadFailure::Invalid(_) => HttpResponse::BadRequest().json(ApiResponse::<()> {
                    success: false,
                    message,
                    data: None,
                }),
                // 保存中途失败时返回已经保存的文件
                UploadFailure::SaveFailed { saved, .. } => {
                    for file in &saved {
                        state.record_saved(file.size);
                    }
                    HttpResponse::InternalServerError().json(ApiResponse {
                        success: false,
                        message,
                        data: Some(saved),
                    })
                }
                UploadFailure::Internal(_) => HttpResponse::InternalServerError().json(ApiResponse::<()> {
                    success: false,
                    message,
                    data: None,
                }),
            })
        }
    }
}

/// 删除请求结束时仍留在临时目录中的文件, 返回删除数量
pub async fn discard_staging_files(paths: &[PathBuf]) -> usize {
    let mut removed = 0;
    for path in paths {
        match tokio_fs::remove_file(path).await {
            Ok(_) => removed += 1,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => log::warn!("删除临时文件失败 {}: {}", path.display(), e),
        }
    }
    removed
}

/// 根据查询参数生成校验请求: 指定 `index` 时只处理该文件, 多文件字段未指定时
/// 依次处理所有文件(输出文件名追加 `_<index>`)。
pub fn build_requests(form: &UploadForm, field: &str, query: &UploadQuery) -> Vec<UploadRequest> {
    let base = UploadRequest::from_form(form, field);
    let name = query.name.as_deref();

    if let Some(index) = query.index {
        let request = base.with_index(index);
        return vec![with_name(request, name)];
    }

    match form.get(field) {
        Some(FileField::Multiple(files)) if !files.is_empty() => (0..form.count_files(field))
            .map(|i| {
                let request = base.clone().with_index(i);
                with_name(request, name.map(|n| format!("{}_{}", n, i)).as_deref())
            })
            .collect(),
        _ => vec![with_name(base, name)],
    }
}

fn with_name(request: UploadRequest, name: Option<&str>) -> UploadRequest {
    match name {
        Some(name) => request.with_output_name(name),
        None => request,
    }
}

/// 先校验全部文件, 全部通过后再依次保存。
///
/// 任一文件校验失败时不会保存任何文件; 保存中途失败时返回已保存的文件。
pub fn save_images(
    target_folder: PathBuf,
    public_path: &str,
    requests: &[UploadRequest],
) -> Result<Vec<FileInfo>, UploadFailure> {
    let mut uploaders = Vec::with_capacity(requests.len());
    for request in requests {
        let mut uploader = ImageUploader::new(target_folder.clone());
        uploader.set_file(request)?;
        uploaders.push(uploader);
    }

    let mut files = Vec::with_capacity(uploaders.len());
    let upload_time = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();

    for mut uploader in uploaders {
        let filename = uploader.file_name()?;

        if !uploader.save_file()? {
            return Err(UploadFailure::SaveFailed { name: filename, saved: files });
        }

        let size = std::fs::metadata(uploader.target_path()?)
            .map(|m| m.len())
            .unwrap_or(0);
        let image = uploader.image_info()?;

        files.push(FileInfo {
            url: format!("{}/{}", public_path.trim_end_matches('/'), filename),
            filename,
            upload_time: upload_time.clone(),
            size,
            extension: uploader.file_extension()?,
            width: image.width,
            height: image.height,
            mime_type: image.mime_type.clone(),
        });
    }

    Ok(files)
}
