use actix_web::{web, HttpResponse};

use crate::models::ApiResponse;
use crate::state::AppState;
use crate::uploader;
use crate::utils::validation_utils;

pub async fn delete_file(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> HttpResponse {
    state.record_request();

    let filename = path.into_inner();

    if !validation_utils::is_valid_filename(&filename) {
        state.record_error();
        return HttpResponse::BadRequest().json(ApiResponse::<()> {
            success: false,
            message: "文件名包含非法字符".to_string(),
            data: None,
        });
    }

    let file_path = state.config.upload_dir.join(&filename);
    let deleted = tokio::task::spawn_blocking(move || uploader::delete_file(file_path))
        .await
        .unwrap_or_else(|e| {
            log::error!("阻塞任务失败: {}", e);
            false
        });

    if deleted {
        HttpResponse::Ok().json(ApiResponse::<()> {
            success: true,
            message: "文件删除成功".to_string(),
            data: None,
        })
    } else {
        state.record_error();
        HttpResponse::NotFound().json(ApiResponse::<()> {
            success: false,
            message: format!("文件不存在或不允许删除: {}", filename),
            data: None,
        })
    }
}
