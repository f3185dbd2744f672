use actix_web::{web, HttpResponse};
use crate::{models::ApiResponse, state::AppState};
use crate::services::system_service;

pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    state.record_request();

    let health_info = system_service::get_health_info(&state);

    HttpResponse::Ok().json(ApiResponse {
        success: true,
        message: "服务运行正常".to_string(),
        data: Some(health_info),
    })
}

pub async fn get_stats(state: web::Data<AppState>) -> HttpResponse {
    state.record_request();

    match system_service::get_system_stats(&state).await {
        Ok(stats) => HttpResponse::Ok().json(ApiResponse {
            success: true,
            message: "获取统计信息成功".to_string(),
            data: Some(stats),
        }),
        Err(e) => {
            log::error!("获取统计信息失败: {}", e);
            state.record_error();
            HttpResponse::InternalServerError().json(ApiResponse::<()> {
                success: false,
                message: e,
                data: None,
            })
        }
    }
}
