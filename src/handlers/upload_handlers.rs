use actix_multipart::Multipart;
use actix_web::{web, Error, HttpResponse};
use std::sync::atomic::Ordering;

use crate::models::UploadQuery;
use crate::services::upload_service;
use crate::state::{AppState, ACTIVE_UPLOADS};

pub async fn upload_image(
    state: web::Data<AppState>,
    payload: Multipart,
    query: web::Query<UploadQuery>,
) -> Result<HttpResponse, Error> {
    state.record_request();

    ACTIVE_UPLOADS.fetch_add(1, Ordering::Relaxed);

    let result = upload_service::handle_image_upload(state.clone(), payload, query.into_inner()).await;

    ACTIVE_UPLOADS.fetch_sub(1, Ordering::Relaxed);

    if result.is_err() {
        state.record_error();
    }
    result
}
