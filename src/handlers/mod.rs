pub mod file_handlers;
pub mod system_handlers;
pub mod upload_handlers;

use actix_web::web;

use crate::config::ServerConfig;

pub fn configure_routes(cfg: &mut web::ServiceConfig, config: &ServerConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(system_handlers::health_check))
            .route("/stats", web::get().to(system_handlers::get_stats))
            .route("/upload", web::post().to(upload_handlers::upload_image))
            .route("/file/{filename}", web::delete().to(file_handlers::delete_file)),
    )
    .service(
        actix_files::Files::new(&config.public_path, config.upload_dir.clone())
            .use_last_modified(true),
    );
}
