use actix_web::{middleware::Logger, web, App, HttpServer};
use chrono::Utc;
use std::io::Result;
use std::sync::atomic::Ordering;

use image_upload_helper::config::ServerConfig;
use image_upload_helper::handlers;
use image_upload_helper::services::cleanup_service;
use image_upload_helper::state::{AppState, SERVER_START_TIME};

#[actix_web::main]
async fn main() -> Result<()> {
    // 初始化日志
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    // 初始化配置
    let config = ServerConfig::new();
    config.init_directories().await?;

    SERVER_START_TIME.store(Utc::now().timestamp() as u64, Ordering::Relaxed);

    let app_state = AppState::new(config.clone());

    // 启动后台清理任务
    tokio::spawn(cleanup_service::start_background_cleanup(config.clone()));

    log::info!("启动图片上传服务...");
    config.log_config();
    println!("服务器运行在：http://{}", config.bind_address());

    let route_config = config.clone();
    let server = HttpServer::new(move || {
        let route_config = route_config.clone();
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .wrap(Logger::default())
            .configure(move |cfg| handlers::configure_routes(cfg, &route_config))
    })
    .bind(config.bind_address())?
    .run();

    // 设置优雅关闭
    let server_handle = server.handle();
    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("监听关闭信号失败: {}", e);
            std::future::pending::<()>().await;
        }
        log::info!("接收到关闭信号");
    };

    tokio::select! {
        _ = server => {
            log::info!("服务器正常退出");
        }
        _ = shutdown_signal => {
            log::info!("开始优雅关闭流程");
            server_handle.stop(true).await;
            cleanup_service::graceful_shutdown(&config).await;
            log::info!("优雅关闭完成");
        }
    }

    Ok(())
}
