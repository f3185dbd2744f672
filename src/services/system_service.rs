use std::fs;
use std::path::Path;
use std::sync::atomic::Ordering;

use chrono::Utc;

use crate::state::{AppState, SERVER_START_TIME};

pub fn get_health_info(state: &AppState) -> serde_json::Value {
    let started = SERVER_START_TIME.load(Ordering::Relaxed);
    let uptime = (Utc::now().timestamp() as u64).saturating_sub(started);

    serde_json::json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
        "uptime_seconds": uptime,
        "app_stats": state.get_stats(),
    })
}

pub async fn get_system_stats(state: &AppState) -> Result<serde_json::Value, String> {
    let upload_dir = state.config.upload_dir.clone();
    let temp_dir = state.config.temp_dir.clone();

    let mut stats = tokio::task::spawn_blocking(move || -> Result<serde_json::Value, String> {
        let (stored_files, stored_size) = count_files(&upload_dir)
            .map_err(|e| format!("读取上传目录失败: {}", e))?;
        let (temp_files_count, temp_files_size) = count_files(&temp_dir).unwrap_or((0, 0));

        Ok(serde_json::json!({
            "stored_files": stored_files,
            "stored_size": stored_size,
            "temp_files_count": temp_files_count,
            "temp_files_size": temp_files_size,
        }))
    })
    .await
    .map_err(|e| format!("阻塞任务失败: {}", e))??;

    // 合并应用状态统计
    if let (Some(obj), serde_json::Value::Object(app_stats)) = (stats.as_object_mut(), state.get_stats()) {
        obj.extend(app_stats);
    }

    Ok(stats)
}

// 统计目录下(不递归)的文件数量和大小
fn count_files(dir: &Path) -> std::io::Result<(usize, u64)> {
    let mut file_count = 0;
    let mut total_size = 0;

    for entry in fs::read_dir(dir)? {
        let metadata = entry?.metadata()?;
        if metadata.is_file() {
            file_count += 1;
            total_size += metadata.len();
        }
    }

    Ok((file_count, total_size))
}
