use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::ServerConfig;
use crate::services::multipart_service::STAGING_SUFFIX;

pub async fn start_background_cleanup(config: ServerConfig) {
    let mut cleanup_interval = tokio::time::interval(config.temp_file_cleanup_interval);

    loop {
        cleanup_interval.tick().await;

        log::info!("执行后台清理任务...");

        match cleanup_temp_files(config.temp_dir.clone(), config.stale_temp_age).await {
            Ok((files_cleaned, size_freed)) => {
                log::info!("清理完成 - 临时文件: {} (释放 {} bytes)", files_cleaned, size_freed);
            }
            Err(e) => log::warn!("后台清理失败: {}", e),
        }
    }
}

/// 删除临时目录中超过 `max_age` 未修改的上传临时文件
pub async fn cleanup_temp_files(temp_dir: PathBuf, max_age: Duration) -> Result<(usize, u64), String> {
    tokio::task::spawn_blocking(move || cleanup_temp_files_internal(&temp_dir, max_age))
        .await
        .map_err(|e| format!("清理任务失败: {}", e))?
}

fn cleanup_temp_files_internal(temp_dir: &Path, max_age: Duration) -> Result<(usize, u64), String> {
    let mut cleaned_count = 0usize;
    let mut total_size = 0u64;

    let entries = fs::read_dir(temp_dir)
        .map_err(|e| format!("读取临时目录失败 {}: {}", temp_dir.display(), e))?;

    for entry in entries.flatten() {
        let path = entry.path();
        let is_staging_file = path
            .extension()
            .map(|ext| ext == STAGING_SUFFIX)
            .unwrap_or(false);
        if !is_staging_file {
            continue;
        }

        let Ok(metadata) = entry.metadata() else { continue };
        if !metadata.is_file() {
            continue;
        }

        let age = metadata
            .modified()
            .ok()
            .and_then(|modified| modified.elapsed().ok())
            .unwrap_or_default();
        if age < max_age {
            continue;
        }

        if let Err(e) = fs::remove_file(&path) {
            log::warn!("清理临时文件失败 {}: {}", path.display(), e);
        } else {
            cleaned_count += 1;
            total_size += metadata.len();
            log::debug!("清理临时文件: {}", path.display());
        }
    }

    Ok((cleaned_count, total_size))
}

pub async fn graceful_shutdown(config: &ServerConfig) {
    log::info!("接收到关闭信号，开始优雅关闭...");

    log::info!("清理临时文件...");
    let cleaned = cleanup_temp_files(config.temp_dir.clone(), config.stale_temp_age)
        .await
        .map(|(count, _)| count)
        .unwrap_or(0);

    log::info!("优雅关闭完成 - 清理临时文件: {}", cleaned);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cleanup_only_removes_staging_files() {
        let dir = tempfile::tempdir().unwrap();
        let staged = dir.path().join("abc.upload");
        let other = dir.path().join("keep.png");
        fs::write(&staged, b"12345").unwrap();
        fs::write(&other, b"png").unwrap();

        let (count, size) = cleanup_temp_files(dir.path().to_path_buf(), Duration::ZERO)
            .await
            .unwrap();

        assert_eq!(count, 1);
        assert_eq!(size, 5);
        assert!(!staged.exists());
        assert!(other.exists());
    }

    #[tokio::test]
    async fn test_cleanup_keeps_recent_files() {
        let dir = tempfile::tempdir().unwrap();
        let staged = dir.path().join("fresh.upload");
        fs::write(&staged, b"data").unwrap();

        let (count, _) = cleanup_temp_files(dir.path().to_path_buf(), Duration::from_secs(3600))
            .await
            .unwrap();

        assert_eq!(count, 0);
        assert!(staged.exists());
    }

    #[tokio::test]
    async fn test_cleanup_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let result = cleanup_temp_files(dir.path().join("missing"), Duration::ZERO).await;
        assert!(result.is_err());
    }
}
