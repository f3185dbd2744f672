use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub max_file_size: u64,
    pub upload_dir: PathBuf,
    pub temp_dir: PathBuf,
    pub public_path: String,
    pub stale_temp_age: Duration,
    pub temp_file_cleanup_interval: Duration,
    pub address: String,
    pub port: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_file_size: 2 * 1024 * 1024, // 2MB
            upload_dir: PathBuf::from("./uploads/images"),
            temp_dir: PathBuf::from("./temp"),
            public_path: "/uploads".to_string(),
            stale_temp_age: Duration::from_secs(3600),
            temp_file_cleanup_interval: Duration::from_secs(1800),
            address: "127.0.0.1".to_string(),
            port: "2233".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn new() -> Self {
        Self::from_args(std::env::args().skip(1))
    }

    // 可选参数: address, port
    pub fn from_args<I>(args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        let defaults = Self::default();
        let address = args.next().unwrap_or(defaults.address.clone());
        let port = args.next().unwrap_or(defaults.port.clone());

        Self { address, port, ..defaults }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }

    pub async fn init_directories(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.upload_dir).await?;
        tokio::fs::create_dir_all(&self.temp_dir).await?;

        Ok(())
    }

    pub fn log_config(&self) {
        log::info!("配置信息:");
        log::info!("  - 最大文件大小: {}KB", self.max_file_size / 1024);
        log::info!("  - 临时文件过期时间: {}s", self.stale_temp_age.as_secs());
        log::info!("  - 临时文件清理间隔: {}s", self.temp_file_cleanup_interval.as_secs());
        log::info!("上传目录: {}", self.upload_dir.display());
        log::info!("临时目录: {}", self.temp_dir.display());
    }
}
