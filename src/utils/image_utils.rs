use std::path::Path;

use image::io::Reader as ImageReader;
use image::ImageFormat;

use crate::models::ImageInfo;

/// 根据文件内容(而不是扩展名)探测图片格式和尺寸。
///
/// 无法识别格式、文件头损坏或文件不可读时返回 `None`。
pub fn probe_image(path: &Path) -> Option<ImageInfo> {
    let reader = match ImageReader::open(path).and_then(|r| r.with_guessed_format()) {
        Ok(reader) => reader,
        Err(e) => {
            log::warn!("读取图片文件失败 {}: {}", path.display(), e);
            return None;
        }
    };

    let format = reader.format()?;
    let (width, height) = match reader.into_dimensions() {
        Ok(dimensions) => dimensions,
        Err(e) => {
            log::debug!("解析图片尺寸失败 {}: {}", path.display(), e);
            return None;
        }
    };

    Some(ImageInfo {
        width,
        height,
        format: format_name(format),
        mime_type: mime_type(format).to_string(),
    })
}

fn format_name(format: ImageFormat) -> String {
    format!("{:?}", format).to_lowercase()
}

fn mime_type(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Png => "image/png",
        ImageFormat::Jpeg => "image/jpeg",
        ImageFormat::Gif => "image/gif",
        ImageFormat::WebP => "image/webp",
        _ => "application/octet-stream",
    }
}
