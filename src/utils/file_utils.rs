use std::path::Path;

// 允许上传和删除的图片扩展名
pub const ALLOWED_IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

// 检查扩展名是否在图片白名单中 (扩展名需已转为小写)
pub fn is_allowed_image_extension(ext: &str) -> bool {
    ALLOWED_IMAGE_EXTENSIONS.contains(&ext)
}

// 去掉目录部分, 只保留文件名 ('/' 和 '\' 都视为分隔符)
pub fn base_name(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}

// 获取小写扩展名: 文件名最后一个 '.' 之后的部分, 没有 '.' 时为空
pub fn file_extension(name: &str) -> String {
    base_name(name)
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default()
}

pub fn path_extension(path: &Path) -> String {
    file_extension(&path.to_string_lossy())
}
