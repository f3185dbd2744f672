// 验证文件名 (不允许路径穿越和目录分隔符)
pub fn is_valid_filename(filename: &str) -> bool {
    !filename.is_empty()
        && !filename.contains("..")
        && !filename.contains('/')
        && !filename.contains('\\')
        && !filename.contains('\0')
}

// 验证输出文件名 (不含扩展名)
pub fn is_valid_output_name(name: &str) -> bool {
    is_valid_filename(name) && !name.starts_with('.')
}
