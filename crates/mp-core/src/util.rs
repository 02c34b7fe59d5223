//! Small shared helpers.

/// Human-readable file size for detail views ("2.4 KB", "1.2 MB").
/// `None` renders as an empty string so templates can print it as-is.
pub fn format_file_size(size: Option<i64>) -> String {
    let Some(size) = size else {
        return String::new();
    };
    if size < 1024 {
        format!("{size} B")
    } else if size < 1024 * 1024 {
        format!("{:.1} KB", size as f64 / 1024.0)
    } else {
        format!("{:.1} MB", size as f64 / (1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_each_magnitude() {
        assert_eq!(format_file_size(None), "");
        assert_eq!(format_file_size(Some(0)), "0 B");
        assert_eq!(format_file_size(Some(1023)), "1023 B");
        assert_eq!(format_file_size(Some(1024)), "1.0 KB");
        assert_eq!(format_file_size(Some(1536)), "1.5 KB");
        assert_eq!(format_file_size(Some(5 * 1024 * 1024)), "5.0 MB");
    }
}
