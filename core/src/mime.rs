//! Mime type lookup by extension, grounded on the original's
//! `RegularFile.cpp` `_mime_types` table.

pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";
pub const DIRECTORY_MIME_TYPE: &str = "inode/directory";

pub fn mime_type_for_extension(extension: Option<&str>) -> &'static str {
    match extension.map(str::to_ascii_lowercase).as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("mp4") => "video/mp4",
        Some("txt") => "text/plain",
        _ => DEFAULT_MIME_TYPE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_extensions_map_to_mime_types() {
        assert_eq!(mime_type_for_extension(Some("jpg")), "image/jpeg");
        assert_eq!(mime_type_for_extension(Some("TXT")), "text/plain");
    }

    #[test]
    fn unknown_extension_falls_back_to_octet_stream() {
        assert_eq!(mime_type_for_extension(Some("bin")), DEFAULT_MIME_TYPE);
        assert_eq!(mime_type_for_extension(None), DEFAULT_MIME_TYPE);
    }
}
