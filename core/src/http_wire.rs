//! HTTP wire format shared between `httpd` (server edge) and
//! `http_client::HttpFileService` (client edge): header names and the JSON
//! directory-listing schema that resolves the "HTTP listFiles" Open
//! Question as option (a) (see SPEC_FULL.md §6 and §9).
//!
//! Grounded on the teacher's own `/list` JSON endpoint
//! (`server/src/handlers.rs`, `client/src/api_client.rs::RemoteEntry`) plus
//! the header set built by `original_source/src/local/HTTPFileServer.cpp`.

use serde::{Deserialize, Serialize};

pub const HEADER_LAST_MODIFIED: &str = "Last-Modified";
pub const HEADER_CONTENT_TYPE: &str = "Content-Type";
pub const HEADER_CONTENT_LENGTH: &str = "Content-Length";
pub const HEADER_FILE_MODE: &str = "X-File-Mode";

pub const JSON_LISTING_MIME_TYPE: &str = "application/json";
pub const HTML_LISTING_MIME_TYPE: &str = "text/html";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireKind {
    Regular,
    Directory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireEntry {
    pub name: String,
    pub kind: WireKind,
    /// `None` for directories.
    pub size: Option<u64>,
    pub mode: u32,
    pub mtime: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryListing {
    pub entries: Vec<WireEntry>,
}

/// Formats a Unix timestamp as an RFC 1123 `Last-Modified` value
/// (`Tue, 15 Nov 1994 08:12:31 GMT`), matching the original server's
/// header.
pub fn format_last_modified(mtime: i64) -> String {
    let time = std::time::UNIX_EPOCH + std::time::Duration::from_secs(mtime.max(0) as u64);
    httpdate::fmt_http_date(time)
}

pub fn format_mode(mode: u32) -> String {
    format!("{:o}", mode)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_mode_as_octal_string() {
        assert_eq!(format_mode(0o644), "644");
    }

    #[test]
    fn listing_round_trips_through_json() {
        let listing = DirectoryListing {
            entries: vec![WireEntry { name: "a.txt".into(), kind: WireKind::Regular, size: Some(4), mode: 0o644, mtime: 0 }],
        };
        let json = serde_json::to_string(&listing).unwrap();
        let back: DirectoryListing = serde_json::from_str(&json).unwrap();
        assert_eq!(back.entries.len(), 1);
        assert_eq!(back.entries[0].name, "a.txt");
    }
}
