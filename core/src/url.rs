use crate::error::{FileServiceError, Result};

/// Thin wrapper around the `url` crate's `Url`, grounded on
/// `original_source/src/http/URL.{h,cpp}`: default ports (80 for `http`,
/// 443 for `https`), and a validity probe used by the mount binary to
/// decide whether its `<source>` argument names a remote peer or a local
/// path.
#[derive(Debug, Clone)]
pub struct Url {
    inner: url::Url,
}

impl Url {
    pub fn parse(raw: &str) -> Result<Self> {
        url::Url::parse(raw)
            .map(|inner| Url { inner })
            .map_err(|_| FileServiceError::InvalidUrl { url: raw.to_string() })
    }

    /// Whether `raw` parses as an absolute `http(s)` URL -- used by
    /// `floconsfs`-equivalent source dispatch instead of assuming a bare
    /// path is always local.
    pub fn is_valid(raw: &str) -> bool {
        matches!(url::Url::parse(raw), Ok(u) if u.scheme() == "http" || u.scheme() == "https")
    }

    pub fn scheme(&self) -> &str {
        self.inner.scheme()
    }

    pub fn host(&self) -> Option<&str> {
        self.inner.host_str()
    }

    pub fn port(&self) -> u16 {
        self.inner.port_or_known_default().unwrap_or(80)
    }

    pub fn path(&self) -> &str {
        self.inner.path()
    }

    /// Appends a path segment, matching the original's `URL::operator/`.
    pub fn join(&self, segment: &str) -> Result<Url> {
        self.inner
            .join(segment)
            .map(|inner| Url { inner })
            .map_err(|_| FileServiceError::InvalidUrl { url: segment.to_string() })
    }

    pub fn as_str(&self) -> &str {
        self.inner.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_http_and_https_as_valid() {
        assert!(Url::is_valid("http://example.com:9000"));
        assert!(Url::is_valid("https://example.com"));
        assert!(!Url::is_valid("/local/path"));
        assert!(!Url::is_valid("not a url"));
    }

    #[test]
    fn default_ports_apply_when_unspecified() {
        assert_eq!(Url::parse("http://example.com").unwrap().port(), 80);
        assert_eq!(Url::parse("https://example.com").unwrap().port(), 443);
        assert_eq!(Url::parse("http://example.com:9000").unwrap().port(), 9000);
    }
}
