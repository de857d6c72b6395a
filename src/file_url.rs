//! Conversions between local paths and `file://` URLs

/// URL scheme for local files
const FILE_SCHEME: &str = "file://";

/// Strip a leading `file://` if present
pub fn trim_file_protocol(s: &str) -> &str {
    s.strip_prefix(FILE_SCHEME).unwrap_or(s)
}

/// `file://` URL for a local path. Spaces and other characters are kept raw;
/// image loaders accept them unencoded.
pub fn to_file_url(path: &str) -> String {
    if path.is_empty() {
        return String::new();
    }
    format!("{FILE_SCHEME}{path}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim_file_protocol() {
        assert_eq!(trim_file_protocol("file:///home/u/a b.png"), "/home/u/a b.png");
        assert_eq!(trim_file_protocol("/home/u/a.png"), "/home/u/a.png");
    }

    #[test]
    fn test_to_file_url() {
        assert_eq!(to_file_url("/home/u/a b.png"), "file:///home/u/a b.png");
        assert_eq!(to_file_url(""), "");
    }
}
