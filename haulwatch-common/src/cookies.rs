//! Session cookie jar loaded once at process start.
//!
//! The jar is a JSON array of cookie records exported from an authenticated
//! browser session. Records are opaque to the watcher; they are handed to
//! the browser driver for injection verbatim.

use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum CookieJarError {
    #[error("failed to read cookie jar {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("cookie jar {path} is not valid JSON: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

/// One exported session cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CookieRecord {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub secure: Option<bool>,
    #[serde(default)]
    pub http_only: Option<bool>,
    /// Unix timestamp; absent for session cookies.
    #[serde(default)]
    pub expiry: Option<f64>,
}

/// Load and parse the cookie jar at `path`.
pub fn load_cookie_jar<P: AsRef<Path>>(path: P) -> Result<Vec<CookieRecord>, CookieJarError> {
    let path = path.as_ref();
    let display = path.display().to_string();
    let raw = std::fs::read_to_string(path).map_err(|source| CookieJarError::Io {
        path: display.clone(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| CookieJarError::Parse {
        path: display,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_exported_records() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"name":"session","value":"s3cr3t","domain":".ati.su","path":"/","secure":true,"httpOnly":true,"expiry":1766000000}},
                {{"name":"lang","value":"ru"}}
            ]"#
        )
        .unwrap();

        let jar = load_cookie_jar(file.path()).expect("jar loads");
        assert_eq!(jar.len(), 2);
        assert_eq!(jar[0].name, "session");
        assert_eq!(jar[0].domain.as_deref(), Some(".ati.su"));
        assert_eq!(jar[0].http_only, Some(true));
        assert!(jar[1].expiry.is_none());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_cookie_jar("definitely/not/here.json").unwrap_err();
        assert!(matches!(err, CookieJarError::Io { .. }));
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let err = load_cookie_jar(file.path()).unwrap_err();
        assert!(matches!(err, CookieJarError::Parse { .. }));
    }
}
