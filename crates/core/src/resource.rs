//! Notification resource references
//!
//! Graph notifications carry an opaque `resource` string that is either an
//! absolute URL or a provider-relative path fragment such as
//! `Users('u1')/Events('e1')`. The reference is parsed once into a tagged
//! form and resolved against the API base before use.

use url::Url;

/// A parsed notification resource reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceRef {
    Absolute(String),
    Relative(String),
}

impl ResourceRef {
    /// Classify a raw resource string.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match Url::parse(trimmed) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {
                Self::Absolute(trimmed.to_string())
            }
            _ => Self::Relative(trimmed.trim_start_matches('/').to_string()),
        }
    }

    /// Resolve into one absolute API URL.
    pub fn into_absolute(self, api_base: &str) -> String {
        match self {
            Self::Absolute(url) => url,
            Self::Relative(path) => {
                format!("{}/{}", api_base.trim_end_matches('/'), path)
            }
        }
    }
}
