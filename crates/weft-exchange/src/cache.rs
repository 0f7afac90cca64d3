//! Cache-Control policy for static assets.

use std::fmt;
use std::sync::Arc;

use http::Uri;

/// Directive for content-hashed build assets: cache forever.
pub const IMMUTABLE_DIRECTIVE: &str = "public, max-age=31536000, immutable";

/// Short-lived default for everything else.
pub const SHORT_LIVED_DIRECTIVE: &str = "public, max-age=600";

/// Map a request path to a Cache-Control directive.
///
/// Paths under `assets_public_path` (default `/build/`) are treated as
/// content-hashed and permanently cacheable.
pub fn cache_control(path: &str, assets_public_path: &str) -> &'static str {
    if path.starts_with(assets_public_path) {
        IMMUTABLE_DIRECTIVE
    } else {
        SHORT_LIVED_DIRECTIVE
    }
}

/// Caller-supplied Cache-Control behavior.
///
/// `Fixed` and `Custom` fully replace the default prefix rule — there
/// is no merging.
#[derive(Clone, Default)]
pub enum CacheControl {
    /// The prefix rule in [`cache_control`].
    #[default]
    Default,
    /// One directive for every asset.
    Fixed(String),
    /// Directive computed from the parsed request URL.
    Custom(Arc<dyn Fn(&Uri) -> String + Send + Sync>),
}

impl CacheControl {
    /// Resolve the directive for one asset request.
    pub fn directive(&self, url: &Uri, assets_public_path: &str) -> String {
        match self {
            CacheControl::Default => cache_control(url.path(), assets_public_path).to_string(),
            CacheControl::Fixed(directive) => directive.clone(),
            CacheControl::Custom(f) => f(url),
        }
    }
}

impl fmt::Debug for CacheControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheControl::Default => f.write_str("CacheControl::Default"),
            CacheControl::Fixed(d) => f.debug_tuple("CacheControl::Fixed").field(d).finish(),
            CacheControl::Custom(_) => f.write_str("CacheControl::Custom(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_assets_are_immutable() {
        assert_eq!(
            cache_control("/build/entry.client-abc123.js", "/build/"),
            "public, max-age=31536000, immutable"
        );
        assert_eq!(cache_control("/build/", "/build/"), IMMUTABLE_DIRECTIVE);
    }

    #[test]
    fn everything_else_is_short_lived() {
        assert_eq!(cache_control("/app.css", "/build/"), "public, max-age=600");
        assert_eq!(cache_control("/", "/build/"), SHORT_LIVED_DIRECTIVE);
        // Prefix match, not substring match.
        assert_eq!(cache_control("/nested/build/x.js", "/build/"), SHORT_LIVED_DIRECTIVE);
    }

    #[test]
    fn custom_assets_prefix() {
        assert_eq!(cache_control("/assets/x.js", "/assets/"), IMMUTABLE_DIRECTIVE);
        assert_eq!(cache_control("/build/x.js", "/assets/"), SHORT_LIVED_DIRECTIVE);
    }

    #[test]
    fn fixed_override_replaces_rule_entirely() {
        let cc = CacheControl::Fixed("no-store".to_string());
        let url: Uri = "http://localhost/build/x.js".parse().unwrap();
        assert_eq!(cc.directive(&url, "/build/"), "no-store");
    }

    #[test]
    fn custom_override_sees_parsed_url() {
        let cc = CacheControl::Custom(Arc::new(|url: &Uri| {
            if url.path().ends_with(".css") {
                "max-age=60".to_string()
            } else {
                "no-cache".to_string()
            }
        }));
        let css: Uri = "http://localhost/app.css".parse().unwrap();
        let js: Uri = "http://localhost/app.js".parse().unwrap();
        assert_eq!(cc.directive(&css, "/build/"), "max-age=60");
        assert_eq!(cc.directive(&js, "/build/"), "no-cache");
    }
}
