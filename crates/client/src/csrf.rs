//! Anti-forgery token resolution.
//!
//! Sources are consulted in a fixed order and the first non-empty match
//! wins:
//!
//! 1. an externally supplied accessor closure
//! 2. the `csrftoken` cookie
//! 3. the `csrfmiddlewaretoken` hidden form field of the upload page

use std::fmt;
use std::sync::{Arc, LazyLock};

use regex::Regex;

/// Cookie Django stores the token in.
pub const CSRF_COOKIE_NAME: &str = "csrftoken";

/// Hidden input Django renders inside forms.
pub const CSRF_FORM_FIELD: &str = "csrfmiddlewaretoken";

static INPUT_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<input\b[^>]*>").expect("valid regex"));
static NAME_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\bname\s*=\s*["']?csrfmiddlewaretoken["'\s/>]"#).expect("valid regex")
});
static VALUE_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\bvalue\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+))"#).expect("valid regex")
});

/// Caller-provided token lookup, tried before any other source.
pub type TokenAccessor = Arc<dyn Fn() -> Option<String> + Send + Sync>;

/// Where a resolved token came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    Accessor,
    Cookie,
    FormField,
}

/// A token plus the source it was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedToken {
    pub value: String,
    pub source: TokenSource,
}

/// Resolves the anti-forgery token from the configured sources.
#[derive(Clone, Default)]
pub struct CsrfResolver {
    accessor: Option<TokenAccessor>,
    cookie_header: Option<String>,
    form_html: Option<String>,
}

impl fmt::Debug for CsrfResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CsrfResolver")
            .field("accessor", &self.accessor.is_some())
            .field("cookie_header", &self.cookie_header.is_some())
            .field("form_html", &self.form_html.is_some())
            .finish()
    }
}

impl CsrfResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_accessor<F>(mut self, accessor: F) -> Self
    where
        F: Fn() -> Option<String> + Send + Sync + 'static,
    {
        self.accessor = Some(Arc::new(accessor));
        self
    }

    /// Raw `Cookie` header value, e.g. `"sessionid=..; csrftoken=.."`.
    pub fn with_cookie_header(mut self, header: impl Into<String>) -> Self {
        self.cookie_header = Some(header.into());
        self
    }

    /// HTML of a page that may contain the hidden token field.
    pub fn with_form_html(mut self, html: impl Into<String>) -> Self {
        self.form_html = Some(html.into());
        self
    }

    /// Resolve the token, or `None` if no source yields one.
    pub fn resolve(&self) -> Option<ResolvedToken> {
        let from_accessor = self
            .accessor
            .as_ref()
            .and_then(|accessor| accessor())
            .map(|value| (value, TokenSource::Accessor));

        from_accessor
            .filter(|(value, _)| !value.is_empty())
            .or_else(|| {
                self.cookie_header
                    .as_deref()
                    .and_then(token_from_cookie_header)
                    .map(|value| (value, TokenSource::Cookie))
            })
            .or_else(|| {
                self.form_html
                    .as_deref()
                    .and_then(token_from_form_html)
                    .map(|value| (value, TokenSource::FormField))
            })
            .map(|(value, source)| ResolvedToken { value, source })
    }
}

/// Extract the `csrftoken` value from a `Cookie` header.
pub fn token_from_cookie_header(header: &str) -> Option<String> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == CSRF_COOKIE_NAME)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Extract the hidden `csrfmiddlewaretoken` input value from HTML.
pub fn token_from_form_html(html: &str) -> Option<String> {
    INPUT_TAG_RE
        .find_iter(html)
        .map(|tag| tag.as_str())
        .filter(|tag| NAME_ATTR_RE.is_match(tag))
        .find_map(|tag| {
            let caps = VALUE_ATTR_RE.captures(tag)?;
            caps.get(1)
                .or_else(|| caps.get(2))
                .or_else(|| caps.get(3))
                .map(|m| m.as_str().to_string())
        })
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FORM: &str = r#"
        <form method="post">
          <input type="hidden" name="csrfmiddlewaretoken" value="form-token">
          <input type="file" name="file">
        </form>"#;

    #[test]
    fn cookie_header_lookup() {
        let header = "sessionid=abc; csrftoken=cookie-token; theme=dark";
        assert_eq!(
            token_from_cookie_header(header).as_deref(),
            Some("cookie-token")
        );
        assert_eq!(token_from_cookie_header("sessionid=abc"), None);
        assert_eq!(token_from_cookie_header("csrftoken="), None);
    }

    #[test]
    fn cookie_name_must_match_exactly() {
        assert_eq!(token_from_cookie_header("xcsrftoken=nope"), None);
    }

    #[test]
    fn form_field_lookup() {
        assert_eq!(token_from_form_html(FORM).as_deref(), Some("form-token"));
    }

    #[test]
    fn form_field_with_value_before_name() {
        let html = "<input value='swapped' type=hidden name='csrfmiddlewaretoken'/>";
        assert_eq!(token_from_form_html(html).as_deref(), Some("swapped"));
    }

    #[test]
    fn form_without_field() {
        assert_eq!(token_from_form_html("<input name=\"file\">"), None);
    }

    #[test]
    fn accessor_wins_over_cookie_and_form() {
        let resolver = CsrfResolver::new()
            .with_accessor(|| Some("accessor-token".to_string()))
            .with_cookie_header("csrftoken=cookie-token")
            .with_form_html(FORM);

        let token = resolver.resolve().unwrap();
        assert_eq!(token.value, "accessor-token");
        assert_eq!(token.source, TokenSource::Accessor);
    }

    #[test]
    fn cookie_wins_over_form() {
        let resolver = CsrfResolver::new()
            .with_cookie_header("csrftoken=cookie-token")
            .with_form_html(FORM);

        let token = resolver.resolve().unwrap();
        assert_eq!(token.value, "cookie-token");
        assert_eq!(token.source, TokenSource::Cookie);
    }

    #[test]
    fn empty_accessor_falls_through() {
        let resolver = CsrfResolver::new()
            .with_accessor(|| Some(String::new()))
            .with_form_html(FORM);

        let token = resolver.resolve().unwrap();
        assert_eq!(token.source, TokenSource::FormField);
    }

    #[test]
    fn nothing_configured() {
        assert_eq!(CsrfResolver::new().resolve(), None);
    }
}
