use std::sync::LazyLock;

use regex::Regex;

use crate::types::AuthorizationCode;

static CODE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[?&]code=([^&#]+)").expect("valid code pattern"));

/// Extracts the authorization code from a redirect URL.
///
/// The value starts after `code=` and ends at the next `&`, at a fragment
/// `#`, or at the end of the string. Returns `None` when the URL carries no
/// code yet, which callers treat as "not redirected" rather than an error.
#[must_use]
pub fn extract_code(url: &str) -> Option<AuthorizationCode> {
    let raw = CODE_PATTERN.captures(url)?.get(1)?.as_str();
    let value = urlencoding::decode(raw)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| raw.to_string());
    Some(AuthorizationCode::new(value))
}
