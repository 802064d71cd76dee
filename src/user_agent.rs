//! User-Agent strings for page, robots.txt and image requests.
//!
//! One product token identifies the tool both in the request header and when
//! selecting a robots.txt group, so the two never drift apart.

/// Project URL for User-Agent identification (good citizenship; RFC 9308).
const PROJECT_UA_URL: &str = "https://github.com/fierce/imgfetch";

/// Product token the tool announces and matches robots.txt groups against.
pub const PRODUCT_TOKEN: &str = "imgfetch";

/// Default User-Agent sent with every request.
#[must_use]
pub fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("{PRODUCT_TOKEN}/{version} (+{PROJECT_UA_URL})")
}

/// Product token of an arbitrary User-Agent string (`Foo/1.2 (...)` -> `foo`).
///
/// Falls back to [`PRODUCT_TOKEN`] when the string carries no usable token.
#[must_use]
pub fn product_token(user_agent: &str) -> String {
    let token: String = user_agent
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
        .collect();
    if token.is_empty() {
        PRODUCT_TOKEN.to_string()
    } else {
        token.to_ascii_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_user_agent_carries_token_version_and_url() {
        let ua = default_user_agent();
        assert!(ua.starts_with("imgfetch/"), "unexpected UA: {ua}");
        assert!(ua.contains(env!("CARGO_PKG_VERSION")));
        assert!(ua.contains(PROJECT_UA_URL));
    }

    #[test]
    fn test_product_token_of_default_user_agent() {
        assert_eq!(product_token(&default_user_agent()), PRODUCT_TOKEN);
    }

    #[test]
    fn test_product_token_lowercases_custom_agent() {
        assert_eq!(product_token("MyBot/2.0 (+https://x.test)"), "mybot");
        assert_eq!(product_token("Mozilla/5.0 (X11)"), "mozilla");
    }

    #[test]
    fn test_product_token_falls_back_when_empty() {
        assert_eq!(product_token("   "), PRODUCT_TOKEN);
        assert_eq!(product_token("(compatible)"), PRODUCT_TOKEN);
    }
}
