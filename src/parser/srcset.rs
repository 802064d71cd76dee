//! `srcset` attribute parsing.
//!
//! Follows the HTML candidate-string tokenizer closely enough for real pages:
//! a URL runs to the next whitespace (trailing commas stripped), descriptors
//! run to the next top-level comma. Commas inside URLs such as data URIs stay
//! intact.

/// Returns the URLs of every image candidate in a `srcset` value.
#[must_use]
pub(crate) fn parse_srcset(value: &str) -> Vec<String> {
    let mut urls = Vec::new();
    let mut rest = value;

    loop {
        rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == ',');
        if rest.is_empty() {
            break;
        }

        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        let (token, after) = rest.split_at(end);
        let url = token.trim_end_matches(',');
        if !url.is_empty() {
            urls.push(url.to_string());
        }
        rest = after;

        if token.ends_with(',') {
            continue;
        }

        // Skip descriptors (`1x`, `480w`, ...) up to the next top-level comma.
        let mut depth = 0usize;
        let mut next = rest.len();
        for (i, c) in rest.char_indices() {
            match c {
                '(' => depth += 1,
                ')' => depth = depth.saturating_sub(1),
                ',' if depth == 0 => {
                    next = i;
                    break;
                }
                _ => {}
            }
        }
        rest = &rest[next..];
    }

    urls
}
