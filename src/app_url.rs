const LOCAL_DOMAIN_PREFIXES: [&str; 3] = ["localhost", "127.0.0.1", "[::1]"];

fn is_local_domain(value: &str) -> bool {
    let lower = value.to_lowercase();
    LOCAL_DOMAIN_PREFIXES
        .iter()
        .any(|prefix| lower.starts_with(prefix))
}

/// Accepts either a full `http(s)://` URL or a bare `host[:port][/path]`.
/// Bare local hosts get `http`, everything else `https`. Trailing slashes are
/// dropped.
pub fn normalize_base_url(value: Option<&str>) -> Option<String> {
    let raw = value?.trim();
    if raw.is_empty()
        || raw.contains(char::is_whitespace)
        || raw.contains('?')
        || raw.contains('#')
    {
        return None;
    }

    if let Some((scheme, rest)) = raw.split_once("://") {
        let scheme = scheme.to_lowercase();
        let rest = rest.trim_end_matches('/');
        if (scheme != "http" && scheme != "https") || rest.is_empty() {
            return None;
        }
        return Some(format!("{}://{}", scheme, rest));
    }

    let trimmed = raw.trim_end_matches('/');
    let host = trimmed.split('/').next().unwrap_or(trimmed);
    if host.is_empty()
        || !host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | ':' | '[' | ']'))
    {
        return None;
    }

    let scheme = if is_local_domain(host) {
        "http"
    } else {
        "https"
    };
    Some(format!("{}://{}", scheme, trimmed))
}
