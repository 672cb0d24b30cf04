//! MAM item URL handling.

use std::sync::LazyLock;

use regex::Regex;

static ID_PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r"/t/(\d+)").unwrap(),
        Regex::new(r"/tor/viewRequest\.php/(\d+)").unwrap(),
        Regex::new(r"[?&]id=(\d+)").unwrap(),
    ]
});

/// Extract the numeric MAM item id from a URL.
///
/// Supports `/t/{id}`, `/tor/viewRequest.php/{id}` and `?id={id}`.
pub fn extract_mam_id(url: &str) -> Option<u64> {
    ID_PATTERNS.iter().find_map(|re| {
        re.captures(url)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
    })
}

/// Whether `url`'s host is `domain` or one of its subdomains.
///
/// ```
/// use audiohook_parser::is_mam_url;
///
/// assert!(is_mam_url("https://www.myanonamouse.net/t/1", "myanonamouse.net"));
/// assert!(!is_mam_url("https://myanonamouse.net.evil.io/t/1", "myanonamouse.net"));
/// ```
pub fn is_mam_url(url: &str, domain: &str) -> bool {
    let domain = domain.trim().trim_start_matches('.').to_ascii_lowercase();
    if domain.is_empty() {
        return false;
    }
    match host_of(url) {
        Some(host) => host == domain || host.ends_with(&format!(".{domain}")),
        None => false,
    }
}

fn host_of(url: &str) -> Option<String> {
    let (_, rest) = url.trim().split_once("://")?;
    let authority = rest.split(['/', '?', '#']).next()?;
    let authority = authority.rsplit('@').next()?;
    let host = match authority.rsplit_once(':') {
        Some((host, port)) if port.chars().all(|c| c.is_ascii_digit()) => host,
        _ => authority,
    };
    if host.is_empty() {
        None
    } else {
        Some(host.to_ascii_lowercase())
    }
}
