use url::Url;

/// Extracts the domain from a URL
///
/// This function retrieves the host portion of a URL and converts it to lowercase.
/// If the URL has no host (which shouldn't happen for valid HTTP(S) URLs), it returns None.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use ton_harvest::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns the network location of a URL: lowercase host plus effective port
///
/// The port falls back to the scheme default, so `http://a.com` and
/// `http://a.com:80` share a location while `http://a.com:8080` does not.
pub fn network_location(url: &Url) -> Option<(String, Option<u16>)> {
    extract_domain(url).map(|host| (host, url.port_or_known_default()))
}

/// Returns true when both URLs point at the same network host
///
/// # Examples
///
/// ```
/// use url::Url;
/// use ton_harvest::url::same_host;
///
/// let a = Url::parse("https://ton.org/docs").unwrap();
/// let b = Url::parse("https://TON.org/ru/mini-apps").unwrap();
/// let c = Url::parse("https://docs.ton.org/").unwrap();
/// assert!(same_host(&a, &b));
/// assert!(!same_host(&a, &c));
/// ```
pub fn same_host(a: &Url, b: &Url) -> bool {
    match (network_location(a), network_location(b)) {
        (Some(left), Some(right)) => left == right,
        _ => false,
    }
}
