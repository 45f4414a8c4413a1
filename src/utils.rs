use url::Url;

/// Parses a server base URL. Unlike a browser address bar no scheme is
/// guessed: the input must already be an absolute http(s) URL.
/// A trailing slash is added so relative endpoints join under the path.
pub fn parse_base_url(input: &str) -> Result<Url, String> {
    let trimmed = input.trim();
    let mut url = Url::parse(trimmed).map_err(|e| format!("{trimmed:?}: {e}"))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("{trimmed:?}: unsupported scheme {:?}", url.scheme()));
    }
    if url.cannot_be_a_base() {
        return Err(format!("{trimmed:?}: not a base URL"));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Joins `path` (e.g. `"messages"`) under `base`.
pub fn endpoint_url(base: &Url, path: &str) -> Result<Url, url::ParseError> {
    base.join(path.trim_start_matches('/'))
}
