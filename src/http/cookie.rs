//! Session cookie handling for providers that authenticate by cookie

/// Reduces raw `Set-Cookie` header values to a `Cookie` request header.
///
/// Attributes such as `Path` or `HttpOnly` are dropped; only the leading
/// `name=value` of each header is kept. Returns `None` when nothing usable
/// was set.
pub fn session_cookie<'a, I>(set_cookie_headers: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let cookies: Vec<&str> = set_cookie_headers
        .into_iter()
        .filter_map(|cookie| cookie.split(';').next())
        .map(str::trim)
        .filter(|pair| pair.contains('='))
        .collect();

    if cookies.is_empty() {
        None
    } else {
        Some(cookies.join("; "))
    }
}

/// Cookie used by token-authenticated recorders (`token=<key>`)
pub fn token_cookie(key: &str) -> String {
    format!("token={key}")
}
