//! Session cookie header values.

use axum::http::HeaderMap;
use axum::http::header::{AUTHORIZATION, COOKIE};

use crate::config::SessionConfig;

fn attributes(config: &SessionConfig) -> &'static str {
    if config.secure_cookie {
        "SameSite=None; Secure"
    } else {
        "SameSite=Lax"
    }
}

/// `Set-Cookie` value carrying a freshly issued session token.
pub fn session_cookie(config: &SessionConfig, token: &str) -> String {
    format!(
        "{}={}; HttpOnly; Path=/; Max-Age={}; {}",
        config.cookie_name,
        token,
        config.ttl_hours * 3600,
        attributes(config)
    )
}

/// `Set-Cookie` value that expires the session cookie immediately.
pub fn clear_session_cookie(config: &SessionConfig) -> String {
    format!(
        "{}=; HttpOnly; Path=/; Max-Age=0; {}",
        config.cookie_name,
        attributes(config)
    )
}

/// Reads the session token from the cookie, falling back to a Bearer header.
pub fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let from_cookie = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == cookie_name && !value.is_empty())
        .map(|(_, value)| value.to_string());

    from_cookie.or_else(|| {
        headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::to_string)
    })
}
