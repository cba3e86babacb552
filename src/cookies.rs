//! Cookie names, `Set-Cookie` rendering, and the one read interface shared by live
//! requests and standalone jars.

use std::collections::BTreeMap;

use axum::http::{header, HeaderMap, HeaderValue};

pub const AUTH_SESSION_COOKIE: &str = "hot_auth_session";
pub const AUTH_CHALLENGE_COOKIE: &str = "hot_auth_challenge";
pub const WALLET_COOKIE: &str = "hot_wallet";

pub const AUTH_CHALLENGE_MAX_AGE_SECONDS: i64 = 60 * 10;
pub const AUTH_SESSION_MAX_AGE_SECONDS: i64 = 60 * 60 * 24 * 7;

/// Something that can hand back a named cookie's value.
pub trait CookieSource {
    fn cookie(&self, name: &str) -> Option<String>;
}

impl CookieSource for HeaderMap {
    fn cookie(&self, name: &str) -> Option<String> {
        self.get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find_map(|raw| parse_cookie_header(raw).remove(name))
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CookieJar {
    values: BTreeMap<String, String>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_header(raw: &str) -> Self {
        Self {
            values: parse_cookie_header(raw),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.values.remove(name)
    }

    /// Folds a response's `Set-Cookie` headers into the jar the way a browser
    /// would: `Max-Age=0` or an empty value deletes.
    pub fn apply_set_cookies(&mut self, headers: &HeaderMap) {
        for raw in headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
        {
            let mut parts = raw.split(';');
            let Some((name, value)) = parts.next().and_then(|kv| kv.split_once('=')) else {
                continue;
            };
            let expired = parts.any(|attr| attr.trim().eq_ignore_ascii_case("max-age=0"));
            let (name, value) = (name.trim(), value.trim());
            if expired || value.is_empty() {
                self.values.remove(name);
            } else {
                self.values.insert(name.to_string(), value.to_string());
            }
        }
    }

    pub fn to_header(&self) -> String {
        self.values
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl CookieSource for CookieJar {
    fn cookie(&self, name: &str) -> Option<String> {
        self.values.get(name).cloned()
    }
}

/// Last duplicate wins; nameless and valueless pairs are dropped.
pub fn parse_cookie_header(raw: &str) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    for part in raw.split(';') {
        let (name, value) = part.split_once('=').unwrap_or((part, ""));
        let (name, value) = (name.trim(), value.trim());
        if name.is_empty() || value.is_empty() {
            continue;
        }
        out.insert(name.to_string(), percent_decode(value));
    }
    out
}

/// Lenient `%XX` decoding; malformed escapes are kept literally.
fn percent_decode(value: &str) -> String {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hi = char::from(bytes[i + 1]).to_digit(16);
            let lo = char::from(bytes[i + 2]).to_digit(16);
            if let (Some(hi), Some(lo)) = (hi, lo) {
                out.push((hi * 16 + lo) as u8);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8(out).unwrap_or_else(|_| value.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CookieOptions {
    pub secure: bool,
    pub max_age: i64,
}

impl CookieOptions {
    pub fn new(secure: bool, max_age: i64) -> Self {
        Self { secure, max_age }
    }

    pub fn expired(secure: bool) -> Self {
        Self { secure, max_age: 0 }
    }
}

/// Renders an `HttpOnly; SameSite=Lax` cookie scoped to `/`.
pub fn build_set_cookie(name: &str, value: &str, opts: CookieOptions) -> HeaderValue {
    let mut cookie = format!(
        "{name}={value}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
        opts.max_age.max(0)
    );
    if opts.secure {
        cookie.push_str("; Secure");
    }
    // Names and values here are base64url or fixed constants, never control bytes.
    HeaderValue::from_str(&cookie).unwrap_or_else(|_| HeaderValue::from_static(""))
}

pub fn build_clear_cookie(name: &str, secure: bool) -> HeaderValue {
    build_set_cookie(name, "", CookieOptions::expired(secure))
}
