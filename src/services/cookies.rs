// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session cookies.

use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;

pub const ACCESS_COOKIE: &str = "accessToken";
pub const REFRESH_COOKIE: &str = "refreshToken";

fn session_cookie(name: &'static str, value: String, max_age: Duration) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(max_age)
        .build()
}

pub fn access_cookie(token: &str, max_age_secs: i64) -> Cookie<'static> {
    session_cookie(ACCESS_COOKIE, token.to_string(), Duration::seconds(max_age_secs))
}

pub fn refresh_cookie(token: &str, max_age_secs: i64) -> Cookie<'static> {
    session_cookie(REFRESH_COOKIE, token.to_string(), Duration::seconds(max_age_secs))
}

/// Expired cookies that make the browser drop both tokens.
pub fn cleared_cookies() -> [Cookie<'static>; 2] {
    [
        session_cookie(ACCESS_COOKIE, String::new(), Duration::ZERO),
        session_cookie(REFRESH_COOKIE, String::new(), Duration::ZERO),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_cookie_attributes() {
        let cookie = access_cookie("abc", 3600);
        let rendered = cookie.to_string();

        assert_eq!(cookie.name(), "accessToken");
        assert_eq!(cookie.value(), "abc");
        assert!(rendered.contains("HttpOnly"));
        assert!(rendered.contains("Secure"));
        assert!(rendered.contains("SameSite=Lax"));
        assert!(rendered.contains("Path=/"));
        assert!(rendered.contains("Max-Age=3600"));
    }

    #[test]
    fn test_cleared_cookies_expire_immediately() {
        for cookie in cleared_cookies() {
            assert_eq!(cookie.value(), "");
            assert!(cookie.to_string().contains("Max-Age=0"));
        }
    }

    #[test]
    fn test_refresh_cookie_name() {
        assert_eq!(refresh_cookie("r", 10).name(), REFRESH_COOKIE);
    }
}
