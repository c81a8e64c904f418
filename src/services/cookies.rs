//! Session cookie store shared by a request and its response.
//!
//! The auth client only ever reads all cookies or writes a batch of them.
//! A write is visible immediately to later reads (and to the forwarded
//! request once [`SessionCookies::apply_to_request`] runs) and is queued as a
//! `Set-Cookie` header for the outbound response.

use std::sync::{Mutex, MutexGuard, PoisonError};

use axum::http::{header, HeaderMap, HeaderValue};
use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;

/// Lifetime of the session cookie in the browser
const SESSION_COOKIE_MAX_AGE_DAYS: i64 = 400;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieEntry {
    pub name: String,
    pub value: String,
}

/// Attributes applied to an outbound cookie
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieOptions {
    pub path: Option<String>,
    pub max_age: Option<Duration>,
    pub http_only: bool,
    pub secure: bool,
    pub same_site: Option<SameSite>,
}

impl CookieOptions {
    /// Attributes of the session cookie
    pub fn session(secure: bool) -> Self {
        Self {
            path: Some("/".to_string()),
            max_age: Some(Duration::days(SESSION_COOKIE_MAX_AGE_DAYS)),
            http_only: true,
            secure,
            same_site: Some(SameSite::Lax),
        }
    }
}

/// One cookie write requested by the auth client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieToSet {
    pub name: String,
    pub value: String,
    pub options: CookieOptions,
}

impl CookieToSet {
    pub fn new(name: impl Into<String>, value: impl Into<String>, options: CookieOptions) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            options,
        }
    }

    /// A write that deletes `name`
    pub fn removal(name: impl Into<String>, options: CookieOptions) -> Self {
        Self::new(name, String::new(), options)
    }

    fn is_removal(&self) -> bool {
        self.value.is_empty() || self.options.max_age.map_or(false, |age| age <= Duration::ZERO)
    }

    fn to_cookie(&self) -> Cookie<'static> {
        let mut builder = Cookie::build((self.name.clone(), self.value.clone()))
            .http_only(self.options.http_only)
            .secure(self.options.secure);
        if let Some(ref path) = self.options.path {
            builder = builder.path(path.clone());
        }
        if self.is_removal() {
            builder = builder.max_age(Duration::ZERO);
        } else if let Some(max_age) = self.options.max_age {
            builder = builder.max_age(max_age);
        }
        if let Some(same_site) = self.options.same_site {
            builder = builder.same_site(same_site);
        }
        builder.build()
    }
}

/// Bulk cookie access used by the auth client
pub trait CookieStore: Send + Sync {
    /// Current cookies, in request order
    fn get_all(&self) -> Vec<CookieEntry>;

    /// Apply every write to the current view and queue it for the response
    fn set_all(&self, cookies: Vec<CookieToSet>);
}

#[derive(Debug, Default)]
struct CookieState {
    current: Vec<CookieEntry>,
    outgoing: Vec<Cookie<'static>>,
}

/// Per-request cookie jar; also serves as the client-side jar when built empty
#[derive(Debug, Default)]
pub struct SessionCookies {
    state: Mutex<CookieState>,
}

impl SessionCookies {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the `Cookie` headers of an inbound request
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let current = headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(Cookie::split_parse)
            .filter_map(Result::ok)
            .map(|cookie| CookieEntry {
                name: cookie.name().to_string(),
                value: cookie.value().to_string(),
            })
            .collect();

        Self {
            state: Mutex::new(CookieState {
                current,
                outgoing: Vec::new(),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, CookieState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Value of a single cookie
    pub fn get(&self, name: &str) -> Option<String> {
        self.state()
            .current
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.value.clone())
    }

    /// True once any write has been queued for the response
    pub fn has_changes(&self) -> bool {
        !self.state().outgoing.is_empty()
    }

    /// Queued `Set-Cookie` header values
    pub fn pending_set_cookies(&self) -> Vec<String> {
        self.state().outgoing.iter().map(|c| c.to_string()).collect()
    }

    /// Rewrite the forwarded request's `Cookie` header from the current view
    pub fn apply_to_request(&self, headers: &mut HeaderMap) {
        let state = self.state();
        headers.remove(header::COOKIE);
        if state.current.is_empty() {
            return;
        }
        let joined = state
            .current
            .iter()
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; ");
        match HeaderValue::from_str(&joined) {
            Ok(value) => {
                headers.insert(header::COOKIE, value);
            }
            Err(e) => tracing::warn!("Dropping unencodable cookie header: {}", e),
        }
    }

    /// Append one `Set-Cookie` header per queued write
    pub fn apply_to_response(&self, headers: &mut HeaderMap) {
        for cookie in &self.state().outgoing {
            match HeaderValue::from_str(&cookie.to_string()) {
                Ok(value) => {
                    headers.append(header::SET_COOKIE, value);
                }
                Err(e) => tracing::warn!("Dropping unencodable cookie {}: {}", cookie.name(), e),
            }
        }
    }
}

impl CookieStore for SessionCookies {
    fn get_all(&self) -> Vec<CookieEntry> {
        self.state().current.clone()
    }

    fn set_all(&self, cookies: Vec<CookieToSet>) {
        let mut state = self.state();
        for cookie in cookies {
            state.current.retain(|c| c.name != cookie.name);
            if !cookie.is_removal() {
                state.current.push(CookieEntry {
                    name: cookie.name.clone(),
                    value: cookie.value.clone(),
                });
            }

            state.outgoing.retain(|c| c.name() != cookie.name);
            state.outgoing.push(cookie.to_cookie());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_headers(cookie: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(cookie).unwrap());
        headers
    }

    #[test]
    fn test_reads_request_cookies_in_order() {
        let store = SessionCookies::from_headers(&request_headers("b=2; a=1;  theme=dark"));
        let names: Vec<_> = store.get_all().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["b", "a", "theme"]);
        assert_eq!(store.get("a").as_deref(), Some("1"));
        assert!(!store.has_changes());
    }

    #[test]
    fn test_skips_malformed_pairs() {
        let store = SessionCookies::from_headers(&request_headers("=orphan; token=abc==; ; flag"));
        let entries = store.get_all();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "token");
        assert_eq!(entries[0].value, "abc==");
    }

    #[test]
    fn test_absent_cookies_are_empty() {
        let store = SessionCookies::from_headers(&HeaderMap::new());
        assert!(store.get_all().is_empty());
        assert_eq!(store.get("sb-auth-token"), None);
    }

    #[test]
    fn test_set_is_visible_to_request_and_response() {
        let store = SessionCookies::from_headers(&request_headers("token=old; other=x"));
        store.set_all(vec![CookieToSet::new("token", "new", CookieOptions::session(false))]);

        assert_eq!(store.get("token").as_deref(), Some("new"));

        let mut forwarded = request_headers("token=old; other=x");
        store.apply_to_request(&mut forwarded);
        assert_eq!(forwarded[header::COOKIE], "other=x; token=new");

        let mut response = HeaderMap::new();
        store.apply_to_response(&mut response);
        let set_cookie = response[header::SET_COOKIE].to_str().unwrap();
        assert!(set_cookie.starts_with("token=new"));
        assert!(set_cookie.contains("HttpOnly"));
        assert!(set_cookie.contains("Path=/"));
    }

    #[test]
    fn test_removal_drops_cookie_and_expires_it() {
        let store = SessionCookies::from_headers(&request_headers("token=old"));
        store.set_all(vec![CookieToSet::removal("token", CookieOptions::session(false))]);

        assert_eq!(store.get("token"), None);

        let mut forwarded = request_headers("token=old");
        store.apply_to_request(&mut forwarded);
        assert!(forwarded.get(header::COOKIE).is_none());

        let pending = store.pending_set_cookies();
        assert_eq!(pending.len(), 1);
        assert!(pending[0].contains("Max-Age=0"));
    }

    #[test]
    fn test_repeated_writes_keep_latest() {
        let store = SessionCookies::new();
        store.set_all(vec![CookieToSet::new("token", "first", CookieOptions::default())]);
        store.set_all(vec![CookieToSet::new("token", "second", CookieOptions::default())]);

        let pending = store.pending_set_cookies();
        assert_eq!(pending.len(), 1);
        assert!(pending[0].starts_with("token=second"));
        assert_eq!(store.get_all().len(), 1);
    }
}
