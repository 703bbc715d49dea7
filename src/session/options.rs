use cookie::time::{Duration, OffsetDateTime};
use cookie::{Cookie, SameSite};

/// Default session lifetime: 30 days.
pub const DEFAULT_MAX_AGE: i64 = 86400 * 30;

/// Per-session cookie and persistence options.
///
/// A [`SessionStore`](crate::SessionStore) keeps one set of defaults and every
/// [`Session`](crate::Session) starts with its own copy, so changing a session's
/// options never leaks into the store or into other sessions.
///
/// `max_age` drives both the cookie's `Max-Age` and the record's TTL in the
/// backing store. A value of `0` or less deletes the session on the next save.
///
/// # Example
///
/// ```rust
/// use sealstore::Options;
/// use sealstore::cookie::SameSite;
///
/// let options = Options::build()
///     .path("/app")
///     .http_only(true)
///     .same_site(SameSite::Strict)
///     .secure(true)
///     .max_age(7200);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Options {
    pub path: Option<String>,
    pub domain: Option<String>,
    pub max_age: i64,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: SameSite,
    pub partitioned: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            path: Some("/".to_string()),
            domain: None,
            max_age: DEFAULT_MAX_AGE,
            secure: true,
            http_only: true,
            same_site: SameSite::Lax,
            partitioned: false,
        }
    }
}

impl Options {
    /// Creates a new `Options` with default values.
    pub fn build() -> Self {
        Self::default()
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Sets the session lifetime in seconds.
    pub fn max_age(mut self, seconds: i64) -> Self {
        self.max_age = seconds;
        self
    }

    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    pub fn same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = same_site;
        self
    }

    pub fn partitioned(mut self, partitioned: bool) -> Self {
        self.partitioned = partitioned;
        self
    }

    /// Builds the cookie carrying `value` under `name`.
    ///
    /// `Expires` is left out when it would fall past the representable range;
    /// `Max-Age` alone then governs the cookie.
    pub(crate) fn cookie(&self, name: &str, value: String) -> Cookie<'static> {
        let max_age = Duration::seconds(self.max_age);
        let builder = self.base(name.to_owned(), value).max_age(max_age);

        match OffsetDateTime::now_utc().checked_add(max_age) {
            Some(expires) => builder.expires(expires).build(),
            None => builder.build(),
        }
    }

    /// Builds a cookie that makes the client forget `name`.
    pub(crate) fn removal_cookie(&self, name: &str) -> Cookie<'static> {
        self.base(name.to_owned(), String::new())
            .max_age(Duration::seconds(-1))
            .expires(OffsetDateTime::UNIX_EPOCH)
            .build()
    }

    fn base(&self, name: String, value: String) -> cookie::CookieBuilder<'static> {
        let builder = Cookie::build((name, value))
            .secure(self.secure)
            .http_only(self.http_only)
            .same_site(self.same_site)
            .partitioned(self.partitioned);

        let builder = if let Some(domain) = &self.domain {
            builder.domain(domain.clone())
        } else {
            builder
        };

        if let Some(path) = &self.path {
            builder.path(path.clone())
        } else {
            builder
        }
    }
}
