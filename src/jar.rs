use cookie::{Cookie, CookieJar};
use tower_cookies::Cookies;

/// Access to the cookies of one request/response exchange.
///
/// Reads see the cookies sent by the client; writes end up as `Set-Cookie`
/// headers on the response. Implemented for [`cookie::CookieJar`] and for
/// [`tower_cookies::Cookies`].
pub trait Jar {
    /// Returns the value of the request cookie called `name`.
    fn get_cookie(&self, name: &str) -> Option<String>;

    /// Queues `cookie` to be sent with the response.
    fn set_cookie(&mut self, cookie: Cookie<'static>);
}

impl Jar for CookieJar {
    fn get_cookie(&self, name: &str) -> Option<String> {
        self.get(name).map(|cookie| cookie.value().to_owned())
    }

    fn set_cookie(&mut self, cookie: Cookie<'static>) {
        self.add(cookie);
    }
}

impl Jar for Cookies {
    fn get_cookie(&self, name: &str) -> Option<String> {
        self.get(name).map(|cookie| cookie.value().to_owned())
    }

    fn set_cookie(&mut self, cookie: Cookie<'static>) {
        self.add(cookie);
    }
}
