#![allow(dead_code)]

use cookie::{Cookie, CookieJar};
use sealstore::store::RecordStore;
use sealstore::{KeyPair, SessionStore};
use serde::{Deserialize, Serialize};

pub const TABLE: &str = "sessions";
pub const SESSION_NAME: &str = "test_sess";

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct TestUser {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct TestPreferences {
    pub theme: String,
    pub language: String,
}

pub fn create_test_user() -> TestUser {
    TestUser {
        id: 1,
        name: "Test User".to_string(),
    }
}

pub fn create_test_preferences() -> TestPreferences {
    TestPreferences {
        theme: "dark".to_string(),
        language: "en".to_string(),
    }
}

pub fn signing_keys() -> KeyPair {
    KeyPair::new(b"0123456789abcdef0123456789abcdef")
}

pub fn encryption_keys() -> KeyPair {
    signing_keys().with_block_key(*b"fedcba9876543210fedcba9876543210")
}

pub async fn build_store<S: RecordStore>(backend: S) -> SessionStore<S> {
    SessionStore::new(backend, TABLE, [encryption_keys()])
        .await
        .unwrap()
}

/// Simulates the next request: a jar holding only the cookies the previous
/// response set, as a browser would send them back.
pub fn next_request(response: &CookieJar) -> CookieJar {
    let mut jar = CookieJar::new();
    for cookie in response.delta() {
        if !cookie.value().is_empty() {
            jar.add_original(Cookie::new(
                cookie.name().to_owned(),
                cookie.value().to_owned(),
            ));
        }
    }
    jar
}

pub fn response_cookie<'a>(jar: &'a CookieJar, name: &str) -> Option<&'a Cookie<'static>> {
    jar.delta().find(|cookie| cookie.name() == name)
}
