//! # Sealstore: server-side sessions behind authenticated cookies
//!
//! `sealstore` keeps session values in a backing store (in memory, Postgres or
//! Redis) and hands the client nothing but a signed, optionally encrypted,
//! cookie carrying the session ID. A tampered, forged or expired cookie never
//! resolves to a session; the caller gets a fresh one instead.
//!
//! # Quick Start
//!
//! Here's a basic example with [Axum](https://docs.rs/axum/latest/axum/) and the
//! in-memory store. This requires the `axum` feature (enabled by default).
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use axum::{Router, extract::State, routing::get};
//! use sealstore::store::MemoryStore;
//! use sealstore::{KeyPair, Registry, SessionLayer, SessionStore};
//! use tower_cookies::CookieManagerLayer;
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = SessionStore::new(
//!         MemoryStore::new(),
//!         "sessions",
//!         [KeyPair::new(b"a-long-random-authentication-key")
//!             .with_block_key(*b"an-aes-256-key-is-32-bytes-long!")],
//!     )
//!     .await
//!     .unwrap();
//!
//!     let app = Router::new()
//!         .route("/", get(handler))
//!         .layer(SessionLayer::new())
//!         .layer(CookieManagerLayer::new()) // CookieManagerLayer must be after
//!         .with_state(Arc::new(store));
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
//!     axum::serve(listener, app).await.unwrap();
//! }
//!
//! async fn handler(
//!     State(store): State<Arc<SessionStore<MemoryStore>>>,
//!     registry: Registry,
//! ) -> String {
//!     let session = store.get(&registry, "app").await.session;
//!     let count = {
//!         let mut session = session.lock().await;
//!         let count = session.get::<u32>("count").unwrap().unwrap_or(0) + 1;
//!         session.insert("count", &count).unwrap();
//!         count
//!     };
//!     store.save_all(&registry).await.unwrap();
//!     format!("You've visited this page {count} times")
//! }
//! ```
//!
//! # Without middleware
//!
//! [`SessionStore::load`] and [`SessionStore::save`] work on anything
//! implementing [`Jar`], including a plain [`cookie::CookieJar`]:
//!
//! ```rust
//! use sealstore::cookie::CookieJar;
//! use sealstore::store::MemoryStore;
//! use sealstore::{KeyPair, SessionStore};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let store = SessionStore::new(MemoryStore::new(), "sessions", [KeyPair::new(b"key")])
//!     .await
//!     .unwrap();
//!
//! let mut jar = CookieJar::new();
//! let loaded = store.load(&jar, "app").await;
//! assert!(loaded.is_ok());
//!
//! let mut session = loaded.session;
//! session.insert("user", "ferris").unwrap();
//! store.save(&mut jar, &mut session).await.unwrap();
//! assert!(jar.get("app").is_some());
//! # }
//! ```
//!
//! # Stores
//!
//! Every backend implements [`store::RecordStore`].
//!
//! - [`store::MemoryStore`]: always available, for tests and single-process apps.
//! - `store::postgres::PostgresStore`: the `postgres-store` feature.
//! - `store::redis::RedisStore`: the `redis-store` feature.
//!
//! ## Serialization
//! Session values are serialized with one of two backends:
//!
//! - [`bincode`](https://crates.io/crates/bincode) (default) - Fast, compact binary serialization.
//! - [`rmp-serde`](https://crates.io/crates/rmp-serde) (MessagePack) - Cross-language compatible serialization.
//!
//! ```toml
//! [dependencies]
//! sealstore = { version = "0.1", default-features = false, features = ["axum", "messagepack"] }
//! ```
//!
//! # Important Notes
//!
//! - Keys: the authentication key should be 32 or 64 random bytes. The
//!   optional block key must be exactly 32 bytes (AES-256).
//! - Key rotation: put the new [`KeyPair`] first. Cookies issued under older
//!   pairs keep decoding while they remain in the list.
//! - Always save before the response is sent; cookies set afterwards are lost.

pub use cookie;

#[cfg(feature = "axum")]
mod extract;

#[cfg(feature = "redis-store")]
pub use fred;

#[cfg(feature = "postgres-store")]
pub use sqlx;

pub mod codec;
pub use codec::{Codec, KeyPair};

mod error;
pub use error::{Cause, Error};

mod jar;
pub use jar::Jar;

mod service;
pub use service::*;

mod session;
pub use session::*;

mod sessions;
pub use sessions::*;

pub mod store;

pub use tower_cookies;
