use axum::extract::State;
use axum::http::StatusCode;
use axum::{Router, routing::get};
use sealstore::store::MemoryStore;
use sealstore::{KeyPair, Options, Registry, SessionLayer, SessionStore};
use std::sync::Arc;
use tower_cookies::CookieManagerLayer;
use tracing_subscriber::EnvFilter;

type Store = Arc<SessionStore<MemoryStore>>;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "sealstore=debug".into()))
        .init();

    // Sign and encrypt session cookies and records
    let keys = KeyPair::new(b"replace-with-64-random-bytes-in-production")
        .with_block_key(*b"replace-with-32-random-bytes!!!!");

    // Create session store
    let mut store = SessionStore::new(MemoryStore::new(), "sessions", [keys])
        .await
        .unwrap();
    store.max_age(3600); // 1 hour
    store.options = Options::build()
        .max_age(3600)
        .secure(false) // plain http on localhost
        .same_site(cookie::SameSite::Lax);

    // Set up router with session management
    let app = Router::new()
        .route("/", get(handler))
        .route("/logout", get(logout))
        .layer(SessionLayer::new())
        .layer(CookieManagerLayer::new())
        .with_state(Arc::new(store));

    // Run the server
    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

async fn handler(State(store): State<Store>, registry: Registry) -> Result<String, StatusCode> {
    let loaded = store.get(&registry, "counter").await;
    if let Some(err) = &loaded.error {
        tracing::info!(%err, "starting a new session");
    }

    let count = {
        let mut session = loaded.session.lock().await;
        let count = session.get::<i32>("count").ok().flatten().unwrap_or(0) + 1;
        session
            .insert("count", &count)
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
        count
    };

    store
        .save_all(&registry)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(format!("You've visited this page {count} times"))
}

async fn logout(State(store): State<Store>, registry: Registry) -> Result<&'static str, StatusCode> {
    let session = store.get(&registry, "counter").await.session;
    session.lock().await.options.max_age = -1;

    store
        .save_all(&registry)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok("Logged out")
}
