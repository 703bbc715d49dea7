//! The session store: resolves sessions from requests and persists them.

use crate::codec::{self, Codec, KeyPair};
use crate::jar::Jar;
use crate::session::{Id, Loaded, Options, Session, Values};
use crate::store::RecordStore;
use crate::{Cause, Error};

mod registry;
pub use registry::{Registry, SharedSession};

/// A session store persisting session values in a [`RecordStore`] and
/// identifying sessions through an authenticated cookie.
///
/// `options` and `codecs` are the defaults used for sessions created from now
/// on. Configure them before sharing the store (typically behind an
/// [`Arc`](std::sync::Arc)); sessions that already exist keep their own copy of
/// the options.
///
/// # Example
///
/// ```rust
/// use sealstore::cookie::CookieJar;
/// use sealstore::store::MemoryStore;
/// use sealstore::{KeyPair, SessionStore};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), sealstore::Error> {
/// let store = SessionStore::new(
///     MemoryStore::new(),
///     "sessions",
///     [KeyPair::new(b"a-long-random-authentication-key")],
/// )
/// .await?;
///
/// let mut jar = CookieJar::new();
/// let mut session = store.load(&jar, "app").await.session;
/// session.insert("visits", &1u32).unwrap();
/// store.save(&mut jar, &mut session).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct SessionStore<S: RecordStore> {
    pub options: Options,
    pub codecs: Vec<Codec>,
    backend: S,
    table: String,
}

impl<S> SessionStore<S>
where
    S: RecordStore,
{
    /// Creates a store over `backend`, provisioning `table` if needed.
    ///
    /// `table` may only contain ASCII letters, digits and underscores. The
    /// first key pair encodes new values; all of them are tried when decoding.
    #[tracing::instrument(name = "creating session store", skip(backend, key_pairs))]
    pub async fn new<I>(backend: S, table: &str, key_pairs: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = KeyPair>,
    {
        if !is_valid_table_name(table) {
            tracing::error!("refusing to use an invalid table name");
            return Err(Error::Create(Cause::InvalidTableName(table.to_owned())));
        }

        let codecs = codec::codecs_from_pairs(key_pairs).map_err(|err| {
            tracing::error!(err = %err, "invalid session keys");
            Error::Create(err.into())
        })?;

        backend.ensure_schema(table).await.map_err(|err| {
            tracing::error!(err = %err, "failed to provision the sessions table");
            Error::Create(err.into())
        })?;

        Ok(Self {
            options: Options::default(),
            codecs,
            backend,
            table: table.to_owned(),
        })
    }

    /// Sets the default session lifetime and the maximum age accepted by
    /// every codec to `seconds`.
    pub fn max_age(&mut self, seconds: i64) {
        self.options.max_age = seconds;
        for codec in &mut self.codecs {
            codec.set_max_age(seconds);
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    /// Returns the session called `name` for the request behind `registry`.
    ///
    /// The first lookup of a name loads it like [`SessionStore::load`]; later
    /// lookups within the same request return the same shared session.
    /// Should two lookups of one name race, the session recorded first is
    /// returned to both, and only its own load error is reported.
    #[tracing::instrument(name = "getting session from registry", skip(self, registry))]
    pub async fn get(&self, registry: &Registry, name: &str) -> Loaded<SharedSession> {
        if let Some(session) = registry.cached(name) {
            return Loaded::fresh(session);
        }

        let (session, error) = self.load(registry.cookies(), name).await.into_parts();
        match registry.memoize(name, session) {
            (shared, true) => Loaded {
                session: shared,
                error,
            },
            (shared, false) => Loaded::fresh(shared),
        }
    }

    /// Creates the session called `name`, loading its values when `jar`
    /// carries a valid cookie for it.
    ///
    /// Never fails outright: on error the returned session is fresh and empty
    /// and [`Loaded::error`] says what went wrong.
    #[tracing::instrument(name = "loading session", skip(self, jar))]
    pub async fn load<J>(&self, jar: &J, name: &str) -> Loaded
    where
        J: Jar + ?Sized,
    {
        let mut session = Session::new(name, self.options.clone());

        let Some(cookie) = jar.get_cookie(name) else {
            return Loaded::fresh(session);
        };

        match self.resolve(name, &cookie).await {
            Ok((id, values)) => {
                session.loaded(id, values);
                Loaded::fresh(session)
            }
            Err(cause) => {
                match &cause {
                    Cause::Codec(err) => tracing::warn!(
                        err = %err,
                        "possibly suspicious activity: malformed session cookie"
                    ),
                    Cause::NotFound => tracing::debug!("session record not found or expired"),
                    err => tracing::error!(err = %err, "failed to load session from store"),
                }
                Loaded {
                    session,
                    error: Some(Error::Load(cause)),
                }
            }
        }
    }

    async fn resolve(&self, name: &str, cookie: &str) -> Result<(Id, Values), Cause> {
        let id: Id = codec::decode_multi(name, cookie, &self.codecs)?;
        let payload = self
            .backend
            .get(&self.table, &id)
            .await?
            .ok_or(Cause::NotFound)?;
        let values = codec::decode_multi(name, &payload, &self.codecs)?;
        Ok((id, values))
    }

    /// Persists `session` and sets its cookie on `jar`.
    ///
    /// A `max_age` of `0` or less deletes the stored record and clears the
    /// cookie instead. Must run before the response is sent.
    ///
    /// If the record is written but the cookie cannot be encoded, the record
    /// is left in place until its TTL runs out.
    #[tracing::instrument(name = "saving session", skip_all, fields(name = session.name()))]
    pub async fn save<J>(&self, jar: &mut J, session: &mut Session) -> Result<(), Error>
    where
        J: Jar + ?Sized,
    {
        if session.options.max_age <= 0 {
            if let Some(id) = session.id() {
                self.backend.delete(&self.table, &id).await.map_err(|err| {
                    tracing::error!(err = %err, "failed to delete session from store");
                    Error::Save(err.into())
                })?;
            }

            jar.set_cookie(session.options.removal_cookie(session.name()));
            return Ok(());
        }

        let id = session.id_or_gen();

        let payload = codec::encode_multi(session.name(), &session.values, &self.codecs)
            .map_err(|err| {
                tracing::error!(err = %err, "failed to encode session values");
                Error::Save(err.into())
            })?;

        self.backend
            .put(&self.table, &id, &payload, session.options.max_age)
            .await
            .map_err(|err| {
                tracing::error!(err = %err, "failed to save session to store");
                Error::Save(err.into())
            })?;

        let cookie = codec::encode_multi(session.name(), &id, &self.codecs).map_err(|err| {
            tracing::error!(err = %err, "failed to encode session id");
            Error::Save(err.into())
        })?;
        jar.set_cookie(session.options.cookie(session.name(), cookie));

        Ok(())
    }

    /// Saves every session resolved through `registry` during this request.
    pub async fn save_all(&self, registry: &Registry) -> Result<(), Error> {
        let mut cookies = registry.cookies().clone();
        for session in registry.sessions() {
            let mut session = session.lock().await;
            self.save(&mut cookies, &mut session).await?;
        }
        Ok(())
    }
}

fn is_valid_table_name(table: &str) -> bool {
    !table.is_empty()
        && table
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}
