//! The request-scoped session entity.

use serde::{Serialize, de::DeserializeOwned};

use crate::Error;
use crate::codec;

mod id;
mod options;
mod values;

pub use id::Id;
pub use options::{DEFAULT_MAX_AGE, Options};
pub use values::Values;

/// A session as seen by one request.
///
/// Sessions are produced by [`SessionStore::load`](crate::SessionStore::load)
/// (or [`SessionStore::get`](crate::SessionStore::get)), mutated by the handler
/// and written back with [`SessionStore::save`](crate::SessionStore::save).
/// The identifier is assigned on the first save and never changes afterwards.
#[derive(Clone, Debug)]
pub struct Session {
    id: Option<Id>,
    name: String,
    is_new: bool,
    pub values: Values,
    pub options: Options,
}

impl Session {
    /// Creates a fresh session named `name` with its own copy of `options`.
    pub fn new(name: impl Into<String>, options: Options) -> Self {
        Self {
            id: None,
            name: name.into(),
            is_new: true,
            values: Values::new(),
            options,
        }
    }

    /// Returns the session ID, if one has been assigned.
    pub fn id(&self) -> Option<Id> {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `true` until the session has been loaded from an existing cookie and record.
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn get<T>(&self, key: &str) -> Result<Option<T>, codec::Error>
    where
        T: DeserializeOwned,
    {
        self.values.get(key)
    }

    pub fn insert<T>(&mut self, key: impl Into<String>, value: &T) -> Result<(), codec::Error>
    where
        T: Serialize + ?Sized,
    {
        self.values.insert(key, value)
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.values.remove(key)
    }

    pub(crate) fn loaded(&mut self, id: Id, values: Values) {
        self.id = Some(id);
        self.values = values;
        self.is_new = false;
    }

    pub(crate) fn id_or_gen(&mut self) -> Id {
        *self.id.get_or_insert_with(Id::new)
    }
}

/// The outcome of resolving a session from a request.
///
/// A session is always available: when the cookie is forged or expired, or
/// the record cannot be read, `session` is a fresh, empty session and `error`
/// explains why the existing one could not be loaded.
#[derive(Debug)]
#[must_use]
pub struct Loaded<T = Session> {
    pub session: T,
    pub error: Option<Error>,
}

impl<T> Loaded<T> {
    pub(crate) fn fresh(session: T) -> Self {
        Self {
            session,
            error: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub fn into_parts(self) -> (T, Option<Error>) {
        (self.session, self.error)
    }

    /// Discards the fallback session when loading failed.
    pub fn into_result(self) -> Result<T, Error> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.session),
        }
    }
}
