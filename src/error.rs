use thiserror::Error;

use crate::{codec, store};

/// Errors returned by [`SessionStore`](crate::SessionStore).
///
/// The variant tells which operation failed; the wrapped [`Cause`] tells why.
#[derive(Error, Debug)]
pub enum Error {
    /// The store could not be constructed.
    #[error("could not create sessions table: {0}")]
    Create(#[source] Cause),

    /// An existing session could not be loaded. The caller still receives a
    /// fresh session alongside this error.
    #[error("could not load session data: {0}")]
    Load(#[source] Cause),

    /// The session was not durably persisted.
    #[error("could not save session data: {0}")]
    Save(#[source] Cause),
}

impl Error {
    pub fn cause(&self) -> &Cause {
        match self {
            Self::Create(cause) | Self::Load(cause) | Self::Save(cause) => cause,
        }
    }
}

#[derive(Error, Debug)]
pub enum Cause {
    #[error("invalid table name {0:?}: only ASCII letters, digits and underscores are allowed")]
    InvalidTableName(String),

    #[error(transparent)]
    Codec(#[from] codec::Error),

    #[error(transparent)]
    Store(#[from] store::Error),

    #[error("no record found for the session")]
    NotFound,
}
