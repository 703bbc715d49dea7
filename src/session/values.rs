use std::collections::HashMap;

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::codec::{self, deserialize_value, serialize_value};

/// The key/value mapping held by a session.
///
/// Values are kept serialized, one entry per key, and deserialized on
/// demand, so a session can hold values of different types side by side.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Values(HashMap<String, Vec<u8>>);

impl Values {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value stored under `key`, deserialized as `T`.
    pub fn get<T>(&self, key: &str) -> Result<Option<T>, codec::Error>
    where
        T: DeserializeOwned,
    {
        self.0
            .get(key)
            .map(|value| deserialize_value(value))
            .transpose()
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub fn insert<T>(&mut self, key: impl Into<String>, value: &T) -> Result<(), codec::Error>
    where
        T: Serialize + ?Sized,
    {
        self.0.insert(key.into(), serialize_value(value)?);
        Ok(())
    }

    /// Removes `key`, returning whether it was present.
    pub fn remove(&mut self, key: &str) -> bool {
        self.0.remove(key).is_some()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}
