use serde::{Serialize, de::DeserializeOwned};

use crate::codec::Error;

#[cfg(not(any(feature = "bincode", feature = "messagepack")))]
compile_error!("sealstore requires either the 'bincode' or the 'messagepack' feature to be enabled");

#[cfg(feature = "bincode")]
pub(crate) fn serialize_value<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, Error> {
    bincode::serde::encode_to_vec(value, bincode::config::standard())
        .map_err(|e| Error::Encode(e.to_string()))
}

#[cfg(feature = "bincode")]
pub(crate) fn deserialize_value<T: DeserializeOwned>(value: &[u8]) -> Result<T, Error> {
    bincode::serde::decode_from_slice(value, bincode::config::standard())
        .map(|(value, _)| value)
        .map_err(|e| Error::Decode(e.to_string()))
}

#[cfg(all(feature = "messagepack", not(feature = "bincode")))]
pub(crate) fn serialize_value<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, Error> {
    rmp_serde::to_vec(value).map_err(|e| Error::Encode(e.to_string()))
}

#[cfg(all(feature = "messagepack", not(feature = "bincode")))]
pub(crate) fn deserialize_value<T: DeserializeOwned>(value: &[u8]) -> Result<T, Error> {
    rmp_serde::from_slice(value).map_err(|e| Error::Decode(e.to_string()))
}
