//! Authenticated, optionally encrypted, encoding of session values.
//!
//! Both the session cookie (which carries the session [`Id`](crate::Id)) and the
//! record persisted in the backing store are produced by a [`Codec`]. An encoded
//! value has the shape
//!
//! ```text
//! base64url( timestamp "|" base64url(body) "|" hmac-sha256 )
//! ```
//!
//! where `body` is the serialized value, sealed with AES-256-GCM when the
//! [`KeyPair`] carries a block key. The session name is part of the signed
//! message (and of the associated data when encrypting), so a value encoded
//! for one session name never decodes under another.
//!
//! Several codecs may be configured at once. [`encode_multi`] always uses the
//! first one while [`decode_multi`] tries them in order, which allows keys to
//! be rotated without invalidating existing sessions.

use std::fmt;

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::Engine;
use base64::prelude::BASE64_URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use rand::RngCore;
use serde::{Serialize, de::DeserializeOwned};
use sha2::Sha256;
use time::OffsetDateTime;

mod format;
pub(crate) use format::{deserialize_value, serialize_value};

type HmacSha256 = Hmac<Sha256>;

const NONCE_LEN: usize = 12;
const BLOCK_KEY_LEN: usize = 32;

/// Default lifetime of an encoded value: 30 days.
pub const DEFAULT_MAX_AGE: i64 = 86400 * 30;

/// Default upper bound for the length of an encoded value, in bytes.
pub const DEFAULT_MAX_LENGTH: usize = 4096;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("no codecs were provided")]
    NoCodecs,

    #[error("hash key must not be empty")]
    EmptyHashKey,

    #[error("block key must be {BLOCK_KEY_LEN} bytes, got {0}")]
    InvalidBlockKey(usize),

    #[error("Encoding failed with: {0}")]
    Encode(String),

    #[error("Decoding failed with: {0}")]
    Decode(String),

    #[error("the value could not be encrypted")]
    Encrypt,

    #[error("the value could not be decrypted")]
    Decrypt,

    #[error("the value is not in the expected format")]
    Malformed,

    #[error("the value is not valid: mac mismatch")]
    InvalidMac,

    #[error("the value carries an invalid timestamp")]
    InvalidTimestamp,

    #[error("the value has expired")]
    Expired,

    #[error("the value is too long: {len} bytes, at most {max} allowed")]
    TooLong { len: usize, max: usize },

    #[error(transparent)]
    Base64(#[from] base64::DecodeError),
}

/// Secret material for one [`Codec`].
///
/// The hash key authenticates values and is required. The block key is
/// optional; when present it must be 32 bytes and values are also encrypted.
///
/// # Example
///
/// ```rust
/// use sealstore::KeyPair;
///
/// let signed_only = KeyPair::new(b"a-long-random-authentication-key");
/// let sealed = KeyPair::new(b"a-long-random-authentication-key")
///     .with_block_key(*b"0123456789abcdef0123456789abcdef");
/// ```
#[derive(Clone)]
pub struct KeyPair {
    hash_key: Vec<u8>,
    block_key: Option<Vec<u8>>,
}

impl KeyPair {
    pub fn new(hash_key: impl Into<Vec<u8>>) -> Self {
        Self {
            hash_key: hash_key.into(),
            block_key: None,
        }
    }

    pub fn with_block_key(mut self, block_key: impl Into<Vec<u8>>) -> Self {
        self.block_key = Some(block_key.into());
        self
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("hash_key", &"[redacted]")
            .field("block_key", &self.block_key.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

/// Encodes and decodes values with one [`KeyPair`].
#[derive(Clone)]
pub struct Codec {
    mac: HmacSha256,
    cipher: Option<Aes256Gcm>,
    max_age: i64,
    max_length: usize,
}

impl Codec {
    pub fn new(pair: &KeyPair) -> Result<Self, Error> {
        if pair.hash_key.is_empty() {
            return Err(Error::EmptyHashKey);
        }
        let mac = <HmacSha256 as Mac>::new_from_slice(&pair.hash_key)
            .map_err(|_| Error::EmptyHashKey)?;

        let cipher = match &pair.block_key {
            Some(key) => Some(
                <Aes256Gcm as KeyInit>::new_from_slice(key)
                    .map_err(|_| Error::InvalidBlockKey(key.len()))?,
            ),
            None => None,
        };

        Ok(Self {
            mac,
            cipher,
            max_age: DEFAULT_MAX_AGE,
            max_length: DEFAULT_MAX_LENGTH,
        })
    }

    /// Sets how long, in seconds, an encoded value stays decodable.
    /// `0` disables the check.
    pub fn max_age(mut self, seconds: i64) -> Self {
        self.set_max_age(seconds);
        self
    }

    pub fn set_max_age(&mut self, seconds: i64) {
        self.max_age = seconds;
    }

    /// Sets the maximum length of an encoded value. `0` disables the check.
    pub fn max_length(mut self, length: usize) -> Self {
        self.max_length = length;
        self
    }

    pub fn is_encrypted(&self) -> bool {
        self.cipher.is_some()
    }

    pub fn encode<T>(&self, name: &str, value: &T) -> Result<String, Error>
    where
        T: Serialize + ?Sized,
    {
        self.encode_at(name, value, OffsetDateTime::now_utc().unix_timestamp())
    }

    fn encode_at<T>(&self, name: &str, value: &T, timestamp: i64) -> Result<String, Error>
    where
        T: Serialize + ?Sized,
    {
        let mut body = serialize_value(value)?;
        if let Some(cipher) = &self.cipher {
            body = encrypt(cipher, name, &body)?;
        }
        let body = BASE64_URL_SAFE_NO_PAD.encode(body);
        let timestamp = timestamp.to_string();

        let tag = self
            .sign(name, timestamp.as_bytes(), body.as_bytes())
            .finalize()
            .into_bytes();

        let mut signed = Vec::with_capacity(timestamp.len() + body.len() + tag.len() + 2);
        signed.extend_from_slice(timestamp.as_bytes());
        signed.push(b'|');
        signed.extend_from_slice(body.as_bytes());
        signed.push(b'|');
        signed.extend_from_slice(&tag);

        let encoded = BASE64_URL_SAFE_NO_PAD.encode(signed);
        self.check_length(encoded.len())?;
        Ok(encoded)
    }

    pub fn decode<T>(&self, name: &str, value: &str) -> Result<T, Error>
    where
        T: DeserializeOwned,
    {
        self.check_length(value.len())?;
        let signed = BASE64_URL_SAFE_NO_PAD.decode(value)?;

        let mut parts = signed.splitn(3, |byte| *byte == b'|');
        let (Some(timestamp), Some(body), Some(tag)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(Error::Malformed);
        };

        self.sign(name, timestamp, body)
            .verify_slice(tag)
            .map_err(|_| Error::InvalidMac)?;

        let timestamp: i64 = std::str::from_utf8(timestamp)
            .ok()
            .and_then(|timestamp| timestamp.parse().ok())
            .ok_or(Error::InvalidTimestamp)?;
        let now = OffsetDateTime::now_utc().unix_timestamp();
        if self.max_age != 0 && timestamp < now - self.max_age {
            return Err(Error::Expired);
        }

        let mut body = BASE64_URL_SAFE_NO_PAD.decode(body)?;
        if let Some(cipher) = &self.cipher {
            body = decrypt(cipher, name, &body)?;
        }

        deserialize_value(&body)
    }

    fn sign(&self, name: &str, timestamp: &[u8], body: &[u8]) -> HmacSha256 {
        let mut mac = self.mac.clone();
        mac.update(name.as_bytes());
        mac.update(b"|");
        mac.update(timestamp);
        mac.update(b"|");
        mac.update(body);
        mac
    }

    fn check_length(&self, len: usize) -> Result<(), Error> {
        if self.max_length != 0 && len > self.max_length {
            return Err(Error::TooLong {
                len,
                max: self.max_length,
            });
        }
        Ok(())
    }
}

impl fmt::Debug for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Codec")
            .field("encrypted", &self.is_encrypted())
            .field("max_age", &self.max_age)
            .field("max_length", &self.max_length)
            .finish_non_exhaustive()
    }
}

fn encrypt(cipher: &Aes256Gcm, name: &str, plaintext: &[u8]) -> Result<Vec<u8>, Error> {
    let mut nonce = [0u8; NONCE_LEN];
    rand::rng().fill_bytes(&mut nonce);

    let sealed = cipher
        .encrypt(
            Nonce::from_slice(&nonce),
            Payload {
                msg: plaintext,
                aad: name.as_bytes(),
            },
        )
        .map_err(|_| Error::Encrypt)?;

    let mut out = Vec::with_capacity(NONCE_LEN + sealed.len());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&sealed);
    Ok(out)
}

fn decrypt(cipher: &Aes256Gcm, name: &str, sealed: &[u8]) -> Result<Vec<u8>, Error> {
    if sealed.len() < NONCE_LEN {
        return Err(Error::Decrypt);
    }
    let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);

    cipher
        .decrypt(
            Nonce::from_slice(nonce),
            Payload {
                msg: ciphertext,
                aad: name.as_bytes(),
            },
        )
        .map_err(|_| Error::Decrypt)
}

/// Builds one [`Codec`] per key pair, preserving order. Fails on an empty list.
pub fn codecs_from_pairs<I>(pairs: I) -> Result<Vec<Codec>, Error>
where
    I: IntoIterator<Item = KeyPair>,
{
    let codecs = pairs
        .into_iter()
        .map(|pair| Codec::new(&pair))
        .collect::<Result<Vec<_>, _>>()?;

    if codecs.is_empty() {
        return Err(Error::NoCodecs);
    }
    Ok(codecs)
}

/// Encodes `value` with the first (primary) codec.
pub fn encode_multi<T>(name: &str, value: &T, codecs: &[Codec]) -> Result<String, Error>
where
    T: Serialize + ?Sized,
{
    codecs
        .first()
        .ok_or(Error::NoCodecs)?
        .encode(name, value)
}

/// Decodes `value` with each codec in turn, returning the first success.
///
/// If every codec rejects the value, the primary codec's error is returned.
pub fn decode_multi<T>(name: &str, value: &str, codecs: &[Codec]) -> Result<T, Error>
where
    T: DeserializeOwned,
{
    let mut first_error = None;
    for codec in codecs {
        match codec.decode(name, value) {
            Ok(decoded) => return Ok(decoded),
            Err(err) => {
                first_error.get_or_insert(err);
            }
        }
    }

    Err(first_error.unwrap_or(Error::NoCodecs))
}
