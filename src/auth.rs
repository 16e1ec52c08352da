//! Password hashing and the credential gate in front of the web form.
//!
//! Hashes are Argon2id PHC strings (`$argon2id$v=19$m=…`). The
//! `adviseme-hash` binary produces them; the web server compares HTTP Basic
//! credentials against one. There are no sessions: every request carries its
//! own credentials and is verified on its own.

use crate::error::AdviseError;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::fmt;

/// Argon2 hashing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Argon2Params {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Argon2Params {
    fn to_argon2(self) -> Result<Argon2<'static>, AdviseError> {
        let params = Params::new(self.memory_kib, self.iterations, self.parallelism, None)
            .map_err(|e| AdviseError::PasswordHash(format!("argon2 params: {e}")))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

impl Default for Argon2Params {
    /// Argon2id RFC 9106 low-memory recommendation.
    fn default() -> Self {
        Self {
            memory_kib: 19456, // 19 MiB
            iterations: 2,
            parallelism: 1,
        }
    }
}

/// Hash a password with explicit parameters and a random salt.
pub fn hash_password_with_params(password: &str, params: Argon2Params) -> Result<String, AdviseError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = params
        .to_argon2()?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AdviseError::PasswordHash(format!("hash password: {e}")))?;
    Ok(hash.to_string())
}

/// Hash a password with the default parameters.
pub fn hash_password(password: &str) -> Result<String, AdviseError> {
    hash_password_with_params(password, Argon2Params::default())
}

/// Check a password against a PHC hash string.
///
/// Verification uses the parameters embedded in the hash. A hash that cannot
/// be parsed is an error; a wrong password is `Ok(false)`.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AdviseError> {
    let parsed = PasswordHash::new(hash).map_err(|e| AdviseError::PasswordHash(format!("parse hash: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// One login: a username and the Argon2 hash of its password.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password_hash: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password_hash", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Validate that the hash parses before the server starts.
    pub fn new(username: impl Into<String>, password_hash: impl Into<String>) -> Result<Self, AdviseError> {
        let username = username.into();
        let password_hash = password_hash.into();
        if username.trim().is_empty() {
            return Err(AdviseError::InvalidConfig("username must not be empty".into()));
        }
        PasswordHash::new(&password_hash)
            .map_err(|e| AdviseError::InvalidConfig(format!("password hash is not a PHC string: {e}")))?;
        Ok(Self {
            username,
            password_hash,
        })
    }
}

/// Decides whether a request may reach the advisor.
#[derive(Debug, Clone, Default)]
pub struct CredentialGate {
    credentials: Option<Credentials>,
}

impl CredentialGate {
    /// A gate that lets every request through.
    pub fn open() -> Self {
        Self { credentials: None }
    }

    pub fn with_credentials(credentials: Credentials) -> Self {
        Self {
            credentials: Some(credentials),
        }
    }

    pub fn is_open(&self) -> bool {
        self.credentials.is_none()
    }

    /// Check an `Authorization` header value.
    ///
    /// Only the `Basic` scheme is accepted. Missing, malformed or wrong
    /// credentials all answer `false`.
    pub fn allows(&self, authorization: Option<&str>) -> bool {
        let Some(ref creds) = self.credentials else {
            return true;
        };
        let Some((user, pass)) = authorization.and_then(parse_basic) else {
            return false;
        };
        // The hash is verified for every login so an unknown user costs the same.
        let password_ok = verify_password(&pass, &creds.password_hash).unwrap_or(false);
        let user_ok = user == creds.username;
        user_ok & password_ok
    }
}

/// Decode `Basic <base64(user:pass)>`.
fn parse_basic(header: &str) -> Option<(String, String)> {
    let (scheme, encoded) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, pass) = decoded.split_once(':')?;
    Some((user.to_string(), pass.to_string()))
}
