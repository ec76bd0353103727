//! Chat user to GitHub token links, encrypted at rest.

use aes_gcm::aead::rand_core::RngCore as _;
use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use diesel::OptionalExtension;
use diesel::QueryableByName;
use diesel::RunQueryDsl;
use diesel::sql_query;
use diesel::sql_types::{BigInt, Text};
use sha2::{Digest, Sha256};

use crate::chat::UserId;

use super::PersistenceError;
use super::connection::{establish, map_query_error, map_write_error, to_i64, validated_url};

const GITHUB_OAUTH_TABLE: &str = "github_oauth";
const ENCRYPTED_PREFIX: &str = "v1:";
const NONCE_BYTES: usize = 12;

/// AES-256-GCM cipher keyed by the SHA-256 digest of a password.
#[derive(Clone)]
pub struct TokenCipher {
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for TokenCipher {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str("TokenCipher(***)")
    }
}

impl TokenCipher {
    /// Derives the key from `password`.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Encryption`] for a blank password.
    pub fn from_password(password: &str) -> Result<Self, PersistenceError> {
        if password.trim().is_empty() {
            return Err(PersistenceError::Encryption {
                message: "encryption password must not be blank".to_owned(),
            });
        }
        let digest = Sha256::digest(password.as_bytes());
        let cipher =
            Aes256Gcm::new_from_slice(&digest).map_err(|_| PersistenceError::Encryption {
                message: "key material has invalid length".to_owned(),
            })?;
        Ok(Self { cipher })
    }

    /// Encrypts `plaintext` with a fresh random nonce.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Encryption`] when encryption fails.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, PersistenceError> {
        let mut nonce = [0_u8; NONCE_BYTES];
        OsRng.fill_bytes(&mut nonce);
        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
            .map_err(|_| PersistenceError::Encryption {
                message: "token encryption failed".to_owned(),
            })?;

        let mut payload = Vec::with_capacity(NONCE_BYTES + ciphertext.len());
        payload.extend_from_slice(&nonce);
        payload.extend_from_slice(&ciphertext);
        Ok(format!("{ENCRYPTED_PREFIX}{}", BASE64_STANDARD.encode(payload)))
    }

    /// Decrypts a payload produced by [`Self::encrypt`].
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Encryption`] when the payload is
    /// malformed, truncated, or fails authentication.
    pub fn decrypt(&self, payload: &str) -> Result<String, PersistenceError> {
        let failure = |message: &str| PersistenceError::Encryption {
            message: message.to_owned(),
        };
        let encoded = payload
            .strip_prefix(ENCRYPTED_PREFIX)
            .ok_or_else(|| failure("unsupported token payload version"))?;
        let raw = BASE64_STANDARD
            .decode(encoded)
            .map_err(|_| failure("token payload encoding is invalid"))?;
        let (nonce, ciphertext) = raw
            .split_at_checked(NONCE_BYTES)
            .filter(|(_, rest)| !rest.is_empty())
            .ok_or_else(|| failure("token payload is truncated"))?;
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| failure("token payload integrity check failed"))?;
        String::from_utf8(plaintext).map_err(|_| failure("token payload is not valid UTF-8"))
    }
}

/// Store of GitHub tokens linked to chat users.
#[derive(Debug, Clone)]
pub struct LinkedAccountStore {
    database_url: String,
    cipher: TokenCipher,
}

impl LinkedAccountStore {
    /// Creates a store targeting `database_url`.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::BlankDatabaseUrl`] when the URL is blank.
    pub fn new(
        database_url: impl Into<String>,
        cipher: TokenCipher,
    ) -> Result<Self, PersistenceError> {
        Ok(Self {
            database_url: validated_url(database_url)?,
            cipher,
        })
    }

    /// Encrypts and stores `token` for `user`, replacing any previous link.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when encryption or the write fails.
    pub fn store_token(&self, user: UserId, token: &str) -> Result<(), PersistenceError> {
        let encrypted = self.cipher.encrypt(token)?;
        let user_id = to_i64(user.get(), "user id")?;
        let mut connection = establish(&self.database_url)?;
        sql_query(
            "INSERT INTO github_oauth (discord_id, token) VALUES (?, ?) \
             ON CONFLICT(discord_id) DO UPDATE SET \
               token = excluded.token, updated_at = CURRENT_TIMESTAMP;",
        )
        .bind::<BigInt, _>(user_id)
        .bind::<Text, _>(&encrypted)
        .execute(&mut connection)
        .map(drop)
        .map_err(|error| map_write_error(&mut connection, GITHUB_OAUTH_TABLE, &error))
    }

    /// Returns the decrypted token linked to `user`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the query or decryption fails.
    pub fn token(&self, user: UserId) -> Result<Option<String>, PersistenceError> {
        #[derive(Debug, QueryableByName)]
        struct Row {
            #[diesel(sql_type = Text)]
            token: String,
        }

        let user_id = to_i64(user.get(), "user id")?;
        let mut connection = establish(&self.database_url)?;
        let row: Option<Row> =
            sql_query("SELECT token FROM github_oauth WHERE discord_id = ? LIMIT 1;")
                .bind::<BigInt, _>(user_id)
                .get_result(&mut connection)
                .optional()
                .map_err(|error| map_query_error(&mut connection, GITHUB_OAUTH_TABLE, &error))?;

        row.map(|found| self.cipher.decrypt(&found.token))
            .transpose()
    }

    /// Removes the link for `user`, returning whether one existed.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the write fails.
    pub fn remove(&self, user: UserId) -> Result<bool, PersistenceError> {
        let user_id = to_i64(user.get(), "user id")?;
        let mut connection = establish(&self.database_url)?;
        sql_query("DELETE FROM github_oauth WHERE discord_id = ?;")
            .bind::<BigInt, _>(user_id)
            .execute(&mut connection)
            .map(|affected| affected > 0)
            .map_err(|error| map_write_error(&mut connection, GITHUB_OAUTH_TABLE, &error))
    }
}
