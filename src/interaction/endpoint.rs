//! Signed HTTP entry point for chat interactions.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use http::{HeaderMap, StatusCode};
use serde_json::json;

use crate::webhook::signature::decode_hex;

use super::error::InteractionError;
use super::handler::InteractionHandler;
use super::model::{Interaction, InteractionResponse};

/// Header carrying the hex Ed25519 signature.
pub const SIGNATURE_HEADER: &str = "X-Signature-Ed25519";
/// Header carrying the timestamp prepended to the signed body.
pub const TIMESTAMP_HEADER: &str = "X-Signature-Timestamp";
/// Acknowledgement window the platform allows before failing the interaction.
pub const RESPONSE_DEADLINE: Duration = Duration::from_secs(3);

const TOO_SLOW: &str = "That took too long to answer. Please try again.";

/// Verifies, parses, and answers interaction requests.
#[derive(Debug)]
pub struct InteractionEndpoint {
    key: VerifyingKey,
    handler: Arc<InteractionHandler>,
    deadline: Duration,
}

impl InteractionEndpoint {
    /// Creates an endpoint verifying requests with `public_key_hex`.
    ///
    /// # Errors
    ///
    /// Returns [`InteractionError::InvalidPublicKey`] when the key is not a
    /// 32-byte hex Ed25519 public key.
    pub fn new(
        public_key_hex: &str,
        handler: Arc<InteractionHandler>,
        deadline: Duration,
    ) -> Result<Self, InteractionError> {
        let bytes: [u8; 32] = decode_hex(public_key_hex.trim())
            .and_then(|raw| raw.try_into().ok())
            .ok_or_else(|| InteractionError::InvalidPublicKey("expected 64 hex digits".to_owned()))?;
        let key = VerifyingKey::from_bytes(&bytes)
            .map_err(|error| InteractionError::InvalidPublicKey(error.to_string()))?;
        Ok(Self {
            key,
            handler,
            deadline,
        })
    }

    /// Checks the signature over `timestamp || body`.
    ///
    /// # Errors
    ///
    /// Returns [`InteractionError::MissingHeader`] or
    /// [`InteractionError::InvalidSignature`].
    pub fn verify(&self, headers: &HeaderMap, body: &[u8]) -> Result<(), InteractionError> {
        let signature = header(headers, SIGNATURE_HEADER)?;
        let timestamp = header(headers, TIMESTAMP_HEADER)?;
        let signature_bytes: [u8; 64] = decode_hex(signature)
            .and_then(|raw| raw.try_into().ok())
            .ok_or(InteractionError::InvalidSignature)?;

        let mut message = Vec::with_capacity(timestamp.len() + body.len());
        message.extend_from_slice(timestamp.as_bytes());
        message.extend_from_slice(body);
        self.key
            .verify(&message, &Signature::from_bytes(&signature_bytes))
            .map_err(|_| InteractionError::InvalidSignature)
    }

    /// Answers one interaction request with a status and JSON body.
    ///
    /// Deferred work is spawned after the response is built.
    pub async fn handle(&self, headers: &HeaderMap, body: &[u8]) -> (StatusCode, String) {
        if let Err(error) = self.verify(headers, body) {
            tracing::warn!(%error, "interaction signature rejected");
            return rejection(&error);
        }
        let interaction = match Interaction::parse(body) {
            Ok(interaction) => interaction,
            Err(error) => {
                tracing::warn!(%error, "interaction payload rejected");
                return rejection(&error);
            }
        };

        let answer =
            tokio::time::timeout(self.deadline, self.handler.respond(interaction, Utc::now()))
                .await;
        let (response, follow_up) = answer.unwrap_or_else(|_| {
            tracing::warn!(deadline = ?self.deadline, "interaction missed its response deadline");
            (InteractionResponse::ephemeral(TOO_SLOW), None)
        });

        if let Some(work) = follow_up {
            let handler = Arc::clone(&self.handler);
            tokio::spawn(async move { handler.complete(work).await });
        }

        match response.to_json() {
            Ok(payload) => (StatusCode::OK, payload.to_string()),
            Err(error) => {
                tracing::error!(%error, "interaction response could not be encoded");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": error.to_string() }).to_string(),
                )
            }
        }
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &'static str) -> Result<&'a str, InteractionError> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .ok_or(InteractionError::MissingHeader(name))
}

fn rejection(error: &InteractionError) -> (StatusCode, String) {
    (
        error.status(),
        json!({ "error": error.to_string() }).to_string(),
    )
}
