//! Chat interactions: buttons and modals on tracked pull request threads.
//!
//! [`InteractionEndpoint`] verifies the platform's Ed25519 signature and
//! answers inside the acknowledgement window; anything that talks to GitHub
//! or re-tracks a thread runs as a [`FollowUp`] after the response is sent.

pub mod endpoint;
pub mod error;
pub mod handler;
pub mod model;

#[cfg(test)]
mod tests;

pub use endpoint::{InteractionEndpoint, RESPONSE_DEADLINE, SIGNATURE_HEADER, TIMESTAMP_HEADER};
pub use error::InteractionError;
pub use handler::{FollowUp, GatewayFactory, InteractionHandler};
pub use model::{ComponentInteraction, Interaction, InteractionResponse, ModalSubmission};
