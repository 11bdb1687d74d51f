//! Invite code generation
//!
//! Invite codes are short, human-shareable tokens of the form
//! `xxxx-xxxx-xxxx` (12 lowercase hex digits from 6 random bytes).
//! Uniqueness is enforced by the `invite_code` unique constraint.

use rand::{rngs::OsRng, RngCore};

/// Number of random bytes behind each code
pub const INVITE_CODE_BYTES: usize = 6;

/// Error type for invite code generation
#[derive(Debug, thiserror::Error)]
pub enum InviteCodeError {
    /// The random source failed
    #[error("Failed to generate random bytes: {0}")]
    RandomSource(String),

    /// The generated code is already held by another organization
    #[error("Generated invite code is already in use")]
    Collision,
}

/// Produces invite codes for organizations
pub trait InviteCodeGenerator: Send + Sync {
    fn generate(&self) -> Result<String, InviteCodeError>;
}

/// Generator backed by the operating system RNG
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomInviteCodeGenerator;

impl InviteCodeGenerator for RandomInviteCodeGenerator {
    fn generate(&self) -> Result<String, InviteCodeError> {
        let mut bytes = [0u8; INVITE_CODE_BYTES];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| InviteCodeError::RandomSource(e.to_string()))?;

        Ok(format_invite_code(&bytes))
    }
}

/// Formats raw bytes as `xxxx-xxxx-xxxx`
pub fn format_invite_code(bytes: &[u8; INVITE_CODE_BYTES]) -> String {
    let encoded = hex::encode(bytes);
    format!("{}-{}-{}", &encoded[0..4], &encoded[4..8], &encoded[8..12])
}
