//! Domain error taxonomy
//!
//! Validation and precondition failures are distinct variants so the HTTP
//! layer can map them to statuses. Storage, extractor and hashing failures
//! are wrapped with the failing operation and propagated as-is.

use thiserror::Error;

use crate::ai::ExtractorError;
use crate::auth::password::PasswordError;
use crate::invite::InviteCodeError;
use crate::store::{StoreError, StoreResult};

/// Result type for domain service operations
pub type DomainResult<T> = Result<T, DomainError>;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("user is not a member of the organization")]
    NotOrganizationMember,

    #[error("only organization owners can perform this action")]
    NotOrganizationOwner,

    #[error("organization not found")]
    OrganizationNotFound,

    #[error("task not found")]
    TaskNotFound,

    #[error("organization member not found")]
    OrganizationMemberNotFound,

    #[error("user not found")]
    UserNotFound,

    #[error("only the task creator can perform this action")]
    NotTaskCreator,

    #[error("you don't have permission to perform this action on this task")]
    TaskPermissionDenied,

    #[error("title is required")]
    TitleRequired,

    #[error("title cannot be empty")]
    TitleEmpty,

    #[error("organization name cannot be empty")]
    InvalidOrganizationName,

    #[error("at least one user ID is required")]
    NoUserIdsProvided,

    #[error("one or more users do not exist or are not members of the organization")]
    InvalidTaskAssignee,

    #[error("already a member of this organization")]
    AlreadyOrganizationMember,

    #[error("invalid invite code")]
    InvalidInviteCode,

    #[error("cannot remove yourself from the organization")]
    CannotRemoveYourself,

    #[error("failed to generate invite code")]
    InviteCodeGenerationFailed(#[source] InviteCodeError),

    #[error("username is required")]
    UsernameRequired,

    #[error("username already taken")]
    UsernameTaken,

    #[error("password must be at least {min} characters")]
    PasswordTooShort { min: usize },

    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("AI service is not configured")]
    AiServiceNotConfigured,

    #[error("AI did not generate any tasks")]
    AiNoTasksGenerated,

    #[error("AI generated too many tasks (max {max}, got {actual})")]
    TooManyGeneratedTasks { max: usize, actual: usize },

    #[error("no valid tasks could be created from AI output")]
    AiNoValidTasks,

    #[error("failed to {operation}")]
    Storage {
        operation: &'static str,
        #[source]
        source: StoreError,
    },

    #[error("failed to generate tasks with AI")]
    Extraction(#[source] ExtractorError),

    #[error("password operation failed")]
    Password(#[from] PasswordError),
}

impl DomainError {
    /// True for failures that are not part of the domain taxonomy
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            DomainError::Storage { .. } | DomainError::Password(_) | DomainError::InviteCodeGenerationFailed(_)
        )
    }
}

/// Attaches an operation label to store failures
pub trait StoreResultExt<T> {
    fn context(self, operation: &'static str) -> DomainResult<T>;
}

impl<T> StoreResultExt<T> for StoreResult<T> {
    fn context(self, operation: &'static str) -> DomainResult<T> {
        self.map_err(|source| DomainError::Storage { operation, source })
    }
}
