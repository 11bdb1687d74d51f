//! Domain services
//!
//! Business rules over the stores in [`crate::store`]:
//!
//! - `membership`: which organizations a user may act within
//! - `task`: task lifecycle, assignments and AI extraction
//! - `generation`: sanitizing of extractor output
//! - `organization`: organization lifecycle and invites
//! - `auth`: signup, login and user lookup
//! - `error`: the [`DomainError`] taxonomy

pub mod auth;
pub mod error;
pub mod generation;
pub mod membership;
pub mod organization;
pub mod task;

pub use auth::{AuthService, Signup, MIN_PASSWORD_LENGTH};
pub use error::{DomainError, DomainResult, StoreResultExt};
pub use generation::{sanitize_generated_tasks, MAX_GENERATED_TASKS};
pub use membership::MembershipResolver;
pub use organization::OrganizationService;
pub use task::{TaskQuery, TaskService, DEFAULT_EXTRACTION_TIMEOUT};
