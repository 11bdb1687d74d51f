//! Domain models
//!
//! Plain data types shared by the stores, the services and the HTTP layer.
//! Persistence lives behind the traits in [`crate::store`]; these types carry
//! no database access of their own.
//!
//! - `user`: user accounts
//! - `organization`: tenants with invite codes
//! - `membership`: user-organization links with roles
//! - `task`: tasks, assignments and their read models

pub mod membership;
pub mod organization;
pub mod task;
pub mod user;

pub use membership::{
    MemberProfile, OrganizationMember, OrganizationMembership, OrganizationRole, OrganizationWithMembers,
};
pub use organization::Organization;
pub use task::{CreateTask, DueDateUpdate, Task, TaskAssignment, TaskDetails, TaskPage, TaskStatus, UpdateTask};
pub use user::{User, UserSummary};
