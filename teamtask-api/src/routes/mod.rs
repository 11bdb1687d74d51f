/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Signup, login, token refresh and the current user
/// - `organizations`: Organizations, invite codes and members
/// - `tasks`: Tasks, assignments and AI task generation

pub mod auth;
pub mod health;
pub mod organizations;
pub mod tasks;
