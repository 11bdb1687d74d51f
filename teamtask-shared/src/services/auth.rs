//! Account service
//!
//! Signup creates the user together with a personal organization they own.
//! Login checks credentials; token issuance is left to the caller.

use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use super::error::{DomainError, DomainResult, StoreResultExt};
use crate::auth::password::{hash_password, verify_password};
use crate::clock::Clock;
use crate::invite::InviteCodeGenerator;
use crate::models::{Organization, OrganizationMember, OrganizationRole, User};
use crate::store::{UserStore, USERNAME_CONSTRAINT};

/// Minimum accepted password length, in characters
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// A freshly created account
#[derive(Debug, Clone)]
pub struct Signup {
    pub user: User,
    pub organization: Organization,
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    invite_codes: Arc<dyn InviteCodeGenerator>,
    clock: Arc<dyn Clock>,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, invite_codes: Arc<dyn InviteCodeGenerator>, clock: Arc<dyn Clock>) -> Self {
        Self {
            users,
            invite_codes,
            clock,
        }
    }

    /// Registers a user with a personal organization
    ///
    /// User, organization and owner membership are written as one unit, so a
    /// failure leaves nothing behind.
    ///
    /// # Errors
    ///
    /// - `UsernameRequired` for a blank username
    /// - `PasswordTooShort` below [`MIN_PASSWORD_LENGTH`]
    /// - `UsernameTaken` when the username exists, including a concurrent
    ///   signup winning the insert
    /// - `Storage` for any other write failure, an invite code collision
    ///   included
    pub async fn signup(&self, username: &str, password: &str) -> DomainResult<Signup> {
        let username = username.trim();
        if username.is_empty() {
            return Err(DomainError::UsernameRequired);
        }
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(DomainError::PasswordTooShort {
                min: MIN_PASSWORD_LENGTH,
            });
        }

        if self
            .users
            .find_user_by_username(username)
            .await
            .context("look up username")?
            .is_some()
        {
            return Err(DomainError::UsernameTaken);
        }

        let password_hash = hash_password(password)?;
        let invite_code = self
            .invite_codes
            .generate()
            .map_err(DomainError::InviteCodeGenerationFailed)?;

        let now = self.clock.now();
        let user = User::new(username, password_hash, now);
        let organization = Organization::new(Organization::personal_name(username), invite_code, now);
        let owner = OrganizationMember::new(organization.id, user.id, OrganizationRole::Owner, now);

        match self
            .users
            .create_with_personal_organization(&user, &organization, &owner)
            .await
        {
            Ok(()) => {}
            Err(err) if err.is_conflict_on(USERNAME_CONSTRAINT) => {
                debug!(username = %user.username, "Signup lost a username race");
                return Err(DomainError::UsernameTaken);
            }
            Err(source) => {
                return Err(DomainError::Storage {
                    operation: "create user",
                    source,
                })
            }
        }

        info!(user_id = %user.id, organization_id = %organization.id, "User signed up");
        Ok(Signup { user, organization })
    }

    /// Checks credentials
    ///
    /// The username is matched exactly as given. Unknown usernames and wrong
    /// passwords both fail `InvalidCredentials`.
    pub async fn login(&self, username: &str, password: &str) -> DomainResult<User> {
        let Some(user) = self
            .users
            .find_user_by_username(username)
            .await
            .context("look up username")?
        else {
            debug!("Login for unknown username");
            return Err(DomainError::InvalidCredentials);
        };

        if !verify_password(password, &user.password_hash)? {
            debug!(user_id = %user.id, "Login with wrong password");
            return Err(DomainError::InvalidCredentials);
        }

        info!(user_id = %user.id, "User logged in");
        Ok(user)
    }

    pub async fn get_user(&self, user_id: Uuid) -> DomainResult<User> {
        self.users
            .find_user(user_id)
            .await
            .context("fetch user")?
            .ok_or(DomainError::UserNotFound)
    }
}
