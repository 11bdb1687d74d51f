//! Authentication primitives
//!
//! - [`password`]: Argon2id password hashing
//! - [`jwt`]: access and refresh tokens
//!
//! # Example
//!
//! ```no_run
//! use teamtask_shared::auth::jwt::{create_token, Claims, TokenType};
//! use teamtask_shared::auth::password::{hash_password, verify_password};
//! use uuid::Uuid;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let hash = hash_password("user_password")?;
//! assert!(verify_password("user_password", &hash)?);
//!
//! let token = create_token(&Claims::new(Uuid::new_v4(), TokenType::Access), "secret-key")?;
//! # Ok(())
//! # }
//! ```

pub mod jwt;
pub mod password;
