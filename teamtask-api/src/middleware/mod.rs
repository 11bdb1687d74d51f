/// Middleware modules for the API server
///
/// - `auth`: Bearer token validation and the `CurrentUser` extractor
/// - `access`: Membership and ownership gates

pub mod access;
pub mod auth;
