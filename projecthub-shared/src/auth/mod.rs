/// Authentication primitives
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`jwt`]: HS256 token issuance and validation
///
/// Authorization (who may touch which project) is a separate concern and
/// lives in the crate-root `access` module.

pub mod jwt;
pub mod password;
