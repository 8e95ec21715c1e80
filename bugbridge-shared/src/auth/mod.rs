/// Authentication primitives for BugBridge
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and the password length rule
/// - [`jwt`]: HS256 access and refresh tokens
/// - [`context`]: the authenticated caller passed to role-restricted services
///
/// # Example
///
/// ```no_run
/// use bugbridge_shared::auth::password::{hash_password, verify_password};
/// use bugbridge_shared::auth::jwt::issue_token_pair;
/// use bugbridge_shared::models::user::UserRole;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let tokens = issue_token_pair(1, UserRole::Tester, "secret-key-at-least-32-bytes-long")?;
/// # Ok(())
/// # }
/// ```

pub mod context;
pub mod jwt;
pub mod password;
