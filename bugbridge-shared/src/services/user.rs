//! User management: registration, login, lookups, role-restricted listing,
//! updates and deletion.

use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use super::error::{collect_violations, is_unique_violation, ServiceError, ServiceResult};
use crate::auth::context::AuthContext;
use crate::auth::password::{check_password, hash_password_async, verify_password_async};
use crate::models::bug::Bug;
use crate::models::user::{check_email, check_name, CreateUser, UpdateUser, User, UserRole};
use crate::models::FieldViolation;

/// Registration input as received from a client
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    /// Role name, parsed case-insensitively
    pub role: String,
}

/// Partial account update; `None` leaves a field unchanged
#[derive(Debug, Clone, Default)]
pub struct UserDetails {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

/// Service providing business logic for user accounts.
pub struct UserService<'a> {
    pub db: &'a SqlitePool,
}

impl<'a> UserService<'a> {
    pub fn new(db: &'a SqlitePool) -> Self {
        Self { db }
    }

    /// Registers a developer or tester account.
    ///
    /// # Returns
    /// - `Ok(User)` - The stored account
    /// - `Err(ServiceError::Validation)` - Name, email, password or role malformed
    /// - `Err(ServiceError::Forbidden)` - Role `ADMIN` requested
    /// - `Err(ServiceError::AlreadyExists)` - Email already registered
    pub async fn register(&self, new_user: NewUser) -> ServiceResult<User> {
        let name = new_user.name.trim().to_string();
        let email = new_user.email.trim().to_string();
        let role = new_user.role.parse::<UserRole>();

        collect_violations([
            check_name(&name),
            check_email(&email),
            check_password(&new_user.password),
            role.clone().map(|_| ()),
        ])?;
        let role = role?;

        if !role.is_self_assignable() {
            warn!(email = %email, "Rejected self-registration as ADMIN");
            return Err(ServiceError::forbidden(
                "Registration is limited to DEVELOPER and TESTER roles",
            ));
        }

        if User::find_by_email(self.db, &email).await?.is_some() {
            return Err(email_taken());
        }

        let password_hash = hash_password_async(new_user.password).await?;

        let user = User::create(
            self.db,
            CreateUser {
                name,
                email,
                role,
                password_hash,
            },
        )
        .await
        .map_err(|e| {
            // Lost a race with a concurrent registration of the same email
            if is_unique_violation(&e) {
                email_taken()
            } else {
                ServiceError::Database(e)
            }
        })?;

        info!(user_id = user.id, role = %user.role, "User registered");
        Ok(user)
    }

    /// Makes sure the configured bootstrap admin exists.
    ///
    /// Idempotent: an existing admin with that email is returned untouched.
    /// An existing non-admin account with that email is an error.
    pub async fn ensure_admin(&self, name: &str, email: &str, password: &str) -> ServiceResult<User> {
        let email = email.trim();

        if let Some(existing) = User::find_by_email(self.db, email).await? {
            if existing.role == UserRole::Admin {
                debug!(user_id = existing.id, "Bootstrap admin already present");
                return Ok(existing);
            }
            return Err(ServiceError::AlreadyExists(format!(
                "Email {} belongs to a non-admin account",
                email
            )));
        }

        collect_violations([check_name(name.trim()), check_email(email), check_password(password)])?;

        let password_hash = hash_password_async(password.to_string()).await?;
        let admin = User::create(
            self.db,
            CreateUser {
                name: name.trim().to_string(),
                email: email.to_string(),
                role: UserRole::Admin,
                password_hash,
            },
        )
        .await?;

        info!(user_id = admin.id, "Bootstrap admin created");
        Ok(admin)
    }

    /// Checks an email/password pair.
    ///
    /// Unknown email and wrong password fail identically with
    /// `ServiceError::InvalidCredentials`.
    pub async fn authenticate(&self, email: &str, password: &str) -> ServiceResult<User> {
        let Some(user) = User::find_by_email(self.db, email).await? else {
            debug!("Login attempt for unknown email");
            return Err(ServiceError::InvalidCredentials);
        };

        let valid = verify_password_async(password.to_string(), user.password_hash.clone()).await?;
        if !valid {
            warn!(user_id = user.id, "Login attempt with wrong password");
            return Err(ServiceError::InvalidCredentials);
        }

        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> ServiceResult<Option<User>> {
        Ok(User::find_by_email(self.db, email).await?)
    }

    pub async fn find_by_id(&self, id: i64) -> ServiceResult<Option<User>> {
        Ok(User::find_by_id(self.db, id).await?)
    }

    /// Deletes an account by email; admin only.
    ///
    /// Bugs the user reported or was assigned and every assignment naming the
    /// user go with it. The last remaining admin cannot be deleted.
    pub async fn delete_user(&self, caller: &AuthContext, email: &str) -> ServiceResult<()> {
        if !caller.is_admin() {
            return Err(ServiceError::forbidden("Only admins can delete users"));
        }

        let mut tx = self.db.begin().await?;

        let Some(target) = User::find_by_email(&mut *tx, email).await? else {
            return Err(ServiceError::not_found(format!("User with email {} not found", email.trim())));
        };

        if target.role == UserRole::Admin && User::count_by_role(&mut *tx, UserRole::Admin).await? <= 1 {
            return Err(ServiceError::forbidden("The last admin account cannot be deleted"));
        }

        User::delete_by_email(&mut *tx, email).await?;
        tx.commit().await?;

        info!(admin_id = caller.user_id, email = %email.trim(), "User deleted");
        Ok(())
    }

    pub async fn list_testers(&self) -> ServiceResult<Vec<User>> {
        Ok(User::list_by_roles(self.db, &[UserRole::Tester]).await?)
    }

    pub async fn list_developers(&self) -> ServiceResult<Vec<User>> {
        Ok(User::list_by_roles(self.db, &[UserRole::Developer]).await?)
    }

    pub async fn list_developers_and_testers(&self) -> ServiceResult<Vec<User>> {
        Ok(User::list_by_roles(self.db, &[UserRole::Developer, UserRole::Tester]).await?)
    }

    /// Lists every account, admins included; admin only.
    pub async fn list_all_users(&self, caller: &AuthContext) -> ServiceResult<Vec<User>> {
        if !caller.is_admin() {
            return Err(ServiceError::forbidden("Only admins can list all users"));
        }

        Ok(User::list_all(self.db).await?)
    }

    /// Applies a partial update to an account.
    ///
    /// Users may update themselves, admins anyone; only admins may change a
    /// role. The existence check, the email uniqueness check and the write run
    /// in one transaction.
    ///
    /// # Returns
    /// - `Ok(u64)` - Rows affected (1, or 0 when nothing changed on disk)
    /// - `Err(ServiceError::NotFound)` - No user with that id
    /// - `Err(ServiceError::AlreadyExists)` - New email taken by another user
    pub async fn update_user(
        &self,
        caller: &AuthContext,
        id: i64,
        details: UserDetails,
    ) -> ServiceResult<u64> {
        if !caller.can_act_on(id) {
            return Err(ServiceError::forbidden("You can only update your own account"));
        }

        let name = details.name.map(|n| n.trim().to_string());
        let email = details.email.map(|e| e.trim().to_string());
        let role = details.role.as_deref().map(str::parse::<UserRole>).transpose();

        collect_violations([
            name.as_deref().map_or(Ok(()), check_name),
            email.as_deref().map_or(Ok(()), check_email),
            details.password.as_deref().map_or(Ok(()), check_password),
            role.clone().map(|_| ()),
        ])?;
        let role = role?;

        if role.is_some() && !caller.is_admin() {
            return Err(ServiceError::forbidden("Only admins can change roles"));
        }

        let password_hash = match details.password {
            Some(password) => Some(hash_password_async(password).await?),
            None => None,
        };

        let mut tx = self.db.begin().await?;

        let Some(current) = User::find_by_id(&mut *tx, id).await? else {
            return Err(ServiceError::not_found(format!("User {} not found", id)));
        };

        // Live bugs may only be assigned to developers
        if current.role == UserRole::Developer && role.is_some_and(|r| r != UserRole::Developer) {
            let assigned = Bug::list_by_assignee(&mut *tx, id).await?;
            if !assigned.is_empty() {
                warn!(user_id = id, bugs = assigned.len(), "Role change blocked by assigned bugs");
                return Err(ServiceError::invalid(FieldViolation::new(
                    "role",
                    format!(
                        "User {} still has {} assigned bug(s); reassign them first",
                        id,
                        assigned.len()
                    ),
                )));
            }
        }

        if let Some(email) = email.as_deref() {
            if let Some(holder) = User::find_by_email(&mut *tx, email).await? {
                if holder.id != id {
                    return Err(email_taken());
                }
            }
        }

        let rows = User::update(
            &mut *tx,
            id,
            UpdateUser {
                name,
                email,
                role,
                password_hash,
            },
        )
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                email_taken()
            } else {
                ServiceError::Database(e)
            }
        })?;

        tx.commit().await?;

        info!(user_id = id, updated_by = caller.user_id, "User updated");
        Ok(rows)
    }
}

fn email_taken() -> ServiceError {
    ServiceError::AlreadyExists("Email already registered".to_string())
}
