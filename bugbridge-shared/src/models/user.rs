/// User model and database operations
///
/// Users are developers, testers or admins. A user owns the bugs it reported,
/// the bugs assigned to it and the assignment records it appears in; all of
/// those rows reference the user by foreign key and are removed with it.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id            INTEGER PRIMARY KEY AUTOINCREMENT,
///     name          TEXT NOT NULL,
///     email         TEXT NOT NULL COLLATE NOCASE,   -- unique index
///     role          TEXT NOT NULL,                  -- ADMIN | DEVELOPER | TESTER
///     password_hash TEXT NOT NULL,
///     created_at    TEXT NOT NULL,
///     updated_at    TEXT NOT NULL
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use bugbridge_shared::models::user::{CreateUser, User, UserRole};
/// use sqlx::SqlitePool;
///
/// # async fn example(pool: SqlitePool) -> Result<(), sqlx::Error> {
/// let user = User::create(&pool, CreateUser {
///     name: "Alice Tester".to_string(),
///     email: "alice@x.com".to_string(),
///     role: UserRole::Tester,
///     password_hash: "$argon2id$...".to_string(),
/// })
/// .await?;
///
/// let found = User::find_by_email(&pool, "ALICE@x.com").await?;
/// assert_eq!(found.map(|u| u.id), Some(user.id));
/// # Ok(())
/// # }
/// ```

use super::FieldViolation;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite, SqliteExecutor};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z ]{3,50}$").expect("name pattern is a valid regex")
});

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9+_.-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,6}$")
        .expect("email pattern is a valid regex")
});

pub const NAME_MESSAGE: &str = "Name must contain only letters and spaces, with 3-50 characters.";
pub const EMAIL_MESSAGE: &str = "Invalid email format.";

const USER_COLUMNS: &str = "id, name, email, role, password_hash, created_at, updated_at";

/// Role of a user account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    /// Manages users; cannot be chosen at registration
    Admin,

    /// Works on bugs assigned to them
    Developer,

    /// Reports bugs and hands them to developers
    Tester,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "ADMIN",
            UserRole::Developer => "DEVELOPER",
            UserRole::Tester => "TESTER",
        }
    }

    /// Roles a user may pick for themselves when registering
    pub fn is_self_assignable(&self) -> bool {
        matches!(self, UserRole::Developer | UserRole::Tester)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = FieldViolation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ADMIN" => Ok(UserRole::Admin),
            "DEVELOPER" => Ok(UserRole::Developer),
            "TESTER" => Ok(UserRole::Tester),
            other => Err(FieldViolation::new(
                "role",
                format!("Unknown role '{}': expected ADMIN, DEVELOPER or TESTER", other),
            )),
        }
    }
}

/// Checks a display name against the account naming rule
pub fn check_name(name: &str) -> Result<(), FieldViolation> {
    if NAME_PATTERN.is_match(name) {
        Ok(())
    } else {
        Err(FieldViolation::new("name", NAME_MESSAGE))
    }
}

/// Checks an email address against the accepted format
pub fn check_email(email: &str) -> Result<(), FieldViolation> {
    if EMAIL_PATTERN.is_match(email) {
        Ok(())
    } else {
        Err(FieldViolation::new("email", EMAIL_MESSAGE))
    }
}

/// User account
///
/// The password hash never leaves the process: it is skipped on serialization.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,

    /// Display name (letters and spaces, 3-50 characters)
    pub name: String,

    /// Email address, unique case-insensitively
    pub email: String,

    pub role: UserRole,

    /// Argon2id PHC string
    #[serde(skip_serializing)]
    pub password_hash: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub role: UserRole,
    /// Argon2id password hash (NOT plaintext password!)
    pub password_hash: String,
}

/// Input for updating an existing user
///
/// All fields are optional. Only non-None fields will be updated.
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<UserRole>,
    pub password_hash: Option<String>,
}

impl UpdateUser {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.role.is_none()
            && self.password_hash.is_none()
    }
}

impl User {
    /// Inserts a new user
    ///
    /// # Errors
    ///
    /// Returns a database error carrying a unique violation if the email is
    /// already registered (in any letter case).
    pub async fn create<'e>(
        db: impl SqliteExecutor<'e>,
        data: CreateUser,
    ) -> Result<Self, sqlx::Error> {
        let now = Utc::now();

        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (name, email, role, password_hash, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(data.name)
        .bind(data.email)
        .bind(data.role)
        .bind(data.password_hash)
        .bind(now)
        .bind(now)
        .fetch_one(db)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    pub async fn find_by_id<'e>(
        db: impl SqliteExecutor<'e>,
        id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(id)
            .fetch_optional(db)
            .await
    }

    /// Finds a user by email address (case-insensitive)
    pub async fn find_by_email<'e>(
        db: impl SqliteExecutor<'e>,
        email: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ?"
        ))
        .bind(email.trim())
        .fetch_optional(db)
        .await
    }

    /// Lists every user, oldest account first
    pub async fn list_all<'e>(db: impl SqliteExecutor<'e>) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"))
            .fetch_all(db)
            .await
    }

    /// Lists users holding any of the given roles, oldest account first
    pub async fn list_by_roles<'e>(
        db: impl SqliteExecutor<'e>,
        roles: &[UserRole],
    ) -> Result<Vec<Self>, sqlx::Error> {
        if roles.is_empty() {
            return Ok(Vec::new());
        }

        let mut query = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {USER_COLUMNS} FROM users WHERE role IN ("
        ));
        let mut separated = query.separated(", ");
        for role in roles {
            separated.push_bind(*role);
        }
        separated.push_unseparated(") ORDER BY id");

        query.build_query_as::<User>().fetch_all(db).await
    }

    /// Counts users holding a role
    pub async fn count_by_role<'e>(
        db: impl SqliteExecutor<'e>,
        role: UserRole,
    ) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE role = ?")
            .bind(role)
            .fetch_one(db)
            .await?;

        Ok(count)
    }

    /// Updates an existing user
    ///
    /// Only non-None fields in `data` are written; `updated_at` is always
    /// refreshed. Returns the number of rows affected, 0 if the id is unknown.
    pub async fn update<'e>(
        db: impl SqliteExecutor<'e>,
        id: i64,
        data: UpdateUser,
    ) -> Result<u64, sqlx::Error> {
        let mut query = QueryBuilder::<Sqlite>::new("UPDATE users SET updated_at = ");
        query.push_bind(Utc::now());

        if let Some(name) = data.name {
            query.push(", name = ").push_bind(name);
        }
        if let Some(email) = data.email {
            query.push(", email = ").push_bind(email);
        }
        if let Some(role) = data.role {
            query.push(", role = ").push_bind(role);
        }
        if let Some(password_hash) = data.password_hash {
            query.push(", password_hash = ").push_bind(password_hash);
        }

        query.push(" WHERE id = ").push_bind(id);

        let result = query.build().execute(db).await?;
        Ok(result.rows_affected())
    }

    /// Deletes a user by email
    ///
    /// ⚠️  Bugs the user reported or was assigned, and every assignment record
    /// naming the user, are deleted with it by the schema's cascade rules.
    ///
    /// Returns the number of users deleted (0 or 1).
    pub async fn delete_by_email<'e>(
        db: impl SqliteExecutor<'e>,
        email: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE email = ?")
            .bind(email.trim())
            .execute(db)
            .await?;

        Ok(result.rows_affected())
    }
}
