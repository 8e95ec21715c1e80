/// Business rules on top of the models
///
/// Each service borrows the pool for the duration of a request and returns
/// [`ServiceError`], which the API crate maps onto HTTP statuses.
///
/// # Example
///
/// ```no_run
/// use bugbridge_shared::services::bug::{BugService, NewBug};
/// use sqlx::SqlitePool;
///
/// # async fn example(pool: SqlitePool) -> Result<(), Box<dyn std::error::Error>> {
/// let bug = BugService::new(&pool)
///     .create_bug(NewBug {
///         reported_by: 1,
///         assigned_to: Some(2),
///         description: "Crash on save".to_string(),
///         priority: "high".to_string(),
///     })
///     .await?;
/// # Ok(())
/// # }
/// ```

pub mod assignment;
pub mod bug;
pub mod error;
pub mod user;

pub use assignment::AssignmentService;
pub use bug::BugService;
pub use error::{ServiceError, ServiceResult};
pub use user::UserService;
