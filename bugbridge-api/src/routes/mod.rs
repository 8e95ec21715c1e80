/// API route handlers (controllers)
///
/// Handlers parse and validate input, call a service and wrap the result in
/// a response envelope.
///
/// - `health`: Health check endpoint
/// - `auth`: Login and token refresh
/// - `users`: Registration, lookups, updates and deletion of users
/// - `bugs`: Bug reporting and maintenance
/// - `assignments`: Tester to developer hand-offs

pub mod assignments;
pub mod auth;
pub mod bugs;
pub mod health;
pub mod users;
