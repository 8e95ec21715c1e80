/// Middleware modules for the API server
///
/// - `envelope`: fills the request path into response envelopes

pub mod envelope;
