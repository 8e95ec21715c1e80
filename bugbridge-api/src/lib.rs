//! # BugBridge API Server Library
//!
//! HTTP layer of the BugBridge bug tracker: configuration, routing, request
//! extraction and the response envelopes every endpoint returns.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `dto`: Request and response bodies
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: Extractors that reject with enveloped errors
//! - `middleware`: Response post-processing
//! - `response`: Response envelopes
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod dto;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod response;
pub mod routes;
