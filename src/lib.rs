/// Discussion Service Library
///
/// Threaded discussion engine: turns flat comment rows into nested reply
/// trees, keeps vote tallies, and enforces the soft/hard delete lifecycle.
/// One engine serves every parent entity kind (posts, reviews) through a
/// narrow parent-entity port.
///
/// # Modules
///
/// - `handlers`: Comment HTTP request handlers
/// - `domain`: Comment, vote, and thread-page data structures
/// - `services`: Tree assembly and lifecycle business logic
/// - `repository`: Database access layer
/// - `middleware`: Actor-identity extractors
/// - `error`: Error types and handling
/// - `config`: Configuration management
pub mod config;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod repository;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};
