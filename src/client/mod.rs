//! GitHub client modules
//!
//! REST and GraphQL access split into transport, configuration, errors and
//! pagination.

pub mod api;
pub mod config;
pub mod error;
pub mod pagination;

// Re-export main types for convenience
pub use api::{DiscussionsResponse, GithubApi};
pub use config::ClientConfig;
pub use error::ClientError;
pub use pagination::Pages;
