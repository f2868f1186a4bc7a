//! API service for the Joy Kunga application
//!
//! Videos, comments, likes and channel subscriptions, with read endpoints
//! assembled by the in-process aggregation [`pipeline`].

pub mod channels;
pub mod comments;
pub mod error;
pub mod likes;
pub mod models;
pub mod pipeline;
pub mod routes;
pub mod state;
pub mod videos;

#[cfg(test)]
mod test_support;

pub use state::AppState;
