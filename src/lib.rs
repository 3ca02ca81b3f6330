//! Pull one day of Fitbit activity and sleep data and store it as flat tables.

pub mod api;
pub mod auth;
pub mod config;
pub mod data;
pub mod error;
pub mod pipeline;
pub mod source;
pub mod store;
pub mod tables;

pub use error::{PullError, Result};
