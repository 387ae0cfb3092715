pub mod config;
pub mod error;
pub mod fanout;
pub mod humanize;
pub mod jobs;
pub mod models;
pub mod normalize;
pub mod observability;
pub mod topics;
pub mod transport;
pub mod validation;

pub use error::{Error, Result};
