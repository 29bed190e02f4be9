#![forbid(unsafe_code)]

pub mod attempt;
pub mod completion;
pub mod content_provider;
pub mod error;
pub mod model;
pub mod scoring;

pub use content_provider::{ContentProvider, InMemoryContentProvider};
pub use error::Error;
