pub mod config;
pub mod error;
pub mod fetch;
pub mod format;
pub mod github;
pub mod history;
pub mod readme;
pub mod render;
pub mod snapshot;
pub mod startup;
