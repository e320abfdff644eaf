pub mod boundary;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod git;
pub mod manifest;
pub mod planner;
pub mod publish;
pub mod reconcile;
pub mod transaction;
pub mod ui;

pub use error::{ReleaseError, Result};
