pub mod action;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod expr;
pub mod io;
pub mod manifest;
pub mod paths;
pub mod replay;
pub mod report;
pub mod resolver;
pub mod runtime;
pub mod sample;
pub mod session;

pub use error::{ActoscError, Result};
