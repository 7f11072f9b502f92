// This toolchain's std gates `i64::div_ceil` behind `int_roundings`
// (see crates/core/src/application/cost.rs); requires nightly.
#![feature(int_roundings)]

// Transdoc Core - Domain Logic & Ports
// NO infrastructure dependencies (Hexagonal Architecture)

pub mod application;
pub mod domain;
pub mod error;
pub mod port;

pub use error::{AppError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
