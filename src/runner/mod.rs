//! Safe invocation of the external automation engine

pub mod command;
pub mod engine;

pub use command::*;
pub use engine::*;
