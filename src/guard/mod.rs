//! Trust boundary: path containment and input/output sanitization

pub mod error;
pub mod path;
pub mod sanitize;

pub use error::*;
pub use path::*;
pub use sanitize::*;
