//! Core types for brook.

pub mod effort;
pub mod progress;
pub mod request;
pub mod step;

pub use effort::*;
pub use progress::*;
pub use request::*;
pub use step::*;
