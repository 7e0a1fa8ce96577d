//! Semantic representations of classes
//!
//! This is the representation the analyses work on: a class is little more than its name, its
//! place in the hierarchy, and its methods. Only methods with a [`crate::jvm::code::Code`] body
//! get anything recomputed.
//!
//!   - __Class__ is represented using [`Class`]
//!   - __Method__ is represented using [`Method`]

mod class;
mod method;

pub use class::*;
pub use method::*;
