//! Control-flow analysis for JVM method bodies
//!
//! Given the instructions and exception table of a method, this crate partitions the code into
//! basic blocks and runs one of two dataflow analyses over the resulting graph:
//!
//!   - a scalar pass computing `max_stack` and `max_locals`
//!   - a typed pass computing the minimal list of `StackMapTable` frames (along with the maxima)
//!
//! The [`listing`] module provides a small textual assembly format which is handy for driving the
//! analyses from tests or from the command line.

pub mod jvm;
pub mod listing;
mod util;
