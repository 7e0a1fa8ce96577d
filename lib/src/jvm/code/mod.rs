//! Method bodies and their control flow
//!
//! ### Structure
//!
//! A method body ([`Code`]) is a flat sequence of [`Instruction`]s, interleaved with
//! [`Instruction::Label`] markers, plus a table of [`ExceptionRange`]s. Jumps, switches, and
//! exception ranges refer to positions only through labels, so the sequence can be edited (for
//! instance, by splicing in more labels) without patching every reference.
//!
//! ### Analysis
//!
//! The JVM wants two more things from a method body than just its instructions: the maximum
//! depths of the operand stack and locals, and (for class files version 50 and up) a stack map
//! frame at every jump target. Both are computed by the same machinery:
//!
//!   - [`BasicBlockGraph`] splits the body into [`BasicBlock`]s and connects them with normal and
//!     exception edges
//!   - [`BasicBlockGraph::compute_maxes`] propagates stack depths through the graph
//!   - [`BasicBlockGraph::compute_frames`] propagates [verification
//!     types](crate::jvm::verifier::VerificationType) through the graph, joining at merge points
//!     until nothing changes
//!
//! [0]: https://docs.oracle.com/javase/specs/jvms/se18/html/jvms-6.html#jvms-6.5

mod basic_block;
mod code;
mod graph;
mod instructions;
mod label;
pub mod opcodes;
mod stack_effect;

pub use basic_block::*;
pub use code::*;
pub use graph::*;
pub use instructions::*;
pub use label::*;
pub use stack_effect::*;
