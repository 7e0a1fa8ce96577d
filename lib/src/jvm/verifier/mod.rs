//! Types used when computing stack map frames
//!
//! For any specific instruction inside a method body, the stack and locals should have the same
//! structure, regardless of which control flow was used to reach that instruction. In other
//! words: although the values on the stack and in the locals may obviously be different, the
//! types and order of the stack and local variables cannot. This information is referred to as
//! the _stack map frame_ (represented using [`Frame`]) and the set of stack map frames for all
//! possible jump targets in a method is the _stack map table_.
//!
//! The "types" used (represented using [`VerificationType`]) are slightly augmented to take into
//! account initialization and null. Inferring the frame at a jump target means unifying the
//! frames from every control flow path reaching it (see [`join`]), and then iterating until
//! nothing changes any more. That fix-point loop lives in [`crate::jvm::code::BasicBlockGraph`].
//! This module has the pieces it is built out of, from the types up to the compaction of frames
//! into [`StackMapFrame`]s.
//!
//! [0]: https://docs.oracle.com/javase/specs/jvms/se17/html/jvms-4.html#jvms-4.10.1

mod frame;
mod join;
mod transfer;
mod types;

pub use frame::*;
pub use join::*;
pub use transfer::*;
pub use types::*;

use crate::jvm::{BinaryName, RefType};

/// Type of one slot (local or stack entry) during the analysis
///
/// `None` is a slot about which nothing is known yet. Uninitialized types are identified by the
/// position of their `new` instruction in the method body.
pub type SlotType = Option<VerificationType<RefType<BinaryName>, usize>>;
