//! Binary encoding of the pieces of a class file that the analyses produce
//!
//! Everything else in a class file (the constant pool, the bytecode array, other attributes) is
//! left to whatever reads and writes the rest of the class. The only requirement is that the
//! caller can tell where labels ended up and which constant pool entries classes get.

mod binary_format;
mod stack_map_table;

pub use binary_format::*;
pub use stack_map_table::*;
