//! Analyze JVM method bodies
//!
//! ### Simple example
//!
//! Consider the following static method:
//!
//! ```java,ignore,no_run
//! static int pick(boolean flag) {
//!     return flag ? 1 : 2;
//! }
//! ```
//!
//! Recomputing its maxima and stack map frames can be done as follows:
//!
//! ```
//! use jvm_frames::jvm::class_graph::*;
//! use jvm_frames::jvm::code::{opcodes::*, Code, CountingLabelGenerator, Instruction, LabelGenerator};
//! use jvm_frames::jvm::model::Method;
//! use jvm_frames::jvm::*;
//!
//! # fn recompute() -> Result<(), Error> {
//! // Setup the class graph, add in Java standard library types
//! let class_graph_arenas = ClassGraphArenas::new();
//! let class_graph = ClassGraph::new(&class_graph_arenas);
//! class_graph.insert_java_library_types();
//!
//! // Build the method body
//! let mut labels = CountingLabelGenerator::default();
//! let (second, end) = (labels.fresh_label(), labels.fresh_label());
//! let code = Code::new(
//!     vec![
//!         Instruction::Simple(ILOAD_0),
//!         Instruction::Branch { opcode: IFEQ, target: second },
//!         Instruction::Simple(ICONST_1),
//!         Instruction::Branch { opcode: GOTO, target: end },
//!         Instruction::Label(second),
//!         Instruction::Simple(ICONST_2),
//!         Instruction::Label(end),
//!         Instruction::Simple(IRETURN),
//!     ],
//!     vec![],
//!     labels,
//! );
//!
//! let mut method = Method::new(
//!     UnqualifiedName::from_string(String::from("pick")).unwrap(),
//!     MethodDescriptor {
//!         parameters: vec![FieldType::boolean()],
//!         return_type: Some(FieldType::int()),
//!     },
//!     MethodAccessFlags::STATIC,
//! );
//! method.code_impl = Some(code);
//!
//! // Recompute everything
//! let mut class = model::Class::new(
//!     BinaryName::from_string(String::from("me/alec/Pick")).unwrap(),
//!     ClassAccessFlags::PUBLIC,
//! );
//! class.methods.push(method);
//! class.declare_in(&class_graph);
//! class.recompute_all(Some(&class_graph), &Settings::default())?;
//!
//! let code = class.methods[0].code_impl.as_ref().unwrap();
//! assert_eq!(code.max_stack, 1);
//! assert_eq!(code.max_locals, 1);
//! assert_eq!(code.frames.len(), 2);
//! # Ok(())
//! # }
//! # recompute().unwrap();
//! ```

mod access_flags;
pub mod class_file;
pub mod class_graph;
pub mod code;
mod descriptors;
mod errors;
pub mod model;
mod names;
mod settings;
pub mod verifier;

pub use access_flags::*;
pub use descriptors::*;
pub use errors::*;
pub use names::*;
pub use settings::*;
