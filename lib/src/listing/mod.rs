//! Textual assembly listings
//!
//! A listing is a line-oriented description of one or more classes and the bodies of their
//! methods. It is meant for writing down method bodies by hand (in tests, or for the command line
//! tool), not as a faithful rendition of class files: there is no constant pool and no bytecode
//! offsets.
//!
//! ```text
//! # Comments start with `#` and run to the end of the line
//! .class public me/alec/Counter
//! .super java/lang/Object
//! .implements java/lang/Runnable
//!
//! .method public static count(I)I
//!     iconst_0
//!     istore_1
//! loop:
//!     iload_1
//!     iload_0
//!     if_icmpge done
//!     iinc 1 1
//!     goto loop
//! done:
//!     iload_1
//!     ireturn
//! .end method
//! ```
//!
//! Directives:
//!
//!   - `.class <flags> <name>` starts a class (which extends `java/lang/Object` unless told
//!     otherwise by `.super <name>`, and implements every `.implements <name>`)
//!   - `.method <flags> <name><descriptor>` starts a method, closed by `.end method`
//!   - `.catch <class|any> from <label> to <label> using <label>` adds an exception range
//!   - `.limit stack <n>` and `.limit locals <n>` set the maxima (useful only when they are not
//!     going to be recomputed)
//!
//! Every other line inside a method is either a label (`name:`) or an instruction. Instructions
//! are written the way `javap` would, except that constant pool references are spelled out:
//! `getfield me/alec/Point x I`, `invokevirtual java/lang/Object hashCode ()I`, `ldc 1.5f`,
//! `ldc "hello"`, `ldc class java/lang/String`, `tableswitch 0 zero one default:other`,
//! `lookupswitch -1:neg 1:pos default:zero`, `newarray int`, `anewarray [I`.

mod parser;

pub use parser::parse;

use crate::jvm::class_graph::{ClassGraph, ClassHierarchy};
use crate::jvm::model::Class;
use crate::jvm::{Error, Settings};
use std::fmt;

/// Classes parsed out of a listing
#[derive(Debug, Clone)]
pub struct Listing {
    pub classes: Vec<Class>,
}

impl Listing {
    /// Register every class of the listing in the class graph
    pub fn declare_in(&self, class_graph: &ClassGraph<'_>) {
        for class in &self.classes {
            class.declare_in(class_graph);
        }
    }

    /// Recompute the method bodies of every class
    pub fn recompute_all(
        &mut self,
        hierarchy: Option<&dyn ClassHierarchy>,
        settings: &Settings,
    ) -> Result<(), Error> {
        for class in &mut self.classes {
            class.recompute_all(hierarchy, settings)?;
        }
        Ok(())
    }
}

impl fmt::Display for Listing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, class) in self.classes.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", class)?;
        }
        Ok(())
    }
}
