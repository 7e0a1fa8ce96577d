use crate::jvm::class_graph::{ClassGraph, ClassHierarchy, ClassId};
use crate::jvm::model::Method;
use crate::jvm::{BinaryName, ClassAccessFlags, Error, Settings};
use std::fmt;

/// Semantic representation of a class
#[derive(Debug, Clone)]
pub struct Class {
    pub name: BinaryName,

    /// Superclass (only `java/lang/Object` has none)
    pub superclass: Option<BinaryName>,

    pub interfaces: Vec<BinaryName>,
    pub access_flags: ClassAccessFlags,
    pub methods: Vec<Method>,
}

impl Class {
    /// Create a new class extending `java/lang/Object`, without any methods
    pub fn new(name: BinaryName, access_flags: ClassAccessFlags) -> Class {
        Class {
            name,
            superclass: Some(BinaryName::OBJECT),
            interfaces: vec![],
            access_flags,
            methods: vec![],
        }
    }

    /// Register the class (with its superclass and interfaces) in the class graph
    pub fn declare_in<'g>(&self, class_graph: &ClassGraph<'g>) -> ClassId<'g> {
        class_graph.declare(
            &self.name,
            self.superclass.as_ref(),
            &self.interfaces,
            self.access_flags,
        )
    }

    /// Recompute maxima (and frames, depending on the settings) of every method body
    pub fn recompute_all(
        &mut self,
        hierarchy: Option<&dyn ClassHierarchy>,
        settings: &Settings,
    ) -> Result<(), Error> {
        for method in &mut self.methods {
            if let Some(mut code) = method.code_impl.take() {
                log::debug!("Recomputing {}.{}", self.name, method.name);
                let result = code.recompute(&self.name, method, hierarchy, settings);
                method.code_impl = Some(code);
                result?;
            }
        }
        Ok(())
    }
}

/// Listing syntax (see [`crate::listing`])
impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(".class")?;
        for keyword in self.access_flags.keywords() {
            write!(f, " {}", keyword)?;
        }
        writeln!(f, " {}", self.name)?;
        if let Some(superclass) = &self.superclass {
            writeln!(f, ".super {}", superclass)?;
        }
        for interface in &self.interfaces {
            writeln!(f, ".implements {}", interface)?;
        }
        for method in &self.methods {
            write!(f, "\n{}", method)?;
        }
        Ok(())
    }
}
