use crate::jvm::code::Code;
use crate::jvm::{
    BinaryName, MethodAccessFlags, MethodDescriptor, RenderDescriptor, UnqualifiedName,
};
use std::fmt;

/// Semantic representation of a method
#[derive(Debug, Clone)]
pub struct Method {
    pub name: UnqualifiedName,
    pub descriptor: MethodDescriptor<BinaryName>,
    pub access_flags: MethodAccessFlags,

    /// Method code implementation
    ///
    /// Note: `abstract` and `native` methods have no body
    pub code_impl: Option<Code>,
}

impl Method {
    /// Create a new method (without any body)
    pub fn new(
        name: UnqualifiedName,
        descriptor: MethodDescriptor<BinaryName>,
        access_flags: MethodAccessFlags,
    ) -> Method {
        Method {
            name,
            descriptor,
            access_flags,
            code_impl: None,
        }
    }

    pub fn is_static(&self) -> bool {
        self.access_flags.contains(MethodAccessFlags::STATIC)
    }
}

/// Listing syntax (see [`crate::listing`])
impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(".method")?;
        for keyword in self.access_flags.keywords() {
            write!(f, " {}", keyword)?;
        }
        writeln!(f, " {}{}", self.name, self.descriptor.render())?;
        if let Some(code) = &self.code_impl {
            write!(f, "{}", code)?;
        }
        writeln!(f, ".end method")
    }
}
