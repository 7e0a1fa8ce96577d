use std::borrow::Cow;
use std::fmt;

/// Validated names, stored borrowed for constants and owned otherwise
pub trait Name: Sized + AsRef<str> {
    /// Check if a string would be a valid name
    fn check_valid(name: impl AsRef<str>) -> Result<(), String>;

    /// Try to construct a name from a string
    fn from_string(name: String) -> Result<Self, String>;

    fn as_str(&self) -> &str {
        self.as_ref()
    }
}

macro_rules! name_type {
    ($(#[$attr:meta])* $name:ident) => {
        $(#[$attr])*
        #[derive(Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
        pub struct $name(Cow<'static, str>);

        impl $name {
            const fn name(value: &'static str) -> $name {
                $name(Cow::Borrowed(value))
            }
        }

        impl Name for $name {
            fn check_valid(name: impl AsRef<str>) -> Result<(), String> {
                $name::validate(name.as_ref())
            }

            fn from_string(name: String) -> Result<Self, String> {
                $name::validate(&name)?;
                Ok($name(Cow::Owned(name)))
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

name_type!(
    /// Names of methods and fields
    ///
    /// See <https://docs.oracle.com/javase/specs/jvms/se16/html/jvms-4.html#jvms-4.2.2>
    UnqualifiedName
);

name_type!(
    /// Names of classes and interfaces, in their internal form (eg. `java/lang/Object`)
    ///
    /// See <https://docs.oracle.com/javase/specs/jvms/se16/html/jvms-4.html#jvms-4.2.1>
    BinaryName
);

impl UnqualifiedName {
    fn validate(name: &str) -> Result<(), String> {
        if name.is_empty() {
            return Err("empty unqualified name".to_owned());
        }
        match name.chars().find(|c| matches!(c, '.' | ';' | '[' | '/')) {
            Some(c) => Err(format!("unqualified name `{}` contains `{}`", name, c)),
            None => Ok(()),
        }
    }

    pub const INIT: Self = Self::name("<init>");
    pub const CLINIT: Self = Self::name("<clinit>");
}

impl BinaryName {
    /// Every `/`-separated segment must itself be an unqualified name
    fn validate(name: &str) -> Result<(), String> {
        if name.is_empty() {
            return Err("empty binary name".to_owned());
        }
        for segment in name.split('/') {
            UnqualifiedName::validate(segment)
                .map_err(|reason| format!("binary name `{}`: {}", name, reason))?;
        }
        Ok(())
    }

    /// Last segment of the name (eg. `Object` for `java/lang/Object`)
    pub fn simple_name(&self) -> &str {
        let name = self.as_str();
        name.rsplit('/').next().unwrap_or(name)
    }

    // `java.lang`
    pub const OBJECT: Self = Self::name("java/lang/Object");
    pub const CLONEABLE: Self = Self::name("java/lang/Cloneable");
    pub const COMPARABLE: Self = Self::name("java/lang/Comparable");
    pub const CHARSEQUENCE: Self = Self::name("java/lang/CharSequence");
    pub const STRING: Self = Self::name("java/lang/String");
    pub const STRINGBUILDER: Self = Self::name("java/lang/StringBuilder");
    pub const CLASS: Self = Self::name("java/lang/Class");
    pub const NUMBER: Self = Self::name("java/lang/Number");
    pub const INTEGER: Self = Self::name("java/lang/Integer");
    pub const LONG: Self = Self::name("java/lang/Long");
    pub const FLOAT: Self = Self::name("java/lang/Float");
    pub const DOUBLE: Self = Self::name("java/lang/Double");
    pub const BOOLEAN: Self = Self::name("java/lang/Boolean");
    pub const VOID: Self = Self::name("java/lang/Void");

    // Throwables
    pub const THROWABLE: Self = Self::name("java/lang/Throwable");
    pub const ERROR: Self = Self::name("java/lang/Error");
    pub const EXCEPTION: Self = Self::name("java/lang/Exception");
    pub const RUNTIMEEXCEPTION: Self = Self::name("java/lang/RuntimeException");
    pub const ARITHMETICEXCEPTION: Self = Self::name("java/lang/ArithmeticException");
    pub const ILLEGALARGUMENTEXCEPTION: Self = Self::name("java/lang/IllegalArgumentException");
    pub const ILLEGALSTATEEXCEPTION: Self = Self::name("java/lang/IllegalStateException");
    pub const NULLPOINTEREXCEPTION: Self = Self::name("java/lang/NullPointerException");
    pub const CLASSCASTEXCEPTION: Self = Self::name("java/lang/ClassCastException");
    pub const INDEXOUTOFBOUNDSEXCEPTION: Self = Self::name("java/lang/IndexOutOfBoundsException");
    pub const ARRAYINDEXOUTOFBOUNDSEXCEPTION: Self =
        Self::name("java/lang/ArrayIndexOutOfBoundsException");
    pub const IOEXCEPTION: Self = Self::name("java/io/IOException");

    // Types of loadable constants
    pub const METHODTYPE: Self = Self::name("java/lang/invoke/MethodType");
    pub const METHODHANDLE: Self = Self::name("java/lang/invoke/MethodHandle");
    pub const CALLSITE: Self = Self::name("java/lang/invoke/CallSite");

    /// Implemented by every array type
    pub const SERIALIZABLE: Self = Self::name("java/io/Serializable");
}
