use bitflags::bitflags;

bitflags! {
    /// Access flags on classes
    ///
    /// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.1-200-E.1
    pub struct ClassAccessFlags: u16 {
        const PUBLIC = 0x0001;
        const FINAL = 0x0010;
        const SUPER = 0x0020;
        const INTERFACE = 0x0200;
        const ABSTRACT = 0x0400;
        const SYNTHETIC = 0x1000;
        const ANNOTATION = 0x2000;
        const ENUM = 0x4000;
        const MODULE = 0x8000;
    }
}

bitflags! {
    /// Access flags on methods
    ///
    /// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.6-200-A.1
    pub struct MethodAccessFlags: u16 {
        const PUBLIC = 0x0001;
        const PRIVATE = 0x0002;
        const PROTECTED = 0x0004;
        const STATIC = 0x0008;
        const FINAL = 0x0010;
        const SYNCHRONIZED = 0x0020;
        const BRIDGE = 0x0040;
        const VARARGS = 0x0080;
        const NATIVE = 0x0100;
        const ABSTRACT = 0x0400;
        const STRICT = 0x0800;
        const SYNTHETIC = 0x1000;
    }
}

const CLASS_KEYWORDS: [(&str, ClassAccessFlags); 9] = [
    ("public", ClassAccessFlags::PUBLIC),
    ("final", ClassAccessFlags::FINAL),
    ("super", ClassAccessFlags::SUPER),
    ("interface", ClassAccessFlags::INTERFACE),
    ("abstract", ClassAccessFlags::ABSTRACT),
    ("synthetic", ClassAccessFlags::SYNTHETIC),
    ("annotation", ClassAccessFlags::ANNOTATION),
    ("enum", ClassAccessFlags::ENUM),
    ("module", ClassAccessFlags::MODULE),
];

const METHOD_KEYWORDS: [(&str, MethodAccessFlags); 12] = [
    ("public", MethodAccessFlags::PUBLIC),
    ("private", MethodAccessFlags::PRIVATE),
    ("protected", MethodAccessFlags::PROTECTED),
    ("static", MethodAccessFlags::STATIC),
    ("final", MethodAccessFlags::FINAL),
    ("synchronized", MethodAccessFlags::SYNCHRONIZED),
    ("bridge", MethodAccessFlags::BRIDGE),
    ("varargs", MethodAccessFlags::VARARGS),
    ("native", MethodAccessFlags::NATIVE),
    ("abstract", MethodAccessFlags::ABSTRACT),
    ("strict", MethodAccessFlags::STRICT),
    ("synthetic", MethodAccessFlags::SYNTHETIC),
];

impl ClassAccessFlags {
    /// Parse a flag keyword as it appears in source (eg. `public`, `interface`)
    pub fn from_keyword(keyword: &str) -> Option<ClassAccessFlags> {
        CLASS_KEYWORDS
            .iter()
            .find(|(known, _)| *known == keyword)
            .map(|(_, flag)| *flag)
    }

    /// Keywords for the flags that are set, in a canonical order
    pub fn keywords(&self) -> Vec<&'static str> {
        CLASS_KEYWORDS
            .iter()
            .filter(|(_, flag)| self.contains(*flag))
            .map(|(keyword, _)| *keyword)
            .collect()
    }
}

impl MethodAccessFlags {
    /// Parse a flag keyword as it appears in source (eg. `public`, `static`)
    pub fn from_keyword(keyword: &str) -> Option<MethodAccessFlags> {
        METHOD_KEYWORDS
            .iter()
            .find(|(known, _)| *known == keyword)
            .map(|(_, flag)| *flag)
    }

    /// Keywords for the flags that are set, in a canonical order
    pub fn keywords(&self) -> Vec<&'static str> {
        METHOD_KEYWORDS
            .iter()
            .filter(|(_, flag)| self.contains(*flag))
            .map(|(keyword, _)| *keyword)
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn keywords() {
        let flags = MethodAccessFlags::PUBLIC | MethodAccessFlags::STATIC;
        assert_eq!(flags.keywords(), vec!["public", "static"]);
        assert_eq!(MethodAccessFlags::from_keyword("static"), Some(MethodAccessFlags::STATIC));
        assert_eq!(MethodAccessFlags::from_keyword("interface"), None);
        assert_eq!(
            ClassAccessFlags::from_keyword("interface"),
            Some(ClassAccessFlags::INTERFACE)
        );
    }
}
