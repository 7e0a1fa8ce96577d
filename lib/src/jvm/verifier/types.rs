use crate::jvm::class_file::Serialize;
use crate::jvm::code::class_operand;
use crate::jvm::{BaseType, BinaryName, FieldType, RefType};
use crate::util::Width;
use byteorder::WriteBytesExt;
use std::fmt;

/// These types are from [this hierarchy][0]
///
/// Inside the analyses, wide types occupy two slots: the `Long`/`Double` slot followed by a `Top`
/// slot. The frames handed out to callers collapse each such pair back into a single entry, which
/// is what the `StackMapTable` attribute expects.
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se7/html/jvms-4.html#jvms-4.10.1.2
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
pub enum VerificationType<Cls, U> {
    /// Unusable slot: unset, conflicting, or the second half of a wide value
    Top,
    Integer,
    Float,
    Double,
    Long,
    Null,

    /// In the constructor, the `this` parameter starts with this type then turns into an object
    /// type after `<init>` is called
    UninitializedThis,

    /// Object type
    Object(Cls),

    /// State of an object after `new` has been called but `<init>` has not been called
    ///
    ///   - while analyzing, `U` is the instruction index of the `new` instruction
    ///   - in computed frames, `U` is the [`crate::jvm::code::Label`] marking that instruction
    ///   - when serializing into a classfile, `U` is the `u16` bytecode offset of that instruction
    Uninitialized(U),
}

impl<Cls, U> VerificationType<Cls, U> {
    /// Is this type is a reference type?
    pub fn is_reference(&self) -> bool {
        match self {
            VerificationType::Top
            | VerificationType::Integer
            | VerificationType::Float
            | VerificationType::Double
            | VerificationType::Long => false,

            VerificationType::Null
            | VerificationType::UninitializedThis
            | VerificationType::Object(_)
            | VerificationType::Uninitialized(_) => true,
        }
    }

    /// Is this a `long` or `double`?
    pub fn is_wide(&self) -> bool {
        matches!(self, VerificationType::Long | VerificationType::Double)
    }

    pub fn map<C2, U2>(
        &self,
        map_class: impl FnOnce(&Cls) -> C2,
        map_uninitialized: impl FnOnce(&U) -> U2,
    ) -> VerificationType<C2, U2> {
        self.try_map::<C2, U2, std::convert::Infallible>(
            |cls| Ok(map_class(cls)),
            |uninit| Ok(map_uninitialized(uninit)),
        )
        .unwrap_or_else(|never| match never {})
    }

    /// Like [`Self::map`], but either of the mapping functions may fail
    pub fn try_map<C2, U2, E>(
        &self,
        map_class: impl FnOnce(&Cls) -> Result<C2, E>,
        map_uninitialized: impl FnOnce(&U) -> Result<U2, E>,
    ) -> Result<VerificationType<C2, U2>, E> {
        Ok(match self {
            VerificationType::Top => VerificationType::Top,
            VerificationType::Integer => VerificationType::Integer,
            VerificationType::Float => VerificationType::Float,
            VerificationType::Long => VerificationType::Long,
            VerificationType::Double => VerificationType::Double,
            VerificationType::Null => VerificationType::Null,
            VerificationType::UninitializedThis => VerificationType::UninitializedThis,
            VerificationType::Object(cls) => VerificationType::Object(map_class(cls)?),
            VerificationType::Uninitialized(uninit) => {
                VerificationType::Uninitialized(map_uninitialized(uninit)?)
            }
        })
    }
}

impl<C, U> From<FieldType<C>> for VerificationType<RefType<C>, U> {
    fn from(field_type: FieldType<C>) -> Self {
        match field_type {
            FieldType::Base(BaseType::Int)
            | FieldType::Base(BaseType::Char)
            | FieldType::Base(BaseType::Short)
            | FieldType::Base(BaseType::Byte)
            | FieldType::Base(BaseType::Boolean) => VerificationType::Integer,
            FieldType::Base(BaseType::Float) => VerificationType::Float,
            FieldType::Base(BaseType::Long) => VerificationType::Long,
            FieldType::Base(BaseType::Double) => VerificationType::Double,
            FieldType::Ref(ref_type) => VerificationType::Object(ref_type),
        }
    }
}

impl Serialize for VerificationType<u16, u16> {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        match self {
            VerificationType::Top => 0u8.serialize(writer)?,
            VerificationType::Integer => 1u8.serialize(writer)?,
            VerificationType::Float => 2u8.serialize(writer)?,
            VerificationType::Double => 3u8.serialize(writer)?,
            VerificationType::Long => 4u8.serialize(writer)?,
            VerificationType::Null => 5u8.serialize(writer)?,
            VerificationType::UninitializedThis => 6u8.serialize(writer)?,
            VerificationType::Object(cls) => {
                7u8.serialize(writer)?;
                cls.serialize(writer)?;
            }
            VerificationType::Uninitialized(off) => {
                8u8.serialize(writer)?;
                off.serialize(writer)?;
            }
        };
        Ok(())
    }
}

impl<Cls, A> Width for VerificationType<Cls, A> {
    fn width(&self) -> usize {
        match self {
            VerificationType::Double | VerificationType::Long => 2,
            _ => 1,
        }
    }
}

impl<U: fmt::Display> fmt::Display for VerificationType<RefType<BinaryName>, U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerificationType::Top => f.write_str("top"),
            VerificationType::Integer => f.write_str("int"),
            VerificationType::Float => f.write_str("float"),
            VerificationType::Long => f.write_str("long"),
            VerificationType::Double => f.write_str("double"),
            VerificationType::Null => f.write_str("null"),
            VerificationType::UninitializedThis => f.write_str("uninitialized_this"),
            VerificationType::Object(cls) => f.write_str(&class_operand(cls)),
            VerificationType::Uninitialized(origin) => write!(f, "uninitialized({})", origin),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::jvm::class_file::Serialize;

    type VType = VerificationType<u16, u16>;

    fn bytes(typ: &VType) -> Vec<u8> {
        let mut out = vec![];
        typ.serialize(&mut out).unwrap();
        out
    }

    #[test]
    fn serialized_tags() {
        assert_eq!(bytes(&VType::Top), vec![0]);
        assert_eq!(bytes(&VType::Integer), vec![1]);
        assert_eq!(bytes(&VType::Long), vec![4]);
        assert_eq!(bytes(&VType::UninitializedThis), vec![6]);
        assert_eq!(bytes(&VType::Object(0x0102)), vec![7, 1, 2]);
        assert_eq!(bytes(&VType::Uninitialized(17)), vec![8, 0, 17]);
    }

    #[test]
    fn from_field_types() {
        let boolean: VerificationType<RefType<BinaryName>, ()> = FieldType::<BinaryName>::boolean().into();
        assert_eq!(boolean, VerificationType::Integer);

        let string: VerificationType<RefType<BinaryName>, ()> =
            FieldType::object(BinaryName::STRING).into();
        assert_eq!(
            string,
            VerificationType::Object(RefType::Object(BinaryName::STRING))
        );
    }

    #[test]
    fn display() {
        let array: VerificationType<RefType<BinaryName>, u16> =
            FieldType::<BinaryName>::array(FieldType::int()).into();
        assert_eq!(array.to_string(), "[I");
        let uninit: VerificationType<RefType<BinaryName>, u16> = VerificationType::Uninitialized(4);
        assert_eq!(uninit.to_string(), "uninitialized(4)");
    }
}
