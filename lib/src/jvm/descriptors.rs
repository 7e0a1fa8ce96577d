use super::{BinaryName, Error, Name};
use crate::util::Width;

/// Descriptors that can be written out in class file syntax (eg. `[Ljava/lang/String;`)
pub trait RenderDescriptor {
    fn render_to(&self, out: &mut String);

    fn render(&self) -> String {
        let mut out = String::new();
        self.render_to(&mut out);
        out
    }
}

/// Descriptors that can be read back from class file syntax
pub trait ParseDescriptor: Sized {
    fn parse_from(cursor: &mut DescriptorCursor<'_>) -> Result<Self, Error>;

    /// Parse a string holding exactly one descriptor
    fn parse(source: &str) -> Result<Self, Error> {
        let mut cursor = DescriptorCursor { source, offset: 0 };
        let parsed = Self::parse_from(&mut cursor)?;
        match cursor.peek() {
            None => Ok(parsed),
            Some(c) => Err(cursor.error(format!("unexpected trailing `{}`", c))),
        }
    }
}

/// Read position inside a descriptor string
pub struct DescriptorCursor<'a> {
    source: &'a str,
    offset: usize,
}

impl<'a> DescriptorCursor<'a> {
    fn peek(&self) -> Option<char> {
        self.source[self.offset..].chars().next()
    }

    fn bump(&mut self) {
        if let Some(c) = self.peek() {
            self.offset += c.len_utf8();
        }
    }

    /// Consume `expected` if it is next
    fn eat(&mut self, expected: char) -> bool {
        let found = self.peek() == Some(expected);
        if found {
            self.bump();
        }
        found
    }

    /// Consume everything up to and including `terminator`, returning what came before it
    fn take_until(&mut self, terminator: char) -> Option<&'a str> {
        let rest = &self.source[self.offset..];
        let end = rest.find(terminator)?;
        self.offset += end + terminator.len_utf8();
        Some(&rest[..end])
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::MalformedDescriptor {
            offset: self.offset,
            message: message.into(),
        }
    }
}

/// Primitive value types
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum BaseType {
    Byte,
    Char,
    Double,
    Float,
    Int,
    Long,
    Short,
    Boolean,
}

impl BaseType {
    const ALL: [BaseType; 8] = [
        BaseType::Byte,
        BaseType::Char,
        BaseType::Double,
        BaseType::Float,
        BaseType::Int,
        BaseType::Long,
        BaseType::Short,
        BaseType::Boolean,
    ];

    const fn descriptor_char(self) -> char {
        match self {
            BaseType::Byte => 'B',
            BaseType::Char => 'C',
            BaseType::Double => 'D',
            BaseType::Float => 'F',
            BaseType::Int => 'I',
            BaseType::Long => 'J',
            BaseType::Short => 'S',
            BaseType::Boolean => 'Z',
        }
    }

    /// Do values of this type take two slots on the stack and in the locals?
    pub const fn is_wide(self) -> bool {
        matches!(self, BaseType::Long | BaseType::Double)
    }
}

impl Width for BaseType {
    fn width(&self) -> usize {
        if self.is_wide() {
            2
        } else {
            1
        }
    }
}

impl RenderDescriptor for BaseType {
    fn render_to(&self, out: &mut String) {
        out.push(self.descriptor_char());
    }
}

impl ParseDescriptor for BaseType {
    fn parse_from(cursor: &mut DescriptorCursor<'_>) -> Result<Self, Error> {
        let c = cursor
            .peek()
            .ok_or_else(|| cursor.error("missing primitive type"))?;
        let base_type = BaseType::ALL
            .into_iter()
            .find(|base_type| base_type.descriptor_char() == c)
            .ok_or_else(|| cursor.error(format!("`{}` is not a primitive type", c)))?;
        cursor.bump();
        Ok(base_type)
    }
}

/// Reference type
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum RefType<Class> {
    Object(Class),
    ObjectArray(ArrayType<Class>),
    PrimitiveArray(ArrayType<BaseType>),
}

/// Array type, split into its innermost non-array element and its nesting
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct ArrayType<T> {
    /// Dimensions beyond the first (`A[]` has 0, `A[][][][]` has 3)
    pub additional_dimensions: usize,

    /// Innermost element type (`A` for `A[][]`)
    pub element_type: T,
}

impl<T> ArrayType<T> {
    fn nested(self) -> ArrayType<T> {
        ArrayType {
            additional_dimensions: self.additional_dimensions + 1,
            ..self
        }
    }

    /// Array with one dimension fewer, unless the elements are not arrays
    fn peeled(&self) -> Option<ArrayType<T>>
    where
        T: Clone,
    {
        Some(ArrayType {
            additional_dimensions: self.additional_dimensions.checked_sub(1)?,
            element_type: self.element_type.clone(),
        })
    }
}

/// Class files cap array types at this many dimensions
const MAX_ARRAY_DIMENSIONS: usize = 255;

impl RenderDescriptor for BinaryName {
    fn render_to(&self, out: &mut String) {
        out.push('L');
        out.push_str(self.as_str());
        out.push(';');
    }
}

impl ParseDescriptor for BinaryName {
    fn parse_from(cursor: &mut DescriptorCursor<'_>) -> Result<Self, Error> {
        if !cursor.eat('L') {
            return Err(cursor.error("expected `L` to start a class type"));
        }
        let name = cursor
            .take_until(';')
            .ok_or_else(|| cursor.error("missing `;` after class name"))?;
        BinaryName::from_string(name.to_owned()).map_err(|message| cursor.error(message))
    }
}

impl<C: RenderDescriptor> RenderDescriptor for RefType<C> {
    fn render_to(&self, out: &mut String) {
        let (brackets, element): (usize, &dyn RenderDescriptor) = match self {
            RefType::Object(class) => (0, class),
            RefType::ObjectArray(array) => (array.additional_dimensions + 1, &array.element_type),
            RefType::PrimitiveArray(array) => {
                (array.additional_dimensions + 1, &array.element_type)
            }
        };
        out.extend(std::iter::repeat('[').take(brackets));
        element.render_to(out);
    }
}

impl<C: ParseDescriptor> ParseDescriptor for RefType<C> {
    fn parse_from(cursor: &mut DescriptorCursor<'_>) -> Result<Self, Error> {
        let mut brackets = 0;
        while cursor.eat('[') {
            brackets += 1;
        }
        if brackets > MAX_ARRAY_DIMENSIONS {
            let message = format!("array type has {} dimensions", brackets);
            return Err(cursor.error(message));
        }

        let additional_dimensions = match brackets.checked_sub(1) {
            None => return C::parse_from(cursor).map(RefType::Object),
            Some(additional_dimensions) => additional_dimensions,
        };
        Ok(if cursor.peek() == Some('L') {
            RefType::ObjectArray(ArrayType {
                additional_dimensions,
                element_type: C::parse_from(cursor)?,
            })
        } else {
            RefType::PrimitiveArray(ArrayType {
                additional_dimensions,
                element_type: BaseType::parse_from(cursor)?,
            })
        })
    }
}

impl<C> RefType<C> {
    /// Array whose elements have the given type
    pub fn array(element: FieldType<C>) -> RefType<C> {
        match element {
            FieldType::Base(element_type) => RefType::PrimitiveArray(ArrayType {
                additional_dimensions: 0,
                element_type,
            }),
            FieldType::Ref(RefType::Object(element_type)) => RefType::ObjectArray(ArrayType {
                additional_dimensions: 0,
                element_type,
            }),
            FieldType::Ref(RefType::PrimitiveArray(array)) => {
                RefType::PrimitiveArray(array.nested())
            }
            FieldType::Ref(RefType::ObjectArray(array)) => RefType::ObjectArray(array.nested()),
        }
    }

    /// Type of the values loaded out of this array (`None` if this is not an array)
    pub fn element_type(&self) -> Option<FieldType<C>>
    where
        C: Clone,
    {
        Some(match self {
            RefType::Object(_) => return None,
            RefType::PrimitiveArray(array) => match array.peeled() {
                Some(inner) => FieldType::Ref(RefType::PrimitiveArray(inner)),
                None => FieldType::Base(array.element_type),
            },
            RefType::ObjectArray(array) => match array.peeled() {
                Some(inner) => FieldType::Ref(RefType::ObjectArray(inner)),
                None => FieldType::object(array.element_type.clone()),
            },
        })
    }
}

/// Type of a field, parameter, or return value
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum FieldType<Class> {
    Base(BaseType),
    Ref(RefType<Class>),
}

impl<C> FieldType<C> {
    pub fn array(element: FieldType<C>) -> FieldType<C> {
        FieldType::Ref(RefType::array(element))
    }

    pub const fn object(class_name: C) -> FieldType<C> {
        FieldType::Ref(RefType::Object(class_name))
    }

    pub const fn int() -> FieldType<C> {
        FieldType::Base(BaseType::Int)
    }

    pub const fn long() -> FieldType<C> {
        FieldType::Base(BaseType::Long)
    }

    pub const fn float() -> FieldType<C> {
        FieldType::Base(BaseType::Float)
    }

    pub const fn boolean() -> FieldType<C> {
        FieldType::Base(BaseType::Boolean)
    }

    /// Is this a `long` or `double`?
    pub fn is_wide(&self) -> bool {
        matches!(self, FieldType::Base(base_type) if base_type.is_wide())
    }
}

impl<C> Width for FieldType<C> {
    fn width(&self) -> usize {
        if self.is_wide() {
            2
        } else {
            1
        }
    }
}

impl<C: RenderDescriptor> RenderDescriptor for FieldType<C> {
    fn render_to(&self, out: &mut String) {
        match self {
            FieldType::Base(base_type) => base_type.render_to(out),
            FieldType::Ref(ref_type) => ref_type.render_to(out),
        }
    }
}

impl<C: ParseDescriptor> ParseDescriptor for FieldType<C> {
    fn parse_from(cursor: &mut DescriptorCursor<'_>) -> Result<Self, Error> {
        match cursor.peek() {
            None => Err(cursor.error("missing field type")),
            Some('L' | '[') => RefType::parse_from(cursor).map(FieldType::Ref),
            Some(_) => BaseType::parse_from(cursor).map(FieldType::Base),
        }
    }
}

/// Signature of a method
#[derive(PartialEq, Eq, Hash, Debug, Clone)]
pub struct MethodDescriptor<Class> {
    pub parameters: Vec<FieldType<Class>>,

    /// `None` for `void`
    pub return_type: Option<FieldType<Class>>,
}

impl<C> MethodDescriptor<C> {
    /// Local variable slots the parameters occupy on entry, in order
    ///
    /// Every parameter yields its type, and a `long` or `double` is followed by `None` for its
    /// second slot.
    pub fn parameter_slots(&self) -> impl Iterator<Item = Option<&FieldType<C>>> + '_ {
        self.parameters.iter().flat_map(|parameter| {
            let second_half = if parameter.is_wide() { Some(None) } else { None };
            std::iter::once(Some(parameter)).chain(second_half)
        })
    }

    /// Slots taken by the arguments, plus one for the receiver if there is one
    ///
    /// A valid method keeps this at 255 or less.
    pub fn parameter_length(&self, has_this_param: bool) -> usize {
        let arguments: usize = self.parameters.iter().map(Width::width).sum();
        arguments + usize::from(has_this_param)
    }

    /// Stack slots pushed by returning from the method
    pub fn return_width(&self) -> usize {
        self.return_type.as_ref().map_or(0, Width::width)
    }
}

impl<C: RenderDescriptor> RenderDescriptor for MethodDescriptor<C> {
    fn render_to(&self, out: &mut String) {
        out.push('(');
        for parameter in &self.parameters {
            parameter.render_to(out);
        }
        out.push(')');
        match &self.return_type {
            None => out.push('V'),
            Some(return_type) => return_type.render_to(out),
        }
    }
}

impl<C: ParseDescriptor> ParseDescriptor for MethodDescriptor<C> {
    fn parse_from(cursor: &mut DescriptorCursor<'_>) -> Result<Self, Error> {
        if !cursor.eat('(') {
            return Err(cursor.error("expected `(` to start a method descriptor"));
        }
        let mut parameters = vec![];
        while !cursor.eat(')') {
            parameters.push(FieldType::parse_from(cursor)?);
        }
        let return_type = if cursor.eat('V') {
            None
        } else {
            Some(FieldType::parse_from(cursor)?)
        };
        Ok(MethodDescriptor {
            parameters,
            return_type,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    type FT = FieldType<BinaryName>;

    const INT: FT = FieldType::Base(BaseType::Int);
    const LONG: FT = FieldType::Base(BaseType::Long);
    const DOUBLE: FT = FieldType::Base(BaseType::Double);
    const STRING: FT = FieldType::object(BinaryName::STRING);

    fn error_offset<T: std::fmt::Debug>(result: Result<T, Error>) -> usize {
        match result {
            Err(Error::MalformedDescriptor { offset, .. }) => offset,
            other => panic!("expected a malformed descriptor, got {:?}", other),
        }
    }

    #[test]
    fn primitive_types() {
        for c in "BCDFIJSZ".chars() {
            let base_type = BaseType::parse(&c.to_string()).unwrap();
            assert_eq!(base_type.render(), c.to_string());
            assert_eq!(base_type.width(), if "DJ".contains(c) { 2 } else { 1 });
        }
    }

    #[test]
    fn field_types_reparse() {
        let descriptors = [
            "I",
            "Ljava/lang/Object;",
            "[[[D",
            "[Ljava/lang/String;",
            "[[Lme/alec/Foo$Bar;",
        ];
        for descriptor in descriptors {
            assert_eq!(FT::parse(descriptor).unwrap().render(), descriptor);
        }
        assert_eq!(
            FT::parse("[[[D").unwrap(),
            FieldType::array(FieldType::array(FieldType::array(DOUBLE)))
        );
        assert_eq!(FT::parse("[Ljava/lang/String;").unwrap(), FieldType::array(STRING));
    }

    #[test]
    fn malformed_descriptors() {
        assert_eq!(error_offset(FT::parse("")), 0);
        assert_eq!(error_offset(FT::parse("Q")), 0);
        assert_eq!(error_offset(FT::parse("Ljava/lang/String")), 1);
        assert_eq!(error_offset(FT::parse("[")), 1);
        assert_eq!(error_offset(FT::parse("II")), 1);
        assert_eq!(error_offset(MethodDescriptor::<BinaryName>::parse("(I[V)V")), 3);
        assert_eq!(error_offset(MethodDescriptor::<BinaryName>::parse("(I")), 2);
        assert_eq!(error_offset(MethodDescriptor::<BinaryName>::parse("()")), 2);
        assert_eq!(error_offset(MethodDescriptor::<BinaryName>::parse("I()V")), 0);
    }

    #[test]
    fn array_dimension_limit() {
        let deepest = format!("{}I", "[".repeat(255));
        assert_eq!(FT::parse(&deepest).unwrap().render(), deepest);

        let too_deep = format!("{}I", "[".repeat(256));
        assert_eq!(error_offset(FT::parse(&too_deep)), 256);
    }

    #[test]
    fn array_element_types() {
        let strings = RefType::array(STRING);
        assert_eq!(strings.element_type(), Some(STRING));

        let ints = RefType::<BinaryName>::array(FieldType::array(INT));
        assert_eq!(ints.element_type(), Some(FieldType::array(INT)));
        assert_eq!(
            ints.element_type()
                .and_then(|inner| match inner {
                    FieldType::Ref(inner) => inner.element_type(),
                    FieldType::Base(_) => None,
                }),
            Some(INT)
        );

        assert_eq!(RefType::Object(BinaryName::OBJECT).element_type(), None);
    }

    #[test]
    fn parameter_slots() {
        let desc = MethodDescriptor::<BinaryName>::parse("(IJLjava/lang/String;D)V").unwrap();
        assert_eq!(
            desc.parameter_slots().collect::<Vec<_>>(),
            vec![
                Some(&INT),
                Some(&LONG),
                None,
                Some(&STRING),
                Some(&DOUBLE),
                None
            ]
        );
        assert_eq!(desc.parameter_length(false), 6);
        assert_eq!(desc.parameter_length(true), 7);
        assert_eq!(desc.return_width(), 0);
        assert_eq!(desc.render(), "(IJLjava/lang/String;D)V");

        let desc = MethodDescriptor::<BinaryName>::parse("()J").unwrap();
        assert_eq!(desc.parameter_slots().count(), 0);
        assert_eq!(desc.return_width(), 2);
    }
}
