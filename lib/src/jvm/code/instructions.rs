use super::opcodes;
use super::Label;
use crate::jvm::{
    BaseType, BinaryName, FieldType, MethodDescriptor, Name, RefType, RenderDescriptor,
    UnqualifiedName,
};
use std::fmt;

/// Instruction in a method body, or a label marking a position in the body
///
/// Opcodes are stored as raw `u8` values (see [`opcodes`]) and grouped by the shape of their
/// operands. Offsets and constant pool indices are not represented: jumps refer to [`Label`]s and
/// constants are kept symbolically.
#[derive(Clone, Debug, PartialEq)]
pub enum Instruction {
    /// Marks the position of the next instruction
    Label(Label),

    /// Instruction without operands (`iadd`, `aload_0`, `dup_x2`, `athrow`, ...)
    Simple(u8),

    /// Instruction referencing a local variable (`iload`, `astore`, `ret`, ...)
    Var { opcode: u8, index: u16 },

    /// `new`, `checkcast`, or `instanceof`
    Type { opcode: u8, class: RefType<BinaryName> },

    /// `getstatic`, `putstatic`, `getfield`, or `putfield`
    Field {
        opcode: u8,
        owner: BinaryName,
        name: UnqualifiedName,
        descriptor: FieldType<BinaryName>,
    },

    /// `invokevirtual`, `invokespecial`, `invokestatic`, or `invokeinterface`
    Method {
        opcode: u8,
        owner: BinaryName,
        name: UnqualifiedName,
        descriptor: MethodDescriptor<BinaryName>,
        interface: bool,
    },

    /// Increment a local `int` variable
    IInc { index: u16, value: i16 },

    /// Push a constant (`iconst_*`, `bipush`, `sipush`, `ldc`, `ldc2_w`, ...)
    Push(Constant),

    /// Conditional or unconditional jump (including `jsr`)
    Branch { opcode: u8, target: Label },

    LookupSwitch {
        default: Label,
        targets: Vec<(i32, Label)>,
    },

    /// Jump table covering `low..low + targets.len()`
    TableSwitch {
        default: Label,
        low: i32,
        targets: Vec<Label>,
    },

    MultiANewArray {
        class: RefType<BinaryName>,
        dimensions: u8,
    },

    /// Create a one dimensional array with the given element type
    ///
    /// Primitive element types correspond to `newarray`, reference types to `anewarray`.
    NewArray(FieldType<BinaryName>),

    InvokeDynamic {
        name: UnqualifiedName,
        descriptor: MethodDescriptor<BinaryName>,
        bootstrap: MethodHandle,
        arguments: Vec<Constant>,
    },
}

/// Loadable constant
#[derive(Clone, Debug, PartialEq)]
pub enum Constant {
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    String(String),
    Class(RefType<BinaryName>),
    MethodType(MethodDescriptor<BinaryName>),
    MethodHandle(MethodHandle),
    Dynamic {
        name: UnqualifiedName,
        descriptor: FieldType<BinaryName>,
    },
}

/// Symbolic method handle
///
/// `kind` is the reference kind (1 for `getField` through 9 for `invokeInterface`) and
/// `descriptor` is either a field or method descriptor, depending on that kind.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MethodHandle {
    pub kind: u8,
    pub owner: BinaryName,
    pub name: UnqualifiedName,
    pub descriptor: String,
    pub interface: bool,
}

impl Constant {
    /// Does this constant take two stack slots?
    pub fn is_wide(&self) -> bool {
        match self {
            Constant::Long(_) | Constant::Double(_) => true,
            Constant::Dynamic { descriptor, .. } => descriptor.is_wide(),
            _ => false,
        }
    }
}

impl Instruction {
    /// Labels which this instruction may jump to
    pub fn jump_targets(&self) -> Vec<Label> {
        match self {
            Instruction::Branch { target, .. } => vec![*target],
            Instruction::LookupSwitch { default, targets } => targets
                .iter()
                .map(|(_, target)| *target)
                .chain(std::iter::once(*default))
                .collect(),
            Instruction::TableSwitch {
                default, targets, ..
            } => targets
                .iter()
                .copied()
                .chain(std::iter::once(*default))
                .collect(),
            _ => vec![],
        }
    }

    /// Does this instruction close a basic block?
    pub fn ends_block(&self) -> bool {
        match self {
            Instruction::Branch { .. }
            | Instruction::LookupSwitch { .. }
            | Instruction::TableSwitch { .. } => true,
            Instruction::Simple(opcode) | Instruction::Var { opcode, .. } => {
                opcodes::is_terminal(*opcode)
            }
            _ => false,
        }
    }

    /// Can control continue to the next instruction?
    pub fn falls_through(&self) -> bool {
        match self {
            Instruction::Branch { opcode, .. } => opcodes::is_conditional_branch(*opcode),
            Instruction::LookupSwitch { .. } | Instruction::TableSwitch { .. } => false,
            Instruction::Simple(opcode) | Instruction::Var { opcode, .. } => {
                !opcodes::is_terminal(*opcode)
            }
            _ => true,
        }
    }

    /// Is this a `new` instruction?
    pub fn is_new(&self) -> bool {
        matches!(
            self,
            Instruction::Type {
                opcode: opcodes::NEW,
                ..
            }
        )
    }
}

/// Render a class operand the way the constant pool would store it: plain internal names for
/// classes and descriptors for arrays
pub fn class_operand(class: &RefType<BinaryName>) -> String {
    match class {
        RefType::Object(name) => name.as_str().to_owned(),
        array => array.render(),
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Integer(value) => write!(f, "{}", value),
            Constant::Float(value) => write!(f, "{:?}f", value),
            Constant::Long(value) => write!(f, "{}L", value),
            Constant::Double(value) => write!(f, "{:?}d", value),
            Constant::String(value) => write!(f, "{:?}", value),
            Constant::Class(class) => write!(f, "class {}", class_operand(class)),
            Constant::MethodType(descriptor) => write!(f, "methodtype {}", descriptor.render()),
            Constant::MethodHandle(handle) => write!(f, "handle {}", handle),
            Constant::Dynamic { name, descriptor } => {
                write!(f, "dynamic {} {}", name, descriptor.render())
            }
        }
    }
}

impl fmt::Display for MethodHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.kind, self.owner, self.name, self.descriptor
        )?;
        if self.interface {
            f.write_str(" interface")?;
        }
        Ok(())
    }
}

/// Textual form used by [`crate::listing`]
impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Label(label) => write!(f, "{}:", label),
            Instruction::Simple(opcode) => f.write_str(opcodes::mnemonic(*opcode)),
            Instruction::Var { opcode, index } => {
                write!(f, "{} {}", opcodes::mnemonic(*opcode), index)
            }
            Instruction::Type { opcode, class } => {
                write!(f, "{} {}", opcodes::mnemonic(*opcode), class_operand(class))
            }
            Instruction::Field {
                opcode,
                owner,
                name,
                descriptor,
            } => write!(
                f,
                "{} {} {} {}",
                opcodes::mnemonic(*opcode),
                owner,
                name,
                descriptor.render()
            ),
            Instruction::Method {
                opcode,
                owner,
                name,
                descriptor,
                interface,
            } => {
                write!(
                    f,
                    "{} {} {} {}",
                    opcodes::mnemonic(*opcode),
                    owner,
                    name,
                    descriptor.render()
                )?;
                if *interface && *opcode != opcodes::INVOKEINTERFACE {
                    f.write_str(" interface")?;
                }
                Ok(())
            }
            Instruction::IInc { index, value } => write!(f, "iinc {} {}", index, value),
            Instruction::Push(constant) => match constant {
                Constant::Integer(-1) => f.write_str("iconst_m1"),
                Constant::Integer(value @ 0..=5) => write!(f, "iconst_{}", value),
                Constant::Integer(value @ -128..=127) => write!(f, "bipush {}", value),
                Constant::Integer(value @ -32768..=32767) => write!(f, "sipush {}", value),
                Constant::Long(value @ 0..=1) => write!(f, "lconst_{}", value),
                Constant::Long(_) | Constant::Double(_) => write!(f, "ldc2_w {}", constant),
                Constant::Dynamic { .. } if constant.is_wide() => write!(f, "ldc2_w {}", constant),
                _ => write!(f, "ldc {}", constant),
            },
            Instruction::Branch { opcode, target } => {
                write!(f, "{} {}", opcodes::mnemonic(*opcode), target)
            }
            Instruction::LookupSwitch { default, targets } => {
                f.write_str("lookupswitch")?;
                for (key, target) in targets {
                    write!(f, " {}:{}", key, target)?;
                }
                write!(f, " default:{}", default)
            }
            Instruction::TableSwitch {
                default,
                low,
                targets,
            } => {
                write!(f, "tableswitch {}", low)?;
                for target in targets {
                    write!(f, " {}", target)?;
                }
                write!(f, " default:{}", default)
            }
            Instruction::MultiANewArray { class, dimensions } => {
                write!(f, "multianewarray {} {}", class_operand(class), dimensions)
            }
            Instruction::NewArray(FieldType::Base(base_type)) => {
                write!(f, "newarray {}", base_type_keyword(*base_type))
            }
            Instruction::NewArray(FieldType::Ref(class)) => {
                write!(f, "anewarray {}", class_operand(class))
            }
            Instruction::InvokeDynamic {
                name,
                descriptor,
                bootstrap,
                arguments,
            } => {
                write!(
                    f,
                    "invokedynamic {} {} {}",
                    name,
                    descriptor.render(),
                    bootstrap
                )?;
                for argument in arguments {
                    write!(f, " , {}", argument)?;
                }
                Ok(())
            }
        }
    }
}

/// Keyword used by `newarray` for a primitive element type
pub fn base_type_keyword(base_type: BaseType) -> &'static str {
    match base_type {
        BaseType::Boolean => "boolean",
        BaseType::Char => "char",
        BaseType::Float => "float",
        BaseType::Double => "double",
        BaseType::Byte => "byte",
        BaseType::Short => "short",
        BaseType::Int => "int",
        BaseType::Long => "long",
    }
}

/// Inverse of [`base_type_keyword`]
pub fn base_type_from_keyword(keyword: &str) -> Option<BaseType> {
    let base_type = match keyword {
        "boolean" => BaseType::Boolean,
        "char" => BaseType::Char,
        "float" => BaseType::Float,
        "double" => BaseType::Double,
        "byte" => BaseType::Byte,
        "short" => BaseType::Short,
        "int" => BaseType::Int,
        "long" => BaseType::Long,
        _ => return None,
    };
    Some(base_type)
}
