use super::opcodes::*;
use super::{Constant, Instruction};
use crate::util::Width;

/// Number of operand stack slots an instruction pops, then pushes
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct StackEffect {
    pub pops: usize,
    pub pushes: usize,
}

const fn effect(pops: usize, pushes: usize) -> StackEffect {
    StackEffect { pops, pushes }
}

/// Kind of value moved by a load or store
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LocalKind {
    Int,
    Long,
    Float,
    Double,
    Reference,
}

impl LocalKind {
    /// Kinds in opcode order (`iload`, `lload`, `fload`, `dload`, `aload`)
    const ORDER: [LocalKind; 5] = [
        LocalKind::Int,
        LocalKind::Long,
        LocalKind::Float,
        LocalKind::Double,
        LocalKind::Reference,
    ];
}

impl Width for LocalKind {
    fn width(&self) -> usize {
        match self {
            LocalKind::Long | LocalKind::Double => 2,
            _ => 1,
        }
    }
}

/// A load from or store to a local variable
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LocalAccess {
    pub index: u16,
    pub kind: LocalKind,
    pub is_store: bool,
}

impl Instruction {
    /// Operand stack slots consumed and produced by the instruction
    ///
    /// Wide values count as two slots. Unknown opcodes have no effect.
    pub fn stack_effect(&self) -> StackEffect {
        match self {
            Instruction::Label(_) | Instruction::IInc { .. } => effect(0, 0),
            Instruction::Simple(opcode) => simple_stack_effect(*opcode),
            Instruction::Var { opcode, .. } => match *opcode {
                ILOAD | FLOAD | ALOAD => effect(0, 1),
                LLOAD | DLOAD => effect(0, 2),
                ISTORE | FSTORE | ASTORE => effect(1, 0),
                LSTORE | DSTORE => effect(2, 0),
                _ => effect(0, 0),
            },
            Instruction::Type { opcode, .. } => match *opcode {
                NEW => effect(0, 1),
                _ => effect(1, 1),
            },
            Instruction::Field {
                opcode, descriptor, ..
            } => {
                let width = descriptor.width();
                match *opcode {
                    GETSTATIC => effect(0, width),
                    PUTSTATIC => effect(width, 0),
                    GETFIELD => effect(1, width),
                    _ => effect(1 + width, 0),
                }
            }
            Instruction::Method {
                opcode, descriptor, ..
            } => effect(
                descriptor.parameter_length(*opcode != INVOKESTATIC),
                descriptor.return_width(),
            ),
            Instruction::Push(constant) => effect(0, constant.slots()),
            Instruction::Branch { opcode, .. } => match *opcode {
                IFEQ..=IFLE | IFNULL | IFNONNULL => effect(1, 0),
                IF_ICMPEQ..=IF_ACMPNE => effect(2, 0),
                JSR | JSR_W => effect(0, 1),
                _ => effect(0, 0),
            },
            Instruction::LookupSwitch { .. } | Instruction::TableSwitch { .. } => effect(1, 0),
            Instruction::MultiANewArray { dimensions, .. } => effect(*dimensions as usize, 1),
            Instruction::NewArray(_) => effect(1, 1),
            Instruction::InvokeDynamic { descriptor, .. } => effect(
                descriptor.parameter_length(false),
                descriptor.return_width(),
            ),
        }
    }

    /// Local variable read or written by a load or store
    pub fn local_access(&self) -> Option<LocalAccess> {
        let (index, kind_offset, is_store) = match self {
            Instruction::Simple(opcode @ ILOAD_0..=ALOAD_3) => {
                let offset = opcode - ILOAD_0;
                ((offset % 4) as u16, offset / 4, false)
            }
            Instruction::Simple(opcode @ ISTORE_0..=ASTORE_3) => {
                let offset = opcode - ISTORE_0;
                ((offset % 4) as u16, offset / 4, true)
            }
            Instruction::Var {
                opcode: opcode @ ILOAD..=ALOAD,
                index,
            } => (*index, opcode - ILOAD, false),
            Instruction::Var {
                opcode: opcode @ ISTORE..=ASTORE,
                index,
            } => (*index, opcode - ISTORE, true),
            _ => return None,
        };
        Some(LocalAccess {
            index,
            kind: LocalKind::ORDER[kind_offset as usize],
            is_store,
        })
    }

    /// Range of local slots touched by the instruction, as `(first slot, width)`
    pub fn local_slots(&self) -> Option<(u16, u16)> {
        if let Some(access) = self.local_access() {
            return Some((access.index, access.kind.width() as u16));
        }
        match self {
            Instruction::IInc { index, .. } => Some((*index, 1)),
            Instruction::Var { opcode: RET, index } => Some((*index, 1)),
            _ => None,
        }
    }
}

fn simple_stack_effect(opcode: u8) -> StackEffect {
    match opcode {
        NOP => effect(0, 0),
        ACONST_NULL | ICONST_M1..=ICONST_5 | FCONST_0..=FCONST_2 => effect(0, 1),
        LCONST_0 | LCONST_1 | DCONST_0 | DCONST_1 => effect(0, 2),

        ILOAD_0..=ILOAD_3 | FLOAD_0..=FLOAD_3 | ALOAD_0..=ALOAD_3 => effect(0, 1),
        LLOAD_0..=LLOAD_3 | DLOAD_0..=DLOAD_3 => effect(0, 2),
        ISTORE_0..=ISTORE_3 | FSTORE_0..=FSTORE_3 | ASTORE_0..=ASTORE_3 => effect(1, 0),
        LSTORE_0..=LSTORE_3 | DSTORE_0..=DSTORE_3 => effect(2, 0),

        IALOAD | FALOAD | AALOAD | BALOAD | CALOAD | SALOAD => effect(2, 1),
        LALOAD | DALOAD => effect(2, 2),
        IASTORE | FASTORE | AASTORE | BASTORE | CASTORE | SASTORE => effect(3, 0),
        LASTORE | DASTORE => effect(4, 0),

        POP => effect(1, 0),
        POP2 => effect(2, 0),
        DUP => effect(1, 2),
        DUP_X1 => effect(2, 3),
        DUP_X2 => effect(3, 4),
        DUP2 => effect(2, 4),
        DUP2_X1 => effect(3, 5),
        DUP2_X2 => effect(4, 6),
        SWAP => effect(2, 2),

        IADD | ISUB | IMUL | IDIV | IREM | ISHL | ISHR | IUSHR | IAND | IOR | IXOR => effect(2, 1),
        FADD | FSUB | FMUL | FDIV | FREM => effect(2, 1),
        LADD | LSUB | LMUL | LDIV | LREM | LAND | LOR | LXOR => effect(4, 2),
        DADD | DSUB | DMUL | DDIV | DREM => effect(4, 2),
        LSHL | LSHR | LUSHR => effect(3, 2),
        INEG | FNEG => effect(1, 1),
        LNEG | DNEG => effect(2, 2),

        I2F | F2I | I2B | I2C | I2S => effect(1, 1),
        I2L | I2D | F2L | F2D => effect(1, 2),
        L2I | L2F | D2I | D2F => effect(2, 1),
        L2D | D2L => effect(2, 2),

        LCMP | DCMPL | DCMPG => effect(4, 1),
        FCMPL | FCMPG => effect(2, 1),

        IRETURN | FRETURN | ARETURN => effect(1, 0),
        LRETURN | DRETURN => effect(2, 0),
        RETURN => effect(0, 0),

        ARRAYLENGTH => effect(1, 1),
        ATHROW | MONITORENTER | MONITOREXIT => effect(1, 0),
        _ => effect(0, 0),
    }
}

impl Constant {
    /// Width of the pushed constant, in stack slots
    pub fn slots(&self) -> usize {
        if self.is_wide() {
            2
        } else {
            1
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::jvm::names::Name;
    use crate::jvm::{BinaryName, MethodDescriptor, ParseDescriptor, UnqualifiedName};

    #[test]
    fn arithmetic_effects() {
        assert_eq!(Instruction::Simple(IADD).stack_effect(), effect(2, 1));
        assert_eq!(Instruction::Simple(LADD).stack_effect(), effect(4, 2));
        assert_eq!(Instruction::Simple(LSHL).stack_effect(), effect(3, 2));
        assert_eq!(Instruction::Simple(DCMPG).stack_effect(), effect(4, 1));
        assert_eq!(Instruction::Simple(DUP2_X2).stack_effect(), effect(4, 6));
    }

    #[test]
    fn invoke_effects() {
        let descriptor = MethodDescriptor::parse("(IJ)D").unwrap();
        let virtual_call = Instruction::Method {
            opcode: INVOKEVIRTUAL,
            owner: BinaryName::OBJECT,
            name: UnqualifiedName::from_string("foo".to_string()).unwrap(),
            descriptor: descriptor.clone(),
            interface: false,
        };
        assert_eq!(virtual_call.stack_effect(), effect(4, 2));

        let static_call = Instruction::Method {
            opcode: INVOKESTATIC,
            owner: BinaryName::OBJECT,
            name: UnqualifiedName::from_string("foo".to_string()).unwrap(),
            descriptor,
            interface: false,
        };
        assert_eq!(static_call.stack_effect(), effect(3, 2));
    }

    #[test]
    fn implicit_locals() {
        assert_eq!(
            Instruction::Simple(LLOAD_2).local_access(),
            Some(LocalAccess {
                index: 2,
                kind: LocalKind::Long,
                is_store: false
            })
        );
        assert_eq!(
            Instruction::Simple(ASTORE_3).local_access(),
            Some(LocalAccess {
                index: 3,
                kind: LocalKind::Reference,
                is_store: true
            })
        );
        assert_eq!(Instruction::Simple(DSTORE_1).local_slots(), Some((1, 2)));
        assert_eq!(
            Instruction::IInc { index: 7, value: 1 }.local_slots(),
            Some((7, 1))
        );
        assert_eq!(Instruction::Simple(IADD).local_access(), None);
    }

    #[test]
    fn constant_widths() {
        assert_eq!(Constant::Double(1.0).slots(), 2);
        assert_eq!(Constant::String("s".to_string()).slots(), 1);
    }
}
