use super::{SlotType, VerificationType};
use crate::jvm::code::opcodes::*;
use crate::jvm::code::{Constant, Instruction, LocalKind};
use crate::jvm::{BinaryName, FieldType, MethodDescriptor, RefType, UnqualifiedName};
use crate::util::Width;

/// Abstract state of the locals and operand stack, with one entry per slot
///
/// Wide values take two entries: the `Long`/`Double` entry followed by a `Top` entry. A `None`
/// entry is a slot about which nothing is known yet.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SlotState {
    /// Local variables
    pub locals: Vec<SlotType>,

    /// Operand stack (bottom first)
    pub stack: Vec<SlotType>,
}

/// Parts of the method being analyzed which the interpretation of one instruction can depend on
#[derive(Copy, Clone)]
pub struct MethodContext<'a> {
    /// Class declaring the method (`UninitializedThis` becomes this type after `<init>`)
    pub this_class: &'a BinaryName,

    /// Whole instruction sequence (to find out which class an `Uninitialized` was allocated as)
    pub instructions: &'a [Instruction],
}

impl SlotState {
    pub fn push(&mut self, typ: VerificationType<RefType<BinaryName>, usize>) {
        let is_wide = typ.is_wide();
        self.stack.push(Some(typ));
        if is_wide {
            self.stack.push(Some(VerificationType::Top));
        }
    }

    /// Push a slot as-is (without adding a `Top` for wide values)
    fn push_slot(&mut self, slot: SlotType) {
        self.stack.push(slot);
    }

    pub fn push_field_type(&mut self, field_type: &FieldType<BinaryName>) {
        self.push(VerificationType::from(field_type.clone()));
    }

    /// Pop one slot off the stack
    ///
    /// Popping an empty stack is tolerated and produces an unknown slot.
    pub fn pop(&mut self) -> SlotType {
        match self.stack.pop() {
            Some(slot) => slot,
            None => {
                log::warn!("Popped an empty operand stack");
                None
            }
        }
    }

    pub fn pop_slots(&mut self, count: usize) {
        for _ in 0..count {
            self.pop();
        }
    }

    /// Read a local, extending the locals if the index is past the end
    pub fn load(&mut self, index: usize) -> SlotType {
        self.ensure_local(index);
        self.locals[index].clone()
    }

    /// Write a local
    ///
    /// Overwriting the second half of a wide value invalidates the first half. Storing a wide
    /// value also writes the `Top` placeholder in the following slot.
    pub fn store(&mut self, index: usize, slot: SlotType) {
        let is_wide = matches!(&slot, Some(typ) if typ.is_wide());
        self.ensure_local(index + usize::from(is_wide));

        if index > 0 && matches!(&self.locals[index - 1], Some(typ) if typ.is_wide()) {
            self.locals[index - 1] = Some(VerificationType::Top);
        }
        self.locals[index] = slot;
        if is_wide {
            self.locals[index + 1] = Some(VerificationType::Top);
        }
    }

    fn ensure_local(&mut self, index: usize) {
        if index >= self.locals.len() {
            self.locals.resize(index + 1, None);
        }
    }

    /// Replace every occurrence of a type in both the stack and the locals
    pub fn replace_all(
        &mut self,
        original: &VerificationType<RefType<BinaryName>, usize>,
        updated: VerificationType<RefType<BinaryName>, usize>,
    ) {
        for slot in self.stack.iter_mut().chain(self.locals.iter_mut()) {
            if slot.as_ref() == Some(original) {
                *slot = Some(updated.clone());
            }
        }
    }

    /// Reset the stack to the single exception slot a handler starts with
    pub fn reset_to_handler(&mut self) {
        self.stack.truncate(1);
        if self.stack.is_empty() {
            self.stack.push(None);
        }
    }
}

/// Update the state to reflect the effects of the given instruction
///
///   * `insn_index` - position of the instruction in the method body, used as the origin of
///     `Uninitialized` types created by `new`
///
/// Inconsistent states (popping an empty stack, array loads on non-arrays) never fail: the slots
/// that cannot be inferred become unknown.
pub fn interpret_instruction(
    state: &mut SlotState,
    context: MethodContext<'_>,
    insn: &Instruction,
    insn_index: usize,
) {
    use VerificationType::*;

    match insn {
        Instruction::Label(_) => (),
        Instruction::Simple(opcode) => interpret_simple(state, *opcode),

        Instruction::Var { opcode: RET, .. } => (),
        Instruction::Var { .. } => interpret_local_access(state, insn),

        Instruction::Type { opcode, class } => match *opcode {
            NEW => state.push(Uninitialized(insn_index)),
            CHECKCAST => {
                state.pop();
                state.push(Object(class.clone()));
            }
            INSTANCEOF => {
                state.pop();
                state.push(Integer);
            }
            _ => log::warn!("Unexpected type instruction {}", insn),
        },

        Instruction::Field {
            opcode, descriptor, ..
        } => match *opcode {
            GETSTATIC => state.push_field_type(descriptor),
            GETFIELD => {
                state.pop();
                state.push_field_type(descriptor);
            }
            PUTSTATIC => state.pop_slots(descriptor.width()),
            _ => state.pop_slots(descriptor.width() + 1),
        },

        Instruction::Method {
            opcode,
            owner,
            name,
            descriptor,
            ..
        } => {
            state.pop_slots(descriptor.parameter_length(false));
            if *opcode != INVOKESTATIC {
                let receiver = state.pop();
                if *opcode == INVOKESPECIAL && name == &UnqualifiedName::INIT {
                    initialize(state, context, receiver, owner);
                }
            }
            push_return_type(state, descriptor);
        }

        // The local keeps its (integer) type
        Instruction::IInc { .. } => (),

        Instruction::Push(constant) => {
            let typ = match constant {
                Constant::Integer(_) => Integer,
                Constant::Float(_) => Float,
                Constant::Long(_) => Long,
                Constant::Double(_) => Double,
                Constant::String(_) => Object(RefType::Object(BinaryName::STRING)),
                Constant::Class(_) => Object(RefType::Object(BinaryName::CLASS)),
                Constant::MethodType(_) => Object(RefType::Object(BinaryName::METHODTYPE)),
                Constant::MethodHandle(_) => Object(RefType::Object(BinaryName::METHODHANDLE)),
                Constant::Dynamic { descriptor, .. } => VerificationType::from(descriptor.clone()),
            };
            state.push(typ);
        }

        Instruction::Branch { opcode, .. } => match *opcode {
            IFEQ..=IFLE | IFNULL | IFNONNULL => state.pop_slots(1),
            IF_ICMPEQ..=IF_ACMPNE => state.pop_slots(2),
            JSR | JSR_W => state.push(Top),
            _ => (),
        },

        Instruction::LookupSwitch { .. } | Instruction::TableSwitch { .. } => state.pop_slots(1),

        Instruction::MultiANewArray { class, dimensions } => {
            state.pop_slots(*dimensions as usize);
            state.push(Object(class.clone()));
        }

        Instruction::NewArray(element_type) => {
            state.pop();
            state.push(Object(RefType::array(element_type.clone())));
        }

        Instruction::InvokeDynamic { descriptor, .. } => {
            state.pop_slots(descriptor.parameter_length(false));
            push_return_type(state, descriptor);
        }
    }
}

fn push_return_type(state: &mut SlotState, descriptor: &MethodDescriptor<BinaryName>) {
    if let Some(return_type) = &descriptor.return_type {
        state.push_field_type(return_type);
    }
}

/// Complete the initialization of an object after its `<init>` method has been called
///
/// Every copy of the uninitialized value (on the stack or in the locals) becomes initialized.
fn initialize(
    state: &mut SlotState,
    context: MethodContext<'_>,
    receiver: SlotType,
    owner: &BinaryName,
) {
    match receiver {
        Some(VerificationType::Uninitialized(new_index)) => {
            let class = match context.instructions.get(new_index) {
                Some(Instruction::Type {
                    opcode: NEW,
                    class,
                }) => class.clone(),
                _ => RefType::Object(owner.clone()),
            };
            state.replace_all(
                &VerificationType::Uninitialized(new_index),
                VerificationType::Object(class),
            );
        }
        Some(VerificationType::UninitializedThis) => {
            state.replace_all(
                &VerificationType::UninitializedThis,
                VerificationType::Object(RefType::Object(context.this_class.clone())),
            );
        }
        _ => (),
    }
}

/// Loads push the type implied by the opcode (except `aload`, which copies the local) and
/// stores copy the popped value into the local
fn interpret_local_access(state: &mut SlotState, insn: &Instruction) {
    use VerificationType::*;

    let access = match insn.local_access() {
        Some(access) => access,
        None => return,
    };
    let index = access.index as usize;

    if access.is_store {
        if access.kind.width() == 2 {
            state.pop();
        }
        let value = state.pop();
        state.store(index, value);
        return;
    }

    match access.kind {
        LocalKind::Int => state.push(Integer),
        LocalKind::Float => state.push(Float),
        LocalKind::Long => state.push(Long),
        LocalKind::Double => state.push(Double),
        LocalKind::Reference => {
            let value = state.load(index);
            state.push_slot(value);
        }
    }
}

fn interpret_simple(state: &mut SlotState, opcode: u8) {
    use VerificationType::*;

    match opcode {
        NOP => (),
        ACONST_NULL => state.push(Null),
        ICONST_M1..=ICONST_5 => state.push(Integer),
        LCONST_0 | LCONST_1 => state.push(Long),
        FCONST_0..=FCONST_2 => state.push(Float),
        DCONST_0 | DCONST_1 => state.push(Double),

        ILOAD_0..=ALOAD_3 | ISTORE_0..=ASTORE_3 => {
            interpret_local_access(state, &Instruction::Simple(opcode))
        }

        IALOAD | BALOAD | CALOAD | SALOAD => {
            state.pop_slots(2);
            state.push(Integer);
        }
        LALOAD => {
            state.pop_slots(2);
            state.push(Long);
        }
        FALOAD => {
            state.pop_slots(2);
            state.push(Float);
        }
        DALOAD => {
            state.pop_slots(2);
            state.push(Double);
        }
        AALOAD => {
            state.pop();
            let element = match state.pop() {
                Some(Object(array_type)) => match array_type.element_type() {
                    Some(FieldType::Ref(element_type)) => Some(Object(element_type)),
                    _ => None,
                },
                Some(Null) => Some(Null),
                _ => None,
            };
            state.push_slot(element);
        }
        IASTORE | FASTORE | AASTORE | BASTORE | CASTORE | SASTORE => state.pop_slots(3),
        LASTORE | DASTORE => state.pop_slots(4),

        POP => state.pop_slots(1),
        POP2 => state.pop_slots(2),
        DUP => {
            let value1 = state.pop();
            state.push_slot(value1.clone());
            state.push_slot(value1);
        }
        DUP_X1 => {
            let value1 = state.pop();
            let value2 = state.pop();
            state.push_slot(value1.clone());
            state.push_slot(value2);
            state.push_slot(value1);
        }
        DUP_X2 => {
            let value1 = state.pop();
            let value2 = state.pop();
            let value3 = state.pop();
            state.push_slot(value1.clone());
            state.push_slot(value3);
            state.push_slot(value2);
            state.push_slot(value1);
        }
        DUP2 => {
            let value1 = state.pop();
            let value2 = state.pop();
            state.push_slot(value2.clone());
            state.push_slot(value1.clone());
            state.push_slot(value2);
            state.push_slot(value1);
        }
        DUP2_X1 => {
            let value1 = state.pop();
            let value2 = state.pop();
            let value3 = state.pop();
            state.push_slot(value2.clone());
            state.push_slot(value1.clone());
            state.push_slot(value3);
            state.push_slot(value2);
            state.push_slot(value1);
        }
        DUP2_X2 => {
            let value1 = state.pop();
            let value2 = state.pop();
            let value3 = state.pop();
            let value4 = state.pop();
            state.push_slot(value2.clone());
            state.push_slot(value1.clone());
            state.push_slot(value4);
            state.push_slot(value3);
            state.push_slot(value2);
            state.push_slot(value1);
        }
        SWAP => {
            let value1 = state.pop();
            let value2 = state.pop();
            state.push_slot(value1);
            state.push_slot(value2);
        }

        IADD | ISUB | IMUL | IDIV | IREM | ISHL | ISHR | IUSHR | IAND | IOR | IXOR => {
            state.pop_slots(2);
            state.push(Integer);
        }
        LADD | LSUB | LMUL | LDIV | LREM | LAND | LOR | LXOR => {
            state.pop_slots(4);
            state.push(Long);
        }
        LSHL | LSHR | LUSHR => {
            state.pop_slots(3);
            state.push(Long);
        }
        FADD | FSUB | FMUL | FDIV | FREM => {
            state.pop_slots(2);
            state.push(Float);
        }
        DADD | DSUB | DMUL | DDIV | DREM => {
            state.pop_slots(4);
            state.push(Double);
        }
        INEG => {
            state.pop_slots(1);
            state.push(Integer);
        }
        LNEG => {
            state.pop_slots(2);
            state.push(Long);
        }
        FNEG => {
            state.pop_slots(1);
            state.push(Float);
        }
        DNEG => {
            state.pop_slots(2);
            state.push(Double);
        }

        I2B | I2C | I2S | F2I => {
            state.pop_slots(1);
            state.push(Integer);
        }
        L2I | D2I => {
            state.pop_slots(2);
            state.push(Integer);
        }
        I2L | F2L => {
            state.pop_slots(1);
            state.push(Long);
        }
        D2L => {
            state.pop_slots(2);
            state.push(Long);
        }
        I2F => {
            state.pop_slots(1);
            state.push(Float);
        }
        L2F | D2F => {
            state.pop_slots(2);
            state.push(Float);
        }
        I2D | F2D => {
            state.pop_slots(1);
            state.push(Double);
        }
        L2D => {
            state.pop_slots(2);
            state.push(Double);
        }

        LCMP | DCMPL | DCMPG => {
            state.pop_slots(4);
            state.push(Integer);
        }
        FCMPL | FCMPG => {
            state.pop_slots(2);
            state.push(Integer);
        }

        IRETURN | FRETURN | ARETURN | ATHROW | MONITORENTER | MONITOREXIT => state.pop_slots(1),
        LRETURN | DRETURN => state.pop_slots(2),
        RETURN => (),

        ARRAYLENGTH => {
            state.pop();
            state.push(Integer);
        }

        other => log::warn!("Ignoring unexpected opcode {}", mnemonic(other)),
    }
}
