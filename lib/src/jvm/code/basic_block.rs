use crate::jvm::class_graph::ClassHierarchy;
use crate::jvm::code::{Instruction, Label};
use crate::jvm::verifier::{interpret_instruction, join, MethodContext, SlotState, SlotType};
use crate::jvm::verifier::VerificationType;
use crate::jvm::BinaryName;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops::Range;

/// Index of a block inside its [`super::BasicBlockGraph`]
#[derive(Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct BlockId(pub usize);

impl fmt::Debug for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "B{}", self.0)
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "B{}", self.0)
    }
}

/// Control flow edge between blocks
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Edge {
    /// Jump, switch, or fall through
    Normal,

    /// Exception thrown inside a protected range, caught by a handler for the given types
    Exception(Vec<BinaryName>),
}

/// A straight-line run of instructions with a single entry
///
/// The block itself only refers to positions in the method body. Along with the shape of the
/// control flow graph, it carries scratch state used by the analyses. That scratch state is reset
/// at the start of every analysis, so the same graph can be analyzed repeatedly.
#[derive(Debug)]
pub struct BasicBlock {
    /// Positions of the instructions of the block, in the method body
    pub instructions: Range<usize>,

    /// Blocks to which control may flow after (or during) this block
    pub successors: BTreeMap<BlockId, Edge>,

    /// Exception handler labels for which this block is the entry
    pub handlers: BTreeSet<Label>,

    /// Does this block need an explicit stack map frame? (is it ever jumped to?)
    pub needs_frame: bool,

    /// Stack depth on entry (`None` until the block is reached)
    pub(super) input_depth: Option<usize>,
    pub(super) output_depth: usize,
    pub(super) max_depth: usize,
    pub(super) input_locals: usize,
    pub(super) max_locals: usize,

    /// Types on entry (`None` until the block is reached)
    pub(super) input_state: Option<SlotState>,
    pub(super) output_state: SlotState,

    /// Join of the locals at every point inside the block
    pub(super) exception_locals: Vec<SlotType>,

    /// Join of the exception types caught on entry (only for handlers)
    pub(super) caught_type: SlotType,
    pub(super) visits: usize,
}

impl BasicBlock {
    pub fn new(instructions: Range<usize>) -> BasicBlock {
        BasicBlock {
            instructions,
            successors: BTreeMap::new(),
            handlers: BTreeSet::new(),
            needs_frame: false,
            input_depth: None,
            output_depth: 0,
            max_depth: 0,
            input_locals: 0,
            max_locals: 0,
            input_state: None,
            output_state: SlotState::default(),
            exception_locals: vec![],
            caught_type: None,
            visits: 0,
        }
    }

    /// Clear all of the analysis scratch state
    pub fn reset(&mut self) {
        self.input_depth = None;
        self.output_depth = 0;
        self.max_depth = 0;
        self.input_locals = 0;
        self.max_locals = 0;
        self.input_state = None;
        self.output_state = SlotState::default();
        self.exception_locals.clear();
        self.caught_type = None;
        self.visits = 0;
    }

    /// Has any analysis reached this block?
    pub fn is_reached(&self) -> bool {
        self.input_depth.is_some() || self.input_state.is_some()
    }

    /// Does control flow out of this block into a handler?
    pub fn has_exception_successors(&self) -> bool {
        self.successors
            .values()
            .any(|edge| matches!(edge, Edge::Exception(_)))
    }

    /// Entry types computed by the last typed analysis
    pub fn input_state(&self) -> Option<&SlotState> {
        self.input_state.as_ref()
    }

    fn enters_handler(&self, insn: &Instruction) -> bool {
        matches!(insn, Instruction::Label(label) if self.handlers.contains(label))
    }

    /// Replay the stack depth effects of the instructions in the block
    ///
    /// Depths stay inside `0..=depth_limit`, even for inconsistent code.
    pub(super) fn compute_maxes(&mut self, instructions: &[Instruction], depth_limit: usize) {
        let mut depth = self.input_depth.unwrap_or(0);
        let mut max_depth = self.max_depth.max(depth);
        let mut max_locals = self.max_locals.max(self.input_locals);

        for insn in &instructions[self.instructions.clone()] {
            if self.enters_handler(insn) {
                depth = 1;
            } else {
                let effect = insn.stack_effect();
                if effect.pops > depth {
                    log::warn!("Stack underflow on {} (depth {})", insn, depth);
                }
                depth = depth.saturating_sub(effect.pops) + effect.pushes;
                depth = depth.min(depth_limit);
            }
            max_depth = max_depth.max(depth);

            if let Some((index, width)) = insn.local_slots() {
                max_locals = max_locals.max(index as usize + width as usize);
            }
        }

        self.output_depth = depth;
        self.max_depth = max_depth;
        self.max_locals = max_locals;
    }

    /// Interpret the instructions in the block, starting from its input state
    ///
    /// When `track_exception_locals` is set, the locals at every point in the block are also
    /// joined into `exception_locals`, since an exception may be thrown from any instruction.
    pub(super) fn compute_frames(
        &mut self,
        hierarchy: &dyn ClassHierarchy,
        context: MethodContext<'_>,
        track_exception_locals: bool,
    ) {
        let mut state = self.input_state.clone().unwrap_or_default();
        let mut max_depth = self.max_depth.max(state.stack.len());
        self.exception_locals.clear();
        if track_exception_locals {
            self.exception_locals = state.locals.clone();
        }

        for insn_index in self.instructions.clone() {
            let insn = &context.instructions[insn_index];
            if self.enters_handler(insn) {
                state.reset_to_handler();
            }
            interpret_instruction(&mut state, context, insn, insn_index);
            max_depth = max_depth.max(state.stack.len());

            if track_exception_locals {
                join_into(hierarchy, &mut self.exception_locals, &state.locals, false);
            }
        }

        self.max_depth = max_depth;
        self.output_state = state;
    }

    /// Join an incoming state into the input state of the block
    ///
    /// Returns whether the input state changed. When `widen` is set, slots that change jump
    /// straight to `Top` instead of to the join.
    ///
    /// The stack of a handler is always exactly the caught exception: incoming exception edges
    /// (`from_exception`) carry their caught type as the only stack slot, and the stacks of normal
    /// edges falling into the handler are dropped.
    pub(super) fn merge_input(
        &mut self,
        hierarchy: &dyn ClassHierarchy,
        mut incoming: SlotState,
        from_exception: bool,
        widen: bool,
    ) -> bool {
        let is_handler = !self.handlers.is_empty();
        if is_handler {
            if from_exception {
                let caught = incoming.stack.pop().flatten();
                let joined = join(hierarchy, &self.caught_type, &caught);
                if joined != self.caught_type {
                    self.caught_type = if widen && self.caught_type.is_some() {
                        Some(VerificationType::Top)
                    } else {
                        joined
                    };
                }
            } else if !incoming.stack.is_empty() {
                log::warn!(
                    "Dropping {} stack slots flowing into an exception handler",
                    incoming.stack.len()
                );
            }
            incoming.stack = vec![self.caught_type.clone()];
        }

        let input = match &mut self.input_state {
            Some(input) => input,
            input @ None => {
                *input = Some(incoming);
                return true;
            }
        };

        if is_handler {
            let stack_changed = input.stack != incoming.stack;
            input.stack = incoming.stack;
            let locals_changed = join_into(hierarchy, &mut input.locals, &incoming.locals, widen);
            return stack_changed || locals_changed;
        }

        if input.stack.len() != incoming.stack.len() {
            log::warn!(
                "Inconsistent stack heights {} and {} at block entry",
                input.stack.len(),
                incoming.stack.len()
            );
        }
        let stack_changed = join_into(hierarchy, &mut input.stack, &incoming.stack, widen);
        let locals_changed = join_into(hierarchy, &mut input.locals, &incoming.locals, widen);
        stack_changed || locals_changed
    }
}

/// Join `incoming` slots into `existing` slots, extending `existing` if it is shorter
fn join_into(
    hierarchy: &dyn ClassHierarchy,
    existing: &mut Vec<SlotType>,
    incoming: &[SlotType],
    widen: bool,
) -> bool {
    let mut changed = false;
    if existing.len() < incoming.len() {
        existing.resize(incoming.len(), None);
        changed = true;
    }
    for (slot, incoming_slot) in existing.iter_mut().zip(incoming) {
        let joined = join(hierarchy, slot, incoming_slot);
        if &joined != slot {
            *slot = if widen {
                Some(VerificationType::Top)
            } else {
                joined
            };
            changed = true;
        }
    }
    changed
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::jvm::class_graph::ClassRecord;
    use crate::jvm::code::opcodes::*;
    use crate::jvm::code::{CountingLabelGenerator, LabelGenerator};
    use std::collections::HashMap;

    #[test]
    fn scalar_replay() {
        let instructions = vec![
            Instruction::Simple(ICONST_1),
            Instruction::Simple(LCONST_1),
            Instruction::Simple(LSTORE_2),
            Instruction::Simple(POP),
            Instruction::Simple(POP),
        ];
        let mut block = BasicBlock::new(0..instructions.len());
        block.input_depth = Some(0);
        block.compute_maxes(&instructions, 10);

        assert_eq!(block.max_depth, 3);
        assert_eq!(block.output_depth, 0, "underflow is clamped");
        assert_eq!(block.max_locals, 4);
    }

    #[test]
    fn depth_is_clamped() {
        let instructions = vec![Instruction::Simple(DCONST_0), Instruction::Simple(DCONST_1)];
        let mut block = BasicBlock::new(0..2);
        block.input_depth = Some(1);
        block.compute_maxes(&instructions, 4);
        assert_eq!(block.max_depth, 4);
        assert_eq!(block.output_depth, 4);
    }

    #[test]
    fn merging_inputs() {
        let hierarchy: HashMap<BinaryName, ClassRecord> = HashMap::new();
        let mut block = BasicBlock::new(0..0);

        let first = SlotState {
            locals: vec![Some(VerificationType::Integer), Some(VerificationType::Float)],
            stack: vec![],
        };
        assert!(block.merge_input(&hierarchy, first.clone(), false, false));
        assert!(!block.merge_input(&hierarchy, first, false, false));

        let second = SlotState {
            locals: vec![Some(VerificationType::Integer), Some(VerificationType::Integer)],
            stack: vec![],
        };
        assert!(block.merge_input(&hierarchy, second.clone(), false, false));
        assert_eq!(
            block.input_state().unwrap().locals,
            vec![Some(VerificationType::Integer), Some(VerificationType::Top)]
        );
        assert!(!block.merge_input(&hierarchy, second, false, false));

        block.reset();
        assert!(!block.is_reached());
    }

    #[test]
    fn handler_stack_is_only_the_caught_type() {
        let hierarchy: HashMap<BinaryName, ClassRecord> = HashMap::new();
        let mut labels = CountingLabelGenerator::default();
        let mut block = BasicBlock::new(0..0);
        block.handlers.insert(labels.fresh_label());

        let throwable = Some(VerificationType::Object(crate::jvm::RefType::Object(
            BinaryName::THROWABLE,
        )));
        let fallthrough = SlotState {
            locals: vec![Some(VerificationType::Integer)],
            stack: vec![Some(VerificationType::Integer), Some(VerificationType::Float)],
        };
        let thrown = SlotState {
            locals: vec![Some(VerificationType::Integer)],
            stack: vec![throwable.clone()],
        };

        assert!(block.merge_input(&hierarchy, fallthrough.clone(), false, false));
        assert_eq!(block.input_state().unwrap().stack, vec![None]);

        assert!(block.merge_input(&hierarchy, thrown.clone(), true, false));
        assert_eq!(block.input_state().unwrap().stack, vec![throwable.clone()]);

        assert!(!block.merge_input(&hierarchy, fallthrough, false, false));
        assert!(!block.merge_input(&hierarchy, thrown, true, false));
        assert_eq!(block.input_state().unwrap().stack, vec![throwable]);
    }

    #[test]
    fn widening() {
        let hierarchy: HashMap<BinaryName, ClassRecord> = HashMap::new();
        let mut block = BasicBlock::new(0..0);
        let null = SlotState {
            locals: vec![Some(VerificationType::Null)],
            stack: vec![],
        };
        let string = SlotState {
            locals: vec![Some(VerificationType::Object(crate::jvm::RefType::Object(
                BinaryName::STRING,
            )))],
            stack: vec![],
        };
        block.merge_input(&hierarchy, null, false, false);
        assert!(block.merge_input(&hierarchy, string, false, true));
        assert_eq!(
            block.input_state().unwrap().locals,
            vec![Some(VerificationType::Top)]
        );
    }
}
