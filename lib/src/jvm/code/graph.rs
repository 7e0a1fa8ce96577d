use super::{
    BasicBlock, BlockId, Code, CountingLabelGenerator, Edge, Instruction, Label, LabelGenerator,
};
use crate::jvm::class_graph::ClassHierarchy;
use crate::jvm::model::Method;
use crate::jvm::verifier::{
    join, Frame, MethodContext, SlotState, SlotType, StackMapFrame, VerificationType,
};
use crate::jvm::{BinaryName, RefType, UnqualifiedName};
use std::collections::btree_map::Entry;
use std::collections::{HashMap, VecDeque};

/// Number of times a block may be revisited before its input types start widening to `Top`
pub const DEFAULT_WIDENING_THRESHOLD: usize = 64;

/// Result of the scalar analysis
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Maxes {
    pub max_locals: usize,
    pub max_stack: usize,
}

/// Result of the typed analysis
#[derive(Debug, Clone)]
pub struct FrameComputation {
    /// Labels which frames refer to, but which are not yet in the method body
    ///
    /// Each label should be inserted in front of the instruction at the given position (positions
    /// are in the body before any insertion). See [`Code::inject_labels`].
    pub labels_to_inject: Vec<(usize, Label)>,

    /// Frames for every reachable block that is the target of a jump, in program order
    pub frames: Vec<(Label, StackMapFrame<RefType<BinaryName>, Label>)>,

    pub max_locals: usize,
    pub max_stack: usize,

    /// Label generator of the method body, advanced past `labels_to_inject`
    pub label_generator: CountingLabelGenerator,
}

/// Control flow graph of a method body
///
/// The graph is built once per method body. Both analyses reset the per-block scratch state
/// before they start, so they can be run repeatedly and in any order.
pub struct BasicBlockGraph<'c> {
    code: &'c Code,
    blocks: Vec<BasicBlock>,

    /// Block containing the instruction at each position
    block_of: Vec<BlockId>,

    widening_threshold: usize,
}

impl<'c> BasicBlockGraph<'c> {
    /// Partition the method body into basic blocks and connect them
    ///
    /// A new block starts at:
    ///
    ///   * the first instruction
    ///   * every jump or switch target
    ///   * the instruction after a jump, switch, return, or throw
    ///   * the start, end, and handler of every exception range
    ///   * the instruction right after the start label of every exception range
    ///
    pub fn new(code: &'c Code) -> BasicBlockGraph<'c> {
        let instructions = &code.instructions;
        let insn_count = instructions.len();

        let mut label_positions: HashMap<Label, usize> = HashMap::new();
        for (position, insn) in instructions.iter().enumerate() {
            if let Instruction::Label(label) = insn {
                label_positions.entry(*label).or_insert(position);
            }
        }
        let position_of = |label: &Label| -> Option<usize> {
            let position = label_positions.get(label).copied();
            if position.is_none() {
                log::warn!("Label {} is not placed in the method body", label);
            }
            position
        };

        // Leader detection
        let mut leaders = vec![false; insn_count];
        for (position, insn) in instructions.iter().enumerate() {
            for target in insn.jump_targets() {
                if let Some(target) = position_of(&target) {
                    leaders[target] = true;
                }
            }
            if insn.ends_block() && position + 1 < insn_count {
                leaders[position + 1] = true;
            }
        }
        for range in &code.exception_ranges {
            for label in [&range.start, &range.end, &range.handler] {
                if let Some(position) = position_of(label) {
                    leaders[position] = true;
                }
            }
            if let Some(start) = position_of(&range.start) {
                if start + 1 < insn_count {
                    leaders[start + 1] = true;
                }
            }
        }

        // Partitioning
        let mut blocks: Vec<BasicBlock> = vec![];
        let mut block_of: Vec<BlockId> = Vec::with_capacity(insn_count);
        let mut block_start = 0;
        for position in 1..=insn_count {
            if position == insn_count || leaders[position] {
                let block_id = BlockId(blocks.len());
                block_of.extend(std::iter::repeat(block_id).take(position - block_start));
                blocks.push(BasicBlock::new(block_start..position));
                block_start = position;
            }
        }

        // Normal edges
        for block_idx in 0..blocks.len() {
            let last = blocks[block_idx].instructions.end - 1;
            let insn = &instructions[last];

            for target in insn.jump_targets() {
                if let Some(target) = position_of(&target) {
                    let target_block = block_of[target];
                    blocks[target_block.0].needs_frame = true;
                    blocks[block_idx]
                        .successors
                        .entry(target_block)
                        .or_insert(Edge::Normal);
                }
            }

            if insn.falls_through() && last + 1 < insn_count {
                let next_block = block_of[last + 1];
                blocks[block_idx]
                    .successors
                    .entry(next_block)
                    .or_insert(Edge::Normal);
            }
        }

        // Exception edges
        for range in &code.exception_ranges {
            let (start, end, handler) = match (
                position_of(&range.start),
                position_of(&range.end),
                position_of(&range.handler),
            ) {
                (Some(start), Some(end), Some(handler)) => (start, end, handler),
                _ => continue,
            };
            let catch_type = range
                .catch_type
                .clone()
                .unwrap_or(BinaryName::THROWABLE);

            let handler_block = block_of[handler];
            blocks[handler_block.0].needs_frame = true;
            blocks[handler_block.0].handlers.insert(range.handler);

            let mut covered: Vec<BlockId> = block_of[start..end.max(start)].to_vec();
            covered.dedup();
            for block_id in covered {
                match blocks[block_id.0].successors.entry(handler_block) {
                    Entry::Vacant(vacant) => {
                        vacant.insert(Edge::Exception(vec![catch_type.clone()]));
                    }
                    Entry::Occupied(mut occupied) => match occupied.get_mut() {
                        edge @ Edge::Normal => *edge = Edge::Exception(vec![catch_type.clone()]),
                        Edge::Exception(catch_types) => {
                            if !catch_types.contains(&catch_type) {
                                catch_types.push(catch_type.clone());
                            }
                        }
                    },
                }
            }
        }

        log::debug!(
            "Split {} instructions into {} blocks",
            insn_count,
            blocks.len()
        );

        BasicBlockGraph {
            code,
            blocks,
            block_of,
            widening_threshold: DEFAULT_WIDENING_THRESHOLD,
        }
    }

    /// Blocks, in program order (the first block is the entry)
    pub fn blocks(&self) -> &[BasicBlock] {
        &self.blocks
    }

    /// Block containing the instruction at the given position
    pub fn block_containing(&self, position: usize) -> Option<BlockId> {
        self.block_of.get(position).copied()
    }

    pub fn set_widening_threshold(&mut self, widening_threshold: usize) {
        self.widening_threshold = widening_threshold;
    }

    /// Compute the maximum stack depth and number of locals
    ///
    ///   * `start_locals` - number of local slots occupied by the parameters on entry
    ///
    pub fn compute_maxes(&mut self, start_locals: usize) -> Maxes {
        for block in &mut self.blocks {
            block.reset();
        }
        if self.blocks.is_empty() {
            return Maxes {
                max_locals: start_locals,
                max_stack: 0,
            };
        }

        let instructions = &self.code.instructions;
        let depth_limit = 2 * instructions.len();

        self.blocks[0].input_depth = Some(0);
        self.blocks[0].input_locals = start_locals;
        let mut worklist = Worklist::new(self.blocks.len());
        worklist.push(BlockId(0));

        while let Some(current) = worklist.pop() {
            let block = &mut self.blocks[current.0];
            block.compute_maxes(instructions, depth_limit);
            log::trace!(
                "Block {}: depth {:?} -> {}",
                current,
                block.input_depth,
                block.output_depth
            );

            let output_depth = block.output_depth;
            let output_locals = block.max_locals;
            let successors: Vec<(BlockId, bool)> = block
                .successors
                .iter()
                .map(|(succ, edge)| (*succ, matches!(edge, Edge::Exception(_))))
                .collect();

            for (succ, is_exception) in successors {
                let incoming_depth = if is_exception { 1 } else { output_depth };
                let succ_block = &mut self.blocks[succ.0];

                let deeper = succ_block
                    .input_depth
                    .map_or(true, |depth| depth < incoming_depth);
                let more_locals = succ_block.input_locals < output_locals;
                if deeper || more_locals {
                    succ_block.input_depth = Some(
                        succ_block
                            .input_depth
                            .map_or(incoming_depth, |depth| depth.max(incoming_depth)),
                    );
                    succ_block.input_locals = succ_block.input_locals.max(output_locals);
                    worklist.push(succ);
                }
            }
        }

        let mut maxes = Maxes {
            max_locals: start_locals,
            max_stack: 0,
        };
        for block in self.blocks.iter().filter(|block| block.is_reached()) {
            maxes.max_locals = maxes.max_locals.max(block.max_locals);
            maxes.max_stack = maxes.max_stack.max(block.max_depth);
        }
        log::debug!(
            "Computed max_stack = {}, max_locals = {}",
            maxes.max_stack,
            maxes.max_locals
        );
        maxes
    }

    /// Compute the stack map frames of the method, along with maximum stack depth and locals
    ///
    ///   * `hierarchy` - used to join object types
    ///   * `class_name` - class declaring the method
    ///   * `start_locals` - types of the locals on entry (see [`Self::typed_start_locals`])
    ///
    pub fn compute_frames(
        &mut self,
        hierarchy: &dyn ClassHierarchy,
        class_name: &BinaryName,
        start_locals: &[SlotType],
    ) -> FrameComputation {
        for block in &mut self.blocks {
            block.reset();
        }
        let code: &'c Code = self.code;

        // A slot defined on only some paths must join to `Top`, so every local is present from
        // the very start
        let mut max_locals = start_locals.len();
        for insn in &code.instructions {
            if let Some((index, width)) = insn.local_slots() {
                max_locals = max_locals.max(index as usize + width as usize);
            }
        }

        if self.blocks.is_empty() {
            return FrameComputation {
                labels_to_inject: vec![],
                frames: vec![],
                max_locals,
                max_stack: 0,
                label_generator: code.label_generator.clone(),
            };
        }

        let mut entry_locals: Vec<SlotType> = start_locals.to_vec();
        entry_locals.resize(max_locals, Some(VerificationType::Top));
        let stack_limit = 2 * code.instructions.len();
        let context = MethodContext {
            this_class: class_name,
            instructions: &code.instructions,
        };

        self.blocks[0].input_state = Some(SlotState {
            locals: entry_locals.clone(),
            stack: vec![],
        });
        let mut worklist = Worklist::new(self.blocks.len());
        worklist.push(BlockId(0));

        while let Some(current) = worklist.pop() {
            let block = &mut self.blocks[current.0];
            block.visits += 1;
            let track_exception_locals = block.has_exception_successors();
            block.compute_frames(hierarchy, context, track_exception_locals);
            log::trace!("Interpreted block {} (visit {})", current, block.visits);

            let output = block.output_state.clone();
            let exception_locals = block.exception_locals.clone();
            let successors: Vec<(BlockId, Edge)> = block
                .successors
                .iter()
                .map(|(succ, edge)| (*succ, edge.clone()))
                .collect();

            for (succ, edge) in successors {
                let from_exception = matches!(edge, Edge::Exception(_));
                let incoming = match edge {
                    Edge::Normal => {
                        let mut stack = output.stack.clone();
                        stack.truncate(stack_limit);
                        SlotState {
                            locals: output.locals.clone(),
                            stack,
                        }
                    }
                    Edge::Exception(catch_types) => SlotState {
                        locals: exception_locals.clone(),
                        stack: vec![caught_type(hierarchy, &catch_types)],
                    },
                };

                let succ_block = &mut self.blocks[succ.0];
                let widen = succ_block.visits >= self.widening_threshold;
                if succ_block.merge_input(hierarchy, incoming, from_exception, widen) {
                    if widen {
                        log::warn!(
                            "Block {} still changing after {} visits, widening to top",
                            succ,
                            succ_block.visits
                        );
                    }
                    worklist.push(succ);
                }
            }
        }

        // Frames
        let mut labels = LabelAllocator::new(&code.instructions, code.label_generator.clone());
        let mut previous_frame = Frame::from_slots(&labels.resolve(&entry_locals), &[]);
        let mut frames = vec![];
        let mut carried_frame = false;
        for (block_idx, block) in self.blocks.iter().enumerate() {
            let input = match block.input_state() {
                Some(input) if block.needs_frame || carried_frame => input,
                Some(_) => continue,
                None => {
                    if block.needs_frame {
                        log::debug!("Skipping frame for unreachable block {}", BlockId(block_idx));
                    }
                    carried_frame = false;
                    continue;
                }
            };

            // Labels alone have no width, so the frame belongs to the next real instruction
            let first_real = code.instructions[block.instructions.clone()]
                .iter()
                .position(|insn| !matches!(insn, Instruction::Label(_)));
            let first_real = match first_real {
                Some(offset) => block.instructions.start + offset,
                None => {
                    carried_frame = true;
                    continue;
                }
            };
            carried_frame = false;

            let frame = Frame::from_slots(&labels.resolve(&input.locals), &labels.resolve(&input.stack));
            let label = labels.label_at(first_real);
            frames.push((label, frame.stack_map_frame(&previous_frame)));
            previous_frame = frame;
        }

        let mut max_stack = 0;
        for block in &self.blocks {
            max_stack = max_stack.max(block.max_depth);
            if let Some(input) = block.input_state() {
                max_locals = max_locals.max(input.locals.len());
            }
        }

        let (labels_to_inject, label_generator) = labels.finish();
        log::debug!(
            "Computed {} frames (injecting {} labels), max_stack = {}, max_locals = {}",
            frames.len(),
            labels_to_inject.len(),
            max_stack,
            max_locals
        );

        FrameComputation {
            labels_to_inject,
            frames,
            max_locals,
            max_stack,
            label_generator,
        }
    }

    /// Number of local slots occupied on entry to a method
    pub fn start_locals(method: &Method) -> usize {
        method.descriptor.parameter_length(!method.is_static())
    }

    /// Types of the locals on entry to a method
    ///
    /// The receiver comes first (except for static methods) and is uninitialized in constructors.
    /// Wide parameters are followed by a `Top` slot.
    pub fn typed_start_locals(class_name: &BinaryName, method: &Method) -> Vec<SlotType> {
        let mut locals = vec![];

        if !method.is_static() {
            locals.push(Some(if method.name == UnqualifiedName::INIT {
                VerificationType::UninitializedThis
            } else {
                VerificationType::Object(RefType::Object(class_name.clone()))
            }));
        }

        locals.extend(method.descriptor.parameter_slots().map(|slot| {
            Some(match slot {
                Some(parameter) => VerificationType::from(parameter.clone()),
                None => VerificationType::Top,
            })
        }));

        locals
    }
}

/// Type of the exception slot when entering a handler for the given catch types
fn caught_type(hierarchy: &dyn ClassHierarchy, catch_types: &[BinaryName]) -> SlotType {
    catch_types.iter().fold(None, |caught, catch_type| {
        let catch_type = Some(VerificationType::Object(RefType::Object(catch_type.clone())));
        join(hierarchy, &caught, &catch_type)
    })
}

/// FIFO of blocks, where a block is never in the queue twice
struct Worklist {
    queue: VecDeque<BlockId>,
    queued: Vec<bool>,
}

impl Worklist {
    fn new(block_count: usize) -> Worklist {
        Worklist {
            queue: VecDeque::new(),
            queued: vec![false; block_count],
        }
    }

    fn push(&mut self, block: BlockId) {
        if !self.queued[block.0] {
            self.queued[block.0] = true;
            self.queue.push_back(block);
        }
    }

    fn pop(&mut self) -> Option<BlockId> {
        let block = self.queue.pop_front()?;
        self.queued[block.0] = false;
        Some(block)
    }
}

/// Finds (or makes up) labels for positions in the method body
struct LabelAllocator<'a> {
    instructions: &'a [Instruction],
    label_generator: CountingLabelGenerator,
    allocated: HashMap<usize, Label>,
    injected: Vec<(usize, Label)>,
}

impl<'a> LabelAllocator<'a> {
    fn new(
        instructions: &'a [Instruction],
        label_generator: CountingLabelGenerator,
    ) -> LabelAllocator<'a> {
        LabelAllocator {
            instructions,
            label_generator,
            allocated: HashMap::new(),
            injected: vec![],
        }
    }

    /// Label marking the instruction at `position`
    ///
    /// An existing label marker at (or just before) the position is reused. Otherwise a fresh
    /// label gets queued for injection in front of the instruction.
    fn label_at(&mut self, position: usize) -> Label {
        if let Some(Instruction::Label(label)) = self.instructions.get(position) {
            return *label;
        }
        if let Some(Instruction::Label(label)) = position
            .checked_sub(1)
            .and_then(|before| self.instructions.get(before))
        {
            return *label;
        }
        if let Some(label) = self.allocated.get(&position) {
            return *label;
        }

        let label = self.label_generator.fresh_label();
        self.allocated.insert(position, label);
        self.injected.push((position, label));
        label
    }

    /// Replace the `new` positions inside uninitialized types with labels
    fn resolve(
        &mut self,
        slots: &[SlotType],
    ) -> Vec<Option<VerificationType<RefType<BinaryName>, Label>>> {
        slots
            .iter()
            .map(|slot| {
                slot.as_ref().map(|typ| {
                    typ.map(|class| class.clone(), |position| self.label_at(*position))
                })
            })
            .collect()
    }

    fn finish(mut self) -> (Vec<(usize, Label)>, CountingLabelGenerator) {
        self.injected.sort_by_key(|(position, _)| *position);
        (self.injected, self.label_generator)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::jvm::code::opcodes::*;
    use crate::jvm::code::{Constant, ExceptionRange};
    use crate::jvm::MethodDescriptor;
    use crate::jvm::class_graph::{ClassGraph, ClassGraphArenas, ClassRecord};

    fn code(instructions: Vec<Instruction>, label_generator: CountingLabelGenerator) -> Code {
        Code::new(instructions, vec![], label_generator)
    }

    #[test]
    fn straight_line_is_one_block() {
        let code = code(
            vec![
                Instruction::Simple(ICONST_1),
                Instruction::Simple(ICONST_2),
                Instruction::Simple(IADD),
                Instruction::Simple(IRETURN),
            ],
            CountingLabelGenerator::default(),
        );
        let mut graph = BasicBlockGraph::new(&code);
        assert_eq!(graph.blocks().len(), 1);
        assert!(graph.blocks()[0].successors.is_empty());

        let maxes = graph.compute_maxes(0);
        assert_eq!(
            maxes,
            Maxes {
                max_locals: 0,
                max_stack: 2
            }
        );
    }

    #[test]
    fn if_else_shape() {
        let mut labels = CountingLabelGenerator::default();
        let (else_label, end_label) = (labels.fresh_label(), labels.fresh_label());
        let code = code(
            vec![
                Instruction::Simple(ILOAD_0),
                Instruction::Branch {
                    opcode: IFEQ,
                    target: else_label,
                },
                Instruction::Simple(ICONST_1),
                Instruction::Branch {
                    opcode: GOTO,
                    target: end_label,
                },
                Instruction::Label(else_label),
                Instruction::Simple(ICONST_2),
                Instruction::Label(end_label),
                Instruction::Simple(IRETURN),
            ],
            labels,
        );
        let graph = BasicBlockGraph::new(&code);
        let blocks = graph.blocks();
        assert_eq!(blocks.len(), 4);
        assert_eq!(blocks[0].instructions, 0..2);
        assert_eq!(
            blocks[0].successors.keys().copied().collect::<Vec<_>>(),
            vec![BlockId(1), BlockId(2)]
        );
        assert_eq!(
            blocks[1].successors.keys().copied().collect::<Vec<_>>(),
            vec![BlockId(3)]
        );
        assert!(!blocks[1].needs_frame);
        assert!(blocks[2].needs_frame);
        assert!(blocks[3].needs_frame, "merge block needs a frame");
        assert_eq!(graph.block_containing(7), Some(BlockId(3)));
    }

    #[test]
    fn exception_edges() {
        let mut labels = CountingLabelGenerator::default();
        let (start, end, handler) = (
            labels.fresh_label(),
            labels.fresh_label(),
            labels.fresh_label(),
        );
        let code = Code::new(
            vec![
                Instruction::Label(start),
                Instruction::Simple(ICONST_1),
                Instruction::Simple(ICONST_0),
                Instruction::Simple(IDIV),
                Instruction::Simple(IRETURN),
                Instruction::Label(end),
                Instruction::Label(handler),
                Instruction::Simple(ATHROW),
            ],
            vec![
                ExceptionRange {
                    start,
                    end,
                    handler,
                    catch_type: Some(BinaryName::ARITHMETICEXCEPTION),
                },
                ExceptionRange {
                    start,
                    end,
                    handler,
                    catch_type: None,
                },
            ],
            labels,
        );
        let mut graph = BasicBlockGraph::new(&code);
        let blocks = graph.blocks();

        // `start` alone, the protected instructions, `end`, then the handler
        assert_eq!(blocks.len(), 4);
        assert_eq!(blocks[1].instructions, 1..5);
        let catch_types = vec![BinaryName::ARITHMETICEXCEPTION, BinaryName::THROWABLE];
        assert_eq!(
            blocks[0].successors.get(&BlockId(3)),
            Some(&Edge::Exception(catch_types.clone()))
        );
        assert_eq!(
            blocks[1].successors.get(&BlockId(3)),
            Some(&Edge::Exception(catch_types))
        );
        assert!(blocks[3].handlers.contains(&handler));
        assert!(blocks[3].needs_frame);

        let maxes = graph.compute_maxes(0);
        assert_eq!(maxes.max_stack, 2);

        let arenas = ClassGraphArenas::new();
        let class_graph = ClassGraph::new(&arenas);
        class_graph.insert_java_library_types();
        let frames = graph.compute_frames(&class_graph, &BinaryName::OBJECT, &[]);
        let handler_input = graph.blocks()[3].input_state().unwrap();
        assert_eq!(
            handler_input.stack,
            vec![Some(VerificationType::Object(RefType::Object(
                BinaryName::THROWABLE
            )))]
        );
        assert_eq!(frames.frames.len(), 1);
        assert_eq!(frames.frames[0].0, handler);
    }

    #[test]
    fn loop_header_joins_all_paths() {
        let mut labels = CountingLabelGenerator::default();
        let (head, end) = (labels.fresh_label(), labels.fresh_label());
        let code = code(
            vec![
                Instruction::Simple(ACONST_NULL),
                Instruction::Simple(ASTORE_1),
                Instruction::Label(head),
                Instruction::Simple(ILOAD_0),
                Instruction::Branch {
                    opcode: IFEQ,
                    target: end,
                },
                Instruction::Push(Constant::String(String::from("s"))),
                Instruction::Simple(ASTORE_1),
                Instruction::Branch {
                    opcode: GOTO,
                    target: head,
                },
                Instruction::Label(end),
                Instruction::Simple(RETURN),
            ],
            labels,
        );
        let hierarchy: HashMap<BinaryName, ClassRecord> = HashMap::new();
        let mut graph = BasicBlockGraph::new(&code);
        let computation = graph.compute_frames(
            &hierarchy,
            &BinaryName::OBJECT,
            &[Some(VerificationType::Integer)],
        );

        let string = VerificationType::Object(RefType::Object(BinaryName::STRING));
        assert_eq!(
            graph.blocks()[1].input_state().unwrap().locals,
            vec![Some(VerificationType::Integer), Some(string.clone())]
        );
        assert_eq!(
            computation.frames,
            vec![
                (
                    head,
                    StackMapFrame::Append(vec![VerificationType::Object(RefType::Object(
                        BinaryName::STRING
                    ))])
                ),
                (end, StackMapFrame::Same { stack: None }),
            ]
        );
        assert!(computation.labels_to_inject.is_empty());
        assert_eq!(computation.max_locals, 2);
        assert_eq!(computation.max_stack, 1);
    }

    #[test]
    fn uninitialized_sites_get_labels() {
        let mut labels = CountingLabelGenerator::default();
        let join_point = labels.fresh_label();
        let object = RefType::Object(BinaryName::OBJECT);
        let code = code(
            vec![
                Instruction::Type {
                    opcode: NEW,
                    class: object.clone(),
                },
                Instruction::Simple(DUP),
                Instruction::Simple(ILOAD_0),
                Instruction::Branch {
                    opcode: IFEQ,
                    target: join_point,
                },
                Instruction::Label(join_point),
                Instruction::Method {
                    opcode: INVOKESPECIAL,
                    owner: BinaryName::OBJECT,
                    name: UnqualifiedName::INIT,
                    descriptor: MethodDescriptor {
                        parameters: vec![],
                        return_type: None,
                    },
                    interface: false,
                },
                Instruction::Simple(POP),
                Instruction::Simple(RETURN),
            ],
            labels,
        );
        let hierarchy: HashMap<BinaryName, ClassRecord> = HashMap::new();
        let mut graph = BasicBlockGraph::new(&code);
        let computation = graph.compute_frames(
            &hierarchy,
            &BinaryName::OBJECT,
            &[Some(VerificationType::Integer)],
        );

        assert_eq!(computation.labels_to_inject.len(), 1);
        let (position, new_site) = computation.labels_to_inject[0];
        assert_eq!(position, 0);
        assert_ne!(new_site, join_point);
        assert_eq!(
            computation.frames,
            vec![(
                join_point,
                StackMapFrame::Full {
                    locals: vec![VerificationType::Integer],
                    stack: vec![
                        VerificationType::Uninitialized(new_site),
                        VerificationType::Uninitialized(new_site),
                    ],
                }
            )]
        );

        // Injected labels are fresh for the method body
        let mut label_generator = computation.label_generator;
        assert_ne!(label_generator.fresh_label(), new_site);
    }

    #[test]
    fn analyses_are_rerunnable() {
        let mut labels = CountingLabelGenerator::default();
        let head = labels.fresh_label();
        let code = code(
            vec![
                Instruction::Label(head),
                Instruction::Simple(LCONST_0),
                Instruction::Simple(LSTORE_1),
                Instruction::Simple(ILOAD_0),
                Instruction::Branch {
                    opcode: IFNE,
                    target: head,
                },
                Instruction::Simple(RETURN),
            ],
            labels,
        );
        let hierarchy: HashMap<BinaryName, ClassRecord> = HashMap::new();
        let mut graph = BasicBlockGraph::new(&code);

        let first = graph.compute_maxes(1);
        let frames = graph.compute_frames(
            &hierarchy,
            &BinaryName::OBJECT,
            &[Some(VerificationType::Integer)],
        );
        let second = graph.compute_maxes(1);
        assert_eq!(first, second);
        assert_eq!(first.max_locals, 3);
        assert_eq!(first.max_stack, 2);
        assert_eq!(frames.max_locals, first.max_locals);
        assert_eq!(frames.max_stack, first.max_stack);
    }

    #[test]
    fn typed_start_locals_split_wide_parameters() {
        use crate::jvm::{MethodAccessFlags, Name, ParseDescriptor};

        let descriptor = MethodDescriptor::parse("(JLjava/lang/String;D)V").unwrap();
        let string = Some(VerificationType::Object(RefType::Object(BinaryName::STRING)));
        let top = Some(VerificationType::Top);

        let statik = Method::new(
            UnqualifiedName::from_string("run".to_owned()).unwrap(),
            descriptor.clone(),
            MethodAccessFlags::STATIC,
        );
        assert_eq!(
            BasicBlockGraph::typed_start_locals(&BinaryName::OBJECT, &statik),
            vec![
                Some(VerificationType::Long),
                top.clone(),
                string.clone(),
                Some(VerificationType::Double),
                top.clone(),
            ]
        );

        let constructor = Method::new(UnqualifiedName::INIT, descriptor, MethodAccessFlags::PUBLIC);
        let locals = BasicBlockGraph::typed_start_locals(&BinaryName::OBJECT, &constructor);
        assert_eq!(locals[0], Some(VerificationType::UninitializedThis));
        assert_eq!(locals.len(), BasicBlockGraph::start_locals(&constructor));
    }
}
