use super::{BasicBlockGraph, CountingLabelGenerator, Instruction, Label};
use crate::jvm::class_graph::ClassHierarchy;
use crate::jvm::model::Method;
use crate::jvm::verifier::StackMapFrame;
use crate::jvm::{BinaryName, Compute, Error, Name, RefType, Settings};
use std::collections::HashMap;
use std::fmt;

/// Protected range of instructions (a "try-catch block")
///
/// Exceptions thrown by an instruction between `start` (inclusive) and `end` (exclusive) that are
/// assignable to `catch_type` transfer control to `handler`. A missing catch type catches
/// everything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionRange {
    pub start: Label,
    pub end: Label,
    pub handler: Label,
    pub catch_type: Option<BinaryName>,
}

/// Semantic representation of a method body
#[derive(Debug, Clone)]
pub struct Code {
    /// Instructions, interleaved with the label markers that jumps and ranges refer to
    pub instructions: Vec<Instruction>,

    /// Exception table, in priority order
    pub exception_ranges: Vec<ExceptionRange>,

    /// Maximum size of stack through the method
    pub max_stack: u16,

    /// Maximum size of locals through the method
    pub max_locals: u16,

    /// Stack map frames, in program order
    pub frames: Vec<(Label, StackMapFrame<RefType<BinaryName>, Label>)>,

    /// Generator to produce the next label
    pub label_generator: CountingLabelGenerator,
}

impl Code {
    pub fn new(
        instructions: Vec<Instruction>,
        exception_ranges: Vec<ExceptionRange>,
        label_generator: CountingLabelGenerator,
    ) -> Code {
        Code {
            instructions,
            exception_ranges,
            max_stack: 0,
            max_locals: 0,
            frames: vec![],
            label_generator,
        }
    }

    /// Position of the first label marker for `label`
    pub fn position_of(&self, label: Label) -> Option<usize> {
        self.instructions
            .iter()
            .position(|insn| matches!(insn, Instruction::Label(l) if *l == label))
    }

    /// Splice label markers into the instructions
    ///
    /// Every label is placed in front of the instruction at its position, where positions refer
    /// to the instructions as they were before any insertion. A position equal to the number of
    /// instructions places the label at the very end.
    pub fn inject_labels(&mut self, labels: &[(usize, Label)]) {
        if labels.is_empty() {
            return;
        }

        let mut labels = labels.to_vec();
        labels.sort_by_key(|(position, _)| *position);
        let mut labels = labels.into_iter().peekable();

        let old_instructions = std::mem::take(&mut self.instructions);
        let mut instructions = Vec::with_capacity(old_instructions.len() + labels.len());
        for (position, insn) in old_instructions.into_iter().enumerate() {
            while let Some((_, label)) = labels.next_if(|(at, _)| *at <= position) {
                instructions.push(Instruction::Label(label));
            }
            instructions.push(insn);
        }
        instructions.extend(labels.map(|(_, label)| Instruction::Label(label)));

        self.instructions = instructions;
    }

    /// Recompute the maxima (and possibly the frames) of the method body
    ///
    /// Frames can only be computed with a class hierarchy to join object types. Without one, only
    /// the maxima get recomputed and the existing frames are left alone.
    pub fn recompute(
        &mut self,
        class_name: &BinaryName,
        method: &Method,
        hierarchy: Option<&dyn ClassHierarchy>,
        settings: &Settings,
    ) -> Result<(), Error> {
        match (settings.compute, hierarchy) {
            (Compute::Nothing, _) => Ok(()),
            (Compute::Frames, Some(hierarchy)) => {
                let computation = {
                    let mut graph = BasicBlockGraph::new(self);
                    graph.set_widening_threshold(settings.widening_threshold);
                    let start_locals = BasicBlockGraph::typed_start_locals(class_name, method);
                    graph.compute_frames(hierarchy, class_name, &start_locals)
                };
                self.inject_labels(&computation.labels_to_inject);
                self.label_generator = computation.label_generator;
                self.frames = computation.frames;
                self.set_maxes(computation.max_stack, computation.max_locals)
            }
            (Compute::Maxes | Compute::Frames, _) => {
                if settings.compute == Compute::Frames {
                    log::debug!("No class hierarchy for {}, only computing maxes", method.name);
                }
                let maxes = BasicBlockGraph::new(self)
                    .compute_maxes(BasicBlockGraph::start_locals(method));
                self.set_maxes(maxes.max_stack, maxes.max_locals)
            }
        }
    }

    fn set_maxes(&mut self, max_stack: usize, max_locals: usize) -> Result<(), Error> {
        self.max_stack = u16::try_from(max_stack).map_err(|_| Error::MaxStackOverflow(max_stack))?;
        self.max_locals =
            u16::try_from(max_locals).map_err(|_| Error::MaxLocalsOverflow(max_locals))?;
        Ok(())
    }
}

/// Listing syntax, with frames rendered as comments in front of the labels they belong to
impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let frames: HashMap<Label, &StackMapFrame<RefType<BinaryName>, Label>> = self
            .frames
            .iter()
            .map(|(label, frame)| (*label, frame))
            .collect();

        writeln!(f, "    .limit stack {}", self.max_stack)?;
        writeln!(f, "    .limit locals {}", self.max_locals)?;
        for insn in &self.instructions {
            match insn {
                Instruction::Label(label) => {
                    if let Some(frame) = frames.get(label) {
                        writeln!(f, "    # frame: {}", frame)?;
                    }
                    writeln!(f, "{}", insn)?;
                }
                _ => writeln!(f, "    {}", insn)?,
            }
        }
        for range in &self.exception_ranges {
            let catch_type = range.catch_type.as_ref().map_or("any", |name| name.as_str());
            writeln!(
                f,
                "    .catch {} from {} to {} using {}",
                catch_type, range.start, range.end, range.handler
            )?;
        }
        Ok(())
    }
}
