use super::VerificationType;
use std::fmt;

/// Types of the locals and the operand stack at some point in a method body
///
/// Unlike the slot-level states tracked during analysis, wide values appear here only once (the
/// `Top` slot pairing them is implicit) and trailing `Top` locals are dropped. This is exactly
/// the shape a `StackMapTable` frame takes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame<Cls, U> {
    /// Local variables (bottom first)
    pub locals: Vec<VerificationType<Cls, U>>,

    /// Operand stack (bottom first)
    pub stack: Vec<VerificationType<Cls, U>>,
}

/// Frame compacted relative to the frame emitted before it
///
/// See <https://docs.oracle.com/javase/specs/jvms/se17/html/jvms-4.html#jvms-4.7.4>
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackMapFrame<Cls, U> {
    /// Same locals as the previous frame, with an empty stack or a stack of exactly one entry
    Same {
        stack: Option<VerificationType<Cls, U>>,
    },

    /// Previous locals with the last `1..=3` entries removed and an empty stack
    Chop(u8),

    /// Previous locals with `1..=3` entries added and an empty stack
    Append(Vec<VerificationType<Cls, U>>),

    /// Explicit locals and stack
    Full {
        locals: Vec<VerificationType<Cls, U>>,
        stack: Vec<VerificationType<Cls, U>>,
    },
}

/// Collapse slot-level types into a verifier list
///
/// Absent slots become `Top` and the placeholder slot following each wide value is skipped.
fn collapse_slots<Cls: Clone, U: Clone>(
    slots: &[Option<VerificationType<Cls, U>>],
) -> Vec<VerificationType<Cls, U>> {
    let mut collapsed = Vec::with_capacity(slots.len());
    let mut idx = 0;
    while idx < slots.len() {
        let typ = slots[idx].clone().unwrap_or(VerificationType::Top);
        idx += if typ.is_wide() { 2 } else { 1 };
        collapsed.push(typ);
    }
    collapsed
}

impl<Cls: Clone + Eq, U: Clone + Eq> Frame<Cls, U> {
    /// Build a frame from the slot-level locals and stack of an analysis state
    pub fn from_slots(
        locals: &[Option<VerificationType<Cls, U>>],
        stack: &[Option<VerificationType<Cls, U>>],
    ) -> Frame<Cls, U> {
        let mut locals = collapse_slots(locals);
        while let Some(VerificationType::Top) = locals.last() {
            locals.pop();
        }
        Frame {
            locals,
            stack: collapse_slots(stack),
        }
    }

    /// Compute the most compact stack map frame describing `self`, given the frame emitted
    /// immediately before it
    ///
    /// Rules are tried in order: `append`, `chop`, `same` (with an empty stack or exactly one
    /// stack entry), then `full`.
    pub fn stack_map_frame(&self, previous_frame: &Self) -> StackMapFrame<Cls, U> {
        let this_locals_len = self.locals.len();
        let prev_locals_len = previous_frame.locals.len();

        match self.stack.len() {
            0 => {
                if this_locals_len > prev_locals_len {
                    let len_difference = this_locals_len - prev_locals_len;
                    if len_difference < 4
                        && self.locals[..prev_locals_len] == previous_frame.locals[..]
                    {
                        return StackMapFrame::Append(self.locals[prev_locals_len..].to_vec());
                    }
                } else if this_locals_len < prev_locals_len {
                    let len_difference = prev_locals_len - this_locals_len;
                    if len_difference < 4
                        && self.locals[..] == previous_frame.locals[..this_locals_len]
                    {
                        return StackMapFrame::Chop(len_difference as u8);
                    }
                } else if self.locals == previous_frame.locals {
                    return StackMapFrame::Same { stack: None };
                }
            }
            1 if self.locals == previous_frame.locals => {
                return StackMapFrame::Same {
                    stack: self.stack.first().cloned(),
                };
            }
            _ => (),
        }

        self.full_stack_map_frame()
    }

    /// Compute a `Full` stack map frame
    pub fn full_stack_map_frame(&self) -> StackMapFrame<Cls, U> {
        StackMapFrame::Full {
            locals: self.locals.clone(),
            stack: self.stack.clone(),
        }
    }
}

impl<Cls, U> StackMapFrame<Cls, U> {
    /// Kind of frame, as named in the JVM specification
    pub fn kind(&self) -> &'static str {
        match self {
            StackMapFrame::Same { stack: None } => "same",
            StackMapFrame::Same { stack: Some(_) } => "same_locals_1_stack_item",
            StackMapFrame::Chop(_) => "chop",
            StackMapFrame::Append(_) => "append",
            StackMapFrame::Full { .. } => "full",
        }
    }
}

fn write_types<T: fmt::Display>(f: &mut fmt::Formatter<'_>, types: &[T]) -> fmt::Result {
    f.write_str("[")?;
    for (idx, typ) in types.iter().enumerate() {
        if idx > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", typ)?;
    }
    f.write_str("]")
}

impl<Cls, U> fmt::Display for StackMapFrame<Cls, U>
where
    VerificationType<Cls, U>: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind())?;
        match self {
            StackMapFrame::Same { stack: None } => Ok(()),
            StackMapFrame::Same { stack: Some(typ) } => write!(f, " {}", typ),
            StackMapFrame::Chop(k) => write!(f, " {}", k),
            StackMapFrame::Append(locals) => {
                f.write_str(" ")?;
                write_types(f, locals)
            }
            StackMapFrame::Full { locals, stack } => {
                f.write_str(" ")?;
                write_types(f, locals)?;
                f.write_str(" ")?;
                write_types(f, stack)
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::jvm::{BinaryName, Name, RefType};
    use super::VerificationType::*;

    type VType = VerificationType<RefType<BinaryName>, usize>;

    fn frame(locals: Vec<VType>, stack: Vec<VType>) -> Frame<RefType<BinaryName>, usize> {
        Frame { locals, stack }
    }

    fn foo() -> VType {
        Object(RefType::Object(
            BinaryName::from_string("Foo".to_string()).unwrap(),
        ))
    }

    #[test]
    fn append_and_chop() {
        let three_ints = frame(vec![Integer, Integer, Integer], vec![]);
        let five = frame(vec![Integer, Integer, Integer, foo(), Integer], vec![]);

        assert_eq!(
            five.stack_map_frame(&three_ints),
            StackMapFrame::Append(vec![foo(), Integer])
        );
        assert_eq!(three_ints.stack_map_frame(&five), StackMapFrame::Chop(2));
    }

    #[test]
    fn same_frames() {
        let locals = vec![Integer, foo()];
        let empty = frame(locals.clone(), vec![]);
        let one_stack = frame(locals.clone(), vec![Float]);

        assert_eq!(
            empty.stack_map_frame(&empty),
            StackMapFrame::Same { stack: None }
        );
        assert_eq!(
            one_stack.stack_map_frame(&empty),
            StackMapFrame::Same {
                stack: Some(Float)
            }
        );
    }

    #[test]
    fn full_frames() {
        let none = frame(vec![], vec![]);
        let four = frame(vec![Integer, Integer, Integer, Integer], vec![]);
        assert!(matches!(
            four.stack_map_frame(&none),
            StackMapFrame::Full { .. }
        ));
        assert!(matches!(
            none.stack_map_frame(&four),
            StackMapFrame::Full { .. }
        ));

        // Prefix differs
        let ints = frame(vec![Integer, Integer], vec![]);
        let changed = frame(vec![Float, Integer, Integer], vec![]);
        assert!(matches!(
            changed.stack_map_frame(&ints),
            StackMapFrame::Full { .. }
        ));

        // Two stack entries
        let two_stack = frame(vec![Integer, Integer], vec![Integer, Integer]);
        assert!(matches!(
            two_stack.stack_map_frame(&ints),
            StackMapFrame::Full { .. }
        ));
    }

    #[test]
    fn collapse_wide_slots() {
        let locals = vec![Some(Integer), Some(Long), Some(Top), Some(foo()), None, None];
        let stack = vec![Some(Double), Some(Top), Some(Integer)];
        let frame = Frame::from_slots(&locals, &stack);
        assert_eq!(frame.locals, vec![Integer, Long, foo()]);
        assert_eq!(frame.stack, vec![Double, Integer]);
    }
}
