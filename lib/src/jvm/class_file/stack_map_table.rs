use super::Serialize;
use crate::jvm::code::Label;
use crate::jvm::verifier::{StackMapFrame, VerificationType};
use crate::jvm::{BinaryName, Error, RefType};
use byteorder::WriteBytesExt;

/// Body of the `StackMapTable` attribute
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7.4
#[derive(Debug, PartialEq, Eq)]
pub struct StackMapTable(pub Vec<EncodedFrame>);

impl StackMapTable {
    /// Name of the attribute
    pub const NAME: &'static str = "StackMapTable";

    /// Resolve computed frames into their encoded form
    ///
    ///   * `frames` - frames in program order
    ///   * `offset_of` - bytecode offset of a label
    ///   * `class_index` - constant pool index of the `CONSTANT_Class` for a type
    ///
    pub fn from_frames(
        frames: &[(Label, StackMapFrame<RefType<BinaryName>, Label>)],
        offset_of: impl Fn(Label) -> Option<u16>,
        mut class_index: impl FnMut(&RefType<BinaryName>) -> u16,
    ) -> Result<StackMapTable, Error> {
        if u16::try_from(frames.len()).is_err() {
            return Err(Error::TooManyFrames(frames.len()));
        }

        let mut encoded_frames = Vec::with_capacity(frames.len());
        let mut previous_offset: Option<u16> = None;

        for (label, frame) in frames {
            let offset = offset_of(*label).ok_or(Error::UnplacedLabel(*label))?;
            let offset_delta = match previous_offset {
                None => offset,
                Some(previous) if offset == previous => return Err(Error::ConflictingFrames(offset)),
                Some(previous) if offset < previous => {
                    return Err(Error::FramesOutOfOrder { previous, offset })
                }
                Some(previous) => offset - previous - 1,
            };
            previous_offset = Some(offset);

            let mut resolve = |typ: &VerificationType<RefType<BinaryName>, Label>| {
                typ.try_map(
                    |class| Ok(class_index(class)),
                    |label| offset_of(*label).ok_or(Error::UnplacedLabel(*label)),
                )
            };
            let mut resolve_all = |types: &[VerificationType<RefType<BinaryName>, Label>]| {
                types
                    .iter()
                    .map(&mut resolve)
                    .collect::<Result<Vec<_>, Error>>()
            };

            let encoded = match frame {
                StackMapFrame::Same { stack: None } => EncodedFrame::SameLocalsNoStack { offset_delta },
                StackMapFrame::Same { stack: Some(stack) } => EncodedFrame::SameLocalsOneStack {
                    offset_delta,
                    stack: resolve(stack)?,
                },
                StackMapFrame::Chop(chopped_k) => EncodedFrame::ChopLocalsNoStack {
                    offset_delta,
                    chopped_k: *chopped_k,
                },
                StackMapFrame::Append(locals) => EncodedFrame::AppendLocalsNoStack {
                    offset_delta,
                    locals: resolve_all(locals)?,
                },
                StackMapFrame::Full { locals, stack } => EncodedFrame::Full {
                    offset_delta,
                    locals: resolve_all(locals)?,
                    stack: resolve_all(stack)?,
                },
            };
            encoded_frames.push(encoded);
        }

        Ok(StackMapTable(encoded_frames))
    }
}

impl Serialize for StackMapTable {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.0.serialize(writer)
    }
}

/// Frame with its offset resolved and its types pointing into the constant pool
#[derive(Debug, PartialEq, Eq)]
pub enum EncodedFrame {
    /// Frame has the same locals as the previous frame and number of stack items is zero
    /// Tags: 0-63 or 251
    SameLocalsNoStack { offset_delta: u16 },

    /// Frame has the same locals as the previous frame and number of stack items is one
    /// Tags: 64-127 or 247
    SameLocalsOneStack {
        offset_delta: u16,
        stack: VerificationType<u16, u16>,
    },

    /// Frame is like the previous frame, but without the last `chopped_k` locals
    ///
    /// Note: `chopped_k` must be in the range 1 to 3 inclusive
    /// Tags: 248-250
    ChopLocalsNoStack { offset_delta: u16, chopped_k: u8 },

    /// Frame is like the previous frame, but with extra locals
    /// Tags: 252-254
    AppendLocalsNoStack {
        offset_delta: u16,
        locals: Vec<VerificationType<u16, u16>>,
    },

    /// Frame has exactly the locals and stack specified
    /// Tag: 255
    Full {
        offset_delta: u16,
        locals: Vec<VerificationType<u16, u16>>,
        stack: Vec<VerificationType<u16, u16>>,
    },
}

fn invalid_frame(message: String) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::InvalidData, message)
}

impl Serialize for EncodedFrame {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        match self {
            // `same_frame` and `same_frame_extended`
            EncodedFrame::SameLocalsNoStack { offset_delta } => {
                if *offset_delta <= 63 {
                    (*offset_delta as u8).serialize(writer)?;
                } else {
                    251u8.serialize(writer)?;
                    offset_delta.serialize(writer)?;
                }
            }

            // `same_locals_1_stack_item_frame` and `same_locals_1_stack_item_frame_extended`
            EncodedFrame::SameLocalsOneStack {
                offset_delta,
                stack,
            } => {
                if *offset_delta <= 63 {
                    (*offset_delta as u8 + 64).serialize(writer)?;
                } else {
                    247u8.serialize(writer)?;
                    offset_delta.serialize(writer)?;
                }
                stack.serialize(writer)?;
            }

            // `chop_frame`
            EncodedFrame::ChopLocalsNoStack {
                offset_delta,
                chopped_k,
            } => {
                if !(1..=3).contains(chopped_k) {
                    return Err(invalid_frame(format!("cannot chop {} locals", chopped_k)));
                }
                (251 - chopped_k).serialize(writer)?;
                offset_delta.serialize(writer)?;
            }

            // `append_frame`
            EncodedFrame::AppendLocalsNoStack {
                offset_delta,
                locals,
            } => {
                let added_k = locals.len();
                if !(1..=3).contains(&added_k) {
                    return Err(invalid_frame(format!("cannot append {} locals", added_k)));
                }
                (251 + added_k as u8).serialize(writer)?;
                offset_delta.serialize(writer)?;
                for local in locals {
                    local.serialize(writer)?;
                }
            }

            // `full_frame`
            EncodedFrame::Full {
                offset_delta,
                locals,
                stack,
            } => {
                255u8.serialize(writer)?;
                offset_delta.serialize(writer)?;
                locals.serialize(writer)?;
                stack.serialize(writer)?;
            }
        };
        Ok(())
    }
}
