use super::code::Label;
use std::fmt;

#[derive(Debug)]
pub enum Error {
    IoError(std::io::Error),

    /// Syntax error in a listing
    MalformedListing { line: usize, message: String },

    /// Invalid class, method, or field name
    MalformedName(String),

    /// Invalid field or method descriptor (`offset` is in bytes)
    MalformedDescriptor { offset: usize, message: String },

    /// A label is used, but never placed in the method body
    UnplacedLabel(Label),

    /// Frames are not listed in order of strictly increasing offset
    FramesOutOfOrder { previous: u16, offset: u16 },

    /// Two frames are placed at the same offset
    ConflictingFrames(u16),

    MaxStackOverflow(usize),
    MaxLocalsOverflow(usize),

    /// More frames than fit in a `StackMapTable`
    TooManyFrames(usize),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::IoError(err) => write!(f, "{}", err),
            Error::MalformedListing { line, message } => write!(f, "line {}: {}", line, message),
            Error::MalformedName(name) => write!(f, "malformed name {:?}", name),
            Error::MalformedDescriptor { offset, message } => {
                write!(f, "{} (at offset {})", message, offset)
            }
            Error::UnplacedLabel(label) => write!(f, "label {} is never placed", label),
            Error::FramesOutOfOrder { previous, offset } => write!(
                f,
                "frame at offset {} comes after frame at offset {}",
                offset, previous
            ),
            Error::ConflictingFrames(offset) => write!(f, "multiple frames at offset {}", offset),
            Error::MaxStackOverflow(max_stack) => {
                write!(f, "max stack {} does not fit in 16 bits", max_stack)
            }
            Error::MaxLocalsOverflow(max_locals) => {
                write!(f, "max locals {} does not fit in 16 bits", max_locals)
            }
            Error::TooManyFrames(count) => write!(f, "{} frames do not fit in 16 bits", count),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::IoError(err)
    }
}
