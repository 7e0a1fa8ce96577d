use crate::jvm::code::DEFAULT_WIDENING_THRESHOLD;

/// What should be recomputed for method bodies
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Compute {
    /// Leave `max_stack`, `max_locals`, and frames as they are
    Nothing,

    /// Recompute `max_stack` and `max_locals`
    Maxes,

    /// Recompute `max_stack`, `max_locals`, and the stack map frames
    ///
    /// Frames need a class hierarchy. When none is available, this falls back to [`Self::Maxes`].
    Frames,
}

pub struct Settings {
    /// What to recompute
    pub compute: Compute,

    /// Number of visits to a block after which its changing input types widen to `top`
    ///
    /// Joins over a well-formed class hierarchy always converge well before this. The threshold
    /// only matters for hierarchies with cycles or classes that keep changing shape.
    pub widening_threshold: usize,
}

impl Settings {
    pub fn new(compute: Compute) -> Settings {
        Settings {
            compute,
            widening_threshold: DEFAULT_WIDENING_THRESHOLD,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings::new(Compute::Frames)
    }
}
