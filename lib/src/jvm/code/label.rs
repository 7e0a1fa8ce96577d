use std::fmt;

/// Opaque label marking a position in a method body
///
/// Labels have identity, not value: two labels are the same only if they were issued by the same
/// call to [`LabelGenerator::fresh_label`]. The position a label denotes is determined by where
/// its [`super::Instruction::Label`] marker sits in the instruction sequence.
#[derive(Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct Label(usize);

impl Label {
    /// First label handed out by a new generator
    pub const START: Label = Label(0);

    /// Get the next fresh label
    pub fn next(&self) -> Label {
        Label(self.0 + 1)
    }
}

/// Generates new labels
pub trait LabelGenerator<L> {
    /// Generate a fresh label
    fn fresh_label(&mut self) -> L;
}

/// Label generator for [`Label`]
///
/// Cloning does not split the generator source - the cloned generator will produce the same
/// sequence of labels as the original. Analyses that need fresh labels clone the generator of the
/// method body and hand the advanced clone back along with their results.
#[derive(Clone, Debug)]
pub struct CountingLabelGenerator(Label);

impl CountingLabelGenerator {
    pub fn new(start: Label) -> CountingLabelGenerator {
        CountingLabelGenerator(start)
    }
}

impl Default for CountingLabelGenerator {
    fn default() -> Self {
        CountingLabelGenerator::new(Label::START)
    }
}

impl LabelGenerator<Label> for CountingLabelGenerator {
    fn fresh_label(&mut self) -> Label {
        let to_return = self.0;
        self.0 = self.0.next();
        to_return
    }
}

impl fmt::Debug for Label {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_fmt(format_args!("L{}", self.0))
    }
}

impl fmt::Display for Label {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_fmt(format_args!("L{}", self.0))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn fresh_labels_are_distinct() {
        let mut generator = CountingLabelGenerator::default();
        let l0 = generator.fresh_label();
        let l1 = generator.fresh_label();
        assert_ne!(l0, l1);
        assert_eq!(l0, Label::START);
    }

    #[test]
    fn cloned_generator_replays() {
        let mut generator = CountingLabelGenerator::default();
        let _ = generator.fresh_label();
        let mut copy = generator.clone();
        assert_eq!(generator.fresh_label(), copy.fresh_label());
    }
}
