mod ref_id;

pub use ref_id::*;

/// Elements with a logical "width" in JVM slots
///
/// `long` and `double` values occupy two local variable (or operand stack) slots while every other
/// value occupies one.
pub trait Width {
    fn width(&self) -> usize;
}
