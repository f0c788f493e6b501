use std::fmt::{Debug, Display};
use std::hash::Hash;

/// T values are primitive integers used as 1-based residue positions
pub trait Position:
    ::num::PrimInt + Debug + Display + Default + Hash + Send + Sync + 'static
{
}

impl<T> Position for T where
    T: ::num::PrimInt + Debug + Display + Default + Hash + Send + Sync + 'static
{
}

/// Fraction `part / total`, zero for an empty (or non-positive) total.
pub fn fraction<Idx: Position>(part: Idx, total: Idx) -> f64 {
    if total <= Idx::zero() {
        return 0.0;
    }
    match (part.to_f64(), total.to_f64()) {
        (Some(part), Some(total)) => part / total,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fraction() {
        assert_eq!(fraction(0, 10), 0.0);
        assert_eq!(fraction(5, 10), 0.5);
        assert_eq!(fraction(5u32, 0u32), 0.0);
        assert_eq!(fraction(3i64, -1i64), 0.0);
    }
}
