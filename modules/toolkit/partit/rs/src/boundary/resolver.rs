use std::fmt::Debug;
use std::sync::Arc;

use dyn_clone::DynClone;
use ecodkit_core_rs::loc::Segment;
use impl_tools::autoimpl;

use crate::domain::Domain;

/// Decides how an interstitial gap is shared between its two flanking domains.
#[autoimpl(for <T: trait + ?Sized> &T, Arc<T>)]
pub trait GapResolver: Debug + DynClone + Send + Sync {
    /// Number of leading gap residues assigned to the preceding (N-terminal) domain.
    /// The rest goes to the following one. Values outside [0, gap length] are clamped.
    fn split(&self, gap: &Segment<i64>, preceding: &Domain, following: &Domain) -> i64;
}

dyn_clone::clone_trait_object!(GapResolver);

/// Splits the gap in half; the preceding domain gets the extra residue of an odd gap.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Midpoint;

impl GapResolver for Midpoint {
    fn split(&self, gap: &Segment<i64>, _: &Domain, _: &Domain) -> i64 {
        (gap.len() + 1) / 2
    }
}

/// Gives the whole gap to the flank with the higher confidence (ties go N-terminal).
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct ToConfident;

impl GapResolver for ToConfident {
    fn split(&self, gap: &Segment<i64>, preceding: &Domain, following: &Domain) -> i64 {
        if preceding.confidence() >= following.confidence() {
            gap.len()
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tests::domain;
    use eyre::Result;

    #[test]
    fn test_midpoint() -> Result<()> {
        let (left, right) = (domain("d1", "1-50", 0.9), domain("d2", "60-120", 0.8));
        assert_eq!(Midpoint.split(&Segment::new(51, 59)?, &left, &right), 5);
        assert_eq!(Midpoint.split(&Segment::new(51, 60)?, &left, &right), 5);
        assert_eq!(Midpoint.split(&Segment::new(51, 51)?, &left, &right), 1);
        Ok(())
    }

    #[test]
    fn test_to_confident() -> Result<()> {
        let (left, right) = (domain("d1", "1-50", 0.5), domain("d2", "60-120", 0.8));
        let gap = Segment::new(51, 59)?;
        assert_eq!(ToConfident.split(&gap, &left, &right), 0);
        assert_eq!(ToConfident.split(&gap, &right, &left), 9);

        let boxed: Box<dyn GapResolver> = Box::new(ToConfident);
        assert_eq!(dyn_clone::clone_box(&*boxed).split(&gap, &left, &right), 0);
        let shared: Arc<dyn GapResolver> = Arc::new(Midpoint);
        assert_eq!(shared.split(&gap, &left, &right), 5);
        Ok(())
    }
}
