pub use range::SequenceRange;
pub use segment::Segment;

mod range;
mod segment;
