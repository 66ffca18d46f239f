/// Identifier for a point in a [`crate::growth::Growth`] loop.
///
/// This is an index into `Growth::points`, and is only meaningful until
/// the next structural change (split or insertion) renumbers the loop.
pub type PointId = usize;
