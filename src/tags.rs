//! Selecting the records a node cares about.

use crate::envelope::Point;

/// Records whose tag equals `tag`, in their original order. Zero matches is
/// not an error, and duplicates all match; deduplication is the consumer's
/// business if it wants any.
pub fn select<'a>(points: &'a [Point], tag: &'a str) -> impl Iterator<Item = &'a Point> {
    points.iter().filter(move |point| point.tag == tag)
}
