extern crate self as opshift_bit_mask;

mod bitmask;

use std::fmt::Debug;
use std::hash::Hash;

pub use bitmask::{Bitmask, Iter};

/// A value that occupies a single bit of a `u64` mask.
pub trait Bitable {
    fn bit(&self) -> u64;
    fn index(&self) -> u32;
}

/// An enumerable value with a stable, human-readable name.
pub trait Named: Sized + 'static {
    /// Every value in declaration order.
    const ALL: &'static [Self];

    fn name(&self) -> &'static str;

    fn from_name(name: &str) -> Option<Self>;
}

/// A closed set of identities usable as operation or shift keys.
///
/// Implemented automatically for everything that derives `Key`.
pub trait Key: Bitable + Named + Copy + Eq + Hash + Debug {}

impl<T> Key for T where T: Bitable + Named + Copy + Eq + Hash + Debug {}
