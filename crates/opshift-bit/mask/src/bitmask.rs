use std::fmt;
use std::marker::PhantomData;

use crate::{Bitable, Named};

/// A set of up to 64 `Bitable` values packed into a single word.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bitmask<T: Bitable>(pub u64, PhantomData<T>);

impl<T: Bitable> Bitmask<T> {
    /// Create a new bitmask from a slice of values.
    pub fn new(values: &[T]) -> Self {
        let mut bits = 0;
        for value in values {
            bits |= value.bit();
        }
        Self(bits, PhantomData)
    }

    /// Create an empty bitmask.
    pub const fn empty() -> Self {
        Self(0, PhantomData)
    }

    /// Create a new bitmask from a raw value.
    pub const fn from_value(value: u64) -> Self {
        Self(value, PhantomData)
    }

    /// Check if the bitmask contains a specific value.
    #[inline]
    pub fn contains(&self, bit: T) -> bool {
        (self.0 & bit.bit()) != 0
    }

    /// Insert a value to the bitmask.
    #[inline]
    pub fn insert(&mut self, bit: T) {
        self.0 |= bit.bit();
    }

    /// Remove a value from the bitmask.
    #[inline]
    pub fn remove(&mut self, bit: T) {
        self.0 &= !bit.bit();
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Check if every value of this bitmask is also in `other`.
    #[inline]
    pub fn is_subset(&self, other: &Bitmask<T>) -> bool {
        self.0 & other.0 == self.0
    }

    #[inline]
    pub fn is_superset(&self, other: &Bitmask<T>) -> bool {
        other.is_subset(self)
    }

    /// Check if the two bitmasks share at least one value.
    #[inline]
    pub fn intersects(&self, other: &Bitmask<T>) -> bool {
        self.0 & other.0 != 0
    }

    #[inline]
    #[must_use]
    pub fn union(&self, other: &Bitmask<T>) -> Self {
        Self(self.0 | other.0, PhantomData)
    }

    #[inline]
    #[must_use]
    pub fn intersection(&self, other: &Bitmask<T>) -> Self {
        Self(self.0 & other.0, PhantomData)
    }

    /// Count the number of values in the bitmask.
    #[inline]
    pub fn count(&self) -> u32 {
        self.0.count_ones()
    }
}

impl<T: Bitable + Named + Copy> Bitmask<T> {
    /// Iterate over the contained values in declaration order.
    pub fn iter(&self) -> Iter<T> {
        Iter {
            mask: *self,
            values: T::ALL.iter(),
        }
    }
}

impl<T: Bitable> Default for Bitmask<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: Bitable> FromIterator<T> for Bitmask<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut mask = Self::empty();
        for value in iter {
            mask.insert(value);
        }
        mask
    }
}

impl<T: Bitable> Extend<T> for Bitmask<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.insert(value);
        }
    }
}

impl<T: Bitable + Named + Copy> IntoIterator for Bitmask<T> {
    type Item = T;
    type IntoIter = Iter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: Bitable + Named + Copy> fmt::Debug for Bitmask<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter().map(|v| v.name())).finish()
    }
}

/// Iterator over the values of a [`Bitmask`].
pub struct Iter<T: Bitable + 'static> {
    mask: Bitmask<T>,
    values: std::slice::Iter<'static, T>,
}

impl<T: Bitable + Copy> Iterator for Iter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let mask = self.mask;
        self.values.by_ref().copied().find(|v| mask.contains(*v))
    }
}
