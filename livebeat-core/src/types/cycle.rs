//! Cyclic parameter lists.
//!
//! Intervals and arguments handed to periodic method calls may be a single
//! value or a list that is read round-robin, one element per invocation.

use std::fmt;

/// A non-empty list read with a wrapping index: `get(i)` is `items[i % len]`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(transparent))]
pub struct Cycle<T> {
    items: Vec<T>,
}

impl<T> Cycle<T> {
    /// Create a cycle from a list, or `None` if the list is empty
    pub fn new(items: Vec<T>) -> Option<Self> {
        if items.is_empty() {
            None
        } else {
            Some(Self { items })
        }
    }

    /// A cycle holding one value
    pub fn single(value: T) -> Self {
        Self { items: vec![value] }
    }

    /// Element for invocation `index`, wrapping around the list
    pub fn get(&self, index: usize) -> &T {
        &self.items[index % self.items.len()]
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Always false: a cycle holds at least one element
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }
}

impl<T> From<T> for Cycle<T> {
    fn from(value: T) -> Self {
        Cycle::single(value)
    }
}

impl<T: fmt::Display> fmt::Display for Cycle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.items.len() == 1 {
            return write!(f, "{}", self.items[0]);
        }
        write!(f, "[")?;
        for (i, item) in self.items.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", item)?;
        }
        write!(f, "]")
    }
}

/// Reads a plain list; an empty one is rejected like [`Cycle::new`] does.
#[cfg(feature = "serde")]
impl<'de, T: serde::Deserialize<'de>> serde::Deserialize<'de> for Cycle<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let items = Vec::<T>::deserialize(deserializer)?;
        Cycle::new(items)
            .ok_or_else(|| serde::de::Error::invalid_length(0, &"at least one element"))
    }
}
