use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of a [`crate::Path`] within a (possibly nested) container: one
/// integer per nesting level plus a trailing property index.
///
/// Ordering is the derived lexicographic order on the underlying tuple,
/// which is exactly the document reading order: equal-length tuples compare
/// component-wise, and a tuple that is a strict prefix of another sorts
/// before it. Comparisons never consult node ids.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(Vec<u32>);

impl Address {
    pub fn new(parts: Vec<u32>) -> Self {
        Self(parts)
    }

    pub fn parts(&self) -> &[u32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, level: usize) -> Option<u32> {
        self.0.get(level).copied()
    }

    /// `[head, ...self]`, used when stepping out of a nested container.
    pub fn prepended(mut self, head: u32) -> Self {
        self.0.insert(0, head);
        self
    }

    pub fn is_before(&self, other: &Address) -> bool {
        self < other
    }

    pub fn is_after(&self, other: &Address) -> bool {
        self > other
    }
}

impl From<Vec<u32>> for Address {
    fn from(parts: Vec<u32>) -> Self {
        Self(parts)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, p) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{}", p)?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(parts: &[u32]) -> Address {
        Address::new(parts.to_vec())
    }

    #[test]
    fn equal_length_compares_lexicographically() {
        assert!(addr(&[0, 0]).is_before(&addr(&[0, 1])));
        assert!(addr(&[0, 1]).is_before(&addr(&[1, 0])));
        assert!(addr(&[2, 0]).is_after(&addr(&[1, 9])));
    }

    #[test]
    fn prefix_sorts_before_extension() {
        assert!(addr(&[1, 2]).is_before(&addr(&[1, 2, 0])));
        assert!(addr(&[1, 3]).is_after(&addr(&[1, 2, 5])));
    }

    #[test]
    fn exactly_one_relation_holds() {
        let cases = [addr(&[0, 0]), addr(&[0, 0, 1]), addr(&[1, 0]), addr(&[0, 2])];
        for a in &cases {
            for b in &cases {
                let relations =
                    [a.is_before(b), a == b, a.is_after(b)].iter().filter(|r| **r).count();
                assert_eq!(relations, 1, "{} vs {}", a, b);
            }
        }
    }

    #[test]
    fn ordering_is_transitive() {
        let a = addr(&[0, 1]);
        let b = addr(&[0, 1, 4]);
        let c = addr(&[2, 0]);
        assert!(a.is_before(&b));
        assert!(b.is_before(&c));
        assert!(a.is_before(&c));
    }
}
