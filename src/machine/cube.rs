//! Ternary cube type used for transition input and output patterns
//!
//! This module provides the [`Cube`] type, a fixed-width vector of ternary
//! values. Each position is `Some(false)` (0), `Some(true)` (1), or `None`
//! (don't-care, written `-` in flow-table text).

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// A ternary cube (product term pattern)
///
/// Cubes appear twice in a flow table row: as the input pattern a transition
/// fires on and as the output pattern it produces. Both sides allow
/// don't-care positions.
///
/// # Examples
///
/// ```
/// use stamina_logic::Cube;
///
/// let a: Cube = "1-0".parse().unwrap();
/// let b: Cube = "110".parse().unwrap();
///
/// assert!(a.intersects(&b));
/// assert_eq!(a.literal_count(), 2);
/// assert_eq!(a.to_string(), "1-0");
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Cube {
    bits: Arc<[Option<bool>]>,
}

impl Cube {
    /// Create a cube from a slice of ternary values
    pub fn from_bits(bits: &[Option<bool>]) -> Self {
        Cube { bits: bits.into() }
    }

    /// Create an all-don't-care cube of the given width
    pub fn universe(width: usize) -> Self {
        Cube {
            bits: vec![None; width].into(),
        }
    }

    /// Number of positions in the cube
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// True if the cube has no positions
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Get the ternary value at a position
    pub fn bit(&self, index: usize) -> Option<bool> {
        self.bits[index]
    }

    /// Get the ternary values as a slice
    pub fn bits(&self) -> &[Option<bool>] {
        &self.bits
    }

    /// Number of specified (non-don't-care) positions
    pub fn literal_count(&self) -> usize {
        self.bits.iter().filter(|b| b.is_some()).count()
    }

    /// Test whether two cubes intersect
    ///
    /// Cubes intersect when no position carries conflicting specified values;
    /// a don't-care on either side never conflicts. Cubes of different widths
    /// never intersect.
    pub fn intersects(&self, other: &Cube) -> bool {
        self.bits.len() == other.bits.len()
            && self
                .bits
                .iter()
                .zip(other.bits.iter())
                .all(|(a, b)| match (a, b) {
                    (Some(x), Some(y)) => x == y,
                    _ => true,
                })
    }

    /// Compute the intersection of two cubes, if non-empty
    ///
    /// The intersection takes the specified value at every position where at
    /// least one cube is specified. Returns `None` when the cubes conflict.
    pub fn intersection(&self, other: &Cube) -> Option<Cube> {
        if self.bits.len() != other.bits.len() {
            return None;
        }
        let mut bits = Vec::with_capacity(self.bits.len());
        for (a, b) in self.bits.iter().zip(other.bits.iter()) {
            match (a, b) {
                (Some(x), Some(y)) if x != y => return None,
                (Some(x), _) => bits.push(Some(*x)),
                (_, Some(y)) => bits.push(Some(*y)),
                (None, None) => bits.push(None),
            }
        }
        Some(Cube { bits: bits.into() })
    }

    /// Count positions where both cubes carry the same specified value
    ///
    /// Used as the literal-overlap measure when scoring output mapping
    /// candidates.
    pub fn overlap(&self, other: &Cube) -> usize {
        self.bits
            .iter()
            .zip(other.bits.iter())
            .filter(|(a, b)| matches!((a, b), (Some(x), Some(y)) if x == y))
            .count()
    }

    /// Find the single position where two cubes differ, if there is exactly one
    ///
    /// Returns `Some(position)` when the cubes are identical everywhere except
    /// one position where both carry opposite specified values. This is the
    /// adjacency condition for merging two product terms into one.
    pub fn single_difference(&self, other: &Cube) -> Option<usize> {
        if self.bits.len() != other.bits.len() {
            return None;
        }
        let mut found = None;
        for (i, (a, b)) in self.bits.iter().zip(other.bits.iter()).enumerate() {
            if a == b {
                continue;
            }
            match (a, b) {
                (Some(_), Some(_)) if found.is_none() => found = Some(i),
                _ => return None,
            }
        }
        found
    }

    /// Return a copy of this cube with the given position made don't-care
    pub fn with_dont_care(&self, index: usize) -> Cube {
        let mut bits = self.bits.to_vec();
        bits[index] = None;
        Cube { bits: bits.into() }
    }
}

/// Error parsing a cube from text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CubeParseError {
    /// The offending character
    pub character: char,
    /// Its position in the string
    pub position: usize,
}

impl fmt::Display for CubeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid cube character '{}' at position {}. Expected '0', '1', or '-'.",
            self.character, self.position
        )
    }
}

impl std::error::Error for CubeParseError {}

impl FromStr for Cube {
    type Err = CubeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bits = Vec::with_capacity(s.len());
        for (position, character) in s.chars().enumerate() {
            bits.push(match character {
                '0' => Some(false),
                '1' => Some(true),
                '-' | '~' | 'x' | 'X' => None,
                _ => {
                    return Err(CubeParseError {
                        character,
                        position,
                    })
                }
            });
        }
        Ok(Cube { bits: bits.into() })
    }
}

impl fmt::Display for Cube {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in self.bits.iter() {
            let c = match bit {
                Some(false) => '0',
                Some(true) => '1',
                None => '-',
            };
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Cube {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display_roundtrip() {
        let cube: Cube = "10-1".parse().unwrap();
        assert_eq!(cube.to_string(), "10-1");
        assert_eq!(cube.len(), 4);
        assert_eq!(cube.literal_count(), 3);
    }

    #[test]
    fn test_parse_rejects_bad_character() {
        let err = "1Z0".parse::<Cube>().unwrap_err();
        assert_eq!(err.character, 'Z');
        assert_eq!(err.position, 1);
    }

    #[test]
    fn test_intersection() {
        let a: Cube = "1-0".parse().unwrap();
        let b: Cube = "-10".parse().unwrap();
        assert!(a.intersects(&b));
        assert_eq!(a.intersection(&b).unwrap().to_string(), "110");

        let c: Cube = "0--".parse().unwrap();
        assert!(!a.intersects(&c));
        assert!(a.intersection(&c).is_none());
    }

    #[test]
    fn test_overlap_counts_agreeing_literals() {
        let a: Cube = "1-01".parse().unwrap();
        let b: Cube = "1101".parse().unwrap();
        assert_eq!(a.overlap(&b), 3);
    }

    #[test]
    fn test_single_difference() {
        let a: Cube = "10-".parse().unwrap();
        let b: Cube = "11-".parse().unwrap();
        assert_eq!(a.single_difference(&b), Some(1));
        assert_eq!(a.with_dont_care(1).to_string(), "1--");

        // Differ in two positions
        let c: Cube = "01-".parse().unwrap();
        assert_eq!(a.single_difference(&c), None);

        // Differ in specification, not value
        let d: Cube = "1--".parse().unwrap();
        assert_eq!(a.single_difference(&d), None);
    }
}
