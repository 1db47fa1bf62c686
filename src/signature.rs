//! 2D HMQC peaks ("signatures") that are assigned to methyls (§3).

use crate::methyl::Color;

/// A set of acceptable one-letter amino-acid codes, stored as a 6-bit mask.
///
/// Signature `color` fields are small, fixed-universe sets (at most the six
/// methyl-bearing residue types), so a bitmask is a better fit than a
/// `HashSet` or `Vec`: membership, union and intersection are single
/// instructions and the type is `Copy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ColorSet(u8);

impl ColorSet {
    const fn bit(color: Color) -> u8 {
        match color {
            Color::A => 1 << 0,
            Color::I => 1 << 1,
            Color::L => 1 << 2,
            Color::V => 1 << 3,
            Color::M => 1 << 4,
            Color::T => 1 << 5,
        }
    }

    /// The empty set.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// The set of all six colors.
    #[must_use]
    pub const fn all() -> Self {
        Self(0b0011_1111)
    }

    /// Builds a set from an iterator of colors.
    pub fn from_colors(colors: impl IntoIterator<Item = Color>) -> Self {
        colors.into_iter().fold(Self::empty(), |acc, c| acc.with(c))
    }

    /// Returns a copy of `self` with `color` added.
    #[must_use]
    pub const fn with(self, color: Color) -> Self {
        Self(self.0 | Self::bit(color))
    }

    /// Whether `color` is a member of this set.
    #[must_use]
    pub const fn contains(self, color: Color) -> bool {
        self.0 & Self::bit(color) != 0
    }

    /// Whether this set has no members.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// A 2D HMQC peak identifying a methyl's chemical-shift fingerprint.
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    /// Identity label, unique within a signature set.
    pub label: String,
    /// Carbon-dimension chemical shift (ppm).
    pub carbon: f64,
    /// Hydrogen-dimension chemical shift (ppm).
    pub hydrogen: f64,
    /// Acceptable amino-acid colors for the assigned methyl.
    pub color: ColorSet,
    /// Forced assignment, by methyl label, if any (§4.C.1).
    pub asg: Vec<String>,
    /// Support-set hint, by methyl label, if any (§4.C.1).
    pub options: Vec<String>,
    /// Label of the geminal partner signature, if any.
    pub geminal: Option<String>,
}

impl Signature {
    /// Constructs a signature with no forced assignment, options, or
    /// geminal partner.
    #[must_use]
    pub fn new(label: impl Into<String>, carbon: f64, hydrogen: f64, color: ColorSet) -> Self {
        Self {
            label: label.into(),
            carbon,
            hydrogen,
            color,
            asg: Vec::new(),
            options: Vec::new(),
            geminal: None,
        }
    }

    /// Whether coordinates `(carbon, hydrogen)` fall within clustering
    /// tolerance of this signature (§3, §6).
    #[must_use]
    pub fn clusters_with(&self, carbon: f64, hydrogen: f64, ctol: f64, htol: f64) -> bool {
        (self.carbon - carbon).abs() < ctol && (self.hydrogen - hydrogen).abs() < htol
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_set_round_trips_membership() {
        let set = ColorSet::from_colors([Color::L, Color::V]);
        assert!(set.contains(Color::L));
        assert!(set.contains(Color::V));
        assert!(!set.contains(Color::A));
        assert!(!set.is_empty());
        assert!(ColorSet::empty().is_empty());
    }

    #[test]
    fn clusters_with_respects_both_tolerances() {
        let sig = Signature::new("s1", 21.10, 0.90, ColorSet::all());
        assert!(sig.clusters_with(21.20, 0.91, 0.15, 0.02));
        assert!(!sig.clusters_with(21.30, 0.91, 0.15, 0.02));
        assert!(!sig.clusters_with(21.20, 0.95, 0.15, 0.02));
    }
}
