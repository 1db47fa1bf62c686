//! Observed inter-methyl crosspeaks ("NOEs") and their dimensionality (§3, §9).
//!
//! The three dimensionalities share an operation surface (symmetric?,
//! diagonal?, clusterable?) but carry different coordinates, so this is
//! modeled as a tagged sum dispatched through a single trait rather than as
//! one struct with `Option` fields for coordinates that may not exist.

use enum_dispatch::enum_dispatch;

use crate::config::Config;

/// Per-variant coordinate access and diagonal detection.
///
/// `symmetric` is deliberately *not* part of this trait: it compares two
/// NOEs of possibly different variants, and the rule "different types are
/// never symmetric" is easier to enforce once, in [`Noe::symmetric`], than to
/// repeat per impl.
#[enum_dispatch]
pub trait NoeGeometry {
    /// Receiver coordinates `(c2, h2)`, present on every variant and used for
    /// clustering against signatures.
    fn receiver(&self) -> (f64, f64);

    /// Whether this peak lies on the spectral diagonal, within `cfg`'s
    /// diagonal tolerances, and should be discarded on ingest.
    fn is_diagonal(&self, cfg: &Config) -> bool;
}

/// Coordinates of a `"CCH"` NOE: `(c1, c2, h2)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CchCoords {
    /// Sender carbon shift.
    pub c1: f64,
    /// Receiver carbon shift.
    pub c2: f64,
    /// Receiver hydrogen shift.
    pub h2: f64,
}

impl NoeGeometry for CchCoords {
    fn receiver(&self) -> (f64, f64) {
        (self.c2, self.h2)
    }

    fn is_diagonal(&self, _cfg: &Config) -> bool {
        diag_c(self.c1, self.c2)
    }
}

/// Coordinates of a `"HCH"` NOE: `(h1, c2, h2)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HchCoords {
    /// Sender hydrogen shift.
    pub h1: f64,
    /// Receiver carbon shift.
    pub c2: f64,
    /// Receiver hydrogen shift.
    pub h2: f64,
}

impl NoeGeometry for HchCoords {
    fn receiver(&self) -> (f64, f64) {
        (self.c2, self.h2)
    }

    fn is_diagonal(&self, _cfg: &Config) -> bool {
        diag_h(self.h1, self.h2)
    }
}

/// Coordinates of a `"4D"` NOE: `(c1, h1, c2, h2)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FourDCoords {
    /// Sender carbon shift.
    pub c1: f64,
    /// Sender hydrogen shift.
    pub h1: f64,
    /// Receiver carbon shift.
    pub c2: f64,
    /// Receiver hydrogen shift.
    pub h2: f64,
}

impl NoeGeometry for FourDCoords {
    fn receiver(&self) -> (f64, f64) {
        (self.c2, self.h2)
    }

    fn is_diagonal(&self, _cfg: &Config) -> bool {
        diag_c(self.c1, self.c2) && diag_h(self.h1, self.h2)
    }
}

/// Diagonal tolerance on the carbon dimension: `|c1 - c2| < 0.1`, per §8's
/// boundary property. This is intentionally distinct from
/// `Config::sym_ctol`/`cls_ctol`: it is the ingest-time diagonal-rejection
/// tolerance, not a symmetry or clustering tolerance.
const DIAG_CTOL: f64 = 0.1;
/// Diagonal tolerance on the hydrogen dimension: `|h1 - h2| < 0.01`.
const DIAG_HTOL: f64 = 0.01;

fn diag_c(c1: f64, c2: f64) -> bool {
    (c1 - c2).abs() < DIAG_CTOL
}

fn diag_h(h1: f64, h2: f64) -> bool {
    (h1 - h2).abs() < DIAG_HTOL
}

/// The coordinate payload of a NOE, tagged by dimensionality.
#[enum_dispatch(NoeGeometry)]
#[derive(Debug, Clone, PartialEq)]
pub enum NoeCoords {
    /// `"CCH"` variant.
    Cch(CchCoords),
    /// `"HCH"` variant.
    Hch(HchCoords),
    /// `"4D"` variant.
    FourD(FourDCoords),
}

/// An observed inter-methyl crosspeak.
#[derive(Debug, Clone, PartialEq)]
pub struct Noe {
    /// Identity label.
    pub label: String,
    /// Coordinate payload, tagged by dimensionality.
    pub coords: NoeCoords,
    /// Crosspeak intensity (default `0.0`).
    pub intensity: f64,
    /// Whether this NOE came from a short-mixing-time experiment.
    pub short_range: bool,
    /// Signatures within clustering tolerance of the receiver coordinates;
    /// bound once in a post-load pass (§3 Lifecycles).
    pub clusters: Vec<usize>,
    /// Indices of known/forced reciprocal NOEs; bound once in a post-load
    /// pass.
    pub reciprocals: Vec<usize>,
}

impl Noe {
    /// Constructs a NOE from its coordinates, rejecting diagonal peaks.
    ///
    /// Returns `None` for a diagonal peak instead of constructing it — this
    /// is the "sentinel signal" §7 calls out as the one place this crate
    /// uses a non-`Result` control-flow signal, since a diagonal peak is not
    /// an error but simply not a NOE the engine will ever see.
    #[must_use]
    pub fn new(
        label: impl Into<String>,
        coords: NoeCoords,
        intensity: f64,
        short_range: bool,
        cfg: &Config,
    ) -> Option<Self> {
        if coords.is_diagonal(cfg) {
            return None;
        }
        Some(Self {
            label: label.into(),
            coords,
            intensity,
            short_range,
            clusters: Vec::new(),
            reciprocals: Vec::new(),
        })
    }

    /// Receiver coordinates `(c2, h2)`.
    #[must_use]
    pub fn receiver(&self) -> (f64, f64) {
        self.coords.receiver()
    }

    /// Whether `self` and `other` are symmetric: coordinates mirrored across
    /// the diagonal match within `cfg`'s symmetry tolerances. Different
    /// dimensionalities are never symmetric.
    #[must_use]
    pub fn symmetric(&self, other: &Self, cfg: &Config) -> bool {
        let close_c = |a: f64, b: f64| (a - b).abs() < cfg.sym_ctol;
        let close_h = |a: f64, b: f64| (a - b).abs() < cfg.sym_htol;

        match (&self.coords, &other.coords) {
            (NoeCoords::Cch(a), NoeCoords::Cch(b)) => {
                close_c(a.c1, b.c2) && close_c(a.c2, b.c1) && close_h(a.h2, b.h2)
            }
            (NoeCoords::Hch(a), NoeCoords::Hch(b)) => {
                close_h(a.h1, b.h2) && close_h(a.h2, b.h1)
            }
            (NoeCoords::FourD(a), NoeCoords::FourD(b)) => {
                close_c(a.c1, b.c2) && close_c(a.c2, b.c1) && close_h(a.h1, b.h2) && close_h(a.h2, b.h1)
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cch(label: &str, c1: f64, c2: f64, h2: f64, cfg: &Config) -> Noe {
        Noe::new(label, NoeCoords::Cch(CchCoords { c1, c2, h2 }), 0.0, false, cfg).unwrap()
    }

    #[test]
    fn reciprocal_pair_is_symmetric_until_perturbed() {
        let cfg = Config::default();
        let n1 = cch("n1", 21.1, 18.6, 0.1, &cfg);
        let n2 = cch("n2", 18.7, 21.2, 0.1, &cfg);
        assert!(n1.symmetric(&n2, &cfg));

        let NoeCoords::Cch(mut c2) = n2.coords.clone() else {
            unreachable!()
        };
        c2.c2 = 21.4;
        let n2_perturbed = Noe {
            coords: NoeCoords::Cch(c2),
            ..n2
        };
        assert!(!n1.symmetric(&n2_perturbed, &cfg));
    }

    #[test]
    fn diagonal_cch_peak_rejected_on_construction() {
        let cfg = Config::default();
        let diagonal = Noe::new(
            "diag",
            NoeCoords::Cch(CchCoords {
                c1: 21.10,
                c2: 21.14,
                h2: 0.1,
            }),
            0.0,
            false,
            &cfg,
        );
        assert!(diagonal.is_none());
    }

    #[test]
    fn diagonal_4d_requires_both_dimensions_close() {
        let cfg = Config::default();
        // Carbon dims close, hydrogen dims far: not diagonal.
        let not_diagonal = Noe::new(
            "nd",
            NoeCoords::FourD(FourDCoords {
                c1: 21.10,
                h1: 0.10,
                c2: 21.14,
                h2: 0.90,
            }),
            0.0,
            false,
            &cfg,
        );
        assert!(not_diagonal.is_some());

        let diagonal = Noe::new(
            "d",
            NoeCoords::FourD(FourDCoords {
                c1: 21.10,
                h1: 0.100,
                c2: 21.14,
                h2: 0.105,
            }),
            0.0,
            false,
            &cfg,
        );
        assert!(diagonal.is_none());
    }

    #[test]
    fn different_dimensionalities_never_symmetric() {
        let cfg = Config::default();
        let a = cch("a", 21.1, 18.6, 0.1, &cfg);
        let b = Noe::new(
            "b",
            NoeCoords::Hch(HchCoords {
                h1: 0.1,
                c2: 18.6,
                h2: 0.5,
            }),
            0.0,
            false,
            &cfg,
        )
        .unwrap();
        assert!(!a.symmetric(&b, &cfg));
    }
}
