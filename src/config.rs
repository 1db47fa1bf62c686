//! Tolerance, radius, and force-flag configuration (§6, §4.K).
//!
//! Every tunable named in the external-interface section is a field of
//! [`Config`] rather than a crate-level constant, so the reducer and both CSP
//! builders can be exercised with different tolerances in the same process
//! (most usefully: the tests, which use a tighter `short_radius` than
//! production per §6's note that "tests use 8").

/// Parameters shared by the symmetrization graph, both CSP builders, and the
/// reducer.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Nominal NOE distance cutoff in Å.
    pub radius: f64,
    /// Short-mixing-time NOE distance cutoff in Å.
    pub short_radius: f64,
    /// Distance cutoff in Å when either methyl of a pair is `added`.
    pub added_radius: f64,
    /// Carbon-dimension tolerance (ppm) for symmetry detection.
    pub sym_ctol: f64,
    /// Hydrogen-dimension tolerance (ppm) for symmetry detection.
    pub sym_htol: f64,
    /// Carbon-dimension tolerance (ppm) for clustering.
    pub cls_ctol: f64,
    /// Hydrogen-dimension tolerance (ppm) for clustering.
    pub cls_htol: f64,
    /// Maximum size of a symmetrization-graph component that `set_activity_level`
    /// will activate outright.
    pub max_comp_size: usize,
    /// Maximum size of a component the reducer (§4.G) will enumerate matchings
    /// for; exceeding it is `Error::ComponentTooLarge` rather than a silent
    /// truncation (§9 Open Question).
    pub max_matching_component: usize,
    /// Prefer a signature's forced `asg` set as its domain when non-empty.
    pub force_asg: bool,
    /// Prefer a signature's `options` support-hint as its domain when
    /// non-empty; takes precedence over `force_asg` (§9 Open Question).
    pub force_sv: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            radius: 10.0,
            short_radius: 10.0,
            added_radius: 10.0,
            sym_ctol: 0.15,
            sym_htol: 0.02,
            cls_ctol: 0.15,
            cls_htol: 0.02,
            max_comp_size: 3,
            max_matching_component: 12,
            force_asg: false,
            force_sv: false,
        }
    }
}

impl Config {
    /// The radius configuration used by the upstream test suite (§6: "tests
    /// use 8" for `short_radius`).
    #[must_use]
    pub fn for_tests() -> Self {
        Self {
            short_radius: 8.0,
            ..Self::default()
        }
    }

    /// Applicable distance radius for an edge between two methyls, given
    /// whether the edge is short-range and whether either methyl was added.
    #[must_use]
    pub fn radius_for(&self, short_range: bool, either_added: bool) -> f64 {
        if short_range {
            self.short_radius
        } else if either_added {
            self.added_radius
        } else {
            self.radius
        }
    }
}
