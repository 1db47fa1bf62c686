//! Crate-wide error taxonomy.

use thiserror::Error;

/// Catch-all error for this crate.
///
/// Most variants distinguish *programmer* errors (a component was asked to do
/// something the data model proves impossible, e.g. activate a non-edge) from
/// ordinary propagated failures (an external solver process could not be run
/// at all). Malformed input rows and diagonal NOEs are not represented here;
/// they are accumulated into [`crate::ingest::IngestReport`] instead, since
/// skipping a bad row is not a failure of the call that skipped it.
#[derive(Debug, Error)]
pub enum Error {
    /// `activate`/`deactivate`/`kill` was called on a pair of NOEs with no
    /// symmetrization edge between them.
    #[error("no symmetrization edge between {a:?} and {b:?}")]
    EdgeNotPresent {
        /// Label of the first endpoint.
        a: String,
        /// Label of the second endpoint.
        b: String,
    },
    /// A connected component's maximum matching size did not equal the
    /// smaller side of its bipartition, violating §4.C.3's precondition.
    #[error(
        "matching precondition violated: component of size {component_size} has bipartite \
         minimum side {expected} but max-cardinality matching {found}"
    )]
    MatchingPreconditionViolated {
        /// Number of vertices in the offending component.
        component_size: usize,
        /// Size of the smaller bipartition side.
        expected: usize,
        /// Size of the max-cardinality matching actually found.
        found: usize,
    },
    /// The symmetrization reducer was asked to enumerate matchings of a
    /// component larger than `Config::max_matching_component`.
    #[error("component of size {size} exceeds the matching-enumeration limit of {limit}")]
    ComponentTooLarge {
        /// Size of the offending component.
        size: usize,
        /// The configured limit that was exceeded.
        limit: usize,
    },
    /// The weighted-model sampler failed; fatal to the marginalize/correlate
    /// loop.
    #[error("sampler backend failed: {0}")]
    SamplerFailed(#[source] anyhow::Error),
    /// Error that does not originate from this crate.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
