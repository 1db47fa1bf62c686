//! The reference 3D structure: methyls plus pairwise hydrogen-triplet
//! distances (§3).

use crate::graph::Graph;
use crate::methyl::Methyl;

/// Undirected graph over [`Methyl`]s, with an ordered sequence of
/// per-NMR-model averaged hydrogen-triplet distances on each edge.
///
/// Only `distances[0]` is consumed by the CSP builders (§3); the remaining
/// entries are retained because callers outside this crate's scope (model
/// ensembles, refinement diagnostics) may want the full sequence.
#[derive(Debug, Clone)]
pub struct Structure {
    methyls: Vec<Methyl>,
    graph: Graph<Vec<f64>>,
}

impl Structure {
    /// Builds a structure from its methyls and `(label_i, label_j, distances)`
    /// edges, resolving labels to indices.
    ///
    /// # Panics
    ///
    /// Panics if an edge references a label not present in `methyls`. Callers
    /// ingesting untrusted JSON should validate labels themselves and report
    /// malformed edges through an `IngestReport` rather than calling this
    /// constructor directly with unchecked labels.
    #[must_use]
    pub fn new(methyls: Vec<Methyl>, edges: Vec<(String, String, Vec<f64>)>) -> Self {
        let index_of: rustc_hash::FxHashMap<String, usize> = methyls
            .iter()
            .enumerate()
            .map(|(i, m)| (m.label(), i))
            .collect();

        let mut graph = Graph::new(methyls.len());
        for (a, b, distances) in edges {
            let ia = *index_of
                .get(&a)
                .unwrap_or_else(|| panic!("structure edge references unknown methyl {a:?}"));
            let ib = *index_of
                .get(&b)
                .unwrap_or_else(|| panic!("structure edge references unknown methyl {b:?}"));
            graph.add_edge(ia, ib, distances);
        }

        Self { methyls, graph }
    }

    /// All methyls, in structure-file order.
    #[must_use]
    pub fn methyls(&self) -> &[Methyl] {
        &self.methyls
    }

    /// The primary (first-model) distance between methyls `i` and `j`, if an
    /// edge exists between them.
    #[must_use]
    pub fn distance(&self, i: usize, j: usize) -> Option<f64> {
        self.graph.edge(i, j).and_then(|d| d.first().copied())
    }

    /// Whether methyl `i` or `j` (or both) is marked `added`.
    #[must_use]
    pub fn either_added(&self, i: usize, j: usize) -> bool {
        self.methyls[i].added || self.methyls[j].added
    }
}
