//! The post-clustering Signature Graph H consumed by the Isomorphism CSP
//! Builder (§4.D): one vertex per signature, one edge per resolved NOE
//! connection between two distinct signatures.

use itertools::Itertools;

use crate::cnf::Model;
use crate::graph::Graph;
use crate::noe::Noe;
use crate::signature::Signature;
use crate::symmetrization::SymmetrizationGraph;

/// Per-edge attributes of the Signature Graph: whether the two endpoint
/// signatures are a geminal pair, and whether the edge is short-range
/// (either contributing NOE was).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SignatureEdge {
    /// Whether the endpoints are geminal partners.
    pub geminal: bool,
    /// Whether any NOE contributing this edge was short-range.
    pub short: bool,
}

/// An undirected graph over signature indices, derived from a resolved
/// Clustering CSP model.
#[derive(Debug, Clone)]
pub struct SignatureGraph {
    graph: Graph<SignatureEdge>,
}

fn is_geminal_pair(a: &Signature, b: &Signature) -> bool {
    a.geminal.as_deref() == Some(b.label.as_str()) || b.geminal.as_deref() == Some(a.label.as_str())
}

fn resolved_cluster(noe_idx: usize, noe: &Noe, model: &Model) -> Option<usize> {
    match noe.clusters.as_slice() {
        [] => None,
        [only] => Some(*only),
        many => many.iter().find(|&&sig| model.cst(noe_idx, sig)).copied(),
    }
}

impl SignatureGraph {
    /// Builds the signature graph from the living symmetrization graph's
    /// 2-node connected components (each such component is a single edge
    /// between two NOEs, `degree(i) == degree(j) == 1`) whose clustering a
    /// solved Clustering CSP `model` resolves to two distinct signatures,
    /// plus a geminal edge between every geminal signature pair regardless
    /// of NOE connectivity (§3). Multiple NOEs contributing the same
    /// signature pair are collapsed into one edge, with `short` the OR of
    /// all contributors.
    #[must_use]
    pub fn from_resolved_clustering(
        signatures: &[Signature],
        noes: &[Noe],
        graph: &SymmetrizationGraph,
        model: &Model,
    ) -> Self {
        let mut sg = Graph::new(signatures.len());
        for component in graph.living_components() {
            if component.len() != 2 {
                continue;
            }
            let (i, j) = (component[0], component[1]);
            let (Some(si), Some(sj)) = (resolved_cluster(i, &noes[i], model), resolved_cluster(j, &noes[j], model))
            else {
                continue;
            };
            if si == sj {
                continue;
            }
            let short = noes[i].short_range || noes[j].short_range || sg.edge(si, sj).is_some_and(|e| e.short);
            let geminal = is_geminal_pair(&signatures[si], &signatures[sj]);
            sg.add_edge(si, sj, SignatureEdge { geminal, short });
        }

        for (a, b) in (0..signatures.len()).tuple_combinations() {
            if !is_geminal_pair(&signatures[a], &signatures[b]) {
                continue;
            }
            if let Some(edge) = sg.edge_mut(a, b) {
                edge.geminal = true;
            } else {
                sg.add_edge(a, b, SignatureEdge { geminal: true, short: false });
            }
        }

        Self { graph: sg }
    }

    /// Number of signature vertices.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.graph.len()
    }

    /// All edges, as `((i, j), attributes)` with `i < j`.
    pub fn edges(&self) -> impl Iterator<Item = ((usize, usize), SignatureEdge)> + '_ {
        self.graph.edges().map(|(&k, &e)| (k, e))
    }

    /// Attributes of the edge between `i` and `j`, if any.
    #[must_use]
    pub fn edge(&self, i: usize, j: usize) -> Option<SignatureEdge> {
        self.graph.edge(i, j).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::noe::{CchCoords, NoeCoords};
    use crate::signature::ColorSet;
    use crate::var::VarTable;

    #[test]
    fn distinct_clusters_yield_one_edge_with_or_of_short_flags() {
        let cfg = Config::default();
        let n1 = Noe::new("n1", NoeCoords::Cch(CchCoords { c1: 20.0, c2: 22.0, h2: 1.20 }), 0.0, true, &cfg).unwrap();
        let n2 = Noe::new("n2", NoeCoords::Cch(CchCoords { c1: 22.0, c2: 20.0, h2: 1.21 }), 0.0, false, &cfg).unwrap();
        let mut n1 = n1;
        let mut n2 = n2;
        n1.clusters = vec![0];
        n2.clusters = vec![1];
        let noes = vec![n1, n2];

        let signatures = vec![
            Signature::new("s1", 20.0, 1.0, ColorSet::all()),
            Signature::new("s2", 22.0, 1.2, ColorSet::all()),
        ];
        let mut graph = SymmetrizationGraph::from_noes(&noes, &cfg);
        graph.activate(0, 1).unwrap();

        let model = Model::from_true_vars(&VarTable::new(), []);
        let sg = SignatureGraph::from_resolved_clustering(&signatures, &noes, &graph, &model);
        let edge = sg.edge(0, 1).unwrap();
        assert!(edge.short);
        assert!(!edge.geminal);
    }

    #[test]
    fn geminal_pair_gets_an_edge_with_no_noe_connection() {
        let cfg = Config::default();
        let mut s1 = Signature::new("s1", 20.0, 1.0, ColorSet::all());
        s1.geminal = Some("s2".to_owned());
        let mut s2 = Signature::new("s2", 22.0, 1.2, ColorSet::all());
        s2.geminal = Some("s1".to_owned());
        let signatures = vec![s1, s2];

        let graph = SymmetrizationGraph::from_noes(&[], &cfg);
        let model = Model::from_true_vars(&VarTable::new(), []);
        let sg = SignatureGraph::from_resolved_clustering(&signatures, &[], &graph, &model);
        let edge = sg.edge(0, 1).unwrap();
        assert!(edge.geminal);
        assert!(!edge.short);
    }

    #[test]
    fn same_resolved_cluster_yields_no_edge() {
        let cfg = Config::default();
        let mut n1 = Noe::new("n1", NoeCoords::Cch(CchCoords { c1: 20.0, c2: 22.0, h2: 1.20 }), 0.0, false, &cfg).unwrap();
        let mut n2 = Noe::new("n2", NoeCoords::Cch(CchCoords { c1: 22.0, c2: 20.0, h2: 1.21 }), 0.0, false, &cfg).unwrap();
        n1.clusters = vec![0];
        n2.clusters = vec![0];
        let noes = vec![n1, n2];

        let signatures = vec![Signature::new("s1", 20.0, 1.0, ColorSet::all())];
        let mut graph = SymmetrizationGraph::from_noes(&noes, &cfg);
        graph.activate(0, 1).unwrap();
        let model = Model::from_true_vars(&VarTable::new(), []);
        let sg = SignatureGraph::from_resolved_clustering(&signatures, &noes, &graph, &model);
        assert!(sg.edge(0, 0).is_none());
    }
}
