//! The Clustering CSP Builder (§4.C): the CNF formula whose models assign
//! signatures to methyls consistent with observed NOE clustering,
//! symmetrization-edge matching, observed distances, and geminal pairing.

use rustc_hash::FxHashMap;

use crate::cnf::Formula;
use crate::config::Config;
use crate::domain::{all_domains, emit_vertex_injection, methyl_label_index, signature_label_index};
use crate::encoding::{at_most_one, exactly_one};
use crate::error::{Error, Result};
use crate::matching::{bipartition, max_matching_size};
use crate::noe::Noe;
use crate::signature::Signature;
use crate::structure::Structure;
use crate::symmetrization::SymmetrizationGraph;

/// Builds the Clustering CSP formula (§4.C) over `signatures`, the active
/// subgraph of `graph`, and `structure`.
///
/// # Panics
///
/// Panics if a signature's resolved domain is empty — a signature that can
/// be assigned to no methyl at all is a malformed input, not a satisfiable-
/// or-not question the solver should be asked.
pub fn build(
    signatures: &[Signature],
    noes: &[Noe],
    graph: &SymmetrizationGraph,
    structure: &Structure,
    cfg: &Config,
) -> Result<Formula> {
    let methyls = structure.methyls();
    let label_index = methyl_label_index(methyls);
    let sig_label_index = signature_label_index(signatures);
    let domains = all_domains(signatures, &label_index, methyls, cfg);

    let mut formula = Formula::new();

    // 1. Vertex injection.
    emit_vertex_injection(&mut formula, &domains, methyls.len());

    // 2. Clustering.
    for (n, noe) in noes.iter().enumerate() {
        if noe.clusters.len() > 1 {
            let lits: Vec<i64> = noe.clusters.iter().map(|&sig| formula.vars().cst(n, sig).lit()).collect();
            exactly_one(&mut formula, &lits);
        }
    }

    // 3. Matching of the symmetrization graph.
    for component in graph.active_components() {
        if component.len() < 3 {
            continue;
        }
        let edges = graph.active_edges_within(&component);
        let (left, right) = bipartition(&component, &edges).ok_or(Error::MatchingPreconditionViolated {
            component_size: component.len(),
            expected: component.len() / 2,
            found: 0,
        })?;
        let k = max_matching_size(&component, &edges);
        if k != left.len() {
            return Err(Error::MatchingPreconditionViolated {
                component_size: component.len(),
                expected: left.len(),
                found: k,
            });
        }

        let mut adjacency: FxHashMap<usize, Vec<usize>> = FxHashMap::default();
        for &(a, b) in &edges {
            adjacency.entry(a).or_default().push(b);
            adjacency.entry(b).or_default().push(a);
        }

        for &l in &left {
            let lits: Vec<i64> = adjacency
                .get(&l)
                .into_iter()
                .flatten()
                .map(|&r| formula.vars().act(l, r).lit())
                .collect();
            exactly_one(&mut formula, &lits);
        }
        for &r in &right {
            let lits: Vec<i64> = adjacency
                .get(&r)
                .into_iter()
                .flatten()
                .map(|&l| formula.vars().act(l, r).lit())
                .collect();
            at_most_one(&mut formula, &lits);
        }
    }

    // 4. Distance constraints.
    for &(i, j) in &graph.active_edges() {
        let short_range = noes[i].short_range || noes[j].short_range;
        for &sig_i in &noes[i].clusters {
            for &sig_j in &noes[j].clusters {
                if sig_i == sig_j {
                    continue;
                }
                for &m_i in &domains[sig_i] {
                    let mut clause = Vec::new();
                    if let Some(act) = formula.vars_ref().act_existing(i, j) {
                        clause.push(act.neg_lit());
                    }
                    if let Some(cst_i) = formula.vars_ref().cst_existing(i, sig_i) {
                        clause.push(cst_i.neg_lit());
                    }
                    if let Some(cst_j) = formula.vars_ref().cst_existing(j, sig_j) {
                        clause.push(cst_j.neg_lit());
                    }
                    clause.push(formula.vars().asg(sig_i, m_i).neg_lit());

                    for &m_j in &domains[sig_j] {
                        if m_j == m_i {
                            continue;
                        }
                        let either_added = structure.either_added(m_i, m_j);
                        let radius = cfg.radius_for(short_range, either_added);
                        if structure.distance(m_i, m_j).is_some_and(|d| d < radius) {
                            clause.push(formula.vars().asg(sig_j, m_j).lit());
                        }
                    }
                    formula.add_base_clause(clause);
                }
            }
        }
    }

    // 5. Geminal constraints.
    for (s, sig) in signatures.iter().enumerate() {
        let Some(geminal_label) = &sig.geminal else {
            continue;
        };
        let Some(&gs) = sig_label_index.get(geminal_label.as_str()) else {
            continue;
        };
        for &m_i in &domains[s] {
            let mut clause = vec![formula.vars().asg(s, m_i).neg_lit()];
            for &m_j in &domains[gs] {
                if methyls[m_i].is_geminal_with(&methyls[m_j]) {
                    clause.push(formula.vars().asg(gs, m_j).lit());
                }
            }
            formula.add_base_clause(clause);
        }
    }

    Ok(formula)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BruteForceSatBackend, SatBackend};
    use crate::methyl::{Color, Methyl};
    use crate::noe::{CchCoords, NoeCoords};
    use crate::signature::ColorSet;

    fn two_methyl_structure() -> Structure {
        Structure::new(
            vec![
                Methyl::new(Color::A, 1, None, false),
                Methyl::new(Color::A, 2, None, false),
            ],
            Vec::new(),
        )
    }

    #[test]
    fn injective_csp_over_two_signatures_has_exactly_two_models() {
        let cfg = Config::for_tests();
        let structure = two_methyl_structure();
        let signatures = vec![
            Signature::new("s1", 20.0, 1.0, ColorSet::all()),
            Signature::new("s2", 22.0, 1.2, ColorSet::all()),
        ];
        let graph = SymmetrizationGraph::from_noes(&[], &cfg);
        let formula = build(&signatures, &[], &graph, &structure, &cfg).unwrap();

        let models = BruteForceSatBackend.all_models(&formula);
        assert_eq!(models.len(), 2);
        for model in &models {
            assert!(model.asg(0, 0) != model.asg(0, 1));
            assert!(model.asg(1, 0) != model.asg(1, 1));
            assert!(model.asg(0, 0) != model.asg(1, 0));
        }
    }

    #[test]
    fn geminal_signatures_force_geminal_methyl_pairing() {
        let cfg = Config::for_tests();
        let structure = Structure::new(
            vec![
                Methyl::new(Color::L, 10, Some(1), false),
                Methyl::new(Color::L, 10, Some(2), false),
            ],
            Vec::new(),
        );
        let mut s1 = Signature::new("s1", 20.0, 1.0, ColorSet::all());
        s1.geminal = Some("s2".to_owned());
        let mut s2 = Signature::new("s2", 22.0, 1.2, ColorSet::all());
        s2.geminal = Some("s1".to_owned());

        let graph = SymmetrizationGraph::from_noes(&[], &cfg);
        let formula = build(&[s1, s2], &[], &graph, &structure, &cfg).unwrap();
        let models = BruteForceSatBackend.all_models(&formula);
        assert!(!models.is_empty());
        for model in &models {
            // s1 -> m0 implies s2 -> m1 (the geminal partner), and vice versa.
            assert!(model.asg(0, 0) == model.asg(1, 1));
            assert!(model.asg(0, 1) == model.asg(1, 0));
        }
    }

    #[test]
    fn distance_constraint_forces_unsat_when_only_far_methyls_available() {
        let cfg = Config::for_tests();
        let structure = Structure::new(
            vec![
                Methyl::new(Color::A, 1, None, false),
                Methyl::new(Color::A, 2, None, false),
            ],
            vec![("C1".to_owned(), "C2".to_owned(), vec![20.0])],
        );

        let mut n1 =
            Noe::new("n1", NoeCoords::Cch(CchCoords { c1: 20.0, c2: 22.0, h2: 1.20 }), 0.0, false, &cfg).unwrap();
        let mut n2 =
            Noe::new("n2", NoeCoords::Cch(CchCoords { c1: 22.0, c2: 20.0, h2: 1.21 }), 0.0, false, &cfg).unwrap();
        n1.clusters = vec![0];
        n2.clusters = vec![1];
        let noes = vec![n1, n2];

        let signatures = vec![
            Signature::new("s1", 20.0, 1.0, ColorSet::all()),
            Signature::new("s2", 22.0, 1.2, ColorSet::all()),
        ];
        // n1/n2 are close enough to be symmetric, so `from_noes` wires an edge
        // between them automatically; activate it explicitly.
        let mut graph = SymmetrizationGraph::from_noes(&noes, &cfg);
        graph.activate(0, 1).unwrap();
        let formula = build(&signatures, &noes, &graph, &structure, &cfg).unwrap();
        let models = BruteForceSatBackend.all_models(&formula);
        // The only two methyls are 20 A apart, beyond every configured radius,
        // so no model can simultaneously satisfy each signature's exactly-one
        // assignment and the per-edge distance constraint.
        assert!(models.is_empty());
    }
}
