//! The Isomorphism CSP Builder (§4.D): reassigns signatures to methyls over
//! the post-clustering Signature Graph, optionally with `edg` variable/cost
//! tracking for the weighted sampler.

use crate::cnf::Formula;
use crate::config::Config;
use crate::domain::{all_domains, emit_vertex_injection, methyl_label_index};
use crate::methyl::Methyl;
use crate::signature::Signature;
use crate::signature_graph::SignatureGraph;
use crate::structure::Structure;

fn admits(mi: usize, mj: usize, methyls: &[Methyl], geminal: bool, short: bool, structure: &Structure, cfg: &Config) -> bool {
    if geminal {
        return methyls[mi].is_geminal_with(&methyls[mj]);
    }
    let either_added = structure.either_added(mi, mj);
    let radius = cfg.radius_for(short, either_added);
    structure.distance(mi, mj).is_some_and(|d| d < radius)
}

/// Builds the Isomorphism CSP formula (§4.D) over `signatures`, the
/// post-clustering signature graph `h`, and `structure`. When `edge_vars` is
/// set, also allocates `edg[(i,j),(mi,mj)]` variables with their iff
/// definition and records each one's distance cost.
#[must_use]
pub fn build(signatures: &[Signature], h: &SignatureGraph, structure: &Structure, edge_vars: bool, cfg: &Config) -> Formula {
    let methyls = structure.methyls();
    let label_index = methyl_label_index(methyls);
    let domains = all_domains(signatures, &label_index, methyls, cfg);

    let mut formula = Formula::new();
    emit_vertex_injection(&mut formula, &domains, methyls.len());

    for ((i, j), edge) in h.edges() {
        for &m_i in &domains[i] {
            let mut clause = vec![formula.vars().asg(i, m_i).neg_lit()];
            for &m_j in &domains[j] {
                if m_j == m_i || !admits(m_i, m_j, methyls, edge.geminal, edge.short, structure, cfg) {
                    continue;
                }
                clause.push(formula.vars().asg(j, m_j).lit());

                if edge_vars {
                    let edg = formula.vars().edg((i, j), (m_i, m_j));
                    let asg_i = formula.vars().asg(i, m_i);
                    let asg_j = formula.vars().asg(j, m_j);
                    formula.add_base_clause(vec![edg.neg_lit(), asg_i.lit()]);
                    formula.add_base_clause(vec![edg.neg_lit(), asg_j.lit()]);
                    formula.add_base_clause(vec![edg.lit(), asg_i.neg_lit(), asg_j.neg_lit()]);
                    if let Some(distance) = structure.distance(m_i, m_j) {
                        formula.set_cost(edg, distance);
                    }
                }
            }
            formula.add_base_clause(clause);
        }
    }

    formula
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BruteForceSatBackend, SatBackend};
    use crate::methyl::Color;
    use crate::signature::ColorSet;

    #[test]
    fn distance_edge_admits_only_nearby_methyls() {
        let cfg = Config::for_tests();
        let structure = Structure::new(
            vec![
                Methyl::new(Color::A, 1, None, false),
                Methyl::new(Color::A, 2, None, false),
                Methyl::new(Color::A, 3, None, false),
            ],
            vec![
                ("C1".to_owned(), "C2".to_owned(), vec![5.0]),
                ("C1".to_owned(), "C3".to_owned(), vec![20.0]),
            ],
        );
        let signatures = vec![
            Signature::new("s0", 20.0, 1.0, ColorSet::all()),
            Signature::new("s1", 22.0, 1.2, ColorSet::all()),
        ];

        // Build a 2-vertex signature graph directly via a trivial resolved
        // clustering: one NOE connecting the two signatures.
        let n1 = crate::noe::Noe::new(
            "n1",
            crate::noe::NoeCoords::Cch(crate::noe::CchCoords { c1: 20.0, c2: 22.0, h2: 1.20 }),
            0.0,
            false,
            &cfg,
        )
        .unwrap();
        let n2 = crate::noe::Noe::new(
            "n2",
            crate::noe::NoeCoords::Cch(crate::noe::CchCoords { c1: 22.0, c2: 20.0, h2: 1.21 }),
            0.0,
            false,
            &cfg,
        )
        .unwrap();
        let mut n1 = n1;
        let mut n2 = n2;
        n1.clusters = vec![0];
        n2.clusters = vec![1];
        let noes = vec![n1, n2];
        let mut graph = crate::symmetrization::SymmetrizationGraph::from_noes(&noes, &cfg);
        graph.activate(0, 1).unwrap();
        let model = crate::cnf::Model::from_true_vars(&crate::var::VarTable::new(), []);
        let h = SignatureGraph::from_resolved_clustering(&signatures, &noes, &graph, &model);

        let formula = build(&signatures, &h, &structure, false, &cfg);
        let models = BruteForceSatBackend.all_models(&formula);
        assert!(!models.is_empty());
        for model in &models {
            // Methyl 2 is 20A from methyl 0 (beyond radius) so it can never
            // co-occur with s0 assigned to methyl 0.
            assert!(!(model.asg(0, 0) && model.asg(1, 2)));
        }
    }

    #[test]
    fn edge_vars_records_cost_equal_to_distance() {
        let cfg = Config::for_tests();
        let structure = Structure::new(
            vec![
                Methyl::new(Color::A, 1, None, false),
                Methyl::new(Color::A, 2, None, false),
            ],
            vec![("C1".to_owned(), "C2".to_owned(), vec![6.0])],
        );
        let signatures = vec![
            Signature::new("s0", 20.0, 1.0, ColorSet::all()),
            Signature::new("s1", 22.0, 1.2, ColorSet::all()),
        ];
        let cfg_noe = Config::for_tests();
        let n1 = crate::noe::Noe::new(
            "n1",
            crate::noe::NoeCoords::Cch(crate::noe::CchCoords { c1: 20.0, c2: 22.0, h2: 1.20 }),
            0.0,
            false,
            &cfg_noe,
        )
        .unwrap();
        let n2 = crate::noe::Noe::new(
            "n2",
            crate::noe::NoeCoords::Cch(crate::noe::CchCoords { c1: 22.0, c2: 20.0, h2: 1.21 }),
            0.0,
            false,
            &cfg_noe,
        )
        .unwrap();
        let mut n1 = n1;
        let mut n2 = n2;
        n1.clusters = vec![0];
        n2.clusters = vec![1];
        let noes = vec![n1, n2];
        let mut graph = crate::symmetrization::SymmetrizationGraph::from_noes(&noes, &cfg);
        graph.activate(0, 1).unwrap();
        let model = crate::cnf::Model::from_true_vars(&crate::var::VarTable::new(), []);
        let h = SignatureGraph::from_resolved_clustering(&signatures, &noes, &graph, &model);

        let formula = build(&signatures, &h, &structure, true, &cfg);
        let edg = formula.vars_ref().edg_existing((0, 1), (0, 1)).unwrap();
        assert_eq!(formula.cost(edg), Some(6.0));
    }

    #[test]
    fn empty_graph_yields_empty_formula() {
        let cfg = Config::for_tests();
        let structure = Structure::new(Vec::new(), Vec::new());
        let signatures: Vec<Signature> = Vec::new();
        let noes: Vec<crate::noe::Noe> = Vec::new();
        let graph = crate::symmetrization::SymmetrizationGraph::from_noes(&noes, &cfg);
        let model = crate::cnf::Model::from_true_vars(&crate::var::VarTable::new(), []);
        let h = SignatureGraph::from_resolved_clustering(&signatures, &noes, &graph, &model);

        let formula = build(&signatures, &h, &structure, false, &cfg);
        assert_eq!(formula.vars_ref().num_vars(), 0);
        assert_eq!(formula.base_len(), 0);
    }
}
