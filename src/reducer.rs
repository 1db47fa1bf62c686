//! The Symmetrization Reducer (§4.G): iteratively kills symmetrization-graph
//! edges that participate in no satisfying maximum-cardinality matching.

use rustc_hash::FxHashSet;

use crate::backend::SatBackend;
use crate::clustering_csp;
use crate::config::Config;
use crate::error::Result;
use crate::matching::enumerate_max_matchings;
use crate::noe::Noe;
use crate::signature::Signature;
use crate::structure::Structure;
use crate::symmetrization::SymmetrizationGraph;

/// Runs the reducer to a fixed point over `graph`, then `clean_components`.
///
/// Mutates `graph` in place by killing edges that never participate in a
/// satisfying matching, and reactivating newly-small components the kills
/// expose (§4.G).
pub fn reduce<B: SatBackend>(
    graph: &mut SymmetrizationGraph,
    signatures: &[Signature],
    noes: &[Noe],
    structure: &Structure,
    cfg: &Config,
    backend: &B,
) -> Result<()> {
    loop {
        let active_before = graph.active_edges().len();
        let mut restart = false;

        let mut components = graph.inactive_components();
        components.sort_by_key(Vec::len);

        for component in components {
            let edges = graph.inactive_edges_within(&component);
            let mut unseen: FxHashSet<(usize, usize)> = edges.iter().copied().collect();

            for matching in enumerate_max_matchings(&component, &edges, cfg.max_matching_component)? {
                for &(i, j) in &matching {
                    graph.activate(i, j)?;
                }
                let formula = clustering_csp::build(signatures, noes, graph, structure, cfg)?;
                if backend.solve(&formula)?.is_some() {
                    for &(i, j) in &matching {
                        unseen.remove(&(i, j));
                    }
                }
                for &(i, j) in &matching {
                    graph.deactivate(i, j)?;
                }
            }

            for &(i, j) in &unseen {
                graph.kill(i, j)?;
            }
            graph.set_activity_level(cfg.max_comp_size)?;

            if graph.active_edges().len() != active_before {
                restart = true;
                break;
            }
        }

        if !restart {
            break;
        }
    }

    clean_components(graph, signatures, noes, structure, cfg, backend)
}

/// One CSP over the current active graph: for each edge in an active
/// component of size ≥3, assert it and check feasibility; kill it if UNSAT.
fn clean_components<B: SatBackend>(
    graph: &mut SymmetrizationGraph,
    signatures: &[Signature],
    noes: &[Noe],
    structure: &Structure,
    cfg: &Config,
    backend: &B,
) -> Result<()> {
    for component in graph.active_components() {
        if component.len() < 3 {
            continue;
        }
        for (i, j) in graph.active_edges_within(&component) {
            let mut formula = clustering_csp::build(signatures, noes, graph, structure, cfg)?;
            let act = formula.vars().act(i, j);
            formula.add_aux_clause(vec![act.lit()]);
            let sat = backend.solve(&formula)?.is_some();
            formula.flush();
            if !sat {
                graph.kill(i, j)?;
            }
        }
    }
    Ok(())
}
