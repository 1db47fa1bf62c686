//! The tri-state symmetrization graph over NOEs (§3, §4.B).

use crate::config::Config;
use crate::error::{Error, Result};
use crate::graph::Graph;
use crate::noe::Noe;

/// Per-edge tri-state flags. *Living* means `!dead`; *active* means
/// `living && active`; *inactive* means `living && !active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EdgeState {
    dead: bool,
    active: bool,
}

impl EdgeState {
    /// A freshly created, living, inactive edge.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            dead: false,
            active: false,
        }
    }

    /// Whether this edge is living (not dead).
    #[must_use]
    pub const fn is_living(self) -> bool {
        !self.dead
    }

    /// Whether this edge is living and active.
    #[must_use]
    pub const fn is_active(self) -> bool {
        !self.dead && self.active
    }

    /// Whether this edge is living and inactive.
    #[must_use]
    pub const fn is_inactive(self) -> bool {
        !self.dead && !self.active
    }
}

/// Undirected graph over NOE indices, with `activate`/`deactivate`/`kill`
/// mutation and living/active/inactive subgraph queries.
#[derive(Debug, Clone)]
pub struct SymmetrizationGraph {
    graph: Graph<EdgeState>,
}

impl SymmetrizationGraph {
    /// Builds the initial symmetrization graph: an edge connects two NOEs
    /// iff they are symmetric under `cfg`'s tolerances, or one lists the
    /// other among its (already-resolved) reciprocals.
    #[must_use]
    pub fn from_noes(noes: &[Noe], cfg: &Config) -> Self {
        let mut graph = Graph::new(noes.len());
        for i in 0..noes.len() {
            for j in (i + 1)..noes.len() {
                let symmetric = noes[i].symmetric(&noes[j], cfg);
                let reciprocal = noes[i].reciprocals.contains(&j) || noes[j].reciprocals.contains(&i);
                if symmetric || reciprocal {
                    graph.add_edge(i, j, EdgeState::new());
                }
            }
        }
        Self { graph }
    }

    /// Number of NOEs in the universe.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.graph.len()
    }

    fn edge_mut(&mut self, i: usize, j: usize) -> Result<&mut EdgeState> {
        self.graph.edge_mut(i, j).ok_or_else(|| Error::EdgeNotPresent {
            a: i.to_string(),
            b: j.to_string(),
        })
    }

    /// Marks the edge `(i, j)` active. Fails if no edge exists.
    pub fn activate(&mut self, i: usize, j: usize) -> Result<()> {
        self.edge_mut(i, j)?.active = true;
        Ok(())
    }

    /// Marks the edge `(i, j)` inactive. Fails if no edge exists.
    pub fn deactivate(&mut self, i: usize, j: usize) -> Result<()> {
        self.edge_mut(i, j)?.active = false;
        Ok(())
    }

    /// Permanently marks the edge `(i, j)` dead. Fails if no edge exists.
    pub fn kill(&mut self, i: usize, j: usize) -> Result<()> {
        self.edge_mut(i, j)?.dead = true;
        Ok(())
    }

    /// Whether an edge exists between `i` and `j` (regardless of state).
    #[must_use]
    pub fn has_edge(&self, i: usize, j: usize) -> bool {
        self.graph.edge(i, j).is_some()
    }

    /// Living edges: `(i, j)` pairs with `a < b` that are not dead.
    #[must_use]
    pub fn living_edges(&self) -> Vec<(usize, usize)> {
        self.graph
            .edges()
            .filter(|(_, e)| e.is_living())
            .map(|(&k, _)| k)
            .collect()
    }

    /// Living-and-active edges.
    #[must_use]
    pub fn active_edges(&self) -> Vec<(usize, usize)> {
        self.graph
            .edges()
            .filter(|(_, e)| e.is_active())
            .map(|(&k, _)| k)
            .collect()
    }

    /// Living-and-inactive edges.
    #[must_use]
    pub fn inactive_edges(&self) -> Vec<(usize, usize)> {
        self.graph
            .edges()
            .filter(|(_, e)| e.is_inactive())
            .map(|(&k, _)| k)
            .collect()
    }

    /// Connected components of the living subgraph, as sorted vertex lists.
    #[must_use]
    pub fn living_components(&self) -> Vec<Vec<usize>> {
        self.graph.components_where(|e| e.is_living())
    }

    /// Connected components of the active subgraph.
    #[must_use]
    pub fn active_components(&self) -> Vec<Vec<usize>> {
        self.graph.components_where(|e| e.is_active())
    }

    /// Connected components of the inactive subgraph.
    #[must_use]
    pub fn inactive_components(&self) -> Vec<Vec<usize>> {
        self.graph.components_where(|e| e.is_inactive())
    }

    /// Active edges with both endpoints in `component`.
    #[must_use]
    pub fn active_edges_within(&self, component: &[usize]) -> Vec<(usize, usize)> {
        self.graph.edges_within(component, EdgeState::is_active)
    }

    /// Inactive edges with both endpoints in `component`.
    #[must_use]
    pub fn inactive_edges_within(&self, component: &[usize]) -> Vec<(usize, usize)> {
        self.graph.edges_within(component, EdgeState::is_inactive)
    }

    /// For each connected component of the living graph, activates all its
    /// edges iff it has at most `max_comp_size` vertices; otherwise
    /// deactivates all of them.
    pub fn set_activity_level(&mut self, max_comp_size: usize) -> Result<()> {
        for component in self.living_components() {
            let edges = self.graph.edges_within(&component, |e| e.is_living());
            if component.len() <= max_comp_size {
                for (a, b) in edges {
                    self.activate(a, b)?;
                }
            } else {
                for (a, b) in edges {
                    self.deactivate(a, b)?;
                }
            }
        }
        Ok(())
    }
}
