//! Monotonic SAT variable allocation with a semantic sidecar (§4.C, §9).
//!
//! The DIMACS layer only understands positive integers. Every family of
//! variable this crate needs (`asg`, `cst`, `act`, `cmd`, `edg`) is allocated
//! through one [`VarTable`] that keeps a parallel mapping from each integer
//! back to the tagged [`VarMeaning`] it stands for, so that a solved model
//! can be reported in domain terms rather than raw variable numbers (§4.E).

use rustc_hash::FxHashMap;

/// A 1-based DIMACS variable identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(pub usize);

impl VarId {
    /// The positive literal for this variable.
    #[must_use]
    pub fn lit(self) -> i64 {
        i64::try_from(self.0).expect("variable id fits in i64")
    }

    /// The negated literal for this variable.
    #[must_use]
    pub fn neg_lit(self) -> i64 {
        -self.lit()
    }
}

/// The domain meaning of an allocated variable (§4.C, §4.D, §9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarMeaning {
    /// `asg[sig, methyl]`: signature `sig` assigned to methyl `methyl`.
    Asg { sig: usize, methyl: usize },
    /// `cst[noe, sig]`: NOE `noe` clustered to signature `sig`.
    Cst { noe: usize, sig: usize },
    /// `act[a, b]`: symmetrization edge `(a, b)` is reciprocally active.
    Act { a: usize, b: usize },
    /// `edg[(i, j), (mi, mj)]`: isomorphism CSP edge variable (§4.D).
    Edg {
        edge: (usize, usize),
        methyls: (usize, usize),
    },
    /// An at-most-one commander auxiliary, identified only by allocation
    /// order — it carries no domain meaning of its own.
    Cmd(usize),
}

/// Allocates DIMACS variable ids and keeps the meaning sidecar described in
/// §9.
#[derive(Debug, Clone, Default)]
pub struct VarTable {
    meanings: Vec<VarMeaning>,
    asg_index: FxHashMap<(usize, usize), VarId>,
    cst_index: FxHashMap<(usize, usize), VarId>,
    act_index: FxHashMap<(usize, usize), VarId>,
    edg_index: FxHashMap<((usize, usize), (usize, usize)), VarId>,
    next_cmd: usize,
}

impl VarTable {
    /// An empty variable table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self, meaning: VarMeaning) -> VarId {
        self.meanings.push(meaning);
        VarId(self.meanings.len())
    }

    /// Total number of variables allocated so far.
    #[must_use]
    pub fn num_vars(&self) -> usize {
        self.meanings.len()
    }

    /// The meaning of a previously allocated variable.
    #[must_use]
    pub fn meaning(&self, id: VarId) -> VarMeaning {
        self.meanings[id.0 - 1]
    }

    /// Gets or creates `asg[sig, methyl]`.
    pub fn asg(&mut self, sig: usize, methyl: usize) -> VarId {
        if let Some(&id) = self.asg_index.get(&(sig, methyl)) {
            return id;
        }
        let id = self.allocate(VarMeaning::Asg { sig, methyl });
        self.asg_index.insert((sig, methyl), id);
        id
    }

    /// Existing `asg[sig, methyl]` variable, if already allocated.
    #[must_use]
    pub fn asg_existing(&self, sig: usize, methyl: usize) -> Option<VarId> {
        self.asg_index.get(&(sig, methyl)).copied()
    }

    /// Gets or creates `cst[noe, sig]`.
    pub fn cst(&mut self, noe: usize, sig: usize) -> VarId {
        if let Some(&id) = self.cst_index.get(&(noe, sig)) {
            return id;
        }
        let id = self.allocate(VarMeaning::Cst { noe, sig });
        self.cst_index.insert((noe, sig), id);
        id
    }

    /// Existing `cst[noe, sig]` variable, if already allocated.
    #[must_use]
    pub fn cst_existing(&self, noe: usize, sig: usize) -> Option<VarId> {
        self.cst_index.get(&(noe, sig)).copied()
    }

    /// Gets or creates `act[a, b]`, normalizing endpoint order.
    pub fn act(&mut self, a: usize, b: usize) -> VarId {
        let key = crate::graph::edge_key(a, b);
        if let Some(&id) = self.act_index.get(&key) {
            return id;
        }
        let id = self.allocate(VarMeaning::Act { a: key.0, b: key.1 });
        self.act_index.insert(key, id);
        id
    }

    /// Existing `act[a, b]` variable, if already allocated.
    #[must_use]
    pub fn act_existing(&self, a: usize, b: usize) -> Option<VarId> {
        self.act_index.get(&crate::graph::edge_key(a, b)).copied()
    }

    /// Gets or creates `edg[edge, methyls]`.
    pub fn edg(&mut self, edge: (usize, usize), methyls: (usize, usize)) -> VarId {
        let key = (edge, methyls);
        if let Some(&id) = self.edg_index.get(&key) {
            return id;
        }
        let id = self.allocate(VarMeaning::Edg { edge, methyls });
        self.edg_index.insert(key, id);
        id
    }

    /// Existing `edg[edge, methyls]` variable, if already allocated.
    #[must_use]
    pub fn edg_existing(&self, edge: (usize, usize), methyls: (usize, usize)) -> Option<VarId> {
        self.edg_index.get(&(edge, methyls)).copied()
    }

    /// Allocates a fresh commander auxiliary variable.
    pub fn fresh_cmd(&mut self) -> VarId {
        let n = self.next_cmd;
        self.next_cmd += 1;
        self.allocate(VarMeaning::Cmd(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asg_allocation_is_memoized() {
        let mut table = VarTable::new();
        let a = table.asg(0, 1);
        let b = table.asg(0, 1);
        let c = table.asg(0, 2);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(table.meaning(a), VarMeaning::Asg { sig: 0, methyl: 1 });
    }

    #[test]
    fn act_is_order_independent() {
        let mut table = VarTable::new();
        let a = table.act(2, 5);
        let b = table.act(5, 2);
        assert_eq!(a, b);
    }

    #[test]
    fn commander_variables_never_collide_with_domain_variables() {
        let mut table = VarTable::new();
        let a = table.asg(0, 0);
        let c = table.fresh_cmd();
        assert_ne!(a, c);
        assert!(matches!(table.meaning(c), VarMeaning::Cmd(_)));
    }
}
