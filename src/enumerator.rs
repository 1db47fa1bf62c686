//! The Support Enumerator (§4.F): for each signature, the full set of
//! methyls it could be assigned to under some satisfying assignment.

use rand::Rng;
use rustc_hash::FxHashSet;

use crate::backend::SatBackend;
use crate::cnf::Formula;
use crate::error::Result;

/// Computes `support[s]` for every signature `0..num_signatures` of
/// `formula`, consuming aux-clause budget as it goes (§4.F).
///
/// `rng` selects which unfinished signature to probe next each iteration;
/// an injected RNG keeps this reproducible under a fixed seed (§5, §9).
pub fn enumerate<B: SatBackend>(
    formula: &mut Formula,
    num_signatures: usize,
    backend: &B,
    rng: &mut impl Rng,
) -> Result<Vec<Vec<usize>>> {
    let mut support: Vec<FxHashSet<usize>> = vec![FxHashSet::default(); num_signatures];
    let mut unfinished: Vec<usize> = (0..num_signatures).collect();

    while !unfinished.is_empty() {
        let pick = rng.gen_range(0..unfinished.len());
        let s = unfinished[pick];

        for &m in &support[s].clone() {
            let lit = formula.vars().asg(s, m).neg_lit();
            formula.add_aux_clause(vec![lit]);
        }

        let model = backend.solve(formula)?;
        formula.flush();

        match model {
            Some(model) => {
                for (sig, methyl) in model.assignments() {
                    support[sig].insert(methyl);
                }
            }
            None => {
                unfinished.remove(pick);
                let lits: Vec<i64> = support[s].iter().map(|&m| formula.vars().asg(s, m).lit()).collect();
                formula.add_base_clause(lits);
            }
        }
    }

    Ok(support
        .into_iter()
        .map(|set| {
            let mut v: Vec<usize> = set.into_iter().collect();
            v.sort_unstable();
            v
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BruteForceSatBackend;
    use rand::SeedableRng;

    #[test]
    fn two_signature_two_methyl_support_closure() {
        // Two signatures, each injective over two methyls, no further
        // constraints: support of each should be {0, 1} (Scenario 6).
        let mut formula = Formula::new();
        let a0 = formula.vars().asg(0, 0).lit();
        let a1 = formula.vars().asg(0, 1).lit();
        let b0 = formula.vars().asg(1, 0).lit();
        let b1 = formula.vars().asg(1, 1).lit();
        formula.add_base_clause(vec![a0, a1]);
        formula.add_base_clause(vec![-a0, -a1]);
        formula.add_base_clause(vec![b0, b1]);
        formula.add_base_clause(vec![-b0, -b1]);
        formula.add_base_clause(vec![-a0, -b0]);
        formula.add_base_clause(vec![-a1, -b1]);

        let backend = BruteForceSatBackend;
        let mut rng = rand_pcg::Pcg64::seed_from_u64(7);
        let support = enumerate(&mut formula, 2, &backend, &mut rng).unwrap();
        assert_eq!(support, vec![vec![0, 1], vec![0, 1]]);
    }

    #[test]
    fn unsatisfiable_signature_has_empty_support() {
        let mut formula = Formula::new();
        let a = formula.vars().asg(0, 0).lit();
        formula.add_base_clause(vec![a]);
        formula.add_base_clause(vec![-a]);

        let backend = BruteForceSatBackend;
        let mut rng = rand_pcg::Pcg64::seed_from_u64(3);
        let support = enumerate(&mut formula, 1, &backend, &mut rng).unwrap();
        assert_eq!(support, vec![Vec::<usize>::new()]);
    }
}
