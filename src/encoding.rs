//! At-most-one and exactly-one clause encodings (§4.C "At-most-one
//! encoding").
//!
//! The commander encoding keeps the clause count linear (rather than
//! quadratic, as a pure pairwise encoding would be) once a literal group
//! grows past three members, at the cost of one auxiliary variable per
//! group of three.

use crate::cnf::Formula;
use crate::var::VarId;

fn pairwise_at_most_one(formula: &mut Formula, lits: &[i64]) {
    for i in 0..lits.len() {
        for j in (i + 1)..lits.len() {
            formula.add_base_clause(vec![-lits[i], -lits[j]]);
        }
    }
}

/// Emits clauses asserting that at most one of `lits` is true.
///
/// Uses the pairwise encoding for three or fewer literals, and the
/// commander encoding (grouping into threes, recursing on the commanders)
/// above that.
pub fn at_most_one(formula: &mut Formula, lits: &[i64]) {
    if lits.len() <= 3 {
        pairwise_at_most_one(formula, lits);
        return;
    }

    let mut commanders = Vec::new();
    for group in lits.chunks(3) {
        if group.len() == 1 {
            commanders.push(group[0]);
            continue;
        }
        let commander: VarId = formula.vars().fresh_cmd();
        let c = commander.lit();

        // c -> (l1 v l2 v l3): clause (-c v l1 v l2 v l3)
        let mut implies_one = vec![-c];
        implies_one.extend_from_slice(group);
        formula.add_base_clause(implies_one);

        // lk -> c: clause (c v -lk) for each k
        for &lit in group {
            formula.add_base_clause(vec![c, -lit]);
        }

        // at most one within the group itself
        pairwise_at_most_one(formula, group);

        commanders.push(c);
    }

    at_most_one(formula, &commanders);
}

/// Emits clauses asserting that exactly one of `lits` is true: an
/// at-least-one clause plus an at-most-one encoding.
pub fn exactly_one(formula: &mut Formula, lits: &[i64]) {
    assert!(!lits.is_empty(), "exactly-one over an empty domain is unsatisfiable");
    formula.add_base_clause(lits.to_vec());
    at_most_one(formula, lits);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cnf::Model;
    use itertools::Itertools;

    fn brute_force_models(formula: &Formula) -> Vec<Vec<bool>> {
        let n = formula.vars_ref().num_vars();
        let clauses: Vec<Vec<i64>> = formula.clauses().cloned().collect();
        (0..n)
            .map(|_| [false, true])
            .multi_cartesian_product()
            .filter(|assignment| {
                clauses.iter().all(|clause| {
                    clause.iter().any(|&lit| {
                        let var = lit.unsigned_abs() as usize - 1;
                        if lit > 0 {
                            assignment[var]
                        } else {
                            !assignment[var]
                        }
                    })
                })
            })
            .collect()
    }

    #[test]
    fn pairwise_at_most_one_allows_zero_or_one() {
        let mut f = Formula::new();
        let a = f.vars().asg(0, 0).lit();
        let b = f.vars().asg(0, 1).lit();
        let c = f.vars().asg(0, 2).lit();
        at_most_one(&mut f, &[a, b, c]);
        let models = brute_force_models(&f);
        for assignment in &models {
            assert!(assignment.iter().filter(|&&v| v).count() <= 1);
        }
        assert_eq!(models.len(), 4); // 000, 100, 010, 001
    }

    #[test]
    fn commander_at_most_one_over_five_literals() {
        let mut f = Formula::new();
        let lits: Vec<i64> = (0..5).map(|m| f.vars().asg(0, m).lit()).collect();
        at_most_one(&mut f, &lits);
        let models = brute_force_models(&f);
        for assignment in &models {
            // only the first 5 vars are domain literals; remaining are commanders
            let true_domain = assignment[..5].iter().filter(|&&v| v).count();
            assert!(true_domain <= 1);
        }
    }

    #[test]
    fn exactly_one_has_exactly_one_true_per_model() {
        let mut f = Formula::new();
        let a = f.vars().asg(0, 0).lit();
        let b = f.vars().asg(0, 1).lit();
        exactly_one(&mut f, &[a, b]);
        let models = brute_force_models(&f);
        assert_eq!(models.len(), 2);
        for assignment in &models {
            assert_eq!(assignment.iter().filter(|&&v| v).count(), 1);
        }
    }
}
