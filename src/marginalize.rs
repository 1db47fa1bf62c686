//! Marginalize + Correlate + Gibbs Reduce (§4.H): the weighted-sampling
//! refinement loop that tightens the Isomorphism CSP until every signature
//! is nailed to a single `seqid`, then hands off to the Support Enumerator.

use rand::Rng;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::backend::{SamplerBackend, SatBackend};
use crate::cnf::{Formula, Model};
use crate::config::Config;
use crate::domain::{all_domains, methyl_label_index};
use crate::enumerator;
use crate::error::Result;
use crate::isomorphism_csp;
use crate::methyl::Methyl;
use crate::signature::Signature;
use crate::signature_graph::SignatureGraph;
use crate::structure::Structure;

fn distinct_seqids(domain: &[usize], methyls: &[Methyl]) -> Vec<i64> {
    let mut seqids: Vec<i64> = domain.iter().map(|&m| methyls[m].seqid).collect();
    seqids.sort_unstable();
    seqids.dedup();
    seqids
}

/// Whether `domain`'s methyls all share one `seqid` (§4.H: a signature whose
/// current options form a single seqid).
#[must_use]
fn is_nailed(domain: &[usize], methyls: &[Methyl]) -> bool {
    distinct_seqids(domain, methyls).len() == 1
}

fn dominant_seqid(marginal: &FxHashMap<i64, f64>) -> Option<(i64, f64)> {
    marginal
        .iter()
        .max_by(|a, b| a.1.partial_cmp(b.1).expect("marginal fractions are never NaN"))
        .map(|(&q, &f)| (q, f))
}

/// Samples `n` weighted models of `formula` and aggregates each signature's
/// per-seqid marginal (§4.H).
pub fn marginalize<S: SamplerBackend>(
    formula: &Formula,
    exponent: f64,
    n: usize,
    num_signatures: usize,
    methyls: &[Methyl],
    sampler: &mut S,
) -> Result<(Vec<FxHashMap<i64, f64>>, Vec<Model>)> {
    let samples = sampler.sample(formula, exponent, n)?;
    let mut marginals: Vec<FxHashMap<i64, f64>> = vec![FxHashMap::default(); num_signatures];
    let weight = 1.0 / n as f64;
    for model in &samples {
        for (sig, methyl) in model.assignments() {
            let seqid = methyls[methyl].seqid;
            *marginals[sig].entry(seqid).or_insert(0.0) += weight;
        }
    }
    Ok((marginals, samples))
}

fn joint_frequency(samples: &[Model], s1: usize, q1: i64, s2: usize, q2: i64, methyls: &[Methyl]) -> f64 {
    let hits = samples
        .iter()
        .filter(|m| {
            let has_q1 = m.assignments().any(|(s, meth)| s == s1 && methyls[meth].seqid == q1);
            let has_q2 = m.assignments().any(|(s, meth)| s == s2 && methyls[meth].seqid == q2);
            has_q1 && has_q2
        })
        .count();
    hits as f64 / samples.len() as f64
}

/// Appends implication or mutual-exclusion clauses for every non-geminal,
/// non-nailed signature pair whose per-seqid marginals diverge sharply from
/// their observed joint frequency (§4.H).
pub fn correlate_assignments(
    formula: &mut Formula,
    signatures: &[Signature],
    domains: &[Vec<usize>],
    methyls: &[Methyl],
    marginals: &[FxHashMap<i64, f64>],
    samples: &[Model],
) {
    let nailed: Vec<bool> = domains.iter().map(|d| is_nailed(d, methyls)).collect();

    for s1 in 0..signatures.len() {
        if nailed[s1] || signatures[s1].geminal.is_some() {
            continue;
        }
        for s2 in (s1 + 1)..signatures.len() {
            if nailed[s2] || signatures[s2].geminal.is_some() {
                continue;
            }

            let seqids1 = distinct_seqids(&domains[s1], methyls);
            let seqids2 = distinct_seqids(&domains[s2], methyls);

            for &q1 in &seqids1 {
                for &q2 in &seqids2 {
                    let p_indep = marginals[s1].get(&q1).copied().unwrap_or(0.0)
                        * marginals[s2].get(&q2).copied().unwrap_or(0.0);
                    let p_obs = joint_frequency(samples, s1, q1, s2, q2, methyls);

                    let methyls_q1: Vec<usize> =
                        domains[s1].iter().copied().filter(|&m| methyls[m].seqid == q1).collect();
                    let methyls_q2: Vec<usize> =
                        domains[s2].iter().copied().filter(|&m| methyls[m].seqid == q2).collect();

                    if p_obs > 10.0 * p_indep {
                        let lits2: Vec<i64> = methyls_q2.iter().map(|&m| formula.vars().asg(s2, m).lit()).collect();
                        for &m1 in &methyls_q1 {
                            let mut clause = vec![formula.vars().asg(s1, m1).neg_lit()];
                            clause.extend(lits2.iter().copied());
                            formula.add_base_clause(clause);
                        }
                        let lits1: Vec<i64> = methyls_q1.iter().map(|&m| formula.vars().asg(s1, m).lit()).collect();
                        for &m2 in &methyls_q2 {
                            let mut clause = vec![formula.vars().asg(s2, m2).neg_lit()];
                            clause.extend(lits1.iter().copied());
                            formula.add_base_clause(clause);
                        }
                    } else if 10.0 * p_obs < p_indep {
                        for &m1 in &methyls_q1 {
                            for &m2 in &methyls_q2 {
                                let lit1 = formula.vars().asg(s1, m1).neg_lit();
                                let lit2 = formula.vars().asg(s2, m2).neg_lit();
                                formula.add_base_clause(vec![lit1, lit2]);
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Builds the isomorphism CSP over `h` and iterates marginalize/correlate
/// until no vertex newly nails, then returns the final support sets via the
/// Support Enumerator (§4.F, §4.H).
#[allow(clippy::too_many_arguments)]
pub fn gibbs_reduce<Sam: SamplerBackend, Sat: SatBackend>(
    h: &SignatureGraph,
    signatures: &[Signature],
    structure: &Structure,
    exponent: f64,
    n: usize,
    cfg: &Config,
    sampler: &mut Sam,
    sat_backend: &Sat,
    rng: &mut impl Rng,
) -> Result<Vec<Vec<usize>>> {
    let methyls = structure.methyls();
    let label_index = methyl_label_index(methyls);
    let domains = all_domains(signatures, &label_index, methyls, cfg);

    let mut formula = isomorphism_csp::build(signatures, h, structure, true, cfg);

    let mut unnailed: FxHashSet<usize> = (0..signatures.len()).filter(|&s| !is_nailed(&domains[s], methyls)).collect();

    loop {
        let (marginals, samples) = marginalize(&formula, exponent, n, signatures.len(), methyls, sampler)?;
        correlate_assignments(&mut formula, signatures, &domains, methyls, &marginals, &samples);

        let mut newly_nailed = Vec::new();
        for &s in &unnailed {
            let Some((seqid, fraction)) = dominant_seqid(&marginals[s]) else {
                continue;
            };
            if fraction > 0.9 {
                let lits: Vec<i64> = domains[s]
                    .iter()
                    .copied()
                    .filter(|&m| methyls[m].seqid == seqid)
                    .map(|m| formula.vars().asg(s, m).lit())
                    .collect();
                formula.add_base_clause(lits);
                newly_nailed.push(s);
            }
        }

        if newly_nailed.is_empty() {
            return enumerator::enumerate(&mut formula, signatures.len(), sat_backend, rng);
        }
        for s in newly_nailed {
            unnailed.remove(&s);
        }
    }
}
