//! Methyl-domain resolution and vertex injection, shared by the Clustering
//! CSP Builder (§4.C.1) and the Isomorphism CSP Builder (§4.D, which reuses
//! §4.C.1 verbatim over a different vertex set).

use rustc_hash::FxHashMap;

use crate::cnf::Formula;
use crate::config::Config;
use crate::encoding::{at_most_one, exactly_one};
use crate::methyl::Methyl;
use crate::signature::Signature;

/// Maps each methyl's label to its index in `methyls`.
#[must_use]
pub fn methyl_label_index(methyls: &[Methyl]) -> FxHashMap<String, usize> {
    methyls.iter().enumerate().map(|(i, m)| (m.label(), i)).collect()
}

/// Maps each signature's label to its index in `signatures`.
#[must_use]
pub fn signature_label_index(signatures: &[Signature]) -> FxHashMap<&str, usize> {
    signatures.iter().enumerate().map(|(i, s)| (s.label.as_str(), i)).collect()
}

/// A signature's resolved methyl domain `D(s)` (§4.C.1): `options` under
/// `force_sv`, else `asg` under `force_asg`, else every methyl whose color is
/// acceptable to the signature.
#[must_use]
pub fn domain(sig: &Signature, label_index: &FxHashMap<String, usize>, methyls: &[Methyl], cfg: &Config) -> Vec<usize> {
    let resolve = |labels: &[String]| -> Vec<usize> {
        labels.iter().filter_map(|l| label_index.get(l).copied()).collect()
    };

    if cfg.force_sv && !sig.options.is_empty() {
        return resolve(&sig.options);
    }
    if cfg.force_asg && !sig.asg.is_empty() {
        return resolve(&sig.asg);
    }
    methyls
        .iter()
        .enumerate()
        .filter(|(_, m)| sig.color.contains(m.color))
        .map(|(i, _)| i)
        .collect()
}

/// Resolves every signature's domain.
#[must_use]
pub fn all_domains(signatures: &[Signature], label_index: &FxHashMap<String, usize>, methyls: &[Methyl], cfg: &Config) -> Vec<Vec<usize>> {
    signatures.iter().map(|s| domain(s, label_index, methyls, cfg)).collect()
}

/// Emits the §4.C.1 vertex-injection constraints: exactly one methyl per
/// vertex's domain, at most one vertex per methyl.
pub fn emit_vertex_injection(formula: &mut Formula, domains: &[Vec<usize>], num_methyls: usize) {
    for (v, dom) in domains.iter().enumerate() {
        let lits: Vec<i64> = dom.iter().map(|&m| formula.vars().asg(v, m).lit()).collect();
        exactly_one(formula, &lits);
    }
    for m in 0..num_methyls {
        let lits: Vec<i64> = domains
            .iter()
            .enumerate()
            .filter(|(_, dom)| dom.contains(&m))
            .map(|(v, _)| formula.vars().asg(v, m).lit())
            .collect();
        at_most_one(formula, &lits);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::methyl::Color;
    use crate::signature::ColorSet;

    #[test]
    fn force_sv_takes_precedence_over_force_asg() {
        let methyls = vec![
            Methyl::new(Color::A, 1, None, false),
            Methyl::new(Color::A, 2, None, false),
        ];
        let label_index = methyl_label_index(&methyls);
        let mut cfg = Config::default();
        cfg.force_sv = true;
        cfg.force_asg = true;

        let mut sig = Signature::new("s1", 20.0, 1.0, ColorSet::all());
        sig.options = vec!["C1".to_owned()];
        sig.asg = vec!["C2".to_owned()];

        assert_eq!(domain(&sig, &label_index, &methyls, &cfg), vec![0]);
    }

    #[test]
    fn empty_hints_fall_back_to_color_match() {
        let methyls = vec![
            Methyl::new(Color::A, 1, None, false),
            Methyl::new(Color::I, 2, None, false),
        ];
        let label_index = methyl_label_index(&methyls);
        let mut cfg = Config::default();
        cfg.force_sv = true;
        let sig = Signature::new("s1", 20.0, 1.0, ColorSet::from_colors([Color::I]));
        assert_eq!(domain(&sig, &label_index, &methyls, &cfg), vec![1]);
    }
}
