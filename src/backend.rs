//! Pluggable SAT and weighted-sampler backends (§4.E).
//!
//! The CSP builders only ever see [`Formula`]/[`Model`]; how a model is
//! actually found is behind these two traits. The production
//! implementations shell out to subprocesses through unique, RAII-cleaned
//! temporary files (§5); [`BruteForceSatBackend`]/[`BruteForceSamplerBackend`]
//! brute-force small formulas in-process so every property in §8 is
//! checkable without an installed solver binary (§4.L).

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use itertools::Itertools;
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

use crate::cnf::{Formula, Model};
use crate::error::{Error, Result};
use crate::var::VarId;

/// Finds a single satisfying model of a [`Formula`], or determines that none
/// exists (a timeout counts as none, per §4.E/§7).
pub trait SatBackend {
    /// Solves `formula`, returning `None` on UNSAT or timeout.
    fn solve(&self, formula: &Formula) -> Result<Option<Model>>;
}

/// Draws `n` models of `formula`, weighted so that each true `edg` variable
/// contributes `cost^(-exponent)` (§4.E, §4.H).
pub trait SamplerBackend {
    /// Draws `n` weighted models. Must return exactly `n` models or fail —
    /// partial results are not a supported outcome (§4.E: "must succeed or
    /// the caller aborts").
    fn sample(&mut self, formula: &Formula, exponent: f64, n: usize) -> Result<Vec<Model>>;
}

/// Wall-clock budget the production SAT backend gives the solver subprocess
/// before treating the call as UNSAT (§5).
pub const SOLVE_TIMEOUT: Duration = Duration::from_secs(15);

/// Shells out to an external DIMACS-speaking SAT solver.
#[derive(Debug, Clone)]
pub struct SubprocessSatBackend {
    /// Path to the solver executable.
    pub solver_path: PathBuf,
}

impl SubprocessSatBackend {
    /// Builds a backend invoking `solver_path` on a DIMACS CNF file path.
    #[must_use]
    pub fn new(solver_path: impl Into<PathBuf>) -> Self {
        Self {
            solver_path: solver_path.into(),
        }
    }
}

impl SatBackend for SubprocessSatBackend {
    fn solve(&self, formula: &Formula) -> Result<Option<Model>> {
        let mut cnf_file = tempfile::Builder::new()
            .prefix("methylnoe-")
            .suffix(".cnf")
            .tempfile()
            .map_err(|e| Error::Other(e.into()))?;
        cnf_file
            .write_all(formula.to_dimacs().as_bytes())
            .map_err(|e| Error::Other(e.into()))?;
        cnf_file.flush().map_err(|e| Error::Other(e.into()))?;

        let mut child = Command::new(&self.solver_path)
            .arg(cnf_file.path())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| Error::Other(e.into()))?;

        let deadline = Instant::now() + SOLVE_TIMEOUT;
        loop {
            if child.try_wait().map_err(|e| Error::Other(e.into()))?.is_some() {
                // Exit code is ignored (§6): a DIMACS solver's conventional
                // SAT/UNSAT exit codes (e.g. 10/20) aren't portable across
                // solvers, so satisfiability is read from stdout alone.
                let mut stdout = String::new();
                if let Some(mut out) = child.stdout.take() {
                    use std::io::Read as _;
                    out.read_to_string(&mut stdout).map_err(|e| Error::Other(e.into()))?;
                }
                return Ok(parse_sat_output(&stdout, formula));
            }
            if Instant::now() >= deadline {
                let _ = child.kill();
                let _ = child.wait();
                return Ok(None);
            }
            std::thread::sleep(Duration::from_millis(20));
        }
    }
}

/// Parses minisat-style solver output: an `s SATISFIABLE`/`s UNSATISFIABLE`
/// status line and, when satisfiable, `v <lit> <lit> ... 0` lines.
fn parse_sat_output(stdout: &str, formula: &Formula) -> Option<Model> {
    if !stdout.lines().any(|line| line.trim() == "s SATISFIABLE") {
        return None;
    }
    let true_ids = stdout
        .lines()
        .filter(|line| line.starts_with('v'))
        .flat_map(|line| line.trim_start_matches('v').split_whitespace())
        .filter_map(|tok| tok.parse::<i64>().ok())
        .take_while(|&lit| lit != 0)
        .filter(|&lit| lit > 0)
        .map(|lit| VarId(usize::try_from(lit).expect("positive literal")));
    Some(Model::from_true_vars(formula.vars_ref(), true_ids))
}

/// Parses one sampler output line: a concatenated 0/1 string with a comma
/// as its second character (§6) — a one-character leading tag, then the bit
/// for variable `i` at offset `i` past the comma. Lines not matching that
/// shape (e.g. blank lines) are skipped.
fn parse_sample_line(line: &str, formula: &Formula) -> Option<Model> {
    let line = line.trim();
    if line.as_bytes().get(1) != Some(&b',') {
        return None;
    }
    let true_ids = line[2..]
        .chars()
        .enumerate()
        .filter(|&(_, bit)| bit == '1')
        .map(|(i, _)| VarId(i + 1));
    Some(Model::from_true_vars(formula.vars_ref(), true_ids))
}

/// Shells out to an external weighted model sampler.
#[derive(Debug, Clone)]
pub struct SubprocessSamplerBackend {
    /// Path to the sampler executable.
    pub sampler_path: PathBuf,
}

impl SubprocessSamplerBackend {
    /// Builds a backend invoking `sampler_path` on a DIMACS CNF file path and
    /// a weight-file path.
    #[must_use]
    pub fn new(sampler_path: impl Into<PathBuf>) -> Self {
        Self {
            sampler_path: sampler_path.into(),
        }
    }
}

impl SamplerBackend for SubprocessSamplerBackend {
    fn sample(&mut self, formula: &Formula, exponent: f64, n: usize) -> Result<Vec<Model>> {
        let mut cnf_file = tempfile::Builder::new()
            .prefix("methylnoe-")
            .suffix(".cnf")
            .tempfile()
            .map_err(|e| Error::SamplerFailed(e.into()))?;
        cnf_file
            .write_all(formula.to_dimacs().as_bytes())
            .map_err(|e| Error::SamplerFailed(e.into()))?;
        cnf_file.flush().map_err(|e| Error::SamplerFailed(e.into()))?;

        let mut weight_file = tempfile::Builder::new()
            .prefix("methylnoe-weights-")
            .suffix(".txt")
            .tempfile()
            .map_err(|e| Error::SamplerFailed(e.into()))?;
        for (id, cost) in formula.costs() {
            let weight = cost.powf(-exponent);
            writeln!(weight_file, "{} 1 {weight}", id.lit()).map_err(|e| Error::SamplerFailed(e.into()))?;
        }
        weight_file.flush().map_err(|e| Error::SamplerFailed(e.into()))?;

        let output = Command::new(&self.sampler_path)
            .arg(cnf_file.path())
            .arg(weight_file.path())
            .arg("-n")
            .arg(n.to_string())
            .output()
            .map_err(|e| Error::SamplerFailed(e.into()))?;

        if !output.status.success() {
            return Err(Error::SamplerFailed(anyhow::anyhow!(
                "sampler exited with status {}",
                output.status
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let models: Vec<Model> = stdout.lines().filter_map(|line| parse_sample_line(line, formula)).collect();

        if models.len() != n {
            return Err(Error::SamplerFailed(anyhow::anyhow!(
                "sampler produced {} models, expected {n}",
                models.len()
            )));
        }
        Ok(models)
    }
}

/// Enumerates every satisfying assignment of a (small) formula directly.
///
/// Intended only for test formulas: the enumeration is `O(2^V)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BruteForceSatBackend;

impl BruteForceSatBackend {
    /// All satisfying models of `formula`, in no particular order.
    #[must_use]
    pub fn all_models(&self, formula: &Formula) -> Vec<Model> {
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
            .map(|assignment| {
                let true_ids = (0..n)
                    .filter(|&i| assignment[i])
                    .map(|i| VarId(i + 1));
                Model::from_true_vars(formula.vars_ref(), true_ids)
            })
            .collect()
    }
}

impl SatBackend for BruteForceSatBackend {
    fn solve(&self, formula: &Formula) -> Result<Option<Model>> {
        Ok(self.all_models(formula).into_iter().next())
    }
}

/// Draws weighted models by rejection sampling over a full brute-force
/// enumeration, under an injected RNG (§4.L, §9 on deterministic testing).
#[derive(Debug, Clone)]
pub struct BruteForceSamplerBackend<R> {
    rng: R,
}

impl<R: Rng> BruteForceSamplerBackend<R> {
    /// Builds a backend drawing from `rng`.
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

fn model_weight(formula: &Formula, model: &Model, exponent: f64) -> f64 {
    model
        .edges()
        .filter_map(|(edge, methyls)| {
            let id = formula.vars_ref().edg_existing(edge, methyls)?;
            formula.cost(id)
        })
        .map(|cost| cost.powf(-exponent))
        .product::<f64>()
        .max(f64::MIN_POSITIVE)
}

impl<R: Rng> SamplerBackend for BruteForceSamplerBackend<R> {
    fn sample(&mut self, formula: &Formula, exponent: f64, n: usize) -> Result<Vec<Model>> {
        let models = BruteForceSatBackend.all_models(formula);
        if models.is_empty() {
            return Err(Error::SamplerFailed(anyhow::anyhow!(
                "no satisfying model to sample from"
            )));
        }
        let weights: Vec<f64> = models.iter().map(|m| model_weight(formula, m, exponent)).collect();
        let dist = WeightedIndex::new(&weights).map_err(|e| Error::SamplerFailed(e.into()))?;
        Ok((0..n).map(|_| models[dist.sample(&mut self.rng)].clone()).collect())
    }
}
