//! CSV/JSON ingest (§4.I): builds the data model of §3 from the on-the-wire
//! formats of §6. Malformed rows are skipped and counted rather than
//! aborting the load (§7); presenting those counts to a human is outside
//! this crate's scope.

use std::io::Read;

use rustc_hash::FxHashMap;
use serde::Deserialize;

use crate::config::Config;
use crate::methyl::{Color, Methyl};
use crate::noe::{CchCoords, FourDCoords, HchCoords, Noe, NoeCoords};
use crate::signature::{ColorSet, Signature};
use crate::structure::Structure;

/// One skipped-row diagnostic, keyed by its row index within its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowError {
    /// Zero-based row index within the source being parsed.
    pub row: usize,
    /// Human-readable reason the row was skipped.
    pub reason: String,
}

/// Aggregated ingest diagnostics: nothing here performs I/O of its own (§4.I).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Rows skipped for a missing/invalid required field.
    pub malformed_rows: Vec<RowError>,
    /// NOEs rejected on construction for lying on the spectral diagonal.
    pub diagonal_noes: usize,
}

impl IngestReport {
    fn record(&mut self, row: usize, reason: impl Into<String>) {
        self.malformed_rows.push(RowError {
            row,
            reason: reason.into(),
        });
    }
}

fn split_labels(field: Option<&str>) -> Vec<String> {
    field
        .map(|s| s.split_whitespace().map(str::to_owned).collect())
        .unwrap_or_default()
}

fn is_truthy(s: &str) -> bool {
    matches!(s.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "y" | "t")
}

#[derive(Debug, Deserialize)]
struct HmqcRow {
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    carbon: Option<f64>,
    #[serde(default)]
    hydrogen: Option<f64>,
    #[serde(default)]
    color: Option<String>,
    #[serde(default)]
    assignment: Option<String>,
    #[serde(default)]
    options: Option<String>,
    #[serde(default)]
    geminal: Option<String>,
}

/// Parses the HMQC CSV table of §6 into [`Signature`]s (§4.I).
pub fn load_hmqc<R: Read>(reader: R) -> (Vec<Signature>, IngestReport) {
    let mut report = IngestReport::default();
    let mut signatures = Vec::new();
    let mut rdr = csv::Reader::from_reader(reader);

    for (row, result) in rdr.deserialize::<HmqcRow>().enumerate() {
        let parsed = match result {
            Ok(parsed) => parsed,
            Err(e) => {
                report.record(row, e.to_string());
                continue;
            }
        };
        let (Some(label), Some(carbon), Some(hydrogen)) = (parsed.label, parsed.carbon, parsed.hydrogen) else {
            report.record(row, "missing required field: label/carbon/hydrogen");
            continue;
        };

        let color = parsed.color.as_deref().map_or_else(ColorSet::all, |s| {
            ColorSet::from_colors(s.chars().filter_map(Color::from_char))
        });

        let mut sig = Signature::new(label, carbon, hydrogen, color);
        sig.asg = split_labels(parsed.assignment.as_deref());
        sig.options = split_labels(parsed.options.as_deref());
        sig.geminal = parsed.geminal.filter(|g| !g.is_empty());
        signatures.push(sig);
    }

    (signatures, report)
}

#[derive(Debug, Deserialize)]
struct NoeRow {
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    c2: Option<f64>,
    #[serde(default)]
    h2: Option<f64>,
    #[serde(default)]
    c1: Option<f64>,
    #[serde(default)]
    h1: Option<f64>,
    #[serde(default)]
    intensity: Option<f64>,
    #[serde(default)]
    cluster: Option<String>,
    #[serde(default)]
    reciprocals: Option<String>,
    #[serde(default)]
    short_range: Option<String>,
}

/// Parses the NOE CSV table of §6 into [`Noe`]s, resolving `cluster` and
/// `reciprocals` labels against `signatures` and the NOE table itself in a
/// post-load pass (§4.I, §9 "Cyclic structures"). A row with no explicit
/// `cluster` column falls back to every signature within `cfg`'s clustering
/// tolerance of the receiver coordinates (§3, §6).
pub fn load_noes<R: Read>(reader: R, signatures: &[Signature], cfg: &Config) -> (Vec<Noe>, IngestReport) {
    let mut report = IngestReport::default();
    let sig_index: FxHashMap<&str, usize> = signatures.iter().enumerate().map(|(i, s)| (s.label.as_str(), i)).collect();

    let mut rdr = csv::Reader::from_reader(reader);
    let mut raw: Vec<(Noe, Vec<String>, Vec<String>)> = Vec::new();

    for (row, result) in rdr.deserialize::<NoeRow>().enumerate() {
        let parsed = match result {
            Ok(parsed) => parsed,
            Err(e) => {
                report.record(row, e.to_string());
                continue;
            }
        };
        let Some(label) = parsed.label else {
            report.record(row, "missing required field: label");
            continue;
        };
        let (Some(c2), Some(h2)) = (parsed.c2, parsed.h2) else {
            report.record(row, "missing required field: c2/h2");
            continue;
        };

        let coords = match (parsed.c1, parsed.h1) {
            (Some(c1), Some(h1)) => NoeCoords::FourD(FourDCoords { c1, h1, c2, h2 }),
            (Some(c1), None) => NoeCoords::Cch(CchCoords { c1, c2, h2 }),
            (None, Some(h1)) => NoeCoords::Hch(HchCoords { h1, c2, h2 }),
            (None, None) => {
                report.record(row, "missing sender coordinate: c1/h1");
                continue;
            }
        };

        let intensity = parsed.intensity.unwrap_or(0.0);
        let short_range = parsed.short_range.as_deref().is_some_and(is_truthy);

        let Some(noe) = Noe::new(label, coords, intensity, short_range, cfg) else {
            report.diagonal_noes += 1;
            continue;
        };

        let cluster_labels = split_labels(parsed.cluster.as_deref());
        let reciprocal_labels = split_labels(parsed.reciprocals.as_deref());
        raw.push((noe, cluster_labels, reciprocal_labels));
    }

    let noe_label_index: FxHashMap<String, usize> =
        raw.iter().enumerate().map(|(i, (noe, _, _))| (noe.label.clone(), i)).collect();

    let noes = raw
        .into_iter()
        .map(|(mut noe, cluster_labels, reciprocal_labels)| {
            noe.clusters = if cluster_labels.is_empty() {
                let (c2, h2) = noe.receiver();
                signatures
                    .iter()
                    .enumerate()
                    .filter(|(_, s)| s.clusters_with(c2, h2, cfg.cls_ctol, cfg.cls_htol))
                    .map(|(i, _)| i)
                    .collect()
            } else {
                cluster_labels.iter().filter_map(|l| sig_index.get(l.as_str()).copied()).collect()
            };
            noe.reciprocals = reciprocal_labels.iter().filter_map(|l| noe_label_index.get(l).copied()).collect();
            noe
        })
        .collect();

    (noes, report)
}

#[derive(Debug, Deserialize)]
struct StructureVertex {
    color: String,
    seqid: i64,
    order: Option<u8>,
    added: bool,
}

#[derive(Debug, Deserialize)]
struct StructureDoc {
    vertices: Vec<StructureVertex>,
    #[serde(default)]
    edges: Vec<(String, String, Vec<f64>)>,
}

/// Parses the Structure JSON document of §6 into a [`Structure`] (§4.I).
pub fn load_structure<R: Read>(reader: R) -> (Structure, IngestReport) {
    let mut report = IngestReport::default();

    let doc: StructureDoc = match serde_json::from_reader(reader) {
        Ok(doc) => doc,
        Err(e) => {
            report.record(0, e.to_string());
            return (Structure::new(Vec::new(), Vec::new()), report);
        }
    };

    let mut methyls = Vec::with_capacity(doc.vertices.len());
    for (row, v) in doc.vertices.into_iter().enumerate() {
        let Some(color) = v.color.chars().next().and_then(Color::from_char) else {
            report.record(row, format!("unknown color: {:?}", v.color));
            continue;
        };
        methyls.push(Methyl::new(color, v.seqid, v.order, v.added));
    }

    let label_index: FxHashMap<String, usize> = methyls.iter().enumerate().map(|(i, m)| (m.label(), i)).collect();
    let mut edges = Vec::with_capacity(doc.edges.len());
    for (row, (a, b, distances)) in doc.edges.into_iter().enumerate() {
        if !label_index.contains_key(&a) || !label_index.contains_key(&b) {
            report.record(row, format!("edge references unknown methyl label: ({a:?}, {b:?})"));
            continue;
        }
        edges.push((a, b, distances));
    }

    (Structure::new(methyls, edges), report)
}
