//! Prometheus text exposition format (version 0.0.4).
//!
//! Families render in the order given; series render in snapshot order.
//! Labels follow each family's declared order, with `le` appended for buckets.

use std::fmt::Write;

use crate::error::{Result, TripmeterError};

use super::labels::LabelSet;
use super::registry::{FamilySnapshot, SeriesValue};

/// Content type served alongside [`render`] output.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Escape a label value: backslash, double quote and newline.
fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

/// Escape HELP text: backslash and newline only.
fn escape_help(v: &str) -> String {
    v.replace('\\', "\\\\").replace('\n', "\\n")
}

/// Shortest representation that parses back to the same `f64`.
fn format_float(v: f64) -> String {
    if v.is_nan() {
        "NaN".into()
    } else if v == f64::INFINITY {
        "+Inf".into()
    } else if v == f64::NEG_INFINITY {
        "-Inf".into()
    } else {
        format!("{v}")
    }
}

/// `{a="x",b="y"}` in declared order, or an empty string without labels.
fn label_block(names: &[String], labels: &LabelSet, le: Option<&str>) -> String {
    let mut parts: Vec<String> = names
        .iter()
        .map(|n| format!("{}=\"{}\"", n, escape_label(labels.get(n).unwrap_or_default())))
        .collect();
    if let Some(le) = le {
        parts.push(format!("le=\"{le}\""));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!("{{{}}}", parts.join(","))
    }
}

fn render_family(fam: &FamilySnapshot, out: &mut String) -> std::fmt::Result {
    writeln!(out, "# HELP {} {}", fam.name, escape_help(&fam.help))?;
    writeln!(out, "# TYPE {} {}", fam.name, fam.kind)?;

    for s in &fam.series {
        match &s.value {
            SeriesValue::Counter(v) => {
                let labels = label_block(&fam.label_names, &s.labels, None);
                writeln!(out, "{}{} {}", fam.name, labels, v)?;
            }
            SeriesValue::Histogram(h) => {
                for (le, count) in &h.buckets {
                    let le = format_float(*le);
                    let labels = label_block(&fam.label_names, &s.labels, Some(le.as_str()));
                    writeln!(out, "{}_bucket{} {}", fam.name, labels, count)?;
                }
                let labels = label_block(&fam.label_names, &s.labels, Some("+Inf"));
                writeln!(out, "{}_bucket{} {}", fam.name, labels, h.count)?;

                let labels = label_block(&fam.label_names, &s.labels, None);
                writeln!(out, "{}_sum{} {}", fam.name, labels, format_float(h.sum))?;
                writeln!(out, "{}_count{} {}", fam.name, labels, h.count)?;
            }
        }
    }
    Ok(())
}

/// Render a registry snapshot. An empty snapshot renders as an empty body.
pub fn render(families: &[FamilySnapshot]) -> Result<String> {
    let mut out = String::new();
    for fam in families {
        render_family(fam, &mut out)
            .map_err(|e| TripmeterError::ExpositionFailure(format!("{}: {e}", fam.name)))?;
    }
    Ok(out)
}
