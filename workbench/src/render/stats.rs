//! Metric lines, formatted from the figures the service reported.

use std::fmt;

use crate::common::{Family, Operation};
use crate::session::Metrics;

const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// Human readable size with base 1024 units, rounded to two decimals.
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = (value * 100.0).round() / 100.0;
    format!("{rounded} {}", UNITS[unit])
}

/// A labelled figure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricLine {
    /// What is measured
    pub label: &'static str,
    /// The formatted figure
    pub value: String,
}

impl fmt::Display for MetricLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.label, self.value)
    }
}

fn line(label: &'static str, value: String) -> MetricLine {
    MetricLine { label, value }
}

/// The metric lines of one round trip. Figures the service did not report
/// are left out.
pub fn metric_lines(family: Family, operation: Operation, metrics: &Metrics) -> Vec<MetricLine> {
    let (input_label, output_label) = match operation {
        Operation::Encode => ("Original size", "Compressed size"),
        Operation::Decode => ("Compressed size", "Decompressed size"),
    };

    let mut lines = Vec::new();
    if let Some(size) = metrics.original_size {
        lines.push(line(input_label, format_bytes(size)));
    }
    lines.push(line(output_label, format_bytes(metrics.result_size)));

    if let Some(header) = metrics.header_size {
        let value = match family {
            Family::Dictionary => format!("{header} bits"),
            _ => format_bytes(header),
        };
        lines.push(line("Header size", value));
    }
    if let Some(size) = metrics.compressed_data_size {
        lines.push(line("Data size", format_bytes(size)));
    }
    if let Some(ratio) = metrics.compression_ratio {
        lines.push(line("Compression ratio", format!("{ratio:.2}%")));
    }
    match (metrics.space_saved, metrics.percentage_saved) {
        (Some(saved), Some(percentage)) => {
            lines.push(line(
                "Space saved",
                format!("{} ({percentage:.2}%)", format_bytes(saved)),
            ));
        }
        (Some(saved), None) => lines.push(line("Space saved", format_bytes(saved))),
        _ => {}
    }

    lines
}
