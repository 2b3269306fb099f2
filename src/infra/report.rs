//! Renders evaluated items for people (TSV) or other tools (JSON).

use std::io::{self, Write};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Amount, ItemReport};

const TSV_HEADER: [&str; 6] = ["アイテム名", "売値", "コスト", "単純儲け", "累積儲け", "種別"];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Tsv,
    Json,
}

impl OutputFormat {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Tsv => "tsv",
            Self::Json => "json",
        }
    }
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
}

/// JSON shape of one item: numbers rounded, unset as `null`.
#[derive(Serialize)]
struct ReportLine<'a> {
    name: &'a str,
    price: Option<i64>,
    cost: Option<i64>,
    profit: Option<i64>,
    cumulative_profit: Option<i64>,
    kind: &'a str,
}

impl<'a> From<&'a ItemReport> for ReportLine<'a> {
    fn from(item: &'a ItemReport) -> Self {
        Self {
            name: &item.name,
            price: item.price.rounded(),
            cost: item.cost.rounded(),
            profit: item.profit.rounded(),
            cumulative_profit: item.cumulative_profit.rounded(),
            kind: &item.kind,
        }
    }
}

/// Writes `items` in order. `unset_marker` stands in for unset values in TSV output.
pub fn write_report<W: Write>(
    mut out: W,
    items: &[ItemReport],
    format: OutputFormat,
    unset_marker: &str,
) -> Result<(), ReportError> {
    match format {
        OutputFormat::Tsv => {
            writeln!(out, "{}", TSV_HEADER.join("\t"))?;
            for item in items {
                writeln!(
                    out,
                    "{}\t{}\t{}\t{}\t{}\t{}",
                    item.name,
                    display(item.price, unset_marker),
                    display(item.cost, unset_marker),
                    display(item.profit, unset_marker),
                    display(item.cumulative_profit, unset_marker),
                    item.kind
                )?;
            }
        }
        OutputFormat::Json => {
            let lines: Vec<ReportLine<'_>> = items.iter().map(ReportLine::from).collect();
            serde_json::to_writer_pretty(&mut out, &lines)?;
            writeln!(out)?;
        }
    }
    out.flush()?;
    Ok(())
}

fn display(value: Amount, unset_marker: &str) -> String {
    value
        .rounded()
        .map(|v| v.to_string())
        .unwrap_or_else(|| unset_marker.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items() -> Vec<ItemReport> {
        vec![
            ItemReport {
                name: "Bread".into(),
                price: Amount::new(100.0),
                cost: Amount::new(42.5),
                profit: Amount::new(57.5),
                cumulative_profit: Amount::new(67.5),
                kind: "料理".into(),
            },
            ItemReport {
                name: "Pie".into(),
                price: Amount::new(300.0),
                cost: Amount::UNSET,
                profit: Amount::UNSET,
                cumulative_profit: Amount::UNSET,
                kind: "料理".into(),
            },
        ]
    }

    #[test]
    fn tsv_rounds_and_marks_unset() {
        let mut out = Vec::new();
        write_report(&mut out, &items(), OutputFormat::Tsv, "nan").unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "アイテム名\t売値\tコスト\t単純儲け\t累積儲け\t種別");
        assert_eq!(lines[1], "Bread\t100\t42\t58\t68\t料理");
        assert_eq!(lines[2], "Pie\t300\tnan\tnan\tnan\t料理");
    }

    #[test]
    fn json_uses_null_for_unset() {
        let mut out = Vec::new();
        write_report(&mut out, &items(), OutputFormat::Json, "nan").unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value[0]["cost"], 42);
        assert!(value[1]["cost"].is_null());
        assert_eq!(value[1]["price"], 300);
    }
}
