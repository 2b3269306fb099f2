//! Reads the price and recipe tables from CSV files.
//!
//! Both files start with a header row, which is skipped. Price rows are
//! `name, cost, price, <unused>, kind`; recipe rows are
//! `target, material, quantity, material, quantity, ...` with any number of pairs.
//! Line numbers in warnings are 1-based file lines, blank lines included.

use std::{
    fs::File,
    io::Read,
    path::{Path, PathBuf},
};

use csv::{Position, ReaderBuilder, StringRecord};
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::{Amount, PriceRow, RecipeRow, RowWarning};

const NAME_COLUMN: usize = 0;
const COST_COLUMN: usize = 1;
const PRICE_COLUMN: usize = 2;
const KIND_COLUMN: usize = 4;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// Parsed rows plus the rows that were skipped.
#[derive(Debug)]
pub struct Rows<T> {
    pub rows: Vec<T>,
    pub skipped: Vec<RowWarning>,
}

impl<T> Default for Rows<T> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

impl<T> Rows<T> {
    fn skip(&mut self, what: &str, warning: RowWarning) {
        warn!("skip {what} row: {warning}");
        self.skipped.push(warning);
    }
}

pub type PriceRows = Rows<PriceRow>;
pub type RecipeRows = Rows<RecipeRow>;

pub fn load_price_file(path: &Path) -> Result<PriceRows, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    read_prices(file).map_err(|source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_recipe_file(path: &Path) -> Result<RecipeRows, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    read_recipes(file).map_err(|source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    })
}

/// Every data row of `input` with its 1-based line number. Rows that are not valid
/// UTF-8 come back as the line number alone.
fn records<R: Read>(
    mut input: R,
    table: &str,
) -> Result<Vec<Result<(u64, StringRecord), u64>>, csv::Error> {
    let mut data = Vec::new();
    input.read_to_end(&mut data)?;

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(data.as_slice());
    debug!(
        "{table} header: {}",
        String::from_utf8_lossy(reader.byte_headers()?.as_slice())
    );

    reader
        .byte_records()
        .map(|record| {
            let record = record?;
            let line = record
                .position()
                .map(|pos| line_at(&data, pos))
                .unwrap_or_default();
            Ok(StringRecord::from_byte_record(record)
                .map(|record| (line, record))
                .map_err(|_| line))
        })
        .collect()
}

/// The reader records where it started looking for a row, which is before any blank
/// lines it skipped.
fn line_at(data: &[u8], pos: &Position) -> u64 {
    let start = usize::try_from(pos.byte()).unwrap_or(usize::MAX);
    let skipped = data
        .get(start..)
        .unwrap_or_default()
        .iter()
        .take_while(|&&b| b == b'\r' || b == b'\n')
        .filter(|&&b| b == b'\n')
        .count() as u64;
    pos.line() + skipped
}

/// Reads price rows. Rows with unparsable numbers or bad encoding are skipped, not
/// fatal.
pub fn read_prices<R: Read>(input: R) -> Result<PriceRows, csv::Error> {
    let mut parsed = PriceRows::default();
    for record in records(input, "price")? {
        match record
            .map_err(|line| RowWarning::InvalidUtf8 { line })
            .and_then(|(line, record)| price_row(line, &record))
        {
            Ok(row) => parsed.rows.push(row),
            Err(warning) => parsed.skip("price", warning),
        }
    }
    Ok(parsed)
}

/// Reads recipe rows as raw fields; pairing happens when the catalog is built.
pub fn read_recipes<R: Read>(input: R) -> Result<RecipeRows, csv::Error> {
    let mut parsed = RecipeRows::default();
    for record in records(input, "recipe")? {
        match record {
            Ok((line, record)) => parsed.rows.push(RecipeRow {
                line,
                fields: record.iter().map(str::to_string).collect(),
            }),
            Err(line) => parsed.skip("recipe", RowWarning::InvalidUtf8 { line }),
        }
    }
    Ok(parsed)
}

fn price_row(line: u64, record: &StringRecord) -> Result<PriceRow, RowWarning> {
    let field = |idx: usize| record.get(idx).map(str::trim).unwrap_or_default();
    let name = field(NAME_COLUMN);

    let number = |column: &'static str, idx: usize| -> Result<Amount, RowWarning> {
        let value = field(idx);
        if value.is_empty() {
            return Ok(Amount::UNSET);
        }
        value
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(Amount::new)
            .ok_or_else(|| RowWarning::BadNumber {
                line,
                item: name.to_string(),
                column,
                value: value.to_string(),
            })
    };

    Ok(PriceRow {
        line,
        name: name.to_string(),
        cost: number("cost", COST_COLUMN)?,
        price: number("price", PRICE_COLUMN)?,
        kind: field(KIND_COLUMN).to_string(),
    })
}
