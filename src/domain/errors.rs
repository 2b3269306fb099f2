use std::sync::Arc;

use thiserror::Error;

/// Why a single item's cost or cumulative profit could not be resolved.
///
/// These never abort a run; the affected item's value becomes unset.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("cannot calculate {item} cost because {material} is not in the price table")]
    MaterialMissing { item: String, material: String },
    #[error("cannot calculate {item} cost because {material}'s price is not set")]
    MaterialPriceUnset { item: String, material: String },
    #[error("{item} does not have any materials")]
    NoRecipe { item: String },
    #[error("{item} is not in the price table")]
    NotInPriceTable { item: String },
    /// `path` is shared by every item that fails on the same cycle.
    #[error("{item} depends on a recipe cycle: {}", .path.join(" -> "))]
    CyclicDependency { item: String, path: Arc<[String]> },
    #[error("{item} overflows the number range")]
    Overflow { item: String },
}

impl ResolveError {
    /// The item whose value this error poisons.
    pub fn item(&self) -> &str {
        match self {
            Self::MaterialMissing { item, .. }
            | Self::MaterialPriceUnset { item, .. }
            | Self::NoRecipe { item }
            | Self::NotInPriceTable { item }
            | Self::CyclicDependency { item, .. }
            | Self::Overflow { item } => item,
        }
    }
}

/// A malformed input row. The row is skipped, loading continues.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RowWarning {
    #[error("line {line}: row is not valid UTF-8")]
    InvalidUtf8 { line: u64 },
    #[error("line {line}: skipping row with empty item name")]
    EmptyName { line: u64 },
    #[error("line {line}: {target} has no materials set")]
    NoMaterials { line: u64, target: String },
    #[error("line {line}: {target} has a material without a quantity")]
    UnpairedField { line: u64, target: String },
    #[error("line {line}: {target} has invalid quantity {value:?} for {material}")]
    BadQuantity {
        line: u64,
        target: String,
        material: String,
        value: String,
    },
    #[error("line {line}: invalid {column} {value:?} for {item}")]
    BadNumber {
        line: u64,
        item: String,
        column: &'static str,
        value: String,
    },
}
