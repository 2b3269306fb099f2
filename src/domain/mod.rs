//! Cost and profit resolution for a crafting economy lives here.

pub mod amount;
pub mod cost;
pub mod cumulative;
pub mod entities;
pub mod errors;
pub mod evaluation;
pub mod profit;

pub use amount::Amount;
pub use cost::CostResolver;
pub use cumulative::CumulativeResolver;
pub use entities::{Catalog, PriceRecord, PriceRow, Recipe, RecipeRow};
pub use errors::{ResolveError, RowWarning};
pub use evaluation::{evaluate_catalog, EvaluationSummary, ItemReport};
pub use profit::{ProfitEntry, ProfitTable};
