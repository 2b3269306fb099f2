use std::collections::HashMap;

use tracing::warn;

use super::{amount::Amount, cost::CostResolver, entities::Catalog};

/// Resolved cost and simple profit of one item.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProfitEntry {
    pub cost: Amount,
    /// Sell price minus cost.
    pub profit: Amount,
}

/// Simple profit for every item of the price table.
#[derive(Clone, Debug, Default)]
pub struct ProfitTable {
    entries: HashMap<String, ProfitEntry>,
}

impl ProfitTable {
    pub fn build(catalog: &Catalog, costs: &mut CostResolver<'_>) -> Self {
        let entries = catalog
            .items()
            .map(|(name, record)| {
                let cost = costs.resolve(name);
                let profit = record.price.checked_sub(cost).unwrap_or_else(|| {
                    warn!(item = name, "profit of {name} overflows");
                    Amount::UNSET
                });
                let entry = ProfitEntry { cost, profit };
                (name.to_string(), entry)
            })
            .collect();
        Self { entries }
    }

    pub fn get(&self, item: &str) -> Option<&ProfitEntry> {
        self.entries.get(item)
    }

    pub fn profit(&self, item: &str) -> Option<Amount> {
        self.get(item).map(|entry| entry.profit)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
