use tracing::info;

use super::{
    amount::Amount, cost::CostResolver, cumulative::CumulativeResolver, entities::Catalog,
    profit::ProfitTable,
};

/// Everything the report shows for one item.
#[derive(Clone, Debug, PartialEq)]
pub struct ItemReport {
    pub name: String,
    pub price: Amount,
    pub cost: Amount,
    pub profit: Amount,
    pub cumulative_profit: Amount,
    pub kind: String,
}

pub struct EvaluationSummary {
    /// One entry per price table item, in table order.
    pub items: Vec<ItemReport>,
    pub cost_evaluations: usize,
    pub cumulative_evaluations: usize,
}

impl EvaluationSummary {
    pub fn unresolved_costs(&self) -> usize {
        self.items.iter().filter(|item| item.cost.is_unset()).count()
    }

    pub fn unresolved_cumulative(&self) -> usize {
        self.items
            .iter()
            .filter(|item| item.cumulative_profit.is_unset())
            .count()
    }
}

/// Resolves costs, then simple profits, then cumulative profits for the whole catalog.
pub fn evaluate_catalog<I, S>(catalog: &Catalog, primary_kinds: I) -> EvaluationSummary
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut costs = CostResolver::new(catalog, primary_kinds);
    for (name, _) in catalog.items() {
        costs.resolve(name);
    }
    let profits = ProfitTable::build(catalog, &mut costs);

    let mut cumulative = CumulativeResolver::new(catalog, &profits);
    let mut items = Vec::with_capacity(catalog.len());
    for (name, record) in catalog.items() {
        let cumulative_profit = cumulative.resolve(name);
        let (cost, profit) = profits
            .get(name)
            .map(|entry| (entry.cost, entry.profit))
            .unwrap_or((Amount::UNSET, Amount::UNSET));
        items.push(ItemReport {
            name: name.to_string(),
            price: record.price,
            cost,
            profit,
            cumulative_profit,
            kind: record.kind.clone(),
        });
    }

    let summary = EvaluationSummary {
        items,
        cost_evaluations: costs.evaluations(),
        cumulative_evaluations: cumulative.evaluations(),
    };
    info!(
        items = summary.items.len(),
        unresolved_costs = summary.unresolved_costs(),
        unresolved_cumulative = summary.unresolved_cumulative(),
        "evaluation finished"
    );
    summary
}
