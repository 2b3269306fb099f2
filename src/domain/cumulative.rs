//! Cumulative profit: an item's own profit plus the cumulative profit of each of its
//! direct materials. Quantities are not weighted.
//!
//! The recipe graph is walked post-order with an explicit stack, so long material
//! chains do not grow the native stack. An item that is met again while it is still
//! being resolved closes a recipe cycle; every item on the stack at that point fails
//! with [`ResolveError::CyclicDependency`], sharing one copy of the cycle path. Items
//! that later reach a failed cycle member fail the same way.

use std::{collections::HashMap, sync::Arc};

use tracing::warn;

use super::{
    amount::Amount,
    entities::{Catalog, Recipe},
    errors::ResolveError,
    profit::ProfitTable,
};

#[derive(Clone, Debug)]
enum State {
    Resolving,
    Done(Result<Amount, ResolveError>),
}

/// What a material's cache entry means to the item that needs it.
enum Seen {
    Value(Amount),
    Resolving,
    OnCycle(Arc<[String]>),
}

/// An item whose materials are still being summed.
struct Frame<'a> {
    item: String,
    recipe: &'a Recipe,
    next: usize,
    total: Amount,
    overflowed: bool,
}

impl Frame<'_> {
    fn add(&mut self, value: Amount) {
        match self.total.checked_add(value) {
            Some(total) => self.total = total,
            None => {
                self.total = Amount::UNSET;
                self.overflowed = true;
            }
        }
    }

    fn finish(self) -> (String, Result<Amount, ResolveError>) {
        if !self.overflowed {
            return (self.item, Ok(self.total));
        }
        let error = ResolveError::Overflow {
            item: self.item.clone(),
        };
        warn!(item = error.item(), "cannot calculate cumulative profit: {error}");
        (self.item, Err(error))
    }
}

enum Entered<'a> {
    Finished(Result<Amount, ResolveError>),
    Pending(Frame<'a>),
}

/// Memoized cumulative profit over one catalog and its profit table.
pub struct CumulativeResolver<'a> {
    catalog: &'a Catalog,
    profits: &'a ProfitTable,
    cache: HashMap<String, State>,
    evaluations: usize,
}

impl<'a> CumulativeResolver<'a> {
    pub fn new(catalog: &'a Catalog, profits: &'a ProfitTable) -> Self {
        Self {
            catalog,
            profits,
            cache: HashMap::new(),
            evaluations: 0,
        }
    }

    /// Cumulative profit of `item`.
    ///
    /// Fails when the item is not in the price table, sits on (or above) a recipe
    /// cycle, or its sum overflows. Materials that fail for other reasons only poison
    /// the sum.
    pub fn cumulative(&mut self, item: &str) -> Result<Amount, ResolveError> {
        if let Some(State::Done(result)) = self.cache.get(item) {
            return result.clone();
        }

        let mut stack = match self.enter(item) {
            Entered::Finished(result) => return result,
            Entered::Pending(frame) => vec![frame],
        };
        let mut finished = Ok(Amount::UNSET);

        while let Some(frame) = stack.last_mut() {
            let recipe = frame.recipe;
            if let Some((material, _)) = recipe.material(frame.next) {
                frame.next += 1;

                let seen = self.cache.get(material).map(|state| match state {
                    State::Resolving => Seen::Resolving,
                    State::Done(Err(ResolveError::CyclicDependency { path, .. })) => {
                        Seen::OnCycle(Arc::clone(path))
                    }
                    State::Done(result) => Seen::Value(result.clone().unwrap_or(Amount::UNSET)),
                });
                match seen {
                    Some(Seen::Value(value)) => frame.add(value),
                    Some(Seen::Resolving) => {
                        let path = cycle_path(&stack, material);
                        warn!("recipe cycle: {}", path.join(" -> "));
                        return Err(self.fail_stack(&stack, path));
                    }
                    Some(Seen::OnCycle(path)) => {
                        warn!(
                            item = %frame.item,
                            "{} depends on {material}, which is on a recipe cycle",
                            frame.item
                        );
                        return Err(self.fail_stack(&stack, path));
                    }
                    None => match self.enter(material) {
                        Entered::Finished(result) => frame.add(result.unwrap_or(Amount::UNSET)),
                        Entered::Pending(child) => stack.push(child),
                    },
                }
                continue;
            }

            let Some(done) = stack.pop() else {
                break;
            };
            let (name, result) = done.finish();
            self.cache.insert(name, State::Done(result.clone()));
            match stack.last_mut() {
                Some(parent) => parent.add(result.unwrap_or(Amount::UNSET)),
                None => finished = result,
            }
        }

        finished
    }

    /// Like [`cumulative`](Self::cumulative), with failures turned into an unset amount.
    pub fn resolve(&mut self, item: &str) -> Amount {
        self.cumulative(item).unwrap_or(Amount::UNSET)
    }

    /// Number of items whose cumulative profit was actually computed.
    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    fn enter(&mut self, item: &str) -> Entered<'a> {
        self.evaluations += 1;

        let (catalog, profits) = (self.catalog, self.profits);
        let Some(own) = profits.profit(item) else {
            let error = ResolveError::NotInPriceTable {
                item: item.to_string(),
            };
            warn!(item = error.item(), "cannot calculate cumulative profit: {error}");
            self.cache
                .insert(item.to_string(), State::Done(Err(error.clone())));
            return Entered::Finished(Err(error));
        };

        match catalog.recipe(item) {
            Some(recipe) => {
                self.cache.insert(item.to_string(), State::Resolving);
                Entered::Pending(Frame {
                    item: item.to_string(),
                    recipe,
                    next: 0,
                    total: own,
                    overflowed: false,
                })
            }
            None => {
                // a root: nothing to add
                self.cache.insert(item.to_string(), State::Done(Ok(own)));
                Entered::Finished(Ok(own))
            }
        }
    }

    /// Fails every item on the stack with one shared cycle path and returns the error
    /// for the bottom one.
    fn fail_stack(&mut self, stack: &[Frame<'a>], path: Arc<[String]>) -> ResolveError {
        for frame in stack {
            let error = ResolveError::CyclicDependency {
                item: frame.item.clone(),
                path: Arc::clone(&path),
            };
            self.cache
                .insert(frame.item.clone(), State::Done(Err(error)));
        }
        let item = stack
            .first()
            .map(|frame| frame.item.clone())
            .unwrap_or_default();
        ResolveError::CyclicDependency { item, path }
    }
}

/// The cycle closed by meeting `material` again: from its frame up to the top, then
/// `material` once more.
fn cycle_path(stack: &[Frame<'_>], material: &str) -> Arc<[String]> {
    let start = stack
        .iter()
        .position(|frame| frame.item == material)
        .unwrap_or(0);
    stack[start..]
        .iter()
        .map(|frame| frame.item.clone())
        .chain(std::iter::once(material.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        cost::CostResolver,
        entities::{
            tests::{price, recipe},
            PriceRow, RecipeRow,
        },
    };

    fn tables(prices: Vec<PriceRow>, recipes: Vec<RecipeRow>) -> (Catalog, ProfitTable) {
        let (catalog, _) = Catalog::from_rows(prices, recipes);
        let profits = {
            let mut costs = CostResolver::new(&catalog, ["raw"]);
            ProfitTable::build(&catalog, &mut costs)
        };
        (catalog, profits)
    }

    #[test]
    fn worked_example() {
        let (catalog, profits) = tables(
            vec![
                price(2, "A", Some(10.0), Some(20.0), "raw"),
                price(3, "B", None, Some(100.0), "crafted"),
            ],
            vec![recipe(2, &["B", "A", "2"])],
        );
        let mut cumulative = CumulativeResolver::new(&catalog, &profits);
        assert_eq!(cumulative.cumulative("A"), Ok(Amount::new(10.0)));
        assert_eq!(cumulative.cumulative("B"), Ok(Amount::new(70.0)));
    }

    #[test]
    fn missing_material_poisons_cumulative() {
        let (catalog, profits) = tables(
            vec![price(2, "B", None, Some(100.0), "crafted")],
            vec![recipe(2, &["B", "C", "1"])],
        );
        let mut cumulative = CumulativeResolver::new(&catalog, &profits);
        assert_eq!(cumulative.cumulative("B"), Ok(Amount::UNSET));
        assert_eq!(
            cumulative.cumulative("C"),
            Err(ResolveError::NotInPriceTable { item: "C".into() })
        );
    }

    #[test]
    fn materials_are_not_weighted_by_quantity() {
        let (catalog, profits) = tables(
            vec![
                price(2, "Ore", Some(1.0), Some(3.0), "raw"),
                price(3, "Coal", Some(1.0), Some(2.0), "raw"),
                price(4, "Ingot", None, Some(50.0), "crafted"),
                price(5, "Sword", None, Some(500.0), "crafted"),
            ],
            vec![
                recipe(2, &["Ingot", "Ore", "5", "Coal", "3"]),
                recipe(3, &["Sword", "Ingot", "4", "Coal", "1"]),
            ],
        );
        // Ingot: 50 - (3*5 + 2*3) = 29, cumulative 29 + 2 + 1 = 32
        // Sword: 500 - (50*4 + 2*1) = 298, cumulative 298 + 32 + 1 = 331
        let mut cumulative = CumulativeResolver::new(&catalog, &profits);
        assert_eq!(cumulative.cumulative("Ingot"), Ok(Amount::new(32.0)));
        assert_eq!(cumulative.cumulative("Sword"), Ok(Amount::new(331.0)));
    }

    #[test]
    fn shared_materials_are_computed_once() {
        let (catalog, profits) = tables(
            vec![
                price(2, "Base", Some(1.0), Some(2.0), "raw"),
                price(3, "Left", Some(1.0), Some(2.0), "raw"),
                price(4, "Right", Some(1.0), Some(2.0), "raw"),
                price(5, "Top", Some(1.0), Some(2.0), "raw"),
            ],
            vec![
                recipe(2, &["Left", "Base", "1"]),
                recipe(3, &["Right", "Base", "1"]),
                recipe(4, &["Top", "Left", "1", "Right", "1"]),
            ],
        );
        let mut cumulative = CumulativeResolver::new(&catalog, &profits);
        let first = cumulative.resolve("Top");
        let second = cumulative.resolve("Top");
        assert_eq!(first, Amount::new(5.0));
        assert_eq!(first, second);
        assert_eq!(cumulative.evaluations(), 4);
    }

    #[test]
    fn cycles_fail_instead_of_producing_a_number() {
        let (catalog, profits) = tables(
            vec![
                price(2, "A", Some(1.0), Some(2.0), "raw"),
                price(3, "B", Some(1.0), Some(2.0), "raw"),
                price(4, "Top", Some(1.0), Some(2.0), "raw"),
                price(5, "Self", Some(1.0), Some(2.0), "raw"),
            ],
            vec![
                recipe(2, &["A", "B", "1"]),
                recipe(3, &["B", "A", "1"]),
                recipe(4, &["Top", "A", "1"]),
                recipe(5, &["Self", "Self", "1"]),
            ],
        );
        let mut cumulative = CumulativeResolver::new(&catalog, &profits);

        let path: Arc<[String]> = vec!["A".to_string(), "B".to_string(), "A".to_string()].into();
        assert_eq!(
            cumulative.cumulative("Top"),
            Err(ResolveError::CyclicDependency {
                item: "Top".into(),
                path: path.clone(),
            })
        );
        assert_eq!(
            cumulative.cumulative("B"),
            Err(ResolveError::CyclicDependency {
                item: "B".into(),
                path,
            })
        );
        assert!(cumulative.resolve("A").is_unset());
        assert!(matches!(
            cumulative.cumulative("Self"),
            Err(ResolveError::CyclicDependency { .. })
        ));
    }

    #[test]
    fn dependents_of_a_known_cycle_fail_too() {
        let (catalog, profits) = tables(
            vec![
                price(2, "A", Some(1.0), Some(2.0), "raw"),
                price(3, "B", Some(1.0), Some(2.0), "raw"),
                price(4, "Top", Some(1.0), Some(2.0), "raw"),
            ],
            vec![
                recipe(2, &["A", "B", "1"]),
                recipe(3, &["B", "A", "1"]),
                recipe(4, &["Top", "A", "1"]),
            ],
        );
        let mut cumulative = CumulativeResolver::new(&catalog, &profits);

        let Err(ResolveError::CyclicDependency { path: cycle, .. }) = cumulative.cumulative("A")
        else {
            panic!("A is on a cycle");
        };
        let Err(ResolveError::CyclicDependency { item, path }) = cumulative.cumulative("Top")
        else {
            panic!("Top depends on a cycle");
        };
        assert_eq!(item, "Top");
        assert!(Arc::ptr_eq(&path, &cycle));
        assert!(cumulative.resolve("Top").is_unset());
    }

    #[test]
    fn long_cycles_share_one_path() {
        const LEN: usize = 50_000;
        let prices = (0..LEN)
            .map(|i| price(i as u64, &format!("I{i}"), Some(0.0), Some(1.0), "raw"))
            .collect();
        let recipes = (0..LEN)
            .map(|i| {
                let (target, material) = (format!("I{i}"), format!("I{}", (i + 1) % LEN));
                recipe(i as u64, &[target.as_str(), material.as_str(), "1"])
            })
            .collect();
        let (catalog, profits) = tables(prices, recipes);

        let mut cumulative = CumulativeResolver::new(&catalog, &profits);
        let Err(ResolveError::CyclicDependency { path: first, .. }) = cumulative.cumulative("I0")
        else {
            panic!("I0 is on a cycle");
        };
        assert_eq!(first.len(), LEN + 1);
        let last = format!("I{}", LEN - 1);
        let Err(ResolveError::CyclicDependency { item, path }) = cumulative.cumulative(&last)
        else {
            panic!("{last} is on a cycle");
        };
        assert_eq!(item, last);
        assert!(Arc::ptr_eq(&first, &path));
    }

    #[test]
    fn overflowing_sum_fails_and_poisons_dependents() {
        let (catalog, profits) = tables(
            vec![
                price(2, "A", Some(0.0), Some(f64::MAX), "raw"),
                price(3, "C", Some(0.0), Some(f64::MAX), "raw"),
                price(4, "Top", Some(0.0), Some(f64::MAX), "raw"),
                price(5, "Crown", Some(0.0), Some(1.0), "raw"),
            ],
            vec![
                recipe(2, &["Top", "A", "1", "C", "1"]),
                recipe(3, &["Crown", "Top", "1"]),
            ],
        );
        let mut cumulative = CumulativeResolver::new(&catalog, &profits);
        assert_eq!(cumulative.cumulative("Crown"), Ok(Amount::UNSET));
        assert_eq!(
            cumulative.cumulative("Top"),
            Err(ResolveError::Overflow { item: "Top".into() })
        );
    }

    #[test]
    fn long_chains_do_not_overflow_the_stack() {
        const DEPTH: usize = 50_000;
        let prices = (0..=DEPTH)
            .map(|i| price(i as u64, &format!("I{i}"), Some(0.0), Some(1.0), "raw"))
            .collect();
        let recipes = (0..DEPTH)
            .map(|i| {
                let (target, material) = (format!("I{i}"), format!("I{}", i + 1));
                recipe(i as u64, &[target.as_str(), material.as_str(), "1"])
            })
            .collect();
        let (catalog, profits) = tables(prices, recipes);

        let mut cumulative = CumulativeResolver::new(&catalog, &profits);
        assert_eq!(
            cumulative.cumulative("I0"),
            Ok(Amount::new((DEPTH + 1) as f64))
        );
    }
}
