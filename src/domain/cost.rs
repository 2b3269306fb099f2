//! Production cost per item.
//!
//! Primary-production items (crops, trees, seafood, ...) carry their cost in the price
//! table. Everything else costs the sell price of its materials times the quantity
//! each recipe asks for.

use std::collections::{HashMap, HashSet};

use tracing::warn;

use super::{amount::Amount, entities::Catalog, errors::ResolveError};

/// Memoized cost lookup over one catalog.
pub struct CostResolver<'a> {
    catalog: &'a Catalog,
    primary_kinds: HashSet<String>,
    cache: HashMap<String, Result<Amount, ResolveError>>,
    evaluations: usize,
}

impl<'a> CostResolver<'a> {
    pub fn new<I, S>(catalog: &'a Catalog, primary_kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            catalog,
            primary_kinds: primary_kinds.into_iter().map(Into::into).collect(),
            cache: HashMap::new(),
            evaluations: 0,
        }
    }

    /// Cost of `item`, computed once and cached together with any failure.
    ///
    /// Failures are logged the first time they occur.
    pub fn cost(&mut self, item: &str) -> Result<Amount, ResolveError> {
        if let Some(cached) = self.cache.get(item) {
            return cached.clone();
        }

        self.evaluations += 1;
        let result = self.compute(item);
        if let Err(error) = &result {
            warn!(item = error.item(), "{error}");
        }
        self.cache.insert(item.to_string(), result.clone());
        result
    }

    /// Like [`cost`](Self::cost), with failures turned into an unset amount.
    pub fn resolve(&mut self, item: &str) -> Amount {
        self.cost(item).unwrap_or(Amount::UNSET)
    }

    pub fn is_primary(&self, kind: &str) -> bool {
        self.primary_kinds.contains(kind)
    }

    /// Number of times a cost was actually computed rather than read from the cache.
    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    fn compute(&self, item: &str) -> Result<Amount, ResolveError> {
        let record = self
            .catalog
            .price(item)
            .ok_or_else(|| ResolveError::NotInPriceTable {
                item: item.to_string(),
            })?;

        if self.is_primary(&record.kind) {
            return Ok(record.cost);
        }

        let recipe = self
            .catalog
            .recipe(item)
            .ok_or_else(|| ResolveError::NoRecipe {
                item: item.to_string(),
            })?;

        recipe
            .materials()
            .try_fold(Amount::ZERO, |total, (material, quantity)| {
                let price = self
                    .catalog
                    .price(material)
                    .ok_or_else(|| ResolveError::MaterialMissing {
                        item: item.to_string(),
                        material: material.to_string(),
                    })?
                    .price;
                if price.is_unset() {
                    return Err(ResolveError::MaterialPriceUnset {
                        item: item.to_string(),
                        material: material.to_string(),
                    });
                }
                price
                    .checked_mul(Amount::new(quantity))
                    .and_then(|line| total.checked_add(line))
                    .ok_or_else(|| ResolveError::Overflow {
                        item: item.to_string(),
                    })
            })
    }
}
