use std::collections::{hash_map::Entry, HashMap};

use tracing::{debug, warn};

use super::{amount::Amount, errors::RowWarning};

/// One parsed line of the price table.
#[derive(Clone, Debug, PartialEq)]
pub struct PriceRow {
    /// Source line, for diagnostics.
    pub line: u64,
    pub name: String,
    pub cost: Amount,
    pub price: Amount,
    pub kind: String,
}

/// One line of the recipe table: `target, material, quantity, material, quantity, ...`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecipeRow {
    pub line: u64,
    pub fields: Vec<String>,
}

/// Price table entry for a single item.
#[derive(Clone, Debug, PartialEq)]
pub struct PriceRecord {
    /// Production cost, only meaningful for primary-production kinds.
    pub cost: Amount,
    /// Sell price.
    pub price: Amount,
    /// Category label, e.g. a crop or a crafted good.
    pub kind: String,
}

/// Materials needed to craft one item, in the order they were listed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Recipe {
    materials: Vec<(String, f64)>,
}

impl Recipe {
    /// Adds a material; listing the same material again replaces its quantity.
    pub fn with_material(mut self, material: impl Into<String>, quantity: f64) -> Self {
        let material = material.into();
        match self.materials.iter_mut().find(|(name, _)| *name == material) {
            Some(existing) => existing.1 = quantity,
            None => self.materials.push((material, quantity)),
        }
        self
    }

    pub fn materials(&self) -> impl Iterator<Item = (&str, f64)> {
        self.materials.iter().map(|(name, qty)| (name.as_str(), *qty))
    }

    pub fn material(&self, index: usize) -> Option<(&str, f64)> {
        self.materials
            .get(index)
            .map(|(name, qty)| (name.as_str(), *qty))
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}

/// Prices and recipes for a whole run. Read-only once built.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    prices: HashMap<String, PriceRecord>,
    /// Price table order, used for the report.
    order: Vec<String>,
    recipes: HashMap<String, Recipe>,
}

impl Catalog {
    /// Builds a catalog, skipping malformed rows.
    ///
    /// Every skipped row is logged and returned so callers can count or display them.
    pub fn from_rows<P, R>(price_rows: P, recipe_rows: R) -> (Self, Vec<RowWarning>)
    where
        P: IntoIterator<Item = PriceRow>,
        R: IntoIterator<Item = RecipeRow>,
    {
        let mut catalog = Catalog::default();
        let mut warnings = Vec::new();

        for row in price_rows {
            if let Err(warning) = catalog.insert_price_row(row) {
                warn!("skip price row: {warning}");
                warnings.push(warning);
            }
        }
        for row in recipe_rows {
            if let Err(warning) = catalog.insert_recipe_row(row) {
                warn!("skip recipe row: {warning}");
                warnings.push(warning);
            }
        }

        debug!(
            items = catalog.order.len(),
            recipes = catalog.recipes.len(),
            skipped = warnings.len(),
            "catalog loaded"
        );
        (catalog, warnings)
    }

    fn insert_price_row(&mut self, row: PriceRow) -> Result<(), RowWarning> {
        let name = row.name.trim();
        if name.is_empty() {
            return Err(RowWarning::EmptyName { line: row.line });
        }

        let record = PriceRecord {
            cost: row.cost,
            price: row.price,
            kind: row.kind.trim().to_string(),
        };
        match self.prices.entry(name.to_string()) {
            Entry::Occupied(mut slot) => {
                warn!("line {}: {name} listed twice, later row wins", row.line);
                slot.insert(record);
            }
            Entry::Vacant(slot) => {
                self.order.push(name.to_string());
                slot.insert(record);
            }
        }
        Ok(())
    }

    fn insert_recipe_row(&mut self, row: RecipeRow) -> Result<(), RowWarning> {
        let fields: Vec<&str> = row
            .fields
            .iter()
            .map(|field| field.trim())
            .filter(|field| !field.is_empty())
            .collect();

        let Some((target, rest)) = fields.split_first() else {
            // blank line
            return Ok(());
        };
        if rest.is_empty() {
            return Err(RowWarning::NoMaterials {
                line: row.line,
                target: target.to_string(),
            });
        }
        if rest.len() % 2 != 0 {
            return Err(RowWarning::UnpairedField {
                line: row.line,
                target: target.to_string(),
            });
        }

        let mut recipe = Recipe::default();
        for pair in rest.chunks_exact(2) {
            let (material, value) = (pair[0], pair[1]);
            let quantity = value
                .parse::<f64>()
                .ok()
                .filter(|qty| qty.is_finite() && *qty > 0.0)
                .ok_or_else(|| RowWarning::BadQuantity {
                    line: row.line,
                    target: target.to_string(),
                    material: material.to_string(),
                    value: value.to_string(),
                })?;
            recipe = recipe.with_material(material, quantity);
        }

        if self.recipes.insert(target.to_string(), recipe).is_some() {
            debug!("line {}: recipe for {target} replaced", row.line);
        }
        Ok(())
    }

    pub fn price(&self, item: &str) -> Option<&PriceRecord> {
        self.prices.get(item)
    }

    pub fn recipe(&self, item: &str) -> Option<&Recipe> {
        self.recipes.get(item)
    }

    /// Price table entries in their original order.
    pub fn items(&self) -> impl Iterator<Item = (&str, &PriceRecord)> {
        self.order
            .iter()
            .filter_map(|name| self.prices.get(name).map(|record| (name.as_str(), record)))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
