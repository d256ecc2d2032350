use crate::domain::model::ProductEntry;
use crate::domain::ports::CatalogResolver;
use crate::utils::error::{Result, ShelfError};
use crate::utils::validation::{validate_non_empty_string, Validate};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// 秤重板上的一個位置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanogramSlot {
    /// 秤重板回報的代碼，例如 `I9`
    pub position: String,
    pub shelf: Option<String>,
    pub product_id: String,
}

/// 目前上架的商品
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogProduct {
    pub product_id: String,
    pub name: Option<String>,
    /// 標稱重量 (g)
    pub grams: f64,
}

/// 位置表 + 商品表，組出 `ProductEntry`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Planogram {
    #[serde(default)]
    pub positions: Vec<PlanogramSlot>,
    #[serde(default)]
    pub products: Vec<CatalogProduct>,
}

impl Planogram {
    /// 依副檔名讀 TOML 或 JSON
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let planogram = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_str(&content)?,
            _ => Self::from_toml_str(&content)?,
        };
        tracing::debug!("Loaded planogram from {}", path.display());
        Ok(planogram)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// 換上最新的商品表 (例如從後台同步)
    pub fn with_products(mut self, products: Vec<CatalogProduct>) -> Self {
        self.products = products;
        self
    }

    fn find_slot(&self, position: &str, shelf: Option<&str>) -> Option<&PlanogramSlot> {
        let mut candidates = self.positions.iter().filter(|slot| slot.position == position);

        match shelf {
            Some(shelf) => {
                let candidates: Vec<&PlanogramSlot> = candidates.collect();
                candidates
                    .iter()
                    .find(|slot| slot.shelf.as_deref() == Some(shelf))
                    .or_else(|| candidates.iter().find(|slot| slot.shelf.is_none()))
                    .copied()
            }
            None => candidates.next(),
        }
    }
}

impl CatalogResolver for Planogram {
    fn resolve(&self, product: &str, shelf: Option<&str>) -> Option<ProductEntry> {
        let slot = self.find_slot(product, shelf)?;
        let catalog = self
            .products
            .iter()
            .find(|p| p.product_id == slot.product_id)?;

        Some(ProductEntry {
            product_id: catalog.product_id.clone(),
            name: catalog.name.clone(),
            shelf: slot.shelf.clone(),
            nominal_weight: catalog.grams,
        })
    }
}

impl Validate for Planogram {
    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for slot in &self.positions {
            validate_non_empty_string("positions.position", &slot.position)?;
            validate_non_empty_string("positions.product_id", &slot.product_id)?;
            if !seen.insert((slot.position.as_str(), slot.shelf.as_deref())) {
                return Err(ShelfError::InvalidConfigValueError {
                    field: "positions".to_string(),
                    value: slot.position.clone(),
                    reason: format!(
                        "duplicate position on shelf {}",
                        slot.shelf.as_deref().unwrap_or("N/A")
                    ),
                });
            }
        }

        for product in &self.products {
            if !(product.grams.is_finite() && product.grams > 0.0) {
                return Err(ShelfError::InvalidConfigValueError {
                    field: "products.grams".to_string(),
                    value: product.grams.to_string(),
                    reason: format!("nominal weight of '{}' must be positive", product.product_id),
                });
            }
        }

        for slot in &self.positions {
            if !self.products.iter().any(|p| p.product_id == slot.product_id) {
                tracing::warn!(
                    "Position {} points to unknown product '{}'",
                    slot.position,
                    slot.product_id
                );
            }
        }

        Ok(())
    }
}
