//! Product listing: category filter and sort order, as the listing page applies them.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::error::StoreError;
use crate::core::types::Product;
use crate::store::catalog::matches_category;

/// Sort options offered on the listing page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOption {
    #[serde(rename = "price_asc")]
    PriceLowHigh,
    #[serde(rename = "price_desc")]
    PriceHighLow,
    #[serde(rename = "name_asc")]
    NameAZ,
    #[serde(rename = "rating_desc")]
    Rating,
}

impl SortOption {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PriceLowHigh => "price_asc",
            Self::PriceHighLow => "price_desc",
            Self::NameAZ => "name_asc",
            Self::Rating => "rating_desc",
        }
    }

    fn compare(&self, a: &Product, b: &Product) -> Ordering {
        match self {
            Self::PriceLowHigh => a.price.total_cmp(&b.price),
            Self::PriceHighLow => b.price.total_cmp(&a.price),
            Self::NameAZ => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            Self::Rating => b.rating.total_cmp(&a.rating),
        }
    }
}

impl fmt::Display for SortOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOption {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "price_asc" => Ok(Self::PriceLowHigh),
            "price_desc" => Ok(Self::PriceHighLow),
            "name_asc" => Ok(Self::NameAZ),
            "rating_desc" => Ok(Self::Rating),
            other => Err(StoreError::validation("sort", format!("Unknown sort option: {}", other))),
        }
    }
}

/// Filter by category (`None`/`"All"` keeps everything), then sort.
///
/// The sort is stable, so ties keep catalog order; no sort option keeps catalog order.
pub fn browse(products: &[Product], category: Option<&str>, sort: Option<SortOption>) -> Vec<Product> {
    let mut listing: Vec<Product> = products
        .iter()
        .filter(|product| matches_category(product, category))
        .cloned()
        .collect();

    if let Some(sort) = sort {
        listing.sort_by(|a, b| sort.compare(a, b));
    }
    listing
}

/// Distinct categories in catalog order, prefixed with `All`
pub fn categories(products: &[Product]) -> Vec<String> {
    let mut categories = vec![crate::store::catalog::ALL_CATEGORIES.to_string()];
    for product in products {
        if !categories.contains(&product.category) {
            categories.push(product.category.clone());
        }
    }
    categories
}
