use serde::{Deserialize, Serialize};

use crate::catalog_page::ItemSummary;

/// Placeholder for a headline sub-field that could not be extracted.
pub const SENTINEL: &str = "N/A";

/// A catalog entry that passed the price filter and had its category resolved.
///
/// The serialized field names are consumed by downstream readers of
/// `books.json` and must not change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    #[serde(rename = "Título")]
    pub title: String,
    #[serde(rename = "Precio")]
    pub price: f64,
    #[serde(rename = "Categoría")]
    pub category: String,
    #[serde(rename = "URL de la imagen")]
    pub image_url: String,
}

impl CatalogItem {
    pub fn from_summary(summary: ItemSummary, category: String) -> Self {
        Self {
            title: summary.title,
            price: summary.price,
            category,
            image_url: summary.image_url.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Headline {
    pub title: String,
    pub score: u32,
    pub url: String,
}

impl Default for Headline {
    fn default() -> Self {
        Self {
            title: SENTINEL.to_string(),
            score: 0,
            url: SENTINEL.to_string(),
        }
    }
}
