//! Catalog data model and the wire envelopes of the catalog API.

use serde::{Deserialize, Serialize};

use super::params::SortOrder;

/// A single catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: u64,
    /// Ordinal number in the catalog; the sort key.
    pub number: u32,
    pub name: String,
    pub type_one: String,
    #[serde(default)]
    pub type_two: Option<String>,
    /// Sum of the six stats.
    pub total: u32,
    pub hit_points: u32,
    pub attack: u32,
    pub defense: u32,
    pub special_attack: u32,
    pub special_defense: u32,
    pub speed: u32,
    pub generation: u32,
    /// Rare flag.
    pub legendary: bool,
    #[serde(default)]
    pub captured: bool,
    #[serde(rename = "imageUrl", default)]
    pub image_url: String,
}

impl Item {
    /// Category tags, skipping an empty second type.
    pub fn types(&self) -> Vec<&str> {
        let mut types = vec![self.type_one.as_str()];
        if let Some(second) = self.type_two.as_deref().filter(|t| !t.is_empty()) {
            types.push(second);
        }
        types
    }

    /// The six stats in display order.
    pub fn stats(&self) -> [(&'static str, u32); 6] {
        [
            ("HP", self.hit_points),
            ("Attack", self.attack),
            ("Defense", self.defense),
            ("Sp. Atk", self.special_attack),
            ("Sp. Def", self.special_defense),
            ("Speed", self.speed),
        ]
    }
}

/// Pagination metadata returned alongside a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    /// Number of items in the filtered set.
    pub total: u32,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_prev: bool,
    /// Captured items across the whole catalog, not just this page.
    pub captured_count: u32,
}

/// Echo of the filter that produced a page.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FilterMetadata {
    #[serde(default)]
    pub sort: SortOrder,
    #[serde(rename = "type", default)]
    pub category: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
}

/// A successfully fetched page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub items: Vec<Item>,
    pub metadata: PageMetadata,
    pub filters: FilterMetadata,
}

/// Raw `GET /pokemon` body; success and failure share one shape.
#[derive(Debug, Clone, Deserialize)]
pub struct PageEnvelope {
    pub success: bool,
    #[serde(default)]
    pub data: Vec<Item>,
    #[serde(default)]
    pub pagination: Option<PageMetadata>,
    #[serde(default)]
    pub filters: Option<FilterMetadata>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(rename = "maxPage", default)]
    pub max_page: Option<u32>,
}

/// Raw `GET /pokemon/types` body.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoriesEnvelope {
    pub success: bool,
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Result of a capture or release call.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CaptureResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub captured: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// Generic `{success: false, error, maxPage?}` failure body.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorEnvelope {
    #[serde(default)]
    pub success: bool,
    pub error: String,
    #[serde(rename = "maxPage", default)]
    pub max_page: Option<u32>,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Build an item with deterministic stats derived from its id.
    pub fn item(id: u64) -> Item {
        let base = id as u32;
        Item {
            id,
            number: base,
            name: format!("Mon{id}"),
            type_one: "Grass".to_string(),
            type_two: None,
            total: base * 6,
            hit_points: base,
            attack: base,
            defense: base,
            special_attack: base,
            special_defense: base,
            speed: base,
            generation: 1,
            legendary: false,
            captured: false,
            image_url: format!("https://img.example/{id}.jpg"),
        }
    }

    /// Metadata for `page` of a set of `total_pages` pages of `limit` items.
    pub fn metadata(page: u32, total_pages: u32, limit: u32) -> PageMetadata {
        PageMetadata {
            total: total_pages * limit,
            page,
            limit,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1,
            captured_count: 0,
        }
    }

    /// Page `page` with ids `(page-1)*limit+1 ..= page*limit`.
    pub fn page(page: u32, total_pages: u32, limit: u32) -> Page {
        let start = u64::from((page - 1) * limit) + 1;
        let items = (start..start + u64::from(limit)).map(item).collect();
        Page {
            items,
            metadata: metadata(page, total_pages, limit),
            filters: FilterMetadata::default(),
        }
    }
}
