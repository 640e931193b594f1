//! Typed model of the ati.su loads-search response body.
//!
//! The upstream payload is a loosely-typed JSON object with a `loads` array.
//! The fields the watcher and the notification renderer actually consume are
//! modeled explicitly; everything else is preserved in a flattened `extra`
//! bag so new upstream fields survive a round trip without code changes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Opaque posting identifier. The upstream sends either a string or a
/// number; it is only ever compared for equality, never parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LoadId {
    Str(String),
    Num(serde_json::Number),
}

impl std::fmt::Display for LoadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadId::Str(s) => f.write_str(s),
            LoadId::Num(n) => write!(f, "{n}"),
        }
    }
}

/// One freight posting from the search listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadItem {
    pub id: LoadId,
    /// Present on promoted/sponsored listings. Promoted loads are pinned to
    /// the top of the listing regardless of recency, so they are excluded
    /// from freshness decisions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loading: Option<Loading>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<Route>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub truck: Option<Truck>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate: Option<Rate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firm: Option<Firm>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl LoadItem {
    pub fn is_promoted(&self) -> bool {
        self.priority.is_some()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Loading {
    #[serde(default)]
    pub first_date: Option<String>,
    #[serde(default)]
    pub loading_cargos: Vec<CargoRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CargoRef {
    /// Glossary key into the cargo-type dictionary; string or number upstream.
    pub name_id: Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    #[serde(default)]
    pub distance: Option<Value>,
    #[serde(default)]
    pub distance_tooltip: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Truck {
    /// Glossary keys into the car-type dictionary.
    #[serde(default)]
    pub car_types: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rate {
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub price_nds: f64,
    #[serde(default)]
    pub price_no_nds: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Firm {
    #[serde(default)]
    pub rating: Option<Rating>,
    #[serde(default)]
    pub contacts: Vec<Contact>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    #[serde(default)]
    pub score: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phones: Vec<Phone>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phone {
    #[serde(default)]
    pub number: Option<Value>,
}

/// The whole search response body: `{ "loads": [...] }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchPayload {
    pub loads: Vec<LoadItem>,
}

impl SearchPayload {
    /// The freshest organic posting: the first entry that does not carry the
    /// promoted marker. `None` when the listing is all promoted (or empty).
    pub fn first_organic(&self) -> Option<&LoadItem> {
        self.loads.iter().find(|l| !l.is_promoted())
    }
}
