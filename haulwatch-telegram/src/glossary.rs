//! ati.su glossary dictionaries used to render human-readable names.
//!
//! The board ships static JSON dictionaries mapping car-type and cargo-type
//! ids to display names. They are fetched once at startup; a fetch failure
//! degrades to an empty glossary and raw ids in the rendered message.

use anyhow::Result;
use haulwatch_http::{HttpClient, RequestOpts};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Deserialize)]
pub struct GlossaryEntry {
    #[serde(rename = "Id")]
    pub id: Value,
    #[serde(rename = "Name")]
    pub name: String,
}

/// Id→name maps for the dictionaries the notification renderer consumes.
#[derive(Debug, Default, Clone)]
pub struct Glossary {
    car_types: HashMap<String, String>,
    cargo_types: HashMap<String, String>,
}

impl Glossary {
    pub fn from_entries(cars: Vec<GlossaryEntry>, cargos: Vec<GlossaryEntry>) -> Self {
        Self {
            car_types: into_map(cars),
            cargo_types: into_map(cargos),
        }
    }

    pub fn car_type_name(&self, id: &str) -> Option<&str> {
        self.car_types.get(id).map(String::as_str)
    }

    /// Cargo keys arrive as string or number; both index the same entry.
    pub fn cargo_name(&self, name_id: &Value) -> Option<&str> {
        self.cargo_types
            .get(&glossary_key(name_id))
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.car_types.is_empty() && self.cargo_types.is_empty()
    }
}

fn into_map(entries: Vec<GlossaryEntry>) -> HashMap<String, String> {
    entries
        .into_iter()
        .map(|e| (glossary_key(&e.id), e.name))
        .collect()
}

fn glossary_key(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub struct GlossaryClient {
    http: HttpClient,
}

impl GlossaryClient {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            http: HttpClient::new(base_url)?,
        })
    }

    pub async fn fetch(&self) -> Result<Glossary> {
        let cars: Vec<GlossaryEntry> = self
            .http
            .get_json("glossary/carTypesStringified.json", RequestOpts::default())
            .await?;
        let cargos: Vec<GlossaryEntry> = self
            .http
            .get_json("glossary/cargoTypes.json", RequestOpts::default())
            .await?;
        tracing::info!(
            car_types = cars.len(),
            cargo_types = cargos.len(),
            "glossary loaded"
        );
        Ok(Glossary::from_entries(cars, cargos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numeric_and_string_ids_share_a_key() {
        let glossary = Glossary::from_entries(
            vec![GlossaryEntry {
                id: json!("10"),
                name: "Тент".into(),
            }],
            vec![GlossaryEntry {
                id: json!(200),
                name: "Металл".into(),
            }],
        );
        assert_eq!(glossary.car_type_name("10"), Some("Тент"));
        assert_eq!(glossary.cargo_name(&json!(200)), Some("Металл"));
        assert_eq!(glossary.cargo_name(&json!("200")), Some("Металл"));
        assert!(glossary.cargo_name(&json!(999)).is_none());
    }
}
