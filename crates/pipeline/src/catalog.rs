//! The topic catalog: an ordered mapping of category key to category.
//!
//! The order of categories is the rotation order and must be the key order of
//! the JSON document, so the catalog is held as a `Vec` and (de)serialised as
//! a JSON object by hand instead of going through a sorted or hashed map.
//! Duplicate category keys, and topics repeated within a category (ignoring
//! case), make the document invalid.
//!
//! ```json
//! { "beaches": { "name": "Beaches", "topics": ["Valtos Beach", "..."] }, "...": {} }
//! ```

use std::collections::HashSet;
use std::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::identifiers::CategoryKey;

/// One category of the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    /// Stable key (the JSON object key).
    pub key: CategoryKey,
    /// Display name reported alongside selected topics.
    pub name: String,
    /// Topics in selection order.
    pub topics: Vec<String>,
}

impl Category {
    /// Creates a category. `topics` is taken as-is.
    pub fn new(key: CategoryKey, name: impl Into<String>, topics: Vec<String>) -> Self {
        Self {
            key,
            name: name.into(),
            topics,
        }
    }

    /// Case-insensitive membership test.
    pub fn contains_topic(&self, topic: &str) -> bool {
        let wanted = topic.to_lowercase();
        self.topics.iter().any(|t| t.to_lowercase() == wanted)
    }

    /// Appends `topic` unless an equal topic (ignoring case) is already present.
    ///
    /// Returns `true` if the topic was added.
    pub fn add_topic(&mut self, topic: impl Into<String>) -> bool {
        let topic = topic.into();
        if self.contains_topic(&topic) {
            return false;
        }
        self.topics.push(topic);
        true
    }
}

/// Ordered collection of categories.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopicCatalog {
    categories: Vec<Category>,
}

impl TopicCatalog {
    /// Builds a catalog from categories in rotation order.
    ///
    /// Returns `None` if two categories share a key.
    pub fn from_categories(categories: Vec<Category>) -> Option<Self> {
        let mut catalog = Self::default();
        for category in categories {
            if catalog.category(category.key.as_str()).is_some() {
                return None;
            }
            catalog.categories.push(category);
        }
        Some(catalog)
    }

    /// The catalog seeded on first run.
    pub fn seeded() -> Self {
        let categories = SEED_CATALOG
            .iter()
            .filter_map(|(key, name, topics)| {
                let key = CategoryKey::new(*key)?;
                let topics = topics.iter().map(|t| (*t).to_owned()).collect();
                Some(Category::new(key, *name, topics))
            })
            .collect();
        Self { categories }
    }

    /// Categories in rotation order.
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Number of categories.
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// Returns `true` if there are no categories.
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Looks up a category by key.
    pub fn category(&self, key: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.key.as_str() == key)
    }

    /// Looks up a category by key, mutably.
    pub fn category_mut(&mut self, key: &str) -> Option<&mut Category> {
        self.categories.iter_mut().find(|c| c.key.as_str() == key)
    }

    /// Display name of the first category containing `topic` (ignoring case).
    pub fn category_name_for(&self, topic: &str) -> Option<&str> {
        self.categories
            .iter()
            .find(|c| c.contains_topic(topic))
            .map(|c| c.name.as_str())
    }

    /// Total number of topics across all categories.
    pub fn topic_count(&self) -> usize {
        self.categories.iter().map(|c| c.topics.len()).sum()
    }
}

// ---------------------------------------------------------------------------
// Serde
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct CategoryBodyRef<'a> {
    name: &'a str,
    topics: &'a [String],
}

#[derive(Deserialize)]
struct CategoryBody {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    topics: Vec<String>,
}

impl Serialize for TopicCatalog {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.categories.len()))?;
        for category in &self.categories {
            map.serialize_entry(
                category.key.as_str(),
                &CategoryBodyRef {
                    name: &category.name,
                    topics: &category.topics,
                },
            )?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for TopicCatalog {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(CatalogVisitor)
    }
}

struct CatalogVisitor;

impl<'de> Visitor<'de> for CatalogVisitor {
    type Value = TopicCatalog;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an object mapping category keys to {name, topics}")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut categories: Vec<Category> = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((key, body)) = map.next_entry::<String, CategoryBody>()? {
            let key = CategoryKey::new(key)
                .ok_or_else(|| de::Error::custom("category key must not be empty"))?;
            if categories.iter().any(|c| c.key == key) {
                return Err(de::Error::custom(format!("duplicate category key `{key}`")));
            }
            if let Some(topic) = first_repeated_topic(&body.topics) {
                return Err(de::Error::custom(format!(
                    "duplicate topic `{topic}` in category `{key}`"
                )));
            }
            let name = body.name.unwrap_or_else(|| key.as_str().to_owned());
            categories.push(Category::new(key, name, body.topics));
        }
        Ok(TopicCatalog { categories })
    }
}

fn first_repeated_topic(topics: &[String]) -> Option<&str> {
    let mut seen = HashSet::new();
    topics
        .iter()
        .find(|topic| !seen.insert(topic.to_lowercase()))
        .map(String::as_str)
}

// ---------------------------------------------------------------------------
// Seed data
// ---------------------------------------------------------------------------

const SEED_CATALOG: &[(&str, &str, &[&str])] = &[
    (
        "beaches",
        "Beaches",
        &[
            "Valtos Beach",
            "Lichnos Beach",
            "Sarakiniko Beach",
            "Piso Krioneri",
            "Ai Giannakis Beach",
        ],
    ),
    (
        "restaurants_food",
        "Restaurants & Food",
        &[
            "Traditional tavernas in Parga",
            "Local cuisine guide to Parga",
            "Seafood specialties in Parga",
        ],
    ),
    (
        "attractions",
        "Attractions",
        &[
            "Parga Castle",
            "Ali Pasha's Castle in Parga",
            "Nekromanteion of Acheron",
        ],
    ),
    (
        "activities",
        "Activities",
        &[
            "Boat trips to Paxos and Antipaxos from Parga",
            "Kayaking in Parga",
            "Hiking trails near Parga",
            "Snorkeling spots in Parga",
        ],
    ),
    (
        "day_trips",
        "Day Trips",
        &[
            "Day trip to Sivota from Parga",
            "Day trip to Ioannina from Parga",
            "Day trip to Meteora from Parga",
            "Acheron River rafting",
            "Day trip to Preveza from Parga",
        ],
    ),
    (
        "practical_guides",
        "Practical Guides",
        &[
            "Getting to Parga",
            "Best time to visit Parga",
            "Local transportation in Parga",
            "Accommodation tips for Parga",
        ],
    ),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_key_order_is_kept() {
        let json = r#"{
            "zeta": {"name": "Zeta", "topics": ["z1"]},
            "alpha": {"name": "Alpha", "topics": ["a1", "a2"]},
            "mid": {"topics": []}
        }"#;
        let catalog: TopicCatalog = serde_json::from_str(json).unwrap();
        let keys: Vec<&str> = catalog.categories().iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
        assert_eq!(catalog.category("mid").unwrap().name, "mid");

        let written = serde_json::to_string(&catalog).unwrap();
        assert!(written.find("zeta").unwrap() < written.find("alpha").unwrap());
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let json = r#"{"a": {"name": "A", "topics": []}, "a": {"name": "B", "topics": []}}"#;
        let err = serde_json::from_str::<TopicCatalog>(json).unwrap_err();
        assert!(err.to_string().contains("duplicate category key"));
    }

    #[test]
    fn topics_repeated_within_a_category_are_rejected() {
        let json = r#"{"beaches": {"name": "Beaches", "topics": ["Valtos Beach", "VALTOS beach"]}}"#;
        let err = serde_json::from_str::<TopicCatalog>(json).unwrap_err();
        assert!(err.to_string().contains("duplicate topic `VALTOS beach` in category `beaches`"));

        let json = r#"{"a": {"topics": ["Parga Castle"]}, "b": {"topics": ["Parga Castle"]}}"#;
        assert!(serde_json::from_str::<TopicCatalog>(json).is_ok());
    }

    #[test]
    fn add_topic_ignores_case_duplicates() {
        let mut catalog = TopicCatalog::seeded();
        let beaches = catalog.category_mut("beaches").unwrap();
        assert!(!beaches.add_topic("valtos beach"));
        assert!(beaches.add_topic("Kryoneri Beach"));
        assert_eq!(beaches.topics.last().map(String::as_str), Some("Kryoneri Beach"));
    }

    #[test]
    fn seeded_catalog_has_six_categories_in_order() {
        let catalog = TopicCatalog::seeded();
        assert_eq!(catalog.len(), 6);
        assert_eq!(catalog.categories()[0].key.as_str(), "beaches");
        assert_eq!(catalog.categories()[5].name, "Practical Guides");
        assert_eq!(catalog.topic_count(), 24);
        assert_eq!(catalog.category_name_for("PARGA CASTLE"), Some("Attractions"));
    }
}
