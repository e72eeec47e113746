use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{parse_arguments, to_payload, Capability};
use crate::errors::AgentResult;
use crate::models::tool::Tool;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attraction {
    pub name: String,
    pub category: &'static str,
    pub rating: f64,
    pub price: &'static str,
    pub description: &'static str,
}

struct Entry {
    name: &'static str,
    category: &'static str,
    rating: f64,
    price: &'static str,
    description: &'static str,
}

const fn entry(
    name: &'static str,
    category: &'static str,
    rating: f64,
    price: &'static str,
    description: &'static str,
) -> Entry {
    Entry {
        name,
        category,
        rating,
        price,
        description,
    }
}

// Keyed by lowercase city name, searched in this order
const CATALOG: &[(&str, [Entry; 3])] = &[
    (
        "paris",
        [
            entry("Eiffel Tower", "landmark", 4.8, "moderate", "Iconic iron lady."),
            entry("Louvre Museum", "museum", 4.9, "moderate", "World's largest art museum."),
            entry("Le Jules Verne", "restaurant", 4.6, "expensive", "Dining on the Eiffel Tower."),
        ],
    ),
    (
        "london",
        [
            entry("British Museum", "museum", 4.8, "cheap", "Human history and culture."),
            entry("The Shard", "landmark", 4.7, "expensive", "Skyscraper with a view."),
            entry("Hyde Park", "park", 4.9, "cheap", "Major park in Central London."),
        ],
    ),
    (
        "new york",
        [
            entry("Statue of Liberty", "landmark", 4.8, "moderate", "Symbol of freedom."),
            entry("Central Park", "park", 4.9, "cheap", "Urban oasis."),
            entry("The Met", "museum", 4.9, "moderate", "Metropolitan Museum of Art."),
        ],
    ),
];

impl From<&Entry> for Attraction {
    fn from(entry: &Entry) -> Self {
        Attraction {
            name: entry.name.to_string(),
            category: entry.category,
            rating: entry.rating,
            price: entry.price,
            description: entry.description,
        }
    }
}

/// Placeholder attractions for places missing from the catalog
fn generic_attractions(location: &str) -> Vec<Attraction> {
    vec![
        Attraction {
            name: format!("{} City Museum", location),
            category: "museum",
            rating: 4.5,
            price: "moderate",
            description: "Local history museum.",
        },
        Attraction {
            name: format!("The Grand {} Park", location),
            category: "park",
            rating: 4.7,
            price: "cheap",
            description: "Beautiful city park.",
        },
        Attraction {
            name: format!("{} Tower", location),
            category: "landmark",
            rating: 4.6,
            price: "expensive",
            description: "City viewpoint.",
        },
    ]
}

/// Catalog entries for the first city whose key contains, or is contained in,
/// the lowercased query
fn candidates(location: &str) -> Vec<Attraction> {
    let query = location.to_lowercase();
    CATALOG
        .iter()
        .find(|(city, _)| query.contains(city) || city.contains(query.as_str()))
        .map(|(_, entries)| entries.iter().map(Attraction::from).collect())
        .unwrap_or_else(|| generic_attractions(location))
}

pub fn search(
    location: &str,
    category: &str,
    price_range: Option<&str>,
    min_rating: f64,
) -> Vec<Attraction> {
    let category = category.to_lowercase();
    let price_range = price_range.filter(|price| !price.is_empty());
    candidates(location)
        .into_iter()
        .filter(|item| item.category.contains(category.as_str()))
        .filter(|item| price_range.map_or(true, |price| item.price == price))
        .filter(|item| item.rating >= min_rating)
        .collect()
}

#[derive(Debug, Deserialize)]
struct SearchArgs {
    location: String,
    category: String,
    #[serde(default)]
    price_range: Option<String>,
    #[serde(default)]
    min_rating: Option<f64>,
}

#[derive(Debug, Serialize)]
struct SearchReport<'a> {
    location: &'a str,
    results: Vec<Attraction>,
}

pub struct SearchAttractions {
    tool: Tool,
}

impl Default for SearchAttractions {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchAttractions {
    pub fn new() -> Self {
        let tool = Tool::new(
            "search_attractions",
            "Find tourist attractions, restaurants, or activities in a specific area.",
            json!({
                "type": "object",
                "properties": {
                    "location": {
                        "type": "string",
                        "description": "The city or area to search in."
                    },
                    "category": {
                        "type": "string",
                        "description": "Type of places to search for.",
                        "enum": ["museum", "park", "restaurant", "landmark", "activity", "shopping"]
                    },
                    "price_range": {
                        "type": "string",
                        "description": "Optional price filter.",
                        "enum": ["cheap", "moderate", "expensive"]
                    },
                    "min_rating": {
                        "type": "number",
                        "description": "Minimum rating (0-5) to filter results.",
                        "minimum": 0,
                        "maximum": 5
                    }
                },
                "required": ["location", "category"]
            }),
        );
        Self { tool }
    }
}

#[async_trait]
impl Capability for SearchAttractions {
    fn tool(&self) -> &Tool {
        &self.tool
    }

    async fn call(&self, arguments: Value) -> AgentResult<String> {
        let args: SearchArgs = parse_arguments(arguments)?;
        let results = search(
            &args.location,
            &args.category,
            args.price_range.as_deref(),
            args.min_rating.unwrap_or(0.0),
        );
        to_payload(&SearchReport {
            location: &args.location,
            results,
        })
    }
}
