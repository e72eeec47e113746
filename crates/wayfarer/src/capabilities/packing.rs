use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{parse_arguments, to_payload, Capability};
use crate::errors::AgentResult;
use crate::models::tool::Tool;

lazy_static! {
    static ref TEMPERATURE: Regex = Regex::new(r"-?\d+").unwrap();
}

const ESSENTIALS: [&str; 6] = [
    "passport",
    "phone charger",
    "underwear",
    "toothbrush",
    "toothpaste",
    "deodorant",
];

const COLD_MONTHS: [&str; 3] = ["december", "january", "february"];

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Outlook {
    pub cold: bool,
    pub rainy: bool,
}

/// Work out the expected weather, preferring an explicit weather description
/// over the travel month
pub fn outlook(month: Option<&str>, weather_context: Option<&str>) -> Outlook {
    let mut outlook = Outlook::default();

    // An empty description counts as none given
    if let Some(context) = weather_context.filter(|context| !context.is_empty()) {
        let lower = context.to_lowercase();
        outlook.rainy = lower.contains("rain") || lower.contains("shower");
        outlook.cold = lower.contains("snow") || lower.contains("cold");

        // e.g. "rainy, 8C"
        if let Some(temperature) = TEMPERATURE
            .find(context)
            .and_then(|m| m.as_str().parse::<i64>().ok())
        {
            if temperature < 10 {
                outlook.cold = true;
            }
        }
    } else if let Some(month) = month {
        // Northern hemisphere guess
        outlook.cold = COLD_MONTHS.contains(&month.to_lowercase().as_str());
    }

    outlook
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendations {
    pub essentials: Vec<String>,
    pub clothing: Vec<String>,
    pub gear: Vec<String>,
    pub notes: String,
}

fn extend(list: &mut Vec<String>, items: &[&str]) {
    list.extend(items.iter().map(|item| item.to_string()));
}

pub fn recommend(
    destination: &str,
    duration_days: i64,
    trip_type: &str,
    month: Option<&str>,
    weather_context: Option<&str>,
) -> Recommendations {
    let mut clothing = Vec::new();
    let mut gear = Vec::new();
    let expected = outlook(month, weather_context);

    if expected.cold {
        extend(
            &mut clothing,
            &["heavy coat", "scarf", "gloves", "thermal wear", "sweaters"],
        );
    } else {
        extend(&mut clothing, &["t-shirts", "light jacket"]);
    }

    if expected.rainy {
        clothing.push("raincoat".to_string());
        gear.push("umbrella".to_string());
    }

    let trip = trip_type.to_lowercase();
    if trip.contains("beach") {
        extend(&mut clothing, &["swimsuit", "flip-flops", "sun hat"]);
        extend(&mut gear, &["sunscreen", "beach towel", "sunglasses"]);
    } else if trip.contains("hike") || trip.contains("hiking") {
        extend(&mut clothing, &["hiking boots", "moisture-wicking socks"]);
        extend(
            &mut gear,
            &["water bottle", "backpack", "first-aid kit", "bug spray"],
        );
    } else if trip.contains("business") {
        extend(
            &mut clothing,
            &["blazer", "formal shoes", "dress shirts/blouses"],
        );
        extend(&mut gear, &["laptop", "business cards", "notebook"]);
    } else if trip.contains("snow") || trip.contains("ski") {
        extend(&mut clothing, &["ski jacket", "snow pants"]);
        extend(&mut gear, &["goggles"]);
    }

    // i64::MAX + 1 must fit
    clothing.push(format!(
        "{} sets of daily clothes",
        i128::from(duration_days) + 1
    ));

    Recommendations {
        essentials: ESSENTIALS.iter().map(|item| item.to_string()).collect(),
        clothing,
        gear,
        notes: format!(
            "Packing list generated for {} days in {} ({}).",
            duration_days, destination, trip_type
        ),
    }
}

#[derive(Debug, Deserialize)]
struct PackingArgs {
    destination: String,
    duration_days: i64,
    trip_type: String,
    #[serde(default)]
    month: Option<String>,
    #[serde(default)]
    weather_context: Option<String>,
}

#[derive(Debug, Serialize)]
struct PackingReport<'a> {
    destination: &'a str,
    trip_type: &'a str,
    recommendations: Recommendations,
}

pub struct PackingSuggestions {
    tool: Tool,
}

impl Default for PackingSuggestions {
    fn default() -> Self {
        Self::new()
    }
}

impl PackingSuggestions {
    pub fn new() -> Self {
        let tool = Tool::new(
            "get_packing_suggestions",
            "Generate a packing list based on destination, trip duration, activity type, and weather context.",
            json!({
                "type": "object",
                "properties": {
                    "destination": {
                        "type": "string",
                        "description": "The destination city or region."
                    },
                    "duration_days": {
                        "type": "integer",
                        "description": "Length of the trip in days.",
                        "minimum": 1
                    },
                    "trip_type": {
                        "type": "string",
                        "description": "The primary nature of the trip.",
                        "enum": ["business", "leisure", "beach", "hiking", "snow", "camping"]
                    },
                    "month": {
                        "type": "string",
                        "description": "The month of travel (to help estimate weather if not provided explicitly)."
                    },
                    "weather_context": {
                        "type": "string",
                        "description": "Current weather conditions known for the destination (e.g. 'rainy, 20C')."
                    }
                },
                "required": ["destination", "duration_days", "trip_type"]
            }),
        );
        Self { tool }
    }
}

#[async_trait]
impl Capability for PackingSuggestions {
    fn tool(&self) -> &Tool {
        &self.tool
    }

    async fn call(&self, arguments: Value) -> AgentResult<String> {
        let args: PackingArgs = parse_arguments(arguments)?;
        to_payload(&PackingReport {
            destination: &args.destination,
            trip_type: &args.trip_type,
            recommendations: recommend(
                &args.destination,
                args.duration_days,
                &args.trip_type,
                args.month.as_deref(),
                args.weather_context.as_deref(),
            ),
        })
    }
}
