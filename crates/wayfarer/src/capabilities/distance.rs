use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{parse_arguments, to_payload, Capability};
use crate::errors::AgentResult;
use crate::models::tool::Tool;

/// FNV-1a 64-bit hash
///
/// Stable across processes and platforms, so estimated distances stay the same
/// from one run to the next.
pub fn fnv1a64(s: &str) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;
    let mut hash = OFFSET_BASIS;
    for b in s.as_bytes() {
        hash ^= *b as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Average speed in km/h for a transport mode, driving for anything unknown
pub fn average_speed(mode: &str) -> f64 {
    match mode {
        "walking" => 5.0,
        "transit" => 50.0,
        "bicycling" => 15.0,
        _ => 60.0,
    }
}

/// Estimated distance in km for a pair missing from the route table
pub fn estimated_distance_km(origin: &str, destination: &str) -> u64 {
    fnv1a64(&format!("{}{}", origin, destination)) % 1000 + 50
}

/// Render a duration in hours as whole hours and whole minutes
pub fn format_duration(hours: f64) -> String {
    let whole = hours.trunc();
    let minutes = ((hours - whole) * 60.0).trunc();
    format!("{}h {}m", whole as u64, minutes as u64)
}

struct Route {
    distance: &'static str,
    driving: &'static str,
    other: &'static str,
}

fn known_route(origin: &str, destination: &str) -> Option<Route> {
    match (origin, destination) {
        ("london", "paris") | ("paris", "london") => Some(Route {
            distance: "450 km",
            driving: "5h 30m",
            other: "2h 20m",
        }),
        ("new york", "washington") => Some(Route {
            distance: "360 km",
            driving: "4h 00m",
            other: "4h 00m",
        }),
        _ => None,
    }
}

#[derive(Debug, Serialize)]
struct KnownRouteReport<'a> {
    origin: &'a str,
    destination: &'a str,
    mode: &'a str,
    distance: &'static str,
    time: &'static str,
}

#[derive(Debug, Serialize)]
struct EstimatedRouteReport<'a> {
    origin: &'a str,
    destination: &'a str,
    mode: &'a str,
    distance: String,
    travel_time: String,
}

pub fn travel_distance(origin: &str, destination: &str, mode: &str) -> AgentResult<String> {
    if let Some(route) = known_route(&origin.to_lowercase(), &destination.to_lowercase()) {
        return to_payload(&KnownRouteReport {
            origin,
            destination,
            mode,
            distance: route.distance,
            time: if mode == "driving" {
                route.driving
            } else {
                route.other
            },
        });
    }

    let distance = estimated_distance_km(origin, destination);
    to_payload(&EstimatedRouteReport {
        origin,
        destination,
        mode,
        distance: format!("{} km", distance),
        travel_time: format_duration(distance as f64 / average_speed(mode)),
    })
}

fn default_mode() -> String {
    "driving".to_string()
}

#[derive(Debug, Deserialize)]
struct DistanceArgs {
    origin: String,
    destination: String,
    #[serde(default = "default_mode")]
    mode: String,
}

pub struct CalculateTravelDistance {
    tool: Tool,
}

impl Default for CalculateTravelDistance {
    fn default() -> Self {
        Self::new()
    }
}

impl CalculateTravelDistance {
    pub fn new() -> Self {
        let tool = Tool::new(
            "calculate_travel_distance",
            "Calculate the distance and estimated travel time between two locations.",
            json!({
                "type": "object",
                "properties": {
                    "origin": {
                        "type": "string",
                        "description": "Starting location (city/address)."
                    },
                    "destination": {
                        "type": "string",
                        "description": "Ending location (city/address)."
                    },
                    "mode": {
                        "type": "string",
                        "description": "Mode of transport.",
                        "enum": ["driving", "walking", "transit", "bicycling"]
                    }
                },
                "required": ["origin", "destination"]
            }),
        );
        Self { tool }
    }
}

#[async_trait]
impl Capability for CalculateTravelDistance {
    fn tool(&self) -> &Tool {
        &self.tool
    }

    async fn call(&self, arguments: Value) -> AgentResult<String> {
        let args: DistanceArgs = parse_arguments(arguments)?;
        travel_distance(&args.origin, &args.destination, &args.mode)
    }
}
