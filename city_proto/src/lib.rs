//! Wire contracts for the city builder automation protocol.
//!
//! Every exchange is one JSON object in each direction: the client sends a
//! [`Request`] tagged by its `action` field and the engine answers with a
//! [`Response`] carrying `status`, an optional `message`, and whatever
//! action-specific fields the engine chose to include.

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub mod command_text;

pub use command_text::{parse_repl_line, CommandParseError, ReplCommand};

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 5050;
/// Camera zoom used when a focus command does not name one.
pub const DEFAULT_ZOOM: i32 = 5;

pub const STATUS_SUCCESS: &str = "success";
pub const STATUS_ERROR: &str = "error";

/// Building kinds the engine knows how to place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildingType {
    House,
    Road,
    PowerPlant,
    Economic,
}

impl BuildingType {
    pub fn as_str(self) -> &'static str {
        match self {
            BuildingType::House => "House",
            BuildingType::Road => "Road",
            BuildingType::PowerPlant => "PowerPlant",
            BuildingType::Economic => "Economic",
        }
    }
}

impl fmt::Display for BuildingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown building type '{0}'")]
pub struct UnknownBuildingType(pub String);

impl FromStr for BuildingType {
    type Err = UnknownBuildingType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "house" => Ok(BuildingType::House),
            "road" => Ok(BuildingType::Road),
            "powerplant" | "power_plant" => Ok(BuildingType::PowerPlant),
            "economic" => Ok(BuildingType::Economic),
            other => Err(UnknownBuildingType(other.to_string())),
        }
    }
}

/// A single command for the engine.
///
/// Field names follow the engine's JSON schema, including its quirks: the
/// upgrade level and the camera zoom both travel in the `Upgrade` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Request {
    PlaceBuilding {
        /// Forwarded verbatim; the engine matches it case-insensitively.
        #[serde(rename = "buildingType")]
        building_type: String,
        x: i32,
        y: i32,
        #[serde(rename = "LLMReasoning", default)]
        reasoning: String,
    },
    Demolish {
        x: i32,
        y: i32,
    },
    Upgrade {
        x: i32,
        y: i32,
        #[serde(rename = "Upgrade")]
        level: i32,
    },
    GetStats,
    GetMap,
    GetBuildingsData,
    FocusPosition {
        x: i32,
        y: i32,
        #[serde(rename = "Upgrade")]
        zoom: i32,
    },
}

impl Request {
    pub fn place_building(
        building_type: impl Into<String>,
        x: i32,
        y: i32,
        reasoning: impl Into<String>,
    ) -> Self {
        Request::PlaceBuilding {
            building_type: building_type.into(),
            x,
            y,
            reasoning: reasoning.into(),
        }
    }

    pub fn action(&self) -> &'static str {
        match self {
            Request::PlaceBuilding { .. } => "place_building",
            Request::Demolish { .. } => "demolish",
            Request::Upgrade { .. } => "upgrade",
            Request::GetStats => "get_stats",
            Request::GetMap => "get_map",
            Request::GetBuildingsData => "get_buildings_data",
            Request::FocusPosition { .. } => "focus_position",
        }
    }

    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

#[derive(Debug, Error)]
pub enum ResponseError {
    #[error("invalid response JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("response is not a JSON object")]
    NotAnObject,
    #[error("malformed {view} response: {source}")]
    View {
        view: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Engine reply, kept exactly as received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Response(Map<String, Value>);

impl Response {
    pub fn from_value(value: Value) -> Result<Self, ResponseError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            _ => Err(ResponseError::NotAnObject),
        }
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, ResponseError> {
        let value: Value = serde_json::from_slice(bytes)?;
        Self::from_value(value)
    }

    /// Client-side failure in the same shape the engine uses.
    pub fn error(message: impl Into<String>) -> Self {
        let mut map = Map::new();
        map.insert("status".into(), Value::String(STATUS_ERROR.into()));
        map.insert("message".into(), Value::String(message.into()));
        Self(map)
    }

    pub fn status(&self) -> Option<&str> {
        self.0.get("status").and_then(Value::as_str)
    }

    pub fn is_success(&self) -> bool {
        self.status() == Some(STATUS_SUCCESS)
    }

    pub fn message(&self) -> Option<&str> {
        self.0.get("message").and_then(Value::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Integer field such as `refund` or `cost`, falling back when absent.
    pub fn int_or(&self, key: &str, default: i64) -> i64 {
        self.0.get(key).and_then(Value::as_i64).unwrap_or(default)
    }

    pub fn as_object(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    pub fn stats(&self) -> Result<CityStats, ResponseError> {
        self.decode_view("stats")
    }

    pub fn map_info(&self) -> Result<MapInfo, ResponseError> {
        self.decode_view("map")
    }

    pub fn buildings(&self) -> Result<Vec<BuildingRecord>, ResponseError> {
        let payload: BuildingsPayload = self.decode_view("buildings")?;
        Ok(payload.buildings)
    }

    fn decode_view<T: DeserializeOwned>(&self, view: &'static str) -> Result<T, ResponseError> {
        serde_json::from_value(Value::Object(self.0.clone()))
            .map_err(|source| ResponseError::View { view, source })
    }
}

impl From<Response> for Value {
    fn from(response: Response) -> Self {
        response.into_value()
    }
}

/// City economy as reported by `get_stats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityStats {
    pub population: i64,
    pub power: i64,
    pub money: i64,
    pub income: i64,
}

/// Map extent as reported by `get_map`. Bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapInfo {
    pub width: i32,
    pub height: i32,
    pub min_x: i32,
    pub max_x: i32,
    pub min_y: i32,
    pub max_y: i32,
    pub center_x: i32,
    pub center_y: i32,
}

impl MapInfo {
    pub fn contains_x(&self, x: i32) -> bool {
        (self.min_x..=self.max_x).contains(&x)
    }

    pub fn contains_y(&self, y: i32) -> bool {
        (self.min_y..=self.max_y).contains(&y)
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.contains_x(x) && self.contains_y(y)
    }

    pub fn center(&self) -> (i32, i32) {
        (self.center_x, self.center_y)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingRecord {
    #[serde(rename = "buildingType")]
    pub building_type: String,
    pub x: i32,
    pub y: i32,
}

#[derive(Deserialize)]
struct BuildingsPayload {
    #[serde(default)]
    buildings: Vec<BuildingRecord>,
}
