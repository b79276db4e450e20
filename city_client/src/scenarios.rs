//! Scripted walkthroughs of the engine's command surface.

use std::fmt;
use std::str::FromStr;
use std::thread;
use std::time::Duration;

use city_proto::BuildingType;
use rand::distributions::{Distribution, WeightedIndex};
use thiserror::Error;
use tracing::info;

use crate::client::CityClient;
use crate::transport::Transport;

pub const DEFAULT_RANDOM_BUILDINGS: u32 = 20;

const BANNER_WIDTH: usize = 60;

/// Type names as the random builder sends them; the engine ignores case.
const RANDOM_CITY_WEIGHTS: [(&str, u32); 4] =
    [("House", 40), ("road", 30), ("PowerPlant", 15), ("economic", 15)];

struct PlannedBuilding {
    building_type: &'static str,
    x: i32,
    y: i32,
    reasoning: &'static str,
}

const LLM_DECISIONS: [PlannedBuilding; 7] = [
    PlannedBuilding {
        building_type: "PowerPlant",
        x: 25,
        y: 25,
        reasoning: "Establishing central power infrastructure as foundation for city growth. Strategic placement allows equal distribution to all quadrants.",
    },
    PlannedBuilding {
        building_type: "road",
        x: 26,
        y: 25,
        reasoning: "Creating main arterial road east from power plant to enable future development zones.",
    },
    PlannedBuilding {
        building_type: "road",
        x: 25,
        y: 26,
        reasoning: "Extending road network north to create grid pattern for efficient city layout.",
    },
    PlannedBuilding {
        building_type: "House",
        x: 26,
        y: 26,
        reasoning: "Placing residential unit near power and roads to maximize infrastructure efficiency and minimize power loss.",
    },
    PlannedBuilding {
        building_type: "economic",
        x: 27,
        y: 26,
        reasoning: "Building economic center adjacent to residential area to generate income while utilizing existing power grid.",
    },
    PlannedBuilding {
        building_type: "House",
        x: 26,
        y: 27,
        reasoning: "Expanding residential capacity to increase population and city growth potential.",
    },
    PlannedBuilding {
        building_type: "PowerPlant",
        x: 30,
        y: 30,
        reasoning: "Adding secondary power plant in eastern quadrant to support future expansion and provide power redundancy.",
    },
];

/// Sleeps between scenario steps so the engine can catch up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pacer {
    pace: f32,
}

impl Pacer {
    pub fn new(pace: f32) -> Self {
        Self {
            pace: if pace.is_finite() { pace.max(0.0) } else { 0.0 },
        }
    }

    /// No pauses at all.
    pub fn immediate() -> Self {
        Self::new(0.0)
    }

    /// Saturates at `Duration::MAX` for paces too large to represent.
    pub fn scaled(&self, seconds: f32) -> Duration {
        Duration::try_from_secs_f32(seconds * self.pace).unwrap_or(Duration::MAX)
    }

    pub fn pause(&self, seconds: f32) {
        let duration = self.scaled(seconds);
        if !duration.is_zero() {
            thread::sleep(duration);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    ConnectionTest,
    BasicCommands,
    CityPlanning,
    RandomCity { buildings: u32 },
    LlmReasoning,
}

impl Scenario {
    pub fn title(&self) -> String {
        match self {
            Scenario::ConnectionTest => "CONNECTION TEST".to_string(),
            Scenario::BasicCommands => "BASIC COMMANDS DEMO".to_string(),
            Scenario::CityPlanning => "STRATEGIC CITY PLANNING DEMO".to_string(),
            Scenario::RandomCity { buildings } => {
                format!("RANDOM CITY BUILDER ({} buildings)", buildings)
            }
            Scenario::LlmReasoning => "LLM REASONING DEMO".to_string(),
        }
    }

    /// Runs the scenario; `true` when it got through every step.
    pub fn run<T: Transport>(self, client: &mut CityClient<T>, pacer: &Pacer) -> bool {
        info!(target: "city_client::scenarios", scenario = ?self, "scenario.start");
        banner(client, &self.title());
        let completed = match self {
            Scenario::ConnectionTest => connection_test(client),
            Scenario::BasicCommands => basic_commands(client, pacer),
            Scenario::CityPlanning => city_planning(client, pacer),
            Scenario::RandomCity { buildings } => random_city(client, pacer, buildings),
            Scenario::LlmReasoning => llm_reasoning(client, pacer),
        };
        client.flush();
        info!(target: "city_client::scenarios", scenario = ?self, completed, "scenario.finish");
        completed
    }
}

fn banner<T: Transport>(client: &mut CityClient<T>, title: &str) {
    let rule = "=".repeat(BANNER_WIDTH);
    client.say("");
    client.say(&rule);
    client.say(title);
    client.say(&rule);
}

fn connection_test<T: Transport>(client: &mut CityClient<T>) -> bool {
    client.say("");
    client.say("1. Testing connection...");
    if client.get_stats().is_success() {
        client.say("Connection successful!");
        true
    } else {
        client.say("Connection failed! Make sure the engine is running.");
        false
    }
}

/// Fetches the map and returns its center, reporting when it is unavailable.
fn map_center<T: Transport>(client: &mut CityClient<T>) -> Option<(i32, i32)> {
    client.get_map_info();
    let center = client.map_info().map(|map| map.center());
    if center.is_none() {
        client.say("[failed] Failed to get map info. Is the engine running?");
    }
    center
}

fn basic_commands<T: Transport>(client: &mut CityClient<T>, pacer: &Pacer) -> bool {
    client.say("");
    client.say("Step 1: Get map info");
    let Some((cx, cy)) = map_center(client) else {
        return false;
    };
    client.say(format!("Target coordinates: ({}, {})", cx, cy));

    client.say("");
    client.say("Step 2: Get initial stats");
    client.get_stats();
    pacer.pause(0.5);

    client.say("");
    client.say("Step 3: Place some buildings");
    let row = [
        (BuildingType::PowerPlant, "Central power hub"),
        (BuildingType::House, "Residential area"),
        (BuildingType::Road, "Connect buildings"),
        (BuildingType::Economic, "Generate income"),
    ];
    for (dx, (building_type, reasoning)) in (0..).zip(row) {
        client.place_building(building_type.as_str(), cx.saturating_add(dx), cy, reasoning);
        pacer.pause(if building_type == BuildingType::Economic { 1.0 } else { 0.5 });
    }
    pacer.pause(1.0);

    client.say("");
    client.say("Step 4: Check stats after building");
    client.get_stats();
    pacer.pause(0.5);

    client.say("");
    client.say("Step 5: List all buildings");
    client.get_buildings();
    pacer.pause(0.5);

    client.say("");
    client.say("Step 6: Upgrade a building");
    client.upgrade(cx, cy, 2);
    pacer.pause(0.5);

    client.say("");
    client.say("Step 7: Demolish a building");
    client.demolish(cx.saturating_add(2), cy);
    pacer.pause(0.5);

    client.say("");
    client.say("Step 8: Focus camera");
    client.focus_camera(cx, cy, 3);

    client.say("");
    client.say("Demo complete!");
    true
}

fn city_planning<T: Transport>(client: &mut CityClient<T>, pacer: &Pacer) -> bool {
    let Some((cx, cy)) = map_center(client) else {
        return false;
    };

    client.say("");
    client.say("Phase 1: Power Infrastructure");
    client.focus_camera(cx, cy, 8);
    pacer.pause(0.5);
    let power = BuildingType::PowerPlant.as_str();
    client.place_building(power, cx, cy, "Main power plant");
    pacer.pause(0.2);
    client.place_building(power, cx.saturating_add(10), cy, "Backup power");
    pacer.pause(0.5);

    client.say("");
    client.say("Phase 2: Road Network");
    for i in 0..5 {
        let (x, y) = (cx.saturating_add(i), cy.saturating_add(3));
        client.place_building("road", x, y, &format!("Road segment {}", i + 1));
        pacer.pause(0.1);
    }
    for i in 0..5 {
        let (x, y) = (cx.saturating_add(2), cy.saturating_add(i));
        client.place_building("road", x, y, &format!("Road segment {}", i + 6));
        pacer.pause(0.1);
    }
    client.get_stats();
    pacer.pause(0.5);

    client.say("");
    client.say("Phase 3: Residential Zone");
    let homes = [(1, 1), (3, 1), (1, 5), (3, 5)];
    for (i, (dx, dy)) in homes.into_iter().enumerate() {
        let (x, y) = (cx.saturating_add(dx), cy.saturating_add(dy));
        let reasoning = format!("Residential building {}", i + 1);
        client.place_building(BuildingType::House.as_str(), x, y, &reasoning);
        pacer.pause(0.2);
    }
    client.get_stats();
    pacer.pause(0.5);

    client.say("");
    client.say("Phase 4: Economic Zone");
    let offices = [(5, 1), (5, 2)];
    for (i, (dx, dy)) in offices.into_iter().enumerate() {
        let (x, y) = (cx.saturating_add(dx), cy.saturating_add(dy));
        client.place_building("economic", x, y, &format!("Economic building {}", i + 1));
        pacer.pause(0.2);
    }

    client.say("");
    client.say("Final Stats:");
    client.get_stats();

    client.say("");
    client.say("Final Layout:");
    client.get_buildings();

    client.say("");
    client.say("City planning complete!");
    true
}

fn random_city<T: Transport>(client: &mut CityClient<T>, pacer: &Pacer, target: u32) -> bool {
    client.get_map_info();

    let Ok(weights) = WeightedIndex::new(RANDOM_CITY_WEIGHTS.iter().map(|(_, weight)| *weight))
    else {
        return false;
    };

    let max_attempts = target.saturating_mul(3);
    let mut placed = 0u32;
    let mut attempts = 0u32;
    while placed < target && attempts < max_attempts {
        attempts += 1;
        let (x, y) = client.random_position();
        let building_type = RANDOM_CITY_WEIGHTS[weights.sample(client.rng())].0;
        let reasoning = format!("Random placement #{}", placed + 1);
        if client
            .place_building(building_type, x, y, &reasoning)
            .is_success()
        {
            placed += 1;
            client.say(format!("Progress: {}/{}", placed, target));
        }
        pacer.pause(0.1);
    }

    client.say("");
    client.say(format!(
        "Placed {} buildings in {} attempts",
        placed, attempts
    ));
    client.get_stats();
    client.get_buildings();
    true
}

fn llm_reasoning<T: Transport>(client: &mut CityClient<T>, pacer: &Pacer) -> bool {
    client.get_map_info();

    let total = LLM_DECISIONS.len();
    for (index, decision) in LLM_DECISIONS.iter().enumerate() {
        let number = index + 1;
        client.say("");
        client.say(format!("LLM Decision {}/{}:", number, total));
        client.say(format!("   Building: {}", decision.building_type));
        client.say(format!("   Position: ({}, {})", decision.x, decision.y));
        client.say(format!("   Reasoning: {}", decision.reasoning));

        client.place_building(
            decision.building_type,
            decision.x,
            decision.y,
            decision.reasoning,
        );
        pacer.pause(0.5);

        if number % 3 == 0 {
            client.say("");
            client.say("Progress check:");
            client.get_stats();
        }
    }

    client.say("");
    client.say("Final city state:");
    client.get_stats();
    client.get_buildings();
    true
}

/// Entries of the startup menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    ConnectionTest,
    BasicCommands,
    CityPlanning,
    RandomCity,
    LlmReasoning,
    Interactive,
}

impl MenuChoice {
    pub const ALL: [MenuChoice; 6] = [
        MenuChoice::ConnectionTest,
        MenuChoice::BasicCommands,
        MenuChoice::CityPlanning,
        MenuChoice::RandomCity,
        MenuChoice::LlmReasoning,
        MenuChoice::Interactive,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MenuChoice::ConnectionTest => "Test Connection",
            MenuChoice::BasicCommands => "Basic Commands Demo",
            MenuChoice::CityPlanning => "Strategic City Planning",
            MenuChoice::RandomCity => "Random City Builder",
            MenuChoice::LlmReasoning => "LLM Reasoning Demo",
            MenuChoice::Interactive => "Interactive Mode",
        }
    }

    /// Scenario for this entry; `None` for the interactive prompt.
    pub fn scenario(&self, random_buildings: u32) -> Option<Scenario> {
        match self {
            MenuChoice::ConnectionTest => Some(Scenario::ConnectionTest),
            MenuChoice::BasicCommands => Some(Scenario::BasicCommands),
            MenuChoice::CityPlanning => Some(Scenario::CityPlanning),
            MenuChoice::RandomCity => Some(Scenario::RandomCity {
                buildings: random_buildings,
            }),
            MenuChoice::LlmReasoning => Some(Scenario::LlmReasoning),
            MenuChoice::Interactive => None,
        }
    }
}

impl fmt::Display for MenuChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown menu choice '{0}'")]
pub struct UnknownMenuChoice(pub String);

impl FromStr for MenuChoice {
    type Err = UnknownMenuChoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "connection" => Ok(MenuChoice::ConnectionTest),
            "2" | "basic" => Ok(MenuChoice::BasicCommands),
            "3" | "planning" => Ok(MenuChoice::CityPlanning),
            "4" | "random" => Ok(MenuChoice::RandomCity),
            "5" | "llm" => Ok(MenuChoice::LlmReasoning),
            "6" | "interactive" => Ok(MenuChoice::Interactive),
            other => Err(UnknownMenuChoice(other.to_string())),
        }
    }
}

/// Interprets the answer to the building-count prompt. Blank or unparsable
/// input falls back to the default.
pub fn parse_building_count(input: &str) -> Result<u32, std::num::ParseIntError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(DEFAULT_RANDOM_BUILDINGS);
    }
    trimmed.parse::<u32>()
}
