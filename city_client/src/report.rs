//! Human-readable summaries of engine replies.

use city_proto::{BuildingRecord, CityStats, MapInfo, Response};

const NO_MESSAGE: &str = "no message";

pub fn failure(response: &Response) -> String {
    format!("[failed] {}", response.message().unwrap_or(NO_MESSAGE))
}

pub fn placement(response: &Response) -> String {
    if response.is_success() {
        format!("[built] {}", response.message().unwrap_or(NO_MESSAGE))
    } else {
        failure(response)
    }
}

pub fn demolition(response: &Response) -> String {
    if response.is_success() {
        format!(
            "[demolished] Demolished building, refunded ${}",
            response.int_or("refund", 0)
        )
    } else {
        failure(response)
    }
}

pub fn upgrade(response: &Response, level: i32) -> String {
    if response.is_success() {
        format!(
            "[upgraded] Upgraded to level {}, cost ${}",
            level,
            response.int_or("cost", 0)
        )
    } else {
        failure(response)
    }
}

pub fn stats(stats: &CityStats) -> String {
    format!(
        "[stats] Population: {} | Power: {} | Money: ${} | Income: ${}/turn",
        stats.population, stats.power, stats.money, stats.income
    )
}

pub fn map(map: &MapInfo) -> Vec<String> {
    vec![
        format!("[map] Map: {}x{}", map.width, map.height),
        format!("   X range: {} to {}", map.min_x, map.max_x),
        format!("   Y range: {} to {}", map.min_y, map.max_y),
        format!("   Center: ({}, {})", map.center_x, map.center_y),
    ]
}

pub fn buildings(buildings: &[BuildingRecord]) -> Vec<String> {
    let mut lines = Vec::with_capacity(buildings.len() + 1);
    lines.push(format!("[buildings] Buildings on map: {}", buildings.len()));
    lines.extend(
        buildings
            .iter()
            .map(|b| format!("   - {} at ({}, {})", b.building_type, b.x, b.y)),
    );
    lines
}

pub fn camera(x: i32, y: i32) -> String {
    format!("[camera] Camera focused on ({}, {})", x, y)
}

pub fn out_of_bounds(axis: char, value: i32, min: i32, max: i32) -> String {
    format!("[failed] {axis}={value} out of bounds ({min}-{max})")
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;
    use serde_json::json;

    fn response(value: serde_json::Value) -> Response {
        Response::from_value(value).unwrap()
    }

    #[test]
    fn stats_line() {
        let line = stats(&CityStats {
            population: 120,
            power: 40,
            money: 880,
            income: 35,
        });
        assert_snapshot!(line, @"[stats] Population: 120 | Power: 40 | Money: $880 | Income: $35/turn");
    }

    #[test]
    fn out_of_bounds_line() {
        assert_snapshot!(out_of_bounds('X', 60, 0, 49), @"[failed] X=60 out of bounds (0-49)");
    }

    #[test]
    fn demolition_defaults_refund() {
        let line = demolition(&response(json!({"status": "success"})));
        assert_eq!(line, "[demolished] Demolished building, refunded $0");
        let line = demolition(&response(json!({"status": "error", "message": "nothing there"})));
        assert_eq!(line, "[failed] nothing there");
    }

    #[test]
    fn upgrade_reports_cost() {
        let line = upgrade(&response(json!({"status": "success", "cost": 250})), 2);
        assert_eq!(line, "[upgraded] Upgraded to level 2, cost $250");
    }

    #[test]
    fn placement_without_message() {
        let line = placement(&response(json!({"status": "error"})));
        assert_eq!(line, "[failed] no message");
    }

    #[test]
    fn building_listing() {
        let lines = buildings(&[
            BuildingRecord {
                building_type: "House".into(),
                x: 1,
                y: 2,
            },
            BuildingRecord {
                building_type: "Road".into(),
                x: 3,
                y: 2,
            },
        ]);
        assert_eq!(
            lines,
            vec![
                "[buildings] Buildings on map: 2",
                "   - House at (1, 2)",
                "   - Road at (3, 2)",
            ]
        );
    }
}
