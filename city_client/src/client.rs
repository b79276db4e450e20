use std::io::{self, Write};

use city_proto::{MapInfo, Request, Response, ResponseError};
use rand::{rngs::SmallRng, Rng, SeedableRng};
use tracing::{info, warn};

use crate::config::ClientConfig;
use crate::report;
use crate::transport::{send_command, RetryPolicy, TcpTransport, Transport};

/// High-level engine client.
///
/// Every operation issues exactly one request (the safe placement helpers may
/// first fetch the map), writes a short summary to the output sink and hands
/// back the engine's reply. Map bounds are cached after the first successful
/// `get_map`; the cache is never refreshed implicitly and can go stale.
pub struct CityClient<T> {
    transport: T,
    policy: RetryPolicy,
    map_info: Option<MapInfo>,
    rng: SmallRng,
    out: Box<dyn Write>,
}

impl CityClient<TcpTransport> {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(TcpTransport::from_config(config), config.retry_policy())
    }
}

impl<T: Transport> CityClient<T> {
    pub fn new(transport: T, policy: RetryPolicy) -> Self {
        Self {
            transport,
            policy,
            map_info: None,
            rng: SmallRng::from_entropy(),
            out: Box::new(io::stdout()),
        }
    }

    pub fn with_output(mut self, out: impl Write + 'static) -> Self {
        self.out = Box::new(out);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = SmallRng::seed_from_u64(seed);
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Bounds from the last successful map query, if any.
    pub fn map_info(&self) -> Option<&MapInfo> {
        self.map_info.as_ref()
    }

    pub fn send(&self, request: &Request) -> Response {
        send_command(&self.transport, &self.policy, request)
    }

    /// Writes one line to the output sink. Output errors are ignored, the
    /// same way a closed stdout would not stop the session.
    pub fn say(&mut self, line: impl AsRef<str>) {
        let _ = writeln!(self.out, "{}", line.as_ref());
    }

    /// Writes `text` without a line break and flushes, for input prompts.
    pub fn prompt(&mut self, text: &str) {
        let _ = write!(self.out, "{}", text);
        self.flush();
    }

    pub fn flush(&mut self) {
        let _ = self.out.flush();
    }

    pub fn place_building(
        &mut self,
        building_type: &str,
        x: i32,
        y: i32,
        reasoning: &str,
    ) -> Response {
        let response = self.send(&Request::place_building(building_type, x, y, reasoning));
        if response.is_success() {
            info!(
                target: "city_client::client",
                building_type,
                x,
                y,
                "building.placed"
            );
        }
        self.say(report::placement(&response));
        response
    }

    pub fn demolish(&mut self, x: i32, y: i32) -> Response {
        let response = self.send(&Request::Demolish { x, y });
        self.say(report::demolition(&response));
        response
    }

    pub fn upgrade(&mut self, x: i32, y: i32, level: i32) -> Response {
        let response = self.send(&Request::Upgrade { x, y, level });
        self.say(report::upgrade(&response, level));
        response
    }

    pub fn get_stats(&mut self) -> Response {
        let response = self.send(&Request::GetStats);
        if !response.is_success() {
            self.say(report::failure(&response));
            return response;
        }
        match response.stats() {
            Ok(stats) => self.say(report::stats(&stats)),
            Err(err) => self.report_malformed(&err),
        }
        response
    }

    pub fn get_map_info(&mut self) -> Response {
        let response = self.send(&Request::GetMap);
        if !response.is_success() {
            self.say(report::failure(&response));
            return response;
        }
        match response.map_info() {
            Ok(map) => {
                self.map_info = Some(map);
                for line in report::map(&map) {
                    self.say(line);
                }
            }
            Err(err) => self.report_malformed(&err),
        }
        response
    }

    pub fn get_buildings(&mut self) -> Response {
        let response = self.send(&Request::GetBuildingsData);
        if !response.is_success() {
            self.say(report::failure(&response));
            return response;
        }
        match response.buildings() {
            Ok(buildings) => {
                for line in report::buildings(&buildings) {
                    self.say(line);
                }
            }
            Err(err) => self.report_malformed(&err),
        }
        response
    }

    /// Lower zoom brings the camera closer.
    pub fn focus_camera(&mut self, x: i32, y: i32, zoom: i32) -> Response {
        let response = self.send(&Request::FocusPosition { x, y, zoom });
        if response.is_success() {
            self.say(report::camera(x, y));
        } else {
            self.say(report::failure(&response));
        }
        response
    }

    /// Places a building after checking the cached map bounds.
    ///
    /// Out-of-range coordinates are rejected locally with no placement
    /// request. When the map cannot be fetched the placement is attempted
    /// anyway and the engine has the final word.
    pub fn place_building_safe(
        &mut self,
        building_type: &str,
        x: i32,
        y: i32,
        reasoning: &str,
    ) -> Response {
        if self.map_info.is_none() {
            self.say("[notice] Map info not loaded, fetching...");
            self.get_map_info();
        }

        if let Some(map) = self.map_info {
            if !map.contains_x(x) {
                self.say(report::out_of_bounds('X', x, map.min_x, map.max_x));
                return Response::error("X out of bounds");
            }
            if !map.contains_y(y) {
                self.say(report::out_of_bounds('Y', y, map.min_y, map.max_y));
                return Response::error("Y out of bounds");
            }
        }

        self.place_building(building_type, x, y, reasoning)
    }

    /// Uniformly random cell inside the map, or `(0, 0)` with no map.
    pub fn random_position(&mut self) -> (i32, i32) {
        if self.map_info.is_none() {
            self.get_map_info();
        }
        let bounds = self.map_info;
        match bounds {
            Some(map) if map.min_x <= map.max_x && map.min_y <= map.max_y => (
                self.rng.gen_range(map.min_x..=map.max_x),
                self.rng.gen_range(map.min_y..=map.max_y),
            ),
            _ => (0, 0),
        }
    }

    pub(crate) fn rng(&mut self) -> &mut SmallRng {
        &mut self.rng
    }

    fn report_malformed(&mut self, err: &ResponseError) {
        warn!(target: "city_client::client", error = %err, "response.malformed");
        self.say(format!("[failed] {}", err));
    }
}
