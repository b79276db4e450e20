//! In-memory engine stand-ins for unit tests.

use std::cell::RefCell;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{json, Value};

use crate::transport::Transport;

pub(crate) fn reply(value: Value) -> io::Result<Vec<u8>> {
    Ok(serde_json::to_vec(&value).expect("test reply serializes"))
}

/// Hands every decoded request to `handler` and records requests and pauses.
pub(crate) struct RecordingTransport<F> {
    handler: F,
    requests: RefCell<Vec<Value>>,
    pauses: RefCell<Vec<Duration>>,
}

impl<F> RecordingTransport<F> {
    pub(crate) fn new(handler: F) -> Self
    where
        F: Fn(&Value) -> io::Result<Vec<u8>>,
    {
        Self {
            handler,
            requests: RefCell::new(Vec::new()),
            pauses: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn requests(&self) -> Vec<Value> {
        self.requests.borrow().clone()
    }

    pub(crate) fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }

    pub(crate) fn actions(&self) -> Vec<String> {
        self.requests
            .borrow()
            .iter()
            .map(|request| request["action"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    pub(crate) fn pauses(&self) -> Vec<Duration> {
        self.pauses.borrow().clone()
    }
}

impl<F> Transport for RecordingTransport<F>
where
    F: Fn(&Value) -> io::Result<Vec<u8>>,
{
    fn round_trip(&self, payload: &[u8]) -> io::Result<Vec<u8>> {
        let request: Value = serde_json::from_slice(payload).expect("client sends JSON");
        self.requests.borrow_mut().push(request.clone());
        (self.handler)(&request)
    }

    fn pause(&self, duration: Duration) {
        self.pauses.borrow_mut().push(duration);
    }
}

/// Canned engine: a 50x50 map centred on (25, 25) that accepts everything.
pub(crate) fn accepting_engine(request: &Value) -> io::Result<Vec<u8>> {
    let body = match request["action"].as_str().unwrap_or_default() {
        "get_map" => json!({
            "status": "success",
            "width": 50, "height": 50,
            "minX": 0, "maxX": 49, "minY": 0, "maxY": 49,
            "centerX": 25, "centerY": 25,
        }),
        "get_stats" => json!({
            "status": "success",
            "population": 12, "power": 30, "money": 900, "income": 15,
        }),
        "get_buildings_data" => json!({
            "status": "success",
            "buildings": [{"buildingType": "House", "x": 26, "y": 25}],
        }),
        "place_building" => json!({
            "status": "success",
            "message": format!(
                "Placed {} at ({}, {})",
                request["buildingType"].as_str().unwrap_or_default(),
                request["x"],
                request["y"]
            ),
        }),
        "demolish" => json!({"status": "success", "refund": 50}),
        "upgrade" => json!({"status": "success", "cost": 200}),
        _ => json!({"status": "success"}),
    };
    reply(body)
}

/// Shared in-memory sink standing in for stdout.
#[derive(Clone, Default)]
pub(crate) struct SharedBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub(crate) fn contents(&self) -> String {
        String::from_utf8(self.inner.lock().expect("buffer mutex poisoned").clone())
            .expect("output is UTF-8")
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner
            .lock()
            .expect("buffer mutex poisoned")
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
