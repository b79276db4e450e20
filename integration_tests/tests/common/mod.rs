#![allow(dead_code)]

use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use city_client::{CityClient, ClientConfig, TcpTransport};
use serde_json::{json, Value};

/// Minimal engine: one JSON request per connection, one JSON reply.
pub struct StubEngine {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<Value>>>,
}

impl StubEngine {
    pub fn start<F>(handler: F) -> Self
    where
        F: Fn(&Value) -> Vec<u8> + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub engine");
        let addr = listener.local_addr().expect("stub engine address");
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&requests);

        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { continue };
                let mut buffer = [0u8; 4096];
                let Ok(read) = stream.read(&mut buffer) else { continue };
                let Ok(request) = serde_json::from_slice::<Value>(&buffer[..read]) else {
                    continue;
                };
                recorded.lock().expect("requests mutex poisoned").push(request.clone());
                let _ = stream.write_all(&handler(&request));
            }
        });

        Self { addr, requests }
    }

    /// Engine with a 50x50 map centred on (25, 25) that accepts everything.
    pub fn accepting() -> Self {
        Self::start(|request| serde_json::to_vec(&accepting_reply(request)).unwrap())
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub fn address(&self) -> String {
        self.addr.to_string()
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig {
            host: "127.0.0.1".to_string(),
            port: self.port(),
            timeout: Duration::from_secs(2),
            ..ClientConfig::default()
        }
        .with_demo_pace(0.0)
    }

    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().expect("requests mutex poisoned").clone()
    }

    pub fn actions(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|request| request["action"].as_str().unwrap_or_default().to_string())
            .collect()
    }
}

pub fn accepting_reply(request: &Value) -> Value {
    match request["action"].as_str().unwrap_or_default() {
        "get_map" => json!({
            "status": "success",
            "width": 50, "height": 50,
            "minX": 0, "maxX": 49, "minY": 0, "maxY": 49,
            "centerX": 25, "centerY": 25,
        }),
        "get_stats" => json!({
            "status": "success",
            "population": 8, "power": 20, "money": 1000, "income": 5,
        }),
        "get_buildings_data" => json!({"status": "success", "buildings": []}),
        "place_building" => json!({
            "status": "success",
            "message": format!("Placed {}", request["buildingType"].as_str().unwrap_or_default()),
        }),
        "demolish" => json!({"status": "success", "refund": 40}),
        "upgrade" => json!({"status": "success", "cost": 150}),
        _ => json!({"status": "success"}),
    }
}

/// Port that nothing is listening on.
pub fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    listener.local_addr().expect("ephemeral address").port()
}

/// Accepts connections and never answers them.
pub fn silent_listener() -> (u16, Arc<Mutex<Vec<TcpStream>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind silent listener");
    let port = listener.local_addr().expect("silent address").port();
    let held = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&held);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            sink.lock().expect("held mutex poisoned").push(stream);
        }
    });
    (port, held)
}

pub fn client_for(engine: &StubEngine) -> (CityClient<TcpTransport>, SharedOutput) {
    let output = SharedOutput::default();
    let client = CityClient::from_config(&engine.config())
        .with_output(output.clone())
        .with_seed(11);
    (client, output)
}

#[derive(Clone, Default)]
pub struct SharedOutput {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedOutput {
    pub fn contents(&self) -> String {
        String::from_utf8(self.inner.lock().expect("output mutex poisoned").clone())
            .expect("output is UTF-8")
    }
}

impl Write for SharedOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner
            .lock()
            .expect("output mutex poisoned")
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
