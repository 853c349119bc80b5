//! Linkshelf RPC Server: JSON-RPC over stdin/stdout for the view layer.
//!
//! Protocol: one JSON object per line (newline-delimited JSON).
//! Request:  {"id":1, "method":"bookmark.create", "params":{"form":{...}}}
//! Response: {"id":1, "result":{...}} or {"id":1, "error":"..."}
//!
//! Logs go to stderr so stdout carries nothing but responses.

use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::time::Instant;

use log::{error, info, warn};
use serde_json::{json, Value};

use linkshelf::app::App;
use linkshelf::rpc_handler::handle_method;
use linkshelf::services::settings_engine::{SettingsEngine, SettingsEngineTrait};

/// Simple rate limiter: max requests per one-second window.
struct RateLimiter {
    window_start: Instant,
    request_count: u32,
    max_per_second: u32,
}

impl RateLimiter {
    fn new(max_per_second: u32) -> Self {
        Self { window_start: Instant::now(), request_count: 0, max_per_second }
    }

    /// Returns true if the request is allowed, false if rate-limited.
    fn check(&mut self) -> bool {
        if self.window_start.elapsed().as_secs() >= 1 {
            self.window_start = Instant::now();
            self.request_count = 0;
        }
        self.request_count += 1;
        self.request_count <= self.max_per_second
    }
}

fn respond(out: &mut impl Write, value: &Value) -> io::Result<()> {
    writeln!(out, "{}", value)?;
    out.flush()
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .target(env_logger::Target::Stderr)
        .init();

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("failed to start async runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let engine = SettingsEngine::from_env();
    info!("reading settings from {}", engine.get_config_path());
    let app = match App::connect(engine) {
        Ok(app) => app,
        Err(e) => {
            error!("failed to initialize linkshelf: {}", e);
            return ExitCode::FAILURE;
        }
    };
    runtime.block_on(async { app.startup() });

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let ready = json!({"event": "ready", "version": env!("CARGO_PKG_VERSION")});
    if respond(&mut out, &ready).is_err() {
        return ExitCode::FAILURE;
    }

    let mut rate_limiter = RateLimiter::new(200);

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: Value = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                warn!("dropping malformed request: {}", e);
                if respond(&mut out, &json!({"id": null, "error": format!("parse error: {}", e)})).is_err() {
                    break;
                }
                continue;
            }
        };

        let id = req.get("id").cloned().unwrap_or(Value::Null);

        if !rate_limiter.check() {
            if respond(&mut out, &json!({"id": id, "error": "rate limit exceeded"})).is_err() {
                break;
            }
            continue;
        }

        let method = req.get("method").and_then(Value::as_str).unwrap_or("");
        let params = req.get("params").cloned().unwrap_or(json!({}));

        let response = match runtime.block_on(handle_method(&app, method, &params)) {
            Ok(val) => json!({"id": id, "result": val}),
            Err(err) => {
                warn!("{} failed: {}", method, err);
                json!({"id": id, "error": err.to_string()})
            }
        };
        if respond(&mut out, &response).is_err() {
            break;
        }
    }

    app.shutdown();
    ExitCode::SUCCESS
}
