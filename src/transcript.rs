//! Per-session JSONL activity log: commands, auth events, and failures.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

pub struct Transcript {
    pub path: PathBuf,
    session_id: String,
    file: File,
}

#[derive(Serialize)]
struct Event<'a> {
    ts: DateTime<Utc>,
    session_id: &'a str,
    #[serde(rename = "type")]
    event_type: &'a str,
    #[serde(flatten)]
    data: serde_json::Value,
}

impl Transcript {
    pub fn new(path: &Path, session_id: &str) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            session_id: session_id.to_string(),
            file,
        })
    }

    pub fn log(&mut self, event_type: &str, data: serde_json::Value) -> Result<()> {
        let event = Event {
            ts: Utc::now(),
            session_id: &self.session_id,
            event_type,
            data,
        };
        let line = serde_json::to_string(&event)?;
        writeln!(self.file, "{}", line)?;
        self.file.flush()?;
        Ok(())
    }

    pub fn command(&mut self, line: &str) -> Result<()> {
        self.log("command", serde_json::json!({ "line": line }))
    }

    pub fn login(&mut self, email: &str, ok: bool) -> Result<()> {
        self.log("login", serde_json::json!({ "email": email, "ok": ok }))
    }

    pub fn register(&mut self, name: &str, ok: bool) -> Result<()> {
        self.log("register", serde_json::json!({ "name": name, "ok": ok }))
    }

    pub fn logout(&mut self) -> Result<()> {
        self.log("logout", serde_json::json!({}))
    }

    pub fn bid(&mut self, listing_id: &str, amount: f64, ok: bool) -> Result<()> {
        self.log(
            "bid",
            serde_json::json!({ "listing_id": listing_id, "amount": amount, "ok": ok }),
        )
    }

    pub fn listing_created(&mut self, id: &str, title: &str) -> Result<()> {
        self.log(
            "listing_created",
            serde_json::json!({ "id": id, "title": title }),
        )
    }

    /// Log a failure scoped to a single user action.
    pub fn error(&mut self, context: &str, message: &str) -> Result<()> {
        self.log(
            "error",
            serde_json::json!({ "context": context, "message": message }),
        )
    }
}
