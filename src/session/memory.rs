//! In-memory Junos device
//!
//! [`MemoryDevice`] keeps a running and a candidate configuration as lists of
//! statements and answers the same primitives as a real device. It backs the
//! integration tests and `--memory` dry runs of the CLI.
//!
//! Faults can be injected per primitive, and statements can be silently
//! dropped at commit time to simulate a device that accepts a change but does
//! not keep it.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::trace;

use super::{CommitOptions, DeviceSession, SessionFactory, SystemInformation};
use crate::engine::text::{END_MARKER, START_MARKER};
use crate::error::{Error, Result};

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Session primitive, used for fault injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Command,
    ConfigSet,
    Lock,
    Unlock,
    Clear,
    Commit,
    SystemInformation,
    Close,
}

/// One call recorded in the device journal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCall {
    Open,
    Command(String),
    ConfigSet(Vec<String>),
    Lock,
    Unlock,
    Clear,
    Commit(Option<String>),
    SystemInformation,
    Close,
}

#[derive(Debug, Default)]
struct DeviceState {
    running: Vec<String>,
    candidate: Vec<String>,
    lock_owner: Option<u64>,
    system: SystemInformation,
    journal: Vec<SessionCall>,
    faults: HashMap<Primitive, String>,
    dropped_on_commit: Vec<String>,
    commit_warnings: Vec<String>,
    commits: usize,
}

impl DeviceState {
    fn check_fault(&self, primitive: Primitive, operation: &'static str) -> Result<()> {
        match self.faults.get(&primitive) {
            Some(message) => Err(Error::device(operation, message.clone())),
            None => Ok(()),
        }
    }
}

/// Simulated Junos device shared by every session opened on it
#[derive(Debug, Clone)]
pub struct MemoryDevice {
    state: Arc<Mutex<DeviceState>>,
}

impl Default for MemoryDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDevice {
    /// Empty vSRX device
    pub fn new() -> Self {
        let state = DeviceState {
            system: SystemInformation {
                hardware_model: "vsrx".to_string(),
                os_name: "junos".to_string(),
                os_version: "22.4R1.10".to_string(),
                host_name: "memory".to_string(),
            },
            ..Default::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Set the hardware model reported by `system_information`
    pub fn with_model(self, model: impl Into<String>) -> Self {
        self.state.lock().system.hardware_model = model.into();
        self
    }

    /// Seed the running configuration; `set ` prefixes are optional
    pub fn with_running<I, S>(self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        {
            let mut state = self.state.lock();
            for line in lines {
                let line = line.as_ref().trim();
                let statement = line.strip_prefix("set ").unwrap_or(line).to_string();
                if !state.running.contains(&statement) {
                    state.running.push(statement);
                }
            }
            state.candidate = state.running.clone();
        }
        self
    }

    /// Make every call of `primitive` fail with `message`
    pub fn fail(&self, primitive: Primitive, message: impl Into<String>) {
        self.state.lock().faults.insert(primitive, message.into());
    }

    /// Remove all injected faults
    pub fn clear_faults(&self) {
        self.state.lock().faults.clear();
    }

    /// Drop statements starting with `prefix` when committing
    pub fn drop_on_commit(&self, prefix: impl Into<String>) {
        self.state.lock().dropped_on_commit.push(prefix.into());
    }

    /// Report `warning` on every commit
    pub fn warn_on_commit(&self, warning: impl Into<String>) {
        self.state.lock().commit_warnings.push(warning.into());
    }

    /// Running configuration as `set` lines
    pub fn running(&self) -> Vec<String> {
        self.state
            .lock()
            .running
            .iter()
            .map(|s| format!("set {}", s))
            .collect()
    }

    /// Candidate configuration as `set` lines
    pub fn candidate(&self) -> Vec<String> {
        self.state
            .lock()
            .candidate
            .iter()
            .map(|s| format!("set {}", s))
            .collect()
    }

    /// Every call made by every session so far
    pub fn journal(&self) -> Vec<SessionCall> {
        self.state.lock().journal.clone()
    }

    /// Number of successful commits
    pub fn commits(&self) -> usize {
        self.state.lock().commits
    }

    pub fn is_locked(&self) -> bool {
        self.state.lock().lock_owner.is_some()
    }

    /// Open a session on the device
    pub fn session(&self) -> MemorySession {
        self.state.lock().journal.push(SessionCall::Open);
        MemorySession {
            device: self.clone(),
            id: NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed),
            closed: false,
        }
    }
}

#[async_trait]
impl SessionFactory for MemoryDevice {
    async fn open(&self) -> Result<Box<dyn DeviceSession>> {
        Ok(Box::new(self.session()))
    }
}

/// Session on a [`MemoryDevice`]
#[derive(Debug)]
pub struct MemorySession {
    device: MemoryDevice,
    id: u64,
    closed: bool,
}

impl MemorySession {
    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            Err(Error::SessionClosed)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DeviceSession for MemorySession {
    async fn command(&mut self, command: &str) -> Result<String> {
        self.ensure_open()?;
        let mut state = self.device.state.lock();
        state.journal.push(SessionCall::Command(command.to_string()));
        state.check_fault(Primitive::Command, "command")?;

        let (path, relative) = parse_show_configuration(command)
            .ok_or_else(|| Error::device("command", format!("syntax error: {}", command)))?;
        let mut output = format!("\n<configuration-information>\n{}\n", START_MARKER);
        for statement in &state.running {
            let tail = if path.is_empty() {
                Some(statement.as_str())
            } else if statement == path {
                Some("")
            } else {
                statement
                    .strip_prefix(path)
                    .and_then(|rest| rest.strip_prefix(' '))
            };
            if let Some(tail) = tail {
                let line = match (relative, tail.is_empty()) {
                    (true, true) => "set".to_string(),
                    (true, false) => format!("set {}", tail),
                    (false, _) => format!("set {}", statement),
                };
                output.push_str(&line);
                output.push('\n');
            }
        }
        output.push_str(END_MARKER);
        output.push_str("\n</configuration-information>\n");
        Ok(output)
    }

    async fn config_set(&mut self, lines: &[String]) -> Result<()> {
        self.ensure_open()?;
        let mut state = self.device.state.lock();
        state.journal.push(SessionCall::ConfigSet(lines.to_vec()));
        state.check_fault(Primitive::ConfigSet, "load-configuration")?;

        for line in lines {
            let line = line.trim();
            if let Some(statement) = line.strip_prefix("set ") {
                let statement = statement.trim().to_string();
                if !state.candidate.contains(&statement) {
                    state.candidate.push(statement);
                }
            } else if let Some(path) = line.strip_prefix("delete ") {
                let path = path.trim();
                let nested = format!("{} ", path);
                state
                    .candidate
                    .retain(|s| s != path && !s.starts_with(&nested));
            } else {
                return Err(Error::device(
                    "load-configuration",
                    format!("syntax error: {}", line),
                ));
            }
        }
        trace!(session = self.id, lines = lines.len(), "Loaded lines into candidate");
        Ok(())
    }

    async fn config_lock(&mut self) -> Result<()> {
        self.ensure_open()?;
        let mut state = self.device.state.lock();
        state.journal.push(SessionCall::Lock);
        state.check_fault(Primitive::Lock, "lock")?;
        match state.lock_owner {
            Some(owner) if owner != self.id => Err(Error::device(
                "lock",
                format!("configuration database locked by session {}", owner),
            )),
            _ => {
                state.lock_owner = Some(self.id);
                Ok(())
            }
        }
    }

    async fn config_unlock(&mut self) -> Result<()> {
        self.ensure_open()?;
        let mut state = self.device.state.lock();
        state.journal.push(SessionCall::Unlock);
        state.check_fault(Primitive::Unlock, "unlock")?;
        if state.lock_owner == Some(self.id) {
            state.lock_owner = None;
        }
        Ok(())
    }

    async fn config_clear(&mut self) -> Result<()> {
        self.ensure_open()?;
        let mut state = self.device.state.lock();
        state.journal.push(SessionCall::Clear);
        state.check_fault(Primitive::Clear, "discard-changes")?;
        state.candidate = state.running.clone();
        Ok(())
    }

    async fn commit_conf(&mut self, options: &CommitOptions) -> Result<Vec<String>> {
        self.ensure_open()?;
        let mut state = self.device.state.lock();
        state.journal.push(SessionCall::Commit(options.comment.clone()));
        state.check_fault(Primitive::Commit, "commit")?;

        let dropped = state.dropped_on_commit.clone();
        let committed: Vec<String> = state
            .candidate
            .iter()
            .filter(|s| !dropped.iter().any(|prefix| s.starts_with(prefix.as_str())))
            .cloned()
            .collect();
        state.running = committed.clone();
        state.candidate = committed;
        state.commits += 1;
        Ok(state.commit_warnings.clone())
    }

    async fn system_information(&mut self) -> Result<SystemInformation> {
        self.ensure_open()?;
        let mut state = self.device.state.lock();
        state.journal.push(SessionCall::SystemInformation);
        state.check_fault(Primitive::SystemInformation, "get-system-information")?;
        Ok(state.system.clone())
    }

    async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let mut state = self.device.state.lock();
        state.journal.push(SessionCall::Close);
        if state.lock_owner == Some(self.id) {
            state.lock_owner = None;
        }
        state.check_fault(Primitive::Close, "close-session")
    }
}

/// Split `show configuration <path> | display set [relative]`
fn parse_show_configuration(command: &str) -> Option<(&str, bool)> {
    let rest = command.trim().strip_prefix("show configuration")?;
    let (path, display) = rest.split_once('|')?;
    let relative = match display.trim() {
        "display set relative" => true,
        "display set" => false,
        _ => return None,
    };
    Some((path.trim(), relative))
}
