//! Mock coordination service for unit tests.
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use anyhow::Result;

use super::Coordination;

/// Record of a call received by the [`CoordinationFixture`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CoordinationCall {
    Cancel,
    ClearPath(String),
    Ping,
    RegisterAndWatch(String),
}

/// Mock coordination service storing nodes in memory.
///
/// Clones share the same state so tests can inspect calls after the fact.
#[derive(Clone, Default)]
pub struct CoordinationFixture {
    state: Arc<Mutex<CoordinationFixtureState>>,
}

impl CoordinationFixture {
    /// Calls received so far, in order.
    pub fn calls(&self) -> Vec<CoordinationCall> {
        self.access().calls.clone()
    }

    /// Check if the registration was cancelled.
    pub fn cancelled(&self) -> bool {
        self.access().cancelled
    }

    /// Fail pings with the given message.
    pub fn fail_ping<S: Into<String>>(&self, message: S) {
        self.access().ping_failure = Some(message.into());
    }

    /// Fail registrations with the given message.
    pub fn fail_register<S: Into<String>>(&self, message: S) {
        self.access().register_failure = Some(message.into());
    }

    /// Payload of the node at `path`, if any.
    pub fn node(&self, path: &str) -> Option<Vec<u8>> {
        self.access().nodes.get(path).cloned()
    }

    /// Stop failing operations.
    pub fn recover(&self) {
        let mut state = self.access();
        state.ping_failure = None;
        state.register_failure = None;
    }

    /// Lock and access the shared state.
    fn access(&self) -> MutexGuard<CoordinationFixtureState> {
        self.state
            .lock()
            .expect("CoordinationFixture::state lock poisoned")
    }
}

impl Coordination for CoordinationFixture {
    fn register_and_watch(&self, path: &str, payload: Vec<u8>) -> Result<()> {
        let mut state = self.access();
        state
            .calls
            .push(CoordinationCall::RegisterAndWatch(path.to_string()));
        if let Some(message) = &state.register_failure {
            anyhow::bail!("{}", message);
        }
        state.nodes.insert(path.to_string(), payload);
        Ok(())
    }

    fn ping(&self) -> Result<()> {
        let mut state = self.access();
        state.calls.push(CoordinationCall::Ping);
        if let Some(message) = &state.ping_failure {
            anyhow::bail!("{}", message);
        }
        Ok(())
    }

    fn cancel(&self) {
        let mut state = self.access();
        state.calls.push(CoordinationCall::Cancel);
        state.cancelled = true;
    }

    fn clear_path(&self, path: &str) -> Result<()> {
        let mut state = self.access();
        state.calls.push(CoordinationCall::ClearPath(path.to_string()));
        state.nodes.remove(path);
        Ok(())
    }
}

/// Internal state to implement coordination mocking.
#[derive(Default)]
struct CoordinationFixtureState {
    calls: Vec<CoordinationCall>,
    cancelled: bool,
    nodes: HashMap<String, Vec<u8>>,
    ping_failure: Option<String>,
    register_failure: Option<String>,
}
