use std::sync::Arc;
use std::thread::Builder;
use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::Context as _;
use anyhow::Result;
use crossbeam_channel::unbounded;
use crossbeam_channel::Receiver;
use crossbeam_channel::RecvTimeoutError;
use crossbeam_channel::Sender;
use slog::Logger;

use super::node;
use super::node::NodeWatch;
use super::Client;
use crate::telemetry::ZOO_NODE_RECREATED;

/// Signals received by the watcher thread.
enum Signal {
    /// Check the registration node now.
    Check,
    /// Stop the watcher thread.
    Shutdown,
}

/// Background thread keeping the registration node alive.
///
/// The node is checked when a Zookeeper watch fires and every `interval` in case
/// a watch is lost along with its session.
/// Nodes found missing are created again with the registered payload.
pub struct Watcher {
    handle: Option<JoinHandle<()>>,
    logger: Logger,
    signals: Sender<Signal>,
}

impl Watcher {
    pub fn start(
        client: Arc<Client>,
        path: String,
        payload: Vec<u8>,
        interval: Duration,
        logger: Logger,
    ) -> Result<Watcher> {
        let (signals, receiver) = unbounded();
        let mut inner = InnerWatcher {
            client,
            logger: logger.clone(),
            path,
            payload,
            signals: signals.clone(),
            watch: NodeWatch::default(),
        };
        let handle = Builder::new()
            .name("acbridge:registry:zk:watcher".into())
            .spawn(move || inner.run(receiver, interval))
            .context("unable to spawn registration watcher thread")?;
        Ok(Watcher {
            handle: Some(handle),
            logger,
            signals,
        })
    }
}

impl Drop for Watcher {
    fn drop(&mut self) {
        let _ = self.signals.send(Signal::Shutdown);
        if let Some(handle) = self.handle.take() {
            if let Err(error) = handle.join() {
                slog::error!(self.logger, "Registration watcher thread panicked"; "error" => ?error);
            }
        }
    }
}

/// State owned by the watcher thread.
struct InnerWatcher {
    client: Arc<Client>,
    logger: Logger,
    path: String,
    payload: Vec<u8>,
    signals: Sender<Signal>,
    watch: NodeWatch,
}

impl InnerWatcher {
    /// Check the registration node, creating it again if it is missing.
    fn cycle(&mut self) -> Result<()> {
        let session = self.client.session()?;
        let signals = self.signals.clone();
        let notify = move || {
            let _ = signals.send(Signal::Check);
        };
        let recreated = node::keep_alive(
            session.keeper.as_ref(),
            &mut self.watch,
            session.id,
            &self.path,
            &self.payload,
            notify,
            &self.logger,
        )?;
        if recreated {
            ZOO_NODE_RECREATED.inc();
        }
        Ok(())
    }

    fn run(&mut self, receiver: Receiver<Signal>, interval: Duration) {
        loop {
            if let Err(error) = self.cycle() {
                slog::error!(
                    self.logger, "Registration node check failed";
                    "path" => &self.path,
                    replisdk::utils::error::slog::ErrorAttributes::from(&error),
                );
            }

            match receiver.recv_timeout(interval) {
                Ok(Signal::Shutdown) => return,
                Err(RecvTimeoutError::Disconnected) => return,
                Ok(Signal::Check) => (),
                Err(RecvTimeoutError::Timeout) => (),
            };
        }
    }
}
