//! Server registration backed by a Zookeeper ensemble.
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::time::Duration;

use anyhow::Context as _;
use anyhow::Result;
use slog::Logger;

use acbridge_conf::RegistrationConf;
use acbridge_conf::ZookeeperConf;

use super::Coordination;

mod client;
mod node;
mod watcher;

use self::client::Client;
use self::watcher::Watcher;

/// Register servers as ephemeral nodes in Zookeeper.
///
/// Registration nodes are owned by the Zookeeper session: a background thread
/// creates them again if they are deleted or the session expires.
pub struct ZookeeperCoordination {
    client: Arc<Client>,
    interval: Duration,
    logger: Logger,
    watcher: Mutex<Option<Watcher>>,
}

impl ZookeeperCoordination {
    /// Connect to the Zookeeper ensemble.
    pub fn new(
        zookeeper: ZookeeperConf,
        registration: &RegistrationConf,
        logger: Logger,
    ) -> Result<ZookeeperCoordination> {
        let client = Client::connect(zookeeper, logger.clone())?;
        Ok(ZookeeperCoordination {
            client: Arc::new(client),
            interval: registration.watch_period(),
            logger,
            watcher: Mutex::new(None),
        })
    }

    fn watcher(&self) -> MutexGuard<Option<Watcher>> {
        self.watcher
            .lock()
            .expect("ZookeeperCoordination::watcher lock poisoned")
    }
}

impl Coordination for ZookeeperCoordination {
    fn register_and_watch(&self, path: &str, payload: Vec<u8>) -> Result<()> {
        let keeper = self.client.get()?;
        node::ensure_ancestors(keeper.as_ref(), path, &self.logger)?;
        node::create_ephemeral(keeper.as_ref(), path, &payload, &self.logger)?;

        let watcher = Watcher::start(
            Arc::clone(&self.client),
            path.to_string(),
            payload,
            self.interval,
            self.logger.clone(),
        )?;
        // Replacing an existing watcher stops its thread.
        *self.watcher() = Some(watcher);
        slog::debug!(self.logger, "Watching registration node"; "path" => path);
        Ok(())
    }

    fn ping(&self) -> Result<()> {
        let keeper = self.client.get()?;
        keeper
            .exists("/", false)
            .context("unable to reach zookeeper")?;
        Ok(())
    }

    fn cancel(&self) {
        let watcher = self.watcher().take();
        if watcher.is_some() {
            drop(watcher);
            slog::debug!(self.logger, "Stopped watching registration node");
        }
    }

    fn clear_path(&self, path: &str) -> Result<()> {
        let keeper = self.client.get()?;
        node::clear(keeper.as_ref(), path)
    }
}
