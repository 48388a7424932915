use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Context as _;
use anyhow::Result;
use slog::Logger;
use zookeeper::WatchedEvent;
use zookeeper::ZkState;
use zookeeper::ZooKeeper;

use acbridge_conf::ZookeeperConf;

use crate::telemetry::ZOO_CONNECTION_COUNT;

/// A Zookeeper session along with a process-unique ID for it.
pub struct Session {
    pub id: u64,
    pub keeper: Arc<ZooKeeper>,
}

/// Wrapper around a `ZooKeeper` session to handle [re]connection requests.
pub struct Client {
    conf: ZookeeperConf,
    current: Mutex<Option<CurrentClient>>,
    logger: Logger,
    sessions: AtomicU64,
}

impl Client {
    /// Connect to the Zookeeper ensemble.
    pub fn connect(conf: ZookeeperConf, logger: Logger) -> Result<Client> {
        let client = Client {
            conf,
            current: Mutex::new(None),
            logger,
            sessions: AtomicU64::new(0),
        };
        client.session()?;
        Ok(client)
    }

    /// Return the current or a new zookeeper session.
    pub fn get(&self) -> Result<Arc<ZooKeeper>> {
        self.session().map(|session| session.keeper)
    }

    /// Return the current or a new zookeeper session, along with its ID.
    pub fn session(&self) -> Result<Session> {
        let mut current = self
            .current
            .lock()
            .expect("zookeeper client lock poisoned");
        if let Some(client) = current.as_ref() {
            if client.active() {
                return Ok(client.session());
            }
        }
        let client = self.new_client()?;
        let session = client.session();
        *current = Some(client);
        Ok(session)
    }
}

impl Client {
    /// Return a new Zookeeper session that will mark itself inactive once closed.
    fn new_client(&self) -> Result<CurrentClient> {
        slog::info!(
            self.logger, "Initiating new zookeeper session";
            "ensemble" => &self.conf.ensemble,
        );
        let timeout = Duration::from_secs(self.conf.timeout);
        let keeper = ZooKeeper::connect(&self.conf.ensemble, timeout, |_: WatchedEvent| ())
            .context("unable to connect to zookeeper")?;
        ZOO_CONNECTION_COUNT.inc();

        let logger = self.logger.clone();
        let active = Arc::new(AtomicBool::new(true));
        let notify_close = Arc::clone(&active);
        keeper.add_listener(move |state| {
            let reset = match state {
                ZkState::AuthFailed => {
                    slog::error!(logger, "Zookeeper authentication error");
                    false
                }
                ZkState::Closed => {
                    slog::warn!(logger, "Zookeeper session closed");
                    true
                }
                ZkState::Connected => {
                    slog::info!(logger, "Zookeeper connection successful");
                    false
                }
                ZkState::ConnectedReadOnly => {
                    slog::warn!(logger, "Zookeeper connection is read-only");
                    false
                }
                event => {
                    slog::debug!(logger, "Ignoring zookeeper session event"; "event" => ?event);
                    false
                }
            };
            if reset {
                notify_close.store(false, Ordering::Relaxed);
                slog::debug!(logger, "Zookeeper session marked as not active");
            }
        });

        Ok(CurrentClient {
            active,
            id: self.sessions.fetch_add(1, Ordering::Relaxed) + 1,
            keeper: Arc::new(keeper),
        })
    }
}

/// Holder of the current zookeeper session with its `active` flag.
struct CurrentClient {
    active: Arc<AtomicBool>,
    id: u64,
    keeper: Arc<ZooKeeper>,
}

impl CurrentClient {
    fn active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }

    fn session(&self) -> Session {
        Session {
            id: self.id,
            keeper: Arc::clone(&self.keeper),
        }
    }
}
