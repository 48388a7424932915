use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use anyhow::Context as _;
use anyhow::Result;
use slog::Logger;

use acbridge_errors::AlreadyRegistered;
use acbridge_errors::InvalidAddress;
use acbridge_errors::NotRegistered;
use acbridge_errors::RegistrationCancelled;
use acbridge_models::ServerInfo;

use super::telemetry::observe;
use super::telemetry::REGISTRY_OPS;
use super::Coordination;

/// Lifecycle of the registration owned by a [`ServiceRegister`].
#[derive(Clone, Debug, PartialEq, Eq)]
enum RegisterState {
    Unregistered,
    Registered { path: String },
    Cancelled { path: Option<String> },
}

/// Advertise one server instance with a coordination service.
///
/// ## Lifecycle
///
/// - A server can be registered only once: later attempts fail with [`AlreadyRegistered`].
/// - Cancelling is irreversible: registering after a cancel fails with
///   [`RegistrationCancelled`].
/// - Pings only succeed while registered.
/// - Clearing the registration path deletes the node whether or not the registration was
///   cancelled, as long as a path was registered.
///
/// Operations are serialised with an internal lock.
pub struct ServiceRegister {
    coordination: Arc<dyn Coordination>,
    logger: Logger,
    state: Mutex<RegisterState>,
}

impl ServiceRegister {
    pub fn new<C>(coordination: C, logger: Logger) -> ServiceRegister
    where
        C: Coordination + 'static,
    {
        ServiceRegister {
            coordination: Arc::new(coordination),
            logger,
            state: Mutex::new(RegisterState::Unregistered),
        }
    }

    /// Register the server at `path`, advertising the given information.
    ///
    /// Servers advertising the `0.0.0.0` address are rejected with [`InvalidAddress`]
    /// before the coordination service is contacted.
    pub fn register(&self, path: &str, info: &ServerInfo) -> Result<()> {
        let result = self.register_inner(path, info);
        if let Err(error) = &result {
            slog::error!(
                self.logger, "Failed to register server";
                "path" => path,
                "register_ip" => &info.register_ip,
                replisdk::utils::error::slog::ErrorAttributes::from(error),
            );
        }
        observe("register", result)
    }

    /// Check the registration is still usable.
    pub fn ping(&self) -> Result<()> {
        let state = self.access();
        let result = match &*state {
            RegisterState::Registered { .. } => self.coordination.ping(),
            RegisterState::Unregistered => Err(anyhow::anyhow!(NotRegistered)),
            RegisterState::Cancelled { .. } => Err(anyhow::anyhow!(RegistrationCancelled)),
        };
        observe("ping", result)
    }

    /// Stop maintaining the registration.
    ///
    /// The registration node is left in place, use [`ServiceRegister::clear_register_path`]
    /// to remove it.
    pub fn cancel(&self) {
        let mut state = self.access();
        let path = match &*state {
            RegisterState::Cancelled { .. } => {
                slog::debug!(self.logger, "Server registration already cancelled");
                return;
            }
            RegisterState::Unregistered => None,
            RegisterState::Registered { path } => {
                self.coordination.cancel();
                Some(path.clone())
            }
        };
        slog::info!(self.logger, "Server registration cancelled"; "path" => &path);
        *state = RegisterState::Cancelled { path };
        REGISTRY_OPS.with_label_values(&["cancel"]).inc();
    }

    /// Delete the registration node from the coordination service.
    pub fn clear_register_path(&self) -> Result<()> {
        let state = self.access();
        let result = match &*state {
            RegisterState::Registered { path } => self.clear(path),
            RegisterState::Cancelled { path: Some(path) } => self.clear(path),
            RegisterState::Unregistered | RegisterState::Cancelled { path: None } => {
                Err(anyhow::anyhow!(NotRegistered))
            }
        };
        observe("clear", result)
    }

    /// Path the server was registered at, if any.
    pub fn registered_path(&self) -> Option<String> {
        match &*self.access() {
            RegisterState::Registered { path } => Some(path.clone()),
            RegisterState::Cancelled { path } => path.clone(),
            RegisterState::Unregistered => None,
        }
    }
}

impl ServiceRegister {
    /// Lock and access the registration state.
    fn access(&self) -> MutexGuard<RegisterState> {
        self.state
            .lock()
            .expect("ServiceRegister::state lock poisoned")
    }

    fn clear(&self, path: &str) -> Result<()> {
        self.coordination
            .clear_path(path)
            .with_context(|| format!("unable to clear registration path '{}'", path))?;
        slog::info!(self.logger, "Server registration path cleared"; "path" => path);
        Ok(())
    }

    fn register_inner(&self, path: &str, info: &ServerInfo) -> Result<()> {
        if !info.routable() {
            anyhow::bail!(InvalidAddress::new(&info.register_ip));
        }

        let mut state = self.access();
        match &*state {
            RegisterState::Unregistered => (),
            RegisterState::Registered { path } => anyhow::bail!(AlreadyRegistered::new(path)),
            RegisterState::Cancelled { .. } => anyhow::bail!(RegistrationCancelled),
        };

        let payload = serde_json::to_vec(info).context("unable to serialise server information")?;
        self.coordination
            .register_and_watch(path, payload)
            .with_context(|| format!("unable to register server at '{}'", path))?;
        *state = RegisterState::Registered {
            path: path.to_string(),
        };
        slog::info!(
            self.logger, "Server registered";
            "path" => path,
            "address" => format!("{}:{}", info.register_ip, info.port),
        );
        Ok(())
    }
}
