//! Registration node operations on top of a Zookeeper session.
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use anyhow::Context as _;
use anyhow::Result;
use slog::Logger;
use zookeeper::Acl;
use zookeeper::CreateMode;
use zookeeper::WatchedEvent;
use zookeeper::ZkError;
use zookeeper::ZkResult;
use zookeeper::ZooKeeper;

/// Node level operations used to maintain registrations.
pub trait NodeOps {
    /// Create a node with the given payload.
    fn create(&self, path: &str, payload: Vec<u8>, mode: CreateMode) -> ZkResult<()>;

    /// Delete a node regardless of its version.
    fn delete(&self, path: &str) -> ZkResult<()>;

    /// Check if a node exists.
    fn exists(&self, path: &str) -> ZkResult<bool>;

    /// Check if a node exists and call `notify` the next time the node changes.
    fn exists_watch(&self, path: &str, notify: Box<dyn Fn() + Send>) -> ZkResult<bool>;
}

impl NodeOps for ZooKeeper {
    fn create(&self, path: &str, payload: Vec<u8>, mode: CreateMode) -> ZkResult<()> {
        let acl = Acl::open_unsafe().clone();
        ZooKeeper::create(self, path, payload, acl, mode).map(|_| ())
    }

    fn delete(&self, path: &str) -> ZkResult<()> {
        ZooKeeper::delete(self, path, None)
    }

    fn exists(&self, path: &str) -> ZkResult<bool> {
        ZooKeeper::exists(self, path, false).map(|stat| stat.is_some())
    }

    fn exists_watch(&self, path: &str, notify: Box<dyn Fn() + Send>) -> ZkResult<bool> {
        self.exists_w(path, move |_: WatchedEvent| notify())
            .map(|stat| stat.is_some())
    }
}

/// Return the paths of all the ancestors of `path`, closest to the root first.
///
/// The root itself is not included.
pub fn ancestors(path: &str) -> Vec<String> {
    let segments: Vec<&str> = path.split('/').filter(|part| !part.is_empty()).collect();
    let mut ancestors = Vec::new();
    let mut current = String::new();
    for segment in segments.iter().take(segments.len().saturating_sub(1)) {
        current.push('/');
        current.push_str(segment);
        ancestors.push(current.clone());
    }
    ancestors
}

/// Delete the node at `path`, ignoring nodes that don't exist.
pub fn clear(ops: &dyn NodeOps, path: &str) -> Result<()> {
    match ops.delete(path) {
        Ok(()) | Err(ZkError::NoNode) => Ok(()),
        Err(error) => {
            Err(error).with_context(|| format!("unable to delete registration node '{}'", path))
        }
    }
}

/// Create the registration node as an ephemeral node owned by the session.
///
/// A node already at `path` is replaced, even if owned by another session.
pub fn create_ephemeral(
    ops: &dyn NodeOps,
    path: &str,
    payload: &[u8],
    logger: &Logger,
) -> Result<()> {
    match ops.create(path, payload.to_vec(), CreateMode::Ephemeral) {
        Ok(()) => return Ok(()),
        Err(ZkError::NodeExists) => (),
        Err(error) => {
            return Err(error)
                .with_context(|| format!("unable to create registration node '{}'", path))
        }
    };

    slog::warn!(
        logger, "Replacing existing registration node";
        "path" => path,
    );
    match ops.delete(path) {
        Ok(()) | Err(ZkError::NoNode) => (),
        Err(error) => {
            return Err(error)
                .with_context(|| format!("unable to replace registration node '{}'", path))
        }
    };
    ops.create(path, payload.to_vec(), CreateMode::Ephemeral)
        .with_context(|| format!("unable to create registration node '{}'", path))?;
    Ok(())
}

/// Create all missing ancestors of `path` as empty persistent nodes.
pub fn ensure_ancestors(ops: &dyn NodeOps, path: &str, logger: &Logger) -> Result<()> {
    for ancestor in ancestors(path) {
        ensure_persistent(ops, &ancestor, logger)?;
    }
    Ok(())
}

/// Ensure the registration node exists, creating it again if it was lost.
///
/// Returns `true` if the node had to be created again.
pub fn keep_alive<F>(
    ops: &dyn NodeOps,
    watch: &mut NodeWatch,
    session: u64,
    path: &str,
    payload: &[u8],
    notify: F,
    logger: &Logger,
) -> Result<bool>
where
    F: Fn() + Send + 'static,
{
    let exists = watch
        .check(ops, session, path, notify)
        .with_context(|| format!("unable to check node '{}'", path))?;
    if exists {
        return Ok(false);
    }

    slog::warn!(logger, "Registration node lost, creating it again"; "path" => path);
    ensure_ancestors(ops, path, logger)?;
    create_ephemeral(ops, path, payload, logger)?;
    Ok(true)
}

/// Ensure the given path exists and create it if it does not.
fn ensure_persistent(ops: &dyn NodeOps, path: &str, logger: &Logger) -> Result<()> {
    let exists = ops
        .exists(path)
        .with_context(|| format!("unable to check if '{}' exists", path))?;
    if exists {
        return Ok(());
    }
    slog::info!(logger, "Need to create persistent path"; "path" => path);
    match ops.create(path, Vec::new(), CreateMode::Persistent) {
        Ok(()) | Err(ZkError::NodeExists) => Ok(()),
        Err(error) => Err(error).with_context(|| format!("unable to create '{}'", path)),
    }
}

/// Track the watch set on the registration node.
///
/// Watches fire once and are lost along with the session that set them,
/// so a new watch is set whenever the previous one fired, the session changed
/// or setting it failed.
#[derive(Default)]
pub struct NodeWatch {
    /// Session the watch is currently set on.
    armed: Option<u64>,
    fired: Arc<AtomicBool>,
}

impl NodeWatch {
    /// Check if the node exists, setting a watch on it when needed.
    pub fn check<F>(
        &mut self,
        ops: &dyn NodeOps,
        session: u64,
        path: &str,
        notify: F,
    ) -> ZkResult<bool>
    where
        F: Fn() + Send + 'static,
    {
        if !self.needs_arming(session) {
            return ops.exists(path);
        }
        let fired = Arc::clone(&self.fired);
        let exists = ops.exists_watch(
            path,
            Box::new(move || {
                fired.store(true, Ordering::Relaxed);
                notify();
            }),
        )?;
        self.armed = Some(session);
        Ok(exists)
    }

    fn needs_arming(&mut self, session: u64) -> bool {
        let fired = self.fired.swap(false, Ordering::Relaxed);
        if fired || self.armed != Some(session) {
            self.armed = None;
            return true;
        }
        false
    }
}
