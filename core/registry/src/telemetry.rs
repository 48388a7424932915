//! Telemetry related to server registration.
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use anyhow::Result;
use once_cell::sync::Lazy;
use prometheus::Counter;
use prometheus::CounterVec;
use prometheus::Opts;

/// Number of registration lifecycle operations by operation.
pub static REGISTRY_OPS: Lazy<CounterVec> = Lazy::new(|| {
    CounterVec::new(
        Opts::new(
            "acbridge_registry_ops",
            "Number of registration lifecycle operations by operation",
        ),
        &["op"],
    )
    .expect("failed to initialise REGISTRY_OPS counter")
});

/// Number of registration lifecycle operations that failed by operation.
pub static REGISTRY_ERRORS: Lazy<CounterVec> = Lazy::new(|| {
    CounterVec::new(
        Opts::new(
            "acbridge_registry_errors",
            "Number of registration lifecycle operations that failed by operation",
        ),
        &["op"],
    )
    .expect("failed to initialise REGISTRY_ERRORS counter")
});

/// Number of sessions opened with the Zookeeper ensemble.
pub static ZOO_CONNECTION_COUNT: Lazy<Counter> = Lazy::new(|| {
    Counter::new(
        "acbridge_registry_zookeeper_connect",
        "Number of connections to the zookeeper ensemble since the process started",
    )
    .expect("failed to initialise ZOO_CONNECTION_COUNT counter")
});

/// Number of registration nodes created again after they were lost.
pub static ZOO_NODE_RECREATED: Lazy<Counter> = Lazy::new(|| {
    Counter::new(
        "acbridge_registry_zookeeper_node_recreated",
        "Number of registration znodes created again after they were lost",
    )
    .expect("failed to initialise ZOO_NODE_RECREATED counter")
});

/// Count an operation and its failure, returning the result unchanged.
pub fn observe<T>(op: &str, result: Result<T>) -> Result<T> {
    REGISTRY_OPS.with_label_values(&[op]).inc();
    if result.is_err() {
        REGISTRY_ERRORS.with_label_values(&[op]).inc();
    }
    result
}

/// Ensure metrics are registered only once.
static METRICS_REGISTERED: AtomicBool = AtomicBool::new(false);

/// The first time this method is called it will register the registration metrics.
pub fn register_metrics(reg: &prometheus::Registry) -> Result<()> {
    if METRICS_REGISTERED.swap(true, Ordering::AcqRel) {
        return Ok(());
    }

    let collectors: [Box<dyn prometheus::core::Collector>; 4] = [
        Box::new(REGISTRY_OPS.clone()),
        Box::new(REGISTRY_ERRORS.clone()),
        Box::new(ZOO_CONNECTION_COUNT.clone()),
        Box::new(ZOO_NODE_RECREATED.clone()),
    ];
    for collector in collectors {
        reg.register(collector)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::observe;
    use super::REGISTRY_ERRORS;
    use super::REGISTRY_OPS;

    #[test]
    fn observe_counts_success() {
        let result = observe("test-observe-ok", Ok(42));
        assert_eq!(result.unwrap(), 42);
        assert_eq!(REGISTRY_OPS.with_label_values(&["test-observe-ok"]).get(), 1.0);
        assert_eq!(
            REGISTRY_ERRORS
                .with_label_values(&["test-observe-ok"])
                .get(),
            0.0,
        );
    }

    #[test]
    fn observe_counts_failure() {
        let result: anyhow::Result<()> = observe("test-observe-err", Err(anyhow::anyhow!("lost")));
        assert_eq!(result.unwrap_err().to_string(), "lost");
        assert_eq!(REGISTRY_OPS.with_label_values(&["test-observe-err"]).get(), 1.0);
        assert_eq!(
            REGISTRY_ERRORS
                .with_label_values(&["test-observe-err"])
                .get(),
            1.0,
        );
    }

    #[test]
    fn register_metrics_once() {
        let registry = prometheus::Registry::new();
        crate::register_metrics(&registry).unwrap();
        crate::register_metrics(&registry).unwrap();
    }
}
