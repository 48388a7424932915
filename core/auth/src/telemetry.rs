//! Telemetry related to authorisation checks and listings.
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use anyhow::Result;
use once_cell::sync::Lazy;
use prometheus::CounterVec;
use prometheus::Opts;

/// Decision label for checks allowed by the policy-decision service.
pub const DECISION_ALLOW: &str = "allow";

/// Decision label for checks skipped because the gateway is disabled.
pub const DECISION_BYPASS: &str = "bypass";

/// Decision label for checks denied by the policy-decision service.
pub const DECISION_DENY: &str = "deny";

/// Decision label for checks that failed before a verdict was rendered.
pub const DECISION_ERROR: &str = "error";

/// Number of authorisation checks by resource kind and decision.
pub static AUTHORIZE_COUNT: Lazy<CounterVec> = Lazy::new(|| {
    CounterVec::new(
        Opts::new(
            "acbridge_authorize_count",
            "Number of authorisation checks by resource kind and decision",
        ),
        &["kind", "decision"],
    )
    .expect("failed to initialise AUTHORIZE_COUNT counter")
});

/// Total number of authorised resources listings.
pub static LIST_COUNT: Lazy<CounterVec> = Lazy::new(|| {
    CounterVec::new(
        Opts::new(
            "acbridge_list_authorized_count",
            "Total number of authorised resources listings",
        ),
        &["kind"],
    )
    .expect("failed to initialise LIST_COUNT counter")
});

/// Number of authorised resources listings that resulted in error.
pub static LIST_ERR: Lazy<CounterVec> = Lazy::new(|| {
    CounterVec::new(
        Opts::new(
            "acbridge_list_authorized_error",
            "Number of authorised resources listings that resulted in error",
        ),
        &["kind"],
    )
    .expect("failed to initialise LIST_ERR counter")
});

/// Ensure metrics are registered only once.
static METRICS_REGISTERED: AtomicBool = AtomicBool::new(false);

/// The first time this method is called it will register the authorisation metrics.
pub fn register_metrics(reg: &prometheus::Registry) -> Result<()> {
    // Skip registration if already done before.
    if METRICS_REGISTERED.swap(true, Ordering::AcqRel) {
        return Ok(());
    }

    let collectors: [Box<dyn prometheus::core::Collector>; 3] = [
        Box::new(AUTHORIZE_COUNT.clone()),
        Box::new(LIST_COUNT.clone()),
        Box::new(LIST_ERR.clone()),
    ];
    for collector in collectors {
        reg.register(collector)?;
    }
    Ok(())
}
