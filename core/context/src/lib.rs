//! The [`Context`] is a general purpose immutable container to carry scoped values around.
//!
//! Every operation of the bridge receives a [`Context`] from its caller and passes it,
//! unchanged, to every downstream service call it makes.
//! Deadlines and cancellation belong to the caller: dropping the future of an operation
//! cancels the downstream calls it was waiting on.
//!
//! Contexts are organised into a tree structure:
//!
//! - A root context represents the general process wide scope.
//! - Derived contexts represents a narrower scope within their parent with additional
//!   or updated information attached to them.
//!
//! For example: [`Context`]s provide access to the current [`Logger`].
//! For the root context this is the process-wide logger with no additional attributes.
//! For individual requests a derived context can be provided with a [`Logger`] decorated
//! with the request ID, the tenant or other request attributes.
use opentelemetry_api::trace::TraceContextExt;
use opentelemetry_api::trace::TraceId;
use opentelemetry_api::Context as OtelContext;
use slog::Logger;
use slog::OwnedKV;
use slog::SendSyncRefUnwindSafeKV;

/// The [`Context`] is a general purpose container to carry scoped values around.
///
/// Refer to the [crate level docs](crate) for details.
#[derive(Clone, Debug)]
pub struct Context {
    /// Logger with contextual attributes attached to it.
    pub logger: Logger,

    /// Identifier of the request the operation is performed for, if known.
    pub request_id: Option<String>,

    /// Account (tenant) owning the resources the request operates on.
    ///
    /// `None` indicates a platform-wide request that is not scoped to a tenant.
    pub tenant: Option<String>,
}

impl Context {
    /// Derive a new [`Context`] by making changes to the current one.
    pub fn derive(&self) -> ContextBuilder {
        ContextBuilder {
            logger: self.logger.clone(),
            request_id: self.request_id.clone(),
            tenant: self.tenant.clone(),
        }
    }

    /// Derive a new [`Context`] by making changes to the current one using the provided callback.
    pub fn derive_with<F>(&self, callback: F) -> Context
    where
        F: FnOnce(ContextBuilder) -> ContextBuilder,
    {
        let builder = callback(self.derive());
        builder.build()
    }

    /// Initialise a new root context with no values attached.
    pub fn root(logger: Logger) -> ContextBuilder {
        ContextBuilder {
            logger,
            request_id: None,
            tenant: None,
        }
    }

    /// Tenant of the request, or an empty string for platform-wide requests.
    pub fn tenant_or_default(&self) -> String {
        self.tenant.clone().unwrap_or_default()
    }
}

/// A builder for root and derived contexts.
pub struct ContextBuilder {
    logger: Logger,
    request_id: Option<String>,
    tenant: Option<String>,
}

impl ContextBuilder {
    /// Finalise the build process and return a new [`Context`].
    pub fn build(self) -> Context {
        Context {
            logger: self.logger,
            request_id: self.request_id,
            tenant: self.tenant,
        }
    }

    /// Decorate the [`Context`]'s logger with the trace ID of the current OpenTelemetry span.
    ///
    /// [`Context`]: super::Context
    pub fn log_trace(self) -> Self {
        let context = OtelContext::current();
        let span = context.span();
        let trace_id = span.span_context().trace_id();
        if trace_id == TraceId::INVALID {
            self
        } else {
            let trace_id = trace_id.to_string();
            self.log_values(slog::o!("trace_id" => trace_id))
        }
    }

    /// Update the [`Context`] logger to attach new log key/pair values.
    pub fn log_values<T>(mut self, entries: OwnedKV<T>) -> Self
    where
        T: SendSyncRefUnwindSafeKV + 'static,
    {
        self.logger = self.logger.new(entries);
        self
    }

    /// Attach the request ID to the context and to its logger.
    pub fn request_id<S: Into<String>>(mut self, request_id: S) -> Self {
        let request_id = request_id.into();
        self.logger = self.logger.new(slog::o!("rid" => request_id.clone()));
        self.request_id = Some(request_id);
        self
    }

    /// Scope the context to the given tenant (owner account).
    pub fn tenant<S: Into<String>>(mut self, tenant: S) -> Self {
        let tenant = tenant.into();
        self.logger = self.logger.new(slog::o!("tenant" => tenant.clone()));
        self.tenant = Some(tenant);
        self
    }
}

#[cfg(any(test, feature = "test-fixture"))]
impl Context {
    /// Create an empty context useful for test.
    pub fn fixture() -> Context {
        let logger = Logger::root(slog::Discard, slog::o!());
        Context {
            logger,
            request_id: None,
            tenant: None,
        }
    }
}
