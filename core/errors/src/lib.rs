//! Common errors from and for the access-control bridge.
//!
//! Errors are marker types attached to [`anyhow::Error`]s as context.
//! Callers classify failures with [`anyhow::Error::is`] while the full chain of causes
//! remains available for logging.

/// A query to the core-data service failed.
///
/// These failures are usually transient and the caller may retry the operation.
#[derive(Debug, thiserror::Error)]
#[error("query for '{kind}' records failed ({detail})")]
pub struct UpstreamQueryFailed {
    pub detail: String,
    pub kind: String,
}

impl UpstreamQueryFailed {
    /// A query for records of the given kind failed.
    pub fn new<S1: Into<String>, S2: Into<String>>(kind: S1, detail: S2) -> Self {
        Self {
            detail: detail.into(),
            kind: kind.into(),
        }
    }
}

/// A raw record returned by the core-data service could not be parsed.
#[derive(Debug, thiserror::Error)]
#[error("unable to parse '{kind}' record: {reason}")]
pub struct RecordParseFailed {
    pub kind: String,
    pub reason: String,
}

impl RecordParseFailed {
    /// A raw record of the given kind could not be parsed.
    pub fn new<S1: Into<String>, S2: Into<String>>(kind: S1, reason: S2) -> Self {
        Self {
            kind: kind.into(),
            reason: reason.into(),
        }
    }
}

/// An identifier returned by the policy-decision service could not be decoded.
#[derive(Debug, thiserror::Error)]
#[error("malformed authorized resource ID '{raw}': {reason}")]
pub struct MalformedResourceID {
    pub raw: String,
    pub reason: String,
}

impl MalformedResourceID {
    /// The raw identifier could not be decoded for the given reason.
    pub fn new<S1: Into<String>, S2: Into<String>>(raw: S1, reason: S2) -> Self {
        Self {
            raw: raw.into(),
            reason: reason.into(),
        }
    }
}

/// No model definition was found for a family of entities.
#[derive(Debug, thiserror::Error)]
#[error("model for family '{family}' was not found")]
pub struct ModelNotFound {
    pub family: String,
}

impl ModelNotFound {
    /// No model definition was found for the given family key.
    pub fn new<S: Into<String>>(family: S) -> Self {
        Self {
            family: family.into(),
        }
    }
}

/// Some of the requested entities do not exist.
#[derive(Debug, thiserror::Error)]
#[error("'{kind}' records not found for IDs {missing:?}")]
pub struct EntitiesNotFound {
    pub kind: String,
    pub missing: Vec<i64>,
}

impl EntitiesNotFound {
    /// The listed IDs of the given kind were not returned by the core-data service.
    pub fn new<S: Into<String>>(kind: S, missing: Vec<i64>) -> Self {
        Self {
            kind: kind.into(),
            missing,
        }
    }
}

/// Entities or models needed to describe resources for authorisation could not be resolved.
#[derive(Debug, thiserror::Error)]
#[error("unable to resolve '{kind}' resources with IDs {ids:?} for action '{action}'")]
pub struct ResolutionFailed {
    pub action: String,
    pub ids: Vec<i64>,
    pub kind: String,
}

impl ResolutionFailed {
    /// Resources of the given kind and IDs could not be resolved for the action.
    pub fn new<S1: Into<String>, S2: Into<String>>(kind: S1, action: S2, ids: &[i64]) -> Self {
        Self {
            action: action.into(),
            ids: ids.to_vec(),
            kind: kind.into(),
        }
    }
}

/// The policy-decision service denied the request.
#[derive(Debug, thiserror::Error)]
#[error("action '{action}' is not allowed on resources {resources}")]
pub struct AuthorizationDenied {
    pub action: String,
    pub resources: String,
}

impl AuthorizationDenied {
    /// Deny an action onto the described resources.
    pub fn deny<S1: Into<String>, S2: Into<String>>(action: S1, resources: S2) -> Self {
        Self {
            action: action.into(),
            resources: resources.into(),
        }
    }
}

/// The requested resource kind has no registered handler.
#[derive(Debug, thiserror::Error)]
#[error("resource kind '{kind}' is not supported")]
pub struct UnsupportedResourceKind {
    pub kind: String,
}

impl UnsupportedResourceKind {
    /// The given resource kind is not supported.
    pub fn new<S: Into<String>>(kind: S) -> Self {
        Self { kind: kind.into() }
    }
}

/// A server can not advertise the given address.
#[derive(Debug, thiserror::Error)]
#[error("register address '{address}' is not a valid advertisement")]
pub struct InvalidAddress {
    pub address: String,
}

impl InvalidAddress {
    /// The address is not valid for server registration.
    pub fn new<S: Into<String>>(address: S) -> Self {
        Self {
            address: address.into(),
        }
    }
}

/// The server registration was already performed.
#[derive(Debug, thiserror::Error)]
#[error("server is already registered at '{path}'")]
pub struct AlreadyRegistered {
    pub path: String,
}

impl AlreadyRegistered {
    /// The server is already registered at the given path.
    pub fn new<S: Into<String>>(path: S) -> Self {
        Self { path: path.into() }
    }
}

/// The operation requires the server to be registered first.
#[derive(Debug, thiserror::Error)]
#[error("server is not registered")]
pub struct NotRegistered;

/// The server registration was cancelled and can no longer be used.
#[derive(Debug, thiserror::Error)]
#[error("server registration was cancelled")]
pub struct RegistrationCancelled;

#[cfg(test)]
mod tests {
    use anyhow::Context;

    use super::ModelNotFound;
    use super::ResolutionFailed;
    use super::UpstreamQueryFailed;

    #[test]
    fn classify_nested_context() {
        let error: anyhow::Result<()> = Err(anyhow::anyhow!("connection reset"));
        let error = error
            .context(UpstreamQueryFailed::new("plat", "ids: [1]"))
            .context(ResolutionFailed::new("plat", "find", &[1]))
            .unwrap_err();
        assert!(error.is::<ResolutionFailed>());
        assert!(error.is::<UpstreamQueryFailed>());
        assert!(!error.is::<ModelNotFound>());
    }

    #[test]
    fn display_messages() {
        let error = ResolutionFailed::new("plat", "find", &[1, 2]);
        assert_eq!(
            error.to_string(),
            "unable to resolve 'plat' resources with IDs [1, 2] for action 'find'",
        );
        let error = ModelNotFound::new("plat");
        assert_eq!(error.to_string(), "model for family 'plat' was not found");
    }
}
