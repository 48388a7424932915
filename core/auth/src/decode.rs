//! Decode authorised resource identifiers returned by the policy-decision service.
//!
//! Identifiers have been encoded in more than one way over time and a single response
//! can mix encodings, so each identifier is decoded independently by a chain of decoders.
//! The first decoder that recognises the encoding decides the result.
use std::sync::Arc;

use anyhow::Context;
use anyhow::Result;

use acbridge_errors::MalformedResourceID;
use acbridge_models::ResourceKind;

/// Decode one encoding of authorised resource identifiers.
pub trait IdDecoder: Send + Sync {
    /// Decode the raw identifier into a domain ID.
    ///
    /// Returns `None` if the identifier is not in the encoding handled by the decoder,
    /// so the next decoder in the chain can try.
    /// Returns `Some(Err)` if the encoding is recognised but the identifier is malformed.
    fn decode(&self, raw: &str) -> Option<Result<i64>>;
}

/// Identifiers in the legacy `<kind>:<id>` encoding.
pub struct LegacyPrefixDecoder {
    prefix: String,
}

impl LegacyPrefixDecoder {
    /// Decode identifiers prefixed with the wire name of the given kind.
    pub fn new(kind: ResourceKind) -> LegacyPrefixDecoder {
        let prefix = format!("{}:", kind.as_str());
        LegacyPrefixDecoder { prefix }
    }
}

impl IdDecoder for LegacyPrefixDecoder {
    fn decode(&self, raw: &str) -> Option<Result<i64>> {
        if !raw.starts_with(&self.prefix) {
            return None;
        }
        let parts: Vec<&str> = raw.split(':').collect();
        if parts.len() != 2 {
            let reason = format!("expected '{}<id>'", self.prefix);
            return Some(Err(MalformedResourceID::new(raw, reason).into()));
        }
        let id = parts[1]
            .parse::<i64>()
            .with_context(|| MalformedResourceID::new(raw, "ID is not an integer"));
        Some(id)
    }
}

/// Identifiers encoded as bare integers.
///
/// This decoder claims every identifier and is meant to be the last in the chain.
pub struct BareIntegerDecoder;

impl IdDecoder for BareIntegerDecoder {
    fn decode(&self, raw: &str) -> Option<Result<i64>> {
        let id = raw
            .parse::<i64>()
            .with_context(|| MalformedResourceID::new(raw, "ID is not an integer"));
        Some(id)
    }
}

/// Ordered chain of [`IdDecoder`]s.
#[derive(Clone, Default)]
pub struct IdDecoders {
    chain: Vec<Arc<dyn IdDecoder>>,
}

impl IdDecoders {
    /// Decode the legacy `<kind>:<id>` encoding first and bare integers otherwise.
    pub fn legacy_then_bare(kind: ResourceKind) -> IdDecoders {
        IdDecoders::default()
            .with(LegacyPrefixDecoder::new(kind))
            .with(BareIntegerDecoder)
    }

    /// Append a decoder to the end of the chain.
    pub fn with<D>(mut self, decoder: D) -> Self
    where
        D: IdDecoder + 'static,
    {
        self.chain.push(Arc::new(decoder));
        self
    }

    /// Decode a raw identifier with the first decoder that recognises its encoding.
    pub fn decode(&self, raw: &str) -> Result<i64> {
        for decoder in &self.chain {
            if let Some(result) = decoder.decode(raw) {
                return result;
            }
        }
        anyhow::bail!(MalformedResourceID::new(raw, "encoding not recognised"))
    }

    /// Decode all raw identifiers, preserving their order.
    ///
    /// Fails if any identifier can't be decoded.
    pub fn decode_all<S: AsRef<str>>(&self, raw: &[S]) -> Result<Vec<i64>> {
        raw.iter().map(|raw| self.decode(raw.as_ref())).collect()
    }
}
