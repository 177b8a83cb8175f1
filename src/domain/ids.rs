//! Identifier types.
//!
//! - `OrderId` — process-unique, monotonic, formatted `ORD-NNNNNN`. Generation
//!   is scoped to a single [`IdGen`] owned by the `Engine` instance, never a
//!   module-level or global counter: two engines constructed back-to-back in
//!   the same process must each start counting from `ORD-000001` so that
//!   repeated runs on identical inputs are bit-identical (P6).
//! - `ConfigHash` — BLAKE3 digest of an effective run configuration, used by
//!   external callers for run-identity bookkeeping (see `fingerprint`).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Process-unique, run-scoped order identifier in `ORD-NNNNNN` form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OrderId(pub String);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Monotonic generator of [`OrderId`]s, owned by a single `Engine`.
///
/// Never make this a `static`/`lazy_static` counter — that was the exact bug
/// flagged against the reference implementation's module-scope counter,
/// which made back-to-back runs in one process diverge in their order ids.
#[derive(Debug, Default)]
pub struct IdGen {
    next: u64,
}

impl IdGen {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn next_order_id(&mut self) -> OrderId {
        let id = OrderId(format!("ORD-{:06}", self.next));
        self.next += 1;
        id
    }
}

/// 32-byte BLAKE3 hash wrapper with hex display/serde, used for config fingerprinting.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ConfigHash(pub [u8; 32]);

impl ConfigHash {
    pub fn from_bytes(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    pub fn as_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl fmt::Debug for ConfigHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConfigHash({})", &self.as_hex()[..16])
    }
}

impl fmt::Display for ConfigHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_hex())
    }
}

impl Serialize for ConfigHash {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.as_hex())
    }
}

impl<'de> Deserialize<'de> for ConfigHash {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(d)?;
        let bytes: Vec<u8> = (0..hex.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&hex[i..i + 2], 16))
            .collect::<Result<_, _>>()
            .map_err(serde::de::Error::custom)?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("expected 32 bytes"))?;
        Ok(Self(arr))
    }
}
