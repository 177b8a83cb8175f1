//! Determinism fingerprinting — hashes a run's effective configuration into a
//! [`ConfigHash`] so external callers can detect "did I already run this
//! exact config" without re-running it. Purely a bookkeeping convenience at
//! the engine's edge; it plays no role in the per-bar model itself.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::ConfigHash;
use crate::engine::EngineConfig;

/// Plain snapshot of the RiskManager knobs that affect simulation output.
/// `sizer_kind` is a caller-supplied label (e.g. `"atr:0.01:2.0:0.20"`)
/// rather than the live `Box<dyn PositionSizer>`, since trait objects carry
/// no generic serialization.
#[derive(Debug, Clone, Serialize)]
pub struct RiskFingerprint {
    pub atr_period: usize,
    pub stop_atr_multiple: f64,
    pub tp_atr_multiple: f64,
    pub max_open_positions: usize,
    pub allow_short: bool,
    pub sizer_kind: String,
}

/// Plain snapshot of the Broker knobs that affect simulation output.
#[derive(Debug, Clone, Serialize)]
pub struct BrokerFingerprint {
    pub max_bars_pending: u32,
    pub slippage_kind: String,
    pub commission_kind: String,
}

#[derive(Debug, Clone, Serialize)]
struct EffectiveConfig {
    initial_capital: f64,
    risk_free_rate: f64,
    risk: RiskFingerprint,
    broker: BrokerFingerprint,
    strategy_ids: Vec<String>,
}

/// Hash the engine, risk, and broker configuration plus the registered
/// strategy identifiers into a [`ConfigHash`]. Two calls with field-for-field
/// equal inputs always produce the same hash, regardless of struct
/// declaration order, because the JSON is re-keyed through a `BTreeMap`
/// before hashing.
pub fn config_fingerprint(
    engine: &EngineConfig,
    risk: &RiskFingerprint,
    broker: &BrokerFingerprint,
    strategy_ids: &[&str],
) -> ConfigHash {
    let effective = EffectiveConfig {
        initial_capital: engine.initial_capital,
        risk_free_rate: engine.risk_free_rate,
        risk: risk.clone(),
        broker: broker.clone(),
        strategy_ids: strategy_ids.iter().map(|s| s.to_string()).collect(),
    };
    let value = serde_json::to_value(&effective).expect("fingerprint structs are always serializable");
    ConfigHash::from_bytes(canonical_json(&value).as_bytes())
}

/// Re-key every JSON object through a `BTreeMap` so the serialized form is
/// independent of field declaration order or `serde_json`'s default map type.
fn canonical_json(value: &serde_json::Value) -> String {
    fn canonicalize(value: &serde_json::Value) -> serde_json::Value {
        match value {
            serde_json::Value::Object(map) => {
                let sorted: BTreeMap<String, serde_json::Value> =
                    map.iter().map(|(k, v)| (k.clone(), canonicalize(v))).collect();
                serde_json::to_value(sorted).expect("BTreeMap<String, Value> always serializes")
            }
            serde_json::Value::Array(items) => serde_json::Value::Array(items.iter().map(canonicalize).collect()),
            other => other.clone(),
        }
    }
    canonicalize(value).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_risk() -> RiskFingerprint {
        RiskFingerprint {
            atr_period: 14,
            stop_atr_multiple: 2.0,
            tp_atr_multiple: 4.0,
            max_open_positions: 10,
            allow_short: false,
            sizer_kind: "atr:0.01:2.0:0.20".to_string(),
        }
    }

    fn sample_broker() -> BrokerFingerprint {
        BrokerFingerprint { max_bars_pending: 1, slippage_kind: "fixed:5bps".to_string(), commission_kind: "percent:0.001".to_string() }
    }

    #[test]
    fn identical_configs_hash_identically() {
        let engine = EngineConfig::default();
        let a = config_fingerprint(&engine, &sample_risk(), &sample_broker(), &["ma_cross"]);
        let b = config_fingerprint(&engine, &sample_risk(), &sample_broker(), &["ma_cross"]);
        assert_eq!(a, b);
    }

    #[test]
    fn differing_risk_param_changes_hash() {
        let engine = EngineConfig::default();
        let a = config_fingerprint(&engine, &sample_risk(), &sample_broker(), &["ma_cross"]);
        let mut risk2 = sample_risk();
        risk2.atr_period = 21;
        let b = config_fingerprint(&engine, &risk2, &sample_broker(), &["ma_cross"]);
        assert_ne!(a, b);
    }

    #[test]
    fn differing_strategy_set_changes_hash() {
        let engine = EngineConfig::default();
        let a = config_fingerprint(&engine, &sample_risk(), &sample_broker(), &["ma_cross"]);
        let b = config_fingerprint(&engine, &sample_risk(), &sample_broker(), &["donchian"]);
        assert_ne!(a, b);
    }
}
