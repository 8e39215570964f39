use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use rust_decimal::Decimal;

/// Pricing table exactly as fetched, before shape validation of the entries.
pub(crate) type RawDataset = HashMap<String, serde_json::Value>;

/// Per-token prices for one model. Fields absent from the dataset stay
/// `None` and price as zero downstream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct PricingRecord {
    pub(crate) input_cost_per_token: Option<Decimal>,
    pub(crate) output_cost_per_token: Option<Decimal>,
}

/// Validated pricing table for one fetch cycle. Immutable once built;
/// replaced wholesale on refresh.
#[derive(Debug, Default)]
pub(crate) struct PricingDataset {
    models: HashMap<String, PricingRecord>,
    /// Lower-cased key -> canonical key. BTreeMap so every scan over the
    /// keys is deterministic regardless of hash order.
    lower_index: BTreeMap<String, String>,
}

impl PricingDataset {
    /// Build from the raw JSON map. Entries whose value is not an object
    /// are rejected here and never enter the dataset.
    pub(crate) fn from_raw(raw: &RawDataset) -> Self {
        let mut models = HashMap::with_capacity(raw.len());
        let mut lower_index = BTreeMap::new();

        for (name, value) in raw {
            let Some(fields) = value.as_object() else {
                continue;
            };
            let record = PricingRecord {
                input_cost_per_token: fields
                    .get("input_cost_per_token")
                    .and_then(decimal_from_json),
                output_cost_per_token: fields
                    .get("output_cost_per_token")
                    .and_then(decimal_from_json),
            };
            lower_index.insert(name.to_lowercase(), name.clone());
            models.insert(name.clone(), record);
        }

        Self {
            models,
            lower_index,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.models.len()
    }

    pub(crate) fn get(&self, canonical: &str) -> Option<&PricingRecord> {
        self.models.get(canonical)
    }

    /// Exact lookup by lower-cased key, returning the canonical name.
    pub(crate) fn canonical_for(&self, lower: &str) -> Option<&str> {
        self.lower_index.get(lower).map(String::as_str)
    }

    /// (lower-cased key, canonical key) pairs in deterministic order.
    pub(crate) fn keys_lower(&self) -> impl Iterator<Item = (&str, &str)> {
        self.lower_index
            .iter()
            .map(|(lower, canonical)| (lower.as_str(), canonical.as_str()))
    }

    #[cfg(test)]
    pub(crate) fn from_entries(entries: &[(&str, PricingRecord)]) -> Self {
        let mut models = HashMap::new();
        let mut lower_index = BTreeMap::new();
        for (name, record) in entries {
            lower_index.insert(name.to_lowercase(), name.to_string());
            models.insert(name.to_string(), record.clone());
        }
        Self {
            models,
            lower_index,
        }
    }
}

/// Convert a JSON price into an exact decimal. Numbers go through their
/// literal text so no binary-float artifact ends up in the fixed-point
/// value; scientific notation ("2.5e-07") is accepted.
fn decimal_from_json(value: &serde_json::Value) -> Option<Decimal> {
    let text = match value {
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(s) => s.trim().to_string(),
        _ => return None,
    };
    if text.contains(['e', 'E']) {
        Decimal::from_scientific(&text).ok()
    } else {
        Decimal::from_str(&text).ok()
    }
}
