use rust_decimal::Decimal;

use crate::consts::{MODEL_PREFIXES, MODEL_SUFFIXES};
use crate::cost::compute_cost;
use crate::error::AppError;
use crate::ledger::{UsageLedger, UsageRecord};
use crate::pricing::{ModelResolver, PricingRecord, PricingSource};

/// Resolved outcome of one pricing lookup, for display.
#[derive(Debug)]
pub(crate) struct Resolution {
    pub(crate) query: String,
    pub(crate) canonical: Option<String>,
    pub(crate) pricing: PricingRecord,
}

/// Ties the pricing source, resolver and ledger together behind the calls
/// collaborators actually use: name in, cost and usage record out.
pub(crate) struct CostTracker {
    source: PricingSource,
    resolver: ModelResolver,
    ledger: UsageLedger,
    compensation: Decimal,
}

impl CostTracker {
    pub(crate) fn new(source: PricingSource, ledger: UsageLedger, compensation: Decimal) -> Self {
        Self {
            source,
            resolver: ModelResolver::new(),
            ledger,
            compensation,
        }
    }

    /// Resolve a raw model name against the current dataset. Fails only
    /// when the dataset itself cannot be obtained; a name with no match
    /// yields an empty pricing record.
    pub(crate) fn resolve_model(&self, raw_model: &str) -> Result<Resolution, AppError> {
        let query = sanitize_model_name(raw_model);
        let dataset = self.source.get_dataset()?;
        let canonical = self.resolver.resolve_key(&query, &dataset);
        let pricing = canonical
            .as_deref()
            .and_then(|key| dataset.get(key))
            .cloned()
            .unwrap_or_default();
        Ok(Resolution {
            query,
            canonical,
            pricing,
        })
    }

    /// Resolve, price and build the usage record for one completed call.
    /// An unresolved model prices as zero with a diagnostic on stderr.
    pub(crate) fn resolve_and_price(
        &self,
        raw_model: &str,
        input_tokens: u64,
        output_tokens: u64,
        user: &str,
    ) -> Result<(Decimal, UsageRecord), AppError> {
        let resolution = self.resolve_model(raw_model)?;
        if resolution.canonical.is_none() {
            eprintln!(
                "Info: model '{}' not found in pricing dataset, cost treated as zero",
                resolution.query
            );
        }
        let cost = compute_cost(
            &resolution.pricing,
            input_tokens,
            output_tokens,
            self.compensation,
        );
        let record = UsageRecord::new(user, &resolution.query, input_tokens, output_tokens, cost);
        Ok((cost, record))
    }

    /// [`CostTracker::resolve_and_price`] plus the ledger append. A failed
    /// append is logged and does not fail the call: the cost shown to the
    /// user must not depend on successful persistence.
    pub(crate) fn track(
        &self,
        raw_model: &str,
        input_tokens: u64,
        output_tokens: u64,
        user: &str,
    ) -> Result<(Decimal, UsageRecord), AppError> {
        let (cost, record) = self.resolve_and_price(raw_model, input_tokens, output_tokens, user)?;
        if let Err(e) = self.ledger.append(&record) {
            eprintln!("Warning: unable to update usage ledger: {e}");
        }
        Ok((cost, record))
    }

    pub(crate) fn ledger(&self) -> &UsageLedger {
        &self.ledger
    }
}

/// Strip known vendor prefixes and fine-tune suffixes, then lower-case and
/// trim. Runs before resolution so the resolver only ever sees bare names.
pub(crate) fn sanitize_model_name(name: &str) -> String {
    let mut name = name;
    for prefix in MODEL_PREFIXES {
        if let Some(stripped) = name.strip_prefix(prefix) {
            name = stripped;
        }
    }
    for suffix in MODEL_SUFFIXES {
        if let Some(stripped) = name.strip_suffix(suffix) {
            name = stripped;
        }
    }
    name.trim().to_lowercase()
}
