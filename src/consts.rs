/// Default source for the model pricing table.
pub(crate) const LITELLM_PRICING_URL: &str =
    "https://raw.githubusercontent.com/BerriAI/litellm/main/model_prices_and_context_window.json";

/// How long a fetched pricing dataset stays fresh (memory and disk tiers).
pub(crate) const PRICING_CACHE_TTL_SECS: u64 = 5 * 24 * 60 * 60;

/// Fractional digits kept in every monetary value.
pub(crate) const COST_SCALE: u32 = 8;

/// Vendor qualifiers stripped from raw model names before resolution.
pub(crate) const MODEL_PREFIXES: &[&str] = &["openai/", "github/", "google_genai/", "deepseek/"];

/// Fine-tune markers stripped from raw model names before resolution.
pub(crate) const MODEL_SUFFIXES: &[&str] = &["-tuned"];

/// Fallback user identity when the caller does not supply one.
pub(crate) const UNKNOWN_USER: &str = "unknown";
