use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};

use crate::consts::COST_SCALE;
use crate::error::AppError;
use crate::pricing::PricingRecord;

/// Convert the compensation factor from its `f64` boundary form into an
/// exact decimal. The value goes through its shortest string representation
/// so no binary-float error enters the fixed-point arithmetic.
pub(crate) fn compensation_from_f64(value: f64) -> Result<Decimal, AppError> {
    let text = value.to_string();
    let parsed = if text.contains(['e', 'E']) {
        Decimal::from_scientific(&text)
    } else {
        Decimal::from_str(&text)
    };
    match parsed {
        Ok(dec) if dec >= Decimal::ZERO => Ok(dec),
        _ => Err(AppError::InvalidCompensation { input: text }),
    }
}

/// Total cost of one call: `compensation * (in_tokens * in_price +
/// out_tokens * out_price)`, quantized to exactly eight fractional digits
/// with half-up rounding. Missing prices count as zero so unresolved models
/// still produce a (zero) cost instead of aborting the flow.
pub(crate) fn compute_cost(
    pricing: &PricingRecord,
    input_tokens: u64,
    output_tokens: u64,
    compensation: Decimal,
) -> Decimal {
    let input_price = pricing.input_cost_per_token.unwrap_or(Decimal::ZERO);
    let output_price = pricing.output_cost_per_token.unwrap_or(Decimal::ZERO);

    let total = compensation
        * (Decimal::from(input_tokens) * input_price
            + Decimal::from(output_tokens) * output_price);

    let mut quantized =
        total.round_dp_with_strategy(COST_SCALE, RoundingStrategy::MidpointAwayFromZero);
    quantized.rescale(COST_SCALE);
    quantized
}
