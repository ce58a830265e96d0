//! Monthly price derivation: lease cost plus the taxable share of the
//! fringe benefit, where the share is picked from CO2 emission tiers.

use crate::scraper::cleaner::normalise_separator;

/// Share applied when a vehicle has no CO2 figure (the most common tier).
pub const DEFAULT_TAXABLE_PERCENTAGE: f64 = 0.30;

/// Descending CO2 thresholds (g/km, exclusive) and the share above each.
const CO2_TIERS: [(f64, f64); 3] = [(190.0, 0.50), (160.0, 0.40), (60.0, 0.30)];

/// Share for anything at or below the lowest threshold.
const LOWEST_TIER: f64 = 0.25;

#[derive(Debug, thiserror::Error)]
pub enum PricingError {
    #[error("{field}: '{value}' is not a number")]
    InvalidNumber { field: &'static str, value: String },
}

/// Numeric result of a cost computation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quote {
    pub monthly_cost: f64,
    pub fringe_benefit: f64,
    pub taxable_percentage: f64,
    pub total_monthly_price: f64,
}

/// Parse a locale decimal ("312,50"). Blank parses as zero.
pub fn parse_decimal(field: &'static str, raw: &str) -> Result<f64, PricingError> {
    let s = normalise_separator(raw.trim());
    if s.is_empty() {
        return Ok(0.0);
    }
    s.parse().map_err(|_| PricingError::InvalidNumber {
        field,
        value: raw.to_string(),
    })
}

/// Taxable share of the fringe benefit for a CO2 figure.
/// Blank CO2 → default share without parsing.
pub fn taxable_percentage(co2_raw: &str) -> Result<f64, PricingError> {
    if co2_raw.trim().is_empty() {
        return Ok(DEFAULT_TAXABLE_PERCENTAGE);
    }
    let co2 = parse_decimal("co2", co2_raw)?;

    Ok(CO2_TIERS
        .iter()
        .find(|(threshold, _)| co2 > *threshold)
        .map(|(_, share)| *share)
        .unwrap_or(LOWEST_TIER))
}

/// total = monthly cost + fringe benefit × taxable share
pub fn compute(
    monthly_cost_raw: &str,
    fringe_benefit_raw: &str,
    co2_raw: &str,
) -> Result<Quote, PricingError> {
    let monthly_cost = parse_decimal("monthly_cost", monthly_cost_raw)?;
    let fringe_benefit = parse_decimal("fringe_benefit", fringe_benefit_raw)?;
    let taxable_percentage = taxable_percentage(co2_raw)?;

    Ok(Quote {
        monthly_cost,
        fringe_benefit,
        taxable_percentage,
        total_monthly_price: monthly_cost + fringe_benefit * taxable_percentage,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
