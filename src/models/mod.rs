use crate::pricing::{self, PricingError, Quote};
use crate::scraper::cleaner::{normalise_separator, render_decimal};

// ── Raw page entries ──────────────────────────────────────────────────────────

/// One `<dl>` of a feature or cost list: `<dt>` label and `<dd>` text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailEntry {
    pub label: String,
    pub value: Option<String>,
}

/// The two figures lifted from a vehicle's cost page, currency marker removed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeaseCosts {
    pub monthly_cost: String,
    pub fringe_benefit: String,
}

// ── Vehicle parts ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VehicleIdentity {
    pub img_url: String,
    pub name: String,
}

/// Technical data, already trimmed to the widths prior exports used.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VehicleSpecs {
    pub engine_size: String,
    pub fuel_type: String,
    pub power: String,
    pub max_torque: String,
    pub certification: String,
    pub length: String,
    pub width: String,
    pub height: String,
    pub weight: String,
    pub boot_space: String,
    pub urban_cons: String,
    pub extra_cons: String,
    pub combined_cons: String,
    pub co2: String,
}

// ── Vehicle record ────────────────────────────────────────────────────────────

/// Column names, in the order every row is written.
pub const FIELD_NAMES: [&str; 20] = [
    "img_url",
    "name",
    "engine_size",
    "fuel_type",
    "power",
    "max_torque",
    "certification",
    "length",
    "width",
    "height",
    "weight",
    "boot_space",
    "urban_cons",
    "extra_cons",
    "combined_cons",
    "co2",
    "monthly_cost",
    "fringe_benefit",
    "benefit_taxable_percentage",
    "total_monthly_price",
];

/// One scraped vehicle. The quote is derived once, in [`VehicleRecord::new`],
/// and the record exposes no way to change it afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleRecord {
    identity: VehicleIdentity,
    specs: VehicleSpecs,
    costs: LeaseCosts,
    quote: Quote,
}

impl VehicleRecord {
    pub fn new(
        identity: VehicleIdentity,
        specs: VehicleSpecs,
        costs: LeaseCosts,
    ) -> Result<Self, PricingError> {
        let quote = pricing::compute(&costs.monthly_cost, &costs.fringe_benefit, &specs.co2)?;
        Ok(Self {
            identity,
            specs,
            costs,
            quote,
        })
    }

    pub fn identity(&self) -> &VehicleIdentity {
        &self.identity
    }

    pub fn taxable_percentage(&self) -> f64 {
        self.quote.taxable_percentage
    }

    pub fn total_monthly_price(&self) -> f64 {
        self.quote.total_monthly_price
    }

    /// Field values in [`FIELD_NAMES`] order, commas already turned into periods.
    pub fn values(&self) -> [String; 20] {
        let s = &self.specs;
        [
            self.identity.img_url.clone(),
            self.identity.name.clone(),
            s.engine_size.clone(),
            s.fuel_type.clone(),
            s.power.clone(),
            s.max_torque.clone(),
            s.certification.clone(),
            s.length.clone(),
            s.width.clone(),
            s.height.clone(),
            s.weight.clone(),
            s.boot_space.clone(),
            s.urban_cons.clone(),
            s.extra_cons.clone(),
            s.combined_cons.clone(),
            s.co2.clone(),
            self.costs.monthly_cost.clone(),
            self.costs.fringe_benefit.clone(),
            render_decimal(self.quote.taxable_percentage),
            render_decimal(self.quote.total_monthly_price),
        ]
        .map(|v| normalise_separator(&v))
    }

    pub fn header_row() -> String {
        FIELD_NAMES.join(",")
    }

    pub fn data_row(&self) -> String {
        self.values().join(",")
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
