//! Positional layout of the vehicle feature list.
//!
//! The detail page lists technical data as a run of `<dl>` blocks whose
//! order is fixed by the site; labels are not reliable, positions are.
//! Each technical-data column is read from one position and cut to a fixed width to
//! drop its unit. If the site layout moves, only this table changes.

use super::cleaner::{before_unit, clean_value, truncate_chars};
use super::parsers::ParseError;
use crate::models::{DetailEntry, VehicleSpecs};
use tracing::trace;

/// Post-processing applied to a cleaned value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trim {
    Keep,
    /// Keep this many leading characters.
    Width(usize),
    /// Text before the unit letter, minus the separating character.
    BeforeUnit(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRule {
    pub name: &'static str,
    pub index: usize,
    pub trim: Trim,
}

impl FieldRule {
    const fn new(name: &'static str, index: usize, trim: Trim) -> Self {
        Self { name, index, trim }
    }

    pub fn apply(&self, entries: &[DetailEntry]) -> Result<String, ParseError> {
        let value = extract(entries, self.index)?;
        let value = match self.trim {
            Trim::Keep => value,
            Trim::Width(w) => truncate_chars(&value, w),
            Trim::BeforeUnit(unit) => before_unit(&value, unit),
        };
        trace!("{} = {:?}", self.name, value);
        Ok(value)
    }
}

pub const ENGINE_SIZE: FieldRule = FieldRule::new("engine_size", 1, Trim::BeforeUnit('l'));
pub const FUEL_TYPE: FieldRule = FieldRule::new("fuel_type", 2, Trim::Keep);
pub const POWER: FieldRule = FieldRule::new("power", 3, Trim::Width(3));
pub const MAX_TORQUE: FieldRule = FieldRule::new("max_torque", 4, Trim::Keep);
pub const CERTIFICATION: FieldRule = FieldRule::new("certification", 5, Trim::Width(5));
pub const LENGTH: FieldRule = FieldRule::new("length", 6, Trim::Width(3));
pub const WIDTH: FieldRule = FieldRule::new("width", 7, Trim::Width(3));
pub const HEIGHT: FieldRule = FieldRule::new("height", 8, Trim::Width(3));
pub const WEIGHT: FieldRule = FieldRule::new("weight", 9, Trim::Width(4));
pub const BOOT_SPACE: FieldRule = FieldRule::new("boot_space", 12, Trim::Width(3));
pub const URBAN_CONS: FieldRule = FieldRule::new("urban_cons", 13, Trim::Width(3));
pub const EXTRA_CONS: FieldRule = FieldRule::new("extra_cons", 14, Trim::Width(3));
pub const COMBINED_CONS: FieldRule = FieldRule::new("combined_cons", 15, Trim::Width(3));
pub const CO2: FieldRule = FieldRule::new("co2", 17, Trim::Width(5));

/// Every technical-data column, in record order.
pub const SPEC_FIELDS: [FieldRule; 14] = [
    ENGINE_SIZE,
    FUEL_TYPE,
    POWER,
    MAX_TORQUE,
    CERTIFICATION,
    LENGTH,
    WIDTH,
    HEIGHT,
    WEIGHT,
    BOOT_SPACE,
    URBAN_CONS,
    EXTRA_CONS,
    COMBINED_CONS,
    CO2,
];

/// Cleaned value of the entry at `index`. A short list or an entry without
/// a `<dd>` means the page layout changed.
pub fn extract(entries: &[DetailEntry], index: usize) -> Result<String, ParseError> {
    entries
        .get(index)
        .and_then(|e| e.value.as_deref())
        .map(clean_value)
        .ok_or(ParseError::MissingEntry {
            index,
            len: entries.len(),
        })
}

/// Apply the whole table to a feature list.
pub fn extract_specs(entries: &[DetailEntry]) -> Result<VehicleSpecs, ParseError> {
    let [
        engine_size,
        fuel_type,
        power,
        max_torque,
        certification,
        length,
        width,
        height,
        weight,
        boot_space,
        urban_cons,
        extra_cons,
        combined_cons,
        co2,
    ] = SPEC_FIELDS.map(|rule| rule.apply(entries));

    Ok(VehicleSpecs {
        engine_size: engine_size?,
        fuel_type: fuel_type?,
        power: power?,
        max_torque: max_torque?,
        certification: certification?,
        length: length?,
        width: width?,
        height: height?,
        weight: weight?,
        boot_space: boot_space?,
        urban_cons: urban_cons?,
        extra_cons: extra_cons?,
        combined_cons: combined_cons?,
        co2: co2?,
    })
}
