use crate::models::{DetailEntry, LeaseCosts};
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

use super::cleaner::strip_currency;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Missing element: {0}")]
    MissingElement(&'static str),
    #[error("<{element}> without {attribute} attribute")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },
    #[error("Feature list has {len} entries, none usable at position {index}")]
    MissingEntry { index: usize, len: usize },
    #[error("Cannot derive vehicle tokens from URL: {0}")]
    VehicleUrl(String),
}

// ── Selectors ─────────────────────────────────────────────────────────────────

fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid selector {css}: {e:?}"))
}

static BRAND_LIST: LazyLock<Selector> = LazyLock::new(|| selector("ul.brandlist"));
static LI: LazyLock<Selector> = LazyLock::new(|| selector("li"));
static ANCHOR: LazyLock<Selector> = LazyLock::new(|| selector("a"));
static MODEL_TABLE: LazyLock<Selector> = LazyLock::new(|| selector("div.table-modelli"));
static VEHICLE_CELL: LazyLock<Selector> = LazyLock::new(|| selector("td.al"));
static PHOTO: LazyLock<Selector> = LazyLock::new(|| selector("img.car_photo_big"));
static BREADCRUMBS: LazyLock<Selector> = LazyLock::new(|| selector("div.breadcrumbs"));
static CURRENT: LazyLock<Selector> = LazyLock::new(|| selector("li.current"));
static FEATURES: LazyLock<Selector> = LazyLock::new(|| selector("div.car_features"));
static DL: LazyLock<Selector> = LazyLock::new(|| selector("dl"));
static DT: LazyLock<Selector> = LazyLock::new(|| selector("dt"));
static DD: LazyLock<Selector> = LazyLock::new(|| selector("dd"));

fn elem_text(element: ElementRef) -> String {
    element.text().collect::<String>()
}

/// `href` of the first anchor under `element`.
fn first_href(element: ElementRef) -> Result<String, ParseError> {
    let a = element
        .select(&ANCHOR)
        .next()
        .ok_or(ParseError::MissingElement("a"))?;
    a.value()
        .attr("href")
        .map(str::to_string)
        .ok_or(ParseError::MissingAttribute {
            element: "a",
            attribute: "href",
        })
}

/// Each `<dl>` under `root` as (first `<dt>`, first `<dd>`) raw text.
fn detail_entries(root: ElementRef) -> Vec<DetailEntry> {
    root.select(&DL)
        .map(|dl| DetailEntry {
            label: dl
                .select(&DT)
                .next()
                .map(|dt| elem_text(dt).trim().to_string())
                .unwrap_or_default(),
            value: dl.select(&DD).next().map(elem_text),
        })
        .collect()
}

// ── Catalog pages ─────────────────────────────────────────────────────────────

/// Brand page paths from the home page, in document order.
pub fn parse_brand_list(html: &str) -> Result<Vec<String>, ParseError> {
    let doc = Html::parse_document(html);
    let list = doc
        .select(&BRAND_LIST)
        .next()
        .ok_or(ParseError::MissingElement("ul.brandlist"))?;

    list.select(&LI).map(first_href).collect()
}

/// Vehicle page paths from a brand page: every model table, every vehicle
/// cell, in document order. Duplicates are kept.
pub fn parse_model_tables(html: &str) -> Result<Vec<String>, ParseError> {
    let doc = Html::parse_document(html);
    let mut tables = doc.select(&MODEL_TABLE).peekable();
    if tables.peek().is_none() {
        return Err(ParseError::MissingElement("div.table-modelli"));
    }

    let mut paths = Vec::new();
    for table in tables {
        for cell in table.select(&VEHICLE_CELL) {
            paths.push(first_href(cell)?);
        }
    }
    Ok(paths)
}

// ── Vehicle pages ─────────────────────────────────────────────────────────────

/// Raw pieces of a vehicle detail page.
#[derive(Debug, Clone, PartialEq)]
pub struct VehiclePage {
    pub photo_src: String,
    pub name: String,
    pub features: Vec<DetailEntry>,
}

pub fn parse_vehicle_page(html: &str) -> Result<VehiclePage, ParseError> {
    let doc = Html::parse_document(html);

    let photo_src = doc
        .select(&PHOTO)
        .next()
        .ok_or(ParseError::MissingElement("img.car_photo_big"))?
        .value()
        .attr("src")
        .ok_or(ParseError::MissingAttribute {
            element: "img.car_photo_big",
            attribute: "src",
        })?
        .to_string();

    let name = doc
        .select(&BREADCRUMBS)
        .next()
        .ok_or(ParseError::MissingElement("div.breadcrumbs"))?
        .select(&CURRENT)
        .next()
        .ok_or(ParseError::MissingElement("div.breadcrumbs li.current"))
        .map(|li| elem_text(li).trim().to_string())?;

    let features = doc
        .select(&FEATURES)
        .next()
        .map(detail_entries)
        .ok_or(ParseError::MissingElement("div.car_features"))?;

    Ok(VehiclePage {
        photo_src,
        name,
        features,
    })
}

/// Monthly cost from the first cost entry, fringe benefit from the last.
pub fn parse_cost_page(html: &str) -> Result<LeaseCosts, ParseError> {
    let doc = Html::parse_document(html);
    let entries = detail_entries(doc.root_element());

    let value_at = |index: usize| {
        entries
            .get(index)
            .and_then(|e| e.value.as_deref())
            .map(strip_currency)
            .ok_or(ParseError::MissingEntry {
                index,
                len: entries.len(),
            })
    };

    Ok(LeaseCosts {
        monthly_cost: value_at(0)?,
        fringe_benefit: value_at(entries.len().saturating_sub(1))?,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
