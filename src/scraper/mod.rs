pub mod cleaner;
pub mod fields;
pub mod http_client;
pub mod parsers;

use crate::config::ScraperConfig;
use crate::models::{VehicleIdentity, VehicleRecord};
use crate::pricing::PricingError;
use anyhow::Context;
use async_trait::async_trait;
use percent_encoding::percent_decode_str;
use tracing::{debug, info, trace};
use url::Url;

use self::cleaner::resolve_image_url;
use self::fields::extract_specs;
use self::http_client::HttpClient;
use self::parsers::{
    ParseError, parse_brand_list, parse_cost_page, parse_model_tables, parse_vehicle_page,
};

#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Url(#[from] url::ParseError),
    #[error("{url} is not valid UTF-8")]
    Encoding {
        url: String,
        source: std::string::FromUtf8Error,
    },
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

// ── Source trait ──────────────────────────────────────────────────────────────

/// The two listing levels of the catalog plus the per-vehicle scrape.
/// Paths are hrefs exactly as the pages print them.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn list_brands(&self) -> anyhow::Result<Vec<String>>;
    async fn list_vehicles(&self, brand_path: &str) -> anyhow::Result<Vec<String>>;
    async fn scrape_vehicle(&self, vehicle_path: &str) -> anyhow::Result<VehicleRecord>;
}

// ── Vehicle link tokens ───────────────────────────────────────────────────────

/// Tokens the cost page is addressed by, taken from a vehicle URL
/// such as `.../auto/4711?pi=22`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VehicleLink {
    pub vehicle_id: String,
    pub price_index: String,
}

impl VehicleLink {
    pub fn from_url(url: &Url) -> Result<Self, ParseError> {
        let invalid = || ParseError::VehicleUrl(url.to_string());

        let segment = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|s| !s.is_empty())
            .ok_or_else(invalid)?;
        // Path segments come back percent-encoded; the cost query encodes again.
        let vehicle_id = percent_decode_str(segment)
            .decode_utf8()
            .map_err(|_| invalid())?
            .into_owned();

        let (_, price_index) = url.query_pairs().next().ok_or_else(invalid)?;

        Ok(Self {
            vehicle_id,
            price_index: price_index.into_owned(),
        })
    }
}

// ── Configurator site ─────────────────────────────────────────────────────────

pub struct CatalogScraper {
    session: HttpClient,
    root: Url,
    login_url: Url,
    costs_url: Url,
}

impl CatalogScraper {
    pub fn new(config: &ScraperConfig) -> Result<Self, ScrapeError> {
        let root = Url::parse(&config.base_url)?;
        Ok(Self {
            session: HttpClient::new(config)?,
            login_url: root.join(&config.login_path)?,
            costs_url: root.join(&config.costs_path)?,
            root,
        })
    }

    /// Post the login form. The answer is not inspected: a failed login
    /// only shows up later as pages missing their content.
    pub async fn login(&self, login: &str, password: &str) -> Result<(), ScrapeError> {
        let status = self
            .session
            .post_form(&self.login_url, &[("login", login), ("password", password)])
            .await?;
        debug!("Login answered {}", status);
        Ok(())
    }

    /// Cost page URL for a vehicle.
    pub fn costs_url(&self, link: &VehicleLink) -> Url {
        let mut url = self.costs_url.clone();
        url.query_pairs_mut()
            .clear()
            .append_pair("vehicle_id", &link.vehicle_id)
            .append_pair("pi", &link.price_index);
        url
    }

    async fn fetch(&self, path: &str) -> Result<String, ScrapeError> {
        let url = self.root.join(path)?;
        Ok(self.session.get_text(&url).await?)
    }

    async fn fetch_vehicle(&self, vehicle_path: &str) -> Result<VehicleRecord, ScrapeError> {
        let url = self.root.join(vehicle_path)?;
        let page = parse_vehicle_page(&self.session.get_text(&url).await?)?;
        for entry in &page.features {
            trace!("{}: {:?}", entry.label, entry.value);
        }

        let identity = VehicleIdentity {
            img_url: resolve_image_url(self.root.as_str(), &page.photo_src),
            name: page.name,
        };
        let specs = extract_specs(&page.features)?;

        let link = VehicleLink::from_url(&url)?;
        let costs_html = self.session.get_utf8(&self.costs_url(&link)).await?;
        let costs = parse_cost_page(&costs_html)?;

        let record = VehicleRecord::new(identity, specs, costs)?;
        debug!(
            "{}: {:.2}/month (benefit share {})",
            record.identity().name,
            record.total_monthly_price(),
            record.taxable_percentage()
        );
        Ok(record)
    }
}

#[async_trait]
impl CatalogSource for CatalogScraper {
    async fn list_brands(&self) -> anyhow::Result<Vec<String>> {
        info!("scraping home");
        let html = self
            .fetch("")
            .await
            .with_context(|| format!("Failed to fetch home page {}", self.root))?;

        let brands = parse_brand_list(&html).context("Home page layout changed")?;
        debug!("{} brands", brands.len());
        Ok(brands)
    }

    async fn list_vehicles(&self, brand_path: &str) -> anyhow::Result<Vec<String>> {
        let html = self
            .fetch(brand_path)
            .await
            .with_context(|| format!("Failed to fetch brand page {}", brand_path))?;

        let vehicles = parse_model_tables(&html)
            .with_context(|| format!("Brand page layout changed: {}", brand_path))?;
        debug!("{}: {} vehicles", brand_path, vehicles.len());
        Ok(vehicles)
    }

    async fn scrape_vehicle(&self, vehicle_path: &str) -> anyhow::Result<VehicleRecord> {
        debug!("Scraping vehicle {}", vehicle_path);
        self.fetch_vehicle(vehicle_path)
            .await
            .with_context(|| format!("Failed to scrape vehicle {}", vehicle_path))
    }
}
