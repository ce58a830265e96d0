//! Pipeline orchestrator: login → catalog walk → CSV export.
//!
//! The walk is strictly sequential over one session: every brand page is
//! read in home-page order, every vehicle in brand-page order, and records
//! reach the sink in exactly that order. Any error stops the run.

use crate::config::AppConfig;
use crate::export::CsvSink;
use crate::models::VehicleRecord;
use crate::scraper::cleaner::brand_label;
use crate::scraper::{CatalogScraper, CatalogSource};
use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::{info, trace};

pub struct Pipeline {
    config: AppConfig,
}

impl Pipeline {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub async fn run(&self, login: &str, password: &str) -> Result<RunStats> {
        let scraper =
            CatalogScraper::new(&self.config.scraper).context("Failed to build scraper")?;

        scraper.login(login, password).await.context("Login request failed")?;

        let export = &self.config.export;
        let mut sink = if export.stream {
            CsvSink::streaming(&export.path)
        } else {
            CsvSink::buffered(&export.path)
        };

        let walked = walk(&scraper, |record| Ok(sink.push(record)?)).await?;

        let output = sink.path().to_path_buf();
        let rows_written = sink
            .finish()
            .with_context(|| format!("Failed to export {:?}", output))?;

        let stats = RunStats {
            brands: walked.brands,
            vehicles: walked.vehicles,
            rows_written,
            output,
        };
        info!(
            "=== Done: {} brands | {} vehicles | {} rows → {:?} ===",
            stats.brands, stats.vehicles, stats.rows_written, stats.output
        );
        Ok(stats)
    }
}

/// Walk brands, then each brand's vehicles, handing every record to
/// `on_record` as soon as it is built.
pub async fn walk<S, F>(source: &S, mut on_record: F) -> Result<WalkStats>
where
    S: CatalogSource + ?Sized,
    F: FnMut(VehicleRecord) -> Result<()>,
{
    let brands = source.list_brands().await?;
    let mut vehicles = 0usize;

    for brand in &brands {
        info!("scraping brand: {}", brand_label(brand));

        let paths = source.list_vehicles(brand).await?;
        for path in &paths {
            let record = source.scrape_vehicle(path).await?;
            trace!("{}", record.data_row());
            on_record(record)?;
            vehicles += 1;
        }
    }

    Ok(WalkStats {
        brands: brands.len(),
        vehicles,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkStats {
    pub brands: usize,
    pub vehicles: usize,
}

#[derive(Debug)]
pub struct RunStats {
    pub brands: usize,
    pub vehicles: usize,
    pub rows_written: usize,
    pub output: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ExportConfig, ScraperConfig};
    use crate::models::tests::sample_record;
    use crate::scraper::parsers::tests::{COSTS, HOME, brand_page, detail_page};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use wiremock::matchers::{body_string_contains, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// In-memory catalog; vehicles are named after their path.
    struct FakeCatalog {
        brands: Vec<String>,
        vehicles: HashMap<String, Vec<String>>,
        broken: Option<String>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeCatalog {
        fn new() -> Self {
            Self {
                brands: Vec::new(),
                vehicles: HashMap::new(),
                broken: None,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn brand(mut self, brand: &str, vehicles: &[&str]) -> Self {
            self.brands.push(brand.to_string());
            self.vehicles.insert(
                brand.to_string(),
                vehicles.iter().map(|v| v.to_string()).collect(),
            );
            self
        }
    }

    #[async_trait]
    impl CatalogSource for FakeCatalog {
        async fn list_brands(&self) -> Result<Vec<String>> {
            Ok(self.brands.clone())
        }

        async fn list_vehicles(&self, brand_path: &str) -> Result<Vec<String>> {
            self.vehicles
                .get(brand_path)
                .cloned()
                .with_context(|| format!("no brand {brand_path}"))
        }

        async fn scrape_vehicle(&self, vehicle_path: &str) -> Result<VehicleRecord> {
            self.calls.lock().unwrap().push(vehicle_path.to_string());
            if self.broken.as_deref() == Some(vehicle_path) {
                anyhow::bail!("layout changed for {vehicle_path}");
            }
            Ok(sample_record(vehicle_path, "100"))
        }
    }

    #[test]
    fn test_walk_preserves_brand_then_vehicle_order() {
        let catalog = FakeCatalog::new()
            .brand("b=AUDI", &["audi/1?pi=1", "audi/2?pi=1"])
            .brand("b=FIAT", &["fiat/3?pi=2", "fiat/4?pi=2"]);
        let mut names = Vec::new();

        let stats = tokio_test::block_on(walk(&catalog, |r| {
            names.push(r.identity().name.clone());
            Ok(())
        }))
        .unwrap();

        assert_eq!(stats, WalkStats { brands: 2, vehicles: 4 });
        assert_eq!(names, ["audi/1?pi=1", "audi/2?pi=1", "fiat/3?pi=2", "fiat/4?pi=2"]);
    }

    #[test]
    fn test_walk_keeps_duplicate_vehicles() {
        let catalog = FakeCatalog::new()
            .brand("b=A", &["v/1?pi=1"])
            .brand("b=B", &["v/1?pi=1"]);
        let mut count = 0;
        tokio_test::block_on(walk(&catalog, |_| {
            count += 1;
            Ok(())
        }))
        .unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_walk_with_no_brands_yields_nothing() {
        let catalog = FakeCatalog::new();
        let mut count = 0;
        let stats = tokio_test::block_on(walk(&catalog, |_| {
            count += 1;
            Ok(())
        }))
        .unwrap();
        assert_eq!(stats, WalkStats { brands: 0, vehicles: 0 });
        assert_eq!(count, 0);
    }

    #[test]
    fn test_walk_stops_at_first_failure() {
        let mut catalog = FakeCatalog::new()
            .brand("b=AUDI", &["audi/1?pi=1", "audi/2?pi=1"])
            .brand("b=FIAT", &["fiat/3?pi=2"]);
        catalog.broken = Some("audi/2?pi=1".into());

        let result = tokio_test::block_on(walk(&catalog, |_| Ok(())));

        assert!(result.is_err());
        assert_eq!(*catalog.calls.lock().unwrap(), ["audi/1?pi=1", "audi/2?pi=1"]);
    }

    // ── Against a mock site ───────────────────────────────────────────────────

    async fn mount_site(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/login/login.do.jsp"))
            .and(body_string_contains("login=mario%40example.com"))
            .and(body_string_contains("password=s3cret"))
            .respond_with(ResponseTemplate::new(200).insert_header("set-cookie", "JSESSIONID=abc; Path=/"))
            .expect(1)
            .mount(server)
            .await;

        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(HOME))
            .mount(server)
            .await;

        for (brand, vehicles) in [
            ("AUDI", ["auto/101?pi=7", "auto/102?pi=7"]),
            ("FIAT", ["auto/201?pi=9", "auto/202?pi=9"]),
        ] {
            Mock::given(method("GET"))
                .and(path("/modelli.jsp"))
                .and(query_param("brand", brand))
                .respond_with(ResponseTemplate::new(200).set_body_string(brand_page(&vehicles)))
                .mount(server)
                .await;
        }

        Mock::given(method("GET"))
            .and(path("/inc/quotationVehicleBox.jsp"))
            .respond_with(ResponseTemplate::new(200).set_body_string(COSTS))
            .mount(server)
            .await;
    }

    async fn mount_vehicle(server: &MockServer, id: &str, name: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/auto/{id}")))
            .respond_with(ResponseTemplate::new(200).set_body_string(detail_page(name)))
            .mount(server)
            .await;
    }

    fn config_for(server: &MockServer, output: PathBuf, stream: bool) -> AppConfig {
        AppConfig {
            scraper: ScraperConfig {
                base_url: format!("{}/", server.uri()),
                ..Default::default()
            },
            export: ExportConfig {
                path: output,
                stream,
            },
        }
    }

    #[tokio::test]
    async fn test_run_exports_every_vehicle_in_order() {
        let server = MockServer::start().await;
        mount_site(&server).await;
        for (id, name) in [("101", "A3"), ("102", "A4"), ("201", "Panda"), ("202", "Tipo")] {
            mount_vehicle(&server, id, name).await;
        }

        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("cars.csv");
        let stats = Pipeline::new(config_for(&server, output.clone(), false))
            .run("mario@example.com", "s3cret")
            .await
            .unwrap();

        assert_eq!(stats.brands, 2);
        assert_eq!(stats.vehicles, 4);
        assert_eq!(stats.rows_written, 4);

        let csv = std::fs::read_to_string(&output).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], VehicleRecord::header_row());

        let names: Vec<&str> = lines[1..].iter().map(|l| l.split(',').nth(1).unwrap()).collect();
        assert_eq!(names, ["A3", "A4", "Panda", "Tipo"]);

        let expected_img = format!("{}/img/cars/A3.jpg", server.uri());
        let first: Vec<&str> = lines[1].split(',').collect();
        assert_eq!(first[0], expected_img);
        assert_eq!(first[2], "1.2");
        assert_eq!(first[15], "119");
        assert_eq!(first[16], "300.00");
        assert_eq!(first[17], "50.00");
        assert_eq!(first[18], "0.3");
        assert_eq!(first[19], "315.0");

        let requests = server.received_requests().await.unwrap();
        let cost_query = requests
            .iter()
            .find(|r| r.url.path() == "/inc/quotationVehicleBox.jsp")
            .and_then(|r| r.url.query())
            .unwrap()
            .to_string();
        assert_eq!(cost_query, "vehicle_id=101&pi=7");
    }

    #[tokio::test]
    async fn test_broken_vehicle_page_aborts_without_output() {
        let server = MockServer::start().await;
        mount_site(&server).await;
        mount_vehicle(&server, "101", "A3").await;
        Mock::given(method("GET"))
            .and(path("/auto/102"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<p>Sessione scaduta</p>"))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("cars.csv");
        let err = Pipeline::new(config_for(&server, output.clone(), false))
            .run("mario@example.com", "s3cret")
            .await
            .unwrap_err();

        assert!(format!("{err:#}").contains("auto/102"));
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_streaming_keeps_rows_before_failure() {
        let server = MockServer::start().await;
        mount_site(&server).await;
        mount_vehicle(&server, "101", "A3").await;
        Mock::given(method("GET"))
            .and(path("/auto/102"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<p>Sessione scaduta</p>"))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("cars.csv");
        let result = Pipeline::new(config_for(&server, output.clone(), true))
            .run("mario@example.com", "s3cret")
            .await;

        assert!(result.is_err());
        let csv = std::fs::read_to_string(&output).unwrap();
        assert_eq!(csv.lines().count(), 2);
    }
}
