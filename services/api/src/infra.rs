use aid_engine::config::CatalogConfig;
use aid_engine::error::AppError;
use aid_engine::estimation::{
    standard_catalog, AidCatalogProvider, Bareme, CatalogSnapshot, JsonFileCatalogProvider,
    StaticCatalogProvider,
};
use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Catalog and barème shared read-only by every request of this process.
#[derive(Debug, Clone)]
pub(crate) struct ReferenceData {
    pub(crate) snapshot: CatalogSnapshot,
    pub(crate) bareme: Bareme,
}

impl ReferenceData {
    pub(crate) fn standard() -> Self {
        Self {
            snapshot: CatalogSnapshot::available(standard_catalog()),
            bareme: Bareme::standard(),
        }
    }
}

/// An unreadable catalog degrades to no aids; an unreadable barème is fatal.
pub(crate) fn load_reference_data(config: &CatalogConfig) -> Result<ReferenceData, AppError> {
    let provider: Box<dyn AidCatalogProvider> = match &config.catalog_path {
        Some(path) => Box::new(JsonFileCatalogProvider::new(path.clone())),
        None => Box::new(StaticCatalogProvider::new(standard_catalog())),
    };
    let snapshot = CatalogSnapshot::load(provider.as_ref());

    let bareme = match &config.bareme_path {
        Some(path) => {
            let file = File::open(path)?;
            let bareme = Bareme::from_csv_reader(BufReader::new(file))?;
            info!(path = %path.display(), brackets = bareme.brackets().len(), "barème loaded");
            bareme
        }
        None => Bareme::standard(),
    };

    Ok(ReferenceData { snapshot, bareme })
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn deserialize_optional_date<'de, D>(
    deserializer: D,
) -> Result<Option<NaiveDate>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    opt.map(|value| parse_date(&value).map_err(serde::de::Error::custom))
        .transpose()
}
