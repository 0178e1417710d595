use crate::filter_record::FilterRecord;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: String,
    pub address: String,
    /// Normalized "City, ST" string, the same shape the autocomplete resolves to.
    pub location: String,
    pub price: u64,
    #[serde(default)]
    pub beds: u32,
    #[serde(default)]
    pub baths: f32,
    #[serde(default)]
    pub sqft: u32,
    #[serde(default)]
    pub lot_sqft: Option<u32>,
    #[serde(default)]
    pub year_built: Option<u16>,
    #[serde(default)]
    pub home_type: String,
    #[serde(default)]
    pub days_on_market: u32,
    #[serde(default)]
    pub has_pool: bool,
    #[serde(default)]
    pub has_garage: bool,
    #[serde(default)]
    pub has_ac: bool,
    #[serde(default)]
    pub hoa_fee: Option<u32>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub listings: Vec<Listing>,
    pub total: u64,
    /// The provider's spelling of the searched location.
    pub location: String,
}

#[derive(Debug, Default)]
pub struct AvailableFacets {
    pub locations: Vec<String>,
    pub home_types: Vec<String>,
}

/// Backend that runs location-bound queries.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Fetch every listing for `record.location`. Other facets are applied
    /// client-side by the caller.
    async fn search(&self, record: &FilterRecord) -> Result<SearchOutcome>;

    async fn available_facets(&self) -> Result<AvailableFacets>;

    fn source_name(&self) -> &'static str;
}

/// Pick the provider's spelling of `query`: the location shared by most
/// hits, falling back to the trimmed query.
pub fn canonical_location(query: &str, listings: &[Listing]) -> String {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for listing in listings {
        match counts.iter_mut().find(|(loc, _)| *loc == listing.location) {
            Some((_, n)) => *n += 1,
            None => counts.push((listing.location.as_str(), 1)),
        }
    }
    counts
        .into_iter()
        .filter(|(loc, _)| !loc.is_empty())
        .max_by_key(|(_, n)| *n)
        .map(|(loc, _)| loc.to_string())
        .unwrap_or_else(|| query.trim().to_string())
}

fn sorted_unique(values: impl Iterator<Item = String>) -> Vec<String> {
    let mut values: Vec<String> = values.filter(|v| !v.is_empty()).collect();
    values.sort();
    values.dedup();
    values
}

/// Listings from a local JSON array, for offline use.
pub struct FileProvider {
    path: PathBuf,
}

impl FileProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn load(&self) -> Result<Vec<Listing>> {
        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("reading listings from {}", self.path.display()))?;
        let listings = serde_json::from_str(&contents)
            .with_context(|| format!("parsing listings in {}", self.path.display()))?;
        Ok(listings)
    }
}

#[async_trait]
impl SearchProvider for FileProvider {
    async fn search(&self, record: &FilterRecord) -> Result<SearchOutcome> {
        let query = record.location.trim().to_lowercase();
        let listings: Vec<Listing> = self
            .load()
            .await?
            .into_iter()
            .filter(|l| l.location.to_lowercase().contains(&query))
            .collect();
        tracing::debug!(path = %self.path.display(), hits = listings.len(), "file search");
        Ok(SearchOutcome {
            total: listings.len() as u64,
            location: canonical_location(&record.location, &listings),
            listings,
        })
    }

    async fn available_facets(&self) -> Result<AvailableFacets> {
        let listings = self.load().await?;
        Ok(AvailableFacets {
            locations: sorted_unique(listings.iter().map(|l| l.location.clone())),
            home_types: sorted_unique(listings.iter().map(|l| l.home_type.clone())),
        })
    }

    fn source_name(&self) -> &'static str {
        "file"
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;

    pub(crate) fn listing(id: &str, location: &str, price: u64) -> Listing {
        Listing {
            id: id.to_string(),
            address: format!("{id} Main St"),
            location: location.to_string(),
            price,
            beds: 3,
            baths: 2.0,
            sqft: 1800,
            lot_sqft: Some(6000),
            year_built: Some(1995),
            home_type: "House".to_string(),
            days_on_market: 10,
            has_pool: false,
            has_garage: false,
            has_ac: false,
            hoa_fee: None,
            description: String::new(),
            features: Vec::new(),
            url: format!("https://listings.example/{id}"),
        }
    }

    fn listings_file(listings: &[Listing]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(serde_json::to_string(listings).unwrap().as_bytes())
            .unwrap();
        file
    }

    #[test]
    fn canonical_location_prefers_most_common_hit() {
        let listings = vec![
            listing("1", "Burlington, VT", 1),
            listing("2", "South Burlington, VT", 1),
            listing("3", "Burlington, VT", 1),
        ];
        assert_eq!(canonical_location("burlington", &listings), "Burlington, VT");
        assert_eq!(canonical_location("  Nowhere  ", &[]), "Nowhere");
    }

    #[tokio::test]
    async fn file_provider_matches_location_case_insensitively() {
        let file = listings_file(&[
            listing("1", "Burlington, VT", 350_000),
            listing("2", "Stowe, VT", 900_000),
        ]);
        let provider = FileProvider::new(file.path());
        let record = FilterRecord {
            location: "burlington".to_string(),
            ..FilterRecord::default()
        };
        let outcome = provider.search(&record).await.unwrap();
        assert_eq!(outcome.total, 1);
        assert_eq!(outcome.listings[0].id, "1");
        assert_eq!(outcome.location, "Burlington, VT");
    }

    #[tokio::test]
    async fn file_provider_lists_facets() {
        let mut condo = listing("2", "Stowe, VT", 1);
        condo.home_type = "Condo".to_string();
        let file = listings_file(&[listing("1", "Burlington, VT", 1), condo]);
        let facets = FileProvider::new(file.path()).available_facets().await.unwrap();
        assert_eq!(facets.locations, vec!["Burlington, VT", "Stowe, VT"]);
        assert_eq!(facets.home_types, vec!["Condo", "House"]);
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let provider = FileProvider::new("/nonexistent/listings.json");
        assert!(provider.available_facets().await.is_err());
    }

    #[test]
    fn listing_fields_default_when_absent() {
        let parsed: Listing = serde_json::from_str(
            r#"{"id":"9","address":"1 Elm St","location":"Essex, VT","price":250000}"#,
        )
        .unwrap();
        assert_eq!(parsed.beds, 0);
        assert!(!parsed.has_pool);
        assert_eq!(parsed.hoa_fee, None);
    }
}
