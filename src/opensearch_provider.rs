use crate::config::AppConfig;
use crate::filter_record::FilterRecord;
use crate::provider::{canonical_location, AvailableFacets, Listing, SearchOutcome, SearchProvider};
use anyhow::{bail, Result};
use async_trait::async_trait;
use opensearch::http::transport::{SingleNodeConnectionPool, TransportBuilder};
use opensearch::{OpenSearch, SearchParts};
use serde_json::{json, Value};
use url::Url;

pub struct OpenSearchProvider {
    client: OpenSearch,
    index: String,
    result_limit: i64,
}

impl OpenSearchProvider {
    /// Build a client for `endpoint`, signing requests with AWS SigV4 when a
    /// region is configured.
    pub async fn connect(endpoint: &str, config: &AppConfig) -> Result<Self> {
        let url = Url::parse(endpoint)?;
        let conn_pool = SingleNodeConnectionPool::new(url);
        let mut builder = TransportBuilder::new(conn_pool);
        if let Some(region) = &config.aws_region {
            let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
                .region(aws_config::Region::new(region.clone()))
                .load()
                .await;
            builder = builder.auth(aws_config.clone().try_into()?);
        }
        let transport = builder.build()?;
        tracing::info!(%endpoint, index = %config.index, "connected to opensearch");
        Ok(Self {
            client: OpenSearch::new(transport),
            index: config.index.clone(),
            result_limit: config.result_limit,
        })
    }

    async fn run(&self, body: Value) -> Result<Value> {
        let response = self
            .client
            .search(SearchParts::Index(&[self.index.as_str()]))
            .body(body)
            .send()
            .await?;
        let status = response.status_code();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            bail!("OpenSearch returned {status}: {text}");
        }
        Ok(response.json().await?)
    }
}

/// Location-bound query. Only the location reaches the index; the other
/// facets refine the fetched set client-side.
pub fn search_body(record: &FilterRecord, size: i64) -> Value {
    json!({
        "query": {
            "match": {
                "location": {
                    "query": record.location.trim(),
                    "operator": "and"
                }
            }
        },
        "size": size
    })
}

pub fn facets_body() -> Value {
    json!({
        "size": 0,
        "aggs": {
            "locations": {
                "terms": {
                    "field": "location.keyword",
                    "size": 500,
                    "order": {"_key": "asc"}
                }
            },
            "home_types": {
                "terms": {
                    "field": "home_type.keyword",
                    "size": 50,
                    "order": {"_key": "asc"}
                }
            }
        }
    })
}

fn extract_bucket_keys(agg: &Value) -> Vec<String> {
    agg["buckets"]
        .as_array()
        .map(|buckets| {
            buckets
                .iter()
                .filter_map(|b| b["key"].as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

/// Pull listings and the total hit count out of a search response.
/// Hits that fail to deserialize are skipped.
pub fn parse_hits(body: &Value) -> Result<(Vec<Listing>, u64)> {
    let Some(hits) = body["hits"]["hits"].as_array() else {
        bail!("No hits in response");
    };
    let listings: Vec<Listing> = hits
        .iter()
        .filter_map(|hit| serde_json::from_value(hit["_source"].clone()).ok())
        .collect();
    let total = body["hits"]["total"]["value"]
        .as_u64()
        .unwrap_or(listings.len() as u64);
    Ok((listings, total))
}

#[async_trait]
impl SearchProvider for OpenSearchProvider {
    async fn search(&self, record: &FilterRecord) -> Result<SearchOutcome> {
        let body = self.run(search_body(record, self.result_limit)).await?;
        let (listings, total) = parse_hits(&body)?;
        tracing::debug!(hits = listings.len(), total, "opensearch search");
        Ok(SearchOutcome {
            location: canonical_location(&record.location, &listings),
            listings,
            total,
        })
    }

    async fn available_facets(&self) -> Result<AvailableFacets> {
        let body = self.run(facets_body()).await?;
        Ok(AvailableFacets {
            locations: extract_bucket_keys(&body["aggregations"]["locations"]),
            home_types: extract_bucket_keys(&body["aggregations"]["home_types"]),
        })
    }

    fn source_name(&self) -> &'static str {
        "opensearch"
    }
}
