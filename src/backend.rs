use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use url::Url;

use crate::catalog;
use crate::formats::{CategoryPair, Resource};
use crate::query::{CategoryFilter, ResourceQuery, SortBy, distinct_categories};

pub const BACKEND_URL_ENV: &str = "STUDYSHELF_BACKEND_URL";
pub const BACKEND_KEY_ENV: &str = "STUDYSHELF_BACKEND_KEY";

const RESOURCES_VIEW: &str = "pdf_library_view";
const CATEGORIES_TABLE: &str = "pdf_categories";

#[async_trait]
pub trait ResourceSource: Send + Sync {
    async fn fetch_resources(&self, query: &ResourceQuery) -> anyhow::Result<Vec<Resource>>;
    async fn fetch_categories(&self) -> anyhow::Result<Vec<CategoryPair>>;
    async fn fetch_resource(&self, id: &str) -> anyhow::Result<Option<Resource>>;
}

#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub base_url: Url,
    pub api_key: String,
}

impl BackendConfig {
    pub fn from_env() -> anyhow::Result<Option<Self>> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Returns `None` unless both the URL and the key are set and non-empty.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Option<Self>> {
        let url = lookup(BACKEND_URL_ENV)
            .map(|v| v.trim().to_owned())
            .filter(|v| !v.is_empty());
        let key = lookup(BACKEND_KEY_ENV)
            .map(|v| v.trim().to_owned())
            .filter(|v| !v.is_empty());
        let (Some(url), Some(api_key)) = (url, key) else {
            return Ok(None);
        };

        let base_url =
            Url::parse(&url).with_context(|| format!("parse {BACKEND_URL_ENV}: {url}"))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            anyhow::bail!("{BACKEND_URL_ENV} must be http/https: {url}");
        }
        Ok(Some(Self { base_url, api_key }))
    }
}

pub fn is_backend_configured() -> bool {
    matches!(BackendConfig::from_env(), Ok(Some(_)))
}

/// Picks a source: an explicit catalog file, then the hosted backend, then the
/// built-in fallback records.
pub fn connect(catalog_path: Option<&Path>) -> anyhow::Result<Arc<dyn ResourceSource>> {
    if let Some(path) = catalog_path {
        tracing::info!(catalog = %path.display(), "using catalog file");
        return Ok(Arc::new(StaticSource::from_file(path)?));
    }

    match BackendConfig::from_env().context("load backend config")? {
        Some(config) => {
            tracing::info!(base_url = %config.base_url, "using hosted backend");
            Ok(Arc::new(RestSource::new(config)))
        }
        None => {
            tracing::info!("backend not configured; using fallback data");
            Ok(Arc::new(StaticSource::fallback()))
        }
    }
}

/// In-memory records filtered client-side.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    resources: Vec<Resource>,
}

impl StaticSource {
    pub fn new(resources: Vec<Resource>) -> Self {
        Self { resources }
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let resources = catalog::read_catalog(path)?;
        Ok(Self::new(resources))
    }

    pub fn fallback() -> Self {
        Self::new(fallback_resources())
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }
}

#[async_trait]
impl ResourceSource for StaticSource {
    async fn fetch_resources(&self, query: &ResourceQuery) -> anyhow::Result<Vec<Resource>> {
        Ok(query.apply(&self.resources))
    }

    async fn fetch_categories(&self) -> anyhow::Result<Vec<CategoryPair>> {
        Ok(distinct_categories(&self.resources))
    }

    async fn fetch_resource(&self, id: &str) -> anyhow::Result<Option<Resource>> {
        Ok(self.resources.iter().find(|r| r.id == id).cloned())
    }
}

/// PostgREST-style hosted database.
#[derive(Debug, Clone)]
pub struct RestSource {
    client: reqwest::Client,
    config: BackendConfig,
}

impl RestSource {
    pub fn new(config: BackendConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn table_url(&self, table: &str) -> anyhow::Result<Url> {
        let base = self.config.base_url.as_str().trim_end_matches('/');
        Url::parse(&format!("{base}/rest/v1/{table}"))
            .with_context(|| format!("build table url: {table}"))
    }

    pub fn resources_url(&self, query: &ResourceQuery) -> anyhow::Result<Url> {
        let mut url = self.table_url(RESOURCES_VIEW)?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("select", "*");
            if let CategoryFilter::Only(category) = &query.category {
                pairs.append_pair("category", &format!("eq.{category}"));
            }
            if let CategoryFilter::Only(subcategory) = &query.subcategory {
                pairs.append_pair("subcategory", &format!("eq.{subcategory}"));
            }
            if let Some(term) = query.search_term() {
                pairs.append_pair("name", &format!("ilike.*{term}*"));
            }
            match query.sort_by {
                SortBy::Newest => {
                    pairs.append_pair("order", "created_at.desc");
                }
                SortBy::Title => {
                    pairs.append_pair("order", "name.asc");
                }
                SortBy::Unsorted => {}
            }
        }
        Ok(url)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> anyhow::Result<T> {
        tracing::debug!(%url, "backend request");
        let response = self
            .client
            .get(url.clone())
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
            .send()
            .await
            .with_context(|| format!("GET {url}"))?;

        let status = response.status();
        let raw = response.text().await.context("read backend response body")?;
        if !status.is_success() {
            let message = parse_error_message(&raw).unwrap_or(raw);
            anyhow::bail!("backend error ({status}): {message}");
        }
        serde_json::from_str(&raw).context("parse backend response")
    }
}

#[async_trait]
impl ResourceSource for RestSource {
    async fn fetch_resources(&self, query: &ResourceQuery) -> anyhow::Result<Vec<Resource>> {
        let url = self.resources_url(query)?;
        let resources: Vec<Resource> = self.get_json(url).await?;
        // Server collation differs from ours; re-applying is idempotent.
        Ok(query.apply(&resources))
    }

    async fn fetch_categories(&self) -> anyhow::Result<Vec<CategoryPair>> {
        let mut url = self.table_url(CATEGORIES_TABLE)?;
        url.query_pairs_mut()
            .append_pair("select", "category,subcategory")
            .append_pair("order", "category.asc");
        let pairs: Vec<CategoryPair> = self.get_json(url).await?;

        let mut seen = std::collections::HashSet::new();
        Ok(pairs
            .into_iter()
            .filter(|pair| seen.insert(pair.clone()))
            .collect())
    }

    async fn fetch_resource(&self, id: &str) -> anyhow::Result<Option<Resource>> {
        let mut url = self.table_url(RESOURCES_VIEW)?;
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("id", &format!("eq.{id}"));
        let resources: Vec<Resource> = self.get_json(url).await?;
        Ok(resources.into_iter().next())
    }
}

fn parse_error_message(raw_json: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(raw_json).ok()?;
    let message = value.get("message")?.as_str()?.to_owned();
    Some(message)
}

fn fallback_resources() -> Vec<Resource> {
    fn at(ts: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(ts)
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_default()
    }

    vec![
        Resource {
            id: "1".to_owned(),
            name: "100 Python Interview Questions".to_owned(),
            category: "Placement Material".to_owned(),
            subcategory: "C & DSA Notes".to_owned(),
            file_link: "https://drive.google.com/file/d/14M-9ZZmD9oAgE1UprFG7ywLpBi9CBCYV/view?usp=sharing".to_owned(),
            thumbnail: Some("https://lh3.googleusercontent.com/d/14M-9ZZmD9oAgE1UprFG7ywLpBi9CBCYV=s1024?authuser=0".to_owned()),
            created_at: at("2024-01-15T10:00:00Z"),
        },
        Resource {
            id: "2".to_owned(),
            name: "C Code for Raspberry Pi (92 pages)".to_owned(),
            category: "Placement Material".to_owned(),
            subcategory: "C & DSA Notes".to_owned(),
            file_link: "https://drive.google.com/file/d/1jkHSy8VI5u2etxcueN1SbVOpeLkN21l_/view?usp=sharing".to_owned(),
            thumbnail: Some("https://lh3.googleusercontent.com/d/1jkHSy8VI5u2etxcueN1SbVOpeLkN21l_=s1024?authuser=0".to_owned()),
            created_at: at("2024-01-12T15:30:00Z"),
        },
        Resource {
            id: "3".to_owned(),
            name: "Word Power Made Easy by Norman Lewis".to_owned(),
            category: "Placement Material".to_owned(),
            subcategory: "English".to_owned(),
            file_link: "https://drive.google.com/file/d/19LpQSN46RN_dt65cogaI8b4-6W9yGoVg/view?usp=sharing".to_owned(),
            thumbnail: Some("https://lh3.googleusercontent.com/d/19LpQSN46RN_dt65cogaI8b4-6W9yGoVg=s1024?authuser=0".to_owned()),
            created_at: at("2024-01-10T09:15:00Z"),
        },
    ]
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect::<HashMap<_, _>>();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn config_requires_url_and_key() -> anyhow::Result<()> {
        assert!(BackendConfig::from_lookup(lookup(&[]))?.is_none());
        assert!(
            BackendConfig::from_lookup(lookup(&[(BACKEND_URL_ENV, "https://db.example.com")]))?
                .is_none()
        );
        assert!(
            BackendConfig::from_lookup(lookup(&[
                (BACKEND_URL_ENV, "https://db.example.com"),
                (BACKEND_KEY_ENV, "  "),
            ]))?
            .is_none()
        );

        let config = BackendConfig::from_lookup(lookup(&[
            (BACKEND_URL_ENV, "https://db.example.com"),
            (BACKEND_KEY_ENV, "anon"),
        ]))?
        .ok_or_else(|| anyhow::anyhow!("expected config"))?;
        assert_eq!(config.base_url.host_str(), Some("db.example.com"));
        assert_eq!(config.api_key, "anon");
        Ok(())
    }

    #[test]
    fn config_rejects_non_http_url() {
        let result = BackendConfig::from_lookup(lookup(&[
            (BACKEND_URL_ENV, "ftp://db.example.com"),
            (BACKEND_KEY_ENV, "anon"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn resources_url_encodes_filters() -> anyhow::Result<()> {
        let source = RestSource::new(BackendConfig {
            base_url: Url::parse("https://db.example.com/")?,
            api_key: "anon".to_owned(),
        });
        let query = ResourceQuery {
            search: Some("python".to_owned()),
            category: CategoryFilter::Only("Placement Material".to_owned()),
            subcategory: CategoryFilter::All,
            sort_by: SortBy::Title,
        };
        let url = source.resources_url(&query)?;
        assert_eq!(url.path(), "/rest/v1/pdf_library_view");

        let pairs = url.query_pairs().into_owned().collect::<Vec<_>>();
        assert!(pairs.contains(&("category".to_owned(), "eq.Placement Material".to_owned())));
        assert!(pairs.contains(&("name".to_owned(), "ilike.*python*".to_owned())));
        assert!(pairs.contains(&("order".to_owned(), "name.asc".to_owned())));
        assert!(!pairs.iter().any(|(k, _)| k == "subcategory"));
        Ok(())
    }

    #[tokio::test]
    async fn fallback_source_filters_and_sorts() -> anyhow::Result<()> {
        let source = StaticSource::fallback();
        assert_eq!(source.resources().len(), 3);

        let query = ResourceQuery {
            category: CategoryFilter::Only("Placement Material".to_owned()),
            subcategory: CategoryFilter::Only("English".to_owned()),
            ..Default::default()
        };
        let out = source.fetch_resources(&query).await?;
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "3");

        let newest = source.fetch_resources(&ResourceQuery::default()).await?;
        let ids = newest.iter().map(|r| r.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["1", "2", "3"]);

        let categories = source.fetch_categories().await?;
        assert_eq!(categories.len(), 2);

        assert!(source.fetch_resource("2").await?.is_some());
        assert!(source.fetch_resource("404").await?.is_none());
        Ok(())
    }
}
