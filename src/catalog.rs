use std::path::Path;
use std::sync::LazyLock;

use anyhow::Context as _;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;

use crate::cli::{CatalogAddArgs, CatalogImportArgs, CatalogRemoveArgs, CatalogStatsArgs};
use crate::formats::{CategoryPair, ImportGroup, ImportResource, Resource};
use crate::query::category_counts;

static DRIVE_FILE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/d/([a-zA-Z0-9_-]+)").expect("valid drive file id regex"));

pub fn import(args: CatalogImportArgs) -> anyhow::Result<()> {
    let groups_json = std::fs::read_to_string(&args.groups)
        .with_context(|| format!("read import groups: {}", args.groups))?;
    let groups: Vec<ImportGroup> =
        serde_json::from_str(&groups_json).context("parse import groups")?;

    let catalog_path = Path::new(&args.catalog);
    let mut resources = read_catalog_or_empty(catalog_path)?;
    let imported = resources_from_groups(&groups, Utc::now());
    let count = imported.len();
    merge(&mut resources, imported);
    write_catalog(catalog_path, &resources)?;

    tracing::info!(
        imported = count,
        total = resources.len(),
        catalog = %catalog_path.display(),
        "catalog import"
    );
    Ok(())
}

pub fn add(args: CatalogAddArgs) -> anyhow::Result<()> {
    if args.name.trim().is_empty() {
        anyhow::bail!("resource name is empty");
    }
    if args.file_link.trim().is_empty() {
        anyhow::bail!("resource file link is empty");
    }

    let catalog_path = Path::new(&args.catalog);
    let mut resources = read_catalog_or_empty(catalog_path)?;
    let resource = new_resource(
        &CategoryPair {
            category: args.category,
            subcategory: args.subcategory,
        },
        &ImportResource {
            name: args.name,
            file_link: args.file_link,
            thumbnail: args.thumbnail,
            description: None,
        },
        Utc::now(),
    );
    let id = resource.id.clone();
    tracing::info!(%id, name = %resource.name, "catalog add");
    merge(&mut resources, vec![resource]);
    write_catalog(catalog_path, &resources)?;
    println!("{id}");
    Ok(())
}

pub fn remove(args: CatalogRemoveArgs) -> anyhow::Result<()> {
    let catalog_path = Path::new(&args.catalog);
    let mut resources = read_catalog(catalog_path)?;
    let before = resources.len();
    resources.retain(|r| r.id != args.id);
    if resources.len() == before {
        anyhow::bail!("resource not found in catalog: {}", args.id);
    }
    tracing::info!(id = %args.id, "catalog remove");
    write_catalog(catalog_path, &resources)
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogStats {
    pub total_categories: usize,
    pub total_resources: usize,
    pub categories: Vec<CategoryCount>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryCount {
    #[serde(flatten)]
    pub pair: CategoryPair,
    pub resource_count: usize,
}

pub fn stats(args: CatalogStatsArgs) -> anyhow::Result<()> {
    let resources = read_catalog(Path::new(&args.catalog))?;
    let stats = compute_stats(&resources);
    serde_json::to_writer_pretty(std::io::stdout().lock(), &stats)
        .context("write catalog stats")?;
    println!();
    Ok(())
}

pub fn compute_stats(resources: &[Resource]) -> CatalogStats {
    let categories = category_counts(resources)
        .into_iter()
        .map(|(pair, resource_count)| CategoryCount {
            pair,
            resource_count,
        })
        .collect::<Vec<_>>();
    CatalogStats {
        total_categories: categories.len(),
        total_resources: resources.len(),
        categories,
    }
}

pub fn resources_from_groups(groups: &[ImportGroup], now: DateTime<Utc>) -> Vec<Resource> {
    groups
        .iter()
        .flat_map(|group| {
            let pair = CategoryPair {
                category: group.category.clone(),
                subcategory: group.subcategory.clone(),
            };
            group
                .resources
                .iter()
                .map(move |item| new_resource(&pair, item, now))
        })
        .collect()
}

fn new_resource(pair: &CategoryPair, item: &ImportResource, now: DateTime<Utc>) -> Resource {
    let thumbnail = item
        .thumbnail
        .clone()
        .filter(|t| !t.trim().is_empty())
        .or_else(|| drive_thumbnail(&item.file_link));
    Resource {
        id: resource_id(&item.file_link),
        name: item.name.trim().to_owned(),
        category: pair.category.clone(),
        subcategory: pair.subcategory.clone(),
        file_link: item.file_link.trim().to_owned(),
        thumbnail,
        created_at: now,
    }
}

/// Stable id derived from the file link, so re-importing replaces records.
pub fn resource_id(file_link: &str) -> String {
    use sha2::Digest as _;
    let mut hasher = sha2::Sha256::new();
    hasher.update(file_link.trim().as_bytes());
    format!("r_{}", hex::encode(hasher.finalize()))
}

pub fn drive_thumbnail(file_link: &str) -> Option<String> {
    let captures = DRIVE_FILE_ID.captures(file_link)?;
    let file_id = captures.get(1)?.as_str();
    Some(format!(
        "https://lh3.googleusercontent.com/d/{file_id}=s1024?authuser=0"
    ))
}

/// Replaces records with matching ids in place; appends the rest.
fn merge(resources: &mut Vec<Resource>, incoming: Vec<Resource>) {
    for resource in incoming {
        match resources.iter_mut().find(|r| r.id == resource.id) {
            Some(existing) => *existing = resource,
            None => resources.push(resource),
        }
    }
}

pub fn read_catalog(path: &Path) -> anyhow::Result<Vec<Resource>> {
    let bytes =
        std::fs::read(path).with_context(|| format!("read catalog: {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("parse catalog: {}", path.display()))
}

fn read_catalog_or_empty(path: &Path) -> anyhow::Result<Vec<Resource>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    read_catalog(path)
}

pub fn write_catalog(path: &Path, resources: &[Resource]) -> anyhow::Result<()> {
    write_json_atomic(path, &resources)
}

pub(crate) fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create parent dir: {}", parent.display()))?;
    }

    let tmp_path = path.with_extension(format!("tmp.{}", uuid::Uuid::new_v4().simple()));
    let data = serde_json::to_vec_pretty(value).context("serialize json")?;
    std::fs::write(&tmp_path, &data)
        .with_context(|| format!("write tmp: {}", tmp_path.display()))?;
    std::fs::rename(&tmp_path, path)
        .with_context(|| format!("rename tmp to final: {}", path.display()))?;
    Ok(())
}
