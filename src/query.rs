use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization as _;
use unicode_normalization::char::is_combining_mark;

use crate::formats::{CategoryPair, Resource};

pub const PAGE_SIZE: usize = 12;

/// Filter value meaning "no category restriction".
pub const ALL: &str = "all";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    #[default]
    Newest,
    Title,
    /// Keeps the input order.
    Unsorted,
}

impl SortBy {
    /// Unrecognized names sort nothing.
    pub fn from_name(name: &str) -> Self {
        match name.trim() {
            "newest" => SortBy::Newest,
            "title" => SortBy::Title,
            _ => SortBy::Unsorted,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortBy::Newest => "newest",
            SortBy::Title => "title",
            SortBy::Unsorted => "unsorted",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(String),
}

impl CategoryFilter {
    pub fn from_name(name: Option<&str>) -> Self {
        match name.map(str::trim) {
            None | Some("") | Some(ALL) => CategoryFilter::All,
            Some(name) => CategoryFilter::Only(name.to_owned()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            CategoryFilter::All => ALL,
            CategoryFilter::Only(name) => name,
        }
    }

    /// Exact, case-sensitive equality.
    pub fn matches(&self, value: &str) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(name) => name == value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResourceQuery {
    pub search: Option<String>,
    pub category: CategoryFilter,
    pub subcategory: CategoryFilter,
    pub sort_by: SortBy,
}

impl ResourceQuery {
    /// The term exactly as entered; only `""` counts as no search.
    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().filter(|term| !term.is_empty())
    }

    pub fn matches(&self, resource: &Resource) -> bool {
        if let Some(term) = self.search_term()
            && !resource
                .name
                .to_lowercase()
                .contains(&term.to_lowercase())
        {
            return false;
        }
        self.category.matches(&resource.category) && self.subcategory.matches(&resource.subcategory)
    }

    /// Filters then sorts. The input is left untouched; ties keep input order.
    pub fn apply(&self, resources: &[Resource]) -> Vec<Resource> {
        let mut out = resources
            .iter()
            .filter(|r| self.matches(r))
            .cloned()
            .collect::<Vec<_>>();

        match self.sort_by {
            SortBy::Newest => out.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            SortBy::Title => out.sort_by(|a, b| compare_titles(&a.name, &b.name)),
            SortBy::Unsorted => {}
        }
        out
    }

    pub fn to_params(&self) -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();
        if let Some(term) = self.search_term() {
            params.insert("search".to_owned(), term.to_owned());
        }
        params.insert("category".to_owned(), self.category.as_str().to_owned());
        params.insert(
            "subcategory".to_owned(),
            self.subcategory.as_str().to_owned(),
        );
        params.insert("sort".to_owned(), self.sort_by.as_str().to_owned());
        params
    }

    pub fn from_params(params: &BTreeMap<String, String>) -> Self {
        Self {
            search: params.get("search").cloned(),
            category: CategoryFilter::from_name(params.get("category").map(String::as_str)),
            subcategory: CategoryFilter::from_name(params.get("subcategory").map(String::as_str)),
            sort_by: params
                .get("sort")
                .map(|s| SortBy::from_name(s))
                .unwrap_or_default(),
        }
    }
}

/// Collation-style ordering: base letters first, then accents, then case
/// with lowercase first.
pub fn compare_titles(a: &str, b: &str) -> Ordering {
    fold_diacritics(a)
        .cmp(&fold_diacritics(b))
        .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
        .then_with(|| b.cmp(a))
}

fn fold_diacritics(s: &str) -> String {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub per_page: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

/// Slices the 1-indexed window `[(page-1)*per_page, page*per_page)`.
///
/// Pages below 1 are treated as page 1; pages past the end are empty.
pub fn paginate<T: Clone>(items: &[T], page: usize, per_page: usize) -> Page<T> {
    let page = page.max(1);
    let total_items = items.len();
    if per_page == 0 {
        return Page {
            items: Vec::new(),
            page,
            per_page,
            total_items,
            total_pages: 0,
        };
    }

    let total_pages = total_items.div_ceil(per_page);
    let start = (page - 1).saturating_mul(per_page).min(total_items);
    let end = start.saturating_add(per_page).min(total_items);

    Page {
        items: items[start..end].to_vec(),
        page,
        per_page,
        total_items,
        total_pages,
    }
}

/// Distinct category pairs in first-seen order.
pub fn distinct_categories(resources: &[Resource]) -> Vec<CategoryPair> {
    let mut seen = HashSet::new();
    resources
        .iter()
        .map(Resource::category_pair)
        .filter(|pair| seen.insert(pair.clone()))
        .collect()
}

pub fn category_counts(resources: &[Resource]) -> Vec<(CategoryPair, usize)> {
    let mut counts: BTreeMap<CategoryPair, usize> = BTreeMap::new();
    for resource in resources {
        *counts.entry(resource.category_pair()).or_default() += 1;
    }
    counts.into_iter().collect()
}
