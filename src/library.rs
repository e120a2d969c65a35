use std::path::Path;

use anyhow::Context as _;
use serde::Serialize;

use crate::backend::{self, ResourceSource};
use crate::cli::{LibraryCategoriesArgs, LibraryListArgs, LibraryResumeArgs};
use crate::formats::Resource;
use crate::query::{CategoryFilter, Page, ResourceQuery, SortBy};
use crate::session::{SessionStore, View, ViewState};
use crate::view::LibraryView;

pub async fn list(args: LibraryListArgs) -> anyhow::Result<()> {
    let query = ResourceQuery {
        search: args.search,
        category: CategoryFilter::from_name(Some(args.category.as_str())),
        subcategory: CategoryFilter::from_name(Some(args.subcategory.as_str())),
        sort_by: SortBy::from_name(&args.sort),
    };
    let source = backend::connect(args.catalog.as_deref().map(Path::new))?;
    let page = fetch_page(source.as_ref(), query.clone(), args.page).await?;
    print_json(&page)?;

    if let Some(session) = args.session {
        let store = SessionStore::new(session);
        store.save(&library_state(&query, page.page))?;
        tracing::debug!(session = %store.path().display(), "saved library session");
    }
    Ok(())
}

pub async fn resume(args: LibraryResumeArgs) -> anyhow::Result<()> {
    let store = SessionStore::new(&args.session);
    let Some(state) = store.load()? else {
        anyhow::bail!("no saved session at {}", args.session);
    };
    if state.view != View::Library {
        anyhow::bail!("saved session is not a library view: {:?}", state.view);
    }

    let query = ResourceQuery::from_params(&state.params);
    let page_number = state.param::<usize>("page").unwrap_or(1);
    tracing::info!(?query, page = page_number, "resuming library session");

    let source = backend::connect(args.catalog.as_deref().map(Path::new))?;
    let page = fetch_page(source.as_ref(), query, page_number).await?;
    print_json(&page)
}

pub async fn categories(args: LibraryCategoriesArgs) -> anyhow::Result<()> {
    let source = backend::connect(args.catalog.as_deref().map(Path::new))?;
    let categories = source
        .fetch_categories()
        .await
        .context("fetch categories")?;
    print_json(&categories)
}

pub async fn fetch_page(
    source: &dyn ResourceSource,
    query: ResourceQuery,
    page: usize,
) -> anyhow::Result<Page<Resource>> {
    let mut view = LibraryView::new(query);
    view.set_page(page);
    view.refresh(source).await.context("fetch resources")?;
    Ok(view.current_page())
}

pub fn library_state(query: &ResourceQuery, page: usize) -> ViewState {
    let mut params = query.to_params();
    params.insert("page".to_owned(), page.to_string());
    ViewState::with_params(View::Library, params)
}

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value).context("serialize output")?;
    println!("{json}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone as _, Utc};

    use super::*;
    use crate::backend::StaticSource;

    fn resource(name: &str, category: &str, day: u32) -> Resource {
        Resource {
            id: name.to_lowercase(),
            name: name.to_owned(),
            category: category.to_owned(),
            subcategory: "Notes".to_owned(),
            file_link: format!("https://example.com/{name}"),
            thumbnail: None,
            created_at: Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn fetch_page_applies_filters_and_pagination() -> anyhow::Result<()> {
        let resources = (1..=20)
            .map(|day| {
                let category = if day % 2 == 0 { "Physics" } else { "Chemistry" };
                resource(&format!("Doc {day:02}"), category, day)
            })
            .collect::<Vec<_>>();
        let source = StaticSource::new(resources);

        let query = ResourceQuery {
            category: CategoryFilter::Only("Physics".to_owned()),
            ..Default::default()
        };
        let page = fetch_page(&source, query, 1).await?;
        assert_eq!(page.total_items, 10);
        assert_eq!(page.items.len(), 10);
        assert_eq!(page.items[0].name, "Doc 20");

        let query = ResourceQuery {
            sort_by: SortBy::Title,
            ..Default::default()
        };
        let page = fetch_page(&source, query, 2).await?;
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.items.len(), 8);
        assert_eq!(page.items[0].name, "Doc 13");
        Ok(())
    }

    #[test]
    fn library_state_round_trips_query() {
        let query = ResourceQuery {
            search: Some("atoms".to_owned()),
            sort_by: SortBy::Title,
            ..Default::default()
        };
        let state = library_state(&query, 3);
        assert_eq!(state.view, View::Library);
        assert_eq!(state.param::<usize>("page"), Some(3));
        assert_eq!(ResourceQuery::from_params(&state.params), query);
    }
}
