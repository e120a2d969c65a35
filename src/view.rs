use crate::backend::ResourceSource;
use crate::formats::Resource;
use crate::query::{PAGE_SIZE, Page, ResourceQuery, paginate};

/// Identifies one fetch; only the newest ticket may replace the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FetchTicket(u64);

/// Library listing state: the active query, page, and the last accepted
/// snapshot from the resource source.
#[derive(Debug, Clone, Default)]
pub struct LibraryView {
    query: ResourceQuery,
    page: usize,
    snapshot: Vec<Resource>,
    issued: u64,
    applied: Option<u64>,
}

impl LibraryView {
    pub fn new(query: ResourceQuery) -> Self {
        Self {
            query,
            page: 1,
            ..Default::default()
        }
    }

    pub fn query(&self) -> &ResourceQuery {
        &self.query
    }

    pub fn page_number(&self) -> usize {
        self.page.max(1)
    }

    /// A new query returns to the first page and invalidates in-flight fetches.
    pub fn set_query(&mut self, query: ResourceQuery) -> FetchTicket {
        self.query = query;
        self.page = 1;
        self.begin_fetch()
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.issued += 1;
        FetchTicket(self.issued)
    }

    pub fn is_current(&self, ticket: FetchTicket) -> bool {
        ticket.0 == self.issued
    }

    /// Returns `false` and drops `resources` when a newer fetch was issued.
    pub fn complete_fetch(&mut self, ticket: FetchTicket, resources: Vec<Resource>) -> bool {
        if !self.is_current(ticket) {
            tracing::info!(
                ticket = ticket.0,
                latest = self.issued,
                "discarding stale fetch result"
            );
            return false;
        }
        self.snapshot = resources;
        self.applied = Some(ticket.0);
        true
    }

    pub fn has_snapshot(&self) -> bool {
        self.applied.is_some()
    }

    pub fn results(&self) -> Vec<Resource> {
        self.query.apply(&self.snapshot)
    }

    pub fn current_page(&self) -> Page<Resource> {
        paginate(&self.results(), self.page_number(), PAGE_SIZE)
    }

    pub async fn refresh(&mut self, source: &dyn ResourceSource) -> anyhow::Result<bool> {
        let ticket = self.begin_fetch();
        let resources = source.fetch_resources(&self.query).await?;
        Ok(self.complete_fetch(ticket, resources))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone as _, Utc};

    use super::*;
    use crate::backend::StaticSource;
    use crate::query::{CategoryFilter, SortBy};

    fn resource(id: &str, category: &str) -> Resource {
        Resource {
            id: id.to_owned(),
            name: id.to_owned(),
            category: category.to_owned(),
            subcategory: "General".to_owned(),
            file_link: format!("https://example.com/{id}"),
            thumbnail: None,
            created_at: Utc.timestamp_opt(0, 0).unwrap(),
        }
    }

    #[test]
    fn out_of_order_results_keep_the_newest_fetch() {
        let mut view = LibraryView::new(ResourceQuery::default());
        let first = view.begin_fetch();
        let second = view.set_query(ResourceQuery {
            category: CategoryFilter::Only("B".to_owned()),
            ..Default::default()
        });

        assert!(view.complete_fetch(second, vec![resource("b1", "B")]));
        assert!(!view.complete_fetch(first, vec![resource("a1", "A")]));

        let ids = view
            .results()
            .into_iter()
            .map(|r| r.id)
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["b1"]);
    }

    #[test]
    fn changing_query_resets_page() {
        let mut view = LibraryView::new(ResourceQuery::default());
        view.set_page(3);
        assert_eq!(view.page_number(), 3);
        view.set_query(ResourceQuery {
            sort_by: SortBy::Title,
            ..Default::default()
        });
        assert_eq!(view.page_number(), 1);
    }

    #[test]
    fn page_window_comes_from_snapshot() {
        let mut view = LibraryView::new(ResourceQuery {
            sort_by: SortBy::Unsorted,
            ..Default::default()
        });
        let ticket = view.begin_fetch();
        let resources = (0..20)
            .map(|i| resource(&format!("r{i:02}"), "X"))
            .collect::<Vec<_>>();
        assert!(view.complete_fetch(ticket, resources));

        view.set_page(2);
        let page = view.current_page();
        assert_eq!(page.total_items, 20);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.items.len(), 8);
        assert_eq!(page.items[0].id, "r12");
    }

    #[tokio::test]
    async fn refresh_pulls_from_source() -> anyhow::Result<()> {
        let source = StaticSource::fallback();
        let mut view = LibraryView::new(ResourceQuery {
            search: Some("python".to_owned()),
            ..Default::default()
        });
        assert!(!view.has_snapshot());
        assert!(view.refresh(&source).await?);
        assert!(view.has_snapshot());
        assert_eq!(view.current_page().items.len(), 1);
        Ok(())
    }
}
