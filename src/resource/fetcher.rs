//! Resource Fetcher
//!
//! Walks a paged listing endpoint with `offset`/`limit` until the server runs
//! out of records, and keeps the last result for name lookups.

use super::cache::{CollectionCache, Snapshot};
use super::collection::{IndexBy, Listing, NameIndex, ResourceCollection, ResourceId, ResourceRecord};
use super::registry::ResourceDef;
use crate::redmine::transport::{Method, Transport, TransportError};
use serde_json::Value;

/// Page size used when none is configured (the server's own default)
pub const DEFAULT_PAGE_SIZE: u64 = 25;

/// Largest page the server will return
pub const MAX_PAGE_SIZE: u64 = 100;

/// Query parameters for a listing request, in caller order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.pairs.push((key.into(), value.to_string()));
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Numeric value of `key`; anything unparsable counts as absent
    fn number(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(|v| v.trim().parse().ok())
    }

    /// Everything except the pagination cursors, which the fetcher owns
    fn filters(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs
            .iter()
            .filter(|(k, _)| k != "offset" && k != "limit")
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: ToString> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(QueryParams::new(), |params, (k, v)| params.with(k, v))
    }
}

/// Result of one page request
struct Page {
    records: Vec<ResourceRecord>,
    total_count: Option<u64>,
}

/// Fetches complete collections from one listing endpoint
pub struct CollectionFetcher<T> {
    transport: T,
    /// Listing path including format suffix, e.g. `/projects.json`
    endpoint: String,
    collection_key: String,
    page_size: u64,
    cache: CollectionCache,
}

impl<T: Transport> CollectionFetcher<T> {
    pub fn new(transport: T, endpoint: impl Into<String>, collection_key: impl Into<String>) -> Self {
        Self {
            transport,
            endpoint: endpoint.into(),
            collection_key: collection_key.into(),
            page_size: DEFAULT_PAGE_SIZE,
            cache: CollectionCache::new(),
        }
    }

    pub fn for_resource(transport: T, def: &ResourceDef) -> Self {
        Self::new(transport, def.listing_path(), def.collection_key.clone())
    }

    /// Set the page size, clamped to what the server accepts
    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    /// Fetch every record matching `params`, page by page.
    ///
    /// A caller `offset` is the starting point and a caller `limit` caps the
    /// number of records retrieved overall. Stops on an empty page, a short
    /// page, or once the reported `total_count` is reached. A failed page
    /// fails the whole call.
    pub async fn fetch_all(&self, params: &QueryParams) -> Result<ResourceCollection, TransportError> {
        let mut offset = params.number("offset").unwrap_or(0);
        let cap = params.number("limit");

        let mut records: Vec<ResourceRecord> = Vec::new();
        let mut total_count = None;

        loop {
            let limit = match cap {
                Some(cap) => {
                    let left = cap.saturating_sub(records.len() as u64);
                    if left == 0 {
                        break;
                    }
                    left.min(self.page_size)
                }
                None => self.page_size,
            };

            let page = self.fetch_page(params, offset, limit).await?;
            let returned = page.records.len() as u64;
            tracing::trace!(
                "{}: offset={} limit={} returned={} total={:?}",
                self.endpoint,
                offset,
                limit,
                returned,
                page.total_count
            );

            records.extend(page.records);
            total_count = page.total_count;
            offset += returned;

            if returned == 0 || returned < limit {
                break;
            }
            if total_count.is_some_and(|total| offset >= total) {
                break;
            }
        }

        if let Some(cap) = cap {
            // Servers may ignore the requested page size
            records.truncate(usize::try_from(cap).unwrap_or(usize::MAX));
        }

        tracing::debug!("{}: fetched {} records", self.endpoint, records.len());
        Ok(ResourceCollection::new(records, total_count))
    }

    /// Fetch and remember the collection
    pub async fn all(&mut self, params: &QueryParams) -> Result<&ResourceCollection, TransportError> {
        let collection = self.fetch_all(params).await?;
        Ok(&self.cache.store(collection).collection)
    }

    /// Name/id listing, served from the cache unless `force_update` is set
    /// or nothing usable is cached yet
    pub async fn listing(
        &mut self,
        force_update: bool,
        params: &QueryParams,
        index_by: IndexBy,
    ) -> Result<Listing, TransportError> {
        self.refresh(force_update, params).await?;
        Ok(self
            .cache
            .get()
            .map(|s| s.index.to_listing(index_by))
            .unwrap_or_else(|| NameIndex::default().to_listing(index_by)))
    }

    /// Id of the record called `name`. A miss is `Ok(None)`.
    pub async fn get_id_by_name(
        &mut self,
        name: &str,
        params: &QueryParams,
    ) -> Result<Option<ResourceId>, TransportError> {
        self.refresh(false, params).await?;
        Ok(self.cache.get().and_then(|s| s.index.id_of(name)))
    }

    pub fn cached(&self) -> Option<&Snapshot> {
        self.cache.get()
    }

    pub fn invalidate(&mut self) {
        self.cache.invalidate();
    }

    async fn refresh(&mut self, force_update: bool, params: &QueryParams) -> Result<(), TransportError> {
        if force_update || !self.cache.is_cached() {
            let collection = self.fetch_all(params).await?;
            self.cache.store(collection);
        }
        Ok(())
    }

    async fn fetch_page(&self, params: &QueryParams, offset: u64, limit: u64) -> Result<Page, TransportError> {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(params.filters())
            .append_pair("offset", &offset.to_string())
            .append_pair("limit", &limit.to_string())
            .finish();
        let path = format!("{}?{}", self.endpoint, query);

        let response = self.transport.perform(Method::Get, &path, None).await?;
        self.parse_page(response.json()?)
    }

    /// Pull the record array and `total_count` out of a listing response
    fn parse_page(&self, page: Value) -> Result<Page, TransportError> {
        let Value::Object(mut page) = page else {
            return Err(TransportError::Malformed(format!(
                "{}: expected a JSON object",
                self.endpoint
            )));
        };

        let items = match page.remove(&self.collection_key) {
            Some(Value::Array(items)) => items,
            Some(_) => {
                return Err(TransportError::Malformed(format!(
                    "{}: `{}` is not an array",
                    self.endpoint, self.collection_key
                )))
            }
            None => {
                return Err(TransportError::Malformed(format!(
                    "{}: missing `{}`",
                    self.endpoint, self.collection_key
                )))
            }
        };

        let records = items
            .into_iter()
            .map(|item| match item {
                Value::Object(fields) => Ok(ResourceRecord::new(fields)),
                other => Err(TransportError::Malformed(format!(
                    "{}: record is not an object: {}",
                    self.endpoint, other
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page {
            records,
            total_count: page.get("total_count").and_then(Value::as_u64),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::redmine::transport::stub::StubTransport;
    use crate::redmine::transport::RawResponse;
    use serde_json::json;

    fn projects_page(ids: std::ops::Range<u64>, total: Option<u64>) -> Value {
        let projects: Vec<Value> = ids
            .map(|id| json!({"id": id, "name": format!("project-{id}")}))
            .collect();
        match total {
            Some(total) => json!({"projects": projects, "total_count": total}),
            None => json!({"projects": projects}),
        }
    }

    fn fetcher(stub: &StubTransport, page_size: u64) -> CollectionFetcher<StubTransport> {
        CollectionFetcher::new(stub.clone(), "/projects.json", "projects").with_page_size(page_size)
    }

    fn ids(collection: &ResourceCollection) -> Vec<u64> {
        collection.iter().filter_map(ResourceRecord::id).collect()
    }

    #[tokio::test]
    async fn fetches_every_page_in_order() {
        let stub = StubTransport::new();
        stub.reply_json(projects_page(0..2, Some(5)))
            .reply_json(projects_page(2..4, Some(5)))
            .reply_json(projects_page(4..5, Some(5)));

        let collection = fetcher(&stub, 2).fetch_all(&QueryParams::new()).await.unwrap();

        assert_eq!(ids(&collection), vec![0, 1, 2, 3, 4]);
        assert_eq!(collection.total_count, Some(5));
        let paths: Vec<_> = stub.calls().into_iter().map(|c| c.path).collect();
        assert_eq!(
            paths,
            vec![
                "/projects.json?offset=0&limit=2",
                "/projects.json?offset=2&limit=2",
                "/projects.json?offset=4&limit=2",
            ]
        );
    }

    #[tokio::test]
    async fn stops_when_total_reached_on_full_page() {
        let stub = StubTransport::new();
        stub.reply_json(projects_page(0..2, Some(4)))
            .reply_json(projects_page(2..4, Some(4)));

        let collection = fetcher(&stub, 2).fetch_all(&QueryParams::new()).await.unwrap();

        assert_eq!(collection.len(), 4);
        assert_eq!(stub.call_count(), 2);
    }

    #[tokio::test]
    async fn short_page_ends_pagination_before_total() {
        let stub = StubTransport::new();
        stub.reply_json(projects_page(0..3, Some(50)))
            .reply_json(projects_page(3..4, Some(50)));

        let collection = fetcher(&stub, 3).fetch_all(&QueryParams::new()).await.unwrap();

        assert_eq!(collection.len(), 4);
        assert_eq!(stub.call_count(), 2);
    }

    #[tokio::test]
    async fn full_last_page_without_total_costs_one_empty_request() {
        let stub = StubTransport::new();
        stub.reply_json(projects_page(0..2, None))
            .reply_json(projects_page(2..4, None))
            .reply_json(projects_page(0..0, None));

        let collection = fetcher(&stub, 2).fetch_all(&QueryParams::new()).await.unwrap();

        assert_eq!(collection.len(), 4);
        assert_eq!(collection.total_count, None);
        assert_eq!(stub.call_count(), 3);
    }

    #[tokio::test]
    async fn caller_filters_offset_and_limit() {
        let stub = StubTransport::new();
        stub.reply_json(projects_page(10..12, Some(100)))
            .reply_json(projects_page(12..13, Some(100)));

        let params = QueryParams::new()
            .with("status", 1)
            .with("offset", 10)
            .with("limit", 3);
        let collection = fetcher(&stub, 2).fetch_all(&params).await.unwrap();

        assert_eq!(ids(&collection), vec![10, 11, 12]);
        let paths: Vec<_> = stub.calls().into_iter().map(|c| c.path).collect();
        assert_eq!(
            paths,
            vec![
                "/projects.json?status=1&offset=10&limit=2",
                "/projects.json?status=1&offset=12&limit=1",
            ]
        );
    }

    #[tokio::test]
    async fn caller_limit_holds_when_server_returns_a_bigger_page() {
        let stub = StubTransport::new();
        stub.reply_json(projects_page(0..5, Some(50)));

        let params = QueryParams::new().with("limit", 3);
        let collection = fetcher(&stub, 25).fetch_all(&params).await.unwrap();

        assert_eq!(ids(&collection), vec![0, 1, 2]);
        assert_eq!(stub.call_count(), 1);
        assert_eq!(stub.calls()[0].path, "/projects.json?offset=0&limit=3");
    }

    #[tokio::test]
    async fn non_numeric_cursors_are_ignored() {
        let stub = StubTransport::new();
        stub.reply_json(projects_page(0..1, Some(1)));

        let params = QueryParams::new().with("offset", "x").with("limit", "all");
        fetcher(&stub, 25).fetch_all(&params).await.unwrap();

        assert_eq!(stub.calls()[0].path, "/projects.json?offset=0&limit=25");
    }

    #[tokio::test]
    async fn failure_mid_way_returns_error_only() {
        let stub = StubTransport::new();
        stub.reply_json(projects_page(0..2, Some(6))).reply_status(500);

        let err = fetcher(&stub, 2).fetch_all(&QueryParams::new()).await.unwrap_err();

        assert_eq!(err.status(), Some(500));
        assert_eq!(stub.call_count(), 2);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_snapshot() {
        let stub = StubTransport::new();
        stub.reply_json(projects_page(0..1, Some(1))).reply_status(503);

        let mut fetcher = fetcher(&stub, 25);
        fetcher.all(&QueryParams::new()).await.unwrap();
        assert!(fetcher
            .listing(true, &QueryParams::new(), IndexBy::NameToId)
            .await
            .is_err());
        assert_eq!(fetcher.cached().unwrap().index.id_of("project-0"), Some(0));
    }

    #[tokio::test]
    async fn missing_collection_key_is_malformed() {
        let stub = StubTransport::new();
        stub.reply_json(json!({"issues": []}));

        let err = fetcher(&stub, 25).fetch_all(&QueryParams::new()).await.unwrap_err();
        assert!(matches!(err, TransportError::Malformed(_)));
    }

    #[tokio::test]
    async fn html_body_is_a_decode_error() {
        let stub = StubTransport::new();
        stub.reply(RawResponse::new(200, "<html>login</html>"));

        let err = fetcher(&stub, 25).fetch_all(&QueryParams::new()).await.unwrap_err();
        assert!(matches!(err, TransportError::Decode(_)));
    }

    #[tokio::test]
    async fn listing_is_cached_until_forced() {
        let stub = StubTransport::new();
        stub.reply_json(projects_page(1..3, Some(2)))
            .reply_json(projects_page(1..4, Some(3)));
        let mut fetcher = fetcher(&stub, 25);

        let first = fetcher.listing(false, &QueryParams::new(), IndexBy::NameToId).await.unwrap();
        let second = fetcher.listing(false, &QueryParams::new(), IndexBy::NameToId).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(stub.call_count(), 1);

        let forced = fetcher.listing(true, &QueryParams::new(), IndexBy::NameToId).await.unwrap();
        assert_eq!(forced.len(), 3);
        assert_eq!(stub.call_count(), 2);
    }

    #[tokio::test]
    async fn invalidate_forces_next_fetch() {
        let stub = StubTransport::new();
        stub.reply_json(projects_page(1..2, Some(1)))
            .reply_json(projects_page(1..2, Some(1)));
        let mut fetcher = fetcher(&stub, 25);

        fetcher.get_id_by_name("project-1", &QueryParams::new()).await.unwrap();
        fetcher.invalidate();
        fetcher.get_id_by_name("project-1", &QueryParams::new()).await.unwrap();

        assert_eq!(stub.call_count(), 2);
    }

    #[tokio::test]
    async fn lookup_miss_is_none() {
        let stub = StubTransport::new();
        stub.reply_json(projects_page(1..3, Some(2)));
        let mut fetcher = fetcher(&stub, 25);

        assert_eq!(
            fetcher.get_id_by_name("does-not-exist", &QueryParams::new()).await.unwrap(),
            None
        );
        assert_eq!(
            fetcher.get_id_by_name("project-2", &QueryParams::new()).await.unwrap(),
            Some(2)
        );
        assert_eq!(stub.call_count(), 1);
    }

    #[tokio::test]
    async fn duplicate_names_resolve_to_later_record() {
        let stub = StubTransport::new();
        stub.reply_json(json!({
            "projects": [{"id": 1, "name": "X"}, {"id": 2, "name": "X"}],
            "total_count": 2
        }));
        let mut fetcher = fetcher(&stub, 25);

        let Listing::ByName(listing) = fetcher
            .listing(false, &QueryParams::new(), IndexBy::NameToId)
            .await
            .unwrap()
        else {
            panic!("expected name listing");
        };
        assert_eq!(listing.get("X"), Some(&2));
    }

    #[tokio::test]
    async fn empty_collection_gives_empty_listing_and_is_refetched() {
        let stub = StubTransport::new();
        stub.reply_json(projects_page(0..0, Some(0)))
            .reply_json(projects_page(0..0, Some(0)));
        let mut fetcher = fetcher(&stub, 25);

        let listing = fetcher.listing(false, &QueryParams::new(), IndexBy::IdToName).await.unwrap();
        assert!(listing.is_empty());
        assert!(matches!(listing, Listing::ById(_)));

        fetcher.listing(false, &QueryParams::new(), IndexBy::IdToName).await.unwrap();
        assert_eq!(stub.call_count(), 2);
    }

    #[test]
    fn page_size_is_clamped() {
        let stub = StubTransport::new();
        assert_eq!(fetcher(&stub, 0).page_size(), 1);
        assert_eq!(fetcher(&stub, 500).page_size(), MAX_PAGE_SIZE);
    }
}
