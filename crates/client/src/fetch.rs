//! Result fetching
//!
//! Runs a composed query and returns normalized hits. When the caller wants
//! every match and the first page comes back short, the query is re-issued
//! as a scroll, drained completely and re-sorted client-side.
//!
//! The client-side sort holds the whole drained result set in memory.

use esmeta_core::{
    compare_values, Error, Hit, QueryBuilder, QueryDocument, QueryResult, Result, SortOrder,
    SortSpec, DEFAULT_SCROLL_SIZE,
};
use tracing::{debug, error, warn};

use crate::client::MetadataClient;

/// Logs scan progress every time another 5% of the total is downloaded.
struct ScanProgress {
    total: u64,
    next_mark: f64,
}

impl ScanProgress {
    const STEP: f64 = 5.0;

    fn new(total: u64) -> Self {
        Self {
            total,
            next_mark: 0.0,
        }
    }

    fn record(&mut self, downloaded: usize) {
        if self.total == 0 {
            return;
        }
        let percent = 100.0 * downloaded as f64 / self.total as f64;
        if percent > self.next_mark {
            debug!(
                target: "esmeta::fetch",
                downloaded,
                "{:2.0}% downloaded",
                percent
            );
            while percent > self.next_mark {
                self.next_mark += Self::STEP;
            }
        }
    }
}

/// Stable sort of `hits` by a single key.
pub(crate) fn sort_hits(hits: &mut [Hit], spec: &SortSpec) {
    hits.sort_by(|a, b| {
        let ord = compare_values(a.sort_value(&spec.field), b.sort_value(&spec.field));
        match spec.order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    });
}

impl MetadataClient {
    /// Compose and execute a query.
    ///
    /// # Errors
    ///
    /// See [`compose`](QueryBuilder::compose) and
    /// [`execute_query`](Self::execute_query).
    pub fn query(&self, builder: QueryBuilder) -> Result<Option<QueryResult>> {
        let doc = builder.compose()?;
        self.execute_query(&doc)
    }

    /// Execute a composed query against the client's index.
    ///
    /// Returns `Ok(None)` when the index does not exist. With
    /// `doc.fetch_all` set, the returned hits are complete even when the
    /// engine's first page was truncated.
    ///
    /// # Errors
    ///
    /// - [`Error::Engine`] for any transport or engine failure
    /// - [`Error::UnsupportedSort`] when a scroll is needed and the query
    ///   sorts on more than one key
    pub fn execute_query(&self, doc: &QueryDocument) -> Result<Option<QueryResult>> {
        let index = self.index();
        if !self.engine.index_exists(index)? {
            self.log_missing_index();
            return Ok(None);
        }

        // The index can disappear between the existence check and the search.
        let response = match self.engine.search(index, &doc.to_json()) {
            Ok(response) => response,
            Err(e) if e.is_index_not_found() => {
                self.log_missing_index();
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        let total = response.total();
        let returned = response.hits.hits.len();

        let hits = if doc.fetch_all && total > returned as u64 {
            warn!(
                target: "esmeta::fetch",
                total,
                returned,
                size = doc.size,
                "Matched records exceed the returned page, switching to scroll"
            );
            self.scan_all(doc)?
        } else {
            response.hits.hits
        };

        Ok(Some(QueryResult {
            total,
            hits: hits.into_iter().map(Hit::normalize).collect(),
        }))
    }

    fn log_missing_index(&self) {
        error!(
            target: "esmeta::fetch",
            index = self.index(),
            host = %self.config.host,
            port = self.config.port,
            "Index does not exist"
        );
    }

    /// Drain every match of `doc` through the engine's scan, then apply the
    /// query's sort client-side.
    fn scan_all(&self, doc: &QueryDocument) -> Result<Vec<Hit>> {
        let sort_key = match doc.sort.as_deref() {
            Some(specs) if specs.len() > 1 => {
                let keys: Vec<&str> = specs.iter().map(|s| s.field.as_str()).collect();
                return Err(Error::UnsupportedSort(format!(
                    "scroll retrieval sorts on one key at most, got {:?}",
                    keys
                )));
            }
            Some(specs) => specs.first().cloned(),
            None => None,
        };

        let index = self.index();
        let total = self.engine.search(index, &doc.count_body())?.total();

        let mut hits = Vec::new();
        let mut progress = ScanProgress::new(total);
        for hit in self.engine.scan(index, &doc.scan_body(), DEFAULT_SCROLL_SIZE)? {
            hits.push(hit?);
            progress.record(hits.len());
        }
        debug!(target: "esmeta::fetch", count = hits.len(), "Number of hits found");

        if let Some(spec) = sort_key {
            debug!(
                target: "esmeta::fetch",
                field = %spec.field,
                order = spec.order.as_str(),
                "Sorting hits"
            );
            sort_hits(&mut hits, &spec);
        }
        Ok(hits)
    }
}
