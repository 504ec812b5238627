//! Group-sequential tile downloads.

use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use tracing::{debug, info, warn};

use super::FetchError;
use crate::coord::TileCoord;
use crate::provider::TileSource;
use crate::tile::Tile;

/// Default number of tiles fetched at once.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Default pause between groups, a courtesy to public tile servers.
pub const DEFAULT_GROUP_PAUSE: Duration = Duration::from_millis(100);

/// Default per-tile timeout.
pub const DEFAULT_TILE_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetcher tuning.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchConfig {
    /// Tiles per group; at most this many requests are in flight.
    pub concurrency: usize,
    /// Upper bound for one tile request, retries excluded.
    pub timeout: Duration,
    /// Sleep between groups. Zero disables the pause.
    pub group_pause: Duration,
    /// Extra attempts per tile before the download fails.
    pub max_retries: u32,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            timeout: DEFAULT_TILE_TIMEOUT,
            group_pause: DEFAULT_GROUP_PAUSE,
            max_retries: 0,
        }
    }
}

impl FetchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the group size. Values below 1 are treated as 1.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_group_pause(mut self, pause: Duration) -> Self {
        self.group_pause = pause;
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }
}

/// Number of sequential groups needed for `total` tiles.
pub fn group_count(total: usize, concurrency: usize) -> usize {
    total.div_ceil(concurrency.max(1))
}

/// Downloads tile sets from a [`TileSource`] in bounded groups.
///
/// Tiles are fetched `concurrency` at a time. A group must settle completely
/// before the next one starts, so no more than `concurrency` requests are ever
/// in flight. The first failure aborts the whole download.
pub struct TileFetcher<S: TileSource> {
    source: S,
    config: FetchConfig,
}

impl<S: TileSource> TileFetcher<S> {
    pub fn new(source: S, config: FetchConfig) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Downloads and encodes every tile in `coords`.
    ///
    /// `on_progress` receives `completed / total` after each tile settles and
    /// ends at exactly `1.0`. An empty list reports `1.0` once.
    ///
    /// # Errors
    ///
    /// Returns the first [`FetchError`] encountered. Outstanding requests of
    /// the current group are dropped and no tiles are returned.
    pub async fn download_tiles<F>(
        &self,
        coords: &[TileCoord],
        mut on_progress: F,
    ) -> Result<Vec<Tile>, FetchError>
    where
        F: FnMut(f64),
    {
        let total = coords.len();
        if total == 0 {
            on_progress(1.0);
            return Ok(Vec::new());
        }

        let concurrency = self.config.concurrency.max(1);
        let groups = group_count(total, concurrency);
        info!(
            source = self.source.name(),
            tiles = total,
            groups,
            concurrency,
            "Starting tile download"
        );

        let mut tiles = Vec::with_capacity(total);

        for (index, group) in coords.chunks(concurrency).enumerate() {
            let mut pending: FuturesUnordered<_> =
                group.iter().map(|&coord| self.fetch_one(coord)).collect();

            while let Some(result) = pending.next().await {
                match result {
                    Ok(tile) => {
                        tiles.push(tile);
                        on_progress(tiles.len() as f64 / total as f64);
                    }
                    Err(e) => {
                        warn!(
                            error = %e,
                            group = index + 1,
                            completed = tiles.len(),
                            total,
                            "Tile download aborted"
                        );
                        return Err(e);
                    }
                }
            }

            debug!(group = index + 1, groups, completed = tiles.len(), "Group settled");

            if index + 1 < groups && !self.config.group_pause.is_zero() {
                tokio::time::sleep(self.config.group_pause).await;
            }
        }

        info!(tiles = tiles.len(), "Tile download complete");
        Ok(tiles)
    }

    /// Fetches one tile, applying the timeout and retry budget.
    async fn fetch_one(&self, coord: TileCoord) -> Result<Tile, FetchError> {
        let mut attempt = 0u32;
        loop {
            let error = match tokio::time::timeout(self.config.timeout, self.source.fetch_tile(coord))
                .await
            {
                Ok(Ok(bytes)) => return Ok(Tile::from_bytes(coord, &bytes)),
                Ok(Err(source)) => FetchError::Provider { tile: coord, source },
                Err(_) => FetchError::Timeout {
                    tile: coord,
                    timeout_ms: self.config.timeout.as_millis() as u64,
                },
            };

            if attempt >= self.config.max_retries {
                return Err(error);
            }
            attempt += 1;
            debug!(tile = %coord, attempt, error = %error, "Retrying tile");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::coord::{tile_range, GeoBounds};
    use crate::provider::{
        sample_png, AsyncHttpClient, ProviderError, ScriptedHttpClient, UrlTemplateProvider,
    };

    fn downtown_tiles() -> Vec<TileCoord> {
        let bounds = GeoBounds::new(37.79, 37.77, -122.39, -122.42).unwrap();
        tile_range(&bounds, 15).unwrap().iter().collect()
    }

    fn quick_config(concurrency: usize) -> FetchConfig {
        FetchConfig::new()
            .with_concurrency(concurrency)
            .with_group_pause(Duration::ZERO)
    }

    fn fetcher(
        client: ScriptedHttpClient,
        concurrency: usize,
    ) -> TileFetcher<UrlTemplateProvider<ScriptedHttpClient>> {
        TileFetcher::new(
            UrlTemplateProvider::openstreetmap(client),
            quick_config(concurrency),
        )
    }

    #[test]
    fn test_group_count() {
        assert_eq!(group_count(12, 4), 3);
        assert_eq!(group_count(13, 4), 4);
        assert_eq!(group_count(1, 4), 1);
        assert_eq!(group_count(0, 4), 0);
        assert_eq!(group_count(5, 0), 5);
    }

    #[test]
    fn test_config_builder() {
        let config = FetchConfig::new()
            .with_concurrency(0)
            .with_timeout(Duration::from_secs(5))
            .with_max_retries(2);

        assert_eq!(config.concurrency, 1);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.group_pause, DEFAULT_GROUP_PAUSE);
    }

    #[tokio::test]
    async fn test_downloads_every_tile() {
        let body = sample_png(4, 4, [0, 0, 255, 255]);
        let fetcher = fetcher(ScriptedHttpClient::new(body), 4);
        let coords = downtown_tiles();

        let tiles = fetcher.download_tiles(&coords, |_| {}).await.unwrap();

        assert_eq!(tiles.len(), 12);
        let fetched: HashSet<_> = tiles.iter().map(Tile::coord).collect();
        let expected: HashSet<_> = coords.iter().copied().collect();
        assert_eq!(fetched, expected);
        assert!(tiles.iter().all(|t| t.data.starts_with("data:image/png;base64,")));
    }

    #[tokio::test]
    async fn test_in_flight_never_exceeds_concurrency() {
        let fetcher = fetcher(ScriptedHttpClient::new(vec![1, 2, 3]), 4);
        let coords = downtown_tiles();

        fetcher.download_tiles(&coords, |_| {}).await.unwrap();

        let client = fetcher.source().http_client();
        assert_eq!(client.max_in_flight(), 4);
        assert_eq!(client.request_count(), 12);
    }

    #[tokio::test]
    async fn test_groups_run_in_order() {
        let fetcher = fetcher(ScriptedHttpClient::new(vec![1]), 4);
        let coords = downtown_tiles();

        fetcher.download_tiles(&coords, |_| {}).await.unwrap();

        let requested = fetcher.source().http_client().requested.lock().clone();
        for (group, chunk) in coords.chunks(4).enumerate() {
            let expected: HashSet<_> = chunk
                .iter()
                .map(|&c| fetcher.source().build_url(c))
                .collect();
            let actual: HashSet<_> = requested[group * 4..group * 4 + chunk.len()]
                .iter()
                .cloned()
                .collect();
            assert_eq!(actual, expected, "group {} out of order", group);
        }
    }

    #[tokio::test]
    async fn test_progress_is_monotonic_and_ends_at_one() {
        let fetcher = fetcher(ScriptedHttpClient::new(vec![1]), 4);
        let coords = downtown_tiles();
        let mut reports = Vec::new();

        fetcher
            .download_tiles(&coords, |p| reports.push(p))
            .await
            .unwrap();

        assert_eq!(reports.len(), 12);
        assert!(reports.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(*reports.last().unwrap(), 1.0);
        assert!((reports[10] - 11.0 / 12.0).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_two_tile_progress() {
        let fetcher = fetcher(ScriptedHttpClient::new(vec![1]), 4);
        let coords = [TileCoord::new(0, 0, 1), TileCoord::new(1, 0, 1)];
        let mut reports = Vec::new();

        fetcher
            .download_tiles(&coords, |p| reports.push(p))
            .await
            .unwrap();

        assert_eq!(reports, vec![0.5, 1.0]);
    }

    #[tokio::test]
    async fn test_empty_request_reports_complete() {
        let fetcher = fetcher(ScriptedHttpClient::new(vec![1]), 4);
        let mut reports = Vec::new();

        let tiles = fetcher.download_tiles(&[], |p| reports.push(p)).await.unwrap();

        assert!(tiles.is_empty());
        assert_eq!(reports, vec![1.0]);
    }

    #[tokio::test]
    async fn test_single_failure_fails_whole_download() {
        // Index 4 opens the second group.
        let coords = downtown_tiles();
        let failing = format!("/15/{}/{}.png", coords[4].x, coords[4].y);
        let client = ScriptedHttpClient::new(vec![1]).failing_on(&failing);
        let fetcher = fetcher(client, 4);

        let result = fetcher.download_tiles(&coords, |_| {}).await;

        match result {
            Err(FetchError::Provider { tile, .. }) => assert_eq!(tile, coords[4]),
            other => panic!("Expected provider failure, got {:?}", other.map(|t| t.len())),
        }
        // The third group never starts.
        assert_eq!(fetcher.source().http_client().request_count(), 8);
    }

    /// Fails the first `failures` requests, then succeeds.
    struct FlakyClient {
        failures: usize,
        calls: AtomicUsize,
    }

    impl AsyncHttpClient for FlakyClient {
        async fn get(&self, _url: &str) -> Result<Vec<u8>, ProviderError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(ProviderError::HttpError("HTTP 503".to_string()))
            } else {
                Ok(vec![7])
            }
        }
    }

    #[tokio::test]
    async fn test_retries_recover_transient_failure() {
        let client = FlakyClient {
            failures: 2,
            calls: AtomicUsize::new(0),
        };
        let fetcher = TileFetcher::new(
            UrlTemplateProvider::openstreetmap(client),
            quick_config(4).with_max_retries(2),
        );

        let tiles = fetcher
            .download_tiles(&[TileCoord::new(0, 0, 0)], |_| {})
            .await
            .unwrap();
        assert_eq!(tiles.len(), 1);
    }

    #[tokio::test]
    async fn test_no_retry_by_default() {
        let client = FlakyClient {
            failures: 1,
            calls: AtomicUsize::new(0),
        };
        let fetcher = TileFetcher::new(UrlTemplateProvider::openstreetmap(client), quick_config(4));

        let result = fetcher
            .download_tiles(&[TileCoord::new(0, 0, 0)], |_| {})
            .await;
        assert!(matches!(result, Err(FetchError::Provider { .. })));
    }

    /// Never answers within any reasonable timeout.
    struct StalledClient;

    impl AsyncHttpClient for StalledClient {
        async fn get(&self, _url: &str) -> Result<Vec<u8>, ProviderError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(vec![1])
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_becomes_fetch_error() {
        let fetcher = TileFetcher::new(
            UrlTemplateProvider::openstreetmap(StalledClient),
            quick_config(4).with_timeout(Duration::from_secs(2)),
        );

        let result = fetcher
            .download_tiles(&[TileCoord::new(0, 0, 0)], |_| {})
            .await;

        match result {
            Err(FetchError::Timeout { timeout_ms, .. }) => assert_eq!(timeout_ms, 2000),
            other => panic!("Expected timeout, got {:?}", other.map(|t| t.len())),
        }
    }
}
