//! The assembled offline map application.

use std::sync::Arc;

use tracing::{info, warn};

use super::config::AppConfig;
use super::error::AppError;
use crate::assistant::{Assistant, ChatMessage, TextGenerator};
use crate::auth::{AuthGate, AuthStatus, StaticGate, TokenFileGate};
use crate::catalog::{Catalog, MapArea};
use crate::compositor::{CompositeImage, TileCompositor};
use crate::coord::{tile_range, TileCoord, TileRange};
use crate::download::{DownloadTracker, TileFetcher};
use crate::provider::{ReqwestClient, TileSource, UrlTemplateProvider};
use crate::store::{FileBackend, MapStore, RecordBackend, StorageStats, StoredMap};

/// Application wired from the configuration file.
pub type ConfiguredMaps =
    OfflineMaps<UrlTemplateProvider<ReqwestClient>, FileBackend, Box<dyn AuthGate>>;

/// Outcome of a finished download.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadReport {
    pub area_id: String,
    pub tiles: usize,
    /// Store size after the download.
    pub usage_mb: f64,
}

/// Catalog, fetcher, store, compositor and sign-in gate wired together.
///
/// Every collaborator is passed in, so tests substitute mock tile sources,
/// in-memory storage and fixed sign-in states.
pub struct OfflineMaps<S: TileSource, B: RecordBackend, A: AuthGate> {
    catalog: Catalog,
    fetcher: TileFetcher<S>,
    store: Arc<MapStore<B>>,
    compositor: TileCompositor,
    auth: A,
    zoom: u8,
}

impl ConfiguredMaps {
    /// Assembles the application with an HTTP tile source and file storage.
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let client = ReqwestClient::with_timeout(config.http_timeout_secs)?;
        let source = UrlTemplateProvider::new(
            client,
            config.url_template.clone(),
            config.subdomains.clone(),
        )?;
        let backend = FileBackend::open(&config.storage_dir, config.capacity_bytes)?;

        let auth: Box<dyn AuthGate> = if config.auth_required {
            Box::new(TokenFileGate::new(&config.token_file))
        } else {
            Box::new(StaticGate::signed_in("anonymous"))
        };

        Ok(Self::new(
            Catalog::san_francisco(),
            TileFetcher::new(source, config.fetch.clone()),
            MapStore::new(backend, config.store_key.clone()),
            TileCompositor::new(config.compositor.clone()),
            auth,
            config.zoom,
        ))
    }
}

impl<S: TileSource, B: RecordBackend, A: AuthGate> OfflineMaps<S, B, A> {
    pub fn new(
        catalog: Catalog,
        fetcher: TileFetcher<S>,
        store: MapStore<B>,
        compositor: TileCompositor,
        auth: A,
        zoom: u8,
    ) -> Self {
        Self {
            catalog,
            fetcher,
            store: Arc::new(store),
            compositor,
            auth,
            zoom,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn store(&self) -> &MapStore<B> {
        &self.store
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    pub fn auth_status(&self) -> AuthStatus {
        self.auth.status()
    }

    pub fn area(&self, area_id: &str) -> Result<&MapArea, AppError> {
        self.catalog
            .find(area_id)
            .ok_or_else(|| AppError::UnknownArea(area_id.to_string()))
    }

    /// Tile range a download of `area_id` would fetch.
    pub fn plan(&self, area_id: &str) -> Result<TileRange, AppError> {
        let area = self.area(area_id)?;
        Ok(tile_range(&area.bounds, self.zoom)?)
    }

    pub fn is_downloaded(&self, area_id: &str) -> bool {
        self.store.list().iter().any(|m| m.id == area_id)
    }

    /// Downloads every tile of `area_id` and stores the map.
    ///
    /// Nothing is written unless every tile arrived. A previous copy of the
    /// same area is replaced. The store write runs on the blocking pool.
    pub async fn download_area<F>(
        &self,
        area_id: &str,
        on_progress: F,
    ) -> Result<DownloadReport, AppError>
    where
        F: FnMut(f64),
        B: 'static,
    {
        if !self.auth.status().is_signed_in() {
            warn!(area = %area_id, "Download refused: not signed in");
            return Err(AppError::SignedOut);
        }

        let area = self.area(area_id)?;
        let range = tile_range(&area.bounds, self.zoom)?;
        let coords: Vec<TileCoord> = range.iter().collect();

        let tiles = self.fetcher.download_tiles(&coords, on_progress).await?;
        let count = tiles.len();

        let map = StoredMap::from_area(area, self.zoom, tiles);
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || store.upsert(map)).await??;

        let usage_mb = self.store.usage_mb();
        info!(area = %area_id, tiles = count, usage_mb, "Map downloaded");
        Ok(DownloadReport {
            area_id: area_id.to_string(),
            tiles: count,
            usage_mb,
        })
    }

    /// [`download_area`](Self::download_area) recorded in `tracker`.
    ///
    /// Refused with [`AppError::Busy`] while the tracker shows another
    /// download in progress.
    pub async fn download_tracked<F>(
        &self,
        tracker: &mut DownloadTracker,
        area_id: &str,
        mut on_progress: F,
    ) -> Result<DownloadReport, AppError>
    where
        F: FnMut(f64),
        B: 'static,
    {
        tracker.begin(area_id)?;
        let result = self
            .download_area(area_id, |fraction| {
                tracker.report(fraction);
                on_progress(fraction);
            })
            .await;
        tracker.finish(&result);
        result
    }

    pub fn stored_maps(&self) -> Vec<StoredMap> {
        self.store.list()
    }

    pub fn delete_map(&self, area_id: &str) -> Result<(), AppError> {
        Ok(self.store.delete(area_id)?)
    }

    pub fn clear_maps(&self) -> Result<(), AppError> {
        Ok(self.store.clear()?)
    }

    pub fn storage_stats(&self) -> StorageStats {
        self.store.stats()
    }

    /// Renders a stored map.
    pub fn render(&self, area_id: &str) -> Result<CompositeImage, AppError> {
        let map = self
            .store
            .get(area_id)
            .ok_or_else(|| AppError::MapNotFound(area_id.to_string()))?;
        Ok(self.compositor.composite(&map)?)
    }

    /// Asks the assistant about `area_id`, telling it whether the area is
    /// available offline.
    pub async fn ask<G: TextGenerator>(
        &self,
        assistant: &Assistant<G>,
        area_id: &str,
        history: &[ChatMessage],
        question: &str,
    ) -> Result<String, AppError> {
        let area = self.area(area_id)?;
        let has_local_data = self.is_downloaded(area_id);
        Ok(assistant
            .ask(area, has_local_data, history, question)
            .await?)
    }
}
