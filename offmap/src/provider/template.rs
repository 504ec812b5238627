//! Slippy-map tile server addressed by a URL template.
//!
//! # URL Pattern
//!
//! `https://tile.openstreetmap.org/{z}/{x}/{y}.png`
//!
//! - `{z}`, `{x}`, `{y}`: zoom, column, row
//! - `{s}`: optional subdomain, rotated over the configured list so load is
//!   spread across mirror hosts (`a`, `b`, `c` for OpenStreetMap)

use crate::coord::TileCoord;
use crate::provider::{AsyncHttpClient, ProviderError, TileSource};

/// Default OpenStreetMap tile template.
pub const DEFAULT_TILE_TEMPLATE: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";

/// Tile source that fills a URL template and downloads over HTTP.
pub struct UrlTemplateProvider<C: AsyncHttpClient> {
    http_client: C,
    template: String,
    subdomains: Vec<String>,
}

impl<C: AsyncHttpClient> UrlTemplateProvider<C> {
    /// Creates a provider for `template`.
    ///
    /// # Errors
    ///
    /// The template must contain `{z}`, `{x}` and `{y}`. A `{s}` placeholder
    /// requires at least one subdomain.
    pub fn new(
        http_client: C,
        template: impl Into<String>,
        subdomains: Vec<String>,
    ) -> Result<Self, ProviderError> {
        let template = template.into();
        for placeholder in ["{z}", "{x}", "{y}"] {
            if !template.contains(placeholder) {
                return Err(ProviderError::InvalidTemplate(format!(
                    "'{}' is missing {}",
                    template, placeholder
                )));
            }
        }
        if template.contains("{s}") && subdomains.is_empty() {
            return Err(ProviderError::InvalidTemplate(format!(
                "'{}' uses {{s}} but no subdomains are configured",
                template
            )));
        }

        Ok(Self {
            http_client,
            template,
            subdomains,
        })
    }

    /// OpenStreetMap's default tile server.
    pub fn openstreetmap(http_client: C) -> Self {
        Self {
            http_client,
            template: DEFAULT_TILE_TEMPLATE.to_string(),
            subdomains: Vec::new(),
        }
    }

    /// Builds the tile URL for the given coordinates.
    pub fn build_url(&self, tile: TileCoord) -> String {
        let mut url = self
            .template
            .replace("{z}", &tile.z.to_string())
            .replace("{x}", &tile.x.to_string())
            .replace("{y}", &tile.y.to_string());

        if !self.subdomains.is_empty() {
            let index = (u64::from(tile.x) + u64::from(tile.y)) as usize % self.subdomains.len();
            url = url.replace("{s}", &self.subdomains[index]);
        }
        url
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn http_client(&self) -> &C {
        &self.http_client
    }
}

impl<C: AsyncHttpClient> TileSource for UrlTemplateProvider<C> {
    async fn fetch_tile(&self, tile: TileCoord) -> Result<Vec<u8>, ProviderError> {
        if !tile.is_valid() {
            return Err(ProviderError::InvalidTile(tile));
        }

        let url = self.build_url(tile);
        let body = self.http_client.get(&url).await?;
        if body.is_empty() {
            return Err(ProviderError::EmptyResponse(tile));
        }
        Ok(body)
    }

    fn name(&self) -> &str {
        &self.template
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockAsyncHttpClient;

    fn sample_png_header() -> Vec<u8> {
        vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]
    }

    fn mock(response: Result<Vec<u8>, ProviderError>) -> MockAsyncHttpClient {
        MockAsyncHttpClient { response }
    }

    #[test]
    fn test_url_construction() {
        let provider = UrlTemplateProvider::openstreetmap(mock(Ok(sample_png_header())));

        let url = provider.build_url(TileCoord::new(5241, 12663, 15));
        assert_eq!(url, "https://tile.openstreetmap.org/15/5241/12663.png");
    }

    #[test]
    fn test_url_construction_zoom_0() {
        let provider = UrlTemplateProvider::openstreetmap(mock(Ok(sample_png_header())));

        let url = provider.build_url(TileCoord::new(0, 0, 0));
        assert_eq!(url, "https://tile.openstreetmap.org/0/0/0.png");
    }

    #[test]
    fn test_subdomain_rotation() {
        let provider = UrlTemplateProvider::new(
            mock(Ok(sample_png_header())),
            "https://{s}.tile.example.org/{z}/{x}/{y}.png",
            vec!["a".into(), "b".into(), "c".into()],
        )
        .unwrap();

        assert_eq!(
            provider.build_url(TileCoord::new(0, 0, 1)),
            "https://a.tile.example.org/1/0/0.png"
        );
        assert_eq!(
            provider.build_url(TileCoord::new(1, 0, 1)),
            "https://b.tile.example.org/1/1/0.png"
        );
        assert_eq!(
            provider.build_url(TileCoord::new(1, 1, 1)),
            "https://c.tile.example.org/1/1/1.png"
        );
    }

    #[test]
    fn test_template_missing_placeholder() {
        let result = UrlTemplateProvider::new(
            mock(Ok(sample_png_header())),
            "https://tile.example.org/{z}/{x}.png",
            Vec::new(),
        );
        assert!(matches!(result, Err(ProviderError::InvalidTemplate(_))));
    }

    #[test]
    fn test_subdomain_placeholder_requires_list() {
        let result = UrlTemplateProvider::new(
            mock(Ok(sample_png_header())),
            "https://{s}.tile.example.org/{z}/{x}/{y}.png",
            Vec::new(),
        );
        assert!(matches!(result, Err(ProviderError::InvalidTemplate(_))));
    }

    #[tokio::test]
    async fn test_fetch_tile_success() {
        let provider = UrlTemplateProvider::openstreetmap(mock(Ok(sample_png_header())));

        let result = provider.fetch_tile(TileCoord::new(1, 1, 2)).await;
        assert_eq!(result.unwrap(), sample_png_header());
    }

    #[tokio::test]
    async fn test_fetch_tile_network_error() {
        let provider = UrlTemplateProvider::openstreetmap(mock(Err(ProviderError::HttpError(
            "Connection refused".to_string(),
        ))));

        match provider.fetch_tile(TileCoord::new(1, 1, 2)).await {
            Err(ProviderError::HttpError(msg)) => assert!(msg.contains("Connection refused")),
            other => panic!("Expected HttpError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_tile_empty_body() {
        let provider = UrlTemplateProvider::openstreetmap(mock(Ok(Vec::new())));

        let tile = TileCoord::new(1, 1, 2);
        assert_eq!(
            provider.fetch_tile(tile).await,
            Err(ProviderError::EmptyResponse(tile))
        );
    }

    #[tokio::test]
    async fn test_fetch_tile_outside_grid() {
        let provider = UrlTemplateProvider::openstreetmap(mock(Ok(sample_png_header())));

        let tile = TileCoord::new(4, 0, 2);
        assert_eq!(
            provider.fetch_tile(tile).await,
            Err(ProviderError::InvalidTile(tile))
        );
    }
}
