//! Raster tile provider abstraction
//!
//! A [`TileSource`] turns a [`TileCoord`](crate::coord::TileCoord) into raw
//! image bytes. The only implementation is [`UrlTemplateProvider`], which
//! fills a slippy-map URL template and downloads over an [`AsyncHttpClient`].
//!
//! ```ignore
//! use offmap::provider::{ReqwestClient, UrlTemplateProvider};
//!
//! let http_client = ReqwestClient::new()?;
//! let provider = UrlTemplateProvider::openstreetmap(http_client);
//! ```

mod http;
mod template;
mod types;

pub use http::{AsyncHttpClient, ReqwestClient, DEFAULT_TIMEOUT_SECS, USER_AGENT};
pub use template::{UrlTemplateProvider, DEFAULT_TILE_TEMPLATE};
pub use types::{ProviderError, TileSource};

#[cfg(test)]
pub use http::tests::{sample_png, MockAsyncHttpClient, ScriptedHttpClient};
