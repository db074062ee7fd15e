mod client;
mod types;

pub use client::CinemetaClient;
pub use types::{
    ApiConfig, ApiError, CatalogTitle, EpisodeInfo, ExternalId, SearchKind, SeriesDetail,
};

use std::sync::Arc;

/// Metadata catalog operations the resolver depends on
///
/// Implementations must be shareable across the threads of a movie batch.
pub trait Catalog: Send + Sync {
    /// Free-text title search, best match first
    fn search(
        &self,
        kind: SearchKind,
        query: &str,
        year: Option<u16>,
    ) -> Result<Vec<CatalogTitle>, ApiError>;

    /// Direct lookup by catalog id (e.g. an IMDb id typed at the prompt)
    fn lookup(&self, kind: SearchKind, id: &ExternalId) -> Result<Option<CatalogTitle>, ApiError>;

    /// Series record with its full episode list
    fn series_detail(&self, id: &ExternalId) -> Result<SeriesDetail, ApiError>;

    /// Whether the series carries an "anime" keyword in the movie database
    fn is_anime(&self, id: &ExternalId) -> Result<bool, ApiError>;
}

impl<C: Catalog + ?Sized> Catalog for &C {
    fn search(
        &self,
        kind: SearchKind,
        query: &str,
        year: Option<u16>,
    ) -> Result<Vec<CatalogTitle>, ApiError> {
        (**self).search(kind, query, year)
    }

    fn lookup(&self, kind: SearchKind, id: &ExternalId) -> Result<Option<CatalogTitle>, ApiError> {
        (**self).lookup(kind, id)
    }

    fn series_detail(&self, id: &ExternalId) -> Result<SeriesDetail, ApiError> {
        (**self).series_detail(id)
    }

    fn is_anime(&self, id: &ExternalId) -> Result<bool, ApiError> {
        (**self).is_anime(id)
    }
}

impl<C: Catalog + ?Sized> Catalog for Arc<C> {
    fn search(
        &self,
        kind: SearchKind,
        query: &str,
        year: Option<u16>,
    ) -> Result<Vec<CatalogTitle>, ApiError> {
        (**self).search(kind, query, year)
    }

    fn lookup(&self, kind: SearchKind, id: &ExternalId) -> Result<Option<CatalogTitle>, ApiError> {
        (**self).lookup(kind, id)
    }

    fn series_detail(&self, id: &ExternalId) -> Result<SeriesDetail, ApiError> {
        (**self).series_detail(id)
    }

    fn is_anime(&self, id: &ExternalId) -> Result<bool, ApiError> {
        (**self).is_anime(id)
    }
}
