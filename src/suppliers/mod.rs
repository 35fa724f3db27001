#[cfg(test)]
mod tests;

pub mod muvipro;

use std::{fs, path::Path, sync::Arc};

use anyhow::anyhow;
use log::info;

use muvipro::{
    config::{self, SiteConfig},
    SiteSupplier,
};

use crate::{
    extractors::Extractors,
    models::{CatalogEntry, ExtractedMedia, MediaKind, MediaRecord},
    utils::{Fetcher, HttpFetcher},
};

#[allow(async_fn_in_trait)]
pub trait ContentSupplier {
    fn name(&self) -> String;
    fn get_channels(&self) -> Vec<String>;
    fn get_supported_types(&self) -> Vec<MediaKind>;
    fn get_supported_languages(&self) -> Vec<String>;
    async fn search(&self, query: String) -> anyhow::Result<Vec<CatalogEntry>>;
    async fn load_channel(&self, channel: String, page: u16)
        -> anyhow::Result<Vec<CatalogEntry>>;
    async fn get_content_details(&self, id: String) -> anyhow::Result<Option<MediaRecord>>;
    async fn load_links(&self, id: String) -> anyhow::Result<ExtractedMedia>;
}

/// Every configured site, sharing one fetcher and one extractor set.
pub struct Registry {
    fetcher: Arc<dyn Fetcher>,
    extractors: Arc<Extractors>,
    suppliers: Vec<SiteSupplier>,
}

impl Registry {
    pub fn new(fetcher: Arc<dyn Fetcher>, extractors: Arc<Extractors>) -> Self {
        Self {
            fetcher,
            extractors,
            suppliers: vec![],
        }
    }

    /// Built-in sites over the shared http client and the default extractors.
    pub fn builtin() -> anyhow::Result<Self> {
        let mut registry = Self::new(
            Arc::new(HttpFetcher::default()),
            Arc::new(Extractors::default()),
        );
        registry.register_sites(config::builtin_sites())?;
        Ok(registry)
    }

    /// Adds sites, a site named like an existing one replaces it.
    pub fn register_sites(&mut self, sites: Vec<SiteConfig>) -> anyhow::Result<()> {
        for site in sites {
            let supplier =
                SiteSupplier::new(site, self.fetcher.clone(), self.extractors.clone())?;
            let name = supplier.config().name.clone();

            match self.position(&name) {
                Some(idx) => {
                    info!("[registry] replacing site {name}");
                    self.suppliers[idx] = supplier;
                }
                None => self.suppliers.push(supplier),
            }
        }

        Ok(())
    }

    pub fn register_sites_from_toml(&mut self, content: &str) -> anyhow::Result<()> {
        self.register_sites(config::sites_from_toml(content)?)
    }

    pub fn register_sites_from_file(&mut self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|err| anyhow!("[registry] fail to read {}: {err}", path.display()))?;
        self.register_sites_from_toml(&content)
    }

    pub fn suppliers(&self) -> &[SiteSupplier] {
        &self.suppliers
    }

    pub fn avalaible_suppliers(&self) -> Vec<String> {
        self.suppliers.iter().map(ContentSupplier::name).collect()
    }

    /// Case-insensitive lookup by site name.
    pub fn get_supplier(&self, name: &str) -> anyhow::Result<&SiteSupplier> {
        self.position(name)
            .map(|idx| &self.suppliers[idx])
            .ok_or_else(|| anyhow!("[registry] unknown supplier: {name}"))
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.suppliers
            .iter()
            .position(|supplier| supplier.config().name.eq_ignore_ascii_case(name))
    }
}

pub fn avalaible_suppliers() -> Vec<String> {
    config::builtin_sites()
        .into_iter()
        .map(|site| site.name)
        .collect()
}

/// Builds a built-in site over the shared http client.
pub fn get_supplier(name: &str) -> anyhow::Result<SiteSupplier> {
    let site = config::builtin_sites()
        .into_iter()
        .find(|site| site.name.eq_ignore_ascii_case(name))
        .ok_or_else(|| anyhow!("[registry] unknown supplier: {name}"))?;

    SiteSupplier::new(
        site,
        Arc::new(HttpFetcher::default()),
        Arc::new(Extractors::default()),
    )
}
