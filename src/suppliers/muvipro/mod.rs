pub mod catalog;
pub mod config;
mod links;

use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use futures::future::join_all;
use log::{info, warn};
use url::Url;

use catalog::{CardFields, DetailFields, DetailProcessor};
use config::SiteConfig;
use links::{PlayerProcessor, PlayerTab};

use crate::{
    extractors::Extractors,
    models::{CatalogEntry, ExtractedMedia, MediaKind, MediaRecord, ResolvedLink, SubtitleTrack},
    utils::{
        self, absolute_url,
        html::{self, DOMProcessor, ItemsProcessor},
        Fetcher,
    },
};

use super::ContentSupplier;

/// A site running the muvipro WordPress theme, described by a [`SiteConfig`].
pub struct SiteSupplier {
    config: SiteConfig,
    base: Url,
    fetcher: Arc<dyn Fetcher>,
    extractors: Arc<Extractors>,
    cards: ItemsProcessor<CardFields>,
    detail: DetailProcessor,
    player: PlayerProcessor,
    page_iframe: Box<dyn DOMProcessor<Option<String>>>,
    ajax_iframe: Box<dyn DOMProcessor<Option<String>>>,
}

impl SiteSupplier {
    /// Fails when the base url or one of the selectors is invalid.
    pub fn new(
        config: SiteConfig,
        fetcher: Arc<dyn Fetcher>,
        extractors: Arc<Extractors>,
    ) -> anyhow::Result<Self> {
        let selectors = &config.selectors;
        let wrap = |err: anyhow::Error| anyhow!("[{}] {err}", config.name);

        Ok(Self {
            base: config.base_url()?,
            cards: catalog::cards_processor(selectors).map_err(wrap)?,
            detail: catalog::detail_processor(selectors).map_err(wrap)?,
            player: PlayerProcessor::new(selectors).map_err(wrap)?,
            page_iframe: links::iframe_processor(&selectors.embed_iframe).map_err(wrap)?,
            ajax_iframe: links::iframe_processor("iframe").map_err(wrap)?,
            config,
            fetcher,
            extractors,
        })
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub async fn list_catalog_section(
        &self,
        index: usize,
        page: u16,
    ) -> anyhow::Result<Vec<CatalogEntry>> {
        let (_, template) = self
            .config
            .sections
            .get_index(index)
            .ok_or_else(|| anyhow!("[{}] no section at index {index}", self.config.name))?;

        self.list_page(&self.config.section_url(template, page)).await
    }

    pub async fn list_section(&self, name: &str, page: u16) -> anyhow::Result<Vec<CatalogEntry>> {
        let index = self
            .config
            .sections
            .get_index_of(name)
            .ok_or_else(|| anyhow!("[{}] unknown channel: {name}", self.config.name))?;

        self.list_catalog_section(index, page).await
    }

    pub async fn search_entries(&self, query: &str) -> anyhow::Result<Vec<CatalogEntry>> {
        self.list_page(&self.config.search_url(query)).await
    }

    async fn list_page(&self, url: &str) -> anyhow::Result<Vec<CatalogEntry>> {
        info!("[{}] listing {url}", self.config.name);

        let cards: Vec<CardFields> =
            utils::scrap_page(self.fetcher.as_ref(), url, &self.cards).await?;
        let total = cards.len();
        let entries: Vec<_> = cards
            .into_iter()
            .filter_map(|card| card.into_entry(&self.base, &self.config))
            .collect();

        if entries.len() < total {
            info!(
                "[{}] skipped {} malformed cards on {url}",
                self.config.name,
                total - entries.len()
            );
        }

        Ok(entries)
    }

    /// Loads a detail page, relative links resolve against the origin reached after redirects.
    pub async fn load_detail(&self, url: &str) -> anyhow::Result<MediaRecord> {
        let page = self.fetcher.get(url).await?;
        let base = Url::parse(&page.origin())?;

        let fields: DetailFields = html::process_document(&page.body, &self.detail);
        Ok(fields.into_record(url, &base, &self.config))
    }

    /// Resolves every player tab of a detail page and hands the decoded media to the sinks.
    ///
    /// A failing tab is logged and skipped, only a failure to load the page itself is an error.
    pub async fn resolve_links(
        &self,
        url: &str,
        on_subtitle: &(dyn Fn(SubtitleTrack) + Sync),
        on_stream: &(dyn Fn(ResolvedLink) + Sync),
    ) -> anyhow::Result<bool> {
        let page = self.fetcher.get(url).await?;
        let base = Url::parse(&page.origin())?;
        let referer = format!("{}/", page.origin());

        let tabs: Vec<PlayerTab> = html::process_document(&page.body, &self.player);
        if tabs.is_empty() {
            info!("[{}] no player tabs on {url}", self.config.name);
        }

        let base = &base;
        let referer = referer.as_str();
        let tasks = tabs.iter().map(|tab| async move {
            match self.embed_url(tab, base, referer).await {
                Ok(Some(embed)) => {
                    self.extractors
                        .load(&embed, referer, on_subtitle, on_stream)
                        .await;
                }
                Ok(None) => info!("[{}] no embed found for {tab:?}", self.config.name),
                Err(err) => warn!("[{}] fail to load {tab:?}: {err}", self.config.name),
            }
        });
        join_all(tasks).await;

        Ok(true)
    }

    /// Collects everything [`SiteSupplier::resolve_links`] reports.
    pub async fn load_links(&self, url: &str) -> anyhow::Result<ExtractedMedia> {
        let streams = Mutex::new(vec![]);
        let subtitles = Mutex::new(vec![]);

        self.resolve_links(
            url,
            &|subtitle| {
                if let Ok(mut subtitles) = subtitles.lock() {
                    subtitles.push(subtitle);
                }
            },
            &|stream| {
                if let Ok(mut streams) = streams.lock() {
                    streams.push(stream);
                }
            },
        )
        .await?;

        Ok(ExtractedMedia {
            streams: streams.into_inner().unwrap_or_default(),
            subtitles: subtitles.into_inner().unwrap_or_default(),
        })
    }

    async fn embed_url(
        &self,
        tab: &PlayerTab,
        base: &Url,
        referer: &str,
    ) -> anyhow::Result<Option<String>> {
        let src = match tab {
            PlayerTab::Page(href) => {
                let url = absolute_url(base, href)?;
                utils::scrap_page(self.fetcher.as_ref(), &url, self.page_iframe.as_ref()).await?
            }
            PlayerTab::Ajax { tab, post_id } => {
                let endpoint = format!(
                    "{}/wp-admin/admin-ajax.php",
                    base.origin().ascii_serialization()
                );
                let form = [
                    ("action", self.config.ajax_action.as_str()),
                    ("tab", tab.as_str()),
                    ("post_id", post_id.as_str()),
                ];

                let fragment = self.fetcher.post_form(&endpoint, &form, referer).await?;
                html::process_fragment(&fragment, self.ajax_iframe.as_ref())
            }
        };

        Ok(src.and_then(|src| links::embed_url(base, &src)))
    }
}

impl ContentSupplier for SiteSupplier {
    fn name(&self) -> String {
        self.config.name.clone()
    }

    fn get_channels(&self) -> Vec<String> {
        self.config.sections.keys().cloned().collect()
    }

    fn get_supported_types(&self) -> Vec<MediaKind> {
        vec![MediaKind::Movie, MediaKind::Series]
    }

    fn get_supported_languages(&self) -> Vec<String> {
        vec![self.config.lang.clone()]
    }

    async fn search(&self, query: String) -> anyhow::Result<Vec<CatalogEntry>> {
        self.search_entries(&query).await
    }

    async fn load_channel(&self, channel: String, page: u16) -> anyhow::Result<Vec<CatalogEntry>> {
        self.list_section(&channel, page).await
    }

    async fn get_content_details(&self, id: String) -> anyhow::Result<Option<MediaRecord>> {
        let record = self.load_detail(&id).await?;
        if record.title.is_empty() {
            return Ok(None);
        }

        Ok(Some(record))
    }

    async fn load_links(&self, id: String) -> anyhow::Result<ExtractedMedia> {
        SiteSupplier::load_links(self, &id).await
    }
}
