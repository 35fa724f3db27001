use scraper::ElementRef;
use url::Url;

use super::config::SiteSelectors;
use crate::utils::{
    absolute_url,
    html::{AttrValue, DOMProcessor, ItemsProcessor},
    text,
};

const IFRAME_ATTRS: [&str; 2] = ["data-litespeed-src", "src"];

/// Where a player tab gets its iframe from.
#[derive(Debug, Clone, PartialEq)]
pub(super) enum PlayerTab {
    /// Static markup, the tab links to a page embedding the player.
    Page(String),
    /// Loaded through admin-ajax with the tab id.
    Ajax { tab: String, post_id: String },
}

pub(super) struct PlayerProcessor {
    pub post_id: Box<dyn DOMProcessor<Option<String>>>,
    pub tab_links: Box<dyn DOMProcessor<Vec<Option<String>>>>,
    pub ajax_tabs: Box<dyn DOMProcessor<Vec<Option<String>>>>,
}

impl PlayerProcessor {
    pub fn new(selectors: &SiteSelectors) -> anyhow::Result<Self> {
        Ok(Self {
            post_id: AttrValue::new("data-id")
                .in_scope(&selectors.player_content_id)?
                .into(),
            tab_links: ItemsProcessor::<Option<String>>::new(
                &selectors.player_tabs,
                AttrValue::new("href").into(),
            )?
            .into(),
            ajax_tabs: ItemsProcessor::<Option<String>>::new(
                &selectors.ajax_tabs,
                AttrValue::new("id").into(),
            )?
            .into(),
        })
    }
}

impl DOMProcessor<Vec<PlayerTab>> for PlayerProcessor {
    fn process(&self, el: &ElementRef) -> Vec<PlayerTab> {
        match self.post_id.process(el) {
            None => self
                .tab_links
                .process(el)
                .into_iter()
                .flatten()
                .map(PlayerTab::Page)
                .collect(),
            Some(post_id) => self
                .ajax_tabs
                .process(el)
                .into_iter()
                .flatten()
                .map(|tab| PlayerTab::Ajax {
                    tab,
                    post_id: post_id.clone(),
                })
                .collect(),
        }
    }
}

pub(super) fn iframe_processor(
    selectors: &str,
) -> anyhow::Result<Box<dyn DOMProcessor<Option<String>>>> {
    Ok(AttrValue::first_of(&IFRAME_ATTRS).in_scope(selectors)?.into())
}

/// Absolute https embed URL out of a raw iframe source.
pub(super) fn embed_url(base: &Url, src: &str) -> Option<String> {
    absolute_url(base, &text::to_full_url(src)).ok()
}
