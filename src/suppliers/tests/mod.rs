mod registry_test;

use std::sync::Arc;

use futures::future::BoxFuture;
use indexmap::IndexMap;

use crate::{
    extractors::{ExtractorApi, Extractors},
    models::{ExtractedMedia, LinkKind, ResolvedLink, SubtitleTrack},
    utils::HttpFetcher,
};

use super::muvipro::{
    config::{self, SiteConfig},
    SiteSupplier,
};

/// Answers every embed on the local mock server with one stream and one subtitle.
fn local_boxed<'a>(
    url: &'a str,
    referer: &'a str,
) -> BoxFuture<'a, anyhow::Result<ExtractedMedia>> {
    Box::pin(async move {
        Ok(ExtractedMedia {
            streams: vec![ResolvedLink {
                url: format!("{url}/master.m3u8"),
                label: "local".into(),
                referer: referer.into(),
                kind: LinkKind::Hls,
                source: "local".into(),
            }],
            subtitles: vec![SubtitleTrack {
                url: format!("{url}/en.vtt"),
                label: "English".into(),
                language: Some("en".into()),
            }],
        })
    })
}

fn local_extractors() -> Arc<Extractors> {
    Arc::new(Extractors::new(vec![ExtractorApi {
        name: "local",
        main_urls: &["127.0.0.1"],
        extract: local_boxed,
    }]))
}

fn site(base_url: &str) -> SiteConfig {
    let mut sections = IndexMap::new();
    sections.insert("Latest".to_owned(), "/page/{page}/".to_owned());
    sections.insert("Series".to_owned(), "/series/page/{page}/".to_owned());

    SiteConfig {
        name: "Mock".into(),
        url: base_url.into(),
        sections,
        ..config::klikxxi()
    }
}

fn supplier(base_url: &str) -> SiteSupplier {
    SiteSupplier::new(
        site(base_url),
        Arc::new(HttpFetcher::default()),
        local_extractors(),
    )
    .unwrap()
}
