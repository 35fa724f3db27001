mod dailymotion;
mod okru;
mod rumble;
mod streamruby;

use futures::future::BoxFuture;
use log::{info, warn};
use url::Url;

use crate::models::{ExtractedMedia, ResolvedLink, SubtitleTrack};

/// Decodes one embed page into streams and subtitles: `(embed_url, referer)`.
pub type BoxExtractor =
    for<'a> fn(&'a str, &'a str) -> BoxFuture<'a, anyhow::Result<ExtractedMedia>>;

#[derive(Clone, Copy)]
pub struct ExtractorApi {
    pub name: &'static str,
    /// Hosts served by the platform, subdomains included.
    pub main_urls: &'static [&'static str],
    pub extract: BoxExtractor,
}

impl ExtractorApi {
    pub fn matches(&self, url: &Url) -> bool {
        let Some(host) = url.host_str() else {
            return false;
        };
        let host = host.trim_start_matches("www.");

        self.main_urls
            .iter()
            .any(|main| host == *main || host.ends_with(&format!(".{main}")))
    }
}

pub const DEFAULT_EXTRACTORS: [ExtractorApi; 4] = [
    ExtractorApi {
        name: "dailymotion",
        main_urls: &["dailymotion.com", "geo.dailymotion.com", "dai.ly"],
        extract: dailymotion::extract_boxed,
    },
    ExtractorApi {
        name: "okru",
        main_urls: &["ok.ru", "odnoklassniki.ru"],
        extract: okru::extract_boxed,
    },
    ExtractorApi {
        name: "rumble",
        main_urls: &["rumble.com"],
        extract: rumble::extract_boxed,
    },
    ExtractorApi {
        name: "streamruby",
        main_urls: &[
            "streamruby.com",
            "rubyvidhub.com",
            "stmruby.com",
            "svilla.xyz",
            "svanila.xyz",
        ],
        extract: streamruby::extract_boxed,
    },
];

/// Extractors in registration order, the first host match wins.
#[derive(Clone)]
pub struct Extractors {
    apis: Vec<ExtractorApi>,
}

impl Default for Extractors {
    fn default() -> Self {
        Self::new(DEFAULT_EXTRACTORS.to_vec())
    }
}

impl Extractors {
    pub fn new(apis: Vec<ExtractorApi>) -> Self {
        Self { apis }
    }

    pub fn register(&mut self, api: ExtractorApi) {
        self.apis.push(api);
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.apis.iter().map(|api| api.name).collect()
    }

    pub fn find(&self, url: &str) -> Option<&ExtractorApi> {
        let url = Url::parse(url).ok()?;
        self.apis.iter().find(|api| api.matches(&url))
    }

    /// Runs the matching extractor and forwards its results to the sinks.
    /// Returns `false` when no extractor matches or the extractor fails.
    pub async fn load(
        &self,
        url: &str,
        referer: &str,
        on_subtitle: &(dyn Fn(SubtitleTrack) + Sync),
        on_stream: &(dyn Fn(ResolvedLink) + Sync),
    ) -> bool {
        let Some(api) = self.find(url) else {
            info!("[extractors] no extractor for {url}");
            return false;
        };

        let media = match (api.extract)(url, referer).await {
            Ok(media) => media,
            Err(err) => {
                warn!("[{}] fail to extract {url}: {err}", api.name);
                return false;
            }
        };

        if media.is_empty() {
            info!("[{}] nothing found in {url}", api.name);
            return false;
        }

        media.subtitles.into_iter().for_each(on_subtitle);
        media.streams.into_iter().for_each(on_stream);
        true
    }
}
