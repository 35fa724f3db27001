use std::collections::HashSet;

use scraper::ElementRef;
use url::Url;

use super::config::{SiteConfig, SiteSelectors};
use crate::{
    models::{CatalogEntry, Episode, MediaKind, MediaRecord, sort_episodes},
    utils::{
        absolute_url,
        html::{self, AttrValue, DOMProcessor, ExtractValue, ItemsProcessor, ScopeProcessor},
        text,
    },
};

const PERMALINK_PREFIX: &str = "Permalink to:";
const IMAGE_ATTRS: [&str; 4] = ["data-src", "data-lazy-src", "srcset", "src"];

/// Raw listing card, before links are resolved against the page origin.
#[derive(Debug, Default)]
pub(super) struct CardFields {
    pub href: Option<String>,
    pub title: Option<String>,
    pub poster: Option<String>,
    pub quality: Option<String>,
    pub type_label: Option<String>,
}

impl CardFields {
    /// `None` when the card has no usable title or link.
    pub fn into_entry(self, base: &Url, config: &SiteConfig) -> Option<CatalogEntry> {
        let title = self.title?;
        let url = absolute_url(base, self.href.as_deref()?).ok()?;

        let is_series = self
            .type_label
            .is_some_and(|label| label.to_lowercase().contains("tv"))
            || config.is_series_url(&url);

        Some(CatalogEntry {
            poster: self.poster.as_deref().and_then(|src| poster_url(base, src)),
            kind: if is_series {
                MediaKind::Series
            } else {
                MediaKind::Movie
            },
            quality: self.quality,
            title,
            url,
        })
    }
}

pub(super) struct CardProcessor {
    pub href: Box<dyn DOMProcessor<Option<String>>>,
    pub title: Box<dyn DOMProcessor<Option<String>>>,
    pub poster: Box<dyn DOMProcessor<Option<String>>>,
    pub quality: Box<dyn DOMProcessor<Option<String>>>,
    pub type_label: Box<dyn DOMProcessor<Option<String>>>,
}

impl DOMProcessor<CardFields> for CardProcessor {
    fn process(&self, el: &ElementRef) -> CardFields {
        CardFields {
            href: self.href.process(el),
            title: self.title.process(el),
            poster: self.poster.process(el),
            quality: self.quality.process(el),
            type_label: self.type_label.process(el),
        }
    }
}

impl From<CardProcessor> for Box<dyn DOMProcessor<CardFields>> {
    fn from(value: CardProcessor) -> Self {
        Box::new(value)
    }
}

#[derive(Debug, Default)]
pub(super) struct MetaRow {
    pub text: String,
    pub links: Vec<String>,
}

#[derive(Debug, Default)]
pub(super) struct EpisodeLink {
    pub href: Option<String>,
    pub text: String,
}

#[derive(Debug, Default)]
pub(super) struct SeasonBlock {
    pub title: Option<String>,
    pub links: Vec<EpisodeLink>,
}

/// Raw detail page fields.
#[derive(Debug, Default)]
pub(super) struct DetailFields {
    pub heading: Option<String>,
    pub poster: Option<String>,
    pub plot: Option<String>,
    pub meta_rows: Vec<MetaRow>,
    pub rating: Option<String>,
    pub cast: Vec<String>,
    pub trailer: Option<String>,
    pub recommendations: Vec<CardFields>,
    pub season_blocks: Vec<SeasonBlock>,
    pub flat_episodes: Vec<EpisodeLink>,
}

impl DetailFields {
    pub fn into_record(self, url: &str, base: &Url, config: &SiteConfig) -> MediaRecord {
        let selectors = &config.selectors;

        let tags = self
            .labeled_row(&selectors.genre_label)
            .map(|row| dedup(row.links.clone()))
            .unwrap_or_default();
        let year = self
            .labeled_row(&selectors.year_label)
            .and_then(|row| text::extract_year(&row.text));

        let mut episodes = season_episodes(&self.season_blocks, base);
        if self.season_blocks.is_empty() {
            episodes = flat_episodes(&self.flat_episodes, base);
        }
        sort_episodes(&mut episodes);

        let kind = if !episodes.is_empty() || config.is_series_url(url) {
            MediaKind::Series
        } else {
            MediaKind::Movie
        };

        MediaRecord {
            title: self
                .heading
                .as_deref()
                .map(text::truncate_title)
                .unwrap_or_default(),
            url: url.to_owned(),
            kind,
            poster: self.poster.as_deref().and_then(|src| poster_url(base, src)),
            plot: self.plot,
            tags,
            year,
            rating: self.rating.as_deref().and_then(parse_rating),
            cast: self.cast,
            trailer: self
                .trailer
                .as_deref()
                .and_then(|href| absolute_url(base, href).ok()),
            recommendations: self
                .recommendations
                .into_iter()
                .filter_map(|card| card.into_entry(base, config))
                .collect(),
            episodes,
        }
    }

    fn labeled_row(&self, label: &str) -> Option<&MetaRow> {
        let label = label.to_lowercase();
        self.meta_rows
            .iter()
            .find(|row| row.text.to_lowercase().starts_with(&label))
    }
}

pub(super) struct DetailProcessor {
    pub heading: Box<dyn DOMProcessor<Option<String>>>,
    pub poster: Box<dyn DOMProcessor<Option<String>>>,
    pub plot: Box<dyn DOMProcessor<Option<String>>>,
    pub meta_rows: Box<dyn DOMProcessor<Vec<MetaRow>>>,
    pub rating: Box<dyn DOMProcessor<Option<String>>>,
    pub cast: Box<dyn DOMProcessor<Vec<String>>>,
    pub trailer: Box<dyn DOMProcessor<Option<String>>>,
    pub recommendations: Box<dyn DOMProcessor<Vec<CardFields>>>,
    pub season_blocks: Box<dyn DOMProcessor<Vec<SeasonBlock>>>,
    pub flat_episodes: Box<dyn DOMProcessor<Vec<EpisodeLink>>>,
}

impl DOMProcessor<DetailFields> for DetailProcessor {
    fn process(&self, el: &ElementRef) -> DetailFields {
        DetailFields {
            heading: self.heading.process(el),
            poster: self.poster.process(el),
            plot: self.plot.process(el),
            meta_rows: self.meta_rows.process(el),
            rating: self.rating.process(el),
            cast: self.cast.process(el),
            trailer: self.trailer.process(el),
            recommendations: self.recommendations.process(el),
            season_blocks: self.season_blocks.process(el),
            flat_episodes: self.flat_episodes.process(el),
        }
    }
}

pub(super) fn cards_processor(
    selectors: &SiteSelectors,
) -> anyhow::Result<ItemsProcessor<CardFields>> {
    let link = html::selector(&selectors.card_link)?;
    let quality = html::optional_text_value(&selectors.card_quality)?;
    let quality_fallback = html::text_values(&selectors.card_quality_fallback)?;

    let card = CardProcessor {
        href: AttrValue::new("href").in_scope(&selectors.card_link)?.into(),
        title: ExtractValue::new(move |el| el.select(&link).next().and_then(|a| link_title(&a)))
            .into(),
        poster: image_processor(&selectors.card_image)?,
        quality: ExtractValue::new(move |el| {
            quality.process(el).or_else(|| {
                text::non_blank(&quality_fallback.process(el).join(" ").replace('-', ""))
            })
        })
        .into(),
        type_label: html::optional_text_value(&selectors.card_type)?,
    };

    ItemsProcessor::new(&selectors.cards, card.into())
}

pub(super) fn detail_processor(selectors: &SiteSelectors) -> anyhow::Result<DetailProcessor> {
    let rec_link = html::selector(&selectors.recommendation_link)?;
    let rec_title = html::selector(&selectors.recommendation_title)?;

    let recommendation = CardProcessor {
        href: AttrValue::new("href")
            .in_scope(&selectors.recommendation_link)?
            .into(),
        title: ExtractValue::new(move |el| {
            el.select(&rec_title)
                .next()
                .and_then(|span| text::non_blank(&span.text().collect::<String>()))
                .or_else(|| el.select(&rec_link).next().and_then(|a| link_title(&a)))
        })
        .into(),
        poster: image_processor(&selectors.recommendation_image)?,
        quality: ExtractValue::new(|_| None::<String>).into(),
        type_label: ExtractValue::new(|_| None::<String>).into(),
    };

    let row_links = html::selector("a")?;
    let meta_row = ExtractValue::new(move |el| MetaRow {
        text: text::sanitize_text(&el.text().collect::<String>()),
        links: el
            .select(&row_links)
            .filter_map(|a| text::non_blank(&a.text().collect::<String>()))
            .collect(),
    });

    let episode_link = || {
        ExtractValue::new(|el| EpisodeLink {
            href: el.attr("href").and_then(text::non_blank),
            text: text::sanitize_text(&el.text().collect::<String>()),
        })
    };

    let season_title = html::optional_text_value(&selectors.season_title)?;
    let season_links: Box<dyn DOMProcessor<Vec<EpisodeLink>>> =
        episode_link().itr_scope(&selectors.season_episodes)?.into();
    let season_block = ExtractValue::new(move |el| SeasonBlock {
        title: season_title.process(el),
        links: season_links.process(el),
    });

    Ok(DetailProcessor {
        heading: html::optional_text_value(&selectors.heading)?,
        poster: image_processor(&selectors.poster)?,
        plot: html::optional_text_value(&selectors.plot)?,
        meta_rows: meta_row.itr_scope(&selectors.meta_rows)?.into(),
        rating: html::optional_text_value(&selectors.rating)?,
        cast: html::text_values(&selectors.actors)?,
        trailer: html::optional_attr_value("href", &selectors.trailer)?,
        recommendations: ItemsProcessor::new(&selectors.recommendations, recommendation.into())?
            .into(),
        season_blocks: season_block.itr_scope(&selectors.season_blocks)?.into(),
        flat_episodes: episode_link().itr_scope(&selectors.flat_episodes)?.into(),
    })
}

fn image_processor(selectors: &str) -> anyhow::Result<Box<dyn DOMProcessor<Option<String>>>> {
    let image =
        ScopeProcessor::<Option<String>>::new(selectors, AttrValue::first_of(&IMAGE_ATTRS).into())?;

    // srcset holds "url width, url width", only the first url is kept
    Ok(image
        .map(|src| {
            src.flatten()
                .and_then(|s| s.split_whitespace().next().map(String::from))
        })
        .into())
}

/// Anchor `title` without the permalink prefix, else the anchor text.
fn link_title(anchor: &ElementRef) -> Option<String> {
    anchor
        .attr("title")
        .map(|title| title.trim().trim_start_matches(PERMALINK_PREFIX))
        .and_then(text::non_blank)
        .or_else(|| text::non_blank(&anchor.text().collect::<String>()))
}

pub fn poster_url(base: &Url, src: &str) -> Option<String> {
    absolute_url(base, src)
        .ok()
        .map(|url| text::strip_dimension_suffix(&url))
}

fn parse_rating(value: &str) -> Option<f32> {
    value
        .trim()
        .replace(',', ".")
        .parse::<f32>()
        .ok()
        .filter(|rating| (0.0..=10.0).contains(rating))
}

fn season_episodes(blocks: &[SeasonBlock], base: &Url) -> Vec<Episode> {
    blocks
        .iter()
        .flat_map(|block| {
            let season = block
                .title
                .as_deref()
                .and_then(text::first_number)
                .unwrap_or(1);

            block
                .links
                .iter()
                .filter(|link| !text::is_navigation_link(&link.text))
                .enumerate()
                .filter_map(move |(idx, link)| {
                    let url = absolute_url(base, link.href.as_deref()?).ok()?;
                    Some(Episode {
                        url,
                        name: link.text.clone(),
                        season: Some(season),
                        episode: Some(text::episode_number(&link.text).unwrap_or(idx as u32 + 1)),
                    })
                })
        })
        .collect()
}

fn flat_episodes(links: &[EpisodeLink], base: &Url) -> Vec<Episode> {
    links
        .iter()
        .filter(|link| !text::is_navigation_link(&link.text))
        .filter_map(|link| {
            let url = absolute_url(base, link.href.as_deref()?).ok()?;
            Some(Episode {
                url,
                name: link.text.clone(),
                season: text::season_number(&link.text),
                episode: Some(text::episode_number(&link.text)?),
            })
        })
        .collect()
}

fn dedup(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suppliers::muvipro::config::klikxxi;

    fn base() -> Url {
        Url::parse("https://www.klikxxi.com").unwrap()
    }

    const LISTING: &str = r#"
        <div id="gmr-main-load">
            <article class="item">
                <h2 class="entry-title"><a href="/the-batman-2022/" title="Permalink to: The Batman">The Batman</a></h2>
                <img data-src="https://cdn.test/wp/batman-152x228.jpg" src="data:image/gif">
                <span class="gmr-quality-item"><a>HD-CAM</a></span>
            </article>
            <article class="item">
                <h2 class="entry-title"><a href="https://www.klikxxi.com/tv/the-boys/" title=""> The Boys </a></h2>
                <img src="//cdn.test/wp/boys-300x450.jpg">
                <div class="gmr-posttype-item">TV Show</div>
            </article>
            <article class="item">
                <h2 class="entry-title"><a href="/no-title/" title=" "></a></h2>
            </article>
            <article class="item">
                <span class="gmr-quality-item">HD</span>
            </article>
            <div class="gmr-item">
                <a href="/series/dark/" title="Permalink to: Dark">Dark</a>
                <img data-lazy-src="/wp/dark-300x450.jpg.webp">
                <div class="gmr-qual">WEB-DL</div>
            </div>
        </div>
    "#;

    #[test]
    fn should_map_listing_cards() {
        let config = klikxxi();
        let processor = cards_processor(&config.selectors).unwrap();
        let entries: Vec<_> = html::process_document::<Vec<CardFields>>(LISTING, &processor)
            .into_iter()
            .filter_map(|card| card.into_entry(&base(), &config))
            .collect();

        assert_eq!(entries.len(), 3);

        assert_eq!(entries[0].title, "The Batman");
        assert_eq!(entries[0].url, "https://www.klikxxi.com/the-batman-2022/");
        assert_eq!(
            entries[0].poster.as_deref(),
            Some("https://cdn.test/wp/batman.jpg")
        );
        assert_eq!(entries[0].quality.as_deref(), Some("HD-CAM"));
        assert_eq!(entries[0].kind, MediaKind::Movie);

        assert_eq!(entries[1].title, "The Boys");
        assert_eq!(entries[1].poster.as_deref(), Some("https://cdn.test/wp/boys.jpg"));
        assert_eq!(entries[1].quality, None);
        assert_eq!(entries[1].kind, MediaKind::Series);

        assert_eq!(entries[2].title, "Dark");
        assert_eq!(entries[2].url, "https://www.klikxxi.com/series/dark/");
        assert_eq!(
            entries[2].poster.as_deref(),
            Some("https://www.klikxxi.com/wp/dark.jpg.webp")
        );
        assert_eq!(entries[2].quality.as_deref(), Some("WEBDL"));
        assert_eq!(entries[2].kind, MediaKind::Series);
    }

    #[test]
    fn should_map_detail_page() {
        let page = r#"
            <h1 class="entry-title">Reply 1988 Season 1 (2015)</h1>
            <figure class="pull-left"><img src="/wp/reply-300x450.jpg"></figure>
            <div itemprop="description"><p>Five friends.</p></div>
            <div class="gmr-moviedata"><strong>Genre:</strong> <a>Comedy</a>, <a>Drama</a>, <a>Comedy</a></div>
            <div class="gmr-moviedata"><strong>Year:</strong> <a>2015</a></div>
            <div class="gmr-moviedata"><span itemprop="actors"><a>Lee Hye-ri</a></span><span itemprop="actors"><a>Ryu Jun-yeol</a></span></div>
            <div class="gmr-meta-rating"><span itemprop="ratingValue">9.2</span></div>
            <ul class="gmr-player-nav"><li><a class="gmr-trailer-popup" href="https://www.youtube.com/watch?v=x">Trailer</a></li></ul>
            <div class="gmr-season-block">
                <h3 class="season-title">Season 2</h3>
                <div class="gmr-season-episodes"><a href="/eps/s2e1/">Eps1</a></div>
            </div>
            <div class="gmr-season-block">
                <h3 class="season-title">Season 1</h3>
                <div class="gmr-season-episodes">
                    <a href="/eps/s1e2/">Eps2</a>
                    <a href="/eps/s1e1/">Eps1</a>
                    <a href="/eps/s1/">Batch Download</a>
                </div>
            </div>
            <div class="idmuvi-rp"><ul>
                <li><a href="/movie/other/"><img data-src="/wp/other-60x90.jpg"><span class="idmuvi-rp-title">Other</span></a></li>
                <li><span>broken</span></li>
            </ul></div>
        "#;

        let config = klikxxi();
        let processor = detail_processor(&config.selectors).unwrap();
        let record = html::process_document::<DetailFields>(page, &processor).into_record(
            "https://www.klikxxi.com/tv/reply-1988/",
            &base(),
            &config,
        );

        assert_eq!(record.title, "Reply 1988");
        assert_eq!(record.kind, MediaKind::Series);
        assert_eq!(record.poster.as_deref(), Some("https://www.klikxxi.com/wp/reply.jpg"));
        assert_eq!(record.plot.as_deref(), Some("Five friends."));
        assert_eq!(record.tags, vec!["Comedy", "Drama"]);
        assert_eq!(record.year, Some(2015));
        assert_eq!(record.rating, Some(9.2));
        assert_eq!(record.cast, vec!["Lee Hye-ri", "Ryu Jun-yeol"]);
        assert_eq!(record.trailer.as_deref(), Some("https://www.youtube.com/watch?v=x"));

        assert_eq!(record.recommendations.len(), 1);
        assert_eq!(record.recommendations[0].title, "Other");
        assert_eq!(
            record.recommendations[0].poster.as_deref(),
            Some("https://www.klikxxi.com/wp/other.jpg")
        );

        let episodes: Vec<_> = record
            .episodes
            .iter()
            .map(|e| (e.season, e.episode, e.url.as_str()))
            .collect();
        assert_eq!(
            episodes,
            vec![
                (Some(1), Some(1), "https://www.klikxxi.com/eps/s1e1/"),
                (Some(1), Some(2), "https://www.klikxxi.com/eps/s1e2/"),
                (Some(2), Some(1), "https://www.klikxxi.com/eps/s2e1/"),
            ]
        );
    }

    fn season_block_episodes(anchors: &str) -> Vec<(Option<u32>, Option<u32>, String)> {
        let page = format!(
            r#"
            <h1 class="entry-title">Live Show</h1>
            <div class="gmr-season-block">
                <h3 class="season-title">Episodes</h3>
                <div class="gmr-season-episodes">{anchors}</div>
            </div>
            "#
        );

        let config = klikxxi();
        let processor = detail_processor(&config.selectors).unwrap();
        html::process_document::<DetailFields>(&page, &processor)
            .into_record("https://www.klikxxi.com/tv/live-show/", &base(), &config)
            .episodes
            .into_iter()
            .map(|e| (e.season, e.episode, e.name))
            .collect()
    }

    #[test]
    fn should_number_episodes_by_position() {
        let episodes = season_block_episodes(
            r#"
            <a href="/eps/live-show-1/">Episode 1</a>
            <a href="/eps/live-show-2/">Episode 2</a>
            <a href="/eps/live-show-3/">Episode 3</a>
            <a href="/tv/live-show/all/">View All</a>
            "#,
        );

        assert_eq!(
            episodes,
            vec![
                (Some(1), Some(1), "Episode 1".to_owned()),
                (Some(1), Some(2), "Episode 2".to_owned()),
                (Some(1), Some(3), "Episode 3".to_owned()),
            ]
        );
    }

    #[test]
    fn should_ignore_numbers_detached_from_episode_prefix() {
        let episodes = season_block_episodes(
            r#"
            <a href="/eps/live-1/">Episode 1 LIVE 2024</a>
            <a href="/eps/live-2/">Episode 2 ONE 7</a>
            "#,
        );

        assert_eq!(
            episodes,
            vec![
                (Some(1), Some(1), "Episode 1 LIVE 2024".to_owned()),
                (Some(1), Some(2), "Episode 2 ONE 7".to_owned()),
            ]
        );
    }

    #[test]
    fn should_fall_back_to_flat_episode_list() {
        let page = r#"
            <h1 class="entry-title">Flat Show</h1>
            <div class="gmr-listseries">
                <a href="/flat/view-all/">View All Episodes</a>
                <a href="/flat/s1e2/">S1 Eps2</a>
                <a href="/flat/s1e1/">S1 Eps1</a>
                <a href="/flat/special/">Special</a>
            </div>
        "#;

        let config = klikxxi();
        let processor = detail_processor(&config.selectors).unwrap();
        let record = html::process_document::<DetailFields>(page, &processor).into_record(
            "https://www.klikxxi.com/flat-show/",
            &base(),
            &config,
        );

        let names: Vec<_> = record.episodes.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["S1 Eps1", "S1 Eps2"]);
        assert_eq!(record.kind, MediaKind::Series);
    }

    #[test]
    fn should_tolerate_empty_detail_page() {
        let config = klikxxi();
        let processor = detail_processor(&config.selectors).unwrap();
        let record = html::process_document::<DetailFields>("<html></html>", &processor).into_record(
            "https://www.klikxxi.com/movie/",
            &base(),
            &config,
        );

        assert_eq!(record.title, "");
        assert_eq!(record.kind, MediaKind::Movie);
        assert!(record.tags.is_empty() && record.episodes.is_empty());
        assert_eq!((record.year, record.rating, record.plot), (None, None, None));
    }

    #[test]
    fn should_reject_out_of_scale_rating() {
        assert_eq!(parse_rating("7,5"), Some(7.5));
        assert_eq!(parse_rating("85"), None);
        assert_eq!(parse_rating("n/a"), None);
    }
}
