use anyhow::anyhow;
use indexmap::IndexMap;
use serde::Deserialize;
use url::{Url, form_urlencoded};

const PAGE_PLACEHOLDER: &str = "{page}";
const QUERY_PLACEHOLDER: &str = "{query}";

/// Everything that differs between two sites built on the muvipro theme.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    pub name: String,
    pub url: String,
    #[serde(default = "default_lang")]
    pub lang: String,
    /// Section name to path template, `{page}` is replaced by the page number.
    #[serde(default)]
    pub sections: IndexMap<String, String>,
    #[serde(default = "default_search_path")]
    pub search_path: String,
    /// Page 1 is served from the path without its `page/{page}/` segment.
    #[serde(default)]
    pub bare_first_page: bool,
    #[serde(default = "default_series_markers")]
    pub series_markers: Vec<String>,
    #[serde(default = "default_ajax_action")]
    pub ajax_action: String,
    #[serde(default)]
    pub selectors: SiteSelectors,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteSelectors {
    pub cards: String,
    pub card_link: String,
    pub card_image: String,
    pub card_quality: String,
    /// Read when `card_quality` is missing, dashes are dropped.
    pub card_quality_fallback: String,
    pub card_type: String,

    pub heading: String,
    pub poster: String,
    pub plot: String,
    pub meta_rows: String,
    pub genre_label: String,
    pub year_label: String,
    pub rating: String,
    pub actors: String,
    pub trailer: String,

    pub recommendations: String,
    pub recommendation_link: String,
    pub recommendation_title: String,
    pub recommendation_image: String,

    pub season_blocks: String,
    pub season_title: String,
    pub season_episodes: String,
    pub flat_episodes: String,

    pub player_content_id: String,
    pub player_tabs: String,
    pub embed_iframe: String,
    pub ajax_tabs: String,
}

impl Default for SiteSelectors {
    fn default() -> Self {
        Self {
            cards: "article.item, div.gmr-item, div.item-movie, div.item-series".into(),
            card_link: "h2.entry-title > a, a[title], a[href]".into(),
            card_image: "img".into(),
            card_quality: "span.gmr-quality-item".into(),
            card_quality_fallback: "div.gmr-qual, div.gmr-quality-item > a".into(),
            card_type: ".gmr-posttype-item".into(),

            heading: "h1.entry-title, div.mvic-desc h3".into(),
            poster: "figure.pull-left > img".into(),
            plot: "div[itemprop=description] > p, div.desc p.f-desc, div.entry-content > p".into(),
            meta_rows: "div.gmr-moviedata".into(),
            genre_label: "Genre".into(),
            year_label: "Year".into(),
            rating: "div.gmr-meta-rating > span[itemprop=ratingValue]".into(),
            actors: "div.gmr-moviedata span[itemprop=actors] a".into(),
            trailer: "ul.gmr-player-nav li a.gmr-trailer-popup".into(),

            recommendations: "div.idmuvi-rp ul li".into(),
            recommendation_link: "a".into(),
            recommendation_title: "a > span.idmuvi-rp-title".into(),
            recommendation_image: "a > img".into(),

            season_blocks: "div.gmr-season-block".into(),
            season_title: "h3.season-title".into(),
            season_episodes: "div.gmr-season-episodes a".into(),
            flat_episodes: "div.gmr-listseries a".into(),

            player_content_id: "div#muvipro_player_content_id".into(),
            player_tabs: "ul.muvipro-player-tabs li a".into(),
            embed_iframe: "div.gmr-embed-responsive iframe".into(),
            ajax_tabs: "div.tab-content-ajax".into(),
        }
    }
}

fn default_lang() -> String {
    "id".into()
}

fn default_search_path() -> String {
    "/?s={query}&post_type[]=post&post_type[]=tv".into()
}

fn default_series_markers() -> Vec<String> {
    vec!["/series/".into(), "/tv/".into()]
}

fn default_ajax_action() -> String {
    "muvipro_player_content".into()
}

impl SiteConfig {
    pub fn base_url(&self) -> anyhow::Result<Url> {
        Url::parse(&self.url).map_err(|err| anyhow!("[{}] invalid base url {}: {err}", self.name, self.url))
    }

    pub fn section_url(&self, template: &str, page: u16) -> String {
        let page = page.max(1);
        let path = if page == 1 && self.bare_first_page {
            template.replace(&format!("page/{PAGE_PLACEHOLDER}/"), "")
        } else {
            template.to_owned()
        };

        self.join(&path.replace(PAGE_PLACEHOLDER, &page.to_string()))
    }

    pub fn search_url(&self, query: &str) -> String {
        let encoded: String = form_urlencoded::byte_serialize(query.trim().as_bytes()).collect();
        self.join(&self.search_path.replace(QUERY_PLACEHOLDER, &encoded))
    }

    pub fn is_series_url(&self, url: &str) -> bool {
        self.series_markers.iter().any(|marker| url.contains(marker.as_str()))
    }

    fn join(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_owned();
        }

        format!(
            "{}/{}",
            self.url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[derive(Deserialize)]
struct SitesFile {
    #[serde(rename = "site", default)]
    sites: Vec<SiteConfig>,
}

/// Parses a TOML document holding `[[site]]` tables.
pub fn sites_from_toml(content: &str) -> anyhow::Result<Vec<SiteConfig>> {
    let file: SitesFile = toml::from_str(content)?;
    Ok(file.sites)
}

pub fn klikxxi() -> SiteConfig {
    const SECTIONS: [(&str, &str); 27] = [
        ("All Movies", "/page/{page}/?s&search=advanced&post_type=movie"),
        (
            "All Movies (Alt)",
            "/?s=&search=advanced&post_type=movie&orderby=&genre=&movieyear=&country=&quality=&paged={page}",
        ),
        ("All Series", "/series/page/{page}/"),
        ("Action", "/genre/action/page/{page}/"),
        ("Adventure", "/genre/adventure/page/{page}/"),
        ("Animation", "/genre/animation/page/{page}/"),
        ("Comedy", "/genre/comedy/page/{page}/"),
        ("Crime", "/genre/crime/page/{page}/"),
        ("Drama", "/genre/drama/page/{page}/"),
        ("Fantasy", "/genre/fantasy/page/{page}/"),
        ("Family", "/genre/family/page/{page}/"),
        ("Horror", "/genre/horror/page/{page}/"),
        ("Mystery", "/genre/mystery/page/{page}/"),
        ("Romance", "/genre/romance/page/{page}/"),
        ("Science Fiction", "/genre/sci-fi/page/{page}/"),
        ("Thriller", "/genre/thriller/page/{page}/"),
        ("Asia", "/country/asia/page/{page}/"),
        ("India", "/country/india/page/{page}/"),
        ("Korea", "/country/korea/page/{page}/"),
        ("China", "/country/china/page/{page}/"),
        ("Europe", "/country/europe/page/{page}/"),
        ("Western Movies", "/western/page/{page}/"),
        ("Asian Movies", "/asian/page/{page}/"),
        ("Western Series", "/western-series/page/{page}/"),
        ("Korean Series", "/korean-series/page/{page}/"),
        ("India Series", "/india-series/page/{page}/"),
        ("Asia Series", "/asia-series/page/{page}/"),
    ];

    SiteConfig {
        name: "Klikxxi".into(),
        url: "https://www.klikxxi.com".into(),
        lang: default_lang(),
        sections: SECTIONS
            .iter()
            .map(|(name, path)| (name.to_string(), path.to_string()))
            .collect(),
        search_path: default_search_path(),
        bare_first_page: false,
        series_markers: default_series_markers(),
        ajax_action: default_ajax_action(),
        selectors: SiteSelectors::default(),
    }
}

pub fn builtin_sites() -> Vec<SiteConfig> {
    vec![klikxxi()]
}
