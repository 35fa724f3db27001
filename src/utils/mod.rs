pub mod html;
pub mod text;
pub mod unpack;

mod doh;

use std::{
    sync::{Arc, OnceLock},
    time::Duration,
};

use anyhow::anyhow;
use doh::DoHResolver;
use futures::future::BoxFuture;
use reqwest::{
    ClientBuilder,
    header::{self, HeaderMap},
};
use url::Url;

pub fn get_user_agent<'a>() -> &'a str {
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/138.0.0.0 Safari/537.36 Edg/138.0.0.0"
}

pub fn create_client() -> &'static reqwest::Client {
    static LAZZY_CLIENT: OnceLock<reqwest::Client> = OnceLock::new();
    LAZZY_CLIENT.get_or_init(|| {
        let mut headers = get_default_headers();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );

        create_client_builder()
            .default_headers(headers)
            .build()
            .unwrap_or_default()
    })
}

pub fn create_client_builder() -> reqwest::ClientBuilder {
    ClientBuilder::new()
        .connect_timeout(Duration::from_secs(5))
        .read_timeout(Duration::from_secs(30))
        .user_agent(get_user_agent())
        .danger_accept_invalid_certs(true)
        .cookie_store(true)
        .dns_resolver(Arc::new(DoHResolver::default()))
}

pub fn get_default_headers() -> HeaderMap {
    let mut headers = HeaderMap::default();

    headers.insert(
        header::ACCEPT_ENCODING,
        header::HeaderValue::from_static("gzip, deflate, br"),
    );
    headers.insert(
        header::ACCEPT_LANGUAGE,
        header::HeaderValue::from_static("id-ID,id;q=0.9,en-US;q=0.8,en;q=0.5"),
    );
    headers.insert(header::CACHE_CONTROL, header::HeaderValue::from_static("no-cache"));
    headers.insert(header::PRAGMA, header::HeaderValue::from_static("no-cache"));
    headers.insert(header::DNT, header::HeaderValue::from_static("1"));
    headers.insert(
        header::UPGRADE_INSECURE_REQUESTS,
        header::HeaderValue::from_static("1"),
    );
    headers
}

/// Body of a fetched page together with the URL reached after redirects.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub final_url: Url,
    pub body: String,
}

impl FetchedPage {
    /// `scheme://host[:port]` of the final URL.
    pub fn origin(&self) -> String {
        self.final_url.origin().ascii_serialization()
    }
}

pub trait Fetcher: Send + Sync {
    fn get<'a>(&'a self, url: &'a str) -> BoxFuture<'a, anyhow::Result<FetchedPage>>;

    fn post_form<'a>(
        &'a self,
        url: &'a str,
        form: &'a [(&'a str, &'a str)],
        referer: &'a str,
    ) -> BoxFuture<'a, anyhow::Result<String>>;
}

#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self {
            client: create_client().clone(),
        }
    }
}

impl HttpFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Fetcher for HttpFetcher {
    fn get<'a>(&'a self, url: &'a str) -> BoxFuture<'a, anyhow::Result<FetchedPage>> {
        Box::pin(async move {
            let res = self.client.get(url).send().await?.error_for_status()?;
            let final_url = res.url().clone();
            let body = res.text().await?;

            Ok(FetchedPage { final_url, body })
        })
    }

    fn post_form<'a>(
        &'a self,
        url: &'a str,
        form: &'a [(&'a str, &'a str)],
        referer: &'a str,
    ) -> BoxFuture<'a, anyhow::Result<String>> {
        Box::pin(async move {
            let body = self
                .client
                .post(url)
                .header(header::REFERER, referer)
                .header("X-Requested-With", "XMLHttpRequest")
                .form(form)
                .send()
                .await?
                .error_for_status()?
                .text()
                .await?;

            Ok(body)
        })
    }
}

pub async fn scrap_page<T>(
    fetcher: &dyn Fetcher,
    url: &str,
    processor: &dyn html::DOMProcessor<T>,
) -> anyhow::Result<T> {
    let page = fetcher.get(url).await?;

    let document = scraper::Html::parse_document(&page.body);
    let root = document.root_element();

    Ok(processor.process(&root))
}

/// Resolves `href` against `base`, accepting protocol-relative links.
pub fn absolute_url(base: &Url, href: &str) -> anyhow::Result<String> {
    let href = href.trim();
    if href.is_empty() {
        return Err(anyhow!("empty link"));
    }

    let resolved = base.join(&text::to_full_url(href))?;
    match resolved.scheme() {
        "http" | "https" => Ok(resolved.into()),
        scheme => Err(anyhow!("unsupported scheme {scheme} in {href}")),
    }
}
