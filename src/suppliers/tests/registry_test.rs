use std::sync::Arc;

use httpmock::prelude::*;

use super::local_extractors;
use crate::{
    api,
    suppliers::{self, ContentSupplier, Registry},
    utils::HttpFetcher,
};

const SITES: &str = r#"
[[site]]
name = "Mirror"
url = "https://mirror.test"
sections = { "Latest" = "/page/{page}/", "Drama" = "/genre/drama/page/{page}/" }
bare_first_page = true

[site.selectors]
cards = "div.card"
"#;

fn registry() -> Registry {
    Registry::new(Arc::new(HttpFetcher::default()), local_extractors())
}

#[test]
fn should_list_builtin_suppliers() {
    assert_eq!(suppliers::avalaible_suppliers(), vec!["Klikxxi"]);

    let sup = suppliers::get_supplier("klikxxi").unwrap();
    assert_eq!(sup.name(), "Klikxxi");
    assert_eq!(sup.get_channels().len(), 27);
    assert_eq!(sup.get_channels()[0], "All Movies");
    assert_eq!(sup.get_supported_languages(), vec!["id"]);

    assert!(suppliers::get_supplier("nope").is_err());
}

#[test]
fn should_register_sites_from_toml() {
    let mut registry = Registry::builtin().unwrap();
    registry.register_sites_from_toml(SITES).unwrap();

    assert_eq!(registry.avalaible_suppliers(), vec!["Klikxxi", "Mirror"]);

    let mirror = registry.get_supplier("MIRROR").unwrap();
    assert_eq!(mirror.get_channels(), vec!["Latest", "Drama"]);
    assert_eq!(mirror.config().selectors.cards, "div.card");
    assert_eq!(mirror.config().selectors.embed_iframe, "div.gmr-embed-responsive iframe");
    assert_eq!(mirror.config().lang, "id");
}

#[test]
fn should_replace_site_with_same_name() {
    let mut registry = Registry::builtin().unwrap();
    registry
        .register_sites_from_toml(
            r#"
            [[site]]
            name = "klikxxi"
            url = "https://klikxxi.mirror.test"
            sections = { "Latest" = "/page/{page}/" }
            "#,
        )
        .unwrap();

    assert_eq!(registry.suppliers().len(), 1);
    assert_eq!(
        registry.get_supplier("Klikxxi").unwrap().config().url,
        "https://klikxxi.mirror.test"
    );
}

#[test]
fn should_reject_invalid_site() {
    let mut registry = registry();

    let bad_selector = r#"
        [[site]]
        name = "Broken"
        url = "https://broken.test"
        [site.selectors]
        cards = "div["
    "#;
    assert!(registry.register_sites_from_toml(bad_selector).is_err());

    let bad_url = r#"
        [[site]]
        name = "Broken"
        url = "not a url"
    "#;
    assert!(registry.register_sites_from_toml(bad_url).is_err());
    assert!(registry.suppliers().is_empty());
}

#[test_log::test(tokio::test)]
async fn should_route_api_calls_through_registry() {
    let server = MockServer::start_async().await;
    let listing = server
        .mock_async(|when, then| {
            when.method(GET).path("/");
            then.status(200).body(
                r#"<html><body><div class="card"><a href="/film/" title="Film">Film</a></div></body></html>"#,
            );
        })
        .await;

    let mut registry = registry();
    registry
        .register_sites_from_toml(&format!(
            r#"
            [[site]]
            name = "Local"
            url = "{}"
            sections = {{ "Latest" = "/page/{{page}}/" }}
            bare_first_page = true
            [site.selectors]
            cards = "div.card"
            "#,
            server.base_url()
        ))
        .unwrap();

    assert_eq!(api::get_channels(&registry, "local").unwrap(), vec!["Latest"]);

    let entries = api::load_channel(&registry, "Local", "Latest".into(), 1)
        .await
        .unwrap();
    listing.assert_async().await;

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].url, server.url("/film/"));
    assert!(api::get_channels(&registry, "missing").is_err());
}
