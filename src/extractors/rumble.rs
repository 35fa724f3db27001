use std::{collections::HashSet, sync::OnceLock};

use futures::future::BoxFuture;
use regex::Regex;

use crate::{
    models::{ExtractedMedia, LinkKind, ResolvedLink},
    utils::{self, text},
};

const NAME: &str = "rumble";

pub fn extract_boxed<'a>(
    url: &'a str,
    referer: &'a str,
) -> BoxFuture<'a, anyhow::Result<ExtractedMedia>> {
    Box::pin(extract(url, referer))
}

pub async fn extract(url: &str, referer: &str) -> anyhow::Result<ExtractedMedia> {
    let html = utils::create_client()
        .get(url)
        .header("Referer", referer)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    Ok(ExtractedMedia {
        streams: find_streams(&html, url),
        subtitles: vec![],
    })
}

fn find_streams(html: &str, url: &str) -> Vec<ResolvedLink> {
    static MEDIA_URL_RE: OnceLock<Regex> = OnceLock::new();
    let re = MEDIA_URL_RE.get_or_init(|| {
        Regex::new(r#""url":"(?<url>https?:[^"]+?\.(?:mp4|m3u8)[^"]*)""#).unwrap()
    });

    let unescaped = text::unescape_json_slashes(html);
    let mut seen = HashSet::new();

    re.captures_iter(&unescaped)
        .filter_map(|caps| Some(caps.name("url")?.as_str().to_owned()))
        .filter(|link| seen.insert(link.clone()))
        .enumerate()
        .map(|(idx, link)| ResolvedLink {
            label: format!("{NAME} {}.", idx + 1),
            kind: LinkKind::from_url(&link),
            url: link,
            referer: url.into(),
            source: NAME.into(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_find_unique_streams() {
        let html = r#"<script>g.f["v4x"]={"ua":{"mp4":{"360":{"url":"https:\/\/1a.rumble.cloud\/video\/a.mp4","meta":{}},"720":{"url":"https:\/\/1a.rumble.cloud\/video\/b.mp4?u=1"}},"hls":{"auto":{"url":"https:\/\/rumble.com\/live\/v.m3u8"}}},"i":"https:\/\/1a.rumble.cloud\/thumb.jpg","dup":{"url":"https:\/\/1a.rumble.cloud\/video\/a.mp4"}}</script>"#;

        let streams = find_streams(html, "https://rumble.com/embed/v4x/");
        let urls: Vec<_> = streams.iter().map(|s| s.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://1a.rumble.cloud/video/a.mp4",
                "https://1a.rumble.cloud/video/b.mp4?u=1",
                "https://rumble.com/live/v.m3u8",
            ]
        );
        assert_eq!(streams[2].kind, LinkKind::Hls);
        assert_eq!(streams[0].label, "rumble 1.");
    }
}
