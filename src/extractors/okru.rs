use std::sync::OnceLock;

use anyhow::anyhow;
use futures::future::BoxFuture;
use scraper::Selector;
use serde::Deserialize;

use crate::{
    models::{ExtractedMedia, LinkKind, ResolvedLink},
    utils,
};

const NAME: &str = "okru";

#[derive(Deserialize, Debug)]
struct PlayerOptions {
    flashvars: FlashVars,
}

#[derive(Deserialize, Debug)]
struct FlashVars {
    /// JSON document encoded as a string
    metadata: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct VideoMetadata {
    #[serde(default)]
    videos: Vec<Video>,
    hls_manifest_url: Option<String>,
}

#[derive(Deserialize, Debug)]
struct Video {
    name: String,
    url: String,
}

pub fn extract_boxed<'a>(
    url: &'a str,
    referer: &'a str,
) -> BoxFuture<'a, anyhow::Result<ExtractedMedia>> {
    Box::pin(extract(url, referer))
}

pub async fn extract(url: &str, referer: &str) -> anyhow::Result<ExtractedMedia> {
    let embed_url = url.replace("/video/", "/videoembed/");

    let html = utils::create_client()
        .get(&embed_url)
        .header("Referer", referer)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    let metadata = parse_embed_page(&html)?;
    Ok(to_media(metadata, &embed_url))
}

fn parse_embed_page(html: &str) -> anyhow::Result<VideoMetadata> {
    static OPTIONS_SELECTOR: OnceLock<Selector> = OnceLock::new();
    let selector = OPTIONS_SELECTOR
        .get_or_init(|| Selector::parse("div[data-module=OKVideo][data-options]").unwrap());

    let document = scraper::Html::parse_document(html);
    let options = document
        .select(selector)
        .find_map(|el| el.attr("data-options"))
        .ok_or_else(|| anyhow!("[{NAME}] no player options found"))?;

    let options: PlayerOptions = serde_json::from_str(options)?;
    Ok(serde_json::from_str(&options.flashvars.metadata)?)
}

fn quality_label(name: &str) -> &str {
    match name {
        "mobile" => "144p",
        "lowest" => "240p",
        "low" => "360p",
        "sd" => "480p",
        "hd" => "720p",
        "full" => "1080p",
        "quad" => "1440p",
        "ultra" => "2160p",
        other => other,
    }
}

fn to_media(metadata: VideoMetadata, embed_url: &str) -> ExtractedMedia {
    let hls = metadata.hls_manifest_url.map(|url| ResolvedLink {
        url,
        label: format!("{NAME} auto"),
        referer: embed_url.into(),
        kind: LinkKind::Hls,
        source: NAME.into(),
    });

    let streams = hls
        .into_iter()
        .chain(metadata.videos.into_iter().map(|video| ResolvedLink {
            label: format!("{NAME} {}", quality_label(&video.name)),
            kind: LinkKind::from_url(&video.url),
            url: video.url,
            referer: embed_url.into(),
            source: NAME.into(),
        }))
        .collect();

    ExtractedMedia {
        streams,
        subtitles: vec![],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMBED_PAGE: &str = r#"<html><body>
        <div data-module="OKVideo" data-options="{&quot;flashvars&quot;:{&quot;metadata&quot;:&quot;{\&quot;videos\&quot;:[{\&quot;name\&quot;:\&quot;mobile\&quot;,\&quot;url\&quot;:\&quot;https://vd.okcdn.ru/?id=1&amp;type=4\&quot;},{\&quot;name\&quot;:\&quot;hd\&quot;,\&quot;url\&quot;:\&quot;https://vd.okcdn.ru/?id=1&amp;type=3\&quot;}],\&quot;hlsManifestUrl\&quot;:\&quot;https://vd.okcdn.ru/video.m3u8\&quot;}&quot;}}"></div>
    </body></html>"#;

    #[test]
    fn should_parse_embed_page() {
        let metadata = parse_embed_page(EMBED_PAGE).unwrap();
        let media = to_media(metadata, "https://ok.ru/videoembed/1");

        let labels: Vec<_> = media.streams.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["okru auto", "okru 144p", "okru 720p"]);
        assert_eq!(media.streams[0].kind, LinkKind::Hls);
        assert_eq!(media.streams[2].url, "https://vd.okcdn.ru/?id=1&type=3");
        assert_eq!(media.streams[2].kind, LinkKind::Direct);
    }

    #[test]
    fn should_fail_without_player() {
        assert!(parse_embed_page("<html></html>").is_err());
    }
}
