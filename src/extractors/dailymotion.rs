use std::{collections::BTreeMap, sync::OnceLock};

use anyhow::anyhow;
use futures::future::BoxFuture;
use regex::Regex;
use serde::Deserialize;

use crate::{
    models::{ExtractedMedia, LinkKind, ResolvedLink, SubtitleTrack},
    utils,
};

const NAME: &str = "dailymotion";
const METADATA_URL: &str = "https://www.dailymotion.com/player/metadata/video";

#[derive(Deserialize, Debug)]
struct Metadata {
    #[serde(default)]
    qualities: BTreeMap<String, Vec<Quality>>,
    #[serde(default)]
    subtitles: Option<Subtitles>,
    error: Option<MetadataError>,
}

#[derive(Deserialize, Debug)]
struct Quality {
    #[serde(rename = "type")]
    mime: String,
    url: String,
}

#[derive(Deserialize, Debug)]
struct Subtitles {
    #[serde(default)]
    data: BTreeMap<String, SubtitleData>,
}

#[derive(Deserialize, Debug)]
struct SubtitleData {
    #[serde(default)]
    label: String,
    #[serde(default)]
    urls: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct MetadataError {
    title: Option<String>,
}

pub fn extract_boxed<'a>(
    url: &'a str,
    referer: &'a str,
) -> BoxFuture<'a, anyhow::Result<ExtractedMedia>> {
    Box::pin(extract(url, referer))
}

pub async fn extract(url: &str, referer: &str) -> anyhow::Result<ExtractedMedia> {
    let id = video_id(url).ok_or_else(|| anyhow!("[{NAME}] no video id in {url}"))?;

    let metadata: Metadata = utils::create_client()
        .get(format!("{METADATA_URL}/{id}"))
        .header("Referer", referer)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    if let Some(err) = metadata.error {
        return Err(anyhow!(
            "[{NAME}] {}",
            err.title.unwrap_or_else(|| "metadata error".into())
        ));
    }

    Ok(to_media(metadata, url))
}

fn video_id(url: &str) -> Option<&str> {
    static VIDEO_ID_RE: OnceLock<Regex> = OnceLock::new();
    VIDEO_ID_RE
        .get_or_init(|| {
            Regex::new(r"(?:/embed/video/|/video/|[?&]video=|dai\.ly/)(?<id>[A-Za-z0-9]+)").unwrap()
        })
        .captures(url)
        .and_then(|caps| Some(caps.name("id")?.as_str()))
}

fn to_media(metadata: Metadata, url: &str) -> ExtractedMedia {
    // "auto" is the adaptive master playlist, the other keys are fixed heights
    let streams = metadata
        .qualities
        .get("auto")
        .into_iter()
        .flatten()
        .filter(|quality| quality.mime.contains("mpegURL"))
        .map(|quality| ResolvedLink {
            url: quality.url.clone(),
            label: format!("{NAME} auto"),
            referer: url.into(),
            kind: LinkKind::Hls,
            source: NAME.into(),
        })
        .collect();

    let subtitles = metadata
        .subtitles
        .map(|subs| subs.data)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(lang, data)| {
            Some(SubtitleTrack {
                url: data.urls.into_iter().next()?,
                label: if data.label.is_empty() {
                    lang.clone()
                } else {
                    data.label
                },
                language: Some(lang),
            })
        })
        .collect();

    ExtractedMedia { streams, subtitles }
}
