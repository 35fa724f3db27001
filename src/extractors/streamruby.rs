use std::sync::OnceLock;

use anyhow::anyhow;
use futures::future::BoxFuture;
use log::debug;
use regex::Regex;
use scraper::Selector;
use url::Url;

use crate::{
    models::{ExtractedMedia, LinkKind, ResolvedLink, SubtitleTrack},
    utils::{self, text, unpack::packerjs},
};

const NAME: &str = "streamruby";

pub fn extract_boxed<'a>(
    url: &'a str,
    referer: &'a str,
) -> BoxFuture<'a, anyhow::Result<ExtractedMedia>> {
    Box::pin(extract(url, referer))
}

pub async fn extract(url: &str, referer: &str) -> anyhow::Result<ExtractedMedia> {
    let parsed = Url::parse(url)?;
    let host = parsed.origin().ascii_serialization();
    let file_code = file_code(url).ok_or_else(|| anyhow!("[{NAME}] invalid url: {url}"))?;

    let html = utils::create_client()
        .post(format!("{host}/dl"))
        .header("Referer", referer)
        .form(&[
            ("op", "embed"),
            ("file_code", file_code),
            ("auto", "1"),
            ("referer", ""),
        ])
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    let script = player_script(&html).ok_or_else(|| anyhow!("[{NAME}] no player script found"))?;
    debug!("[{NAME}] player script: {script}");

    let media = parse_player_script(&script, &host);
    if media.streams.is_empty() {
        return Err(anyhow!("[{NAME}] no file property in player script"));
    }

    Ok(media)
}

fn file_code(url: &str) -> Option<&str> {
    static FILE_CODE_RE: OnceLock<Regex> = OnceLock::new();
    FILE_CODE_RE
        .get_or_init(|| Regex::new(r"(?:/e/|/embed-|/d/)(?<code>\w+)").unwrap())
        .captures(url)
        .and_then(|caps| Some(caps.name("code")?.as_str()))
}

/// Unpacked player setup, or the plain script declaring `sources:`.
fn player_script(html: &str) -> Option<String> {
    static SCRIPT_SELECTOR: OnceLock<Selector> = OnceLock::new();
    let selector = SCRIPT_SELECTOR.get_or_init(|| Selector::parse("script").unwrap());

    let document = scraper::Html::parse_document(html);
    let scripts: Vec<String> = document
        .select(selector)
        .map(|el| el.text().collect())
        .collect();

    let packed = scripts
        .iter()
        .map(|script| script.trim())
        .find(|script| packerjs::detect(script))
        .or_else(|| packerjs::find_packed(html));

    if let Some(packed) = packed {
        match packerjs::unpack(packed) {
            Ok(script) => return Some(script),
            Err(err) => debug!("[{NAME}] {err}"),
        }
    }

    scripts.into_iter().find(|script| script.contains("sources:"))
}

fn parse_player_script(script: &str, host: &str) -> ExtractedMedia {
    static TRACK_RE: OnceLock<Regex> = OnceLock::new();

    let streams = text::extract_file_property(script)
        .map(|file| {
            let link = if file.starts_with('/') {
                format!("{host}{file}")
            } else {
                file.to_owned()
            };

            ResolvedLink {
                label: NAME.into(),
                kind: LinkKind::from_url(&link),
                url: link,
                referer: format!("{host}/"),
                source: NAME.into(),
            }
        })
        .into_iter()
        .collect();

    let subtitles = TRACK_RE
        .get_or_init(|| {
            Regex::new(
                r#"\{\s*file:\s*"(?<file>[^"]+)"\s*,\s*label:\s*"(?<label>[^"]+)"\s*,\s*kind:\s*"captions""#,
            )
            .unwrap()
        })
        .captures_iter(script)
        .filter_map(|caps| {
            Some(SubtitleTrack {
                url: caps.name("file")?.as_str().into(),
                label: caps.name("label")?.as_str().into(),
                language: None,
            })
        })
        .collect();

    ExtractedMedia { streams, subtitles }
}
