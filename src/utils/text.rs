use std::sync::OnceLock;

use regex::Regex;

pub fn extract_file_property(script: &str) -> Option<&str> {
    static FILE_PROPERTY_RE: OnceLock<Regex> = OnceLock::new();
    FILE_PROPERTY_RE
        .get_or_init(|| Regex::new(r#"file:\s?['"](?<file>[^"']+)['"]"#).unwrap())
        .captures(script)
        .and_then(|m| Some(m.name("file")?.as_str()))
}

/// `//host/path` becomes `https://host/path`, anything else is kept.
pub fn to_full_url(url: &str) -> String {
    if url.starts_with("//") {
        format!("https:{url}")
    } else {
        url.into()
    }
}

pub fn sanitize_text(text: &str) -> String {
    static SANITIZE_TEXT_REGEXP: OnceLock<Regex> = OnceLock::new();
    let re = SANITIZE_TEXT_REGEXP.get_or_init(|| Regex::new(r#"[\n\t\s]+"#).unwrap());

    re.replace_all(text, " ").trim().into()
}

pub fn non_blank(text: &str) -> Option<String> {
    let text = sanitize_text(text);
    if text.is_empty() { None } else { Some(text) }
}

/// Drops the `-300x450` thumbnail suffix WordPress appends to resized images.
pub fn strip_dimension_suffix(url: &str) -> String {
    static DIMENSION_RE: OnceLock<Regex> = OnceLock::new();
    let re = DIMENSION_RE
        .get_or_init(|| Regex::new(r"-\d+x\d+(?<ext>(\.[A-Za-z0-9]+)*)$").unwrap());

    let (path, query) = match url.find(['?', '#']) {
        Some(idx) => url.split_at(idx),
        None => (url, ""),
    };

    let mut path = path.to_owned();
    loop {
        let Some(caps) = re.captures(&path) else {
            break;
        };
        let start = caps.get(0).map_or(path.len(), |m| m.start());
        let ext = caps.name("ext").map_or("", |m| m.as_str());

        path = format!("{}{}", &path[..start], ext);
    }

    path + query
}

/// Cuts a heading at the first "Season", "Episode" or "(" marker.
pub fn truncate_title(heading: &str) -> String {
    let cut = ["Season", "Episode", "("]
        .iter()
        .filter_map(|marker| heading.find(marker))
        .min()
        .unwrap_or(heading.len());

    sanitize_text(&heading[..cut])
}

pub fn first_number(text: &str) -> Option<u32> {
    static DIGITS_RE: OnceLock<Regex> = OnceLock::new();
    DIGITS_RE
        .get_or_init(|| Regex::new(r"\d+").unwrap())
        .find(text)
        .and_then(|m| m.as_str().parse().ok())
}

pub fn extract_year(text: &str) -> Option<u32> {
    static YEAR_RE: OnceLock<Regex> = OnceLock::new();
    YEAR_RE
        .get_or_init(|| Regex::new(r"\b(?<year>\d{4})\b").unwrap())
        .captures(text)
        .and_then(|caps| caps.name("year")?.as_str().parse().ok())
}

/// Number directly following an `E`, `Ep` or `Eps` prefix, e.g. `Eps12` or `S1E4`.
pub fn episode_number(text: &str) -> Option<u32> {
    static EPISODE_RE: OnceLock<Regex> = OnceLock::new();
    EPISODE_RE
        .get_or_init(|| Regex::new(r"E(?:ps?)?(?<num>\d+)").unwrap())
        .captures(text)
        .and_then(|caps| caps.name("num")?.as_str().parse().ok())
}

/// Season from `S2`, `S02E01` or `Season 2` markers.
pub fn season_number(text: &str) -> Option<u32> {
    static SEASON_RE: OnceLock<Regex> = OnceLock::new();
    SEASON_RE
        .get_or_init(|| Regex::new(r"(?i)\bS(?:eason)?\s?(?<num>\d+)").unwrap())
        .captures(text)
        .and_then(|caps| caps.name("num")?.as_str().parse().ok())
}

pub fn is_navigation_link(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.contains("view all") || lower.contains("batch")
}

pub fn unescape_json_slashes(text: &str) -> String {
    text.replace("\\/", "/")
}
