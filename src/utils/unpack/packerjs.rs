use std::{fmt, sync::OnceLock};

use regex::{Captures, Regex, RegexBuilder};

const ALPHABET_62: &str = "0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const ALPHABET_95: &str = r##" !"#$%&'()*+,-./0123456789:;<=>?@ABCDEFGHIJKLMNOPQRSTUVWXYZ[\]^_`abcdefghijklmnopqrstuvwxyz{|}~"##;

#[derive(Debug)]
pub struct UnpackError {
    message: &'static str,
}

impl fmt::Display for UnpackError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "unpack error: {}", self.message)
    }
}

impl std::error::Error for UnpackError {}

struct PackedArgs<'a> {
    payload: &'a str,
    symtab: Vec<&'a str>,
    radix: u32,
    count: usize,
}

pub fn detect(source: &str) -> bool {
    source
        .replace(' ', "")
        .starts_with("eval(function(p,a,c,k,e,")
}

/// Finds the first `eval(function(p,a,c,k,e,...` expression inside `source`.
pub fn find_packed(source: &str) -> Option<&str> {
    static PACKED_RE: OnceLock<Regex> = OnceLock::new();
    PACKED_RE
        .get_or_init(|| {
            RegexBuilder::new(r"eval\(function\(p,a,c,k,e,.*?\.split\('\|'\).*?\)\)")
                .dot_matches_new_line(true)
                .build()
                .unwrap()
        })
        .find(source)
        .map(|m| m.as_str())
}

/// Unpacks P.A.C.K.E.R. packed js code.
pub fn unpack(source: &str) -> Result<String, UnpackError> {
    static WORD_RE: OnceLock<Regex> = OnceLock::new();

    let args = filter_args(source)?;
    if args.count != args.symtab.len() {
        return Err(UnpackError {
            message: "malformed symtab",
        });
    }

    let payload = args.payload.replace("\\\\", "\\").replace("\\'", "'");
    let unpacked = WORD_RE
        .get_or_init(|| Regex::new(r"\b\w+\b").unwrap())
        .replace_all(&payload, |cap: &Captures| {
            let word = &cap[0];
            unbase(args.radix, word)
                .and_then(|idx| args.symtab.get(idx))
                .filter(|sym| !sym.is_empty())
                .map_or(word, |sym| *sym)
                .to_owned()
        });

    Ok(unpacked.into_owned())
}

fn unbase(radix: u32, word: &str) -> Option<usize> {
    let value = match radix {
        2..=36 => u32::from_str_radix(word, radix).ok()?,
        37..=62 => dict_convert(radix, word, ALPHABET_62)?,
        _ => dict_convert(radix, word, ALPHABET_95)?,
    };
    usize::try_from(value).ok()
}

fn dict_convert(radix: u32, word: &str, alphabet: &str) -> Option<u32> {
    word.chars().rev().enumerate().try_fold(0u32, |acc, (pos, ch)| {
        let digit = alphabet.find(ch)? as u32;
        let weight = radix.checked_pow(pos as u32)?;
        acc.checked_add(weight.checked_mul(digit)?)
    })
}

fn filter_args(source: &str) -> Result<PackedArgs<'_>, UnpackError> {
    static JUICERS: OnceLock<[Regex; 2]> = OnceLock::new();
    let juicers = JUICERS.get_or_init(|| {
        let build = |pattern: &str| {
            RegexBuilder::new(pattern)
                .dot_matches_new_line(true)
                .build()
                .unwrap()
        };
        [
            build(r"}\('(.*)', *(\d+|\[\]), *(\d+), *'(.*)'\.split\('\|'\), *(\d+), *(.*)\)\)"),
            build(r"}\('(.*)', *(\d+|\[\]), *(\d+), *'(.*)'\.split\('\|'\)"),
        ]
    });

    juicers
        .iter()
        .find_map(|juicer| {
            let caps = juicer.captures(source)?;
            let radix = match caps.get(2)?.as_str() {
                "[]" => 62,
                radix => radix.parse().ok()?,
            };

            Some(PackedArgs {
                payload: caps.get(1)?.as_str(),
                symtab: caps.get(4)?.as_str().split('|').collect(),
                radix,
                count: caps.get(3)?.as_str().parse().ok()?,
            })
        })
        .ok_or(UnpackError {
            message: "unexpected p.a.c.k.e.r. code structure",
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    static PACKED: &str = "eval(function(p,a,c,k,e,r){e=String;if(!''\
    .replace(/^/,String)){while(c--)r[c]=k[c]||c;k=[function(e){return r[e]}];e=\
    function(){return'\\w+'};c=1};while(c--)if(k[c])p=p.replace(new RegExp('\\b'+\
    e(c)+'\\b','g'),k[c]);return p}('1 0=2;3(0)',4,4,'x|var|5|alert'.split('|'),0,{}))";

    static PACKED_PLAYER: &str = r#"eval(function(p,a,c,k,e,d){while(c--)if(k[c])p=p.replace(new RegExp('\\b'+c.toString(a)+'\\b','g'),k[c]);return p}('0("1").2({3:[{4:"5://6.7/8.9"}]})',10,10,'jwplayer|vplayer|setup|sources|file|https|cdn|test|master|m3u8'.split('|')))"#;

    #[test]
    fn should_detect_packed_code() {
        assert!(detect(PACKED));
        assert!(!detect("var a = 1;"));
    }

    #[test]
    fn should_extract_args() {
        let args = filter_args(PACKED).unwrap();
        assert_eq!(args.payload, "1 0=2;3(0)");
        assert_eq!(args.symtab, ["x", "var", "5", "alert"]);
        assert_eq!(args.radix, 4);
        assert_eq!(args.count, 4);
    }

    #[test]
    fn should_unpack_code() {
        assert_eq!(unpack(PACKED).unwrap(), "var x=5;alert(x)");
        assert_eq!(
            unpack(PACKED_PLAYER).unwrap(),
            r#"jwplayer("vplayer").setup({sources:[{file:"https://cdn.test/master.m3u8"}]})"#
        );
    }

    #[test]
    fn should_find_packed_code_in_page() {
        let page = format!("<script>var x = 1;{PACKED_PLAYER}</script>");
        assert_eq!(find_packed(&page), Some(PACKED_PLAYER));
    }

    #[test]
    fn should_convert_high_radix_words() {
        assert_eq!(unbase(62, "Z"), Some(61));
        assert_eq!(unbase(62, "10"), Some(62));
        assert_eq!(unbase(10, "x"), None);
    }
}
