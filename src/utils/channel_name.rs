//! Channel name normalization
//!
//! Turns a human-entered or feed-provided channel name into a comparison key.
//! Names in the wild differ in case, spacing, CCTV numbering style, quality
//! markers, category suffixes and punctuation; all of those are folded away so
//! that "CCTV-1 综合", "cctv 1" and "CCTV1高清" converge on `cctv1`.
//!
//! The pipeline is applied until the key stops changing, which makes
//! [`normalize_channel_name`] idempotent even when stripping one suffix exposes
//! another (e.g. `湖南台台`).

use regex::Regex;
use std::sync::OnceLock;

/// Category suffixes stripped from the end of a name, first match wins
const CATEGORY_SUFFIXES: [&str; 9] = [
    "综合", "娱乐", "新闻", "体育", "电影", "戏曲", "少儿", "农业", "军事",
];

/// Quality markers stripped from the end of a name
const QUALITY_MARKERS: [&str; 4] = ["(hd)", "（hd）", "高清", "hd"];

const STRUCTURAL_PUNCTUATION: [char; 14] = [
    '(', ')', '（', '）', '[', ']', '【', '】', '.', '-', '_', '+', '=', '|',
];

fn cctv_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"cctv[-_ ]*(\d+)",
            r"央视(\d+)",
            r"中央(\d+)",
            r"cc[-_ ]*tv(\d+)",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("static CCTV pattern is valid"))
        .collect()
    })
}

/// Canonicalize a raw channel name into its comparison key
pub fn normalize_channel_name(raw: &str) -> String {
    let mut current = normalize_pass(raw);
    // Every further pass that changes the key shortens it, except the single
    // pass that rewrites Chinese CCTV spellings, so this bound is never reached.
    let budget = current.chars().count() * 3 + 4;
    for _ in 0..budget {
        let next = normalize_pass(&current);
        if next == current {
            break;
        }
        current = next;
    }
    current
}

fn normalize_pass(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    let compact: String = lowered.chars().filter(|c| !c.is_whitespace()).collect();

    let mut name = collapse_cctv(&compact);

    name = name.replace("电视台", "卫视");
    if let Some(stripped) = name.strip_suffix('台') {
        name = stripped.to_string();
    }

    if let Some(stripped) = QUALITY_MARKERS
        .iter()
        .find_map(|marker| name.strip_suffix(marker))
    {
        name = stripped.to_string();
    }

    if let Some(stripped) = CATEGORY_SUFFIXES
        .iter()
        .find_map(|suffix| name.strip_suffix(suffix))
    {
        name = stripped.to_string();
    }

    name.chars()
        .filter(|c| !STRUCTURAL_PUNCTUATION.contains(c))
        .collect()
}

/// Rewrite the first matching CCTV spelling to `cctv<digits>`
fn collapse_cctv(name: &str) -> String {
    cctv_patterns()
        .iter()
        .find(|re| re.is_match(name))
        .map(|re| re.replace_all(name, "cctv${1}").into_owned())
        .unwrap_or_else(|| name.to_string())
}
