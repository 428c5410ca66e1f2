//! Text rewrite applied before structural parsing.
//!
//! Vendor extension prefixes are stripped from element names and alternate
//! channel spellings are renamed, so later lookups only ever match one
//! canonical local name: `hr`, `cad`, `atemp`.

use once_cell::sync::Lazy;
use regex::Regex;

/// Element prefixes of vendor extension schemas (Garmin, Cluetrust and
/// generated `nsN` prefixes). The gpx_style prefix is kept so that style
/// blocks can still be matched by namespace.
const VENDOR_PREFIXES: &[&str] = &[
    "gpxtpx", "gpxtrkx", "gpxx", "gpxdata", "gpxacc", "gpxpx", "ns1", "ns2", "ns3", "tp1",
];

static VENDOR_PREFIX: Lazy<Regex> = Lazy::new(|| {
    let pattern = format!(r"<(/?)(?:{}):", VENDOR_PREFIXES.join("|"));
    Regex::new(&pattern).expect("vendor prefix pattern is valid")
});

static TAG_RENAMES: Lazy<[(Regex, &'static str); 3]> = Lazy::new(|| {
    let tag = |name: &str| {
        Regex::new(&format!(r"<(/?){name}([\s/>])")).expect("tag rename pattern is valid")
    };
    [
        (tag("cadence"), "<${1}cad${2}"),
        (tag("heartrate"), "<${1}hr${2}"),
        (tag("temp"), "<${1}atemp${2}"),
    ]
});

static INTER_TAG_WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r">\s+<").expect("whitespace pattern is valid"));

/// Canonicalize GPX text for structural parsing.
pub fn canonicalize(input: &str) -> String {
    let mut text = VENDOR_PREFIX.replace_all(input, "<$1").into_owned();
    for (pattern, replacement) in TAG_RENAMES.iter() {
        text = pattern.replace_all(&text, *replacement).into_owned();
    }
    INTER_TAG_WHITESPACE.replace_all(&text, "><").into_owned()
}
