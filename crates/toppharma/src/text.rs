//! Text helpers: slugs, search normalization and list parameters.

use std::sync::OnceLock;

use regex::Regex;

/// Compiled patterns used for slug generation.
#[derive(Debug)]
struct SlugPatterns {
    /// Anything that is not a word character, whitespace or hyphen.
    special: Regex,
    /// Runs of whitespace, underscores and hyphens.
    separators: Regex,
    /// URL scheme prefix on a domain.
    scheme: Regex,
    /// Characters not allowed in a domain slug.
    domain_special: Regex,
}

impl SlugPatterns {
    /// # Panics
    ///
    /// Panics if a built-in pattern is invalid.
    fn get() -> &'static Self {
        static PATTERNS: OnceLock<SlugPatterns> = OnceLock::new();
        PATTERNS.get_or_init(|| Self {
            special: Regex::new(r"[^\w\s-]").expect("Invalid regex pattern"),
            separators: Regex::new(r"[\s_-]+").expect("Invalid regex pattern"),
            scheme: Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.-]*://").expect("Invalid regex pattern"),
            domain_special: Regex::new(r"[^a-zA-Z0-9-]").expect("Invalid regex pattern"),
        })
    }
}

/// Turn a display name into a URL slug.
///
/// Lowercases, drops punctuation, collapses whitespace, underscores and
/// hyphens into single hyphens, and trims hyphens from both ends.
///
/// ```
/// assert_eq!(toppharma::text::slugify("  Johnson & Johnson "), "johnson-johnson");
/// ```
#[must_use]
pub fn slugify(name: &str) -> String {
    let patterns = SlugPatterns::get();
    let lowered = name.trim().to_lowercase();
    let cleaned = patterns.special.replace_all(&lowered, "");
    let joined = patterns.separators.replace_all(&cleaned, "-");
    joined.trim_matches('-').to_string()
}

/// Turn a domain into a slug (`https://www.pfizer.com` -> `www-pfizer-com`).
#[must_use]
pub fn domain_slug(domain: &str) -> String {
    let patterns = SlugPatterns::get();
    let bare = patterns.scheme.replace(domain.trim(), "");
    let bare = bare.trim_end_matches('/');
    patterns
        .domain_special
        .replace_all(bare, "-")
        .to_lowercase()
}

/// Lowercase and strip Latin diacritics for accent-insensitive matching.
#[must_use]
pub fn normalize_text(text: &str) -> String {
    text.chars()
        .flat_map(char::to_lowercase)
        .map(fold_diacritic)
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

/// Whether `haystack` contains `needle`, ignoring case and accents.
#[must_use]
pub fn contains_normalized(haystack: &str, needle: &str) -> bool {
    normalize_text(haystack).contains(&normalize_text(needle))
}

/// Split a comma-separated parameter into trimmed, non-empty values.
#[must_use]
pub fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn is_combining_mark(c: char) -> bool {
    ('\u{0300}'..='\u{036f}').contains(&c)
}

fn fold_diacritic(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' => 'a',
        'ç' | 'ć' | 'č' => 'c',
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ě' => 'e',
        'ì' | 'í' | 'î' | 'ï' | 'ī' => 'i',
        'ñ' | 'ń' | 'ň' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' => 'o',
        'ù' | 'ú' | 'û' | 'ü' | 'ū' | 'ů' => 'u',
        'ý' | 'ÿ' => 'y',
        'š' | 'ś' => 's',
        'ž' | 'ź' | 'ż' => 'z',
        'ř' => 'r',
        'ł' => 'l',
        other => other,
    }
}
