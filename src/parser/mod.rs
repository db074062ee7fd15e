mod types;

pub use types::*;

use chrono::Datelike;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

const MIN_YEAR: u16 = 1900;

// Episode codes, case-insensitive:
//   S01E02, S01 E02, S01E02-E03, S01E02E03, S01E02+E03, S101E02 and 1x02
static EPISODE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?P<prefix>.*?)(?P<code>S(?P<season>\d{2,3}) ?E(?P<episode>\d{2,3})(?:(?P<sep> ?[-+] ?)?E(?P<last>\d{2,3}))?|\b(?P<alt_season>\d{1,2})x(?P<alt_episode>\d{2})\b)",
    )
    .unwrap()
});

static LEADING_CODE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^S\d{2,3} ?E\d{2}").unwrap());

// Year wrapped in parentheses at the very end: "Title (2020)"
static TRAILING_PAREN_YEAR_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\((\d{4})\)\s*$").unwrap());

// Bare year at the very end: "Title 2020"
static TRAILING_BARE_YEAR_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|\D)(\d{4})\s*$").unwrap());

static STANDALONE_YEAR_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{4})\b").unwrap());

static RESOLUTION_P_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:^|\D)(\d{3,4}p)").unwrap());

static RESOLUTION_DIM_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:^|\D)(\d{3,4}x\d{3,4})(?:\D|$)").unwrap());

fn max_plausible_year() -> u16 {
    let current = chrono::Utc::now().year();
    u16::try_from(current + 1).unwrap_or(u16::MAX)
}

fn plausible_year(text: &str) -> Option<u16> {
    let year: u16 = text.parse().ok()?;
    (MIN_YEAR..=max_plausible_year())
        .contains(&year)
        .then_some(year)
}

/// Extract a trailing `(YYYY)` or bare `YYYY` year token
pub fn extract_year(text: &str) -> Option<u16> {
    let text = text.trim();

    if let Some(caps) = TRAILING_PAREN_YEAR_REGEX.captures(text) {
        return plausible_year(&caps[1]);
    }

    TRAILING_BARE_YEAR_REGEX
        .captures(text)
        .and_then(|caps| plausible_year(&caps[1]))
}

/// Find the first standalone plausible year anywhere in the text
pub fn find_year(text: &str) -> Option<u16> {
    STANDALONE_YEAR_REGEX
        .captures_iter(text)
        .find_map(|caps| plausible_year(&caps[1]))
}

/// Remove a trailing year token recognized by [`extract_year`]
pub fn strip_year(text: &str) -> String {
    let trimmed = text.trim();

    if extract_year(trimmed).is_none() {
        return trimmed.to_string();
    }

    if let Some(m) = TRAILING_PAREN_YEAR_REGEX.find(trimmed) {
        return trimmed[..m.start()].trim().to_string();
    }

    match TRAILING_BARE_YEAR_REGEX
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
    {
        Some(m) => trimmed[..m.start()].trim().to_string(),
        None => trimmed.to_string(),
    }
}

/// Extract the first resolution token (`1080p` style first, then `1920x1080`)
pub fn extract_resolution(text: &str) -> Option<String> {
    RESOLUTION_P_REGEX
        .captures(text)
        .or_else(|| RESOLUTION_DIM_REGEX.captures(text))
        .map(|caps| caps[1].to_string())
}

/// Locate an episode code and the prefix before it
pub fn find_episode_code(text: &str) -> Option<EpisodeMatch> {
    let caps = EPISODE_REGEX.captures(text)?;

    let code = code_from_captures(&caps)?;
    let prefix = caps.name("prefix").map(|m| m.as_str()).unwrap_or_default();
    let raw = caps.name("code")?.as_str();

    Some(EpisodeMatch {
        prefix: prefix.to_string(),
        raw: raw.to_string(),
        code,
    })
}

fn code_from_captures(caps: &Captures<'_>) -> Option<EpisodeCode> {
    if let Some(season) = caps.name("season") {
        // Three-digit seasons ("S010E02") read as an unpadded number
        let season: u32 = season.as_str().parse().ok()?;
        let episode: u32 = caps.name("episode")?.as_str().parse().ok()?;

        return match caps.name("last") {
            Some(last) => {
                let last: u32 = last.as_str().parse().ok()?;
                Some(EpisodeCode::range(season, episode, last))
            }
            None => Some(EpisodeCode::single(season, episode)),
        };
    }

    let season: u32 = caps.name("alt_season")?.as_str().parse().ok()?;
    let episode: u32 = caps.name("alt_episode")?.as_str().parse().ok()?;
    Some(EpisodeCode::single(season, episode))
}

/// Render an episode code in canonical `SxxEyy` / `SxxEyy-Eyy` form
pub fn normalize_episode_code(raw: &str) -> Option<String> {
    let found = find_episode_code(raw)?;

    if found.raw.contains('+') || found.raw.contains('-') {
        let compact: String = found.raw.chars().filter(|c| !c.is_whitespace()).collect();
        return Some(compact.replace('+', "-").to_uppercase());
    }

    Some(found.code.to_string())
}

/// True when the name begins with an `SxxEyy` code (show name lives in the folder)
pub fn starts_with_episode_code(name: &str) -> bool {
    LEADING_CODE_REGEX.is_match(name.trim_start())
}

fn comparable(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Similarity ratio in `0.0..=1.0`, ignoring case and punctuation
pub fn similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(&comparable(a), &comparable(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    // ============ Year Tests ============

    #[test]
    fn test_extract_year_parenthesized() {
        assert_eq!(extract_year("Show Name (2020)"), Some(2020));
    }

    #[test]
    fn test_extract_year_bare() {
        assert_eq!(extract_year("Show Name 1999"), Some(1999));
    }

    #[test]
    fn test_extract_year_not_trailing() {
        assert_eq!(extract_year("2020 Show Name"), None);
    }

    #[test]
    fn test_extract_year_out_of_range() {
        assert_eq!(extract_year("Blade Runner 2049"), None);
        assert_eq!(extract_year("Room 1408"), None);
    }

    #[test]
    fn test_find_year_in_folder() {
        assert_eq!(find_year("Show Name (2020) 1080p WEB"), Some(2020));
        assert_eq!(find_year("Show.Name.2019.S01.1080p"), Some(2019));
        assert_eq!(find_year("No year 1080p"), None);
    }

    #[test]
    fn test_strip_year() {
        assert_eq!(strip_year("Show Name (2020)"), "Show Name");
        assert_eq!(strip_year("Show Name 2020"), "Show Name");
        assert_eq!(strip_year("Show Name"), "Show Name");
    }

    // ============ Resolution Tests ============

    #[test]
    fn test_extract_resolution_p() {
        assert_eq!(
            extract_resolution("Show.Name.S01E02.1080p.mkv"),
            Some("1080p".to_string())
        );
        assert_eq!(
            extract_resolution("Anime - 05 [720p]"),
            Some("720p".to_string())
        );
    }

    #[test]
    fn test_extract_resolution_dimensions() {
        assert_eq!(
            extract_resolution("Movie 1920x1080 x264"),
            Some("1920x1080".to_string())
        );
    }

    #[test]
    fn test_extract_resolution_prefers_p_form() {
        assert_eq!(
            extract_resolution("1280x720 720p"),
            Some("720p".to_string())
        );
    }

    #[test]
    fn test_extract_resolution_missing() {
        assert_eq!(extract_resolution("Show S01E02"), None);
    }

    // ============ Episode Code Tests ============

    #[test]
    fn test_find_simple_code() {
        let found = find_episode_code("Show.Name.S01E02.1080p.mkv").unwrap();
        assert_eq!(found.prefix, "Show.Name.");
        assert_eq!(found.raw, "S01E02");
        assert_eq!(found.code, EpisodeCode::single(1, 2));
    }

    #[test]
    fn test_find_code_with_space() {
        let found = find_episode_code("Show s02 e10").unwrap();
        assert_eq!(found.code, EpisodeCode::single(2, 10));
    }

    #[test]
    fn test_find_explicit_range() {
        let found = find_episode_code("Show S01E02-E03.mkv").unwrap();
        assert_eq!(found.code, EpisodeCode::range(1, 2, 3));
    }

    #[test]
    fn test_find_adjacent_multi_episode() {
        let found = find_episode_code("Show S01E02E03.mkv").unwrap();
        assert_eq!(found.prefix, "Show ");
        assert_eq!(found.code, EpisodeCode::range(1, 2, 3));
    }

    #[test]
    fn test_find_plus_multi_episode() {
        let found = find_episode_code("Show S01E02+E03.mkv").unwrap();
        assert_eq!(found.code, EpisodeCode::range(1, 2, 3));
    }

    #[test]
    fn test_find_alternate_form() {
        let found = find_episode_code("Show Name 1x02 Title.avi").unwrap();
        assert_eq!(found.prefix, "Show Name ");
        assert_eq!(found.code, EpisodeCode::single(1, 2));
    }

    #[test]
    fn test_find_oversized_season() {
        let found = find_episode_code("Show S010E05.mkv").unwrap();
        assert_eq!(found.code, EpisodeCode::single(10, 5));
    }

    #[test]
    fn test_dimensions_not_mistaken_for_code() {
        assert!(find_episode_code("Movie 1920x1080.mkv").is_none());
    }

    #[test]
    fn test_normalize_all_shapes() {
        let cases = [
            ("S01E02", "S01E02"),
            ("s01e02", "S01E02"),
            ("S01 E02", "S01E02"),
            ("S01E02-E03", "S01E02-E03"),
            ("s01e02+e03", "S01E02-E03"),
            ("S01E02E03", "S01E02-E03"),
            ("S01 E02 - E03", "S01E02-E03"),
            ("1x02", "S01E02"),
            ("12x05", "S12E05"),
            ("S010E02", "S10E02"),
        ];

        for (input, expected) in cases {
            assert_eq!(
                normalize_episode_code(input).as_deref(),
                Some(expected),
                "input: {}",
                input
            );
        }
    }

    #[test]
    fn test_similarity_ignores_case_and_punctuation() {
        assert_eq!(similarity("Marvel's Agents", "marvels agents"), 1.0);
        assert!(similarity("The Office", "The Office (US)") > 0.6);
        assert!(similarity("Breaking Bad", "Metastasis") < 0.3);
    }

    #[test]
    fn test_starts_with_episode_code() {
        assert!(starts_with_episode_code("S01E02.mkv"));
        assert!(starts_with_episode_code("s01 e02 - Pilot.mkv"));
        assert!(!starts_with_episode_code("Show S01E02.mkv"));
    }
}
