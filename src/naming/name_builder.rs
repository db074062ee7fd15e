use crate::parser::{find_episode_code, EpisodeCode};
use crate::resolver::EpisodeLookup;
use once_cell::sync::Lazy;
use regex::Regex;

/// Stem size in bytes kept when a name must be shortened
pub const SHORT_STEM_BYTES: usize = 100;

static RAW_CODE_CUT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^.*?S\d{2}E\d{2}").unwrap());

/// How episode numbers are rendered in file names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodeStyle {
    /// `s01e02`
    Standard,
    /// `s01e005`, for absolute-numbered anime
    Absolute,
}

impl EpisodeStyle {
    pub fn label(&self, season: u32, episode: u32) -> String {
        match self {
            EpisodeStyle::Standard => format!("s{:02}e{:02}", season, episode),
            EpisodeStyle::Absolute => format!("s{:02}e{:03}", season, episode),
        }
    }
}

/// Remove characters that cannot appear in a path component
pub fn sanitize_component(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '/' | '\\' | '\0'))
        .collect::<String>()
        .trim()
        .to_string()
}

fn with_year(show: &str, year: Option<u16>) -> String {
    match year {
        Some(year) => format!("{} ({})", show, year),
        None => show.to_string(),
    }
}

/// `{Show} - s01e02-e03`
pub fn multi_episode_stem(show: &str, code: &EpisodeCode) -> String {
    sanitize_component(&format!("{} - {}", show, code.label()))
}

/// Episode stem from the catalog lookup, falling back to the raw file stem
pub fn episode_stem(
    lookup: &EpisodeLookup,
    season: u32,
    episode: u32,
    style: EpisodeStyle,
    raw_stem: &str,
) -> String {
    let label = style.label(season, episode);

    let stem = match lookup {
        EpisodeLookup::Titled { show, year, title } => {
            format!("{} - {} - {}", with_year(show, *year), label, title)
        }
        EpisodeLookup::Untitled { show, year } => {
            format!("{} - {}", with_year(show, *year), label)
        }
        EpisodeLookup::Unavailable => raw_fallback_stem(raw_stem),
    };

    sanitize_component(&stem)
}

/// Raw stem with dots as spaces, cut right after its `SxxEyy` code
pub fn raw_fallback_stem(raw_stem: &str) -> String {
    let spaced = raw_stem.replace('.', " ");
    match RAW_CODE_CUT_REGEX.find(&spaced) {
        Some(m) => m.as_str().trim().to_string(),
        None => spaced.trim().to_string(),
    }
}

/// Append the resolution unless the stem already carries it
pub fn with_resolution(stem: &str, resolution: Option<&str>) -> String {
    match resolution {
        Some(res) if !res.is_empty() && !stem.to_lowercase().contains(&res.to_lowercase()) => {
            format!("{} {}", stem, res)
        }
        _ => stem.to_string(),
    }
}

/// Join a stem and an optional extension
pub fn file_name(stem: &str, extension: Option<&str>) -> String {
    match extension {
        Some(ext) if !ext.is_empty() => format!("{}.{}", stem, ext),
        _ => stem.to_string(),
    }
}

fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(pos) if pos > 0 => (&name[..pos], Some(&name[pos + 1..])),
        _ => (name, None),
    }
}

/// Shorter variant of a file name for filesystems that rejected it
///
/// Keeps the show and episode code when present, otherwise truncates the stem.
pub fn shorten_file_name(name: &str) -> String {
    let (stem, extension) = split_extension(name);

    let short = match find_episode_code(stem) {
        Some(found) if found.prefix.len() + found.raw.len() <= SHORT_STEM_BYTES => {
            &stem[..found.prefix.len() + found.raw.len()]
        }
        _ => truncate_bytes(stem, SHORT_STEM_BYTES),
    };

    file_name(short.trim(), extension)
}

/// Longest prefix of `text` within `max` bytes that ends on a char boundary
fn truncate_bytes(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_component() {
        assert_eq!(sanitize_component(" Face/Off "), "FaceOff");
        assert_eq!(sanitize_component("A\\B\0C"), "ABC");
        assert_eq!(sanitize_component("Title: Sub?"), "Title: Sub?");
    }

    #[test]
    fn test_titled_episode() {
        let lookup = EpisodeLookup::Titled {
            show: "Show Name".to_string(),
            year: Some(2020),
            title: "Pilot".to_string(),
        };

        assert_eq!(
            episode_stem(&lookup, 1, 2, EpisodeStyle::Standard, "raw"),
            "Show Name (2020) - s01e02 - Pilot"
        );
    }

    #[test]
    fn test_titled_episode_with_slash_in_title() {
        let lookup = EpisodeLookup::Titled {
            show: "Show".to_string(),
            year: None,
            title: "Either/Or".to_string(),
        };

        assert_eq!(
            episode_stem(&lookup, 1, 1, EpisodeStyle::Standard, "raw"),
            "Show - s01e01 - EitherOr"
        );
    }

    #[test]
    fn test_untitled_anime_episode() {
        let lookup = EpisodeLookup::Untitled {
            show: "Anime Title".to_string(),
            year: Some(2015),
        };

        assert_eq!(
            episode_stem(&lookup, 1, 5, EpisodeStyle::Absolute, "raw"),
            "Anime Title (2015) - s01e005"
        );
    }

    #[test]
    fn test_unavailable_uses_raw_stem() {
        assert_eq!(
            episode_stem(
                &EpisodeLookup::Unavailable,
                1,
                2,
                EpisodeStyle::Standard,
                "Show.Name.S01E02.1080p.WEB"
            ),
            "Show Name S01E02"
        );
        assert_eq!(raw_fallback_stem("Anime - 05 [720p]"), "Anime - 05 [720p]");
    }

    #[test]
    fn test_multi_episode_stem() {
        assert_eq!(
            multi_episode_stem("Show Name", &EpisodeCode::range(1, 2, 3)),
            "Show Name - s01e02-e03"
        );
    }

    #[test]
    fn test_with_resolution() {
        assert_eq!(
            with_resolution("Show - s01e01", Some("1080p")),
            "Show - s01e01 1080p"
        );
        assert_eq!(
            with_resolution("Show S01E01 1080P", Some("1080p")),
            "Show S01E01 1080P"
        );
        assert_eq!(with_resolution("Show", None), "Show");
    }

    #[test]
    fn test_file_name() {
        assert_eq!(file_name("Movie (1999)", Some("mkv")), "Movie (1999).mkv");
        assert_eq!(file_name("Disc Folder", None), "Disc Folder");
    }

    #[test]
    fn test_shorten_keeps_code_prefix() {
        let long = format!("Show Name - s01e02 - {} 1080p.mkv", "x".repeat(300));
        assert_eq!(shorten_file_name(&long), "Show Name - s01e02.mkv");
    }

    #[test]
    fn test_shorten_truncates_stem() {
        let long = format!("{}.mp4", "é".repeat(300));
        let short = shorten_file_name(&long);

        assert!(short.ends_with(".mp4"));
        assert_eq!(short.len(), SHORT_STEM_BYTES + 4);
    }

    #[test]
    fn test_shorten_counts_bytes_not_chars() {
        let long = format!("{}.mkv", "進撃の巨人".repeat(40));
        let short = shorten_file_name(&long);

        assert!(short.len() <= SHORT_STEM_BYTES + 4);
        assert!(short.starts_with("進撃の巨人"));
        assert!(short.ends_with(".mkv"));
    }

    #[test]
    fn test_shorten_long_prefix_before_code() {
        let long = format!("{} - s01e02 - Title.mkv", "アニメ".repeat(60));
        let short = shorten_file_name(&long);

        assert!(short.len() <= SHORT_STEM_BYTES + 4);
    }
}
