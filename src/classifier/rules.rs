use super::types::MediaCandidate;
use super::SeasonResolver;
use crate::parser::{
    extract_resolution, extract_year, find_episode_code, find_year, similarity,
    starts_with_episode_code, strip_year,
};
use crate::resolver::Prompter;
use crate::scanner::SourceFile;
use once_cell::sync::Lazy;
use regex::Regex;

// "[Group] " release tag at the start of a name
static LEADING_TAG_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[[^\]]*\]\s*").unwrap());

// "1. " list marker at the start of a folder name
static LIST_MARKER_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d\.\s").unwrap());

// Season suffix on a folder: "Show S01 1080p", "Show Season 2 Complete"
static FOLDER_SEASON_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*\b(?:S\d{2}|Season \d+).*$").unwrap());

static RESOLUTION_TOKEN_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b\d{3,4}p\b").unwrap());

// Folders that only name a season and carry no show name
static SEASON_FOLDER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:season\s*\d+|s\d{1,2}|specials)$").unwrap());

// "Show Title - 05", "Show Title - 105v2 [1080p]"
static ANIME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<show>.*) - (?P<episode>\d{2,3})(?:v\d)?\b").unwrap()
});

// Trailing "S2" on an anime show name
static ANIME_SEASON_TOKEN_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:^|\s)S(\d{1,2})$").unwrap());

static ANIME_SPECIAL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:OVA|NCED|NCOP)\d*\b").unwrap());

static FOUR_DIGITS_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{4}\b").unwrap());

// Title, year, then a resolution further on
static YEAR_BEFORE_RESOLUTION_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(.+?)\b(\d{4})\D+(\d{3,4}p)").unwrap());

static YEAR_TOKEN_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\(\[]?\b(\d{4})\b[\)\]]?").unwrap());

/// State the rules may read or update while extracting
pub(crate) struct RuleContext<'a> {
    pub movies_enabled: bool,
    pub name_preference: f64,
    pub seasons: &'a mut SeasonResolver,
    pub prompter: &'a dyn Prompter,
}

/// One entry of the ordered classification table
pub(crate) struct Rule {
    pub name: &'static str,
    pub matches: fn(&SourceFile, &RuleContext<'_>) -> bool,
    pub extract: fn(&SourceFile, &mut RuleContext<'_>) -> Option<MediaCandidate>,
}

/// Tried in order; the first rule that matches and extracts wins
pub(crate) static RULES: &[Rule] = &[
    Rule {
        name: "episode",
        matches: matches_episode,
        extract: extract_episode,
    },
    Rule {
        name: "anime",
        matches: matches_anime,
        extract: extract_anime,
    },
    Rule {
        name: "movie",
        matches: matches_movie,
        extract: extract_movie,
    },
];

fn spaced(text: &str) -> String {
    text.replace(['.', '_', '-'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Drop trailing separators and a dangling open paren
fn trim_trailing(text: &str) -> String {
    let mut out = text.trim_end();
    loop {
        let next = out
            .trim_end_matches(|c: char| c.is_whitespace() || c == '_' || c == '-')
            .trim_end_matches('(');
        if next == out {
            break;
        }
        out = next;
    }
    out.trim().to_string()
}

/// Folder that names the show: the parent, or the grandparent for "Season N" folders
fn show_folder(file: &SourceFile) -> Option<&str> {
    if file.at_root {
        return None;
    }

    if SEASON_FOLDER_REGEX.is_match(file.parent_name.trim()) {
        return file.grandparent_name.as_deref();
    }

    Some(&file.parent_name)
}

/// Folder name with season suffixes and resolution tokens removed
pub(crate) fn clean_folder_name(folder: &str) -> String {
    let without_season = FOLDER_SEASON_REGEX.replace(folder, "");
    let without_resolution = RESOLUTION_TOKEN_REGEX.replace_all(&without_season, "");
    spaced(&without_resolution)
}

fn matches_episode(file: &SourceFile, _ctx: &RuleContext<'_>) -> bool {
    find_episode_code(&file.file_name).is_some()
}

fn extract_episode(file: &SourceFile, ctx: &mut RuleContext<'_>) -> Option<MediaCandidate> {
    let found = find_episode_code(&file.stem)?;
    if found.code.episode == 0 {
        return None;
    }

    let folder = show_folder(file);
    let folder_clean = folder.map(clean_folder_name).unwrap_or_default();

    let mut show = if starts_with_episode_code(&file.stem) {
        folder_clean.clone()
    } else {
        LEADING_TAG_REGEX
            .replace(&found.prefix, "")
            .replace(['.', '_'], " ")
            .trim()
            .to_string()
    };

    if !folder_clean.is_empty() && similarity(&folder_clean, &show) >= ctx.name_preference {
        show = folder_clean;
    }

    let mut show = trim_trailing(&show);
    if show.is_empty() {
        return None;
    }

    let year = if show.len() <= 4 && show.chars().all(|c| c.is_ascii_digit()) {
        None
    } else {
        folder
            .and_then(find_year)
            .or_else(|| extract_year(&show))
    };

    if year.is_some() {
        let stripped = strip_year(&show);
        if !stripped.is_empty() {
            show = stripped;
        }
    }

    let resolution = extract_resolution(&file.stem)
        .or_else(|| extract_resolution(&file.parent_name));

    Some(MediaCandidate::Episode {
        raw_show_name: show,
        year,
        season: found.code.season,
        episode: found.code.episode,
        episode_range_end: found.code.range_end,
        resolution,
    })
}

fn anime_name(file: &SourceFile) -> String {
    LEADING_TAG_REGEX.replace(&file.stem, "").to_string()
}

fn matches_anime(file: &SourceFile, _ctx: &RuleContext<'_>) -> bool {
    ANIME_REGEX.is_match(&anime_name(file))
}

fn extract_anime(file: &SourceFile, ctx: &mut RuleContext<'_>) -> Option<MediaCandidate> {
    let name = anime_name(file);
    let caps = ANIME_REGEX.captures(&name)?;

    let raw_show = caps["show"].trim().to_string();
    let episode: u32 = caps["episode"].parse().ok()?;
    if episode == 0 {
        return None;
    }

    let (mut show, season) = ctx.seasons.resolve(&raw_show, &file.stem, ctx.prompter);

    if show.is_empty() {
        show = show_folder(file).map(clean_folder_name).unwrap_or_default();
    }
    if show.is_empty() {
        return None;
    }

    let resolution = extract_resolution(&file.stem)
        .or_else(|| extract_resolution(&file.parent_name));

    Some(MediaCandidate::AnimeEpisode {
        raw_show_name: show,
        season,
        absolute_episode: episode,
        resolution,
    })
}

/// Split a trailing `S<N>` off an anime show name
pub(crate) fn split_season_token(show: &str) -> (String, Option<u32>) {
    match ANIME_SEASON_TOKEN_REGEX.captures(show) {
        Some(caps) => {
            let season = caps[1].parse().ok();
            let start = caps.get(0).map(|m| m.start()).unwrap_or(show.len());
            (show[..start].trim().to_string(), season)
        }
        None => (show.trim().to_string(), None),
    }
}

pub(crate) fn is_anime_special(name: &str) -> bool {
    ANIME_SPECIAL_REGEX.is_match(name)
}

fn matches_movie(_file: &SourceFile, ctx: &RuleContext<'_>) -> bool {
    ctx.movies_enabled
}

fn extract_movie(file: &SourceFile, _ctx: &mut RuleContext<'_>) -> Option<MediaCandidate> {
    let source = if file.is_dir || file.at_root {
        &file.stem
    } else {
        &file.parent_name
    };

    let name = LEADING_TAG_REGEX.replace(source, "");
    let name = LIST_MARKER_REGEX.replace(&name, "");
    let name = name.replace(['.', '_'], " ");

    let (title, year) = split_movie_name(&name);
    if title.is_empty() {
        return None;
    }

    let resolution = extract_resolution(&file.stem)
        .or_else(|| extract_resolution(&file.parent_name));

    Some(MediaCandidate::Movie {
        raw_title: title,
        year,
        resolution,
    })
}

fn clean_title(text: &str) -> String {
    text.trim()
        .trim_end_matches(|c: char| c == '(' || c == '[' || c == '-' || c.is_whitespace())
        .trim()
        .to_string()
}

/// Separate a movie title from its release year
pub(crate) fn split_movie_name(name: &str) -> (String, Option<u16>) {
    // With several four-digit numbers ("Blade Runner 2049 (2017)"), the year is
    // the one right before the resolution
    if FOUR_DIGITS_REGEX.find_iter(name).count() >= 2 {
        if let Some(caps) = YEAR_BEFORE_RESOLUTION_REGEX.captures(name) {
            let title = clean_title(&caps[1]);
            if let (Some(year), false) = (find_year(&caps[2]), title.is_empty()) {
                return (title, Some(year));
            }
        }
    }

    for caps in YEAR_TOKEN_REGEX.captures_iter(name) {
        let (whole, digits) = match (caps.get(0), caps.get(1)) {
            (Some(w), Some(d)) => (w, d),
            _ => continue,
        };

        if let Some(year) = find_year(digits.as_str()) {
            let title = clean_title(&name[..whole.start()]);
            if !title.is_empty() {
                return (title, Some(year));
            }
        }
    }

    let without_junk = match RESOLUTION_TOKEN_REGEX.find(name) {
        Some(m) if m.start() > 0 => &name[..m.start()],
        _ => name,
    };
    (clean_title(without_junk), None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_folder_name() {
        assert_eq!(clean_folder_name("Show.Name.S01.1080p.WEB"), "Show Name");
        assert_eq!(clean_folder_name("Show Name Season 2 Complete"), "Show Name");
        assert_eq!(clean_folder_name("Show-Name 720p"), "Show Name");
        assert_eq!(clean_folder_name("Show Name (2020)"), "Show Name (2020)");
    }

    #[test]
    fn test_trim_trailing() {
        assert_eq!(trim_trailing("Show Name - "), "Show Name");
        assert_eq!(trim_trailing("Show Name ("), "Show Name");
        assert_eq!(trim_trailing("Show_Name__"), "Show_Name");
    }

    #[test]
    fn test_split_season_token() {
        assert_eq!(split_season_token("Show S2"), ("Show".to_string(), Some(2)));
        assert_eq!(
            split_season_token("Show Title"),
            ("Show Title".to_string(), None)
        );
        assert_eq!(split_season_token("S3"), (String::new(), Some(3)));
    }

    #[test]
    fn test_anime_specials() {
        assert!(is_anime_special("Show - 01 OVA"));
        assert!(is_anime_special("Show NCED2 - 01"));
        assert!(!is_anime_special("Nova Show - 01"));
    }

    #[test]
    fn test_split_movie_name_simple() {
        assert_eq!(
            split_movie_name("The Matrix (1999)"),
            ("The Matrix".to_string(), Some(1999))
        );
        assert_eq!(
            split_movie_name("The Matrix 1999 1080p BluRay"),
            ("The Matrix".to_string(), Some(1999))
        );
    }

    #[test]
    fn test_split_movie_name_number_in_title() {
        assert_eq!(
            split_movie_name("Blade Runner 2049 (2017) 1080p"),
            ("Blade Runner 2049".to_string(), Some(2017))
        );
        assert_eq!(
            split_movie_name("Blade Runner 2049 (2017)"),
            ("Blade Runner 2049".to_string(), Some(2017))
        );
        assert_eq!(
            split_movie_name("2012 (2009)"),
            ("2012".to_string(), Some(2009))
        );
    }

    #[test]
    fn test_split_movie_name_without_year() {
        assert_eq!(
            split_movie_name("Some Film 720p x264"),
            ("Some Film".to_string(), None)
        );
        assert_eq!(split_movie_name("Some Film"), ("Some Film".to_string(), None));
    }
}
