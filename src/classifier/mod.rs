mod rules;
mod types;

pub use types::{Classification, IgnoreReason, MediaCandidate};

use crate::resolver::Prompter;
use crate::scanner::SourceFile;
use once_cell::sync::Lazy;
use regex::Regex;
use rules::{is_anime_special, split_season_token, RuleContext, RULES};
use std::collections::HashMap;
use tracing::{debug, trace};

/// Extensions treated as video
pub const VIDEO_EXTENSIONS: &[&str] = &[
    "mkv", "mp4", "avi", "m4v", "mov", "wmv", "ts", "m2ts", "webm", "flv", "mpg", "mpeg",
];

/// `sample` anywhere as a token; trailers and featurettes only as a trailing or bracketed tag
static SAMPLE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:^|[^a-z0-9])(?:samples?(?:[^a-z0-9]|$)|(?:trailer|featurette)s?[\])]?$)|[\[(](?:trailer|featurette)s?[\])]",
    )
    .unwrap()
});

#[derive(Debug, Clone, Copy)]
pub struct ClassifierConfig {
    /// Treat files no other rule claims as movies
    pub movies_enabled: bool,
    pub name_preference: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            movies_enabled: false,
            name_preference: 0.8,
        }
    }
}

/// Per-run memo of anime season numbers, keyed by show name as it appears in files
#[derive(Debug, Default)]
pub struct SeasonResolver {
    memo: HashMap<String, u32>,
}

impl SeasonResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Season for an anime file, and the show name with any season token removed
    pub fn resolve(&mut self, raw_show: &str, file_stem: &str, prompter: &dyn Prompter) -> (String, u32) {
        let (show, token) = split_season_token(raw_show);

        if let Some(&season) = self.memo.get(raw_show) {
            trace!(show = %raw_show, season, "Season memo hit");
            return (show, season);
        }

        if let Some(season) = token {
            self.memo.insert(raw_show.to_string(), season);
            return (show, season);
        }

        if is_anime_special(file_stem) {
            return (show, 0);
        }

        let season = prompter.season_for(&show).unwrap_or(1);
        self.memo.insert(raw_show.to_string(), season);
        (show, season)
    }
}

/// Ordered rule table over a single file, with the season memo it needs
pub struct Classifier {
    config: ClassifierConfig,
    seasons: SeasonResolver,
}

impl Classifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self {
            config,
            seasons: SeasonResolver::new(),
        }
    }

    /// Decide what a source file is
    ///
    /// `already_handled` reports whether the ledger or ignore set already
    /// holds this path. Samples and non-video files are reported as ignored
    /// before that check so they keep landing in the ignore set.
    pub fn classify(
        &mut self,
        file: &SourceFile,
        already_handled: bool,
        prompter: &dyn Prompter,
    ) -> Classification {
        if SAMPLE_REGEX.is_match(&file.stem) {
            return Classification::Ignore(IgnoreReason::Sample);
        }

        if !file.is_dir && !is_video(file) {
            return Classification::Ignore(IgnoreReason::UnsupportedExtension);
        }

        if already_handled {
            return Classification::AlreadyHandled;
        }

        let mut ctx = RuleContext {
            movies_enabled: self.config.movies_enabled,
            name_preference: self.config.name_preference,
            seasons: &mut self.seasons,
            prompter,
        };

        for rule in RULES {
            if !(rule.matches)(file, &ctx) {
                continue;
            }

            if let Some(candidate) = (rule.extract)(file, &mut ctx) {
                debug!(file = %file.file_name, rule = rule.name, "Classified");
                return Classification::Candidate(candidate);
            }
        }

        debug!(file = %file.file_name, "No rule matched");
        Classification::Unmatched
    }
}

fn is_video(file: &SourceFile) -> bool {
    file.extension
        .as_deref()
        .map(|ext| VIDEO_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}
