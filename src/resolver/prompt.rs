use crate::api::{CatalogTitle, ExternalId, SearchKind};

/// Maximum number of candidates offered in a disambiguation menu
pub const MAX_CHOICES: usize = 3;

/// An ambiguous search that needs a human decision
#[derive(Debug, Clone)]
pub struct Disambiguation {
    pub query: String,
    pub kind: SearchKind,
    pub candidates: Vec<CatalogTitle>,
}

/// Answer to a disambiguation menu
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Choice {
    /// Zero-based index into the offered candidates
    Index(usize),
    /// Catalog id typed directly instead of picking an entry
    ExternalId(ExternalId),
    /// Blank or unrecognized input: take the first candidate
    Default,
}

impl Choice {
    /// Interpret a line of user input against a menu of `count` entries
    pub fn parse(input: &str, count: usize) -> Self {
        let input = input.trim();

        if input.is_empty() {
            return Choice::Default;
        }

        if let Ok(n) = input.parse::<usize>() {
            return if (1..=count).contains(&n) {
                Choice::Index(n - 1)
            } else {
                Choice::Default
            };
        }

        ExternalId::parse(input)
            .map(Choice::ExternalId)
            .unwrap_or(Choice::Default)
    }
}

/// Where questions go when the engine can't decide on its own
pub trait Prompter: Send + Sync {
    /// Pick among ambiguous catalog results
    fn choose(&self, question: &Disambiguation) -> Choice;

    /// Season number for an anime show with no season marker
    fn season_for(&self, show: &str) -> Option<u32>;
}

/// Prompter that always takes the default answer
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoPrompter;

impl Prompter for AutoPrompter {
    fn choose(&self, _question: &Disambiguation) -> Choice {
        Choice::Default
    }

    fn season_for(&self, _show: &str) -> Option<u32> {
        None
    }
}
