mod link;
mod types;

pub use link::{create_link, place, LinkError, Placement};
pub use types::{
    FileError, FileOutcome, SyncError, SyncOptions, SyncReport, DEFAULT_MOVIE_BATCH_SIZE,
};

use crate::api::{Catalog, CatalogTitle};
use crate::classifier::{Classification, Classifier, MediaCandidate};
use crate::console::Console;
use crate::ledger::{IgnoreSet, Ledger, LedgerEntry, StateConfig};
use crate::naming::{
    episode_dir, episode_stem, file_name, movie_dir, multi_episode_stem, sanitize_component,
    shorten_file_name, with_resolution, EpisodeStyle,
};
use crate::resolver::{CatalogResolver, Prompter, ResolveError, ResolvedIdentity, TitleQuery};
use crate::scanner::{scan_sources, SourceFile};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::mem;
use std::path::Path;
use std::thread;
use tracing::{debug, info};

type MovieBatch = Vec<(SourceFile, MediaCandidate)>;

/// One pass over the source tree, linking everything it can identify
///
/// Holds the persisted ledger and ignore set for the duration of the run.
/// Build a fresh engine for every pass so state is re-read from disk.
pub struct SyncEngine<'a, C: Catalog> {
    options: SyncOptions,
    resolver: CatalogResolver<C>,
    classifier: Classifier,
    ledger: Ledger,
    ignored: IgnoreSet,
    console: &'a Console,
    prompter: &'a dyn Prompter,
}

impl<'a, C: Catalog> SyncEngine<'a, C> {
    pub fn new(
        options: SyncOptions,
        catalog: C,
        state: &StateConfig,
        console: &'a Console,
        prompter: &'a dyn Prompter,
    ) -> Self {
        Self {
            resolver: CatalogResolver::new(catalog, options.resolver.clone()),
            classifier: Classifier::new(options.classifier),
            ledger: Ledger::load(&state.links_path),
            ignored: IgnoreSet::load(&state.ignored_path),
            options,
            console,
            prompter,
        }
    }

    /// Walk the source tree once
    pub fn run(&mut self) -> Result<SyncReport, SyncError> {
        let destination = self.options.destination.clone();
        fs::create_dir_all(&destination).map_err(|source| SyncError::Destination {
            path: destination.clone(),
            source,
        })?;
        let dest_root = fs::canonicalize(&destination).unwrap_or(destination);

        debug!(
            links = self.ledger.len(),
            ignored = self.ignored.len(),
            "Starting sync pass"
        );

        let files = scan_sources(&self.options.source)?;
        info!("Found {} source entries", files.len());

        let batch_size = self.options.movie_batch_size.max(1);
        let mut report = SyncReport::default();
        let mut movies: MovieBatch = Vec::with_capacity(batch_size);

        for file in files {
            // A destination nested in the source must not feed itself
            if file.path.starts_with(&dest_root) {
                continue;
            }

            let handled =
                self.ledger.contains_source(&file.path) || self.ignored.contains(&file.path);

            match self.classifier.classify(&file, handled, self.prompter) {
                Classification::Ignore(reason) => {
                    let outcome = if self.ignored.insert(&file.path) {
                        debug!(file = %file.file_name, reason = reason.description(), "Ignored");
                        FileOutcome::Ignored(reason)
                    } else {
                        FileOutcome::AlreadyHandled
                    };
                    self.finish(&file, outcome, &mut report);
                }
                Classification::AlreadyHandled => {
                    self.finish(&file, FileOutcome::AlreadyHandled, &mut report);
                }
                Classification::Unmatched => {
                    let outcome = FileOutcome::Skipped(FileError::ClassificationMiss);
                    self.finish(&file, outcome, &mut report);
                }
                Classification::Candidate(candidate) if candidate.is_movie() => {
                    movies.push((file, candidate));
                    if movies.len() >= batch_size {
                        self.flush_movies(mem::take(&mut movies), &mut report)?;
                    }
                }
                Classification::Candidate(candidate) => {
                    let outcome = self.sync_episode(&file, &candidate)?;
                    self.finish(&file, outcome, &mut report);
                }
            }
        }

        if !movies.is_empty() {
            self.flush_movies(movies, &mut report)?;
        }

        self.ignored.save()?;

        info!(
            linked = report.linked(),
            skipped = report.skipped,
            failed = report.failed,
            "Sync pass complete"
        );
        Ok(report)
    }

    /// Search a batch of movies concurrently, then link them in order
    fn flush_movies(&mut self, batch: MovieBatch, report: &mut SyncReport) -> Result<(), SyncError> {
        let queries: Vec<TitleQuery> = batch
            .iter()
            .map(|(_, candidate)| TitleQuery::for_candidate(candidate))
            .collect();

        // One search per distinct query the memo cannot answer
        let mut seen = HashSet::new();
        let pending: Vec<&TitleQuery> = queries
            .iter()
            .filter(|query| self.resolver.cached(query).is_none() && seen.insert(query.cache_key()))
            .collect();

        debug!(movies = queries.len(), searches = pending.len(), "Searching movie batch");

        let resolver = &self.resolver;
        let searches: HashMap<_, Result<Vec<CatalogTitle>, ResolveError>> =
            thread::scope(|scope| {
                let handles: Vec<_> = pending
                    .iter()
                    .map(|&query| (query.cache_key(), scope.spawn(move || resolver.search(query))))
                    .collect();

                handles
                    .into_iter()
                    .map(|(key, handle)| {
                        let result = handle.join().unwrap_or_else(|_| Err(ResolveError::WorkerPanicked));
                        (key, result)
                    })
                    .collect()
            });

        for ((file, candidate), query) in batch.into_iter().zip(&queries) {
            // An earlier movie in this batch may have settled the same query
            let identity = match self.resolver.cached(query) {
                Some(identity) => Ok(identity),
                None => match searches.get(&query.cache_key()) {
                    Some(Ok(results)) => {
                        Ok(self.resolver.select(query, results.clone(), self.prompter))
                    }
                    Some(Err(e)) => Err(e.clone()),
                    None => self.resolver.resolve(query, self.prompter),
                },
            };

            let outcome = match identity {
                Ok(identity) => self.link_movie(&file, &candidate, &identity)?,
                Err(e) => FileOutcome::Skipped(FileError::ResolutionFailure(e)),
            };
            self.finish(&file, outcome, report);
        }

        Ok(())
    }

    fn link_movie(
        &mut self,
        file: &SourceFile,
        candidate: &MediaCandidate,
        identity: &ResolvedIdentity,
    ) -> Result<FileOutcome, SyncError> {
        let dir = movie_dir(&self.options.destination, identity);
        let stem = with_resolution(
            &sanitize_component(&identity.folder_name()),
            candidate.resolution(),
        );
        let name = file_name(&stem, file.extension.as_deref());

        self.link_into(file, &dir, name)
    }

    fn sync_episode(
        &mut self,
        file: &SourceFile,
        candidate: &MediaCandidate,
    ) -> Result<FileOutcome, SyncError> {
        let code = match candidate.episode_code() {
            Some(code) => code,
            None => return Ok(FileOutcome::Skipped(FileError::ClassificationMiss)),
        };

        let query = TitleQuery::for_candidate(candidate);
        let identity = match self.resolver.resolve(&query, self.prompter) {
            Ok(identity) => identity,
            Err(e) => return Ok(FileOutcome::Skipped(FileError::ResolutionFailure(e))),
        };

        let style = match candidate {
            MediaCandidate::AnimeEpisode { .. } => EpisodeStyle::Absolute,
            _ => EpisodeStyle::Standard,
        };

        let stem = if code.is_multi_episode() {
            multi_episode_stem(&identity.display_name, &code)
        } else {
            let lookup = self
                .resolver
                .episode_lookup(&identity, code.season, code.episode);
            episode_stem(&lookup, code.season, code.episode, style, &file.stem)
        };

        let stem = with_resolution(&stem, candidate.resolution());
        let name = file_name(&stem, file.extension.as_deref());
        let dir = episode_dir(&self.options.destination, &identity, code.season);

        self.link_into(file, &dir, name)
    }

    /// Place the link, retrying once with a shorter name if the filesystem refuses it
    fn link_into(
        &mut self,
        file: &SourceFile,
        dir: &Path,
        name: String,
    ) -> Result<FileOutcome, SyncError> {
        if let Err(e) = fs::create_dir_all(dir) {
            let err = LinkError::Io {
                path: dir.to_path_buf(),
                source: e,
            };
            return Ok(FileOutcome::Skipped(FileError::Filesystem(err)));
        }

        let mut name = name;
        let mut shortened = false;

        loop {
            match place(dir, &name, &file.path) {
                Placement::Synced(dest) => {
                    self.record(file, &dest)?;
                    return Ok(FileOutcome::AlreadySynced(dest));
                }
                Placement::Occupied(dest) => {
                    self.ignored.insert(&file.path);
                    return Ok(FileOutcome::Skipped(FileError::DestinationConflict(dest)));
                }
                Placement::Vacant(dest) => match create_link(&file.path, &dest, file.is_dir) {
                    Ok(()) => {
                        self.record(file, &dest)?;
                        return Ok(FileOutcome::Linked(dest));
                    }
                    Err(e) if !shortened && e.is_name_too_long() => {
                        debug!(name = %name, "Name too long, shortening");
                        name = shorten_file_name(&name);
                        shortened = true;
                    }
                    Err(e) => return Ok(FileOutcome::Skipped(FileError::Filesystem(e))),
                },
            }
        }
    }

    /// Ledger writes are flushed immediately
    fn record(&mut self, file: &SourceFile, dest: &Path) -> Result<(), SyncError> {
        if self.ledger.insert(LedgerEntry::new(&file.path, dest)) {
            self.ledger.save()?;
        }
        Ok(())
    }

    fn finish(&self, file: &SourceFile, outcome: FileOutcome, report: &mut SyncReport) {
        match &outcome {
            FileOutcome::Linked(dest) => {
                info!(from = ?file.path, to = ?dest, "Linked");
                self.console.linked(&file.file_name, &display_path(dest));
            }
            FileOutcome::AlreadySynced(dest) => {
                debug!(path = ?dest, "Already linked");
            }
            FileOutcome::Ignored(reason) => {
                self.console
                    .info(&format!("Ignoring {} ({})", file.file_name, reason.description()));
            }
            FileOutcome::AlreadyHandled => {}
            FileOutcome::Skipped(FileError::ClassificationMiss) => {
                debug!(file = %file.file_name, "Unrecognized, skipping");
            }
            FileOutcome::Skipped(FileError::DestinationConflict(dest)) => {
                debug!(from = ?file.path, to = ?dest, "Destination occupied, ignoring source");
                self.console.warning(&format!(
                    "{} not linked: {} already exists",
                    file.file_name,
                    display_path(dest)
                ));
            }
            FileOutcome::Skipped(e) => {
                debug!(file = ?file.path, error = %e, "Failed to sync");
                self.console.error(&format!("{}: {}", file.file_name, e));
            }
        }

        report.record(&outcome);
    }
}

fn display_path(path: &Path) -> String {
    path.display().to_string()
}
