use clap::Parser;
use medialink::api::CinemetaClient;
use medialink::cli::Args;
use medialink::config::{ConfigError, Settings};
use medialink::console::{Console, ConsoleConfig};
use medialink::error::AppError;
use medialink::ledger::StateConfig;
use medialink::logging;
use medialink::notify::{Notifier, PlexNotifier};
use medialink::output::display_sync_report;
use medialink::resolver::{AutoPrompter, Prompter, ResolverConfig};
use medialink::sync::{SyncEngine, SyncOptions};
use medialink::ClassifierConfig;
use std::time::Duration;
use tracing::{debug, error, info, warn};

fn main() {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    logging::init(args.verbose);

    if let Err(e) = run(args) {
        error!("{}", e);
        eprintln!("\nError: {}", e.detailed_message());
        std::process::exit(e.exit_code().into());
    }
}

fn run(args: Args) -> Result<(), AppError> {
    let settings_path = match &args.config {
        Some(path) => path.clone(),
        None => Settings::default_path().ok_or(ConfigError::NoConfigDir)?,
    };

    let mut settings = Settings::load(&settings_path)?;
    apply_args(&mut settings, &args);

    // Environment values stay out of the saved file
    if args.save_settings {
        settings.save(&settings_path)?;
        info!("Saved settings to {:?}", settings_path);
    }
    settings.apply_env();

    let source = settings
        .source_dir
        .clone()
        .ok_or(AppError::MissingDirectory { which: "source" })?;
    let destination = settings
        .destination_dir
        .clone()
        .ok_or(AppError::MissingDirectory {
            which: "destination",
        })?;

    let state = match &args.state_dir {
        Some(dir) => StateConfig::for_state_dir(dir),
        None => StateConfig::for_user_data().ok_or_else(|| {
            AppError::InvalidArguments(
                "No data directory available on this system; pass --state-dir".to_string(),
            )
        })?,
    };
    debug!(ledger = ?state.links_path, ignored = ?state.ignored_path, "State files");

    let console = Console::new(ConsoleConfig::new(args.verbose > 0));
    let auto = AutoPrompter;
    let prompter: &dyn Prompter = if args.auto { &auto } else { &console };

    let api_config = settings.api_config();
    if settings.split_dirs && !api_config.has_tmdb_key() {
        console.warning("Anime detection needs TMDB_API_KEY; all series go under shows/");
    }
    let catalog = CinemetaClient::new(api_config)?;

    let notifier = settings.plex_config().and_then(|config| {
        PlexNotifier::new(config)
            .map_err(|e| warn!("Plex notifications disabled: {}", e))
            .ok()
    });

    let options = SyncOptions {
        source,
        destination,
        movie_batch_size: settings.movie_batch_size,
        classifier: ClassifierConfig {
            movies_enabled: settings.movies_enabled,
            name_preference: settings.thresholds.name_preference,
        },
        resolver: ResolverConfig {
            auto_mode: args.auto,
            split_anime: settings.split_dirs,
            thresholds: settings.thresholds,
        },
    };

    console.info(&format!(
        "Syncing {} -> {}",
        options.source.display(),
        options.destination.display()
    ));

    let interval = Duration::from_secs(settings.loop_interval_secs);

    loop {
        let result = sync_once(
            &options,
            &catalog,
            &state,
            &console,
            prompter,
            notifier.as_ref().map(|n| n as &dyn Notifier),
        );

        if !args.loop_mode {
            return result;
        }

        if let Err(e) = result {
            error!("Sync pass failed: {}", e);
            console.error(&e.to_string());
        }

        debug!("Sleeping {:?} before next pass", interval);
        std::thread::sleep(interval);
    }
}

fn apply_args(settings: &mut Settings, args: &Args) {
    if let Some(source) = &args.source {
        settings.source_dir = Some(source.clone());
    }
    if let Some(destination) = &args.destination {
        settings.destination_dir = Some(destination.clone());
    }
    if let Some(secs) = args.interval {
        settings.loop_interval_secs = secs;
    }
    settings.split_dirs |= args.split_dirs;
    settings.movies_enabled |= args.movies;
}

fn sync_once(
    options: &SyncOptions,
    catalog: &CinemetaClient,
    state: &StateConfig,
    console: &Console,
    prompter: &dyn Prompter,
    notifier: Option<&dyn Notifier>,
) -> Result<(), AppError> {
    let mut engine = SyncEngine::new(options.clone(), catalog, state, console, prompter);
    let report = engine.run()?;

    display_sync_report(&report, &mut std::io::stdout())
        .map_err(|e| AppError::Other(format!("Failed to display output: {}", e)))?;

    if report.created.is_empty() {
        return Ok(());
    }

    if let Some(notifier) = notifier {
        match notifier.refresh(&options.destination) {
            Ok(count) => info!("Requested {} library refreshes", count),
            Err(e) => {
                warn!("Library refresh failed: {}", e);
                console.warning(&format!("Library refresh failed: {}", e));
            }
        }
    }

    Ok(())
}
