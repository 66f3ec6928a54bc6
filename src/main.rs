use anyhow::Context;
use clap::Parser;
use conference_import::utils::logger;
use conference_import::{
    CliConfig, ConferenceStore, ImportConfig, ImportError, ImportRun, ImportSummary,
    JsonFileStore, TracingLog,
};

struct Outcome {
    summary: ImportSummary,
    conferences: usize,
    seasons: usize,
}

fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    let config = match cli.resolve() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
            std::process::exit(e.severity().exit_code());
        }
    };

    logger::init_cli_logger(config.logging.verbose, config.logging.format);
    tracing::info!("Starting conference-import");
    tracing::debug!("Resolved config: {:?}", config);

    let outcome = match import(&cli, &config) {
        Ok(outcome) => outcome,
        Err(e) => exit_with(e),
    };

    print_summary(&outcome);

    if let Some(path) = &cli.summary_json {
        let json = serde_json::to_string_pretty(&outcome.summary)?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write summary to {}", path.display()))?;
        tracing::info!("📁 Summary saved to: {}", path.display());
    }

    Ok(())
}

fn import(cli: &CliConfig, config: &ImportConfig) -> Result<Outcome, ImportError> {
    let options = config.import_options()?;
    let file = cli.uploaded_file();
    let log = TracingLog;

    if cli.dry_run {
        tracing::info!("🔍 DRY RUN - changes to {} will be discarded", config.store.path);
        let mut store = JsonFileStore::load_snapshot(&config.store.path)?;
        let summary = ImportRun::new(&mut store, &log)
            .with_options(options)
            .run(&file)?;
        Ok(Outcome {
            summary,
            conferences: store.conference_count(),
            seasons: store.season_count(),
        })
    } else {
        let mut store = JsonFileStore::open(&config.store.path)?;
        let summary = ImportRun::new(&mut store, &log)
            .with_options(options)
            .run(&file)?;
        Ok(Outcome {
            summary,
            conferences: store.conference_count(),
            seasons: store.season_count(),
        })
    }
}

fn print_summary(outcome: &Outcome) {
    let summary = &outcome.summary;
    println!(
        "✅ Imported {}: {} rows, {} applied ({} created, {} updated), {} failed",
        summary.file_name,
        summary.total_rows,
        summary.applied,
        summary.created,
        summary.updated,
        summary.failed()
    );
    println!(
        "📁 Store now holds {} conferences in {} seasons ({} new)",
        outcome.conferences, outcome.seasons, summary.seasons_created
    );

    for failure in &summary.failures {
        println!("   ⚠️  {}", failure);
    }
}

fn exit_with(e: ImportError) -> ! {
    tracing::error!("❌ Import failed: {} (Severity: {:?})", e, e.severity());
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

    std::process::exit(e.severity().exit_code());
}
