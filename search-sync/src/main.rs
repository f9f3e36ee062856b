use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use search_sync::logging::init_tracing;
use search_sync::source::load_content_file;
use search_sync::{AppError, Dependencies, Settings};
use search_sync_pipeline::{PipelineError, ReindexParams};
use search_sync_query::RequestIdentity;
use search_sync_repository::IndexNameValidator;
use search_sync_shared::SearchQuery;

#[derive(Parser)]
#[command(name = "search-sync")]
#[command(about = "Keep a content repository in sync with its search index", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reindex the items of a content file that match the filter
    Reindex {
        /// JSON file holding an array of content records
        #[arg(long)]
        items: PathBuf,

        /// Status filter, comma-separated or repeated
        #[arg(long = "status")]
        statuses: Vec<String>,

        /// Type handles to leave out
        #[arg(long)]
        exclude: Vec<String>,

        /// Entry types as `handle` or `section:handle`
        #[arg(long = "entry-type")]
        entry_types: Vec<String>,

        /// Content kinds (entry, asset, category, product, digital-product)
        #[arg(long = "type")]
        types: Vec<String>,

        /// Only items of this site
        #[arg(long)]
        site: Option<u64>,

        /// Fetch rendered pages for content (needs FRONTEND_FETCH_ENABLED)
        #[arg(long)]
        frontend_fetch: bool,

        /// Also index items that have no URL
        #[arg(long)]
        include_without_urls: bool,
    },
    /// Validate an index name and show its sanitized form
    CheckName {
        name: String,
    },
    /// Show document count and size of an index
    Stats {
        index_key: String,
    },
    /// Run a rate-limited search
    Search {
        query: String,

        /// Index to search (default: every index under the prefix)
        #[arg(long)]
        index: Option<String>,

        #[arg(long)]
        site: Option<u64>,

        #[arg(long, default_value = "10")]
        limit: usize,

        /// Caller IP used for rate limiting
        #[arg(long, default_value = "127.0.0.1")]
        ip: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    init_tracing(settings.log_format);

    match run(cli.command, settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands, settings: Settings) -> Result<(), AppError> {
    match command {
        Commands::Reindex {
            items,
            statuses,
            exclude,
            entry_types,
            types,
            site,
            frontend_fetch,
            include_without_urls,
        } => {
            let params = ReindexParams {
                statuses,
                exclude,
                entry_types,
                types,
                site_id: site,
                frontend_fetch,
                include_elements_without_urls: include_without_urls,
            };
            reindex(settings, items, params).await
        }
        Commands::CheckName { name } => check_name(&name),
        Commands::Stats { index_key } => {
            IndexNameValidator::ensure_valid(&index_key)?;
            let deps = Dependencies::new(settings).await?;
            let stats = deps.search_client.get_stats(&index_key).await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
            Ok(())
        }
        Commands::Search {
            query,
            index,
            site,
            limit,
            ip,
        } => {
            let deps = Dependencies::new(settings).await?;
            let service = deps.search_service();
            let identity = RequestIdentity::from_ip(ip);

            let mut search = SearchQuery::new(query).with_limit(limit);
            if let Some(index) = index {
                search = search.in_index(index);
            }
            if let Some(site) = site {
                search = search.in_site(site);
            }

            let response = service.search(&identity, search).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
            println!(
                "{}",
                serde_json::to_string_pretty(&service.rate_limit_status(&identity))?
            );
            Ok(())
        }
    }
}

async fn reindex(
    settings: Settings,
    items: PathBuf,
    params: ReindexParams,
) -> Result<(), AppError> {
    let source = Arc::new(load_content_file(&items).await?);
    let deps = Dependencies::new(settings).await?;

    let builder = params.to_builder(deps.settings.filter.clone());
    let matching = builder
        .count(source.as_ref())
        .await
        .map_err(PipelineError::from)?;
    info!(
        matching,
        frontend_fetch = builder.is_frontend_fetch_enabled(),
        "Starting reindex"
    );

    let mut orchestrator = deps.orchestrator(source.clone());

    let mut progress = orchestrator.subscribe();
    let watcher = tokio::spawn(async move {
        while progress.changed().await.is_ok() {
            let snapshot = progress.borrow_and_update().clone();
            info!(
                completed = snapshot.completed_actions,
                total = snapshot.total_actions,
                failed = snapshot.failed_actions,
                partial = snapshot.partial_actions,
                percent = snapshot.percent,
                eta = snapshot.eta.as_deref().unwrap_or("-"),
                "Reindex progress"
            );
        }
    });

    let abandon = orchestrator.abandon_handle();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Received shutdown signal, abandoning reindex run");
            abandon.abandon();
        }
    });

    let result = orchestrator.start_from_filter(&builder, source.as_ref()).await;
    interrupt.abort();
    drop(orchestrator);
    let _ = watcher.await;

    let report = result?;
    print!("{}", report);
    Ok(())
}

fn check_name(name: &str) -> Result<(), AppError> {
    let violations = IndexNameValidator::validate(name);
    if violations.is_empty() {
        println!("{name:?} is a valid index name");
        return Ok(());
    }

    println!("{name:?} is not a valid index name:");
    for violation in &violations {
        println!("  - {}", violation);
    }
    println!("Sanitized: {:?}", IndexNameValidator::sanitize(name));
    IndexNameValidator::ensure_valid(name)?;
    Ok(())
}
