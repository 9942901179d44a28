//! Entry point: parse CLI args, load the catalog, drive the orchestrator
//! over the remote text-generation service, and map the outcome to a
//! process exit code.

mod cli;
mod config;
mod logging;

use std::sync::Arc;
use std::time::Instant;

use batchgen_core::{exit_codes, AbortReason};
use batchgen_db::{DbPool, PoolConfig};
use batchgen_input::parse_input_file;
use batchgen_orchestrator::{Orchestrator, ResourceContext};
use batchgen_pause::PauseController;
use batchgen_pipeline::{RequestContext, ResponseProcessor};
use batchgen_quota::QuotaMonitor;
use batchgen_remote::OpenAiCompatibleClient;
use batchgen_resultlog::{get_processed_ids, ResultLog};
use clap::Parser;
use cli::Args;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    logging::init(args.verbose, args.log_json);

    if let Err(err) = args.validate() {
        error!("configuration error: {err}");
        std::process::exit(exit_codes::CONFIG_ERROR);
    }

    let parse_result = match parse_input_file(&args.input_file) {
        Ok(result) => result,
        Err(err) => {
            error!("failed to read input file: {err}");
            std::process::exit(exit_codes::INPUT_ERROR);
        }
    };

    if parse_result.items.is_empty() {
        error!("no valid work items found in input file");
        std::process::exit(exit_codes::INPUT_ERROR);
    }

    if args.dry_run {
        run_dry_run(&parse_result.items);
        return Ok(());
    }

    if let Err(reason) = config::output_path_writable(&args.output) {
        error!("invalid output path: {reason}");
        std::process::exit(exit_codes::INPUT_ERROR);
    }

    let mut items = parse_result.items;
    if args.resume {
        match get_processed_ids(&args.output).await {
            Ok(processed) => {
                let before = items.len();
                items.retain(|item| !processed.contains(&item.id()));
                info!(skipped = before - items.len(), remaining = items.len(), "resuming from existing output file");
            }
            Err(err) => {
                error!("failed to read existing output file for resume: {err}");
                std::process::exit(exit_codes::INPUT_ERROR);
            }
        }
    }

    let api_key = args.openai_api_key.clone().expect("validated above");
    let client = Arc::new(OpenAiCompatibleClient::new(args.openai_base_url.clone(), Some(api_key)));

    let db_pool = if args.enable_db {
        let database_url = args.database_url.clone().expect("validated above");
        match DbPool::new(PoolConfig::new(database_url)).await {
            Ok(pool) => {
                info!(test_mode = args.test_mode, "database connection pool initialized");
                Some(Arc::new(pool))
            }
            Err(err) => {
                error!("failed to initialize database connection: {err}");
                std::process::exit(exit_codes::CONFIG_ERROR);
            }
        }
    } else {
        None
    };

    let quota_monitor = if args.no_quota_monitoring {
        None
    } else {
        let monitor = QuotaMonitor::new(args.daily_limit, args.quota_threshold);
        let state_path = std::path::PathBuf::from(&args.quota_state_file);
        match monitor.load_state(&state_path).await {
            Ok(true) => info!(path = %state_path.display(), "loaded quota state from disk"),
            Ok(false) => {}
            Err(err) => warn!("failed to load quota state, starting fresh: {err}"),
        }
        Some(Arc::new(monitor))
    };

    let result_log = match ResultLog::init(&args.output, args.resume).await {
        Ok(log) => Arc::new(log),
        Err(err) => {
            error!("failed to open output file: {err}");
            std::process::exit(exit_codes::INPUT_ERROR);
        }
    };

    let mut context = RequestContext::new("main", args.prompt_id.clone().expect("validated above"), args.version.clone());
    context.skip_existing = args.skip_existing;
    context.test_mode = args.test_mode;
    context.db_pool = db_pool.clone();
    context.quota_monitor = quota_monitor.clone();
    context.result_log = Some(result_log.clone());
    let abort_signal = context.abort.clone();

    tokio::spawn({
        let abort_signal = abort_signal.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                abort_signal.trigger(AbortReason::Interrupted, "received Ctrl+C");
                warn!("interrupt received: stopping new submissions, draining work already in flight");
            }
        }
    });

    let processor = Arc::new(ResponseProcessor::default());
    let pause_controller = Arc::new(PauseController::new());
    let orchestrator = Orchestrator::new(client, processor, pause_controller.clone(), quota_monitor.clone(), args.workers, args.max_retries);

    let total = items.len();
    info!(total, input_file = %args.input_file, prompt_id = %context.prompt_id, workers = args.workers, "processing started");
    let start = Instant::now();

    let (successful, failed) = orchestrator.process_items(items, context).await;

    let elapsed = start.elapsed();
    info!(successful, failed, elapsed_secs = elapsed.as_secs_f64(), skipped_lines = parse_result.skipped_lines, error_lines = parse_result.error_lines, "processing completed");

    let state_path = std::path::PathBuf::from(&args.quota_state_file);
    let resource_context = ResourceContext::new(db_pool, quota_monitor, Some(state_path), Some(result_log), pause_controller);
    resource_context.shutdown().await;

    match abort_signal.reason() {
        Some(AbortReason::SystemicDatabaseError) => {
            error!(message = abort_signal.message().as_deref().unwrap_or(""), "run aborted: systemic database error");
            std::process::exit(exit_codes::CONFIG_ERROR);
        }
        Some(AbortReason::Interrupted) => {
            warn!("run interrupted before all items were processed");
            std::process::exit(exit_codes::INTERRUPTED);
        }
        None => {}
    }

    if failed > 0 {
        error!(failed, "processing completed with failures");
        std::process::exit(exit_codes::API_FAILURES);
    }

    info!("all items processed successfully");
    Ok(())
}

fn run_dry_run(items: &[batchgen_core::WorkItem]) {
    info!("dry run: showing first 5 payloads");
    for (index, item) in items.iter().take(5).enumerate() {
        let payload = serde_json::json!({
            "artist_name": item.name(),
            "artist_data": item.extra(),
        });
        println!("{}. {}", index + 1, serde_json::to_string_pretty(&payload).unwrap_or_default());
    }
    if items.len() > 5 {
        println!("... and {} more items", items.len() - 5);
    }
    info!("dry run completed successfully");
}
