use std::io::IsTerminal;
use std::sync::Arc;

use clap::Parser;
use colored::Colorize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use repolens::cli::{AnalyzeArgs, RepolensArgs, RepolensSubCommand, SHELL_HELP, ShellCommand, ViewArg};
use repolens::config::{AnalysisConfig, AppConfig};
use repolens::errors::{AppError, PipelineError};
use repolens::github::GitHubClient;
use repolens::pipeline::{ChannelStatusSink, LogStatusSink, Pipeline, ResultStore, StatusEvent, StatusSink};
use repolens::report::{self, ViewMode};
use repolens::session::Session;
use repolens::types::AnalysisResult;

fn main() {
    let args = RepolensArgs::parse();
    init_tracing(args.verbose);

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to start async runtime: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(run_app(args)) {
        error!("Application failed: {}", e);
        let exit_code = match e {
            AppError::Pipeline(PipelineError::InvalidUrl(_)) => 2,
            _ => 1,
        };
        std::process::exit(exit_code);
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = if verbose > 0 {
        EnvFilter::new(format!("repolens={}", default_level))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

async fn run_app(args: RepolensArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load(args.config.as_deref())?;
    if let Some(token) = &args.token {
        config.override_token(token);
    }
    let client = Arc::new(GitHubClient::new(&config.github).map_err(PipelineError::from)?);

    let (status, printer): (Arc<dyn StatusSink>, Option<JoinHandle<()>>) =
        if std::io::stderr().is_terminal() {
            let (sink, status_rx) = ChannelStatusSink::new();
            (Arc::new(sink), Some(spawn_status_printer(status_rx, args.verbose > 0)))
        } else {
            // Redirected stderr: status lines go to the log, visible with -v
            (Arc::new(LogStatusSink), None)
        };
    let store = Arc::new(ResultStore::new());
    let pipeline = Pipeline::new(client, Arc::clone(&status), store.clone(), &config.analysis);

    match args.command {
        RepolensSubCommand::Analyze(analyze_args) => {
            drop(status);
            let outcome = pipeline.run(&analyze_args.url).await;
            drop(pipeline);
            // All senders are gone once the pipeline is dropped
            if let Some(printer) = printer {
                let _ = printer.await;
            }
            match outcome {
                Ok(result) => print_analysis(&result, &analyze_args, &config.analysis),
                Err(e) => Err(e.into()),
            }
        }
        RepolensSubCommand::Shell => {
            let session = Session::new(pipeline, status);
            let outcome = run_shell(session, &store, &config.analysis).await;
            if let Some(printer) = printer {
                printer.abort();
            }
            outcome
        }
    }
}

fn spawn_status_printer(mut rx: UnboundedReceiver<StatusEvent>, with_time: bool) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            eprintln!("{}", event.render(with_time).dimmed());
        }
    })
}

fn print_analysis(
    result: &AnalysisResult,
    args: &AnalyzeArgs,
    analysis: &AnalysisConfig,
) -> Result<(), AppError> {
    let folder = args.folder.as_deref().and_then(report::normalize_folder);

    if let Some(path) = &args.uml_out {
        std::fs::write(path, result.uml.as_str())
            .map_err(|e| AppError::IO(format!("writing {}", path.display()), e))?;
        info!("Wrote PlantUML to {:?}", path);
    }

    if args.json {
        let grid = report::filter_by_folder(&result.grid, folder.as_deref());
        let value = serde_json::json!({
            "grid": grid,
            "dia": result.dia,
            "uml": result.uml,
        });
        let text = serde_json::to_string_pretty(&value)
            .map_err(|e| AppError::Generic(format!("cannot serialize result: {}", e)))?;
        println!("{}", text);
        return Ok(());
    }

    if args.tree {
        let grid = report::filter_by_folder(&result.grid, folder.as_deref());
        print!("{}", report::file_tree(grid).render());
    }
    print_views(result, args.view, folder.as_deref(), analysis);
    Ok(())
}

fn print_views(result: &AnalysisResult, view: ViewArg, folder: Option<&str>, analysis: &AnalysisConfig) {
    for mode in view.modes() {
        match mode {
            ViewMode::Grid => {
                println!("{}", "Grid".bold());
                let grid = report::filter_by_folder(&result.grid, folder);
                print!("{}", report::render_grid(&grid, analysis));
            }
            ViewMode::Dia => {
                println!("{}", "DIA".bold());
                print!("{}", report::render_dia(&result.dia));
            }
            ViewMode::Uml => {
                println!("{}", "UML".bold());
                println!("{}", result.uml);
            }
        }
        println!("{}", report::view_summary(result, mode).cyan());
        println!();
    }
}

async fn run_shell(
    mut session: Session,
    store: &ResultStore,
    analysis: &AnalysisConfig,
) -> Result<(), AppError> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut folder: Option<String> = None;
    println!("{}", SHELL_HELP);

    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|e| AppError::IO("reading stdin".to_string(), e))?
    {
        match ShellCommand::parse(&line) {
            ShellCommand::Analyze(url) => {
                // Runs in the background; a newer command supersedes it
                let _ = session.analyze(&url);
            }
            ShellCommand::Reload => {
                let _ = session.reload();
            }
            ShellCommand::Clear => session.clear(),
            ShellCommand::Show(view) => match store.snapshot() {
                Some(result) => print_views(&result, view, folder.as_deref(), analysis),
                None => println!("No result yet."),
            },
            ShellCommand::ShowFile(path) if path.is_empty() => println!("Usage: show file <path>"),
            ShellCommand::ShowFile(path) => match store.snapshot() {
                Some(result) => match report::find_file(&result, &path) {
                    Some((grid, dia)) => print!("{}", report::render_file(grid, dia, analysis)),
                    None => println!("No analyzed file matches {}", path),
                },
                None => println!("No result yet."),
            },
            ShellCommand::Folder(prefix) => {
                match &prefix {
                    Some(prefix) => println!("Folder filter: {}", prefix),
                    None => println!("Folder filter cleared."),
                }
                folder = prefix;
            }
            ShellCommand::Help => println!("{}", SHELL_HELP),
            ShellCommand::Exit => break,
            ShellCommand::Empty => {}
            ShellCommand::Unknown(text) => println!("Unknown command: {}", text),
        }
    }

    session.pipeline().cancel();
    Ok(())
}
