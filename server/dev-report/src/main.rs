//! Binary entrypoint for the dev report service.
//!
//!   dev-report run [--json]   # one report, printed to stdout
//!   dev-report serve          # HTTP: GET /health, POST /dev-report

use clap::{Parser, Subcommand};
use dev_report::{AppState, ReportArgs, ReportError};
use insight_engine::AnalysisContext;
use std::io::{self, Write};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(name = "dev-report", version, about = "Engineering productivity reports from GitHub activity")]
struct Cli {
  #[command(flatten)]
  report: ReportArgs,

  #[command(subcommand)]
  command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
  /// Generate one report and print it.
  Run {
    /// Print the full analysis context as JSON instead of the summary.
    #[arg(long)]
    json: bool,
  },
  /// Serve the slash-command endpoint.
  Serve {
    #[arg(long, env = "PORT", default_value_t = 3000)]
    port: u16,
    #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1")]
    bind: IpAddr,
    /// Accept slash commands without a signing secret (local testing only).
    #[arg(long)]
    allow_unsigned: bool,
  },
}

fn main() {
  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
  let cli = Cli::parse();

  let result = match cli.command {
    Command::Run { json } => run_once(&cli.report, json),
    Command::Serve {
      port,
      bind,
      allow_unsigned,
    } => serve(cli.report, SocketAddr::new(bind, port), allow_unsigned),
  };

  if let Err(e) = result {
    let _ = writeln!(io::stderr(), "dev-report error: {}", e);
    std::process::exit(1);
  }
}

fn run_once(args: &ReportArgs, json: bool) -> Result<(), ReportError> {
  let outcome = args.build_pipeline()?.run(&AnalysisContext::default())?;
  let mut out = io::stdout().lock();
  if json {
    serde_json::to_writer_pretty(&mut out, &outcome.context)?;
    writeln!(out)?;
  } else {
    writeln!(out, "{}", outcome.summary())?;
  }
  Ok(())
}

fn serve(args: ReportArgs, addr: SocketAddr, allow_unsigned: bool) -> Result<(), ReportError> {
  if args.signing_secret.as_deref().map_or(true, str::is_empty) {
    if !allow_unsigned {
      return Err(ReportError::config(
        "signing_secret",
        "required to serve; set SLACK_SIGNING_SECRET or pass --allow-unsigned",
      ));
    }
    log::warn!("Serving without a signing secret; any caller can trigger reports");
  }
  let runtime = tokio::runtime::Runtime::new()?;
  runtime.block_on(async move {
    let app = dev_report::router(Arc::new(AppState { args }));
    log::info!("dev-report listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok::<(), ReportError>(())
  })
}
