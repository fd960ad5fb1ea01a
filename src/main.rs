// ABOUTME: CLI entry point for sql-dumper
// ABOUTME: Parses flags, sets up logging, and routes to the dump or load command

use clap::{ArgAction, Parser};
use mysql_table_dumper::commands::{self, Action, Options, RunOptions};
use mysql_table_dumper::grid::TerminalSurface;
use mysql_table_dumper::mysql::{Credentials, MysqlClient};
use mysql_table_dumper::{logging, utils};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "sql-dumper")]
#[command(about = "Table-by-table MySQL dump and load with checksum checks", long_about = None)]
#[command(version, disable_help_flag = true)]
struct Cli {
    /// Action to perform
    #[arg(short, long, value_enum)]
    action: Action,
    /// MySQL user
    #[arg(short, long)]
    user: String,
    /// MySQL password
    #[arg(short, long)]
    password: String,
    /// MySQL host
    #[arg(short = 'h', long)]
    host: String,
    /// Database to dump from or load into
    #[arg(short = 'd', long = "db")]
    database: String,
    /// Backup directory; must already exist
    #[arg(short = 'D', long)]
    dir: PathBuf,
    /// Number of tables processed concurrently
    #[arg(short, long, default_value_t = 2, value_parser = clap::value_parser!(u16).range(1..))]
    threads: u16,
    /// Log file path (defaults to sql_dumper.log next to the executable)
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
    /// Seconds to keep each load phase's results on screen
    #[arg(long, default_value_t = 5, value_name = "SECONDS")]
    phase_pause: u64,
    /// Exit without waiting for a key press at the end
    #[arg(long)]
    no_wait: bool,
    /// Print help
    #[arg(long, action = ArgAction::Help)]
    help: Option<bool>,
}

impl From<Cli> for Options {
    fn from(cli: Cli) -> Self {
        Options {
            action: cli.action,
            credentials: Credentials {
                user: cli.user,
                password: cli.password,
                host: cli.host,
                database: cli.database,
            },
            run: RunOptions {
                dir: cli.dir,
                threads: usize::from(cli.threads),
                phase_pause: Duration::from_secs(cli.phase_pause),
                wait_for_key: !cli.no_wait,
            },
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            println!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let log_path = cli
        .log_file
        .clone()
        .unwrap_or_else(logging::default_log_path);
    if let Err(e) = logging::init(&log_path) {
        println!("{}", error_report(&e));
        return ExitCode::FAILURE;
    }

    let options = Options::from(cli);
    if let Err(e) = run(options).await {
        tracing::error!("{:#}", e);
        println!("{}", error_report(&e));
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

/// Operator-facing text for a fatal error, printed on stdout
fn error_report(error: &anyhow::Error) -> String {
    format!("Error: {:#}", error)
}

async fn run(options: Options) -> anyhow::Result<()> {
    options.validate()?;

    let tools = utils::locate_client_tools()?;
    tracing::info!(
        "Using {} and {}",
        tools.mysql.display(),
        tools.mysqldump.display()
    );

    let client = MysqlClient::new(tools, options.credentials);
    let surface = TerminalSurface::stdout();
    let run = options.run;

    match options.action {
        Action::Dump => {
            let summary = commands::dump(&client, &run, surface).await?;
            if summary.failed > 0 {
                tracing::warn!("⚠ {} table(s) failed to dump", summary.failed);
            } else {
                tracing::info!("✓ Dump complete");
            }
        }
        Action::Load => {
            let report = commands::load(&client, &run, surface).await?;
            let failed = report.failed_loads();
            if failed > 0 {
                tracing::warn!("⚠ {} table load(s) failed", failed);
            }
            let verification = report.verification;
            if verification.mismatched + verification.failed + verification.missing > 0 {
                tracing::warn!("⚠ Checksum verification: {}", verification);
            } else {
                tracing::info!("✓ All {} tables verified", verification.ok);
            }
        }
    }

    Ok(())
}
