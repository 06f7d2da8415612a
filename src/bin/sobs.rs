use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use sobs_sra_loader::app::{self, App, ProgressSink};
use sobs_sra_loader::archive::ArchiveReader;
use sobs_sra_loader::config::{
    ConfigLoader, DEFAULT_EXPORT_PATH, DbConfig, ExportOptions, LoadOptions,
};
use sobs_sra_loader::domain::RecordKind;
use sobs_sra_loader::error::SobsError;
use sobs_sra_loader::export::DEFAULT_ORGANISM;
use sobs_sra_loader::loader::DEFAULT_BATCH_SIZE;
use sobs_sra_loader::output::{self, ConsoleProgress, JsonOutput, OutputMode};
use sobs_sra_loader::store::SqliteStore;

#[derive(Parser)]
#[command(name = "sobs")]
#[command(about = "Load NCBI SRA metadata archives and export geolocated samples")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true, help = "Print only a JSON summary")]
    json: bool,

    #[arg(long, global = true, help = "Database file, overrides SOBS_DB_NAME")]
    db: Option<Utf8PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Drop all tables and load an SRA metadata archive")]
    Load(LoadArgs),
    #[command(about = "Count records in an archive without loading them")]
    Count(CountArgs),
    #[command(about = "Write the member names of an archive to a file")]
    ListMembers(ListMembersArgs),
    #[command(about = "Export geolocated samples of an organism to CSV")]
    Export(ExportArgs),
}

#[derive(Args)]
struct LoadArgs {
    archive: Utf8PathBuf,

    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    #[arg(long, help = "Log and skip members that are not well-formed XML")]
    skip_malformed: bool,
}

#[derive(Args)]
struct CountArgs {
    archive: Utf8PathBuf,

    #[arg(long, value_enum, default_value_t = RecordKind::Sample)]
    kind: RecordKind,

    #[arg(long)]
    skip_malformed: bool,
}

#[derive(Args)]
struct ListMembersArgs {
    archive: Utf8PathBuf,

    #[arg(long, default_value = "members.txt")]
    output: Utf8PathBuf,
}

#[derive(Args)]
struct ExportArgs {
    #[arg(long, default_value = DEFAULT_ORGANISM, help = "SQL LIKE pattern for the scientific name")]
    organism: String,

    #[arg(long, default_value = DEFAULT_EXPORT_PATH)]
    output: Utf8PathBuf,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(sobs) = report.downcast_ref::<SobsError>() {
            return ExitCode::from(map_exit_code(sobs));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &SobsError) -> u8 {
    match error {
        SobsError::Config(_) => 2,
        SobsError::Xml { .. }
        | SobsError::FieldShape { .. }
        | SobsError::AmbiguousField { .. }
        | SobsError::MissingAttribute { .. } => 3,
        SobsError::Insert { .. } | SobsError::Store(_) => 4,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Console
    };
    let sink: &dyn ProgressSink = match output_mode {
        OutputMode::Json => &JsonOutput,
        OutputMode::Console => &ConsoleProgress,
    };

    match cli.command {
        Commands::Load(args) => {
            let store = open_store(cli.db)?;
            let mut archive = ArchiveReader::open(&args.archive)?;
            let options = LoadOptions {
                batch_size: args.batch_size,
                skip_malformed: args.skip_malformed,
            };
            let mut app = App::new(store);
            let result = app.load(&mut archive, &options, sink)?;
            match output_mode {
                OutputMode::Json => JsonOutput::print_load(&result).into_diagnostic()?,
                OutputMode::Console => output::print_load_summary(&result),
            }
            Ok(())
        }
        Commands::Count(args) => {
            let mut archive = ArchiveReader::open(&args.archive)?;
            let result = app::count(&mut archive, args.kind, args.skip_malformed, sink)?;
            match output_mode {
                OutputMode::Json => JsonOutput::print_count(&result).into_diagnostic()?,
                OutputMode::Console => println!("{} {} records", result.count, result.kind),
            }
            Ok(())
        }
        Commands::ListMembers(args) => {
            let mut archive = ArchiveReader::open(&args.archive)?;
            let result = app::list_members(&mut archive, &args.output, sink)?;
            match output_mode {
                OutputMode::Json => JsonOutput::print_members(&result).into_diagnostic()?,
                OutputMode::Console => println!("member names written to {}", result.output),
            }
            Ok(())
        }
        Commands::Export(args) => {
            let store = open_store(cli.db)?;
            let options = ExportOptions {
                organism: args.organism,
                output: args.output,
            };
            let app = App::new(store);
            let result = app.export(&options, sink)?;
            match output_mode {
                OutputMode::Json => JsonOutput::print_export(&result).into_diagnostic()?,
                OutputMode::Console => println!(
                    "{} of {} rows written to {}",
                    result.rows_written, result.rows_scanned, result.output
                ),
            }
            Ok(())
        }
    }
}

fn open_store(db: Option<Utf8PathBuf>) -> miette::Result<SqliteStore> {
    let config: DbConfig = ConfigLoader::from_env()?;
    if config.has_server_settings() {
        tracing::warn!(
            host = config.host.as_deref().unwrap_or(""),
            port = config.port,
            user = config.user.as_deref().unwrap_or(""),
            "server connection settings are ignored by the embedded store"
        );
    }
    let path = db.unwrap_or(config.name);
    tracing::debug!(db = %path, "opening store");
    Ok(SqliteStore::open(&path)?)
}
