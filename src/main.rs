use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs;
use std::path::{Path, PathBuf};
use stroop_core::Locale;
use stroop_experiment::record::default_headers;
use stroop_experiment::{EvalPolicy, Experimenter, IndexPolicy, RunConfig, StroopSession};
use stroop_store::JsonFileStore;
use stroop_timing::HighPrecisionTimer;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod app;
mod terminal;
use app::App;

#[derive(Parser)]
#[command(name = "stroop")]
#[command(about = "Stroop color-word task with per-participant result files")]
#[command(version)]
struct Cli {
    /// Write logs here instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one session on the terminal
    Run(RunArgs),

    /// Write every stored run of a participant file to CSV
    Export {
        /// Data file, `<participant>.stroop`
        #[arg(short, long)]
        file: PathBuf,

        /// Directory for bare file names
        #[arg(short = 'o', long, default_value = ".")]
        folder: PathBuf,

        /// Output CSV
        #[arg(long)]
        csv: PathBuf,

        /// English headers
        #[arg(long)]
        english: bool,
    },
}

#[derive(clap::Args)]
struct RunArgs {
    /// Number of trials
    #[arg(short = 'n', long)]
    trials: Option<usize>,

    /// Directory for bare file names
    #[arg(short = 'o', long, default_value = ".")]
    folder: PathBuf,

    /// Data file, `<participant>.stroop`
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Draw uniformly over the catalog instead of per condition group
    #[arg(long)]
    random_order: bool,

    /// Latency statistics over correct answers only
    #[arg(long)]
    correct_only: bool,

    /// English instructions, stats and headers
    #[arg(long)]
    english: bool,

    /// JSON run configuration; flags override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the finished run to this CSV
    #[arg(long)]
    export_csv: Option<PathBuf>,

    /// Put the stats block at the top of the exported CSV
    #[arg(long, requires = "export_csv")]
    export_stats: bool,
}

impl RunArgs {
    fn config(&self) -> Result<RunConfig> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => RunConfig::default(),
        };
        if let Some(n) = self.trials {
            config.trials = n;
        }
        if let Some(file) = &self.file {
            config.data_file = file.clone();
        }
        if self.random_order {
            config.index_policy = IndexPolicy::FullyRandom;
        }
        if self.correct_only {
            config.eval_policy = EvalPolicy::CorrectOnly;
        }
        if self.english {
            config.display_locale = Locale::English;
        }
        config.validate()?;
        Ok(config)
    }
}

fn load_config(path: &Path) -> Result<RunConfig> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    RunConfig::from_json(&text).with_context(|| format!("parsing {}", path.display()))
}

fn init_tracing(log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    match log_file {
        Some(path) => {
            let file = fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            builder
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}

fn run(args: RunArgs) -> Result<()> {
    let config = args.config()?;
    let locale = config.display_locale;
    let data_file = config.data_file.clone();

    let store = JsonFileStore::new();
    let mut experimenter = Experimenter::new(&store, &args.folder);
    let session = StroopSession::new(0, config, HighPrecisionTimer::new(), StdRng::from_os_rng());
    experimenter.register(Box::new(session));
    experimenter
        .load_experiment(&data_file)
        .with_context(|| format!("loading {}", data_file.display()))?;

    let Some(stats) = App::new(&mut experimenter, locale).run()? else {
        println!("No run started.");
        return Ok(());
    };

    for line in stats.lines(locale) {
        println!("{line}");
    }
    if let Some(file) = experimenter.last_loaded() {
        println!("Results saved to {}", file.path.display());
    }

    if let Some(csv) = &args.export_csv {
        experimenter.export_last_run(csv, &default_headers(locale), args.export_stats)?;
        println!("Exported {}", csv.display());
    }
    Ok(())
}

fn export(file: &Path, folder: &Path, csv: &Path, english: bool) -> Result<()> {
    let locale = if english { Locale::English } else { Locale::German };
    let store = JsonFileStore::new();
    let mut experimenter = Experimenter::new(&store, folder);
    let config = RunConfig {
        display_locale: locale,
        ..RunConfig::default()
    };
    experimenter.register(Box::new(StroopSession::new(
        0,
        config,
        HighPrecisionTimer::new(),
        StdRng::from_os_rng(),
    )));
    experimenter
        .load_experiment(file)
        .with_context(|| format!("loading {}", file.display()))?;
    let datasets = experimenter.active()?.dataset_count();
    experimenter.export_all_runs(csv, &default_headers(locale))?;
    info!(datasets, csv = %csv.display(), "exported all runs");
    println!("Exported {datasets} run(s) to {}", csv.display());
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_file.as_deref())?;

    match cli.command {
        Commands::Run(args) => run(args),
        Commands::Export {
            file,
            folder,
            csv,
            english,
        } => export(&file, &folder, &csv, english),
    }
}
