use std::{path::PathBuf, time::Instant};

use anyhow::Result;
use clap::{ArgAction, Parser, ValueEnum};
use console::style;
use reelgen_core::{
    Pipeline, PipelineConfig, Provider, RunReport, Settings, events::bus_builder,
    format_run_summary,
};
use tracing_subscriber::EnvFilter;

use crate::{
    journal::JournalSink,
    progress::{ProgressSink, format_duration},
};

mod journal;
mod progress;

/// CLI wrapper for Provider enum (needed for clap ValueEnum)
#[derive(Clone, ValueEnum)]
enum CliProvider {
    Groq,
    Openai,
}

impl From<CliProvider> for Provider {
    fn from(cli: CliProvider) -> Self {
        match cli {
            CliProvider::Groq => Provider::Groq,
            CliProvider::Openai => Provider::Openai,
        }
    }
}

#[derive(Parser)]
#[command(name = "reelgen", version)]
#[command(
    about = "Turn a topic into a narrated video with stock footage and burned-in captions"
)]
struct Cli {
    /// What the video is about, e.g. "weird ocean facts"
    topic: String,

    /// Where to write the finished video
    #[arg(short, long, default_value = "rendered_video.mp4")]
    output: PathBuf,

    /// Script provider. Defaults to groq when GROQ_API_KEY is set, otherwise openai
    #[arg(short, long)]
    provider: Option<CliProvider>,

    /// Voice for the primary speech engine
    #[arg(long, default_value = "onyx")]
    voice: String,

    /// Keep the run's scratch directory instead of deleting it
    #[arg(long)]
    keep_temp: bool,

    /// Also write every pipeline event to FILE as JSON lines
    #[arg(long, value_name = "FILE")]
    events: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn print_report(report: &RunReport, elapsed: std::time::Duration) {
    println!(
        "\n{} {}",
        style("Total time:").dim(),
        style(format_duration(elapsed)).cyan().bold()
    );
    println!(
        "{} {}",
        style("Saved:").dim(),
        style(report.video.path.display()).cyan()
    );
    if let Some(dir) = &report.run_dir {
        println!("{} {}", style("Run files:").dim(), style(dir.display()).dim());
    }
    println!("{}", style("─".repeat(60)).dim());
    println!(
        "{}",
        format_run_summary(&report.script, &report.clips, &report.video)
    );
}

async fn run(cli: Cli) -> Result<()> {
    let settings = Settings::from_env();
    let provider = cli
        .provider
        .map(Provider::from)
        .unwrap_or_else(|| Provider::detect(&settings));

    let mut config = PipelineConfig::new(provider);
    config.output_path = cli.output;
    config.keep_temp = cli.keep_temp;
    config.narration.voice = cli.voice;

    println!(
        "\n{}  {}\n",
        style("reelgen").cyan().bold(),
        style(format!("Topic to video · {}", provider.name())).dim()
    );
    println!("{}", style("─".repeat(60)).dim());

    let mut builder = bus_builder().subscribe(ProgressSink::subscription());
    if cli.events.is_some() {
        builder = builder.subscribe(JournalSink::subscription());
    }
    let (bus, mut wiring) = builder.build()?;

    let progress = wiring
        .take(ProgressSink::SUBSCRIBER_ID)
        .map(|inbox| tokio::spawn(ProgressSink::new().run(inbox)));

    let journal = match (&cli.events, wiring.take(JournalSink::SUBSCRIBER_ID)) {
        (Some(path), Some(inbox)) => {
            let sink = JournalSink::create(path).await?;
            Some(tokio::spawn(sink.run(inbox)))
        }
        _ => None,
    };

    let pipeline = Pipeline::from_settings(&settings, config);
    let started = Instant::now();
    let result = pipeline.run(&cli.topic, &bus).await;

    bus.close();
    if let Some(task) = progress {
        task.await?;
    }
    if let Some(task) = journal {
        task.await??;
    }

    let report = result?;
    print_report(&report, started.elapsed());
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }
}
