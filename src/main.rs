use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use repeat_clicker::platform::block_on_pumping;
use repeat_clicker::{
    ActionKind, Autoclicker, Coordinate, Interval, RepeatPolicy, Settings, TimeUnit,
};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ActionArg {
    Click,
    Space,
}

impl From<ActionArg> for ActionKind {
    fn from(arg: ActionArg) -> Self {
        match arg {
            ActionArg::Click => ActionKind::PointerClick,
            ActionArg::Space => ActionKind::KeyTap,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "rclick", version, about = "Repeat clicks or key taps at a fixed interval")]
struct Cli {
    /// Load settings from a JSON file
    #[arg(short, long)]
    config: Option<String>,

    /// Write the effective settings to a JSON file
    #[arg(long)]
    save_config: Option<String>,

    /// Time between fires
    #[arg(short, long)]
    interval: Option<f64>,

    /// Read the interval as minutes instead of seconds
    #[arg(long)]
    minutes: bool,

    /// Stop after this many fires (default: until stopped)
    #[arg(short = 'n', long)]
    times: Option<u32>,

    /// What to fire
    #[arg(short, long, value_enum)]
    action: Option<ActionArg>,

    /// Fixed click position as X,Y (default: wherever the cursor is)
    #[arg(long, value_parser = parse_point)]
    at: Option<Coordinate>,

    /// Start/stop shortcut, e.g. ctrl+alt+r
    #[arg(long, conflicts_with = "record_hotkey")]
    hotkey: Option<String>,

    /// Press a key combination to use as the start/stop shortcut
    #[arg(long)]
    record_hotkey: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn parse_point(value: &str) -> std::result::Result<Coordinate, String> {
    let (x, y) = value
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y but got '{value}'"))?;
    let x: f64 = x.trim().parse().map_err(|e| format!("bad X: {e}"))?;
    let y: f64 = y.trim().parse().map_err(|e| format!("bad Y: {e}"))?;
    Ok(Coordinate::new(x, y))
}

fn build_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = match &cli.config {
        Some(path) => Settings::from_file(path)?,
        None => Settings::default(),
    };

    if let Some(value) = cli.interval {
        let unit = if cli.minutes { TimeUnit::Minutes } else { TimeUnit::Seconds };
        settings.interval = Interval::new(value, unit);
    } else if cli.minutes {
        settings.interval.unit = TimeUnit::Minutes;
    }
    if let Some(times) = cli.times {
        settings.set_policy(RepeatPolicy::times(times)?);
    }
    if let Some(action) = cli.action {
        settings.action = action.into();
    }
    if cli.at.is_some() {
        settings.target = cli.at;
    }
    if cli.hotkey.is_some() {
        settings.hotkey = cli.hotkey.clone();
    }
    settings.verbose |= cli.verbose;

    settings.validate()?;
    Ok(settings)
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = build_settings(&cli)?;
    init_logging(settings.verbose);

    let runtime = tokio::runtime::Runtime::new().context("failed to start the async runtime")?;
    let _entered = runtime.enter();

    // The shortcut manager belongs to the thread that pumps OS events.
    let clicker = Arc::new(
        Autoclicker::with_platform(settings).context("failed to set up the clicker")?,
    );
    block_on_pumping(&runtime, run(cli, clicker.clone())).context("clicker task failed")?
}

async fn run(cli: Cli, clicker: Arc<Autoclicker>) -> Result<()> {
    if cli.record_hotkey {
        println!("{}", "⌨️  Press the key combination to use as shortcut...".cyan());
        let binding = clicker.begin_capture().await?;
        println!("{} {}", "🔥 Shortcut set:".green(), binding.label().bold());
    }

    if let Some(path) = &cli.save_config {
        clicker.snapshot().save_to_file(path)?;
        println!("💾 Settings saved to {}", path.bold());
    }

    println!(
        "🎯 Target: {}  ⏱️  Every {}s",
        clicker.target_label().bold(),
        clicker.snapshot().interval.as_secs_f64()
    );

    match clicker.hotkey_label() {
        Some(label) => {
            println!(
                "Press {} to start or stop, {} to quit",
                label.yellow().bold(),
                "Ctrl+C".yellow()
            );
            tokio::signal::ctrl_c().await?;
        }
        None => {
            let mut running = clicker.watch_running();
            clicker.start()?;
            println!("{}", "▶️  Clicking (Ctrl+C to stop)".green());
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                status = running.wait_until_finished(1) => {
                    tracing::debug!(?status, "run finished");
                }
            }
        }
    }

    clicker.stop();
    println!("{}", "⏹️  Stopped".red());
    Ok(())
}
