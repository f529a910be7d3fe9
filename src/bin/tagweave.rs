use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "tagweave", version)]
struct Cli {
    /// Settings JSON (pipeline + animator). Defaults apply when omitted.
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile marked-up text and print the resolved spans as JSON.
    Compile(CompileArgs),
    /// Sample a waveform and print `time,value,direction,extrema` CSV rows.
    Wave(WaveArgs),
    /// Reveal text at a fixed rate and print one JSON line of deltas per frame.
    Play(PlayArgs),
}

#[derive(Parser, Debug)]
struct CompileArgs {
    /// Raw text with markup.
    #[arg(long)]
    raw: PathBuf,

    /// Text as displayed by the host. Defaults to the raw text.
    #[arg(long)]
    display: Option<PathBuf>,

    /// Pretty-print the JSON output.
    #[arg(long)]
    pretty: bool,
}

#[derive(Parser, Debug)]
struct WaveArgs {
    /// Seconds spent rising.
    #[arg(long, default_value_t = 0.5)]
    up: f64,

    /// Seconds spent falling.
    #[arg(long, default_value_t = 0.5)]
    down: f64,

    /// Seconds held at the crest.
    #[arg(long, default_value_t = 0.0)]
    crest_wait: f64,

    /// Seconds held at the trough.
    #[arg(long, default_value_t = 0.0)]
    trough_wait: f64,

    /// Peak magnitude.
    #[arg(long, default_value_t = 1.0)]
    amplitude: f64,

    /// Phase propagation speed.
    #[arg(long, default_value_t = 1.0)]
    velocity: f64,

    /// Position along the wave.
    #[arg(long, default_value_t = 0.0)]
    offset: f64,

    /// Sampling duration in seconds.
    #[arg(long, default_value_t = 2.0)]
    duration: f64,

    /// Seconds between samples.
    #[arg(long, default_value_t = 0.05)]
    step: f64,
}

#[derive(Parser, Debug)]
struct PlayArgs {
    /// Raw text with markup.
    #[arg(long)]
    raw: PathBuf,

    /// Characters revealed per second.
    #[arg(long, default_value_t = 20.0)]
    cps: f64,

    /// Frames per second.
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Seconds to simulate.
    #[arg(long, default_value_t = 2.0)]
    duration: f64,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = load_settings(cli.settings.as_deref())?;
    match cli.cmd {
        Command::Compile(args) => cmd_compile(args, &settings),
        Command::Wave(args) => cmd_wave(args),
        Command::Play(args) => cmd_play(args, &settings),
    }
}

fn load_settings(path: Option<&Path>) -> anyhow::Result<tagweave::Settings> {
    let Some(path) = path else {
        return Ok(tagweave::Settings::default());
    };
    let text = read_text(path)?;
    let settings = tagweave::Settings::from_json_str(&text)
        .with_context(|| format!("parse settings '{}'", path.display()))?;
    Ok(settings)
}

fn read_text(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("read '{}'", path.display()))
}

fn cmd_compile(args: CompileArgs, settings: &tagweave::Settings) -> anyhow::Result<()> {
    let raw = read_text(&args.raw)?;
    let display = match &args.display {
        Some(path) => read_text(path)?,
        None => raw.clone(),
    };

    let mut pipeline = tagweave::EffectLibrary::builtin().pipeline(&settings.pipeline);
    let compiled = pipeline.compile(&raw, &display);
    for d in &compiled.diagnostics {
        eprintln!("warning: {} (raw index {})", d.message, d.raw_index);
    }

    let json = if args.pretty {
        serde_json::to_string_pretty(&compiled)
    } else {
        serde_json::to_string(&compiled)
    }
    .context("serialize compiled text")?;
    println!("{json}");
    Ok(())
}

fn cmd_wave(args: WaveArgs) -> anyhow::Result<()> {
    if args.step.is_nan() || args.step <= 0.0 || args.duration.is_nan() || args.duration < 0.0 {
        anyhow::bail!("step must be > 0 and duration >= 0");
    }
    let wave = tagweave::Wave::new(tagweave::WaveParams {
        up_period: args.up,
        down_period: args.down,
        crest_wait: args.crest_wait,
        trough_wait: args.trough_wait,
        amplitude: args.amplitude,
        velocity: args.velocity,
        ..tagweave::WaveParams::default()
    })
    .context("build wave")?;

    eprintln!(
        "mode={:?} period={:.4} frequency={:.4} wavelength={:.4}",
        wave.mode(),
        wave.period(),
        wave.frequency(),
        wave.wavelength()
    );
    println!("time,value,direction,extrema");
    let samples = (args.duration / args.step).floor() as u64;
    for i in 0..=samples {
        let t = i as f64 * args.step;
        let (value, direction) = wave.evaluate(t, args.offset);
        let extrema = if i == 0 {
            0
        } else {
            wave.passed_extrema(t, args.step, args.offset)
        };
        println!("{t:.4},{value:.6},{direction},{extrema}");
    }
    Ok(())
}

#[derive(serde::Serialize)]
struct Frame<'a> {
    time: f64,
    revealed: usize,
    deltas: &'a [tagweave::CharDelta],
    hits: &'a [tagweave::ExtremaHit],
}

fn cmd_play(args: PlayArgs, settings: &tagweave::Settings) -> anyhow::Result<()> {
    if args.fps == 0 || args.cps.is_nan() || args.cps <= 0.0 {
        anyhow::bail!("fps and cps must be > 0");
    }
    let raw = read_text(&args.raw)?;
    let mut animator = tagweave::TextAnimator::new(settings);
    animator.set_text(&raw, &raw);

    let mut log = |family: tagweave::SpanFamily, span: &tagweave::ResolvedSpan| {
        eprintln!("{family:?} <{}> at {}", span.name, span.start_index);
    };
    animator.start(&mut log);

    let frames = (args.duration * f64::from(args.fps)).ceil() as u64;
    for frame in 0..=frames {
        let now = frame as f64 / f64::from(args.fps);
        let count = (now * args.cps).floor() as usize;
        animator.reveal_to(count, &mut log);
        animator.tick(now, &[]);

        let line = serde_json::to_string(&Frame {
            time: animator.time(),
            revealed: animator.revealed(),
            deltas: animator.deltas(),
            hits: animator.extrema_hits(),
        })
        .context("serialize frame")?;
        println!("{line}");
    }
    Ok(())
}
