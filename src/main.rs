use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use shoulder_rom::config::Config;
use shoulder_rom::export::{self, SessionSummary};
use shoulder_rom::measure::{replay, FrameThrottle, MeasurementMode, MeasurementSession};
use shoulder_rom::pose::{FrameReader, Side};
use shoulder_rom::render::{angle_label, status_label};

const CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SideArg {
    Left,
    Right,
}

impl From<SideArg> for Side {
    fn from(arg: SideArg) -> Self {
        match arg {
            SideArg::Left => Side::Left,
            SideArg::Right => Side::Right,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Abduction,
    Flexion,
    Extension,
}

impl From<ModeArg> for MeasurementMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Abduction => MeasurementMode::Abduction,
            ModeArg::Flexion => MeasurementMode::Flexion,
            ModeArg::Extension => MeasurementMode::Extension,
        }
    }
}

/// ランドマーク記録 (JSON Lines) から肩関節可動域を計測する
#[derive(Debug, Parser)]
#[command(author, version = env!("SHOULDER_ROM_BUILD"), about)]
struct Args {
    /// ランドマーク記録ファイル。省略時は標準入力。
    #[arg(long)]
    input: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "left")]
    side: SideArg,

    #[arg(long, value_enum, default_value = "abduction")]
    mode: ModeArg,

    #[arg(long, default_value = CONFIG_PATH)]
    config: PathBuf,

    /// CSV とセッションまとめ (JSON) を書き出す
    #[arg(long)]
    export: bool,
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn open_input(path: Option<&Path>) -> Result<Box<dyn BufRead>> {
    match path {
        Some(p) => {
            let file = File::open(p).with_context(|| format!("Failed to open {}", p.display()))?;
            Ok(Box::new(BufReader::new(file)))
        }
        None => Ok(Box::new(io::stdin().lock())),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = Config::load_or_default(&args.config);
    let side = Side::from(args.side);
    let mode = MeasurementMode::from(args.mode);

    println!("Shoulder ROM ({})", env!("SHOULDER_ROM_BUILD"));
    println!("Mode: {}", status_label(mode, side));
    println!("Smooth: alpha={}", config.smooth.alpha);
    println!("Sampling: every {} ms", config.sampling.interval_ms);
    println!();

    let reader = open_input(args.input.as_deref())?;
    let mut session = MeasurementSession::from_config(&config, side, mode);
    let mut throttle = FrameThrottle::new(config.sampling.interval_ms);

    let stats = replay(FrameReader::new(reader), &mut session, &mut throttle, side, mode)?;

    log::info!(
        "{} frames read, {} processed, {} without reading, {} malformed",
        stats.frames,
        stats.processed,
        stats.rejected,
        stats.malformed
    );
    println!("Samples: {}", session.samples().len());
    println!("Current: {}", angle_label(session.current_angle()));
    println!("Peak:    {}", angle_label(session.peak_angle()));

    if args.export {
        if session.samples().is_empty() {
            println!("No samples to export");
            return Ok(());
        }
        let stamp = now_ms();
        let dir = Path::new(&config.export.output_dir);
        let csv_path = export::save_csv(dir, &session, stamp)?;
        println!("Exported CSV: {}", csv_path.display());

        let summary_path = dir.join(format!(
            "{}.json",
            export::file_stem(session.mode(), session.side(), stamp)
        ));
        export::save_summary(&summary_path, &SessionSummary::from_session(&session))?;
        println!("Exported summary: {}", summary_path.display());
    }

    Ok(())
}
