//! リバーシのオープニングブック整合性チェッカー
//!
//! ブックを読み込み、config.ini で選んだモードに従って評価値の整合性を
//! 検査する。mode 1〜4 が探索、mode 5 は指定局面の照会。

mod config;
mod inspect;
mod logger;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Parser;

use rbook_core::{book, CheckRule, Checker};

#[derive(Parser, Debug)]
#[command(about = "reversi opening book consistency checker")]
struct Args {
    /// Opening book file
    #[arg(long, default_value = "book.dat")]
    book: PathBuf,

    /// Config file (log_level / auto_adjust_level / adjusted_level / mode)
    #[arg(long, default_value = "config.ini")]
    config: PathBuf,

    /// Mismatched kifu output file (appended across runs)
    #[arg(long, default_value = "mismatched_positions.txt")]
    output: PathBuf,

    /// Debug log file (truncated at startup)
    #[arg(long, default_value = "debuglog.txt")]
    debug_log: PathBuf,

    /// Hex position pairs to look up in mode 5
    #[arg(long, default_value = "specified_positions.txt")]
    positions: PathBuf,

    /// Override the mode from the config file (1-4: consistency check, 5: position dump)
    #[arg(long)]
    mode: Option<u8>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let program_start = Instant::now();

    let config = config::read_config(&args.config)
        .with_context(|| format!("failed to read config {}", args.config.display()))?;
    let mode = args.mode.unwrap_or(config.mode);

    logger::init(
        &args.debug_log,
        config.log_level,
        config.auto_adjust_level,
        config.adjusted_level,
    )
    .context("failed to initialize debug log")?;

    if !(1..=5).contains(&mode) {
        log::error!("Invalid mode: {}", mode);
        bail!("Invalid mode ({}). Mode must be between 1 and 5.", mode);
    }

    let mut book = match book::load(&args.book) {
        Ok(b) => b,
        Err(e) => {
            log::error!("Failed to open book file: {}: {}", args.book.display(), e);
            bail!("failed to load book file {}: {}", args.book.display(), e);
        }
    };

    if mode == 5 {
        inspect::read_specified_positions(&book, &args.positions);
        return Ok(());
    }

    let rule = match CheckRule::from_mode(mode) {
        Some(r) => r,
        None => bail!("Invalid mode ({}). Mode must be between 1 and 5.", mode),
    };

    let mut checker = Checker::new(&mut book, rule, &args.output);
    if let Err(e) = checker.run() {
        log::error!("{:#}", e);
        return Err(e);
    }

    let elapsed = program_start.elapsed().as_secs_f64();
    log::warn!("Total program execution time: {} seconds", elapsed);
    println!("Total program execution time: {} seconds", elapsed);

    Ok(())
}
