//! telemetry-dump: decode a telemetry frame stream into JSON lines.
//!
//! Reads from a file argument or stdin (a serial port device works too),
//! prints one JSON object per snapshot on stdout and reports link errors
//! and latched faults on stderr through the logger.
//!
//! ```text
//! chiller-sim | telemetry-dump
//! telemetry-dump capture.bin
//! ```
#![deny(unused_must_use)]

use std::fs::File;
use std::io::{self, BufWriter, Read, Write};

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};

use chiller::adapters::log_sink::describe_code;
use chiller::telemetry::TelemetryReader;

#[derive(Debug, Parser)]
#[command(name = "telemetry-dump")]
#[command(about = "Decode a chiller telemetry frame stream into JSON lines")]
#[command(version)]
struct Cli {
    /// Frame stream file or serial device (or - for stdin)
    #[arg(default_value = "-")]
    input: String,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut input: Box<dyn Read> = if cli.input == "-" {
        Box::new(io::stdin().lock())
    } else {
        Box::new(File::open(&cli.input).with_context(|| format!("opening {}", cli.input))?)
    };
    let mut out = BufWriter::new(io::stdout().lock());

    let mut reader = TelemetryReader::new();
    let mut frames: u64 = 0;
    let mut errors: u64 = 0;
    let mut last_code: u16 = 0;
    let mut write_result: io::Result<()> = Ok(());
    let mut buf = [0u8; 4096];

    loop {
        let n = input.read(&mut buf).context("reading telemetry stream")?;
        if n == 0 {
            break;
        }
        reader.feed(&buf[..n], |decoded| match decoded {
            Ok(readings) => {
                frames += 1;
                if readings.error.code != last_code {
                    if readings.error.alert {
                        warn!("frame {frames}: {}", describe_code(readings.error.code));
                    } else {
                        info!("frame {frames}: fault cleared");
                    }
                    last_code = readings.error.code;
                }
                if write_result.is_ok() {
                    write_result = serde_json::to_string(&readings)
                        .map_err(|e| io::Error::other(e.to_string()))
                        .and_then(|line| writeln!(out, "{line}"));
                }
            }
            Err(e) => {
                errors += 1;
                warn!("link error after frame {frames}: {e}");
            }
        });
        if let Err(e) = std::mem::replace(&mut write_result, Ok(())) {
            return Err(e).context("writing JSON output");
        }
    }
    out.flush()?;

    info!("{frames} frames decoded, {errors} link errors");
    Ok(())
}
