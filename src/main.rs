// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::error::Error;
use std::path::PathBuf;

use clap::{crate_version, Parser, Subcommand};
use samplegate::config::Session;
use samplegate::{
    collect_missing_resolution_work_items, decode_file, DecodePool, PlayMode, SampleStore,
};
use tracing_subscriber::EnvFilter;

/// Log directives used when `RUST_LOG` is unset or unparsable.
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "Decodes sampler audio and reports missing samples."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decodes one audio file and prints its stream, loop and root key details.
    Inspect {
        /// The path to the audio file.
        path: String,
    },
    /// Loads every sample in a session and lists the samples that need relinking.
    Scan {
        /// The path to the session file.
        session_path: String,
        /// The number of decode threads. Overrides the session file.
        #[arg[short, long]]
        threads: Option<usize>,
    },
}

fn log_filter(directives: Option<String>) -> EnvFilter {
    directives
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok()))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Inspect { path } => {
            let sample = decode_file(&PathBuf::from(&path))?;

            println!("{}:", path);
            if let Some(format) = sample.format() {
                println!("  Format: {}", format);
            }
            println!("  Channels: {}", sample.channels());
            println!("  Sample rate: {}", sample.sample_rate());
            println!("  Frames: {}", sample.sample_length());
            if let Some(bit_depth) = sample.bit_depth() {
                println!("  Storage: {:?}", bit_depth);
            }
            match sample.root_key() {
                Some(key) => println!("  Root key: {}", key),
                None => println!("  Root key: none"),
            }
            match sample.loop_meta() {
                Some(lp) => {
                    let mode = match lp.mode {
                        PlayMode::Forward => "forward",
                        PlayMode::ForwardLoop => "loop",
                        PlayMode::ForwardLoopBidirectional => "bidirectional loop",
                    };
                    println!("  Loop: {}..{} ({})", lp.start, lp.end, mode);
                }
                None => println!("  Loop: none"),
            }
        }
        Commands::Scan {
            session_path,
            threads,
        } => {
            let session = Session::deserialize(&PathBuf::from(&session_path))?;
            let pool = match threads.or(session.decode_threads()) {
                Some(threads) => DecodePool::new(threads)?,
                None => DecodePool::with_default_threads()?,
            };

            let mut store = SampleStore::new();
            store.load_all(&pool, session.entries());

            let missing = collect_missing_resolution_work_items(&store);
            if missing.is_empty() {
                println!("All {} samples loaded.", store.len());
                return Ok(());
            }

            println!("Missing samples (count: {}):", missing.len());
            for item in missing {
                println!("- {}", item);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use tracing_subscriber::filter::LevelFilter;

    use super::*;

    #[test]
    fn test_log_filter_defaults_to_info() {
        assert_eq!(log_filter(None).max_level_hint(), Some(LevelFilter::INFO));
    }

    #[test]
    fn test_log_filter_uses_directives() {
        let filter = log_filter(Some("debug".to_string()));
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));
    }
}
