use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use bitsy::{Decode, Packet, ParseOptions, Summary};

/// Decodes a hex-encoded BITS transmission and prints the version sum and
/// the value of its outermost packet.
#[derive(Parser, Debug)]
#[command(name = "bitsy", version, about)]
struct Cli {
    /// File whose first line holds the transmission; `-` or absent reads stdin
    input: Option<PathBuf>,

    /// Maximum nesting depth of sub-packets
    #[arg(long, default_value_t = bitsy::parse::DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Also print the decoded packet tree
    #[arg(long)]
    tree: bool,

    /// Also print the decoded packet tree as JSON
    #[cfg(feature = "serde_impls")]
    #[arg(long)]
    json: bool,

    /// Log parser activity to stderr (repeat for more detail)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("bitsy=debug"),
        _ => EnvFilter::new("bitsy=trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn read_first_line(input: Option<&PathBuf>) -> Result<String> {
    let mut line = String::new();
    match input {
        Some(path) if path.as_os_str() != "-" => {
            let file = std::fs::File::open(path)
                .with_context(|| format!("cannot open {}", path.display()))?;
            BufReader::new(file)
                .read_line(&mut line)
                .with_context(|| format!("cannot read {}", path.display()))?;
        }
        _ => {
            io::stdin()
                .lock()
                .read_line(&mut line)
                .context("cannot read standard input")?;
        }
    }

    let line = line.trim_end_matches(['\r', '\n']);
    if line.is_empty() {
        bail!("input holds no transmission");
    }
    Ok(line.to_owned())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let hex = read_first_line(cli.input.as_ref())?;
    tracing::info!(digits = hex.len(), "read transmission");

    let opts = ParseOptions::with_max_depth(cli.max_depth);
    let packet = Packet::decode_with(&hex, opts)
        .map_err(bitsy::Error::from)
        .context("malformed transmission")?;
    let summary = Summary::of(&packet)
        .map_err(bitsy::Error::from)
        .context("cannot evaluate transmission")?;

    if cli.tree {
        println!("{packet}");
    }
    #[cfg(feature = "serde_impls")]
    if cli.json {
        let json = serde_json::to_string_pretty(&packet).context("cannot serialize packet tree")?;
        println!("{json}");
    }
    println!("Part 1 - Sum of the packet versions: {}", summary.version_sum);
    println!(
        "Part 2 - Calculated result of the packet payload: {}",
        summary.value
    );
    Ok(())
}
