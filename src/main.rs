//! streamify
//!
//! Rewrites imperative enhanced-for loops in Java-like source as stream
//! pipelines, and bare forEach pipelines back to iterator-while loops.

mod analysis;
mod convert;
mod extract;
mod frontend;
mod model;
mod render;
mod utils;

use std::fs;
use std::path::PathBuf;
use std::process;

use anyhow::Context;
use clap::{Parser, Subcommand};

use convert::{convert_source, convert_to_loops};

#[derive(Parser, Debug)]
#[command(name = "streamify")]
#[command(version = "0.1.0")]
#[command(about = "Converts imperative loops to stream pipelines (and back)")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input source file
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output file (defaults to stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Rewrite pipelines back to loops instead of loops to pipelines
    #[arg(long)]
    to_loops: bool,

    /// Print the JSON conversion report instead of the converted source
    #[arg(long)]
    report: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert a source file
    Convert {
        /// Input source file
        input: PathBuf,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Rewrite pipelines back to loops instead of loops to pipelines
        #[arg(long)]
        to_loops: bool,

        /// Print the JSON conversion report instead of the converted source
        #[arg(long)]
        report: bool,
    },
    /// Report which loops in a source file would convert, without rewriting
    Check {
        /// Input source file
        input: PathBuf,
    },
    /// Print version information
    Version,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match &cli.command {
        Some(Commands::Convert { input, output, to_loops, report }) => {
            convert_file(input, output.as_ref(), *to_loops, *report)
        }
        Some(Commands::Check { input }) => check_file(input),
        Some(Commands::Version) => {
            println!("streamify 0.1.0");
            Ok(())
        }
        None => match &cli.input {
            Some(input) => convert_file(input, cli.output.as_ref(), cli.to_loops, cli.report),
            None => {
                eprintln!("Error: No input file specified");
                eprintln!("Usage: streamify <FILE> or streamify convert <FILE>");
                process::exit(1);
            }
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn convert_file(
    input: &PathBuf,
    output: Option<&PathBuf>,
    to_loops: bool,
    report: bool,
) -> anyhow::Result<()> {
    let source = fs::read_to_string(input)
        .with_context(|| format!("reading {}", input.display()))?;

    let conversion = if to_loops {
        convert_to_loops(&source, 0)
    } else {
        convert_source(&source, 0)
    }
    .with_context(|| format!("converting {}", input.display()))?;

    let text = if report {
        serde_json::to_string_pretty(&conversion.report).context("serializing report")?
    } else {
        conversion.output
    };

    match output {
        Some(path) => {
            fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
        }
        None => println!("{}", text),
    }
    Ok(())
}

fn check_file(input: &PathBuf) -> anyhow::Result<()> {
    let source = fs::read_to_string(input)
        .with_context(|| format!("reading {}", input.display()))?;

    let conversion = convert_source(&source, 0)
        .with_context(|| format!("checking {}", input.display()))?;

    for lp in &conversion.report.loops {
        match &lp.reason {
            Some(reason) => println!("{}..{}: {:?} ({})", lp.start, lp.end, lp.decision, reason),
            None => println!("{}..{}: {:?}", lp.start, lp.end, lp.decision),
        }
    }
    println!(
        "{} of {} loops convert",
        conversion.report.converted(),
        conversion.report.loops.len()
    );
    Ok(())
}
