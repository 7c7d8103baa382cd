use std::process;

use clap::Parser;
use colored::Colorize;
use clonotrack::{
    cli::{Args, Command},
    error::ClonotrackError,
    run,
};

fn main() {
    let args = Args::parse();

    #[cfg(feature = "tracing")]
    init_tracing(&args);

    if let Err(e) = dispatch(args.command) {
        eprintln!(
            "{}\n {}",
            "Application error:".blue().bold(),
            e.to_string().blue()
        );
        process::exit(1);
    }
}

#[cfg(feature = "tracing")]
fn init_tracing(args: &Args) {
    use tracing_subscriber::EnvFilter;

    let level = if args.quiet {
        "warn"
    } else if args.verbose {
        "debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn dispatch(command: Command) -> Result<(), ClonotrackError> {
    match command {
        Command::Filter {
            path,
            min_count,
            chain,
            output,
        } => {
            run::run_filter(path, chain, min_count, output.as_deref())?;
        }
        Command::Analyze {
            folder,
            insertions,
            prefix,
        } => {
            let written = run::run_analyze(&folder, prefix.as_deref(), insertions)?;
            for path in written {
                eprintln!("{}: {}", "wrote".bold(), path.display().to_string().blue());
            }
        }
        Command::Pair {
            fasta,
            qual,
            output,
            subject,
        } => {
            let pairs = run::run_pair(fasta, qual, &output, &subject)?;
            eprintln!(
                "{}: {} -> {}",
                "pairs".bold(),
                pairs.to_string().blue().bold(),
                output.display().to_string().underline()
            );
        }
        Command::Count {
            path,
            chain,
            min_count,
            format,
        } => {
            run::run_count(path, chain, min_count, format)?;
        }
    }
    Ok(())
}
