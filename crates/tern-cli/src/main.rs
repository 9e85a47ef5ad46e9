//! Tern CLI entry point.

use std::io::Read;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use tern_ir::check::{check_canonical, check_const_folded};
use tern_vm::Interpreter;

#[derive(Parser)]
#[command(name = "tern")]
#[command(about = "Tree IR interpreter CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute an IR file
    Run {
        /// Input IR file (or - for stdin)
        file: String,

        /// Entry function to call after global constructors
        #[arg(short, long, default_value = "main")]
        entry: String,

        /// Integer arguments passed to the entry function
        #[arg(allow_negative_numbers = true)]
        args: Vec<i64>,

        /// Call depth limit override
        #[arg(long)]
        max_depth: Option<usize>,
    },

    /// Parse an IR file and run optional static checks
    Check {
        /// Input IR file (or - for stdin)
        file: String,

        /// Require canonical form (no ESEQ, calls only as statements)
        #[arg(long)]
        canonical: bool,

        /// Require const-folded form (no all-constant BINOPs)
        #[arg(long)]
        const_folded: bool,
    },

    /// Parse an IR file and pretty-print it back
    Print {
        /// Input IR file (or - for stdin)
        file: String,

        /// Emit JSON instead of the textual form
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("tern=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            file,
            entry,
            args,
            max_depth,
        } => {
            let unit = tern_ir::parse_comp_unit(&read_input(&file)?)?;
            let mut interp = Interpreter::load(&unit)?;
            if let Some(depth) = max_depth {
                interp.set_max_call_depth(depth);
            }

            info!(unit = %unit.name, entry = %entry, "running");
            let values = interp.call_multi(&entry, &args)?;
            match values.as_slice() {
                [] => {}
                [single] => println!("{}", single),
                many => println!(
                    "{}",
                    many.iter()
                        .map(|v| v.to_string())
                        .collect::<Vec<_>>()
                        .join(" ")
                ),
            }
        }

        Commands::Check {
            file,
            canonical,
            const_folded,
        } => {
            let unit = tern_ir::parse_comp_unit(&read_input(&file)?)?;
            if canonical {
                check_canonical(&unit)?;
            }
            if const_folded {
                check_const_folded(&unit)?;
            }
            println!(
                "{}: ok ({} function(s), {} data segment(s))",
                unit.name,
                unit.functions.len(),
                unit.data.len()
            );
        }

        Commands::Print { file, json } => {
            let unit = tern_ir::parse_comp_unit(&read_input(&file)?)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&unit)?);
            } else {
                println!("{}", unit);
            }
        }
    }

    Ok(())
}

fn read_input(file: &str) -> Result<String, std::io::Error> {
    if file == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        std::fs::read_to_string(file)
    }
}
