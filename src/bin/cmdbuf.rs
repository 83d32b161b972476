use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "cmdbuf", version)]
struct Cli {
    /// Log processor activity to stderr.
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a script through a processor and print the result as JSON.
    Replay(ReplayArgs),
    /// Print the words a script encodes to, one per line.
    Dump(DumpArgs),
}

#[derive(Parser, Debug)]
struct ReplayArgs {
    /// Input replay script JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Override the script's instructions-per-tick quantum.
    #[arg(long)]
    quantum: Option<u32>,

    /// Override the script's ring capacity in words.
    #[arg(long)]
    capacity: Option<u32>,

    /// Write the JSON result here instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct DumpArgs {
    /// Input replay script JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Print words as hexadecimal.
    #[arg(long, default_value_t = false)]
    hex: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(std::io::stderr)
            .init();
    }
    match cli.cmd {
        Command::Replay(args) => cmd_replay(args),
        Command::Dump(args) => cmd_dump(args),
    }
}

fn cmd_replay(args: ReplayArgs) -> anyhow::Result<()> {
    let mut script = cmdbuf::ReplayScript::from_path(&args.in_path)?;
    if let Some(quantum) = args.quantum {
        script.processor.commands_per_update = quantum;
    }
    if let Some(capacity) = args.capacity {
        script.channel.capacity_words = capacity;
    }

    let result = cmdbuf::replay(&script)
        .with_context(|| format!("replay '{}'", args.in_path.display()))?;

    match &args.out {
        Some(out) => {
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create output dir '{}'", parent.display()))?;
            }
            let f = std::fs::File::create(out)
                .with_context(|| format!("create '{}'", out.display()))?;
            serde_json::to_writer_pretty(f, &result)
                .with_context(|| format!("write result '{}'", out.display()))?;
            eprintln!("wrote {}", out.display());
        }
        None => {
            let json = serde_json::to_string_pretty(&result).context("serialize result")?;
            println!("{json}");
        }
    }

    if result.error_status {
        eprintln!("channel failed: {}", result.parse_error);
    }
    Ok(())
}

fn cmd_dump(args: DumpArgs) -> anyhow::Result<()> {
    let script = cmdbuf::ReplayScript::from_path(&args.in_path)?;
    let words = cmdbuf::dump(&script)
        .with_context(|| format!("encode '{}'", args.in_path.display()))?;
    for w in words {
        if args.hex {
            println!("{w:#010x}");
        } else {
            println!("{w}");
        }
    }
    Ok(())
}
