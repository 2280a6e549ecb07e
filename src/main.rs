use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;
use miette::{bail, IntoDiagnostic, Result};

use slate::RunState;

/// Slate is a complete & convenient toolchain for the LS-8 microcomputer.
#[derive(Parser)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Quickly provide a `.ls8` file to run
    path: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Run text `.ls8` or binary `.bin` file directly and output to terminal
    Run {
        /// `.ls8` or `.bin` file to run
        name: PathBuf,
        /// Print pc, upcoming memory and registers before every cycle
        #[arg(short, long)]
        trace: bool,
        /// Produce minimal output, suited for blackbox tests
        #[arg(short, long)]
        minimal: bool,
    },
    /// Check a `.ls8` file without running it
    Check {
        /// File to check
        name: PathBuf,
    },
}

fn main() -> miette::Result<()> {
    use MsgColor::*;
    let args = Args::parse();
    slate::env::init();

    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new() //
                .context_lines(slate::DIAGNOSTIC_CONTEXT_LINES)
                .build(),
        )
    }))?;

    if let Some(command) = args.command {
        match command {
            Command::Run {
                name,
                trace,
                minimal,
            } => run(&name, trace, minimal),
            Command::Check { name } => {
                file_message(Green, "Checking", &name);
                let contents = fs::read_to_string(&name).into_diagnostic()?;
                let _ = slate::load_source(&contents)?;
                message(Green, "Success", "no errors found!");
                Ok(())
            }
        }
    } else if let Some(path) = args.path {
        run(&path, false, false)
    } else {
        println!("\n~ slate v{VERSION} ~");
        println!("{}", LOGO.truecolor(119, 136, 153).bold());
        println!("{SHORT_INFO}");
        Ok(())
    }
}

#[allow(unused)]
enum MsgColor {
    Green,
    Cyan,
    Red,
}

fn file_message(color: MsgColor, left: &str, right: &Path) {
    let right = format!("target {}", right.display());
    message(color, left, &right);
}

fn message(color: MsgColor, left: &str, right: &str) {
    let left = match color {
        MsgColor::Green => left.green(),
        MsgColor::Cyan => left.cyan(),
        MsgColor::Red => left.red(),
    };
    println!("{left:>12} {right}");
}

fn run(name: &Path, trace: bool, minimal: bool) -> Result<()> {
    if !minimal {
        file_message(MsgColor::Green, "Loading", name);
    }

    let Some(ext) = name.extension() else {
        bail!("File has no extension. Exiting...");
    };
    let mut program = match ext.to_str() {
        Some("ls8") => {
            let contents = fs::read_to_string(name).into_diagnostic()?;
            let bytes = slate::load_source(&contents)?;
            RunState::from_raw(&bytes)?
        }
        Some("bin" | "obj") => {
            // Read to byte buffer
            let mut file = File::open(name).into_diagnostic()?;
            let f_size = file.metadata().into_diagnostic()?.len();
            let mut buffer = Vec::with_capacity(f_size as usize);
            file.read_to_end(&mut buffer).into_diagnostic()?;
            RunState::from_raw(&buffer)?
        }
        _ => {
            bail!("File has unknown extension. Exiting...")
        }
    };

    program.set_trace(trace || slate::env::is_trace_enabled());

    if !minimal {
        message(MsgColor::Green, "Running", "loaded program");
    }
    program.run()?;

    if !minimal {
        file_message(MsgColor::Green, "Completed", name);
    }
    Ok(())
}

const LOGO: &str = r#"
     _       _
 ___| | __ _| |_ ___
/ __| |/ _` | __/ _ \
\__ \ | (_| | ||  __/
|___/_|\__,_|\__\___|"#;

const SHORT_INFO: &str = r"
Welcome to slate, an all-in-one toolchain for running LS-8 machine code.
Please use `-h` or `--help` to access the usage instructions and documentation.
";

const VERSION: &str = env!("CARGO_PKG_VERSION");
