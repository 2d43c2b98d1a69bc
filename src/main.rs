use clap::{Parser, Subcommand};
use modtic::config::BuildConfig;
use modtic::player::{Player, REGISTER_BASE};
use modtic::report::{BuildReport, TraceLine};
use modtic::{CompiledSong, Compiler};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "modtic")]
#[command(version = "0.1.0")]
#[command(about = "MOD to TIC-80 wavetable compiler", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile a module into a TIC-80 cartridge
    Build {
        /// Input MOD file (optionally gzip-compressed)
        input: PathBuf,

        /// Output cartridge
        #[arg(short, long)]
        output: PathBuf,

        /// Build configuration (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Player program stored as the cartridge's code chunk
        #[arg(long)]
        code: Option<PathBuf>,

        /// Write a JSON build report
        #[arg(short, long)]
        report: Option<PathBuf>,

        /// Write the player's Lua lookup tables
        #[arg(long)]
        tables: Option<PathBuf>,
    },

    /// Print the build report without writing a cartridge
    Inspect {
        input: PathBuf,

        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output compact JSON (default is pretty-printed)
        #[arg(long)]
        compact: bool,
    },

    /// Run the player and print channel registers per tick as JSON lines
    Trace {
        input: PathBuf,

        /// Number of 1/60 s ticks to run
        #[arg(short, long, default_value_t = 60)]
        ticks: u64,

        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn compiler(config: Option<&Path>) -> Result<Compiler, modtic::Error> {
    let config = match config {
        Some(path) => BuildConfig::load(path)?,
        None => BuildConfig::default(),
    };
    Ok(Compiler::with_config(config))
}

fn compile(input: &Path, config: Option<&Path>) -> Result<CompiledSong, modtic::Error> {
    let data = std::fs::read(input)?;
    compiler(config)?.compile_bytes(&data)
}

fn main() -> Result<(), modtic::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match args.command {
        Command::Build {
            input,
            output,
            config,
            code,
            report,
            tables,
        } => {
            let code = code.map(std::fs::read).transpose()?;
            let song = compiler(config.as_deref())?.compile_file(&input, &output, code.as_deref())?;
            if let Some(path) = report {
                let mut file = File::create(path)?;
                serde_json::to_writer_pretty(&mut file, &BuildReport::new(&song))?;
                file.write_all(b"\n")?;
            }
            if let Some(path) = tables {
                std::fs::write(path, song.lua_tables()?)?;
            }
        }
        Command::Inspect {
            input,
            config,
            compact,
        } => {
            let report = BuildReport::new(&compile(&input, config.as_deref())?);
            let json = if compact {
                serde_json::to_string(&report)?
            } else {
                serde_json::to_string_pretty(&report)?
            };
            println!("{}", json);
        }
        Command::Trace {
            input,
            ticks,
            config,
        } => {
            let song = compile(&input, config.as_deref())?;
            if song.overlaps_registers() {
                tracing::warn!(
                    "Payload of {} bytes at 0x{:04X} reaches the sound registers at 0x{:04X}",
                    song.layout.len(),
                    song.config.pattern_base,
                    REGISTER_BASE
                );
            }
            let mut ram = song.memory();
            let mut player = Player::new(song.tables());
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            for _ in 0..ticks {
                player.tick(&mut ram);
                serde_json::to_writer(&mut out, &TraceLine::capture(&player, &ram))?;
                out.write_all(b"\n")?;
            }
        }
    }

    Ok(())
}
