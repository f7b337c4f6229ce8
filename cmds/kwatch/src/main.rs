use anyhow::Result;
use clap::{Parser, Subcommand};
use kwatch::{
	commands::{self, util::BrokenPipeGuard},
	telemetry::{self, LogFormat, LogLevel},
};

#[cfg(all(
	target_os = "linux",
	feature = "mimalloc",
	not(feature = "system-alloc")
))]
#[global_allocator]
static GLOBAL: mimallocator::Mimalloc = mimallocator::Mimalloc;

#[derive(Parser)]
#[command(name = "kwatch")]
#[command(about = "Resolve which cluster resource types to watch", long_about = None)]
#[command(version)]
struct Cli {
	/// Log verbosity. Overrides RUST_LOG
	#[arg(long, global = true, value_enum)]
	log_level: Option<LogLevel>,

	/// Log line format
	#[arg(long, global = true, value_enum, default_value_t)]
	log_format: LogFormat,

	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand)]
enum Commands {
	/// List the cluster's resource types to watch, one per group and kind
	Resources(commands::resources::ResourcesArgs),

	/// List the object kinds resources are matched against
	Kinds(commands::kinds::KindsArgs),
}

fn main() -> Result<()> {
	let cli = Cli::parse();

	let _telemetry = telemetry::init(cli.log_level, cli.log_format)?;

	let stdout = BrokenPipeGuard::new(std::io::stdout());

	match cli.command {
		Commands::Resources(args) => commands::resources::run(args, stdout),
		Commands::Kinds(args) => commands::kinds::run(args, stdout),
	}
}
