use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use cell::{Arch, BasicBlock, CellModule, DecodeConfig, UnknownPolicy};
use clap::{Args, Parser, Subcommand, ValueEnum};
use common::cli::{parse_address, GlobalOpts};
use common::{register_modules, HostServices, Logger, Module};
use ps3::RecoveryModule;

mod host;

use host::ModuleHost;

register_modules! {
    RecoveryModule,
    CellModule,
}

#[derive(Debug, Parser)]
#[clap(name = "gscx", version, about = "PS3 Cell PPU/SPU decoding front end")]
struct Cli {
    #[clap(flatten)]
    global: GlobalOpts,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Decode a raw code image into basic blocks
    Decode(DecodeArgs),
    /// Load, initialize and unload the built-in modules
    Modules(ModulesArgs),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum ArchArg {
    Ppu,
    Spu,
}

impl From<ArchArg> for Arch {
    fn from(arch: ArchArg) -> Arch {
        match arch {
            ArchArg::Ppu => Arch::Ppu,
            ArchArg::Spu => Arch::Spu,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum UnknownArg {
    /// End the block at an unknown instruction
    Terminate,
    /// Decode past unknown instructions
    Continue,
}

impl From<UnknownArg> for UnknownPolicy {
    fn from(policy: UnknownArg) -> UnknownPolicy {
        match policy {
            UnknownArg::Terminate => UnknownPolicy::Terminate,
            UnknownArg::Continue => UnknownPolicy::Continue,
        }
    }
}

#[derive(Debug, Args)]
struct DecodeArgs {
    /// Raw big-endian code image
    file: PathBuf,

    #[arg(long, value_enum)]
    arch: ArchArg,

    /// Guest address the image is mapped at
    #[arg(long, value_parser = parse_address, default_value = "0")]
    base: u64,

    /// Guest address of the block to decode, defaults to the base address
    #[arg(long, value_parser = parse_address)]
    start: Option<u64>,

    /// Walk the whole image, one block after another
    #[arg(long, conflicts_with = "start")]
    all: bool,

    /// Maximum instructions per block
    #[arg(long, default_value_t = DecodeConfig::DEFAULT_MAX_INSTRUCTIONS)]
    max_block: usize,

    #[arg(long, value_enum, default_value_t = UnknownArg::Terminate)]
    unknown: UnknownArg,
}

#[derive(Debug, Args)]
struct ModulesArgs {
    /// Load only these modules
    #[arg(long, value_enum, num_args = 1..)]
    only: Vec<Modules>,

    /// Run the recovery module's entry routine
    #[arg(long)]
    boot_recovery: bool,

    /// Firmware image handed to the recovery entry
    #[arg(long, requires = "boot_recovery")]
    firmware: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let env = env_logger::Env::default().default_filter_or(cli.global.log_level.as_filter());
    env_logger::Builder::from_env(env).init();

    match cli.command {
        Command::Decode(args) => decode(args),
        Command::Modules(args) => modules(args),
    }
}

fn decode(args: DecodeArgs) -> Result<()> {
    let image = fs::read(&args.file).with_context(|| format!("reading {}", args.file.display()))?;
    let config = DecodeConfig::default()
        .with_max_instructions(args.max_block)
        .with_unknown_policy(args.unknown.into());

    let mut cell = CellModule::default();
    if !cell.initialize(HostServices::new(Logger::with_target("cell"))) {
        bail!("{} failed to initialize", CellModule::INFO.name);
    }
    let decoder = cell.decoder(args.arch.into(), args.base, config);

    let mut out = io::stdout().lock();
    if args.all {
        for block in decoder.blocks(&image) {
            print_block(&mut out, &block)?;
        }
    } else {
        let start = args.start.unwrap_or(args.base);
        let Some(block) = decoder.decode_block_at(&image, start) else {
            bail!("no instruction at {:#x}, image covers {:#x}..{:#x}",
                start, args.base, args.base.wrapping_add(image.len() as u64));
        };
        print_block(&mut out, &block)?;
    }

    cell.shutdown();
    Ok(())
}

fn print_block(out: &mut impl Write, block: &BasicBlock) -> Result<()> {
    write!(out, "{}", block)?;
    let successors = block.successors().iter().map(|a| format!("{:#x}", a)).collect::<Vec<_>>();
    if successors.is_empty() {
        writeln!(out, "  -> (dynamic)")?;
    } else {
        writeln!(out, "  -> {}", successors.join(", "))?;
    }
    Ok(())
}

fn modules(args: ModulesArgs) -> Result<()> {
    let selected = if args.only.is_empty() { all_modules() } else { args.only };

    let mut host = ModuleHost::new(Logger::with_target("host"));
    for module in selected {
        host.load(create_module(module));
    }
    for info in host.loaded() {
        println!("{}", info);
    }

    if args.boot_recovery {
        let firmware = match &args.firmware {
            Some(path) => Some(fs::read(path).with_context(|| format!("reading {}", path.display()))?),
            None => None,
        };
        let report = host.boot_recovery(firmware.as_deref())?;
        println!("recovery: {:?}", report.steps);
        if let Some(entry) = report.entry_block {
            println!("entry block: {} instructions, {}", entry.instructions, entry.terminator);
        }
    }

    host.unload_all();
    Ok(())
}
