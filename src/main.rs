use clap::{ArgAction, Parser, Subcommand};
use nasimg::archive::{self, PackOptions, PackOutcome, UnpackOptions};
use nasimg::archiver::TarArchiver;
use nasimg::config::{ModelList, MODEL_LIST_FILE};
use nasimg::inspect::{inspect, HeaderInfo};
use nasimg::layout::Variant;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "nasimg", version, about = "Pack, unpack and inspect NAS add-on packages and firmware images")]
struct Cli {
    /// Log more (--verbose: info, --verbose --verbose: debug); RUST_LOG overrides
    #[arg(long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add-on application packages
    #[command(subcommand)]
    App(AppCommand),
    /// Firmware images
    #[command(subcommand)]
    Fw(FwCommand),
}

#[derive(Subcommand)]
enum AppCommand {
    /// Pack a source folder (must contain apkg.rc) into its parent folder
    Pack {
        #[arg(short, long)]
        model: String,
        #[arg(short, long, default_value = ".")]
        source: PathBuf,
        /// Mark the package as third-party
        #[arg(long)]
        third_party: bool,
        /// Supported model list, one per line
        #[arg(short = 'l', long, default_value = MODEL_LIST_FILE)]
        model_list: PathBuf,
    },
    /// Extract and verify the payload of a package
    Unpack {
        #[arg(short, long)]
        source: PathBuf,
        /// Defaults to apkg.tgz in the current folder
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show the header of a package
    Info {
        #[arg(short, long)]
        source: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// List supported models
    Models {
        #[arg(short = 'l', long, default_value = MODEL_LIST_FILE)]
        model_list: PathBuf,
    },
}

#[derive(Subcommand)]
enum FwCommand {
    /// Pack a firmware binary
    Pack {
        #[arg(short, long)]
        model: String,
        #[arg(short = 'v', long = "firmware-version")]
        fw_version: String,
        #[arg(short, long)]
        source: PathBuf,
        /// Defaults to the folder of the source file
        #[arg(short, long)]
        dest: Option<PathBuf>,
    },
    /// Extract and verify the payload of a firmware image
    Unpack {
        #[arg(short, long)]
        source: PathBuf,
        /// Defaults to fw.bin in the current folder
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show the header of a firmware image
    Info {
        #[arg(short, long)]
        source: PathBuf,
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {

        // ── Add-on packages ──────────────────────────────────────────────────
        Commands::App(AppCommand::Pack { model, source, third_party, model_list }) => {
            let models = ModelList::load_or_builtin(&model_list)?;
            let opts   = PackOptions::default();
            let out    = archive::pack_app(&source, &model, third_party, &models, &TarArchiver, &opts)?;
            println!("Model name:        {model}");
            if let Some(packager) = &out.packager {
                println!("Packager:          {packager}");
            }
            print_packed(&out);
        }
        Commands::App(AppCommand::Unpack { source, output }) => {
            unpack_cmd(&source, Variant::Package, output)?;
        }
        Commands::App(AppCommand::Info { source, json }) => {
            print_info(&inspect(&source, Variant::Package)?, json)?;
        }
        Commands::App(AppCommand::Models { model_list }) => {
            println!("Supported models:");
            for model in ModelList::load_or_builtin(&model_list)?.iter() {
                println!("    {model}");
            }
        }

        // ── Firmware ─────────────────────────────────────────────────────────
        Commands::Fw(FwCommand::Pack { model, fw_version, source, dest }) => {
            let opts = PackOptions::default();
            let out  = archive::pack_firmware(&source, dest.as_deref(), &model, &fw_version, &opts)?;
            println!("NAS type:          {model}");
            println!("Firmware version:  {fw_version}");
            println!("Build date:        {}", opts.stamp.format("%Y/%m/%d"));
            print_packed(&out);
        }
        Commands::Fw(FwCommand::Unpack { source, output }) => {
            unpack_cmd(&source, Variant::Firmware, output)?;
        }
        Commands::Fw(FwCommand::Info { source, json }) => {
            print_info(&inspect(&source, Variant::Firmware)?, json)?;
        }
    }

    Ok(())
}

// ── helpers ──────────────────────────────────────────────────────────────────

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn unpack_cmd(source: &Path, variant: Variant, output: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let dest = output.unwrap_or_else(|| PathBuf::from(variant.default_payload_name()));
    let out  = archive::unpack(source, variant, &dest, &UnpackOptions::default())?;
    println!("Unpacked {} bytes to {} (checksum {})", out.bytes_written, out.path.display(), out.checksum);
    Ok(())
}

fn print_packed(out: &PackOutcome) {
    println!("Checksum:          {}", out.checksum);
    println!("Payload:           {} B", out.payload_len);
    println!("Created:           {}", out.path.display());
}

fn print_info(info: &HeaderInfo, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(info)?);
        return Ok(());
    }
    println!("── {} header ──────────────────────────────────────────", info.variant);
    println!("  Model          {}", info.model);
    if let Some(package) = &info.package {
        println!("  Package        {package}");
    }
    println!("  Version        {}", info.release_version);
    println!("  Short version  {}", info.short_version);
    if let Some(third_party) = info.third_party {
        println!("  Third party    {third_party}");
    }
    if info.variant == Variant::Firmware {
        let date = info.build_date
            .map(|d| d.format("%Y/%m/%d").to_string())
            .unwrap_or_else(|| "—".into());
        println!("  Build date     {date}");
    }
    println!("  Checksum       {}", info.checksum);
    println!("  Payload        {} B", info.payload_len);
    Ok(())
}
