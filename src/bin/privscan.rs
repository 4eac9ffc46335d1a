use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};

use privscan::io::ImageFile;
use privscan::logging::{init_tracing, init_tracing_json};
use privscan::verify::verify_image;
use privscan::{
    extract_blob, locate_offset_with, log_error, ChecksumStatus, LocatorConfig,
    DEFAULT_IMAGE_PATH,
};

#[derive(Parser)]
#[command(name = "privscan")]
#[command(about = "Locate and extract the private data blob from SteamUI.dll")]
struct Args {
    /// Image to scan
    #[arg(default_value = DEFAULT_IMAGE_PATH)]
    path: PathBuf,

    /// JSON configuration file
    #[arg(short, long, env = "PRIVSCAN_CONFIG")]
    config: Option<PathBuf>,

    /// Print the full extraction as JSON
    #[arg(long)]
    json: bool,

    /// Emit logs as JSON on stderr
    #[arg(long)]
    log_json: bool,

    /// Only print the resolved file offset
    #[arg(long, conflicts_with = "json")]
    offset_only: bool,

    /// Expected CRC32 of the blob, hex
    #[arg(long, value_parser = parse_hex_u32)]
    expected_crc32: Option<u32>,

    /// Expected SHA-256 of the image, hex
    #[arg(long)]
    expected_sha256: Option<String>,

    /// Expected size of the image in bytes
    #[arg(long)]
    expected_size: Option<u64>,

    /// Exit non-zero when the blob checksum does not match
    #[arg(long)]
    strict: bool,
}

fn parse_hex_u32(s: &str) -> std::result::Result<u32, String> {
    let digits = s.trim_start_matches("0x").trim_start_matches("0X");
    u32::from_str_radix(digits, 16).map_err(|e| format!("invalid hex value {s:?}: {e}"))
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.log_json {
        init_tracing_json();
    } else {
        init_tracing();
    }

    let mut config = match &args.config {
        Some(path) => LocatorConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => LocatorConfig::default(),
    };
    if let Some(crc) = args.expected_crc32 {
        config.signature.expected_crc32 = Some(crc);
    }

    let image = ImageFile::open(&args.path, config.io_limits())
        .with_context(|| format!("opening {}", args.path.display()))?;
    info!(path = %args.path.display(), size = image.size(), "Loaded image");

    verify_image(
        image.bytes(),
        args.expected_size,
        args.expected_sha256.as_deref(),
    )
    .map_err(|e| log_error!(e, "image integrity check"))?;

    if args.offset_only {
        let offset = locate_offset_with(image.bytes(), &config)
            .map_err(|e| log_error!(e, "locating blob"))?;
        println!("{:#x}", offset);
        return Ok(());
    }

    let extraction = extract_blob(image.bytes(), &config)
        .map_err(|e| log_error!(e, "extracting blob"))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&extraction)?);
    } else {
        let status = match extraction.checksum {
            ChecksumStatus::Valid => "valid",
            ChecksumStatus::Invalid { .. } => "not valid",
            ChecksumStatus::Unchecked => "unchecked",
        };
        println!("privateData is: {} ({})", extraction.hex(), status);
    }

    if let ChecksumStatus::Invalid { actual } = extraction.checksum {
        warn!(crc32 = format_args!("{:08x}", actual), "Blob checksum mismatch");
    }
    if args.strict {
        extraction.require_valid(config.signature.expected_crc32)?;
    }

    Ok(())
}
