//! otpmig - Decode Google Authenticator export QR payloads
//!
//! This tool takes the `otpauth-migration://` URL scanned from a Google
//! Authenticator export QR code and prints the OTP credential records
//! embedded in it, either as readable text or as `otpauth://` URIs for
//! import into other authenticator tools.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, ValueEnum};
use otpmig_core::{decode_migration_url, DecodedPayload, OtpParameters};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info, Level};
use tracing_subscriber::EnvFilter;
use url::Url;

/// Decode Google Authenticator export QR payloads
#[derive(Parser, Debug)]
#[command(name = "otpmig")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    input: InputMode,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct InputMode {
    /// The scanned migration URL (otpauth-migration://offline?data=...)
    #[arg(short, long)]
    url: Option<String>,

    /// Path to a file containing the scanned URL text ("-" reads stdin)
    #[arg(short, long)]
    file: Option<PathBuf>,
}

/// Output format for decoded credentials
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Readable name/issuer/secret records
    Text,
    /// One otpauth:// URI per record (assumes TOTP; the migration
    /// payload's type and algorithm fields are not preserved)
    Uri,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .init();

    let url = read_input(&cli.input)?;
    debug!("decoding {} characters of scanned input", url.len());

    let payload = decode_migration_url(&url)
        .context("failed to decode migration payload")?;

    info!(
        "decoded {} credential record(s)",
        payload.otp_configs.len()
    );

    match cli.format {
        OutputFormat::Text => print_text(&payload),
        OutputFormat::Uri => print_uris(&payload)?,
    }

    Ok(())
}

/// Obtain the migration URL from the selected input mode.
fn read_input(input: &InputMode) -> Result<String> {
    if let Some(ref url) = input.url {
        return Ok(url.trim().to_string());
    }

    let Some(ref file) = input.file else {
        bail!("either --url or --file must be specified");
    };

    let content = if file == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read URL from stdin")?;
        buf
    } else {
        fs::read_to_string(file)
            .with_context(|| format!("failed to read input file: {}", file.display()))?
    };

    let url = content.trim();
    if url.is_empty() {
        bail!("input is empty: expected a migration URL");
    }

    Ok(url.to_string())
}

/// Print records as readable text, plus batch metadata when present.
fn print_text(payload: &DecodedPayload) {
    if let (Some(index), Some(size)) = (
        payload.metadata.batch_index,
        payload.metadata.batch_size,
    ) {
        if size > 1 {
            println!("Export batch: QR code {} of {}", index + 1, size);
            println!();
        }
    }

    for (i, record) in payload.otp_configs.iter().enumerate() {
        if i > 0 {
            println!();
        }
        println!("Account: {}", record.name);
        println!("Issuer:  {}", record.issuer);
        println!("Secret:  {}", record.secret_base32);
    }
}

/// Print one otpauth:// URI per record.
fn print_uris(payload: &DecodedPayload) -> Result<()> {
    for record in &payload.otp_configs {
        println!("{}", otpauth_uri(record)?);
    }
    Ok(())
}

/// Build an otpauth:// URI for a decoded record.
///
/// The migration payload's type, algorithm, digits and counter fields
/// are discarded during decoding, so the URI uses the TOTP defaults
/// every authenticator assumes (SHA1, 6 digits, 30s period).
fn otpauth_uri(record: &OtpParameters) -> Result<Url> {
    let mut uri = Url::parse("otpauth://totp/")
        .context("failed to construct otpauth URI")?;

    uri.set_path(&format!("{}:{}", record.issuer, record.name));
    uri.query_pairs_mut()
        .append_pair("secret", &record.secret_base32)
        .append_pair("issuer", &record.issuer);

    Ok(uri)
}
