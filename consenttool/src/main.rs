use clap::{Parser, Subcommand};
use colored_json::{Color, ColorMode, Output, Styler, ToColoredJson};
use iab_consent::codec::decode_from_base64;
use iab_consent::consent::{Consent, ConsentData, decode_metadata_string, encode_consent_string};
use iab_consent::vendors::VendorList;
use serde::Serialize;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a consent string and display it in the console
    Decode {
        /// Consent string to decode
        consent_string: String,
        /// Display the raw fields instead of the allowed purposes and vendors
        #[arg(short, long)]
        raw: bool,
    },
    /// Display the metadata of a consent string
    Metadata {
        /// Consent string to decode
        consent_string: String,
    },
    /// Encode a consent string
    Encode {
        /// Global Vendor List JSON file
        #[arg(short = 'l', long)]
        vendor_list: PathBuf,
        /// Allowed vendor IDs, comma separated
        #[arg(short, long, value_delimiter = ',')]
        vendors: Vec<u16>,
        /// Allowed purpose IDs, comma separated
        #[arg(short, long, value_delimiter = ',')]
        purposes: Vec<u16>,
        #[arg(long, default_value_t = 0)]
        cmp_id: u16,
        #[arg(long, default_value_t = 0)]
        cmp_version: u16,
        #[arg(long, default_value_t = 0)]
        consent_screen: u8,
        /// Two-letter language code
        #[arg(long, default_value = "en")]
        language: String,
        /// Defaults to the highest vendor ID of the vendor list
        #[arg(long)]
        max_vendor_id: Option<u16>,
        /// Creation time as a Unix timestamp, defaults to now
        #[arg(long)]
        created: Option<u64>,
    },
}

fn main() {
    setup_logging();

    let args = Cli::parse();

    let e = match args.cmd {
        Commands::Decode {
            consent_string,
            raw: false,
        } => decode_consent_string(&consent_string),
        Commands::Decode {
            consent_string,
            raw: true,
        } => decode_raw_fields(&consent_string),
        Commands::Metadata { consent_string } => decode_metadata(&consent_string),
        Commands::Encode {
            vendor_list,
            vendors,
            purposes,
            cmp_id,
            cmp_version,
            consent_screen,
            language,
            max_vendor_id,
            created,
        } => {
            let created = created.unwrap_or_else(now);
            encode(
                &vendor_list,
                ConsentData {
                    created,
                    last_updated: created,
                    cmp_id,
                    cmp_version,
                    consent_screen,
                    consent_language: language,
                    allowed_purpose_ids: purposes.into_iter().collect(),
                    allowed_vendor_ids: vendors.into_iter().collect(),
                    max_vendor_id,
                },
            )
        }
    };

    if let Err(e) = e {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn setup_logging() {
    let main_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(main_layer)
        .init()
}

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

fn decode_consent_string(s: &str) -> Result<(), Box<dyn std::error::Error>> {
    print_json(&Consent::from_str(s)?)
}

fn decode_raw_fields(s: &str) -> Result<(), Box<dyn std::error::Error>> {
    print_json(&decode_from_base64(s)?)
}

fn decode_metadata(s: &str) -> Result<(), Box<dyn std::error::Error>> {
    print_json(&decode_metadata_string(s)?)
}

fn encode(vendor_list: &Path, data: ConsentData) -> Result<(), Box<dyn std::error::Error>> {
    let f = File::open(vendor_list)?;
    let vendor_list: VendorList = serde_json::from_reader(BufReader::new(f))?;
    info!(
        version = vendor_list.vendor_list_version,
        vendors = vendor_list.vendors.len(),
        "loaded vendor list"
    );

    println!("{}", encode_consent_string(&vendor_list, &data)?);

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!(
        "{}",
        serde_json::to_string_pretty(value)?
            .to_colored_json_with_styler(ColorMode::Auto(Output::StdOut), json_color_styler())?
    );

    Ok(())
}

fn json_color_styler() -> Styler {
    Styler {
        key: Color::Green.foreground(),
        string_value: Color::Blue.bold(),
        integer_value: Color::Magenta.bold(),
        float_value: Color::Magenta.italic(),
        object_brackets: Color::Yellow.bold(),
        array_brackets: Color::Cyan.bold(),
        ..Default::default()
    }
}
