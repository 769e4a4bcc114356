mod alphabet;
mod config;
mod input;
mod plate;
mod search;
mod translit;

use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use alphabet::AlphabetTable;
use config::Config;
use input::PlateInput;
use plate::{DerivedPlateView, PlateSegment};
use search::RequestRecord;

#[derive(Parser, Debug)]
#[command(name = "platemap", about = "Arabic/Latin vehicle plate transliteration and search")]
struct Cli {
    /// Configuration file (default: <config dir>/platemap/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log debug diagnostics to stderr
    #[arg(long, short = 'v', global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a default configuration file
    Init(InitArgs),
    /// Filter raw input down to plate letters
    Letters(LettersArgs),
    /// Filter raw input down to plate (or phone) digits
    Digits(DigitsArgs),
    /// Show both halves of a plate
    Preview(PreviewArgs),
    /// Print the stored form of a plate
    Format(FormatArgs),
    /// Decompose a stored plate string
    Parse(ParseArgs),
    /// Edit a stored plate the way the request form does
    Edit(EditArgs),
    /// Search plates in either alphabet
    Search(SearchArgs),
    /// Show the effective alphabet
    Alphabet(AlphabetArgs),
}

#[derive(Args, Debug)]
struct InitArgs {
    /// Overwrite an existing configuration
    #[arg(long, default_value_t = false)]
    force: bool,
}

#[derive(Args, Debug)]
struct LettersArgs {
    input: String,

    /// Render the result the way the input field shows it ("a b c")
    #[arg(long, default_value_t = false)]
    spaced: bool,
}

#[derive(Args, Debug)]
struct DigitsArgs {
    input: String,

    /// Keep up to 10 digits instead of 4
    #[arg(long, default_value_t = false)]
    phone: bool,
}

#[derive(Args, Debug)]
struct PreviewArgs {
    letters: String,

    digits: Option<String>,

    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Args, Debug)]
struct FormatArgs {
    #[arg(required_unless_present = "chassis")]
    letters: Option<String>,

    digits: Option<String>,

    /// Store a chassis number instead of a plate
    #[arg(long, value_name = "VIN", conflicts_with_all = ["letters", "digits"])]
    chassis: Option<String>,
}

#[derive(Args, Debug)]
struct ParseArgs {
    stored: String,

    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Args, Debug)]
struct EditArgs {
    stored: String,

    /// New letters field content
    #[arg(long)]
    letters: Option<String>,

    /// New digits field content
    #[arg(long)]
    digits: Option<String>,

    /// Switch to chassis mode with this chassis number
    #[arg(long, value_name = "VIN", conflicts_with = "plate")]
    chassis: Option<String>,

    /// Switch back to a standard plate
    #[arg(long, default_value_t = false)]
    plate: bool,

    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Args, Debug)]
struct SearchArgs {
    term: String,

    /// Request list (JSON array) to search; defaults to `requests` from the config
    #[arg(long, value_name = "PATH")]
    requests: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Args, Debug)]
struct AlphabetArgs {
    /// Exit with an error if any two rules collide
    #[arg(long, default_value_t = false)]
    check: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Init(args) => handle_init(args, cli.config),
        Command::Digits(args) => handle_digits(args),
        Command::Parse(args) => handle_parse(args),
        Command::Letters(args) => {
            let (_, table) = load(cli.config)?;
            handle_letters(args, &table)
        }
        Command::Preview(args) => {
            let (_, table) = load(cli.config)?;
            handle_preview(args, &table)
        }
        Command::Format(args) => {
            let (_, table) = load(cli.config)?;
            handle_format(args, &table)
        }
        Command::Edit(args) => {
            let (_, table) = load(cli.config)?;
            handle_edit(args, &table)
        }
        Command::Search(args) => {
            let (config, table) = load(cli.config)?;
            handle_search(args, &config, &table)
        }
        Command::Alphabet(args) => {
            let (config, table) = load(cli.config)?;
            handle_alphabet(args, &config, &table)
        }
    }
}

fn load(explicit: Option<PathBuf>) -> Result<(Config, AlphabetTable)> {
    let config = config::load(explicit.as_deref())?;
    if let Some(path) = &config.config_path {
        tracing::debug!("loaded configuration from {}", path.display());
    }
    let table = config.alphabet.build_table()?;
    Ok((config, table))
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(std::io::stderr().is_terminal())
                .with_target(false),
        )
        .init();
}

fn handle_init(args: InitArgs, explicit: Option<PathBuf>) -> Result<()> {
    let path = match explicit {
        Some(path) => config::expand_tilde(&path),
        None => config::config_path()?,
    };
    config::write_default(&path, args.force)?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}

fn handle_letters(args: LettersArgs, table: &AlphabetTable) -> Result<()> {
    let letters = input::filter_letters(table, &args.input);
    if args.spaced {
        println!("{}", input::spaced(&letters));
    } else {
        println!("{}", letters);
    }
    Ok(())
}

fn handle_digits(args: DigitsArgs) -> Result<()> {
    let digits = if args.phone {
        input::filter_phone(&args.input)
    } else {
        input::filter_digits(&args.input, input::PLATE_DIGITS)
    };
    println!("{}", digits);
    Ok(())
}

#[derive(Serialize)]
struct PreviewOutput {
    #[serde(flatten)]
    view: DerivedPlateView,
    latin_display: String,
    badge: String,
    stored: String,
}

fn handle_preview(args: PreviewArgs, table: &AlphabetTable) -> Result<()> {
    let segment = PlateSegment::standard(
        table,
        &args.letters,
        args.digits.as_deref().unwrap_or_default(),
    );
    let view = segment.derive(table);

    if args.json {
        let output = PreviewOutput {
            latin_display: view.latin_display(),
            badge: view.badge(),
            stored: segment.to_stored(table),
            view,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if view.is_empty() {
        tracing::warn!("nothing to preview: no plate letters or digits in input");
    }

    println!("arabic letters: {}", view.arabic_letters);
    println!("latin letters:  {}", view.latin_letters);
    println!("latin display:  {}", view.latin_display());
    println!("arabic digits:  {}", view.arabic_digits);
    println!("latin digits:   {}", view.latin_digits);
    println!("badge:          {}", view.badge());
    Ok(())
}

fn handle_format(args: FormatArgs, table: &AlphabetTable) -> Result<()> {
    let mut plate = PlateInput::new();
    match (args.chassis, args.letters) {
        (Some(vin), _) => {
            if vin.trim().is_empty() {
                bail!("--chassis needs a non-empty chassis number");
            }
            plate.set_chassis(true);
            plate.set_vin(&vin);
        }
        (None, Some(letters)) => {
            plate.set_letters(table, &letters);
            plate.set_digits(args.digits.as_deref().unwrap_or_default());
        }
        (None, None) => bail!("either plate letters or --chassis is required"),
    }
    println!("{}", plate.to_stored(table));
    Ok(())
}

#[derive(Serialize)]
struct EditOutput {
    letters_field: String,
    digits_field: String,
    is_chassis: bool,
    vin: String,
    stored: String,
    badge: String,
}

fn handle_edit(args: EditArgs, table: &AlphabetTable) -> Result<()> {
    let mut plate = PlateInput::from_stored(&args.stored);

    if let Some(vin) = &args.chassis {
        plate.set_chassis(true);
        plate.set_vin(vin);
    } else if args.plate {
        plate.set_chassis(false);
    }
    if let Some(letters) = &args.letters {
        plate.set_letters(table, letters);
    }
    if let Some(digits) = &args.digits {
        plate.set_digits(digits);
    }

    let output = EditOutput {
        letters_field: plate.letters_buffer().to_string(),
        digits_field: plate.digits_buffer().to_string(),
        is_chassis: plate.is_chassis(),
        vin: plate.vin().to_string(),
        stored: plate.to_stored(table),
        badge: plate.preview(table).badge(),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if output.is_chassis {
        println!("chassis:       {}", output.vin);
    } else {
        println!("letters field: {}", output.letters_field);
        println!("digits field:  {}", output.digits_field);
        println!("badge:         {}", output.badge);
    }
    println!("stored:        {}", output.stored);
    Ok(())
}

fn handle_parse(args: ParseArgs) -> Result<()> {
    let segment = PlateSegment::parse(&args.stored);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&segment)?);
        return Ok(());
    }

    if segment.is_chassis {
        println!("kind:    chassis");
        println!("vin:     {}", segment.vin);
    } else {
        if segment.digits.is_empty() {
            tracing::warn!("no trailing digit group in `{}`; read as letters only", args.stored);
        }
        println!("kind:    standard");
        println!("letters: {}", segment.letters);
        println!("digits:  {}", segment.digits);
    }
    Ok(())
}

#[derive(Serialize)]
struct SearchOutput<'a> {
    variations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    matches: Option<Vec<&'a RequestRecord>>,
}

fn handle_search(args: SearchArgs, config: &Config, table: &AlphabetTable) -> Result<()> {
    let variations = search::variations(table, &args.term);

    let requests_path = args
        .requests
        .map(|p| config::expand_tilde(&p))
        .or_else(|| config.requests.clone());
    let records = match &requests_path {
        Some(path) => Some(search::load_requests(path)?),
        None => None,
    };
    let matches = records
        .as_deref()
        .map(|records| search::filter_requests(table, records, &args.term));

    if args.json {
        let output = SearchOutput {
            variations,
            matches,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if variations.is_empty() {
        println!("Empty search term");
        return Ok(());
    }
    for variation in &variations {
        println!("variation: {}", variation);
    }

    let Some(matches) = matches else {
        return Ok(());
    };

    if matches.is_empty() {
        println!("No requests match \"{}\"", args.term);
    } else {
        println!(
            "Found {} request(s) matching \"{}\"",
            matches.len(),
            args.term
        );
    }
    // id<TAB>plate<TAB>client
    for record in matches {
        println!(
            "{}\t{}\t{}",
            record.id,
            record.plate,
            record.client.as_deref().unwrap_or(" ")
        );
    }
    Ok(())
}

fn handle_alphabet(args: AlphabetArgs, config: &Config, table: &AlphabetTable) -> Result<()> {
    println!(
        "{} rule(s), on_duplicate = {}",
        table.len(),
        config.alphabet.on_duplicate.as_str()
    );
    for (index, rule) in table.rules().iter().enumerate() {
        println!("#{}\t{}\t{}", index, rule.normalized_arabic(), rule.latin);
    }

    if args.check {
        let duplicates = table.duplicates();
        for dup in &duplicates {
            println!(
                "duplicate {} letter `{}`: rules #{} and #{}",
                dup.side, dup.key, dup.first, dup.second
            );
        }
        if !duplicates.is_empty() {
            bail!("alphabet has {} duplicate rule(s)", duplicates.len());
        }
        println!("No duplicate rules");
    }
    Ok(())
}
