//! Command-line entry point for the SHACL ⇄ ShEx translator.
//!
//! Three modes, mirroring the dataset workflow:
//! - single file:   `shaclex -i shape.ttl -d shacl2shex [-o shape.shex]`
//! - directory:     `shaclex --input-dir DIR --output-dir DIR -d DIRECTION`
//! - batch:         `shaclex --batch` (both directions over the dataset pair)

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{CommandFactory, Parser, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use tracing_subscriber::FmtSubscriber;
use tracing_subscriber::filter::EnvFilter;

use shaclex::Error;

const BATCH_SHACL_DIR: &str = "dataset/shacl_yago";
const BATCH_SHEX_DIR: &str = "dataset/shex_yago";
const BATCH_SHACL_OUT: &str = "shacl_to_shex";
const BATCH_SHEX_OUT: &str = "shex_to_shacl";

#[derive(Parser, Debug)]
#[command(author, version, about = "SHACL <-> ShEx shape translator", long_about = None)]
struct Cli {
    #[clap(flatten)]
    verbose: Verbosity<WarnLevel>,

    /// Input file path
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output file path (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Conversion direction
    #[arg(short, long, value_enum)]
    direction: Option<Direction>,

    /// Input directory for directory conversion
    #[arg(long)]
    input_dir: Option<PathBuf>,

    /// Output directory for directory conversion
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Run the full dataset conversion in both directions
    #[arg(long)]
    batch: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Direction {
    #[value(name = "shacl2shex")]
    Shacl2Shex,
    #[value(name = "shex2shacl")]
    Shex2Shacl,
    /// Emit the canonical JSON form of a SHACL file
    #[value(name = "shacl2json")]
    Shacl2Json,
    /// Emit the canonical JSON form of a ShEx file
    #[value(name = "shex2json")]
    Shex2Json,
}

impl Direction {
    fn extensions(self) -> (&'static str, &'static str) {
        match self {
            Direction::Shacl2Shex => (".ttl", ".shex"),
            Direction::Shex2Shacl => (".shex", ".ttl"),
            Direction::Shacl2Json => (".ttl", ".json"),
            Direction::Shex2Json => (".shex", ".json"),
        }
    }

    fn convert(self, text: &str) -> Result<String, Error> {
        match self {
            Direction::Shacl2Shex => shaclex::shacl_text_to_shex(text),
            Direction::Shex2Shacl => shaclex::shex_text_to_shacl(text),
            Direction::Shacl2Json => shaclex::shacl_text_to_canonical_json(text),
            Direction::Shex2Json => shaclex::shex_text_to_canonical_json(text),
        }
    }
}

/// Convert one file; the result is also written to `output` when given.
fn convert_file(input: &Path, direction: Direction, output: Option<&Path>) -> Result<String, Error> {
    let text = fs::read_to_string(input)?;
    let result = direction.convert(&text)?;
    if let Some(path) = output {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, &result)?;
    }
    Ok(result)
}

/// Convert every matching file in a directory. Per-file failures are
/// reported and counted; the run continues.
fn convert_dir(
    input_dir: &Path,
    output_dir: &Path,
    direction: Direction,
) -> Result<(usize, usize), Error> {
    fs::create_dir_all(output_dir)?;
    let (ext_in, ext_out) = direction.extensions();

    let mut filenames: Vec<String> = fs::read_dir(input_dir)?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name.ends_with(ext_in))
        .collect();
    filenames.sort();

    let mut ok = 0;
    let mut fail = 0;
    for filename in filenames {
        let input_path = input_dir.join(&filename);
        let output_name = format!("{}{ext_out}", filename.strip_suffix(ext_in).unwrap_or(&filename));
        let output_path = output_dir.join(&output_name);

        match convert_file(&input_path, direction, Some(&output_path)) {
            Ok(_) => {
                println!("  OK  {filename} -> {output_name}");
                ok += 1;
            }
            Err(e) => {
                println!("  FAIL {filename}: {e}");
                fail += 1;
            }
        }
    }
    Ok((ok, fail))
}

/// Both directions over the fixed dataset directory pair.
fn run_batch() -> Result<(), Error> {
    let banner = "=".repeat(60);

    println!("{banner}");
    println!("SHACL -> ShEx ({BATCH_SHACL_DIR} -> {BATCH_SHACL_OUT})");
    println!("{banner}");
    let (ok1, fail1) = convert_dir(
        Path::new(BATCH_SHACL_DIR),
        Path::new(BATCH_SHACL_OUT),
        Direction::Shacl2Shex,
    )?;
    println!("\nResult: {ok1} converted, {fail1} failed\n");

    println!("{banner}");
    println!("ShEx -> SHACL ({BATCH_SHEX_DIR} -> {BATCH_SHEX_OUT})");
    println!("{banner}");
    let (ok2, fail2) = convert_dir(
        Path::new(BATCH_SHEX_DIR),
        Path::new(BATCH_SHEX_OUT),
        Direction::Shex2Shacl,
    )?;
    println!("\nResult: {ok2} converted, {fail2} failed\n");

    println!("{banner}");
    println!(
        "TOTAL: {} converted, {} failed",
        ok1 + ok2,
        fail1 + fail2
    );
    println!("{banner}");
    Ok(())
}

fn init_logging(verbosity: &Verbosity<WarnLevel>) {
    let filter = EnvFilter::from_default_env()
        .add_directive(
            format!("shaclex={}", verbosity.log_level_filter())
                .parse()
                .expect("verbosity level is a valid directive"),
        );
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn run(cli: &Cli) -> Result<ExitCode, Error> {
    if cli.batch {
        run_batch()?;
        return Ok(ExitCode::SUCCESS);
    }

    if let (Some(input_dir), Some(output_dir), Some(direction)) =
        (&cli.input_dir, &cli.output_dir, cli.direction)
    {
        let (ok, fail) = convert_dir(input_dir, output_dir, direction)?;
        println!("\nConverted {ok} files, {fail} failed");
        return Ok(ExitCode::SUCCESS);
    }

    if let (Some(input), Some(direction)) = (&cli.input, cli.direction) {
        let result = convert_file(input, direction, cli.output.as_deref())?;
        if cli.output.is_none() {
            println!("{result}");
        }
        return Ok(ExitCode::SUCCESS);
    }

    // No valid mode selected: show usage, fail the invocation.
    let _ = Cli::command().print_help();
    Ok(ExitCode::FAILURE)
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            use clap::error::ErrorKind;
            let kind = e.kind();
            let _ = e.print();
            return if matches!(kind, ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            };
        }
    };

    init_logging(&cli.verbose);

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
