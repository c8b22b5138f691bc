//! `mbook` subcommands: run, request, validate.

use std::io::Read;
use std::path::{Path, PathBuf};

use clap::Subcommand;

use matchbook_cli::{export, load};
use matchbook_recon::{handle_request, reconcile, ReconError, ReconResult, RuleConfig};

use crate::exit_codes::{EXIT_RECON_INVALID_CONFIG, EXIT_RECON_RUNTIME, EXIT_RECON_UNMATCHED};
use crate::CliError;

#[derive(Subcommand)]
pub enum ReconCommands {
    /// Reconcile two sources of delimited records
    #[command(after_help = "\
Examples:
  mbook run --source1 ledger.csv --source2 bank.csv
  mbook run --source1 ledger.csv --source2 bank.tsv --rules rules.toml --json
  mbook run --source1 jan.csv --source1 feb.csv --source2 bank.csv --export out/
  mbook run --source1 a.csv --source2 b.csv --rules rules.json --allow-unmatched")]
    Run {
        /// Source 1 file(s); repeat to concatenate
        #[arg(long = "source1", required = true, num_args = 1..)]
        source1: Vec<PathBuf>,

        /// Source 2 file(s); repeat to concatenate
        #[arg(long = "source2", required = true, num_args = 1..)]
        source2: Vec<PathBuf>,

        /// Rules file (.toml, otherwise JSON). Defaults apply when omitted.
        #[arg(long)]
        rules: Option<PathBuf>,

        /// Output JSON result to stdout
        #[arg(long)]
        json: bool,

        /// Write JSON result to file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Write matched / unmatched / exception / summary files into this directory
        #[arg(long)]
        export: Option<PathBuf>,

        /// Field delimiter (default: tab for .tsv/.tab, comma otherwise)
        #[arg(long)]
        delimiter: Option<char>,

        /// Exit 0 even when unmatched rows or exceptions remain
        #[arg(long)]
        allow_unmatched: bool,
    },

    /// Evaluate a JSON request body {source1, source2, rules}
    #[command(after_help = "\
Examples:
  mbook request body.json
  cat body.json | mbook request -
  mbook request body.json --output result.json")]
    Request {
        /// Request file, or - for stdin
        input: PathBuf,

        /// Write JSON result to file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Parse and validate a rules file without running
    #[command(after_help = "\
Examples:
  mbook validate rules.toml
  mbook validate rules.json")]
    Validate {
        /// Rules file (.toml, otherwise JSON)
        rules: PathBuf,
    },
}

pub fn cmd_recon(cmd: ReconCommands) -> Result<(), CliError> {
    match cmd {
        ReconCommands::Run {
            source1,
            source2,
            rules,
            json,
            output,
            export,
            delimiter,
            allow_unmatched,
        } => cmd_run(RunArgs {
            source1,
            source2,
            rules,
            json,
            output,
            export,
            delimiter,
            allow_unmatched,
        }),
        ReconCommands::Request { input, output } => cmd_request(input, output),
        ReconCommands::Validate { rules } => cmd_validate(rules),
    }
}

struct RunArgs {
    source1: Vec<PathBuf>,
    source2: Vec<PathBuf>,
    rules: Option<PathBuf>,
    json: bool,
    output: Option<PathBuf>,
    export: Option<PathBuf>,
    delimiter: Option<char>,
    allow_unmatched: bool,
}

fn recon_err(code: u8, msg: impl Into<String>) -> CliError {
    CliError { code, message: msg.into(), hint: None }
}

fn runtime_err(err: ReconError) -> CliError {
    recon_err(EXIT_RECON_RUNTIME, err.to_string())
}

/// Read a rules file, picking TOML or JSON by extension.
fn load_rules(path: &Path) -> Result<RuleConfig, CliError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| recon_err(EXIT_RECON_RUNTIME, format!("cannot read rules: {e}")))?;

    let is_toml = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("toml"));

    let parsed = if is_toml {
        RuleConfig::from_toml(&text)
    } else {
        RuleConfig::from_json(&text)
    };

    parsed.map_err(|e| {
        recon_err(EXIT_RECON_INVALID_CONFIG, format!("{}: {e}", path.display()))
            .with_hint("rule names are camelCase: keys, amountTolerance, amountField, fuzzyField, fuzzyThreshold, groupBy")
    })
}

fn delimiter_byte(delimiter: Option<char>) -> Result<Option<u8>, CliError> {
    match delimiter {
        None => Ok(None),
        Some(c) if c.is_ascii() => Ok(Some(c as u8)),
        Some(c) => Err(CliError::args(format!("delimiter must be a single ASCII character, got {c:?}"))),
    }
}

fn write_json_output(result: &ReconResult, json: bool, output: Option<&Path>) -> Result<(), CliError> {
    let json_str = serde_json::to_string_pretty(result)
        .map_err(|e| recon_err(EXIT_RECON_RUNTIME, format!("JSON serialization error: {e}")))?;

    if let Some(path) = output {
        std::fs::write(path, &json_str)
            .map_err(|e| recon_err(EXIT_RECON_RUNTIME, format!("cannot write output: {e}")))?;
        eprintln!("wrote {}", path.display());
    }

    if json {
        println!("{json_str}");
    }
    Ok(())
}

fn cmd_run(args: RunArgs) -> Result<(), CliError> {
    let rules = match &args.rules {
        Some(path) => load_rules(path)?,
        None => RuleConfig::default(),
    };
    let delimiter = delimiter_byte(args.delimiter)?;

    let source1 = load::load_source(&args.source1, delimiter).map_err(runtime_err)?;
    let source2 = load::load_source(&args.source2, delimiter).map_err(runtime_err)?;

    let result = reconcile(&source1, &source2, &rules);

    write_json_output(&result, args.json, args.output.as_deref())?;

    if let Some(dir) = &args.export {
        export::export_result(&result, dir).map_err(runtime_err)?;
        eprintln!("exported to {}", dir.display());
    }

    // Human summary to stderr
    let s = &result.summary;
    eprintln!(
        "recon: {} vs {} rows, {} matched ({}%), {} unmatched in source 1, {} unmatched in source 2, {} exceptions",
        s.total1, s.total2, s.matched, s.match_rate, s.unmatched1, s.unmatched2, s.exceptions,
    );
    let off = result.group_summary.iter().filter(|g| !g.within_tolerance).count();
    if !result.group_summary.is_empty() {
        eprintln!("groups: {} total, {} outside tolerance", result.group_summary.len(), off);
    }

    if result.is_clean() || args.allow_unmatched {
        return Ok(());
    }
    Err(recon_err(EXIT_RECON_UNMATCHED, "unmatched rows or exceptions found")
        .with_hint("pass --allow-unmatched to exit 0 regardless"))
}

fn cmd_request(input: PathBuf, output: Option<PathBuf>) -> Result<(), CliError> {
    let body = if input.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| recon_err(EXIT_RECON_RUNTIME, format!("cannot read stdin: {e}")))?;
        buf
    } else {
        std::fs::read_to_string(&input)
            .map_err(|e| recon_err(EXIT_RECON_RUNTIME, format!("cannot read {}: {e}", input.display())))?
    };

    match handle_request(&body) {
        Ok(result) => write_json_output(&result, output.is_none(), output.as_deref()),
        Err(response) => {
            let json_str = serde_json::to_string_pretty(&response)
                .map_err(|e| recon_err(EXIT_RECON_RUNTIME, format!("JSON serialization error: {e}")))?;
            println!("{json_str}");
            log::warn!("request rejected: {}", response.details);
            // Response body already describes the failure.
            Err(recon_err(EXIT_RECON_RUNTIME, ""))
        }
    }
}

fn cmd_validate(rules_path: PathBuf) -> Result<(), CliError> {
    let rules = load_rules(&rules_path)?;
    log::info!(
        "{} key(s), fuzzy on {}, {} group field(s)",
        rules.keys.len(),
        rules.fuzzy_field().unwrap_or("-"),
        rules.group_by.len(),
    );
    println!("ok");
    Ok(())
}
