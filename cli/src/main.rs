//! errchain CLI — render error chains and inspect the code registry.
//!
//! Usage:
//! ```bash
//! # Render the sample configuration-loading chain
//! errchain render --mode condensed
//!
//! # Same chain as a JSON report
//! errchain render --json
//!
//! # List registered codes, including an application code table
//! errchain codes --codes fixtures/codes/config-codes.json
//!
//! # Show one code
//! errchain code 108
//! ```

use std::env;
use std::fs;
use std::io;
use std::process;

use anyhow::{bail, Context};
use errchain_core::{codes, Code, Coder, ErrorStack, RenderMode, ResultExt};
use tracing_subscriber::EnvFilter;

const CONFIGURATION_NOT_VALID: Code = Code(1000);

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let result = match args[1].as_str() {
        "render" => cmd_render(&args[2..]),
        "codes" => cmd_codes(&args[2..]),
        "code" => cmd_code(&args[2..]),
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        "version" | "--version" | "-V" => {
            println!("errchain {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            print_usage();
            process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn print_usage() {
    println!("errchain {}", env!("CARGO_PKG_VERSION"));
    println!("Render error chains and inspect error codes\n");
    println!("USAGE:");
    println!("    errchain <COMMAND>\n");
    println!("COMMANDS:");
    println!("    render    Render the sample configuration-loading chain");
    println!("    codes     List registered error codes");
    println!("    code <N>  Show the metadata of one code");
    println!("    version   Print version");
    println!("    help      Print this help\n");
    println!("FLAGS:");
    println!("    --mode <MODE>     external | inline | condensed | verbose  [render]");
    println!("    --json            Output as JSON");
    println!("    --codes <FILE>    Load an extra JSON code table first");
}

struct Flags {
    mode: RenderMode,
    as_json: bool,
    positional: Vec<String>,
}

fn parse_flags(args: &[String]) -> anyhow::Result<Flags> {
    let mut flags = Flags {
        mode: RenderMode::External,
        as_json: false,
        positional: Vec::new(),
    };

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--mode" => {
                i += 1;
                let name = args.get(i).context("--mode needs a value")?;
                flags.mode = name.parse()?;
            }
            "--codes" => {
                i += 1;
                let path = args.get(i).context("--codes needs a file")?;
                let table = fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
                let count = codes()
                    .load_json(&table)
                    .with_context(|| format!("loading code table {path}"))?;
                tracing::info!(count, path = %path, "code table loaded");
            }
            "--json" => flags.as_json = true,
            flag if flag.starts_with("--") => bail!("unknown flag: {flag}"),
            value => flags.positional.push(value.to_owned()),
        }
        i += 1;
    }
    Ok(flags)
}

fn cmd_render(args: &[String]) -> anyhow::Result<()> {
    let flags = parse_flags(args)?;
    if codes().lookup(CONFIGURATION_NOT_VALID).is_none() {
        errchain_core::register(
            CONFIGURATION_NOT_VALID,
            errchain_core::CodeMeta::new("Configuration not valid", "the configuration is invalid", 500),
        );
    }

    let err = match load_config() {
        Ok(()) => return Ok(()),
        Err(err) => err,
    };

    if flags.as_json {
        println!("{}", serde_json::to_string_pretty(&err.report())?);
    } else {
        println!("{}", err.render(flags.mode));
        tracing::debug!(code = err.code().value(), status = err.http_status(), "rendered chain");
    }
    Ok(())
}

fn cmd_codes(args: &[String]) -> anyhow::Result<()> {
    let flags = parse_flags(args)?;
    let entries = codes().codes();

    if flags.as_json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!("{:>6}  {:>4}  {:<36}  INTERNAL", "CODE", "HTTP", "EXTERNAL");
    for entry in entries {
        println!(
            "{:>6}  {:>4}  {:<36}  {}",
            entry.code,
            entry.meta.http_status(),
            entry.meta.external,
            entry.meta.internal
        );
    }
    Ok(())
}

fn cmd_code(args: &[String]) -> anyhow::Result<()> {
    let flags = parse_flags(args)?;
    let raw = flags.positional.first().context("code <N> needs a code")?;
    let code = Code(raw.parse().with_context(|| format!("`{raw}` is not an integer code"))?);

    let Some(meta) = codes().lookup(code) else {
        bail!(errchain_core::new(Code::CODE_NOT_FOUND, format!("code {code} is not registered")));
    };

    if flags.as_json {
        println!("{}", serde_json::to_string_pretty(&meta)?);
    } else {
        println!("Code:     {code}");
        println!("External: {}", meta.external());
        println!("Internal: {}", meta.detail());
        println!("HTTP:     {}", meta.http_status());
    }
    Ok(())
}

// ─── Sample chain ─────────────────────────────────────────────────────────────

fn load_config() -> Result<(), ErrorStack> {
    decode_config().map_err(|err| {
        errchain_core::wrap(err, CONFIGURATION_NOT_VALID, "service configuration could not be loaded")
    })
}

fn decode_config() -> Result<(), ErrorStack> {
    read_config().map_err(|err| {
        errchain_core::wrap(err, Code::INVALID_JSON, "could not decode configuration data")
    })
}

fn read_config() -> Result<(), ErrorStack> {
    let eof = io::Error::new(io::ErrorKind::UnexpectedEof, "read: end of input");
    Err::<(), _>(eof).from_err(Code::UNKNOWN)
}
