//! Command-line front end: run one script the way the playground does.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::json;

use scriptpad::{EngineConfig, ExecutionRequest, ScriptEngine, Verdict, compare};

#[derive(Parser, Debug)]
#[command(name = "scriptpad", version, about = "Run a script through its interpreter and print the output")]
struct Cli {
    /// Script file to run
    #[arg(required_unless_present = "interpreters")]
    script: Option<PathBuf>,

    /// Language name (inferred from the file extension when omitted)
    #[arg(short, long)]
    lang: Option<String>,

    /// File whose contents are fed to the script's standard input
    #[arg(short = 'i', long)]
    stdin: Option<PathBuf>,

    /// File holding the expected output; prints a verdict and exits 1 on mismatch
    #[arg(short, long)]
    expected: Option<PathBuf>,

    /// Keep ANSI color sequences in the output
    #[arg(long)]
    color: bool,

    /// Print the full execution report as JSON
    #[arg(long)]
    json: bool,

    /// Override the execution deadline in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// List interpreter locations and exit
    #[arg(long)]
    interpreters: bool,
}

fn load_config(cli: &Cli) -> Result<EngineConfig> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    }
    .apply_env();

    if let Some(ms) = cli.timeout_ms {
        config.timeout_ms = ms;
    }
    config.validate()?;
    Ok(config)
}

fn read(path: &Path, what: &str) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {what} {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let engine = ScriptEngine::new(&config)?;
    let _ = engine.start();

    if cli.interpreters {
        for resolved in engine.locator().resolved().await {
            match resolved.path {
                Some(path) => println!("{}\t{}", resolved.command, path.display()),
                None => println!("{}\tnot found", resolved.command),
            }
        }
        return Ok(ExitCode::SUCCESS);
    }

    let Some(script_path) = cli.script.as_deref() else {
        anyhow::bail!("no script given");
    };
    let script = read(script_path, "script")?;
    let stdin = match &cli.stdin {
        Some(path) => read(path, "stdin file")?,
        None => String::new(),
    };

    let language = cli.lang.clone().unwrap_or_else(|| {
        let extension = script_path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();
        engine
            .registry()
            .by_extension(&extension)
            .map(|spec| spec.name.clone())
            .unwrap_or(extension)
    });

    let request = ExecutionRequest::new(language, script)
        .with_stdin(stdin)
        .with_color(cli.color);
    let report = engine.execute(&request).await;

    let verdict = match &cli.expected {
        Some(path) => Some(compare(&report.text(), &read(path, "expected output")?)),
        None => None,
    };

    if cli.json {
        let document = json!({ "report": report, "verdict": verdict });
        println!("{}", serde_json::to_string_pretty(&document)?);
    } else {
        println!("{}", report.text());
        match &verdict {
            Some(Verdict::Match) => eprintln!("PASS"),
            Some(Verdict::Mismatch {
                line,
                expected,
                actual,
            }) => eprintln!("FAIL at line {line}: expected {expected:?}, got {actual:?}"),
            None => {}
        }
    }

    let code = match (&verdict, report.outcome.is_output()) {
        (Some(Verdict::Mismatch { .. }), _) => ExitCode::from(1),
        (_, false) => ExitCode::from(2),
        _ => ExitCode::SUCCESS,
    };
    Ok(code)
}
