use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use clap::{error::ErrorKind, Parser};
use colored::Colorize;
use log::LevelFilter;

use crate::cli::args::CliArgs;
use crate::cli::validation;
use crate::config::{self, ConfigFile};
use crate::output::console::ConsoleSink;
use crate::output::{self, OutputFormat};
use crate::probe::DEFAULT_USER_AGENT;
use crate::runner::{
    Runner, ScanConfig, ScanError, ScanState, DEFAULT_CONCURRENCY, DEFAULT_PROGRESS_EVERY,
    DEFAULT_STATUS_CODES, DEFAULT_TIMEOUT_SECONDS,
};
use crate::{target, utils};

const DEFAULT_WORKERS: usize = 10;

fn print_banner() {
    const BANNER: &str = r#"
       ___      ____
  ____/ (_)____/ __/___  _____________  _____
 / __  / / ___/ /_/ __ \/ ___/ ___/ _ \/ ___/
/ /_/ / / /  / __/ /_/ / /  / /__/  __/ /
\__,_/_/_/  /_/  \____/_/   \___/\___/_/
"#;
    print!("{}", BANNER.bold().cyan());
    println!(
        "       v{} - web content discovery",
        env!("CARGO_PKG_VERSION")
    );
    println!();
}

fn format_kv_line(label: &str, value: &str) {
    println!(":: {:<10}: {}", label, value);
}

fn format_bool(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}

#[derive(Clone, Debug)]
struct RunConfig {
    url: String,
    wordlist_path: String,
    scan: ScanConfig,
    workers: usize,
    output: Option<String>,
    output_format: OutputFormat,
    verbose: u8,
    log_file: Option<String>,
    no_color: bool,
}

fn positive(name: &str, value: usize) -> Result<usize, String> {
    if value == 0 {
        return Err(format!("invalid {name}, expected positive integer"));
    }
    Ok(value)
}

fn build_run_config(args: CliArgs, cfg: ConfigFile) -> Result<RunConfig, String> {
    validation::validate(&args)?;

    let url = args
        .url
        .or(cfg.url)
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .ok_or_else(|| "a target URL is required (--url)".to_string())?;
    let wordlist_path = args
        .wordlist
        .or(cfg.wordlist)
        .map(|p| config::expand_tilde_string(p.trim()))
        .filter(|p| !p.is_empty())
        .ok_or_else(|| "a wordlist is required (--wordlist)".to_string())?;

    let concurrency = positive(
        "threads",
        args.threads.or(cfg.threads).unwrap_or(DEFAULT_CONCURRENCY),
    )?;
    let workers = positive("workers", args.workers.or(cfg.workers).unwrap_or(DEFAULT_WORKERS))?;
    let progress_every = positive(
        "progress-every",
        args.progress_every
            .or(cfg.progress_every)
            .unwrap_or(DEFAULT_PROGRESS_EVERY),
    )?;

    let delay = utils::parse_delay_seconds(args.delay.or(cfg.delay).unwrap_or(0.0))?;
    let timeout_seconds = args.timeout.or(cfg.timeout).unwrap_or(DEFAULT_TIMEOUT_SECONDS);
    if timeout_seconds == 0 {
        return Err("invalid timeout, expected positive integer".to_string());
    }
    let rate = args.rate.or(cfg.rate);
    if rate == Some(0) {
        return Err("invalid rate, expected positive integer".to_string());
    }

    let user_agent = args
        .user_agent
        .or(cfg.user_agent)
        .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());
    let verify_tls = !args.no_tls_verify && cfg.verify_tls.unwrap_or(true);

    let match_status_codes = match (args.status_codes, cfg.status_codes) {
        (Some(raw), _) => utils::parse_u16_set_csv(&raw)
            .map_err(|e| format!("invalid --status-codes '{raw}': {e}"))?,
        (None, Some(codes)) => codes
            .to_set()
            .map_err(|e| format!("invalid status_codes in config: {e}"))?,
        (None, None) => DEFAULT_STATUS_CODES.into_iter().collect(),
    };

    let output = args
        .output
        .or(cfg.output)
        .map(|p| config::expand_tilde_string(&p));
    let output_format = match args.output_format.or(cfg.output_format) {
        Some(raw) => OutputFormat::parse(&raw)
            .ok_or_else(|| format!("invalid output format '{raw}', expected text or json"))?,
        None => output
            .as_deref()
            .and_then(output::infer_format_from_path)
            .unwrap_or(OutputFormat::Json),
    };

    let log_file = args
        .log_file
        .or(cfg.log_file)
        .map(|p| config::expand_tilde_string(&p));
    let no_color = args.no_color || cfg.no_color.unwrap_or(false);

    Ok(RunConfig {
        url,
        wordlist_path,
        scan: ScanConfig {
            concurrency,
            delay,
            timeout: Duration::from_secs(timeout_seconds),
            verify_tls,
            user_agent,
            match_status_codes,
            progress_every,
            rate,
        },
        workers,
        output,
        output_format,
        verbose: args.verbose,
        log_file,
        no_color,
    })
}

fn init_logging(verbose: u8, log_file: Option<&str>) -> Result<(), String> {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };

    let mut builder = env_logger::Builder::new();
    builder.filter_level(level).parse_default_env();

    if let Some(path) = log_file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| format!("failed to open log file '{path}': {e}"))?;
        builder
            .format(|buf, record| {
                writeln!(
                    buf,
                    "{} [{}] {} - {}",
                    chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                    record.level(),
                    record.target(),
                    record.args()
                )
            })
            .target(env_logger::Target::Pipe(Box::new(file)));
    }

    builder
        .try_init()
        .map_err(|e| format!("failed to initialize logging: {e}"))
}

async fn run_async(run: RunConfig) -> Result<(), String> {
    if run.no_color {
        colored::control::set_override(false);
    }
    print_banner();

    let target = target::normalize(&run.url).map_err(|e| e.to_string())?;
    let wordlist = utils::load_wordlist(&run.wordlist_path)
        .await
        .map_err(|e| e.to_string())?;
    if wordlist.is_empty() {
        return Err(ScanError::EmptyWordlist.to_string());
    }

    format_kv_line("Target", target.as_str());
    format_kv_line(
        "Wordlist",
        &format!("{} ({} entries)", run.wordlist_path, wordlist.len()),
    );
    format_kv_line(
        "HTTP",
        &format!(
            "threads={} delay={}s timeout={}s rate={} tls-verify={}",
            run.scan.concurrency,
            run.scan.delay.as_secs_f64(),
            run.scan.timeout.as_secs(),
            run.scan
                .rate
                .map(|r| format!("{r}/s"))
                .unwrap_or_else(|| "unlimited".to_string()),
            format_bool(run.scan.verify_tls),
        ),
    );
    format_kv_line(
        "Match",
        &utils::format_status_codes(&run.scan.match_status_codes),
    );
    println!();

    let runner = Runner::new(run.scan.clone()).map_err(|e| e.to_string())?;
    let sink = Arc::new(ConsoleSink::new(wordlist.len())?);

    let cancel = runner.cancellation_token();
    let interrupt_sink = Arc::clone(&sink);
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt_sink.println(format!(
                "{}",
                "[!] interrupt received, finishing in-flight requests..."
                    .bold()
                    .yellow()
            ));
            cancel.cancel();
        }
    });

    let result = runner.run(&target, wordlist, sink.clone()).await;
    interrupt.abort();
    let summary = result.map_err(|e| e.to_string())?;

    if let Some(path) = run.output.as_ref() {
        output::write_export(path, run.output_format, &summary)
            .await
            .map_err(|e| format!("failed to write output file '{path}': {e}"))?;
        println!();
        println!("{} {}", "results saved to:".bold().green(), path);
    }

    println!();
    match summary.state {
        ScanState::Cancelled => println!(
            ":: Cancelled :: scan stopped after {:.2}s ::",
            summary.elapsed_seconds()
        ),
        _ => println!(
            ":: Completed :: scan took {:.2}s ::",
            summary.elapsed_seconds()
        ),
    }
    Ok(())
}

pub fn run_cli() -> Result<(), String> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                print!("{e}");
                return Ok(());
            }
            _ => e.exit(),
        },
    };

    let explicit_config = args.config.clone().map(|p| config::expand_tilde(&p));
    let config_path = explicit_config.clone().or_else(config::default_config_path);

    if args.init_config {
        let path = config_path.ok_or_else(|| "could not determine config path".to_string())?;
        if config::ensure_default_config_file(&path)? {
            println!("created config file: {}", path.display());
        } else {
            println!("config file already exists: {}", path.display());
        }
        return Ok(());
    }

    let cfg = match (explicit_config.as_ref(), config_path.as_ref()) {
        (Some(path), _) => config::load_config(path, false)?,
        (None, Some(path)) => config::load_config(path, true)?,
        (None, None) => ConfigFile::default(),
    };

    let run = build_run_config(args, cfg)?;
    init_logging(run.verbose, run.log_file.as_deref())?;

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(run.workers)
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;

    rt.block_on(run_async(run))
}
