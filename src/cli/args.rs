use clap::{ArgAction, Parser};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "dirforcer",
    version,
    about = "concurrent web content discovery tool",
    long_about = "dirforcer probes a web server for paths from a wordlist and reports the ones answering with interesting status codes.\n\nExamples:\n  dirforcer -u example.com -w directories.txt\n  dirforcer -u https://example.com -w wordlist.txt -t 20 -o results.json\n  dirforcer -u example.com -w common.txt --delay 0.1 --status-codes 200,403\n\nTip: Use --config to persist scan settings and keep CLI invocations short."
)]
pub struct CliArgs {
    #[arg(
        short = 'u',
        long = "url",
        visible_alias = "domain",
        value_name = "URL",
        help_heading = "Input",
        help = "Target base URL (scheme defaults to http://)."
    )]
    pub url: Option<String>,

    #[arg(
        short = 'w',
        long = "wordlist",
        value_name = "FILE",
        help_heading = "Input",
        help = "Wordlist file path (one path per line, '#' comments ignored)."
    )]
    pub wordlist: Option<String>,

    #[arg(
        short = 'C',
        long = "config",
        value_name = "FILE",
        help_heading = "Input",
        help = "Path to config file (defaults to ~/.dirforcer/config.yml)."
    )]
    pub config: Option<String>,

    #[arg(
        long = "init-config",
        help_heading = "Input",
        help = "Write a default config file to the config path and exit."
    )]
    pub init_config: bool,

    #[arg(
        short = 't',
        long = "threads",
        visible_alias = "concurrency",
        value_name = "N",
        help_heading = "Performance",
        help = "Number of concurrent workers (default: 10)."
    )]
    pub threads: Option<usize>,

    #[arg(
        long = "delay",
        value_name = "SECONDS",
        help_heading = "Performance",
        help = "Delay each worker sleeps before every request (default: 0)."
    )]
    pub delay: Option<f64>,

    #[arg(
        short = 'r',
        long = "rate",
        value_name = "RPS",
        help_heading = "Performance",
        help = "Global request rate limit (requests per second, default: unlimited)."
    )]
    pub rate: Option<u32>,

    #[arg(
        long = "workers",
        value_name = "N",
        help_heading = "Performance",
        help = "Number of runtime worker threads (default: 10)."
    )]
    pub workers: Option<usize>,

    #[arg(
        long = "progress-every",
        value_name = "N",
        help_heading = "Performance",
        help = "Update progress every N dispatched candidates (default: 10)."
    )]
    pub progress_every: Option<usize>,

    #[arg(
        short = 'T',
        long = "timeout",
        value_name = "SECONDS",
        help_heading = "HTTP",
        help = "Per-request timeout in seconds (default: 10)."
    )]
    pub timeout: Option<u64>,

    #[arg(
        long = "user-agent",
        value_name = "UA",
        help_heading = "HTTP",
        help = "Custom User-Agent header."
    )]
    pub user_agent: Option<String>,

    #[arg(
        short = 'k',
        long = "no-tls-verify",
        visible_alias = "no-ssl-verify",
        help_heading = "HTTP",
        help = "Do not verify TLS certificates."
    )]
    pub no_tls_verify: bool,

    #[arg(
        short = 's',
        long = "status-codes",
        value_name = "CODES",
        help_heading = "Matching",
        help = "Status codes considered a match (comma-separated, default: 200,301,302,403,401)."
    )]
    pub status_codes: Option<String>,

    #[arg(
        short = 'o',
        long = "output",
        value_name = "FILE",
        help_heading = "Output",
        help = "Write results to a file."
    )]
    pub output: Option<String>,

    #[arg(
        long = "output-format",
        value_name = "FORMAT",
        help_heading = "Output",
        help = "Output format (text or json, inferred from the file extension)."
    )]
    pub output_format: Option<String>,

    #[arg(
        short = 'v',
        long = "verbose",
        action = ArgAction::Count,
        help_heading = "Output",
        help = "Increase diagnostic verbosity (-v, -vv)."
    )]
    pub verbose: u8,

    #[arg(
        long = "log-file",
        value_name = "FILE",
        help_heading = "Output",
        help = "Append diagnostics to this file instead of stderr."
    )]
    pub log_file: Option<String>,

    #[arg(
        short = 'n',
        long = "no-color",
        help_heading = "Output",
        help = "Disable colored output."
    )]
    pub no_color: bool,
}
