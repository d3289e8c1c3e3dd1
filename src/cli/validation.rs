use crate::cli::args::CliArgs;

pub fn validate(args: &CliArgs) -> Result<(), String> {
    if args.threads == Some(0) {
        return Err("invalid threads, expected positive integer".to_string());
    }
    if args.workers == Some(0) {
        return Err("invalid workers, expected positive integer".to_string());
    }
    if args.progress_every == Some(0) {
        return Err("invalid progress-every, expected positive integer".to_string());
    }
    if args.rate == Some(0) {
        return Err("invalid rate, expected positive integer".to_string());
    }
    if args.timeout == Some(0) {
        return Err("invalid timeout, expected positive integer".to_string());
    }
    if let Some(delay) = args.delay {
        crate::utils::parse_delay_seconds(delay)?;
    }
    if let Some(raw) = args.status_codes.as_deref() {
        crate::utils::parse_u16_set_csv(raw)
            .map_err(|e| format!("invalid --status-codes '{raw}': {e}"))?;
    }
    if let Some(raw) = args.output_format.as_deref() {
        if crate::output::OutputFormat::parse(raw).is_none() {
            return Err(format!("invalid --output-format '{raw}', expected text or json"));
        }
    }
    Ok(())
}
