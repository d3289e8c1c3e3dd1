fn main() {
    if let Err(e) = dirforcer::app::run_cli() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
