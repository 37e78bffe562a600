fn main() {
    if let Err(err) = pattern_audit::run() {
        eprintln!("error: {err:#}");
        std::process::exit(pattern_audit::error::exit_code_for(&err));
    }
}
