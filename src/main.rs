fn main() {
    if let Err(e) = diabetes_screening_lib::run() {
        tracing::error!("Startup failed: {e}");
        eprintln!("diabetes-screening: {e}");
        std::process::exit(1);
    }
}
