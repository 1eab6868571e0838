//! Logging initialization

/// Initialize the logging system
///
/// Uses env_logger with default filter level of `info`.
/// Override with the RUST_LOG environment variable.
///
/// # Example
/// ```no_run
/// macroquad_gridmap::logging::init();
/// log::info!("editor started");
/// ```
pub fn init() {
    // try_init: demos and tests may both call this
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}
