use std::sync::Arc;

use pagetopdf_lib::ProgressCallback;

/// Progress printer for the capture stages; `None` when quiet.
pub fn stderr_progress(quiet: bool) -> Option<ProgressCallback> {
    if quiet {
        None
    } else {
        Some(Arc::new(|msg: &str| eprintln!("{msg}")))
    }
}

/// Installs the logger. `RUST_LOG` wins over the `--verbose` default.
pub fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "warn,pagetopdf_lib=debug,pagetopdf=debug"
    } else {
        "warn"
    };
    let _ = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_filter),
    )
    .format_timestamp(None)
    .try_init();
}
