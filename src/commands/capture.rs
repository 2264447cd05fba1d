use std::process::ExitCode;
use std::time::Instant;

use pagetopdf_lib::output::PAGETOPDF_OUTPUT_VERSION;
use pagetopdf_lib::{capture_url, parse_page_url, CaptureError, CaptureOutput, CaptureResult};

use crate::cli::Cli;
use crate::formatting::{render_error, write_output};
use crate::progress::stderr_progress;
use crate::settings::{
    format_effective_config, load_config, resolve_settings, validate_settings, FlagSources,
};

/// Run a single capture and report it.
pub async fn run_capture(raw_args: &[String], cli: Cli) -> ExitCode {
    let format = cli.format;
    let report_path = cli.report.clone();

    let config = match load_config(cli.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(err) => return render_error(err, format, report_path),
    };
    let flag_sources = FlagSources::from_args(raw_args);
    let mut resolved = resolve_settings(&cli, &config, &flag_sources);
    if let Err(err) = validate_settings(&resolved) {
        return render_error(err, format, report_path);
    }

    if cli.verbose {
        eprintln!(
            "{}",
            format_effective_config(&resolved, cli.config.as_deref())
        );
    }

    let url = match parse_page_url(&cli.url) {
        Ok(url) => url,
        Err(err) => return render_error(CaptureError::from(err), format, report_path),
    };
    resolved.capture.progress = stderr_progress(cli.quiet);

    let started = Instant::now();
    let report = match capture_url(url.as_str(), &cli.out, &resolved.capture, resolved.browser)
        .await
    {
        Ok(report) => report,
        Err(err) => return render_error(err, format, report_path),
    };
    log::info!("wrote {} in {:?}", cli.out.display(), started.elapsed());

    let body = CaptureResult::Capture(CaptureOutput {
        version: PAGETOPDF_OUTPUT_VERSION.to_string(),
        url: url.to_string(),
        output_path: cli.out.clone(),
        viewport: resolved.capture.viewport,
        report,
        elapsed_ms: started.elapsed().as_millis() as u64,
    });

    if let Err(err) = write_output(&body, format, report_path.clone()) {
        return render_error(CaptureError::Config(err.to_string()), format, report_path);
    }

    ExitCode::SUCCESS
}
