use std::fmt::Write as FmtWrite;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use pagetopdf_lib::output::PAGETOPDF_OUTPUT_VERSION;
use pagetopdf_lib::{CaptureError, CaptureResult, ErrorOutput};

use crate::cli::OutputFormat;

/// Write output in the requested format.
pub fn write_output(
    body: &CaptureResult,
    format: OutputFormat,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Json => write_json_output(body, output.as_deref())?,
        OutputFormat::Pretty => write_pretty_output(body, output.as_deref())?,
    };
    Ok(())
}

/// Render an error and return the appropriate exit code.
pub fn render_error(err: CaptureError, format: OutputFormat, output: Option<PathBuf>) -> ExitCode {
    let error_payload = err.to_payload();
    let payload = CaptureResult::Error(ErrorOutput {
        version: PAGETOPDF_OUTPUT_VERSION.to_string(),
        message: Some(error_payload.message.clone()),
        error: error_payload,
    });

    match format {
        OutputFormat::Json => {
            let content =
                serde_json::to_string(&payload).unwrap_or_else(|_| "{\"mode\":\"error\"}".into());
            if let Some(path) = output {
                if let Err(write_err) = std::fs::write(&path, &content) {
                    eprintln!("Failed to write error output: {}", write_err);
                    println!("{content}");
                }
            } else {
                println!("{content}");
            }
        }
        OutputFormat::Pretty => {
            if let Err(write_err) = write_pretty_output(&payload, output.as_deref()) {
                eprintln!("Failed to write error output: {}", write_err);
            }
        }
    };

    ExitCode::from(2)
}

/// Write JSON output to file or stdout.
fn write_json_output(
    body: &CaptureResult,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let content = serde_json::to_string(body)?;
    if let Some(path) = output {
        std::fs::write(path, content)?;
    } else {
        println!("{content}");
    }
    Ok(())
}

/// Write pretty output to file or stdout.
fn write_pretty_output(body: &CaptureResult, output: Option<&Path>) -> io::Result<()> {
    let stdout_is_tty = std::io::stdout().is_terminal();
    let use_human = output.is_none() && stdout_is_tty;

    if use_human {
        let content = format_pretty(body, true);
        println!("{content}");
        return Ok(());
    }

    // Non-tty or file output: keep JSON shape for pipelines/files.
    let content =
        serde_json::to_string_pretty(body).unwrap_or_else(|_| "{\"mode\":\"error\"}".to_string());
    if let Some(path) = output {
        std::fs::write(path, &content)?;
    } else {
        println!("{content}");
    }
    Ok(())
}

/// Format output for human consumption in a terminal.
pub fn format_pretty(body: &CaptureResult, colorize: bool) -> String {
    match body {
        CaptureResult::Capture(out) => {
            let mut buf = String::new();
            let report = &out.report;
            let header = color("[PDF]", "32", colorize);
            writeln!(
                buf,
                "{} {} ({}x{})",
                header,
                out.output_path.display(),
                report.pdf_width,
                report.pdf_height
            )
            .ok();
            writeln!(buf, "Url: {}", out.url).ok();
            writeln!(
                buf,
                "Viewport: {}  Page: {}x{}",
                out.viewport, report.geometry.width, report.geometry.height
            )
            .ok();

            if let Some(check) = &report.endless_scroll {
                let verdict = if check.detected() {
                    color("detected", "33", colorize)
                } else {
                    "not detected".to_string()
                };
                writeln!(
                    buf,
                    "Endless scrolling: {} ({} -> {}px, network {})",
                    verdict, check.height_before, check.height_after, check.network_triggered
                )
                .ok();
            }
            if let Some(scroll) = &report.scroll_to {
                let ending = if scroll.timed_out { "timeout" } else { "reached" };
                writeln!(
                    buf,
                    "Scroll-to: {}px after {} step(s), {}",
                    scroll.height,
                    scroll.steps.len(),
                    ending
                )
                .ok();
            }
            if let Some(steps) = &report.step_scroll {
                writeln!(
                    buf,
                    "Step-scrolling: {} step(s) of {}px",
                    steps.steps, steps.step_height
                )
                .ok();
            }

            let mut passes: Vec<(&str, u32)> = Vec::new();
            if report.removed_fixed > 0 {
                passes.push(("fixed removed", report.removed_fixed));
            }
            if report.removed_layers > 0 {
                passes.push(("layers removed", report.removed_layers));
            }
            passes.push(("break rules", report.page_breaks_cleared));
            passes.push(("frozen", report.animations.frozen));
            if report.breakpoint > 0 {
                passes.push(("breakpoint", report.breakpoint));
            }
            writeln!(buf, "Passes:").ok();
            for (name, value) in passes {
                writeln!(buf, "- {:16} {}", name, value).ok();
            }
            writeln!(buf, "Elapsed: {}ms", out.elapsed_ms).ok();
            buf
        }
        CaptureResult::Error(out) => {
            let mut buf = String::new();
            let header = color("[ERROR]", "31", colorize);
            let message = out
                .message
                .as_deref()
                .unwrap_or_else(|| out.error.message.as_str());
            writeln!(buf, "{} {}", header, message).ok();
            if let Some(remediation) = &out.error.remediation {
                writeln!(buf, "Hint: {}", remediation).ok();
            }
            buf
        }
    }
}

/// Apply ANSI color codes when enabled.
fn color(text: &str, code: &str, colorize: bool) -> String {
    if colorize {
        format!("\x1b[{}m{}\x1b[0m", code, text)
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagetopdf_lib::capture::CaptureReport;
    use pagetopdf_lib::error::{ErrorCategory, ErrorPayload};
    use pagetopdf_lib::output::CaptureOutput;
    use pagetopdf_lib::prepare::{EndlessScrollCheck, FreezeReport, PageGeometry, StepReport};
    use pagetopdf_lib::Viewport;

    fn sample_output() -> CaptureResult {
        let geometry = PageGeometry {
            height: 6400,
            width: 1280,
        };
        CaptureResult::Capture(CaptureOutput {
            version: PAGETOPDF_OUTPUT_VERSION.to_string(),
            url: "https://example.com/feed".to_string(),
            output_path: PathBuf::from("feed.pdf"),
            viewport: Viewport::new(1280, 1080),
            report: CaptureReport {
                initial_geometry: geometry,
                geometry,
                endless_scroll: Some(EndlessScrollCheck {
                    height_before: 6400,
                    height_after: 6400,
                    network_triggered: true,
                }),
                scroll_to: None,
                step_scroll: Some(StepReport {
                    steps: 6,
                    step_height: 1080,
                    height: 6400,
                }),
                removed_fixed: 2,
                removed_layers: 0,
                page_breaks_cleared: 1,
                animations: FreezeReport {
                    frozen: 4,
                    skipped: 0,
                },
                breakpoint: 1440,
                pdf_width: 1450,
                pdf_height: 1080,
            },
            elapsed_ms: 8123,
        })
    }

    #[test]
    fn render_error_always_returns_fatal_exit_code() {
        let code = render_error(
            CaptureError::Config("boom".to_string()),
            OutputFormat::Json,
            None,
        );
        assert_eq!(code, ExitCode::from(2));
    }

    #[test]
    fn format_pretty_summarises_capture() {
        let pretty = format_pretty(&sample_output(), false);
        assert!(pretty.contains("[PDF] feed.pdf (1450x1080)"));
        assert!(pretty.contains("Endless scrolling: detected"));
        assert!(pretty.contains("Step-scrolling: 6 step(s) of 1080px"));
        assert!(pretty.contains("fixed removed") && pretty.contains('2'));
        assert!(!pretty.contains("layers removed"));
        assert!(pretty.contains("breakpoint") && pretty.contains("1440"));
        assert!(pretty.contains("Elapsed: 8123ms"));
    }

    #[test]
    fn format_pretty_handles_errors() {
        let output = CaptureResult::Error(ErrorOutput {
            version: PAGETOPDF_OUTPUT_VERSION.to_string(),
            message: Some("bad input".to_string()),
            error: ErrorPayload {
                category: ErrorCategory::Input,
                message: "bad input".to_string(),
                remediation: Some("check flags".to_string()),
            },
        });

        let pretty = format_pretty(&output, false);
        assert!(pretty.contains("[ERROR] bad input"));
        assert!(pretty.contains("Hint: check flags"));
    }

    #[test]
    fn json_report_is_written_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        write_output(&sample_output(), OutputFormat::Json, Some(path.clone())).unwrap();

        let written = std::fs::read_to_string(path).unwrap();
        assert!(written.contains("\"mode\":\"capture\""));
        assert!(written.contains("\"pdfWidth\":1450"));
    }
}
