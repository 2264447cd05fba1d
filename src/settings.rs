use std::path::Path;
use std::time::Duration;

use pagetopdf_lib::{BrowserOptions, CaptureError, CaptureOptions, Config};

use crate::cli::Cli;

/// Tracks which CLI flags were explicitly provided vs. defaulted.
#[derive(Debug, Default)]
pub struct FlagSources {
    pub viewport_width: bool,
    pub viewport_height: bool,
    pub no_check_endless_scrolling: bool,
    pub scroll_to_timeout: bool,
    pub step_scrolling: bool,
    pub step_scrolling_pause: bool,
    pub wait: bool,
    pub remove_static: bool,
    pub remove_layers: bool,
    pub nav_timeout: bool,
    pub network_idle_timeout: bool,
}

impl FlagSources {
    pub fn from_args(args: &[String]) -> Self {
        Self {
            viewport_width: any_flag_present(args, &["--viewport-width", "--vw"]),
            viewport_height: any_flag_present(args, &["--viewport-height", "--vh"]),
            no_check_endless_scrolling: any_flag_present(
                args,
                &["--no-check-endless-scrolling", "--nes"],
            ),
            scroll_to_timeout: any_flag_present(args, &["--scroll-to-timeout", "--st"]),
            step_scrolling: any_flag_present(args, &["--step-scrolling", "--ss"]),
            step_scrolling_pause: any_flag_present(args, &["--step-scrolling-pause", "--ssp"]),
            wait: any_flag_present(args, &["--wait", "-w"]),
            remove_static: any_flag_present(args, &["--remove-static", "--rs"]),
            remove_layers: any_flag_present(args, &["--remove-layers", "--rl"]),
            nav_timeout: flag_present(args, "--nav-timeout"),
            network_idle_timeout: flag_present(args, "--network-idle-timeout"),
        }
    }
}

/// Checks if a flag was present in the command-line arguments.
///
/// Short flags also match their attached-value form (`-w500`).
pub fn flag_present(args: &[String], flag: &str) -> bool {
    let is_short = flag.len() == 2 && flag.starts_with('-') && !flag.starts_with("--");
    args.iter().any(|arg| {
        arg == flag
            || arg.starts_with(&format!("{flag}="))
            || (is_short && arg.starts_with(flag) && !arg.starts_with("--"))
    })
}

fn any_flag_present(args: &[String], flags: &[&str]) -> bool {
    flags.iter().any(|flag| flag_present(args, flag))
}

/// Resolved settings after merging CLI args and config file.
#[derive(Debug, Clone)]
pub struct ResolvedSettings {
    pub capture: CaptureOptions,
    pub browser: BrowserOptions,
}

/// Merge CLI arguments with config file, preferring CLI when flags are present.
pub fn resolve_settings(cli: &Cli, config: &Config, flags: &FlagSources) -> ResolvedSettings {
    let mut capture = config.capture_options();
    if flags.viewport_width {
        capture.viewport.width = cli.viewport_width;
    }
    if flags.viewport_height {
        capture.viewport.height = cli.viewport_height;
    }
    if flags.no_check_endless_scrolling {
        capture.check_endless_scrolling = false;
    }
    capture.scroll_to = cli.scroll_to;
    if flags.scroll_to_timeout {
        capture.scroll_to_timeout = Duration::from_millis(cli.scroll_to_timeout);
    }
    if flags.step_scrolling {
        capture.step_scrolling = true;
    }
    if flags.step_scrolling_pause {
        capture.step_scrolling_pause = Duration::from_millis(cli.step_scrolling_pause);
    }
    if flags.wait {
        capture.wait = Duration::from_millis(cli.wait);
    }
    if flags.remove_static {
        capture.remove_fixed = true;
    }
    if flags.remove_layers {
        capture.remove_layers = cli.remove_layers;
    }
    capture.full_page_height = cli.full_page_height;

    let mut browser = config.browser_options();
    if let Some(path) = &cli.chrome_path {
        browser.chrome_path = Some(path.clone());
    }
    if cli.headful {
        browser.headless = false;
    }
    if cli.no_sandbox {
        browser.no_sandbox = true;
    }
    if flags.nav_timeout {
        browser.navigation_timeout = Duration::from_secs(cli.nav_timeout);
    }
    if flags.network_idle_timeout {
        browser.network_idle_timeout = Duration::from_secs(cli.network_idle_timeout);
    }

    ResolvedSettings { capture, browser }
}

/// Rejects values that would make the capture meaningless.
pub fn validate_settings(settings: &ResolvedSettings) -> Result<(), CaptureError> {
    let viewport = settings.capture.viewport;
    if viewport.is_empty() {
        return Err(CaptureError::Config(format!(
            "viewport must be non-zero, got {viewport}"
        )));
    }
    if settings.capture.scroll_to.is_some() && settings.capture.scroll_to_timeout.is_zero() {
        return Err(CaptureError::Config(
            "scroll-to timeout must be greater than zero".to_string(),
        ));
    }
    if settings.browser.navigation_timeout.is_zero()
        || settings.browser.network_idle_timeout.is_zero()
    {
        return Err(CaptureError::Config(
            "navigation and network idle timeouts must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

/// Load config from a TOML file, central config, or return defaults.
/// Priority: explicit path > ~/.config/pagetopdf/config.toml > defaults
pub fn load_config(path: Option<&Path>) -> Result<Config, CaptureError> {
    let cfg = Config::load(path).map_err(|e| {
        let loc = path
            .map(|p| p.display().to_string())
            .or_else(|| Config::central_config_path().map(|p| p.display().to_string()))
            .unwrap_or_else(|| "defaults".to_string());
        CaptureError::Config(format!("Failed to read config {}: {}", loc, e))
    })?;

    cfg.validate().map_err(|e| {
        let prefix = path
            .map(|p| format!("Invalid config ({}): {}", p.display(), e))
            .unwrap_or_else(|| format!("Invalid config: {}", e));
        CaptureError::Config(prefix)
    })?;
    Ok(cfg)
}

/// Format effective settings as a single-line string.
pub fn format_effective_config(settings: &ResolvedSettings, config_source: Option<&Path>) -> String {
    let source = config_source
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "defaults".to_string());
    let capture = &settings.capture;
    let browser = &settings.browser;
    format!(
        "Effective config [{source}]: viewport={}, endless-check={}, scroll-to={}, scroll-to-timeout={}ms, step-scrolling={} (pause {}ms), wait={}ms, remove-fixed={}, remove-layers={}, timeouts: nav={}s, network-idle={}s, headless={}, no-sandbox={}",
        capture.viewport,
        capture.check_endless_scrolling,
        capture
            .scroll_to
            .map(|h| h.to_string())
            .unwrap_or_else(|| "off".to_string()),
        capture.scroll_to_timeout.as_millis(),
        capture.step_scrolling,
        capture.step_scrolling_pause.as_millis(),
        capture.wait.as_millis(),
        capture.remove_fixed,
        capture.remove_layers,
        browser.navigation_timeout.as_secs(),
        browser.network_idle_timeout.as_secs(),
        browser.headless,
        browser.no_sandbox,
    )
}
