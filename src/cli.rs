use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pagetopdf")]
#[command(
    version,
    about = "Prepare a web page for faithful single-page capture and export it as PDF",
    long_about = "pagetopdf\n\nLoads <URL> in headless Chromium, works around endless scrolling, lazy loading, overlays, page breaks, animations and responsive breakpoints, then writes a single-page PDF to <OUT>.\n\nDefaults can be set in a TOML config file; CLI flags override config."
)]
pub struct Cli {
    #[arg(help = "Page to capture (http, https or file URL)")]
    pub url: String,

    #[arg(help = "Output PDF path")]
    pub out: PathBuf,

    #[arg(
        long,
        visible_alias = "vw",
        value_name = "PX",
        default_value = "1280",
        help = "Viewport width in pixels"
    )]
    pub viewport_width: u32,

    #[arg(
        long,
        visible_alias = "vh",
        value_name = "PX",
        default_value = "1080",
        help = "Viewport height in pixels (also the PDF page height)"
    )]
    pub viewport_height: u32,

    #[arg(
        long,
        visible_alias = "nes",
        help = "Skip the endless-scrolling check"
    )]
    pub no_check_endless_scrolling: bool,

    #[arg(
        long,
        short = 's',
        value_name = "PX",
        help = "Scroll until the page is at least this tall"
    )]
    pub scroll_to: Option<u32>,

    #[arg(
        long,
        visible_alias = "st",
        value_name = "MS",
        default_value = "4000",
        help = "Per-step growth timeout for --scroll-to (milliseconds)"
    )]
    pub scroll_to_timeout: u64,

    #[arg(
        long,
        visible_alias = "ss",
        help = "Scroll through the page one viewport at a time to trigger lazy content"
    )]
    pub step_scrolling: bool,

    #[arg(
        long,
        visible_alias = "ssp",
        value_name = "MS",
        default_value = "500",
        help = "Pause before each step-scrolling increment (milliseconds)"
    )]
    pub step_scrolling_pause: u64,

    #[arg(
        long,
        short = 'w',
        value_name = "MS",
        default_value = "1000",
        help = "Time to wait for timeout based events (milliseconds)"
    )]
    pub wait: u64,

    #[arg(
        long,
        visible_alias = "rs",
        help = "Remove fixed-position elements"
    )]
    pub remove_static: bool,

    #[arg(
        long,
        visible_alias = "rl",
        value_name = "N",
        default_value = "0",
        help = "Remove the N positioned elements with the highest z-index"
    )]
    pub remove_layers: u32,

    #[arg(
        long,
        help = "Use the measured content height as PDF page height instead of the viewport height"
    )]
    pub full_page_height: bool,

    #[arg(
        long,
        value_name = "PATH",
        help = "Optional config file (TOML) with capture and browser defaults; CLI flags override config"
    )]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Enable debug logging and print the effective config")]
    pub verbose: bool,

    #[arg(long, conflicts_with = "verbose", help = "Suppress progress output")]
    pub quiet: bool,

    #[arg(long, value_enum, default_value = "json", help = "Report format")]
    pub format: OutputFormat,

    #[arg(
        long,
        value_name = "PATH",
        help = "Write the report to a file instead of stdout"
    )]
    pub report: Option<PathBuf>,

    #[arg(long, value_name = "PATH", help = "Chrome/Chromium executable")]
    pub chrome_path: Option<PathBuf>,

    #[arg(long, help = "Disable the Chromium sandbox (needed in most containers)")]
    pub no_sandbox: bool,

    #[arg(long, help = "Show the browser window")]
    pub headful: bool,

    #[arg(
        long,
        value_name = "SECONDS",
        default_value = "30",
        help = "Navigation timeout (seconds)"
    )]
    pub nav_timeout: u64,

    #[arg(
        long,
        value_name = "SECONDS",
        default_value = "10",
        help = "Network idle timeout (seconds)"
    )]
    pub network_idle_timeout: u64,
}

#[derive(Clone, Copy, ValueEnum, Default, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Json,
    Pretty,
}

pub fn parse() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::{Cli, OutputFormat};
    use clap::Parser;
    use std::path::Path;

    #[test]
    fn positional_arguments_with_defaults() {
        let cli = Cli::parse_from(["pagetopdf", "https://example.com", "page.pdf"]);

        assert_eq!(cli.url, "https://example.com");
        assert_eq!(cli.out, Path::new("page.pdf"));
        assert_eq!(cli.viewport_width, 1280);
        assert_eq!(cli.viewport_height, 1080);
        assert!(!cli.no_check_endless_scrolling);
        assert!(cli.scroll_to.is_none());
        assert_eq!(cli.scroll_to_timeout, 4000);
        assert!(!cli.step_scrolling);
        assert_eq!(cli.step_scrolling_pause, 500);
        assert_eq!(cli.wait, 1000);
        assert!(!cli.remove_static);
        assert_eq!(cli.remove_layers, 0);
        assert!(!cli.full_page_height);
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(cli.config.is_none());
        assert_eq!(cli.nav_timeout, 30);
        assert_eq!(cli.network_idle_timeout, 10);
    }

    #[test]
    fn short_aliases_are_accepted() {
        let cli = Cli::parse_from([
            "pagetopdf",
            "--vw",
            "1440",
            "--vh",
            "900",
            "--nes",
            "-s",
            "20000",
            "--st",
            "2500",
            "--ss",
            "--ssp",
            "250",
            "-w",
            "0",
            "--rs",
            "--rl",
            "3",
            "https://example.com/feed",
            "feed.pdf",
        ]);

        assert_eq!(cli.viewport_width, 1440);
        assert_eq!(cli.viewport_height, 900);
        assert!(cli.no_check_endless_scrolling);
        assert_eq!(cli.scroll_to, Some(20000));
        assert_eq!(cli.scroll_to_timeout, 2500);
        assert!(cli.step_scrolling);
        assert_eq!(cli.step_scrolling_pause, 250);
        assert_eq!(cli.wait, 0);
        assert!(cli.remove_static);
        assert_eq!(cli.remove_layers, 3);
    }

    #[test]
    fn browser_and_output_flags() {
        let cli = Cli::parse_from([
            "pagetopdf",
            "https://example.com",
            "out/page.pdf",
            "--format",
            "pretty",
            "--report",
            "report.json",
            "--chrome-path",
            "/usr/bin/chromium",
            "--no-sandbox",
            "--headful",
            "--nav-timeout",
            "60",
            "--network-idle-timeout",
            "5",
            "--config",
            "pagetopdf.toml",
            "--verbose",
        ]);

        assert_eq!(cli.format, OutputFormat::Pretty);
        assert_eq!(cli.report.as_deref(), Some(Path::new("report.json")));
        assert_eq!(cli.chrome_path.as_deref(), Some(Path::new("/usr/bin/chromium")));
        assert!(cli.no_sandbox);
        assert!(cli.headful);
        assert_eq!(cli.nav_timeout, 60);
        assert_eq!(cli.network_idle_timeout, 5);
        assert_eq!(cli.config.as_deref(), Some(Path::new("pagetopdf.toml")));
        assert!(cli.verbose);
    }

    #[test]
    fn verbose_and_quiet_conflict() {
        let result = Cli::try_parse_from([
            "pagetopdf",
            "https://example.com",
            "o.pdf",
            "--verbose",
            "--quiet",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn url_and_output_are_required() {
        assert!(Cli::try_parse_from(["pagetopdf", "https://example.com"]).is_err());
    }
}
