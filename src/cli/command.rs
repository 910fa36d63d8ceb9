use std::path::PathBuf;

use clap::{Args, Parser as ClapParser, Subcommand, ValueEnum};

use essync::process::convert::PeakBrightnessSource;

#[derive(Debug, ClapParser)]
#[command(
    name       = env!("CARGO_PKG_NAME"),
    version    = env!("CARGO_PKG_VERSION"),
    author     = env!("CARGO_PKG_AUTHORS"),
    about      = "Tools for inspecting compressed audio streams and converting HDR10+ metadata",
    long_about = None,
)]
pub struct Cli {
    /// Set the log level
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    pub loglevel: LogLevel,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,

    /// Choose an operation to perform.
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print stream information for a compressed audio elementary stream
    Info(InfoArgs),

    /// Convert an HDR10+ SEI NAL unit into a Dolby Vision profile 8.1 RPU
    Rpu(RpuArgs),
}

#[derive(Debug, Args)]
pub struct InfoArgs {
    /// Input elementary stream (use "-" for stdin).
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Emit only the backward compatible core of DTS-HD streams.
    #[arg(long)]
    pub core_only: bool,

    /// Print the report as YAML.
    #[arg(long)]
    pub yaml: bool,
}

#[derive(Debug, Args)]
pub struct RpuArgs {
    /// Input SEI NAL unit (use "-" for stdin).
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output path for the RPU NAL unit.
    #[arg(long, value_name = "PATH")]
    pub output: PathBuf,

    /// Peak brightness derivation strategy.
    #[arg(long, value_enum, default_value_t = PeakSource::Histogram)]
    pub peak_source: PeakSource,

    /// Mastering display peak luminance in nits, used when the input
    /// carries no mastering display metadata.
    #[arg(long, value_name = "NITS", default_value_t = 1000)]
    pub max_display_mastering_luminance: u16,

    /// Mastering display minimum luminance in 0.0001 nits, used when the
    /// input carries no mastering display metadata.
    #[arg(long, value_name = "UNITS", default_value_t = 50)]
    pub min_display_mastering_luminance: u16,

    /// Maximum content light level in nits, used when the input carries no
    /// content light level metadata.
    #[arg(long, value_name = "NITS", default_value_t = 0)]
    pub max_content_light_level: u16,

    /// Maximum frame average light level in nits, used when the input
    /// carries no content light level metadata.
    #[arg(long, value_name = "NITS", default_value_t = 0)]
    pub max_frame_average_light_level: u16,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    /// Disable logging output.
    Off,
    /// No output except errors.
    Error,
    /// Show warnings and errors.
    Warn,
    /// Show info, warnings and errors (default).
    Info,
    /// Show debug, info, warnings and errors.
    Debug,
    /// Show all log messages including trace.
    Trace,
}

impl LogLevel {
    /// Convert LogLevel to log::LevelFilter
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormat {
    /// Colorized human-readable text.
    Plain,
    /// Structured JSON per log record.
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PeakSource {
    /// Largest histogram bucket.
    Histogram,
    /// Last histogram bucket (99th percentile).
    Histogram99,
    /// Largest MaxSCL component.
    MaxScl,
    /// BT.2100 luminance weighted MaxSCL.
    MaxSclLuminance,
    /// Blend of the top histogram buckets.
    HistogramPlus,
}

impl PeakSource {
    pub fn to_source(self) -> PeakBrightnessSource {
        match self {
            PeakSource::Histogram => PeakBrightnessSource::Histogram,
            PeakSource::Histogram99 => PeakBrightnessSource::Histogram99,
            PeakSource::MaxScl => PeakBrightnessSource::MaxScl,
            PeakSource::MaxSclLuminance => PeakBrightnessSource::MaxSclLuminance,
            PeakSource::HistogramPlus => PeakBrightnessSource::HistogramPlus,
        }
    }
}
