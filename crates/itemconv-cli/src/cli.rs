//! CLI argument definitions for the item number converter.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

use itemconv_model::{ExportFormat, NormalizationPolicy, ResultOrder, TierSelection};

#[derive(Parser)]
#[command(
    name = "itemconv",
    version,
    about = "Convert legacy item numbers and EANs to new item numbers",
    long_about = "Look up old item-variant codes or EAN barcodes in a reference mapping \
                  table and export the matching new item numbers.\n\n\
                  The mapping table may be a CSV/TSV or Excel file, an entry inside a zip \
                  archive, or a shared Google Sheets link."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Look up identifiers and export the results.
    Convert(ConvertArgs),

    /// Show how the mapping table's headers resolve to the canonical columns.
    Columns(SourceArgs),

    /// Print the CSV export URL for a shared spreadsheet link.
    ExportUrl {
        /// Sharing, edit or published link.
        #[arg(value_name = "LINK")]
        link: String,
    },
}

/// Where the mapping table comes from.
///
/// Sources are tried in the order file, archive, URL; unavailable ones are
/// skipped.
#[derive(Args, Clone, Default)]
pub struct SourceArgs {
    /// Mapping table file (CSV, TSV, XLSX) or a spreadsheet URL.
    #[arg(long = "mapping", value_name = "PATH|URL")]
    pub mapping: Option<String>,

    /// Zip archive that contains the mapping table.
    #[arg(long = "archive", value_name = "ZIP", requires = "entry")]
    pub archive: Option<PathBuf>,

    /// Entry name of the mapping table inside `--archive`.
    #[arg(long = "entry", value_name = "NAME", requires = "archive")]
    pub entry: Option<String>,

    /// Fallback spreadsheet URL, tried after the file and archive sources.
    #[arg(long = "url", value_name = "URL")]
    pub url: Option<String>,
}

#[derive(Parser)]
pub struct ConvertArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// File with the identifiers to look up (default: stdin).
    #[arg(long = "input", value_name = "FILE", conflicts_with = "ids")]
    pub input: Option<PathBuf>,

    /// Identifiers given inline, separated by spaces, commas or semicolons.
    #[arg(long = "ids", value_name = "TEXT")]
    pub ids: Option<String>,

    /// Write the result table to this file.
    #[arg(long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Export format (default: taken from the file extension, else xlsx).
    #[arg(long = "format", value_enum)]
    pub format: Option<ExportFormatArg>,

    /// JSON file with lookup options; flags below override its values.
    #[arg(long = "options", value_name = "JSON")]
    pub options: Option<PathBuf>,

    /// Start from the strict preset (exact matches only, no folding).
    #[arg(long = "strict", conflicts_with = "relaxed")]
    pub strict: bool,

    /// Start from the relaxed preset (lower fuzzy threshold).
    #[arg(long = "relaxed")]
    pub relaxed: bool,

    /// Normalization applied to both identifiers and keys.
    #[arg(long = "policy", value_enum)]
    pub policy: Option<PolicyArg>,

    /// Which matching tiers run after the exact tier.
    #[arg(long = "tiers", value_enum)]
    pub tiers: Option<TiersArg>,

    /// Minimum fuzzy score (0-100) for a fuzzy match.
    #[arg(
        long = "fuzzy-threshold",
        value_name = "N",
        value_parser = clap::value_parser!(u8).range(0..=100)
    )]
    pub fuzzy_threshold: Option<u8>,

    /// Shortest normalized identifier that may match by prefix or substring.
    #[arg(long = "min-partial-len", value_name = "N")]
    pub min_partial_len: Option<usize>,

    /// Keep only the first matching row for each identifier.
    #[arg(long = "first-only")]
    pub first_only: bool,

    /// Row order of the result table.
    #[arg(long = "order", value_enum)]
    pub order: Option<OrderArg>,

    /// Worksheet name of the XLSX export.
    #[arg(long = "sheet-name", value_name = "NAME")]
    pub sheet_name: Option<String>,

    /// Number of result rows shown in the terminal preview.
    #[arg(long = "preview", value_name = "ROWS", default_value_t = 20)]
    pub preview: usize,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ExportFormatArg {
    Xlsx,
    Csv,
}

impl From<ExportFormatArg> for ExportFormat {
    fn from(value: ExportFormatArg) -> Self {
        match value {
            ExportFormatArg::Xlsx => Self::Xlsx,
            ExportFormatArg::Csv => Self::Csv,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum PolicyArg {
    /// Trim only.
    Strict,
    /// Uppercase and drop everything but letters and digits.
    Alphanumeric,
    /// Trim, then strip leading zeros from all-digit values.
    Numeric,
}

impl From<PolicyArg> for NormalizationPolicy {
    fn from(value: PolicyArg) -> Self {
        match value {
            PolicyArg::Strict => Self::Strict,
            PolicyArg::Alphanumeric => Self::AlphanumericFold,
            PolicyArg::Numeric => Self::NumericLeadingZeroFold,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum TiersArg {
    Exact,
    Partial,
    Full,
}

impl From<TiersArg> for TierSelection {
    fn from(value: TiersArg) -> Self {
        match value {
            TiersArg::Exact => Self::ExactOnly,
            TiersArg::Partial => Self::Partial,
            TiersArg::Full => Self::Full,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OrderArg {
    /// Best match kind first.
    Kind,
    /// Same order as the identifiers were given.
    Input,
}

impl From<OrderArg> for ResultOrder {
    fn from(value: OrderArg) -> Self {
        match value {
            OrderArg::Kind => Self::ByMatchKind,
            OrderArg::Input => Self::InputOrder,
        }
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
