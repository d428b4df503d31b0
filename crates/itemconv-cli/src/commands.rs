use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::{info_span, warn};

use itemconv_cli::pipeline::{LookupPipeline, LookupRun};
use itemconv_ingest::{
    IngestError, LoadedMapping, ReqwestFetcher, SourceConfig, looks_like_url, to_csv_export_url,
};
use itemconv_model::{ExportFormat, LookupOptions, MatchStrategy, MultiMatch};

use crate::cli::{ConvertArgs, SourceArgs};

/// Result of `convert`: the lookup and where it was exported, if anywhere.
pub struct ConvertOutcome {
    pub run: LookupRun,
    pub output: Option<PathBuf>,
}

pub fn run_convert(args: &ConvertArgs) -> Result<ConvertOutcome> {
    let _span = info_span!("convert").entered();
    let options = options_from_args(args)?;
    let sources = source_config(&args.source)?;
    let raw = read_identifiers(args)?;
    if raw.trim().is_empty() {
        warn!("no identifiers given");
    }

    let fetcher = ReqwestFetcher::new(options.fetch_timeout()).context("create http client")?;
    let mut pipeline = LookupPipeline::new(fetcher, options);
    let run = pipeline.run(&raw, &sources)?;

    let output = match &args.output {
        Some(path) => Some(run.write_to(path)?),
        None => None,
    };
    Ok(ConvertOutcome { run, output })
}

pub fn run_columns(args: &SourceArgs) -> Result<LoadedMapping> {
    let sources = source_config(args)?;
    let options = LookupOptions::default();
    let fetcher = ReqwestFetcher::new(options.fetch_timeout()).context("create http client")?;
    let mut pipeline = LookupPipeline::new(fetcher, options);
    let mapping = pipeline.load(&sources)?;
    Ok(mapping.as_ref().clone())
}

pub fn run_export_url(link: &str) -> Result<()> {
    if !looks_like_url(link) {
        bail!("not a URL: {link}");
    }
    println!("{}", to_csv_export_url(link));
    Ok(())
}

/// Text printed for a failed command.
///
/// Mapping-table failures lead with the short user-facing explanation; the
/// full context chain follows on its own line.
pub fn error_report(error: &anyhow::Error) -> String {
    match error.chain().find_map(|cause| cause.downcast_ref::<IngestError>()) {
        Some(ingest) => format!("{}\n  details: {error:#}", ingest.user_message()),
        None => format!("{error:#}"),
    }
}

/// Options file (or defaults), then preset, then individual flags.
fn options_from_args(args: &ConvertArgs) -> Result<LookupOptions> {
    let mut options = match &args.options {
        Some(path) => load_options(path)?,
        None => LookupOptions::default(),
    };
    if args.strict {
        options.strategy = MatchStrategy::strict();
    } else if args.relaxed {
        options.strategy = MatchStrategy::relaxed();
    }

    let mut strategy = options.strategy;
    if let Some(policy) = args.policy {
        strategy = strategy.with_normalization(policy.into());
    }
    if let Some(tiers) = args.tiers {
        strategy = strategy.with_tiers(tiers.into());
    }
    if let Some(threshold) = args.fuzzy_threshold {
        strategy = strategy.with_fuzzy_threshold(threshold);
    }
    if let Some(len) = args.min_partial_len {
        strategy = strategy.with_min_partial_len(len);
    }
    if args.first_only {
        strategy = strategy.with_multi_match(MultiMatch::First);
    }
    options.strategy = strategy;

    if let Some(order) = args.order {
        options.order = order.into();
    }
    if let Some(name) = &args.sheet_name {
        options.sheet_name = name.clone();
    }
    options.export_format = match (args.format, &args.output) {
        (Some(format), _) => format.into(),
        (None, Some(path)) => format_from_extension(path).unwrap_or(options.export_format),
        (None, None) => options.export_format,
    };
    Ok(options)
}

fn load_options(path: &Path) -> Result<LookupOptions> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read options file {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parse options file {}", path.display()))
}

fn format_from_extension(path: &Path) -> Option<ExportFormat> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "xlsx" => Some(ExportFormat::Xlsx),
        "csv" => Some(ExportFormat::Csv),
        _ => None,
    }
}

/// `--mapping` is treated as a URL when it looks like one.
fn source_config(args: &SourceArgs) -> Result<SourceConfig> {
    let mut config = SourceConfig::default();
    let mut url = args.url.clone();
    if let Some(mapping) = &args.mapping {
        if looks_like_url(mapping) {
            if url.is_some() {
                warn!("both --mapping and --url are links; using --mapping");
            }
            url = Some(mapping.clone());
        } else {
            config = config.with_file(mapping);
        }
    }
    if let (Some(archive), Some(entry)) = (&args.archive, &args.entry) {
        config = config.with_archive(archive, entry);
    }
    if let Some(link) = url {
        config = config.with_url(link);
    }
    if config.is_empty() {
        bail!("no mapping source given; use --mapping, --archive/--entry or --url");
    }
    Ok(config)
}

fn read_identifiers(args: &ConvertArgs) -> Result<String> {
    if let Some(ids) = &args.ids {
        return Ok(ids.clone());
    }
    if let Some(path) = &args.input {
        return std::fs::read_to_string(path)
            .with_context(|| format!("read identifiers from {}", path.display()));
    }
    let mut stdin = io::stdin();
    if stdin.is_terminal() {
        eprintln!("Paste identifiers, then press Ctrl-D:");
    }
    let mut raw = String::new();
    stdin
        .read_to_string(&mut raw)
        .context("read identifiers from stdin")?;
    Ok(raw)
}
