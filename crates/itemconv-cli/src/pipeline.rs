//! One lookup from raw pasted text to an exportable result table.
//!
//! Stages run in a fixed order: load the mapping (memoized), check the key
//! columns, parse tokens, resolve, project, summarize. Nothing is written to
//! disk here; callers decide whether and where to export.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use polars::prelude::DataFrame;
use tracing::{info, info_span};

use itemconv_ingest::{HttpFetch, LoadedMapping, MappingCache, SourceConfig, parse_query_tokens};
use itemconv_map::ResolutionEngine;
use itemconv_model::{ExportFormat, LookupOptions, MatchResult, OutputSchema};
use itemconv_output::{ExportBuffer, LookupSummary, encode, project, write_export};

/// Runs lookups against a cache that lives as long as the pipeline.
pub struct LookupPipeline<F: HttpFetch> {
    cache: MappingCache,
    fetcher: F,
    options: LookupOptions,
    schema: OutputSchema,
}

/// Everything produced by one lookup.
#[derive(Debug, Clone)]
pub struct LookupRun {
    pub tokens: Vec<String>,
    pub results: Vec<MatchResult>,
    /// Projected result table: `Your input`, `Match`, then the schema columns.
    pub table: DataFrame,
    pub summary: LookupSummary,
    pub mapping: Arc<LoadedMapping>,
    format: ExportFormat,
    sheet_name: String,
}

impl LookupRun {
    /// Encode the result table in the configured export format.
    pub fn export(&self) -> Result<ExportBuffer> {
        encode(&self.table, self.format, &self.sheet_name).context("encode results")
    }

    /// Encode the result table and write it to `path`.
    pub fn write_to(&self, path: &Path) -> Result<PathBuf> {
        write_export(path, &self.table, self.format, &self.sheet_name)
            .with_context(|| format!("write {}", path.display()))
    }
}

impl<F: HttpFetch> LookupPipeline<F> {
    pub fn new(fetcher: F, options: LookupOptions) -> Self {
        Self {
            cache: MappingCache::new(),
            fetcher,
            options,
            schema: OutputSchema::canonical(),
        }
    }

    #[must_use]
    pub fn with_schema(mut self, schema: OutputSchema) -> Self {
        self.schema = schema;
        self
    }

    pub fn options(&self) -> &LookupOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut LookupOptions {
        &mut self.options
    }

    pub fn cache(&self) -> &MappingCache {
        &self.cache
    }

    /// Load (or reuse) the first available mapping source of `sources`.
    pub fn load(&mut self, sources: &SourceConfig) -> Result<Arc<LoadedMapping>> {
        let start = Instant::now();
        let mapping = info_span!("load")
            .in_scope(|| {
                self.cache
                    .get_or_load_first(sources, &self.fetcher, &self.schema)
            })
            .context("load mapping table")?;
        info!(
            source = %mapping.key,
            rows = mapping.row_count(),
            duration_ms = start.elapsed().as_millis(),
            "mapping ready"
        );
        Ok(mapping)
    }

    /// Run one lookup of `raw` against the mapping named by `sources`.
    pub fn run(&mut self, raw: &str, sources: &SourceConfig) -> Result<LookupRun> {
        let run_start = Instant::now();

        // =====================================================================
        // Stage 1: Load the mapping table and check its key columns
        // =====================================================================
        let mapping = self.load(sources)?;
        mapping
            .require_key_columns()
            .context("check mapping columns")?;

        // =====================================================================
        // Stage 2: Parse the pasted identifiers
        // =====================================================================
        let tokens = parse_query_tokens(raw);
        info!(tokens = tokens.len(), "identifiers parsed");

        // =====================================================================
        // Stage 3: Resolve
        // =====================================================================
        let strategy = self.options.strategy;
        let results = info_span!("resolve").in_scope(|| -> Result<_> {
            let engine = ResolutionEngine::new(&mapping.table, &mapping.columns, strategy)
                .context("build resolution index")?;
            Ok(engine.resolve(&tokens))
        })?;

        // =====================================================================
        // Stage 4: Project and summarize
        // =====================================================================
        let table = info_span!("project")
            .in_scope(|| {
                project(
                    &results,
                    &mapping.table,
                    &mapping.columns,
                    &self.schema,
                    self.options.order,
                )
            })
            .context("project results")?;
        let summary = LookupSummary::from_results(&tokens, &results);

        info!(
            tokens = summary.tokens,
            matched = summary.matched_tokens,
            not_found = summary.not_found.len(),
            rows = summary.rows,
            duration_ms = run_start.elapsed().as_millis(),
            "lookup complete"
        );

        Ok(LookupRun {
            tokens,
            results,
            table,
            summary,
            mapping,
            format: self.options.export_format,
            sheet_name: self.options.sheet_name.clone(),
        })
    }
}
