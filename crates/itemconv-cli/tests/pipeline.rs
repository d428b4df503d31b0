//! End-to-end lookups through the pipeline with on-disk and stubbed sources.

use std::cell::RefCell;
use std::sync::Arc;

use itemconv_cli::pipeline::LookupPipeline;
use itemconv_ingest::{HttpFetch, IngestError, SourceConfig};
use itemconv_model::{ExportFormat, LookupOptions, MatchKind, ResultOrder};

const MAPPING: &str = "new item no.;old item-variant;EAN NO.;Description;Family;Category\n\
                       N-100;MTO-CHAIR-001-01;05712345000013;Fiber Chair;Fiber;Seating\n\
                       N-200;MTO-SOFA-01;05712345000020;Outline Sofa;Outline;Sofas\n";

/// Serves a fixed body and records every requested URL.
struct StubFetch {
    body: &'static str,
    requests: RefCell<Vec<String>>,
}

impl StubFetch {
    fn new(body: &'static str) -> Self {
        Self {
            body,
            requests: RefCell::new(Vec::new()),
        }
    }
}

impl HttpFetch for StubFetch {
    fn fetch(&self, url: &str) -> itemconv_ingest::Result<Vec<u8>> {
        self.requests.borrow_mut().push(url.to_string());
        Ok(self.body.as_bytes().to_vec())
    }
}

/// Fails every request, as an unreachable host would.
struct Offline;

impl HttpFetch for Offline {
    fn fetch(&self, url: &str) -> itemconv_ingest::Result<Vec<u8>> {
        Err(IngestError::unavailable(url, "network disabled"))
    }
}

fn column(df: &polars::prelude::DataFrame, name: &str) -> Vec<Option<String>> {
    df.column(name)
        .unwrap()
        .str()
        .unwrap()
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect()
}

#[test]
fn converts_pasted_identifiers_from_a_csv_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mapping.csv");
    std::fs::write(&path, MAPPING).unwrap();

    let mut pipeline = LookupPipeline::new(Offline, LookupOptions::default());
    let run = pipeline
        .run(
            "MTO-CHAIR-001-01, MTO-SOFA-01\nUNKNOWN-99",
            &SourceConfig::default().with_file(&path),
        )
        .unwrap();

    assert_eq!(run.tokens, vec!["MTO-CHAIR-001-01", "MTO-SOFA-01", "UNKNOWN-99"]);
    assert_eq!(run.results.len(), 3);
    assert_eq!(run.summary.matched_tokens, 2);
    assert_eq!(run.summary.not_found, vec!["UNKNOWN-99"]);
    assert_eq!(run.summary.by_kind, vec![("Exact", 2), ("No match", 1)]);

    assert_eq!(run.table.height(), 3);
    assert_eq!(
        column(&run.table, "Match"),
        vec![
            Some("Exact".to_string()),
            Some("Exact".to_string()),
            Some("No match".to_string()),
        ]
    );
    assert_eq!(
        column(&run.table, "New Item No."),
        vec![Some("N-100".to_string()), Some("N-200".to_string()), None]
    );
}

#[test]
fn input_order_keeps_unmatched_tokens_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mapping.csv");
    std::fs::write(&path, MAPPING).unwrap();

    let options = LookupOptions {
        order: ResultOrder::InputOrder,
        ..LookupOptions::default()
    };
    let mut pipeline = LookupPipeline::new(Offline, options);
    let run = pipeline
        .run(
            "UNKNOWN-99 MTO-SOFA-01",
            &SourceConfig::default().with_file(&path),
        )
        .unwrap();

    assert_eq!(
        column(&run.table, "Your input"),
        vec![Some("UNKNOWN-99".to_string()), Some("MTO-SOFA-01".to_string())]
    );
}

#[test]
fn url_mapping_is_fetched_once_per_pipeline() {
    let fetch = StubFetch::new(MAPPING);
    let mut pipeline = LookupPipeline::new(fetch, LookupOptions::default());
    let sources =
        SourceConfig::default().with_url("https://docs.google.com/spreadsheets/d/abc123/edit#gid=7");

    let first = pipeline.run("05712345000020", &sources).unwrap();
    let second = pipeline.run("MTO-CHAIR-001-01", &sources).unwrap();

    assert!(Arc::ptr_eq(&first.mapping, &second.mapping));
    assert_eq!(pipeline.cache().len(), 1);
    assert_eq!(first.results[0].kind, MatchKind::Exact);
    assert_eq!(first.results[0].row, Some(1));
    assert_eq!(second.results[0].row, Some(0));
}

#[test]
fn stub_receives_the_csv_export_url() {
    let fetch = StubFetch::new(MAPPING);
    let mut pipeline = LookupPipeline::new(&fetch, LookupOptions::default());
    let sources =
        SourceConfig::default().with_url("https://docs.google.com/spreadsheets/d/abc123/edit#gid=7");
    pipeline.run("MTO-SOFA-01", &sources).unwrap();

    assert_eq!(
        fetch.requests.borrow().as_slice(),
        ["https://docs.google.com/spreadsheets/d/abc123/export?format=csv&gid=7"]
    );
}

#[test]
fn unavailable_file_falls_back_to_url() {
    let fetch = StubFetch::new(MAPPING);
    let mut pipeline = LookupPipeline::new(fetch, LookupOptions::default());
    let sources = SourceConfig::default()
        .with_file("/definitely/not/here/mapping.csv")
        .with_url("https://example.com/mapping.csv");

    let run = pipeline.run("MTO-SOFA-01", &sources).unwrap();
    assert_eq!(run.summary.matched_tokens, 1);
}

#[test]
fn missing_ean_column_is_a_schema_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mapping.csv");
    std::fs::write(&path, "OLD Item-variant;Description\nMTO-1;Chair\n").unwrap();

    let mut pipeline = LookupPipeline::new(Offline, LookupOptions::default());
    let error = pipeline
        .run("MTO-1", &SourceConfig::default().with_file(&path))
        .unwrap_err();

    match error.downcast_ref::<IngestError>() {
        Some(IngestError::Schema { missing, found }) => {
            assert_eq!(missing, &vec!["Ean no.".to_string()]);
            assert_eq!(found, &vec!["OLD Item-variant".to_string(), "Description".to_string()]);
        }
        other => panic!("expected schema error, got {other:?}"),
    }
}

#[test]
fn unreachable_sources_report_unavailability() {
    let mut pipeline = LookupPipeline::new(Offline, LookupOptions::default());
    let error = pipeline
        .run("MTO-1", &SourceConfig::default().with_url("https://example.com/m.csv"))
        .unwrap_err();

    let ingest = error.downcast_ref::<IngestError>().unwrap();
    assert!(ingest.is_unavailable());
}

#[test]
fn empty_input_yields_an_empty_table() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mapping.csv");
    std::fs::write(&path, MAPPING).unwrap();

    let mut pipeline = LookupPipeline::new(Offline, LookupOptions::default());
    let run = pipeline
        .run("  \n ", &SourceConfig::default().with_file(&path))
        .unwrap();

    assert!(run.tokens.is_empty());
    assert_eq!(run.table.height(), 0);
    assert_eq!(run.table.width(), 8);
}

#[test]
fn exports_csv_and_xlsx() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mapping.csv");
    std::fs::write(&path, MAPPING).unwrap();
    let sources = SourceConfig::default().with_file(&path);

    let options = LookupOptions {
        export_format: ExportFormat::Csv,
        ..LookupOptions::default()
    };
    let mut pipeline = LookupPipeline::new(Offline, options);
    let run = pipeline.run("MTO-SOFA-01", &sources).unwrap();
    let written = run.write_to(&dir.path().join("out").join("result.csv")).unwrap();
    let text = std::fs::read_to_string(written).unwrap();
    assert!(text.starts_with(
        "Your input,Match,New Item No.,OLD Item-variant,Ean no.,Description,Family,Category\n"
    ));
    assert!(text.contains("MTO-SOFA-01,Exact,N-200,MTO-SOFA-01,05712345000020,Outline Sofa"));

    pipeline.options_mut().export_format = ExportFormat::Xlsx;
    let run = pipeline.run("MTO-SOFA-01", &sources).unwrap();
    let buffer = run.export().unwrap();
    assert!(buffer.bytes.starts_with(b"PK"));
    assert_eq!(buffer.file_name("item_conversion"), "item_conversion.xlsx");
}
