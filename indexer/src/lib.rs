use anyhow::{Context, Result};
use serde::Serialize;
use sitedex_core::persist::{
    load_identifiers, load_meta, load_search_index, load_suggestions, save_artifacts, IndexPaths, MetaFile,
    OutputFormat, FORMAT_VERSION,
};
use sitedex_core::{Document, IndexBuilder};
use walkdir::WalkDir;

use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub input: PathBuf,
    pub output: PathBuf,
    pub format: OutputFormat,
    pub site_url: Option<String>,
}

/// Read the corpus, index it in traversal order and write all artifacts.
/// Nothing is written unless the whole pass succeeds.
pub fn build_index(opts: &BuildOptions) -> Result<MetaFile> {
    let docs = load_corpus(&opts.input)?;
    tracing::info!(documents = docs.len(), input = %opts.input.display(), "loaded corpus");

    let mut builder = IndexBuilder::new().with_site_url(opts.site_url.clone());
    for doc in &docs {
        builder.add(doc).with_context(|| format!("indexing {}", doc.path))?;
    }
    let artifacts = builder
        .finish()
        .with_context(|| format!("no documents found under {}", opts.input.display()))?;

    let meta = MetaFile {
        version: FORMAT_VERSION,
        corpus_size: artifacts.index.corpus_size,
        format: opts.format,
        created_at: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_else(|_| "".into()),
    };
    let out_paths = IndexPaths::new(&opts.output);
    save_artifacts(&out_paths, &artifacts, opts.format, &meta)
        .with_context(|| format!("writing index to {}", opts.output.display()))?;

    tracing::info!(output = %opts.output.display(), "index build complete");
    Ok(meta)
}

/// Markdown trees, or JSON/JSONL record files, in a stable order. Any entry
/// the walk cannot read fails the whole load.
pub fn load_corpus(input: &Path) -> Result<Vec<Document>> {
    let mut docs = Vec::new();
    if input.is_dir() {
        for entry in WalkDir::new(input).follow_links(true).sort_by_file_name() {
            let entry = entry.with_context(|| format!("walking {}", input.display()))?;
            let p = entry.path();
            if !p.is_file() {
                continue;
            }
            match p.extension().and_then(|s| s.to_str()) {
                Some("md") => docs.push(read_markdown(input, p)?),
                Some("json") => index_json(p, &mut docs)?,
                Some("jsonl") => index_jsonl(p, &mut docs)?,
                _ => {}
            }
        }
    } else if input.is_file() {
        match input.extension().and_then(|s| s.to_str()) {
            Some("md") => docs.push(read_markdown(input.parent().unwrap_or(input), input)?),
            Some("jsonl") => index_jsonl(input, &mut docs)?,
            _ => index_json(input, &mut docs)?,
        }
    } else {
        anyhow::bail!("input path {} does not exist", input.display());
    }
    Ok(docs)
}

/// `guide/intro.md` -> `guide/intro.html`, always with `/` separators.
pub fn canonical_path(root: &Path, file: &Path) -> String {
    let rel = file.strip_prefix(root).unwrap_or(file).with_extension("html");
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn read_markdown(root: &Path, file: &Path) -> Result<Document> {
    let source = fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
    let source = source.replace("\r\n", "\n");
    Ok(Document::from_markdown(canonical_path(root, file), &source))
}

fn index_jsonl(file: &Path, docs: &mut Vec<Document>) -> Result<()> {
    let f = File::open(file).with_context(|| format!("opening {}", file.display()))?;
    let reader = BufReader::new(f);
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        match serde_json::from_str::<Document>(&line) {
            Ok(doc) => docs.push(doc),
            Err(err) => tracing::warn!(file = %file.display(), line = lineno + 1, %err, "skipping malformed record"),
        }
    }
    Ok(())
}

fn index_json(file: &Path, docs: &mut Vec<Document>) -> Result<()> {
    let f = File::open(file).with_context(|| format!("opening {}", file.display()))?;
    let reader = BufReader::new(f);
    let json: serde_json::Value =
        serde_json::from_reader(reader).with_context(|| format!("parsing {}", file.display()))?;
    let records = match json {
        serde_json::Value::Array(arr) => arr,
        v @ serde_json::Value::Object(_) => vec![v],
        _ => {
            tracing::warn!(file = %file.display(), "expected an object or an array of objects");
            Vec::new()
        }
    };
    for v in records {
        match serde_json::from_value::<Document>(v) {
            Ok(doc) => docs.push(doc),
            Err(err) => tracing::warn!(file = %file.display(), %err, "skipping malformed record"),
        }
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct IndexSummary {
    pub corpus_size: u32,
    pub average_document_length: f64,
    pub terms: usize,
    pub postings: usize,
    pub suggestions: usize,
    pub identifiers: usize,
    pub created_at: String,
}

/// Load a built index back, in the format its manifest records, and report
/// its statistics.
pub fn summarize(index_dir: &Path) -> Result<IndexSummary> {
    let paths = IndexPaths::new(index_dir);
    let meta = load_meta(&paths).context("reading meta.json")?;
    let format = meta.format;
    let index = load_search_index(&paths, format).context("reading search index")?;
    let suggestions = load_suggestions(&paths, format).context("reading suggestions")?;
    let identifiers = load_identifiers(&paths, format).context("reading link index")?;
    Ok(IndexSummary {
        corpus_size: index.corpus_size,
        average_document_length: index.average_document_length,
        terms: index.postings.len(),
        postings: index.postings.values().map(Vec::len).sum(),
        suggestions: suggestions.len(),
        identifiers: identifiers.len(),
        created_at: meta.created_at,
    })
}
