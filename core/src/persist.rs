use crate::document::PageData;
use crate::error::{IndexError, Result};
use crate::ident::ShortId;
use crate::index::{Artifacts, SearchIndex};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, create_dir_all, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Compact JSON documents.
    Json,
    /// `window.<global>=<json>;` scripts, loadable with a plain script tag.
    Js,
    Bincode,
}

impl OutputFormat {
    fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Js => "js",
            OutputFormat::Bincode => "bin",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    SearchIndex,
    Suggestions,
    Links,
    Pages,
}

impl Artifact {
    pub const ALL: [Artifact; 4] = [Artifact::SearchIndex, Artifact::Suggestions, Artifact::Links, Artifact::Pages];

    fn file_stem(self) -> &'static str {
        match self {
            Artifact::SearchIndex => "search-index",
            Artifact::Suggestions => "suggestions",
            Artifact::Links => "link-index",
            Artifact::Pages => "page-data",
        }
    }

    /// Global the `js` format assigns to.
    fn global(self) -> &'static str {
        match self {
            Artifact::SearchIndex => "searchIndex",
            Artifact::Suggestions => "searchSuggestions",
            Artifact::Links => "linkIndex",
            Artifact::Pages => "dataIndex",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaFile {
    pub version: u32,
    pub corpus_size: u32,
    pub format: OutputFormat,
    pub created_at: String,
}

pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    pub fn artifact(&self, artifact: Artifact, format: OutputFormat) -> PathBuf {
        self.root.join(format!("{}.{}", artifact.file_stem(), format.extension()))
    }
    fn meta(&self) -> PathBuf { self.root.join("meta.json") }
}

pub fn encode<T: Serialize>(value: &T, artifact: Artifact, format: OutputFormat) -> Result<Vec<u8>> {
    let bytes = match format {
        OutputFormat::Json => serde_json::to_vec(value)?,
        OutputFormat::Js => {
            let mut out = format!("window.{}=", artifact.global()).into_bytes();
            serde_json::to_writer(&mut out, value)?;
            out.extend_from_slice(b";\n");
            out
        }
        OutputFormat::Bincode => bincode::serialize(value)?,
    };
    Ok(bytes)
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8], artifact: Artifact, format: OutputFormat) -> Result<T> {
    let value = match format {
        OutputFormat::Json => serde_json::from_slice(bytes)?,
        OutputFormat::Js => {
            let prefix = format!("window.{}=", artifact.global());
            let body = bytes
                .strip_prefix(prefix.as_bytes())
                .and_then(|b| b.strip_suffix(b";\n").or_else(|| b.strip_suffix(b";")))
                .ok_or(IndexError::Malformed(artifact.file_stem()))?;
            serde_json::from_slice(body)?
        }
        OutputFormat::Bincode => bincode::deserialize(bytes)?,
    };
    Ok(value)
}

/// Encode every artifact in memory, write them next to their final names and
/// only then rename them into place, so a failed build publishes nothing.
pub fn save_artifacts(paths: &IndexPaths, artifacts: &Artifacts, format: OutputFormat, meta: &MetaFile) -> Result<()> {
    let rendered = [
        (Artifact::SearchIndex, encode(&artifacts.index, Artifact::SearchIndex, format)?),
        (Artifact::Suggestions, encode(&artifacts.suggestions, Artifact::Suggestions, format)?),
        (Artifact::Links, encode(&artifacts.identifiers, Artifact::Links, format)?),
        (Artifact::Pages, encode(&artifacts.pages, Artifact::Pages, format)?),
    ];

    create_dir_all(&paths.root)?;
    let staged: Vec<(PathBuf, PathBuf)> = rendered
        .iter()
        .map(|(artifact, _)| {
            let dest = paths.artifact(*artifact, format);
            (dest.with_extension("tmp"), dest)
        })
        .collect();
    let published = stage_and_publish(&staged, &rendered);
    if let Err(err) = published {
        for (tmp, _) in &staged {
            // absent when it was never created or already renamed
            let _ = fs::remove_file(tmp);
        }
        tracing::warn!(root = %paths.root.display(), %err, "removed staged artifacts after a failed write");
        return Err(err);
    }
    save_meta(paths, meta)?;
    tracing::info!(root = %paths.root.display(), ?format, "wrote search artifacts");
    Ok(())
}

fn stage_and_publish(staged: &[(PathBuf, PathBuf)], rendered: &[(Artifact, Vec<u8>)]) -> Result<()> {
    for ((tmp, _), (_, bytes)) in staged.iter().zip(rendered) {
        let mut f = File::create(tmp)?;
        f.write_all(bytes)?;
        f.sync_all()?;
    }
    for (tmp, dest) in staged {
        fs::rename(tmp, dest)?;
    }
    Ok(())
}

fn read_artifact<T: DeserializeOwned>(paths: &IndexPaths, artifact: Artifact, format: OutputFormat) -> Result<T> {
    let mut f = File::open(paths.artifact(artifact, format))?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    decode(&buf, artifact, format)
}

pub fn load_search_index(paths: &IndexPaths, format: OutputFormat) -> Result<SearchIndex> {
    read_artifact(paths, Artifact::SearchIndex, format)
}

pub fn load_suggestions(paths: &IndexPaths, format: OutputFormat) -> Result<Vec<String>> {
    read_artifact(paths, Artifact::Suggestions, format)
}

pub fn load_identifiers(paths: &IndexPaths, format: OutputFormat) -> Result<BTreeMap<ShortId, String>> {
    read_artifact(paths, Artifact::Links, format)
}

pub fn load_pages(paths: &IndexPaths, format: OutputFormat) -> Result<BTreeMap<ShortId, PageData>> {
    read_artifact(paths, Artifact::Pages, format)
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.meta())?;
    let json = serde_json::to_string_pretty(meta)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    let mut f = File::open(paths.meta())?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let meta: MetaFile = serde_json::from_str(&buf)?;
    Ok(meta)
}
