// File: src/persistence.rs
use crate::core::engine::FuzzyMap;
use crate::core::policy::CorrectionPolicy;
use crate::core::symbols::SymbolModel;
use crate::core::trie::PrefixTree;
use crate::error::{FuzzyError, Result};
use bincode::Options;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufWriter, Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

const SNAPSHOT_TAG: [u8; 4] = *b"FZMD";
const SNAPSHOT_FORMAT: u32 = 1;

/// Borrowed view of the state written to disk. Strategies (merge, order)
/// are code, not data, and stay with the instance.
#[derive(Serialize)]
struct SnapshotOut<'a, V> {
    tag: [u8; 4],
    format: u32,
    tree: &'a PrefixTree<V>,
    policy: &'a CorrectionPolicy,
    symbols: &'a SymbolModel,
}

#[derive(Deserialize)]
struct SnapshotIn<V> {
    tag: [u8; 4],
    format: u32,
    tree: PrefixTree<V>,
    policy: CorrectionPolicy,
    symbols: SymbolModel,
}

impl<V> SnapshotIn<V> {
    fn validate(&self) -> Result<()> {
        if self.tag != SNAPSHOT_TAG {
            return Err(FuzzyError::corrupt("not a fuzzy map snapshot"));
        }
        if self.format != SNAPSHOT_FORMAT {
            return Err(FuzzyError::corrupt(format!(
                "unsupported snapshot format {}",
                self.format
            )));
        }
        self.tree.validate()?;
        self.policy
            .validate()
            .map_err(|e| FuzzyError::corrupt(e.to_string()))
    }
}

fn codec() -> impl Options {
    bincode::DefaultOptions::new().reject_trailing_bytes()
}

fn encode_error(err: bincode::Error) -> FuzzyError {
    match *err {
        bincode::ErrorKind::Io(io) => FuzzyError::Io(io),
        other => FuzzyError::SnapshotEncode(Box::new(other)),
    }
}

/// Decodes and checks a whole blob. Nothing is applied to any map here.
fn decode<V: DeserializeOwned>(bytes: &[u8]) -> Result<SnapshotIn<V>> {
    let snapshot: SnapshotIn<V> = codec()
        .deserialize(bytes)
        .map_err(|e| FuzzyError::corrupt(e.to_string()))?;
    snapshot.validate()?;
    Ok(snapshot)
}

pub fn write_snapshot<V: Serialize, W: Write>(map: &FuzzyMap<V>, writer: W) -> Result<()> {
    let snapshot = SnapshotOut {
        tag: SNAPSHOT_TAG,
        format: SNAPSHOT_FORMAT,
        tree: &map.tree,
        policy: &map.policy,
        symbols: &map.symbols,
    };
    codec().serialize_into(writer, &snapshot).map_err(encode_error)
}

/// Reads a snapshot from `reader` into `map`. On any error `map` is left
/// exactly as it was.
pub fn read_snapshot<V: DeserializeOwned, R: Read>(map: &mut FuzzyMap<V>, mut reader: R) -> Result<()> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;

    let snapshot = match decode(&bytes) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            tracing::warn!(error = %e, bytes = bytes.len(), "rejected snapshot");
            return Err(e);
        }
    };

    map.tree = snapshot.tree;
    map.policy = snapshot.policy;
    map.symbols = snapshot.symbols;
    Ok(())
}

pub fn save_to_disk<V: Serialize>(map: &FuzzyMap<V>, path: &Path) -> Result<()> {
    let parent_dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent_dir)?;

    let temp_file = NamedTempFile::new_in(parent_dir)?;
    {
        let mut writer = BufWriter::new(&temp_file);
        write_snapshot(map, &mut writer)?;
        writer.flush()?;
    }
    temp_file.persist(path).map_err(|e| e.error)?;

    tracing::info!(path = %path.display(), keys = map.len(), "snapshot saved");
    Ok(())
}

pub fn load_from_disk<V: DeserializeOwned>(map: &mut FuzzyMap<V>, path: &Path) -> Result<()> {
    let file = fs::File::open(path)?;
    read_snapshot(map, file)?;

    tracing::info!(path = %path.display(), keys = map.len(), "snapshot loaded");
    Ok(())
}

impl<V: Serialize> FuzzyMap<V> {
    /// Writes the tree, policy and symbol model to `path` atomically.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        save_to_disk(self, path.as_ref())
    }

    pub fn save_to_writer(&self, writer: impl Write) -> Result<()> {
        write_snapshot(self, writer)
    }
}

impl<V: DeserializeOwned> FuzzyMap<V> {
    /// Replaces tree, policy and symbol model with those saved at `path`.
    /// The merge and ordering strategies of `self` are kept.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<()> {
        load_from_disk(self, path.as_ref())
    }

    pub fn load_from_reader(&mut self, reader: impl Read) -> Result<()> {
        read_snapshot(self, reader)
    }

    /// Fresh map with default strategies, filled from the snapshot at `path`.
    pub fn from_snapshot(path: impl AsRef<Path>) -> Result<Self> {
        let mut map = Self::new();
        map.load(path)?;
        Ok(map)
    }
}
