// Patch-to-resources unwrapper
//
// Strips the wrapping levels of a patch-authoring document and writes the
// first occurrence of every resource entry under a single <resources> root.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, trace};

use super::node::{nodes_at_depth, ResourceNode, XmlError, ENTRY_DEPTH};
use crate::config::{MissingKeyPolicy, StringsConfig};

/// Root element of generated documents
pub const OUTPUT_ROOT: &str = "resources";

/// Errors from unwrapping one file
#[derive(Error, Debug)]
pub enum UnwrapError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse {path}: {source}")]
    Parse { path: PathBuf, source: XmlError },
    #[error("{path}: <{tag}> entry #{position} has no `name` attribute")]
    SchemaViolation {
        path: PathBuf,
        tag: String,
        position: usize,
    },
    #[error("Failed to serialize {path}: {source}")]
    Write {
        path: PathBuf,
        source: quick_xml::Error,
    },
}

/// Errors from unwrapping an in-memory document
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error(transparent)]
    Xml(#[from] XmlError),
    #[error("<{tag}> entry #{position} has no `name` attribute")]
    MissingKey { tag: String, position: usize },
    #[error(transparent)]
    Write(#[from] quick_xml::Error),
}

impl DocumentError {
    fn at(self, path: &Path) -> UnwrapError {
        let path = path.to_path_buf();
        match self {
            DocumentError::Xml(source) => UnwrapError::Parse { path, source },
            DocumentError::MissingKey { tag, position } => UnwrapError::SchemaViolation {
                path,
                tag,
                position,
            },
            DocumentError::Write(source) => UnwrapError::Write { path, source },
        }
    }
}

/// Dedup keys already written to one output document
#[derive(Debug, Default)]
pub struct DeduplicationSet {
    keys: HashSet<String>,
}

impl DeduplicationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a key; false if it was already present
    pub fn insert(&mut self, key: &str) -> bool {
        if self.keys.contains(key) {
            return false;
        }
        self.keys.insert(key.to_string())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Counts for one unwrapped document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UnwrapStats {
    /// Entries written to the output
    pub entries: usize,
    /// Later entries dropped for a repeated key
    pub duplicates: usize,
}

/// Converts patch-authoring documents into standard resource documents
#[derive(Debug, Clone)]
pub struct StringTableUnwrapper {
    missing_key: MissingKeyPolicy,
    indent: usize,
}

impl StringTableUnwrapper {
    pub fn new() -> Self {
        Self {
            missing_key: MissingKeyPolicy::Fail,
            indent: 4,
        }
    }

    pub fn from_config(config: &StringsConfig) -> Self {
        Self {
            missing_key: config.missing_key,
            indent: config.indent,
        }
    }

    pub fn with_missing_key(mut self, policy: MissingKeyPolicy) -> Self {
        self.missing_key = policy;
        self
    }

    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    /// Unwrap `input` into `output` with a fresh dedup scope
    pub fn unwrap(&self, input: &Path, output: &Path) -> Result<UnwrapStats, UnwrapError> {
        let contents = fs::read_to_string(input).map_err(|source| UnwrapError::Io {
            path: input.to_path_buf(),
            source,
        })?;

        let mut keys = DeduplicationSet::new();
        let (document, stats) = self
            .unwrap_document(&contents, &mut keys)
            .map_err(|e| e.at(input))?;

        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent).map_err(|source| UnwrapError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(output, document).map_err(|source| UnwrapError::Io {
            path: output.to_path_buf(),
            source,
        })?;

        debug!(
            "Unwrapped {} -> {}: {} entries, {} duplicates dropped",
            input.display(),
            output.display(),
            stats.entries,
            stats.duplicates
        );

        Ok(stats)
    }

    /// Unwrap an in-memory document, recording written keys in `keys`
    pub fn unwrap_document(
        &self,
        contents: &str,
        keys: &mut DeduplicationSet,
    ) -> Result<(String, UnwrapStats), DocumentError> {
        let root = ResourceNode::parse_document(contents)?;
        let mut buffer = Vec::new();
        let stats = self.render(&root, keys, &mut buffer)?;
        Ok((String::from_utf8_lossy(&buffer).into_owned(), stats))
    }

    /// Write the entries of `root` as a standard resource document
    pub fn render<W: Write>(
        &self,
        root: &ResourceNode,
        keys: &mut DeduplicationSet,
        out: W,
    ) -> Result<UnwrapStats, DocumentError> {
        let mut writer = if self.indent > 0 {
            Writer::new_with_indent(out, b' ', self.indent)
        } else {
            Writer::new(out)
        };
        let mut stats = UnwrapStats::default();

        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
        writer.write_event(Event::Start(BytesStart::new(OUTPUT_ROOT)))?;

        for (index, entry) in nodes_at_depth(root, ENTRY_DEPTH).into_iter().enumerate() {
            match entry.key() {
                Some(key) => {
                    if !keys.insert(key) {
                        trace!("Dropping duplicate <{} name=\"{}\">", entry.tag(), key);
                        stats.duplicates += 1;
                        continue;
                    }
                }
                None => match self.missing_key {
                    MissingKeyPolicy::Fail => {
                        return Err(DocumentError::MissingKey {
                            tag: entry.tag().to_string(),
                            position: index + 1,
                        });
                    }
                    MissingKeyPolicy::Keep => {
                        trace!("Keeping <{}> without a key", entry.tag());
                    }
                },
            }

            write_node(&mut writer, entry)?;
            stats.entries += 1;
        }

        writer.write_event(Event::End(BytesEnd::new(OUTPUT_ROOT)))?;
        writer
            .get_mut()
            .write_all(b"\n")
            .map_err(quick_xml::Error::from)?;

        Ok(stats)
    }
}

impl Default for StringTableUnwrapper {
    fn default() -> Self {
        Self::new()
    }
}

fn write_node<W: Write>(writer: &mut Writer<W>, node: &ResourceNode) -> Result<(), quick_xml::Error> {
    let mut start = BytesStart::new(node.tag());
    for (key, value) in node.attributes() {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    match node {
        ResourceNode::Branch { children, .. } => {
            writer.write_event(Event::Start(start))?;
            for child in children {
                write_node(writer, child)?;
            }
            writer.write_event(Event::End(BytesEnd::new(node.tag())))?;
        }
        ResourceNode::Leaf { text, .. } if text.is_empty() => {
            writer.write_event(Event::Empty(start))?;
        }
        ResourceNode::Leaf { text, .. } => {
            writer.write_event(Event::Start(start))?;
            writer.write_event(Event::Text(BytesText::new(text)))?;
            writer.write_event(Event::End(BytesEnd::new(node.tag())))?;
        }
    }

    Ok(())
}
