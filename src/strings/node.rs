// Resource tree model
//
// Parses a patch-authoring XML document into an owned tree of
// branch and leaf nodes that the unwrapper walks and re-serializes.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;
use tracing::trace;

/// Depth of resource entries below the document root
/// (`resources -> app -> patch -> entry`).
pub const ENTRY_DEPTH: usize = 3;

/// Attribute carrying the dedup key of a resource entry
pub const KEY_ATTRIBUTE: &str = "name";

/// Structural XML errors
#[derive(Error, Debug)]
pub enum XmlError {
    #[error("{0}")]
    Syntax(#[from] quick_xml::Error),
    #[error("document has no root element")]
    NoRoot,
    #[error("second root element <{0}> after the document root")]
    MultipleRoots(String),
    #[error("element <{0}> is never closed")]
    Unclosed(String),
    #[error("closing tag </{0}> without a matching opening tag")]
    UnexpectedEnd(String),
}

/// A node of a parsed resource document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceNode {
    /// Element with element children; interleaved text is dropped
    Branch {
        tag: String,
        attributes: Vec<(String, String)>,
        children: Vec<ResourceNode>,
    },
    /// Element holding only (possibly empty) text
    Leaf {
        tag: String,
        attributes: Vec<(String, String)>,
        text: String,
    },
}

impl ResourceNode {
    pub fn tag(&self) -> &str {
        match self {
            ResourceNode::Branch { tag, .. } | ResourceNode::Leaf { tag, .. } => tag,
        }
    }

    pub fn attributes(&self) -> &[(String, String)] {
        match self {
            ResourceNode::Branch { attributes, .. } | ResourceNode::Leaf { attributes, .. } => {
                attributes
            }
        }
    }

    /// Children in document order; empty for leaves
    pub fn children(&self) -> &[ResourceNode] {
        match self {
            ResourceNode::Branch { children, .. } => children,
            ResourceNode::Leaf { .. } => &[],
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes()
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// The dedup key (`name` attribute), if present
    pub fn key(&self) -> Option<&str> {
        self.attribute(KEY_ATTRIBUTE)
    }

    /// Parse a whole document and return its root element
    pub fn parse_document(contents: &str) -> Result<Self, XmlError> {
        let mut reader = Reader::from_str(contents);
        reader.check_end_names(true);

        let mut stack: Vec<PendingElement> = Vec::new();
        let mut root: Option<ResourceNode> = None;

        loop {
            match reader.read_event()? {
                Event::Start(ref e) => {
                    stack.push(PendingElement::from_start(e)?);
                }
                Event::Empty(ref e) => {
                    let node = PendingElement::from_start(e)?.finish();
                    attach(&mut stack, &mut root, node)?;
                }
                Event::End(ref e) => {
                    let pending = match stack.pop() {
                        Some(pending) => pending,
                        None => {
                            let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
                            return Err(XmlError::UnexpectedEnd(tag));
                        }
                    };
                    let node = pending.finish();
                    attach(&mut stack, &mut root, node)?;
                }
                Event::Text(ref e) => {
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&e.unescape()?);
                    }
                }
                Event::CData(e) => {
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                    }
                }
                Event::Eof => break,
                // Declarations, comments, processing instructions
                _ => {}
            }
        }

        if let Some(open) = stack.last() {
            return Err(XmlError::Unclosed(open.tag.clone()));
        }

        root.ok_or(XmlError::NoRoot)
    }
}

/// Nodes exactly `depth` levels below `root`, in document order
pub fn nodes_at_depth(root: &ResourceNode, depth: usize) -> Vec<&ResourceNode> {
    let mut level = vec![root];
    for _ in 0..depth {
        level = level.into_iter().flat_map(|node| node.children()).collect();
    }
    level
}

struct PendingElement {
    tag: String,
    attributes: Vec<(String, String)>,
    children: Vec<ResourceNode>,
    text: String,
}

impl PendingElement {
    fn from_start(e: &BytesStart<'_>) -> Result<Self, XmlError> {
        let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
        let mut attributes = Vec::new();
        for attr in e.attributes() {
            let attr = attr.map_err(quick_xml::Error::from)?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
            let value = attr.unescape_value()?.to_string();
            attributes.push((key, value));
        }
        Ok(Self {
            tag,
            attributes,
            children: Vec::new(),
            text: String::new(),
        })
    }

    fn finish(self) -> ResourceNode {
        if self.children.is_empty() {
            ResourceNode::Leaf {
                tag: self.tag,
                attributes: self.attributes,
                text: self.text,
            }
        } else {
            if !self.text.trim().is_empty() {
                trace!("Dropping mixed text inside <{}>", self.tag);
            }
            ResourceNode::Branch {
                tag: self.tag,
                attributes: self.attributes,
                children: self.children,
            }
        }
    }
}

fn attach(
    stack: &mut [PendingElement],
    root: &mut Option<ResourceNode>,
    node: ResourceNode,
) -> Result<(), XmlError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None if root.is_some() => return Err(XmlError::MultipleRoots(node.tag().to_string())),
        None => *root = Some(node),
    }
    Ok(())
}
