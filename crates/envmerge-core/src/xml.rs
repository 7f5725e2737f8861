//! Item-list documents
//!
//! A metadata document in a record-based folder is a root element whose
//! first child element is the items container:
//!
//! ```xml
//! <Root>
//!   <Items>
//!     <Item>...</Item>
//!     <Item>...</Item>
//!   </Items>
//! </Root>
//! ```
//!
//! Tag names are not interpreted. Items are kept as raw quick-xml events, so
//! copying an item into another document reproduces it exactly. Namespace
//! declarations an item inherits from its root or container travel with it:
//! when the target document does not declare them the same way, they are
//! added to the imported item's own start tag.
//!
//! Whitespace-only text outside items (indentation between the root, the
//! container, the items and any other root children) is not kept; the
//! merged document is written without formatting.

use crate::error::{Error, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};
use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const DEFAULT_NAMESPACE: &[u8] = b"xmlns";
const NAMESPACE_PREFIX: &[u8] = b"xmlns:";

/// An `xmlns` or `xmlns:prefix` attribute: (key, raw value)
type NamespaceDecl = (Vec<u8>, Vec<u8>);

/// One child node of the items container, with its whole subtree
#[derive(Debug, Clone, PartialEq)]
pub struct ItemNode {
    events: Vec<Event<'static>>,
    /// Declarations in scope where the item sits (root, then container)
    scope: Vec<NamespaceDecl>,
}

impl ItemNode {
    /// True if the item is an element (as opposed to a comment or text)
    pub fn is_element(&self) -> bool {
        matches!(self.events.first(), Some(Event::Start(_) | Event::Empty(_)))
    }

    /// Tag name of an element item
    pub fn name(&self) -> Option<String> {
        match self.events.first()? {
            Event::Start(start) | Event::Empty(start) => {
                Some(String::from_utf8_lossy(start.name().as_ref()).into_owned())
            }
            _ => None,
        }
    }

    /// Declaration keys the item relies on but does not make itself
    fn required_declarations(&self) -> BTreeSet<Vec<u8>> {
        let mut used = BTreeSet::new();
        let mut declared = BTreeSet::new();

        for event in &self.events {
            let (Event::Start(start) | Event::Empty(start)) = event else {
                continue;
            };

            used.insert(match start.name().prefix() {
                Some(prefix) => [NAMESPACE_PREFIX, prefix.as_ref()].concat(),
                None => DEFAULT_NAMESPACE.to_vec(),
            });

            for attr in start.attributes().flatten() {
                let key = attr.key.as_ref();
                if is_namespace_decl(key) {
                    declared.insert(key.to_vec());
                } else if let Some(prefix) = attr.key.prefix() {
                    if prefix.as_ref() != b"xml" {
                        used.insert([NAMESPACE_PREFIX, prefix.as_ref()].concat());
                    }
                }
            }
        }

        used.difference(&declared).cloned().collect()
    }

    /// Copy of the item for a document whose items container has `target` in scope
    fn rebased(&self, target: &[NamespaceDecl]) -> ItemNode {
        let missing: Vec<NamespaceDecl> = self
            .required_declarations()
            .into_iter()
            .filter_map(|key| {
                let own = lookup_decl(&self.scope, &key);
                if own == lookup_decl(target, &key) {
                    return None;
                }
                // An undeclared prefix has nothing to carry over
                if own.is_empty() && key != DEFAULT_NAMESPACE {
                    return None;
                }
                Some((key, own.to_vec()))
            })
            .collect();

        let mut events = self.events.clone();
        if let Some(Event::Start(start) | Event::Empty(start)) = events.first_mut() {
            for (key, value) in &missing {
                start.push_attribute((key.as_slice(), value.as_slice()));
            }
        }

        ItemNode {
            events,
            scope: target.to_vec(),
        }
    }

    /// Serialize the item on its own
    pub fn to_xml(&self) -> Result<String> {
        let mut writer = Writer::new(Vec::new());
        for event in &self.events {
            write_event(&mut writer, event.clone(), Path::new(""))?;
        }
        Ok(String::from_utf8_lossy(&writer.into_inner()).into_owned())
    }
}

/// A parsed root -> items container -> items document
#[derive(Debug, Clone)]
pub struct ItemListDocument {
    source: PathBuf,
    prologue: Vec<Event<'static>>,
    root: BytesStart<'static>,
    root_head: Vec<Event<'static>>,
    container: BytesStart<'static>,
    namespaces: Vec<NamespaceDecl>,
    items: Vec<ItemNode>,
    root_tail: Vec<Event<'static>>,
    epilogue: Vec<Event<'static>>,
}

impl ItemListDocument {
    /// Load and validate a document from disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::InvalidData => {
                return Err(malformed(path, "document is not valid UTF-8"));
            }
            Err(e) => {
                return Err(Error::FileRead {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        };
        Self::parse(&text, path)
    }

    /// Parse and validate a document from a string
    ///
    /// Whitespace-only text at the root and container levels is dropped, so
    /// formatting outside items is normalised away on output.
    pub fn parse(text: &str, source: impl Into<PathBuf>) -> Result<Self> {
        let source = source.into();
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut reader = Reader::from_str(text);

        let mut prologue = Vec::new();
        let mut root: Option<BytesStart<'static>> = None;
        let mut root_closed = false;
        let mut root_head = Vec::new();
        let mut container: Option<BytesStart<'static>> = None;
        let mut in_container = false;
        let mut items = Vec::new();
        let mut current: Vec<Event<'static>> = Vec::new();
        let mut root_tail = Vec::new();
        let mut epilogue = Vec::new();
        let mut depth = 0usize;

        loop {
            let event = reader
                .read_event()
                .map_err(|e| Error::Xml {
                    path: source.clone(),
                    source: e,
                })?
                .into_owned();

            if matches!(event, Event::Eof) {
                break;
            }

            let opens = matches!(event, Event::Start(_));
            if matches!(event, Event::End(_)) {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| malformed(&source, "unexpected closing tag"))?;
            }

            // Formatting whitespace between structural nodes is not content
            if let Event::Text(text) = &event {
                if depth <= 2 && text.iter().all(u8::is_ascii_whitespace) {
                    continue;
                }
            }

            match depth {
                0 => match event {
                    Event::Start(start) => {
                        if root.is_some() {
                            return Err(malformed(&source, "more than one root element"));
                        }
                        root = Some(start);
                    }
                    Event::Empty(_) => {
                        if root.is_some() {
                            return Err(malformed(&source, "more than one root element"));
                        }
                        return Err(malformed(&source, "root element has no items container"));
                    }
                    Event::End(_) => root_closed = true,
                    Event::Text(_) | Event::CData(_) => {
                        return Err(malformed(&source, "text outside the root element"));
                    }
                    other if root_closed => epilogue.push(other),
                    other => prologue.push(other),
                },
                1 => match event {
                    Event::Start(start) if container.is_none() => {
                        container = Some(start);
                        in_container = true;
                    }
                    Event::Empty(start) if container.is_none() => container = Some(start),
                    Event::End(_) if in_container => in_container = false,
                    other if container.is_none() => root_head.push(other),
                    other => root_tail.push(other),
                },
                _ if in_container => {
                    current.push(event);
                    if depth == 2 && !opens {
                        items.push(ItemNode {
                            events: std::mem::take(&mut current),
                            scope: Vec::new(),
                        });
                    }
                }
                _ => root_tail.push(event),
            }

            if opens {
                depth += 1;
            }
        }

        if depth != 0 {
            return Err(malformed(&source, "unclosed element"));
        }
        let root = root.ok_or_else(|| malformed(&source, "no root element"))?;
        let container =
            container.ok_or_else(|| malformed(&source, "root element has no items container"))?;

        let mut namespaces = namespace_decls(&root, &source)?;
        for (key, value) in namespace_decls(&container, &source)? {
            namespaces.retain(|(k, _)| *k != key);
            namespaces.push((key, value));
        }
        for item in &mut items {
            item.scope = namespaces.clone();
        }

        Ok(Self {
            source,
            prologue,
            root,
            root_head,
            container,
            namespaces,
            items,
            root_tail,
            epilogue,
        })
    }

    /// Path the document was loaded from
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Tag name of the items container
    pub fn container_name(&self) -> String {
        String::from_utf8_lossy(self.container.name().as_ref()).into_owned()
    }

    /// Children of the items container
    pub fn items(&self) -> &[ItemNode] {
        &self.items
    }

    /// Number of children of the items container
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Append one item to the items container
    pub fn append_item(&mut self, item: ItemNode) {
        let item = item.rebased(&self.namespaces);
        self.items.push(item);
    }

    /// Append copies of every item of `other`, in order
    ///
    /// `other` is left untouched. Each copy keeps the namespaces it had in
    /// `other`.
    pub fn import_items(&mut self, other: &ItemListDocument) -> usize {
        let namespaces = &self.namespaces;
        self.items
            .extend(other.items.iter().map(|item| item.rebased(namespaces)));
        other.items.len()
    }

    /// Serialize the document
    pub fn to_xml(&self) -> Result<String> {
        let path = self.source.as_path();
        let mut writer = Writer::new(Vec::new());

        for event in &self.prologue {
            write_event(&mut writer, event.clone(), path)?;
        }
        write_event(&mut writer, Event::Start(self.root.clone()), path)?;
        for event in &self.root_head {
            write_event(&mut writer, event.clone(), path)?;
        }

        if self.items.is_empty() {
            write_event(&mut writer, Event::Empty(self.container.clone()), path)?;
        } else {
            write_event(&mut writer, Event::Start(self.container.clone()), path)?;
            for event in self.items.iter().flat_map(|item| item.events.iter()) {
                write_event(&mut writer, event.clone(), path)?;
            }
            write_event(&mut writer, Event::End(self.container.to_end()), path)?;
        }

        for event in &self.root_tail {
            write_event(&mut writer, event.clone(), path)?;
        }
        write_event(&mut writer, Event::End(self.root.to_end()), path)?;
        for event in &self.epilogue {
            write_event(&mut writer, event.clone(), path)?;
        }

        String::from_utf8(writer.into_inner()).map_err(|e| Error::XmlWrite {
            path: self.source.clone(),
            message: e.to_string(),
        })
    }

    /// Serialize the document to a file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let xml = self.to_xml()?;
        fs::write(path, xml).map_err(|e| Error::FileWrite {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

fn malformed(path: &Path, reason: &str) -> Error {
    Error::MalformedDocument {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

fn is_namespace_decl(key: &[u8]) -> bool {
    key == DEFAULT_NAMESPACE || key.starts_with(NAMESPACE_PREFIX)
}

/// Value declared for `key`; an undeclared key reads as empty
fn lookup_decl<'a>(scope: &'a [NamespaceDecl], key: &[u8]) -> &'a [u8] {
    scope
        .iter()
        .find(|(k, _)| k.as_slice() == key)
        .map(|(_, v)| v.as_slice())
        .unwrap_or_default()
}

fn namespace_decls(start: &BytesStart<'_>, path: &Path) -> Result<Vec<NamespaceDecl>> {
    let mut decls = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| malformed(path, &format!("invalid attribute: {}", e)))?;
        if is_namespace_decl(attr.key.as_ref()) {
            decls.push((attr.key.as_ref().to_vec(), attr.value.into_owned()));
        }
    }
    Ok(decls)
}

fn write_event(writer: &mut Writer<Vec<u8>>, event: Event<'_>, path: &Path) -> Result<()> {
    writer.write_event(event).map_err(|e| Error::XmlWrite {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
