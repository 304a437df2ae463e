//! A small owned XML tree for the parts stencil rewrites.
//!
//! Text and attribute values are kept exactly as they appear in the source
//! (still escaped), so untouched content is written back byte-for-byte and is
//! never escaped twice. Elements are always written as a start/end pair: strict
//! spreadsheet readers reject `<v/>` where they expect `<v></v>`.

use std::borrow::Cow;

use quick_xml::escape::unescape;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::reader::Reader;
use quick_xml::writer::Writer;

use crate::error::{XlsxError, XlsxResult};

/// A node in the tree
#[derive(Debug, Clone)]
pub enum Node {
    /// Element with attributes and children
    Element(Element),
    /// Character data, still escaped
    Text(String),
    /// Anything else (declaration, comment, CDATA, processing instruction),
    /// passed through unchanged
    Other(Event<'static>),
}

/// An XML element
#[derive(Debug, Clone, Default)]
pub struct Element {
    name: String,
    /// Attribute keys and their raw (escaped) values, in source order
    attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    /// Create an element with no attributes or children
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    fn from_start(start: &BytesStart<'_>) -> XlsxResult<Self> {
        let name = String::from_utf8(start.name().as_ref().to_vec())?;
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr?;
            let key = String::from_utf8(attr.key.as_ref().to_vec())?;
            let value = String::from_utf8(attr.value.into_owned())?;
            attributes.push((key, value));
        }
        Ok(Self {
            name,
            attributes,
            children: Vec::new(),
        })
    }

    /// Qualified name, as written in the source
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name without its namespace prefix
    pub fn local_name(&self) -> &str {
        match self.name.split_once(':') {
            Some((_, local)) => local,
            None => &self.name,
        }
    }

    /// Namespace prefix, if the element has one
    pub fn prefix(&self) -> Option<&str> {
        self.name.split_once(':').map(|(prefix, _)| prefix)
    }

    /// A name in the same namespace prefix as this element. New children get the
    /// prefix their parent uses, so `x:row` grows `x:c` cells.
    pub fn sibling_name(&self, local: &str) -> String {
        match self.prefix() {
            Some(prefix) => format!("{}:{}", prefix, local),
            None => local.to_owned(),
        }
    }

    /// Raw (still escaped) attribute value
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Unescaped attribute value. Malformed escapes yield the raw value.
    pub fn attribute_value(&self, key: &str) -> Option<Cow<'_, str>> {
        self.attribute(key)
            .map(|raw| unescape(raw).unwrap_or(Cow::Borrowed(raw)))
    }

    /// Set an attribute from a raw (already escaped) value, keeping its position
    /// when it already exists.
    pub fn set_attribute<K: Into<String>, V: Into<String>>(&mut self, key: K, raw_value: V) {
        let key = key.into();
        let raw_value = raw_value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => *v = raw_value,
            None => self.attributes.push((key, raw_value)),
        }
    }

    /// Remove an attribute; returns whether it was present
    pub fn remove_attribute(&mut self, key: &str) -> bool {
        let before = self.attributes.len();
        self.attributes.retain(|(k, _)| k != key);
        before != self.attributes.len()
    }

    /// Child elements, in order
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(el) => Some(el),
            _ => None,
        })
    }

    /// First child element with the given local name
    pub fn child(&self, local: &str) -> Option<&Element> {
        self.elements().find(|el| el.local_name() == local)
    }

    /// First child element with the given local name, mutably
    pub fn child_mut(&mut self, local: &str) -> Option<&mut Element> {
        self.children.iter_mut().find_map(|node| match node {
            Node::Element(el) if el.local_name() == local => Some(el),
            _ => None,
        })
    }

    /// Whether a child element with the given local name exists
    pub fn has_child(&self, local: &str) -> bool {
        self.child(local).is_some()
    }

    /// Remove every child element with the given local name; returns how many went
    pub fn remove_children(&mut self, local: &str) -> usize {
        self.remove_children_where(|el| el.local_name() == local)
    }

    /// Remove every child element matching `predicate`; returns how many went
    pub fn remove_children_where<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&Element) -> bool,
    {
        let before = self.children.len();
        self.children
            .retain(|node| !matches!(node, Node::Element(el) if predicate(el)));
        before - self.children.len()
    }

    /// Get the child with the given local name, creating it when missing.
    ///
    /// A new child is placed before the first existing child whose local name is
    /// in `before`, or appended, so schema sequence order is kept.
    pub fn child_or_insert(&mut self, local: &str, before: &[&str]) -> &mut Element {
        let existing = self.children.iter().position(
            |node| matches!(node, Node::Element(el) if el.local_name() == local),
        );
        let index = match existing {
            Some(index) => index,
            None => {
                let child = Element::new(self.sibling_name(local));
                let at = self
                    .children
                    .iter()
                    .position(|node| {
                        matches!(node, Node::Element(el) if before.contains(&el.local_name()))
                    })
                    .unwrap_or(self.children.len());
                self.children.insert(at, Node::Element(child));
                at
            }
        };
        match &mut self.children[index] {
            Node::Element(el) => el,
            // The index was located as an element above
            _ => unreachable!("child_or_insert index must point at an element"),
        }
    }

    /// Concatenated raw text of the direct text children
    pub fn raw_text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                Node::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Unescaped text content of the direct text children
    pub fn text(&self) -> String {
        let raw = self.raw_text();
        match unescape(&raw) {
            Ok(text) => text.into_owned(),
            Err(_) => raw,
        }
    }

    /// Replace all children with a single text node. `text` is escaped here.
    pub fn set_text(&mut self, text: &str) {
        self.children = vec![Node::Text(escape(text))];
    }
}

/// Escape the four markup metacharacters (`&`, `<`, `>`, `"`).
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}

/// A parsed XML part
#[derive(Debug, Clone)]
pub struct XmlDocument {
    /// Declaration, comments and whitespace before the root element
    pub prolog: Vec<Node>,
    pub root: Element,
    /// Whatever follows the root element
    pub epilog: Vec<Node>,
}

impl XmlDocument {
    /// Parse a UTF-8 XML part
    pub fn parse(bytes: &[u8]) -> XlsxResult<Self> {
        let mut reader = Reader::from_reader(bytes);
        reader.trim_text(false);
        reader.expand_empty_elements(true);

        let mut buf = Vec::new();
        let mut stack: Vec<Element> = Vec::new();
        let mut prolog = Vec::new();
        let mut root: Option<Element> = None;
        let mut epilog = Vec::new();

        loop {
            let node = match reader.read_event_into(&mut buf)? {
                Event::Start(e) => {
                    stack.push(Element::from_start(&e)?);
                    None
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| XlsxError::malformed("unbalanced end tag"))?;
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(Node::Element(element)),
                        None if root.is_none() => root = Some(element),
                        None => return Err(XlsxError::malformed("more than one root element")),
                    }
                    None
                }
                Event::Text(e) => Some(Node::Text(String::from_utf8(e.into_inner().into_owned())?)),
                Event::Eof => break,
                other => Some(Node::Other(other.into_owned())),
            };

            if let Some(node) = node {
                match stack.last_mut() {
                    Some(parent) => parent.children.push(node),
                    None if root.is_none() => prolog.push(node),
                    None => epilog.push(node),
                }
            }
            buf.clear();
        }

        if !stack.is_empty() {
            return Err(XlsxError::malformed("unexpected end of document"));
        }
        let root = root.ok_or_else(|| XlsxError::malformed("document has no root element"))?;

        Ok(Self {
            prolog,
            root,
            epilog,
        })
    }

    /// Serialize the document, writing every element as a start/end pair
    pub fn to_bytes(&self) -> XlsxResult<Vec<u8>> {
        let mut writer = Writer::new(Vec::new());
        for node in &self.prolog {
            write_node(&mut writer, node)?;
        }
        write_element(&mut writer, &self.root)?;
        for node in &self.epilog {
            write_node(&mut writer, node)?;
        }
        Ok(writer.into_inner())
    }
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &Node) -> XlsxResult<()> {
    match node {
        Node::Element(el) => write_element(writer, el)?,
        Node::Text(text) => writer.write_event(Event::Text(BytesText::from_escaped(text.as_str())))?,
        Node::Other(event) => writer.write_event(event.clone())?,
    }
    Ok(())
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element) -> XlsxResult<()> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        // Values read from single-quoted attributes may hold a bare `"`
        let value: Cow<'_, str> = if value.contains('"') {
            Cow::Owned(value.replace('"', "&quot;"))
        } else {
            Cow::Borrowed(value.as_str())
        };
        start.push_attribute((key.as_bytes(), value.as_bytes()));
    }
    writer.write_event(Event::Start(start))?;
    for child in &element.children {
        write_node(writer, child)?;
    }
    writer.write_event(Event::End(BytesEnd::new(element.name.as_str())))?;
    Ok(())
}
