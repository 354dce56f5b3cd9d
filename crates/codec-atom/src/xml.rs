//! Namespace-resolved XML tree over `quick-xml` events.
//!
//! The Atom dialect needs random access over an entry's children (link
//! partitioning, worklist merging) and verbatim capture of unknown subtrees,
//! so decoding goes through this small tree instead of straight off the
//! event stream. Names are kept both as written (for re-serialization) and
//! resolved against the in-scope namespace bindings (for dispatch).

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use odata_payload::MAX_NESTING_DEPTH;

use crate::error::AtomCodecError;
use crate::names;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct XmlAttribute {
    /// Attribute name exactly as written, prefix included.
    pub raw: String,
    pub local: String,
    pub namespace: Option<String>,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum XmlNode {
    Element(XmlElement),
    Text(String),
    /// Pre-serialized XML written through without re-escaping. Only the
    /// encoder produces this, for verbatim annotation subtrees.
    Raw(String),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct XmlElement {
    /// Element name exactly as written, prefix included.
    pub name: String,
    pub local: String,
    pub namespace: Option<String>,
    pub attributes: Vec<XmlAttribute>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let local = local_part(&name).to_string();
        Self {
            name,
            local,
            namespace: None,
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn is(&self, namespace: &str, local: &str) -> bool {
        self.namespace.as_deref() == Some(namespace) && self.local == local
    }

    pub fn attr(&self, namespace: Option<&str>, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.namespace.as_deref() == namespace && a.local == local)
            .map(|a| a.value.as_str())
    }

    pub fn push_attr(&mut self, raw: impl Into<String>, value: impl Into<String>) {
        let raw = raw.into();
        let local = local_part(&raw).to_string();
        self.attributes.push(XmlAttribute {
            raw,
            local,
            namespace: None,
            value: value.into(),
        });
    }

    pub fn push_child(&mut self, child: XmlElement) {
        self.children.push(XmlNode::Element(child));
    }

    pub fn push_text(&mut self, text: impl Into<String>) {
        self.children.push(XmlNode::Text(text.into()));
    }

    pub fn push_raw(&mut self, xml: impl Into<String>) {
        self.children.push(XmlNode::Raw(xml.into()));
    }

    /// Child elements in document order, text nodes skipped.
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|c| match c {
            XmlNode::Element(e) => Some(e),
            _ => None,
        })
    }

    pub fn find(&self, namespace: &str, local: &str) -> Option<&XmlElement> {
        self.elements().find(|e| e.is(namespace, local))
    }

    /// Concatenated text content of this element's direct text children.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            if let XmlNode::Text(t) = child {
                out.push_str(t);
            }
        }
        out
    }

    pub fn has_element_children(&self) -> bool {
        self.elements().next().is_some()
    }
}

fn local_part(name: &str) -> &str {
    match name.split_once(':') {
        Some((_, local)) => local,
        None => name,
    }
}

fn prefix_part(name: &str) -> &str {
    match name.split_once(':') {
        Some((prefix, _)) => prefix,
        None => "",
    }
}

// ── Parsing ───────────────────────────────────────────────────────────────

struct NamespaceScopes {
    // One frame per open element; each frame holds the bindings that element
    // declared. The `xml` prefix is pre-bound in the root frame.
    frames: Vec<Vec<(String, String)>>,
}

impl NamespaceScopes {
    fn new() -> Self {
        Self {
            frames: vec![vec![("xml".to_string(), names::XML_NS.to_string())]],
        }
    }

    fn push(&mut self, bindings: Vec<(String, String)>) {
        self.frames.push(bindings);
    }

    fn pop(&mut self) {
        self.frames.pop();
    }

    fn resolve(&self, prefix: &str) -> Option<String> {
        for frame in self.frames.iter().rev() {
            if let Some((_, uri)) = frame.iter().rev().find(|(p, _)| p == prefix) {
                if uri.is_empty() {
                    // xmlns="" un-declares the default namespace.
                    return None;
                }
                return Some(uri.clone());
            }
        }
        None
    }
}

/// Parses a document into its root element. Leading declaration, comments
/// and processing instructions are skipped.
pub(crate) fn parse(bytes: &[u8]) -> Result<XmlElement, AtomCodecError> {
    let mut reader = Reader::from_reader(bytes);
    let mut scopes = NamespaceScopes::new();
    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                return parse_element(&mut reader, &start, false, &mut scopes, 0)
            }
            Event::Empty(start) => return parse_element(&mut reader, &start, true, &mut scopes, 0),
            Event::Text(text) => {
                if !text.unescape()?.trim().is_empty() {
                    return Err(AtomCodecError::Malformed(
                        "text content outside the root element".to_string(),
                    ));
                }
            }
            Event::CData(_) | Event::End(_) => {
                return Err(AtomCodecError::Malformed(
                    "document does not start with an element".to_string(),
                ))
            }
            Event::Eof => {
                return Err(AtomCodecError::Malformed(
                    "document has no root element".to_string(),
                ))
            }
            _ => {}
        }
    }
}

fn parse_element(
    reader: &mut Reader<&[u8]>,
    start: &BytesStart<'_>,
    empty: bool,
    scopes: &mut NamespaceScopes,
    depth: usize,
) -> Result<XmlElement, AtomCodecError> {
    if depth > MAX_NESTING_DEPTH {
        return Err(AtomCodecError::DepthExceeded(MAX_NESTING_DEPTH));
    }
    let name = utf8_name(start.name().as_ref())?;

    let mut raw_attributes = Vec::new();
    let mut bindings = Vec::new();
    for attr in start.attributes() {
        let attr = attr?;
        let key = utf8_name(attr.key.as_ref())?;
        let value = attr.unescape_value()?.into_owned();
        if key == "xmlns" {
            bindings.push((String::new(), value.clone()));
        } else if let Some(prefix) = key.strip_prefix("xmlns:") {
            bindings.push((prefix.to_string(), value.clone()));
        }
        raw_attributes.push((key, value));
    }
    scopes.push(bindings);

    let namespace = scopes.resolve(prefix_part(&name));
    let attributes = raw_attributes
        .into_iter()
        .map(|(raw, value)| {
            let prefix = prefix_part(&raw);
            // Unprefixed attributes are in no namespace, not the default one.
            let namespace = if prefix.is_empty() || raw.starts_with("xmlns") {
                None
            } else {
                scopes.resolve(prefix)
            };
            XmlAttribute {
                local: local_part(&raw).to_string(),
                namespace,
                raw,
                value,
            }
        })
        .collect();

    let mut element = XmlElement {
        local: local_part(&name).to_string(),
        name,
        namespace,
        attributes,
        children: Vec::new(),
    };

    if !empty {
        loop {
            match reader.read_event()? {
                Event::Start(child) => {
                    let child = parse_element(reader, &child, false, scopes, depth + 1)?;
                    element.children.push(XmlNode::Element(child));
                }
                Event::Empty(child) => {
                    let child = parse_element(reader, &child, true, scopes, depth + 1)?;
                    element.children.push(XmlNode::Element(child));
                }
                Event::Text(text) => {
                    element.children.push(XmlNode::Text(text.unescape()?.into_owned()));
                }
                Event::CData(cdata) => {
                    let text = String::from_utf8_lossy(&cdata.into_inner()).into_owned();
                    element.children.push(XmlNode::Text(text));
                }
                Event::End(_) => break,
                Event::Eof => {
                    return Err(AtomCodecError::Malformed(format!(
                        "element `{}` is never closed",
                        element.name
                    )))
                }
                _ => {}
            }
        }
    }

    scopes.pop();
    Ok(element)
}

fn utf8_name(bytes: &[u8]) -> Result<String, AtomCodecError> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|_| AtomCodecError::Malformed("name is not valid utf-8".to_string()))
}

// ── Writing ───────────────────────────────────────────────────────────────

/// Serializes a tree compactly, optionally with the XML declaration.
pub(crate) fn write_document(
    root: &XmlElement,
    declaration: bool,
) -> Result<Vec<u8>, AtomCodecError> {
    let mut writer = Writer::new(Vec::new());
    if declaration {
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    }
    write_element(&mut writer, root)?;
    Ok(writer.into_inner())
}

/// Serializes one element subtree to a string, used for verbatim capture.
pub(crate) fn element_to_string(element: &XmlElement) -> Result<String, AtomCodecError> {
    let mut writer = Writer::new(Vec::new());
    write_element(&mut writer, element)?;
    Ok(String::from_utf8_lossy(&writer.into_inner()).into_owned())
}

fn write_element(
    writer: &mut Writer<Vec<u8>>,
    element: &XmlElement,
) -> Result<(), AtomCodecError> {
    let mut start = BytesStart::new(element.name.as_str());
    for attr in &element.attributes {
        start.push_attribute((attr.raw.as_str(), attr.value.as_str()));
    }
    if element.children.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }
    writer.write_event(Event::Start(start))?;
    for child in &element.children {
        match child {
            XmlNode::Element(e) => write_element(writer, e)?,
            XmlNode::Text(t) => writer.write_event(Event::Text(BytesText::new(t)))?,
            XmlNode::Raw(xml) => {
                writer.write_event(Event::Text(BytesText::from_escaped(xml.as_str())))?
            }
        }
    }
    writer.write_event(Event::End(BytesEnd::new(element.name.as_str())))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespaces_resolve_through_nested_scopes() {
        let doc = br#"<entry xmlns="http://www.w3.org/2005/Atom" xmlns:m="http://schemas.microsoft.com/ado/2007/08/dataservices/metadata"><m:properties><d:ID xmlns:d="http://schemas.microsoft.com/ado/2007/08/dataservices" m:type="Edm.Int32">1</d:ID></m:properties></entry>"#;
        let root = parse(doc).unwrap();
        assert!(root.is(names::ATOM_NS, "entry"));
        let properties = root.find(names::METADATA_NS, "properties").unwrap();
        let id = properties.find(names::DATA_NS, "ID").unwrap();
        assert_eq!(id.attr(Some(names::METADATA_NS), "type"), Some("Edm.Int32"));
        assert_eq!(id.text(), "1");
    }

    #[test]
    fn unprefixed_attributes_have_no_namespace() {
        let doc = br#"<link xmlns="http://www.w3.org/2005/Atom" rel="edit" href="Products(1)"/>"#;
        let root = parse(doc).unwrap();
        assert_eq!(root.attr(None, "rel"), Some("edit"));
        assert_eq!(root.attr(None, "href"), Some("Products(1)"));
        assert_eq!(root.attr(Some(names::ATOM_NS), "rel"), None);
    }

    #[test]
    fn xml_base_resolves_through_the_builtin_prefix() {
        let doc = br#"<feed xmlns="http://www.w3.org/2005/Atom" xml:base="http://host/svc/"/>"#;
        let root = parse(doc).unwrap();
        assert_eq!(root.attr(Some(names::XML_NS), "base"), Some("http://host/svc/"));
    }

    #[test]
    fn text_escaping_round_trips() {
        let mut element = XmlElement::new("d:Name");
        element.push_attr("xmlns:d", names::DATA_NS);
        element.push_text("a < b & c");
        let bytes = write_document(&element, false).unwrap();
        let back = parse(&bytes).unwrap();
        assert_eq!(back.text(), "a < b & c");
    }

    #[test]
    fn empty_elements_write_self_closed() {
        let element = XmlElement::new("m:null");
        let bytes = write_document(&element, false).unwrap();
        assert_eq!(bytes, b"<m:null/>");
    }

    #[test]
    fn raw_children_pass_through_unescaped() {
        let mut element = XmlElement::new("entry");
        element.push_raw("<title type=\"text\">kept</title>");
        let bytes = write_document(&element, false).unwrap();
        assert_eq!(
            bytes,
            b"<entry><title type=\"text\">kept</title></entry>".as_slice()
        );
    }

    #[test]
    fn declaration_is_optional() {
        let element = XmlElement::new("uri");
        let with = write_document(&element, true).unwrap();
        assert!(with.starts_with(b"<?xml"));
        let without = write_document(&element, false).unwrap();
        assert_eq!(without, b"<uri/>");
    }

    #[test]
    fn unclosed_element_is_malformed() {
        let doc = br#"<entry xmlns="http://www.w3.org/2005/Atom"><id>x</id>"#;
        assert!(matches!(parse(doc), Err(AtomCodecError::Malformed(_))));
    }

    #[test]
    fn default_namespace_undeclaration() {
        let doc = br#"<links xmlns="http://schemas.microsoft.com/ado/2007/08/dataservices"><uri xmlns="">plain</uri></links>"#;
        let root = parse(doc).unwrap();
        let child = root.elements().next().unwrap();
        assert_eq!(child.namespace, None);
        assert_eq!(child.local, "uri");
    }
}
