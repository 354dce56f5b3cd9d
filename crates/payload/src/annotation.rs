//! Annotation bag attached to every payload element.
//!
//! Annotations are side-channel facts recorded by codecs and later passes
//! without changing a node's shape. The bag is an ordered `Vec` so that
//! re-serialization stays deterministic; consumers that need set semantics
//! (the differ) impose them at comparison time.

/// One annotation. Each kind appears at most a handful of times per node;
/// `EpmXml` is the only kind that routinely repeats.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Annotation {
    /// Content type demanded for an Atom `content` element or carried by a
    /// batch part.
    ContentType(String),
    /// `xml:base` attribute captured from an Atom root.
    XmlBase(String),
    /// EDM type name attached by a metadata-resolution pass.
    ResolvedType(String),
    /// Raw text override: serializers emit this text verbatim instead of
    /// encoding the node structurally.
    RawText(String),
    /// Whether a JSON collection was (or should be) wrapped in
    /// `{"results": …}`. `false` suppresses the wrapper on encode.
    ResultsWrapper(bool),
    /// Atom `rel="self"` link captured on an entity or feed.
    SelfLink(String),
    /// Raw XML subtree found at a non-standard location inside an `entry`;
    /// round-trips byte-for-byte.
    EpmXml { element: String, xml: String },
    /// Atom/AtomPub title text.
    Title(String),
}

/// Fieldless tags, used for the differ's ignore list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnnotationKind {
    ContentType,
    XmlBase,
    ResolvedType,
    RawText,
    ResultsWrapper,
    SelfLink,
    EpmXml,
    Title,
}

impl Annotation {
    pub fn kind(&self) -> AnnotationKind {
        match self {
            Annotation::ContentType(_) => AnnotationKind::ContentType,
            Annotation::XmlBase(_) => AnnotationKind::XmlBase,
            Annotation::ResolvedType(_) => AnnotationKind::ResolvedType,
            Annotation::RawText(_) => AnnotationKind::RawText,
            Annotation::ResultsWrapper(_) => AnnotationKind::ResultsWrapper,
            Annotation::SelfLink(_) => AnnotationKind::SelfLink,
            Annotation::EpmXml { .. } => AnnotationKind::EpmXml,
            Annotation::Title(_) => AnnotationKind::Title,
        }
    }
}

/// Typed lookups over an annotation slice.
pub trait AnnotationBag {
    fn content_type(&self) -> Option<&str>;
    fn xml_base(&self) -> Option<&str>;
    fn resolved_type(&self) -> Option<&str>;
    fn raw_text(&self) -> Option<&str>;
    fn results_wrapper(&self) -> Option<bool>;
    fn self_link(&self) -> Option<&str>;
    fn title(&self) -> Option<&str>;
    fn epm_xml(&self) -> Vec<(&str, &str)>;
}

impl AnnotationBag for [Annotation] {
    fn content_type(&self) -> Option<&str> {
        self.iter().find_map(|a| match a {
            Annotation::ContentType(s) => Some(s.as_str()),
            _ => None,
        })
    }

    fn xml_base(&self) -> Option<&str> {
        self.iter().find_map(|a| match a {
            Annotation::XmlBase(s) => Some(s.as_str()),
            _ => None,
        })
    }

    fn resolved_type(&self) -> Option<&str> {
        self.iter().find_map(|a| match a {
            Annotation::ResolvedType(s) => Some(s.as_str()),
            _ => None,
        })
    }

    fn raw_text(&self) -> Option<&str> {
        self.iter().find_map(|a| match a {
            Annotation::RawText(s) => Some(s.as_str()),
            _ => None,
        })
    }

    fn results_wrapper(&self) -> Option<bool> {
        self.iter().find_map(|a| match a {
            Annotation::ResultsWrapper(b) => Some(*b),
            _ => None,
        })
    }

    fn self_link(&self) -> Option<&str> {
        self.iter().find_map(|a| match a {
            Annotation::SelfLink(s) => Some(s.as_str()),
            _ => None,
        })
    }

    fn title(&self) -> Option<&str> {
        self.iter().find_map(|a| match a {
            Annotation::Title(s) => Some(s.as_str()),
            _ => None,
        })
    }

    fn epm_xml(&self) -> Vec<(&str, &str)> {
        self.iter()
            .filter_map(|a| match a {
                Annotation::EpmXml { element, xml } => Some((element.as_str(), xml.as_str())),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bag_lookup_finds_first_of_kind() {
        let bag = vec![
            Annotation::Title("first".into()),
            Annotation::ContentType("application/xml".into()),
            Annotation::Title("second".into()),
        ];
        assert_eq!(bag.title(), Some("first"));
        assert_eq!(bag.content_type(), Some("application/xml"));
        assert_eq!(bag.raw_text(), None);
    }

    #[test]
    fn epm_entries_keep_insertion_order() {
        let bag = vec![
            Annotation::EpmXml {
                element: "rights".into(),
                xml: "<rights>a</rights>".into(),
            },
            Annotation::EpmXml {
                element: "summary".into(),
                xml: "<summary>b</summary>".into(),
            },
        ];
        let entries = bag.epm_xml();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, "rights");
        assert_eq!(entries[1].0, "summary");
    }
}
