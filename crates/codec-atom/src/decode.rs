//! Atom/XML to tree.
//!
//! Dispatch is on the root element's resolved name: `feed`, `entry`,
//! data-ns `uri`, `links`, app `service`, `m:error`, `Edmx`, and anything
//! else decodes as a generic property. Entry children are partitioned by
//! `rel` on their links; non-standard children are captured verbatim so a
//! later encode can reproduce them.

use tracing::debug;

use odata_literals::{EdmPrimitiveKind, LiteralCodec, ScalarValue};
use odata_payload::{
    Annotation, ComplexInstance, ComplexMultiValue, ComplexMultiValueProperty, ComplexProperty,
    DeferredLink, EntityInstance, EntitySetInstance, ExpandedLink, LinkCollection,
    MetadataPayloadElement, NamedStreamInstance, NavigationPropertyInstance, NullPropertyInstance,
    ODataErrorPayload, ODataInternalExceptionPayload, PayloadElement, PrimitiveMultiValue,
    PrimitiveMultiValueProperty, PrimitiveProperty, PrimitiveValue, ResourceCollectionInstance,
    ServiceDocumentInstance, WorkspaceInstance,
};

use crate::error::AtomCodecError;
use crate::names;
use crate::xml::{self, XmlElement};
use crate::AtomPayloadCodec;

impl AtomPayloadCodec {
    /// Decodes an Atom/XML payload into an element tree.
    pub fn decode(&self, bytes: &[u8]) -> Result<PayloadElement, AtomCodecError> {
        debug!(len = bytes.len(), "decoding atom payload");
        let root = xml::parse(bytes)?;
        if root.is(names::EDMX_NS, "Edmx") {
            // $metadata is compared as text, so the document rides verbatim.
            return Ok(PayloadElement::MetadataPayloadElement(
                MetadataPayloadElement {
                    text: String::from_utf8_lossy(bytes).into_owned(),
                    annotations: Vec::new(),
                },
            ));
        }
        if root.is(names::ATOM_NS, "feed") {
            return Ok(PayloadElement::EntitySetInstance(self.decode_feed(&root)?));
        }
        if root.is(names::ATOM_NS, "entry") {
            return Ok(PayloadElement::EntityInstance(self.decode_entry(&root)?));
        }
        if root.is(names::DATA_NS, "uri") {
            return Ok(PayloadElement::DeferredLink(DeferredLink::new(root.text())));
        }
        if root.is(names::DATA_NS, "links") {
            return Ok(PayloadElement::LinkCollection(decode_links(&root)?));
        }
        if root.is(names::APP_NS, "service") {
            return Ok(PayloadElement::ServiceDocumentInstance(decode_service(
                &root,
            )?));
        }
        if root.is(names::METADATA_NS, "error") {
            return Ok(PayloadElement::ODataErrorPayload(decode_error(&root)));
        }
        self.decode_property(&root)
    }

    fn decode_feed(&self, feed: &XmlElement) -> Result<EntitySetInstance, AtomCodecError> {
        let mut set = EntitySetInstance::new(Vec::new());
        if let Some(base) = feed.attr(Some(names::XML_NS), "base") {
            set.annotations.push(Annotation::XmlBase(base.to_string()));
        }
        for child in feed.elements() {
            if child.is(names::ATOM_NS, "entry") {
                let entity = self.decode_entry(child)?;
                set.entities.push(entity);
            } else if child.is(names::METADATA_NS, "count") {
                set.inline_count = Some(parse_count(child)?);
            } else if child.is(names::ATOM_NS, "title") {
                set.annotations.push(Annotation::Title(child.text()));
            } else if child.is(names::ATOM_NS, "link") {
                match child.attr(None, "rel") {
                    Some(names::REL_SELF) => {
                        if let Some(href) = child.attr(None, "href") {
                            set.annotations.push(Annotation::SelfLink(href.to_string()));
                        }
                    }
                    Some(names::REL_NEXT) => {
                        set.next_link = child.attr(None, "href").map(str::to_string);
                    }
                    _ => push_epm(&mut set.annotations, child)?,
                }
            } else {
                push_epm(&mut set.annotations, child)?;
            }
        }
        Ok(set)
    }

    fn decode_entry(&self, entry: &XmlElement) -> Result<EntityInstance, AtomCodecError> {
        let mut entity = EntityInstance::new(Vec::new());
        if let Some(etag) = entry.attr(Some(names::METADATA_NS), "etag") {
            entity.etag = Some(etag.to_string());
        }
        if let Some(base) = entry.attr(Some(names::XML_NS), "base") {
            entity.annotations.push(Annotation::XmlBase(base.to_string()));
        }
        // Structural properties decode after all links so navigation and
        // stream wrappers keep their wire position ahead of content.
        let mut structural: Vec<&XmlElement> = Vec::new();
        for child in entry.elements() {
            if child.is(names::ATOM_NS, "id") {
                entity.id = Some(child.text());
            } else if child.is(names::ATOM_NS, "category")
                && child.attr(None, "scheme") == Some(names::SCHEME_NS)
            {
                entity.full_type_name = child.attr(None, "term").map(str::to_string);
            } else if child.is(names::ATOM_NS, "link") {
                self.decode_entry_link(child, &mut entity)?;
            } else if child.is(names::ATOM_NS, "content") {
                let content_type = child.attr(None, "type");
                if let Some(src) = child.attr(None, "src") {
                    entity.stream_source_link = Some(src.to_string());
                    entity.stream_content_type = content_type.map(str::to_string);
                } else {
                    if let Some(content_type) = content_type {
                        entity
                            .annotations
                            .push(Annotation::ContentType(content_type.to_string()));
                    }
                    if let Some(properties) = child.find(names::METADATA_NS, "properties") {
                        structural.push(properties);
                    }
                }
            } else if child.is(names::METADATA_NS, "properties") {
                // Media link entries carry properties beside content.
                structural.push(child);
            } else {
                push_epm(&mut entity.annotations, child)?;
            }
        }
        for properties in structural {
            for property in properties.elements() {
                let decoded = self.decode_property(property)?;
                entity.properties.push(decoded);
            }
        }
        Ok(entity)
    }

    fn decode_entry_link(
        &self,
        link: &XmlElement,
        entity: &mut EntityInstance,
    ) -> Result<(), AtomCodecError> {
        let rel = match link.attr(None, "rel") {
            Some(rel) => rel,
            None => return push_epm(&mut entity.annotations, link),
        };
        let href = link.attr(None, "href").map(str::to_string);
        if rel == names::REL_EDIT {
            entity.edit_link = href;
        } else if rel == names::REL_SELF {
            if let Some(href) = href {
                entity.annotations.push(Annotation::SelfLink(href));
            }
        } else if rel == names::REL_EDIT_MEDIA {
            entity.stream_edit_link = href;
            if let Some(etag) = link.attr(Some(names::METADATA_NS), "etag") {
                entity.stream_etag = Some(etag.to_string());
            }
        } else if let Some(name) = rel.strip_prefix(names::RELATED_REL) {
            let value = self.decode_navigation_value(link, name, href)?;
            entity
                .properties
                .push(PayloadElement::NavigationPropertyInstance(
                    NavigationPropertyInstance::new(name, value),
                ));
        } else if let Some(name) = rel.strip_prefix(names::RELATED_LINKS_REL) {
            let uri = href.ok_or_else(|| {
                AtomCodecError::Malformed(format!("association link `{name}` has no href"))
            })?;
            attach_association(entity, name, &uri);
        } else if let Some(name) = rel.strip_prefix(names::MEDIA_RESOURCE_REL) {
            let content_type = link.attr(None, "type").map(str::to_string);
            attach_stream_source(entity, name, href, content_type);
        } else if let Some(name) = rel.strip_prefix(names::MEDIA_RESOURCE_EDIT_REL) {
            let content_type = link.attr(None, "type").map(str::to_string);
            let etag = link
                .attr(Some(names::METADATA_NS), "etag")
                .map(str::to_string);
            attach_stream_edit(entity, name, href, content_type, etag);
        } else {
            push_epm(&mut entity.annotations, link)?;
        }
        Ok(())
    }

    fn decode_navigation_value(
        &self,
        link: &XmlElement,
        name: &str,
        href: Option<String>,
    ) -> Result<PayloadElement, AtomCodecError> {
        let inline = match link.find(names::METADATA_NS, "inline") {
            Some(inline) => inline,
            None => {
                let uri = href.ok_or_else(|| {
                    AtomCodecError::Malformed(format!("navigation link `{name}` has no href"))
                })?;
                return Ok(PayloadElement::DeferredLink(DeferredLink::new(uri)));
            }
        };
        let expanded_element = match inline.elements().next() {
            // An empty inline element is an expanded null entity.
            None => None,
            Some(el) if el.is(names::ATOM_NS, "entry") => Some(Box::new(
                PayloadElement::EntityInstance(self.decode_entry(el)?),
            )),
            Some(el) if el.is(names::ATOM_NS, "feed") => Some(Box::new(
                PayloadElement::EntitySetInstance(self.decode_feed(el)?),
            )),
            Some(el) => {
                return Err(AtomCodecError::Malformed(format!(
                    "inline expansion of `{name}` holds `{}`",
                    el.name
                )))
            }
        };
        Ok(PayloadElement::ExpandedLink(ExpandedLink {
            uri: href,
            expanded_element,
            annotations: Vec::new(),
        }))
    }

    fn decode_property(&self, element: &XmlElement) -> Result<PayloadElement, AtomCodecError> {
        let name = element.local.clone();
        let type_name = element
            .attr(Some(names::METADATA_NS), "type")
            .map(str::to_string);
        if element.attr(Some(names::METADATA_NS), "null") == Some("true") {
            return Ok(PayloadElement::NullPropertyInstance(
                NullPropertyInstance::new(name, type_name),
            ));
        }
        if let Some(full) = &type_name {
            if let Some(element_type) = names::multi_value_element(full) {
                return self.decode_multi_value(element, &name, full, element_type);
            }
        }
        if element.has_element_children() || is_complex_type(type_name.as_deref()) {
            let complex = self.decode_complex(element, type_name)?;
            return Ok(PayloadElement::ComplexProperty(ComplexProperty::new(
                name, complex,
            )));
        }
        let kind = type_name.as_deref().and_then(EdmPrimitiveKind::try_parse);
        let scalar = self.literals().deserialize(&element.text(), kind)?;
        let mut value = PrimitiveValue::new(scalar);
        value.full_type_name = type_name;
        Ok(PayloadElement::PrimitiveProperty(PrimitiveProperty::new(
            name, value,
        )))
    }

    fn decode_complex(
        &self,
        element: &XmlElement,
        full_type_name: Option<String>,
    ) -> Result<ComplexInstance, AtomCodecError> {
        let mut complex = ComplexInstance::new(Vec::new());
        complex.full_type_name = full_type_name;
        for child in element.elements() {
            let property = self.decode_property(child)?;
            complex.properties.push(property);
        }
        Ok(complex)
    }

    fn decode_multi_value(
        &self,
        element: &XmlElement,
        name: &str,
        full_type: &str,
        element_type: &str,
    ) -> Result<PayloadElement, AtomCodecError> {
        let items: Vec<&XmlElement> = element.elements().collect();
        for item in &items {
            if !item.is(names::DATA_NS, "element") {
                return Err(AtomCodecError::Malformed(format!(
                    "multi-value `{name}` holds `{}` instead of `d:element`",
                    item.name
                )));
            }
        }
        match EdmPrimitiveKind::try_parse(element_type) {
            Some(kind) => {
                let mut values = Vec::new();
                for item in items {
                    if item.attr(Some(names::METADATA_NS), "null") == Some("true") {
                        values.push(PrimitiveValue::new(ScalarValue::Null));
                    } else {
                        let scalar = self.literals().deserialize(&item.text(), Some(kind))?;
                        values.push(PrimitiveValue::new(scalar));
                    }
                }
                Ok(PayloadElement::PrimitiveMultiValueProperty(
                    PrimitiveMultiValueProperty::new(
                        name,
                        PrimitiveMultiValue {
                            full_type_name: Some(full_type.to_string()),
                            is_null: false,
                            items: values,
                            annotations: Vec::new(),
                        },
                    ),
                ))
            }
            None => {
                let mut values = Vec::new();
                for item in items {
                    let item_type = item
                        .attr(Some(names::METADATA_NS), "type")
                        .map(str::to_string);
                    if item.attr(Some(names::METADATA_NS), "null") == Some("true") {
                        values.push(ComplexInstance::null(item_type));
                    } else {
                        values.push(self.decode_complex(item, item_type)?);
                    }
                }
                Ok(PayloadElement::ComplexMultiValueProperty(
                    ComplexMultiValueProperty::new(
                        name,
                        ComplexMultiValue {
                            full_type_name: Some(full_type.to_string()),
                            is_null: false,
                            items: values,
                            annotations: Vec::new(),
                        },
                    ),
                ))
            }
        }
    }
}

// ── Link worklists ────────────────────────────────────────────────────────

fn attach_association(entity: &mut EntityInstance, name: &str, uri: &str) {
    let slot = entity
        .properties
        .iter_mut()
        .find_map(|property| match property {
            PayloadElement::NavigationPropertyInstance(nav)
                if nav.name == name && nav.association_link.is_none() =>
            {
                Some(nav)
            }
            _ => None,
        });
    match slot {
        Some(nav) => nav.association_link = Some(DeferredLink::new(uri)),
        None => entity
            .properties
            .push(PayloadElement::NavigationPropertyInstance(
                NavigationPropertyInstance {
                    name: name.to_string(),
                    value: None,
                    association_link: Some(DeferredLink::new(uri)),
                    annotations: Vec::new(),
                },
            )),
    }
}

fn attach_stream_source(
    entity: &mut EntityInstance,
    name: &str,
    href: Option<String>,
    content_type: Option<String>,
) {
    // First stream of this name whose source half is still empty; a second
    // source link for the same name starts a new node instead of clobbering.
    let slot = entity
        .properties
        .iter_mut()
        .find_map(|property| match property {
            PayloadElement::NamedStreamInstance(stream)
                if stream.name == name
                    && stream.source_link.is_none()
                    && stream.source_content_type.is_none() =>
            {
                Some(stream)
            }
            _ => None,
        });
    match slot {
        Some(stream) => {
            stream.source_link = href;
            stream.source_content_type = content_type;
        }
        None => {
            let mut stream = NamedStreamInstance::new(name);
            stream.source_link = href;
            stream.source_content_type = content_type;
            entity
                .properties
                .push(PayloadElement::NamedStreamInstance(stream));
        }
    }
}

fn attach_stream_edit(
    entity: &mut EntityInstance,
    name: &str,
    href: Option<String>,
    content_type: Option<String>,
    etag: Option<String>,
) {
    let slot = entity
        .properties
        .iter_mut()
        .find_map(|property| match property {
            PayloadElement::NamedStreamInstance(stream)
                if stream.name == name
                    && stream.edit_link.is_none()
                    && stream.edit_content_type.is_none() =>
            {
                Some(stream)
            }
            _ => None,
        });
    match slot {
        Some(stream) => {
            stream.edit_link = href;
            stream.edit_content_type = content_type;
            stream.etag = etag;
        }
        None => {
            let mut stream = NamedStreamInstance::new(name);
            stream.edit_link = href;
            stream.edit_content_type = content_type;
            stream.etag = etag;
            entity
                .properties
                .push(PayloadElement::NamedStreamInstance(stream));
        }
    }
}

// ── Non-entry roots ───────────────────────────────────────────────────────

fn decode_links(links: &XmlElement) -> Result<LinkCollection, AtomCodecError> {
    let mut collection = LinkCollection::default();
    for child in links.elements() {
        if child.is(names::DATA_NS, "uri") {
            collection.links.push(DeferredLink::new(child.text()));
        } else if child.is(names::METADATA_NS, "count") {
            collection.inline_count = Some(parse_count(child)?);
        } else if child.is(names::DATA_NS, "next") {
            collection.next_link = Some(child.text());
        } else {
            return Err(AtomCodecError::Malformed(format!(
                "unexpected `{}` in a links collection",
                child.name
            )));
        }
    }
    Ok(collection)
}

fn decode_service(service: &XmlElement) -> Result<ServiceDocumentInstance, AtomCodecError> {
    let mut doc = ServiceDocumentInstance::default();
    for workspace_el in service
        .elements()
        .filter(|e| e.is(names::APP_NS, "workspace"))
    {
        let mut workspace = WorkspaceInstance::default();
        for child in workspace_el.elements() {
            if child.is(names::ATOM_NS, "title") {
                workspace.title = Some(child.text());
            } else if child.is(names::APP_NS, "collection") {
                let href = child.attr(None, "href").ok_or_else(|| {
                    AtomCodecError::Malformed("collection without an href".to_string())
                })?;
                let mut collection = ResourceCollectionInstance::new(href);
                if let Some(title) = child.find(names::ATOM_NS, "title") {
                    collection.title = Some(title.text());
                }
                workspace.collections.push(collection);
            }
        }
        doc.workspaces.push(workspace);
    }
    Ok(doc)
}

fn decode_error(error: &XmlElement) -> ODataErrorPayload {
    let mut payload = ODataErrorPayload::default();
    for child in error.elements() {
        if child.is(names::METADATA_NS, "code") {
            payload.code = Some(child.text());
        } else if child.is(names::METADATA_NS, "message") {
            payload.message = Some(child.text());
            payload.message_language = child.attr(Some(names::XML_NS), "lang").map(str::to_string);
        } else if child.is(names::METADATA_NS, "innererror") {
            payload.inner_error = Some(Box::new(decode_inner_error(child)));
        }
    }
    payload
}

fn decode_inner_error(inner: &XmlElement) -> ODataInternalExceptionPayload {
    let mut payload = ODataInternalExceptionPayload::default();
    for child in inner.elements() {
        if child.is(names::METADATA_NS, "message") {
            payload.message = Some(child.text());
        } else if child.is(names::METADATA_NS, "type") {
            payload.type_name = Some(child.text());
        } else if child.is(names::METADATA_NS, "stacktrace") {
            payload.stack_trace = Some(child.text());
        } else if child.is(names::METADATA_NS, "internalexception") {
            payload.internal_exception = Some(Box::new(decode_inner_error(child)));
        }
    }
    payload
}

fn is_complex_type(type_name: Option<&str>) -> bool {
    match type_name {
        Some(name) => EdmPrimitiveKind::try_parse(name).is_none(),
        None => false,
    }
}

fn parse_count(element: &XmlElement) -> Result<i64, AtomCodecError> {
    let text = element.text();
    text.trim()
        .parse()
        .map_err(|_| AtomCodecError::Malformed(format!("unreadable m:count `{}`", text.trim())))
}

fn push_epm(annotations: &mut Vec<Annotation>, element: &XmlElement) -> Result<(), AtomCodecError> {
    annotations.push(Annotation::EpmXml {
        element: element.local.clone(),
        xml: xml::element_to_string(element)?,
    });
    Ok(())
}
