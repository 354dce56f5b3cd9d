//! Tree to Atom/XML.
//!
//! Encoding is the mirror of decode: entries write identity first (id,
//! category), then captured foreign markup verbatim, then links in property
//! order, then content. The canonical child order means a decoded tree
//! re-encodes to the same document shape it came from.

use tracing::debug;

use odata_literals::LiteralCodec;
use odata_payload::{
    AnnotationBag, ComplexInstance, EntityInstance, EntitySetInstance, LinkCollection,
    NamedStreamInstance, NavigationPropertyInstance, ODataErrorPayload,
    ODataInternalExceptionPayload, PayloadElement, ServiceDocumentInstance,
};

use crate::error::AtomCodecError;
use crate::names;
use crate::xml::{self, XmlElement};
use crate::AtomPayloadCodec;

impl AtomPayloadCodec {
    /// Encodes an element tree as an Atom/XML document.
    pub fn encode(&self, element: &PayloadElement) -> Result<Vec<u8>, AtomCodecError> {
        debug!(kind = %element.kind(), "encoding atom payload");
        if let PayloadElement::MetadataPayloadElement(metadata) = element {
            // Rides verbatim; see decode.
            return Ok(metadata.text.clone().into_bytes());
        }
        let root = self.encode_root(element)?;
        xml::write_document(&root, self.options.write_declaration)
    }

    fn encode_root(&self, element: &PayloadElement) -> Result<XmlElement, AtomCodecError> {
        match element {
            PayloadElement::EntitySetInstance(set) => self.encode_feed(set, true),
            PayloadElement::EntityInstance(entity) => self.encode_entry(entity, true),
            PayloadElement::DeferredLink(link) => {
                let mut uri = XmlElement::new("uri");
                uri.push_attr("xmlns", names::DATA_NS);
                uri.push_text(&link.uri);
                Ok(uri)
            }
            PayloadElement::LinkCollection(links) => Ok(encode_links(links)),
            PayloadElement::ServiceDocumentInstance(doc) => Ok(encode_service(doc)),
            PayloadElement::ODataErrorPayload(error) => Ok(encode_error(error)),
            PayloadElement::PrimitiveProperty(_)
            | PayloadElement::ComplexProperty(_)
            | PayloadElement::NullPropertyInstance(_)
            | PayloadElement::PrimitiveMultiValueProperty(_)
            | PayloadElement::ComplexMultiValueProperty(_) => {
                let mut property = self.encode_property_element(element)?;
                property.push_attr("xmlns:d", names::DATA_NS);
                property.push_attr("xmlns:m", names::METADATA_NS);
                Ok(property)
            }
            other => Err(AtomCodecError::Unencodable(other.kind())),
        }
    }

    fn encode_feed(&self, set: &EntitySetInstance, root: bool) -> Result<XmlElement, AtomCodecError> {
        let mut feed = XmlElement::new("feed");
        if root {
            feed.push_attr("xmlns", names::ATOM_NS);
            feed.push_attr("xmlns:d", names::DATA_NS);
            feed.push_attr("xmlns:m", names::METADATA_NS);
        }
        if let Some(base) = set.annotations.xml_base() {
            feed.push_attr("xml:base", base);
        }
        if let Some(title) = set.annotations.title() {
            let mut el = XmlElement::new("title");
            el.push_attr("type", "text");
            el.push_text(title);
            feed.push_child(el);
        }
        if let Some(count) = set.inline_count {
            let mut el = XmlElement::new("m:count");
            el.push_text(count.to_string());
            feed.push_child(el);
        }
        for (_, epm) in set.annotations.epm_xml() {
            feed.push_raw(epm);
        }
        if let Some(href) = set.annotations.self_link() {
            feed.push_child(link_element(names::REL_SELF, Some(href)));
        }
        for entity in &set.entities {
            let entry = self.encode_entry(entity, false)?;
            feed.push_child(entry);
        }
        if let Some(next) = &set.next_link {
            feed.push_child(link_element(names::REL_NEXT, Some(next)));
        }
        Ok(feed)
    }

    fn encode_entry(
        &self,
        entity: &EntityInstance,
        root: bool,
    ) -> Result<XmlElement, AtomCodecError> {
        let mut entry = XmlElement::new("entry");
        if root {
            entry.push_attr("xmlns", names::ATOM_NS);
            entry.push_attr("xmlns:d", names::DATA_NS);
            entry.push_attr("xmlns:m", names::METADATA_NS);
        }
        if let Some(base) = entity.annotations.xml_base() {
            entry.push_attr("xml:base", base);
        }
        if let Some(etag) = &entity.etag {
            entry.push_attr("m:etag", etag);
        }
        if let Some(id) = &entity.id {
            let mut el = XmlElement::new("id");
            el.push_text(id);
            entry.push_child(el);
        }
        if let Some(term) = &entity.full_type_name {
            let mut category = XmlElement::new("category");
            category.push_attr("term", term);
            category.push_attr("scheme", names::SCHEME_NS);
            entry.push_child(category);
        }
        for (_, epm) in entity.annotations.epm_xml() {
            entry.push_raw(epm);
        }
        // Links stay in property order so a decode of the output rebuilds
        // the property list as it was.
        let mut structural: Vec<&PayloadElement> = Vec::new();
        for property in &entity.properties {
            match property {
                PayloadElement::NavigationPropertyInstance(nav) => {
                    self.encode_navigation_links(nav, &mut entry)?;
                }
                PayloadElement::NamedStreamInstance(stream) => {
                    encode_stream_links(stream, &mut entry);
                }
                other => structural.push(other),
            }
        }
        if let Some(edit) = &entity.edit_link {
            entry.push_child(link_element(names::REL_EDIT, Some(edit)));
        }
        if let Some(href) = entity.annotations.self_link() {
            entry.push_child(link_element(names::REL_SELF, Some(href)));
        }
        if entity.is_media_link_entry() {
            if entity.stream_edit_link.is_some() || entity.stream_etag.is_some() {
                let mut link = link_element(names::REL_EDIT_MEDIA, entity.stream_edit_link.as_deref());
                if let Some(etag) = &entity.stream_etag {
                    link.push_attr("m:etag", etag);
                }
                entry.push_child(link);
            }
            let mut content = XmlElement::new("content");
            if let Some(content_type) = &entity.stream_content_type {
                content.push_attr("type", content_type);
            }
            if let Some(src) = &entity.stream_source_link {
                content.push_attr("src", src);
            }
            entry.push_child(content);
            if !structural.is_empty() {
                entry.push_child(self.encode_properties_element(&structural)?);
            }
        } else if !structural.is_empty() || entity.annotations.content_type().is_some() {
            let mut content = XmlElement::new("content");
            let content_type = entity
                .annotations
                .content_type()
                .unwrap_or("application/xml");
            content.push_attr("type", content_type);
            if !structural.is_empty() {
                content.push_child(self.encode_properties_element(&structural)?);
            }
            entry.push_child(content);
        }
        Ok(entry)
    }

    fn encode_navigation_links(
        &self,
        nav: &NavigationPropertyInstance,
        entry: &mut XmlElement,
    ) -> Result<(), AtomCodecError> {
        let rel = format!("{}{}", names::RELATED_REL, nav.name);
        match nav.value.as_deref() {
            Some(PayloadElement::DeferredLink(link)) => {
                entry.push_child(link_element(&rel, Some(&link.uri)));
            }
            Some(PayloadElement::ExpandedLink(link)) => {
                let mut el = link_element(&rel, link.uri.as_deref());
                let mut inline = XmlElement::new("m:inline");
                match link.expanded_element.as_deref() {
                    None => {}
                    Some(PayloadElement::EntityInstance(entity)) => {
                        inline.push_child(self.encode_entry(entity, false)?);
                    }
                    Some(PayloadElement::EntitySetInstance(set)) => {
                        inline.push_child(self.encode_feed(set, false)?);
                    }
                    Some(other) => return Err(AtomCodecError::Unencodable(other.kind())),
                }
                el.push_child(inline);
                entry.push_child(el);
            }
            Some(PayloadElement::EntityInstance(entity)) => {
                let mut el = link_element(&rel, None);
                let mut inline = XmlElement::new("m:inline");
                inline.push_child(self.encode_entry(entity, false)?);
                el.push_child(inline);
                entry.push_child(el);
            }
            Some(PayloadElement::EntitySetInstance(set)) => {
                let mut el = link_element(&rel, None);
                let mut inline = XmlElement::new("m:inline");
                inline.push_child(self.encode_feed(set, false)?);
                el.push_child(inline);
                entry.push_child(el);
            }
            Some(other) => return Err(AtomCodecError::Unencodable(other.kind())),
            None => {}
        }
        if let Some(association) = &nav.association_link {
            let rel = format!("{}{}", names::RELATED_LINKS_REL, nav.name);
            entry.push_child(link_element(&rel, Some(&association.uri)));
        }
        Ok(())
    }

    fn encode_properties_element(
        &self,
        properties: &[&PayloadElement],
    ) -> Result<XmlElement, AtomCodecError> {
        let mut el = XmlElement::new("m:properties");
        for property in properties {
            let child = self.encode_property_element(property)?;
            el.push_child(child);
        }
        Ok(el)
    }

    fn encode_property_element(
        &self,
        element: &PayloadElement,
    ) -> Result<XmlElement, AtomCodecError> {
        match element {
            PayloadElement::PrimitiveProperty(property) => {
                let mut el = XmlElement::new(format!("d:{}", property.name));
                if let Some(type_name) = &property.value.full_type_name {
                    el.push_attr("m:type", type_name);
                }
                if property.value.is_null() {
                    el.push_attr("m:null", "true");
                } else {
                    let text = self.literals().serialize(&property.value.value)?;
                    if !text.is_empty() {
                        el.push_text(text);
                    }
                }
                Ok(el)
            }
            PayloadElement::ComplexProperty(property) => {
                let mut el = XmlElement::new(format!("d:{}", property.name));
                if let Some(type_name) = &property.value.full_type_name {
                    el.push_attr("m:type", type_name);
                }
                if property.value.is_null {
                    el.push_attr("m:null", "true");
                } else {
                    for child in &property.value.properties {
                        let encoded = self.encode_property_element(child)?;
                        el.push_child(encoded);
                    }
                }
                Ok(el)
            }
            PayloadElement::NullPropertyInstance(property) => {
                let mut el = XmlElement::new(format!("d:{}", property.name));
                if let Some(type_name) = &property.full_type_name {
                    el.push_attr("m:type", type_name);
                }
                el.push_attr("m:null", "true");
                Ok(el)
            }
            PayloadElement::PrimitiveMultiValueProperty(property) => {
                let mut el = self.multi_value_shell(
                    &property.name,
                    property.value.full_type_name.as_deref(),
                    property.value.is_null,
                )?;
                if !property.value.is_null {
                    for item in &property.value.items {
                        let mut element = XmlElement::new("d:element");
                        if item.is_null() {
                            element.push_attr("m:null", "true");
                        } else {
                            let text = self.literals().serialize(&item.value)?;
                            if !text.is_empty() {
                                element.push_text(text);
                            }
                        }
                        el.push_child(element);
                    }
                }
                Ok(el)
            }
            PayloadElement::ComplexMultiValueProperty(property) => {
                let mut el = self.multi_value_shell(
                    &property.name,
                    property.value.full_type_name.as_deref(),
                    property.value.is_null,
                )?;
                if !property.value.is_null {
                    for item in &property.value.items {
                        let element = self.encode_multi_value_item(item)?;
                        el.push_child(element);
                    }
                }
                Ok(el)
            }
            other => Err(AtomCodecError::Unencodable(other.kind())),
        }
    }

    fn multi_value_shell(
        &self,
        name: &str,
        full_type_name: Option<&str>,
        is_null: bool,
    ) -> Result<XmlElement, AtomCodecError> {
        let type_name = full_type_name.ok_or_else(|| {
            AtomCodecError::Malformed(format!(
                "multi-value property `{name}` carries no collection type"
            ))
        })?;
        let mut el = XmlElement::new(format!("d:{name}"));
        el.push_attr("m:type", type_name);
        if is_null {
            el.push_attr("m:null", "true");
        }
        Ok(el)
    }

    fn encode_multi_value_item(
        &self,
        item: &ComplexInstance,
    ) -> Result<XmlElement, AtomCodecError> {
        let mut element = XmlElement::new("d:element");
        if let Some(type_name) = &item.full_type_name {
            element.push_attr("m:type", type_name);
        }
        if item.is_null {
            element.push_attr("m:null", "true");
        } else {
            for property in &item.properties {
                let child = self.encode_property_element(property)?;
                element.push_child(child);
            }
        }
        Ok(element)
    }
}

// ── Non-entry roots ───────────────────────────────────────────────────────

fn encode_stream_links(stream: &NamedStreamInstance, entry: &mut XmlElement) {
    if stream.source_link.is_some() || stream.source_content_type.is_some() {
        let rel = format!("{}{}", names::MEDIA_RESOURCE_REL, stream.name);
        let mut link = link_element(&rel, stream.source_link.as_deref());
        if let Some(content_type) = &stream.source_content_type {
            link.push_attr("type", content_type);
        }
        entry.push_child(link);
    }
    if stream.edit_link.is_some() || stream.edit_content_type.is_some() || stream.etag.is_some() {
        let rel = format!("{}{}", names::MEDIA_RESOURCE_EDIT_REL, stream.name);
        let mut link = link_element(&rel, stream.edit_link.as_deref());
        if let Some(content_type) = &stream.edit_content_type {
            link.push_attr("type", content_type);
        }
        if let Some(etag) = &stream.etag {
            link.push_attr("m:etag", etag);
        }
        entry.push_child(link);
    }
}

fn encode_links(links: &LinkCollection) -> XmlElement {
    let mut root = XmlElement::new("links");
    root.push_attr("xmlns", names::DATA_NS);
    root.push_attr("xmlns:m", names::METADATA_NS);
    if let Some(count) = links.inline_count {
        let mut el = XmlElement::new("m:count");
        el.push_text(count.to_string());
        root.push_child(el);
    }
    for link in &links.links {
        let mut el = XmlElement::new("uri");
        el.push_text(&link.uri);
        root.push_child(el);
    }
    if let Some(next) = &links.next_link {
        let mut el = XmlElement::new("next");
        el.push_text(next);
        root.push_child(el);
    }
    root
}

fn encode_service(doc: &ServiceDocumentInstance) -> XmlElement {
    let mut service = XmlElement::new("service");
    service.push_attr("xmlns", names::APP_NS);
    service.push_attr("xmlns:atom", names::ATOM_NS);
    for workspace in &doc.workspaces {
        let mut workspace_el = XmlElement::new("workspace");
        if let Some(title) = &workspace.title {
            let mut el = XmlElement::new("atom:title");
            el.push_text(title);
            workspace_el.push_child(el);
        }
        for collection in &workspace.collections {
            let mut collection_el = XmlElement::new("collection");
            collection_el.push_attr("href", &collection.href);
            if let Some(title) = &collection.title {
                let mut el = XmlElement::new("atom:title");
                el.push_text(title);
                collection_el.push_child(el);
            }
            workspace_el.push_child(collection_el);
        }
        service.push_child(workspace_el);
    }
    service
}

fn encode_error(error: &ODataErrorPayload) -> XmlElement {
    let mut root = XmlElement::new("m:error");
    root.push_attr("xmlns:m", names::METADATA_NS);
    if let Some(code) = &error.code {
        let mut el = XmlElement::new("m:code");
        el.push_text(code);
        root.push_child(el);
    }
    if let Some(message) = &error.message {
        let mut el = XmlElement::new("m:message");
        if let Some(language) = &error.message_language {
            el.push_attr("xml:lang", language);
        }
        el.push_text(message);
        root.push_child(el);
    }
    if let Some(inner) = &error.inner_error {
        root.push_child(encode_inner_error(inner));
    }
    root
}

fn encode_inner_error(inner: &ODataInternalExceptionPayload) -> XmlElement {
    let mut el = XmlElement::new("m:innererror");
    if let Some(message) = &inner.message {
        let mut child = XmlElement::new("m:message");
        child.push_text(message);
        el.push_child(child);
    }
    if let Some(type_name) = &inner.type_name {
        let mut child = XmlElement::new("m:type");
        child.push_text(type_name);
        el.push_child(child);
    }
    if let Some(stack_trace) = &inner.stack_trace {
        let mut child = XmlElement::new("m:stacktrace");
        child.push_text(stack_trace);
        el.push_child(child);
    }
    if let Some(nested) = &inner.internal_exception {
        let mut nested_el = encode_inner_error(nested);
        nested_el.name = "m:internalexception".to_string();
        nested_el.local = "internalexception".to_string();
        el.push_child(nested_el);
    }
    el
}

fn link_element(rel: &str, href: Option<&str>) -> XmlElement {
    let mut link = XmlElement::new("link");
    link.push_attr("rel", rel);
    if let Some(href) = href {
        link.push_attr("href", href);
    }
    link
}
