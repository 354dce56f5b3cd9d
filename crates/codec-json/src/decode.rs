//! Shape classification and decoding.
//!
//! Classification priority for objects, first match wins: spatial, single
//! `uri`, single `__deferred`, `error` wrapper (root only), `results`
//! wrapper, entity lookalike, single `__mediaresource`, `EntitySets`
//! service document (root only), complex instance fallback. A root complex
//! with exactly one property and no type collapses to that property, and a
//! single `"d"` envelope is stripped before any of this runs.

use serde_json::{Map, Value};
use tracing::debug;

use odata_literals::{EdmPrimitiveKind, ScalarValue};
use odata_payload::{
    Annotation, ComplexInstance, ComplexInstanceCollection, ComplexMultiValue,
    ComplexMultiValueProperty, ComplexProperty, DeferredLink, EmptyCollectionProperty,
    EntityInstance, EntitySetInstance, ExpandedLink,
    EmptyUntypedCollection, LinkCollection, NamedStreamInstance, NavigationPropertyInstance,
    NullPropertyInstance, ODataErrorPayload, ODataInternalExceptionPayload, PayloadElement,
    PrimitiveCollection,
    PrimitiveMultiValue, PrimitiveMultiValueProperty, PrimitiveProperty, PrimitiveValue,
    ResourceCollectionInstance, ServiceDocumentInstance, ServiceOperationDescriptor,
    WorkspaceInstance, MAX_NESTING_DEPTH,
};

use crate::error::JsonCodecError;
use crate::names;
use crate::JsonPayloadCodec;

type JsonMap = Map<String, Value>;

impl JsonPayloadCodec {
    /// Decodes a verbose JSON payload into its element tree.
    pub fn decode(&self, bytes: &[u8]) -> Result<PayloadElement, JsonCodecError> {
        debug!(len = bytes.len(), "decoding json payload");
        let value: Value = serde_json::from_slice(bytes)?;
        let element = self.decode_value(unwrap_d(&value), true, 0)?;
        Ok(simplify_root(element))
    }

    fn decode_value(
        &self,
        value: &Value,
        at_root: bool,
        depth: usize,
    ) -> Result<PayloadElement, JsonCodecError> {
        if depth > MAX_NESTING_DEPTH {
            return Err(JsonCodecError::DepthExceeded(MAX_NESTING_DEPTH));
        }
        match value {
            Value::Object(map) => self.classify_object(value, map, at_root, depth),
            Value::Array(items) => {
                let mut element = self.decode_items(items, None, false, at_root, depth)?;
                element
                    .annotations_mut()
                    .push(Annotation::ResultsWrapper(false));
                Ok(element)
            }
            _ => {
                let scalar = self.literals().from_value(value, None)?;
                Ok(PayloadElement::PrimitiveValue(PrimitiveValue::new(scalar)))
            }
        }
    }

    fn classify_object(
        &self,
        value: &Value,
        map: &JsonMap,
        at_root: bool,
        depth: usize,
    ) -> Result<PayloadElement, JsonCodecError> {
        if let Some(spatial) = self.spatial().parse_json_object(value) {
            return Ok(PayloadElement::PrimitiveValue(PrimitiveValue::new(
                ScalarValue::Spatial(spatial),
            )));
        }
        if map.len() == 1 && map.contains_key(names::URI) {
            return Ok(PayloadElement::DeferredLink(deferred_uri(map)?));
        }
        if map.len() == 1 {
            if let Some(inner) = map.get(names::DEFERRED) {
                return match inner {
                    Value::Object(obj) => Ok(PayloadElement::DeferredLink(deferred_uri(obj)?)),
                    _ => Err(JsonCodecError::Malformed(
                        "__deferred wrapper is not an object".to_string(),
                    )),
                };
            }
        }
        if at_root && map.len() == 1 {
            if let Some(inner) = map.get(names::ERROR) {
                return match inner {
                    Value::Object(obj) => {
                        Ok(PayloadElement::ODataErrorPayload(decode_error(obj)?))
                    }
                    _ => Err(JsonCodecError::Malformed(
                        "error wrapper is not an object".to_string(),
                    )),
                };
            }
        }
        if map.contains_key(names::RESULTS) {
            return self.decode_results(map, at_root, depth);
        }
        if looks_like_entity(map) {
            return Ok(PayloadElement::EntityInstance(
                self.decode_entity(map, depth)?,
            ));
        }
        if map.len() == 1 {
            if let Some(Value::Object(stream)) = map.get(names::MEDIA_RESOURCE) {
                return Ok(PayloadElement::NamedStreamInstance(decode_media_resource(
                    "", stream,
                )));
            }
        }
        if at_root && map.len() == 1 {
            if let Some(Value::Array(sets)) = map.get(names::ENTITY_SETS) {
                return decode_service_document(sets);
            }
        }
        Ok(PayloadElement::ComplexInstance(
            self.decode_complex(map, depth)?,
        ))
    }

    fn decode_entity(
        &self,
        map: &JsonMap,
        depth: usize,
    ) -> Result<EntityInstance, JsonCodecError> {
        let meta = metadata_block(map)?;
        let mut entity = EntityInstance::new(Vec::new());
        entity.full_type_name = meta.type_name.map(str::to_string);
        entity.id = meta.uri.map(str::to_string);
        entity.etag = meta.etag.map(str::to_string);
        entity.stream_source_link = meta.media_src.map(str::to_string);
        entity.stream_edit_link = meta.edit_media.map(str::to_string);
        entity.stream_etag = meta.media_etag.map(str::to_string);
        entity.stream_content_type = meta.content_type.map(str::to_string);
        append_operations(&mut entity.operations, meta.actions, true)?;
        append_operations(&mut entity.operations, meta.functions, false)?;
        for (name, value) in map {
            if name == names::METADATA {
                continue;
            }
            let prop_meta = property_meta(meta.properties, name);
            entity
                .properties
                .push(self.decode_property(name, value, prop_meta, depth + 1)?);
        }
        Ok(entity)
    }

    fn decode_complex(
        &self,
        map: &JsonMap,
        depth: usize,
    ) -> Result<ComplexInstance, JsonCodecError> {
        let meta = metadata_block(map)?;
        let mut complex = ComplexInstance::new(Vec::new());
        complex.full_type_name = meta.type_name.map(str::to_string);
        for (name, value) in map {
            if name == names::METADATA {
                continue;
            }
            let prop_meta = property_meta(meta.properties, name);
            complex
                .properties
                .push(self.decode_property(name, value, prop_meta, depth + 1)?);
        }
        Ok(complex)
    }

    fn decode_property(
        &self,
        name: &str,
        value: &Value,
        meta: PropertyMeta<'_>,
        depth: usize,
    ) -> Result<PayloadElement, JsonCodecError> {
        if depth > MAX_NESTING_DEPTH {
            return Err(JsonCodecError::DepthExceeded(MAX_NESTING_DEPTH));
        }
        match value {
            Value::Null => Ok(PayloadElement::NullPropertyInstance(
                NullPropertyInstance::new(name, meta.type_name.map(str::to_string)),
            )),
            Value::Array(items) => {
                let mut element = self.decode_items(items, meta.type_name, false, false, depth)?;
                element
                    .annotations_mut()
                    .push(Annotation::ResultsWrapper(false));
                wrap_property_element(name, element, &meta)
            }
            Value::Object(map) => {
                let element = self.classify_object(value, map, false, depth)?;
                wrap_property_element(name, element, &meta)
            }
            _ => {
                let kind = meta.type_name.and_then(EdmPrimitiveKind::try_parse);
                let scalar = self.literals().from_value(value, kind)?;
                let mut primitive = PrimitiveValue::new(scalar);
                primitive.full_type_name = meta.type_name.map(str::to_string);
                Ok(PayloadElement::PrimitiveProperty(PrimitiveProperty::new(
                    name, primitive,
                )))
            }
        }
    }

    fn decode_results(
        &self,
        map: &JsonMap,
        at_root: bool,
        depth: usize,
    ) -> Result<PayloadElement, JsonCodecError> {
        let items = match map.get(names::RESULTS) {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(JsonCodecError::Malformed(
                    "`results` is not an array".to_string(),
                ))
            }
        };
        let meta = metadata_block(map)?;
        let inline_count = match map.get(names::COUNT) {
            None => None,
            Some(count) => Some(parse_count(count)?),
        };
        let next_link = str_key(map, names::NEXT).map(str::to_string);

        let mut element = self.decode_items(items, meta.type_name, true, at_root, depth)?;
        match &mut element {
            PayloadElement::EntitySetInstance(set) => {
                set.inline_count = inline_count;
                set.next_link = next_link;
            }
            PayloadElement::LinkCollection(links) => {
                links.inline_count = inline_count;
                links.next_link = next_link;
            }
            // Counts have no home on multi-values or plain collections.
            _ => {}
        }
        Ok(element)
    }

    /// Decodes a homogeneous array. `wrapped` says whether the array came
    /// from a `results` wrapper, which biases plain objects towards the
    /// entity reading.
    fn decode_items(
        &self,
        items: &[Value],
        type_name: Option<&str>,
        wrapped: bool,
        at_root: bool,
        depth: usize,
    ) -> Result<PayloadElement, JsonCodecError> {
        if let Some(full) = type_name {
            if let Some(element_type) = names::multi_value_element(full) {
                return self.decode_multi_value(items, full, element_type, depth);
            }
        }
        match items.iter().find(|v| !v.is_null()) {
            None if items.is_empty() => {
                if at_root {
                    Ok(PayloadElement::EntitySetInstance(EntitySetInstance::new(
                        Vec::new(),
                    )))
                } else {
                    Ok(PayloadElement::EmptyUntypedCollection(
                        EmptyUntypedCollection::default(),
                    ))
                }
            }
            // An array of only nulls defaults to the primitive reading.
            None => Ok(PayloadElement::PrimitiveCollection(PrimitiveCollection {
                items: items
                    .iter()
                    .map(|_| PrimitiveValue::new(ScalarValue::Null))
                    .collect(),
                annotations: Vec::new(),
            })),
            Some(Value::Object(first)) => {
                if first.len() == 1 && first.contains_key(names::URI) {
                    let mut links = Vec::new();
                    for item in items {
                        match item {
                            Value::Object(obj) => links.push(deferred_uri(obj)?),
                            _ => {
                                return Err(JsonCodecError::Malformed(
                                    "mixed link collection element".to_string(),
                                ))
                            }
                        }
                    }
                    Ok(PayloadElement::LinkCollection(LinkCollection {
                        links,
                        inline_count: None,
                        next_link: None,
                        annotations: Vec::new(),
                    }))
                } else if wrapped || looks_like_entity(first) {
                    let mut entities = Vec::new();
                    for item in items {
                        match item {
                            Value::Object(obj) => {
                                entities.push(self.decode_entity(obj, depth + 1)?)
                            }
                            _ => {
                                return Err(JsonCodecError::Malformed(
                                    "null or non-object entity in a feed".to_string(),
                                ))
                            }
                        }
                    }
                    Ok(PayloadElement::EntitySetInstance(EntitySetInstance::new(
                        entities,
                    )))
                } else {
                    let mut instances = Vec::new();
                    for item in items {
                        match item {
                            Value::Object(obj) => {
                                instances.push(self.decode_complex(obj, depth + 1)?)
                            }
                            Value::Null => instances.push(ComplexInstance::null(None)),
                            _ => {
                                return Err(JsonCodecError::Malformed(
                                    "mixed complex collection element".to_string(),
                                ))
                            }
                        }
                    }
                    Ok(PayloadElement::ComplexInstanceCollection(
                        ComplexInstanceCollection {
                            items: instances,
                            annotations: Vec::new(),
                        },
                    ))
                }
            }
            Some(_) => {
                let mut values = Vec::new();
                for item in items {
                    values.push(PrimitiveValue::new(
                        self.literals().from_value(item, None)?,
                    ));
                }
                Ok(PayloadElement::PrimitiveCollection(PrimitiveCollection {
                    items: values,
                    annotations: Vec::new(),
                }))
            }
        }
    }

    fn decode_multi_value(
        &self,
        items: &[Value],
        full_type: &str,
        element_type: &str,
        depth: usize,
    ) -> Result<PayloadElement, JsonCodecError> {
        match EdmPrimitiveKind::try_parse(element_type) {
            Some(kind) => {
                let mut values = Vec::new();
                for item in items {
                    values.push(PrimitiveValue::new(
                        self.literals().from_value(item, Some(kind))?,
                    ));
                }
                Ok(PayloadElement::PrimitiveMultiValue(PrimitiveMultiValue {
                    full_type_name: Some(full_type.to_string()),
                    is_null: false,
                    items: values,
                    annotations: Vec::new(),
                }))
            }
            None => {
                let mut values = Vec::new();
                for item in items {
                    match item {
                        Value::Null => values.push(ComplexInstance::null(None)),
                        Value::Object(obj) => values.push(self.decode_complex(obj, depth + 1)?),
                        _ => {
                            return Err(JsonCodecError::Malformed(format!(
                                "non-object element in {full_type}"
                            )))
                        }
                    }
                }
                Ok(PayloadElement::ComplexMultiValue(ComplexMultiValue {
                    full_type_name: Some(full_type.to_string()),
                    is_null: false,
                    items: values,
                    annotations: Vec::new(),
                }))
            }
        }
    }
}

// ── Property wrapping ─────────────────────────────────────────────────────

/// Rewraps a classified value element as the matching property instance.
fn wrap_property_element(
    name: &str,
    element: PayloadElement,
    meta: &PropertyMeta<'_>,
) -> Result<PayloadElement, JsonCodecError> {
    let mut wrapped = match element {
        PayloadElement::DeferredLink(_) => PayloadElement::NavigationPropertyInstance(
            NavigationPropertyInstance::new(name, element),
        ),
        PayloadElement::EntityInstance(_)
        | PayloadElement::EntitySetInstance(_)
        | PayloadElement::LinkCollection(_) => PayloadElement::NavigationPropertyInstance(
            NavigationPropertyInstance::new(
                name,
                PayloadElement::ExpandedLink(ExpandedLink::new(element)),
            ),
        ),
        PayloadElement::NamedStreamInstance(mut stream) => {
            stream.name = name.to_string();
            PayloadElement::NamedStreamInstance(stream)
        }
        PayloadElement::ComplexInstance(mut complex) => {
            if complex.full_type_name.is_none() {
                complex.full_type_name = meta.type_name.map(str::to_string);
            }
            PayloadElement::ComplexProperty(ComplexProperty::new(name, complex))
        }
        PayloadElement::PrimitiveMultiValue(multi) => PayloadElement::PrimitiveMultiValueProperty(
            PrimitiveMultiValueProperty::new(name, multi),
        ),
        PayloadElement::ComplexMultiValue(multi) => PayloadElement::ComplexMultiValueProperty(
            ComplexMultiValueProperty::new(name, multi),
        ),
        // A property position makes untyped collections multi-values.
        PayloadElement::PrimitiveCollection(collection) => {
            PayloadElement::PrimitiveMultiValueProperty(PrimitiveMultiValueProperty::new(
                name,
                PrimitiveMultiValue {
                    full_type_name: meta.type_name.map(str::to_string),
                    is_null: false,
                    items: collection.items,
                    annotations: collection.annotations,
                },
            ))
        }
        PayloadElement::ComplexInstanceCollection(collection) => {
            PayloadElement::ComplexMultiValueProperty(ComplexMultiValueProperty::new(
                name,
                ComplexMultiValue {
                    full_type_name: meta.type_name.map(str::to_string),
                    is_null: false,
                    items: collection.items,
                    annotations: collection.annotations,
                },
            ))
        }
        PayloadElement::EmptyUntypedCollection(empty) => {
            PayloadElement::EmptyCollectionProperty(EmptyCollectionProperty {
                name: name.to_string(),
                full_type_name: meta.type_name.map(str::to_string),
                value: empty,
                annotations: Vec::new(),
            })
        }
        PayloadElement::PrimitiveValue(primitive) => {
            PayloadElement::PrimitiveProperty(PrimitiveProperty::new(name, primitive))
        }
        other => {
            return Err(JsonCodecError::Malformed(format!(
                "unexpected {} as value of property `{name}`",
                other.kind()
            )))
        }
    };
    if let Some(uri) = meta.association_uri {
        if let PayloadElement::NavigationPropertyInstance(nav) = &mut wrapped {
            nav.association_link = Some(DeferredLink::new(uri));
        }
    }
    Ok(wrapped)
}

// ── Reserved-shape helpers ────────────────────────────────────────────────

fn unwrap_d(value: &Value) -> &Value {
    if let Value::Object(map) = value {
        if map.len() == 1 {
            if let Some(inner) = map.get(names::D_WRAPPER) {
                return inner;
            }
        }
    }
    value
}

/// A root complex with one property and no type collapses to the property.
fn simplify_root(element: PayloadElement) -> PayloadElement {
    match element {
        PayloadElement::ComplexInstance(mut complex)
            if complex.full_type_name.is_none()
                && !complex.is_null
                && complex.annotations.is_empty()
                && complex.properties.len() == 1 =>
        {
            match complex.properties.pop() {
                Some(property) => property,
                None => PayloadElement::ComplexInstance(complex),
            }
        }
        other => other,
    }
}

fn deferred_uri(map: &JsonMap) -> Result<DeferredLink, JsonCodecError> {
    match map.get(names::URI) {
        Some(Value::String(uri)) => Ok(DeferredLink::new(uri.clone())),
        _ => Err(JsonCodecError::Malformed(
            "deferred link without a string `uri`".to_string(),
        )),
    }
}

fn looks_like_entity(map: &JsonMap) -> bool {
    if let Some(Value::Object(meta)) = map.get(names::METADATA) {
        let entity_keys = [
            names::URI,
            names::ETAG,
            names::MEDIA_SRC,
            names::EDIT_MEDIA,
            names::MEDIA_ETAG,
            names::CONTENT_TYPE,
            names::ACTIONS,
            names::FUNCTIONS,
        ];
        if entity_keys.iter().any(|key| meta.contains_key(*key)) {
            return true;
        }
    }
    // A deferred-link child is only ever a navigation property.
    map.values()
        .any(|v| matches!(v, Value::Object(o) if o.len() == 1 && o.contains_key(names::DEFERRED)))
}

#[derive(Default)]
struct MetadataBlock<'a> {
    type_name: Option<&'a str>,
    uri: Option<&'a str>,
    etag: Option<&'a str>,
    media_src: Option<&'a str>,
    edit_media: Option<&'a str>,
    media_etag: Option<&'a str>,
    content_type: Option<&'a str>,
    properties: Option<&'a JsonMap>,
    actions: Option<&'a JsonMap>,
    functions: Option<&'a JsonMap>,
}

fn metadata_block(map: &JsonMap) -> Result<MetadataBlock<'_>, JsonCodecError> {
    let meta = match map.get(names::METADATA) {
        None => return Ok(MetadataBlock::default()),
        Some(Value::Object(meta)) => meta,
        Some(_) => {
            return Err(JsonCodecError::Malformed(
                "__metadata is not an object".to_string(),
            ))
        }
    };
    Ok(MetadataBlock {
        type_name: str_key(meta, names::TYPE),
        uri: str_key(meta, names::URI),
        etag: str_key(meta, names::ETAG),
        media_src: str_key(meta, names::MEDIA_SRC),
        edit_media: str_key(meta, names::EDIT_MEDIA),
        media_etag: str_key(meta, names::MEDIA_ETAG),
        content_type: str_key(meta, names::CONTENT_TYPE),
        properties: obj_key(meta, names::PROPERTIES),
        actions: obj_key(meta, names::ACTIONS),
        functions: obj_key(meta, names::FUNCTIONS),
    })
}

struct PropertyMeta<'a> {
    type_name: Option<&'a str>,
    association_uri: Option<&'a str>,
}

fn property_meta<'a>(properties: Option<&'a JsonMap>, name: &str) -> PropertyMeta<'a> {
    match properties.and_then(|p| p.get(name)) {
        Some(Value::Object(entry)) => PropertyMeta {
            type_name: str_key(entry, names::TYPE),
            association_uri: str_key(entry, names::ASSOCIATION_URI),
        },
        _ => PropertyMeta {
            type_name: None,
            association_uri: None,
        },
    }
}

fn append_operations(
    out: &mut Vec<ServiceOperationDescriptor>,
    block: Option<&JsonMap>,
    is_action: bool,
) -> Result<(), JsonCodecError> {
    let block = match block {
        Some(block) => block,
        None => return Ok(()),
    };
    for (metadata_url, value) in block {
        let entries = value.as_array().ok_or_else(|| {
            JsonCodecError::Malformed(format!(
                "operation descriptor `{metadata_url}` is not an array"
            ))
        })?;
        for entry in entries {
            let obj = entry.as_object().ok_or_else(|| {
                JsonCodecError::Malformed(format!(
                    "operation descriptor entry under `{metadata_url}` is not an object"
                ))
            })?;
            out.push(ServiceOperationDescriptor {
                is_action,
                metadata: Some(metadata_url.clone()),
                title: str_key(obj, names::TITLE).map(str::to_string),
                target: str_key(obj, names::TARGET).map(str::to_string),
                annotations: Vec::new(),
            });
        }
    }
    Ok(())
}

fn decode_error(map: &JsonMap) -> Result<ODataErrorPayload, JsonCodecError> {
    let (message, message_language) = match map.get(names::MESSAGE) {
        None => (None, None),
        Some(Value::String(text)) => (Some(text.clone()), None),
        Some(Value::Object(message)) => (
            str_key(message, names::VALUE).map(str::to_string),
            str_key(message, names::LANG).map(str::to_string),
        ),
        Some(_) => {
            return Err(JsonCodecError::Malformed(
                "error message must be text or a {lang, value} object".to_string(),
            ))
        }
    };
    let inner_error = match map.get(names::INNER_ERROR) {
        None => None,
        Some(Value::Object(inner)) => Some(Box::new(decode_inner_error(inner, 1)?)),
        Some(_) => {
            return Err(JsonCodecError::Malformed(
                "innererror is not an object".to_string(),
            ))
        }
    };
    Ok(ODataErrorPayload {
        code: str_key(map, names::CODE).map(str::to_string),
        message,
        message_language,
        inner_error,
        annotations: Vec::new(),
    })
}

fn decode_inner_error(
    map: &JsonMap,
    depth: usize,
) -> Result<ODataInternalExceptionPayload, JsonCodecError> {
    if depth > MAX_NESTING_DEPTH {
        return Err(JsonCodecError::DepthExceeded(MAX_NESTING_DEPTH));
    }
    let internal_exception = match map.get(names::INTERNAL_EXCEPTION) {
        None => None,
        Some(Value::Object(next)) => Some(Box::new(decode_inner_error(next, depth + 1)?)),
        Some(_) => {
            return Err(JsonCodecError::Malformed(
                "internalexception is not an object".to_string(),
            ))
        }
    };
    Ok(ODataInternalExceptionPayload {
        message: str_key(map, names::MESSAGE).map(str::to_string),
        type_name: str_key(map, names::TYPE).map(str::to_string),
        stack_trace: str_key(map, names::STACK_TRACE).map(str::to_string),
        internal_exception,
        annotations: Vec::new(),
    })
}

fn decode_media_resource(name: &str, map: &JsonMap) -> NamedStreamInstance {
    let mut stream = NamedStreamInstance::new(name);
    stream.source_link = str_key(map, names::MEDIA_SRC).map(str::to_string);
    stream.edit_link = str_key(map, names::EDIT_MEDIA).map(str::to_string);
    stream.etag = str_key(map, names::MEDIA_ETAG).map(str::to_string);
    stream.source_content_type = str_key(map, names::CONTENT_TYPE).map(str::to_string);
    stream
}

fn decode_service_document(sets: &[Value]) -> Result<PayloadElement, JsonCodecError> {
    let mut collections = Vec::new();
    for set in sets {
        match set {
            Value::String(name) => collections.push(ResourceCollectionInstance::new(name.clone())),
            _ => {
                return Err(JsonCodecError::Malformed(
                    "EntitySets entries must be strings".to_string(),
                ))
            }
        }
    }
    Ok(PayloadElement::ServiceDocumentInstance(
        ServiceDocumentInstance {
            workspaces: vec![WorkspaceInstance {
                title: None,
                collections,
                annotations: Vec::new(),
            }],
            annotations: Vec::new(),
        },
    ))
}

fn parse_count(value: &Value) -> Result<i64, JsonCodecError> {
    let parsed = match value {
        Value::String(text) => text.trim().parse::<i64>().ok(),
        Value::Number(number) => number.as_i64(),
        _ => None,
    };
    parsed.ok_or_else(|| JsonCodecError::Malformed(format!("unreadable __count `{value}`")))
}

fn str_key<'a>(map: &'a JsonMap, key: &str) -> Option<&'a str> {
    map.get(key).and_then(Value::as_str)
}

fn obj_key<'a>(map: &'a JsonMap, key: &str) -> Option<&'a JsonMap> {
    map.get(key).and_then(Value::as_object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use odata_payload::AnnotationBag;

    fn decode(text: &str) -> PayloadElement {
        JsonPayloadCodec::default().decode(text.as_bytes()).unwrap()
    }

    #[test]
    fn entity_with_metadata_uri_and_type() {
        let element = decode(r#"{"__metadata":{"uri":"Products(1)","type":"T"},"ID":1}"#);
        match element {
            PayloadElement::EntityInstance(entity) => {
                assert_eq!(entity.id.as_deref(), Some("Products(1)"));
                assert_eq!(entity.full_type_name.as_deref(), Some("T"));
                assert_eq!(entity.properties.len(), 1);
                match &entity.properties[0] {
                    PayloadElement::PrimitiveProperty(p) => {
                        assert_eq!(p.name, "ID");
                        assert_eq!(p.value.value, ScalarValue::Int32(1));
                    }
                    other => panic!("unexpected property {other:?}"),
                }
            }
            other => panic!("unexpected element {other:?}"),
        }
    }

    #[test]
    fn single_uri_object_is_a_deferred_link() {
        match decode(r#"{"uri":"Customers(1)/Orders"}"#) {
            PayloadElement::DeferredLink(link) => assert_eq!(link.uri, "Customers(1)/Orders"),
            other => panic!("unexpected element {other:?}"),
        }
    }

    #[test]
    fn deferred_wrapper_property_becomes_navigation() {
        let element = decode(r#"{"__metadata":{"uri":"Customers(1)"},"Orders":{"__deferred":{"uri":"Customers(1)/Orders"}}}"#);
        match element {
            PayloadElement::EntityInstance(entity) => match &entity.properties[0] {
                PayloadElement::NavigationPropertyInstance(nav) => {
                    assert_eq!(nav.name, "Orders");
                    match nav.value.as_deref() {
                        Some(PayloadElement::DeferredLink(link)) => {
                            assert_eq!(link.uri, "Customers(1)/Orders")
                        }
                        other => panic!("unexpected nav value {other:?}"),
                    }
                }
                other => panic!("unexpected property {other:?}"),
            },
            other => panic!("unexpected element {other:?}"),
        }
    }

    #[test]
    fn results_with_count_is_an_entity_set() {
        let element = decode(r#"{"results":[{"ID":1},{"ID":2},{"ID":3}],"__count":"3"}"#);
        match element {
            PayloadElement::EntitySetInstance(set) => {
                assert_eq!(set.entities.len(), 3);
                assert_eq!(set.inline_count, Some(3));
            }
            other => panic!("unexpected element {other:?}"),
        }
    }

    #[test]
    fn d_wrapper_and_root_simplification() {
        match decode(r#"{"d":{"Name":"Foo"}}"#) {
            PayloadElement::PrimitiveProperty(p) => {
                assert_eq!(p.name, "Name");
                assert_eq!(p.value.value, ScalarValue::String("Foo".into()));
            }
            other => panic!("unexpected element {other:?}"),
        }
    }

    #[test]
    fn typed_decode_through_properties_metadata() {
        let element = decode(
            r#"{"__metadata":{"properties":{"Big":{"type":"Edm.Int64"}}},"Big":"5000000000"}"#,
        );
        match element {
            PayloadElement::PrimitiveProperty(p) => {
                assert_eq!(p.value.value, ScalarValue::Int64(5_000_000_000));
                assert_eq!(p.value.full_type_name.as_deref(), Some("Edm.Int64"));
            }
            other => panic!("unexpected element {other:?}"),
        }
    }

    #[test]
    fn bare_array_keeps_a_suppressed_wrapper_flag() {
        let element = decode(r#"[1,2,3]"#);
        match &element {
            PayloadElement::PrimitiveCollection(c) => assert_eq!(c.items.len(), 3),
            other => panic!("unexpected element {other:?}"),
        }
        assert_eq!(element.annotations().results_wrapper(), Some(false));
    }

    #[test]
    fn error_payload_with_language_and_inner_chain() {
        let element = decode(
            r#"{"error":{"code":"500","message":{"lang":"en-US","value":"boom"},
                "innererror":{"message":"inner","type":"System.Exception",
                "internalexception":{"message":"innermost"}}}}"#,
        );
        match element {
            PayloadElement::ODataErrorPayload(error) => {
                assert_eq!(error.code.as_deref(), Some("500"));
                assert_eq!(error.message.as_deref(), Some("boom"));
                assert_eq!(error.message_language.as_deref(), Some("en-US"));
                let inner = error.inner_error.unwrap();
                assert_eq!(inner.type_name.as_deref(), Some("System.Exception"));
                let innermost = inner.internal_exception.unwrap();
                assert_eq!(innermost.message.as_deref(), Some("innermost"));
            }
            other => panic!("unexpected element {other:?}"),
        }
    }

    #[test]
    fn service_document_from_entity_sets() {
        match decode(r#"{"EntitySets":["Products","Categories"]}"#) {
            PayloadElement::ServiceDocumentInstance(doc) => {
                assert_eq!(doc.workspaces.len(), 1);
                let hrefs: Vec<&str> = doc.workspaces[0]
                    .collections
                    .iter()
                    .map(|c| c.href.as_str())
                    .collect();
                assert_eq!(hrefs, ["Products", "Categories"]);
            }
            other => panic!("unexpected element {other:?}"),
        }
    }

    #[test]
    fn expanded_entity_and_association_uri() {
        let element = decode(
            r#"{"__metadata":{"uri":"Customers(1)",
                "properties":{"Orders":{"associationuri":"Customers(1)/$links/Orders"}}},
                "Orders":{"results":[{"__metadata":{"uri":"Orders(7)"}}]}}"#,
        );
        match element {
            PayloadElement::EntityInstance(entity) => match &entity.properties[0] {
                PayloadElement::NavigationPropertyInstance(nav) => {
                    assert_eq!(
                        nav.association_link.as_ref().map(|l| l.uri.as_str()),
                        Some("Customers(1)/$links/Orders")
                    );
                    match nav.value.as_deref() {
                        Some(PayloadElement::ExpandedLink(link)) => {
                            match link.expanded_element.as_deref() {
                                Some(PayloadElement::EntitySetInstance(set)) => {
                                    assert_eq!(set.entities[0].id.as_deref(), Some("Orders(7)"))
                                }
                                other => panic!("unexpected expansion {other:?}"),
                            }
                        }
                        other => panic!("unexpected nav value {other:?}"),
                    }
                }
                other => panic!("unexpected property {other:?}"),
            },
            other => panic!("unexpected element {other:?}"),
        }
    }

    #[test]
    fn media_resource_property_is_a_named_stream() {
        let element = decode(
            r#"{"__metadata":{"uri":"Items(1)"},
                "Thumbnail":{"__mediaresource":{"media_src":"Items(1)/Thumb",
                "edit_media":"Items(1)/ThumbEdit","content_type":"image/png"}}}"#,
        );
        match element {
            PayloadElement::EntityInstance(entity) => match &entity.properties[0] {
                PayloadElement::NamedStreamInstance(stream) => {
                    assert_eq!(stream.name, "Thumbnail");
                    assert_eq!(stream.source_link.as_deref(), Some("Items(1)/Thumb"));
                    assert_eq!(stream.edit_link.as_deref(), Some("Items(1)/ThumbEdit"));
                    assert_eq!(stream.source_content_type.as_deref(), Some("image/png"));
                }
                other => panic!("unexpected property {other:?}"),
            },
            other => panic!("unexpected element {other:?}"),
        }
    }

    #[test]
    fn multi_value_by_collection_type() {
        let element = decode(
            r#"{"Tags":{"__metadata":{"type":"Collection(Edm.String)"},"results":["a","b"]}}"#,
        );
        match element {
            PayloadElement::PrimitiveMultiValueProperty(p) => {
                assert_eq!(p.name, "Tags");
                assert_eq!(
                    p.value.full_type_name.as_deref(),
                    Some("Collection(Edm.String)")
                );
                assert_eq!(p.value.items.len(), 2);
            }
            other => panic!("unexpected element {other:?}"),
        }
    }

    #[test]
    fn malformed_results_and_count_fail() {
        let codec = JsonPayloadCodec::default();
        assert!(matches!(
            codec.decode(br#"{"results":3}"#),
            Err(JsonCodecError::Malformed(_))
        ));
        assert!(matches!(
            codec.decode(br#"{"results":[],"__count":"many"}"#),
            Err(JsonCodecError::Malformed(_))
        ));
    }

    #[test]
    fn null_property_keeps_declared_type() {
        let element = decode(
            r#"{"__metadata":{"properties":{"Nick":{"type":"Edm.String"}}},"Nick":null}"#,
        );
        match element {
            PayloadElement::NullPropertyInstance(p) => {
                assert_eq!(p.name, "Nick");
                assert_eq!(p.full_type_name.as_deref(), Some("Edm.String"));
            }
            other => panic!("unexpected element {other:?}"),
        }
    }
}
