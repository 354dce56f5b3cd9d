//! Tree to verbose JSON, mirroring the decode classification in reverse.
//!
//! `__metadata`, action and function blocks are written only when the
//! corresponding data is present, and the `results` wrapper can be
//! suppressed per node through the results-wrapper annotation.

use serde_json::{Map, Value};
use tracing::debug;

use odata_literals::{LiteralError, ScalarValue};
use odata_payload::{
    AnnotationBag, ComplexInstance, ComplexMultiValue, EntityInstance, EntitySetInstance,
    LinkCollection, NamedStreamInstance, ODataErrorPayload, ODataInternalExceptionPayload,
    PayloadElement, PrimitiveMultiValue, PrimitiveValue, ServiceDocumentInstance,
    ServiceOperationDescriptor,
};

use crate::error::JsonCodecError;
use crate::names;
use crate::JsonPayloadCodec;

type JsonMap = Map<String, Value>;

impl JsonPayloadCodec {
    /// Encodes an element tree as verbose JSON bytes.
    pub fn encode(&self, element: &PayloadElement) -> Result<Vec<u8>, JsonCodecError> {
        debug!(kind = %element.kind(), "encoding json payload");
        let value = self.encode_value(element)?;
        let value = if self.options.wrap_in_d {
            let mut wrapper = JsonMap::new();
            wrapper.insert(names::D_WRAPPER.to_string(), value);
            Value::Object(wrapper)
        } else {
            value
        };
        Ok(serde_json::to_vec(&value)?)
    }

    pub(crate) fn encode_value(&self, element: &PayloadElement) -> Result<Value, JsonCodecError> {
        match element {
            PayloadElement::PrimitiveValue(primitive) => self.encode_primitive(primitive),
            PayloadElement::ComplexInstance(complex) => self.encode_complex(complex),
            PayloadElement::EntityInstance(entity) => self.encode_entity(entity),
            PayloadElement::EntitySetInstance(set) => self.encode_entity_set(set),
            PayloadElement::LinkCollection(links) => encode_link_collection(links),
            PayloadElement::PrimitiveCollection(collection) => {
                let mut items = Vec::new();
                for item in &collection.items {
                    items.push(self.encode_primitive(item)?);
                }
                Ok(wrap_results(
                    items,
                    collection.annotations.results_wrapper().unwrap_or(true),
                    None,
                ))
            }
            PayloadElement::ComplexInstanceCollection(collection) => {
                let mut items = Vec::new();
                for item in &collection.items {
                    items.push(self.encode_complex(item)?);
                }
                Ok(wrap_results(
                    items,
                    collection.annotations.results_wrapper().unwrap_or(true),
                    None,
                ))
            }
            PayloadElement::PrimitiveMultiValue(multi) => self.encode_primitive_multi_value(multi),
            PayloadElement::ComplexMultiValue(multi) => self.encode_complex_multi_value(multi),
            PayloadElement::EmptyUntypedCollection(empty) => Ok(wrap_results(
                Vec::new(),
                empty.annotations.results_wrapper().unwrap_or(true),
                None,
            )),
            PayloadElement::DeferredLink(link) => Ok(uri_object(&link.uri)),
            PayloadElement::ExpandedLink(link) => match &link.expanded_element {
                Some(inner) => self.encode_value(inner),
                None => match &link.uri {
                    Some(uri) => Ok(uri_object(uri)),
                    None => Ok(Value::Null),
                },
            },
            PayloadElement::ODataErrorPayload(error) => Ok(encode_error(error)),
            PayloadElement::ServiceDocumentInstance(doc) => Ok(encode_service_document(doc)),
            PayloadElement::PrimitiveProperty(_)
            | PayloadElement::ComplexProperty(_)
            | PayloadElement::NullPropertyInstance(_)
            | PayloadElement::NavigationPropertyInstance(_)
            | PayloadElement::EmptyCollectionProperty(_)
            | PayloadElement::PrimitiveMultiValueProperty(_)
            | PayloadElement::ComplexMultiValueProperty(_)
            | PayloadElement::NamedStreamInstance(_) => {
                let mut properties = JsonMap::new();
                let mut meta_properties = JsonMap::new();
                self.encode_property_into(&mut properties, &mut meta_properties, element)?;
                let mut map = JsonMap::new();
                if !meta_properties.is_empty() {
                    let mut meta = JsonMap::new();
                    meta.insert(names::PROPERTIES.to_string(), Value::Object(meta_properties));
                    map.insert(names::METADATA.to_string(), Value::Object(meta));
                }
                map.extend(properties);
                Ok(Value::Object(map))
            }
            _ => Err(JsonCodecError::Unencodable(element.kind())),
        }
    }

    fn encode_primitive(&self, primitive: &PrimitiveValue) -> Result<Value, JsonCodecError> {
        match &primitive.value {
            ScalarValue::Spatial(spatial) => {
                self.spatial().format_json_object(spatial).ok_or_else(|| {
                    JsonCodecError::Literal(LiteralError::SpatialUnsupported(spatial.text.clone()))
                })
            }
            scalar => Ok(self.literals().to_value(scalar)?),
        }
    }

    fn encode_complex(&self, complex: &ComplexInstance) -> Result<Value, JsonCodecError> {
        if complex.is_null {
            return Ok(Value::Null);
        }
        let mut properties = JsonMap::new();
        let mut meta_properties = JsonMap::new();
        for property in &complex.properties {
            self.encode_property_into(&mut properties, &mut meta_properties, property)?;
        }
        let mut meta = JsonMap::new();
        insert_str(&mut meta, names::TYPE, complex.full_type_name.as_deref());
        if !meta_properties.is_empty() {
            meta.insert(names::PROPERTIES.to_string(), Value::Object(meta_properties));
        }
        let mut map = JsonMap::new();
        if !meta.is_empty() {
            map.insert(names::METADATA.to_string(), Value::Object(meta));
        }
        map.extend(properties);
        Ok(Value::Object(map))
    }

    fn encode_entity(&self, entity: &EntityInstance) -> Result<Value, JsonCodecError> {
        if entity.is_null {
            return Ok(Value::Null);
        }
        let mut properties = JsonMap::new();
        let mut meta_properties = JsonMap::new();
        for property in &entity.properties {
            self.encode_property_into(&mut properties, &mut meta_properties, property)?;
        }
        let mut meta = JsonMap::new();
        insert_str(&mut meta, names::TYPE, entity.full_type_name.as_deref());
        insert_str(&mut meta, names::URI, entity.id.as_deref());
        insert_str(&mut meta, names::ETAG, entity.etag.as_deref());
        insert_str(&mut meta, names::MEDIA_SRC, entity.stream_source_link.as_deref());
        insert_str(&mut meta, names::EDIT_MEDIA, entity.stream_edit_link.as_deref());
        insert_str(&mut meta, names::MEDIA_ETAG, entity.stream_etag.as_deref());
        insert_str(
            &mut meta,
            names::CONTENT_TYPE,
            entity.stream_content_type.as_deref(),
        );
        if !meta_properties.is_empty() {
            meta.insert(names::PROPERTIES.to_string(), Value::Object(meta_properties));
        }
        let actions = operations_value(&entity.operations, true);
        if !actions.is_empty() {
            meta.insert(names::ACTIONS.to_string(), Value::Object(actions));
        }
        let functions = operations_value(&entity.operations, false);
        if !functions.is_empty() {
            meta.insert(names::FUNCTIONS.to_string(), Value::Object(functions));
        }
        let mut map = JsonMap::new();
        if !meta.is_empty() {
            map.insert(names::METADATA.to_string(), Value::Object(meta));
        }
        map.extend(properties);
        Ok(Value::Object(map))
    }

    fn encode_entity_set(&self, set: &EntitySetInstance) -> Result<Value, JsonCodecError> {
        let mut items = Vec::new();
        for entity in &set.entities {
            items.push(self.encode_entity(entity)?);
        }
        if !set.annotations.results_wrapper().unwrap_or(true) {
            // Counts and next links have no home without the wrapper.
            return Ok(Value::Array(items));
        }
        let mut map = JsonMap::new();
        map.insert(names::RESULTS.to_string(), Value::Array(items));
        if let Some(count) = set.inline_count {
            map.insert(names::COUNT.to_string(), Value::String(count.to_string()));
        }
        insert_str(&mut map, names::NEXT, set.next_link.as_deref());
        Ok(Value::Object(map))
    }

    fn encode_primitive_multi_value(
        &self,
        multi: &PrimitiveMultiValue,
    ) -> Result<Value, JsonCodecError> {
        if multi.is_null {
            return Ok(Value::Null);
        }
        let mut items = Vec::new();
        for item in &multi.items {
            items.push(self.encode_primitive(item)?);
        }
        let wrapped = multi.annotations.results_wrapper().unwrap_or(true);
        Ok(wrap_results(items, wrapped, multi.full_type_name.as_deref()))
    }

    fn encode_complex_multi_value(
        &self,
        multi: &ComplexMultiValue,
    ) -> Result<Value, JsonCodecError> {
        if multi.is_null {
            return Ok(Value::Null);
        }
        let mut items = Vec::new();
        for item in &multi.items {
            items.push(self.encode_complex(item)?);
        }
        let wrapped = multi.annotations.results_wrapper().unwrap_or(true);
        Ok(wrap_results(items, wrapped, multi.full_type_name.as_deref()))
    }

    fn encode_property_into(
        &self,
        map: &mut JsonMap,
        meta_properties: &mut JsonMap,
        element: &PayloadElement,
    ) -> Result<(), JsonCodecError> {
        match element {
            PayloadElement::PrimitiveProperty(property) => {
                map.insert(property.name.clone(), self.encode_primitive(&property.value)?);
                if let Some(type_name) = &property.value.full_type_name {
                    set_property_meta(meta_properties, &property.name, names::TYPE, type_name);
                }
            }
            PayloadElement::ComplexProperty(property) => {
                map.insert(property.name.clone(), self.encode_complex(&property.value)?);
            }
            PayloadElement::NullPropertyInstance(property) => {
                map.insert(property.name.clone(), Value::Null);
                if let Some(type_name) = &property.full_type_name {
                    set_property_meta(meta_properties, &property.name, names::TYPE, type_name);
                }
            }
            PayloadElement::NavigationPropertyInstance(nav) => {
                let value = match nav.value.as_deref() {
                    Some(PayloadElement::DeferredLink(link)) => deferred_object(&link.uri),
                    Some(PayloadElement::ExpandedLink(link)) => match &link.expanded_element {
                        Some(inner) => self.encode_value(inner)?,
                        None => match &link.uri {
                            Some(uri) => deferred_object(uri),
                            None => Value::Null,
                        },
                    },
                    Some(other) => self.encode_value(other)?,
                    None => Value::Null,
                };
                map.insert(nav.name.clone(), value);
                if let Some(association) = &nav.association_link {
                    set_property_meta(
                        meta_properties,
                        &nav.name,
                        names::ASSOCIATION_URI,
                        &association.uri,
                    );
                }
            }
            PayloadElement::EmptyCollectionProperty(property) => {
                let wrapped = property.value.annotations.results_wrapper().unwrap_or(true);
                map.insert(property.name.clone(), wrap_results(Vec::new(), wrapped, None));
                if let Some(type_name) = &property.full_type_name {
                    set_property_meta(meta_properties, &property.name, names::TYPE, type_name);
                }
            }
            PayloadElement::PrimitiveMultiValueProperty(property) => {
                let wrapped = property.value.annotations.results_wrapper().unwrap_or(true);
                map.insert(
                    property.name.clone(),
                    self.encode_primitive_multi_value(&property.value)?,
                );
                if !wrapped {
                    if let Some(type_name) = &property.value.full_type_name {
                        set_property_meta(meta_properties, &property.name, names::TYPE, type_name);
                    }
                }
            }
            PayloadElement::ComplexMultiValueProperty(property) => {
                let wrapped = property.value.annotations.results_wrapper().unwrap_or(true);
                map.insert(
                    property.name.clone(),
                    self.encode_complex_multi_value(&property.value)?,
                );
                if !wrapped {
                    if let Some(type_name) = &property.value.full_type_name {
                        set_property_meta(meta_properties, &property.name, names::TYPE, type_name);
                    }
                }
            }
            PayloadElement::NamedStreamInstance(stream) => {
                map.insert(stream.name.clone(), media_resource_value(stream));
            }
            other => return Err(JsonCodecError::Unencodable(other.kind())),
        }
        Ok(())
    }
}

// ── Shared object builders ────────────────────────────────────────────────

fn wrap_results(items: Vec<Value>, wrapped: bool, type_name: Option<&str>) -> Value {
    if !wrapped {
        return Value::Array(items);
    }
    let mut map = JsonMap::new();
    if let Some(type_name) = type_name {
        let mut meta = JsonMap::new();
        meta.insert(names::TYPE.to_string(), Value::String(type_name.to_string()));
        map.insert(names::METADATA.to_string(), Value::Object(meta));
    }
    map.insert(names::RESULTS.to_string(), Value::Array(items));
    Value::Object(map)
}

fn encode_link_collection(links: &LinkCollection) -> Result<Value, JsonCodecError> {
    let items: Vec<Value> = links.links.iter().map(|l| uri_object(&l.uri)).collect();
    if !links.annotations.results_wrapper().unwrap_or(true) {
        return Ok(Value::Array(items));
    }
    let mut map = JsonMap::new();
    map.insert(names::RESULTS.to_string(), Value::Array(items));
    if let Some(count) = links.inline_count {
        map.insert(names::COUNT.to_string(), Value::String(count.to_string()));
    }
    insert_str(&mut map, names::NEXT, links.next_link.as_deref());
    Ok(Value::Object(map))
}

fn operations_value(operations: &[ServiceOperationDescriptor], is_action: bool) -> JsonMap {
    let mut grouped = JsonMap::new();
    for op in operations.iter().filter(|op| op.is_action == is_action) {
        let key = op.metadata.clone().unwrap_or_default();
        let entry = grouped
            .entry(key)
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(list) = entry {
            let mut descriptor = JsonMap::new();
            insert_str(&mut descriptor, names::TITLE, op.title.as_deref());
            insert_str(&mut descriptor, names::TARGET, op.target.as_deref());
            list.push(Value::Object(descriptor));
        }
    }
    grouped
}

fn media_resource_value(stream: &NamedStreamInstance) -> Value {
    let mut inner = JsonMap::new();
    insert_str(&mut inner, names::MEDIA_SRC, stream.source_link.as_deref());
    insert_str(&mut inner, names::EDIT_MEDIA, stream.edit_link.as_deref());
    insert_str(&mut inner, names::MEDIA_ETAG, stream.etag.as_deref());
    insert_str(
        &mut inner,
        names::CONTENT_TYPE,
        stream
            .source_content_type
            .as_deref()
            .or(stream.edit_content_type.as_deref()),
    );
    let mut map = JsonMap::new();
    map.insert(names::MEDIA_RESOURCE.to_string(), Value::Object(inner));
    Value::Object(map)
}

fn encode_error(error: &ODataErrorPayload) -> Value {
    let mut inner = JsonMap::new();
    insert_str(&mut inner, names::CODE, error.code.as_deref());
    match (&error.message, &error.message_language) {
        (message, Some(lang)) => {
            let mut wrapped = JsonMap::new();
            wrapped.insert(names::LANG.to_string(), Value::String(lang.clone()));
            insert_str(&mut wrapped, names::VALUE, message.as_deref());
            inner.insert(names::MESSAGE.to_string(), Value::Object(wrapped));
        }
        (Some(message), None) => {
            inner.insert(names::MESSAGE.to_string(), Value::String(message.clone()));
        }
        (None, None) => {}
    }
    if let Some(chain) = &error.inner_error {
        inner.insert(names::INNER_ERROR.to_string(), inner_error_value(chain));
    }
    let mut map = JsonMap::new();
    map.insert(names::ERROR.to_string(), Value::Object(inner));
    Value::Object(map)
}

fn inner_error_value(inner: &ODataInternalExceptionPayload) -> Value {
    let mut map = JsonMap::new();
    insert_str(&mut map, names::MESSAGE, inner.message.as_deref());
    insert_str(&mut map, names::TYPE, inner.type_name.as_deref());
    insert_str(&mut map, names::STACK_TRACE, inner.stack_trace.as_deref());
    if let Some(next) = &inner.internal_exception {
        map.insert(names::INTERNAL_EXCEPTION.to_string(), inner_error_value(next));
    }
    Value::Object(map)
}

fn encode_service_document(doc: &ServiceDocumentInstance) -> Value {
    let mut sets = Vec::new();
    for workspace in &doc.workspaces {
        for collection in &workspace.collections {
            sets.push(Value::String(collection.href.clone()));
        }
    }
    let mut map = JsonMap::new();
    map.insert(names::ENTITY_SETS.to_string(), Value::Array(sets));
    Value::Object(map)
}

fn uri_object(uri: &str) -> Value {
    let mut map = JsonMap::new();
    map.insert(names::URI.to_string(), Value::String(uri.to_string()));
    Value::Object(map)
}

fn deferred_object(uri: &str) -> Value {
    let mut map = JsonMap::new();
    map.insert(names::DEFERRED.to_string(), uri_object(uri));
    Value::Object(map)
}

fn insert_str(map: &mut JsonMap, key: &str, value: Option<&str>) {
    if let Some(value) = value {
        map.insert(key.to_string(), Value::String(value.to_string()));
    }
}

fn set_property_meta(meta_properties: &mut JsonMap, name: &str, key: &str, value: &str) {
    let entry = meta_properties
        .entry(name.to_string())
        .or_insert_with(|| Value::Object(JsonMap::new()));
    if let Value::Object(map) = entry {
        map.insert(key.to_string(), Value::String(value.to_string()));
    }
}
