//! Payload element tree.
//!
//! One enum variant per payload shape, each wrapping a named struct. The
//! discriminant is fixed at construction; passes that change a node's shape
//! build a new node and copy the annotation bag forward.
//!
//! | Category     | Variants                                                  |
//! |--------------|-----------------------------------------------------------|
//! | Scalar       | `PrimitiveValue`                                          |
//! | Structural   | `ComplexInstance`, `EntityInstance`                       |
//! | Property     | `PrimitiveProperty`, `ComplexProperty`,                   |
//! |              | `NullPropertyInstance`, `NavigationPropertyInstance`,     |
//! |              | `EmptyCollectionProperty`, `*MultiValueProperty`          |
//! | Collection   | `EntitySetInstance`, `LinkCollection`,                    |
//! |              | `PrimitiveCollection`, `ComplexInstanceCollection`,       |
//! |              | `PrimitiveMultiValue`, `ComplexMultiValue`,               |
//! |              | `EmptyUntypedCollection`                                  |
//! | Link         | `DeferredLink`, `ExpandedLink`                            |
//! | Stream       | `NamedStreamInstance`                                     |
//! | Batch        | `BatchRequestPayload`, `BatchResponsePayload`,            |
//! |              | `BatchRequestChangeset`, `BatchResponseChangeset`         |
//! | Diagnostics  | `ODataErrorPayload`, `ODataInternalExceptionPayload`      |
//! | Service      | `ServiceDocumentInstance`, `WorkspaceInstance`,           |
//! |              | `ResourceCollectionInstance`, `ServiceOperationDescriptor`|
//! |              | `MetadataPayloadElement`                                  |

use std::fmt;

use odata_literals::ScalarValue;

use crate::annotation::Annotation;
use crate::http::{HttpRequestOperation, HttpResponseOperation};

/// Consumers that walk self-referential diagnostics cap their nesting depth
/// here and treat deeper chains as malformed input.
pub const MAX_NESTING_DEPTH: usize = 100;

// ── Scalar ────────────────────────────────────────────────────────────────

/// A primitive value, possibly a typed null.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PrimitiveValue {
    pub value: ScalarValue,
    pub full_type_name: Option<String>,
    pub annotations: Vec<Annotation>,
}

impl PrimitiveValue {
    pub fn new(value: ScalarValue) -> Self {
        Self {
            value,
            full_type_name: None,
            annotations: Vec::new(),
        }
    }

    pub fn typed(value: ScalarValue, full_type_name: impl Into<String>) -> Self {
        Self {
            value,
            full_type_name: Some(full_type_name.into()),
            annotations: Vec::new(),
        }
    }

    pub fn is_null(&self) -> bool {
        self.value.is_null()
    }
}

// ── Structural instances ──────────────────────────────────────────────────

/// A complex type instance: named properties in insertion order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ComplexInstance {
    pub full_type_name: Option<String>,
    pub is_null: bool,
    pub properties: Vec<PayloadElement>,
    pub annotations: Vec<Annotation>,
}

impl ComplexInstance {
    pub fn new(properties: Vec<PayloadElement>) -> Self {
        Self {
            properties,
            ..Default::default()
        }
    }

    pub fn null(full_type_name: Option<String>) -> Self {
        Self {
            full_type_name,
            is_null: true,
            ..Default::default()
        }
    }
}

/// An entity instance. Representationally a complex instance plus identity,
/// links, media-resource fields and operation descriptors.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EntityInstance {
    pub full_type_name: Option<String>,
    pub is_null: bool,
    pub id: Option<String>,
    pub etag: Option<String>,
    pub edit_link: Option<String>,
    pub stream_source_link: Option<String>,
    pub stream_edit_link: Option<String>,
    pub stream_etag: Option<String>,
    pub stream_content_type: Option<String>,
    pub properties: Vec<PayloadElement>,
    pub operations: Vec<ServiceOperationDescriptor>,
    pub annotations: Vec<Annotation>,
}

impl EntityInstance {
    pub fn new(properties: Vec<PayloadElement>) -> Self {
        Self {
            properties,
            ..Default::default()
        }
    }

    /// True when any default-stream (media resource) field is present.
    pub fn is_media_link_entry(&self) -> bool {
        self.stream_source_link.is_some()
            || self.stream_edit_link.is_some()
            || self.stream_etag.is_some()
            || self.stream_content_type.is_some()
    }
}

// ── Property wrappers ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct PrimitiveProperty {
    pub name: String,
    pub value: PrimitiveValue,
    pub annotations: Vec<Annotation>,
}

impl PrimitiveProperty {
    pub fn new(name: impl Into<String>, value: PrimitiveValue) -> Self {
        Self {
            name: name.into(),
            value,
            annotations: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComplexProperty {
    pub name: String,
    pub value: ComplexInstance,
    pub annotations: Vec<Annotation>,
}

impl ComplexProperty {
    pub fn new(name: impl Into<String>, value: ComplexInstance) -> Self {
        Self {
            name: name.into(),
            value,
            annotations: Vec::new(),
        }
    }
}

/// A property whose value is null and whose shape is unknown; only the name
/// and, when the payload carried one, the type name are known.
#[derive(Debug, Clone, PartialEq)]
pub struct NullPropertyInstance {
    pub name: String,
    pub full_type_name: Option<String>,
    pub annotations: Vec<Annotation>,
}

impl NullPropertyInstance {
    pub fn new(name: impl Into<String>, full_type_name: Option<String>) -> Self {
        Self {
            name: name.into(),
            full_type_name,
            annotations: Vec::new(),
        }
    }
}

/// A navigation property: deferred or expanded value plus, when present, the
/// association ("relatedlinks") link.
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationPropertyInstance {
    pub name: String,
    pub value: Option<Box<PayloadElement>>,
    pub association_link: Option<DeferredLink>,
    pub annotations: Vec<Annotation>,
}

impl NavigationPropertyInstance {
    pub fn new(name: impl Into<String>, value: PayloadElement) -> Self {
        Self {
            name: name.into(),
            value: Some(Box::new(value)),
            association_link: None,
            annotations: Vec::new(),
        }
    }
}

/// A property holding an empty collection whose element type is unknown.
#[derive(Debug, Clone, PartialEq)]
pub struct EmptyCollectionProperty {
    pub name: String,
    pub full_type_name: Option<String>,
    pub value: EmptyUntypedCollection,
    pub annotations: Vec<Annotation>,
}

impl EmptyCollectionProperty {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            full_type_name: None,
            value: EmptyUntypedCollection::default(),
            annotations: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrimitiveMultiValueProperty {
    pub name: String,
    pub value: PrimitiveMultiValue,
    pub annotations: Vec<Annotation>,
}

impl PrimitiveMultiValueProperty {
    pub fn new(name: impl Into<String>, value: PrimitiveMultiValue) -> Self {
        Self {
            name: name.into(),
            value,
            annotations: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComplexMultiValueProperty {
    pub name: String,
    pub value: ComplexMultiValue,
    pub annotations: Vec<Annotation>,
}

impl ComplexMultiValueProperty {
    pub fn new(name: impl Into<String>, value: ComplexMultiValue) -> Self {
        Self {
            name: name.into(),
            value,
            annotations: Vec::new(),
        }
    }
}

// ── Homogeneous collections ───────────────────────────────────────────────

/// An entity set (feed). Inline count and next link come from the wire.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EntitySetInstance {
    pub entities: Vec<EntityInstance>,
    pub inline_count: Option<i64>,
    pub next_link: Option<String>,
    pub annotations: Vec<Annotation>,
}

impl EntitySetInstance {
    pub fn new(entities: Vec<EntityInstance>) -> Self {
        Self {
            entities,
            ..Default::default()
        }
    }
}

/// A `$links`-style collection of bare uris.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LinkCollection {
    pub links: Vec<DeferredLink>,
    pub inline_count: Option<i64>,
    pub next_link: Option<String>,
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PrimitiveCollection {
    pub items: Vec<PrimitiveValue>,
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ComplexInstanceCollection {
    pub items: Vec<ComplexInstance>,
    pub annotations: Vec<Annotation>,
}

/// A multi-value (`Collection(…)`) of primitives.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PrimitiveMultiValue {
    pub full_type_name: Option<String>,
    pub is_null: bool,
    pub items: Vec<PrimitiveValue>,
    pub annotations: Vec<Annotation>,
}

/// A multi-value (`Collection(…)`) of complex instances.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ComplexMultiValue {
    pub full_type_name: Option<String>,
    pub is_null: bool,
    pub items: Vec<ComplexInstance>,
    pub annotations: Vec<Annotation>,
}

/// An empty or all-null collection that context has not re-typed yet. It can
/// only be compared or re-serialized as "empty".
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EmptyUntypedCollection {
    pub annotations: Vec<Annotation>,
}

// ── Links ─────────────────────────────────────────────────────────────────

/// A navigation link that was not expanded: just a uri.
#[derive(Debug, Clone, PartialEq)]
pub struct DeferredLink {
    pub uri: String,
    pub annotations: Vec<Annotation>,
}

impl DeferredLink {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            annotations: Vec::new(),
        }
    }
}

/// An expanded navigation link: the inlined element (entity, entity set, or
/// absent for an expanded null) plus the link's own uri when the wire had one.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExpandedLink {
    pub uri: Option<String>,
    pub expanded_element: Option<Box<PayloadElement>>,
    pub annotations: Vec<Annotation>,
}

impl ExpandedLink {
    pub fn new(expanded_element: PayloadElement) -> Self {
        Self {
            uri: None,
            expanded_element: Some(Box::new(expanded_element)),
            annotations: Vec::new(),
        }
    }
}

// ── Streams ───────────────────────────────────────────────────────────────

/// A named stream: source/edit link pair merged by stream name.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedStreamInstance {
    pub name: String,
    pub source_link: Option<String>,
    pub edit_link: Option<String>,
    pub etag: Option<String>,
    pub source_content_type: Option<String>,
    pub edit_content_type: Option<String>,
    pub annotations: Vec<Annotation>,
}

impl NamedStreamInstance {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source_link: None,
            edit_link: None,
            etag: None,
            source_content_type: None,
            edit_content_type: None,
            annotations: Vec::new(),
        }
    }
}

// ── Batch ─────────────────────────────────────────────────────────────────

/// Top-level batch part: one operation or one changeset.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchRequestPart {
    Operation(HttpRequestOperation),
    Changeset(BatchRequestChangeset),
}

#[derive(Debug, Clone, PartialEq)]
pub enum BatchResponsePart {
    Operation(HttpResponseOperation),
    Changeset(BatchResponseChangeset),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchRequestPayload {
    pub boundary: String,
    pub parts: Vec<BatchRequestPart>,
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchResponsePayload {
    pub boundary: String,
    pub parts: Vec<BatchResponsePart>,
    pub annotations: Vec<Annotation>,
}

/// An ordered group of request operations processed as one unit. Changesets
/// never nest.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchRequestChangeset {
    pub boundary: String,
    pub operations: Vec<HttpRequestOperation>,
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchResponseChangeset {
    pub boundary: String,
    pub operations: Vec<HttpResponseOperation>,
    pub annotations: Vec<Annotation>,
}

// ── Diagnostics ───────────────────────────────────────────────────────────

/// Top-level error body.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ODataErrorPayload {
    pub code: Option<String>,
    pub message: Option<String>,
    pub message_language: Option<String>,
    pub inner_error: Option<Box<ODataInternalExceptionPayload>>,
    pub annotations: Vec<Annotation>,
}

/// Inner exception chain. Self-referential; walkers guard by depth
/// ([`MAX_NESTING_DEPTH`]), never by node identity, because inner errors
/// legitimately repeat structurally.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ODataInternalExceptionPayload {
    pub message: Option<String>,
    pub type_name: Option<String>,
    pub stack_trace: Option<String>,
    pub internal_exception: Option<Box<ODataInternalExceptionPayload>>,
    pub annotations: Vec<Annotation>,
}

// ── Service listing ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ServiceDocumentInstance {
    pub workspaces: Vec<WorkspaceInstance>,
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct WorkspaceInstance {
    pub title: Option<String>,
    pub collections: Vec<ResourceCollectionInstance>,
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResourceCollectionInstance {
    pub title: Option<String>,
    pub href: String,
    pub annotations: Vec<Annotation>,
}

impl ResourceCollectionInstance {
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            title: None,
            href: href.into(),
            annotations: Vec::new(),
        }
    }
}

/// An action or function advertisement attached to an entity (or standing
/// alone in a service listing).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ServiceOperationDescriptor {
    pub is_action: bool,
    pub metadata: Option<String>,
    pub title: Option<String>,
    pub target: Option<String>,
    pub annotations: Vec<Annotation>,
}

/// A `$metadata` document carried as verbatim text. The conformance checks
/// that consume it compare text, so nothing is gained by parsing CSDL here.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MetadataPayloadElement {
    pub text: String,
    pub annotations: Vec<Annotation>,
}

// ── PayloadElement enum ───────────────────────────────────────────────────

/// All payload shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum PayloadElement {
    PrimitiveValue(PrimitiveValue),
    ComplexInstance(ComplexInstance),
    EntityInstance(EntityInstance),
    PrimitiveProperty(PrimitiveProperty),
    ComplexProperty(ComplexProperty),
    NullPropertyInstance(NullPropertyInstance),
    NavigationPropertyInstance(NavigationPropertyInstance),
    EmptyCollectionProperty(EmptyCollectionProperty),
    PrimitiveMultiValueProperty(PrimitiveMultiValueProperty),
    ComplexMultiValueProperty(ComplexMultiValueProperty),
    EntitySetInstance(EntitySetInstance),
    LinkCollection(LinkCollection),
    PrimitiveCollection(PrimitiveCollection),
    ComplexInstanceCollection(ComplexInstanceCollection),
    PrimitiveMultiValue(PrimitiveMultiValue),
    ComplexMultiValue(ComplexMultiValue),
    EmptyUntypedCollection(EmptyUntypedCollection),
    DeferredLink(DeferredLink),
    ExpandedLink(ExpandedLink),
    NamedStreamInstance(NamedStreamInstance),
    BatchRequestPayload(BatchRequestPayload),
    BatchResponsePayload(BatchResponsePayload),
    BatchRequestChangeset(BatchRequestChangeset),
    BatchResponseChangeset(BatchResponseChangeset),
    ODataErrorPayload(ODataErrorPayload),
    ODataInternalExceptionPayload(ODataInternalExceptionPayload),
    ServiceDocumentInstance(ServiceDocumentInstance),
    WorkspaceInstance(WorkspaceInstance),
    ResourceCollectionInstance(ResourceCollectionInstance),
    ServiceOperationDescriptor(ServiceOperationDescriptor),
    MetadataPayloadElement(MetadataPayloadElement),
}

/// Fieldless discriminants, used for homogeneity checks and mismatch
/// messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    PrimitiveValue,
    ComplexInstance,
    EntityInstance,
    PrimitiveProperty,
    ComplexProperty,
    NullPropertyInstance,
    NavigationPropertyInstance,
    EmptyCollectionProperty,
    PrimitiveMultiValueProperty,
    ComplexMultiValueProperty,
    EntitySetInstance,
    LinkCollection,
    PrimitiveCollection,
    ComplexInstanceCollection,
    PrimitiveMultiValue,
    ComplexMultiValue,
    EmptyUntypedCollection,
    DeferredLink,
    ExpandedLink,
    NamedStreamInstance,
    BatchRequestPayload,
    BatchResponsePayload,
    BatchRequestChangeset,
    BatchResponseChangeset,
    ODataErrorPayload,
    ODataInternalExceptionPayload,
    ServiceDocumentInstance,
    WorkspaceInstance,
    ResourceCollectionInstance,
    ServiceOperationDescriptor,
    MetadataPayloadElement,
}

impl ElementKind {
    pub fn name(&self) -> &'static str {
        match self {
            ElementKind::PrimitiveValue => "PrimitiveValue",
            ElementKind::ComplexInstance => "ComplexInstance",
            ElementKind::EntityInstance => "EntityInstance",
            ElementKind::PrimitiveProperty => "PrimitiveProperty",
            ElementKind::ComplexProperty => "ComplexProperty",
            ElementKind::NullPropertyInstance => "NullPropertyInstance",
            ElementKind::NavigationPropertyInstance => "NavigationPropertyInstance",
            ElementKind::EmptyCollectionProperty => "EmptyCollectionProperty",
            ElementKind::PrimitiveMultiValueProperty => "PrimitiveMultiValueProperty",
            ElementKind::ComplexMultiValueProperty => "ComplexMultiValueProperty",
            ElementKind::EntitySetInstance => "EntitySetInstance",
            ElementKind::LinkCollection => "LinkCollection",
            ElementKind::PrimitiveCollection => "PrimitiveCollection",
            ElementKind::ComplexInstanceCollection => "ComplexInstanceCollection",
            ElementKind::PrimitiveMultiValue => "PrimitiveMultiValue",
            ElementKind::ComplexMultiValue => "ComplexMultiValue",
            ElementKind::EmptyUntypedCollection => "EmptyUntypedCollection",
            ElementKind::DeferredLink => "DeferredLink",
            ElementKind::ExpandedLink => "ExpandedLink",
            ElementKind::NamedStreamInstance => "NamedStreamInstance",
            ElementKind::BatchRequestPayload => "BatchRequestPayload",
            ElementKind::BatchResponsePayload => "BatchResponsePayload",
            ElementKind::BatchRequestChangeset => "BatchRequestChangeset",
            ElementKind::BatchResponseChangeset => "BatchResponseChangeset",
            ElementKind::ODataErrorPayload => "ODataErrorPayload",
            ElementKind::ODataInternalExceptionPayload => "ODataInternalExceptionPayload",
            ElementKind::ServiceDocumentInstance => "ServiceDocumentInstance",
            ElementKind::WorkspaceInstance => "WorkspaceInstance",
            ElementKind::ResourceCollectionInstance => "ResourceCollectionInstance",
            ElementKind::ServiceOperationDescriptor => "ServiceOperationDescriptor",
            ElementKind::MetadataPayloadElement => "MetadataPayloadElement",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl PayloadElement {
    pub fn kind(&self) -> ElementKind {
        match self {
            PayloadElement::PrimitiveValue(_) => ElementKind::PrimitiveValue,
            PayloadElement::ComplexInstance(_) => ElementKind::ComplexInstance,
            PayloadElement::EntityInstance(_) => ElementKind::EntityInstance,
            PayloadElement::PrimitiveProperty(_) => ElementKind::PrimitiveProperty,
            PayloadElement::ComplexProperty(_) => ElementKind::ComplexProperty,
            PayloadElement::NullPropertyInstance(_) => ElementKind::NullPropertyInstance,
            PayloadElement::NavigationPropertyInstance(_) => {
                ElementKind::NavigationPropertyInstance
            }
            PayloadElement::EmptyCollectionProperty(_) => ElementKind::EmptyCollectionProperty,
            PayloadElement::PrimitiveMultiValueProperty(_) => {
                ElementKind::PrimitiveMultiValueProperty
            }
            PayloadElement::ComplexMultiValueProperty(_) => ElementKind::ComplexMultiValueProperty,
            PayloadElement::EntitySetInstance(_) => ElementKind::EntitySetInstance,
            PayloadElement::LinkCollection(_) => ElementKind::LinkCollection,
            PayloadElement::PrimitiveCollection(_) => ElementKind::PrimitiveCollection,
            PayloadElement::ComplexInstanceCollection(_) => {
                ElementKind::ComplexInstanceCollection
            }
            PayloadElement::PrimitiveMultiValue(_) => ElementKind::PrimitiveMultiValue,
            PayloadElement::ComplexMultiValue(_) => ElementKind::ComplexMultiValue,
            PayloadElement::EmptyUntypedCollection(_) => ElementKind::EmptyUntypedCollection,
            PayloadElement::DeferredLink(_) => ElementKind::DeferredLink,
            PayloadElement::ExpandedLink(_) => ElementKind::ExpandedLink,
            PayloadElement::NamedStreamInstance(_) => ElementKind::NamedStreamInstance,
            PayloadElement::BatchRequestPayload(_) => ElementKind::BatchRequestPayload,
            PayloadElement::BatchResponsePayload(_) => ElementKind::BatchResponsePayload,
            PayloadElement::BatchRequestChangeset(_) => ElementKind::BatchRequestChangeset,
            PayloadElement::BatchResponseChangeset(_) => ElementKind::BatchResponseChangeset,
            PayloadElement::ODataErrorPayload(_) => ElementKind::ODataErrorPayload,
            PayloadElement::ODataInternalExceptionPayload(_) => {
                ElementKind::ODataInternalExceptionPayload
            }
            PayloadElement::ServiceDocumentInstance(_) => ElementKind::ServiceDocumentInstance,
            PayloadElement::WorkspaceInstance(_) => ElementKind::WorkspaceInstance,
            PayloadElement::ResourceCollectionInstance(_) => {
                ElementKind::ResourceCollectionInstance
            }
            PayloadElement::ServiceOperationDescriptor(_) => {
                ElementKind::ServiceOperationDescriptor
            }
            PayloadElement::MetadataPayloadElement(_) => ElementKind::MetadataPayloadElement,
        }
    }

    pub fn annotations(&self) -> &[Annotation] {
        match self {
            PayloadElement::PrimitiveValue(n) => &n.annotations,
            PayloadElement::ComplexInstance(n) => &n.annotations,
            PayloadElement::EntityInstance(n) => &n.annotations,
            PayloadElement::PrimitiveProperty(n) => &n.annotations,
            PayloadElement::ComplexProperty(n) => &n.annotations,
            PayloadElement::NullPropertyInstance(n) => &n.annotations,
            PayloadElement::NavigationPropertyInstance(n) => &n.annotations,
            PayloadElement::EmptyCollectionProperty(n) => &n.annotations,
            PayloadElement::PrimitiveMultiValueProperty(n) => &n.annotations,
            PayloadElement::ComplexMultiValueProperty(n) => &n.annotations,
            PayloadElement::EntitySetInstance(n) => &n.annotations,
            PayloadElement::LinkCollection(n) => &n.annotations,
            PayloadElement::PrimitiveCollection(n) => &n.annotations,
            PayloadElement::ComplexInstanceCollection(n) => &n.annotations,
            PayloadElement::PrimitiveMultiValue(n) => &n.annotations,
            PayloadElement::ComplexMultiValue(n) => &n.annotations,
            PayloadElement::EmptyUntypedCollection(n) => &n.annotations,
            PayloadElement::DeferredLink(n) => &n.annotations,
            PayloadElement::ExpandedLink(n) => &n.annotations,
            PayloadElement::NamedStreamInstance(n) => &n.annotations,
            PayloadElement::BatchRequestPayload(n) => &n.annotations,
            PayloadElement::BatchResponsePayload(n) => &n.annotations,
            PayloadElement::BatchRequestChangeset(n) => &n.annotations,
            PayloadElement::BatchResponseChangeset(n) => &n.annotations,
            PayloadElement::ODataErrorPayload(n) => &n.annotations,
            PayloadElement::ODataInternalExceptionPayload(n) => &n.annotations,
            PayloadElement::ServiceDocumentInstance(n) => &n.annotations,
            PayloadElement::WorkspaceInstance(n) => &n.annotations,
            PayloadElement::ResourceCollectionInstance(n) => &n.annotations,
            PayloadElement::ServiceOperationDescriptor(n) => &n.annotations,
            PayloadElement::MetadataPayloadElement(n) => &n.annotations,
        }
    }

    pub fn annotations_mut(&mut self) -> &mut Vec<Annotation> {
        match self {
            PayloadElement::PrimitiveValue(n) => &mut n.annotations,
            PayloadElement::ComplexInstance(n) => &mut n.annotations,
            PayloadElement::EntityInstance(n) => &mut n.annotations,
            PayloadElement::PrimitiveProperty(n) => &mut n.annotations,
            PayloadElement::ComplexProperty(n) => &mut n.annotations,
            PayloadElement::NullPropertyInstance(n) => &mut n.annotations,
            PayloadElement::NavigationPropertyInstance(n) => &mut n.annotations,
            PayloadElement::EmptyCollectionProperty(n) => &mut n.annotations,
            PayloadElement::PrimitiveMultiValueProperty(n) => &mut n.annotations,
            PayloadElement::ComplexMultiValueProperty(n) => &mut n.annotations,
            PayloadElement::EntitySetInstance(n) => &mut n.annotations,
            PayloadElement::LinkCollection(n) => &mut n.annotations,
            PayloadElement::PrimitiveCollection(n) => &mut n.annotations,
            PayloadElement::ComplexInstanceCollection(n) => &mut n.annotations,
            PayloadElement::PrimitiveMultiValue(n) => &mut n.annotations,
            PayloadElement::ComplexMultiValue(n) => &mut n.annotations,
            PayloadElement::EmptyUntypedCollection(n) => &mut n.annotations,
            PayloadElement::DeferredLink(n) => &mut n.annotations,
            PayloadElement::ExpandedLink(n) => &mut n.annotations,
            PayloadElement::NamedStreamInstance(n) => &mut n.annotations,
            PayloadElement::BatchRequestPayload(n) => &mut n.annotations,
            PayloadElement::BatchResponsePayload(n) => &mut n.annotations,
            PayloadElement::BatchRequestChangeset(n) => &mut n.annotations,
            PayloadElement::BatchResponseChangeset(n) => &mut n.annotations,
            PayloadElement::ODataErrorPayload(n) => &mut n.annotations,
            PayloadElement::ODataInternalExceptionPayload(n) => &mut n.annotations,
            PayloadElement::ServiceDocumentInstance(n) => &mut n.annotations,
            PayloadElement::WorkspaceInstance(n) => &mut n.annotations,
            PayloadElement::ResourceCollectionInstance(n) => &mut n.annotations,
            PayloadElement::ServiceOperationDescriptor(n) => &mut n.annotations,
            PayloadElement::MetadataPayloadElement(n) => &mut n.annotations,
        }
    }

    /// Appends an annotation, builder style.
    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotations_mut().push(annotation);
        self
    }

    /// The property name, for the wrapper shapes that carry one.
    pub fn property_name(&self) -> Option<&str> {
        match self {
            PayloadElement::PrimitiveProperty(n) => Some(&n.name),
            PayloadElement::ComplexProperty(n) => Some(&n.name),
            PayloadElement::NullPropertyInstance(n) => Some(&n.name),
            PayloadElement::NavigationPropertyInstance(n) => Some(&n.name),
            PayloadElement::EmptyCollectionProperty(n) => Some(&n.name),
            PayloadElement::PrimitiveMultiValueProperty(n) => Some(&n.name),
            PayloadElement::ComplexMultiValueProperty(n) => Some(&n.name),
            PayloadElement::NamedStreamInstance(n) => Some(&n.name),
            _ => None,
        }
    }

    /// Whether this node represents a null value, under either absence
    /// encoding.
    pub fn is_null(&self) -> bool {
        match self {
            PayloadElement::PrimitiveValue(n) => n.is_null(),
            PayloadElement::ComplexInstance(n) => n.is_null,
            PayloadElement::EntityInstance(n) => n.is_null,
            PayloadElement::PrimitiveProperty(n) => n.value.is_null(),
            PayloadElement::ComplexProperty(n) => n.value.is_null,
            PayloadElement::NullPropertyInstance(_) => true,
            PayloadElement::PrimitiveMultiValue(n) => n.is_null,
            PayloadElement::ComplexMultiValue(n) => n.is_null,
            _ => false,
        }
    }

    pub fn full_type_name(&self) -> Option<&str> {
        match self {
            PayloadElement::PrimitiveValue(n) => n.full_type_name.as_deref(),
            PayloadElement::ComplexInstance(n) => n.full_type_name.as_deref(),
            PayloadElement::EntityInstance(n) => n.full_type_name.as_deref(),
            PayloadElement::PrimitiveProperty(n) => n.value.full_type_name.as_deref(),
            PayloadElement::ComplexProperty(n) => n.value.full_type_name.as_deref(),
            PayloadElement::NullPropertyInstance(n) => n.full_type_name.as_deref(),
            PayloadElement::EmptyCollectionProperty(n) => n.full_type_name.as_deref(),
            PayloadElement::PrimitiveMultiValueProperty(n) => n.value.full_type_name.as_deref(),
            PayloadElement::ComplexMultiValueProperty(n) => n.value.full_type_name.as_deref(),
            PayloadElement::PrimitiveMultiValue(n) => n.full_type_name.as_deref(),
            PayloadElement::ComplexMultiValue(n) => n.full_type_name.as_deref(),
            _ => None,
        }
    }

    /// Placeholder body for operations with no payload: a null primitive the
    /// serializer replaces with the raw text annotation, if any.
    pub fn empty_primitive() -> Self {
        PayloadElement::PrimitiveValue(PrimitiveValue::new(ScalarValue::Null))
    }
}
