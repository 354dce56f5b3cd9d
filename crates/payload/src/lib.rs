//! Payload element tree shared by every codec and the structural differ.
//!
//! The tree is a closed set of shapes ([`PayloadElement`]); consumers
//! dispatch with a `match`, so adding a shape is a compile-time-checked
//! change everywhere. Nodes are plain owned values with an append-only
//! [`Annotation`] bag; passes that reshape a node build a new one and carry
//! the bag forward.

mod annotation;
mod element;
mod http;

pub use annotation::{Annotation, AnnotationBag, AnnotationKind};
pub use element::{
    BatchRequestChangeset, BatchRequestPart, BatchRequestPayload, BatchResponseChangeset,
    BatchResponsePart, BatchResponsePayload, ComplexInstance, ComplexInstanceCollection,
    ComplexMultiValue, ComplexMultiValueProperty, ComplexProperty, DeferredLink, ElementKind,
    EmptyCollectionProperty, EmptyUntypedCollection, EntityInstance, EntitySetInstance,
    ExpandedLink, LinkCollection, MetadataPayloadElement, NamedStreamInstance,
    NavigationPropertyInstance, NullPropertyInstance, ODataErrorPayload,
    ODataInternalExceptionPayload, PayloadElement, PrimitiveCollection, PrimitiveMultiValue,
    PrimitiveMultiValueProperty, PrimitiveProperty, PrimitiveValue, ResourceCollectionInstance,
    ServiceDocumentInstance, ServiceOperationDescriptor, WorkspaceInstance, MAX_NESTING_DEPTH,
};
pub use http::{HttpRequestOperation, HttpResponseOperation, HttpVerb};

pub use odata_literals::ScalarValue;

