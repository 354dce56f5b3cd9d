//! The recursive two-tree walk.
//!
//! Every step checks the observed discriminant against the expected one,
//! compares the node's own fields, then recurses into children, wrapping
//! failures in path segments on the way out. The walk is a pure function of
//! the two nodes and the options; there is no shared traversal state.

use tracing::debug;

use odata_payload::{
    Annotation, AnnotationKind, BatchRequestChangeset, BatchRequestPart, BatchRequestPayload,
    BatchResponseChangeset, BatchResponsePart, BatchResponsePayload, ComplexInstance,
    ComplexInstanceCollection, ComplexMultiValue, DeferredLink, EntityInstance, EntitySetInstance,
    ExpandedLink, HttpRequestOperation, HttpResponseOperation, LinkCollection, NamedStreamInstance,
    NavigationPropertyInstance, ODataErrorPayload, ODataInternalExceptionPayload, PayloadElement,
    PrimitiveCollection, PrimitiveMultiValue, PrimitiveValue, ResourceCollectionInstance,
    ScalarValue, ServiceDocumentInstance, ServiceOperationDescriptor, WorkspaceInstance,
    MAX_NESTING_DEPTH,
};

use crate::failure::{CompareFailure, PathSegment};
use crate::PayloadComparer;

impl PayloadComparer {
    /// Compares two trees. `Ok(())` means the observed tree matches the
    /// expected one under the configured modes; the first mismatch comes
    /// back as a localized failure.
    pub fn compare(
        &self,
        expected: &PayloadElement,
        observed: &PayloadElement,
    ) -> Result<(), CompareFailure> {
        debug!(
            expected = %expected.kind(),
            observed = %observed.kind(),
            "comparing payload trees"
        );
        self.compare_element(expected, observed)
    }

    fn compare_element(
        &self,
        expected: &PayloadElement,
        observed: &PayloadElement,
    ) -> Result<(), CompareFailure> {
        match (expected, observed) {
            (PayloadElement::PrimitiveValue(e), PayloadElement::PrimitiveValue(o)) => {
                self.compare_primitive(e, o)
            }
            // Null complex tolerance: an untyped null primitive on the
            // expected side accepts a null complex value. Scope is exactly
            // that narrow; a typed null primitive does not get it.
            (PayloadElement::PrimitiveValue(e), PayloadElement::ComplexInstance(o))
                if e.is_null() && e.full_type_name.is_none() && o.is_null =>
            {
                Ok(())
            }
            (PayloadElement::ComplexInstance(e), PayloadElement::ComplexInstance(o)) => {
                self.compare_complex(e, o)
            }
            // An expected complex may match an observed entity: without
            // metadata the two shapes are indistinguishable, so the entity's
            // identity fields are not compared.
            (PayloadElement::ComplexInstance(e), PayloadElement::EntityInstance(o)) => {
                compare_field(
                    "type name",
                    e.full_type_name.as_deref(),
                    o.full_type_name.as_deref(),
                )?;
                compare_null_flags(e.is_null, o.is_null)?;
                self.compare_instance_properties(&e.properties, &o.properties)?;
                self.compare_annotations(&e.annotations, &o.annotations)
            }
            (PayloadElement::EntityInstance(e), PayloadElement::EntityInstance(o)) => {
                self.compare_entity(e, o)
            }
            (PayloadElement::PrimitiveProperty(e), PayloadElement::PrimitiveProperty(o)) => {
                compare_names(&e.name, &o.name)?;
                self.compare_primitive(&e.value, &o.value)?;
                self.compare_annotations(&e.annotations, &o.annotations)
            }
            // Null complex tolerance again, at property level.
            (PayloadElement::PrimitiveProperty(e), PayloadElement::ComplexProperty(o))
                if e.value.is_null() && e.value.full_type_name.is_none() && o.value.is_null =>
            {
                compare_names(&e.name, &o.name)
            }
            (PayloadElement::PrimitiveProperty(e), PayloadElement::NullPropertyInstance(o))
                if e.value.is_null() =>
            {
                compare_names(&e.name, &o.name)?;
                compare_field(
                    "type name",
                    e.value.full_type_name.as_deref(),
                    o.full_type_name.as_deref(),
                )
            }
            (PayloadElement::ComplexProperty(e), PayloadElement::ComplexProperty(o)) => {
                compare_names(&e.name, &o.name)?;
                self.compare_complex(&e.value, &o.value)?;
                self.compare_annotations(&e.annotations, &o.annotations)
            }
            (PayloadElement::ComplexProperty(e), PayloadElement::NullPropertyInstance(o))
                if e.value.is_null =>
            {
                compare_names(&e.name, &o.name)?;
                compare_field(
                    "type name",
                    e.value.full_type_name.as_deref(),
                    o.full_type_name.as_deref(),
                )
            }
            (PayloadElement::NullPropertyInstance(e), PayloadElement::NullPropertyInstance(o)) => {
                compare_names(&e.name, &o.name)?;
                compare_field(
                    "type name",
                    e.full_type_name.as_deref(),
                    o.full_type_name.as_deref(),
                )
            }
            (PayloadElement::NullPropertyInstance(e), PayloadElement::PrimitiveProperty(o))
                if o.value.is_null() =>
            {
                compare_names(&e.name, &o.name)?;
                compare_field(
                    "type name",
                    e.full_type_name.as_deref(),
                    o.value.full_type_name.as_deref(),
                )
            }
            (PayloadElement::NullPropertyInstance(e), PayloadElement::ComplexProperty(o))
                if o.value.is_null =>
            {
                compare_names(&e.name, &o.name)?;
                compare_field(
                    "type name",
                    e.full_type_name.as_deref(),
                    o.value.full_type_name.as_deref(),
                )
            }
            (
                PayloadElement::NullPropertyInstance(e),
                PayloadElement::PrimitiveMultiValueProperty(o),
            ) if o.value.is_null => {
                compare_names(&e.name, &o.name)?;
                compare_field(
                    "type name",
                    e.full_type_name.as_deref(),
                    o.value.full_type_name.as_deref(),
                )
            }
            (
                PayloadElement::NullPropertyInstance(e),
                PayloadElement::ComplexMultiValueProperty(o),
            ) if o.value.is_null => {
                compare_names(&e.name, &o.name)?;
                compare_field(
                    "type name",
                    e.full_type_name.as_deref(),
                    o.value.full_type_name.as_deref(),
                )
            }
            (
                PayloadElement::PrimitiveMultiValueProperty(e),
                PayloadElement::NullPropertyInstance(o),
            ) if e.value.is_null => {
                compare_names(&e.name, &o.name)?;
                compare_field(
                    "type name",
                    e.value.full_type_name.as_deref(),
                    o.full_type_name.as_deref(),
                )
            }
            (
                PayloadElement::ComplexMultiValueProperty(e),
                PayloadElement::NullPropertyInstance(o),
            ) if e.value.is_null => {
                compare_names(&e.name, &o.name)?;
                compare_field(
                    "type name",
                    e.value.full_type_name.as_deref(),
                    o.full_type_name.as_deref(),
                )
            }
            (
                PayloadElement::NavigationPropertyInstance(e),
                PayloadElement::NavigationPropertyInstance(o),
            ) => self.compare_navigation(e, o),
            (
                PayloadElement::EmptyCollectionProperty(e),
                PayloadElement::EmptyCollectionProperty(o),
            ) => {
                compare_names(&e.name, &o.name)?;
                compare_field(
                    "type name",
                    e.full_type_name.as_deref(),
                    o.full_type_name.as_deref(),
                )?;
                self.compare_annotations(&e.value.annotations, &o.value.annotations)?;
                self.compare_annotations(&e.annotations, &o.annotations)
            }
            (
                PayloadElement::PrimitiveMultiValueProperty(e),
                PayloadElement::PrimitiveMultiValueProperty(o),
            ) => {
                compare_names(&e.name, &o.name)?;
                self.compare_primitive_multi_value(&e.value, &o.value)?;
                self.compare_annotations(&e.annotations, &o.annotations)
            }
            (
                PayloadElement::ComplexMultiValueProperty(e),
                PayloadElement::ComplexMultiValueProperty(o),
            ) => {
                compare_names(&e.name, &o.name)?;
                self.compare_complex_multi_value(&e.value, &o.value)?;
                self.compare_annotations(&e.annotations, &o.annotations)
            }
            (PayloadElement::EntitySetInstance(e), PayloadElement::EntitySetInstance(o)) => {
                self.compare_entity_set(e, o)
            }
            (PayloadElement::LinkCollection(e), PayloadElement::LinkCollection(o)) => {
                self.compare_link_collection(e, o)
            }
            (PayloadElement::PrimitiveCollection(e), PayloadElement::PrimitiveCollection(o)) => {
                self.compare_primitive_collection(e, o)
            }
            (
                PayloadElement::ComplexInstanceCollection(e),
                PayloadElement::ComplexInstanceCollection(o),
            ) => self.compare_complex_collection(e, o),
            (PayloadElement::PrimitiveMultiValue(e), PayloadElement::PrimitiveMultiValue(o)) => {
                self.compare_primitive_multi_value(e, o)
            }
            (PayloadElement::ComplexMultiValue(e), PayloadElement::ComplexMultiValue(o)) => {
                self.compare_complex_multi_value(e, o)
            }
            (
                PayloadElement::EmptyUntypedCollection(e),
                PayloadElement::EmptyUntypedCollection(o),
            ) => self.compare_annotations(&e.annotations, &o.annotations),
            (PayloadElement::DeferredLink(e), PayloadElement::DeferredLink(o)) => {
                self.compare_deferred(e, o)
            }
            (PayloadElement::ExpandedLink(e), PayloadElement::ExpandedLink(o)) => {
                self.compare_expanded(e, o)
            }
            (PayloadElement::NamedStreamInstance(e), PayloadElement::NamedStreamInstance(o)) => {
                self.compare_named_stream(e, o)
            }
            (PayloadElement::BatchRequestPayload(e), PayloadElement::BatchRequestPayload(o)) => {
                self.compare_batch_request(e, o)
            }
            (PayloadElement::BatchResponsePayload(e), PayloadElement::BatchResponsePayload(o)) => {
                self.compare_batch_response(e, o)
            }
            (PayloadElement::BatchRequestChangeset(e), PayloadElement::BatchRequestChangeset(o)) => {
                self.compare_request_changeset(e, o)
            }
            (
                PayloadElement::BatchResponseChangeset(e),
                PayloadElement::BatchResponseChangeset(o),
            ) => self.compare_response_changeset(e, o),
            (PayloadElement::ODataErrorPayload(e), PayloadElement::ODataErrorPayload(o)) => {
                self.compare_error(e, o)
            }
            (
                PayloadElement::ODataInternalExceptionPayload(e),
                PayloadElement::ODataInternalExceptionPayload(o),
            ) => self.compare_inner_error(e, o, 1),
            (
                PayloadElement::ServiceDocumentInstance(e),
                PayloadElement::ServiceDocumentInstance(o),
            ) => self.compare_service_document(e, o),
            (PayloadElement::WorkspaceInstance(e), PayloadElement::WorkspaceInstance(o)) => {
                self.compare_workspace(e, o)
            }
            (
                PayloadElement::ResourceCollectionInstance(e),
                PayloadElement::ResourceCollectionInstance(o),
            ) => self.compare_resource_collection(e, o),
            (
                PayloadElement::ServiceOperationDescriptor(e),
                PayloadElement::ServiceOperationDescriptor(o),
            ) => self.compare_operation(e, o),
            (PayloadElement::MetadataPayloadElement(e), PayloadElement::MetadataPayloadElement(o)) =>
            {
                if e.text != o.text {
                    return Err(CompareFailure::new("metadata documents differ"));
                }
                self.compare_annotations(&e.annotations, &o.annotations)
            }
            (expected, observed) => Err(CompareFailure::new(format!(
                "expected a {}, observed a {}",
                expected.kind(),
                observed.kind()
            ))),
        }
    }

    // ── Values and instances ──────────────────────────────────────────────

    fn compare_primitive(
        &self,
        expected: &PrimitiveValue,
        observed: &PrimitiveValue,
    ) -> Result<(), CompareFailure> {
        compare_field(
            "type name",
            expected.full_type_name.as_deref(),
            observed.full_type_name.as_deref(),
        )?;
        if !scalar_eq(&expected.value, &observed.value) {
            return Err(CompareFailure::new(format!(
                "value differs: expected {:?}, observed {:?}",
                expected.value, observed.value
            )));
        }
        self.compare_annotations(&expected.annotations, &observed.annotations)
    }

    fn compare_complex(
        &self,
        expected: &ComplexInstance,
        observed: &ComplexInstance,
    ) -> Result<(), CompareFailure> {
        compare_field(
            "type name",
            expected.full_type_name.as_deref(),
            observed.full_type_name.as_deref(),
        )?;
        compare_null_flags(expected.is_null, observed.is_null)?;
        self.compare_instance_properties(&expected.properties, &observed.properties)?;
        self.compare_annotations(&expected.annotations, &observed.annotations)
    }

    fn compare_entity(
        &self,
        expected: &EntityInstance,
        observed: &EntityInstance,
    ) -> Result<(), CompareFailure> {
        compare_field(
            "type name",
            expected.full_type_name.as_deref(),
            observed.full_type_name.as_deref(),
        )?;
        compare_null_flags(expected.is_null, observed.is_null)?;
        self.compare_link_field("entity id", expected.id.as_deref(), observed.id.as_deref())?;
        compare_field("etag", expected.etag.as_deref(), observed.etag.as_deref())?;
        self.compare_link_field(
            "edit link",
            expected.edit_link.as_deref(),
            observed.edit_link.as_deref(),
        )?;
        // Stream metadata is only computed for media link entries, so the
        // convention relaxation must not demand it of ordinary entities.
        if expected.is_media_link_entry() || observed.is_media_link_entry() {
            self.compare_link_field(
                "media source link",
                expected.stream_source_link.as_deref(),
                observed.stream_source_link.as_deref(),
            )?;
            self.compare_link_field(
                "media edit link",
                expected.stream_edit_link.as_deref(),
                observed.stream_edit_link.as_deref(),
            )?;
            compare_field(
                "media etag",
                expected.stream_etag.as_deref(),
                observed.stream_etag.as_deref(),
            )?;
            compare_field(
                "media content type",
                expected.stream_content_type.as_deref(),
                observed.stream_content_type.as_deref(),
            )?;
        }
        compare_counts(
            "operations",
            expected.operations.len(),
            observed.operations.len(),
        )?;
        for (index, (e, o)) in expected
            .operations
            .iter()
            .zip(&observed.operations)
            .enumerate()
        {
            self.compare_operation(e, o)
                .map_err(|failure| failure.at(PathSegment::Index(index)))?;
        }
        self.compare_instance_properties(&expected.properties, &observed.properties)?;
        self.compare_annotations(&expected.annotations, &observed.annotations)
    }

    fn compare_operation(
        &self,
        expected: &ServiceOperationDescriptor,
        observed: &ServiceOperationDescriptor,
    ) -> Result<(), CompareFailure> {
        compare_field("operation role", expected.is_action, observed.is_action)?;
        compare_field(
            "operation metadata",
            expected.metadata.as_deref(),
            observed.metadata.as_deref(),
        )?;
        compare_field(
            "operation title",
            expected.title.as_deref(),
            observed.title.as_deref(),
        )?;
        compare_field(
            "operation target",
            expected.target.as_deref(),
            observed.target.as_deref(),
        )?;
        self.compare_annotations(&expected.annotations, &observed.annotations)
    }

    fn compare_navigation(
        &self,
        expected: &NavigationPropertyInstance,
        observed: &NavigationPropertyInstance,
    ) -> Result<(), CompareFailure> {
        compare_names(&expected.name, &observed.name)?;
        self.compare_link_field(
            "association link",
            expected.association_link.as_ref().map(|l| l.uri.as_str()),
            observed.association_link.as_ref().map(|l| l.uri.as_str()),
        )?;
        match (expected.value.as_deref(), observed.value.as_deref()) {
            (None, None) => {}
            (Some(e), Some(o)) => self.compare_element(e, o)?,
            (Some(_), None) => {
                return Err(CompareFailure::new("navigation value is missing"));
            }
            (None, Some(_)) => {
                return Err(CompareFailure::new("unexpected navigation value"));
            }
        }
        self.compare_annotations(&expected.annotations, &observed.annotations)
    }

    fn compare_named_stream(
        &self,
        expected: &NamedStreamInstance,
        observed: &NamedStreamInstance,
    ) -> Result<(), CompareFailure> {
        compare_names(&expected.name, &observed.name)?;
        self.compare_link_field(
            "stream source link",
            expected.source_link.as_deref(),
            observed.source_link.as_deref(),
        )?;
        self.compare_link_field(
            "stream edit link",
            expected.edit_link.as_deref(),
            observed.edit_link.as_deref(),
        )?;
        compare_field(
            "stream etag",
            expected.etag.as_deref(),
            observed.etag.as_deref(),
        )?;
        compare_field(
            "source content type",
            expected.source_content_type.as_deref(),
            observed.source_content_type.as_deref(),
        )?;
        compare_field(
            "edit content type",
            expected.edit_content_type.as_deref(),
            observed.edit_content_type.as_deref(),
        )?;
        self.compare_annotations(&expected.annotations, &observed.annotations)
    }

    // ── Collections ───────────────────────────────────────────────────────

    fn compare_entity_set(
        &self,
        expected: &EntitySetInstance,
        observed: &EntitySetInstance,
    ) -> Result<(), CompareFailure> {
        compare_field("inline count", expected.inline_count, observed.inline_count)?;
        compare_field(
            "next link",
            expected.next_link.as_deref(),
            observed.next_link.as_deref(),
        )?;
        compare_counts("entities", expected.entities.len(), observed.entities.len())?;
        for (index, (e, o)) in expected.entities.iter().zip(&observed.entities).enumerate() {
            self.compare_entity(e, o)
                .map_err(|failure| failure.at(PathSegment::Index(index)))?;
        }
        self.compare_annotations(&expected.annotations, &observed.annotations)
    }

    fn compare_link_collection(
        &self,
        expected: &LinkCollection,
        observed: &LinkCollection,
    ) -> Result<(), CompareFailure> {
        compare_field("inline count", expected.inline_count, observed.inline_count)?;
        compare_field(
            "next link",
            expected.next_link.as_deref(),
            observed.next_link.as_deref(),
        )?;
        compare_counts("links", expected.links.len(), observed.links.len())?;
        for (index, (e, o)) in expected.links.iter().zip(&observed.links).enumerate() {
            self.compare_deferred(e, o)
                .map_err(|failure| failure.at(PathSegment::Index(index)))?;
        }
        self.compare_annotations(&expected.annotations, &observed.annotations)
    }

    fn compare_primitive_collection(
        &self,
        expected: &PrimitiveCollection,
        observed: &PrimitiveCollection,
    ) -> Result<(), CompareFailure> {
        compare_counts("items", expected.items.len(), observed.items.len())?;
        for (index, (e, o)) in expected.items.iter().zip(&observed.items).enumerate() {
            self.compare_primitive(e, o)
                .map_err(|failure| failure.at(PathSegment::Index(index)))?;
        }
        self.compare_annotations(&expected.annotations, &observed.annotations)
    }

    fn compare_complex_collection(
        &self,
        expected: &ComplexInstanceCollection,
        observed: &ComplexInstanceCollection,
    ) -> Result<(), CompareFailure> {
        compare_counts("items", expected.items.len(), observed.items.len())?;
        for (index, (e, o)) in expected.items.iter().zip(&observed.items).enumerate() {
            self.compare_complex(e, o)
                .map_err(|failure| failure.at(PathSegment::Index(index)))?;
        }
        self.compare_annotations(&expected.annotations, &observed.annotations)
    }

    fn compare_primitive_multi_value(
        &self,
        expected: &PrimitiveMultiValue,
        observed: &PrimitiveMultiValue,
    ) -> Result<(), CompareFailure> {
        compare_field(
            "type name",
            expected.full_type_name.as_deref(),
            observed.full_type_name.as_deref(),
        )?;
        compare_null_flags(expected.is_null, observed.is_null)?;
        compare_counts("items", expected.items.len(), observed.items.len())?;
        for (index, (e, o)) in expected.items.iter().zip(&observed.items).enumerate() {
            self.compare_primitive(e, o)
                .map_err(|failure| failure.at(PathSegment::Index(index)))?;
        }
        self.compare_annotations(&expected.annotations, &observed.annotations)
    }

    fn compare_complex_multi_value(
        &self,
        expected: &ComplexMultiValue,
        observed: &ComplexMultiValue,
    ) -> Result<(), CompareFailure> {
        compare_field(
            "type name",
            expected.full_type_name.as_deref(),
            observed.full_type_name.as_deref(),
        )?;
        compare_null_flags(expected.is_null, observed.is_null)?;
        compare_counts("items", expected.items.len(), observed.items.len())?;
        for (index, (e, o)) in expected.items.iter().zip(&observed.items).enumerate() {
            self.compare_complex(e, o)
                .map_err(|failure| failure.at(PathSegment::Index(index)))?;
        }
        self.compare_annotations(&expected.annotations, &observed.annotations)
    }

    // ── Links ─────────────────────────────────────────────────────────────

    fn compare_deferred(
        &self,
        expected: &DeferredLink,
        observed: &DeferredLink,
    ) -> Result<(), CompareFailure> {
        compare_field("link uri", expected.uri.as_str(), observed.uri.as_str())?;
        self.compare_annotations(&expected.annotations, &observed.annotations)
    }

    fn compare_expanded(
        &self,
        expected: &ExpandedLink,
        observed: &ExpandedLink,
    ) -> Result<(), CompareFailure> {
        compare_field(
            "link uri",
            expected.uri.as_deref(),
            observed.uri.as_deref(),
        )?;
        match (
            expected.expanded_element.as_deref(),
            observed.expanded_element.as_deref(),
        ) {
            (None, None) => {}
            (Some(e), Some(o)) => self.compare_element(e, o)?,
            (Some(_), None) => return Err(CompareFailure::new("expanded element is missing")),
            (None, Some(_)) => return Err(CompareFailure::new("unexpected expanded element")),
        }
        self.compare_annotations(&expected.annotations, &observed.annotations)
    }

    // ── Batch ─────────────────────────────────────────────────────────────

    fn compare_batch_request(
        &self,
        expected: &BatchRequestPayload,
        observed: &BatchRequestPayload,
    ) -> Result<(), CompareFailure> {
        // Boundaries are framing, not structure.
        compare_counts("parts", expected.parts.len(), observed.parts.len())?;
        for (index, (e, o)) in expected.parts.iter().zip(&observed.parts).enumerate() {
            self.compare_request_part(e, o)
                .map_err(|failure| failure.at(PathSegment::Index(index)))?;
        }
        self.compare_annotations(&expected.annotations, &observed.annotations)
    }

    fn compare_batch_response(
        &self,
        expected: &BatchResponsePayload,
        observed: &BatchResponsePayload,
    ) -> Result<(), CompareFailure> {
        compare_counts("parts", expected.parts.len(), observed.parts.len())?;
        for (index, (e, o)) in expected.parts.iter().zip(&observed.parts).enumerate() {
            self.compare_response_part(e, o)
                .map_err(|failure| failure.at(PathSegment::Index(index)))?;
        }
        self.compare_annotations(&expected.annotations, &observed.annotations)
    }

    fn compare_request_part(
        &self,
        expected: &BatchRequestPart,
        observed: &BatchRequestPart,
    ) -> Result<(), CompareFailure> {
        match (expected, observed) {
            (BatchRequestPart::Operation(e), BatchRequestPart::Operation(o)) => {
                self.compare_request_operation(e, o)
            }
            (BatchRequestPart::Changeset(e), BatchRequestPart::Changeset(o)) => {
                self.compare_request_changeset(e, o)
            }
            (BatchRequestPart::Operation(_), BatchRequestPart::Changeset(_)) => Err(
                CompareFailure::new("expected an operation, observed a changeset"),
            ),
            (BatchRequestPart::Changeset(_), BatchRequestPart::Operation(_)) => Err(
                CompareFailure::new("expected a changeset, observed an operation"),
            ),
        }
    }

    fn compare_response_part(
        &self,
        expected: &BatchResponsePart,
        observed: &BatchResponsePart,
    ) -> Result<(), CompareFailure> {
        match (expected, observed) {
            (BatchResponsePart::Operation(e), BatchResponsePart::Operation(o)) => {
                self.compare_response_operation(e, o)
            }
            (BatchResponsePart::Changeset(e), BatchResponsePart::Changeset(o)) => {
                self.compare_response_changeset(e, o)
            }
            (BatchResponsePart::Operation(_), BatchResponsePart::Changeset(_)) => Err(
                CompareFailure::new("expected an operation, observed a changeset"),
            ),
            (BatchResponsePart::Changeset(_), BatchResponsePart::Operation(_)) => Err(
                CompareFailure::new("expected a changeset, observed an operation"),
            ),
        }
    }

    fn compare_request_changeset(
        &self,
        expected: &BatchRequestChangeset,
        observed: &BatchRequestChangeset,
    ) -> Result<(), CompareFailure> {
        compare_counts(
            "operations",
            expected.operations.len(),
            observed.operations.len(),
        )?;
        for (index, (e, o)) in expected
            .operations
            .iter()
            .zip(&observed.operations)
            .enumerate()
        {
            self.compare_request_operation(e, o)
                .map_err(|failure| failure.at(PathSegment::Index(index)))?;
        }
        self.compare_annotations(&expected.annotations, &observed.annotations)
    }

    fn compare_response_changeset(
        &self,
        expected: &BatchResponseChangeset,
        observed: &BatchResponseChangeset,
    ) -> Result<(), CompareFailure> {
        compare_counts(
            "operations",
            expected.operations.len(),
            observed.operations.len(),
        )?;
        for (index, (e, o)) in expected
            .operations
            .iter()
            .zip(&observed.operations)
            .enumerate()
        {
            self.compare_response_operation(e, o)
                .map_err(|failure| failure.at(PathSegment::Index(index)))?;
        }
        self.compare_annotations(&expected.annotations, &observed.annotations)
    }

    fn compare_request_operation(
        &self,
        expected: &HttpRequestOperation,
        observed: &HttpRequestOperation,
    ) -> Result<(), CompareFailure> {
        compare_field("verb", expected.verb, observed.verb)?;
        compare_field("request uri", expected.uri.as_str(), observed.uri.as_str())?;
        compare_headers(&expected.headers, &observed.headers)?;
        self.compare_element(&expected.body, &observed.body)
    }

    fn compare_response_operation(
        &self,
        expected: &HttpResponseOperation,
        observed: &HttpResponseOperation,
    ) -> Result<(), CompareFailure> {
        compare_field("status code", expected.status_code, observed.status_code)?;
        compare_headers(&expected.headers, &observed.headers)?;
        self.compare_element(&expected.body, &observed.body)
    }

    // ── Diagnostics and service listings ──────────────────────────────────

    fn compare_error(
        &self,
        expected: &ODataErrorPayload,
        observed: &ODataErrorPayload,
    ) -> Result<(), CompareFailure> {
        compare_field(
            "error code",
            expected.code.as_deref(),
            observed.code.as_deref(),
        )?;
        compare_field(
            "error message",
            expected.message.as_deref(),
            observed.message.as_deref(),
        )?;
        compare_field(
            "message language",
            expected.message_language.as_deref(),
            observed.message_language.as_deref(),
        )?;
        self.compare_inner_chain(
            expected.inner_error.as_deref(),
            observed.inner_error.as_deref(),
            1,
        )?;
        self.compare_annotations(&expected.annotations, &observed.annotations)
    }

    fn compare_inner_chain(
        &self,
        expected: Option<&ODataInternalExceptionPayload>,
        observed: Option<&ODataInternalExceptionPayload>,
        depth: usize,
    ) -> Result<(), CompareFailure> {
        match (expected, observed) {
            (None, None) => Ok(()),
            (Some(e), Some(o)) => {
                // Inner errors legitimately repeat structurally, so the
                // walk bounds them by depth, never by node identity.
                if depth > MAX_NESTING_DEPTH {
                    return Err(CompareFailure::new(format!(
                        "inner error chain exceeds depth {MAX_NESTING_DEPTH}"
                    )));
                }
                self.compare_inner_error(e, o, depth)
                    .map_err(|failure| failure.at(PathSegment::InnerError))
            }
            (Some(_), None) => {
                Err(CompareFailure::new("inner error is missing").at(PathSegment::InnerError))
            }
            (None, Some(_)) => {
                Err(CompareFailure::new("unexpected inner error").at(PathSegment::InnerError))
            }
        }
    }

    fn compare_inner_error(
        &self,
        expected: &ODataInternalExceptionPayload,
        observed: &ODataInternalExceptionPayload,
        depth: usize,
    ) -> Result<(), CompareFailure> {
        compare_field(
            "inner message",
            expected.message.as_deref(),
            observed.message.as_deref(),
        )?;
        compare_field(
            "exception type",
            expected.type_name.as_deref(),
            observed.type_name.as_deref(),
        )?;
        compare_field(
            "stack trace",
            expected.stack_trace.as_deref(),
            observed.stack_trace.as_deref(),
        )?;
        self.compare_inner_chain(
            expected.internal_exception.as_deref(),
            observed.internal_exception.as_deref(),
            depth + 1,
        )?;
        self.compare_annotations(&expected.annotations, &observed.annotations)
    }

    fn compare_service_document(
        &self,
        expected: &ServiceDocumentInstance,
        observed: &ServiceDocumentInstance,
    ) -> Result<(), CompareFailure> {
        compare_counts(
            "workspaces",
            expected.workspaces.len(),
            observed.workspaces.len(),
        )?;
        for (index, (e, o)) in expected
            .workspaces
            .iter()
            .zip(&observed.workspaces)
            .enumerate()
        {
            self.compare_workspace(e, o)
                .map_err(|failure| failure.at(PathSegment::Index(index)))?;
        }
        self.compare_annotations(&expected.annotations, &observed.annotations)
    }

    fn compare_workspace(
        &self,
        expected: &WorkspaceInstance,
        observed: &WorkspaceInstance,
    ) -> Result<(), CompareFailure> {
        compare_field(
            "workspace title",
            expected.title.as_deref(),
            observed.title.as_deref(),
        )?;
        compare_counts(
            "collections",
            expected.collections.len(),
            observed.collections.len(),
        )?;
        for (index, (e, o)) in expected
            .collections
            .iter()
            .zip(&observed.collections)
            .enumerate()
        {
            self.compare_resource_collection(e, o)
                .map_err(|failure| failure.at(PathSegment::Index(index)))?;
        }
        self.compare_annotations(&expected.annotations, &observed.annotations)
    }

    fn compare_resource_collection(
        &self,
        expected: &ResourceCollectionInstance,
        observed: &ResourceCollectionInstance,
    ) -> Result<(), CompareFailure> {
        compare_field(
            "collection title",
            expected.title.as_deref(),
            observed.title.as_deref(),
        )?;
        compare_field(
            "collection href",
            expected.href.as_str(),
            observed.href.as_str(),
        )?;
        self.compare_annotations(&expected.annotations, &observed.annotations)
    }

    // ── Shared machinery ──────────────────────────────────────────────────

    fn compare_instance_properties(
        &self,
        expected: &[PayloadElement],
        observed: &[PayloadElement],
    ) -> Result<(), CompareFailure> {
        let aligned: Vec<&PayloadElement> = if self.options.ignore_order {
            realign_by_name(expected, observed)
        } else {
            observed.iter().collect()
        };
        compare_counts("properties", expected.len(), aligned.len())?;
        for (index, (e, o)) in expected.iter().zip(aligned).enumerate() {
            self.compare_element(e, o)
                .map_err(|failure| failure.at(property_segment(e, index)))?;
        }
        Ok(())
    }

    /// Exact match, unless convention mode and the expected side is null, in
    /// which case any computed value passes but absence still fails.
    fn compare_link_field(
        &self,
        field: &str,
        expected: Option<&str>,
        observed: Option<&str>,
    ) -> Result<(), CompareFailure> {
        if expected.is_none() && self.options.expect_metadata_computed_by_convention {
            return match observed {
                Some(_) => Ok(()),
                None => Err(CompareFailure::new(format!(
                    "{field} is absent; convention mode requires a computed one"
                ))),
            };
        }
        compare_field(field, expected, observed)
    }

    fn compare_annotations(
        &self,
        expected: &[Annotation],
        observed: &[Annotation],
    ) -> Result<(), CompareFailure> {
        let mut unmatched: Vec<&Annotation> =
            observed.iter().filter(|a| !is_ignored(a)).collect();
        for annotation in expected.iter().filter(|a| !is_ignored(a)) {
            match unmatched.iter().position(|candidate| *candidate == annotation) {
                Some(position) => {
                    unmatched.remove(position);
                }
                None => {
                    return Err(CompareFailure::new(format!(
                        "missing annotation {annotation:?}"
                    )))
                }
            }
        }
        match unmatched.as_slice() {
            [] => Ok(()),
            [Annotation::SelfLink(_)] if self.options.expect_metadata_computed_by_convention => {
                Ok(())
            }
            extras => Err(CompareFailure::new(format!(
                "unexpected annotations: {extras:?}"
            ))),
        }
    }
}

fn is_ignored(annotation: &Annotation) -> bool {
    matches!(
        annotation.kind(),
        AnnotationKind::RawText | AnnotationKind::ResultsWrapper
    )
}

fn scalar_eq(expected: &ScalarValue, observed: &ScalarValue) -> bool {
    match (expected, observed) {
        (ScalarValue::Single(e), ScalarValue::Single(o)) => e == o || (e.is_nan() && o.is_nan()),
        (ScalarValue::Double(e), ScalarValue::Double(o)) => e == o || (e.is_nan() && o.is_nan()),
        _ => expected == observed,
    }
}

fn compare_names(expected: &str, observed: &str) -> Result<(), CompareFailure> {
    if expected == observed {
        return Ok(());
    }
    Err(CompareFailure::new(format!(
        "property name `{observed}` where `{expected}` was expected"
    )))
}

fn compare_field<T: PartialEq + std::fmt::Debug>(
    field: &str,
    expected: T,
    observed: T,
) -> Result<(), CompareFailure> {
    if expected == observed {
        return Ok(());
    }
    Err(CompareFailure::new(format!(
        "{field} differs: expected {expected:?}, observed {observed:?}"
    )))
}

fn compare_null_flags(expected: bool, observed: bool) -> Result<(), CompareFailure> {
    match (expected, observed) {
        (true, false) => Err(CompareFailure::new("expected a null value, observed a non-null one")),
        (false, true) => Err(CompareFailure::new("expected a non-null value, observed a null one")),
        _ => Ok(()),
    }
}

fn compare_counts(noun: &str, expected: usize, observed: usize) -> Result<(), CompareFailure> {
    if expected == observed {
        return Ok(());
    }
    Err(CompareFailure::new(format!(
        "expected {expected} {noun}, observed {observed}"
    )))
}

/// Expected headers must all be present with equal values; extra observed
/// headers are allowed. Names compare case-insensitively.
fn compare_headers(
    expected: &[(String, String)],
    observed: &[(String, String)],
) -> Result<(), CompareFailure> {
    for (name, value) in expected {
        let found = observed
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str());
        match found {
            Some(found) if found == value => {}
            Some(found) => {
                return Err(CompareFailure::new(format!(
                    "header `{name}` differs: expected `{value}`, observed `{found}`"
                )))
            }
            None => return Err(CompareFailure::new(format!("header `{name}` is missing"))),
        }
    }
    Ok(())
}

fn property_segment(property: &PayloadElement, index: usize) -> PathSegment {
    match property.property_name() {
        Some(name) => PathSegment::Property(name.to_string()),
        None => PathSegment::Index(index),
    }
}

/// Pairs observed properties with expected ones by name, first match wins;
/// whatever found no partner keeps its relative order at the end.
fn realign_by_name<'a>(
    expected: &[PayloadElement],
    observed: &'a [PayloadElement],
) -> Vec<&'a PayloadElement> {
    let mut remaining: Vec<&'a PayloadElement> = observed.iter().collect();
    let mut aligned = Vec::with_capacity(observed.len());
    for property in expected {
        let name = property.property_name();
        if let Some(position) = remaining
            .iter()
            .position(|candidate| candidate.property_name() == name)
        {
            aligned.push(remaining.remove(position));
        }
    }
    aligned.append(&mut remaining);
    aligned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CompareOptions;
    use odata_payload::{
        ComplexMultiValueProperty, ComplexProperty, HttpVerb, NullPropertyInstance,
        PrimitiveProperty, PrimitiveMultiValueProperty,
    };

    fn strict() -> PayloadComparer {
        PayloadComparer::default()
    }

    fn ignoring_order() -> PayloadComparer {
        PayloadComparer::new(CompareOptions {
            ignore_order: true,
            ..Default::default()
        })
    }

    fn convention() -> PayloadComparer {
        PayloadComparer::new(CompareOptions {
            expect_metadata_computed_by_convention: true,
            ..Default::default()
        })
    }

    fn string_prop(name: &str, value: &str) -> PayloadElement {
        PayloadElement::PrimitiveProperty(PrimitiveProperty::new(
            name,
            PrimitiveValue::new(ScalarValue::String(value.to_string())),
        ))
    }

    fn int_prop(name: &str, value: i32) -> PayloadElement {
        PayloadElement::PrimitiveProperty(PrimitiveProperty::new(
            name,
            PrimitiveValue::typed(ScalarValue::Int32(value), "Edm.Int32"),
        ))
    }

    fn inner_chain(depth: usize) -> ODataInternalExceptionPayload {
        let mut inner = ODataInternalExceptionPayload {
            message: Some("leaf".to_string()),
            ..Default::default()
        };
        for _ in 1..depth {
            inner = ODataInternalExceptionPayload {
                internal_exception: Some(Box::new(inner)),
                ..Default::default()
            };
        }
        inner
    }

    fn sample_entity() -> EntityInstance {
        let mut entity = EntityInstance::new(vec![
            int_prop("ID", 1),
            string_prop("Name", "Bread"),
            PayloadElement::NavigationPropertyInstance(NavigationPropertyInstance::new(
                "Category",
                PayloadElement::DeferredLink(DeferredLink::new("Products(1)/Category")),
            )),
            PayloadElement::NamedStreamInstance({
                let mut stream = NamedStreamInstance::new("Photo");
                stream.source_link = Some("Products(1)/Photo".to_string());
                stream
            }),
        ]);
        entity.id = Some("Products(1)".to_string());
        entity.etag = Some("W/\"1\"".to_string());
        entity.edit_link = Some("Products(1)".to_string());
        entity.full_type_name = Some("Model.Product".to_string());
        entity.annotations.push(Annotation::SelfLink("Products(1)".to_string()));
        entity
    }

    #[test]
    fn reflexive_for_a_full_entity() {
        let entity = PayloadElement::EntityInstance(sample_entity());
        assert_eq!(strict().compare(&entity, &entity), Ok(()));
        assert_eq!(ignoring_order().compare(&entity, &entity), Ok(()));
    }

    #[test]
    fn reflexive_for_an_inner_error_chain() {
        let error = PayloadElement::ODataErrorPayload(ODataErrorPayload {
            code: Some("500".to_string()),
            message: Some("boom".to_string()),
            inner_error: Some(Box::new(inner_chain(3))),
            ..Default::default()
        });
        assert_eq!(strict().compare(&error, &error), Ok(()));
    }

    #[test]
    fn nan_compares_equal_to_itself() {
        let value = PayloadElement::PrimitiveValue(PrimitiveValue::typed(
            ScalarValue::Double(f64::NAN),
            "Edm.Double",
        ));
        assert_eq!(strict().compare(&value, &value), Ok(()));
    }

    #[test]
    fn discriminant_mismatch_names_both_kinds() {
        let expected = PayloadElement::PrimitiveValue(PrimitiveValue::new(ScalarValue::Int32(1)));
        let observed = PayloadElement::ComplexInstance(ComplexInstance::new(Vec::new()));
        let failure = strict().compare(&expected, &observed).unwrap_err();
        assert_eq!(
            failure.to_string(),
            "expected a PrimitiveValue, observed a ComplexInstance"
        );
    }

    #[test]
    fn ignore_order_realigns_instance_properties() {
        let expected = PayloadElement::ComplexInstance(ComplexInstance::new(vec![
            int_prop("ID", 1),
            string_prop("Name", "Bread"),
        ]));
        let observed = PayloadElement::ComplexInstance(ComplexInstance::new(vec![
            string_prop("Name", "Bread"),
            int_prop("ID", 1),
        ]));
        assert!(strict().compare(&expected, &observed).is_err());
        assert_eq!(ignoring_order().compare(&expected, &observed), Ok(()));
    }

    #[test]
    fn extra_observed_property_is_a_count_mismatch() {
        let expected = PayloadElement::ComplexInstance(ComplexInstance::new(vec![int_prop(
            "ID", 1,
        )]));
        let observed = PayloadElement::ComplexInstance(ComplexInstance::new(vec![
            int_prop("ID", 1),
            string_prop("Name", "Bread"),
        ]));
        let failure = ignoring_order().compare(&expected, &observed).unwrap_err();
        assert_eq!(failure.message, "expected 1 properties, observed 2");
    }

    #[test]
    fn multi_value_items_stay_positional_under_ignore_order() {
        fn tags(values: &[&str]) -> PayloadElement {
            PayloadElement::PrimitiveMultiValueProperty(PrimitiveMultiValueProperty::new(
                "Tags",
                PrimitiveMultiValue {
                    full_type_name: Some("Collection(Edm.String)".to_string()),
                    is_null: false,
                    items: values
                        .iter()
                        .map(|v| PrimitiveValue::new(ScalarValue::String(v.to_string())))
                        .collect(),
                    annotations: Vec::new(),
                },
            ))
        }
        let expected = tags(&["a", "b"]);
        let observed = tags(&["b", "a"]);
        let failure = ignoring_order().compare(&expected, &observed).unwrap_err();
        assert_eq!(failure.path, vec![PathSegment::Index(0)]);
    }

    #[test]
    fn expected_complex_accepts_observed_entity() {
        let complex = PayloadElement::ComplexInstance(ComplexInstance::new(vec![int_prop(
            "ID", 1,
        )]));
        let entity = PayloadElement::EntityInstance({
            let mut entity = EntityInstance::new(vec![int_prop("ID", 1)]);
            entity.id = Some("Products(1)".to_string());
            entity
        });
        assert_eq!(strict().compare(&complex, &entity), Ok(()));
        assert!(strict().compare(&entity, &complex).is_err());
    }

    #[test]
    fn either_absence_encoding_matches_the_other() {
        let marker = PayloadElement::NullPropertyInstance(NullPropertyInstance::new(
            "Nick",
            Some("Edm.String".to_string()),
        ));
        let typed_null = PayloadElement::PrimitiveProperty(PrimitiveProperty::new(
            "Nick",
            PrimitiveValue::typed(ScalarValue::Null, "Edm.String"),
        ));
        assert_eq!(strict().compare(&marker, &typed_null), Ok(()));
        assert_eq!(strict().compare(&typed_null, &marker), Ok(()));

        let differently_typed = PayloadElement::NullPropertyInstance(NullPropertyInstance::new(
            "Nick",
            Some("Edm.Int32".to_string()),
        ));
        assert!(strict().compare(&differently_typed, &typed_null).is_err());
    }

    #[test]
    fn null_complex_tolerance_is_exactly_that_narrow() {
        let observed = PayloadElement::ComplexProperty(ComplexProperty::new(
            "Address",
            ComplexInstance::null(Some("Model.Address".to_string())),
        ));
        let untyped_null = PayloadElement::PrimitiveProperty(PrimitiveProperty::new(
            "Address",
            PrimitiveValue::new(ScalarValue::Null),
        ));
        assert_eq!(strict().compare(&untyped_null, &observed), Ok(()));

        let typed_null = PayloadElement::PrimitiveProperty(PrimitiveProperty::new(
            "Address",
            PrimitiveValue::typed(ScalarValue::Null, "Edm.String"),
        ));
        assert!(strict().compare(&typed_null, &observed).is_err());
    }

    #[test]
    fn null_marker_accepts_a_null_multi_value() {
        let marker = PayloadElement::NullPropertyInstance(NullPropertyInstance::new(
            "Tags",
            Some("Collection(Edm.String)".to_string()),
        ));
        let null_multi = PayloadElement::PrimitiveMultiValueProperty(
            PrimitiveMultiValueProperty::new(
                "Tags",
                PrimitiveMultiValue {
                    full_type_name: Some("Collection(Edm.String)".to_string()),
                    is_null: true,
                    items: Vec::new(),
                    annotations: Vec::new(),
                },
            ),
        );
        assert_eq!(strict().compare(&marker, &null_multi), Ok(()));
        assert_eq!(strict().compare(&null_multi, &marker), Ok(()));
    }

    #[test]
    fn convention_mode_accepts_computed_identity() {
        fn product(computed: bool) -> PayloadElement {
            let mut navigation = NavigationPropertyInstance::new(
                "Category",
                PayloadElement::DeferredLink(DeferredLink::new("Products(1)/Category")),
            );
            let mut entity = EntityInstance::new(Vec::new());
            if computed {
                entity.id = Some("Products(1)".to_string());
                entity.edit_link = Some("Products(1)".to_string());
                navigation.association_link =
                    Some(DeferredLink::new("Products(1)/$links/Category"));
            }
            entity.properties = vec![
                int_prop("ID", 1),
                PayloadElement::NavigationPropertyInstance(navigation),
            ];
            PayloadElement::EntityInstance(entity)
        }

        let expected = product(false);
        let observed = product(true);
        assert!(strict().compare(&expected, &observed).is_err());
        assert_eq!(convention().compare(&expected, &observed), Ok(()));

        // The server was supposed to compute these; their absence fails.
        let failure = convention().compare(&expected, &expected).unwrap_err();
        assert!(
            failure.message.contains("convention mode requires"),
            "unexpected message {}",
            failure.message
        );
    }

    #[test]
    fn convention_mode_allows_one_extra_self_link() {
        fn identified(self_links: &[&str]) -> PayloadElement {
            let mut entity = EntityInstance::new(vec![int_prop("ID", 1)]);
            entity.id = Some("Products(1)".to_string());
            entity.edit_link = Some("Products(1)".to_string());
            for link in self_links {
                entity.annotations.push(Annotation::SelfLink(link.to_string()));
            }
            PayloadElement::EntityInstance(entity)
        }
        let expected = identified(&[]);
        let observed = identified(&["Products(1)"]);
        assert!(strict().compare(&expected, &observed).is_err());
        assert_eq!(convention().compare(&expected, &observed), Ok(()));

        let doubled = identified(&["Products(1)", "Products(1)/"]);
        assert!(convention().compare(&expected, &doubled).is_err());
    }

    #[test]
    fn ignored_annotation_kinds_do_not_participate() {
        let expected = PayloadElement::PrimitiveValue(PrimitiveValue {
            value: ScalarValue::Int32(1),
            full_type_name: None,
            annotations: vec![Annotation::RawText("1".to_string())],
        });
        let observed = PayloadElement::PrimitiveValue(PrimitiveValue {
            value: ScalarValue::Int32(1),
            full_type_name: None,
            annotations: vec![Annotation::ResultsWrapper(false)],
        });
        assert_eq!(strict().compare(&expected, &observed), Ok(()));
    }

    #[test]
    fn path_localizes_a_nested_failure() {
        fn feed(city: &str) -> PayloadElement {
            let address = ComplexInstance::new(vec![string_prop("City", city)]);
            let entity = EntityInstance::new(vec![PayloadElement::ComplexProperty(
                ComplexProperty::new("Address", address),
            )]);
            PayloadElement::EntitySetInstance(EntitySetInstance::new(vec![
                EntityInstance::new(Vec::new()),
                entity,
            ]))
        }
        let failure = strict().compare(&feed("Springfield"), &feed("Shelbyville")).unwrap_err();
        assert_eq!(
            failure.path,
            vec![
                PathSegment::Index(1),
                PathSegment::Property("Address".to_string()),
                PathSegment::Property("City".to_string()),
            ]
        );
        let rendered = failure.to_string();
        assert!(
            rendered.starts_with("[1].Address.City: value differs"),
            "unexpected rendering {rendered}"
        );
    }

    #[test]
    fn batch_headers_compare_as_a_subset() {
        fn operation(headers: &[(&str, &str)]) -> HttpRequestOperation {
            let mut op = HttpRequestOperation::new(
                HttpVerb::Post,
                "Products",
                PayloadElement::EntityInstance(EntityInstance::new(vec![int_prop("ID", 1)])),
            );
            op.headers = headers
                .iter()
                .map(|(n, v)| (n.to_string(), v.to_string()))
                .collect();
            op
        }
        let expected = PayloadElement::BatchRequestPayload(BatchRequestPayload {
            boundary: "batch_a".to_string(),
            parts: vec![BatchRequestPart::Operation(operation(&[(
                "Content-Type",
                "application/json",
            )]))],
            annotations: Vec::new(),
        });
        let observed = PayloadElement::BatchRequestPayload(BatchRequestPayload {
            boundary: "batch_b".to_string(),
            parts: vec![BatchRequestPart::Operation(operation(&[
                ("content-type", "application/json"),
                ("DataServiceVersion", "2.0"),
            ]))],
            annotations: Vec::new(),
        });
        assert_eq!(strict().compare(&expected, &observed), Ok(()));

        let missing = PayloadElement::BatchRequestPayload(BatchRequestPayload {
            boundary: "batch_c".to_string(),
            parts: vec![BatchRequestPart::Operation(operation(&[]))],
            annotations: Vec::new(),
        });
        let failure = strict().compare(&expected, &missing).unwrap_err();
        assert_eq!(failure.to_string(), "[0]: header `Content-Type` is missing");
    }

    #[test]
    fn batch_part_kinds_must_line_up() {
        let operation = BatchRequestPart::Operation(HttpRequestOperation::new(
            HttpVerb::Get,
            "Products",
            PayloadElement::empty_primitive(),
        ));
        let changeset = BatchRequestPart::Changeset(BatchRequestChangeset::default());
        let expected = PayloadElement::BatchRequestPayload(BatchRequestPayload {
            boundary: String::new(),
            parts: vec![operation],
            annotations: Vec::new(),
        });
        let observed = PayloadElement::BatchRequestPayload(BatchRequestPayload {
            boundary: String::new(),
            parts: vec![changeset],
            annotations: Vec::new(),
        });
        let failure = strict().compare(&expected, &observed).unwrap_err();
        assert_eq!(
            failure.to_string(),
            "[0]: expected an operation, observed a changeset"
        );
    }

    #[test]
    fn inner_error_chains_are_depth_guarded() {
        let runaway = PayloadElement::ODataInternalExceptionPayload(inner_chain(101));
        let failure = strict().compare(&runaway, &runaway).unwrap_err();
        assert!(
            failure.message.contains("exceeds depth 100"),
            "unexpected message {}",
            failure.message
        );
    }

    #[test]
    fn link_collections_compare_positionally() {
        fn links(uris: &[&str]) -> PayloadElement {
            PayloadElement::LinkCollection(LinkCollection {
                links: uris.iter().map(|uri| DeferredLink::new(*uri)).collect(),
                inline_count: Some(uris.len() as i64),
                next_link: None,
                annotations: Vec::new(),
            })
        }
        let failure = strict()
            .compare(&links(&["Orders(1)", "Orders(2)"]), &links(&["Orders(2)", "Orders(1)"]))
            .unwrap_err();
        assert_eq!(failure.path, vec![PathSegment::Index(0)]);
        assert!(failure.message.starts_with("link uri differs"));
    }

    #[test]
    fn named_stream_links_follow_convention_mode() {
        let expected = PayloadElement::NamedStreamInstance(NamedStreamInstance::new("Photo"));
        let observed = PayloadElement::NamedStreamInstance({
            let mut stream = NamedStreamInstance::new("Photo");
            stream.source_link = Some("Products(1)/Photo".to_string());
            stream.edit_link = Some("Products(1)/Photo/edit".to_string());
            stream
        });
        assert!(strict().compare(&expected, &observed).is_err());
        assert_eq!(convention().compare(&expected, &observed), Ok(()));
        assert!(convention().compare(&expected, &expected).is_err());
    }

    #[test]
    fn complex_multi_value_mismatch_is_localized() {
        fn addresses(city: &str) -> PayloadElement {
            PayloadElement::ComplexMultiValueProperty(ComplexMultiValueProperty::new(
                "Addresses",
                ComplexMultiValue {
                    full_type_name: Some("Collection(Model.Address)".to_string()),
                    is_null: false,
                    items: vec![
                        ComplexInstance::new(vec![string_prop("City", "Springfield")]),
                        ComplexInstance::new(vec![string_prop("City", city)]),
                    ],
                    annotations: Vec::new(),
                },
            ))
        }
        let failure = strict()
            .compare(&addresses("Ogdenville"), &addresses("North Haverbrook"))
            .unwrap_err();
        assert_eq!(
            failure.path,
            vec![PathSegment::Index(1), PathSegment::Property("City".to_string())]
        );
    }
}
