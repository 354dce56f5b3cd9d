//! JSON shape classification and cross-format stability at the registry
//! level.
//!
//! Classification is a fixed priority order over object keys, so the same
//! bytes always land on the same tree; re-parsing an encoded tree must
//! yield a tree the differ accepts against the first parse.

use odata_codec_atom::AtomCodecOptions;
use odata_codec_json::JsonCodecOptions;
use odata_diff::PayloadComparer;
use odata_payload::{PayloadElement, ScalarValue};
use odata_testkit::PayloadCodecs;

fn unwrapped() -> PayloadCodecs {
    PayloadCodecs::new(
        JsonCodecOptions {
            wrap_in_d: false,
            ..Default::default()
        },
        AtomCodecOptions::default(),
    )
}

/// Decodes, re-encodes and re-decodes; the two trees must differ-compare
/// clean. Returns the first tree for shape assertions.
fn stable_in(codecs: &PayloadCodecs, content_type: &str, input: &str) -> PayloadElement {
    let tree = codecs.decode(content_type, input.as_bytes()).unwrap();
    let bytes = codecs.encode(content_type, &tree).unwrap();
    let back = codecs.decode(content_type, &bytes).unwrap();
    assert_eq!(PayloadComparer::default().compare(&tree, &back), Ok(()));
    tree
}

#[test]
fn single_uri_object_is_always_a_deferred_link() {
    let codecs = PayloadCodecs::default();
    let tree = codecs
        .decode("application/json", br#"{"uri":"Products(1)/Category"}"#)
        .unwrap();
    match tree {
        PayloadElement::DeferredLink(link) => assert_eq!(link.uri, "Products(1)/Category"),
        other => panic!("unexpected element {other:?}"),
    }
}

#[test]
fn uri_classification_wins_beside_spatial_looking_structure() {
    let input = br#"{"__metadata":{"uri":"Shops(1)"},
        "Location":{"type":"Point","coordinates":[102.0,0.5]},
        "Category":{"uri":"Categories(7)"}}"#;
    let codecs = PayloadCodecs::default();
    let entity = match codecs.decode("application/json", input).unwrap() {
        PayloadElement::EntityInstance(entity) => entity,
        other => panic!("unexpected element {other:?}"),
    };
    // Default spatial handling claims nothing, so the point-shaped object
    // stays structural while the single-uri object stays a link.
    assert!(matches!(
        &entity.properties[0],
        PayloadElement::ComplexProperty(_)
    ));
    match &entity.properties[1] {
        PayloadElement::NavigationPropertyInstance(nav) => {
            assert_eq!(nav.name, "Category");
            assert!(matches!(
                nav.value.as_deref(),
                Some(PayloadElement::DeferredLink(_))
            ));
        }
        other => panic!("unexpected property {other:?}"),
    }
}

#[test]
fn results_with_count_classifies_as_an_entity_set() {
    let input = br#"{"d":{"results":[
        {"__metadata":{"uri":"Products(1)"},"ID":1},
        {"__metadata":{"uri":"Products(2)"},"ID":2},
        {"__metadata":{"uri":"Products(3)"},"ID":3}],
        "__count":"3"}}"#;
    let codecs = PayloadCodecs::default();
    match codecs.decode("application/json", input).unwrap() {
        PayloadElement::EntitySetInstance(set) => {
            assert_eq!(set.entities.len(), 3);
            assert_eq!(set.inline_count, Some(3));
        }
        other => panic!("unexpected element {other:?}"),
    }
}

#[test]
fn metadata_entity_re_encodes_to_the_same_json() {
    let input = br#"{"__metadata":{"uri":"Products(1)","type":"T"},"ID":1}"#;
    let codecs = unwrapped();
    let tree = codecs.decode("application/json", input).unwrap();
    match &tree {
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

    // Byte-identical modulo property order: object equality on reparsed
    // values ignores key order.
    let encoded = codecs.encode("application/json", &tree).unwrap();
    let reparsed: serde_json::Value = serde_json::from_slice(&encoded).unwrap();
    let original: serde_json::Value = serde_json::from_slice(input).unwrap();
    assert_eq!(reparsed, original);
}

#[test]
fn service_document_is_stable_in_both_formats() {
    let codecs = PayloadCodecs::default();

    let json = r#"{"EntitySets":["Products","Categories"]}"#;
    let tree = stable_in(&codecs, "application/json", json);
    assert!(matches!(tree, PayloadElement::ServiceDocumentInstance(_)));

    let xml = r#"<service xmlns="http://www.w3.org/2007/app" xmlns:atom="http://www.w3.org/2005/Atom"><workspace><atom:title>Default</atom:title><collection href="Products"><atom:title>Products</atom:title></collection><collection href="Categories"><atom:title>Categories</atom:title></collection></workspace></service>"#;
    let tree = stable_in(&codecs, "application/xml", xml);
    assert!(matches!(tree, PayloadElement::ServiceDocumentInstance(_)));
}

#[test]
fn error_chain_is_stable_in_both_formats() {
    let codecs = PayloadCodecs::default();

    let json = r#"{"error":{"code":"500","message":{"lang":"en-US","value":"boom"},
        "innererror":{"message":"inner","type":"System.Exception",
        "internalexception":{"message":"innermost"}}}}"#;
    let tree = stable_in(&codecs, "application/json", json);
    assert!(matches!(tree, PayloadElement::ODataErrorPayload(_)));

    let xml = r#"<m:error xmlns:m="http://schemas.microsoft.com/ado/2007/08/dataservices/metadata"><m:code>500</m:code><m:message xml:lang="en-US">boom</m:message><m:innererror><m:message>inner</m:message><m:type>System.Exception</m:type><m:internalexception><m:message>innermost</m:message></m:internalexception></m:innererror></m:error>"#;
    let tree = stable_in(&codecs, "application/xml", xml);
    assert!(matches!(tree, PayloadElement::ODataErrorPayload(_)));
}
