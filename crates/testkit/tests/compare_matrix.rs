//! Differ properties checked over seeded random trees.
//!
//! Every generated tree must compare equal to itself, and a property
//! reorder must be visible under strict options while vanishing under
//! `ignore_order`. Seeds are fixed, so a failure names the tree exactly.

use odata_diff::{CompareOptions, PayloadComparer};
use odata_payload::{ODataErrorPayload, ODataInternalExceptionPayload, PayloadElement};
use odata_testkit::PayloadGenerator;

fn strict() -> PayloadComparer {
    PayloadComparer::default()
}

fn ignoring_order() -> PayloadComparer {
    PayloadComparer::new(CompareOptions {
        ignore_order: true,
        ..Default::default()
    })
}

#[test]
fn generated_trees_compare_reflexively() {
    for seed in 0..64 {
        let mut generator = PayloadGenerator::from_seed(seed);
        let tree = generator.element();
        assert_eq!(strict().compare(&tree, &tree), Ok(()), "seed {seed}");
        assert_eq!(ignoring_order().compare(&tree, &tree), Ok(()), "seed {seed}");
    }
}

#[test]
fn generated_error_payloads_are_reflexive() {
    for seed in 0..32 {
        let mut generator = PayloadGenerator::from_seed(seed);
        let error = PayloadElement::ODataErrorPayload(generator.error_payload());
        assert_eq!(strict().compare(&error, &error), Ok(()), "seed {seed}");
    }
}

#[test]
fn inner_error_chain_of_depth_three_is_reflexive() {
    let mut inner = ODataInternalExceptionPayload {
        message: Some("root cause".to_string()),
        type_name: Some("System.NullReferenceException".to_string()),
        ..Default::default()
    };
    for _ in 0..2 {
        inner = ODataInternalExceptionPayload {
            message: Some("rethrown".to_string()),
            internal_exception: Some(Box::new(inner)),
            ..Default::default()
        };
    }
    let error = PayloadElement::ODataErrorPayload(ODataErrorPayload {
        code: Some("500".to_string()),
        message: Some("request failed".to_string()),
        inner_error: Some(Box::new(inner)),
        ..Default::default()
    });
    assert_eq!(strict().compare(&error, &error), Ok(()));
}

#[test]
fn property_reorder_divides_strict_from_ignore_order() {
    let mut exercised = 0;
    for seed in 0..32 {
        let mut generator = PayloadGenerator::from_seed(seed);
        let instance = generator.complex_instance(2);
        // Reversal only changes anything with two or more properties.
        if instance.properties.len() < 2 {
            continue;
        }
        let mut reordered = instance.clone();
        reordered.properties.reverse();

        let expected = PayloadElement::ComplexInstance(instance);
        let observed = PayloadElement::ComplexInstance(reordered);
        assert!(strict().compare(&expected, &observed).is_err(), "seed {seed}");
        assert_eq!(
            ignoring_order().compare(&expected, &observed),
            Ok(()),
            "seed {seed}"
        );
        exercised += 1;
    }
    assert!(exercised > 0, "no seed produced a multi-property instance");
}
