//! Seedable random payload trees.
//!
//! Feeds the comparison matrices: same seed, same trees, on every platform.
//! Shapes cover the spread the differ walks (primitives, complex and entity
//! instances, feeds, link collections, error chains) with bounded depth and
//! bounded fan-out, so a matrix over a few dozen seeds stays quick.

use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use odata_payload::{
    ComplexInstance, ComplexProperty, DeferredLink, EntityInstance, EntitySetInstance,
    LinkCollection, NamedStreamInstance, NavigationPropertyInstance, NullPropertyInstance,
    ODataErrorPayload, ODataInternalExceptionPayload, PayloadElement, PrimitiveProperty,
    PrimitiveValue, ScalarValue,
};

const PROPERTY_NAMES: &[&str] = &[
    "ID", "Name", "Rating", "Price", "Description", "Modified", "Active", "Zip", "Phone", "Notes",
];
const TYPE_NAMES: &[&str] = &["Model.Product", "Model.Category", "Model.Supplier"];
const COMPLEX_TYPE_NAMES: &[&str] = &["Model.Address", "Model.Dimensions"];

#[derive(Debug)]
pub struct PayloadGenerator {
    rng: StdRng,
}

impl PayloadGenerator {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// One tree of a random top-level shape.
    pub fn element(&mut self) -> PayloadElement {
        match self.rng.gen_range(0..6) {
            0 => PayloadElement::PrimitiveValue(self.primitive_value()),
            1 => PayloadElement::ComplexInstance(self.complex_instance(1)),
            2 => PayloadElement::EntityInstance(self.entity_instance()),
            3 => PayloadElement::EntitySetInstance(self.entity_set()),
            4 => PayloadElement::LinkCollection(self.link_collection()),
            _ => PayloadElement::ODataErrorPayload(self.error_payload()),
        }
    }

    pub fn scalar(&mut self) -> ScalarValue {
        match self.rng.gen_range(0..8) {
            0 => ScalarValue::Null,
            1 => ScalarValue::Boolean(self.rng.gen()),
            2 => ScalarValue::Int32(self.rng.gen_range(-100_000..100_000)),
            3 => ScalarValue::Int64(i64::from(self.rng.gen_range(-100_000..100_000)) * 977),
            // Eighths round-trip exactly through every float formatter.
            4 => ScalarValue::Double(f64::from(self.rng.gen_range(-80_000i32..80_000)) / 8.0),
            5 => ScalarValue::Decimal(format!(
                "{}.{:02}",
                self.rng.gen_range(-999..999),
                self.rng.gen_range(0..100)
            )),
            6 => ScalarValue::String(self.text(0, 12)),
            _ => ScalarValue::Binary((0..self.rng.gen_range(0..6)).map(|_| self.rng.gen()).collect()),
        }
    }

    pub fn primitive_value(&mut self) -> PrimitiveValue {
        let value = self.scalar();
        if self.rng.gen_bool(0.5) {
            if let Some(kind) = edm_name(&value) {
                return PrimitiveValue::typed(value, kind);
            }
        }
        PrimitiveValue::new(value)
    }

    pub fn complex_instance(&mut self, depth: u32) -> ComplexInstance {
        let mut complex = ComplexInstance::new(self.properties(depth));
        if self.rng.gen_bool(0.5) {
            complex.full_type_name = Some(self.pick(COMPLEX_TYPE_NAMES).to_string());
        }
        complex
    }

    pub fn entity_instance(&mut self) -> EntityInstance {
        let mut entity = EntityInstance::new(self.properties(1));
        entity.full_type_name = Some(self.pick(TYPE_NAMES).to_string());
        entity.id = Some(format!("Products({})", self.rng.gen_range(0..1000)));
        if self.rng.gen_bool(0.4) {
            entity.etag = Some(format!("W/\"{}\"", self.rng.gen_range(0..100)));
        }
        if self.rng.gen_bool(0.6) {
            entity.edit_link = entity.id.clone();
        }
        if self.rng.gen_bool(0.3) {
            entity.properties.push(self.navigation());
        }
        if self.rng.gen_bool(0.2) {
            let mut stream = NamedStreamInstance::new("Thumbnail");
            stream.source_link = Some("Products(7)/Thumbnail".to_string());
            if self.rng.gen_bool(0.5) {
                stream.edit_link = Some("Products(7)/Thumbnail/edit".to_string());
            }
            entity.properties.push(PayloadElement::NamedStreamInstance(stream));
        }
        entity
    }

    pub fn entity_set(&mut self) -> EntitySetInstance {
        let count = self.rng.gen_range(0..4);
        let mut set = EntitySetInstance::new((0..count).map(|_| self.entity_instance()).collect());
        if self.rng.gen_bool(0.5) {
            set.inline_count = Some(self.rng.gen_range(0..500));
        }
        if self.rng.gen_bool(0.3) {
            set.next_link = Some(format!("Products?$skiptoken={}", self.rng.gen_range(0..50)));
        }
        set
    }

    pub fn link_collection(&mut self) -> LinkCollection {
        let count = self.rng.gen_range(0..4);
        LinkCollection {
            links: (0..count)
                .map(|_| DeferredLink::new(format!("Orders({})", self.rng.gen_range(0..100))))
                .collect(),
            inline_count: self.rng.gen_bool(0.5).then(|| i64::from(count)),
            next_link: None,
            annotations: Vec::new(),
        }
    }

    /// Error payload whose inner chain never exceeds depth 3.
    pub fn error_payload(&mut self) -> ODataErrorPayload {
        let depth = self.rng.gen_range(0..=3);
        ODataErrorPayload {
            code: Some(self.rng.gen_range(400..600i32).to_string()),
            message: Some(self.text(1, 16)),
            message_language: self.rng.gen_bool(0.5).then(|| "en-US".to_string()),
            inner_error: self.inner_chain(depth),
            annotations: Vec::new(),
        }
    }

    fn inner_chain(&mut self, depth: u32) -> Option<Box<ODataInternalExceptionPayload>> {
        if depth == 0 {
            return None;
        }
        Some(Box::new(ODataInternalExceptionPayload {
            message: Some(self.text(1, 12)),
            type_name: self
                .rng
                .gen_bool(0.5)
                .then(|| "System.InvalidOperationException".to_string()),
            stack_trace: self.rng.gen_bool(0.3).then(|| self.text(4, 24)),
            internal_exception: self.inner_chain(depth - 1),
            annotations: Vec::new(),
        }))
    }

    /// Between one and four properties with distinct names.
    fn properties(&mut self, depth: u32) -> Vec<PayloadElement> {
        let count = self.rng.gen_range(1..=4);
        let start = self.rng.gen_range(0..PROPERTY_NAMES.len());
        (0..count)
            .map(|offset| {
                let name = PROPERTY_NAMES[(start + offset) % PROPERTY_NAMES.len()];
                self.property(name, depth)
            })
            .collect()
    }

    fn property(&mut self, name: &str, depth: u32) -> PayloadElement {
        let roll = self.rng.gen_range(0..10);
        if depth > 0 && roll < 2 {
            return PayloadElement::ComplexProperty(ComplexProperty::new(
                name,
                self.complex_instance(depth - 1),
            ));
        }
        if roll < 3 {
            let type_name = self
                .rng
                .gen_bool(0.5)
                .then(|| "Edm.String".to_string());
            return PayloadElement::NullPropertyInstance(NullPropertyInstance::new(name, type_name));
        }
        PayloadElement::PrimitiveProperty(PrimitiveProperty::new(name, self.primitive_value()))
    }

    fn navigation(&mut self) -> PayloadElement {
        let uri = format!("Products({})/Category", self.rng.gen_range(0..100));
        let mut navigation =
            NavigationPropertyInstance::new("Category", PayloadElement::DeferredLink(DeferredLink::new(uri)));
        if self.rng.gen_bool(0.4) {
            navigation.association_link = Some(DeferredLink::new("Products(7)/$links/Category"));
        }
        PayloadElement::NavigationPropertyInstance(navigation)
    }

    fn pick<'a>(&mut self, pool: &'a [&'a str]) -> &'a str {
        pool[self.rng.gen_range(0..pool.len())]
    }

    fn text(&mut self, min: usize, max: usize) -> String {
        let len = self.rng.gen_range(min..=max);
        (0..len)
            .map(|_| char::from(self.rng.sample(Alphanumeric)))
            .collect()
    }
}

fn edm_name(value: &ScalarValue) -> Option<&'static str> {
    match value {
        ScalarValue::Boolean(_) => Some("Edm.Boolean"),
        ScalarValue::Int32(_) => Some("Edm.Int32"),
        ScalarValue::Int64(_) => Some("Edm.Int64"),
        ScalarValue::Double(_) => Some("Edm.Double"),
        ScalarValue::Decimal(_) => Some("Edm.Decimal"),
        ScalarValue::String(_) => Some("Edm.String"),
        ScalarValue::Binary(_) => Some("Edm.Binary"),
        _ => None,
    }
}
