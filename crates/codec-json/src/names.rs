//! Reserved property names of the verbose JSON dialect.

pub(crate) const D_WRAPPER: &str = "d";
pub(crate) const METADATA: &str = "__metadata";
pub(crate) const DEFERRED: &str = "__deferred";
pub(crate) const MEDIA_RESOURCE: &str = "__mediaresource";
pub(crate) const RESULTS: &str = "results";
pub(crate) const COUNT: &str = "__count";
pub(crate) const NEXT: &str = "__next";
pub(crate) const URI: &str = "uri";
pub(crate) const ERROR: &str = "error";
pub(crate) const ENTITY_SETS: &str = "EntitySets";

// `__metadata` sub-keys.
pub(crate) const TYPE: &str = "type";
pub(crate) const ETAG: &str = "etag";
pub(crate) const MEDIA_SRC: &str = "media_src";
pub(crate) const EDIT_MEDIA: &str = "edit_media";
pub(crate) const MEDIA_ETAG: &str = "media_etag";
pub(crate) const CONTENT_TYPE: &str = "content_type";
pub(crate) const PROPERTIES: &str = "properties";
pub(crate) const ACTIONS: &str = "actions";
pub(crate) const FUNCTIONS: &str = "functions";
pub(crate) const ASSOCIATION_URI: &str = "associationuri";
pub(crate) const TITLE: &str = "title";
pub(crate) const TARGET: &str = "target";

// `error` sub-keys.
pub(crate) const CODE: &str = "code";
pub(crate) const MESSAGE: &str = "message";
pub(crate) const LANG: &str = "lang";
pub(crate) const VALUE: &str = "value";
pub(crate) const INNER_ERROR: &str = "innererror";
pub(crate) const STACK_TRACE: &str = "stacktrace";
pub(crate) const INTERNAL_EXCEPTION: &str = "internalexception";

/// Collection type names: `Collection(Edm.String)` and the legacy
/// `MultiValue(...)` spelling.
pub(crate) fn multi_value_element(type_name: &str) -> Option<&str> {
    for prefix in ["Collection(", "MultiValue("] {
        if let Some(rest) = type_name.strip_prefix(prefix) {
            return rest.strip_suffix(')');
        }
    }
    None
}
