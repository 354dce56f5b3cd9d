//! Namespaces, rel prefixes and reserved names of the Atom wire dialect.

pub(crate) const ATOM_NS: &str = "http://www.w3.org/2005/Atom";
pub(crate) const APP_NS: &str = "http://www.w3.org/2007/app";
pub(crate) const DATA_NS: &str = "http://schemas.microsoft.com/ado/2007/08/dataservices";
pub(crate) const METADATA_NS: &str =
    "http://schemas.microsoft.com/ado/2007/08/dataservices/metadata";
pub(crate) const SCHEME_NS: &str = "http://schemas.microsoft.com/ado/2007/08/dataservices/scheme";
pub(crate) const EDMX_NS: &str = "http://schemas.microsoft.com/ado/2007/06/edmx";
pub(crate) const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// `rel` prefixes that classify an `atom:link` inside an entry.
pub(crate) const RELATED_REL: &str =
    "http://schemas.microsoft.com/ado/2007/08/dataservices/related/";
pub(crate) const RELATED_LINKS_REL: &str =
    "http://schemas.microsoft.com/ado/2007/08/dataservices/relatedlinks/";
pub(crate) const MEDIA_RESOURCE_REL: &str =
    "http://schemas.microsoft.com/ado/2007/08/dataservices/mediaresource/";
pub(crate) const MEDIA_RESOURCE_EDIT_REL: &str =
    "http://schemas.microsoft.com/ado/2007/08/dataservices/mediaresourceedit/";

pub(crate) const REL_EDIT: &str = "edit";
pub(crate) const REL_SELF: &str = "self";
pub(crate) const REL_EDIT_MEDIA: &str = "edit-media";
pub(crate) const REL_NEXT: &str = "next";

/// Type names carried by `m:type` that mark a multi-value; the element type
/// sits inside the parentheses.
pub(crate) fn multi_value_element(type_name: &str) -> Option<&str> {
    let inner = type_name
        .strip_prefix("Collection(")
        .or_else(|| type_name.strip_prefix("MultiValue("))?;
    inner.strip_suffix(')')
}
