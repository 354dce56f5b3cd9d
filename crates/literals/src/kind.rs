//! Edm primitive type names.

use crate::error::LiteralError;

/// The primitive types of the entity data model, parsed from `Edm.*` full
/// names. Spatial subtypes (`Edm.GeographyPoint`, …) collapse onto their
/// family; the core treats spatial payloads as opaque.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdmPrimitiveKind {
    Binary,
    Boolean,
    Byte,
    DateTime,
    DateTimeOffset,
    Decimal,
    Double,
    Guid,
    Int16,
    Int32,
    Int64,
    SByte,
    Single,
    String,
    Time,
    Geography,
    Geometry,
}

impl EdmPrimitiveKind {
    /// Full `Edm.`-prefixed name as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            EdmPrimitiveKind::Binary => "Edm.Binary",
            EdmPrimitiveKind::Boolean => "Edm.Boolean",
            EdmPrimitiveKind::Byte => "Edm.Byte",
            EdmPrimitiveKind::DateTime => "Edm.DateTime",
            EdmPrimitiveKind::DateTimeOffset => "Edm.DateTimeOffset",
            EdmPrimitiveKind::Decimal => "Edm.Decimal",
            EdmPrimitiveKind::Double => "Edm.Double",
            EdmPrimitiveKind::Guid => "Edm.Guid",
            EdmPrimitiveKind::Int16 => "Edm.Int16",
            EdmPrimitiveKind::Int32 => "Edm.Int32",
            EdmPrimitiveKind::Int64 => "Edm.Int64",
            EdmPrimitiveKind::SByte => "Edm.SByte",
            EdmPrimitiveKind::Single => "Edm.Single",
            EdmPrimitiveKind::String => "Edm.String",
            EdmPrimitiveKind::Time => "Edm.Time",
            EdmPrimitiveKind::Geography => "Edm.Geography",
            EdmPrimitiveKind::Geometry => "Edm.Geometry",
        }
    }

    /// Parses a full type name, with or without the `Edm.` prefix.
    pub fn parse(name: &str) -> Result<Self, LiteralError> {
        let bare = name.strip_prefix("Edm.").unwrap_or(name);
        let kind = match bare {
            "Binary" => EdmPrimitiveKind::Binary,
            "Boolean" => EdmPrimitiveKind::Boolean,
            "Byte" => EdmPrimitiveKind::Byte,
            "DateTime" => EdmPrimitiveKind::DateTime,
            "DateTimeOffset" => EdmPrimitiveKind::DateTimeOffset,
            "Decimal" => EdmPrimitiveKind::Decimal,
            "Double" => EdmPrimitiveKind::Double,
            "Guid" => EdmPrimitiveKind::Guid,
            "Int16" => EdmPrimitiveKind::Int16,
            "Int32" => EdmPrimitiveKind::Int32,
            "Int64" => EdmPrimitiveKind::Int64,
            "SByte" => EdmPrimitiveKind::SByte,
            "Single" => EdmPrimitiveKind::Single,
            "String" => EdmPrimitiveKind::String,
            "Time" => EdmPrimitiveKind::Time,
            other if other.starts_with("Geography") => EdmPrimitiveKind::Geography,
            other if other.starts_with("Geometry") => EdmPrimitiveKind::Geometry,
            _ => return Err(LiteralError::UnknownEdmType(name.to_string())),
        };
        Ok(kind)
    }

    /// Parses a type name, returning `None` for non-primitive (complex or
    /// collection) names instead of an error.
    pub fn try_parse(name: &str) -> Option<Self> {
        Self::parse(name).ok()
    }

    pub fn is_spatial(&self) -> bool {
        matches!(
            self,
            EdmPrimitiveKind::Geography | EdmPrimitiveKind::Geometry
        )
    }
}

impl std::fmt::Display for EdmPrimitiveKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_with_and_without_prefix() {
        assert_eq!(
            EdmPrimitiveKind::parse("Edm.Int32").unwrap(),
            EdmPrimitiveKind::Int32
        );
        assert_eq!(
            EdmPrimitiveKind::parse("Int32").unwrap(),
            EdmPrimitiveKind::Int32
        );
    }

    #[test]
    fn spatial_subtypes_collapse() {
        assert_eq!(
            EdmPrimitiveKind::parse("Edm.GeographyPoint").unwrap(),
            EdmPrimitiveKind::Geography
        );
        assert_eq!(
            EdmPrimitiveKind::parse("Edm.GeometryPolygon").unwrap(),
            EdmPrimitiveKind::Geometry
        );
    }

    #[test]
    fn unknown_name_is_an_error() {
        assert!(EdmPrimitiveKind::parse("My.ComplexType").is_err());
    }
}
