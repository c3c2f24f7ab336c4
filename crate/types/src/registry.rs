use crate::types::{PrimitiveName, Type};

/// Resolves a primitive type by its surface name.
///
/// Unlike `slang`'s `TypeRegistry`, CAPS has no struct/enum declarations and
/// no nominal types to intern: the only named types in a `TypeRef` are the
/// four built-in primitives, `Channel`, and `Result`, so resolution is a
/// flat, total lookup over `PrimitiveName` rather than a dynamic table.
///
/// ### Returns
/// `Some(Type)` for `int`/`bool`/`real`/`text`, `None` for anything else
/// (including `Channel`/`Result`, which are resolved structurally by the
/// caller from their generic arguments).
pub fn resolve_primitive(name: &str) -> Option<Type> {
    match PrimitiveName::from_str(name)? {
        PrimitiveName::Int => Some(Type::Int),
        PrimitiveName::Bool => Some(Type::Bool),
        PrimitiveName::Real => Some(Type::Real),
        PrimitiveName::Text => Some(Type::Text),
    }
}

/// All recognized primitive names, for diagnostics ("expected one of: ...").
pub fn primitive_names() -> Vec<&'static str> {
    PrimitiveName::iter().map(|p| p.name()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_all_primitives() {
        assert_eq!(resolve_primitive("int"), Some(Type::Int));
        assert_eq!(resolve_primitive("bool"), Some(Type::Bool));
        assert_eq!(resolve_primitive("real"), Some(Type::Real));
        assert_eq!(resolve_primitive("text"), Some(Type::Text));
    }

    #[test]
    fn rejects_unknown_names() {
        assert_eq!(resolve_primitive("Channel"), None);
        assert_eq!(resolve_primitive("frobnicate"), None);
    }
}
