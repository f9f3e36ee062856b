//! Known content types and the attributes each one carries.
//!
//! The registry is built from the host's enabled modules: commerce and
//! digital-product types only exist when their module is present.

use std::collections::BTreeMap;

pub const ENTRY: &str = "entry";
pub const ASSET: &str = "asset";
pub const CATEGORY: &str = "category";
pub const PRODUCT: &str = "product";
pub const DIGITAL_PRODUCT: &str = "digital-product";

/// Optional host modules that contribute content types.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostModules {
    pub commerce: bool,
    pub digital_products: bool,
}

/// A content type and the extra attributes copied from its raw data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDefinition {
    name: String,
    attributes: Vec<String>,
}

impl TypeDefinition {
    pub fn new<I, S>(name: impl Into<String>, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            attributes: attributes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }
}

/// Registry of indexable content types, keyed by type name.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: BTreeMap<String, TypeDefinition>,
}

impl TypeRegistry {
    /// Types every host has: entries, assets and categories.
    pub fn core() -> Self {
        let mut registry = Self::default();
        registry.register(TypeDefinition::new(
            ENTRY,
            ["sectionHandle", "typeHandle", "postDate", "expiryDate", "authorId"],
        ));
        registry.register(TypeDefinition::new(
            ASSET,
            ["filename", "kind", "width", "height", "size", "volumeId", "alt"],
        ));
        registry.register(TypeDefinition::new(
            CATEGORY,
            ["groupHandle", "level", "parentId"],
        ));
        registry
    }

    /// Core types plus those contributed by the enabled modules.
    pub fn with_modules(modules: HostModules) -> Self {
        let mut registry = Self::core();
        if modules.commerce {
            registry.register(TypeDefinition::new(
                PRODUCT,
                [
                    "sku",
                    "price",
                    "promotionalPrice",
                    "stock",
                    "productType",
                    "defaultVariantId",
                ],
            ));
        }
        if modules.digital_products {
            registry.register(TypeDefinition::new(
                DIGITAL_PRODUCT,
                ["sku", "price", "productType", "licenseType"],
            ));
        }
        registry
    }

    /// Add or replace a type.
    pub fn register(&mut self, definition: TypeDefinition) {
        self.types.insert(definition.name.clone(), definition);
    }

    pub fn get(&self, type_name: &str) -> Option<&TypeDefinition> {
        self.types.get(type_name)
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_types() {
        let registry = TypeRegistry::core();
        assert_eq!(
            registry.names().collect::<Vec<_>>(),
            vec![ASSET, CATEGORY, ENTRY]
        );
        assert!(!registry.contains(PRODUCT));
    }

    #[test]
    fn test_modules_register_their_types() {
        let registry = TypeRegistry::with_modules(HostModules {
            commerce: true,
            digital_products: false,
        });
        assert!(registry.contains(PRODUCT));
        assert!(!registry.contains(DIGITAL_PRODUCT));
        assert!(registry
            .get(PRODUCT)
            .unwrap()
            .attributes()
            .contains(&"promotionalPrice".to_string()));
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = TypeRegistry::core();
        registry.register(TypeDefinition::new(ENTRY, ["summary"]));
        assert_eq!(registry.get(ENTRY).unwrap().attributes(), ["summary"]);
    }
}
