use std::{
    collections::{BTreeMap, HashSet},
    sync::{Arc, Weak},
};

use serde_json::{Map, Value};

use crate::{
    package::{
        exports::{Export, ExportRc},
        properties::{FieldValues, PropertyValue},
    },
    proxy::ProxySchema,
    Error, Result,
};

/// One object seen through its class schema.
///
/// An instance starts as an independent copy of the schema defaults. Decoded values are
/// layered on with [`ProxyInstance::update`], which records every `(field, index)` it touches
/// so consumers can tell real data from defaults.
///
/// # Examples
///
/// ```rust
/// use uepkg::proxy::{values::floats, ProxyDeclaration, SchemaRegistry};
///
/// let registry = SchemaRegistry::new();
/// registry.register(ProxyDeclaration::new("PrimalItem").field("Weight", floats([0.5_f32])))?;
///
/// let mut item = registry.proxy_for_type("PrimalItem").unwrap();
/// assert!(!item.has_override("Weight", 0));
///
/// item.update([("Weight", floats([2.0_f32]))]);
/// assert!(item.has_override("Weight", 0));
/// assert_eq!(item.get("Weight", 0)?.as_f64(), Some(2.0));
/// # Ok::<(), uepkg::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct ProxyInstance {
    ue_type: String,
    fields: BTreeMap<String, FieldValues>,
    overrides: HashSet<(String, u32)>,
    source: Option<Weak<Export>>,
}

impl ProxyInstance {
    /// Creates an instance holding a copy of the schema's defaults.
    #[must_use]
    pub fn new(schema: &ProxySchema) -> Self {
        ProxyInstance {
            ue_type: schema.ue_type().to_string(),
            fields: schema.defaults().clone(),
            overrides: HashSet::new(),
            source: None,
        }
    }

    /// Type identifier of the schema this instance was made from.
    #[must_use]
    pub fn ue_type(&self) -> &str {
        &self.ue_type
    }

    /// All fields with their current values.
    #[must_use]
    pub fn fields(&self) -> &BTreeMap<String, FieldValues> {
        &self.fields
    }

    /// The value at `field[index]`.
    ///
    /// # Errors
    /// Returns [`crate::Error::FieldNotFound`] if the field or index is absent.
    pub fn get(&self, field: &str, index: u32) -> Result<&PropertyValue> {
        self.fields
            .get(field)
            .and_then(|values| values.get(&index))
            .ok_or_else(|| Error::FieldNotFound {
                field: field.to_string(),
                index,
                proxy_type: self.ue_type.clone(),
            })
    }

    /// The value at `field[index]`, or `fallback` if it is absent.
    #[must_use]
    pub fn get_or<'a>(
        &'a self,
        field: &str,
        index: u32,
        fallback: &'a PropertyValue,
    ) -> &'a PropertyValue {
        self.get(field, index).unwrap_or(fallback)
    }

    /// Merges values into the instance and marks every touched `(field, index)` as
    /// overridden. Fields unknown to the schema are added.
    pub fn update<I, K>(&mut self, values: I)
    where
        I: IntoIterator<Item = (K, FieldValues)>,
        K: Into<String>,
    {
        for (field, field_values) in values {
            let field = field.into();
            let target = self.fields.entry(field.clone()).or_default();
            for (index, value) in field_values {
                target.insert(index, value);
                self.overrides.insert((field.clone(), index));
            }
        }
    }

    /// Returns `true` if `field[index]` was set by [`ProxyInstance::update`].
    #[must_use]
    pub fn has_override(&self, field: &str, index: u32) -> bool {
        self.overrides.contains(&(field.to_string(), index))
    }

    /// Number of overridden `(field, index)` pairs.
    #[must_use]
    pub fn override_count(&self) -> usize {
        self.overrides.len()
    }

    /// Records the export this instance was built from.
    pub fn set_source(&mut self, export: &ExportRc) {
        self.source = Some(Arc::downgrade(export));
    }

    /// The export this instance was built from, if set and still alive.
    #[must_use]
    pub fn source(&self) -> Option<ExportRc> {
        self.source.as_ref().and_then(Weak::upgrade)
    }

    /// Builds a JSON object from index 0 of the listed fields.
    ///
    /// `fields` pairs a field name with the key it gets in the output, in output order.
    /// A field the instance does not hold is written as `null`. With `only_overridden` set,
    /// fields without an override are left out instead.
    ///
    /// # Errors
    /// Returns [`crate::Error::Json`] if a value fails to serialise.
    pub fn export_fields(
        &self,
        fields: &[(&str, &str)],
        only_overridden: bool,
    ) -> Result<Map<String, Value>> {
        let mut output = Map::new();
        for &(field, key) in fields {
            if only_overridden && !self.has_override(field, 0) {
                continue;
            }

            let value = match self.fields.get(field).and_then(|values| values.get(&0)) {
                Some(value) => serde_json::to_value(value)?,
                None => Value::Null,
            };
            output.insert(key.to_string(), value);
        }
        Ok(output)
    }
}
