//! Instances: a class plus stored property values.
//!
//! Instances have value semantics. Cloning is cheap (shared `Arc`) and
//! mutation copies the slots on first write.

use std::sync::Arc;

use indexmap::IndexMap;

use super::Value;
use crate::error::{PolyError, PolyResult};
use crate::types::Class;

#[derive(Debug, Clone, PartialEq)]
struct InstanceData {
    class: Class,
    slots: IndexMap<String, Value>,
}

/// An object created from a user-defined class.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance(Arc<InstanceData>);

impl Instance {
    pub fn class(&self) -> &Class {
        &self.0.class
    }

    /// Whether the instance's class declares property `name`.
    pub fn has_prop(&self, name: &str) -> bool {
        self.class().properties().contains_key(name)
    }

    /// Names of every declared property, ancestors first.
    pub fn prop_names(&self) -> Vec<String> {
        self.class().properties().keys().cloned().collect()
    }

    /// Read a property, running its getter when it is computed.
    pub fn prop(&self, name: &str) -> PolyResult<Value> {
        let props = self.class().properties();
        let Some(property) = props.get(name) else {
            return Err(self.not_found(name));
        };
        if let Some(getter) = property.getter() {
            return getter(self);
        }
        Ok(self.0.slots.get(name).cloned().unwrap_or(Value::Null))
    }

    /// Write a property, then validate the whole instance.
    ///
    /// Computed properties route through their setter; a computed property
    /// without a setter is read-only. On error the instance is unchanged.
    pub fn set_prop(&mut self, name: &str, value: impl Into<Value>) -> PolyResult<()> {
        let value = value.into();
        let props = self.class().properties();
        let Some(property) = props.get(name) else {
            return Err(self.not_found(name));
        };

        let updated = if let Some(setter) = property.setter() {
            setter(self.clone(), value)?
        } else if property.is_read_only() {
            return Err(PolyError::ReadOnlyProperty {
                class: self.class().name().to_string(),
                property: name.to_string(),
            });
        } else {
            property.check_value(self.class().name(), &value)?;
            let mut next = self.clone();
            next.store(name, value);
            next
        };

        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Write a slot without type checks, setters or validation.
    ///
    /// Intended for setters, which receive the instance and must store the
    /// underlying value themselves.
    pub fn store(&mut self, name: &str, value: Value) {
        Arc::make_mut(&mut self.0)
            .slots
            .insert(name.to_string(), value);
    }

    /// Stored slot value, bypassing getters.
    pub fn raw(&self, name: &str) -> Option<&Value> {
        self.0.slots.get(name)
    }

    /// Check stored values against declared classes, then run validators
    /// from the root-most ancestor down to the instance's class.
    pub fn validate(&self) -> PolyResult<()> {
        let class = self.class();
        let mut problems = Vec::new();

        for (name, property) in class.properties() {
            if property.is_dynamic() {
                continue;
            }
            let value = self.0.slots.get(&name).cloned().unwrap_or(Value::Null);
            if let Err(PolyError::InvalidPropertyValue {
                expected, actual, ..
            }) = property.check_value(class.name(), &value)
            {
                problems.push(format!("@{} must be {}, not {}", name, expected, actual));
            }
        }

        // Validators assume well-typed slots.
        if problems.is_empty() {
            for (_, validator) in class.validators() {
                problems.extend(validator(self));
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(PolyError::ValidationFailed {
                class: class.name().to_string(),
                problems,
            })
        }
    }

    fn not_found(&self, name: &str) -> PolyError {
        PolyError::PropertyNotFound {
            class: self.class().name().to_string(),
            property: name.to_string(),
        }
    }
}

impl Class {
    /// Construct an instance from named property values.
    ///
    /// Unspecified properties take their default (or the prototype of their
    /// declared built-in class, or `NULL`). Values for computed properties
    /// are routed through their setters after the stored slots are filled.
    pub fn construct<I, K, V>(&self, values: I) -> PolyResult<Instance>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        if self.is_abstract() {
            return Err(PolyError::AbstractClass(self.name().to_string()));
        }

        let mut supplied: IndexMap<String, Value> = values
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        let props = self.properties();

        if let Some(unknown) = supplied.keys().find(|k| !props.contains_key(k.as_str())) {
            return Err(PolyError::PropertyNotFound {
                class: self.name().to_string(),
                property: unknown.clone(),
            });
        }

        let mut instance = Instance(Arc::new(InstanceData {
            class: self.clone(),
            slots: IndexMap::new(),
        }));
        let mut deferred = Vec::new();
        for (name, property) in &props {
            let supplied_value = supplied.shift_remove(name);
            if property.is_dynamic() {
                if let Some(value) = supplied_value {
                    deferred.push((name.clone(), value));
                }
                continue;
            }
            let value = supplied_value.unwrap_or_else(|| property.initial_value());
            instance.store(name, value);
        }

        for (name, value) in deferred {
            let Some(property) = props.get(&name) else {
                continue;
            };
            match property.setter() {
                Some(setter) => instance = setter(instance, value)?,
                None => {
                    return Err(PolyError::ReadOnlyProperty {
                        class: self.name().to_string(),
                        property: name,
                    })
                }
            }
        }

        instance.validate()?;
        Ok(instance)
    }
}
