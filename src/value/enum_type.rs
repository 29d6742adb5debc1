//! Enum value type.
//!
//! One `EnumType` instance represents one registered database enum: the
//! member list and type name are learned at registration and shared by every
//! instance cloned from the prototype. Because a single native carrier type
//! stands for many database types, `EnumType` is a [`TypeValue`] and is
//! resolved through its type name rather than the native-type index.

use std::any::Any;
use std::sync::Arc;

use bytes::{Bytes, BytesMut};

use super::{
    store, store_none_for, BinaryDecode, TextDecode, TextEncode, TypeValue, Value,
};
use crate::error::{TypeError, TypeResult};
use crate::plan::IsNull;
use crate::registry::TypeRegistry;

#[derive(Debug, Clone)]
pub struct EnumType {
    name: String,
    members: Arc<Vec<String>>,
    pub value: String,
    pub valid: bool,
}

impl EnumType {
    /// An empty prototype for a database enum with the given members.
    pub fn new(name: impl Into<String>, members: Vec<String>) -> Self {
        Self {
            name: name.into(),
            members: Arc::new(members),
            value: String::new(),
            valid: false,
        }
    }

    pub fn members(&self) -> &[String] {
        &self.members
    }

    /// The held label, `None` when NULL.
    pub fn label(&self) -> Option<&str> {
        self.valid.then_some(self.value.as_str())
    }

    fn set_label(&mut self, label: &str) -> TypeResult<()> {
        if !self.members.iter().any(|m| m == label) {
            return Err(TypeError::malformed(format!(
                "{label:?} is not a member of enum {}",
                self.name
            )));
        }
        self.value = label.to_string();
        self.valid = true;
        Ok(())
    }

    fn clear(&mut self) {
        self.value.clear();
        self.valid = false;
    }
}

impl Value for EnumType {
    fn set(&mut self, src: Option<Box<dyn Any>>) -> TypeResult<()> {
        let Some(src) = src else {
            self.clear();
            return Ok(());
        };
        if let Some(v) = src.downcast_ref::<String>() {
            return self.set_label(v);
        }
        if let Some(v) = src.downcast_ref::<EnumType>() {
            if v.valid {
                return self.set_label(&v.value);
            }
            self.clear();
            return Ok(());
        }
        Err(TypeError::Unsupported("cannot convert source to enum"))
    }

    fn get(&self) -> Option<Box<dyn Any>> {
        if self.valid {
            Some(Box::new(self.value.clone()))
        } else {
            None
        }
    }

    fn assign_to(&self, dst: &mut dyn Any) -> TypeResult<()> {
        if !self.valid {
            if store_none_for::<String>(dst) {
                return Ok(());
            }
            return Err(TypeError::NullAssignment {
                target: "destination",
            });
        }
        if store(dst, self.value.clone()) {
            return Ok(());
        }
        Err(TypeError::Unsupported("unsupported enum assignment target"))
    }

    fn new_value(&self) -> Box<dyn Value> {
        self.new_type_value()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn text_decoder(&mut self) -> Option<&mut dyn TextDecode> {
        Some(self)
    }

    fn binary_decoder(&mut self) -> Option<&mut dyn BinaryDecode> {
        Some(self)
    }

    fn text_encoder(&self) -> Option<&dyn TextEncode> {
        Some(self)
    }

    fn as_type_value(&self) -> Option<&dyn TypeValue> {
        Some(self)
    }
}

impl TypeValue for EnumType {
    fn new_type_value(&self) -> Box<dyn Value> {
        Box::new(Self {
            name: self.name.clone(),
            members: self.members.clone(),
            value: String::new(),
            valid: false,
        })
    }

    fn type_name(&self) -> &str {
        &self.name
    }
}

// Enum labels travel as their text in both wire formats.
impl TextDecode for EnumType {
    fn decode_text(&mut self, _registry: &TypeRegistry, src: Option<Bytes>) -> TypeResult<()> {
        let Some(src) = src else {
            self.clear();
            return Ok(());
        };
        let label = std::str::from_utf8(&src)
            .map_err(|e| TypeError::malformed(format!("invalid UTF-8 in enum label: {e}")))?
            .to_string();
        self.set_label(&label)
    }
}

impl BinaryDecode for EnumType {
    fn decode_binary(&mut self, registry: &TypeRegistry, src: Option<Bytes>) -> TypeResult<()> {
        self.decode_text(registry, src)
    }
}

impl TextEncode for EnumType {
    fn encode_text(&self, _registry: &TypeRegistry, buf: &mut BytesMut) -> TypeResult<IsNull> {
        if !self.valid {
            return Ok(IsNull::Yes);
        }
        buf.extend_from_slice(self.value.as_bytes());
        Ok(IsNull::No)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mood() -> EnumType {
        EnumType::new(
            "mood",
            vec!["sad".to_string(), "ok".to_string(), "happy".to_string()],
        )
    }

    #[test]
    fn test_set_label_validates_membership() {
        let mut e = mood();
        e.set_label("happy").unwrap();
        assert_eq!(e.label(), Some("happy"));
        assert!(e.set_label("angry").is_err());
    }

    #[test]
    fn test_new_type_value_shares_members() {
        let proto = mood();
        let fresh = proto.new_type_value();
        let tv = fresh.as_type_value().unwrap();
        assert_eq!(tv.type_name(), "mood");
        assert!(fresh.get().is_none());
    }

    #[test]
    fn test_decode_text() {
        let reg = TypeRegistry::new();
        let mut e = mood();
        e.decode_text(&reg, Some(Bytes::from_static(b"ok"))).unwrap();
        assert_eq!(e.label(), Some("ok"));
        assert!(e
            .decode_text(&reg, Some(Bytes::from_static(b"angry")))
            .is_err());
        e.decode_text(&reg, None).unwrap();
        assert_eq!(e.label(), None);
    }
}
