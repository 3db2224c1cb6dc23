use crate::runtime::error::{RuntimeError, RuntimeResult};
use std::fmt;
use std::rc::Rc;

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Int(i64),
    Bool(bool),
    Char(u8),
    Array(Vec<Value>),
    Record(RecordValue),
    /// Result of calling a `void` function. Never stored in a binding.
    Void,
}

impl Value {
    pub fn as_int(&self) -> RuntimeResult<i64> {
        match self {
            Value::Int(v) => Ok(*v),
            Value::Bool(b) => Ok(i64::from(*b)),
            Value::Char(c) => Ok(i64::from(*c)),
            other => Err(RuntimeError::mismatch(format!(
                "expected an integer, found {}",
                other.type_name()
            ))),
        }
    }

    pub fn as_bool(&self) -> RuntimeResult<bool> {
        match self {
            Value::Bool(b) => Ok(*b),
            Value::Int(v) => Ok(*v != 0),
            Value::Char(c) => Ok(*c != 0),
            other => Err(RuntimeError::mismatch(format!(
                "expected a condition, found {}",
                other.type_name()
            ))),
        }
    }

    pub fn as_char(&self) -> RuntimeResult<u8> {
        // Truncation to the low byte mirrors a C `char` conversion.
        self.as_int().map(|v| v as u8)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Bool(_) => "bool",
            Value::Char(_) => "char",
            Value::Array(_) => "array",
            Value::Record(_) => "record",
            Value::Void => "void",
        }
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Int(_) => ValueType::Int,
            Value::Bool(_) => ValueType::Bool,
            Value::Char(_) => ValueType::Char,
            Value::Array(items) => ValueType::Array {
                elem: Box::new(items.first().map_or(ValueType::Int, Value::value_type)),
                len: items.len(),
            },
            Value::Record(record) => ValueType::Record(record.ty.clone()),
            Value::Void => ValueType::Void,
        }
    }
}

/// Field layout of a `class`/`struct`.
#[derive(Debug, PartialEq)]
pub struct RecordType {
    pub name: String,
    pub fields: Vec<(String, ValueType)>,
}

impl RecordType {
    pub fn field_index(&self, field: &str) -> Option<usize> {
        self.fields.iter().position(|(name, _)| name == field)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RecordValue {
    pub ty: Rc<RecordType>,
    /// Field values in declaration order.
    pub fields: Vec<Value>,
}

impl RecordValue {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.ty.field_index(field).map(|index| &self.fields[index])
    }
}

/// A resolved type: array lengths are known and record names point at
/// their layout.
#[derive(Clone, Debug, PartialEq)]
pub enum ValueType {
    Int,
    Bool,
    Char,
    Void,
    Array { elem: Box<ValueType>, len: usize },
    Record(Rc<RecordType>),
}

impl ValueType {
    /// The value a declaration without initializer starts with.
    pub fn zero_value(&self) -> Value {
        match self {
            ValueType::Int => Value::Int(0),
            ValueType::Bool => Value::Bool(false),
            ValueType::Char => Value::Char(0),
            ValueType::Void => Value::Void,
            ValueType::Array { elem, len } => Value::Array(vec![elem.zero_value(); *len]),
            ValueType::Record(ty) => Value::Record(RecordValue {
                ty: ty.clone(),
                fields: ty.fields.iter().map(|(_, field)| field.zero_value()).collect(),
            }),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Int => write!(f, "int"),
            ValueType::Bool => write!(f, "bool"),
            ValueType::Char => write!(f, "char"),
            ValueType::Void => write!(f, "void"),
            ValueType::Array { elem, len } => write!(f, "{elem}[{len}]"),
            ValueType::Record(ty) => write!(f, "{}", ty.name),
        }
    }
}

/// Converts `value` for storage in a slot of type `target`.
///
/// Scalars convert freely between each other. Arrays and records only
/// convert to their own type.
pub fn convert(value: Value, target: &ValueType) -> RuntimeResult<Value> {
    match target {
        ValueType::Int => value.as_int().map(Value::Int),
        ValueType::Bool => value.as_bool().map(Value::Bool),
        ValueType::Char => value.as_char().map(Value::Char),
        ValueType::Void => Err(RuntimeError::mismatch(format!(
            "cannot use {} as void",
            value.type_name()
        ))),
        ValueType::Array { .. } | ValueType::Record(_) => {
            if value.value_type() == *target {
                Ok(value)
            } else {
                Err(RuntimeError::mismatch(format!(
                    "expected {target}, found {}",
                    value.value_type()
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point() -> Rc<RecordType> {
        Rc::new(RecordType {
            name: "Point".into(),
            fields: vec![
                ("x".into(), ValueType::Int),
                ("tag".into(), ValueType::Char),
            ],
        })
    }

    #[test]
    fn scalars_convert_like_c() {
        assert_eq!(convert(Value::Char(b'1'), &ValueType::Int).unwrap(), Value::Int(49));
        assert_eq!(convert(Value::Int(3), &ValueType::Bool).unwrap(), Value::Bool(true));
        assert_eq!(convert(Value::Bool(true), &ValueType::Int).unwrap(), Value::Int(1));
        assert_eq!(convert(Value::Int(0), &ValueType::Bool).unwrap(), Value::Bool(false));
        assert_eq!(convert(Value::Int(321), &ValueType::Char).unwrap(), Value::Char(65));
    }

    #[test]
    fn zero_values_nest() {
        let ty = ValueType::Array {
            elem: Box::new(ValueType::Record(point())),
            len: 2,
        };
        let Value::Array(items) = ty.zero_value() else {
            panic!("expected array");
        };
        assert_eq!(items.len(), 2);
        let Value::Record(record) = &items[1] else {
            panic!("expected record");
        };
        assert_eq!(record.get("tag"), Some(&Value::Char(0)));
        assert_eq!(items[0].value_type(), ValueType::Record(point()));
    }

    #[test]
    fn aggregates_only_convert_to_their_own_type() {
        let three = ValueType::Array {
            elem: Box::new(ValueType::Int),
            len: 3,
        };
        let two = ValueType::Array {
            elem: Box::new(ValueType::Int),
            len: 2,
        };
        assert!(convert(three.zero_value(), &three).is_ok());
        assert!(matches!(
            convert(three.zero_value(), &two),
            Err(RuntimeError::TypeMismatch { .. })
        ));
        assert!(convert(Value::Int(1), &ValueType::Record(point())).is_err());
        assert!(convert(Value::Void, &ValueType::Int).is_err());
    }
}
