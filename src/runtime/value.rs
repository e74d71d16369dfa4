use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;

use crate::runtime::types::Type;

/// A runtime value together with its type tag (carried by the variant).
///
/// Lists are the only mutable values; they are shared by handle, so an
/// indexed assignment is visible through every alias of the same list
/// while rebinding a variable is not.
#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Boolean(bool),
    Integer(BigInt),
    Decimal(BigDecimal),
    Character(char),
    String(String),
    List(Rc<RefCell<Vec<Value>>>),
}

impl Value {
    pub fn list(values: Vec<Value>) -> Self {
        Value::List(Rc::new(RefCell::new(values)))
    }

    pub fn plc_type(&self) -> Type {
        match self {
            Value::Nil => Type::Nil,
            Value::Boolean(_) => Type::Boolean,
            Value::Integer(_) => Type::Integer,
            Value::Decimal(_) => Type::Decimal,
            Value::Character(_) => Type::Character,
            Value::String(_) => Type::String,
            Value::List(_) => Type::IntegerIterable,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.plc_type().name()
    }
}

/// Deep value equality: lists compare element-wise, other variants by
/// their underlying datum. Values of different types are never equal.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Boolean(left), Value::Boolean(right)) => left == right,
            (Value::Integer(left), Value::Integer(right)) => left == right,
            (Value::Decimal(left), Value::Decimal(right)) => left == right,
            (Value::Character(left), Value::Character(right)) => left == right,
            (Value::String(left), Value::String(right)) => left == right,
            (Value::List(left), Value::List(right)) => *left.borrow() == *right.borrow(),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => f.write_str("NIL"),
            Value::Boolean(true) => f.write_str("TRUE"),
            Value::Boolean(false) => f.write_str("FALSE"),
            Value::Integer(value) => write!(f, "{value}"),
            Value::Decimal(value) => write!(f, "{value}"),
            Value::Character(value) => write!(f, "{value}"),
            Value::String(value) => f.write_str(value),
            Value::List(values) => {
                let rendered = values
                    .borrow()
                    .iter()
                    .map(Value::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "[{rendered}]")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn renders_plc_spellings() {
        assert_eq!(Value::Nil.to_string(), "NIL");
        assert_eq!(Value::Boolean(true).to_string(), "TRUE");
        assert_eq!(Value::Boolean(false).to_string(), "FALSE");
        assert_eq!(Value::Integer(BigInt::from(-42)).to_string(), "-42");
        assert_eq!(
            Value::Decimal(BigDecimal::from_str("3.50").expect("decimal")).to_string(),
            "3.50"
        );
        assert_eq!(Value::Character('c').to_string(), "c");
        assert_eq!(Value::String("hi".to_string()).to_string(), "hi");
        assert_eq!(
            Value::list(vec![Value::Integer(BigInt::from(1)), Value::Nil]).to_string(),
            "[1, NIL]"
        );
    }

    #[test]
    fn equality_is_deep_and_typed() {
        assert_eq!(
            Value::list(vec![Value::Integer(BigInt::from(1))]),
            Value::list(vec![Value::Integer(BigInt::from(1))])
        );
        assert_ne!(
            Value::Integer(BigInt::from(1)),
            Value::Decimal(BigDecimal::from_str("1.0").expect("decimal"))
        );
        assert_ne!(Value::Nil, Value::Boolean(false));
        assert_eq!(Value::Nil, Value::Nil);
    }

    #[test]
    fn list_aliases_share_storage() {
        let list = Value::list(vec![Value::Integer(BigInt::from(1))]);
        let alias = list.clone();
        if let Value::List(values) = &list {
            values.borrow_mut()[0] = Value::Integer(BigInt::from(7));
        }
        assert_eq!(alias, Value::list(vec![Value::Integer(BigInt::from(7))]));
    }

    #[test]
    fn maps_values_to_types() {
        assert_eq!(Value::Nil.plc_type(), Type::Nil);
        assert_eq!(Value::Character('a').plc_type(), Type::Character);
        assert_eq!(Value::list(vec![]).plc_type(), Type::IntegerIterable);
    }
}
