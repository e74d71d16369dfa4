use std::fmt;

/// The closed enumeration of built-in type names accepted in source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Type {
    Any,
    Nil,
    Comparable,
    Integer,
    Decimal,
    Boolean,
    Character,
    String,
    IntegerIterable,
}

impl Type {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Any" => Some(Self::Any),
            "Nil" => Some(Self::Nil),
            "Comparable" => Some(Self::Comparable),
            "Integer" => Some(Self::Integer),
            "Decimal" => Some(Self::Decimal),
            "Boolean" => Some(Self::Boolean),
            "Character" => Some(Self::Character),
            "String" => Some(Self::String),
            "IntegerIterable" => Some(Self::IntegerIterable),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Any => "Any",
            Self::Nil => "Nil",
            Self::Comparable => "Comparable",
            Self::Integer => "Integer",
            Self::Decimal => "Decimal",
            Self::Boolean => "Boolean",
            Self::Character => "Character",
            Self::String => "String",
            Self::IntegerIterable => "IntegerIterable",
        }
    }

    /// Whether a value of type `actual` may be stored into a slot of this
    /// type. Total over all type pairs.
    pub fn accepts(self, actual: Type) -> bool {
        match self {
            Self::Any => true,
            Self::Comparable => matches!(
                actual,
                Self::Integer | Self::Decimal | Self::Character | Self::String
            ),
            _ => self == actual,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
