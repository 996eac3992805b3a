use std::fmt::Display;

/// A primitive type in Java.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, PartialOrd, Ord)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub enum PrimitiveType {
    /// The `boolean` type.
    Boolean,
    /// The `char` type.
    Char,
    /// The `float` type.
    Float,
    /// The `double` type.
    Double,
    /// The `byte` type.
    Byte,
    /// The `short` type.
    Short,
    /// The `int` type.
    Int,
    /// The `long` type.
    Long,
}

impl PrimitiveType {
    /// Checks whether values of this type are represented as an `int` at runtime.
    #[must_use]
    pub const fn can_hold_int(&self) -> bool {
        matches!(
            self,
            Self::Byte | Self::Short | Self::Int | Self::Char | Self::Boolean
        )
    }

    const fn name(&self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Char => "char",
            Self::Float => "float",
            Self::Double => "double",
            Self::Byte => "byte",
            Self::Short => "short",
            Self::Int => "int",
            Self::Long => "long",
        }
    }
}

/// The type of a variable.
#[derive(Debug, PartialEq, Eq, Hash, Clone, PartialOrd, Ord)]
pub enum Type {
    /// A primitive type.
    Primitive(PrimitiveType),
    /// A reference to an instance of the named class.
    Reference(String),
}

impl Type {
    /// The `int` type.
    pub const INT: Self = Self::Primitive(PrimitiveType::Int);

    /// Checks whether values of this type are represented as an `int` at runtime.
    #[must_use]
    pub const fn can_hold_int(&self) -> bool {
        match self {
            Self::Primitive(it) => it.can_hold_int(),
            Self::Reference(_) => false,
        }
    }
}

impl From<PrimitiveType> for Type {
    fn from(value: PrimitiveType) -> Self {
        Self::Primitive(value)
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Primitive(it) => write!(f, "{}", it.name()),
            Self::Reference(class) => write!(f, "{class}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn int_like_types() {
        assert!(Type::INT.can_hold_int());
        assert!(Type::from(PrimitiveType::Boolean).can_hold_int());
        assert!(!Type::from(PrimitiveType::Long).can_hold_int());
        assert!(!Type::from(PrimitiveType::Double).can_hold_int());
        assert!(!Type::Reference("java/lang/Integer".to_owned()).can_hold_int());
    }

    proptest! {
        #[test]
        fn primitive_and_wrapped_agree(ty in any::<PrimitiveType>()) {
            prop_assert_eq!(ty.can_hold_int(), Type::from(ty).can_hold_int());
        }
    }
}
