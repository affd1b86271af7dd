use num_bigint::BigInt;
use std::fmt;

//===========================================================================//

/// Represents the type of a [`DbValue`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DbType {
    /// The boolean type.
    Boolean,
    /// The bottom type, used for expressions that don't typecheck.
    Bottom,
    /// The integer type.
    Integer,
}

impl fmt::Display for DbType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DbType::Boolean => f.write_str("bool"),
            DbType::Bottom => f.write_str("bottom"),
            DbType::Integer => f.write_str("int"),
        }
    }
}

//===========================================================================//

/// The value of a debugger expression.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DbValue {
    /// A boolean value (false or true).
    Boolean(bool),
    /// An integer value (with no minimum/maximum range).
    Integer(BigInt),
}

impl DbValue {
    /// Returns the contained [`Boolean`](DbValue::Boolean) value, or panics
    /// if this value is not a boolean.
    pub fn unwrap_bool(self) -> bool {
        match self {
            DbValue::Boolean(boolean) => boolean,
            value => panic!("DbValue::unwrap_bool on {value:?}"),
        }
    }

    /// Returns the contained [`Integer`](DbValue::Integer) value, or panics
    /// if this value is not an integer.
    pub fn unwrap_int(self) -> BigInt {
        match self {
            DbValue::Integer(integer) => integer,
            value => panic!("DbValue::unwrap_int on {value:?}"),
        }
    }

    /// Returns the type of this value.
    pub fn db_type(&self) -> DbType {
        match self {
            DbValue::Boolean(_) => DbType::Boolean,
            DbValue::Integer(_) => DbType::Integer,
        }
    }
}

impl From<bool> for DbValue {
    fn from(value: bool) -> DbValue {
        DbValue::Boolean(value)
    }
}

impl From<u16> for DbValue {
    fn from(value: u16) -> DbValue {
        DbValue::Integer(BigInt::from(value))
    }
}

/// Integers are shown in decimal, followed by hex in parentheses.
impl fmt::Display for DbValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DbValue::Boolean(value) => value.fmt(f),
            DbValue::Integer(value) => write!(f, "{value} ({value:#x})"),
        }
    }
}

//===========================================================================//

/// Truncates an integer to 16 bits, two's-complement style, as when it is
/// stored into a register or memory word.
pub(crate) fn wrap_u16(value: &BigInt) -> u16 {
    let masked: BigInt = value & BigInt::from(0xffff);
    u16::try_from(&masked).unwrap_or(0)
}

//===========================================================================//

#[cfg(test)]
mod tests {
    use super::{DbType, DbValue, wrap_u16};
    use num_bigint::BigInt;

    #[test]
    fn display_type() {
        assert_eq!(format!("{}", DbType::Boolean), "bool");
        assert_eq!(format!("{}", DbType::Integer), "int");
    }

    #[test]
    fn display_boolean_value() {
        assert_eq!(format!("{}", DbValue::Boolean(false)), "false");
        assert_eq!(format!("{}", DbValue::Boolean(true)), "true");
    }

    #[test]
    fn display_integer_value() {
        let value = DbValue::from(0x4400u16);
        assert_eq!(format!("{value}"), "17408 (0x4400)");
        assert_eq!(format!("{}", DbValue::from(0u16)), "0 (0x0)");
    }

    #[test]
    fn wrapping() {
        assert_eq!(wrap_u16(&BigInt::from(0x12345)), 0x2345);
        assert_eq!(wrap_u16(&BigInt::from(-1)), 0xffff);
        assert_eq!(wrap_u16(&BigInt::from(-0x10000)), 0);
    }
}

//===========================================================================//
