//! Bounds checked numeric views and constructors

use super::Json;

macro_rules! integer_views {
    ($($(#[$doc:meta])* $name:ident => $ty:ty),* $(,)?) => {
        impl Json {
            $(
                $(#[$doc])*
                pub fn $name(&self) -> Option<$ty> {
                    match self {
                        Self::Integer(value) => <$ty>::try_from(*value).ok(),
                        _ => None,
                    }
                }
            )*
        }
    };
}

integer_views! {
    /// `u8` view; `None` when out of range or not an integer
    as_u8 => u8,
    /// `u16` view; `None` when out of range or not an integer
    as_u16 => u16,
    /// `u32` view; `None` when out of range or not an integer
    as_u32 => u32,
    /// `u64` view; `None` when negative or not an integer
    as_u64 => u64,
    /// `usize` view; `None` when out of range or not an integer
    as_usize => usize,
    /// `i8` view; `None` when out of range or not an integer
    as_i8 => i8,
    /// `i16` view; `None` when out of range or not an integer
    as_i16 => i16,
    /// `i32` view; `None` when out of range or not an integer
    as_i32 => i32,
    /// `i64` view; `None` when out of range or not an integer
    as_i64 => i64,
    /// `isize` view; `None` when out of range or not an integer
    as_isize => isize,
}

macro_rules! integer_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Json {
                fn from(value: $ty) -> Self {
                    Self::Integer(i128::from(value))
                }
            }
        )*
    };
}

integer_from!(u8, u16, u32, u64, i8, i16, i32, i64);

impl From<usize> for Json {
    fn from(value: usize) -> Self {
        // usize is at most 64 bits on every supported target
        u64::try_from(value).map_or(Self::Undefined, Self::from)
    }
}

impl From<isize> for Json {
    fn from(value: isize) -> Self {
        i64::try_from(value).map_or(Self::Undefined, Self::from)
    }
}

impl Json {
    /// Smallest integer a `Json` can hold
    pub const MIN_INTEGER: i128 = -(1 << 63);
    /// Largest integer a `Json` can hold
    pub const MAX_INTEGER: i128 = (1 << 64) - 1;

    /// Build an integer value, rejecting anything outside `i64::MIN..=u64::MAX`
    pub fn integer(value: i128) -> Option<Self> {
        (Self::MIN_INTEGER..=Self::MAX_INTEGER)
            .contains(&value)
            .then_some(Self::Integer(value))
    }

    /// `f64` view of any number; integers are converted
    #[allow(
        clippy::cast_precision_loss,
        reason = "large integers are allowed to round when viewed as floats"
    )]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::Integer(value) => Some(*value as f64),
            _ => None,
        }
    }

    /// `f32` view; `None` when a finite value does not fit
    #[allow(
        clippy::cast_possible_truncation,
        reason = "range is checked before narrowing"
    )]
    pub fn as_f32(&self) -> Option<f32> {
        let value = self.as_f64()?;
        if value.is_finite() && value.abs() > f64::from(f32::MAX) {
            return None;
        }
        Some(value as f32)
    }
}
