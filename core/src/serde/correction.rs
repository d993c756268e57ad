//! Client error correction.
//!
//! Error correction fills missing required values so that shapes
//! deserialized from incomplete payloads can still be constructed. This
//! backs the error-correcting mode of
//! [`crate::schema::TypeRegistry::deserialize`].

use bigdecimal::Zero;

use crate::schema::Document;
use crate::{BigDecimal, BigInt, ByteBuffer, IndexMap, Instant};

/// Provides the zero value used to fill a missing required member.
pub trait ErrorCorrectionDefault {
    /// Returns a default value for the type in case of errors.
    fn correction_default() -> Self;
}

macro_rules! correction_default_impl {
    ($t:ty, $v:expr) => {
        impl ErrorCorrectionDefault for $t {
            #[inline(always)]
            fn correction_default() -> $t {
                $v
            }
        }
    };
}

correction_default_impl!(bool, false);
correction_default_impl!(i8, 0i8);
correction_default_impl!(i16, 0i16);
correction_default_impl!(i32, 0i32);
correction_default_impl!(i64, 0i64);
correction_default_impl!(f32, 0f32);
correction_default_impl!(f64, 0f64);
correction_default_impl!(String, String::new());
correction_default_impl!(BigDecimal, BigDecimal::zero());
correction_default_impl!(BigInt, BigInt::zero());
correction_default_impl!(ByteBuffer, ByteBuffer::new());
correction_default_impl!(
    Instant,
    Instant::from_epoch_milliseconds(0).expect("Instant epoch default is instantiatable")
);
correction_default_impl!(Document, Document::null());

impl<E> ErrorCorrectionDefault for Vec<E> {
    fn correction_default() -> Self {
        Vec::new()
    }
}

impl<E> ErrorCorrectionDefault for IndexMap<String, E> {
    fn correction_default() -> Self {
        IndexMap::new()
    }
}

impl<E> ErrorCorrectionDefault for Option<E> {
    fn correction_default() -> Self {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corrected_scalars_are_zero_values() {
        assert!(!bool::correction_default());
        assert_eq!(i32::correction_default(), 0);
        assert_eq!(String::correction_default(), "");
        assert_eq!(Instant::correction_default().epoch_milliseconds(), 0);
        assert!(Document::correction_default().is_null());
    }
}
