//! Macro generating port error enums with snake_case constructors.
//!
//! ```ignore
//! define_port_error! {
//!     pub enum StoreError {
//!         Io { message: String } => "store failed: {message}",
//!         Closed => "store closed",
//!     }
//! }
//! let err = StoreError::io("disk full");
//! ```
//!
//! Field constructors take `impl Into<T>` so callers can pass `&str` for
//! `String` fields.

macro_rules! define_port_error {
    (@ctor $variant:ident) => {
        ::paste::paste! {
            #[doc = concat!("Build [`Self::", stringify!($variant), "`].")]
            #[must_use]
            pub const fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };
    (@ctor $variant:ident { $($field:ident : $ty:ty),+ }) => {
        ::paste::paste! {
            #[doc = concat!("Build [`Self::", stringify!($variant), "`].")]
            #[must_use]
            pub fn [<$variant:snake>]($($field: impl Into<$ty>),+) -> Self {
                Self::$variant { $($field: $field.into()),+ }
            }
        }
    };
    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($field:ident : $ty:ty),+ $(,)? } )? => $message:expr
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant $( { $($field: $ty),+ } )?,
            )*
        }

        impl $name {
            $(define_port_error!(@ctor $variant $( { $($field: $ty),+ } )?);)*
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    define_port_error! {
        pub enum SampleStoreError {
            Io { message: String } => "store failed: {message}",
            Missing { key: String, attempts: u32 } => "{key} missing after {attempts} attempts",
            Closed => "store closed",
        }
    }

    #[test]
    fn string_fields_accept_str() {
        assert_eq!(
            SampleStoreError::io("disk full").to_string(),
            "store failed: disk full"
        );
    }

    #[test]
    fn mixed_fields_keep_their_types() {
        let err = SampleStoreError::missing("receipts/a.pdf", 3_u32);
        assert_eq!(
            err,
            SampleStoreError::Missing {
                key: "receipts/a.pdf".to_owned(),
                attempts: 3,
            }
        );
        assert_eq!(err.to_string(), "receipts/a.pdf missing after 3 attempts");
    }

    #[test]
    fn unit_variants_get_constructors() {
        assert_eq!(SampleStoreError::closed(), SampleStoreError::Closed);
    }
}
