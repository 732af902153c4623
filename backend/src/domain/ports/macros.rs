//! Macro generating port error enums with snake_case constructors.
//!
//! ```ignore
//! define_port_error! {
//!     /// Failures raised by a storage adapter.
//!     pub enum StorageError {
//!         Io { message: String } => "storage failed: {message}",
//!         Closed => "storage closed",
//!     }
//! }
//!
//! let err = StorageError::io("disk full");
//! ```
//!
//! Constructor fields accept `impl Into<T>`, so string fields take `&str`.

macro_rules! define_port_error {
    (@ctor $variant:ident) => {
        ::paste::paste! {
            #[allow(dead_code)]
            pub fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };

    (@ctor $variant:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        define_port_error!(@fields $variant [] [] $( $field : $ty, )*);
    };

    (@fields $variant:ident [$($params:tt)*] [$($inits:tt)*]) => {
        ::paste::paste! {
            #[allow(dead_code)]
            pub fn [<$variant:snake>]($($params)*) -> Self {
                Self::$variant { $($inits)* }
            }
        }
    };

    (@fields $variant:ident [$($params:tt)*] [$($inits:tt)*] $field:ident : $ty:ty, $($rest:tt)*) => {
        define_port_error!(
            @fields
            $variant
            [$($params)* $field: impl Into<$ty>,]
            [$($inits)* $field: $field.into(),]
            $($rest)*
        );
    };

    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($field:ident : $ty:ty),* $(,)? } )? => $message:expr
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant $( { $($field : $ty),* } )?,
            )*
        }

        impl $name {
            $(
                define_port_error!(@ctor $variant $( { $($field : $ty),* } )?);
            )*
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    define_port_error! {
        pub enum SyncPortError {
            Unreachable { endpoint: String } => "cannot reach {endpoint}",
            Stale { expected: u64, actual: u64 } => "stale revision {expected}, now {actual}",
            Closed => "channel closed",
        }
    }

    #[test]
    fn string_fields_accept_borrowed_text() {
        let err = SyncPortError::unreachable("https://docs.campus.test");
        assert_eq!(err.to_string(), "cannot reach https://docs.campus.test");
    }

    #[test]
    fn numeric_fields_keep_their_type() {
        let err = SyncPortError::stale(3_u64, 5_u64);
        assert_eq!(
            err,
            SyncPortError::Stale {
                expected: 3,
                actual: 5
            }
        );
    }

    #[test]
    fn unit_variants_get_constructors() {
        assert_eq!(SyncPortError::closed().to_string(), "channel closed");
    }
}
