//! `define_port_error!`: error enums for driven-port failures.
//!
//! Each variant carries one named field and renders through `thiserror`. The
//! macro also emits a snake_case constructor per variant that takes
//! `impl Into<FieldType>`, so adapters write
//! `LedgerPersistenceError::conflict("book no longer available")`.

macro_rules! define_port_error {
    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident { $field:ident : $ty:ty } => $message:expr
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant { $field: $ty },
            )*
        }

        impl $name {
            $(
                ::paste::paste! {
                    pub fn [<$variant:snake>]($field: impl Into<$ty>) -> Self {
                        Self::$variant { $field: $field.into() }
                    }
                }
            )*
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    //! Constructor coverage for the generated port errors.
    use rstest::rstest;

    use crate::domain::ports::{CredentialHashError, LedgerPersistenceError, UserPersistenceError};

    #[rstest]
    fn constructors_accept_borrowed_strings() {
        assert_eq!(
            LedgerPersistenceError::not_found("book"),
            LedgerPersistenceError::NotFound {
                message: "book".to_owned()
            }
        );
    }

    #[rstest]
    fn constructors_accept_owned_strings() {
        let email = String::from("grace@example.com");
        assert_eq!(
            UserPersistenceError::duplicate_email(email.clone()),
            UserPersistenceError::DuplicateEmail { email }
        );
    }

    #[rstest]
    fn multi_word_variants_get_snake_case_constructors() {
        let err = CredentialHashError::hashing("cost out of range");
        assert_eq!(err.to_string(), "credential hashing failed: cost out of range");
        assert!(matches!(
            UserPersistenceError::duplicate_email("a@b.c"),
            UserPersistenceError::DuplicateEmail { .. }
        ));
    }
}
