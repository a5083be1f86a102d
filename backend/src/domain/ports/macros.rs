//! Helper macro generating store and hasher port error enums.
//!
//! Every port failure carries one text field: a driver message for
//! connection and query failures, or the index name for a duplicate key.
//! Each variant gets a `thiserror` message and a snake_case constructor that
//! accepts anything convertible into `String`.

macro_rules! define_port_error {
    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident { $field:ident } => $message:literal
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant { $field: String },
            )*
        }

        impl $name {
            $(
                ::paste::paste! {
                    #[doc = "Build [`" $name "::" $variant "`]."]
                    pub fn [<$variant:snake>]($field: impl Into<String>) -> Self {
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
    use rstest::rstest;

    define_port_error! {
        pub enum LedgerStoreError {
            Connection { message } => "ledger store connection failed: {message}",
            DuplicateKey { index } => "ledger store duplicate key on {index}",
        }
    }

    #[rstest]
    #[case(LedgerStoreError::duplicate_key("email"), "ledger store duplicate key on email")]
    #[case(
        LedgerStoreError::connection(String::from("refused")),
        "ledger store connection failed: refused"
    )]
    fn constructors_fill_the_message(#[case] err: LedgerStoreError, #[case] expected: &str) {
        assert_eq!(err.to_string(), expected);
    }

    #[rstest]
    fn constructors_build_the_named_variant() {
        assert_eq!(
            LedgerStoreError::duplicate_key("username"),
            LedgerStoreError::DuplicateKey {
                index: "username".into()
            }
        );
    }
}
