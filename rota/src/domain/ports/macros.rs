//! Generates the error enums returned by domain ports.
//!
//! Every variant carries a free-text `message` from the adapter. The macro
//! adds a snake_case constructor per variant plus a [`message`] accessor, so
//! adapters write `EmployeeRepositoryError::connection("timed out")`.
//!
//! [`message`]: #method.message

macro_rules! define_port_error {
    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident => $summary:literal
            ),+ $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error("{summary}: {message}", summary = $summary)]
                $variant { message: String },
            )+
        }

        impl $name {
            $(
                ::paste::paste! {
                    #[doc = concat!("Build a `", stringify!($variant), "` error.")]
                    pub fn [<$variant:snake>](message: impl Into<String>) -> Self {
                        Self::$variant {
                            message: message.into(),
                        }
                    }
                }
            )+

            /// Adapter detail without the variant summary.
            pub fn message(&self) -> &str {
                match self {
                    $( Self::$variant { message } => message.as_str(), )+
                }
            }
        }
    };
}

pub(crate) use define_port_error;
