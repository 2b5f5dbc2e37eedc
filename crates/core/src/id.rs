//! Strongly-typed identifiers used across the domain.
//!
//! Identifiers here are intentionally opaque strings: a principal id is a
//! username, a role is a name, a resource is a path pattern, an action is an
//! HTTP method. Interpreting them (matching, closure, ...) belongs to the
//! policy layer.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

macro_rules! impl_str_newtype {
    ($t:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $t(Cow<'static, str>);

        impl $t {
            pub fn new(value: impl Into<Cow<'static, str>>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $t {
            fn from(value: String) -> Self {
                Self(Cow::Owned(value))
            }
        }

        impl From<&str> for $t {
            fn from(value: &str) -> Self {
                Self(Cow::Owned(value.to_string()))
            }
        }
    };
}

impl_str_newtype!(PrincipalId);
impl_str_newtype!(Role);
impl_str_newtype!(ResourcePattern);
impl_str_newtype!(Action);
