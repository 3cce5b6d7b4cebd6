// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Declarative macros shared across the domain model to cut down on
//! boilerplate that would otherwise be hand-copied per type:
//!
//! - [`simple_display!`] maps enum variants to `Display` string literals.
//! - [`setters!`] emits fluent setter methods inside an existing `impl`.
//! - [`builder!`] wraps [`setters!`] with a standalone builder struct,
//!   `Default`, and a `build()` step — for test fixtures and other
//!   test-only construction helpers.

/// Maps enum variants onto `Display` string literals in one declaration
/// instead of a hand-written `match` per type.
#[macro_export]
macro_rules! simple_display {
    ($enum:ty { $( $variant:ident $(( $($ignore:tt)* ))? => $str:expr ),+ $(,)? }) => {
        impl std::fmt::Display for $enum {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(match self {
                    $( Self::$variant $(( $($ignore)* ))? => $str, )+
                })
            }
        }
    };
}

/// Emits fluent setter methods inside an existing `impl` block. Three field
/// groups are supported, matching how the field is meant to be assigned:
///
/// - `into { field: Type }` — setter takes `impl Into<Type>`.
/// - `set { field: Type }` — setter takes `Type` directly.
/// - `option { field: Type }` — the field is `Option<Type>`; the setter
///   takes a bare value and wraps it in `Some`.
#[macro_export]
macro_rules! setters {
    (
        $(into {
            $( $into_field:ident : $into_ty:ty ),* $(,)?
        })?
        $(set {
            $( $set_field:ident : $set_ty:ty ),* $(,)?
        })?
        $(option {
            $( $opt_field:ident : $opt_ty:ty ),* $(,)?
        })?
    ) => {
        $($(
            pub fn $into_field(mut self, v: impl Into<$into_ty>) -> Self {
                self.$into_field = v.into();
                self
            }
        )*)?

        $($(
            pub fn $set_field(mut self, v: $set_ty) -> Self {
                self.$set_field = v;
                self
            }
        )*)?

        $($(
            pub fn $opt_field(mut self, v: impl Into<$opt_ty>) -> Self {
                self.$opt_field = Some(v.into());
                self
            }
        )*)?
    };
}

/// Builds a throwaway builder struct for test fixtures: a struct holding
/// one field per group, a `Default` impl seeded from the group's default
/// expression, [`setters!`] for the assignable fields, and a `build()` that
/// assembles `$target`. Every generated item lives behind
/// `#[cfg(any(test, feature = "test-support"))]` since production code
/// should construct the target type directly rather than through a test
/// builder.
///
/// A fourth `computed` group covers fields with no builder slot at all —
/// their value is an expression evaluated at `build()` time, for fields
/// like a creation timestamp that a test fixture should never hand-pick.
#[macro_export]
macro_rules! builder {
    (
        pub struct $builder:ident => $target:ident {
            $(into {
                $( $into_field:ident : $into_ty:ty = $into_default:expr ),* $(,)?
            })?
            $(set {
                $( $set_field:ident : $set_ty:ty = $set_default:expr ),* $(,)?
            })?
            $(option {
                $( $opt_field:ident : $opt_ty:ty = $opt_default:expr ),* $(,)?
            })?
            $(computed {
                $( $comp_field:ident : $comp_ty:ty = $comp_expr:expr ),* $(,)?
            })?
        }
    ) => {
        #[cfg(any(test, feature = "test-support"))]
        pub struct $builder {
            $($( $into_field: $into_ty, )*)?
            $($( $set_field: $set_ty, )*)?
            $($( $opt_field: Option<$opt_ty>, )*)?
        }

        #[cfg(any(test, feature = "test-support"))]
        impl Default for $builder {
            fn default() -> Self {
                Self {
                    $($( $into_field: $into_default.into(), )*)?
                    $($( $set_field: $set_default, )*)?
                    $($( $opt_field: $opt_default, )*)?
                }
            }
        }

        #[cfg(any(test, feature = "test-support"))]
        impl $builder {
            $crate::setters! {
                $(into { $( $into_field : $into_ty ),* })?
                $(set { $( $set_field : $set_ty ),* })?
                $(option { $( $opt_field : $opt_ty ),* })?
            }

            pub fn build(self) -> $target {
                $target {
                    $($( $into_field: self.$into_field, )*)?
                    $($( $set_field: self.$set_field, )*)?
                    $($( $opt_field: self.$opt_field, )*)?
                    $($( $comp_field: $comp_expr, )*)?
                }
            }
        }

        #[cfg(any(test, feature = "test-support"))]
        impl $target {
            /// Starts a builder seeded with test defaults.
            pub fn builder() -> $builder {
                $builder::default()
            }
        }
    };
}
