//! Hindley-Milner type inference for the Gala transpiler.
//!
//! The transformer leans on this crate to fill in the unknowns the
//! surface syntax leaves open: lambda parameter types reconstructed from
//! an expected function type, `if`-expression result types, and the
//! unified result type across `match` arms. Declared types always win --
//! inference is never the authority on something the programmer wrote.
//!
//! # Architecture
//!
//! - [`ty`]: the inference-internal type language (`Ty`, `TyVar`,
//!   `Scheme`) and conversions to and from the semantic [`Type`] model
//! - [`unify`]: the `ena`-backed unification engine with occurs check
//!   and scheme instantiation
//! - [`env`]: scope-stacked environment of name -> scheme bindings
//! - [`infer`]: the expression walker, with a manual fast path for
//!   locally-determinable types
//!
//! [`Type`]: gala_syntax::Type

pub mod env;
pub mod infer;
pub mod ty;
pub mod unify;

pub use env::TypeEnv;
pub use infer::{InferError, Inferer};
pub use ty::{Scheme, Ty, TyVar};
pub use unify::InferCtx;
