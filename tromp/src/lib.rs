//! Untyped lambda calculus: parsing, capture-avoiding substitution,
//! leftmost-outermost beta reduction, and Tromp diagram layout.

pub mod eval;
pub mod layout;
pub mod parser;
pub mod subst;
pub mod term;

pub use eval::{beta_reduce_step, normalize, Normalized};
pub use layout::{layout, Scene};
pub use parser::{parse, ParseError, ParseErrorKind};
pub use subst::substitute;
pub use term::{alpha_rename, Term, TermRef};
