//! Raw (unresolved) syntax nodes handed to the binder by the SQL parser.

pub mod ast;
