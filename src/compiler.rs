//! The pluggable query compiler.
//!
//! `q` handed to [`Driver::query`](crate::pool::Driver::query) may be a plain
//! string or any type exposing a `compile_query()`. [`Compiler::compile`] is
//! always given the chance to transform that text before it reaches the
//! backend; the default just passes it through.

/// Anything that can produce its own canonical SQL text.
///
/// Implemented for `str` and `String` out of the box. A query-builder type
/// from an external crate implements this directly instead of requiring a
/// blanket conversion, which keeps this trait's impls coherence-safe (see the
/// `&Q` impl below, mirrored after `sqlx_core::execute::Execute`).
pub trait Query: Send + Sync {
    fn compile_query(&self) -> String;
}

impl Query for str {
    fn compile_query(&self) -> String {
        self.to_owned()
    }
}

impl Query for String {
    fn compile_query(&self) -> String {
        self.clone()
    }
}

impl<Q: Query + ?Sized> Query for &Q {
    fn compile_query(&self) -> String {
        (**self).compile_query()
    }
}

/// A pluggable compiler turning a [`Query`] into final SQL text.
///
/// This is an external collaborator in the distilled spec (the "xql" SQL
/// builder library lives outside this crate); only the identity compiler is
/// implemented here.
pub trait Compiler: Send + Sync {
    fn compile(&self, query: &dyn Query) -> String;
}

/// `compile(q) -> String(q)`. The default compiler.
#[derive(Debug, Default)]
pub struct IdentityCompiler;

impl Compiler for IdentityCompiler {
    fn compile(&self, query: &dyn Query) -> String {
        query.compile_query()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_compiler_passes_strings_through() {
        let compiler = IdentityCompiler;
        assert_eq!(compiler.compile(&"SELECT 1"), "SELECT 1");
        assert_eq!(compiler.compile(&String::from("SELECT 2")), "SELECT 2");
    }
}
