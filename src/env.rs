//! `$NAME` indirection.

use std::borrow::Cow;

use crate::DefaultsErrorKind;

/// Name → value lookup used to resolve `$NAME` literals.
///
/// Implemented for [`ProcessEnvironment`] and for any `Fn(&str) -> Option<String>`,
/// so tests can inject a closure instead of touching process state.
pub trait Environment {
    /// Returns the variable's value, or `None` when it is unset.
    fn lookup(&self, name: &str) -> Option<String>;
}

/// Reads variables with [`std::env::var`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
    fn lookup(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl<F> Environment for F
where
    F: Fn(&str) -> Option<String>,
{
    fn lookup(&self, name: &str) -> Option<String> {
        self(name)
    }
}

/// What an unset `$NAME` resolves to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MissingEnv {
    /// Substitute the empty string and let coercion decide.
    #[default]
    Empty,
    /// Fail with [`DefaultsErrorKind::MissingEnvironment`].
    Error,
}

/// Replaces a `$NAME` literal with the variable's value.
pub(crate) fn resolve<'a>(
    literal: &'a str,
    env: &dyn Environment,
    policy: MissingEnv,
) -> Result<Cow<'a, str>, DefaultsErrorKind> {
    let Some(name) = literal.strip_prefix('$') else {
        return Ok(Cow::Borrowed(literal));
    };
    match (env.lookup(name), policy) {
        (Some(value), _) => {
            log::trace!("Resolved ${name} to {value:?}");
            Ok(Cow::Owned(value))
        }
        (None, MissingEnv::Empty) => {
            log::trace!("${name} is unset, using the empty literal");
            Ok(Cow::Borrowed(""))
        }
        (None, MissingEnv::Error) => Err(DefaultsErrorKind::MissingEnvironment(name.to_string())),
    }
}
