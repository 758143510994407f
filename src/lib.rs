#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

use std::{
    error::Error,
    fmt::{self, Display},
};

use facet_core::Facet;
use facet_reflect::ReflectError;

mod annotation;
mod coerce;
mod composite;
mod descriptor;
mod env;
mod walk;

pub use annotation::{ANNOTATION_KEY, DISABLED_SENTINEL, DefaultSpec};
pub use coerce::{parse_bool, parse_char, parse_float32, parse_float64, parse_signed, parse_unsigned};
pub use composite::{split_mapping, split_sequence, unquote};
pub use descriptor::{FieldDescriptor, TypeShape, describe};
pub use env::{Environment, MissingEnv, ProcessEnvironment};

use walk::Walker;

/// Error returned when defaults could not be applied to a record.
#[derive(Debug)]
pub struct DefaultsError {
    field: String,
    literal: Option<String>,
    kind: DefaultsErrorKind,
}

impl DefaultsError {
    pub(crate) fn new(
        field: impl Into<String>,
        literal: Option<&str>,
        kind: DefaultsErrorKind,
    ) -> Self {
        Self {
            field: field.into(),
            literal: literal.map(str::to_string),
            kind,
        }
    }

    /// Dotted path of the offending field, relative to the top-level record.
    ///
    /// Empty when the error concerns the top-level value itself.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// The literal that failed, after `$NAME` substitution, if one was involved.
    pub fn literal(&self) -> Option<&str> {
        self.literal.as_deref()
    }

    /// Returns a reference to the error kind for detailed error inspection.
    pub fn kind(&self) -> &DefaultsErrorKind {
        &self.kind
    }
}

impl Display for DefaultsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.field.is_empty() {
            write!(f, "{}", self.kind)?;
        } else {
            write!(f, "field '{}': {}", self.field, self.kind)?;
        }
        if let Some(literal) = &self.literal {
            write!(f, " (literal {literal:?})")?;
        }
        Ok(())
    }
}

impl Error for DefaultsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.kind {
            DefaultsErrorKind::Reflect(reflect_error) => Some(reflect_error),
            _ => None,
        }
    }
}

/// Detailed classification of default-resolution errors.
#[derive(Debug)]
#[non_exhaustive]
pub enum DefaultsErrorKind {
    /// The literal does not match the grammar of the field's type.
    UnparsableLiteral(String),
    /// A numeric literal does not fit the target bit-width.
    Overflow {
        /// Bit-width of the target type.
        bits: u32,
    },
    /// The field's type has no default-handling rule.
    UnsupportedTypeShape(String),
    /// Bracket or quote mismatch, or a mapping entry without a `:`.
    MalformedComposite(String),
    /// A fixed-size sequence literal carries more elements than the array holds.
    TooManyElements {
        /// Length of the target array.
        expected: usize,
        /// Number of elements in the literal.
        found: usize,
    },
    /// The `default_value` annotation itself could not be read.
    MalformedAnnotation(String),
    /// `$NAME` referenced an unset variable under [`MissingEnv::Error`].
    MissingEnvironment(String),
    /// Records nest deeper than the configured limit.
    DepthExceeded(usize),
    /// The top-level value is not a struct.
    NotARecord(String),
    /// Error from the reflection system while staging a value.
    Reflect(ReflectError),
}

impl Display for DefaultsErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultsErrorKind::UnparsableLiteral(expected) => {
                write!(f, "unparsable literal, expected {expected}")
            }
            DefaultsErrorKind::Overflow { bits } => {
                write!(f, "value overflows the {bits}-bit target")
            }
            DefaultsErrorKind::UnsupportedTypeShape(shape) => {
                write!(f, "no default rule for type {shape}")
            }
            DefaultsErrorKind::MalformedComposite(msg) => {
                write!(f, "malformed composite literal: {msg}")
            }
            DefaultsErrorKind::TooManyElements { expected, found } => {
                write!(
                    f,
                    "sequence literal has {found} elements but the array holds {expected}"
                )
            }
            DefaultsErrorKind::MalformedAnnotation(msg) => {
                write!(f, "malformed `{ANNOTATION_KEY}` annotation: {msg}")
            }
            DefaultsErrorKind::MissingEnvironment(name) => {
                write!(f, "environment variable '{name}' is not set")
            }
            DefaultsErrorKind::DepthExceeded(limit) => {
                write!(f, "records nest deeper than {limit} levels")
            }
            DefaultsErrorKind::NotARecord(shape) => {
                write!(f, "expected a struct, got {shape}")
            }
            DefaultsErrorKind::Reflect(reflect_error) => write!(f, "{reflect_error}"),
        }
    }
}

impl From<ReflectError> for DefaultsErrorKind {
    fn from(value: ReflectError) -> Self {
        Self::Reflect(value)
    }
}

type Result<T> = std::result::Result<T, DefaultsError>;

/// Nesting limit used unless [`Defaults::max_depth`] says otherwise.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Configurable entry point for applying defaults.
///
/// ```rust
/// use facet::Facet;
/// use facet_defaults::{Defaults, MissingEnv};
///
/// #[derive(Facet)]
/// struct Server {
///     #[facet(default_value = "$PORT")]
///     port: u16,
/// }
///
/// let env = |name: &str| (name == "PORT").then(|| "8080".to_string());
/// let mut server = Server { port: 0 };
/// Defaults::new()
///     .with_environment(env)
///     .missing_env(MissingEnv::Error)
///     .apply(&mut server)?;
/// assert_eq!(server.port, 8080);
/// # Ok::<(), facet_defaults::DefaultsError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Defaults<E = ProcessEnvironment> {
    env: E,
    missing_env: MissingEnv,
    max_depth: usize,
}

impl Defaults {
    /// Reads `$NAME` from the process environment; unset variables resolve to `""`.
    pub fn new() -> Self {
        Self {
            env: ProcessEnvironment,
            missing_env: MissingEnv::default(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Default for Defaults {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Environment> Defaults<E> {
    /// Resolve `$NAME` indirections through `env` instead.
    pub fn with_environment<F: Environment>(self, env: F) -> Defaults<F> {
        Defaults {
            env,
            missing_env: self.missing_env,
            max_depth: self.max_depth,
        }
    }

    /// Set what happens when `$NAME` names an unset variable.
    pub fn missing_env(mut self, policy: MissingEnv) -> Self {
        self.missing_env = policy;
        self
    }

    /// Limit how many records deep the walk may go.
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Fill every zero-valued field of `value` that declares a default.
    ///
    /// Fields already holding a non-zero value are never touched. On error,
    /// fields filled before the failing one keep their new values.
    pub fn apply<T: Facet<'static>>(&self, value: &mut T) -> Result<()> {
        log::trace!("Applying defaults to {}", T::SHAPE);
        let mut walker = Walker::new(&self.env, self.missing_env, self.max_depth);
        // SAFETY: `value` is an exclusive borrow of a live `T`, described by `T::SHAPE`.
        unsafe { walker.walk_record((value as *mut T).cast::<u8>(), T::SHAPE) }
    }
}

/// Fill every zero-valued field of `value` from its `#[facet(default_value = "...")]`
/// annotation, recursing into nested records.
///
/// `$NAME` literals are read from the process environment.
///
/// ```rust
/// use facet::Facet;
///
/// #[derive(Facet, Default)]
/// struct Settings {
///     #[facet(default_value = "0x1f")]
///     mask: u32,
///     #[facet(default_value = "[\"a\", \"b\"]")]
///     names: Vec<String>,
/// }
///
/// let mut settings = Settings::default();
/// facet_defaults::apply_defaults(&mut settings)?;
/// assert_eq!(settings.mask, 31);
/// assert_eq!(settings.names, ["a", "b"]);
/// # Ok::<(), facet_defaults::DefaultsError>(())
/// ```
pub fn apply_defaults<T: Facet<'static>>(value: &mut T) -> Result<()> {
    Defaults::new().apply(value)
}
