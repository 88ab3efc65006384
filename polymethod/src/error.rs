//! Error types for class resolution, method registration and dispatch.
//!
//! Every failure in the crate surfaces as a [`PolyError`]. Compatibility
//! problems that must not block registration are reported separately as
//! [`CompatWarning`] values.

use std::fmt;

use thiserror::Error;

use crate::types::PrimitiveType;
use crate::value::Value;

/// Crate-wide error type.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PolyError {
    /// A signature element resolves to neither a class, a union, nor a known name.
    #[error("InvalidSignature: {0}")]
    InvalidSignature(String),

    /// More than one built-in class is associated with a primitive constructor.
    #[error("AmbiguousConstructor: {constructor} is the constructor of {}", .candidates.join(", "))]
    AmbiguousConstructor {
        constructor: PrimitiveType,
        candidates: Vec<String>,
    },

    /// No built-in class is associated with a primitive constructor.
    #[error("UnknownConstructor: no built-in class is constructed by {0}")]
    UnknownConstructor(PrimitiveType),

    /// Registration or lookup signature length differs from the dispatch arity.
    #[error("SignatureLengthMismatch: expected {expected} class(es), got {got}")]
    SignatureLengthMismatch { expected: usize, got: usize },

    /// A generic definition is malformed.
    #[error("InvalidDispatchArgs: {0}")]
    InvalidDispatchArgs(DispatchArgsRule),

    /// A method implementation cannot be registered on a generic.
    #[error("IncompatibleMethod: method for `{generic}` {reason}")]
    IncompatibleMethod {
        generic: String,
        reason: IncompatibleReason,
    },

    /// An identical signature is already registered and duplicates are refused.
    #[error("DuplicateMethod: `{generic}` already has a method for ({})", .signature.join(", "))]
    DuplicateMethod {
        generic: String,
        signature: Vec<String>,
    },

    /// Dispatch exhausted every ancestor chain and the legacy fallback.
    #[error(
        "NoApplicableMethod: can't find method for generic `{generic}({})` with classes ({}); tried {}",
        .dispatch_args.join(", "),
        .classes.join(", "),
        format_tried(.tried)
    )]
    NoApplicableMethod {
        generic: String,
        dispatch_args: Vec<String>,
        classes: Vec<String>,
        tried: Vec<Vec<String>>,
    },

    /// The ancestor graph violated its acyclic/terminating invariant.
    #[error("ResolutionError: {0}")]
    ResolutionError(String),

    /// Property is not declared on the instance's class.
    #[error("PropertyError: <{class}> has no property `{property}`")]
    PropertyNotFound { class: String, property: String },

    /// Property has a getter but no setter.
    #[error("PropertyError: can't set read-only property <{class}>@{property}")]
    ReadOnlyProperty { class: String, property: String },

    /// A value does not belong to the declared class of a property.
    #[error("PropertyError: <{class}>@{property} must be {expected}, not {actual}")]
    InvalidPropertyValue {
        class: String,
        property: String,
        expected: String,
        actual: String,
    },

    /// Instance validation reported one or more problems.
    #[error("ValidationError: <{class}> object is invalid:\n{}", .problems.iter().map(|p| format!("- {}", p)).collect::<Vec<_>>().join("\n"))]
    ValidationFailed { class: String, problems: Vec<String> },

    /// Attempted to construct an abstract class.
    #[error("AbstractClass: can't construct an object from abstract class <{0}>")]
    AbstractClass(String),

    /// Class definition is malformed.
    #[error("InvalidClass: {0}")]
    InvalidClass(String),

    /// Configuration could not be read or parsed.
    #[error("ConfigError: {0}")]
    Config(String),

    /// Error raised by a method body.
    #[error("{0}")]
    Custom(String),
}

fn format_tried(tried: &[Vec<String>]) -> String {
    tried
        .iter()
        .map(|chain| format!("[{}]", chain.join(", ")))
        .collect::<Vec<_>>()
        .join(" x ")
}

impl PolyError {
    /// Create an invalid signature error
    pub fn invalid_signature<S: Into<String>>(msg: S) -> Self {
        PolyError::InvalidSignature(msg.into())
    }

    /// Create a resolution error
    pub fn resolution<S: Into<String>>(msg: S) -> Self {
        PolyError::ResolutionError(msg.into())
    }

    /// Create an invalid class error
    pub fn invalid_class<S: Into<String>>(msg: S) -> Self {
        PolyError::InvalidClass(msg.into())
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        PolyError::Config(msg.into())
    }

    /// Create a custom error, typically from inside a method body
    pub fn custom<S: Into<String>>(msg: S) -> Self {
        PolyError::Custom(msg.into())
    }

    /// Create an incompatible method error
    pub fn incompatible<S: Into<String>>(generic: S, reason: IncompatibleReason) -> Self {
        PolyError::IncompatibleMethod {
            generic: generic.into(),
            reason,
        }
    }
}

/// Result type alias for fallible operations in this crate.
pub type PolyResult<T> = Result<T, PolyError>;

/// The specific rule a generic's dispatch argument list violates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchArgsRule {
    /// No dispatch arguments were given.
    Empty,
    /// An entry is empty or only whitespace.
    BlankEntry,
    /// The variadic marker itself was listed as a dispatch argument.
    ContainsVariadic,
    /// The same name appears more than once.
    Duplicate(String),
    /// The variadic marker is present but does not directly follow the dispatch arguments.
    VariadicNotFollowing,
    /// The dispatch arguments are not the leading parameters of the generic.
    NotPrefix,
}

impl fmt::Display for DispatchArgsRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchArgsRule::Empty => write!(f, "`dispatch_args` must have at least one element"),
            DispatchArgsRule::BlankEntry => {
                write!(f, "`dispatch_args` must not contain missing or empty entries")
            }
            DispatchArgsRule::ContainsVariadic => write!(f, "`dispatch_args` can't contain `...`"),
            DispatchArgsRule::Duplicate(name) => {
                write!(f, "`dispatch_args` must be unique (`{}` is repeated)", name)
            }
            DispatchArgsRule::VariadicNotFollowing => write!(
                f,
                "`...` must immediately follow the last dispatch argument"
            ),
            DispatchArgsRule::NotPrefix => write!(
                f,
                "`dispatch_args` must be a prefix of the generic's parameters"
            ),
        }
    }
}

/// Fatal reasons a method cannot be attached to a generic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncompatibleReason {
    /// The method's parameters do not start with the generic's dispatch arguments.
    MissingDispatchPrefix {
        expected: Vec<String>,
        found: Vec<String>,
    },
    /// A dispatch parameter of the method declares a default value.
    DispatchArgHasDefault(String),
    /// The method's `...` is not directly after the dispatch parameters.
    VariadicNotFollowing,
}

impl fmt::Display for IncompatibleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IncompatibleReason::MissingDispatchPrefix { expected, found } => write!(
                f,
                "must start with arguments ({}), found ({})",
                expected.join(", "),
                found.join(", ")
            ),
            IncompatibleReason::DispatchArgHasDefault(name) => {
                write!(f, "must not give dispatch argument `{}` a default value", name)
            }
            IncompatibleReason::VariadicNotFollowing => {
                write!(f, "must place `...` immediately after the dispatch arguments")
            }
        }
    }
}

/// Non-fatal divergence between a method and its generic.
#[derive(Debug, Clone, PartialEq)]
pub enum CompatWarning {
    /// The generic declares a parameter the method lacks.
    MissingParam(String),
    /// Both declare the parameter, with different defaults.
    DifferingDefault {
        param: String,
        generic: Option<Value>,
        method: Option<Value>,
    },
}

impl fmt::Display for CompatWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompatWarning::MissingParam(name) => {
                write!(f, "method lacks argument `{}` declared by the generic", name)
            }
            CompatWarning::DifferingDefault {
                param,
                generic,
                method,
            } => write!(
                f,
                "default value for `{}` differs: generic has {}, method has {}",
                param,
                describe_default(generic),
                describe_default(method)
            ),
        }
    }
}

fn describe_default(value: &Option<Value>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "no default".to_string(),
    }
}
