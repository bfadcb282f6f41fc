use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Reasons a foreign declaration or type could not be imported.
///
/// Every variant except the configuration errors is local to one
/// declaration: the caller skips that declaration and carries on with the
/// rest of the module.
#[derive(Debug, Error, Diagnostic, Clone, PartialEq, Eq)]
pub enum ImportError {
    /// A record or class is used by value but no definition is reachable.
    #[error("Incomplete type: `{name}` has no visible definition")]
    #[diagnostic(code(tandem_import::incomplete_type))]
    IncompleteType { name: String },

    /// A function type uses a calling convention the host cannot express.
    #[error("Unsupported calling convention `{convention}`")]
    #[diagnostic(code(tandem_import::unsupported_calling_convention))]
    UnsupportedCallingConvention { convention: String },

    /// A record contains a bit-field, whose layout the host cannot mirror.
    #[error("Unsupported layout: field `{field}` of `{record}` is a bit-field")]
    #[diagnostic(code(tandem_import::bit_field))]
    BitField { record: String, field: String },

    /// A type with no host equivalent (vectors, `_Complex`, 128-bit integers,
    /// dependent types, `void` in a value position, ...).
    #[error("Unsupported type: {description}")]
    #[diagnostic(code(tandem_import::unsupported_type))]
    UnsupportedType { description: String },

    /// The host standard library lacks a type the mapping requires.
    #[error("Missing standard library type `{name}`")]
    #[diagnostic(
        code(tandem_import::missing_standard_type),
        help("Is the host standard library loaded for this target?")
    )]
    MissingStandardType { name: String },

    /// Variadic C functions have no host spelling.
    #[error("Variadic function `{name}` cannot be imported")]
    #[diagnostic(code(tandem_import::variadic_function))]
    VariadicFunction { name: String },

    /// The declaration has no usable name.
    #[error("Declaration has no importable name")]
    #[diagnostic(code(tandem_import::unnamed_declaration))]
    UnnamedDeclaration,

    /// The declaration's context could not be imported.
    #[error("Context of `{name}` could not be imported")]
    #[diagnostic(code(tandem_import::missing_context))]
    MissingContext { name: String },

    /// The container imported but produced nothing for this member, as for
    /// the empty value of a flag set.
    #[error("`{name}` has no counterpart in the imported `{container}`")]
    #[diagnostic(code(tandem_import::member_not_imported))]
    MemberNotImported { name: String, container: String },

    /// A mapped typedef such as `BOOL` that only exists through its uses.
    #[error("`{name}` is not imported on its own")]
    #[diagnostic(code(tandem_import::not_standalone))]
    NotStandalone { name: String },

    #[error("Could not read importer configuration {path:?}: {message}")]
    #[diagnostic(code(tandem_import::config_read))]
    ConfigRead { path: PathBuf, message: String },

    #[error("Invalid importer configuration: {message}")]
    #[diagnostic(code(tandem_import::config_parse), help("Check the TOML syntax and option names"))]
    ConfigParse { message: String },
}

impl ImportError {
    pub(crate) fn unsupported(description: impl Into<String>) -> Self {
        ImportError::UnsupportedType { description: description.into() }
    }

    pub(crate) fn missing_standard_type(name: &str) -> Self {
        ImportError::MissingStandardType { name: name.to_string() }
    }
}

/// Result type for import operations.
pub type ImportResult<T> = Result<T, ImportError>;
