//! Error types for the editor core.

use miette::Diagnostic;

/// Main error type for editor operations.
#[derive(thiserror::Error, Debug, Diagnostic)]
pub enum EditorError {
    /// A URL or markup fragment was rejected.
    #[error(transparent)]
    #[diagnostic_source]
    Sanitize(#[from] SanitizeError),

    /// Command name not recognized by the dispatcher.
    #[error("unknown command: {0}")]
    #[diagnostic(code(editor::unknown_command))]
    UnknownCommand(String),

    /// Command requires an argument that wasn't supplied.
    #[error("command `{command}` requires an argument")]
    #[diagnostic(code(editor::missing_argument))]
    MissingArgument { command: String },

    /// `formatBlock` argument isn't a block we know how to produce.
    #[error("unsupported block format: {0}")]
    #[diagnostic(
        code(editor::block_format),
        help("use one of p, h1-h6, div, pre or blockquote")
    )]
    UnsupportedBlockFormat(String),

    #[error("selection offset {offset} is past the end of the document (length {len})")]
    #[diagnostic(code(editor::selection))]
    SelectionOutOfBounds { offset: usize, len: usize },
}

/// Why a URL was refused.
#[derive(thiserror::Error, Debug, Diagnostic, PartialEq, Eq)]
pub enum SanitizeError {
    #[error("URL is empty")]
    #[diagnostic(code(editor::sanitize::empty))]
    Empty,

    #[error("URL scheme `{0}` is not allowed")]
    #[diagnostic(
        code(editor::sanitize::scheme),
        help("allowed schemes are configured in the sanitize policy")
    )]
    DisallowedScheme(String),

    #[error("relative URLs are not allowed")]
    #[diagnostic(code(editor::sanitize::relative))]
    RelativeNotAllowed,

    #[error("malformed URL: {0}")]
    #[diagnostic(code(editor::sanitize::malformed))]
    Malformed(#[from] url::ParseError),

    #[error("URL has no host")]
    #[diagnostic(code(editor::sanitize::host))]
    MissingHost,
}
