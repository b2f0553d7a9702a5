use crate::error_code::FailureKind;
use thiserror::Error;

/// Structured error context for better error handling and debugging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Field path or configuration key that caused the error
    /// (e.g., "provider.base_url", "chunks[2]")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., HTTP status, response body excerpt)
    pub details: Option<String>,
    /// Source of the error (e.g., "http_provider", "assembler")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            field_path: None,
            details: None,
            source: None,
        }
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Error type for speechgen.
///
/// Requests fail in exactly one of two ways: the provider side did not yield
/// audio (`Synthesis`) or the chunks could not be merged into an artifact
/// (`Assembly`). `Configuration` covers settings and client construction
/// before any request is made.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Synthesis failed [{kind}]: {message}{}", format_context(.context))]
    Synthesis {
        kind: FailureKind,
        message: String,
        context: ErrorContext,
    },

    #[error("Assembly failed: {message}{}", format_context(.context))]
    Assembly {
        message: String,
        context: ErrorContext,
    },

    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    pub fn synthesis(kind: FailureKind, msg: impl Into<String>) -> Self {
        Self::synthesis_with_context(kind, msg, ErrorContext::new())
    }

    pub fn synthesis_with_context(
        kind: FailureKind,
        msg: impl Into<String>,
        context: ErrorContext,
    ) -> Self {
        Error::Synthesis {
            kind,
            message: msg.into(),
            context,
        }
    }

    pub fn assembly(msg: impl Into<String>) -> Self {
        Self::assembly_with_context(msg, ErrorContext::new())
    }

    pub fn assembly_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Assembly {
            message: msg.into(),
            context,
        }
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::configuration_with_context(msg, ErrorContext::new())
    }

    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    /// The failure kind of a synthesis error.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Error::Synthesis { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    pub fn is_synthesis(&self) -> bool {
        matches!(self, Error::Synthesis { .. })
    }

    pub fn is_assembly(&self) -> bool {
        matches!(self, Error::Assembly { .. })
    }

    /// Short user-facing reason, without the structured context.
    pub fn reason(&self) -> &str {
        match self {
            Error::Synthesis { message, .. }
            | Error::Assembly { message, .. }
            | Error::Configuration { message, .. } => message,
        }
    }

    pub fn context(&self) -> &ErrorContext {
        match self {
            Error::Synthesis { context, .. }
            | Error::Assembly { context, .. }
            | Error::Configuration { context, .. } => context,
        }
    }
}
