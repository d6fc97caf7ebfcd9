/// A struct that represents an error with a context and possibly the propagated source error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextError {
    pub context: String,
    pub source_error: Option<String>,
}

impl std::fmt::Display for ContextError {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.source_error {
            Some(source_error) => write!(
                formatter,
                "{}: {}",
                self.context,
                minimize_first_letter(source_error.to_string()),
            ),
            None => write!(formatter, "{}", self.context),
        }
    }
}

impl std::error::Error for ContextError {}

impl ContextError {
    /// Create a new `ContextError` with the given context.
    pub fn with_context<S: Into<String>>(context: S) -> ContextError {
        ContextError {
            context: context.into(),
            source_error: None,
        }
    }

    /// Create a new `ContextError` with the given context and source error.
    pub fn with_error<S: Into<String>>(context: S, error: &dyn std::error::Error) -> ContextError {
        ContextError {
            context: context.into(),
            source_error: Some(error.to_string()),
        }
    }
}

/// The classified outcomes of loading a shared report. The report service answers a plain
/// 404 both for tokens it has never issued and for links whose record has been removed,
/// so the two cases are collapsed into `NotFoundOrExpired` on purpose.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportError {
    /// No usable token was provided, the service was never contacted.
    InvalidToken,
    /// The service could not be reached, answered with a non-success status or with a
    /// payload which could not be decoded into a report.
    NotFoundOrExpired(ContextError),
    /// The loader was asked to authenticate but no session token is stored.
    MissingSession,
}

impl std::fmt::Display for ReportError {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportError::InvalidToken => write!(formatter, "The report token is not valid"),
            ReportError::NotFoundOrExpired(cause) => {
                write!(formatter, "The report was not found or has expired ({cause})")
            }
            ReportError::MissingSession => {
                write!(formatter, "No session token is stored, log in first")
            }
        }
    }
}

impl std::error::Error for ReportError {}

/// Minimizes the first letter of a string, it is used for standardizing the error message.
fn minimize_first_letter(string: String) -> String {
    let mut characters = string.chars();
    match characters.next() {
        None => String::new(),
        Some(character) => character.to_lowercase().chain(characters).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_the_propagated_source() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "No such file");
        let error = ContextError::with_error("Failed to read the session file", &io_error);
        assert_eq!(
            error.to_string(),
            "Failed to read the session file: no such file"
        );
    }

    #[test]
    fn display_without_source_is_just_the_context() {
        let error = ContextError::with_context("Something went wrong");
        assert_eq!(error.to_string(), "Something went wrong");
    }
}
