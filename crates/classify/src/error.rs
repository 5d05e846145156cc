use thiserror::Error;

/// Errors raised while interpreting caller supplied classification hints.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassifyError {
    /// A `fields` entry that does not name an identifier kind.
    #[error("unknown search field: {0}")]
    UnknownField(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_field_message() {
        let err = ClassifyError::UnknownField("passport".into());
        assert_eq!(err.to_string(), "unknown search field: passport");
    }
}
