/// Violations of the link-label grammar.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LabelError {
    #[error("link label is empty")]
    Empty,
    #[error("link label `{0}` starts with a digit")]
    LeadingDigit(String),
    #[error("link label `{label}` contains invalid character {ch:?}")]
    InvalidCharacter { label: String, ch: char },
    #[error("link label `{0}` has an empty namespace segment")]
    EmptyNamespace(String),
    #[error("link label `{0}` is ambiguous around the namespace separator")]
    AmbiguousSeparator(String),
}

/// Violations of the attribute/extra key grammar.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    #[error("key is empty")]
    Empty,
    #[error("key `{0}` contains the reserved separator `.`")]
    ReservedSeparator(String),
}

/// Errors when parsing a content hash from hex.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContentHashError {
    #[error("invalid hex length: {0} (expected 64)")]
    InvalidLength(usize),
    #[error("invalid hex character")]
    InvalidHex,
}

/// Errors when parsing enumerated type tags from strings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("unknown link type: {0}")]
    UnknownLinkType(String),
    #[error("unknown node type: {0}")]
    UnknownNodeType(String),
}
