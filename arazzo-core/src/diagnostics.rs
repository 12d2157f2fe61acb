use std::fmt;

/// What went wrong with one key of one object in the document tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    Missing,
    InvalidType {
        expected: &'static str,
        required: bool,
    },
    Extra,
    Reserved,
    Unique,
    /// A structurally well-formed value breaking a document rule.
    Invalid(String),
    Warning(String),
}

impl DiagnosticKind {
    pub fn name(&self) -> &'static str {
        match self {
            DiagnosticKind::Missing => "missing",
            DiagnosticKind::InvalidType { .. } => "invalidType",
            DiagnosticKind::Extra => "extra",
            DiagnosticKind::Reserved => "reserved",
            DiagnosticKind::Unique => "unique",
            DiagnosticKind::Invalid(_) => "invalid",
            DiagnosticKind::Warning(_) => "warning",
        }
    }

    /// Whether this diagnostic makes the document invalid.
    pub fn is_error(&self) -> bool {
        match self {
            DiagnosticKind::Missing
            | DiagnosticKind::Reserved
            | DiagnosticKind::Unique
            | DiagnosticKind::Invalid(_) => true,
            DiagnosticKind::InvalidType { required, .. } => *required,
            DiagnosticKind::Extra | DiagnosticKind::Warning(_) => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// Path of the owning object, e.g. `$.workflows[0].steps[1]`.
    pub location: String,
    /// Key inside the owning object; empty when the object itself is at fault.
    pub key: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, location: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            kind,
            location: location.into(),
            key: key.into(),
        }
    }

    pub fn path(&self) -> String {
        join_path(&self.location, &self.key)
    }

    pub fn is_error(&self) -> bool {
        self.kind.is_error()
    }
}

pub(crate) fn join_path(location: &str, key: &str) -> String {
    if key.is_empty() {
        location.to_string()
    } else if key.starts_with('[') {
        format!("{location}{key}")
    } else {
        format!("{location}.{key}")
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = self.path();
        match &self.kind {
            DiagnosticKind::Missing => write!(f, "attribute {path} is missing"),
            DiagnosticKind::InvalidType { expected, .. } => {
                write!(f, "attribute {path} is not of type `{expected}`")
            }
            DiagnosticKind::Extra => write!(f, "attribute {path} is unexpected"),
            DiagnosticKind::Unique => write!(f, "attribute {path} is repeated"),
            DiagnosticKind::Reserved => write!(f, "attribute {path} is reserved"),
            DiagnosticKind::Invalid(reason) => write!(f, "attribute {path} is invalid: {reason}"),
            DiagnosticKind::Warning(_) => write!(f, "{path}"),
        }
    }
}

/// Accumulates every problem found in one parse; never short-circuits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: DiagnosticKind, location: impl Into<String>, key: impl Into<String>) {
        self.items.push(Diagnostic::new(kind, location, key));
    }

    pub fn missing(&mut self, location: &str, key: &str) {
        self.push(DiagnosticKind::Missing, location, key);
    }

    pub fn invalid_type(&mut self, location: &str, key: &str, expected: &'static str, required: bool) {
        self.push(DiagnosticKind::InvalidType { expected, required }, location, key);
    }

    pub fn extra(&mut self, location: &str, key: &str) {
        self.push(DiagnosticKind::Extra, location, key);
    }

    pub fn reserved(&mut self, location: &str, key: &str) {
        self.push(DiagnosticKind::Reserved, location, key);
    }

    pub fn repeated(&mut self, location: &str, key: &str) {
        self.push(DiagnosticKind::Unique, location, key);
    }

    pub fn invalid(&mut self, location: &str, key: &str, reason: impl Into<String>) {
        self.push(DiagnosticKind::Invalid(reason.into()), location, key);
    }

    pub fn warning(&mut self, location: &str, key: &str, reason: impl Into<String>) {
        self.push(DiagnosticKind::Warning(reason.into()), location, key);
    }

    pub fn is_valid(&self) -> bool {
        !self.items.iter().any(Diagnostic::is_error)
    }

    pub fn error_count(&self) -> usize {
        self.items.iter().filter(|d| d.is_error()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.items.iter()
    }

    /// Diagnostics recorded at exactly `location.key`.
    pub fn at<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a Diagnostic> + 'a {
        self.items.iter().filter(move |d| d.path() == path)
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_follow_attribute_format() {
        let mut d = Diagnostics::new();
        d.missing("$.info", "title");
        d.invalid_type("$", "workflows", "array", true);
        d.extra("$.workflows[0]", "foo");
        d.repeated("$.workflows[1]", "workflowId");
        d.reserved("$", "x-oai-thing");
        d.warning("$.workflows[0].steps[0].parameters", "[0]", "unresolved reference");

        let rendered: Vec<String> = d.iter().map(|d| d.to_string()).collect();
        assert_eq!(
            rendered,
            vec![
                "attribute $.info.title is missing",
                "attribute $.workflows is not of type `array`",
                "attribute $.workflows[0].foo is unexpected",
                "attribute $.workflows[1].workflowId is repeated",
                "attribute $.x-oai-thing is reserved",
                "$.workflows[0].steps[0].parameters[0]",
            ]
        );
    }

    #[test]
    fn extras_and_warnings_keep_document_valid() {
        let mut d = Diagnostics::new();
        d.extra("$", "unknown");
        d.warning("$", "thing", "reason");
        d.invalid_type("$.info", "summary", "string", false);
        assert!(d.is_valid());

        d.missing("$.info", "title");
        assert!(!d.is_valid());
        assert_eq!(d.error_count(), 1);
    }
}
