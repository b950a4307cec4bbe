//! Path parameter storage and the segment-based URI template matcher.
//!
//! [`Params`] uses a small-vector optimization to avoid heap allocations for
//! the common case of 1-4 captured variables. [`UriTemplate`] implements the
//! matching contract the dispatch layer consumes: `match(path)` yields the
//! captured variables or nothing.

use smallvec::SmallVec;
use thiserror::Error;

/// Maximum number of parameters stored inline (stack allocated).
const INLINE_PARAMS: usize = 4;

/// Captured path parameters from a template match.
///
/// # Example
///
/// ```rust
/// use hermes_router::Params;
///
/// let mut params = Params::new();
/// params.push("userId", "123");
///
/// assert_eq!(params.get("userId"), Some("123"));
/// assert_eq!(params.get("unknown"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Params {
    inner: SmallVec<[(String, String); INLINE_PARAMS]>,
}

impl Params {
    /// Creates a new empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a parameter to the set.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.inner.push((name.into(), value.into()));
    }

    /// Returns the value for a parameter by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns true if there are no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns an iterator over the parameters.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for Params {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}

/// A template parse failure.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    /// A `{variable}` segment was not closed or was empty.
    #[error("malformed variable segment in template: {0}")]
    MalformedVariable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Variable(String),
}

/// A parsed URI path template with `{variable}` capture segments.
///
/// # Example
///
/// ```rust
/// use hermes_router::UriTemplate;
///
/// let template = UriTemplate::parse("/users/{userId}/files/{fileId}").unwrap();
/// let params = template.match_path("/users/7/files/readme").unwrap();
///
/// assert_eq!(params.get("userId"), Some("7"));
/// assert_eq!(params.get("fileId"), Some("readme"));
/// assert!(template.match_path("/users/7").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl UriTemplate {
    /// Parses a path template.
    pub fn parse(template: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        for part in template.split('/').filter(|p| !p.is_empty()) {
            if let Some(rest) = part.strip_prefix('{') {
                let Some(name) = rest.strip_suffix('}') else {
                    return Err(TemplateError::MalformedVariable(part.to_string()));
                };
                if name.is_empty() {
                    return Err(TemplateError::MalformedVariable(part.to_string()));
                }
                segments.push(Segment::Variable(name.to_string()));
            } else {
                segments.push(Segment::Literal(part.to_string()));
            }
        }
        Ok(Self {
            raw: template.to_string(),
            segments,
        })
    }

    /// Returns the raw template string.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Returns the declared variable names in order.
    #[must_use]
    pub fn variable_names(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Variable(name) => Some(name.as_str()),
                Segment::Literal(_) => None,
            })
            .collect()
    }

    /// Matches a request path, returning the captured variables on success.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<Params> {
        let parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();
        if parts.len() != self.segments.len() {
            return None;
        }
        let mut params = Params::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(literal) => {
                    if literal != part {
                        return None;
                    }
                }
                Segment::Variable(name) => params.push(name.clone(), part),
            }
        }
        Some(params)
    }

    /// Compares template specificity: more literal segments first, then more
    /// segments overall. Used to order overlapping routes.
    #[must_use]
    pub fn compare_specificity(&self, other: &Self) -> std::cmp::Ordering {
        let literals = |t: &Self| {
            t.segments
                .iter()
                .filter(|s| matches!(s, Segment::Literal(_)))
                .count()
        };
        literals(other)
            .cmp(&literals(self))
            .then(other.segments.len().cmp(&self.segments.len()))
    }
}
