use std::cmp::Ordering;
use std::fmt;

use super::RouteTableError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Param(String),
    /// Trailing `*`, matches zero or more remaining segments
    Wildcard,
}

impl Segment {
    fn rank(&self) -> u8 {
        match self {
            Segment::Literal(_) => 2,
            Segment::Param(_) => 1,
            Segment::Wildcard => 0,
        }
    }
}

/// Parsed path pattern such as `/api/tasks/:id/move` or `/api/pdf-tools/*`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    pub fn parse(raw: &str) -> Result<Self, RouteTableError> {
        if !raw.starts_with('/') {
            return Err(RouteTableError::InvalidPattern {
                pattern: raw.to_string(),
                reason: "must start with '/'",
            });
        }

        let parts: Vec<&str> = split_path(raw).collect();
        let mut segments = Vec::with_capacity(parts.len());

        for (i, part) in parts.iter().enumerate() {
            let segment = if *part == "*" {
                if i + 1 != parts.len() {
                    return Err(RouteTableError::InvalidPattern {
                        pattern: raw.to_string(),
                        reason: "'*' is only allowed as the last segment",
                    });
                }
                Segment::Wildcard
            } else if let Some(name) = part.strip_prefix(':') {
                if name.is_empty() {
                    return Err(RouteTableError::InvalidPattern {
                        pattern: raw.to_string(),
                        reason: "parameter segment needs a name",
                    });
                }
                Segment::Param(name.to_string())
            } else {
                Segment::Literal(part.to_string())
            };
            segments.push(segment);
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn matches(&self, path: &str) -> bool {
        let mut parts = split_path(path);

        for segment in &self.segments {
            match segment {
                Segment::Wildcard => return true,
                Segment::Literal(lit) => match parts.next() {
                    Some(part) if part == lit => {}
                    _ => return false,
                },
                Segment::Param(_) => {
                    if parts.next().is_none() {
                        return false;
                    }
                }
            }
        }

        parts.next().is_none()
    }

    /// Segment-by-segment specificity: literal > param > wildcard.
    pub fn specificity(&self, other: &PathPattern) -> Ordering {
        let ours = self.segments.iter().map(Segment::rank);
        let theirs = other.segments.iter().map(Segment::rank);
        ours.cmp(theirs)
    }

    /// True when some concrete path matches both patterns.
    pub fn overlaps(&self, other: &PathPattern) -> bool {
        overlap(&self.segments, &other.segments)
    }
}

fn overlap(a: &[Segment], b: &[Segment]) -> bool {
    match (a.first(), b.first()) {
        (None, None) => true,
        (Some(Segment::Wildcard), _) | (_, Some(Segment::Wildcard)) => true,
        (None, Some(_)) | (Some(_), None) => false,
        (Some(Segment::Literal(x)), Some(Segment::Literal(y))) => x == y && overlap(&a[1..], &b[1..]),
        (Some(_), Some(_)) => overlap(&a[1..], &b[1..]),
    }
}

/// Non-empty path segments; repeated and trailing slashes are ignored
pub(crate) fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// `.` or `..`, in any mix of literal and percent-encoded dots
pub(crate) fn is_dot_segment(segment: &str) -> bool {
    let decoded = segment.to_ascii_lowercase().replace("%2e", ".");
    decoded == "." || decoded == ".."
}

/// Collapse empty segments into a canonical `/a/b` path.
///
/// Returns `None` for paths with dot segments; the upstream URL parser would
/// resolve them to a path the route table never matched.
pub(crate) fn normalize_path(path: &str) -> Option<String> {
    let mut normalized = String::with_capacity(path.len());
    for segment in split_path(path) {
        if is_dot_segment(segment) {
            return None;
        }
        normalized.push('/');
        normalized.push_str(segment);
    }

    if normalized.is_empty() {
        normalized.push('/');
    }
    Some(normalized)
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
