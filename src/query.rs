//! Path expressions locating values inside a transaction set
//!
//! Three shapes are understood:
//! - `BEG03`: element 3 of every BEG segment
//! - `REF02:REF01["IA"]`: element 2 of the REF segments whose REF01 is `IA`
//! - `N1-N401:N101["ST"]`: element 1 of the N4 segments inside an N1 loop whose N101 is `ST`.
//!   A loop runs from its anchor segment up to the next segment with the anchor's tag.
use super::error::PathError;
use super::x12::Segment;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementRef {
    pub tag: String,
    pub position: usize, // 1-based, as written in the expression
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Qualifier {
    pub element: ElementRef,
    pub literal: String,
}

/// A compiled path expression. Compile once with [`str::parse`], evaluate per transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathExpr {
    source: String,
    loop_anchor: Option<String>,
    target: ElementRef,
    qualifier: Option<Qualifier>,
}

impl ElementRef {
    fn parse(raw: &str) -> Result<Self, PathError> {
        let invalid = || PathError::InvalidElement(raw.to_string());
        if raw.len() < 3 || !raw.is_ascii() {
            return Err(invalid());
        }
        let (tag, digits) = raw.split_at(raw.len() - 2);
        if !is_segment_tag(tag) || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let position: usize = digits.parse().map_err(|_| invalid())?;
        if position == 0 {
            return Err(invalid());
        }

        Ok(Self {
            tag: tag.to_string(),
            position,
        })
    }

    fn read<'a>(&self, segment: &'a Segment) -> Option<&'a str> {
        (segment.tag == self.tag)
            .then(|| segment.element(self.position))
            .flatten()
    }
}

impl Qualifier {
    fn parse(raw: &str) -> Result<Self, PathError> {
        let invalid = || PathError::InvalidQualifier(raw.to_string());
        let (element, rest) = raw.split_once('[').ok_or_else(invalid)?;
        let literal = rest
            .strip_prefix('"')
            .and_then(|r| r.strip_suffix("\"]"))
            .ok_or_else(invalid)?;

        Ok(Self {
            element: ElementRef::parse(element.trim())?,
            literal: literal.to_string(),
        })
    }

    fn accepts(&self, segment: &Segment) -> bool {
        segment.tag != self.element.tag || self.element.read(segment) == Some(self.literal.as_str())
    }
}

fn is_segment_tag(tag: &str) -> bool {
    (2..=3).contains(&tag.len())
        && tag.starts_with(|c: char| c.is_ascii_uppercase())
        && tag
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}

impl PathExpr {
    /// A plain element reference such as `ST01`, without qualifier or loop.
    pub fn element(tag: &str, position: usize) -> Self {
        Self {
            source: format!("{tag}{position:02}"),
            loop_anchor: None,
            target: ElementRef {
                tag: tag.to_string(),
                position,
            },
            qualifier: None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Every value the expression locates in `segments`, in document order.
    pub fn evaluate(&self, segments: &[Segment]) -> Vec<String> {
        let accepts = |seg: &Segment| self.qualifier.as_ref().is_none_or(|q| q.accepts(seg));

        let Some(anchor) = self.loop_anchor.as_deref() else {
            return segments
                .iter()
                .filter(|seg| accepts(*seg))
                .filter_map(|seg| self.target.read(seg))
                .map(str::to_string)
                .collect();
        };

        let mut values = Vec::new();
        let mut in_loop = false;
        for seg in segments {
            if seg.tag == anchor {
                in_loop = accepts(seg);
            }
            if in_loop && accepts(seg) {
                if let Some(value) = self.target.read(seg) {
                    values.push(value.to_string());
                }
            }
        }
        values
    }
}

impl FromStr for PathExpr {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let source = s.trim();
        if source.is_empty() {
            return Err(PathError::Empty);
        }

        let (value, qualifier) = match source.split_once(':') {
            Some((value, qualifier)) => (value, Some(Qualifier::parse(qualifier.trim())?)),
            None => (source, None),
        };
        let (loop_anchor, target) = match value.split_once('-') {
            Some((anchor, target)) => {
                let anchor = anchor.trim();
                if !is_segment_tag(anchor) {
                    return Err(PathError::InvalidElement(anchor.to_string()));
                }
                (Some(anchor.to_string()), ElementRef::parse(target.trim())?)
            }
            None => (None, ElementRef::parse(value.trim())?),
        };

        if let Some(q) = &qualifier {
            let owner_ok = q.element.tag == target.tag
                || loop_anchor.as_deref() == Some(q.element.tag.as_str());
            if !owner_ok {
                return Err(PathError::QualifierMismatch {
                    path: source.to_string(),
                    qualifier: q.element.tag.clone(),
                });
            }
        }

        Ok(Self {
            source: source.to_string(),
            loop_anchor,
            target,
            qualifier,
        })
    }
}

impl fmt::Display for PathExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
