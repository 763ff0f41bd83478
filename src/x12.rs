//! Interchange envelope model and the default X12 tokenizer
//!
//! The tokenizer only understands the ISA/GS/ST envelope structure. It reads the delimiters from
//! the ISA header and groups segments into functional groups and transaction sets; it does not
//! check segments against the X12 grammar.
use super::error::ParseError;
use super::query::PathExpr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub tag: String,
    pub elements: Vec<String>, // elements[0] is SEG01
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub segments: Vec<Segment>, // ST through SE inclusive
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionalGroup {
    pub header: Segment,
    pub transactions: Vec<Transaction>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interchange {
    pub header: Segment,
    pub groups: Vec<FunctionalGroup>,
}

/// A value located by [`Interchange::query`], with its position in the envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryMatch {
    pub group: usize,
    pub transaction: usize,
    pub value: String,
}

/// Turns raw document bytes into an [`Interchange`].
pub trait DocumentParser: Send + Sync {
    fn parse(&self, raw: &[u8]) -> Result<Interchange, ParseError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct X12Parser;

impl Segment {
    /// Element at a 1-based X12 position, `None` when absent or blank.
    pub fn element(&self, position: usize) -> Option<&str> {
        position
            .checked_sub(1)
            .and_then(|idx| self.elements.get(idx))
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }
}

impl Transaction {
    pub fn query(&self, path: &PathExpr) -> Vec<String> {
        path.evaluate(&self.segments)
    }
}

impl Interchange {
    pub fn transactions(&self) -> impl Iterator<Item = (usize, usize, &Transaction)> {
        self.groups.iter().enumerate().flat_map(|(g, group)| {
            group
                .transactions
                .iter()
                .enumerate()
                .map(move |(t, transaction)| (g, t, transaction))
        })
    }

    pub fn transaction_count(&self) -> usize {
        self.groups.iter().map(|g| g.transactions.len()).sum()
    }

    pub fn query(&self, path: &PathExpr) -> Vec<QueryMatch> {
        self.transactions()
            .flat_map(|(group, transaction, txn)| {
                txn.query(path).into_iter().map(move |value| QueryMatch {
                    group,
                    transaction,
                    value,
                })
            })
            .collect()
    }
}

struct Delimiters {
    element: char,
    segment: char,
}

impl X12Parser {
    pub fn new() -> Self {
        Self
    }

    fn delimiters(text: &str) -> Result<Delimiters, ParseError> {
        let mut chars = text.chars().skip(3);
        let element = chars.next().ok_or(ParseError::TruncatedHeader)?;

        // ISA has exactly 16 elements; ISA16 is the one character after the 16th separator and
        // the segment terminator follows it.
        let mut seen = 1;
        while seen < 16 {
            match chars.next() {
                Some(c) if c == element => seen += 1,
                Some(_) => {}
                None => return Err(ParseError::TruncatedHeader),
            }
        }
        let _component = chars.next().ok_or(ParseError::TruncatedHeader)?;
        let segment = chars.next().ok_or(ParseError::TruncatedHeader)?;

        Ok(Delimiters { element, segment })
    }

    fn segments(text: &str, delims: &Delimiters) -> Vec<Segment> {
        text.split(delims.segment)
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .map(|raw| {
                let mut parts = raw.split(delims.element).map(str::to_string);
                let tag = parts.next().unwrap_or_default();
                Segment {
                    tag,
                    elements: parts.collect(),
                }
            })
            .collect()
    }
}

impl DocumentParser for X12Parser {
    fn parse(&self, raw: &[u8]) -> Result<Interchange, ParseError> {
        let text = std::str::from_utf8(raw).map_err(|_| ParseError::NotUtf8)?;
        let text = text.trim_start();
        if text.is_empty() {
            return Err(ParseError::Empty);
        }
        if !text.starts_with("ISA") {
            return Err(ParseError::MissingInterchangeHeader);
        }

        let delims = Self::delimiters(text)?;
        let mut segments = Self::segments(text, &delims).into_iter().enumerate();

        let header = match segments.next() {
            Some((_, seg)) if seg.tag == "ISA" => seg,
            _ => return Err(ParseError::MissingInterchangeHeader),
        };

        let mut groups = Vec::new();
        let mut group: Option<FunctionalGroup> = None;
        let mut transaction: Option<Transaction> = None;
        let mut closed = false;

        for (index, seg) in segments {
            if closed {
                return Err(ParseError::TrailingSegment {
                    index,
                    tag: seg.tag,
                });
            }
            match seg.tag.as_str() {
                "GS" => {
                    if group.is_some() {
                        return Err(ParseError::NestedEnvelope {
                            index,
                            tag: seg.tag,
                        });
                    }
                    group = Some(FunctionalGroup {
                        header: seg,
                        transactions: Vec::new(),
                    });
                }
                "ST" => {
                    if group.is_none() {
                        return Err(ParseError::SegmentOutsideTransaction {
                            index,
                            tag: seg.tag,
                        });
                    }
                    if transaction.is_some() {
                        return Err(ParseError::NestedEnvelope {
                            index,
                            tag: seg.tag,
                        });
                    }
                    transaction = Some(Transaction {
                        segments: vec![seg],
                    });
                }
                "SE" => {
                    let (Some(mut txn), Some(open)) = (transaction.take(), group.as_mut()) else {
                        return Err(ParseError::UnbalancedEnvelope {
                            index,
                            tag: seg.tag,
                        });
                    };
                    txn.segments.push(seg);
                    open.transactions.push(txn);
                }
                "GE" => {
                    if transaction.is_some() {
                        return Err(ParseError::UnbalancedEnvelope {
                            index,
                            tag: seg.tag,
                        });
                    }
                    match group.take() {
                        Some(done) => groups.push(done),
                        None => {
                            return Err(ParseError::UnbalancedEnvelope {
                                index,
                                tag: seg.tag,
                            });
                        }
                    }
                }
                "IEA" => {
                    if group.is_some() || transaction.is_some() {
                        return Err(ParseError::UnbalancedEnvelope {
                            index,
                            tag: seg.tag,
                        });
                    }
                    closed = true;
                }
                _ => match transaction.as_mut() {
                    Some(txn) => txn.segments.push(seg),
                    None => {
                        return Err(ParseError::SegmentOutsideTransaction {
                            index,
                            tag: seg.tag,
                        });
                    }
                },
            }
        }

        if !closed {
            return Err(ParseError::UnterminatedInterchange);
        }

        Ok(Interchange { header, groups })
    }
}
