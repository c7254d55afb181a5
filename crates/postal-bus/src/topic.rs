//! # Topic Bindings
//!
//! Subscription patterns over dot-separated topics.
//!
//! | Binding         | Matches                          | Does not match   |
//! |-----------------|----------------------------------|------------------|
//! | `orders.created`| `orders.created`                 | `orders.updated` |
//! | `orders.*`      | `orders.created`                 | `orders.eu.new`  |
//! | `orders.#`      | `orders`, `orders.eu.new`        | `invoices.new`   |
//! | `#`             | everything                       |                  |

use crate::error::BusError;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Segment {
    Literal(String),
    /// `*`
    One,
    /// `#`
    Many,
}

/// A parsed subscription binding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TopicBinding {
    pattern: String,
    segments: Vec<Segment>,
}

impl TopicBinding {
    /// Parse a binding, rejecting empty patterns and empty segments.
    pub fn parse(pattern: &str) -> Result<Self, BusError> {
        if pattern.is_empty() {
            return Err(BusError::InvalidTopic(pattern.to_string()));
        }

        let segments = pattern
            .split('.')
            .map(|segment| match segment {
                "" => Err(BusError::InvalidTopic(pattern.to_string())),
                "*" => Ok(Segment::One),
                "#" => Ok(Segment::Many),
                literal => Ok(Segment::Literal(literal.to_string())),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            pattern: pattern.to_string(),
            segments,
        })
    }

    /// Check a concrete topic against this binding.
    #[must_use]
    pub fn matches(&self, topic: &str) -> bool {
        let parts: Vec<&str> = topic.split('.').collect();
        matches_segments(&self.segments, &parts)
    }

    /// The original pattern text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.pattern
    }
}

impl fmt::Display for TopicBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}

fn matches_segments(pattern: &[Segment], topic: &[&str]) -> bool {
    match pattern.split_first() {
        None => topic.is_empty(),
        Some((Segment::Many, rest)) => {
            (0..=topic.len()).any(|skip| matches_segments(rest, &topic[skip..]))
        }
        Some((Segment::One, rest)) => !topic.is_empty() && matches_segments(rest, &topic[1..]),
        Some((Segment::Literal(literal), rest)) => {
            topic.first().is_some_and(|part| part == literal) && matches_segments(rest, &topic[1..])
        }
    }
}
