use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use mockgraph_core::{GenerationError, Result};

use crate::sampler::Sampler;

/// Default retry ceiling for collision avoidance.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10_000;

/// Uniqueness scope for identifiers: a table, optionally partitioned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Namespace {
    table: String,
    partition: Option<String>,
}

impl Namespace {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            partition: None,
        }
    }

    pub fn partitioned(table: impl Into<String>, partition: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            partition: Some(partition.into()),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn partition(&self) -> Option<&str> {
        self.partition.as_deref()
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.partition {
            Some(partition) => write!(f, "{}/{}", self.table, partition),
            None => f.write_str(&self.table),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Case {
    Upper,
    Lower,
}

/// One piece of an identifier pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    /// `len` random ASCII letters.
    Alpha { len: usize, case: Case },
    /// `len` random decimal digits (leading zeros allowed).
    Digits { len: usize },
    /// Random integer in `[min, max]`.
    Int { min: i64, max: i64 },
    /// Per-namespace counter starting at 1, zero-padded to `width`.
    Sequence { width: usize },
    /// Literal taken from another field of the record being built.
    Field(String),
}

impl Segment {
    fn capacity(&self) -> Option<u128> {
        match self {
            Segment::Literal(_) => Some(1),
            Segment::Alpha { len, .. } => Some(saturating_pow(26, *len)),
            Segment::Digits { len } => Some(saturating_pow(10, *len)),
            Segment::Int { min, max } => Some((*max as i128 - *min as i128 + 1) as u128),
            Segment::Sequence { .. } | Segment::Field(_) => None,
        }
    }
}

/// Identifier template: literals interleaved with generated tokens.
///
/// The textual form uses `{kind:arg}` placeholders:
/// `{upper:N}`, `{lower:N}`, `{digits:N}`, `{int:MIN-MAX}`, `{seq:W}` and
/// `{field:NAME}`. Everything else is copied literally; braces cannot
/// appear in literals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdPattern {
    segments: Vec<Segment>,
}

impl IdPattern {
    pub fn new(segments: Vec<Segment>) -> Result<Self> {
        if segments.is_empty() {
            return Err(GenerationError::InvalidPattern(
                "pattern has no segments".to_string(),
            ));
        }
        for segment in &segments {
            match segment {
                Segment::Alpha { len: 0, .. } | Segment::Digits { len: 0 } => {
                    return Err(GenerationError::InvalidPattern(
                        "random segments need a length of at least 1".to_string(),
                    ));
                }
                Segment::Int { min, max } if min > max => {
                    return Err(GenerationError::InvalidPattern(format!(
                        "int segment min {min} exceeds max {max}"
                    )));
                }
                Segment::Field(name) if name.is_empty() => {
                    return Err(GenerationError::InvalidPattern(
                        "field segment needs a field name".to_string(),
                    ));
                }
                _ => {}
            }
        }
        Ok(Self { segments })
    }

    pub fn parse(pattern: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = pattern;

        while let Some(ch) = rest.chars().next() {
            match ch {
                '{' => {
                    let end = rest.find('}').ok_or_else(|| {
                        GenerationError::InvalidPattern(format!(
                            "unterminated placeholder in '{pattern}'"
                        ))
                    })?;
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(parse_placeholder(&rest[1..end])?);
                    rest = &rest[end + 1..];
                }
                '}' => {
                    return Err(GenerationError::InvalidPattern(format!(
                        "unmatched '}}' in '{pattern}'"
                    )));
                }
                _ => {
                    literal.push(ch);
                    rest = &rest[ch.len_utf8()..];
                }
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Self::new(segments)
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Whether the pattern contains a counter, which makes collisions
    /// impossible within a namespace.
    pub fn is_sequential(&self) -> bool {
        self.segments
            .iter()
            .any(|segment| matches!(segment, Segment::Sequence { .. }))
    }

    /// Field names this pattern reads from the record being built.
    pub fn field_refs(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Field(name) => Some(name.as_str()),
            _ => None,
        })
    }

    /// Number of distinct identifiers the pattern can produce, when that is
    /// finite and independent of the record.
    pub fn capacity(&self) -> Option<u128> {
        self.segments
            .iter()
            .try_fold(1_u128, |acc, segment| {
                segment.capacity().map(|cap| acc.saturating_mul(cap))
            })
    }
}

impl FromStr for IdPattern {
    type Err = GenerationError;

    fn from_str(value: &str) -> Result<Self> {
        Self::parse(value)
    }
}

impl fmt::Display for IdPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => f.write_str(text)?,
                Segment::Alpha {
                    len,
                    case: Case::Upper,
                } => write!(f, "{{upper:{len}}}")?,
                Segment::Alpha {
                    len,
                    case: Case::Lower,
                } => write!(f, "{{lower:{len}}}")?,
                Segment::Digits { len } => write!(f, "{{digits:{len}}}")?,
                Segment::Int { min, max } => write!(f, "{{int:{min}-{max}}}")?,
                Segment::Sequence { width } => write!(f, "{{seq:{width}}}")?,
                Segment::Field(name) => write!(f, "{{field:{name}}}")?,
            }
        }
        Ok(())
    }
}

fn parse_placeholder(body: &str) -> Result<Segment> {
    let (kind, arg) = body.split_once(':').unwrap_or((body, ""));
    let invalid = || GenerationError::InvalidPattern(format!("invalid placeholder '{{{body}}}'"));
    let parse_len = |arg: &str| arg.trim().parse::<usize>().map_err(|_| invalid());

    match kind.trim() {
        "upper" => Ok(Segment::Alpha {
            len: parse_len(arg)?,
            case: Case::Upper,
        }),
        "lower" => Ok(Segment::Alpha {
            len: parse_len(arg)?,
            case: Case::Lower,
        }),
        "digits" => Ok(Segment::Digits {
            len: parse_len(arg)?,
        }),
        "int" => {
            // Split on the last '-' after the first char so negative mins parse.
            let split = arg
                .char_indices()
                .skip(1)
                .filter(|(_, ch)| *ch == '-')
                .map(|(idx, _)| idx)
                .next()
                .ok_or_else(invalid)?;
            let min = arg[..split].trim().parse::<i64>().map_err(|_| invalid())?;
            let max = arg[split + 1..]
                .trim()
                .parse::<i64>()
                .map_err(|_| invalid())?;
            Ok(Segment::Int { min, max })
        }
        "seq" if arg.is_empty() => Ok(Segment::Sequence { width: 1 }),
        "seq" => Ok(Segment::Sequence {
            width: parse_len(arg)?,
        }),
        "field" => Ok(Segment::Field(arg.trim().to_string())),
        _ => Err(invalid()),
    }
}

fn saturating_pow(base: u128, exp: usize) -> u128 {
    (0..exp).fold(1_u128, |acc, _| acc.saturating_mul(base))
}

/// Issues identifiers that are unique within their namespace for the
/// lifetime of the allocator.
#[derive(Debug)]
pub struct IdAllocator {
    issued: HashMap<Namespace, HashSet<String>>,
    // Accepted ids per (namespace, pattern), for the capacity shortcut.
    per_pattern: HashMap<(Namespace, String), u128>,
    counters: HashMap<Namespace, u64>,
    max_attempts: u32,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::with_max_attempts(DEFAULT_MAX_ATTEMPTS)
    }
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            issued: HashMap::new(),
            per_pattern: HashMap::new(),
            counters: HashMap::new(),
            max_attempts: max_attempts.max(1),
        }
    }

    /// Allocate an identifier for a pattern without `{field:..}` segments.
    pub fn allocate(
        &mut self,
        namespace: &Namespace,
        pattern: &IdPattern,
        sampler: &mut Sampler,
    ) -> Result<String> {
        self.allocate_with(namespace, pattern, sampler, &|_: &str| None)
    }

    /// Allocate an identifier, resolving `{field:..}` segments through
    /// `bindings`.
    ///
    /// Candidates are regenerated until one is unseen in the namespace; the
    /// accepted candidate is recorded before it is returned.
    pub fn allocate_with(
        &mut self,
        namespace: &Namespace,
        pattern: &IdPattern,
        sampler: &mut Sampler,
        bindings: &dyn Fn(&str) -> Option<String>,
    ) -> Result<String> {
        let pattern_key = (namespace.clone(), pattern.to_string());
        let pattern_count = self.per_pattern.get(&pattern_key).copied().unwrap_or(0);
        if pattern
            .capacity()
            .is_some_and(|capacity| pattern_count >= capacity)
        {
            return Err(GenerationError::CapacityExhausted {
                namespace: namespace.to_string(),
                attempts: 0,
            });
        }

        for _ in 0..self.max_attempts {
            let candidate = self.render(namespace, pattern, sampler, bindings)?;
            let issued = self.issued.entry(namespace.clone()).or_default();
            if issued.insert(candidate.clone()) {
                *self.per_pattern.entry(pattern_key).or_insert(0) += 1;
                return Ok(candidate);
            }
        }

        Err(GenerationError::CapacityExhausted {
            namespace: namespace.to_string(),
            attempts: self.max_attempts,
        })
    }

    pub fn issued_count(&self, namespace: &Namespace) -> usize {
        self.issued.get(namespace).map_or(0, HashSet::len)
    }

    pub fn contains(&self, namespace: &Namespace, id: &str) -> bool {
        self.issued
            .get(namespace)
            .is_some_and(|issued| issued.contains(id))
    }

    fn render(
        &mut self,
        namespace: &Namespace,
        pattern: &IdPattern,
        sampler: &mut Sampler,
        bindings: &dyn Fn(&str) -> Option<String>,
    ) -> Result<String> {
        let mut out = String::new();
        for segment in pattern.segments() {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Alpha { len, case } => {
                    let base = match case {
                        Case::Upper => b'A',
                        Case::Lower => b'a',
                    };
                    for _ in 0..*len {
                        let offset = sampler.index(26)? as u8;
                        out.push((base + offset) as char);
                    }
                }
                Segment::Digits { len } => {
                    for _ in 0..*len {
                        let digit = sampler.index(10)? as u8;
                        out.push((b'0' + digit) as char);
                    }
                }
                Segment::Int { min, max } => {
                    out.push_str(&sampler.integer(*min, *max)?.to_string());
                }
                Segment::Sequence { width } => {
                    let counter = self.counters.entry(namespace.clone()).or_insert(0);
                    *counter += 1;
                    out.push_str(&format!("{:0width$}", counter, width = *width));
                }
                Segment::Field(name) => {
                    let value = bindings(name).ok_or_else(|| {
                        GenerationError::InvalidPattern(format!(
                            "no value bound for field '{name}' in pattern '{pattern}'"
                        ))
                    })?;
                    out.push_str(&value);
                }
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    #[test]
    fn parse_round_trips_through_display() {
        let text = "EXP-{field:year}-{upper:3}";
        let pattern = IdPattern::parse(text).expect("parse");

        assert_eq!(
            pattern.segments(),
            &[
                Segment::Literal("EXP-".to_string()),
                Segment::Field("year".to_string()),
                Segment::Literal("-".to_string()),
                Segment::Alpha {
                    len: 3,
                    case: Case::Upper
                },
            ]
        );
        assert_eq!(pattern.to_string(), text);
    }

    #[test]
    fn parse_int_and_sequence_segments() {
        let pattern: IdPattern = "SUP-{int:1000-9999}".parse().expect("parse");
        assert_eq!(pattern.capacity(), Some(9000));

        let pattern = IdPattern::parse("T{int:-5-5}").expect("parse");
        assert_eq!(pattern.segments()[1], Segment::Int { min: -5, max: 5 });

        let pattern = IdPattern::parse("LOC-{seq:3}").expect("parse");
        assert!(pattern.is_sequential());
        assert_eq!(pattern.capacity(), None);
    }

    #[test]
    fn parse_rejects_malformed_patterns() {
        for text in [
            "",
            "ABC-{upper:3",
            "ABC}",
            "{nope:3}",
            "{upper:x}",
            "{upper:0}",
            "{int:9-1}",
            "{field:}",
        ] {
            assert!(
                matches!(
                    IdPattern::parse(text),
                    Err(GenerationError::InvalidPattern(_))
                ),
                "{text} should be rejected"
            );
        }
    }

    #[test]
    fn allocates_distinct_three_letter_codes() {
        let mut allocator = IdAllocator::new();
        let mut sampler = Sampler::seeded(2024);
        let namespace = Namespace::new("CITY");
        let pattern = IdPattern::parse("{upper:3}").expect("parse");

        let ids: Vec<String> = (0..5)
            .map(|_| allocator.allocate(&namespace, &pattern, &mut sampler))
            .collect::<Result<_>>()
            .expect("allocate");

        let distinct: BTreeSet<&String> = ids.iter().collect();
        assert_eq!(distinct.len(), 5);
        for id in &ids {
            assert_eq!(id.len(), 3);
            assert!(id.chars().all(|ch| ch.is_ascii_uppercase()));
        }
        assert_eq!(allocator.issued_count(&namespace), 5);
    }

    #[test]
    fn fills_small_namespace_then_reports_exhaustion() {
        let mut allocator = IdAllocator::new();
        let mut sampler = Sampler::seeded(1);
        let namespace = Namespace::new("tiny");
        let pattern = IdPattern::parse("X{digits:1}").expect("parse");

        let ids: BTreeSet<String> = (0..10)
            .map(|_| allocator.allocate(&namespace, &pattern, &mut sampler))
            .collect::<Result<_>>()
            .expect("allocate");
        assert_eq!(ids.len(), 10);

        let err = allocator
            .allocate(&namespace, &pattern, &mut sampler)
            .expect_err("namespace is full");
        assert!(matches!(err, GenerationError::CapacityExhausted { .. }));
    }

    #[test]
    fn full_pattern_does_not_block_another_pattern_in_the_namespace() {
        let mut allocator = IdAllocator::new();
        let mut sampler = Sampler::seeded(4);
        let namespace = Namespace::new("shared");
        let first = IdPattern::parse("A{digits:1}").expect("parse");
        let second = IdPattern::parse("B{digits:1}").expect("parse");

        for _ in 0..10 {
            allocator
                .allocate(&namespace, &first, &mut sampler)
                .expect("allocate A");
        }
        assert!(matches!(
            allocator.allocate(&namespace, &first, &mut sampler),
            Err(GenerationError::CapacityExhausted { attempts: 0, .. })
        ));

        let ids: BTreeSet<String> = (0..10)
            .map(|_| allocator.allocate(&namespace, &second, &mut sampler))
            .collect::<Result<_>>()
            .expect("B ids are still free");
        assert_eq!(ids.len(), 10);
        assert!(ids.iter().all(|id| id.starts_with('B')));
        assert_eq!(allocator.issued_count(&namespace), 20);
    }

    #[test]
    fn retry_ceiling_stops_field_bound_collisions() {
        let mut allocator = IdAllocator::with_max_attempts(25);
        let mut sampler = Sampler::seeded(1);
        let namespace = Namespace::new("bound");
        let pattern = IdPattern::parse("{field:code}").expect("parse");
        let bindings = |_: &str| Some("same".to_string());

        allocator
            .allocate_with(&namespace, &pattern, &mut sampler, &bindings)
            .expect("first allocation");
        let err = allocator
            .allocate_with(&namespace, &pattern, &mut sampler, &bindings)
            .expect_err("every candidate collides");
        assert!(matches!(
            err,
            GenerationError::CapacityExhausted { attempts: 25, .. }
        ));
    }

    #[test]
    fn sequences_are_ordered_per_namespace() {
        let mut allocator = IdAllocator::new();
        let mut sampler = Sampler::seeded(1);
        let pattern = IdPattern::parse("REL-{seq:3}").expect("parse");
        let first = Namespace::new("relationships");
        let second = Namespace::partitioned("relationships", "archive");

        let a = allocator.allocate(&first, &pattern, &mut sampler).expect("a");
        let b = allocator.allocate(&first, &pattern, &mut sampler).expect("b");
        let c = allocator.allocate(&second, &pattern, &mut sampler).expect("c");

        assert_eq!(a, "REL-001");
        assert_eq!(b, "REL-002");
        assert_eq!(c, "REL-001");
        assert!(allocator.contains(&first, "REL-002"));
        assert!(!allocator.contains(&second, "REL-002"));
    }

    #[test]
    fn unbound_field_is_an_error() {
        let mut allocator = IdAllocator::new();
        let mut sampler = Sampler::seeded(1);
        let pattern = IdPattern::parse("LOC-{field:city_id}-{seq:3}").expect("parse");

        let err = allocator
            .allocate(&Namespace::new("locations"), &pattern, &mut sampler)
            .expect_err("city_id is unbound");
        assert!(matches!(err, GenerationError::InvalidPattern(_)));
    }
}
