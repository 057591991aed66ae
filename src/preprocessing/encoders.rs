//! Column encoders.
//!
//! An [`Encoder`] maps raw text cells to [`Encoded`] values. Stateless
//! encoders (numeric, string) can encode immediately; the categorical ones
//! (one-hot, factor, inferred) first need a single [`Encoder::fit`] pass over
//! the column unless they were seeded with an explicit domain.

use crate::error::{Result, SimError};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::Arc;

/// A single encoded value.
#[derive(Clone, Debug)]
pub enum Scalar {
    Int(i64),
    Float(f64),
    Text(Arc<str>),
}

impl Scalar {
    pub fn text(value: &str) -> Self {
        Self::Text(Arc::from(value))
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            Self::Text(_) => None,
        }
    }
}

/// Bit pattern used for equality and hashing of floats: `-0.0` folds onto
/// `0.0` and every NaN onto one canonical NaN.
fn canonical_bits(v: f64) -> u64 {
    if v == 0.0 {
        0.0_f64.to_bits()
    } else if v.is_nan() {
        f64::NAN.to_bits()
    } else {
        v.to_bits()
    }
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => canonical_bits(*a) == canonical_bits(*b),
            (Self::Text(a), Self::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Scalar {}

impl Hash for Scalar {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Int(v) => v.hash(state),
            Self::Float(v) => canonical_bits(*v).hash(state),
            Self::Text(v) => v.hash(state),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "{v}"),
        }
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Self::text(v)
    }
}

/// The encoding of one cell: a scalar, or a fixed-length tuple (one-hot).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Encoded {
    Scalar(Scalar),
    Tuple(Vec<Scalar>),
}

impl Encoded {
    pub fn len(&self) -> usize {
        match self {
            Self::Scalar(_) => 1,
            Self::Tuple(t) => t.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for Encoded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(s) => write!(f, "{s}"),
            Self::Tuple(t) => {
                let parts: Vec<String> = t.iter().map(ToString::to_string).collect();
                write!(f, "({})", parts.join(","))
            }
        }
    }
}

impl From<Scalar> for Encoded {
    fn from(s: Scalar) -> Self {
        Self::Scalar(s)
    }
}

impl From<Vec<Scalar>> for Encoded {
    fn from(t: Vec<Scalar>) -> Self {
        Self::Tuple(t)
    }
}

fn parse_number(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok()
}

/// Parses text to floating point.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NumericEncoder;

impl NumericEncoder {
    pub fn encode(self, value: &str) -> Result<Scalar> {
        parse_number(value)
            .map(Scalar::Float)
            .ok_or_else(|| SimError::encoding(format!("'{value}' is not a number")))
    }
}

/// Passes text through unchanged.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StringEncoder;

impl StringEncoder {
    pub fn encode(self, value: &str) -> Scalar {
        Scalar::text(value)
    }
}

/// Ordered categorical domain shared by the factor and one-hot encoders.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct Domain {
    levels: Vec<String>,
    positions: HashMap<String, usize>,
}

impl Domain {
    fn from_levels<I, S>(levels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut domain = Self::default();
        for level in levels {
            domain.observe(&level.into());
        }
        domain
    }

    /// Records a value; first-seen order defines the position.
    fn observe(&mut self, value: &str) {
        if !self.positions.contains_key(value) {
            self.positions.insert(value.to_owned(), self.levels.len());
            self.levels.push(value.to_owned());
        }
    }

    fn position(&self, value: &str) -> Option<usize> {
        self.positions.get(value).copied()
    }
}

/// Maps each category to a 1-based ordinal.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FactorEncoder {
    domain: Option<Domain>,
}

impl FactorEncoder {
    /// An unfitted encoder whose levels come from the data.
    pub fn new() -> Self {
        Self::default()
    }

    /// An encoder seeded with an explicit level ordering; needs no fitting.
    pub fn with_levels<I, S>(levels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            domain: Some(Domain::from_levels(levels)),
        }
    }

    pub fn is_fit(&self) -> bool {
        self.domain.is_some()
    }

    pub fn levels(&self) -> &[String] {
        self.domain.as_ref().map_or(&[][..], |d| d.levels.as_slice())
    }

    fn fit<'a>(&self, values: impl IntoIterator<Item = &'a str>) -> Self {
        let mut domain = Domain::default();
        for value in values {
            domain.observe(value);
        }
        Self {
            domain: Some(domain),
        }
    }

    pub fn encode(&self, value: &str) -> Result<Scalar> {
        let domain = self
            .domain
            .as_ref()
            .ok_or_else(|| SimError::encoding("factor encoder used before fit"))?;
        domain
            .position(value)
            .map(|p| Scalar::Int(p as i64 + 1))
            .ok_or_else(|| SimError::encoding(format!("'{value}' is not a known factor level")))
    }

    /// Inverse lookup from ordinal back to the original category.
    pub fn decode(&self, ordinal: i64) -> Option<&str> {
        let index = usize::try_from(ordinal.checked_sub(1)?).ok()?;
        self.levels().get(index).map(String::as_str)
    }
}

/// Maps each category to a unit basis vector over the domain.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OneHotEncoder {
    domain: Option<Domain>,
}

impl OneHotEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            domain: Some(Domain::from_levels(values)),
        }
    }

    pub fn is_fit(&self) -> bool {
        self.domain.is_some()
    }

    pub fn values(&self) -> &[String] {
        self.domain.as_ref().map_or(&[][..], |d| d.levels.as_slice())
    }

    fn fit<'a>(&self, values: impl IntoIterator<Item = &'a str>) -> Self {
        let mut domain = Domain::default();
        for value in values {
            domain.observe(value);
        }
        Self {
            domain: Some(domain),
        }
    }

    fn position(&self, value: &str) -> Result<(usize, usize)> {
        let domain = self
            .domain
            .as_ref()
            .ok_or_else(|| SimError::encoding("one-hot encoder used before fit"))?;
        domain
            .position(value)
            .map(|p| (p, domain.levels.len()))
            .ok_or_else(|| SimError::encoding(format!("'{value}' is not a known one-hot category")))
    }

    pub fn encode(&self, value: &str) -> Result<Vec<Scalar>> {
        let mut out = Vec::new();
        self.encode_into(value, &mut out)?;
        Ok(out)
    }

    fn encode_into(&self, value: &str, out: &mut Vec<Scalar>) -> Result<()> {
        let (hot, width) = self.position(value)?;
        out.extend((0..width).map(|i| Scalar::Int(i64::from(i == hot))));
        Ok(())
    }

    /// Inverse lookup from a basis vector back to the original category.
    pub fn decode(&self, encoded: &[Scalar]) -> Option<&str> {
        let values = self.values();
        if encoded.len() != values.len() {
            return None;
        }
        let hot = encoded.iter().position(|s| *s == Scalar::Int(1))?;
        values.get(hot).map(String::as_str)
    }
}

/// Chooses numeric or one-hot once per column by inspecting every value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InferredEncoder {
    decision: Option<Box<Encoder>>,
}

impl InferredEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_fit(&self) -> bool {
        self.decision.is_some()
    }

    /// The encoder this column resolved to, once fitted.
    pub fn decision(&self) -> Option<&Encoder> {
        self.decision.as_deref()
    }

    fn fit<'a>(&self, values: impl IntoIterator<Item = &'a str>) -> Self {
        // One pass: collect the domain while checking numeric-ness, so a
        // non-numeric column does not need a second scan for the one-hot fit.
        let mut domain = Domain::default();
        let mut all_numeric = true;
        for value in values {
            all_numeric = all_numeric && parse_number(value).is_some();
            domain.observe(value);
        }

        let decision = if all_numeric {
            Encoder::Numeric(NumericEncoder)
        } else {
            Encoder::OneHot(OneHotEncoder {
                domain: Some(domain),
            })
        };

        Self {
            decision: Some(Box::new(decision)),
        }
    }

    fn resolved(&self) -> Result<&Encoder> {
        self.decision
            .as_deref()
            .ok_or_else(|| SimError::encoding("inferred encoder used before fit"))
    }
}

/// The closed set of column encoders.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum Encoder {
    Numeric(NumericEncoder),
    String(StringEncoder),
    OneHot(OneHotEncoder),
    Factor(FactorEncoder),
    Inferred(InferredEncoder),
}

impl Default for Encoder {
    fn default() -> Self {
        Self::Inferred(InferredEncoder::new())
    }
}

impl Encoder {
    pub fn numeric() -> Self {
        Self::Numeric(NumericEncoder)
    }

    pub fn string() -> Self {
        Self::String(StringEncoder)
    }

    pub fn one_hot() -> Self {
        Self::OneHot(OneHotEncoder::new())
    }

    pub fn factor() -> Self {
        Self::Factor(FactorEncoder::new())
    }

    pub fn inferred() -> Self {
        Self::Inferred(InferredEncoder::new())
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Numeric(_) => "numeric",
            Self::String(_) => "string",
            Self::OneHot(_) => "onehot",
            Self::Factor(_) => "factor",
            Self::Inferred(_) => "inferred",
        }
    }

    /// Whether the encoder can encode without seeing the column first.
    pub fn is_fit(&self) -> bool {
        match self {
            Self::Numeric(_) | Self::String(_) => true,
            Self::OneHot(e) => e.is_fit(),
            Self::Factor(e) => e.is_fit(),
            Self::Inferred(e) => e.is_fit(),
        }
    }

    /// Fit over a column's values in a single pass. Already-fitted encoders
    /// are returned unchanged without consuming `values`.
    pub fn fit<'a>(&self, values: impl IntoIterator<Item = &'a str>) -> Self {
        if self.is_fit() {
            return self.clone();
        }
        match self {
            Self::OneHot(e) => Self::OneHot(e.fit(values)),
            Self::Factor(e) => Self::Factor(e.fit(values)),
            Self::Inferred(e) => Self::Inferred(e.fit(values)),
            Self::Numeric(_) | Self::String(_) => self.clone(),
        }
    }

    /// Number of scalars produced per value, known once fitted.
    pub fn width(&self) -> Option<usize> {
        match self {
            Self::Numeric(_) | Self::String(_) | Self::Factor(_) => Some(1),
            Self::OneHot(e) => e.is_fit().then(|| e.values().len()),
            Self::Inferred(e) => e.decision().and_then(Self::width),
        }
    }

    pub fn encode(&self, value: &str) -> Result<Encoded> {
        match self {
            Self::Numeric(e) => e.encode(value).map(Encoded::Scalar),
            Self::String(e) => Ok(Encoded::Scalar(e.encode(value))),
            Self::OneHot(e) => e.encode(value).map(Encoded::Tuple),
            Self::Factor(e) => e.encode(value).map(Encoded::Scalar),
            Self::Inferred(e) => e.resolved()?.encode(value),
        }
    }

    /// Encode a whole column, appending row `i`'s encoding to `sinks[i]`.
    ///
    /// The variant is matched once; each arm then runs a tight loop. Errors
    /// report the offending row index.
    pub fn encode_column<'a>(
        &self,
        values: impl Iterator<Item = &'a str>,
        sinks: &mut [Vec<Scalar>],
    ) -> Result<()> {
        let encoder = match self {
            Self::Inferred(e) => e.resolved()?,
            other => other,
        };
        let rows = values.zip(sinks.iter_mut()).enumerate();
        let at_row = |row: usize, err: SimError| match err {
            SimError::Encoding(msg) => SimError::encoding(format!("row {row}: {msg}")),
            other => other,
        };

        match encoder {
            Self::Numeric(e) => {
                for (row, (value, sink)) in rows {
                    sink.push(e.encode(value).map_err(|err| at_row(row, err))?);
                }
            }
            Self::String(e) => {
                for (_, (value, sink)) in rows {
                    sink.push(e.encode(value));
                }
            }
            Self::Factor(e) => {
                for (row, (value, sink)) in rows {
                    sink.push(e.encode(value).map_err(|err| at_row(row, err))?);
                }
            }
            Self::OneHot(e) => {
                for (row, (value, sink)) in rows {
                    e.encode_into(value, sink).map_err(|err| at_row(row, err))?;
                }
            }
            Self::Inferred(_) => {
                return Err(SimError::encoding("inferred encoder resolved to itself"));
            }
        }
        Ok(())
    }
}

impl FromStr for Encoder {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "numeric" => Ok(Self::numeric()),
            "string" => Ok(Self::string()),
            "onehot" | "one_hot" => Ok(Self::one_hot()),
            "factor" => Ok(Self::factor()),
            "inferred" => Ok(Self::inferred()),
            other => Err(SimError::config(format!("Unknown encoding '{other}'"))),
        }
    }
}

impl TryFrom<String> for Encoder {
    type Error = SimError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl Serialize for Encoder {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl fmt::Display for Encoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn ints(values: &[i64]) -> Vec<Scalar> {
        values.iter().copied().map(Scalar::Int).collect()
    }

    /// A column that counts how many times it is iterated.
    struct CountingColumn {
        values: Vec<&'static str>,
        passes: Cell<usize>,
    }

    impl CountingColumn {
        fn new(values: &[&'static str]) -> Self {
            Self {
                values: values.to_vec(),
                passes: Cell::new(0),
            }
        }
    }

    impl<'a> IntoIterator for &'a CountingColumn {
        type Item = &'static str;
        type IntoIter = std::iter::Copied<std::slice::Iter<'a, &'static str>>;

        fn into_iter(self) -> Self::IntoIter {
            self.passes.set(self.passes.get() + 1);
            self.values.iter().copied()
        }
    }

    #[test]
    fn test_fit_reads_each_column_at_most_once() {
        let cases = [
            (Encoder::factor(), 1),
            (Encoder::one_hot(), 1),
            (Encoder::inferred(), 1),
            (Encoder::numeric(), 0),
            (Encoder::string(), 0),
            (Encoder::Factor(FactorEncoder::with_levels(["a", "b"])), 0),
        ];
        for (encoder, expected) in cases {
            let column = CountingColumn::new(&["a", "b", "a", "c"]);
            let fitted = encoder.fit(&column);
            assert!(fitted.is_fit(), "{encoder}");
            assert_eq!(column.passes.get(), expected, "{encoder}");
        }
    }

    #[test]
    fn test_numeric_encoder() {
        let encoder = Encoder::numeric();
        assert!(encoder.is_fit());
        assert_eq!(
            encoder.encode(" 2.5 ").unwrap(),
            Encoded::Scalar(Scalar::Float(2.5))
        );
        assert!(matches!(encoder.encode("abc"), Err(SimError::Encoding(_))));
    }

    #[test]
    fn test_string_encoder_is_identity() {
        let encoder = Encoder::string();
        assert_eq!(encoder.encode("s1").unwrap(), Encoded::Scalar(Scalar::text("s1")));
    }

    #[test]
    fn test_factor_first_seen_order() {
        let encoder = Encoder::factor().fit(["b", "a", "b", "c"]);
        assert_eq!(encoder.encode("b").unwrap(), Encoded::Scalar(Scalar::Int(1)));
        assert_eq!(encoder.encode("a").unwrap(), Encoded::Scalar(Scalar::Int(2)));
        assert_eq!(encoder.encode("c").unwrap(), Encoded::Scalar(Scalar::Int(3)));
        assert!(encoder.encode("d").is_err());
    }

    #[test]
    fn test_factor_with_levels_needs_no_fit() {
        let factor = FactorEncoder::with_levels(["1", "0"]);
        assert!(factor.is_fit());

        let encoder = Encoder::Factor(factor);
        // Fitting a seeded encoder keeps the explicit ordering.
        let refit = encoder.fit(["0", "0", "2"]);
        assert_eq!(refit, encoder);
        assert_eq!(encoder.encode("0").unwrap(), Encoded::Scalar(Scalar::Int(2)));
    }

    #[test]
    fn test_factor_round_trip() {
        let Encoder::Factor(factor) = Encoder::factor().fit(["x", "y", "z"]) else {
            panic!("factor stays factor after fit");
        };
        for value in ["x", "y", "z"] {
            let Scalar::Int(ordinal) = factor.encode(value).unwrap() else {
                panic!("factor encodes to ints");
            };
            assert_eq!(factor.decode(ordinal), Some(value));
        }
        assert_eq!(factor.decode(0), None);
        assert_eq!(factor.decode(4), None);
    }

    #[test]
    fn test_one_hot_basis_vectors() {
        let encoder = Encoder::one_hot().fit(["s1", "s2", "s1"]);
        assert_eq!(encoder.width(), Some(2));
        assert_eq!(encoder.encode("s1").unwrap(), Encoded::Tuple(ints(&[1, 0])));
        assert_eq!(encoder.encode("s2").unwrap(), Encoded::Tuple(ints(&[0, 1])));
        assert!(matches!(encoder.encode("s3"), Err(SimError::Encoding(_))));
    }

    #[test]
    fn test_one_hot_round_trip() {
        let one_hot = OneHotEncoder::with_values(["good", "bad", "ugly"]);
        for value in ["good", "bad", "ugly"] {
            let encoded = one_hot.encode(value).unwrap();
            assert_eq!(encoded.iter().filter(|s| **s == Scalar::Int(1)).count(), 1);
            assert_eq!(one_hot.decode(&encoded), Some(value));
        }
        assert_eq!(one_hot.decode(&ints(&[1, 0])), None);
    }

    #[test]
    fn test_unfitted_encoders_refuse_to_encode() {
        assert!(Encoder::one_hot().encode("a").is_err());
        assert!(Encoder::factor().encode("a").is_err());
        assert!(Encoder::inferred().encode("1").is_err());
        assert_eq!(Encoder::one_hot().width(), None);
    }

    #[test]
    fn test_inferred_numeric_when_all_values_parse() {
        let encoder = Encoder::inferred().fit(["1", "4.5", "-2"]);
        let Encoder::Inferred(inferred) = &encoder else {
            panic!("inferred stays inferred after fit");
        };
        assert_eq!(inferred.decision(), Some(&Encoder::numeric()));
        assert_eq!(encoder.encode("4.5").unwrap(), Encoded::Scalar(Scalar::Float(4.5)));
    }

    #[test]
    fn test_inferred_one_hot_when_any_value_fails() {
        let encoder = Encoder::inferred().fit(["1", "2", "x"]);
        let Encoder::Inferred(inferred) = &encoder else {
            panic!("inferred stays inferred after fit");
        };
        assert_eq!(inferred.decision().map(Encoder::name), Some("onehot"));
        assert_eq!(encoder.width(), Some(3));
        assert_eq!(encoder.encode("2").unwrap(), Encoded::Tuple(ints(&[0, 1, 0])));
    }

    #[test]
    fn test_encode_column_reports_row() {
        let mut sinks = vec![Vec::new(); 3];
        let err = Encoder::numeric()
            .encode_column(["1", "2", "nope"].into_iter(), &mut sinks)
            .unwrap_err();
        assert!(err.to_string().contains("row 2"), "{err}");
    }

    #[test]
    fn test_encode_column_appends_per_row() {
        let encoder = Encoder::inferred().fit(["a", "b"]);
        let mut sinks = vec![vec![Scalar::Float(9.0)], vec![Scalar::Float(8.0)]];
        encoder
            .encode_column(["b", "a"].into_iter(), &mut sinks)
            .unwrap();
        assert_eq!(
            sinks,
            vec![
                vec![Scalar::Float(9.0), Scalar::Int(0), Scalar::Int(1)],
                vec![Scalar::Float(8.0), Scalar::Int(1), Scalar::Int(0)],
            ]
        );
    }

    #[test]
    fn test_encoder_names() {
        assert_eq!("OneHot".parse::<Encoder>().unwrap(), Encoder::one_hot());
        assert_eq!("factor".parse::<Encoder>().unwrap(), Encoder::factor());
        assert!(matches!(
            "bogus".parse::<Encoder>(),
            Err(SimError::Configuration(_))
        ));

        let parsed: Encoder = serde_json::from_str("\"numeric\"").unwrap();
        assert_eq!(parsed, Encoder::numeric());
        assert!(serde_json::from_str::<Encoder>("\"bogus\"").is_err());
    }

    #[test]
    fn test_scalar_float_equality_is_hash_consistent() {
        use std::collections::HashSet;

        let set: HashSet<Scalar> = [Scalar::Float(0.0), Scalar::Float(-0.0)].into();
        assert_eq!(set.len(), 1);
        assert_eq!(Scalar::Float(f64::NAN), Scalar::Float(f64::NAN));
        assert_ne!(Scalar::Int(1), Scalar::Float(1.0));
    }
}
