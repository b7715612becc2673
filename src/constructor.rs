use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;

use crate::{
    ConstructorError, Document, Mark, NodeData, BINARY_TAG, BOOL_TAG, FLOAT_TAG, INT_TAG,
    MAP_TAG, NULL_TAG, OMAP_TAG, PAIRS_TAG, SEQ_TAG, SET_TAG, STR_TAG, TIMESTAMP_TAG, VALUE_TAG,
};

pub use crate::resolver::NodeKind;

/// A typed value constructed from a tagged node.
///
/// Mappings stay ordered pair lists: keys may be arbitrary values, and
/// `!!omap`/`!!pairs` require positional semantics.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Binary(Vec<u8>),
    Timestamp(DateTime<FixedOffset>),
    Seq(Vec<Value>),
    Map(Vec<(Value, Value)>),
}

type ScalarFn = Box<dyn Fn(&str, Mark) -> Result<Value, ConstructorError>>;
type SequenceFn = Box<dyn Fn(Vec<Value>, Mark) -> Result<Value, ConstructorError>>;
type MappingFn = Box<dyn Fn(Vec<(Value, Value)>, Mark) -> Result<Value, ConstructorError>>;

enum ConstructorFn {
    Scalar(ScalarFn),
    Sequence(SequenceFn),
    Mapping(MappingFn),
}

/// Maps resolved tags to construction functions.
///
/// The standard YAML 1.1 set is registered up front; additional tags can be
/// registered per kind. Aliased nodes are constructed once per node id and
/// cloned on further references.
pub struct Constructor {
    constructors: HashMap<String, ConstructorFn>,
}

impl Default for Constructor {
    fn default() -> Self {
        Self::new()
    }
}

fn construct_error<T>(
    problem: &'static str,
    value: &str,
    mark: Mark,
) -> Result<T, ConstructorError> {
    Err(ConstructorError::Problem {
        problem,
        value: String::from(value),
        mark,
    })
}

impl Constructor {
    /// Create a constructor with the standard YAML 1.1 tag set.
    pub fn new() -> Constructor {
        let mut constructor = Constructor {
            constructors: HashMap::new(),
        };
        constructor.register_scalar(NULL_TAG, |_, _| Ok(Value::Null));
        constructor.register_scalar(BOOL_TAG, construct_bool);
        constructor.register_scalar(INT_TAG, construct_int);
        constructor.register_scalar(FLOAT_TAG, construct_float);
        constructor.register_scalar(STR_TAG, |value, _| Ok(Value::Str(String::from(value))));
        constructor.register_scalar(VALUE_TAG, |value, _| Ok(Value::Str(String::from(value))));
        constructor.register_scalar(BINARY_TAG, construct_binary);

        let timestamp_re = Regex::new(
            r"^(?P<year>[0-9][0-9][0-9][0-9])-(?P<month>[0-9][0-9]?)-(?P<day>[0-9][0-9]?)(?:(?:[Tt]|[ \t]+)(?P<hour>[0-9][0-9]?):(?P<minute>[0-9][0-9]):(?P<second>[0-9][0-9])(?:\.(?P<fraction>[0-9]*))?(?:[ \t]*(?:(?P<utc>Z)|(?P<tz_sign>[-+])(?P<tz_hour>[0-9][0-9]?)(?::(?P<tz_minute>[0-9][0-9]))?))?)?$",
        )
        .expect("timestamp pattern");
        constructor.register_scalar(TIMESTAMP_TAG, move |value, mark| {
            construct_timestamp(&timestamp_re, value, mark)
        });

        constructor.register_sequence(SEQ_TAG, |items, _| Ok(Value::Seq(items)));
        constructor.register_sequence(OMAP_TAG, construct_omap);
        constructor.register_sequence(PAIRS_TAG, construct_pairs);
        constructor.register_mapping(MAP_TAG, |pairs, _| Ok(Value::Map(pairs)));
        constructor.register_mapping(SET_TAG, construct_set);
        constructor
    }

    /// Register a constructor for scalar nodes with `tag`.
    pub fn register_scalar(
        &mut self,
        tag: &str,
        f: impl Fn(&str, Mark) -> Result<Value, ConstructorError> + 'static,
    ) {
        self.constructors
            .insert(String::from(tag), ConstructorFn::Scalar(Box::new(f)));
    }

    /// Register a constructor for sequence nodes with `tag`.
    pub fn register_sequence(
        &mut self,
        tag: &str,
        f: impl Fn(Vec<Value>, Mark) -> Result<Value, ConstructorError> + 'static,
    ) {
        self.constructors
            .insert(String::from(tag), ConstructorFn::Sequence(Box::new(f)));
    }

    /// Register a constructor for mapping nodes with `tag`.
    pub fn register_mapping(
        &mut self,
        tag: &str,
        f: impl Fn(Vec<(Value, Value)>, Mark) -> Result<Value, ConstructorError> + 'static,
    ) {
        self.constructors
            .insert(String::from(tag), ConstructorFn::Mapping(Box::new(f)));
    }

    /// Construct the typed value of a document's root node.
    ///
    /// An empty document constructs to [`Value::Null`].
    pub fn construct_document(&self, document: &Document) -> Result<Value, ConstructorError> {
        if document.nodes.is_empty() {
            return Ok(Value::Null);
        }
        let mut cache: Vec<Option<Value>> = vec![None; document.nodes.len()];
        self.construct_node(document, 1, &mut cache)
    }

    fn construct_node(
        &self,
        document: &Document,
        index: i32,
        cache: &mut Vec<Option<Value>>,
    ) -> Result<Value, ConstructorError> {
        if let Some(cached) = &cache[index as usize - 1] {
            return Ok(cached.clone());
        }
        let node = document.get_node(index).expect("node id in range");
        let tag = node.tag.as_deref().unwrap_or(STR_TAG);
        let value = match &node.data {
            NodeData::Scalar { value, .. } => match self.constructors.get(tag) {
                Some(ConstructorFn::Scalar(f)) => f(value, node.start_mark)?,
                Some(_) => {
                    return construct_error(
                        "tag does not construct from a scalar node",
                        value,
                        node.start_mark,
                    );
                }
                None => {
                    return construct_error(
                        "could not determine a constructor for the tag",
                        tag,
                        node.start_mark,
                    );
                }
            },
            NodeData::Sequence { items, .. } => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.construct_node(document, *item, cache)?);
                }
                match self.constructors.get(tag) {
                    Some(ConstructorFn::Sequence(f)) => f(values, node.start_mark)?,
                    Some(_) => {
                        return construct_error(
                            "tag does not construct from a sequence node",
                            tag,
                            node.start_mark,
                        );
                    }
                    None => {
                        return construct_error(
                            "could not determine a constructor for the tag",
                            tag,
                            node.start_mark,
                        );
                    }
                }
            }
            NodeData::Mapping { pairs, .. } => {
                let mut values = Vec::with_capacity(pairs.len());
                for pair in pairs {
                    let key = self.construct_node(document, pair.key, cache)?;
                    let value = self.construct_node(document, pair.value, cache)?;
                    values.push((key, value));
                }
                match self.constructors.get(tag) {
                    Some(ConstructorFn::Mapping(f)) => f(values, node.start_mark)?,
                    Some(_) => {
                        return construct_error(
                            "tag does not construct from a mapping node",
                            tag,
                            node.start_mark,
                        );
                    }
                    None => {
                        return construct_error(
                            "could not determine a constructor for the tag",
                            tag,
                            node.start_mark,
                        );
                    }
                }
            }
            NodeData::NoNode => Value::Null,
        };
        cache[index as usize - 1] = Some(value.clone());
        Ok(value)
    }
}

fn construct_bool(value: &str, mark: Mark) -> Result<Value, ConstructorError> {
    match value.to_ascii_lowercase().as_str() {
        "yes" | "true" | "on" => Ok(Value::Bool(true)),
        "no" | "false" | "off" => Ok(Value::Bool(false)),
        _ => construct_error("invalid boolean", value, mark),
    }
}

fn construct_int(value: &str, mark: Mark) -> Result<Value, ConstructorError> {
    let cleaned: String = value.chars().filter(|ch| *ch != '_').collect();
    let (sign, digits) = match cleaned.strip_prefix('-') {
        Some(rest) => (-1i64, rest),
        None => (1i64, cleaned.strip_prefix('+').unwrap_or(&cleaned)),
    };

    let magnitude = if digits == "0" {
        Ok(0)
    } else if let Some(rest) = digits.strip_prefix("0b") {
        i64::from_str_radix(rest, 2)
    } else if let Some(rest) = digits.strip_prefix("0x") {
        i64::from_str_radix(rest, 16)
    } else if digits.contains(':') {
        // Sexagesimal: 190:20:30 is 190*3600 + 20*60 + 30.
        let mut total: i64 = 0;
        for part in digits.split(':') {
            let Ok(part) = part.parse::<i64>() else {
                return construct_error("invalid integer", value, mark);
            };
            total = total * 60 + part;
        }
        Ok(total)
    } else if digits.starts_with('0') {
        i64::from_str_radix(&digits[1..], 8)
    } else {
        digits.parse::<i64>()
    };

    match magnitude {
        Ok(magnitude) => Ok(Value::Int(sign * magnitude)),
        Err(_) => construct_error("invalid integer", value, mark),
    }
}

fn construct_float(value: &str, mark: Mark) -> Result<Value, ConstructorError> {
    let cleaned: String = value
        .chars()
        .filter(|ch| *ch != '_')
        .collect::<String>()
        .to_ascii_lowercase();
    let (sign, body) = match cleaned.strip_prefix('-') {
        Some(rest) => (-1.0f64, rest),
        None => (1.0f64, cleaned.strip_prefix('+').unwrap_or(&cleaned)),
    };

    let magnitude = if body == ".inf" {
        f64::INFINITY
    } else if body == ".nan" {
        return Ok(Value::Float(f64::NAN));
    } else if body.contains(':') {
        let mut total: f64 = 0.0;
        for part in body.split(':') {
            let Ok(part) = part.parse::<f64>() else {
                return construct_error("invalid float", value, mark);
            };
            total = total * 60.0 + part;
        }
        total
    } else {
        match body.parse::<f64>() {
            Ok(parsed) => parsed,
            Err(_) => return construct_error("invalid float", value, mark),
        }
    };
    Ok(Value::Float(sign * magnitude))
}

fn construct_binary(value: &str, mark: Mark) -> Result<Value, ConstructorError> {
    let cleaned: String = value.chars().filter(|ch| !ch.is_whitespace()).collect();
    match BASE64.decode(cleaned.as_bytes()) {
        Ok(bytes) => Ok(Value::Binary(bytes)),
        Err(_) => construct_error("failed to decode base64 data", value, mark),
    }
}

fn construct_timestamp(re: &Regex, value: &str, mark: Mark) -> Result<Value, ConstructorError> {
    let Some(captures) = re.captures(value) else {
        return construct_error("invalid timestamp", value, mark);
    };
    let field = |name: &str| captures.name(name).map(|m| m.as_str());
    let number = |name: &str| {
        field(name)
            .map(|s| s.parse::<u32>().expect("digits only"))
            .unwrap_or(0)
    };

    let year: i32 = field("year")
        .expect("year is mandatory")
        .parse()
        .expect("digits only");
    let Some(date) = NaiveDate::from_ymd_opt(year, number("month"), number("day")) else {
        return construct_error("invalid timestamp date", value, mark);
    };

    let mut nanos: u32 = 0;
    if let Some(fraction) = field("fraction") {
        let mut digits = String::from(fraction);
        digits.truncate(9);
        while digits.len() < 9 {
            digits.push('0');
        }
        nanos = digits.parse().expect("digits only");
    }
    let Some(time) =
        NaiveTime::from_hms_nano_opt(number("hour"), number("minute"), number("second"), nanos)
    else {
        return construct_error("invalid timestamp time", value, mark);
    };

    let mut offset_seconds: i32 = 0;
    if field("utc").is_none() {
        if let Some(tz_hour) = field("tz_hour") {
            let hours: i32 = tz_hour.parse().expect("digits only");
            let minutes: i32 = number("tz_minute") as i32;
            offset_seconds = hours * 3600 + minutes * 60;
            if field("tz_sign") == Some("-") {
                offset_seconds = -offset_seconds;
            }
        }
    }
    let Some(offset) = FixedOffset::east_opt(offset_seconds) else {
        return construct_error("invalid timestamp timezone", value, mark);
    };

    let datetime = NaiveDateTime::new(date, time);
    match datetime.and_local_timezone(offset) {
        chrono::LocalResult::Single(timestamp) => Ok(Value::Timestamp(timestamp)),
        _ => construct_error("invalid timestamp", value, mark),
    }
}

fn construct_omap(items: Vec<Value>, mark: Mark) -> Result<Value, ConstructorError> {
    let mut pairs: Vec<(Value, Value)> = Vec::with_capacity(items.len());
    for item in items {
        let Value::Map(mut entry) = item else {
            return construct_error("expected a mapping of length 1 in an ordered map", "", mark);
        };
        if entry.len() != 1 {
            return construct_error("expected a mapping of length 1 in an ordered map", "", mark);
        }
        let (key, value) = entry.remove(0);
        if pairs.iter().any(|(existing, _)| *existing == key) {
            return construct_error("found duplicate key in an ordered map", "", mark);
        }
        pairs.push((key, value));
    }
    Ok(Value::Map(pairs))
}

fn construct_pairs(items: Vec<Value>, mark: Mark) -> Result<Value, ConstructorError> {
    let mut pairs: Vec<(Value, Value)> = Vec::with_capacity(items.len());
    for item in items {
        let Value::Map(mut entry) = item else {
            return construct_error("expected a mapping of length 1 in pairs", "", mark);
        };
        if entry.len() != 1 {
            return construct_error("expected a mapping of length 1 in pairs", "", mark);
        }
        pairs.push(entry.remove(0));
    }
    Ok(Value::Map(pairs))
}

fn construct_set(pairs: Vec<(Value, Value)>, mark: Mark) -> Result<Value, ConstructorError> {
    let mut out: Vec<(Value, Value)> = Vec::with_capacity(pairs.len());
    for (key, value) in pairs {
        if out.iter().any(|(existing, _)| *existing == key) {
            return construct_error("found duplicate key in a set", "", mark);
        }
        out.push((key, value));
    }
    Ok(Value::Map(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Composer, Parser};
    use pretty_assertions::assert_eq;

    fn value_of(input: &str) -> Value {
        let mut bytes = input.as_bytes();
        let mut parser = Parser::new();
        parser.set_input_string(&mut bytes);
        let mut composer = Composer::new(&mut parser);
        let document = composer.get_single_node().unwrap();
        Constructor::new().construct_document(&document).unwrap()
    }

    #[test]
    fn ints() {
        assert_eq!(value_of("42"), Value::Int(42));
        assert_eq!(value_of("-17"), Value::Int(-17));
        assert_eq!(value_of("0x_0A_74_AE"), Value::Int(685_230));
        assert_eq!(value_of("190:20:30"), Value::Int(685_230));
        assert_eq!(value_of("0b1010"), Value::Int(10));
        assert_eq!(value_of("0755"), Value::Int(493));
    }

    #[test]
    fn floats() {
        assert_eq!(value_of("3.14"), Value::Float(3.14));
        assert_eq!(value_of("-.inf"), Value::Float(f64::NEG_INFINITY));
        assert!(matches!(value_of(".nan"), Value::Float(f) if f.is_nan()));
        let Value::Float(sexagesimal) = value_of("190:20:30.15") else {
            panic!("expected a float");
        };
        assert!((sexagesimal - 685_230.15).abs() < 1e-6);
    }

    #[test]
    fn bools_and_nulls() {
        assert_eq!(value_of("yes"), Value::Bool(true));
        assert_eq!(value_of("Off"), Value::Bool(false));
        assert_eq!(value_of("~"), Value::Null);
        assert_eq!(value_of("null"), Value::Null);
    }

    #[test]
    fn strings() {
        assert_eq!(value_of("'42'"), Value::Str(String::from("42")));
        assert_eq!(value_of("hello"), Value::Str(String::from("hello")));
    }

    #[test]
    fn binary() {
        assert_eq!(
            value_of("!!binary \"aGVsbG8=\""),
            Value::Binary(b"hello".to_vec())
        );
    }

    #[test]
    fn timestamps() {
        let Value::Timestamp(ts) = value_of("2001-12-15T02:59:43.1Z") else {
            panic!("expected a timestamp");
        };
        assert_eq!(ts.to_rfc3339(), "2001-12-15T02:59:43.100+00:00");

        let Value::Timestamp(date_only) = value_of("2002-12-14") else {
            panic!("expected a timestamp");
        };
        assert_eq!(date_only.to_rfc3339(), "2002-12-14T00:00:00+00:00");

        let Value::Timestamp(offset) = value_of("2001-12-14 21:59:43.10 -5") else {
            panic!("expected a timestamp");
        };
        assert_eq!(offset.to_rfc3339(), "2001-12-14T21:59:43.100-05:00");
    }

    #[test]
    fn collections() {
        assert_eq!(
            value_of("[1, 2, 3]"),
            Value::Seq(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
        );
        assert_eq!(
            value_of("a: 1\nb: two\n"),
            Value::Map(vec![
                (Value::Str(String::from("a")), Value::Int(1)),
                (Value::Str(String::from("b")), Value::Str(String::from("two"))),
            ])
        );
    }

    #[test]
    fn omap_preserves_order_and_rejects_duplicates() {
        assert_eq!(
            value_of("!!omap\n- b: 1\n- a: 2\n"),
            Value::Map(vec![
                (Value::Str(String::from("b")), Value::Int(1)),
                (Value::Str(String::from("a")), Value::Int(2)),
            ])
        );

        let mut bytes: &[u8] = b"!!omap\n- a: 1\n- a: 2\n";
        let mut parser = Parser::new();
        parser.set_input_string(&mut bytes);
        let mut composer = Composer::new(&mut parser);
        let document = composer.get_single_node().unwrap();
        assert!(Constructor::new().construct_document(&document).is_err());
    }

    #[test]
    fn merged_mapping_constructs_flat() {
        assert_eq!(
            value_of("<<: { a: 1 }\na: 2\nb: 3\n"),
            Value::Map(vec![
                (Value::Str(String::from("a")), Value::Int(2)),
                (Value::Str(String::from("b")), Value::Int(3)),
            ])
        );
    }

    #[test]
    fn unknown_tag_is_an_error() {
        let mut bytes: &[u8] = b"!mystery 1\n";
        let mut parser = Parser::new();
        parser.set_input_string(&mut bytes);
        let mut composer = Composer::new(&mut parser);
        let document = composer.get_single_node().unwrap();
        assert!(Constructor::new().construct_document(&document).is_err());
    }

    #[test]
    fn user_constructor_extends_table() {
        let mut bytes: &[u8] = b"!upper hello\n";
        let mut parser = Parser::new();
        parser.set_input_string(&mut bytes);
        let mut composer = Composer::new(&mut parser);
        let document = composer.get_single_node().unwrap();

        let mut constructor = Constructor::new();
        constructor.register_scalar("!upper", |value, _| {
            Ok(Value::Str(value.to_ascii_uppercase()))
        });
        assert_eq!(
            constructor.construct_document(&document).unwrap(),
            Value::Str(String::from("HELLO"))
        );
    }
}
