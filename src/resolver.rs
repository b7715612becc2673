use regex::Regex;

use crate::{
    BOOL_TAG, DEFAULT_MAPPING_TAG, DEFAULT_SCALAR_TAG, DEFAULT_SEQUENCE_TAG, FLOAT_TAG, INT_TAG,
    MERGE_TAG, NULL_TAG, TIMESTAMP_TAG, VALUE_TAG,
};

/// The kind of a node, for resolution and construction purposes.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum NodeKind {
    Scalar,
    Sequence,
    Mapping,
}

struct Rule {
    tag: &'static str,
    /// Characters a matching value may begin with. The fast path: the
    /// regular expression is only tried when the first character is listed.
    first: &'static str,
    /// Whether the rule may match the empty string.
    matches_empty: bool,
    regex: Regex,
}

struct UserRule {
    tag: String,
    first: String,
    matches_empty: bool,
    regex: Regex,
}

/// Maps (kind, explicit tag, value, implicit flag) to a canonical tag.
///
/// Non-scalar kinds resolve to their default tags. Implicit scalars run
/// through the YAML 1.1 rule table; the first matching rule wins, and
/// `!!str` is the fallback.
pub struct Resolver {
    rules: Vec<Rule>,
    user_rules: Vec<UserRule>,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

fn rule(tag: &'static str, first: &'static str, matches_empty: bool, pattern: &str) -> Rule {
    Rule {
        tag,
        first,
        matches_empty,
        regex: Regex::new(pattern).expect("builtin resolver pattern"),
    }
}

impl Resolver {
    /// Create a resolver with the YAML 1.1 rule set.
    pub fn new() -> Resolver {
        let rules = vec![
            rule(
                BOOL_TAG,
                "yYnNtTfFoO",
                false,
                r"^(?:yes|Yes|YES|no|No|NO|true|True|TRUE|false|False|FALSE|on|On|ON|off|Off|OFF)$",
            ),
            rule(
                FLOAT_TAG,
                "-+0123456789.",
                false,
                r"^(?:[-+]?(?:[0-9][0-9_]*)\.[0-9_]*(?:[eE][-+][0-9]+)?|\.[0-9_]+(?:[eE][-+][0-9]+)?|[-+]?[0-9][0-9_]*(?::[0-5]?[0-9])+\.[0-9_]*|[-+]?\.(?:inf|Inf|INF)|\.(?:nan|NaN|NAN))$",
            ),
            rule(
                INT_TAG,
                "-+0123456789",
                false,
                r"^(?:[-+]?0b[0-1_]+|[-+]?0[0-7_]+|[-+]?(?:0|[1-9][0-9_]*)|[-+]?0x[0-9a-fA-F_]+|[-+]?[1-9][0-9_]*(?::[0-5]?[0-9])+)$",
            ),
            rule(MERGE_TAG, "<", false, r"^(?:<<)$"),
            rule(NULL_TAG, "~nN", true, r"^(?:~|null|Null|NULL|)$"),
            rule(
                TIMESTAMP_TAG,
                "0123456789",
                false,
                r"^(?:[0-9][0-9][0-9][0-9]-[0-9][0-9]-[0-9][0-9]|[0-9][0-9][0-9][0-9]-[0-9][0-9]?-[0-9][0-9]?(?:[Tt]|[ \t]+)[0-9][0-9]?:[0-9][0-9]:[0-9][0-9](?:\.[0-9]*)?(?:[ \t]*(?:Z|[-+][0-9][0-9]?(?::[0-9][0-9])?))?)$",
            ),
            rule(VALUE_TAG, "=", false, r"^(?:=)$"),
        ];
        Resolver {
            rules,
            user_rules: Vec::new(),
        }
    }

    /// Register an additional implicit scalar rule.
    ///
    /// User rules are tried after the built-in table, before the `!!str`
    /// fallback. `first_chars` is the first-character fast path; pass an
    /// empty string to also match the empty scalar.
    pub fn register(&mut self, tag: &str, first_chars: &str, regex: Regex) {
        self.user_rules.push(UserRule {
            tag: String::from(tag),
            first: String::from(first_chars),
            matches_empty: first_chars.is_empty(),
            regex,
        });
    }

    /// Resolve the tag of a node.
    pub fn resolve(
        &self,
        kind: NodeKind,
        tag: Option<&str>,
        value: &str,
        implicit: bool,
    ) -> String {
        // A missing tag and the non-specific "!" both resolve by kind.
        if let Some(tag) = tag {
            if tag != "!" {
                return String::from(tag);
            }
        }
        match kind {
            NodeKind::Sequence => String::from(DEFAULT_SEQUENCE_TAG),
            NodeKind::Mapping => String::from(DEFAULT_MAPPING_TAG),
            NodeKind::Scalar => {
                if !implicit || tag.is_some() {
                    return String::from(DEFAULT_SCALAR_TAG);
                }
                self.resolve_implicit_scalar(value)
            }
        }
    }

    fn resolve_implicit_scalar(&self, value: &str) -> String {
        let first = value.chars().next();
        for rule in &self.rules {
            let candidate = match first {
                Some(ch) => rule.first.contains(ch),
                None => rule.matches_empty,
            };
            if candidate && rule.regex.is_match(value) {
                return String::from(rule.tag);
            }
        }
        for rule in &self.user_rules {
            let candidate = match first {
                Some(ch) => rule.first.contains(ch),
                None => rule.matches_empty,
            };
            if candidate && rule.regex.is_match(value) {
                return rule.tag.clone();
            }
        }
        String::from(DEFAULT_SCALAR_TAG)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn implicit(value: &str) -> String {
        Resolver::new().resolve(NodeKind::Scalar, None, value, true)
    }

    #[test]
    fn bools() {
        for value in ["yes", "No", "TRUE", "off", "On"] {
            assert_eq!(implicit(value), BOOL_TAG, "{value}");
        }
        assert_eq!(implicit("y"), DEFAULT_SCALAR_TAG);
    }

    #[test]
    fn ints() {
        for value in ["0", "42", "-17", "0b1010_1010", "0x_0A_74_AE", "0o7"] {
            // 0o7 is YAML 1.2 syntax; 1.1 octals are plain 0-prefixed.
            if value == "0o7" {
                assert_eq!(implicit(value), DEFAULT_SCALAR_TAG);
            } else {
                assert_eq!(implicit(value), INT_TAG, "{value}");
            }
        }
        assert_eq!(implicit("0755"), INT_TAG);
        assert_eq!(implicit("190:20:30"), INT_TAG);
    }

    #[test]
    fn floats() {
        for value in ["3.14", "-0.5", "6.8523015e+5", ".inf", "-.Inf", ".NaN"] {
            assert_eq!(implicit(value), FLOAT_TAG, "{value}");
        }
        // The 1.1 grammar requires a signed exponent.
        assert_eq!(implicit("1e5"), DEFAULT_SCALAR_TAG);
        assert_eq!(implicit("190:20:30.15"), FLOAT_TAG);
    }

    #[test]
    fn nulls() {
        for value in ["~", "null", "Null", "NULL", ""] {
            assert_eq!(implicit(value), NULL_TAG, "{value:?}");
        }
    }

    #[test]
    fn timestamps() {
        for value in [
            "2002-12-14",
            "2001-12-15T02:59:43.1Z",
            "2001-12-14 21:59:43.10 -5",
        ] {
            assert_eq!(implicit(value), TIMESTAMP_TAG, "{value}");
        }
    }

    #[test]
    fn merge_and_value() {
        assert_eq!(implicit("<<"), MERGE_TAG);
        assert_eq!(implicit("="), VALUE_TAG);
    }

    #[test]
    fn explicit_tag_wins() {
        let resolver = Resolver::new();
        assert_eq!(
            resolver.resolve(NodeKind::Scalar, Some("!custom"), "42", false),
            "!custom"
        );
    }

    #[test]
    fn non_specific_tag_resolves_by_kind() {
        let resolver = Resolver::new();
        assert_eq!(
            resolver.resolve(NodeKind::Sequence, Some("!"), "", true),
            DEFAULT_SEQUENCE_TAG
        );
        assert_eq!(
            resolver.resolve(NodeKind::Scalar, Some("!"), "42", true),
            DEFAULT_SCALAR_TAG
        );
    }

    #[test]
    fn user_rule_extends_table() {
        let mut resolver = Resolver::new();
        resolver.register(
            "!hexcolor",
            "#",
            Regex::new(r"^#[0-9a-fA-F]{6}$").unwrap(),
        );
        assert_eq!(
            resolver.resolve(NodeKind::Scalar, None, "#ff00aa", true),
            "!hexcolor"
        );
    }

    #[test]
    fn resolution_is_deterministic() {
        let resolver = Resolver::new();
        for value in ["42", "yes", "", "3.14", "<<", "2002-12-14"] {
            let a = resolver.resolve(NodeKind::Scalar, None, value, true);
            let b = resolver.resolve(NodeKind::Scalar, None, value, true);
            assert_eq!(a, b);
        }
    }
}
