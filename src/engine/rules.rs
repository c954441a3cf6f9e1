//! Ordered rule tables for reading `display set relative` output
//!
//! A [`Rules`] table holds `(pattern, action)` pairs evaluated in order. A
//! pattern `P` matches a statement equal to `P` or starting with `P ` and the
//! action receives the remainder. The first matching rule wins, so more
//! specific patterns must be registered before shorter ones sharing a prefix.
//!
//! Tables nest: [`Rules::nested`] routes the remainder into an optional block
//! and [`Rules::keyed`] into a named entry of a list, created on first use.
//!
//! ```ignore
//! static GRACEFUL_RESTART: Lazy<Rules<GracefulRestart>> = Lazy::new(|| {
//!     Rules::<GracefulRestart>::new()
//!         .flag("disable", |gr| &mut gr.disable)
//!         .rule("restart-duration", |gr, v| {
//!             gr.restart_duration = Some(parse_int("restart_duration", v)?);
//!             Ok(())
//!         })
//! });
//! ```

use tracing::debug;

use super::block::{find_or_create, Keyed};
use super::text::{config_lines, statement, SET_TOKEN};
use super::value::{split_token, unquote};
use crate::error::Result;

type Action<T> = Box<dyn Fn(&mut T, &str) -> Result<bool> + Send + Sync>;

struct Rule<T> {
    pattern: &'static str,
    action: Action<T>,
}

/// Counters of one read
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadReport {
    /// Statements routed to a field
    pub matched: usize,
    /// Statements no rule recognized
    pub unmatched: usize,
}

/// Ordered `(pattern, action)` table
pub struct Rules<T> {
    rules: Vec<Rule<T>>,
    fallback: Option<Action<T>>,
}

impl<T: 'static> Default for Rules<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> Rules<T> {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            fallback: None,
        }
    }

    /// Route statements matching `pattern` to `handler`
    pub fn rule(mut self, pattern: &'static str, handler: fn(&mut T, &str) -> Result<()>) -> Self {
        self.rules.push(Rule {
            pattern,
            action: Box::new(move |target, rest| handler(target, rest).map(|_| true)),
        });
        self
    }

    /// Route statements matching `pattern` to `handler`, which may decline
    /// the remainder with `Ok(false)` so the line is reported unmatched
    pub fn try_rule(
        mut self,
        pattern: &'static str,
        handler: fn(&mut T, &str) -> Result<bool>,
    ) -> Self {
        self.rules.push(Rule {
            pattern,
            action: Box::new(handler),
        });
        self
    }

    /// Set a boolean field when `pattern` is present
    pub fn flag(mut self, pattern: &'static str, field: fn(&mut T) -> &mut bool) -> Self {
        self.rules.push(Rule {
            pattern,
            action: Box::new(move |target, _| {
                *field(target) = true;
                Ok(true)
            }),
        });
        self
    }

    /// Store the unquoted remainder in an optional string field
    pub fn string(mut self, pattern: &'static str, field: fn(&mut T) -> &mut Option<String>) -> Self {
        self.rules.push(Rule {
            pattern,
            action: Box::new(move |target, rest| {
                *field(target) = Some(unquote(rest));
                Ok(true)
            }),
        });
        self
    }

    /// Append the unquoted remainder to a list field
    pub fn list(mut self, pattern: &'static str, field: fn(&mut T) -> &mut Vec<String>) -> Self {
        self.rules.push(Rule {
            pattern,
            action: Box::new(move |target, rest| {
                field(target).push(unquote(rest));
                Ok(true)
            }),
        });
        self
    }

    /// Route the remainder into an optional block, creating it if absent
    pub fn nested<U: Default + 'static>(
        mut self,
        pattern: &'static str,
        block: fn(&mut T) -> &mut Option<U>,
        rules: &'static Rules<U>,
    ) -> Self {
        self.rules.push(Rule {
            pattern,
            action: Box::new(move |target, rest| {
                let inner = block(target).get_or_insert_with(U::default);
                if rest.is_empty() {
                    Ok(true)
                } else {
                    rules.apply(inner, rest)
                }
            }),
        });
        self
    }

    /// Route the remainder into the list entry named by its first token.
    ///
    /// The entry is created on first use unless the remainder is unmatched.
    pub fn keyed<U: Keyed + 'static>(
        mut self,
        pattern: &'static str,
        list: fn(&mut T) -> &mut Vec<U>,
        rules: &'static Rules<U>,
    ) -> Self {
        self.rules.push(Rule {
            pattern,
            action: Box::new(move |target, rest| {
                let (key, rest) = split_token(rest);
                if key.is_empty() {
                    return Ok(false);
                }
                let entries = list(target);
                let existed = entries.iter().any(|entry| entry.key() == key);
                let entry = find_or_create(entries, &key);
                if rest.is_empty() {
                    return Ok(true);
                }
                let matched = rules.apply(entry, rest)?;
                // An unrecognized statement must not leave a new entry behind
                if !matched && !existed {
                    entries.pop();
                }
                Ok(matched)
            }),
        });
        self
    }

    /// Handle statements no pattern matched; `Ok(false)` leaves them unmatched
    pub fn otherwise(mut self, handler: fn(&mut T, &str) -> Result<bool>) -> Self {
        self.fallback = Some(Box::new(handler));
        self
    }

    /// Apply the first matching rule; `Ok(false)` when none matched
    pub fn apply(&self, target: &mut T, statement: &str) -> Result<bool> {
        for rule in &self.rules {
            if let Some(rest) = match_pattern(statement, rule.pattern) {
                return (rule.action)(target, rest);
            }
        }
        match self.fallback {
            Some(ref fallback) if !statement.is_empty() => fallback(target, statement),
            _ => Ok(false),
        }
    }

    /// Read every `set` statement of a configuration dump into `target`
    pub fn read(&self, target: &mut T, output: &str) -> Result<ReadReport> {
        let mut report = ReadReport::default();
        for line in config_lines(output) {
            // Bare `set` is the stanza itself
            if line == SET_TOKEN {
                continue;
            }
            let matched = match statement(line) {
                Some(statement) => self.apply(target, statement)?,
                None => false,
            };
            if matched {
                report.matched += 1;
            } else {
                report.unmatched += 1;
                debug!(line = %line, "Ignoring unrecognized configuration line");
            }
        }
        Ok(report)
    }
}

/// Remainder of `statement` after `pattern`, if it matches
fn match_pattern<'a>(statement: &'a str, pattern: &str) -> Option<&'a str> {
    if statement == pattern {
        return Some("");
    }
    statement
        .strip_prefix(pattern)?
        .strip_prefix(' ')
        .map(str::trim_start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::value::parse_int;
    use once_cell::sync::Lazy;

    #[derive(Debug, Default, PartialEq)]
    struct Restart {
        disable: bool,
        duration: Option<i64>,
    }

    #[derive(Debug, Default, PartialEq)]
    struct Member {
        name: String,
        tags: Vec<String>,
    }

    impl Keyed for Member {
        fn key(&self) -> &str {
            &self.name
        }

        fn with_key(key: &str) -> Self {
            Self {
                name: key.to_string(),
                ..Default::default()
            }
        }
    }

    #[derive(Debug, Default, PartialEq)]
    struct Sample {
        flag: bool,
        no_flag: bool,
        text: Option<String>,
        items: Vec<String>,
        restart: Option<Restart>,
        members: Vec<Member>,
        number: Option<String>,
    }

    static RESTART: Lazy<Rules<Restart>> = Lazy::new(|| {
        Rules::<Restart>::new()
            .flag("disable", |r| &mut r.disable)
            .rule("restart-duration", |r, v| {
                r.duration = Some(parse_int("restart_duration", v)?);
                Ok(())
            })
    });

    static MEMBER: Lazy<Rules<Member>> =
        Lazy::new(|| Rules::<Member>::new().list("tag", |m| &mut m.tags));

    static SAMPLE: Lazy<Rules<Sample>> = Lazy::new(|| {
        Rules::<Sample>::new()
            .flag("flag", |s| &mut s.flag)
            .flag("no-flag", |s| &mut s.no_flag)
            .string("text", |s| &mut s.text)
            .list("item", |s| &mut s.items)
            .nested("graceful-restart", |s| &mut s.restart, &RESTART)
            .keyed("member", |s| &mut s.members, &MEMBER)
    });

    #[test]
    fn test_match_pattern() {
        assert_eq!(match_pattern("flag", "flag"), Some(""));
        assert_eq!(match_pattern("flag x", "flag"), Some("x"));
        assert_eq!(match_pattern("flagged", "flag"), None);
        assert_eq!(match_pattern("no-flag", "flag"), None);
    }

    #[test]
    fn test_read_populates_fields() {
        let output = "<configuration-output>\n\
                      set\n\
                      set flag\n\
                      set text \"two words\"\n\
                      set item b\n\
                      set item a\n\
                      set graceful-restart\n\
                      set graceful-restart restart-duration 300\n\
                      set member m1 tag x\n\
                      set member m2\n\
                      set member m1 tag y\n\
                      set future-knob on\n\
                      </configuration-output>";
        let mut sample = Sample::default();
        let report = SAMPLE.read(&mut sample, output).unwrap();

        assert!(sample.flag);
        assert!(!sample.no_flag);
        assert_eq!(sample.text.as_deref(), Some("two words"));
        assert_eq!(sample.items, vec!["b", "a"]);
        assert_eq!(
            sample.restart,
            Some(Restart {
                disable: false,
                duration: Some(300)
            })
        );
        assert_eq!(sample.members.len(), 2);
        assert_eq!(sample.members[0].tags, vec!["x", "y"]);
        assert_eq!(report, ReadReport { matched: 9, unmatched: 1 });
    }

    #[test]
    fn test_nested_unknown_is_counted() {
        let mut sample = Sample::default();
        let report = SAMPLE
            .read(&mut sample, "set graceful-restart helper-disable")
            .unwrap();
        assert!(sample.restart.is_some());
        assert_eq!(report.unmatched, 1);
    }

    #[test]
    fn test_keyed_unknown_does_not_create_entry() {
        let mut sample = Sample::default();
        let report = SAMPLE
            .read(&mut sample, "set member m1 tag x\nset member m2 colour red\nset member m1 colour red")
            .unwrap();
        assert_eq!(sample.members.len(), 1);
        assert_eq!(sample.members[0].tags, vec!["x"]);
        assert_eq!(report, ReadReport { matched: 1, unmatched: 2 });
    }

    #[test]
    fn test_malformed_integer_fails() {
        let mut sample = Sample::default();
        let err = SAMPLE
            .read(&mut sample, "set graceful-restart restart-duration soon")
            .unwrap_err();
        assert!(err.to_string().contains("restart_duration"));
        assert!(err.to_string().contains("soon"));
    }

    #[test]
    fn test_otherwise_handles_bare_values() {
        let rules = Rules::<Sample>::new()
            .flag("flag", |s| &mut s.flag)
            .otherwise(|s, v| {
                if !v.bytes().all(|b| b.is_ascii_digit()) {
                    return Ok(false);
                }
                s.number = Some(v.to_string());
                Ok(true)
            });
        let mut sample = Sample::default();
        let report = rules
            .read(&mut sample, "set 65000\nset flag\nset sixty-five")
            .unwrap();
        assert_eq!(sample.number.as_deref(), Some("65000"));
        assert!(sample.flag);
        assert_eq!(report, ReadReport { matched: 2, unmatched: 1 });
    }

    #[test]
    fn test_try_rule_can_decline() {
        let rules = Rules::<Sample>::new().try_rule("text", |s, v| {
            if v.contains(' ') {
                return Ok(false);
            }
            s.text = Some(v.to_string());
            Ok(true)
        });
        let mut sample = Sample::default();
        let report = rules
            .read(&mut sample, "set text one\nset text two words")
            .unwrap();
        assert_eq!(sample.text.as_deref(), Some("one"));
        assert_eq!(report, ReadReport { matched: 1, unmatched: 1 });
    }
}
