use joey_common::{JoeyError, Meta, Path, Processed, Value};
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};
use tracing::debug;

/// Transform applied to both sides before they are compared
pub type Preprocessor = Arc<dyn Fn(&Value, &Value) -> Processed + Send + Sync>;

/// Comparator that replaces the default comparison for a whole subtree
pub type CustomDiffer = Arc<dyn Fn(&Value, &Value, &Path) -> DifferOutcome + Send + Sync>;

/// Verdict of a custom differ. `meta` is only reported when the sides differ.
#[derive(Debug, Clone, PartialEq)]
pub struct DifferOutcome {
    pub are_equal: bool,
    pub meta: Meta,
}

impl DifferOutcome {
    pub fn equal() -> Self {
        Self {
            are_equal: true,
            meta: Meta::default(),
        }
    }

    pub fn different(meta: Meta) -> Self {
        Self {
            are_equal: false,
            meta,
        }
    }
}

/// A path pattern and everything registered under it
pub struct Rule {
    pattern: String,
    excluded: bool,
    preprocessor: Option<Preprocessor>,
    differ: Option<CustomDiffer>,
    regex: OnceLock<Result<Regex, regex::Error>>,
}

impl Rule {
    fn new(pattern: String) -> Self {
        Self {
            pattern,
            excluded: false,
            preprocessor: None,
            differ: None,
            regex: OnceLock::new(),
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn is_excluded(&self) -> bool {
        self.excluded
    }

    pub fn has_preprocessor(&self) -> bool {
        self.preprocessor.is_some()
    }

    pub fn has_differ(&self) -> bool {
        self.differ.is_some()
    }

    /// Unanchored regex test; the pattern is compiled on first use
    fn matches(&self, rendered_path: &str) -> Result<bool, JoeyError> {
        match self.regex.get_or_init(|| Regex::new(&self.pattern)) {
            Ok(regex) => Ok(regex.is_match(rendered_path)),
            Err(e) => Err(JoeyError::InvalidPattern {
                pattern: self.pattern.clone(),
                source: e.clone(),
            }),
        }
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("pattern", &self.pattern)
            .field("excluded", &self.excluded)
            .field("preprocessor", &self.preprocessor.is_some())
            .field("differ", &self.differ.is_some())
            .finish()
    }
}

/// What applies at one path
#[derive(Default)]
pub struct Resolution<'a> {
    pub excluded: bool,
    pub preprocessor: Option<&'a Preprocessor>,
    pub differ: Option<&'a CustomDiffer>,
}

/// Ordered, immutable list of path rules
#[derive(Debug, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Merge the three rule tables into one list.
    ///
    /// Rules sharing a pattern are merged into a single entry that keeps the
    /// position of the pattern's first registration: exclusions come first,
    /// then preprocessors, then differs. Patterns are not validated here.
    pub fn new(
        blacklist: Vec<String>,
        preprocessors: Vec<(String, Preprocessor)>,
        differs: Vec<(String, CustomDiffer)>,
    ) -> Self {
        let mut rules: Vec<Rule> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();

        let mut entry = |pattern: String, rules: &mut Vec<Rule>| -> usize {
            *positions.entry(pattern.clone()).or_insert_with(|| {
                rules.push(Rule::new(pattern));
                rules.len() - 1
            })
        };

        for pattern in blacklist {
            let index = entry(pattern, &mut rules);
            rules[index].excluded = true;
        }
        for (pattern, preprocessor) in preprocessors {
            let index = entry(pattern, &mut rules);
            rules[index].preprocessor = Some(preprocessor);
        }
        for (pattern, differ) in differs {
            let index = entry(pattern, &mut rules);
            rules[index].differ = Some(differ);
        }

        debug!("Built rule set with {} rules", rules.len());
        Self { rules }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// First rule whose pattern matches the dot-joined path wins. Later rules
    /// are not consulted, even if they would also match.
    pub fn resolve(&self, path: &Path) -> Result<Resolution<'_>, JoeyError> {
        if self.rules.is_empty() {
            return Ok(Resolution::default());
        }

        let rendered = path.joined();
        for rule in &self.rules {
            if rule.matches(&rendered)? {
                return Ok(Resolution {
                    excluded: rule.excluded,
                    preprocessor: rule.preprocessor.as_ref(),
                    differ: rule.differ.as_ref(),
                });
            }
        }

        Ok(Resolution::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use joey_common::Op;

    fn identity() -> Preprocessor {
        Arc::new(|s: &Value, t: &Value| Processed::new(s.clone(), t.clone()))
    }

    fn always_equal() -> CustomDiffer {
        Arc::new(|_: &Value, _: &Value, _: &Path| DifferOutcome::equal())
    }

    fn path(segments: &[&str]) -> Path {
        segments.iter().copied().collect()
    }

    #[test]
    fn test_rules_merge_by_pattern() {
        let rules = RuleSet::new(
            vec!["a".to_string()],
            vec![("b".to_string(), identity()), ("a".to_string(), identity())],
            vec![("a".to_string(), always_equal())],
        );

        assert_eq!(rules.len(), 2);
        let first = &rules.rules()[0];
        assert_eq!(first.pattern(), "a");
        assert!(first.is_excluded());
        assert!(first.has_preprocessor());
        assert!(first.has_differ());

        let second = &rules.rules()[1];
        assert_eq!(second.pattern(), "b");
        assert!(!second.is_excluded());
        assert!(!second.has_differ());
    }

    #[test]
    fn test_resolve_nested_indices() {
        let rules = RuleSet::new(
            vec![],
            vec![],
            vec![(r"genres\.(\d+)\.name".to_string(), always_equal())],
        );

        let hit = rules.resolve(&path(&["genres", "12", "name"])).unwrap();
        assert!(hit.differ.is_some());

        let miss = rules.resolve(&path(&["genres", "x", "name"])).unwrap();
        assert!(miss.differ.is_none());
        assert!(!miss.excluded);
    }

    #[test]
    fn test_resolve_is_unanchored() {
        let rules = RuleSet::new(vec!["count".to_string()], vec![], vec![]);

        assert!(!rules.resolve(&path(&["reviewsCount"])).unwrap().excluded);
        assert!(rules.resolve(&path(&["author", "count"])).unwrap().excluded);
        assert!(rules.resolve(&path(&["countries"])).unwrap().excluded);
    }

    #[test]
    fn test_first_match_wins() {
        let rules = RuleSet::new(
            vec![],
            vec![("^a".to_string(), identity())],
            vec![(r"^a\.b$".to_string(), always_equal())],
        );

        let resolution = rules.resolve(&path(&["a", "b"])).unwrap();
        assert!(resolution.preprocessor.is_some());
        assert!(resolution.differ.is_none());
    }

    #[test]
    fn test_root_path_renders_empty() {
        let rules = RuleSet::new(vec!["^$".to_string()], vec![], vec![]);
        assert!(rules.resolve(&Path::root()).unwrap().excluded);
        assert!(!rules.resolve(&path(&["a"])).unwrap().excluded);
    }

    #[test]
    fn test_invalid_pattern_fails_lazily() {
        let rules = RuleSet::new(vec!["(".to_string()], vec![], vec![]);
        assert_eq!(rules.len(), 1);

        let err = rules.resolve(&path(&["a"])).err().unwrap();
        assert!(matches!(err, JoeyError::InvalidPattern { ref pattern, .. } if pattern == "("));
    }

    #[test]
    fn test_invalid_pattern_after_match_is_not_reached() {
        let rules = RuleSet::new(vec!["^a$".to_string(), "(".to_string()], vec![], vec![]);
        assert!(rules.resolve(&path(&["a"])).unwrap().excluded);
    }

    #[test]
    fn test_differ_outcome_constructors() {
        assert!(DifferOutcome::equal().are_equal);
        let outcome = DifferOutcome::different(Meta::new(Op::Replace, "nope"));
        assert!(!outcome.are_equal);
        assert_eq!(outcome.meta.reason.as_deref(), Some("nope"));
    }
}
