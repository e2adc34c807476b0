use crate::classify::{classify, ValueType};
use crate::rules::{CustomDiffer, DifferOutcome, Preprocessor, RuleSet};
use joey_common::{Change, ChangePath, JoeyError, Meta, Op, Path, Processed, Value};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Equality used for scalar comparisons in place of strict equality
pub type PrimitiveEquality = Arc<dyn Fn(&Value, &Value) -> bool + Send + Sync>;

static UNDEFINED: Value = Value::Undefined;

/// Everything a [`JsonDiffer`] is built from
#[derive(Clone, Default)]
pub struct DiffOptions {
    /// Path patterns whose subtrees are never compared
    pub blacklist: Vec<String>,
    /// Transforms applied to both sides before comparing, keyed by path pattern
    pub preprocessors: Vec<(String, Preprocessor)>,
    /// Comparators replacing the default comparison, keyed by path pattern
    pub differs: Vec<(String, CustomDiffer)>,
    /// Accept properties that only exist in the target
    pub allow_new_target_properties: bool,
    /// Report paths as key sequences instead of dot-joined strings
    pub return_path_as_sequence: bool,
    /// Comparator for values outside the JSON type set
    pub extended_types_differ: Option<CustomDiffer>,
    /// Scalar equality used instead of strict equality
    pub primitive_equality: Option<PrimitiveEquality>,
}

impl DiffOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blacklist<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.blacklist.extend(patterns.into_iter().map(Into::into));
        self
    }

    pub fn with_preprocessor<F>(mut self, pattern: impl Into<String>, preprocessor: F) -> Self
    where
        F: Fn(&Value, &Value) -> Processed + Send + Sync + 'static,
    {
        self.preprocessors.push((pattern.into(), Arc::new(preprocessor)));
        self
    }

    pub fn with_differ<F>(mut self, pattern: impl Into<String>, differ: F) -> Self
    where
        F: Fn(&Value, &Value, &Path) -> DifferOutcome + Send + Sync + 'static,
    {
        self.differs.push((pattern.into(), Arc::new(differ)));
        self
    }

    pub fn with_allow_new_target_properties(mut self, allow: bool) -> Self {
        self.allow_new_target_properties = allow;
        self
    }

    pub fn with_path_as_sequence(mut self, enabled: bool) -> Self {
        self.return_path_as_sequence = enabled;
        self
    }

    pub fn with_extended_types_differ<F>(mut self, differ: F) -> Self
    where
        F: Fn(&Value, &Value, &Path) -> DifferOutcome + Send + Sync + 'static,
    {
        self.extended_types_differ = Some(Arc::new(differ));
        self
    }

    pub fn with_primitive_equality<F>(mut self, equality: F) -> Self
    where
        F: Fn(&Value, &Value) -> bool + Send + Sync + 'static,
    {
        self.primitive_equality = Some(Arc::new(equality));
        self
    }
}

impl fmt::Debug for DiffOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn patterns<T>(rules: &[(String, T)]) -> Vec<&str> {
            rules.iter().map(|(pattern, _)| pattern.as_str()).collect()
        }

        f.debug_struct("DiffOptions")
            .field("blacklist", &self.blacklist)
            .field("preprocessors", &patterns(&self.preprocessors))
            .field("differs", &patterns(&self.differs))
            .field("allow_new_target_properties", &self.allow_new_target_properties)
            .field("return_path_as_sequence", &self.return_path_as_sequence)
            .field("extended_types_differ", &self.extended_types_differ.is_some())
            .field("primitive_equality", &self.primitive_equality.is_some())
            .finish()
    }
}

/// Both sides of a comparison, before and after preprocessing
struct Sides<'a> {
    source: &'a Value,
    target: &'a Value,
    processed: Option<&'a Processed>,
}

impl<'a> Sides<'a> {
    fn processed_source(&self) -> &'a Value {
        self.processed.map_or(self.source, |p| &p.source)
    }

    fn processed_target(&self) -> &'a Value {
        self.processed.map_or(self.target, |p| &p.target)
    }
}

/// Structural differ for JSON-like values
pub struct JsonDiffer {
    rules: RuleSet,
    allow_new_target_properties: bool,
    return_path_as_sequence: bool,
    extended_types_differ: Option<CustomDiffer>,
    primitive_equality: Option<PrimitiveEquality>,
}

impl JsonDiffer {
    pub fn new(options: DiffOptions) -> Self {
        Self {
            rules: RuleSet::new(options.blacklist, options.preprocessors, options.differs),
            allow_new_target_properties: options.allow_new_target_properties,
            return_path_as_sequence: options.return_path_as_sequence,
            extended_types_differ: options.extended_types_differ,
            primitive_equality: options.primitive_equality,
        }
    }

    /// Compare two values and list their differences in traversal order.
    ///
    /// Fails as a whole on the first error; no partial results are returned.
    pub fn diff(&self, source: &Value, target: &Value) -> Result<Vec<Change>, JoeyError> {
        self.diff_at(source, target, &Path::root())
    }

    /// Compare two values as if they were found at `path`
    pub fn diff_at(
        &self,
        source: &Value,
        target: &Value,
        path: &Path,
    ) -> Result<Vec<Change>, JoeyError> {
        let mut changes = Vec::new();
        self.diff_into(source, target, path, &mut changes)?;
        Ok(changes)
    }

    fn diff_into(
        &self,
        source: &Value,
        target: &Value,
        path: &Path,
        changes: &mut Vec<Change>,
    ) -> Result<(), JoeyError> {
        let resolution = self.rules.resolve(path)?;

        if resolution.excluded {
            return Ok(());
        }

        let processed = resolution
            .preprocessor
            .map(|preprocessor| preprocessor(source, target));
        let sides = Sides {
            source,
            target,
            processed: processed.as_ref(),
        };

        if let Some(differ) = resolution.differ {
            self.custom_compare(differ, &sides, path, changes);
            return Ok(());
        }

        let types = classify(sides.processed_source(), path)
            .and_then(|s| Ok((s, classify(sides.processed_target(), path)?)));

        let (source_type, target_type) = match types {
            Ok(types) => types,
            Err(err @ JoeyError::UnsupportedType { .. }) => {
                let Some(differ) = &self.extended_types_differ else {
                    return Err(err);
                };
                debug!("Delegating \"{}\" to the extended types differ: {}", path, err);
                self.custom_compare(differ, &sides, path, changes);
                return Ok(());
            }
            Err(err) => return Err(err),
        };

        if source_type.is_primitive() || target_type.is_primitive() {
            self.compare_primitives(&sides, source_type, target_type, path, changes);
            Ok(())
        } else {
            self.compare_containers(
                sides.processed_source(),
                sides.processed_target(),
                path,
                changes,
            )
        }
    }

    fn custom_compare(
        &self,
        differ: &CustomDiffer,
        sides: &Sides<'_>,
        path: &Path,
        changes: &mut Vec<Change>,
    ) {
        let DifferOutcome { are_equal, mut meta } =
            differ(sides.processed_source(), sides.processed_target(), path);

        if are_equal {
            return;
        }

        if let Some(processed) = sides.processed {
            meta.preprocessor = Some(processed.clone());
        }

        changes.push(self.change(path, sides.source, sides.target, meta));
    }

    fn compare_primitives(
        &self,
        sides: &Sides<'_>,
        source_type: ValueType,
        target_type: ValueType,
        path: &Path,
        changes: &mut Vec<Change>,
    ) {
        let source = sides.processed_source();
        let target = sides.processed_target();
        let are_equal = match &self.primitive_equality {
            Some(equality) => equality(source, target),
            None => source.strict_eq(target),
        };

        if are_equal {
            return;
        }

        let mut meta = if source_type == target_type {
            Meta::new(Op::Replace, format!("different {}s", source_type))
        } else if source_type == ValueType::Undefined && !self.allow_new_target_properties {
            Meta::new(Op::Add, "value appeared")
        } else if target_type == ValueType::Undefined {
            Meta::new(Op::Remove, "value disappeared")
        } else {
            Meta::new(
                Op::Replace,
                format!("type changed from \"{}\" to \"{}\"", source_type, target_type),
            )
        };

        if let Some(processed) = sides.processed {
            meta.preprocessor = Some(processed.clone());
        }

        changes.push(self.change(path, sides.source, sides.target, meta));
    }

    /// Objects and arrays alike: members of the source first, then members
    /// that only the target has.
    fn compare_containers(
        &self,
        source: &Value,
        target: &Value,
        path: &Path,
        changes: &mut Vec<Change>,
    ) -> Result<(), JoeyError> {
        for (key, source_value) in source.members() {
            let target_value = target.get(&key).unwrap_or(&UNDEFINED);
            self.diff_into(source_value, target_value, &path.child(key), changes)?;
        }

        if self.allow_new_target_properties {
            return Ok(());
        }

        for (key, target_value) in target.members() {
            if target_value.is_undefined() || source.contains_key(&key) {
                continue;
            }

            let child = path.child(key);
            if self.rules.resolve(&child)?.excluded {
                continue;
            }

            changes.push(self.change(
                &child,
                &UNDEFINED,
                target_value,
                Meta::new(Op::Add, "value appeared"),
            ));
        }

        Ok(())
    }

    fn change(&self, path: &Path, source: &Value, target: &Value, meta: Meta) -> Change {
        Change {
            path: ChangePath::new(path, self.return_path_as_sequence),
            source: source.clone(),
            target: target.clone(),
            meta,
        }
    }
}

impl Default for JsonDiffer {
    fn default() -> Self {
        Self::new(DiffOptions::default())
    }
}
