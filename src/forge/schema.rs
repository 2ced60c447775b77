use super::error::Error;
use crate::model::tag::{Tag, fold_key};
use crate::model::value::{SiteValue, TagValue};
use serde::Deserialize;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::OnceLock;

const DEFAULT_TAGS_TOML: &str = include_str!("../../resources/tags.toml");

static DEFAULT_SCHEMA: OnceLock<TagSchema> = OnceLock::new();

/// Value shape accepted by a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Arity {
    Scalar,
    Vector3,
    PerSiteScalar,
    PerSiteVector3,
    String,
    Boolean,
}

impl Arity {
    /// Whether values of this arity go through site-property resolution.
    #[inline]
    pub fn is_site(&self) -> bool {
        matches!(self, Arity::PerSiteScalar | Arity::PerSiteVector3)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Arity::Scalar => "scalar",
            Arity::Vector3 => "vector3",
            Arity::PerSiteScalar => "per-site-scalar",
            Arity::PerSiteVector3 => "per-site-vector3",
            Arity::String => "string",
            Arity::Boolean => "boolean",
        }
    }
}

/// One enumerated value of a tag's domain.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Choice {
    Int(i64),
    Text(String),
}

impl std::fmt::Display for Choice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Choice::Int(i) => write!(f, "{i}"),
            Choice::Text(s) => f.write_str(s),
        }
    }
}

/// Numeric and enumerated constraints on a tag's value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Domain {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub integer: bool,
    pub choices: Vec<Choice>,
    /// Expected `floor(log10(|v|))` of nonzero values.
    pub magnitude: Option<i32>,
}

impl Domain {
    pub fn within_bounds(&self, value: f64) -> bool {
        self.min.is_none_or(|min| value >= min) && self.max.is_none_or(|max| value <= max)
    }

    pub fn has_integer_choices(&self) -> bool {
        self.choices.iter().any(|c| matches!(c, Choice::Int(_)))
    }

    pub fn has_text_choices(&self) -> bool {
        self.choices.iter().any(|c| matches!(c, Choice::Text(_)))
    }

    pub fn allows_int(&self, value: i64) -> bool {
        !self.has_integer_choices() || self.choices.contains(&Choice::Int(value))
    }

    /// Exact string choice match.
    pub fn allows_text(&self, value: &str) -> bool {
        !self.has_text_choices()
            || self
                .choices
                .iter()
                .any(|c| matches!(c, Choice::Text(t) if t == value))
    }

    /// The schema spelling of a choice matched case-insensitively.
    pub fn text_choice_folded(&self, value: &str) -> Option<&str> {
        let folded = fold_key(value);
        self.choices.iter().find_map(|c| match c {
            Choice::Text(t) if fold_key(t) == folded => Some(t.as_str()),
            _ => None,
        })
    }

    pub fn describe_choices(&self) -> String {
        self.choices
            .iter()
            .map(Choice::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A recognized INCAR tag.
#[derive(Debug, Clone, PartialEq)]
pub struct TagDefinition {
    pub tag: Tag,
    /// Alternative spellings, upper-cased.
    pub aliases: Vec<String>,
    pub arity: Arity,
    pub domain: Domain,
    pub default: Option<TagValue>,
    /// A per-site scalar tag whose elements may also be 3-vectors.
    pub vector_form: bool,
    /// Axis receiving a uniform scalar for vector-valued site tags.
    pub broadcast_axis: Option<usize>,
    pub structure_column: Option<String>,
    pub description: Option<String>,
}

impl TagDefinition {
    #[inline]
    pub fn name(&self) -> &str {
        self.tag.name()
    }

    /// Whether site values of this tag may be 3-vectors.
    pub fn accepts_vectors(&self) -> bool {
        self.arity == Arity::PerSiteVector3 || self.vector_form
    }

    /// Whether site values of this tag must be 3-vectors.
    pub fn requires_vectors(&self) -> bool {
        self.arity == Arity::PerSiteVector3
    }

    /// Name of the per-site structure column read for structure-derived
    /// values.
    pub fn column_name(&self) -> String {
        self.structure_column
            .clone()
            .unwrap_or_else(|| self.tag.name().to_ascii_lowercase())
    }

    /// Fill value for sites a specification leaves unset.
    pub fn site_default(&self, vector: bool) -> SiteValue {
        let scalar = match &self.default {
            Some(TagValue::Vector(v)) if v.len() == 3 => {
                if vector {
                    return SiteValue::Vector([v[0], v[1], v[2]]);
                }
                0.0
            }
            Some(value) => value.as_f64().unwrap_or(0.0),
            None => 0.0,
        };
        if !vector {
            return SiteValue::Scalar(scalar);
        }
        match self.broadcast_axis {
            Some(axis) => {
                let mut v = [0.0; 3];
                v[axis] = scalar;
                SiteValue::Vector(v)
            }
            None => SiteValue::Vector([scalar; 3]),
        }
    }
}

/// Trigger of a [`CoherenceRule`].
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Present,
    True,
    Equals(TagValue),
    VectorSites,
    ScalarSites,
}

/// A cross-tag consistency rule.
///
/// When `tag` satisfies `when`, at least one of `requires_any` must be set
/// (unless empty) and none of `forbids_true` may be `.TRUE.`. A companion
/// listed in `requires_values` only counts when it holds that value. The optional
/// `fix` is the companion tag assignment that resolves a missing
/// requirement.
#[derive(Debug, Clone, PartialEq)]
pub struct CoherenceRule {
    pub tag: Tag,
    pub when: Condition,
    pub requires_any: Vec<Tag>,
    pub requires_values: Vec<(Tag, TagValue)>,
    pub forbids_true: Vec<Tag>,
    pub fix: Option<(Tag, TagValue)>,
    pub message: Option<String>,
}

impl CoherenceRule {
    /// The value `companion` must hold to satisfy the rule, if constrained.
    pub fn required_value(&self, companion: &Tag) -> Option<&TagValue> {
        self.requires_values
            .iter()
            .find(|(tag, _)| tag == companion)
            .map(|(_, value)| value)
    }
}

/// The table of recognized tags, their aliases and coherence rules.
///
/// Read-only once built; the built-in schema is shared process-wide.
#[derive(Debug, Clone)]
pub struct TagSchema {
    index_base: usize,
    definitions: BTreeMap<Tag, TagDefinition>,
    spellings: BTreeMap<String, Tag>,
    rules: Vec<CoherenceRule>,
}

impl TagSchema {
    /// The schema compiled into the library.
    pub fn builtin() -> &'static TagSchema {
        DEFAULT_SCHEMA.get_or_init(|| {
            TagSchema::from_toml(DEFAULT_TAGS_TOML)
                .expect("Failed to parse embedded tag schema. This is a library bug.")
        })
    }

    pub fn from_toml(source: &str) -> Result<Self, Error> {
        let file: SchemaFile = toml::from_str(source)?;
        file.build()
    }

    /// Base of the integer keys in index-keyed site specifications.
    #[inline]
    pub fn index_base(&self) -> usize {
        self.index_base
    }

    /// Exact (case-insensitive) lookup of a canonical name or alias.
    pub fn lookup(&self, key: &str) -> Option<&Tag> {
        self.spellings.get(&fold_key(key))
    }

    pub fn definition(&self, tag: &str) -> Option<&TagDefinition> {
        self.definitions.get(tag)
    }

    pub fn definitions(&self) -> impl Iterator<Item = &TagDefinition> {
        self.definitions.values()
    }

    /// Every accepted spelling with the tag it names.
    pub fn spellings(&self) -> impl Iterator<Item = (&str, &Tag)> {
        self.spellings.iter().map(|(k, t)| (k.as_str(), t))
    }

    pub fn rules(&self) -> &[CoherenceRule] {
        &self.rules
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

/// Returns the custom schema if one is given, else the built-in one.
pub fn load_schema(custom_toml: Option<&str>) -> Result<Cow<'static, TagSchema>, Error> {
    match custom_toml {
        Some(toml) => Ok(Cow::Owned(TagSchema::from_toml(toml)?)),
        None => Ok(Cow::Borrowed(TagSchema::builtin())),
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SchemaFile {
    #[serde(default)]
    index_base: usize,
    #[serde(default)]
    tags: BTreeMap<String, DefinitionEntry>,
    #[serde(default)]
    rules: Vec<RuleEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DefinitionEntry {
    arity: Arity,
    #[serde(default)]
    aliases: Vec<String>,
    default: Option<SchemaValue>,
    min: Option<f64>,
    max: Option<f64>,
    #[serde(default)]
    integer: bool,
    #[serde(default)]
    choices: Vec<Choice>,
    magnitude: Option<i32>,
    #[serde(default)]
    vector_form: bool,
    broadcast_axis: Option<usize>,
    structure_column: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RuleEntry {
    tag: String,
    #[serde(default)]
    when: ConditionKind,
    equals: Option<SchemaValue>,
    #[serde(default)]
    requires_any: Vec<String>,
    #[serde(default)]
    requires_values: BTreeMap<String, SchemaValue>,
    #[serde(default)]
    forbids_true: Vec<String>,
    fix: Option<FixEntry>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FixEntry {
    tag: String,
    value: SchemaValue,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ConditionKind {
    #[default]
    Present,
    True,
    Equals,
    VectorSites,
    ScalarSites,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum SchemaValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<f64>),
}

impl From<SchemaValue> for TagValue {
    fn from(value: SchemaValue) -> Self {
        match value {
            SchemaValue::Bool(b) => TagValue::Bool(b),
            SchemaValue::Int(i) => TagValue::Int(i),
            SchemaValue::Float(f) => TagValue::Float(f),
            SchemaValue::Text(s) => TagValue::Text(s),
            SchemaValue::List(v) => TagValue::Vector(v),
        }
    }
}

impl SchemaFile {
    fn build(self) -> Result<TagSchema, Error> {
        let mut definitions = BTreeMap::new();
        let mut spellings: BTreeMap<String, Tag> = BTreeMap::new();

        for (name, entry) in self.tags {
            let tag = Tag::new(&name);
            let definition = entry.into_definition(tag.clone())?;

            for spelling in std::iter::once(tag.name().to_string())
                .chain(definition.aliases.iter().cloned())
            {
                if let Some(existing) = spellings.get(&spelling) {
                    if *existing != tag {
                        return Err(Error::InvalidSchema(format!(
                            "spelling '{spelling}' is claimed by both {existing} and {tag}"
                        )));
                    }
                }
                spellings.insert(spelling, tag.clone());
            }

            if definitions.insert(tag.clone(), definition).is_some() {
                return Err(Error::InvalidSchema(format!("tag {tag} is defined twice")));
            }
        }

        let known = |name: &str| -> Result<Tag, Error> {
            let tag = Tag::new(name);
            if definitions.contains_key(&tag) {
                Ok(tag)
            } else {
                Err(Error::InvalidSchema(format!(
                    "coherence rule references undefined tag {tag}"
                )))
            }
        };

        let mut rules = Vec::with_capacity(self.rules.len());
        for entry in self.rules {
            let when = match entry.when {
                ConditionKind::Present => Condition::Present,
                ConditionKind::True => Condition::True,
                ConditionKind::Equals => match entry.equals {
                    Some(value) => Condition::Equals(value.into()),
                    None => {
                        return Err(Error::InvalidSchema(format!(
                            "rule for {} uses `when = \"equals\"` without an `equals` value",
                            entry.tag
                        )));
                    }
                },
                ConditionKind::VectorSites => Condition::VectorSites,
                ConditionKind::ScalarSites => Condition::ScalarSites,
            };
            if entry.requires_any.is_empty() && entry.forbids_true.is_empty() {
                return Err(Error::InvalidSchema(format!(
                    "rule for {} neither requires nor forbids any tag",
                    entry.tag
                )));
            }
            let fix = match entry.fix {
                Some(fix) => Some((known(&fix.tag)?, TagValue::from(fix.value))),
                None => None,
            };
            let requires_any = entry
                .requires_any
                .iter()
                .map(|t| known(t))
                .collect::<Result<Vec<_>, _>>()?;
            let mut requires_values = Vec::with_capacity(entry.requires_values.len());
            for (name, value) in entry.requires_values {
                let companion = known(&name)?;
                if !requires_any.contains(&companion) {
                    return Err(Error::InvalidSchema(format!(
                        "rule for {} constrains {companion}, which is not in `requires_any`",
                        entry.tag
                    )));
                }
                requires_values.push((companion, TagValue::from(value)));
            }
            rules.push(CoherenceRule {
                tag: known(&entry.tag)?,
                when,
                requires_any,
                requires_values,
                forbids_true: entry
                    .forbids_true
                    .iter()
                    .map(|t| known(t))
                    .collect::<Result<_, _>>()?,
                fix,
                message: entry.message,
            });
        }

        Ok(TagSchema {
            index_base: self.index_base,
            definitions,
            spellings,
            rules,
        })
    }
}

impl DefinitionEntry {
    fn into_definition(self, tag: Tag) -> Result<TagDefinition, Error> {
        let invalid = |detail: &str| Error::InvalidSchema(format!("tag {tag}: {detail}"));

        if self.vector_form && self.arity != Arity::PerSiteScalar {
            return Err(invalid("`vector_form` applies only to per-site-scalar tags"));
        }
        if let Some(axis) = self.broadcast_axis {
            if self.arity != Arity::PerSiteVector3 {
                return Err(invalid(
                    "`broadcast_axis` applies only to per-site-vector3 tags",
                ));
            }
            if axis > 2 {
                return Err(invalid("`broadcast_axis` must be 0, 1 or 2"));
            }
        }
        if self.structure_column.is_some() && !self.arity.is_site() {
            return Err(invalid("`structure_column` applies only to per-site tags"));
        }
        if let (Some(min), Some(max)) = (self.min, self.max) {
            if min > max {
                return Err(invalid("`min` exceeds `max`"));
            }
        }

        let default = self.default.map(TagValue::from);
        if let Some(TagValue::Vector(v)) = &default {
            let fits = matches!(self.arity, Arity::Vector3 | Arity::PerSiteVector3) && v.len() == 3;
            if !fits {
                return Err(invalid("list defaults must be three numbers on a vector tag"));
            }
        }

        Ok(TagDefinition {
            aliases: self.aliases.iter().map(|a| fold_key(a)).collect(),
            tag,
            arity: self.arity,
            domain: Domain {
                min: self.min,
                max: self.max,
                integer: self.integer,
                choices: self.choices,
                magnitude: self.magnitude,
            },
            default,
            vector_form: self.vector_form,
            broadcast_axis: self.broadcast_axis,
            structure_column: self.structure_column,
            description: self.description,
        })
    }
}
