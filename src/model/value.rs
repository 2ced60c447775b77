use std::fmt;

/// A value exactly as supplied by an input document, before any schema is
/// applied.
///
/// Mapping entries keep their declaration order, which matters for the
/// "last declaration wins" rules applied during resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<RawValue>),
    Map(Vec<(String, RawValue)>),
}

impl RawValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            RawValue::Int(i) => Some(*i as f64),
            RawValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            RawValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, RawValue::Int(_) | RawValue::Float(_))
    }

    /// Interprets the value as a single per-site value: a number or a
    /// list of exactly three numbers.
    pub fn as_site_value(&self) -> Option<SiteValue> {
        match self {
            RawValue::Int(_) | RawValue::Float(_) => self.as_f64().map(SiteValue::Scalar),
            RawValue::List(items) if items.len() == 3 => {
                let mut v = [0.0; 3];
                for (slot, item) in v.iter_mut().zip(items) {
                    *slot = item.as_f64()?;
                }
                Some(SiteValue::Vector(v))
            }
            _ => None,
        }
    }

    /// Looks up a mapping entry; the last matching key wins.
    pub fn get(&self, key: &str) -> Option<&RawValue> {
        match self {
            RawValue::Map(entries) => entries
                .iter()
                .rev()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            RawValue::Bool(_) => "boolean",
            RawValue::Int(_) => "integer",
            RawValue::Float(_) => "real",
            RawValue::Str(_) => "string",
            RawValue::List(_) => "list",
            RawValue::Map(_) => "mapping",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SiteValue {
    Scalar(f64),
    Vector([f64; 3]),
}

impl SiteValue {
    #[inline]
    pub fn is_vector(&self) -> bool {
        matches!(self, SiteValue::Vector(_))
    }

    pub fn components(&self) -> &[f64] {
        match self {
            SiteValue::Scalar(v) => std::slice::from_ref(v),
            SiteValue::Vector(v) => v,
        }
    }
}

impl fmt::Display for SiteValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SiteValue::Scalar(v) => write!(f, "{v}"),
            SiteValue::Vector([x, y, z]) => write!(f, "[{x}, {y}, {z}]"),
        }
    }
}

/// A per-site property in canonical form.
///
/// The array variants always hold exactly one element per structure site.
/// [`CanonicalSiteArray::Raw`] carries an opaque token sequence that is
/// emitted verbatim and never expanded.
#[derive(Debug, Clone, PartialEq)]
pub enum CanonicalSiteArray {
    Scalars(Vec<f64>),
    Vectors(Vec<[f64; 3]>),
    Raw(String),
}

impl CanonicalSiteArray {
    /// Number of sites covered, or `None` for raw tokens.
    pub fn len(&self) -> Option<usize> {
        match self {
            CanonicalSiteArray::Scalars(v) => Some(v.len()),
            CanonicalSiteArray::Vectors(v) => Some(v.len()),
            CanonicalSiteArray::Raw(_) => None,
        }
    }

    pub fn is_raw(&self) -> bool {
        matches!(self, CanonicalSiteArray::Raw(_))
    }

    pub fn is_vector(&self) -> bool {
        matches!(self, CanonicalSiteArray::Vectors(_))
    }

    pub fn get(&self, index: usize) -> Option<SiteValue> {
        match self {
            CanonicalSiteArray::Scalars(v) => v.get(index).copied().map(SiteValue::Scalar),
            CanonicalSiteArray::Vectors(v) => v.get(index).copied().map(SiteValue::Vector),
            CanonicalSiteArray::Raw(_) => None,
        }
    }

    /// All numeric components in site order; vectors contribute three each.
    pub fn flatten(&self) -> Vec<f64> {
        match self {
            CanonicalSiteArray::Scalars(v) => v.clone(),
            CanonicalSiteArray::Vectors(v) => v.iter().flatten().copied().collect(),
            CanonicalSiteArray::Raw(_) => Vec::new(),
        }
    }
}

/// A tag value in a normalized document.
#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Vector(Vec<f64>),
    Sites(CanonicalSiteArray),
}

impl TagValue {
    /// Shape-preserving conversion used for tags that bypass site resolution.
    ///
    /// Lists of numbers become vectors, other lists are joined into text.
    /// Mappings have no scalar rendering and yield `None`.
    pub fn from_raw(raw: &RawValue) -> Option<Self> {
        match raw {
            RawValue::Bool(b) => Some(TagValue::Bool(*b)),
            RawValue::Int(i) => Some(TagValue::Int(*i)),
            RawValue::Float(f) => Some(TagValue::Float(*f)),
            RawValue::Str(s) => Some(TagValue::Text(s.clone())),
            RawValue::List(items) => {
                if items.iter().all(RawValue::is_number) {
                    Some(TagValue::Vector(
                        items.iter().filter_map(RawValue::as_f64).collect(),
                    ))
                } else {
                    let words: Option<Vec<String>> = items
                        .iter()
                        .map(|item| match item {
                            RawValue::Str(s) => Some(s.clone()),
                            RawValue::Int(i) => Some(i.to_string()),
                            RawValue::Float(f) => Some(f.to_string()),
                            _ => None,
                        })
                        .collect();
                    words.map(|w| TagValue::Text(w.join(" ")))
                }
            }
            RawValue::Map(_) => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            TagValue::Int(i) => Some(*i as f64),
            TagValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            TagValue::Bool(_) => "boolean",
            TagValue::Int(_) => "integer",
            TagValue::Float(_) => "real",
            TagValue::Text(_) => "string",
            TagValue::Vector(_) => "vector",
            TagValue::Sites(CanonicalSiteArray::Raw(_)) => "raw site tokens",
            TagValue::Sites(_) => "per-site array",
        }
    }

    /// Loose equality used by schema conditions: integers and reals compare
    /// numerically.
    pub fn matches(&self, other: &TagValue) -> bool {
        match (self.as_f64(), other.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => self == other,
        }
    }
}
