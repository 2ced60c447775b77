use crate::forge::ValidationPolicy;
use crate::io::error::Error;
use crate::model::document::RawDocument;
use crate::model::structure::{Site, Structure};
use crate::model::value::{RawValue, SiteValue};
use serde::Deserialize;
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::io::Read;
use tracing::debug;

/// Everything the pipeline needs from one YAML input deck.
#[derive(Debug, Clone, PartialEq)]
pub struct InputDeck {
    pub structure: Structure,
    /// The `incar` section, keys in file order.
    pub incar: RawDocument,
    pub validation: ValidationPolicy,
}

pub fn read_deck<R: Read>(reader: R) -> Result<InputDeck, Error> {
    let root: Value = serde_yaml::from_reader(reader)?;
    deck_from_value(root)
}

pub fn read_deck_str(text: &str) -> Result<InputDeck, Error> {
    let root: Value = serde_yaml::from_str(text)?;
    deck_from_value(root)
}

/// Reads a flat YAML mapping of tags, such as a base-default document.
pub fn read_tags_yaml<R: Read>(reader: R) -> Result<RawDocument, Error> {
    let root: Value = serde_yaml::from_reader(reader)?;
    raw_document(root)
}

fn deck_from_value(root: Value) -> Result<InputDeck, Error> {
    let Value::Mapping(sections) = root else {
        return Err(Error::invalid("input deck must be a mapping of sections"));
    };

    let mut structure = None;
    let mut incar = None;
    let mut validation = ValidationPolicy::default();

    for (key, value) in sections {
        let name = key_string(&key)?;
        match name.as_str() {
            "structure" => {
                let entry: StructureEntry = serde_yaml::from_value(value)?;
                structure = Some(entry.into_structure()?);
            }
            "incar" => incar = Some(raw_document(value)?),
            "validation" if value.is_null() => {}
            "validation" => validation = serde_yaml::from_value(value)?,
            other => debug!(section = other, "ignoring input deck section"),
        }
    }

    let structure = structure.ok_or_else(|| Error::invalid("missing 'structure' section"))?;
    let incar = incar.ok_or_else(|| Error::invalid("missing 'incar' section"))?;
    debug!(
        sites = structure.site_count(),
        tags = incar.len(),
        warn = validation.warn,
        correct = validation.correct,
        "read input deck"
    );
    Ok(InputDeck {
        structure,
        incar,
        validation,
    })
}

fn raw_document(value: Value) -> Result<RawDocument, Error> {
    match value {
        Value::Null => Ok(RawDocument::new()),
        Value::Mapping(entries) => entries
            .into_iter()
            .map(|(key, value)| -> Result<(String, RawValue), Error> {
                let key = key_string(&key)?;
                let value = raw_value(value)
                    .map_err(|details| Error::invalid(format!("tag {key}: {details}")))?;
                Ok((key, value))
            })
            .collect(),
        _ => Err(Error::invalid("tags must be given as a mapping")),
    }
}

fn raw_value(value: Value) -> Result<RawValue, String> {
    match value {
        Value::Null => Err("value is empty".to_string()),
        Value::Bool(b) => Ok(RawValue::Bool(b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Ok(RawValue::Int(i)),
            None => n
                .as_f64()
                .map(RawValue::Float)
                .ok_or_else(|| format!("number {n} is out of range")),
        },
        Value::String(s) => Ok(RawValue::Str(s)),
        Value::Sequence(items) => items
            .into_iter()
            .map(raw_value)
            .collect::<Result<Vec<_>, _>>()
            .map(RawValue::List),
        Value::Mapping(entries) => entries
            .into_iter()
            .map(|(key, value)| -> Result<(String, RawValue), String> {
                let key = key_string(&key).map_err(|e| e.to_string())?;
                Ok((key, raw_value(value)?))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(RawValue::Map),
        Value::Tagged(tagged) => raw_value(tagged.value),
    }
}

/// Mapping keys may be written as numbers (`{4: 2.0}`); they are kept as
/// their decimal text.
fn key_string(key: &Value) -> Result<String, Error> {
    match key {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(Error::invalid(format!(
            "mapping keys must be scalars, found {other:?}"
        ))),
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct StructureEntry {
    #[serde(default)]
    mode: Option<String>,
    #[serde(default)]
    lattice: Option<LatticeEntry>,
    species: Vec<SpeciesEntry>,
    #[serde(default, alias = "positions")]
    coords: Option<Vec<[f64; 3]>>,
    #[serde(default)]
    labels: Option<Vec<String>>,
    #[serde(default)]
    properties: BTreeMap<String, Vec<PropertyEntry>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LatticeEntry {
    Matrix([[f64; 3]; 3]),
    Parameters {
        a: f64,
        b: f64,
        c: f64,
        alpha: f64,
        beta: f64,
        gamma: f64,
    },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SpeciesEntry {
    Symbol(String),
    Counted(BTreeMap<String, usize>),
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
enum PropertyEntry {
    Scalar(f64),
    Vector([f64; 3]),
}

impl From<PropertyEntry> for SiteValue {
    fn from(entry: PropertyEntry) -> Self {
        match entry {
            PropertyEntry::Scalar(v) => SiteValue::Scalar(v),
            PropertyEntry::Vector(v) => SiteValue::Vector(v),
        }
    }
}

impl StructureEntry {
    fn into_structure(self) -> Result<Structure, Error> {
        if let Some(mode) = self.mode.as_deref().filter(|m| *m != "manual") {
            return Err(Error::invalid(format!(
                "structure mode '{mode}' is not supported; only 'manual' structures can be read"
            )));
        }

        let species = expand_species(self.species)?;
        let n = species.len();
        if n == 0 {
            return Err(Error::invalid("structure lists no species"));
        }

        let coords = self.coords.unwrap_or_else(|| vec![[0.0; 3]; n]);
        check_len("coords", coords.len(), n)?;
        if let Some(labels) = &self.labels {
            check_len("labels", labels.len(), n)?;
        }
        for (name, column) in &self.properties {
            check_len(&format!("properties.{name}"), column.len(), n)?;
        }

        let mut labels = self.labels.map(Vec::into_iter);
        let mut sites: Vec<Site> = species
            .into_iter()
            .zip(coords)
            .map(|(symbol, position)| {
                let site = Site::new(symbol, position);
                match labels.as_mut().and_then(|rest| rest.next()) {
                    Some(label) => site.with_label(label),
                    None => site,
                }
            })
            .collect();
        for (name, column) in self.properties {
            for (site, value) in sites.iter_mut().zip(column) {
                site.properties.insert(name.clone(), value.into());
            }
        }

        Ok(Structure {
            lattice: self.lattice.map(LatticeEntry::into_matrix),
            sites,
        })
    }
}

impl LatticeEntry {
    fn into_matrix(self) -> [[f64; 3]; 3] {
        match self {
            LatticeEntry::Matrix(m) => m,
            LatticeEntry::Parameters {
                a,
                b,
                c,
                alpha,
                beta,
                gamma,
            } => {
                let (ca, cb, cg) = (
                    alpha.to_radians().cos(),
                    beta.to_radians().cos(),
                    gamma.to_radians().cos(),
                );
                let sg = gamma.to_radians().sin();
                let cy = (ca - cb * cg) / sg;
                let cz = (1.0 - cb * cb - cy * cy).max(0.0).sqrt();
                [[a, 0.0, 0.0], [b * cg, b * sg, 0.0], [c * cb, c * cy, c * cz]]
            }
        }
    }
}

fn expand_species(entries: Vec<SpeciesEntry>) -> Result<Vec<String>, Error> {
    let mut species = Vec::new();
    for entry in entries {
        match entry {
            SpeciesEntry::Symbol(symbol) => species.push(symbol),
            SpeciesEntry::Counted(counts) => {
                if counts.len() != 1 {
                    return Err(Error::invalid(
                        "each counted species entry must be a single {symbol: count} pair",
                    ));
                }
                for (symbol, count) in counts {
                    species.extend(std::iter::repeat(symbol).take(count));
                }
            }
        }
    }
    Ok(species)
}

fn check_len(field: &str, found: usize, expected: usize) -> Result<(), Error> {
    if found == expected {
        Ok(())
    } else {
        Err(Error::invalid(format!(
            "structure {field} has {found} entries but there are {expected} sites"
        )))
    }
}
