use serde_json::Value;

/// One named group of inspection points, ready for display. The field names
/// mirror the service vocabulary: a `seccion` is a grouping such as "frenos"
/// and its `puntos` are the individual points recorded under it.
///
/// The points are kept as the raw JSON values found in the payload; nothing is
/// coerced to a string here, consumers render them verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct RevisionSection {
    pub seccion: String,
    pub puntos: Vec<Value>,
}

/// The revision payload after the string-vs-object ambiguity has been resolved.
///
/// The service has stored the revision in two shapes over time: a native JSON
/// object mapping section names to point lists, and a stringified rendition of
/// that object which delimits keys and values with single quotes. This enum is
/// the only place where that distinction exists; everything downstream consumes
/// a tagged value.
#[derive(Debug, Clone, PartialEq)]
pub enum Revision {
    /// No revision was recorded, or the recorded one could not be interpreted.
    Empty,
    /// The section mapping, in the key order of the source object.
    Mapping(serde_json::Map<String, Value>),
}

impl Revision {
    /// Resolves a raw revision value into a tagged `Revision`.
    ///
    /// String payloads use single quotes as delimiters, so every apostrophe is
    /// replaced with a double quote before parsing. This reproduces the
    /// service contract and shares its known fragility: an apostrophe inside a
    /// legitimate value (say, "driver's seat") corrupts the substitution and
    /// the whole revision is dropped. Such failures are logged and absorbed,
    /// the report still renders without its revision sections.
    pub fn from_raw(raw: &Value) -> Revision {
        match raw {
            Value::String(encoded) => {
                let quoted = encoded.replace('\'', "\"");
                match serde_json::from_str::<Value>(&quoted) {
                    Ok(Value::Object(mapping)) => Revision::Mapping(mapping),
                    Ok(other) => {
                        log::warn!(
                            "The revision string decoded to a non-object value {:?}, ignoring it",
                            other
                        );
                        Revision::Empty
                    }
                    Err(error) => {
                        log::error!("Unable to parse the revision string: {}", error);
                        Revision::Empty
                    }
                }
            }
            Value::Object(mapping) => Revision::Mapping(mapping.clone()),
            Value::Null => Revision::Empty,
            other => {
                log::warn!("The revision has an unexpected shape {:?}, ignoring it", other);
                Revision::Empty
            }
        }
    }
}

/// Converts a raw revision value into the ordered list of sections to display.
///
/// Only entries whose value is an actual array are kept; anything else (a bare
/// string, a number, a nested object) is dropped by design. The output order
/// is the key order of the source mapping, no sorting is applied.
pub fn normalize(raw: &Value) -> Vec<RevisionSection> {
    let mapping = match Revision::from_raw(raw) {
        Revision::Mapping(mapping) => mapping,
        Revision::Empty => return Vec::new(),
    };

    mapping
        .into_iter()
        .filter_map(|(seccion, value)| match value {
            Value::Array(puntos) => Some(RevisionSection { seccion, puntos }),
            _ => None,
        })
        .collect()
}
