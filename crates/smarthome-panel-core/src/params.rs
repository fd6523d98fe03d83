use std::collections::BTreeMap;

/// Flat name → value set carrying both path and query data for one request.
///
/// Keys are unique; iteration (and therefore query-string order) follows the
/// sorted key order.
pub type ParamMap = BTreeMap<String, ParamValue>;

/// Separator used when a multi-valued parameter is serialized.
pub const LIST_SEPARATOR: &str = ",";

#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// Present but empty. Skipped by query serialization.
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<String>),
}

impl ParamValue {
    /// String form used on the wire, `None` for [`ParamValue::Null`].
    #[must_use]
    pub fn to_param_string(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Bool(value) => Some(value.to_string()),
            Self::Number(value) => Some(format_number(*value)),
            Self::Text(value) => Some(value.clone()),
            Self::List(values) => Some(values.join(LIST_SEPARATOR)),
        }
    }

    /// String form substituted into a path placeholder. Unlike the query,
    /// a path spells a null value out.
    #[must_use]
    pub fn to_path_string(&self) -> String {
        self.to_param_string().unwrap_or_else(|| "null".to_string())
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

pub(crate) fn format_number(value: f64) -> String {
    if value.is_infinite() {
        return if value.is_sign_negative() {
            "-Infinity".to_string()
        } else {
            "Infinity".to_string()
        };
    }
    // f64 Display already prints integral values without a fractional part.
    value.to_string()
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&String> for ParamValue {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(values: Vec<String>) -> Self {
        Self::List(values)
    }
}

impl<T: Into<ParamValue>> From<Option<T>> for ParamValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Builds a [`ParamMap`] from `(name, value)` pairs. Later duplicates win.
pub fn param_map<K, V, I>(entries: I) -> ParamMap
where
    K: Into<String>,
    V: Into<ParamValue>,
    I: IntoIterator<Item = (K, V)>,
{
    entries
        .into_iter()
        .map(|(key, value)| (key.into(), value.into()))
        .collect()
}

/// Collapses form field entries into a [`ParamMap`].
///
/// A field submitted more than once is joined into a single comma-separated
/// text value, so `tags=a&tags=b` travels as `tags=a,b`.
#[must_use]
pub fn params_from_form_entries(entries: &[(String, String)]) -> ParamMap {
    let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in entries {
        grouped.entry(name.clone()).or_default().push(value.clone());
    }

    grouped
        .into_iter()
        .map(|(name, mut values)| {
            let value = if values.len() == 1 {
                values.remove(0)
            } else {
                values.join(LIST_SEPARATOR)
            };
            (name, ParamValue::Text(value))
        })
        .collect()
}
