use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::{RequestError, Result};

/// Header value supplied by the caller.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum HeaderArg {
    /// Replaces any existing value.
    Single(String),
    /// Appends each entry as an additional value.
    Multi(Vec<String>),
    /// Any other scalar, already rendered to text; replaces like `Single`.
    Other(String),
}

impl HeaderArg {
    pub fn other(value: impl ToString) -> Self {
        Self::Other(value.to_string())
    }
}

impl From<&str> for HeaderArg {
    fn from(value: &str) -> Self {
        Self::Single(value.to_owned())
    }
}

impl From<String> for HeaderArg {
    fn from(value: String) -> Self {
        Self::Single(value)
    }
}

impl From<Vec<String>> for HeaderArg {
    fn from(values: Vec<String>) -> Self {
        Self::Multi(values)
    }
}

impl From<Vec<&str>> for HeaderArg {
    fn from(values: Vec<&str>) -> Self {
        Self::Multi(values.into_iter().map(str::to_owned).collect())
    }
}

impl<const N: usize> From<[&str; N]> for HeaderArg {
    fn from(values: [&str; N]) -> Self {
        Self::Multi(values.iter().map(|value| (*value).to_owned()).collect())
    }
}

macro_rules! header_arg_from_display {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for HeaderArg {
                fn from(value: $ty) -> Self {
                    Self::other(value)
                }
            }
        )*
    };
}

header_arg_from_display!(bool, char, i32, i64, u16, u32, u64, usize, f64);

/// Ordered header entries applied to every attempt.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Headers {
    entries: Vec<(String, HeaderArg)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry, builder style.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<HeaderArg>) -> Self {
        self.push(name, value);
        self
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<HeaderArg>) {
        self.entries.push((name.into(), value.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &HeaderArg)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }
}

impl<K, V> FromIterator<(K, V)> for Headers
where
    K: Into<String>,
    V: Into<HeaderArg>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for Headers
where
    K: Into<String>,
    V: Into<HeaderArg>,
{
    fn from(entries: [(K, V); N]) -> Self {
        entries.into_iter().collect()
    }
}

/// Applies caller headers: `Single`/`Other` set, `Multi` appends.
pub(crate) fn apply_headers(map: &mut HeaderMap, headers: &Headers) -> Result<()> {
    for (name, value) in headers.iter() {
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|err| {
            RequestError::create_request(format!("invalid header name {name:?}"), err)
        })?;
        match value {
            HeaderArg::Single(value) | HeaderArg::Other(value) => {
                map.insert(header_name, header_value(name, value)?);
            }
            HeaderArg::Multi(values) => {
                for value in values {
                    map.append(header_name.clone(), header_value(name, value)?);
                }
            }
        }
    }
    Ok(())
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|err| {
        RequestError::create_request(format!("invalid value for header {name:?}"), err)
    })
}

/// Treats an absent or empty header value as unset.
pub(crate) fn is_unset(map: &HeaderMap, name: &HeaderName) -> bool {
    map.get(name).map_or(true, |value| value.is_empty())
}

#[cfg(test)]
mod tests {
    use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};

    use super::{apply_headers, is_unset, HeaderArg, Headers};
    use crate::RequestError;

    #[test]
    fn single_replaces_existing_value() {
        let mut map = HeaderMap::new();
        map.insert("x-trace", HeaderValue::from_static("old"));

        apply_headers(&mut map, &Headers::new().with("X-Trace", "new")).expect("valid headers");

        let values: Vec<_> = map.get_all("x-trace").iter().collect();
        assert_eq!(values, vec!["new"]);
    }

    #[test]
    fn multi_appends_each_value() {
        let mut map = HeaderMap::new();
        map.insert("x-tag", HeaderValue::from_static("a"));

        apply_headers(&mut map, &Headers::new().with("x-tag", ["b", "c"])).expect("valid headers");

        let values: Vec<_> = map.get_all("x-tag").iter().collect();
        assert_eq!(values, vec!["a", "b", "c"]);
    }

    #[test]
    fn scalars_are_stringified() {
        let headers = Headers::from([
            ("x-count", HeaderArg::from(42i64)),
            ("x-flag", HeaderArg::from(true)),
            ("x-ratio", HeaderArg::from(1.5)),
        ]);
        let mut map = HeaderMap::new();
        apply_headers(&mut map, &headers).expect("valid headers");

        assert_eq!(map["x-count"], "42");
        assert_eq!(map["x-flag"], "true");
        assert_eq!(map["x-ratio"], "1.5");
        assert_eq!(HeaderArg::from(7u16), HeaderArg::Other("7".to_owned()));
    }

    #[test]
    fn invalid_name_is_create_request_error() {
        let mut map = HeaderMap::new();
        let err = apply_headers(&mut map, &Headers::new().with("bad header", "v"))
            .expect_err("space is not a token character");
        assert!(matches!(err, RequestError::CreateRequest { .. }));
        assert!(err.to_string().starts_with("create request: "));
    }

    #[test]
    fn empty_value_counts_as_unset() {
        let mut map = HeaderMap::new();
        assert!(is_unset(&map, &ACCEPT));
        map.insert(ACCEPT, HeaderValue::from_static(""));
        assert!(is_unset(&map, &ACCEPT));
        map.insert(ACCEPT, HeaderValue::from_static("text/csv"));
        assert!(!is_unset(&map, &ACCEPT));
    }
}
