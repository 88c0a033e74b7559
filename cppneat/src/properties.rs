use crate::ConfigError;

use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;
use std::str::FromStr;

/// A flat key→value configuration source, such as
/// the contents of a `key = value` properties file.
///
/// Every accessor comes in a required form, which fails
/// with [`ConfigError::MissingProperty`] when the key is
/// absent, and an `_or` form falling back to a default.
/// Values that fail to parse are always an error.
///
/// # Examples
/// ```
/// use cppneat::Properties;
///
/// let props: Properties = [("popul.size", "50"), ("selector.elitism", "false")]
///     .into_iter()
///     .collect();
///
/// assert_eq!(props.get_usize("popul.size").unwrap(), 50);
/// assert!(!props.get_bool_or("selector.elitism", true).unwrap());
/// assert_eq!(props.get_f64_or("survival.rate", 0.2).unwrap(), 0.2);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Properties {
    entries: BTreeMap<String, String>,
}

impl Properties {
    /// Returns an empty property set.
    pub fn new() -> Properties {
        Properties::default()
    }

    /// Parses `key = value` lines. Blank lines and lines starting
    /// with `#` or `!` are ignored, as are lines without a separator.
    /// Both `=` and `:` separate keys from values.
    ///
    /// # Examples
    /// ```
    /// use cppneat::Properties;
    ///
    /// let props = Properties::parse("# run\npopul.size = 20\nrecurrent: lazy\n");
    ///
    /// assert_eq!(props.get_str("popul.size").unwrap(), "20");
    /// assert_eq!(props.get_str("recurrent").unwrap(), "lazy");
    /// ```
    pub fn parse(source: &str) -> Properties {
        source
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with('!'))
            .filter_map(|line| line.split_once(|c| c == '=' || c == ':'))
            .map(|(key, value)| (key.trim(), value.trim()))
            .collect()
    }

    /// Sets `key` to `value`, returning the previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl ToString) -> Option<String> {
        self.entries.insert(key.into(), value.to_string())
    }

    /// Returns whether `key` is present.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Returns an iterator over all entries, in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn get_str(&self, key: &str) -> Result<&str, ConfigError> {
        self.entries
            .get(key)
            .map(|v| v.trim())
            .ok_or_else(|| ConfigError::MissingProperty(key.to_string()))
    }

    pub fn get_str_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.entries.get(key).map_or(default, |v| v.trim())
    }

    /// Parses the value of `key` with [`FromStr`].
    pub fn get_enum<T>(&self, key: &str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: Display,
    {
        let value = self.get_str(key)?;
        value.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: e.to_string(),
        })
    }

    pub fn get_enum_or<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: Display,
    {
        if self.contains(key) {
            self.get_enum(key)
        } else {
            Ok(default)
        }
    }

    /// Accepts `true`/`false` in any case.
    pub fn get_bool(&self, key: &str) -> Result<bool, ConfigError> {
        let value = self.get_str(key)?;
        match value.to_ascii_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(ConfigError::InvalidValue {
                key: key.to_string(),
                value: value.to_string(),
                reason: "expected true or false".to_string(),
            }),
        }
    }

    pub fn get_bool_or(&self, key: &str, default: bool) -> Result<bool, ConfigError> {
        if self.contains(key) {
            self.get_bool(key)
        } else {
            Ok(default)
        }
    }

    pub fn get_usize(&self, key: &str) -> Result<usize, ConfigError> {
        self.get_enum(key)
    }

    pub fn get_usize_or(&self, key: &str, default: usize) -> Result<usize, ConfigError> {
        self.get_enum_or(key, default)
    }

    pub fn get_u64(&self, key: &str) -> Result<u64, ConfigError> {
        self.get_enum(key)
    }

    pub fn get_u64_or(&self, key: &str, default: u64) -> Result<u64, ConfigError> {
        self.get_enum_or(key, default)
    }

    pub fn get_f64(&self, key: &str) -> Result<f64, ConfigError> {
        self.get_enum(key)
    }

    pub fn get_f64_or(&self, key: &str, default: f64) -> Result<f64, ConfigError> {
        self.get_enum_or(key, default)
    }

    /// Splits a comma separated value into its trimmed,
    /// non-empty items.
    pub fn get_list(&self, key: &str) -> Result<Vec<String>, ConfigError> {
        Ok(self
            .get_str(key)?
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect())
    }

    pub fn get_list_or(&self, key: &str, default: &[&str]) -> Vec<String> {
        self.get_list(key)
            .unwrap_or_else(|_| default.iter().map(|s| s.to_string()).collect())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Properties {
        Properties {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl From<HashMap<String, String>> for Properties {
    fn from(map: HashMap<String, String>) -> Properties {
        map.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::RecurrencyPolicy;

    #[test]
    fn missing_and_invalid_values() {
        let props: Properties = [("popul.size", "many"), ("selector.elitism", "yes")]
            .into_iter()
            .collect();

        assert!(matches!(
            props.get_f64("weight.max"),
            Err(ConfigError::MissingProperty(key)) if key == "weight.max"
        ));
        assert!(matches!(
            props.get_usize_or("popul.size", 10),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            props.get_bool("selector.elitism"),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn enums_and_lists() {
        let mut props = Properties::new();
        props.set("recurrent", "best_guess");
        props.set("input.labels", " bias, d,x ,y,");

        assert_eq!(
            props.get_enum::<RecurrencyPolicy>("recurrent").unwrap(),
            RecurrencyPolicy::BestGuess
        );
        assert_eq!(props.get_list("input.labels").unwrap(), ["bias", "d", "x", "y"]);
        assert_eq!(props.get_list_or("output.labels", &["ink"]), ["ink"]);
    }

    #[test]
    fn parse_ignores_comments_and_whitespace() {
        let props = Properties::parse("! header\n\n  weight.max = 5.5  \nbroken line\n");
        assert_eq!(props.iter().count(), 1);
        assert_eq!(props.get_f64("weight.max").unwrap(), 5.5);
    }
}
