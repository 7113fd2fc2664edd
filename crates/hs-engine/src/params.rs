//! Ordered command parameter map.

/// Ordered name/value parameter map.
///
/// Parameters are raw strings as written in the script; they may contain
/// `${...}` tokens that are only resolved during the run phase. Insertion
/// order is preserved for round-tripping the script text form.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParamMap {
    entries: Vec<(String, String)>,
}

impl ParamMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter, replacing an existing value in place.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        if let Some(entry) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            entry.1 = value;
        } else {
            self.entries.push((name, value));
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Value of a parameter, or a default when absent or empty.
    pub fn get_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        match self.get(name) {
            Some(v) if !v.is_empty() => v,
            _ => default,
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ParamMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.set(k, v);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_insertion_order() {
        let mut map = ParamMap::new();
        map.set("TSID", "A.Flow.Day");
        map.set("NewTSID", "B.Flow.Day");
        map.set("TSID", "C.Flow.Day");
        let names: Vec<&str> = map.names().collect();
        assert_eq!(names, vec!["TSID", "NewTSID"]);
        assert_eq!(map.get("TSID"), Some("C.Flow.Day"));
    }

    #[test]
    fn get_or_treats_empty_as_absent() {
        let mut map = ParamMap::new();
        map.set("TSList", "");
        assert_eq!(map.get_or("TSList", "AllTS"), "AllTS");
        map.set("TSList", "FirstMatchingTSID");
        assert_eq!(map.get_or("TSList", "AllTS"), "FirstMatchingTSID");
    }
}
