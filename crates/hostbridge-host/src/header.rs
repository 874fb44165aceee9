/// A header name with every value sent under it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub name: String,
    pub values: Vec<String>,
}

impl Header {
    pub fn new(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// Host-side header map: name to ordered value sequence.
///
/// Lookups are case-insensitive. Entries keep first-insertion order, and
/// the spelling of a name is the one used when it was first inserted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    entries: Vec<Header>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Add `value` to the values stored under `name`.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        match self.position(&name) {
            Some(i) => self.entries[i].values.push(value.into()),
            None => self.entries.push(Header::new(name, vec![value.into()])),
        }
    }

    /// Replace every value stored under `name`.
    pub fn set<I, V>(&mut self, name: impl Into<String>, values: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let name = name.into();
        let values = values.into_iter().map(Into::into).collect();
        match self.position(&name) {
            Some(i) => self.entries[i].values = values,
            None => self.entries.push(Header::new(name, values)),
        }
    }

    /// All values for `name` (case-insensitive).
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.position(name).map(|i| self.entries[i].values.as_slice())
    }

    /// The first value for `name`.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// The value for `name` if exactly one was sent.
    pub fn single(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Some([value]) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn remove(&mut self, name: &str) -> Option<Vec<String>> {
        self.position(name).map(|i| self.entries.remove(i).values)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Header> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_vec(self) -> Vec<Header> {
        self.entries
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|h| h.name.eq_ignore_ascii_case(name))
    }
}

impl FromIterator<(String, String)> for HeaderMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (name, value) in iter {
            map.append(name, value);
        }
        map
    }
}

impl<'a> IntoIterator for &'a HeaderMap {
    type Item = &'a Header;
    type IntoIter = std::slice::Iter<'a, Header>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_merges_case_insensitively() {
        let mut map = HeaderMap::new();
        map.append("Accept", "text/html");
        map.append("accept", "application/json");

        assert_eq!(map.len(), 1);
        assert_eq!(
            map.get("ACCEPT").unwrap(),
            &["text/html".to_string(), "application/json".to_string()]
        );
        assert_eq!(map.iter().next().unwrap().name, "Accept");
    }

    #[test]
    fn set_replaces_existing_values() {
        let mut map = HeaderMap::new();
        map.append("content-type", "text/html");
        map.set("Content-Type", ["text/plain"]);

        assert_eq!(map.len(), 1);
        assert_eq!(map.single("content-type"), Some("text/plain"));
    }

    #[test]
    fn single_requires_exactly_one_value() {
        let mut map = HeaderMap::new();
        map.set("Content-Length", ["10", "12"]);
        assert_eq!(map.single("Content-Length"), None);
        assert_eq!(map.first("Content-Length"), Some("10"));

        map.set("Content-Length", Vec::<String>::new());
        assert_eq!(map.single("Content-Length"), None);
        assert_eq!(map.first("Content-Length"), None);
    }

    #[test]
    fn missing_header() {
        let map = HeaderMap::new();
        assert!(map.get("X-Missing").is_none());
        assert!(!map.contains("X-Missing"));
    }

    #[test]
    fn remove_returns_values() {
        let mut map = HeaderMap::new();
        map.append("X-A", "1");
        map.append("X-B", "2");

        assert_eq!(map.remove("x-a"), Some(vec!["1".to_string()]));
        assert_eq!(map.len(), 1);
        assert_eq!(map.remove("x-a"), None);
    }

    #[test]
    fn from_iterator_groups_duplicates() {
        let map: HeaderMap = vec![
            ("Set-Cookie".to_string(), "a=1".to_string()),
            ("Host".to_string(), "example.com".to_string()),
            ("set-cookie".to_string(), "b=2".to_string()),
        ]
        .into_iter()
        .collect();

        assert_eq!(map.len(), 2);
        assert_eq!(map.get("set-cookie").unwrap().len(), 2);
        assert_eq!(map.single("host"), Some("example.com"));
    }

    #[test]
    fn into_vec_keeps_order() {
        let mut map = HeaderMap::new();
        map.append("Z", "1");
        map.append("A", "2");

        let names: Vec<_> = map.into_vec().into_iter().map(|h| h.name).collect();
        assert_eq!(names, vec!["Z", "A"]);
    }
}
