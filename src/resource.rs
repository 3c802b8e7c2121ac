use std::collections::HashSet;

/// The resource(s) a verifier is willing to accept: one name or a set of names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resources<'a> {
    One(&'a str),
    Many(HashSet<&'a str>),
}

impl<'a> Resources<'a> {
    /// Normalise to a set of accepted names.
    pub fn to_set(&self) -> HashSet<&'a str> {
        match self {
            Resources::One(name) => HashSet::from([*name]),
            Resources::Many(names) => names.clone(),
        }
    }

    pub fn contains(&self, resource: &str) -> bool {
        match self {
            Resources::One(name) => *name == resource,
            Resources::Many(names) => names.contains(resource),
        }
    }
}

impl<'a> From<&'a str> for Resources<'a> {
    fn from(name: &'a str) -> Self {
        Resources::One(name)
    }
}

impl<'a> From<&'a String> for Resources<'a> {
    fn from(name: &'a String) -> Self {
        Resources::One(name.as_str())
    }
}

impl<'a> From<&'a [&'a str]> for Resources<'a> {
    fn from(names: &'a [&'a str]) -> Self {
        Resources::Many(names.iter().copied().collect())
    }
}

impl<'a, const N: usize> From<&'a [&'a str; N]> for Resources<'a> {
    fn from(names: &'a [&'a str; N]) -> Self {
        Resources::Many(names.iter().copied().collect())
    }
}

impl<'a> From<&'a [String]> for Resources<'a> {
    fn from(names: &'a [String]) -> Self {
        Resources::Many(names.iter().map(String::as_str).collect())
    }
}

impl<'a> From<&'a Vec<String>> for Resources<'a> {
    fn from(names: &'a Vec<String>) -> Self {
        Resources::from(names.as_slice())
    }
}

impl<'a> From<HashSet<&'a str>> for Resources<'a> {
    fn from(names: HashSet<&'a str>) -> Self {
        Resources::Many(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_name_is_a_one_element_set() {
        let r = Resources::from("alice@example.org");
        assert_eq!(r.to_set().len(), 1);
        assert!(r.contains("alice@example.org"));
        assert!(!r.contains("bob@example.org"));
    }

    #[test]
    fn many_names_match_any_member() {
        let owned = vec!["a@x".to_owned(), "b@x".to_owned()];
        let r = Resources::from(&owned);
        assert!(r.contains("a@x"));
        assert!(r.contains("b@x"));
        assert!(!r.contains("c@x"));
    }

    #[test]
    fn empty_set_matches_nothing() {
        let r = Resources::from(HashSet::new());
        assert!(!r.contains(""));
    }
}
