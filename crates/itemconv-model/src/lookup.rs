use std::collections::HashMap;

/// Header names keyed by their lower-cased form. The first spelling seen for
/// a given key is the one kept.
#[derive(Debug, Clone, Default)]
pub struct CaseInsensitiveSet {
    map: HashMap<String, String>,
}

impl CaseInsensitiveSet {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut map = HashMap::new();
        for name in names {
            let name = name.as_ref();
            map.entry(fold(name)).or_insert_with(|| name.to_string());
        }
        Self { map }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.map.get(&fold(name)).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(&fold(name))
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

fn fold(name: &str) -> String {
    name.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_spelling_wins() {
        let set = CaseInsensitiveSet::new(["Ean No.", "EAN NO.", "Family"]);
        assert_eq!(set.get("ean no."), Some("Ean No."));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn lookup_ignores_case_and_padding() {
        let set = CaseInsensitiveSet::new(["OLD Item-variant"]);
        assert!(set.contains(" old item-VARIANT "));
        assert!(!set.contains("old item variant"));
    }
}
