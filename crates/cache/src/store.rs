use crate::error::{ErrorKind, Result};
use cssnames_rename::{LogicalKey, NameMapping};
use exn::ResultExt;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// Contents of one persisted target.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Document {
    /// Many stylesheets sharing one file, keyed by logical key. `None` marks a
    /// stylesheet that currently declares no names; it overrides whatever is
    /// on disk for that key and is left out when rendering.
    Shared(BTreeMap<String, Option<NameMapping>>),
    /// A file holding the mapping of exactly one stylesheet.
    Single(NameMapping),
}

/// In-memory name mappings, grouped by the target file they persist to.
#[derive(Debug, Default)]
pub struct NameStore {
    documents: HashMap<PathBuf, Document>,
}

impl NameStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the names declared by the stylesheet `key` into the shared
    /// document at `target`.
    ///
    /// An empty mapping is recorded as an explicit marker rather than
    /// skipped, so a stylesheet that lost all of its selectors removes its
    /// stale entry on the next save.
    pub fn record(&mut self, target: &Path, key: &LogicalKey, names: NameMapping) {
        let entry = (!names.is_empty()).then_some(names);
        match self.documents.get_mut(target) {
            Some(Document::Shared(entries)) => {
                entries.insert(key.to_string(), entry);
            },
            _ => {
                let entries = BTreeMap::from([(key.to_string(), entry)]);
                self.documents.insert(target.to_path_buf(), Document::Shared(entries));
            },
        }
    }

    /// Replaces the document at `target` with the names of a single
    /// stylesheet.
    pub fn record_file(&mut self, target: &Path, names: NameMapping) {
        self.documents.insert(target.to_path_buf(), Document::Single(names));
    }

    /// Folds what is currently persisted at `target` into memory. Entries
    /// already held in memory win; a single-stylesheet document is entirely
    /// owned by memory, so the disk is ignored.
    ///
    /// # Errors
    /// Returns [`ErrorKind::InvalidData`] if `persisted` is neither empty nor
    /// a JSON object of name mappings.
    pub fn merge_from_disk(&mut self, target: &Path, persisted: &[u8]) -> Result<()> {
        if matches!(self.documents.get(target), Some(Document::Single(_))) {
            return Ok(());
        }
        let on_disk: BTreeMap<String, Option<NameMapping>> = match persisted.trim_ascii().is_empty() {
            true => BTreeMap::new(),
            false => serde_json::from_slice(persisted).or_raise(|| ErrorKind::InvalidData(target.to_path_buf()))?,
        };
        let document =
            self.documents.entry(target.to_path_buf()).or_insert_with(|| Document::Shared(BTreeMap::new()));
        if let Document::Shared(entries) = document {
            for (key, names) in on_disk {
                entries.entry(key).or_insert(names);
            }
        }
        Ok(())
    }

    /// Serializes the document at `target` as compact JSON with sorted keys.
    /// Unknown targets render as an empty object.
    pub fn render(&self, target: &Path) -> Result<String> {
        let rendered = match self.documents.get(target) {
            Some(Document::Shared(entries)) => {
                let present: BTreeMap<&str, &NameMapping> =
                    entries.iter().filter_map(|(key, names)| Some((key.as_str(), names.as_ref()?))).collect();
                serde_json::to_string(&present)
            },
            Some(Document::Single(names)) => serde_json::to_string(names),
            None => Ok("{}".to_string()),
        };
        rendered.or_raise(|| ErrorKind::Serialize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const TARGET: &str = "class-names.json";

    fn names(pairs: &[(&str, &str)]) -> NameMapping {
        pairs.iter().map(|(name, uid)| (name.to_string(), uid.to_string())).collect()
    }

    fn render(store: &NameStore) -> String {
        store.render(Path::new(TARGET)).unwrap()
    }

    #[test]
    fn test_record_renders_sorted() {
        let mut store = NameStore::new();
        store.record(Path::new(TARGET), &LogicalKey::from("b"), names(&[("title", "tG5vJ")]));
        store.record(Path::new(TARGET), &LogicalKey::from("a"), names(&[("foo", "_FS3B"), ("box", "_4QF9")]));
        assert_eq!(render(&store), r#"{"a":{"box":"_4QF9","foo":"_FS3B"},"b":{"title":"tG5vJ"}}"#);
    }

    #[test]
    fn test_record_replaces_key() {
        let mut store = NameStore::new();
        store.record(Path::new(TARGET), &LogicalKey::from("a"), names(&[("box", "_4QF9")]));
        store.record(Path::new(TARGET), &LogicalKey::from("a"), names(&[("bar", "mDK9I")]));
        assert_eq!(render(&store), r#"{"a":{"bar":"mDK9I"}}"#);
    }

    #[test]
    fn test_targets_are_independent() {
        let mut store = NameStore::new();
        store.record(Path::new("one.json"), &LogicalKey::from("a"), names(&[("box", "_4QF9")]));
        store.record(Path::new("two.json"), &LogicalKey::from("b"), names(&[("title", "tG5vJ")]));
        assert_eq!(store.render(Path::new("one.json")).unwrap(), r#"{"a":{"box":"_4QF9"}}"#);
        assert_eq!(store.render(Path::new("two.json")).unwrap(), r#"{"b":{"title":"tG5vJ"}}"#);
        assert_eq!(store.render(Path::new("three.json")).unwrap(), "{}");
    }

    #[test]
    fn test_merge_memory_wins() {
        let mut store = NameStore::new();
        store.record(Path::new(TARGET), &LogicalKey::from("a"), names(&[("box", "_4QF9")]));
        let disk = br#"{"a":{"box":"stale"},"z":{"item":"IsZ-r"}}"#;
        store.merge_from_disk(Path::new(TARGET), disk).unwrap();
        assert_eq!(render(&store), r#"{"a":{"box":"_4QF9"},"z":{"item":"IsZ-r"}}"#);
    }

    #[test]
    fn test_empty_mapping_removes_stale_entry() {
        let mut store = NameStore::new();
        store.record(Path::new(TARGET), &LogicalKey::from("a"), NameMapping::new());
        store.merge_from_disk(Path::new(TARGET), br#"{"a":{"box":"_4QF9"},"b":null}"#).unwrap();
        assert_eq!(render(&store), "{}");
    }

    #[test]
    fn test_merge_into_unknown_target() {
        let mut store = NameStore::new();
        store.merge_from_disk(Path::new(TARGET), br#"{"a":{"box":"_4QF9"}}"#).unwrap();
        assert_eq!(render(&store), r#"{"a":{"box":"_4QF9"}}"#);
    }

    #[rstest]
    #[case(b"")]
    #[case(b"  \n")]
    #[case(b"{}")]
    fn test_merge_empty_disk(#[case] disk: &[u8]) {
        let mut store = NameStore::new();
        store.record(Path::new(TARGET), &LogicalKey::from("a"), names(&[("box", "_4QF9")]));
        store.merge_from_disk(Path::new(TARGET), disk).unwrap();
        assert_eq!(render(&store), r#"{"a":{"box":"_4QF9"}}"#);
    }

    #[rstest]
    #[case(b"not json")]
    #[case(b"[1, 2]")]
    #[case(br#"{"a": 5}"#)]
    fn test_merge_invalid_disk(#[case] disk: &[u8]) {
        let mut store = NameStore::new();
        let err = store.merge_from_disk(Path::new(TARGET), disk).unwrap_err();
        assert_eq!(*err, ErrorKind::InvalidData(PathBuf::from(TARGET)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_single_document() {
        let mut store = NameStore::new();
        let target = Path::new("class-names/a.json");
        store.record_file(target, NameMapping::new());
        assert_eq!(store.render(target).unwrap(), "{}");
        store.record_file(target, names(&[("box", "_4QF9")]));
        store.merge_from_disk(target, br#"{"old":"value"}"#).unwrap();
        assert_eq!(store.render(target).unwrap(), r#"{"box":"_4QF9"}"#);
    }
}
