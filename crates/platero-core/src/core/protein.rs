use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Catalog identifier of a protein. Identifiers are stored trimmed and upper-cased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProteinId(String);

impl ProteinId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(id.as_ref().trim().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ProteinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProteinId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A protein as known to the catalog.
///
/// Two references are equal when their ids are equal; the descriptive fields are only
/// carried along for display and grouping.
#[derive(Debug, Clone)]
pub struct ProteinRef {
    pub id: ProteinId,
    pub label: String,
    pub family: String,
    pub subfamily: String,
    pub nickname: String,
}

impl ProteinRef {
    /// A reference that only knows its id; the label falls back to the id.
    pub fn with_id(id: impl AsRef<str>) -> Self {
        let id = ProteinId::new(id);
        Self {
            label: id.to_string(),
            id,
            family: String::new(),
            subfamily: String::new(),
            nickname: String::new(),
        }
    }
}

impl PartialEq for ProteinRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ProteinRef {}

impl Hash for ProteinRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// One row of the catalog: a protein listed in a batch.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub batch: u32,
    pub order: u32,
    pub protein: ProteinRef,
    pub cloned: bool,
}

#[derive(Debug, Clone)]
struct BatchMember {
    order: u32,
    protein: ProteinId,
    cloned: bool,
}

/// Read-only snapshot of the protein catalog, loaded once per run.
#[derive(Debug, Clone, Default)]
pub struct ProteinCatalog {
    proteins: HashMap<ProteinId, ProteinRef>,
    batches: BTreeMap<u32, Vec<BatchMember>>,
}

impl ProteinCatalog {
    pub fn from_entries(entries: impl IntoIterator<Item = CatalogEntry>) -> Self {
        let mut proteins = HashMap::new();
        let mut batches: BTreeMap<u32, Vec<BatchMember>> = BTreeMap::new();

        for entry in entries {
            batches.entry(entry.batch).or_default().push(BatchMember {
                order: entry.order,
                protein: entry.protein.id.clone(),
                cloned: entry.cloned,
            });
            proteins.insert(entry.protein.id.clone(), entry.protein);
        }
        for members in batches.values_mut() {
            members.sort_by_key(|m| m.order);
        }

        Self { proteins, batches }
    }

    pub fn get(&self, id: &ProteinId) -> Option<&ProteinRef> {
        self.proteins.get(id)
    }

    pub fn len(&self) -> usize {
        self.proteins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proteins.is_empty()
    }

    pub fn batch_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.batches.keys().copied()
    }

    /// Successfully cloned proteins of a batch, in import order.
    pub fn batch_proteins(&self, batch: u32) -> Vec<ProteinRef> {
        self.batches
            .get(&batch)
            .into_iter()
            .flatten()
            .filter(|member| member.cloned)
            .filter_map(|member| self.proteins.get(&member.protein).cloned())
            .collect()
    }

    /// Whether the protein is listed in the batch, whatever its cloning status.
    pub fn batch_contains(&self, batch: u32, id: &ProteinId) -> bool {
        self.batches
            .get(&batch)
            .is_some_and(|members| members.iter().any(|m| &m.protein == id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(batch: u32, order: u32, id: &str, cloned: bool) -> CatalogEntry {
        CatalogEntry {
            batch,
            order,
            protein: ProteinRef::with_id(id),
            cloned,
        }
    }

    #[test]
    fn ids_are_normalized() {
        assert_eq!(ProteinId::new(" at1g01010 ").as_str(), "AT1G01010");
        assert_eq!(ProteinId::from("x"), ProteinId::new("X"));
    }

    #[test]
    fn refs_compare_by_id_only() {
        let mut a = ProteinRef::with_id("AT1G01010");
        let b = ProteinRef::with_id("AT1G01010");
        a.label = "ABC1".into();
        assert_eq!(a, b);
    }

    #[test]
    fn batch_proteins_are_cloned_only_and_ordered() {
        let catalog = ProteinCatalog::from_entries(vec![
            entry(1, 2, "AT1G00003", true),
            entry(1, 0, "AT1G00001", true),
            entry(1, 1, "AT1G00002", false),
            entry(2, 0, "AT1G00004", true),
        ]);

        let ids: Vec<_> = catalog
            .batch_proteins(1)
            .into_iter()
            .map(|p| p.id.to_string())
            .collect();
        assert_eq!(ids, vec!["AT1G00001", "AT1G00003"]);
        assert!(catalog.batch_contains(1, &ProteinId::new("AT1G00002")));
        assert!(!catalog.batch_contains(2, &ProteinId::new("AT1G00001")));
        assert!(catalog.batch_proteins(9).is_empty());
        assert_eq!(catalog.batch_ids().collect::<Vec<_>>(), vec![1, 2]);
    }
}
