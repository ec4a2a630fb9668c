//! Indexed folder tree for filtered runs.
//!
//! The folder catalog arrives as a flat list of rows with parent
//! references. The index stores a parent-pointer table keyed by folder
//! identifier and traverses it iteratively — deep hierarchies must not
//! recurse, and a malformed catalog with a reference cycle must not hang.

use std::collections::HashMap;

use stocktake_api::types::FolderRow;

struct FolderNode {
    name: String,
    href: String,
    parent_id: Option<String>,
}

pub struct FolderIndex {
    nodes: HashMap<String, FolderNode>,
    children: HashMap<String, Vec<String>>,
}

impl FolderIndex {
    #[must_use]
    pub fn build(rows: Vec<FolderRow>) -> Self {
        let mut nodes = HashMap::with_capacity(rows.len());
        let mut children: HashMap<String, Vec<String>> = HashMap::new();

        for row in rows {
            let parent_id = row
                .product_folder
                .as_ref()
                .and_then(|parent| parent.meta.href_id())
                .map(str::to_owned);
            if let Some(parent) = &parent_id {
                children.entry(parent.clone()).or_default().push(row.id.clone());
            }
            nodes.insert(
                row.id,
                FolderNode {
                    name: row.name,
                    href: row.meta.href,
                    parent_id,
                },
            );
        }

        Self { nodes, children }
    }

    /// Full path of a folder, built by climbing parent pointers.
    ///
    /// Returns `None` for unknown identifiers and for folders whose parent
    /// chain does not terminate (a reference cycle or a dangling parent).
    #[must_use]
    pub fn path(&self, id: &str) -> Option<String> {
        let mut segments = Vec::new();
        let mut cursor = Some(id);
        // Any chain longer than the node count has revisited a folder.
        for _ in 0..=self.nodes.len() {
            let Some(current) = cursor else {
                segments.reverse();
                return Some(segments.join("/"));
            };
            let node = self.nodes.get(current)?;
            segments.push(node.name.as_str());
            cursor = node.parent_id.as_deref();
        }
        tracing::warn!(id, "folder parent chain does not terminate");
        None
    }

    /// Identifier of the first folder with the given name.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&str> {
        self.nodes
            .iter()
            .find(|(_, node)| node.name == name)
            .map(|(id, _)| id.as_str())
    }

    /// Detail hrefs of a folder and every folder below it, collected
    /// iteratively in no particular order.
    #[must_use]
    pub fn subtree_hrefs(&self, root_id: &str) -> Vec<String> {
        let mut hrefs = Vec::new();
        let mut queue = vec![root_id];
        let mut visited = 0usize;
        while let Some(id) = queue.pop() {
            visited += 1;
            if visited > self.nodes.len() {
                tracing::warn!(root_id, "folder subtree does not terminate");
                break;
            }
            if let Some(node) = self.nodes.get(id) {
                hrefs.push(node.href.clone());
            }
            if let Some(children) = self.children.get(id) {
                queue.extend(children.iter().map(String::as_str));
            }
        }
        hrefs
    }

    /// `(path, id)` for every folder, sorted by path.
    #[must_use]
    pub fn entries(&self) -> Vec<(String, &str)> {
        let mut entries: Vec<(String, &str)> = self
            .nodes
            .keys()
            .filter_map(|id| self.path(id).map(|path| (path, id.as_str())))
            .collect();
        entries.sort();
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn folder(id: &str, name: &str, parent_id: Option<&str>) -> FolderRow {
        let parent = parent_id.map(|pid| {
            serde_json::json!({
                "meta": {"href": format!("https://inventory.test/entity/productfolder/{pid}")}
            })
        });
        serde_json::from_value(serde_json::json!({
            "id": id,
            "name": name,
            "meta": {
                "href": format!("https://inventory.test/entity/productfolder/{id}"),
                "type": "productfolder"
            },
            "productFolder": parent
        }))
        .unwrap()
    }

    fn sample_index() -> FolderIndex {
        FolderIndex::build(vec![
            folder("f1", "Drinks", None),
            folder("f2", "Sodas", Some("f1")),
            folder("f3", "Craft", Some("f2")),
            folder("f4", "Snacks", None),
        ])
    }

    #[test]
    fn path_climbs_parent_pointers() {
        let index = sample_index();
        assert_eq!(index.path("f3").as_deref(), Some("Drinks/Sodas/Craft"));
        assert_eq!(index.path("f1").as_deref(), Some("Drinks"));
    }

    #[test]
    fn path_of_unknown_folder_is_none() {
        assert!(sample_index().path("nope").is_none());
    }

    #[test]
    fn cyclic_parent_chain_terminates_with_none() {
        let index = FolderIndex::build(vec![
            folder("a", "A", Some("b")),
            folder("b", "B", Some("a")),
        ]);
        assert!(index.path("a").is_none());
    }

    #[test]
    fn subtree_collects_root_and_descendants() {
        let index = sample_index();
        let mut hrefs = index.subtree_hrefs("f1");
        hrefs.sort();
        assert_eq!(
            hrefs,
            vec![
                "https://inventory.test/entity/productfolder/f1",
                "https://inventory.test/entity/productfolder/f2",
                "https://inventory.test/entity/productfolder/f3",
            ]
        );
    }

    #[test]
    fn find_by_name_returns_identifier() {
        let index = sample_index();
        assert_eq!(index.find_by_name("Sodas"), Some("f2"));
        assert_eq!(index.find_by_name("Missing"), None);
    }

    #[test]
    fn entries_are_sorted_by_path() {
        let index = sample_index();
        let paths: Vec<String> = index.entries().into_iter().map(|(path, _)| path).collect();
        assert_eq!(
            paths,
            vec!["Drinks", "Drinks/Sodas", "Drinks/Sodas/Craft", "Snacks"]
        );
    }
}
