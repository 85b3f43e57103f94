use std::collections::HashMap;
use std::path::Path;
use tracing::trace;

/// Represents a node in a path trie.
pub struct TrieNode {
    pub children: HashMap<String, TrieNode>,
    pub size: Option<u64>,
    /// Set on files that will not be read as text.
    pub skipped: bool,
}

impl TrieNode {
    pub fn new() -> Self {
        TrieNode {
            children: HashMap::new(),
            size: None,
            skipped: false,
        }
    }

    /// Calculates the total byte size of the subtree.
    pub fn calculate_total_size(&self) -> u64 {
        self.size.unwrap_or(0)
            + self
                .children
                .values()
                .map(|child| child.calculate_total_size())
                .sum::<u64>()
    }
}

impl Default for TrieNode {
    fn default() -> Self {
        TrieNode::new()
    }
}

/// Represents a trie of path components.
#[derive(Default)]
pub struct Trie {
    root: TrieNode,
}

impl Trie {
    pub fn new() -> Self {
        Trie {
            root: TrieNode::new(),
        }
    }

    /// Inserts a file path with its size into the trie.
    pub fn insert(&mut self, path: &Path, size: u64, skipped: bool) {
        trace!("Inserting path: {:?} with size: {}", path, size);
        let mut current_node = &mut self.root;
        for component in path.iter() {
            let component_str = component.to_string_lossy().into_owned();
            current_node = current_node
                .children
                .entry(component_str)
                .or_insert_with(TrieNode::new);
        }
        current_node.size = Some(size);
        current_node.skipped = skipped;
    }

    pub fn get_root(&self) -> &TrieNode {
        &self.root
    }
}
