use crate::classify::TextClassifier;
use crate::collect::ResolvedFileList;
use crate::trie::{Trie, TrieNode};
use crate::utils::format_size;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Renders resolved files as a tree relative to `base_dir`, with sizes and a
/// marker on files that will be skipped as binary/large.
pub fn render_tree(
    files: &ResolvedFileList,
    base_dir: &Path,
    classifier: &TextClassifier,
) -> String {
    debug!("Rendering tree for {} files", files.len());
    let mut trie = Trie::new();

    for path in files {
        let size = fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        let display = path.strip_prefix(base_dir).unwrap_or(path);
        trie.insert(display, size, !classifier.classify(path));
    }

    let root = trie.get_root();
    let mut out = format!(
        "Overall ({} files, {})\n",
        files.len(),
        format_size(root.calculate_total_size())
    );
    print_tree(root, "", &mut out);
    out
}

fn print_tree(node: &TrieNode, prefix: &str, out: &mut String) {
    let mut children: Vec<_> = node.children.iter().collect();
    children.sort_by(|a, b| a.0.cmp(b.0));

    for (i, (name, child)) in children.iter().enumerate() {
        let is_last_child = i == children.len() - 1;
        let connector = if is_last_child { "┗━━" } else { "┣━━" };
        let new_prefix = format!("{}{}    ", prefix, if is_last_child { " " } else { "┃" });

        if child.children.is_empty() {
            let size = child.size.unwrap_or(0);
            let marker = if child.skipped {
                " [skip]"
            } else {
                ""
            };
            out.push_str(&format!(
                "{}{} {} {} ({}){}\n",
                prefix,
                connector,
                get_file_icon(Path::new(name.as_str())),
                name,
                format_size(size),
                marker
            ));
        } else {
            out.push_str(&format!(
                "{}{}📂 {} ({})\n",
                prefix,
                connector,
                name,
                format_size(child.calculate_total_size())
            ));
            print_tree(child, &new_prefix, out);
        }
    }
}

pub fn get_file_icon(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("py") | Some("pyi") => "🐍",
        Some("js") => "🟨",
        Some("ts") | Some("tsx") => "🔷",
        Some("jsx") => "⚛️",
        Some("html") | Some("htm") => "🌐",
        Some("css") | Some("scss") | Some("sass") => "🎨",
        Some("java") | Some("kt") => "☕",
        Some("c") | Some("h") | Some("cpp") | Some("hpp") | Some("cc") | Some("hh") => "🇨",
        Some("go") => "🐹",
        Some("rb") => "💎",
        Some("php") => "🐘",
        Some("swift") => "🕊️",
        Some("rs") => "🦀",
        Some("json") => "🔖",
        Some("yaml") | Some("yml") => "🗂️",
        Some("xml") => "📰",
        Some("csv") | Some("tsv") => "📊",
        Some("ini") | Some("cfg") | Some("toml") => "⚙️",
        Some("md") | Some("rst") | Some("tex") => "📝",
        Some("sh") | Some("bat") | Some("ps1") => "🐚",
        Some("jpg") | Some("jpeg") | Some("png") | Some("gif") | Some("svg") | Some("bmp") => {
            "🖼️"
        }
        Some("zip") | Some("tar") | Some("gz") | Some("7z") | Some("rar") => "🗜️",
        _ => "📄",
    }
}
