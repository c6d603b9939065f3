//! Folder tree rendering for analyzer input

use crate::constants::classification::VISIBLE_DOTFILES;

use super::DirectoryNode;

/// Render a node's contents as an indented tree, directories first.
///
/// Hidden files are skipped except the ones listed in `VISIBLE_DOTFILES`;
/// `omit` removes tool-owned files such as the backup document.
pub fn render_folder_tree(node: &DirectoryNode, max_depth: usize, omit: &[&str]) -> String {
    let mut lines = Vec::new();
    render_level(node, 0, max_depth, omit, &mut lines);
    lines.join("\n")
}

fn render_level(
    node: &DirectoryNode,
    depth: usize,
    max_depth: usize,
    omit: &[&str],
    lines: &mut Vec<String>,
) {
    let prefix = "  ".repeat(depth);

    for child in &node.children {
        lines.push(format!("{}├── {}/", prefix, child.name));
        if depth < max_depth {
            render_level(child, depth + 1, max_depth, omit, lines);
        }
    }

    for file in &node.files {
        if omit.contains(&file.as_str()) {
            continue;
        }
        if file.starts_with('.') && !VISIBLE_DOTFILES.contains(&file.as_str()) {
            continue;
        }
        lines.push(format!("{}├── {}", prefix, file));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn dir(name: &str, files: &[&str], children: Vec<DirectoryNode>) -> DirectoryNode {
        DirectoryNode {
            path: PathBuf::from("/repo").join(name),
            name: name.to_string(),
            files: files.iter().map(|f| f.to_string()).collect(),
            children,
            is_source_folder: true,
        }
    }

    #[test]
    fn test_directories_first_and_dotfiles() {
        let node = dir(
            "app",
            &[".env", ".gitignore", "main.py", "README.md.backup"],
            vec![dir("core", &["engine.py"], vec![])],
        );

        let rendered = render_folder_tree(&node, 3, &["README.md.backup"]);
        assert_eq!(
            rendered,
            "├── core/\n  ├── engine.py\n├── .gitignore\n├── main.py"
        );
    }

    #[test]
    fn test_depth_limit() {
        let deep = dir("c", &["deep.rs"], vec![]);
        let node = dir("a", &[], vec![dir("b", &[], vec![deep])]);

        let rendered = render_folder_tree(&node, 1, &[]);
        assert_eq!(rendered, "├── b/\n  ├── c/");
    }
}
