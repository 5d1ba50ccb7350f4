//! Intermediate store layout
//!
//! One file per entity, named from its natural key:
//!
//! ```text
//! <root>/
//!   tickets/ticket-<id>.json
//!   tickets/attachments/<id>/<filename>
//!   milestones/milestone-<title>.json
//!   wiki/<page>.v<N>.md
//!   wiki/<page>.v<N>.json
//!   wiki/attachments/<page>/<filename>
//!   users.txt
//!   ticket-fields.json
//! ```
//!
//! Wiki pages named `A/B` live in subdirectories, mirroring Trac's page
//! hierarchy.

use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreLayout {
    root: PathBuf,
}

impl StoreLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn tickets_dir(&self) -> PathBuf {
        self.root.join("tickets")
    }

    pub fn ticket_file(&self, id: i64) -> PathBuf {
        self.tickets_dir().join(format!("ticket-{id}.json"))
    }

    pub fn ticket_attachment_file(&self, id: i64, filename: &str) -> PathBuf {
        self.tickets_dir()
            .join("attachments")
            .join(id.to_string())
            .join(file_name_only(filename))
    }

    pub fn milestones_dir(&self) -> PathBuf {
        self.root.join("milestones")
    }

    /// Separators and `%` are percent-escaped, so distinct titles never
    /// share a file
    pub fn milestone_file(&self, title: &str) -> PathBuf {
        let mut flat = String::with_capacity(title.len());
        for c in title.chars() {
            match c {
                '%' => flat.push_str("%25"),
                '/' => flat.push_str("%2F"),
                '\\' => flat.push_str("%5C"),
                c => flat.push(c),
            }
        }
        self.milestones_dir().join(format!("milestone-{flat}.json"))
    }

    pub fn wiki_dir(&self) -> PathBuf {
        self.root.join("wiki")
    }

    /// Markdown content of one page version
    pub fn wiki_content_file(&self, page: &str, version: i64) -> PathBuf {
        self.wiki_dir()
            .join(relative_page_path(&format!("{page}.v{version}.md")))
    }

    /// JSON metadata of one page version
    pub fn wiki_meta_file(&self, page: &str, version: i64) -> PathBuf {
        self.wiki_dir()
            .join(relative_page_path(&format!("{page}.v{version}.json")))
    }

    pub fn wiki_attachment_file(&self, page: &str, filename: &str) -> PathBuf {
        self.wiki_dir()
            .join("attachments")
            .join(relative_page_path(page))
            .join(file_name_only(filename))
    }

    pub fn users_file(&self) -> PathBuf {
        self.root.join("users.txt")
    }

    pub fn ticket_fields_file(&self) -> PathBuf {
        self.root.join("ticket-fields.json")
    }
}

/// Keeps only normal components so a page name cannot escape the store
fn relative_page_path(name: &str) -> PathBuf {
    let path: PathBuf = Path::new(name)
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part),
            _ => None,
        })
        .collect();
    if path.as_os_str().is_empty() {
        PathBuf::from("_")
    } else {
        path
    }
}

fn file_name_only(name: &str) -> PathBuf {
    Path::new(name)
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("_"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_paths() {
        let layout = StoreLayout::new("data");
        assert_eq!(layout.ticket_file(42), PathBuf::from("data/tickets/ticket-42.json"));
        assert_eq!(
            layout.milestone_file("v1"),
            PathBuf::from("data/milestones/milestone-v1.json")
        );
        assert_eq!(
            layout.wiki_content_file("WikiStart", 3),
            PathBuf::from("data/wiki/WikiStart.v3.md")
        );
        assert_eq!(layout.users_file(), PathBuf::from("data/users.txt"));
    }

    #[test]
    fn test_hierarchical_wiki_page() {
        let layout = StoreLayout::new("data");
        assert_eq!(
            layout.wiki_meta_file("Guide/Setup", 1),
            PathBuf::from("data/wiki/Guide/Setup.v1.json")
        );
        assert_eq!(
            layout.wiki_attachment_file("Guide/Setup", "img.png"),
            PathBuf::from("data/wiki/attachments/Guide/Setup/img.png")
        );
    }

    #[test]
    fn test_names_cannot_escape_root() {
        let layout = StoreLayout::new("data");
        assert_eq!(
            layout.wiki_content_file("../../etc/passwd", 1),
            PathBuf::from("data/wiki/etc/passwd.v1.md")
        );
        assert_eq!(
            layout.ticket_attachment_file(1, "../secret.txt"),
            PathBuf::from("data/tickets/attachments/1/secret.txt")
        );
        assert_eq!(
            layout.milestone_file("2.0/beta"),
            PathBuf::from("data/milestones/milestone-2.0%2Fbeta.json")
        );
    }

    #[test]
    fn test_distinct_milestone_titles_get_distinct_files() {
        let layout = StoreLayout::new("data");
        let titles = ["2.0/beta", "2.0_beta", "2.0%2Fbeta", "2.0\\beta", "2.0%5Cbeta"];
        let files: std::collections::HashSet<PathBuf> =
            titles.iter().map(|t| layout.milestone_file(t)).collect();
        assert_eq!(files.len(), titles.len());
    }
}
