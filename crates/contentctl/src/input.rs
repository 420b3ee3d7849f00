//! Loading articles from disk.

use anyhow::{Context, Result};
use content::{BlogPost, ContentService, UniversalContent};
use std::path::Path;

/// Read a blog post as JSON (`.json`) or Markdown (anything else).
///
/// Markdown files take their title from the first `# ` heading, falling back
/// to the file name.
pub fn load_content(path: &Path, service: &ContentService) -> Result<UniversalContent> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let post = if path.extension().is_some_and(|ext| ext == "json") {
        serde_json::from_str::<BlogPost>(&raw)
            .with_context(|| format!("Failed to parse blog post JSON in {}", path.display()))?
    } else {
        markdown_post(&raw, path)
    };

    Ok(service.from_blog_post(&post))
}

fn markdown_post(raw: &str, path: &Path) -> BlogPost {
    let heading = raw
        .lines()
        .find(|line| !line.trim().is_empty())
        .and_then(|line| line.trim().strip_prefix("# "))
        .map(|title| title.trim().to_string());

    let (title, body) = match heading {
        Some(title) => {
            // Drop everything up to and including the title line.
            let rest: Vec<&str> = raw
                .lines()
                .skip_while(|line| !line.trim().starts_with("# "))
                .skip(1)
                .collect();
            (title, rest.join("\n").trim().to_string())
        }
        None => {
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().replace(['-', '_'], " "))
                .unwrap_or_default();
            (stem, raw.trim().to_string())
        }
    };

    BlogPost {
        title,
        content: body,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_markdown_with_title() {
        let mut file = tempfile::Builder::new().suffix(".md").tempfile().unwrap();
        write!(file, "\n# Shipping Rust\n\nWe shipped it.\n\n## Details\n\nMore.").unwrap();

        let content = load_content(file.path(), &ContentService::default()).unwrap();
        assert_eq!(content.title, "Shipping Rust");
        assert!(content.content.starts_with("We shipped it."));
        assert_eq!(content.slug, "shipping-rust");
        assert_eq!(content.heading_structure.len(), 1);
    }

    #[test]
    fn test_markdown_without_title_uses_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("release-notes.md");
        std::fs::write(&path, "Just a body.").unwrap();

        let content = load_content(&path, &ContentService::default()).unwrap();
        assert_eq!(content.title, "release notes");
        assert_eq!(content.content, "Just a body.");
    }

    #[test]
    fn test_json_blog_post() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("post.json");
        std::fs::write(
            &path,
            r#"{"title":"From JSON","content":"Body","keywords":"rust, async","tags":["rust"]}"#,
        )
        .unwrap();

        let content = load_content(&path, &ContentService::default()).unwrap();
        assert_eq!(content.title, "From JSON");
        assert_eq!(content.keywords, vec!["rust", "async"]);
    }

    #[test]
    fn test_missing_file() {
        let err = load_content(Path::new("/nonexistent/post.md"), &ContentService::default())
            .unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }
}
