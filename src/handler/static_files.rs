//! Static file serving module
//!
//! Serves files relative to the configured site root with index file
//! resolution, MIME detection, `ETag` support, and a path traversal guard.

use crate::config::{HttpConfig, SiteConfig};
use crate::handler::router::RequestContext;
use crate::http::{self, mime};
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use std::path::Path;
use tokio::fs;

/// Serve a request path from the site root, 404 when nothing matches
pub async fn serve(
    ctx: &RequestContext<'_>,
    site: &SiteConfig,
    http_config: &HttpConfig,
) -> Response<Full<Bytes>> {
    match load_from_root(&site.root, ctx.path, &site.index_files).await {
        Some((content, content_type)) => {
            if ctx.access_log {
                logger::log_response(200, content.len());
            }
            http::build_static_file_response(
                &content,
                content_type,
                ctx.if_none_match.as_deref(),
                ctx.is_head,
                http_config,
            )
        }
        None => http::build_404_response(),
    }
}

/// Load a file under `root` for the given request path, trying index files
/// when the path names a directory
pub async fn load_from_root(
    root: &str,
    path: &str,
    index_files: &[String],
) -> Option<(Vec<u8>, &'static str)> {
    // Remove leading slash and prevent directory traversal
    let relative_path = path.trim_start_matches('/').replace("..", "");

    let mut file_path = Path::new(root).join(&relative_path);

    // Security: ensure the resolved path stays within the site root
    let root_canonical = match Path::new(root).canonicalize() {
        Ok(p) => p,
        Err(e) => {
            logger::log_warning(&format!("Site root not accessible '{root}': {e}"));
            return None;
        }
    };

    // Directory request: try index files
    if file_path.is_dir() || relative_path.is_empty() || relative_path.ends_with('/') {
        for index_file in index_files {
            let index_path = file_path.join(index_file);
            if index_path.is_file() {
                file_path = index_path;
                break;
            }
        }
    }

    // A directory with no index file is an ordinary 404
    if file_path.is_dir() {
        return None;
    }

    // Missing file is an ordinary 404, not worth a warning
    let Ok(file_path_canonical) = file_path.canonicalize() else {
        return None;
    };
    if !file_path_canonical.starts_with(&root_canonical) {
        logger::log_warning(&format!(
            "Path traversal attempt blocked: {} -> {}",
            path,
            file_path_canonical.display()
        ));
        return None;
    }

    let content = match fs::read(&file_path).await {
        Ok(c) => c,
        Err(e) => {
            logger::log_error(&format!(
                "Failed to read file '{}': {}",
                file_path.display(),
                e
            ));
            return None;
        }
    };

    let content_type = mime::get_content_type(file_path.extension().and_then(|e| e.to_str()));

    Some((content, content_type))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn site_fixture(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "avatar-server-site-{}-{name}",
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("index.html"), "<html>home</html>").unwrap();
        std::fs::write(dir.join("script.js"), "console.log('hi');").unwrap();
        dir
    }

    fn index_files() -> Vec<String> {
        vec!["index.html".to_string()]
    }

    #[tokio::test]
    async fn test_serves_existing_file() {
        let root = site_fixture("existing");
        let (content, content_type) =
            load_from_root(root.to_str().unwrap(), "/script.js", &index_files())
                .await
                .unwrap();
        assert_eq!(content, b"console.log('hi');");
        assert_eq!(content_type, "application/javascript");
    }

    #[tokio::test]
    async fn test_root_path_resolves_index() {
        let root = site_fixture("index");
        let (content, content_type) =
            load_from_root(root.to_str().unwrap(), "/", &index_files())
                .await
                .unwrap();
        assert_eq!(content, b"<html>home</html>");
        assert_eq!(content_type, "text/html; charset=utf-8");
    }

    #[tokio::test]
    async fn test_missing_file_is_none() {
        let root = site_fixture("missing");
        assert!(
            load_from_root(root.to_str().unwrap(), "/nope.css", &index_files())
                .await
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_directory_without_index_is_none() {
        let root = site_fixture("noindex");
        std::fs::create_dir_all(root.join("gallery")).unwrap();
        assert!(
            load_from_root(root.to_str().unwrap(), "/gallery", &index_files())
                .await
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_traversal_is_blocked() {
        let root = site_fixture("traversal");
        assert!(load_from_root(
            root.to_str().unwrap(),
            "/../../etc/passwd",
            &index_files()
        )
        .await
        .is_none());
    }
}
