//! Static file serving.
//!
//! [`serve`] produces a handler that maps the *remaining* request path under
//! a root directory — mount it and it serves whatever the outer router left
//! unconsumed:
//!
//! ```rust,no_run
//! use sable::{static_files, Router};
//!
//! let app = Router::new().get("^/assets", static_files::serve("public"));
//! // GET /assets/css/site.css → public/css/site.css
//! ```
//!
//! Content types come from a fixed extension table; anything unknown is
//! served as `application/octet-stream`. A missing or unreadable file is the
//! empty outcome, which the dispatcher turns into `404 Not Found`.

use std::path::{Component, Path, PathBuf};

use crate::context::Context;
use crate::handler::Handler;
use crate::response::Response;

/// Extension → content type, for the file kinds a web root actually holds.
fn content_type(path: &Path) -> &'static str {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    match ext {
        "css"   => "text/css;charset=UTF-8",
        "eot"   => "application/vnd.ms-fontobject",
        "gif"   => "image/gif",
        "html"  => "text/html;charset=UTF-8",
        "ico"   => "image/x-icon",
        "jpeg" | "jpg" => "image/jpeg",
        "js"    => "application/javascript",
        "otf"   => "application/font-sfnt",
        "png"   => "image/png",
        "svg"   => "image/svg+xml",
        "ttf"   => "application/font-ttf",
        "woff"  => "application/font-woff",
        "woff2" => "application/font-woff2",
        _       => "application/octet-stream",
    }
}

/// Resolves the remaining path under `root`, refusing anything that is not a
/// plain relative component — parent traversal never escapes the web root.
fn resolve(root: &Path, remaining: &str) -> Option<PathBuf> {
    let relative = remaining.trim_start_matches('/');
    if relative.is_empty() {
        return Some(root.to_path_buf());
    }
    let mut path = root.to_path_buf();
    for component in Path::new(relative).components() {
        match component {
            Component::Normal(part) => path.push(part),
            _ => return None,
        }
    }
    Some(path)
}

/// A handler serving files under `root`, keyed by the unconsumed path.
pub fn serve(root: impl Into<PathBuf>) -> impl Handler {
    let root = root.into();
    move |ctx: &mut Context| -> Option<Response> {
        let path = resolve(&root, ctx.remaining_path())?;
        let body = std::fs::read(&path).ok()?;
        Some(Response::raw(content_type(&path), body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn traversal_components_are_refused() {
        let root = Path::new("public");
        assert_eq!(
            resolve(root, "/css/site.css"),
            Some(PathBuf::from("public/css/site.css"))
        );
        assert_eq!(resolve(root, "/../etc/passwd"), None);
        assert_eq!(resolve(root, "/a/../../b"), None);
    }

    #[test]
    fn content_types_come_from_the_fixed_table() {
        assert_eq!(content_type(Path::new("a/site.css")), "text/css;charset=UTF-8");
        assert_eq!(content_type(Path::new("logo.svg")), "image/svg+xml");
        assert_eq!(content_type(Path::new("data.bin")), "application/octet-stream");
        assert_eq!(content_type(Path::new("noext")), "application/octet-stream");
    }
}
