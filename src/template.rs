//! Template rendering adapter.
//!
//! A thin wrapper over a [`minijinja`] environment with a filesystem loader.
//! Construct one [`Templates`] at startup and pass it by reference (or
//! `Arc`) into the handlers that render — there is no process-wide template
//! registry.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use sable::{Context, Router, Templates};
//!
//! let templates = Arc::new(Templates::new("templates"));
//! let app = Router::new().get(r"^/$", {
//!     let templates = Arc::clone(&templates);
//!     move |_: &mut Context| templates.respond("index.html", minijinja::context! { title => "home" })
//! });
//! ```

use std::path::Path;

use minijinja::value::Value;
use minijinja::Environment;

use crate::error::Error;
use crate::handler::Outcome;
use crate::response::Response;

/// A filesystem-backed template environment.
pub struct Templates {
    env: Environment<'static>,
}

impl Templates {
    /// An environment loading templates from `dir`, lazily per template.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        let mut env = Environment::new();
        env.set_loader(minijinja::path_loader(dir));
        Self { env }
    }

    /// Renders `name` with `vars` to bytes.
    pub fn render(&self, name: &str, vars: Value) -> Result<Vec<u8>, Error> {
        let template = self.env.get_template(name)?;
        Ok(template.render(vars)?.into_bytes())
    }

    /// Renders `name` with `vars` straight to a dispatch outcome:
    /// `200 OK`, `text/html`, or a propagated failure when the template is
    /// missing or rendering fails.
    pub fn respond(&self, name: &str, vars: Value) -> Outcome {
        match self.render(name, vars) {
            Ok(body) => Outcome::Done(Response::raw("text/html; charset=utf-8", body)),
            Err(e) => Outcome::Failed(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template_dir() -> std::path::PathBuf {
        let dir = std::env::temp_dir()
            .join(format!("sable-templates-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("hello.html"), "<p>hello {{ name }}</p>").unwrap();
        dir
    }

    #[test]
    fn renders_a_template_from_disk() {
        let templates = Templates::new(template_dir());
        let body = templates
            .render("hello.html", minijinja::context! { name => "world" })
            .unwrap();
        assert_eq!(body, b"<p>hello world</p>");
    }

    #[test]
    fn missing_template_fails_the_outcome() {
        let templates = Templates::new(template_dir());
        match templates.respond("absent.html", Value::UNDEFINED) {
            Outcome::Failed(Error::Template(_)) => {}
            _ => panic!("expected a template failure"),
        }
    }
}
