//! Template compiler and runtime for Quire themes.
//!
//! Template source mixes literal HTML with three kinds of spans:
//!
//! ```text
//! <h1>{{ page.title }}</h1>          escaped output
//! {{! page.content }}                raw output
//! {% for p in pages { %}             code
//!   <li>{{ p.title }}</li>
//! {% } %}
//! ```
//!
//! Compilation rewrites the source into a small script, one statement per
//! span. The script is validated by parsing it, then stored in the build cache
//! next to other derived artifacts, keyed by the template file. A cached script
//! is reused until the template file changes.
//!
//! # Example
//!
//! ```
//! use quire_template::Template;
//! use serde_json::json;
//!
//! let template = Template::compile("greeting", "Hello, {{ name }}!").unwrap();
//! let vars = json!({"name": "<Ada>"});
//! let output = template.render(vars.as_object().unwrap(), &()).unwrap();
//! assert_eq!(output, "Hello, &lt;Ada&gt;!");
//! ```

mod compiler;
mod error;
mod escape;
mod runtime;
mod scanner;
mod script;

use std::path::Path;

use quire_cache::{CacheConfig, FileCache};
use serde_json::{Map, Value};

pub use error::TemplateError;
pub use escape::{escape_bytes, escape_html};
pub use runtime::Functions;

/// Cache purpose tag for compiled templates.
const CACHE_PURPOSE: &str = "template";

/// Compile template source to script text.
///
/// The returned script is guaranteed to parse.
pub fn compile(source: &str) -> Result<String, TemplateError> {
    let script = compiler::generate(source)?;
    script::parse(&script)?;
    Ok(script)
}

/// A compiled, ready-to-render template.
#[derive(Debug, Clone)]
pub struct Template {
    name: String,
    program: Vec<script::ast::Stmt>,
}

impl Template {
    /// Compile template source held in memory.
    pub fn compile(name: impl Into<String>, source: &str) -> Result<Self, TemplateError> {
        let script = compiler::generate(source)?;
        Ok(Self {
            name: name.into(),
            program: script::parse(&script)?,
        })
    }

    /// Load a template file, going through the compiled-template cache.
    ///
    /// A cached script newer than the template file is used without
    /// recompiling. Compile errors are returned and never cached.
    pub fn load(path: &Path, cache: &CacheConfig) -> Result<Self, TemplateError> {
        let name = path.display().to_string();
        let entry = FileCache::open_raw(path, CACHE_PURPOSE, cache);

        if let Some(bytes) = entry.retrieve_raw() {
            match String::from_utf8(bytes).map(|text| script::parse(&text)) {
                Ok(Ok(program)) => {
                    tracing::debug!(path = %path.display(), "compiled template cache hit");
                    return Ok(Self { name, program });
                }
                _ => tracing::warn!(
                    path = %path.display(),
                    "cached template script is unusable, recompiling"
                ),
            }
        }

        let source = std::fs::read_to_string(path).map_err(|source| TemplateError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let script = compiler::generate(&source)?;
        let program = script::parse(&script)?;
        entry.store_raw(script.as_bytes());
        tracing::info!(path = %path.display(), "compiled template");

        Ok(Self { name, program })
    }

    /// Name the template was compiled under.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Render with `vars` as globals and `functions` for host calls.
    pub fn render(
        &self,
        vars: &Map<String, Value>,
        functions: &dyn Functions,
    ) -> Result<String, TemplateError> {
        runtime::execute(&self.program, vars, functions)
    }
}
