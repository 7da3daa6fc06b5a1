//! Template rendering against a [`DataContext`].
//!
//! Templates use Jinja syntax: `{{ project_name }}` for interpolation and
//! `{% if external_modules %}...{% endif %}` for conditional blocks. The
//! environment runs with strict undefined handling, so a template that
//! references a key absent from the context fails instead of rendering an
//! empty string.

use minijinja::{Environment, ErrorKind, UndefinedBehavior};

use crate::context::DataContext;
use crate::error::{ScaffoldError, ScaffoldResult};

/// Name used in errors when the caller does not supply one.
const INLINE_TEMPLATE: &str = "<inline>";

/// Renders template bodies. Holds no I/O handles; output depends only on the
/// body and the context.
pub struct TemplateRenderer {
    env: Environment<'static>,
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRenderer {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_keep_trailing_newline(true);
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        Self { env }
    }

    /// Render `body` with values from `context`.
    pub fn render(&self, body: &str, context: &DataContext) -> ScaffoldResult<String> {
        self.render_named(INLINE_TEMPLATE, body, context)
    }

    /// Render `body`, using `name` to identify the template in errors.
    pub fn render_named(
        &self,
        name: &str,
        body: &str,
        context: &DataContext,
    ) -> ScaffoldResult<String> {
        self.env
            .render_named_str(name, body, context)
            .map_err(|e| render_error(name, body, &e))
    }
}

fn render_error(name: &str, body: &str, err: &minijinja::Error) -> ScaffoldError {
    let expression = err
        .range()
        .and_then(|range| body.get(range))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| {
            err.line()
                .and_then(|line| body.lines().nth(line.saturating_sub(1)))
                .map(|s| s.trim().to_string())
        })
        .unwrap_or_else(|| name.to_string());

    let message = match err.kind() {
        ErrorKind::UndefinedError => "undefined value".to_string(),
        _ => err
            .detail()
            .map(str::to_string)
            .unwrap_or_else(|| err.kind().to_string()),
    };

    ScaffoldError::Render {
        template: name.to_string(),
        expression,
        message,
    }
}
