//! HTML rendering of the snippet context.

use handlebars::Handlebars;
use serde_json::{Map, Value};
use thiserror::Error;

const TEMPLATE_NAME: &str = "sentry/js.html";
const TEMPLATE: &str = include_str!("../../templates/sentry/js.html");

#[derive(Debug, Error)]
pub enum SnippetError {
    #[error("template error: {0}")]
    Template(#[from] Box<handlebars::TemplateError>),

    #[error("render error: {0}")]
    Render(#[from] handlebars::RenderError),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Renders snippet contexts into the fixed loader markup.
pub struct SnippetRenderer {
    registry: Handlebars<'static>,
}

impl SnippetRenderer {
    pub fn new() -> Result<Self, SnippetError> {
        let mut registry = Handlebars::new();
        registry
            .register_template_string(TEMPLATE_NAME, TEMPLATE)
            .map_err(Box::new)?;
        Ok(Self { registry })
    }

    /// Render `context`; an empty context renders nothing.
    pub fn render(&self, context: &Map<String, Value>) -> Result<String, SnippetError> {
        let Some(init) = context.get("sentry_init") else {
            return Ok(String::new());
        };

        let mut data = context.clone();
        data.insert(
            "sentry_init_json".to_string(),
            Value::String(script_safe_json(init)?),
        );
        data.entry("sentry_dialog_event_id")
            .or_insert(Value::Null);

        Ok(self.registry.render(TEMPLATE_NAME, &data)?)
    }
}

/// JSON that cannot terminate the surrounding `<script>` element.
fn script_safe_json(value: &Value) -> Result<String, serde_json::Error> {
    Ok(serde_json::to_string(value)?
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026"))
}
