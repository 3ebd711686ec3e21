//! Template rendering for bundle documentation and manifests.
//!
//! Templates are Handlebars text resolved through a component's
//! [`TemplateResolver`](crate::components::TemplateResolver). Every template
//! sees the same two-key context:
//!
//! ```text
//! {
//!   "values":   <merged Helm values>,
//!   "metadata": <metadata record>
//! }
//! ```
//!
//! Rendering runs in strict mode, so referencing a field that does not
//! exist is an error rather than an empty string.

use crate::bundler::{
    error::{Error, Result},
    values::ValueTree,
};
use crate::components::ComponentDescriptor;
use handlebars::{
    Handlebars, Helper, HelperResult, Output, RenderContext, RenderErrorReason, handlebars_helper,
};

/// Context key holding the merged values.
pub const VALUES_KEY: &str = "values";

/// Context key holding the metadata record.
pub const METADATA_KEY: &str = "metadata";

/// Template rendered to `README.md`.
pub const README_TEMPLATE: &str = "README.md";

/// `{{toYaml value}}`: serializes `value` as YAML without a trailing newline.
fn to_yaml<'reg, 'rc>(
    h: &Helper<'rc>,
    _: &'reg Handlebars<'reg>,
    _: &'rc handlebars::Context,
    _: &mut RenderContext<'reg, 'rc>,
    out: &mut dyn Output,
) -> HelperResult {
    let value = h
        .param(0)
        .ok_or(RenderErrorReason::ParamNotFoundForIndex("toYaml", 0))?
        .value();
    let yaml = serde_yaml::to_string(value)
        .map_err(|e| RenderErrorReason::Other(format!("toYaml: {e}")))?;
    out.write(yaml.trim_end())?;
    Ok(())
}

handlebars_helper!(indent: |width: u64, text: str| {
    let pad = " ".repeat(width as usize);
    text.lines()
        .map(|line| if line.is_empty() { String::new() } else { format!("{pad}{line}") })
        .collect::<Vec<_>>()
        .join("\n")
});

/// Shared, thread-safe renderer.
pub struct TemplateRenderer {
    handlebars: Handlebars<'static>,
}

impl std::fmt::Debug for TemplateRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateRenderer").finish_non_exhaustive()
    }
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRenderer {
    /// Creates a strict, non-escaping renderer with the `toYaml` and
    /// `indent` helpers.
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(true);
        handlebars.register_escape_fn(handlebars::no_escape);
        handlebars.register_helper("toYaml", Box::new(to_yaml));
        handlebars.register_helper("indent", Box::new(indent));
        Self { handlebars }
    }

    /// Resolves `name` through `descriptor` and renders it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Template`] if the template is unknown, fails to
    /// parse, or references a missing field.
    pub fn render(
        &self,
        descriptor: &ComponentDescriptor,
        name: &str,
        values: &ValueTree,
        metadata: &serde_json::Value,
    ) -> Result<String> {
        let text = (descriptor.templates)(name).ok_or_else(|| Error::Template {
            name: name.to_string(),
            reason: format!("not found for component {}", descriptor.name),
        })?;

        self.render_text(name, text, values, metadata)
    }

    /// Renders template `text` directly.
    pub fn render_text(
        &self,
        name: &str,
        text: &str,
        values: &ValueTree,
        metadata: &serde_json::Value,
    ) -> Result<String> {
        let mut context = serde_json::Map::new();
        context.insert(VALUES_KEY.to_string(), serde_json::to_value(values)?);
        context.insert(METADATA_KEY.to_string(), metadata.clone());

        self.handlebars
            .render_template(text, &context)
            .map_err(|e| Error::Template {
                name: name.to_string(),
                reason: e.to_string(),
            })
    }
}
