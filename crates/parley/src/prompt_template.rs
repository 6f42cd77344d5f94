use serde::Serialize;
use tera::{Context, Error as TeraError, Tera};

use crate::providers::configs::AssistantConfig;

const SYSTEM_TEMPLATE: &str = include_str!("prompts/system.md");

pub fn load_prompt<T: Serialize>(template: &str, context_data: &T) -> Result<String, TeraError> {
    let mut tera = Tera::default();
    tera.add_raw_template("inline_template", template)?;
    let context = Context::from_serialize(context_data)?;
    let rendered = tera.render("inline_template", &context)?;
    Ok(rendered)
}

/// Render the default system directive. Called once at start.
pub fn system_prompt(assistant: &AssistantConfig) -> Result<String, TeraError> {
    Ok(load_prompt(SYSTEM_TEMPLATE, assistant)?.trim().to_string())
}
