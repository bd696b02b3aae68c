use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use tera::{Context, Error as TeraError, Tera};

/// The templates shipped with the crate, keyed by file name
const BUILTIN_PROMPTS: &[(&str, &str)] = &[
    ("system.md", include_str!("prompts/system.md")),
    ("synthesis.md", include_str!("prompts/synthesis.md")),
    ("classify.md", include_str!("prompts/classify.md")),
];

pub fn load_prompt<T: Serialize>(template: &str, context_data: &T) -> Result<String, TeraError> {
    let mut tera = Tera::default();
    tera.add_raw_template("inline_template", template)?;
    let context = Context::from_serialize(context_data)?;
    let rendered = tera.render("inline_template", &context)?;
    Ok(rendered)
}

/// Render a template from disk, falling back to the built-in template of the same name
pub fn load_prompt_file<T: Serialize>(
    template_file: impl Into<PathBuf>,
    context_data: &T,
) -> Result<String, TeraError> {
    let template_path = template_file.into();
    if !template_path.exists() {
        if let Some(name) = template_path.file_name().and_then(|n| n.to_str()) {
            if let Some(template) = builtin(name) {
                return load_prompt(template, context_data);
            }
        }
    }

    let template_content = fs::read_to_string(&template_path)
        .map_err(|e| TeraError::chain("Failed to read template file", e))?;
    load_prompt(&template_content, context_data)
}

pub fn load_builtin_prompt<T: Serialize>(name: &str, context_data: &T) -> Result<String, TeraError> {
    let template = builtin(name).ok_or_else(|| TeraError::template_not_found(name))?;
    load_prompt(template, context_data)
}

fn builtin(name: &str) -> Option<&'static str> {
    BUILTIN_PROMPTS
        .iter()
        .find(|(file, _)| *file == name)
        .map(|(_, template)| *template)
}
