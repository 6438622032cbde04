//! Prompt loader for workspace overrides of the grounding instruction.

use crate::template::default_definition;
use crate::types::PromptDefinition;
use sage_core::{AppError, AppResult};
use std::path::{Path, PathBuf};

/// Path of the override file for a prompt id: `.sage/prompts/<id>.yml`.
pub fn prompt_path(workspace_path: &Path, prompt_id: &str) -> PathBuf {
    workspace_path
        .join(".sage/prompts")
        .join(format!("{}.yml", prompt_id))
}

/// Load a prompt definition by ID from the workspace.
///
/// # Example
/// ```no_run
/// use sage_prompt::{load_prompt, GROUNDED_PROMPT_ID};
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompt = load_prompt(Path::new("."), GROUNDED_PROMPT_ID)?;
/// println!("Loaded prompt: {}", prompt.title);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(workspace_path: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    let prompt_file = prompt_path(workspace_path, prompt_id);

    tracing::debug!("Loading prompt from: {:?}", prompt_file);

    if !prompt_file.exists() {
        return Err(AppError::Prompt(format!(
            "Prompt file not found: {:?}",
            prompt_file
        )));
    }

    let contents = std::fs::read_to_string(&prompt_file).map_err(|e| {
        AppError::Prompt(format!("Failed to read prompt file {:?}: {}", prompt_file, e))
    })?;

    let definition: PromptDefinition = serde_yaml::from_str(&contents).map_err(|e| {
        AppError::Prompt(format!("Failed to parse prompt YAML {:?}: {}", prompt_file, e))
    })?;

    validate_prompt(&definition)?;

    tracing::info!("Loaded prompt: {} ({})", definition.id, definition.title);

    Ok(definition)
}

/// Load the workspace override if one exists, otherwise the built-in prompt.
///
/// A present but invalid override is an error, never silently ignored.
pub fn load_prompt_or_default(workspace_path: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    if prompt_path(workspace_path, prompt_id).exists() {
        load_prompt(workspace_path, prompt_id)
    } else {
        tracing::debug!("No override for prompt '{}', using built-in", prompt_id);
        Ok(default_definition())
    }
}

/// Validate a prompt definition.
fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.title.is_empty() {
        return Err(AppError::Prompt("Prompt title cannot be empty".to_string()));
    }

    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    // Without the placeholder the model would never see the retrieved passages
    if !def.template.contains("{{context}}") {
        return Err(AppError::Prompt(
            "Prompt template must contain the {{context}} placeholder".to_string(),
        ));
    }

    Ok(())
}
