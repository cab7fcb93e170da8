use anyhow::{Context, Result};
use interview_core::model::SYSTEM_INSTRUCTION;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// File stem of the prompt that replaces the built-in system instruction.
pub const SYSTEM_INSTRUCTION_PROMPT: &str = "system_instruction";

pub fn load_prompts(dir_path: &Path) -> Result<HashMap<String, String>> {
    let mut prompts = HashMap::new();

    for entry in fs::read_dir(dir_path)
        .with_context(|| format!("Failed to read prompts directory: {}", dir_path.display()))?
    {
        let entry = entry?;
        let path = entry.path();

        if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("md") {
            let prompt_key = path
                .file_stem()
                .and_then(|s| s.to_str())
                .context("Could not get file stem for prompt file")?
                .to_string();

            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read prompt file: {}", path.display()))?;

            prompts.insert(prompt_key, content);
        }
    }

    Ok(prompts)
}

/// The instruction sent ahead of every transcript.
///
/// A missing directory or prompt file means the built-in instruction is used;
/// an unreadable one is an error.
pub fn system_instruction(dir_path: &Path) -> Result<String> {
    if !dir_path.is_dir() {
        tracing::debug!(
            "No prompts directory at {}; using built-in instruction.",
            dir_path.display()
        );
        return Ok(SYSTEM_INSTRUCTION.to_string());
    }

    let prompts = load_prompts(dir_path)?;
    match prompts
        .get(SYSTEM_INSTRUCTION_PROMPT)
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
    {
        Some(prompt) => {
            tracing::info!("Loaded system instruction from {}", dir_path.display());
            Ok(prompt.to_string())
        }
        None => Ok(SYSTEM_INSTRUCTION.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_load_prompts_successfully() -> Result<()> {
        // 1. Arrange: Create a temporary directory and some mock prompt files.
        let dir = tempdir()?;
        let dir_path = dir.path();

        let mut file1 = File::create(dir_path.join("system_instruction.md"))?;
        writeln!(file1, "Ask about {{language}} only.")?;

        let mut file2 = File::create(dir_path.join("closing.md"))?;
        writeln!(file2, "Thank the candidate.")?;

        // Create a file that should be ignored (not .md).
        let mut ignored_file = File::create(dir_path.join("config.txt"))?;
        writeln!(ignored_file, "some config")?;

        // Create a subdirectory that should be ignored.
        std::fs::create_dir(dir_path.join("subdir"))?;

        // 2. Act
        let prompts = load_prompts(dir_path)?;

        // 3. Assert
        assert_eq!(prompts.len(), 2, "Should only load .md files");
        assert_eq!(
            prompts.get("system_instruction").unwrap(),
            "Ask about {language} only.\n"
        );
        assert_eq!(prompts.get("closing").unwrap(), "Thank the candidate.\n");
        assert!(prompts.get("config").is_none(), "Should not load .txt files");

        Ok(())
    }

    #[test]
    fn test_load_prompts_from_nonexistent_dir() {
        let dir_path = Path::new("nonexistent_dir_for_testing_prompts");
        assert!(load_prompts(dir_path).is_err());
    }

    #[test]
    fn test_system_instruction_override() -> Result<()> {
        let dir = tempdir()?;
        let mut file = File::create(dir.path().join("system_instruction.md"))?;
        writeln!(file, "  Only ask about distributed systems.  ")?;

        let instruction = system_instruction(dir.path())?;

        assert_eq!(instruction, "Only ask about distributed systems.");
        Ok(())
    }

    #[test]
    fn test_system_instruction_defaults() -> Result<()> {
        // Missing directory.
        let instruction = system_instruction(Path::new("nonexistent_dir_for_testing_prompts"))?;
        assert_eq!(instruction, SYSTEM_INSTRUCTION);

        // Directory without the prompt, and with an empty one.
        let dir = tempdir()?;
        assert_eq!(system_instruction(dir.path())?, SYSTEM_INSTRUCTION);
        File::create(dir.path().join("system_instruction.md"))?;
        assert_eq!(system_instruction(dir.path())?, SYSTEM_INSTRUCTION);
        Ok(())
    }
}
