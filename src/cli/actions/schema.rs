use crate::auth::schema;
use anyhow::{Context, Result};
use std::path::Path;

/// Render the persisted schema DDL offline.
///
/// No database, no runtime context: this path must stay usable from build
/// tooling and CI.
///
/// # Errors
/// Returns an error when the output file cannot be written.
pub fn execute(output: Option<&Path>) -> Result<()> {
    let ddl = schema::ddl();
    match output {
        Some(path) => {
            std::fs::write(path, &ddl)
                .with_context(|| format!("Failed to write schema to {}", path.display()))?;
        }
        None => print!("{ddl}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_ddl_to_file() -> Result<()> {
        let path = std::env::temp_dir().join("varco-schema-test.sql");
        execute(Some(&path))?;
        let written = std::fs::read_to_string(&path)?;
        assert_eq!(written, schema::ddl());
        std::fs::remove_file(&path)?;
        Ok(())
    }
}
