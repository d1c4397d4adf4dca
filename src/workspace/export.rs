//! Build-script export for a workspace

use std::fs;
use std::path::Path;

use tracing::info;

use super::Workspace;
use crate::error::{CyclopsError, Result};

impl Workspace {
    /// The active lineage as build steps: `FROM <base>` then one `RUN` per live entry
    pub fn export(&self) -> Vec<String> {
        let mut lines = vec![format!("FROM {}", self.base_image())];
        lines.extend(
            self.history()
                .iter()
                .filter(|entry| !entry.deleted)
                .map(|entry| format!("RUN {}", entry.command)),
        );
        lines
    }

    /// Alias of [`Workspace::export`]
    pub fn sprint(&self) -> Vec<String> {
        self.export()
    }

    /// Write the exported script to `path`, creating or overwriting it
    pub fn write(&self, path: &Path) -> Result<()> {
        let script = render_script(&self.export());
        fs::write(path, script).map_err(|source| CyclopsError::ExportIo {
            path: path.to_path_buf(),
            source,
        })?;

        info!(path = %path.display(), "build script written");
        Ok(())
    }
}

/// One line per step, each terminated by a newline
pub fn render_script(lines: &[String]) -> String {
    lines.iter().map(|line| format!("{}\n", line)).collect()
}
