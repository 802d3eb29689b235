// ============================================================================
// File: scriptpad/src/materializer.rs
// ----------------------------------------------------------------------------
// Turns script text into the concrete argument list for an interpreter.
//
// File-style languages get a uniquely named temporary file owned by the
// returned `Invocation`; the file is removed when the invocation is dropped.
// ============================================================================

use std::ffi::OsString;
use std::io::Write;
use std::path::Path;

use log::{debug, error};
use tempfile::{Builder as TempFileBuilder, TempPath};

use crate::error::{ExecError, Result};
use crate::language::{ArgToken, InvocationStyle, LanguageSpec};

/// Appended to every script; some interpreters mis-parse a final statement
/// that is not followed by a blank line.
const SCRIPT_PADDING: &str = "\n\n";

/// Fully substituted arguments plus the script file they refer to
#[derive(Debug)]
pub struct Invocation {
    args: Vec<OsString>,
    script_file: Option<TempPath>,
}

impl Invocation {
    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    /// Path of the backing script file, for file-style languages
    pub fn script_path(&self) -> Option<&Path> {
        self.script_file.as_deref()
    }
}

/// Produce the invocation for `script` under `spec`
///
/// # Arguments
/// * `spec` - Language whose template is substituted
/// * `script` - Source text supplied by the caller
/// * `dir` - Directory that receives file-style scripts
pub fn materialize(spec: &LanguageSpec, script: &str, dir: &Path) -> Result<Invocation> {
    let padded = format!("{script}{SCRIPT_PADDING}");

    let (slot, script_file) = match spec.style {
        InvocationStyle::File => {
            let path = write_script(spec, &padded, dir)?;
            (path.as_os_str().to_os_string(), Some(path))
        }
        InvocationStyle::Inline => (OsString::from(padded), None),
    };

    let args = spec
        .args
        .iter()
        .map(|token| match token {
            ArgToken::Placeholder(_) => slot.clone(),
            ArgToken::Literal(value) => OsString::from(value),
        })
        .collect();

    Ok(Invocation { args, script_file })
}

fn write_script(spec: &LanguageSpec, contents: &str, dir: &Path) -> Result<TempPath> {
    let fail = |source: std::io::Error| {
        error!("Failed to write {} script in {}: {}", spec.name, dir.display(), source);
        ExecError::Materialize {
            dir: dir.to_path_buf(),
            source,
        }
    };

    let mut file = TempFileBuilder::new()
        .prefix(&format!("scriptpad-{}-", spec.name))
        .suffix(&spec.extension)
        .tempfile_in(dir)
        .map_err(fail)?;

    file.write_all(contents.as_bytes()).map_err(fail)?;
    file.flush().map_err(fail)?;

    // Close the handle so interpreters on every platform can open the file.
    let path = file.into_temp_path();
    debug!("Wrote {} script to {}", spec.name, path.display());
    Ok(path)
}
