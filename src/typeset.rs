//! Typesetting and viewing of the finished document.
//!
//! Thin glue around external programs: the configured LaTeX driver
//! (`latexmk -norc -pdf` by default) and the platform's "open file" command.

use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum TypesetError {
    #[error("Failed to run '{0}': {1}")]
    Spawn(String, #[source] std::io::Error),
    #[error("'{command}' exited with {status}")]
    Failed { command: String, status: ExitStatus },
    #[error("Typeset command is empty")]
    EmptyCommand,
    #[error("No PDF viewer known for platform '{0}'")]
    UnsupportedPlatform(String),
}

/// Run `command` with the document path appended, in the document's directory.
///
/// Returns the path of the produced PDF.
pub fn typeset(document: &Path, command: &[String]) -> Result<PathBuf, TypesetError> {
    let Some((program, args)) = command.split_first() else {
        return Err(TypesetError::EmptyCommand);
    };
    let file_name = document.file_name().unwrap_or(document.as_os_str());
    let mut cmd = Command::new(program);
    cmd.args(args).arg(file_name);
    if let Some(dir) = document.parent().filter(|p| !p.as_os_str().is_empty()) {
        cmd.current_dir(dir);
    }
    let line = format!("{} {}", command.join(" "), file_name.to_string_lossy());
    run(cmd, line)?;
    Ok(document.with_extension("pdf"))
}

/// Open `pdf` in the platform's default viewer.
pub fn open_pdf(pdf: &Path) -> Result<(), TypesetError> {
    let argv = viewer_command(std::env::consts::OS)?;
    let mut cmd = Command::new(argv[0]);
    cmd.args(&argv[1..]).arg(pdf);
    let line = format!("{} {}", argv.join(" "), pdf.display());
    run(cmd, line)
}

/// Program and leading arguments that open a file on `os`.
pub fn viewer_command(os: &str) -> Result<&'static [&'static str], TypesetError> {
    const MACOS: &[&str] = &["open"];
    const FREEDESKTOP: &[&str] = &["xdg-open"];
    // Empty title argument, otherwise `start` treats a quoted path as the title
    const WINDOWS: &[&str] = &["cmd", "/C", "start", ""];
    match os {
        "macos" => Ok(MACOS),
        "linux" | "freebsd" | "openbsd" | "netbsd" | "dragonfly" => Ok(FREEDESKTOP),
        "windows" => Ok(WINDOWS),
        other => Err(TypesetError::UnsupportedPlatform(other.to_string())),
    }
}

fn run(mut cmd: Command, line: String) -> Result<(), TypesetError> {
    info!("Run command '{}'", line);
    let status = cmd.status().map_err(|e| TypesetError::Spawn(line.clone(), e))?;
    if !status.success() {
        return Err(TypesetError::Failed {
            command: line,
            status,
        });
    }
    Ok(())
}
