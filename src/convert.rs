//! Note → PDF conversion.
//!
//! The [`Converter`] trait is the single seam between the pipeline and the
//! outside world's export tools. The production implementation,
//! [`CommandConverter`], runs a command template per file extension:
//!
//! ```text
//! [export_commands]                                   # writes straight to {pdf}
//! xopp = "xournalpp {note} --create-pdf={pdf}"
//!
//! [inplace_export_commands]                           # writes <stem>.pdf into {outdir}
//! odt = "soffice --headless --convert-to pdf --outdir {outdir} {note}"
//! ```
//!
//! Templates are split on whitespace first and placeholders are substituted
//! inside each token afterwards, so paths containing spaces stay a single
//! argument. In-place exports get a private out directory per note (next to
//! the artifact) so parallel conversions of equally named notes never collide;
//! the produced `<stem>.pdf` is then moved onto the artifact path.

use crate::config::JournalConfig;
use crate::types::Note;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("No export command for extension '{0}'")]
    NoCommand(String),
    #[error("Command '{command}' failed ({status}): {stderr}")]
    CommandFailed {
        command: String,
        status: ExitStatus,
        stderr: String,
    },
    #[error("Export finished but produced no PDF at {0}")]
    MissingOutput(PathBuf),
}

/// Turns one note into its PDF artifact.
///
/// Implementations must be `Sync`: stale notes are converted in parallel.
pub trait Converter: Sync {
    fn convert(&self, note: &Note, artifact: &Path) -> Result<(), ConvertError>;
}

/// How an export command delivers its PDF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportCommand {
    /// Writes to the `{pdf}` path directly.
    Direct(String),
    /// Writes `<stem>.pdf` into `{outdir}`.
    InPlace(String),
}

impl ExportCommand {
    fn template(&self) -> &str {
        match self {
            ExportCommand::Direct(t) | ExportCommand::InPlace(t) => t,
        }
    }
}

/// Runs the configured export command for each note's extension.
#[derive(Debug, Clone, Default)]
pub struct CommandConverter {
    commands: BTreeMap<String, ExportCommand>,
}

impl CommandConverter {
    pub fn new(commands: BTreeMap<String, ExportCommand>) -> Self {
        Self { commands }
    }

    pub fn from_config(config: &JournalConfig) -> Self {
        let direct = config
            .export_commands
            .iter()
            .map(|(ext, t)| (ext.clone(), ExportCommand::Direct(t.clone())));
        let in_place = config
            .inplace_export_commands
            .iter()
            .map(|(ext, t)| (ext.clone(), ExportCommand::InPlace(t.clone())));
        Self::new(direct.chain(in_place).collect())
    }

    /// Expand the note's command template into an argument vector.
    pub fn command_line(
        &self,
        note: &Note,
        artifact: &Path,
        outdir: &Path,
    ) -> Result<Vec<String>, ConvertError> {
        let command = self
            .commands
            .get(&note.extension)
            .ok_or_else(|| ConvertError::NoCommand(note.extension.clone()))?;
        let note_path = note.path.to_string_lossy();
        let pdf = artifact.to_string_lossy();
        let outdir = outdir.to_string_lossy();
        Ok(command
            .template()
            .split_whitespace()
            .map(|token| {
                token
                    .replace("{note}", &note_path)
                    .replace("{pdf}", &pdf)
                    .replace("{outdir}", &outdir)
            })
            .collect())
    }
}

/// Private out directory for an in-place export of the note owning `artifact`.
fn inplace_outdir(artifact: &Path) -> PathBuf {
    artifact.with_extension("d")
}

impl Converter for CommandConverter {
    /// Export `note`, leaving nothing behind on failure.
    ///
    /// A failed direct export removes whatever it wrote to `artifact`: a
    /// partial file with a fresh mtime would otherwise pass as cached on the
    /// next run. A failed in-place export removes its out directory.
    fn convert(&self, note: &Note, artifact: &Path) -> Result<(), ConvertError> {
        let in_place = matches!(
            self.commands.get(&note.extension),
            Some(ExportCommand::InPlace(_))
        );
        let outdir = inplace_outdir(artifact);
        let result = self.export(note, artifact, &outdir, in_place);
        if result.is_err() {
            let leftover = if in_place {
                fs::remove_dir_all(&outdir)
            } else {
                fs::remove_file(artifact)
            };
            match leftover {
                Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
                    warn!(note = %note.path.display(), error = %e, "could not clean up failed export");
                }
                _ => {}
            }
        }
        result
    }
}

impl CommandConverter {
    fn export(
        &self,
        note: &Note,
        artifact: &Path,
        outdir: &Path,
        in_place: bool,
    ) -> Result<(), ConvertError> {
        if in_place {
            fs::create_dir_all(outdir)?;
        }

        let args = self.command_line(note, artifact, outdir)?;
        run(&args)?;

        if in_place {
            let produced = outdir.join(format!("{}.pdf", note.stem()));
            if !produced.is_file() {
                return Err(ConvertError::MissingOutput(produced));
            }
            fs::rename(&produced, artifact)?;
            fs::remove_dir_all(outdir)?;
        } else if !artifact.is_file() {
            return Err(ConvertError::MissingOutput(artifact.to_path_buf()));
        }
        Ok(())
    }
}

fn run(args: &[String]) -> Result<(), ConvertError> {
    let Some((program, rest)) = args.split_first() else {
        return Err(ConvertError::NoCommand(String::new()));
    };
    let command = args.join(" ");
    info!("Run command '{}'", command);
    let output = Command::new(program).args(rest).output()?;
    if !output.status.success() {
        return Err(ConvertError::CommandFailed {
            command,
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(())
}
