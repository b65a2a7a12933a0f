//! LaTeX document emission.
//!
//! Walks a finished [`DocumentTree`] in stored order and writes a KOMA-Script
//! `scrreprt` document that pulls in every artifact with `pdfpages`:
//!
//! ```text
//! <preamble>                         built-in, or the template file
//! \begin{document} ... \tableofcontents
//! \addpart{2024}\parttoc             one per part
//! \addchap{March}\minitoc            one per titled chapter
//! \includepdf[addtotoc={...}]{..}    one per entry
//! \end{document}
//! ```
//!
//! Sections have no heading of their own. A titled section contributes an
//! `addsec` line to the table-of-contents list of its first entry, and every
//! entry contributes an `addsubsec` line. TOC anchors are derived from the
//! artifact file stem, which is unique per note.
//!
//! [`emit`] is pure; only [`load_preamble`] and [`write_document`] touch the
//! filesystem.

use crate::tree::{DocumentTree, Section};
use crate::types::Entry;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EmitError {
    #[error("Cannot read template {0}: {1}")]
    Template(PathBuf, #[source] std::io::Error),
    #[error("Cannot write {0}: {1}")]
    Write(PathBuf, #[source] std::io::Error),
}

/// Preamble used when no template file exists.
pub const DEFAULT_PREAMBLE: &str = r"\documentclass{scrreprt}

\usepackage{minitoc}
\renewcommand*{\partheadstartvskip}{%
  \null\vskip20pt
}
\renewcommand*{\partheadendvskip}{%
  \vskip2pt
}
\renewcommand\beforeparttoc{}

\usepackage{pdfpages}

\usepackage{color}

\usepackage{datetime}
\ddmmyyyydate

\usepackage{hyperref}
\hypersetup{linktoc=all, colorlinks=false, linkbordercolor={white}}

\makeatletter
\newcommand*\addsubsec{\secdef\@addsubsec\@saddsubsec}
\newcommand*{\@addsubsec}{}
\def\@addsubsec[#1]#2{\subsection*{#2}\addcontentsline{toc}{subsection}{#1}
  \if@twoside\ifx\@mkboth\markboth\markright{#1}\fi\fi
}
\newcommand*{\@saddsubsec}[1]{\subsection*{#1}\@mkboth{}{}}
\makeatother

\title{Notebook}
\author{created with journalmk}
\date{\today\\\currenttime}
";

const DOCUMENT_BEGIN: &str = r"
\begin{document}
\maketitle

\doparttoc[n]
\dominitoc

\pdfbookmark{\contentsname}{Contents}
\tableofcontents
";

const DOCUMENT_END: &str = r"
\end{document}
";

/// Emission choices.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmitOptions {
    /// A titled section with a single entry gets only its section TOC line,
    /// titled with the entry's label.
    pub collapse_single_entry_sections: bool,
}

/// Serialize `tree` into a complete LaTeX document.
pub fn emit(tree: &DocumentTree, preamble: &str, options: &EmitOptions) -> String {
    let mut out = String::with_capacity(preamble.len() + 512 * tree.entry_count());
    out.push_str(preamble);
    out.push_str(DOCUMENT_BEGIN);

    for part in &tree.parts {
        out.push_str(&format!("\n\\addpart{{{}}}\n\\parttoc\n", escape_latex(&part.title)));
        for chapter in &part.chapters {
            if let Some(title) = &chapter.title {
                out.push_str(&format!("\n\\addchap{{{}}}\n\\minitoc\n", escape_latex(title)));
            }
            for section in &chapter.sections {
                emit_section(&mut out, section, options);
            }
        }
    }

    out.push_str(DOCUMENT_END);
    out
}

fn emit_section(out: &mut String, section: &Section, options: &EmitOptions) {
    let collapse = options.collapse_single_entry_sections && section.entries.len() == 1;
    for (i, entry) in section.entries.iter().enumerate() {
        let stem = entry.artifact_stem();
        let mut toc = Vec::with_capacity(2);
        if i == 0
            && let Some(title) = &section.title
        {
            let title = if collapse { &entry.label } else { title };
            toc.push(format!("1,addsec,1,{{{}}},sec{stem}", escape_latex(title)));
        }
        if !collapse {
            toc.push(format!(
                "1,addsubsec,1,{{{}}},subsec{stem}",
                escape_latex(&entry.label)
            ));
        }
        emit_entry(out, entry, &toc.join(", "));
    }
}

fn emit_entry(out: &mut String, entry: &Entry, toc: &str) {
    let note = entry.note.to_string_lossy();
    out.push_str(&format!(
        r"
\includepdf[
    pages=-,
    addtotoc={{{toc}}},
    picturecommand*={{%
        \put(10,10){{\href{{run:{note}}}{{{label} {{\color{{gray}}-- \texttt{{{path_text}}}}}}}}}%
    }}]{{{file}}}
",
        label = escape_latex(&entry.label),
        path_text = escape_latex(&note),
        file = entry.artifact.to_string_lossy(),
    ));
}

/// Escape characters with special meaning in LaTeX text.
pub fn escape_latex(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str(r"\textbackslash{}"),
            '~' => out.push_str(r"\textasciitilde{}"),
            '^' => out.push_str(r"\textasciicircum{}"),
            '&' | '%' | '$' | '#' | '_' | '{' | '}' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

/// The template file's content, or [`DEFAULT_PREAMBLE`] when it does not exist.
pub fn load_preamble(template: &Path) -> Result<String, EmitError> {
    if !template.is_file() {
        return Ok(DEFAULT_PREAMBLE.to_string());
    }
    std::fs::read_to_string(template).map_err(|e| EmitError::Template(template.to_path_buf(), e))
}

pub fn write_document(path: &Path, text: &str) -> Result<(), EmitError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| EmitError::Write(path.to_path_buf(), e))?;
    }
    std::fs::write(path, text).map_err(|e| EmitError::Write(path.to_path_buf(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use crate::tree::{Chapter, Part};
    use tempfile::TempDir;

    fn single(section_title: Option<&str>, entries: Vec<Entry>) -> DocumentTree {
        DocumentTree {
            parts: vec![Part {
                title: "Thesis".into(),
                chapters: vec![Chapter {
                    title: Some("Background".into()),
                    sections: vec![Section {
                        title: section_title.map(str::to_string),
                        entries,
                    }],
                }],
            }],
        }
    }

    fn emit_default(tree: &DocumentTree) -> String {
        emit(tree, "PREAMBLE", &EmitOptions::default())
    }

    // =========================================================================
    // Document structure
    // =========================================================================

    #[test]
    fn empty_tree_is_preamble_and_frame() {
        let out = emit_default(&DocumentTree::default());
        assert!(out.starts_with("PREAMBLE"));
        assert!(out.contains(r"\begin{document}"));
        assert!(out.contains(r"\tableofcontents"));
        assert!(out.trim_end().ends_with(r"\end{document}"));
        assert!(!out.contains(r"\includepdf"));
    }

    #[test]
    fn parts_and_titled_chapters_emit_headings() {
        let tree = single(None, vec![entry(at(2024, 2, 2, 9, 0))]);
        let out = emit_default(&tree);
        assert!(out.contains("\\addpart{Thesis}\n\\parttoc"));
        assert!(out.contains("\\addchap{Background}\n\\minitoc"));
    }

    #[test]
    fn untitled_chapter_emits_no_heading() {
        let mut tree = single(None, vec![entry(at(2024, 2, 2, 9, 0))]);
        tree.parts[0].chapters[0].title = None;
        let out = emit_default(&tree);
        assert!(!out.contains(r"\addchap"));
        assert_eq!(out.matches(r"\includepdf").count(), 1);
    }

    #[test]
    fn walks_tree_in_stored_order() {
        let older = entry(at(2023, 1, 1, 9, 0));
        let newer = entry(at(2024, 1, 1, 9, 0));
        // Stored order is deliberately oldest first
        let tree = single(None, vec![older.clone(), newer.clone()]);
        let out = emit_default(&tree);
        let first = out.find(&older.artifact_stem()).unwrap();
        let second = out.find(&newer.artifact_stem()).unwrap();
        assert!(first < second);
    }

    // =========================================================================
    // Table of contents lines
    // =========================================================================

    #[test]
    fn titled_section_on_first_entry_only() {
        let a = entry(at(2024, 3, 14, 9, 0));
        let b = entry(at(2024, 3, 13, 9, 0));
        let tree = single(Some("Week 11"), vec![a.clone(), b.clone()]);
        let out = emit_default(&tree);

        let sec_a = format!("1,addsec,1,{{Week 11}},sec{}", a.artifact_stem());
        let sub_a = format!("1,addsubsec,1,{{{}}},subsec{}", a.label, a.artifact_stem());
        assert!(out.contains(&format!("addtotoc={{{sec_a}, {sub_a}}}")));

        let sub_b = format!("1,addsubsec,1,{{{}}},subsec{}", b.label, b.artifact_stem());
        assert!(out.contains(&format!("addtotoc={{{sub_b}}}")));
        assert_eq!(out.matches("addsec,").count(), 1);
    }

    #[test]
    fn untitled_section_has_no_sec_line() {
        let tree = single(None, vec![entry(at(2024, 3, 14, 9, 0))]);
        let out = emit_default(&tree);
        assert!(!out.contains("addsec,"));
        assert_eq!(out.matches("addsubsec,").count(), 1);
    }

    #[test]
    fn collapse_single_entry_section() {
        let a = entry(at(2024, 3, 14, 9, 0));
        let tree = single(Some("Week 11"), vec![a.clone()]);
        let options = EmitOptions {
            collapse_single_entry_sections: true,
        };
        let out = emit(&tree, "", &options);

        assert!(out.contains(&format!(
            "addtotoc={{1,addsec,1,{{{}}},sec{}}}",
            a.label,
            a.artifact_stem()
        )));
        assert!(!out.contains("addsubsec,"));
        assert!(!out.contains("Week 11"));
    }

    #[test]
    fn collapse_leaves_multi_entry_sections_alone() {
        let tree = single(
            Some("Week 11"),
            vec![entry(at(2024, 3, 14, 9, 0)), entry(at(2024, 3, 13, 9, 0))],
        );
        let options = EmitOptions {
            collapse_single_entry_sections: true,
        };
        let out = emit(&tree, "", &options);
        assert!(out.contains("{Week 11}"));
        assert_eq!(out.matches("addsubsec,").count(), 2);
    }

    // =========================================================================
    // Inclusion blocks and escaping
    // =========================================================================

    #[test]
    fn entry_block_links_note_and_includes_artifact() {
        let e = entry_at_path(at(2024, 3, 14, 9, 0), "/proj/lab_book/_notes/a_b.pdf");
        let tree = single(None, vec![e.clone()]);
        let out = emit_default(&tree);

        assert!(out.contains(r"\href{run:/proj/lab_book/_notes/a_b.pdf}"));
        assert!(out.contains(r"\texttt{/proj/lab\_book/\_notes/a\_b.pdf}"));
        assert!(out.contains(&format!("]{{{}}}", e.artifact.display())));
        assert!(out.contains(&format!("{{{} {{\\color{{gray}}", e.label)));
    }

    #[test]
    fn escape_latex_specials() {
        assert_eq!(escape_latex("a_b"), r"a\_b");
        assert_eq!(escape_latex("50% & $5 #1"), r"50\% \& \$5 \#1");
        assert_eq!(escape_latex("{x}"), r"\{x\}");
        assert_eq!(escape_latex(r"C:\notes"), r"C:\textbackslash{}notes");
        assert_eq!(escape_latex("~/x^2"), r"\textasciitilde{}/x\textasciicircum{}2");
        assert_eq!(escape_latex("plain -- text"), "plain -- text");
    }

    #[test]
    fn titles_are_escaped() {
        let mut tree = single(Some("R&D"), vec![entry(at(2024, 3, 14, 9, 0))]);
        tree.parts[0].title = "Lab_2024".into();
        let out = emit_default(&tree);
        assert!(out.contains(r"\addpart{Lab\_2024}"));
        assert!(out.contains(r"{R\&D}"));
    }

    // =========================================================================
    // Preamble and output file
    // =========================================================================

    #[test]
    fn missing_template_uses_default_preamble() {
        let tmp = TempDir::new().unwrap();
        let preamble = load_preamble(&tmp.path().join("journal_template.tex")).unwrap();
        assert_eq!(preamble, DEFAULT_PREAMBLE);
    }

    #[test]
    fn template_replaces_preamble() {
        let tmp = TempDir::new().unwrap();
        let template = tmp.path().join("journal_template.tex");
        std::fs::write(&template, "\\documentclass{article}\n").unwrap();
        assert_eq!(load_preamble(&template).unwrap(), "\\documentclass{article}\n");
    }

    #[test]
    fn write_document_creates_parent() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("out").join("journal.tex");
        write_document(&path, "hello").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello");
    }
}
