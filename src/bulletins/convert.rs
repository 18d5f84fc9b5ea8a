//! PDF conversion and learner-code extraction.
//!
//! Conversion shells out to a LibreOffice-compatible binary in headless
//! mode. The learner code is read back from the rendered document itself,
//! which keeps the upload step independent from the spreadsheet pass.

use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{bail, Context};
use zip::ZipArchive;

const LEARNER_CODE_MARKER: &str = "Identifiant";

/// Convert every `.docx` under `dir` to PDF in place.
///
/// Runs a single converter invocation for the whole batch.
pub(crate) fn convert_directory(converter_bin: &str, dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut documents = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("listing documents in {}", dir.display()))?
    {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "docx") {
            documents.push(path);
        }
    }

    if documents.is_empty() {
        return Ok(Vec::new());
    }

    let output = Command::new(converter_bin)
        .arg("--headless")
        .arg("--convert-to")
        .arg("pdf")
        .arg("--outdir")
        .arg(dir)
        .args(&documents)
        .output()
        .with_context(|| format!("spawning converter {converter_bin}"))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "converter exited with {}: {}",
            output.status.code().unwrap_or(-1),
            stderr.trim()
        );
    }

    let pdfs = documents
        .iter()
        .map(|path| path.with_extension("pdf"))
        .collect();
    Ok(pdfs)
}

/// Pull the learner code out of a rendered bulletin.
pub(crate) fn extract_learner_code(docx_path: &Path) -> anyhow::Result<Option<u64>> {
    let bytes = std::fs::read(docx_path)
        .with_context(|| format!("reading bulletin at {}", docx_path.display()))?;
    learner_code_from_bytes(&bytes)
}

pub(crate) fn learner_code_from_bytes(bytes: &[u8]) -> anyhow::Result<Option<u64>> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).context("opening bulletin archive")?;
    let mut entry = archive
        .by_name("word/document.xml")
        .context("bulletin has no document part")?;
    let mut xml = String::new();
    entry
        .read_to_string(&mut xml)
        .context("reading bulletin document part")?;

    Ok(learner_code_from_text(&strip_tags(&xml)))
}

/// Flatten markup to its text content so values split across runs rejoin.
fn strip_tags(xml: &str) -> String {
    let mut text = String::with_capacity(xml.len());
    let mut in_tag = false;
    for c in xml.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }
    text
}

fn learner_code_from_text(text: &str) -> Option<u64> {
    let after_marker = &text[text.find(LEARNER_CODE_MARKER)? + LEARNER_CODE_MARKER.len()..];
    let value = after_marker
        .trim_start_matches(|c: char| c.is_whitespace() || c == ':')
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect::<String>();

    // Spreadsheet exports render the code as a float ("4016.0").
    value.parse::<f64>().ok().map(|code| code as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bulletins::render::template_fixture;

    #[test]
    fn reads_code_after_the_marker() {
        assert_eq!(learner_code_from_text("Identifiant : 4016"), Some(4016));
        assert_eq!(learner_code_from_text("Identifiant : 4016.0 suite"), Some(4016));
        assert_eq!(learner_code_from_text("Identifiant: 7"), Some(7));
    }

    #[test]
    fn missing_marker_or_value_yields_none() {
        assert_eq!(learner_code_from_text("pas de code"), None);
        assert_eq!(learner_code_from_text("Identifiant : "), None);
    }

    #[test]
    fn code_survives_run_splitting_in_the_document() {
        let bytes = template_fixture(
            "<w:p><w:t>Identifiant :</w:t></w:p><w:p><w:t>4016.0</w:t></w:p>",
        );
        assert_eq!(learner_code_from_bytes(&bytes).unwrap(), Some(4016));
    }

    #[test]
    fn document_without_marker_yields_none() {
        let bytes = template_fixture("<w:t>Bulletin de notes</w:t>");
        assert_eq!(learner_code_from_bytes(&bytes).unwrap(), None);
    }
}
