//! DOCX template rendering.
//!
//! A template is an OOXML archive whose document part carries `{{name}}`
//! tokens. Rendering copies the archive entry by entry and substitutes every
//! token in the document, header, and footer parts with XML-escaped values.
//! A token with no bound value is a hard error, never silently dropped.

use std::collections::HashMap;
use std::io::{Cursor, Read, Write};
use std::path::Path;

use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const TOKEN_OPEN: &str = "{{";
const TOKEN_CLOSE: &str = "}}";
const DOCUMENT_PART: &str = "word/document.xml";

#[derive(Debug, thiserror::Error)]
pub(crate) enum RenderError {
    #[error("reading template: {0}")]
    Io(#[from] std::io::Error),
    #[error("template is not a valid document archive: {0}")]
    Archive(#[from] zip::result::ZipError),
    #[error("template has no {DOCUMENT_PART} part")]
    MissingDocumentPart,
    #[error("document part is not valid UTF-8")]
    InvalidDocumentPart,
    #[error("placeholder {{{{{name}}}}} has no bound value")]
    UnboundPlaceholder { name: String },
}

/// An in-memory bulletin template, loaded once and rendered per student.
#[derive(Debug, Clone)]
pub(crate) struct DocxTemplate {
    entries: Vec<(String, Vec<u8>)>,
}

impl DocxTemplate {
    pub(crate) fn open(path: &Path) -> Result<Self, RenderError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    pub(crate) fn from_bytes(bytes: &[u8]) -> Result<Self, RenderError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let mut entries = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let mut entry = archive.by_index(index)?;
            let mut content = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut content)?;
            entries.push((entry.name().to_string(), content));
        }

        if !entries.iter().any(|(name, _)| name == DOCUMENT_PART) {
            return Err(RenderError::MissingDocumentPart);
        }
        Ok(Self { entries })
    }

    /// Render the template against a value map, returning the new archive.
    pub(crate) fn render(
        &self,
        values: &HashMap<String, String>,
    ) -> Result<Vec<u8>, RenderError> {
        let mut output = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        for (name, content) in &self.entries {
            output.start_file(name.clone(), options)?;
            if is_substituted_part(name) {
                let xml =
                    std::str::from_utf8(content).map_err(|_| RenderError::InvalidDocumentPart)?;
                let rendered = substitute(xml, values)?;
                output.write_all(rendered.as_bytes())?;
            } else {
                output.write_all(content)?;
            }
        }

        Ok(output.finish()?.into_inner())
    }
}

fn is_substituted_part(name: &str) -> bool {
    name == DOCUMENT_PART
        || (name.starts_with("word/header") && name.ends_with(".xml"))
        || (name.starts_with("word/footer") && name.ends_with(".xml"))
}

/// Replace every `{{name}}` token with its XML-escaped value.
pub(crate) fn substitute(
    xml: &str,
    values: &HashMap<String, String>,
) -> Result<String, RenderError> {
    let mut rendered = String::with_capacity(xml.len());
    let mut rest = xml;

    while let Some(open) = rest.find(TOKEN_OPEN) {
        let Some(close) = rest[open + TOKEN_OPEN.len()..].find(TOKEN_CLOSE) else {
            break;
        };
        let name = rest[open + TOKEN_OPEN.len()..open + TOKEN_OPEN.len() + close].trim();
        let value = values
            .get(name)
            .ok_or_else(|| RenderError::UnboundPlaceholder { name: name.to_string() })?;

        rendered.push_str(&rest[..open]);
        rendered.push_str(&xml_escape(value));
        rest = &rest[open + TOKEN_OPEN.len() + close + TOKEN_CLOSE.len()..];
    }

    rendered.push_str(rest);
    Ok(rendered)
}

fn xml_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
pub(crate) fn template_fixture(document_xml: &str) -> Vec<u8> {
    let mut archive = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    archive.start_file("[Content_Types].xml", options).unwrap();
    archive.write_all(b"<?xml version=\"1.0\"?><Types/>").unwrap();
    archive.start_file(DOCUMENT_PART, options).unwrap();
    archive.write_all(document_xml.as_bytes()).unwrap();
    archive.finish().unwrap().into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn document_part(rendered: &[u8]) -> String {
        let mut archive = ZipArchive::new(Cursor::new(rendered.to_vec())).unwrap();
        let mut entry = archive.by_name(DOCUMENT_PART).unwrap();
        let mut xml = String::new();
        entry.read_to_string(&mut xml).unwrap();
        xml
    }

    #[test]
    fn substitutes_tokens_in_the_document_part() {
        let bytes = template_fixture("<w:t>{{nomApprenant}} : {{moyenne}}</w:t>");
        let template = DocxTemplate::from_bytes(&bytes).unwrap();
        let rendered = template
            .render(&values(&[("nomApprenant", "DURAND Alice"), ("moyenne", "13.80")]))
            .unwrap();
        assert_eq!(document_part(&rendered), "<w:t>DURAND Alice : 13.80</w:t>");
    }

    #[test]
    fn values_are_xml_escaped() {
        let bytes = template_fixture("<w:t>{{appreciations}}</w:t>");
        let template = DocxTemplate::from_bytes(&bytes).unwrap();
        let rendered = template
            .render(&values(&[("appreciations", "Droit & <Gestion>")]))
            .unwrap();
        assert_eq!(
            document_part(&rendered),
            "<w:t>Droit &amp; &lt;Gestion&gt;</w:t>"
        );
    }

    #[test]
    fn unbound_placeholder_is_an_error() {
        let bytes = template_fixture("<w:t>{{inconnu}}</w:t>");
        let template = DocxTemplate::from_bytes(&bytes).unwrap();
        let error = template.render(&values(&[])).unwrap_err();
        assert!(matches!(
            error,
            RenderError::UnboundPlaceholder { ref name } if name == "inconnu"
        ));
    }

    #[test]
    fn empty_values_still_bind() {
        let bytes = template_fixture("<w:t>[{{note1}}]</w:t>");
        let template = DocxTemplate::from_bytes(&bytes).unwrap();
        let rendered = template.render(&values(&[("note1", "")])).unwrap();
        assert_eq!(document_part(&rendered), "<w:t>[]</w:t>");
    }

    #[test]
    fn unterminated_token_is_left_verbatim() {
        let out = substitute("<w:t>{{ouvert</w:t>", &values(&[])).unwrap();
        assert_eq!(out, "<w:t>{{ouvert</w:t>");
    }

    #[test]
    fn token_names_are_trimmed() {
        let out = substitute("{{ note1 }}", &values(&[("note1", "12.00")])).unwrap();
        assert_eq!(out, "12.00");
    }

    #[test]
    fn archive_without_document_part_is_rejected() {
        let mut archive = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
        archive.start_file("mimetype", options).unwrap();
        archive.write_all(b"application/epub").unwrap();
        let bytes = archive.finish().unwrap().into_inner();
        assert!(matches!(
            DocxTemplate::from_bytes(&bytes),
            Err(RenderError::MissingDocumentPart)
        ));
    }
}
