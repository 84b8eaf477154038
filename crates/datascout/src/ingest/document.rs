//! Text extraction from documents.

use crate::error::{Result, ScoutError};
use quick_xml::Reader;
use quick_xml::events::Event;
use std::io::Read;
use std::path::Path;

const DOCX_BODY: &str = "word/document.xml";

/// Text of every page of a PDF, in page order.
pub fn load_pdf(path: &Path) -> Result<String> {
    pdf_extract::extract_text(path).map_err(|e| ScoutError::file_read(path, e))
}

/// Plain text file, read as UTF-8.
pub fn load_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| ScoutError::file_read(path, e))
}

/// Paragraphs of a Word document, one per line.
pub fn load_docx(path: &Path) -> Result<String> {
    let file = std::fs::File::open(path).map_err(|e| ScoutError::file_read(path, e))?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| ScoutError::file_read(path, e))?;
    let mut xml = String::new();
    archive
        .by_name(DOCX_BODY)
        .map_err(|e| ScoutError::file_read(path, e))?
        .read_to_string(&mut xml)
        .map_err(|e| ScoutError::file_read(path, e))?;

    docx_paragraphs(&xml).map_err(|e| ScoutError::file_read(path, e))
}

/// Extract paragraph text from a `word/document.xml` body.
fn docx_paragraphs(xml: &str) -> std::result::Result<String, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) if e.name().as_ref() == b"w:t" => in_text = true,
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => paragraphs.push(std::mem::take(&mut current)),
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"w:tab" => current.push('\t'),
                b"w:br" | b"w:cr" => current.push('\n'),
                b"w:p" => paragraphs.push(String::new()),
                _ => {}
            },
            Event::Text(e) if in_text => current.push_str(&String::from_utf8_lossy(&e)),
            Event::GeneralRef(e) if in_text => match e.resolve_char_ref().ok().flatten() {
                // `&#8217;` and `&#x2019;`
                Some(ch) => current.push(ch),
                None => current.push_str(match &*e {
                    b"amp" => "&",
                    b"lt" => "<",
                    b"gt" => ">",
                    b"quot" => "\"",
                    b"apos" => "'",
                    _ => "",
                }),
            },
            Event::Eof => break,
            _ => {}
        }
    }

    if !current.is_empty() {
        paragraphs.push(current);
    }
    Ok(paragraphs.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    const BODY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
<w:body>
<w:p><w:r><w:t>Quarterly</w:t></w:r><w:r><w:t xml:space="preserve"> report</w:t></w:r></w:p>
<w:p/>
<w:p><w:r><w:t>Sales &amp; costs</w:t><w:tab/><w:t>up</w:t></w:r></w:p>
<w:p><w:r><w:t>It&#8217;s &#x201C;final&#x201D;</w:t></w:r></w:p>
</w:body>
</w:document>"#;

    #[test]
    fn test_docx_paragraphs() {
        let text = docx_paragraphs(BODY).unwrap();
        assert_eq!(
            text,
            "Quarterly report\n\nSales & costs\tup\nIt\u{2019}s \u{201C}final\u{201D}"
        );
    }

    #[test]
    fn test_load_docx_from_archive() {
        let file = tempfile::Builder::new().suffix(".docx").tempfile().unwrap();
        {
            let mut zip = zip::ZipWriter::new(file.reopen().unwrap());
            zip.start_file(DOCX_BODY, zip::write::SimpleFileOptions::default())
                .unwrap();
            zip.write_all(BODY.as_bytes()).unwrap();
            zip.finish().unwrap();
        }

        let text = load_docx(file.path()).unwrap();
        assert!(text.starts_with("Quarterly report"));
    }

    #[test]
    fn test_load_text_and_errors() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        file.write_all("héllo\nworld".as_bytes()).unwrap();
        assert_eq!(load_text(file.path()).unwrap(), "héllo\nworld");

        let err = load_docx(file.path()).unwrap_err();
        assert_eq!(err.error_code(), "FILE_READ_FAILED");
    }
}
