//! Packaging of generated bulletins into a downloadable archive.

use std::fs::File;
use std::io::{copy, BufReader};
use std::path::Path;

use anyhow::Context;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Write the given files into a zip at `zip_path`, each stored under its
/// file name. Returns the number of entries written.
pub(crate) fn write_archive(files: &[impl AsRef<Path>], zip_path: &Path) -> anyhow::Result<usize> {
    let out_file = File::create(zip_path)
        .with_context(|| format!("creating archive at {}", zip_path.display()))?;
    let mut zip = ZipWriter::new(out_file);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut written = 0;
    for path in files {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .with_context(|| format!("archive entry has no valid name: {}", path.display()))?;

        let file = File::open(path)
            .with_context(|| format!("opening archive entry {}", path.display()))?;
        zip.start_file(name, options)
            .with_context(|| format!("starting archive entry {name}"))?;
        copy(&mut BufReader::new(file), &mut zip)
            .with_context(|| format!("writing archive entry {name}"))?;
        written += 1;
    }

    zip.finish().context("finalizing archive")?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use zip::ZipArchive;

    #[test]
    fn archives_files_under_their_basenames() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("durand alice_bulletin.pdf");
        let second = dir.path().join("martin paul_bulletin.pdf");
        std::fs::write(&first, b"%PDF-1.4 alice").unwrap();
        std::fs::write(&second, b"%PDF-1.4 paul").unwrap();

        let zip_path = dir.path().join("bulletins.zip");
        let written = write_archive(&[&first, &second], &zip_path).unwrap();
        assert_eq!(written, 2);

        let mut archive = ZipArchive::new(File::open(&zip_path).unwrap()).unwrap();
        let mut content = String::new();
        archive
            .by_name("durand alice_bulletin.pdf")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "%PDF-1.4 alice");
        assert!(archive.by_name("martin paul_bulletin.pdf").is_ok());
    }

    #[test]
    fn empty_input_produces_an_empty_archive() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = dir.path().join("bulletins.zip");
        let written = write_archive(&Vec::<std::path::PathBuf>::new(), &zip_path).unwrap();
        assert_eq!(written, 0);
        assert!(ZipArchive::new(File::open(&zip_path).unwrap()).unwrap().is_empty());
    }
}
