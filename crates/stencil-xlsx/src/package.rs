//! The template's ZIP container
//!
//! The template is held in memory as the original archive bytes. Reads open a
//! fresh archive over those bytes, so the template itself never changes and can
//! be repacked any number of times.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;

use log::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{XlsxError, XlsxResult};

/// Part every OOXML package carries
pub const CONTENT_TYPES: &str = "[Content_Types].xml";

/// An XLSX container loaded into memory
#[derive(Debug, Clone)]
pub struct Package {
    bytes: Vec<u8>,
    part_names: Vec<String>,
}

impl Package {
    /// Load a package from a file
    pub fn open<P: AsRef<Path>>(path: P) -> XlsxResult<Self> {
        let path = path.as_ref();
        debug!("opening template {}", path.display());
        Self::from_bytes(fs::read(path)?)
    }

    /// Load a package from an in-memory archive
    pub fn from_bytes(bytes: Vec<u8>) -> XlsxResult<Self> {
        let archive = ZipArchive::new(Cursor::new(bytes.as_slice()))?;
        let part_names: Vec<String> = archive.file_names().map(str::to_owned).collect();
        if !part_names.iter().any(|name| name == CONTENT_TYPES) {
            return Err(XlsxError::malformed(format!(
                "archive has no {} part",
                CONTENT_TYPES
            )));
        }
        Ok(Self { bytes, part_names })
    }

    /// Entry names, in archive order
    pub fn part_names(&self) -> &[String] {
        &self.part_names
    }

    /// Whether the archive has an entry with this name
    pub fn has_part(&self, name: &str) -> bool {
        self.part_names.iter().any(|part| part == name)
    }

    /// Read an entry's uncompressed bytes
    pub fn read_part(&self, name: &str) -> XlsxResult<Vec<u8>> {
        let mut archive = self.archive()?;
        let mut file = archive
            .by_name(name)
            .map_err(|_| XlsxError::MissingPart(name.to_owned()))?;
        let mut content = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut content)?;
        Ok(content)
    }

    /// Write a copy of the package to `writer`.
    ///
    /// Entries named in `replacements` are written with the new content; every
    /// other entry is copied over without being decompressed. Entry order is
    /// kept.
    pub fn repack<W: Write + Seek>(
        &self,
        writer: W,
        replacements: &HashMap<String, Vec<u8>>,
        compression: CompressionMethod,
    ) -> XlsxResult<W> {
        self.repack_without(writer, replacements, &HashSet::new(), compression)
    }

    /// Like [`repack`](Self::repack), leaving out the entries named in `removed`
    pub fn repack_without<W: Write + Seek>(
        &self,
        writer: W,
        replacements: &HashMap<String, Vec<u8>>,
        removed: &HashSet<String>,
        compression: CompressionMethod,
    ) -> XlsxResult<W> {
        let mut archive = self.archive()?;
        let mut zip = ZipWriter::new(writer);
        let options = SimpleFileOptions::default().compression_method(compression);

        for index in 0..archive.len() {
            let file = archive.by_index_raw(index)?;
            if removed.contains(file.name()) {
                debug!("dropping {}", file.name());
                continue;
            }
            match replacements.get(file.name()) {
                Some(content) => {
                    let name = file.name().to_owned();
                    drop(file);
                    debug!("writing {} ({} bytes)", name, content.len());
                    zip.start_file(name, options)?;
                    zip.write_all(content)?;
                }
                None => zip.raw_copy_file(file)?,
            }
        }

        Ok(zip.finish()?)
    }

    fn archive(&self) -> XlsxResult<ZipArchive<Cursor<&[u8]>>> {
        Ok(ZipArchive::new(Cursor::new(self.bytes.as_slice()))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn archive(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        for (name, content) in entries {
            zip.start_file(*name, options).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn test_requires_content_types() {
        let bytes = archive(&[("xl/workbook.xml", "<workbook/>")]);
        assert!(matches!(
            Package::from_bytes(bytes),
            Err(XlsxError::MalformedTemplate(_))
        ));
    }

    #[test]
    fn test_not_a_zip() {
        let err = Package::from_bytes(b"plain text".to_vec()).unwrap_err();
        assert!(err.is_container_io());
    }

    #[test]
    fn test_read_part() {
        let package = Package::from_bytes(archive(&[
            (CONTENT_TYPES, "<Types/>"),
            ("xl/workbook.xml", "<workbook/>"),
        ]))
        .unwrap();

        assert!(package.has_part("xl/workbook.xml"));
        assert_eq!(package.read_part("xl/workbook.xml").unwrap(), b"<workbook/>");
        assert!(matches!(
            package.read_part("xl/styles.xml"),
            Err(XlsxError::MissingPart(_))
        ));
    }

    #[test]
    fn test_repack_replaces_and_copies() {
        let package = Package::from_bytes(archive(&[
            (CONTENT_TYPES, "<Types/>"),
            ("a.xml", "<a/>"),
            ("b.xml", "<b/>"),
        ]))
        .unwrap();

        let mut replacements = HashMap::new();
        replacements.insert("a.xml".to_string(), b"<a>new</a>".to_vec());
        let out = package
            .repack(Cursor::new(Vec::new()), &replacements, CompressionMethod::Deflated)
            .unwrap()
            .into_inner();

        let copy = Package::from_bytes(out).unwrap();
        assert_eq!(copy.part_names(), package.part_names());
        assert_eq!(copy.read_part("a.xml").unwrap(), b"<a>new</a>");
        assert_eq!(copy.read_part("b.xml").unwrap(), b"<b/>");
    }

    #[test]
    fn test_repack_without_entries() {
        let package = Package::from_bytes(archive(&[
            (CONTENT_TYPES, "<Types/>"),
            ("a.xml", "<a/>"),
            ("b.xml", "<b/>"),
        ]))
        .unwrap();

        let removed: HashSet<String> = ["a.xml".to_string()].into_iter().collect();
        let out = package
            .repack_without(
                Cursor::new(Vec::new()),
                &HashMap::new(),
                &removed,
                CompressionMethod::Stored,
            )
            .unwrap()
            .into_inner();

        let copy = Package::from_bytes(out).unwrap();
        assert_eq!(copy.part_names(), &[CONTENT_TYPES.to_string(), "b.xml".to_string()]);
        assert!(!copy.has_part("a.xml"));
    }
}
