//! Access to the parts of zip based spreadsheet packages (.xlsx, .ods).

use crate::error::PriceSheetError;
use crate::helpers::xml::XmlReader;
use std::io::BufReader;
use std::io::Read;
use std::io::Seek;
use zip::read::ZipFile;
use zip::result::ZipError;
use zip::ZipArchive;

pub(crate) trait ArchiveHelper<RS: Read + Seek> {
    /// Looks up a part by name, ignoring ASCII case and path separator style.
    fn part(&'_ mut self, name: &str) -> Result<Option<ZipFile<'_, RS>>, PriceSheetError>;

    /// Opens a part as an XML event reader.
    fn xml_reader(
        &'_ mut self,
        name: &str,
    ) -> Result<Option<XmlReader<BufReader<ZipFile<'_, RS>>>>, PriceSheetError>;
}

impl<RS: Read + Seek> ArchiveHelper<RS> for ZipArchive<RS> {
    fn part(&'_ mut self, name: &str) -> Result<Option<ZipFile<'_, RS>>, PriceSheetError> {
        let pattern = name.replace('\\', "/");
        let path = self
            .file_names()
            .find(|file_name| pattern.eq_ignore_ascii_case(&file_name.replace('\\', "/")))
            .map(|file_name| file_name.to_owned());
        match path.map(|file_name| self.by_name(&file_name)).transpose() {
            Ok(part) => Ok(part),
            Err(ZipError::FileNotFound) => Ok(None),
            Err(error) => Err(error)?,
        }
    }

    fn xml_reader(
        &'_ mut self,
        name: &str,
    ) -> Result<Option<XmlReader<BufReader<ZipFile<'_, RS>>>>, PriceSheetError> {
        let reader = self
            .part(name)?
            .map(|part| XmlReader::new(BufReader::new(part)));
        Ok(reader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn archive(parts: &[(&str, &str)]) -> ZipArchive<Cursor<Vec<u8>>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in parts {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        let cursor = writer.finish().unwrap();
        ZipArchive::new(Cursor::new(cursor.into_inner())).unwrap()
    }

    #[test]
    fn finds_parts_ignoring_case_and_separators() {
        let mut zip = archive(&[("xl/workbook.xml", "<workbook/>")]);
        let mut content = String::new();
        zip.part("XL\\Workbook.xml")
            .unwrap()
            .expect("part should be found")
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "<workbook/>");
    }

    #[test]
    fn missing_parts_are_none() {
        let mut zip = archive(&[("content.xml", "<office/>")]);
        assert!(zip.part("styles.xml").unwrap().is_none());
        assert!(zip.xml_reader("styles.xml").unwrap().is_none());
    }
}
