use crate::error::PriceSheetError;
use std::fs::File;
use std::io::BufReader;
use std::io::Cursor;
use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;
use thiserror::Error;
use url::Url;

/// Leading bytes of an OLE compound file, the container Office uses for encrypted packages.
const COMPOUND_FILE_SIGNATURE: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

#[derive(Error, Debug)]
pub enum UnifiedReaderError {
    #[error("No data from remote file: '{0}'")]
    RemoteFileNoDataError(String),
}

/// Reader over a spreadsheet source, either a local file or a fully buffered remote object.
pub(crate) enum UnifiedReader {
    Local(BufReader<File>),
    Remote(Cursor<Vec<u8>>),
}

impl UnifiedReader {
    /// Opens a local path, or fetches a remote URL through DuckDB's `read_blob`.
    pub(crate) fn new(file_name: &str) -> Result<UnifiedReader, PriceSheetError> {
        if Self::is_remote_url(file_name) {
            Self::read_blob_with_duckdb(file_name)
        } else {
            let file = File::open(file_name)?;
            Ok(UnifiedReader::Local(BufReader::new(file)))
        }
    }

    /// True for any URL except `file://` ones.
    pub(crate) fn is_remote_url(file_name: &str) -> bool {
        Url::parse(file_name)
            .map(|url| url.scheme() != "file" && url.scheme().len() > 1)
            .unwrap_or(false)
    }

    /// Whether the source starts with an OLE compound file header.
    /// Rewinds to the start afterwards.
    pub(crate) fn is_compound_file(&mut self) -> Result<bool, PriceSheetError> {
        let mut signature = [0u8; 8];
        let matched = match self.read_exact(&mut signature) {
            Ok(()) => signature == COMPOUND_FILE_SIGNATURE,
            Err(error) if error.kind() == std::io::ErrorKind::UnexpectedEof => false,
            Err(error) => Err(error)?,
        };
        self.seek(SeekFrom::Start(0))?;
        Ok(matched)
    }

    // DuckDB resolves the protocol (http, s3, gs, hf, ...) and any configured secrets.
    fn read_blob_with_duckdb(file_name: &str) -> Result<UnifiedReader, PriceSheetError> {
        let connection = duckdb::Connection::open_in_memory()?;
        let result: Result<Vec<u8>, _> =
            connection.query_row("SELECT content FROM read_blob(?)", [file_name], |row| row.get(0));
        connection.close().map_err(|(_, e)| e)?;

        let bytes = result?;
        if bytes.is_empty() {
            Err(UnifiedReaderError::RemoteFileNoDataError(file_name.to_owned()))?;
        }
        Ok(UnifiedReader::Remote(Cursor::new(bytes)))
    }
}

impl Read for UnifiedReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            UnifiedReader::Local(reader) => reader.read(buf),
            UnifiedReader::Remote(reader) => reader.read(buf),
        }
    }
}

impl Seek for UnifiedReader {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        match self {
            UnifiedReader::Local(reader) => reader.seek(pos),
            UnifiedReader::Remote(reader) => reader.seek(pos),
        }
    }
}
