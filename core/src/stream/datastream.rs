//! Pull-based byte stream abstraction.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use bytebuffer::ByteBuffer;

/// A readable stream of bytes with optional content metadata.
///
/// In-memory and file-backed streams are rewindable; raw reader streams
/// are not. [`DataStream::close`] is idempotent and releases the
/// underlying resource on every exit path.
pub struct DataStream {
    source: Source,
    content_type: Option<String>,
    content_length: Option<u64>,
}

enum Source {
    Empty,
    Bytes { data: Vec<u8>, position: usize },
    Reader(Option<Box<dyn Read + Send>>),
    File { path: PathBuf, file: Option<File> },
    Closed,
}

impl DataStream {
    /// An empty stream with a known length of zero.
    #[must_use]
    pub fn of_empty() -> DataStream {
        DataStream {
            source: Source::Empty,
            content_type: None,
            content_length: Some(0),
        }
    }

    /// An in-memory stream over a byte vector.
    #[must_use]
    pub fn of_bytes(data: Vec<u8>) -> DataStream {
        let content_length = Some(data.len() as u64);
        DataStream {
            source: Source::Bytes { data, position: 0 },
            content_type: None,
            content_length,
        }
    }

    /// An in-memory stream over a blob.
    #[must_use]
    pub fn of_blob(blob: &ByteBuffer) -> DataStream {
        Self::of_bytes(blob.as_bytes().to_vec())
    }

    /// An in-memory UTF-8 stream.
    #[must_use]
    pub fn of_string(value: &str) -> DataStream {
        let mut stream = Self::of_bytes(value.as_bytes().to_vec());
        stream.content_type = Some("text/plain".to_string());
        stream
    }

    /// A stream over an arbitrary reader.
    ///
    /// Reader streams are not rewindable and their length is unknown
    /// unless provided.
    #[must_use]
    pub fn of_reader(
        reader: impl Read + Send + 'static,
        content_type: Option<&str>,
        content_length: Option<u64>,
    ) -> DataStream {
        DataStream {
            source: Source::Reader(Some(Box::new(reader))),
            content_type: content_type.map(str::to_string),
            content_length,
        }
    }

    /// A stream over a file.
    ///
    /// The file is opened lazily on first read. When no content type is
    /// given, one is probed from the file extension.
    pub fn of_file(path: impl AsRef<Path>, content_type: Option<&str>) -> io::Result<DataStream> {
        let path = path.as_ref().to_path_buf();
        let metadata = std::fs::metadata(&path)?;
        let probed = content_type
            .map(str::to_string)
            .or_else(|| probe_content_type(&path).map(str::to_string));
        Ok(DataStream {
            source: Source::File { path, file: None },
            content_type: probed,
            content_length: Some(metadata.len()),
        })
    }

    /// Length of the stream in bytes, when known.
    #[must_use]
    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    /// Media type of the stream contents, when known.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Whether this stream can be rewound and re-read.
    #[must_use]
    pub const fn is_rewindable(&self) -> bool {
        matches!(
            self.source,
            Source::Empty | Source::Bytes { .. } | Source::File { .. }
        )
    }

    /// Rewind the stream to its start, returning whether re-reading is
    /// possible.
    pub fn rewind(&mut self) -> bool {
        match &mut self.source {
            Source::Empty => true,
            Source::Bytes { position, .. } => {
                *position = 0;
                true
            }
            Source::File { file, .. } => {
                // Dropping the handle re-opens the file on next read.
                *file = None;
                true
            }
            Source::Reader(_) | Source::Closed => false,
        }
    }

    /// Close the stream, releasing the underlying resource.
    ///
    /// Closing is idempotent; reads after close return no data.
    pub fn close(&mut self) {
        self.source = Source::Closed;
    }

    /// Eagerly read the stream into a byte vector, failing if the stream
    /// exceeds `max_length` bytes.
    pub fn read_to_bytes(&mut self, max_length: usize) -> io::Result<Vec<u8>> {
        if let Some(length) = self.content_length
            && length > max_length as u64
        {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Stream length {length} exceeds maximum of {max_length} bytes"),
            ));
        }
        let mut buffer = Vec::new();
        let mut limited = Read::take(&mut *self, (max_length as u64).saturating_add(1));
        limited.read_to_end(&mut buffer)?;
        if buffer.len() > max_length {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Stream exceeds maximum of {max_length} bytes"),
            ));
        }
        Ok(buffer)
    }

    /// Eagerly read the stream as a UTF-8 string, failing if the stream
    /// exceeds `max_length` bytes.
    pub fn read_to_string(&mut self, max_length: usize) -> io::Result<String> {
        let bytes = self.read_to_bytes(max_length)?;
        String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

impl Read for DataStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.source {
            Source::Empty | Source::Closed => Ok(0),
            Source::Bytes { data, position } => {
                let remaining = &data[*position..];
                let n = remaining.len().min(buf.len());
                buf[..n].copy_from_slice(&remaining[..n]);
                *position += n;
                Ok(n)
            }
            Source::Reader(reader) => match reader {
                Some(reader) => reader.read(buf),
                None => Ok(0),
            },
            Source::File { path, file } => {
                if file.is_none() {
                    *file = Some(File::open(&*path)?);
                }
                file.as_mut().expect("file is open").read(buf)
            }
        }
    }
}

impl std::fmt::Debug for DataStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataStream")
            .field("content_type", &self.content_type)
            .field("content_length", &self.content_length)
            .field("rewindable", &self.is_rewindable())
            .finish()
    }
}

fn probe_content_type(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?;
    match extension {
        "json" => Some("application/json"),
        "txt" => Some("text/plain"),
        "html" | "htm" => Some("text/html"),
        "xml" => Some("application/xml"),
        "csv" => Some("text/csv"),
        "cbor" => Some("application/cbor"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_stream() {
        let mut stream = DataStream::of_empty();
        assert_eq!(stream.content_length(), Some(0));
        assert!(stream.is_rewindable());
        assert_eq!(stream.read_to_bytes(16).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn byte_stream_rewinds() {
        let mut stream = DataStream::of_bytes(b"hello".to_vec());
        assert_eq!(stream.content_length(), Some(5));
        assert_eq!(stream.read_to_string(16).unwrap(), "hello");
        assert_eq!(stream.read_to_string(16).unwrap(), "");
        assert!(stream.rewind());
        assert_eq!(stream.read_to_string(16).unwrap(), "hello");
    }

    #[test]
    fn string_stream_has_text_content_type() {
        let stream = DataStream::of_string("hi");
        assert_eq!(stream.content_type(), Some("text/plain"));
        assert_eq!(stream.content_length(), Some(2));
    }

    #[test]
    fn reader_stream_is_not_rewindable() {
        let mut stream = DataStream::of_reader(io::Cursor::new(b"abc".to_vec()), None, None);
        assert!(!stream.is_rewindable());
        assert_eq!(stream.content_length(), None);
        assert_eq!(stream.read_to_string(16).unwrap(), "abc");
        assert!(!stream.rewind());
    }

    #[test]
    fn bounded_read_rejects_oversized_streams() {
        let mut stream = DataStream::of_bytes(b"too many bytes".to_vec());
        assert!(stream.read_to_bytes(4).is_err());
    }

    #[test]
    fn close_is_idempotent() {
        let mut stream = DataStream::of_bytes(b"data".to_vec());
        stream.close();
        stream.close();
        assert_eq!(stream.read_to_bytes(16).unwrap(), Vec::<u8>::new());
        assert!(!stream.rewind());
    }
}
