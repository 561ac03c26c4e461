//! src/split_reader.rs
use crate::error::EngineError;
use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Identifies a source line by its origin file and byte offset. Ordering is
/// lexicographic by filename, then numeric by offset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileOffsetKey {
    pub filename: String,
    pub offset: u64,
}

/// One input line, consumed exactly once by a mapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRecord {
    pub key: FileOffsetKey,
    pub line: String,
}

/// A byte range of one input file. Whole files are a single chunk; files
/// larger than the split budget are chopped into multiple chunks.
#[derive(Debug, Clone)]
pub struct FileChunk {
    pub path: PathBuf,
    pub start: u64,
    pub len: u64,
}

impl FileChunk {
    pub fn filename(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn end(&self) -> u64 {
        self.start + self.len
    }
}

/// The unit of work for one mapper task: an ordered run of file chunks whose
/// total size stays within the configured split budget.
#[derive(Debug, Clone)]
pub struct InputSplit {
    id: Uuid,
    chunks: Vec<FileChunk>,
    total_size: u64,
}

impl InputSplit {
    fn new(chunks: Vec<FileChunk>) -> Self {
        let total_size = chunks.iter().map(|chunk| chunk.len).sum();
        Self {
            id: Uuid::new_v4(),
            chunks,
            total_size,
        }
    }

    pub fn id(&self) -> &Uuid {
        &self.id
    }

    pub fn chunks(&self) -> &[FileChunk] {
        &self.chunks
    }

    pub fn total_size(&self) -> u64 {
        self.total_size
    }
}

/// Groups the given files into splits no larger than `max_split_size_bytes`.
/// Files are accumulated in order until adding the next chunk would exceed
/// the budget; a file bigger than the budget is first divided into
/// range-based chunks of at most the budget each.
pub fn plan_splits(
    files: &[PathBuf],
    max_split_size_bytes: u64,
) -> Result<Vec<InputSplit>, EngineError> {
    let mut chunks = Vec::new();
    for path in files {
        let len = std::fs::metadata(path)
            .map_err(|source| EngineError::SplitIo {
                path: path.clone(),
                source,
            })?
            .len();
        if len == 0 {
            chunks.push(FileChunk {
                path: path.clone(),
                start: 0,
                len: 0,
            });
            continue;
        }
        let mut start = 0;
        while start < len {
            let chunk_len = max_split_size_bytes.min(len - start);
            chunks.push(FileChunk {
                path: path.clone(),
                start,
                len: chunk_len,
            });
            start += chunk_len;
        }
    }

    let mut splits = Vec::new();
    let mut current: Vec<FileChunk> = Vec::new();
    let mut current_size = 0u64;
    for chunk in chunks {
        if !current.is_empty() && current_size + chunk.len > max_split_size_bytes {
            splits.push(InputSplit::new(std::mem::take(&mut current)));
            current_size = 0;
        }
        current_size += chunk.len;
        current.push(chunk);
    }
    if !current.is_empty() {
        splits.push(InputSplit::new(current));
    }
    Ok(splits)
}

/// Line-oriented reader over one file chunk.
///
/// Range semantics: a chunk starting past offset 0 discards everything up to
/// its first newline (the previous chunk owns that line), and a line that
/// begins at or before the chunk's end is read to completion even when it
/// extends past the end. Together these guarantee every line is read by
/// exactly one chunk.
struct ChunkLineReader {
    reader: BufReader<File>,
    path: PathBuf,
    filename: String,
    pos: u64,
    end: u64,
}

impl ChunkLineReader {
    fn open(chunk: &FileChunk) -> Result<Self, EngineError> {
        let file = File::open(&chunk.path).map_err(|source| EngineError::SplitIo {
            path: chunk.path.clone(),
            source,
        })?;
        let mut reader = BufReader::new(file);
        reader
            .seek(SeekFrom::Start(chunk.start))
            .map_err(|source| EngineError::SplitIo {
                path: chunk.path.clone(),
                source,
            })?;
        let mut line_reader = Self {
            reader,
            path: chunk.path.clone(),
            filename: chunk.filename(),
            pos: chunk.start,
            end: chunk.end(),
        };
        if chunk.start > 0 {
            line_reader.skip_partial_line()?;
        }
        Ok(line_reader)
    }

    fn skip_partial_line(&mut self) -> Result<(), EngineError> {
        let mut discard = Vec::new();
        let skipped = self
            .reader
            .read_until(b'\n', &mut discard)
            .map_err(|source| EngineError::SplitIo {
                path: self.path.clone(),
                source,
            })?;
        self.pos += skipped as u64;
        Ok(())
    }

    fn read_record(&mut self) -> Result<Option<TextRecord>, EngineError> {
        if self.pos > self.end {
            return Ok(None);
        }
        let offset = self.pos;
        let mut buf = Vec::new();
        let read = self
            .reader
            .read_until(b'\n', &mut buf)
            .map_err(|source| EngineError::SplitIo {
                path: self.path.clone(),
                source,
            })?;
        if read == 0 {
            return Ok(None);
        }
        self.pos += read as u64;
        if buf.last() == Some(&b'\n') {
            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
        }
        // Best-effort decode: malformed byte sequences must not kill the split
        let line = String::from_utf8_lossy(&buf).into_owned();
        Ok(Some(TextRecord {
            key: FileOffsetKey {
                filename: self.filename.clone(),
                offset,
            },
            line,
        }))
    }
}

/// Iterates a split's chunks in order, yielding one `TextRecord` per line.
/// The active filename is re-derived at every chunk switch so records after
/// a file boundary always carry the new file's name.
pub struct SplitReader {
    chunks: std::vec::IntoIter<FileChunk>,
    current: Option<ChunkLineReader>,
}

impl SplitReader {
    pub fn new(split: InputSplit) -> Self {
        Self {
            chunks: split.chunks.into_iter(),
            current: None,
        }
    }
}

impl Iterator for SplitReader {
    type Item = Result<TextRecord, EngineError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(reader) = self.current.as_mut() {
                match reader.read_record() {
                    Ok(Some(record)) => return Some(Ok(record)),
                    Ok(None) => {
                        self.current = None;
                    }
                    Err(e) => {
                        self.current = None;
                        return Some(Err(e));
                    }
                }
            }
            let chunk = self.chunks.next()?;
            match ChunkLineReader::open(&chunk) {
                Ok(reader) => self.current = Some(reader),
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// Lists the regular files of `input_path`, sorted by path for a
/// deterministic split plan.
pub fn discover_input_files(input_path: &Path) -> Result<Vec<PathBuf>, EngineError> {
    let entries = std::fs::read_dir(input_path).map_err(|source| EngineError::SplitIo {
        path: input_path.to_path_buf(),
        source,
    })?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| EngineError::SplitIo {
            path: input_path.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
