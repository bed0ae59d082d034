//! Byte-range access to the posting blob.
//!
//! The store never touches posting bytes directly: it resolves a
//! [`Section`] through a [`SectionReader`] and checks the result of every
//! read before using the data.

use crate::index::types::Section;
use memmap2::Mmap;
use std::borrow::Cow;
use std::fs::File;
use std::io;
use std::path::Path;

/// Random-access reader over the backing blob of an index.
///
/// Reads take `&self` so one reader can serve concurrent queries.
pub trait SectionReader: Send + Sync {
    /// Read the bytes described by `section`.
    fn read_section(&self, section: Section) -> io::Result<Cow<'_, [u8]>>;

    /// Release the underlying resource. Reads after close fail.
    fn close(&mut self) -> io::Result<()>;
}

fn slice_section(data: &[u8], section: Section) -> io::Result<&[u8]> {
    if section.end() > data.len() as u64 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!(
                "section {}+{} past end of blob ({} bytes)",
                section.offset,
                section.size,
                data.len()
            ),
        ));
    }
    let start = section.offset as usize;
    Ok(&data[start..start + section.size as usize])
}

fn closed() -> io::Error {
    io::Error::other("reader closed")
}

/// Reader over a blob held in memory
#[derive(Debug, Default)]
pub struct BlobReader {
    data: Option<Vec<u8>>,
}

impl BlobReader {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data: Some(data) }
    }

    pub fn len(&self) -> usize {
        self.data.as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SectionReader for BlobReader {
    fn read_section(&self, section: Section) -> io::Result<Cow<'_, [u8]>> {
        let data = self.data.as_deref().ok_or_else(closed)?;
        slice_section(data, section).map(Cow::Borrowed)
    }

    fn close(&mut self) -> io::Result<()> {
        self.data = None;
        Ok(())
    }
}

/// Memory-mapped file reader
pub struct MmapReader {
    mmap: Option<Mmap>,
}

impl MmapReader {
    /// Map `path` read-only.
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        // The blob is written once by the loader and never modified while mapped.
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(Self { mmap: Some(mmap) })
    }

    pub fn len(&self) -> usize {
        self.mmap.as_ref().map_or(0, |m| m.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SectionReader for MmapReader {
    fn read_section(&self, section: Section) -> io::Result<Cow<'_, [u8]>> {
        let mmap = self.mmap.as_ref().ok_or_else(closed)?;
        slice_section(mmap, section).map(Cow::Borrowed)
    }

    fn close(&mut self) -> io::Result<()> {
        // Dropping the map unmaps it
        self.mmap.take();
        Ok(())
    }
}
