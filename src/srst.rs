use std::{
    io::{self, Cursor, Write},
    ops::Range,
};

use binrw::BinReaderExt;
use log::{debug, warn};
use thiserror::Error;

use crate::structs::{
    EntryHeader, KtsrHeader, Platform, SrstHeader, ENTRY_TABLE_OFFSET, KTSR_HEADER_OFFSET,
    KTSR_MAGIC, KTSS_MAGIC, KTSS_OFFSET, MIN_ENTRY_SIZE, SRST_HEADER_OFFSET, SRST_MAGIC,
    STREAM_HEADER_LEN,
};

#[derive(Error, Debug)]
pub enum SrstError {
    #[error("file too small ({len} bytes)")]
    TooSmall { len: usize },
    #[error("not a SRST file")]
    BadOuterMagic,
    #[error("SRST doesn't contain KTSR chunk")]
    MissingInnerChunk,
    #[error("malformed entry table at offset {offset:#x}: {reason}")]
    MalformedEntryTable { offset: usize, reason: &'static str },
    #[error("no KTSS found in entry {0}")]
    MissingSubStreamMarker(u32),
    #[error("entry {index} is too small to hold a KTSS stream ({size} bytes)")]
    RecordTooSmall { index: u32, size: u32 },
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Binrw(#[from] binrw::Error),
}

impl SrstError {
    /// the input is not a SRST/KTSR container at all, as opposed to a broken one
    pub fn is_unrecognized_format(&self) -> bool {
        matches!(
            self,
            Self::TooSmall { .. } | Self::BadOuterMagic | Self::MissingInnerChunk
        )
    }

    /// errors that only affect a single entry, the table itself is still intact
    pub fn is_entry_error(&self) -> bool {
        matches!(
            self,
            Self::MissingSubStreamMarker(..) | Self::RecordTooSmall { .. }
        )
    }
}

/// A validated SRST container, borrowing the complete file contents.
#[derive(Debug, Clone)]
pub struct Srst<'a> {
    buf: &'a [u8],
    pub header: SrstHeader,
    pub ktsr: KtsrHeader,
}

impl<'a> Srst<'a> {
    /// Checks both magics and reads the SRST and KTSR headers.
    ///
    /// Nothing of the entry table is looked at yet, see [`Srst::entries`].
    pub fn parse(buf: &'a [u8]) -> Result<Self, SrstError> {
        let too_small = || SrstError::TooSmall { len: buf.len() };
        let outer_magic = buf
            .get(SRST_HEADER_OFFSET..SRST_HEADER_OFFSET + SRST_MAGIC.len())
            .ok_or_else(too_small)?;
        if outer_magic != SRST_MAGIC {
            return Err(SrstError::BadOuterMagic);
        }
        if buf.len() < KTSR_HEADER_OFFSET {
            return Err(too_small());
        }
        let header: SrstHeader = Cursor::new(&buf[SRST_HEADER_OFFSET..]).read_le()?;

        if buf.get(KTSR_HEADER_OFFSET..KTSR_HEADER_OFFSET + KTSR_MAGIC.len())
            != Some(KTSR_MAGIC.as_slice())
        {
            return Err(SrstError::MissingInnerChunk);
        }
        if buf.len() < ENTRY_TABLE_OFFSET {
            return Err(too_small());
        }
        let ktsr: KtsrHeader = Cursor::new(&buf[KTSR_HEADER_OFFSET..]).read_le()?;
        debug!(
            "KTSR type {:08X}, version {}, platform {:#04x}, game id {:08X}, size {}",
            ktsr.chunk_type, ktsr.version, ktsr.platform, ktsr.game_id, ktsr.file_size
        );

        Ok(Srst { buf, header, ktsr })
    }

    pub fn platform(&self) -> Platform {
        self.ktsr.platform()
    }

    /// the bytes in front of the SRST header
    pub fn preamble(&self) -> &'a [u8] {
        &self.buf[..SRST_HEADER_OFFSET]
    }

    /// Iterator over the entry table.
    ///
    /// The table length is the declared KTSR size minus the KTSR header,
    /// every entry is checked to be inside of it and inside the file.
    pub fn entries(&self) -> Result<Entries<'a>, SrstError> {
        let end = (self.ktsr.file_size as usize)
            .checked_sub(KtsrHeader::byte_len() as usize)
            .ok_or(SrstError::MalformedEntryTable {
                offset: 0,
                reason: "declared KTSR size is smaller than its header",
            })?;
        Ok(Entries {
            table: &self.buf[ENTRY_TABLE_OFFSET..],
            offset: 0,
            end,
            index: 0,
            done: false,
        })
    }

    /// Walks all entries and extracts each of them, handing every payload to `visit`.
    ///
    /// Errors in the entry table and errors returned by `visit` always stop the scan,
    /// errors of a single entry only do with [`ScanOptions::abort_on_error`].
    pub fn scan<F, E>(&self, options: &ScanOptions, mut visit: F) -> Result<ScanSummary, E>
    where
        F: FnMut(&EntryRecord<'a>, &ExtractedPayload<'a>) -> Result<(), E>,
        E: From<SrstError>,
    {
        let mut summary = ScanSummary::default();
        for entry in self.entries()? {
            let entry = entry?;
            summary.entries += 1;
            match entry.extract() {
                Ok(payload) => {
                    visit(&entry, &payload)?;
                    summary.extracted += 1;
                }
                Err(e) if e.is_entry_error() && !options.abort_on_error => {
                    warn!("skipping entry {}: {e}", entry.index);
                    summary.failures.push(e);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(summary)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    /// stop at the first entry without a usable KTSS stream
    pub abort_on_error: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            abort_on_error: true,
        }
    }
}

#[derive(Debug, Default)]
pub struct ScanSummary {
    pub entries: u32,
    pub extracted: u32,
    // only filled if errors don't abort the scan
    pub failures: Vec<SrstError>,
}

impl ScanSummary {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Forward only iterator over the entry table, stops after the first error.
#[derive(Debug, Clone)]
pub struct Entries<'a> {
    table: &'a [u8],
    offset: usize,
    end: usize,
    index: u32,
    done: bool,
}

impl<'a> Entries<'a> {
    fn next_entry(&mut self) -> Result<EntryRecord<'a>, SrstError> {
        let offset = self.offset;
        let malformed = |reason| SrstError::MalformedEntryTable {
            offset: ENTRY_TABLE_OFFSET + offset,
            reason,
        };
        let header_end = offset + EntryHeader::byte_len() as usize;
        if header_end > self.table.len() {
            return Err(malformed("entry header is outside of the file"));
        }
        let header: EntryHeader = Cursor::new(&self.table[offset..]).read_le()?;
        if (header.size as usize) < EntryHeader::byte_len() as usize {
            return Err(malformed("entry is smaller than its header"));
        }
        let next = offset
            .checked_add(header.size as usize)
            .ok_or_else(|| malformed("entry size overflows"))?;
        if next > self.end {
            return Err(malformed("entry extends past the declared KTSR size"));
        }
        if next > self.table.len() {
            return Err(malformed("entry extends past the end of the file"));
        }
        Ok(EntryRecord {
            index: self.index,
            entry_type: header.entry_type,
            size: header.size,
            offset,
            bytes: &self.table[offset..next],
        })
    }
}

impl<'a> Iterator for Entries<'a> {
    type Item = Result<EntryRecord<'a>, SrstError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.offset >= self.end {
            return None;
        }
        match self.next_entry() {
            Ok(entry) => {
                self.offset = entry.next_offset();
                self.index += 1;
                Some(Ok(entry))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl std::iter::FusedIterator for Entries<'_> {}

/// One record of the entry table.
#[derive(Debug, Clone)]
pub struct EntryRecord<'a> {
    pub index: u32,
    pub entry_type: u32,
    pub size: u32,
    /// relative to the start of the entry table
    pub offset: usize,
    bytes: &'a [u8],
}

impl<'a> EntryRecord<'a> {
    /// offset of the following entry, relative to the start of the entry table
    pub fn next_offset(&self) -> usize {
        self.offset + self.bytes.len()
    }

    /// position of the whole record in the file
    pub fn file_range(&self) -> Range<usize> {
        let start = ENTRY_TABLE_OFFSET + self.offset;
        start..start + self.bytes.len()
    }

    /// everything after type and size
    pub fn data(&self) -> &'a [u8] {
        &self.bytes[EntryHeader::byte_len() as usize..]
    }

    pub fn stream_header(&self) -> Option<&'a [u8]> {
        self.data().get(..STREAM_HEADER_LEN)
    }

    /// Locates the KTSS stream of this entry.
    ///
    /// The stream starts with its magic and runs to the end of the record.
    pub fn extract(&self) -> Result<ExtractedPayload<'a>, SrstError> {
        if self.bytes.len() < MIN_ENTRY_SIZE {
            return Err(SrstError::RecordTooSmall {
                index: self.index,
                size: self.size,
            });
        }
        if &self.bytes[KTSS_OFFSET..MIN_ENTRY_SIZE] != KTSS_MAGIC {
            return Err(SrstError::MissingSubStreamMarker(self.index));
        }
        let start = self.file_range().start + KTSS_OFFSET;
        debug!(
            "entry {} type {:08X}: KTSS at {start:#x}, {} bytes",
            self.index,
            self.entry_type,
            self.bytes.len() - KTSS_OFFSET
        );
        Ok(ExtractedPayload {
            index: self.index,
            byte_range: start..self.file_range().end,
            bytes: &self.bytes[KTSS_OFFSET..],
        })
    }
}

/// A KTSS stream found inside an entry, without any copying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedPayload<'a> {
    pub index: u32,
    /// position of the stream in the file
    pub byte_range: Range<usize>,
    pub bytes: &'a [u8],
}

impl ExtractedPayload<'_> {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(self.bytes)
    }
}
