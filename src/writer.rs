use std::io::{Cursor, Seek, SeekFrom, Write};

use binrw::{BinResult, BinWriterExt};

use crate::{
    srst::{Srst, SrstError},
    structs::{
        EntryHeader, KtsrHeader, Platform, SrstHeader, KTSR_HEADER_OFFSET, KTSS_MAGIC,
        KTSS_OFFSET, SRST_HEADER_OFFSET, STREAM_HEADER_LEN,
    },
};

/// One entry to be written, `payload` is the complete KTSS stream including its magic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntrySource {
    pub entry_type: u32,
    pub stream_header: [u8; STREAM_HEADER_LEN],
    pub payload: Vec<u8>,
}

impl EntrySource {
    pub fn new(entry_type: u32, payload: Vec<u8>) -> Self {
        Self {
            entry_type,
            stream_header: [0; STREAM_HEADER_LEN],
            payload,
        }
    }

    fn size(&self) -> usize {
        KTSS_OFFSET + self.payload.len()
    }
}

#[derive(Debug, Clone)]
pub struct SrstBuilder {
    // written as is in front of the SRST header
    pub preamble: Vec<u8>,
    pub chunk_type: u32,
    pub version: u16,
    pub platform: Platform,
    pub game_id: u32,
    pub entries: Vec<EntrySource>,
}

impl SrstBuilder {
    pub fn new(platform: Platform, game_id: u32) -> Self {
        Self {
            preamble: vec![0; SRST_HEADER_OFFSET],
            chunk_type: 0,
            version: 1,
            platform,
            game_id,
            entries: Vec::new(),
        }
    }

    /// Copies everything needed to write `srst` again, every entry has to have a KTSS stream.
    pub fn from_srst(srst: &Srst) -> Result<Self, SrstError> {
        let mut entries = Vec::new();
        for entry in srst.entries()? {
            let entry = entry?;
            let payload = entry.extract()?;
            let mut stream_header = [0; STREAM_HEADER_LEN];
            if let Some(header) = entry.stream_header() {
                stream_header.copy_from_slice(header);
            }
            entries.push(EntrySource {
                entry_type: entry.entry_type,
                stream_header,
                payload: payload.bytes.to_vec(),
            });
        }
        Ok(Self {
            preamble: srst.preamble().to_vec(),
            chunk_type: srst.ktsr.chunk_type,
            version: srst.ktsr.version,
            platform: srst.platform(),
            game_id: srst.ktsr.game_id,
            entries,
        })
    }

    pub fn push_entry(&mut self, entry: EntrySource) {
        self.entries.push(entry);
    }

    /// swaps the KTSS stream of an entry, returns the old one
    pub fn replace_payload(&mut self, index: usize, payload: Vec<u8>) -> Option<Vec<u8>> {
        let entry = self.entries.get_mut(index)?;
        Some(std::mem::replace(&mut entry.payload, payload))
    }

    pub fn write_srst<WS: Write + Seek>(&self, ws: &mut WS) -> BinResult<()> {
        if self.preamble.len() != SRST_HEADER_OFFSET {
            return Err(binrw::Error::AssertFail {
                pos: 0,
                message: format!(
                    "preamble has to be {SRST_HEADER_OFFSET} bytes, got {}",
                    self.preamble.len()
                ),
            });
        }
        // first, calculate all sizes
        let mut entry_sizes = Vec::with_capacity(self.entries.len());
        for (idx, entry) in self.entries.iter().enumerate() {
            if !entry.payload.starts_with(KTSS_MAGIC) {
                return Err(binrw::Error::AssertFail {
                    pos: 0,
                    message: format!("payload of entry {idx} doesn't start with KTSS"),
                });
            }
            entry_sizes.push(size_to_u32(entry.size(), "entry")?);
        }
        let table_len = entry_sizes
            .iter()
            .try_fold(0u32, |acc, size| acc.checked_add(*size));
        let ktsr_size = table_len
            .and_then(|len| len.checked_add(KtsrHeader::byte_len()))
            .ok_or_else(|| size_error("KTSR chunk"))?;
        let file_size = size_to_u32(KTSR_HEADER_OFFSET + ktsr_size as usize, "SRST file")?;

        ws.seek(SeekFrom::Start(0))?;
        ws.write_all(&self.preamble)?;
        ws.write_le(&SrstHeader { file_size })?;
        ws.write_le(&KtsrHeader {
            chunk_type: self.chunk_type,
            version: self.version,
            platform: self.platform.code(),
            game_id: self.game_id,
            file_size: ktsr_size,
            file_size2: ktsr_size,
        })?;
        for (entry, size) in self.entries.iter().zip(entry_sizes) {
            ws.write_le(&EntryHeader {
                entry_type: entry.entry_type,
                size,
            })?;
            ws.write_all(&entry.stream_header)?;
            ws.write_all(&entry.payload)?;
        }
        ws.flush()?;
        Ok(())
    }

    pub fn to_bytes(&self) -> BinResult<Vec<u8>> {
        let mut out = Vec::new();
        self.write_srst(&mut Cursor::new(&mut out))?;
        Ok(out)
    }
}

fn size_error(what: &str) -> binrw::Error {
    binrw::Error::AssertFail {
        pos: 0,
        message: format!("{what} doesn't fit into 32 bits"),
    }
}

fn size_to_u32(size: usize, what: &str) -> BinResult<u32> {
    u32::try_from(size).map_err(|_| size_error(what))
}
