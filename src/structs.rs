use std::fmt;

use binrw::binrw;

// note: the SRST header doesn't start at 0, the first 0x38 bytes are an opaque preamble
pub const SRST_HEADER_OFFSET: usize = 0x38;
pub const KTSR_HEADER_OFFSET: usize = SRST_HEADER_OFFSET + SrstHeader::byte_len() as usize;
pub const ENTRY_TABLE_OFFSET: usize = KTSR_HEADER_OFFSET + KtsrHeader::byte_len() as usize;

pub const SRST_MAGIC: &[u8; 4] = b"TSRS";
pub const KTSR_MAGIC: &[u8; 4] = b"KTSR";
pub const KTSS_MAGIC: &[u8; 4] = b"KTSS";

// the stream header in front of KTSS, contents unknown
pub const STREAM_HEADER_LEN: usize = 56;
/// position of the KTSS marker relative to the start of an entry record
pub const KTSS_OFFSET: usize = EntryHeader::byte_len() as usize + STREAM_HEADER_LEN;
pub const MIN_ENTRY_SIZE: usize = KTSS_OFFSET + KTSS_MAGIC.len();

#[binrw]
#[brw(little, magic = b"TSRS")]
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SrstHeader {
    // surrounded by zeros
    #[brw(pad_before = 4, pad_after = 4)]
    pub file_size: u32,
}

impl SrstHeader {
    pub const fn byte_len() -> u32 {
        16
    }
}

#[binrw]
#[brw(little, magic = b"KTSR")]
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct KtsrHeader {
    pub chunk_type: u32,
    pub version: u16,
    #[brw(pad_before = 1)]
    pub platform: u8,
    pub game_id: u32,
    // covers this header and the entry table
    #[brw(pad_before = 8)]
    pub file_size: u32,
    #[brw(pad_after = 32)]
    pub file_size2: u32,
}

impl KtsrHeader {
    pub const fn byte_len() -> u32 {
        64
    }

    pub fn platform(&self) -> Platform {
        Platform::from(self.platform)
    }
}

#[binrw]
#[brw(little)]
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EntryHeader {
    pub entry_type: u32,
    // whole record, including these 8 bytes
    pub size: u32,
}

impl EntryHeader {
    pub const fn byte_len() -> u32 {
        8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Pc,
    PsVita,
    Switch,
    Unknown(u8),
}

impl Platform {
    pub fn code(self) -> u8 {
        match self {
            Self::Pc => 0x01,
            Self::PsVita => 0x03,
            Self::Switch => 0x04,
            Self::Unknown(code) => code,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Pc => "PC",
            Self::PsVita => "PS Vita",
            Self::Switch => "Switch",
            Self::Unknown(_) => "unknown",
        }
    }
}

impl From<u8> for Platform {
    fn from(code: u8) -> Self {
        match code {
            0x01 => Self::Pc,
            0x03 => Self::PsVita,
            0x04 => Self::Switch,
            code => Self::Unknown(code),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// human readable name of a platform code, "unknown" for everything unrecognized
pub fn platform_name(code: u8) -> &'static str {
    Platform::from(code).name()
}
