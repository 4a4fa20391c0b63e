//! Reference kernel and driver structures for 64-bit Linux.
//!
//! Each schema reproduces the native C layout: `timespec`, `timeval`, the
//! fixed header of `linux_dirent64`, the ALSA `snd_interval` and `snd_mask`
//! hardware-parameter records, and `dma_buf_sync`. C `long` is declared as
//! `isize`.

use std::time::Duration;

use crate::bitset::BitSet;
use crate::config::LayoutConfig;
use crate::enum_field::{CEnum, EnumField};
use crate::error::{AbiError, LayoutError, RangeError, Result};
use crate::record::{FieldDef, Record, RecordSchema};
use crate::storable::Storable;
use crate::types::TypeRegistry;
use crate::vector::Vector;

pub const TIMESPEC: &str = "timespec";
pub const TIMEVAL: &str = "timeval";
pub const LINUX_DIRENT64: &str = "linux_dirent64";
pub const SND_INTERVAL: &str = "snd_interval";
pub const SND_MASK: &str = "snd_mask";
pub const DMA_BUF_SYNC: &str = "dma_buf_sync";

/// Number of bits in an ALSA `snd_mask`.
pub const SND_MASK_MAX: usize = 256;

/// `u32` words backing an ALSA `snd_mask`.
pub type SndMaskBits = Vector<{ SND_MASK_MAX / 32 }, u32>;

pub fn timespec_schema(config: &LayoutConfig) -> std::result::Result<RecordSchema, LayoutError> {
    RecordSchema::with_config(
        TIMESPEC,
        vec![
            FieldDef::scalar::<i64>("tv_sec"),
            FieldDef::scalar::<isize>("tv_nsec"),
        ],
        config,
    )
}

pub fn timeval_schema(config: &LayoutConfig) -> std::result::Result<RecordSchema, LayoutError> {
    RecordSchema::with_config(
        TIMEVAL,
        vec![
            FieldDef::scalar::<i64>("tv_sec"),
            FieldDef::scalar::<isize>("tv_usec"),
        ],
        config,
    )
}

/// Fixed part of a `linux_dirent64`; `d_name` starts at `record_size()`.
pub fn dirent64_schema(config: &LayoutConfig) -> std::result::Result<RecordSchema, LayoutError> {
    RecordSchema::with_config(
        LINUX_DIRENT64,
        vec![
            FieldDef::scalar::<u64>("d_ino"),
            FieldDef::scalar::<i64>("d_off"),
            FieldDef::scalar::<u16>("d_reclen"),
            FieldDef::scalar::<u8>("d_type"),
        ],
        config,
    )
}

/// `snd_interval` with its four one-bit fields packed into `flags`.
pub fn snd_interval_schema(config: &LayoutConfig) -> std::result::Result<RecordSchema, LayoutError> {
    RecordSchema::with_config(
        SND_INTERVAL,
        vec![
            FieldDef::scalar::<u32>("min"),
            FieldDef::scalar::<u32>("max"),
            FieldDef::scalar::<u32>("flags"),
        ],
        config,
    )
}

pub fn snd_mask_schema(config: &LayoutConfig) -> std::result::Result<RecordSchema, LayoutError> {
    RecordSchema::with_config(SND_MASK, vec![FieldDef::new("bits", SndMaskBits::field_kind())], config)
}

pub fn dma_buf_sync_schema(config: &LayoutConfig) -> std::result::Result<RecordSchema, LayoutError> {
    RecordSchema::with_config(DMA_BUF_SYNC, vec![FieldDef::scalar::<u64>("flags")], config)
}

/// Registers every reference schema with `registry`.
pub fn register_abi_records(registry: &TypeRegistry) -> std::result::Result<(), AbiError> {
    let builders: [fn(&LayoutConfig) -> std::result::Result<RecordSchema, LayoutError>; 6] = [
        timespec_schema,
        timeval_schema,
        dirent64_schema,
        snd_interval_schema,
        snd_mask_schema,
        dma_buf_sync_schema,
    ];
    for build in builders {
        registry.register_record(build(registry.config())?)?;
    }
    tracing::debug!(count = builders.len(), "Registered kernel ABI records");
    Ok(())
}

c_enum! {
    /// One-bit fields of `snd_interval`, lowest bit first.
    pub enum IntervalFlag { OpenMin, OpenMax, Integer, Empty }
}

/// Flags word of `snd_interval`.
pub type IntervalFlags = BitSet<u32, IntervalFlag>;

c_enum! {
    /// `DMA_BUF_SYNC_*` bits; a sync without `End` starts CPU access.
    pub enum DmaBufSync { Read, Write, End }
}

/// `flags` of `dma_buf_sync`.
pub type DmaBufSyncFlags = BitSet<u64, DmaBufSync>;

open_enum! {
    /// `SNDRV_PCM_ACCESS_*`; codes past the known ones are kept as `Other`.
    pub enum PcmAccess {
        MmapInterleaved,
        MmapNonInterleaved,
        MmapComplex,
        RwInterleaved,
        RwNonInterleaved,
        ..Other
    }
}

/// `DT_*` directory entry types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirentType {
    Unknown,
    Fifo,
    Chr,
    Dir,
    Blk,
    Reg,
    Lnk,
    Sock,
    Wht,
}

impl CEnum for DirentType {
    const VARIANTS: &'static [Self] = &[
        DirentType::Unknown,
        DirentType::Fifo,
        DirentType::Chr,
        DirentType::Dir,
        DirentType::Blk,
        DirentType::Reg,
        DirentType::Lnk,
        DirentType::Sock,
        DirentType::Wht,
    ];

    fn to_code(self) -> i128 {
        match self {
            DirentType::Unknown => 0,
            DirentType::Fifo => 1,
            DirentType::Chr => 2,
            DirentType::Dir => 4,
            DirentType::Blk => 6,
            DirentType::Reg => 8,
            DirentType::Lnk => 10,
            DirentType::Sock => 12,
            DirentType::Wht => 14,
        }
    }

    fn from_code(code: i128) -> Option<Self> {
        Self::VARIANTS.iter().copied().find(|t| t.to_code() == code)
    }
}

/// Converts a `timespec` record to a duration; negative times are rejected.
pub fn timespec_to_duration(record: &Record) -> Result<Duration> {
    let secs = record.get::<i64>("tv_sec")?;
    let nanos = record.get::<isize>("tv_nsec")?;
    match (u64::try_from(secs), u32::try_from(nanos)) {
        (Ok(secs), Ok(nanos)) if nanos < 1_000_000_000 => Ok(Duration::new(secs, nanos)),
        _ => Err(RangeError {
            type_name: "timespec",
            value: format!("{secs}.{nanos:09}"),
        }
        .into()),
    }
}

/// Fills a `timespec` record from a duration.
pub fn duration_to_timespec(record: &mut Record, duration: Duration) -> Result<()> {
    let secs = i64::try_from(duration.as_secs()).map_err(|_| RangeError {
        type_name: "timespec",
        value: format!("{duration:?}"),
    })?;
    record.set("tv_sec", secs)?;
    record.set("tv_nsec", duration.subsec_nanos() as isize)?;
    Ok(())
}

/// Tests bit `index` of a `snd_mask` record.
pub fn snd_mask_test(record: &Record, index: usize) -> Result<bool> {
    let bits: SndMaskBits = record.get("bits")?;
    let word = bits.get(index / 32)?;
    Ok(word & (1 << (index % 32)) != 0)
}

/// Sets bit `index` of a `snd_mask` record.
pub fn snd_mask_set(record: &mut Record, index: usize) -> Result<()> {
    let mut bits: SndMaskBits = record.get("bits")?;
    let word = bits.get(index / 32)?;
    bits.set(index / 32, word | (1 << (index % 32)))?;
    record.set("bits", bits)
}

/// One entry decoded from a `getdents64` buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub ino: u64,
    pub off: i64,
    /// Raw `d_type`; unknown codes decode to `None` through `try_get`
    pub kind: EnumField<u8, DirentType>,
    pub name: Vec<u8>,
}

/// Iterator over the `linux_dirent64` entries packed in a buffer.
///
/// A directory descriptor keeps one kernel-side read position, so entries
/// are only coherent when a single reader drains each descriptor. Callers
/// that share a descriptor across threads must serialize the reads and the
/// decoding of each filled buffer.
pub struct DirEntries<'a> {
    header: RecordSchema,
    buf: &'a [u8],
    pos: usize,
}

impl<'a> DirEntries<'a> {
    /// Decodes the bytes filled by one `getdents64` call.
    pub fn new(buf: &'a [u8]) -> std::result::Result<Self, LayoutError> {
        Ok(Self {
            header: dirent64_schema(&LayoutConfig::default())?,
            buf,
            pos: 0,
        })
    }

    fn read_at<T: Storable>(&self, base: usize, name: &str) -> Result<T> {
        let offset = self.header.field_offset(name)?;
        Ok(T::read(self.buf, base + offset)?)
    }

    fn decode_entry(&self, base: usize) -> Result<(DirEntry, usize)> {
        let reclen = self.read_at::<u16>(base, "d_reclen")? as usize;
        let name_start = base + self.header.record_size();
        let end = base + reclen;
        if reclen < self.header.record_size() || end > self.buf.len() {
            return Err(AbiError::Bounds(crate::error::BoundsError {
                offset: base,
                size: reclen,
                len: self.buf.len(),
            }));
        }
        let raw_name = &self.buf[name_start..end];
        let name_len = raw_name.iter().position(|&b| b == 0).unwrap_or(raw_name.len());

        let entry = DirEntry {
            ino: self.read_at(base, "d_ino")?,
            off: self.read_at(base, "d_off")?,
            kind: EnumField::from_raw(self.read_at(base, "d_type")?),
            name: raw_name[..name_len].to_vec(),
        };
        Ok((entry, end))
    }
}

impl Iterator for DirEntries<'_> {
    type Item = Result<DirEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.buf.len() {
            return None;
        }
        match self.decode_entry(self.pos) {
            Ok((entry, next)) => {
                self.pos = next;
                Some(Ok(entry))
            }
            Err(e) => {
                // Stop after a malformed entry
                self.pos = self.buf.len();
                Some(Err(e))
            }
        }
    }
}
