//! Minimal SFNT (TrueType/OpenType) container reader and writer.
//!
//! Only the table directory is interpreted; table contents are carried as
//! opaque bytes.

/// `0x00010000`, TrueType outlines.
pub const TRUETYPE: u32 = 0x0001_0000;
/// `true`, legacy Apple TrueType tag.
pub const TRUETYPE_APPLE: u32 = u32::from_be_bytes(*b"true");
/// `OTTO`, CFF outlines.
pub const CFF: u32 = u32::from_be_bytes(*b"OTTO");
/// `ttcf`, font collection.
const COLLECTION: u32 = u32::from_be_bytes(*b"ttcf");

/// Outline format of a font.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outlines {
    TrueType,
    Cff,
}

/// A single font table.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub tag: [u8; 4],
    pub checksum: u32,
    pub data: Vec<u8>,
}

impl Table {
    pub fn new(tag: &[u8; 4], data: Vec<u8>) -> Self {
        Self {
            tag: *tag,
            checksum: checksum(&data),
            data,
        }
    }

    pub fn tag_str(&self) -> String {
        String::from_utf8_lossy(&self.tag).into_owned()
    }
}

/// A parsed font: its flavor and tables sorted by tag.
#[derive(Debug, Clone, PartialEq)]
pub struct Sfnt {
    pub flavor: u32,
    pub tables: Vec<Table>,
}

/// Errors reading a font file.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FontError {
    #[error("File is too short to be a font")]
    Truncated,

    #[error("Font collections (.ttc) are not supported")]
    Collection,

    #[error("Unknown font signature 0x{0:08x}")]
    UnknownFlavor(u32),

    #[error("Table '{0}' lies outside the file")]
    TableOutOfBounds(String),
}

impl Sfnt {
    /// Read the table directory and copy out each table.
    pub fn parse(bytes: &[u8]) -> Result<Self, FontError> {
        let flavor = read_u32(bytes, 0).ok_or(FontError::Truncated)?;
        match flavor {
            TRUETYPE | TRUETYPE_APPLE | CFF => {}
            COLLECTION => return Err(FontError::Collection),
            other => return Err(FontError::UnknownFlavor(other)),
        }

        let num_tables = read_u16(bytes, 4).ok_or(FontError::Truncated)? as usize;
        let mut tables = Vec::with_capacity(num_tables);

        for i in 0..num_tables {
            let record = 12 + i * 16;
            let tag: [u8; 4] = bytes
                .get(record..record + 4)
                .and_then(|s| s.try_into().ok())
                .ok_or(FontError::Truncated)?;
            let checksum = read_u32(bytes, record + 4).ok_or(FontError::Truncated)?;
            let offset = read_u32(bytes, record + 8).ok_or(FontError::Truncated)? as usize;
            let length = read_u32(bytes, record + 12).ok_or(FontError::Truncated)? as usize;

            let data = offset
                .checked_add(length)
                .and_then(|end| bytes.get(offset..end))
                .ok_or_else(|| {
                    FontError::TableOutOfBounds(String::from_utf8_lossy(&tag).into_owned())
                })?;

            tables.push(Table {
                tag,
                checksum,
                data: data.to_vec(),
            });
        }

        tables.sort_by(|a, b| a.tag.cmp(&b.tag));
        Ok(Self { flavor, tables })
    }

    pub fn outlines(&self) -> Outlines {
        if self.flavor == CFF {
            Outlines::Cff
        } else {
            Outlines::TrueType
        }
    }

    pub fn table(&self, tag: &[u8; 4]) -> Option<&Table> {
        self.tables.iter().find(|t| &t.tag == tag)
    }

    /// Size of the font when laid out as a plain SFNT file.
    pub fn sfnt_size(&self) -> u32 {
        let header = 12 + 16 * self.tables.len();
        let data: usize = self.tables.iter().map(|t| padded_len(t.data.len())).sum();
        (header + data) as u32
    }

    /// Serialize as a plain SFNT file with a fresh `head` checksum
    /// adjustment.
    pub fn to_bytes(&self) -> Vec<u8> {
        let num_tables = self.tables.len() as u16;
        let entry_selector = if num_tables == 0 {
            0
        } else {
            15 - num_tables.leading_zeros() as u16
        };
        let search_range = (1u16 << entry_selector) * 16;
        let range_shift = num_tables * 16 - search_range.min(num_tables * 16);

        let mut out = Vec::with_capacity(self.sfnt_size() as usize);
        out.extend_from_slice(&self.flavor.to_be_bytes());
        out.extend_from_slice(&num_tables.to_be_bytes());
        out.extend_from_slice(&search_range.to_be_bytes());
        out.extend_from_slice(&entry_selector.to_be_bytes());
        out.extend_from_slice(&range_shift.to_be_bytes());

        let mut offset = 12 + 16 * self.tables.len();
        let mut head_offset = None;
        for table in &self.tables {
            let data = zeroed_adjustment(table);
            out.extend_from_slice(&table.tag);
            out.extend_from_slice(&checksum(&data).to_be_bytes());
            out.extend_from_slice(&(offset as u32).to_be_bytes());
            out.extend_from_slice(&(table.data.len() as u32).to_be_bytes());
            if &table.tag == b"head" {
                head_offset = Some(offset);
            }
            offset += padded_len(table.data.len());
        }

        for table in &self.tables {
            out.extend_from_slice(&zeroed_adjustment(table));
            out.resize(padded_len(out.len()), 0);
        }

        if let Some(head) = head_offset {
            if out.len() >= head + 12 {
                let adjustment = 0xB1B0_AFBAu32.wrapping_sub(checksum(&out));
                out[head + 8..head + 12].copy_from_slice(&adjustment.to_be_bytes());
            }
        }

        out
    }
}

/// Table data with `head.checkSumAdjustment` cleared.
fn zeroed_adjustment(table: &Table) -> std::borrow::Cow<'_, [u8]> {
    if &table.tag == b"head" && table.data.len() >= 12 {
        let mut data = table.data.clone();
        data[8..12].fill(0);
        std::borrow::Cow::Owned(data)
    } else {
        std::borrow::Cow::Borrowed(&table.data)
    }
}

/// OpenType table checksum: the wrapping sum of big-endian u32 words,
/// zero-padded.
pub fn checksum(data: &[u8]) -> u32 {
    data.chunks(4).fold(0u32, |sum, chunk| {
        let mut word = [0u8; 4];
        word[..chunk.len()].copy_from_slice(chunk);
        sum.wrapping_add(u32::from_be_bytes(word))
    })
}

/// `len` rounded up to a multiple of four.
pub fn padded_len(len: usize) -> usize {
    (len + 3) & !3
}

pub(crate) fn read_u32(bytes: &[u8], at: usize) -> Option<u32> {
    bytes
        .get(at..at + 4)
        .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
}

pub(crate) fn read_u16(bytes: &[u8], at: usize) -> Option<u16> {
    bytes.get(at..at + 2).map(|b| u16::from_be_bytes([b[0], b[1]]))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A small synthetic TrueType font.
    pub(crate) fn sample_font(flavor: u32) -> Sfnt {
        let mut head = vec![0u8; 54];
        head[0..4].copy_from_slice(&TRUETYPE.to_be_bytes());
        head[12..16].copy_from_slice(&0x5F0F_3CF5u32.to_be_bytes());

        Sfnt {
            flavor,
            tables: vec![
                Table::new(b"OS/2", vec![0u8; 96]),
                Table::new(b"cmap", b"cmap-data-that-repeats-repeats-repeats".to_vec()),
                Table::new(b"glyf", vec![7u8; 300]),
                Table::new(b"head", head),
                Table::new(b"loca", vec![0, 0, 1, 44, 2, 88]),
                Table::new(b"name", b"Foo Regular".to_vec()),
            ],
        }
    }

    #[test]
    fn round_trips_through_bytes() {
        let font = sample_font(TRUETYPE);
        let bytes = font.to_bytes();
        let parsed = Sfnt::parse(&bytes).unwrap();

        assert_eq!(parsed.flavor, TRUETYPE);
        assert_eq!(parsed.tables.len(), 6);
        assert_eq!(parsed.table(b"glyf").unwrap().data, vec![7u8; 300]);
        assert_eq!(bytes.len() as u32, font.sfnt_size());
    }

    #[test]
    fn whole_font_checksum_matches_magic() {
        let bytes = sample_font(TRUETYPE).to_bytes();
        assert_eq!(checksum(&bytes), 0xB1B0_AFBA);
    }

    #[test]
    fn writes_binary_search_header() {
        let bytes = sample_font(TRUETYPE).to_bytes();
        // 6 tables: entrySelector 2, searchRange 64, rangeShift 32
        assert_eq!(read_u16(&bytes, 6), Some(64));
        assert_eq!(read_u16(&bytes, 8), Some(2));
        assert_eq!(read_u16(&bytes, 10), Some(32));
    }

    #[test]
    fn detects_outline_format() {
        assert_eq!(sample_font(CFF).outlines(), Outlines::Cff);
        assert_eq!(sample_font(TRUETYPE_APPLE).outlines(), Outlines::TrueType);
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(Sfnt::parse(b"ab"), Err(FontError::Truncated));
        assert_eq!(Sfnt::parse(b"ttcf\0\0\0\0"), Err(FontError::Collection));
        assert!(matches!(
            Sfnt::parse(b"wOFF\0\0\0\0\0\0\0\0"),
            Err(FontError::UnknownFlavor(_))
        ));
    }

    #[test]
    fn rejects_out_of_bounds_table() {
        let mut bytes = sample_font(TRUETYPE).to_bytes();
        // Inflate the first table's length past the end of the file
        bytes[12 + 12..12 + 16].copy_from_slice(&u32::MAX.to_be_bytes());
        assert!(matches!(
            Sfnt::parse(&bytes),
            Err(FontError::TableOutOfBounds(_))
        ));
    }

    #[test]
    fn checksum_pads_trailing_bytes() {
        assert_eq!(checksum(&[0, 0, 0, 1, 2]), 1 + 0x0200_0000);
        assert_eq!(padded_len(5), 8);
        assert_eq!(padded_len(8), 8);
    }
}
