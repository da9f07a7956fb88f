//! WOFF2 encoder using null table transforms.
//!
//! Tables are stored untransformed and the concatenated table stream is
//! compressed with Brotli as a single block.

use std::io::{self, Write};

use super::sfnt::{padded_len, Sfnt};

const SIGNATURE: &[u8; 4] = b"wOF2";

/// Tags with a one-byte encoding in the table directory, by index.
const KNOWN_TAGS: [&[u8; 4]; 63] = [
    b"cmap", b"head", b"hhea", b"hmtx", b"maxp", b"name", b"OS/2", b"post", b"cvt ", b"fpgm",
    b"glyf", b"loca", b"prep", b"CFF ", b"VORG", b"EBDT", b"EBLC", b"gasp", b"hdmx", b"kern",
    b"LTSH", b"PCLT", b"VDMX", b"vhea", b"vmtx", b"BASE", b"GDEF", b"GPOS", b"GSUB", b"EBSC",
    b"JSTF", b"MATH", b"CBDT", b"CBLC", b"COLR", b"CPAL", b"SVG ", b"sbix", b"acnt", b"avar",
    b"bdat", b"bloc", b"bsln", b"cvar", b"fdsc", b"feat", b"fmtx", b"fvar", b"gvar", b"hsty",
    b"just", b"lcar", b"mort", b"morx", b"opbd", b"prop", b"trak", b"Zapf", b"Silf", b"Glat",
    b"Gloc", b"Feat", b"Sill",
];

/// Flag value for a tag spelled out after the flag byte.
const ARBITRARY_TAG: u8 = 63;

/// Transform version 3 is the null transform for `glyf` and `loca`;
/// version 0 is the null transform for everything else.
const NULL_GLYF_TRANSFORM: u8 = 3 << 6;

const BROTLI_QUALITY: u32 = 11;
const BROTLI_WINDOW: u32 = 22;

/// Wrap a font in a WOFF2 container.
pub fn encode(font: &Sfnt) -> io::Result<Vec<u8>> {
    let mut directory = Vec::new();
    let mut stream = Vec::new();

    for table in &font.tables {
        let mut flags = KNOWN_TAGS
            .iter()
            .position(|known| **known == table.tag)
            .map(|i| i as u8)
            .unwrap_or(ARBITRARY_TAG);
        if &table.tag == b"glyf" || &table.tag == b"loca" {
            flags |= NULL_GLYF_TRANSFORM;
        }

        directory.push(flags);
        if flags & 0x3f == ARBITRARY_TAG {
            directory.extend_from_slice(&table.tag);
        }
        write_base128(&mut directory, table.data.len() as u32);

        stream.extend_from_slice(&table.data);
    }

    let compressed = compress(&stream)?;

    let header_len = 48;
    let body_len = header_len + directory.len() + compressed.len();
    let total = padded_len(body_len);

    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(SIGNATURE);
    out.extend_from_slice(&font.flavor.to_be_bytes());
    out.extend_from_slice(&(total as u32).to_be_bytes());
    out.extend_from_slice(&(font.tables.len() as u16).to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes());
    out.extend_from_slice(&font.sfnt_size().to_be_bytes());
    out.extend_from_slice(&(compressed.len() as u32).to_be_bytes());
    out.extend_from_slice(&1u16.to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes());
    // metadata and private blocks
    out.extend_from_slice(&[0u8; 20]);

    out.extend_from_slice(&directory);
    out.extend_from_slice(&compressed);
    out.resize(total, 0);

    Ok(out)
}

fn compress(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut writer = brotli::CompressorWriter::new(Vec::new(), 4096, BROTLI_QUALITY, BROTLI_WINDOW);
    writer.write_all(data)?;
    writer.flush()?;
    Ok(writer.into_inner())
}

/// Append `value` as a WOFF2 UIntBase128: big-endian groups of seven bits,
/// high bit set on every byte but the last, no leading zero groups.
pub fn write_base128(out: &mut Vec<u8>, value: u32) {
    let mut groups = [0u8; 5];
    let mut len = 0;
    let mut v = value;
    loop {
        groups[len] = (v & 0x7f) as u8;
        len += 1;
        v >>= 7;
        if v == 0 {
            break;
        }
    }
    for i in (0..len).rev() {
        let continuation = if i > 0 { 0x80 } else { 0 };
        out.push(groups[i] | continuation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::sfnt::tests::sample_font;
    use crate::fonts::sfnt::{read_u16, read_u32, TRUETYPE};
    use std::io::Read;

    fn read_base128(bytes: &[u8], pos: &mut usize) -> u32 {
        let mut value = 0u32;
        loop {
            let b = bytes[*pos];
            *pos += 1;
            value = (value << 7) | (b & 0x7f) as u32;
            if b & 0x80 == 0 {
                return value;
            }
        }
    }

    #[test]
    fn encodes_base128() {
        let mut out = Vec::new();
        write_base128(&mut out, 0);
        write_base128(&mut out, 127);
        write_base128(&mut out, 128);
        write_base128(&mut out, 63_000);
        assert_eq!(out, vec![0x00, 0x7f, 0x81, 0x00, 0x83, 0xec, 0x18]);

        let mut pos = 0;
        assert_eq!(read_base128(&out, &mut pos), 0);
        assert_eq!(read_base128(&out, &mut pos), 127);
        assert_eq!(read_base128(&out, &mut pos), 128);
        assert_eq!(read_base128(&out, &mut pos), 63_000);
    }

    #[test]
    fn writes_header() {
        let font = sample_font(TRUETYPE);
        let woff2 = encode(&font).unwrap();

        assert_eq!(&woff2[0..4], b"wOF2");
        assert_eq!(read_u32(&woff2, 4), Some(TRUETYPE));
        assert_eq!(read_u32(&woff2, 8), Some(woff2.len() as u32));
        assert_eq!(read_u16(&woff2, 12), Some(6));
        assert_eq!(read_u32(&woff2, 16), Some(font.sfnt_size()));
        assert_eq!(read_u16(&woff2, 24), Some(1));
        assert_eq!(woff2.len() % 4, 0);
    }

    #[test]
    fn stream_decodes_to_original_tables() {
        let font = sample_font(TRUETYPE);
        let woff2 = encode(&font).unwrap();

        let compressed_len = read_u32(&woff2, 20).unwrap() as usize;
        let mut pos = 48;
        let mut lengths = Vec::new();

        for table in &font.tables {
            let flags = woff2[pos];
            pos += 1;
            let index = flags & 0x3f;
            if index == ARBITRARY_TAG {
                assert_eq!(&woff2[pos..pos + 4], &table.tag);
                pos += 4;
            } else {
                assert_eq!(KNOWN_TAGS[index as usize], &table.tag);
            }
            let transform = flags >> 6;
            if &table.tag == b"glyf" || &table.tag == b"loca" {
                assert_eq!(transform, 3);
            } else {
                assert_eq!(transform, 0);
            }
            lengths.push(read_base128(&woff2, &mut pos) as usize);
        }

        let mut stream = Vec::new();
        brotli::Decompressor::new(&woff2[pos..pos + compressed_len], 4096)
            .read_to_end(&mut stream)
            .unwrap();

        let mut offset = 0;
        for (table, len) in font.tables.iter().zip(lengths) {
            assert_eq!(&stream[offset..offset + len], table.data.as_slice());
            offset += len;
        }
        assert_eq!(offset, stream.len());
    }

    #[test]
    fn spells_out_unknown_tags() {
        let mut font = sample_font(TRUETYPE);
        font.tables.push(crate::fonts::sfnt::Table::new(b"zzzz", vec![1, 2, 3]));
        let woff2 = encode(&font).unwrap();

        let needle = [ARBITRARY_TAG, b'z', b'z', b'z', b'z', 3];
        assert!(woff2.windows(needle.len()).any(|w| w == needle));
    }
}
