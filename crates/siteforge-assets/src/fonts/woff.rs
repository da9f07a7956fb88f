//! WOFF 1.0 encoder.

use std::io::{self, Write};

use flate2::write::ZlibEncoder;
use flate2::Compression;

use super::sfnt::{padded_len, Sfnt};

const SIGNATURE: &[u8; 4] = b"wOFF";
const HEADER_LEN: usize = 44;
const ENTRY_LEN: usize = 20;

/// Wrap a font in a WOFF container, zlib-compressing each table that
/// shrinks.
pub fn encode(font: &Sfnt) -> io::Result<Vec<u8>> {
    let mut blocks = Vec::with_capacity(font.tables.len());
    for table in &font.tables {
        let compressed = compress(&table.data)?;
        blocks.push(if compressed.len() < table.data.len() {
            compressed
        } else {
            table.data.clone()
        });
    }

    let mut offset = HEADER_LEN + ENTRY_LEN * font.tables.len();
    let data_start = offset;
    let total: usize = data_start + blocks.iter().map(|b| padded_len(b.len())).sum::<usize>();

    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(SIGNATURE);
    out.extend_from_slice(&font.flavor.to_be_bytes());
    out.extend_from_slice(&(total as u32).to_be_bytes());
    out.extend_from_slice(&(font.tables.len() as u16).to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes());
    out.extend_from_slice(&font.sfnt_size().to_be_bytes());
    out.extend_from_slice(&1u16.to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes());
    // metadata and private blocks: offset, length, original length / offset, length
    out.extend_from_slice(&[0u8; 20]);

    for (table, block) in font.tables.iter().zip(&blocks) {
        out.extend_from_slice(&table.tag);
        out.extend_from_slice(&(offset as u32).to_be_bytes());
        out.extend_from_slice(&(block.len() as u32).to_be_bytes());
        out.extend_from_slice(&(table.data.len() as u32).to_be_bytes());
        out.extend_from_slice(&table.checksum.to_be_bytes());
        offset += padded_len(block.len());
    }

    for block in &blocks {
        out.extend_from_slice(block);
        out.resize(padded_len(out.len()), 0);
    }

    debug_assert_eq!(out.len(), total);
    Ok(out)
}

fn compress(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(data)?;
    encoder.finish()
}
