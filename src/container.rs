/*
 * File framing for the CLI. The codeword stream does not self-delimit,
 * so the container records what the decoder cannot recover on its own:
 * the sample count and the encoder's shift.
 *
 * Layout:
 *	magic "q15c" | version | shift | 2 reserved zero bytes
 *	payload: codeword containers, little-endian
 *	trailer: CRC-32 of the payload bytes | sample count, both LE
 */

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crc32fast::Hasher;
use filebuffer::FileBuffer;
use log::debug;

use crate::{decode_with_shift, encode_with_shift, stream_check, Qoi15Error};

const CONTAINER_MAGIC: [u8; 4] = *b"q15c";
const CONTAINER_VERSION: u8 = 1;
const HEADER_SIZE: usize = 8;
const TRAILER_SIZE: usize = 8;

/* Totals reported back to the CLI. */
pub struct FileSummary {
    pub sample_count: usize,
    pub word_count: usize,
}

/// Compresses a raw little-endian 16-bit sample file into a container.
pub fn compress_file(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    internal_shift: u32,
) -> Result<FileSummary, Qoi15Error> {
    let raw = FileBuffer::open(input)?;
    stream_check!(raw.len() % 2 == 0, Qoi15Error::MalformedContainer);
    stream_check!(raw.len() / 2 <= u32::MAX as usize, Qoi15Error::MalformedContainer);

    let mut samples = Vec::with_capacity(raw.len() / 2);
    for pair in raw.chunks_exact(2) {
        samples.push(u16::from_le_bytes([pair[0], pair[1]]));
    }

    let words = encode_with_shift(&samples, internal_shift)?;

    let mut payload = Vec::with_capacity(words.len() * 2);
    for word in &words {
        payload.extend_from_slice(&word.to_le_bytes());
    }
    let mut crc = Hasher::new();
    crc.update(&payload);

    let mut file = File::create(output)?;
    file.write_all(&CONTAINER_MAGIC)?;
    file.write_all(&[CONTAINER_VERSION, internal_shift as u8, 0, 0])?;
    file.write_all(&payload)?;
    file.write_all(&crc.finalize().to_le_bytes())?;
    file.write_all(&(samples.len() as u32).to_le_bytes())?;

    debug!("wrote {} payload bytes for {} samples", payload.len(), samples.len());
    Ok(FileSummary { sample_count: samples.len(), word_count: words.len() })
}

/// Expands a container back into a raw little-endian 16-bit sample file.
pub fn decompress_file(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
) -> Result<FileSummary, Qoi15Error> {
    let bytes = FileBuffer::open(input)?;
    stream_check!(bytes.len() >= HEADER_SIZE + TRAILER_SIZE, Qoi15Error::MalformedContainer);
    stream_check!(bytes[..4] == CONTAINER_MAGIC, Qoi15Error::MalformedContainer);
    stream_check!(bytes[4] == CONTAINER_VERSION, Qoi15Error::MalformedContainer);
    stream_check!(bytes[6] == 0 && bytes[7] == 0, Qoi15Error::MalformedContainer);
    let shift = bytes[5] as u32;

    let payload = &bytes[HEADER_SIZE..bytes.len() - TRAILER_SIZE];
    stream_check!(payload.len() % 2 == 0, Qoi15Error::MalformedContainer);

    let trailer = &bytes[bytes.len() - TRAILER_SIZE..];
    let stored_crc = u32::from_le_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
    let sample_count = u32::from_le_bytes([trailer[4], trailer[5], trailer[6], trailer[7]]) as usize;

    let mut crc = Hasher::new();
    crc.update(payload);
    stream_check!(crc.finalize() == stored_crc, Qoi15Error::MalformedContainer);

    let mut words = Vec::with_capacity(payload.len() / 2);
    for pair in payload.chunks_exact(2) {
        words.push(u16::from_le_bytes([pair[0], pair[1]]));
    }

    let samples = decode_with_shift(&words, sample_count, shift)?;

    let mut raw = Vec::with_capacity(samples.len() * 2);
    for sample in &samples {
        raw.extend_from_slice(&sample.to_le_bytes());
    }
    File::create(output)?.write_all(&raw)?;

    debug!("restored {} samples from {} payload bytes", samples.len(), payload.len());
    Ok(FileSummary { sample_count, word_count: words.len() })
}
