//! Lossless compression for 16-bit single-channel image data carrying its
//! signal in the top 15 bits. The LSB is dropped on encode and comes back
//! as zero on decode; everything above it round-trips exactly.
//!
//! The stream is a flat array of 16-bit words. Bit 15 splits the word
//! space in two:
//!
//! ```text
//! .- literal container ----------------.
//! | 15 | 14                          0 |
//! |----+-------------------------------|
//! |  1 |        raw 15-bit sample      |
//! `------------------------------------`
//!
//! .- packed container ------------------.
//! | 15 | 14    10 | 9      5 | 4      0 |
//! |----+----------+----------+----------|
//! |  0 |  third   |  second  |  first   |
//! `-------------------------------------`
//! ```
//!
//! Each 5-bit field of a packed container is one sub-codeword, tagged by
//! its high bits:
//!
//! ```text
//! 00 vvv   run digit: 3-bit base-8 digit of a run of the previous sample
//! 01 vvv   table: 3-bit hash index into the 8-entry sample cache
//! 1 vvvv   differential: biased delta in {-8..-1, +1..+8}
//! ```
//!
//! The decoder is not self-delimiting: callers must carry the sample
//! count (and the `internal_shift`, if not the default) in their own
//! framing. [`compress_file`]/[`decompress_file`] provide such framing
//! for the bundled CLI.

pub mod container;
mod decode;
mod differential;
mod encode;
mod run_length;
mod sample_table;
mod streams;
mod wire;

#[macro_use]
extern crate static_assertions;

pub use container::{compress_file, decompress_file, FileSummary};

/* Number of low input bits discarded when no shift is given. */
pub const DEFAULT_SHIFT: u32 = 1;

/*
 * Result of a failed encode or decode call. The codec is designed for
 * streams it produced itself, so the taxonomy is small and nothing is
 * recoverable within a call.
 */
#[derive(Debug)]
pub enum Qoi15Error {
    /* The stream ended before the requested sample count was produced. */
    TruncatedStream,

    /* Residue past a clean strategy boundary that is not zero-valued
     * run padding. */
    TrailingData,

    /* `internal_shift` outside 1..=8. */
    UnsupportedShift,

    /* File container with a bad magic, version, length or checksum. */
    MalformedContainer,

    /* File plumbing around the codec failed. */
    Io(std::io::Error),
}

impl std::fmt::Display for Qoi15Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Qoi15Error::TruncatedStream => write!(f, "stream ended before the requested sample count"),
            Qoi15Error::TrailingData => write!(f, "trailing data past the end of the stream"),
            Qoi15Error::UnsupportedShift => write!(f, "internal shift must be between 1 and 8"),
            Qoi15Error::MalformedContainer => write!(f, "malformed file container"),
            Qoi15Error::Io(err) => write!(f, "i/o error: {}", err),
        }
    }
}

impl std::error::Error for Qoi15Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Qoi15Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Qoi15Error {
    fn from(err: std::io::Error) -> Self {
        Qoi15Error::Io(err)
    }
}

#[macro_export]
macro_rules! stream_check {
    ($cond:expr, $err:expr) => {
        if !$cond {
            return Err($err);
        }
    };
}

/// Encodes `samples` with the default shift of 1.
///
/// The output is never longer than the input; worst case every sample
/// becomes a literal container.
pub fn encode(samples: &[u16]) -> Vec<u16> {
    encode::encode_samples(samples, DEFAULT_SHIFT)
}

/// Encodes `samples`, discarding the `internal_shift` low bits of each.
///
/// The shift is not recorded in the stream; callers must carry it in
/// their framing so the decoder can be given the same value.
pub fn encode_with_shift(samples: &[u16], internal_shift: u32) -> Result<Vec<u16>, Qoi15Error> {
    stream_check!(is_supported_shift(internal_shift), Qoi15Error::UnsupportedShift);
    Ok(encode::encode_samples(samples, internal_shift))
}

/// Decodes exactly `sample_count` samples from `words`, assuming the
/// default shift of 1.
///
/// The stream does not self-delimit, so the count must come from the
/// caller's framing. No partial output is returned on error.
pub fn decode(words: &[u16], sample_count: usize) -> Result<Vec<u16>, Qoi15Error> {
    decode::decode_samples(words, sample_count, DEFAULT_SHIFT)
}

/// Decodes with an explicit `internal_shift` matching the encoder's.
pub fn decode_with_shift(
    words: &[u16],
    sample_count: usize,
    internal_shift: u32,
) -> Result<Vec<u16>, Qoi15Error> {
    stream_check!(is_supported_shift(internal_shift), Qoi15Error::UnsupportedShift);
    decode::decode_samples(words, sample_count, internal_shift)
}

fn is_supported_shift(shift: u32) -> bool {
    (1..=wire::MAX_SHIFT).contains(&shift)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use rayon::prelude::*;

    fn round_trip(samples: &[u16]) -> Vec<u16> {
        let words = encode(samples);
        assert!(words.len() <= samples.len());
        decode(&words, samples.len()).unwrap()
    }

    #[test]
    fn mixed_patterns_round_trip() {
        let mut samples: Vec<u16> = Vec::new();
        for i in 0..7u16 {
            samples.push(i * 0x10);
        }
        for i in 0..7u16 {
            samples.push(0x0100 + i * 0x10);
        }
        samples.extend([0x1000; 7]);
        samples.push(0x0000);
        for i in 0..13u16 {
            samples.push(0x0002 + i * 2);
        }
        for i in 0..7u16 {
            samples.push(0x0018 - i * 2);
        }
        assert_eq!(samples.len(), 42);

        assert_eq!(round_trip(&samples), samples);
    }

    #[test]
    fn pure_run_round_trip() {
        let samples = vec![0xFFFEu16; 513];
        let words = encode(&samples);
        /* One literal, then 4 run digits of 512 packed into two words. */
        assert_eq!(words.len(), 3);
        assert_eq!(decode(&words, samples.len()).unwrap(), samples);
    }

    #[test]
    fn all_literals_worst_case() {
        /* Steps of 0x40 keep every downshifted delta at 32, far past the
         * differential range, and all values distinct. */
        let samples: Vec<u16> = (0..64u16).map(|i| i * 0x40).collect();
        let words = encode(&samples);
        assert_eq!(words.len(), samples.len());
        assert!(words.iter().all(|&word| word & 0x8000 != 0));
        assert_eq!(decode(&words, samples.len()).unwrap(), samples);
    }

    #[test]
    fn single_sample() {
        let words = encode(&[0x1234]);
        assert_eq!(words.len(), 1);
        assert_eq!(decode(&words, 1).unwrap(), vec![0x1234 & 0xFFFE]);
    }

    #[test]
    fn run_after_literal_exact_words() {
        let samples = [0x0010u16; 4];
        let words = encode(&samples);
        /* Literal for the first sample, then one run digit of 3 padded
         * with two zero digits. */
        assert_eq!(words, vec![0x8008, 0x0003]);
        assert_eq!(decode(&words, 4).unwrap(), samples);
    }

    #[test]
    fn table_hit_reuses_cache() {
        let samples = [0x0100u16, 0x0404, 0x0100];
        let words = encode(&samples);
        assert_eq!(words.len(), 3);
        /* Two literals, then a packed word holding the table hit. */
        assert!(words[0] & 0x8000 != 0);
        assert!(words[1] & 0x8000 != 0);
        assert!(words[2] & 0x8000 == 0);
        assert_eq!(decode(&words, 3).unwrap(), samples);
    }

    #[cfg(not(feature = "table-first"))]
    #[test]
    fn differential_boundary() {
        /* A 16-bit step of 16 halves to a delta of 8 and still rides the
         * differential path. */
        let near = [0x0100u16, 0x0110];
        let words = encode(&near);
        assert_eq!(words.len(), 2);
        assert!(words[1] & 0x8000 == 0);
        assert_eq!(decode(&words, 2).unwrap(), near);

        /* A step of 32 exceeds it and falls through to a literal. */
        let far = [0x0100u16, 0x0120];
        let words = encode(&far);
        assert_eq!(words.len(), 2);
        assert!(words.iter().all(|&word| word & 0x8000 != 0));
        assert_eq!(decode(&words, 2).unwrap(), far);
    }

    #[test]
    fn lsb_loss_on_random_input() {
        let mut rng = StdRng::seed_from_u64(7);
        let samples: Vec<u16> = (0..4096).map(|_| rng.gen()).collect();
        let words = encode(&samples);
        let decoded = decode(&words, samples.len()).unwrap();
        for (restored, original) in decoded.iter().zip(&samples) {
            assert_eq!(*restored, original & 0xFFFE);
        }
    }

    #[test]
    fn trailing_zero_padding_accepted() {
        let samples = [0x0100u16, 0x0102, 0x0104];
        let mut words = encode(&samples);
        /* An all-zero packed word is three zero run digits. */
        words.push(0x0000);
        assert_eq!(decode(&words, samples.len()).unwrap(), samples);
    }

    #[test]
    fn trailing_literal_rejected() {
        let samples = [0x0100u16, 0x0102, 0x0104];
        let mut words = encode(&samples);
        words.push(0x8123);
        assert!(matches!(decode(&words, samples.len()), Err(Qoi15Error::TrailingData)));
    }

    #[test]
    fn truncated_stream_rejected() {
        let samples: Vec<u16> = (0..64u16).map(|i| i * 0x40).collect();
        let words = encode(&samples);
        let result = decode(&words[..words.len() - 1], samples.len());
        assert!(matches!(result, Err(Qoi15Error::TruncatedStream)));
    }

    #[test]
    fn empty_input() {
        assert!(encode(&[]).is_empty());
        assert!(decode(&[], 0).unwrap().is_empty());
        assert!(matches!(decode(&[], 1), Err(Qoi15Error::TruncatedStream)));
    }

    #[test]
    fn shift_bounds() {
        assert!(matches!(encode_with_shift(&[1], 0), Err(Qoi15Error::UnsupportedShift)));
        assert!(matches!(encode_with_shift(&[1], 9), Err(Qoi15Error::UnsupportedShift)));
        assert!(matches!(decode_with_shift(&[], 0, 0), Err(Qoi15Error::UnsupportedShift)));
    }

    #[test]
    fn wider_shift_masks_more_bits() {
        let mut rng = StdRng::seed_from_u64(11);
        let samples: Vec<u16> = (0..1024).map(|_| rng.gen()).collect();
        let words = encode_with_shift(&samples, 3).unwrap();
        let decoded = decode_with_shift(&words, samples.len(), 3).unwrap();
        for (restored, original) in decoded.iter().zip(&samples) {
            assert_eq!(*restored, original & !0x7);
        }
    }

    /* Smooth field plus bounded noise, the shape of a photographic
     * monochrome plate after LSB masking. */
    fn synthetic_plate(seed: u64, width: usize, height: usize) -> Vec<u16> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut samples = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                let base = 20000.0
                    + 3000.0 * ((x as f64 / 997.0).sin() + (y as f64 / 613.0).cos())
                    + x as f64 * 2.0;
                let noise: i32 = rng.gen_range(-3..=3);
                let value = (base as i32 + noise).clamp(0, 0xFFFF) as u16;
                samples.push(value & 0xFFFE);
            }
        }
        samples
    }

    #[test]
    fn synthetic_corpus_compresses() {
        let plates: Vec<Vec<u16>> = (0..7).map(|seed| synthetic_plate(seed, 384, 256)).collect();

        plates.into_par_iter().for_each(|samples| {
            let words = encode(&samples);
            assert!(words.len() < samples.len());
            assert_eq!(decode(&words, samples.len()).unwrap(), samples);
        });
    }
}
