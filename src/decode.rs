use log::debug;
use nightly_quirks::branch_pred::unlikely;

use crate::sample_table::SampleTable;
use crate::streams::codeword_source::{CodewordSource, Token};
use crate::wire::{self, BitShifter, UNSEEN};
use crate::{differential, run_length, sample_table, stream_check, Qoi15Error};

/*
 * Inverse state machine. Consecutive run digits accumulate little-endian;
 * any non-run token flushes the pending run against the current
 * `previous` before being applied, and end-of-input flushes one final
 * time. Container padding arrives here as zero digits: appended to a live
 * run they are higher-order zeros (a no-op), on their own they accumulate
 * to length zero and expand to nothing.
 *
 * The caller validates `shift`. Exactly `sample_count` samples must come
 * out; a stream that runs dry is truncated, and one that keeps producing
 * past the end carries non-padding residue.
 */
pub(crate) fn decode_samples(
    words: &[u16],
    sample_count: usize,
    shift: u32,
) -> Result<Vec<u16>, Qoi15Error> {
    let shifter = BitShifter::new(shift);
    let mut table = SampleTable::new();
    let mut source = CodewordSource::new(words);
    let mut out = Vec::with_capacity(sample_count);

    let mut previous = UNSEEN;
    let mut run_acc: u64 = 0;
    let mut digit_shift: u32 = 0;

    while let Some(token) = source.next() {
        let current = match token {
            Token::Subcode(code) => {
                if run_length::check_header(code) {
                    stream_check!(
                        digit_shift <= u64::BITS - wire::RUN_VALUE_BITS,
                        Qoi15Error::TrailingData
                    );
                    run_acc |= run_length::digit(code) << digit_shift;
                    digit_shift += wire::RUN_VALUE_BITS;
                    continue;
                }

                flush_run(&mut out, sample_count, shifter.up(previous), &mut run_acc, &mut digit_shift)?;

                if differential::check_header(code) {
                    differential::apply(previous, differential::decode(code))
                } else {
                    debug_assert!(sample_table::check_header(code));
                    table.refer(sample_table::decode(code))
                }
            }
            Token::Literal(sample) => {
                flush_run(&mut out, sample_count, shifter.up(previous), &mut run_acc, &mut digit_shift)?;
                table.insert(SampleTable::hash(sample), sample);
                sample
            }
        };

        if unlikely(out.len() >= sample_count) {
            return Err(Qoi15Error::TrailingData);
        }
        out.push(shifter.up(current));
        previous = current;
    }

    flush_run(&mut out, sample_count, shifter.up(previous), &mut run_acc, &mut digit_shift)?;
    stream_check!(out.len() == sample_count, Qoi15Error::TruncatedStream);

    debug!("decoded {} words into {} samples", words.len(), out.len());
    Ok(out)
}

#[inline]
fn flush_run(
    out: &mut Vec<u16>,
    sample_count: usize,
    fill: u16,
    run_acc: &mut u64,
    digit_shift: &mut u32,
) -> Result<(), Qoi15Error> {
    if *digit_shift == 0 {
        return Ok(());
    }
    let length = *run_acc;
    *run_acc = 0;
    *digit_shift = 0;
    if length == 0 {
        return Ok(());
    }

    stream_check!(
        length <= (sample_count - out.len()) as u64,
        Qoi15Error::TrailingData
    );
    out.resize(out.len() + length as usize, fill);
    Ok(())
}
