use log::debug;

use crate::sample_table::SampleTable;
use crate::streams::codeword_sink::CodewordSink;
use crate::wire::{self, BitShifter, UNSEEN};
use crate::{differential, run_length, sample_table};

/* Per-strategy output counters, reported once per call. */
#[derive(Default)]
struct StrategyCounters {
    literals: u64,
    diffs: u64,
    table_hits: u64,
    runs: u64,
    run_samples: u64,
}

/*
 * One pass over the input, one strategy decision per sample:
 *
 *	1. a sample equal to `previous` extends the current run;
 *	2. any other sample first flushes the run (relative to the prior
 *	   `previous`, which is left untouched);
 *	3. a small nonzero delta rides a differential sub-codeword;
 *	4. a hash-table hit rides a table sub-codeword;
 *	5. everything else is inserted into the table and emitted as a
 *	   literal container.
 *
 * The caller validates `shift`; worst case every sample becomes a literal
 * container, so the output never outgrows the input.
 */
pub(crate) fn encode_samples(samples: &[u16], shift: u32) -> Vec<u16> {
    let shifter = BitShifter::new(shift);
    let mut table = SampleTable::new();
    let mut sink = CodewordSink::with_capacity(samples.len());
    let mut counters = StrategyCounters::default();

    let mut previous = UNSEEN;
    let mut run: u64 = 0;

    for &sample in samples {
        let current = shifter.down(sample);

        if current == previous {
            run += 1;
            continue;
        }

        if run > 0 {
            flush_run(&mut sink, &mut counters, run);
            run = 0;
        }

        let delta = differential::sub(current, previous);
        if differential::is_valid(delta) {
            sink.push_subcode(differential::encode(delta));
            counters.diffs += 1;
        } else {
            let index = SampleTable::hash(current);
            if table.refer(index) == current {
                sink.push_subcode(sample_table::encode(index));
                counters.table_hits += 1;
            } else {
                table.insert(index, current);
                sink.push_literal(wire::literal_word(current));
                counters.literals += 1;
            }
        }

        previous = current;
    }

    if run > 0 {
        flush_run(&mut sink, &mut counters, run);
    }

    let words = sink.finish();
    debug!(
        "encoded {} samples into {} words: {} literals, {} diffs, {} table hits, {} runs over {} samples",
        samples.len(),
        words.len(),
        counters.literals,
        counters.diffs,
        counters.table_hits,
        counters.runs,
        counters.run_samples,
    );
    words
}

#[inline]
fn flush_run(sink: &mut CodewordSink, counters: &mut StrategyCounters, length: u64) {
    counters.runs += 1;
    counters.run_samples += length;
    run_length::encode(length, |code| sink.push_subcode(code));
}
