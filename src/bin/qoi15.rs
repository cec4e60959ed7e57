use std::path::PathBuf;
use std::time::Instant;

use qoi15::{compress_file, decompress_file};
use structopt::StructOpt;

#[derive(StructOpt)]
enum Qoi15Params {
    /// Compress a raw little-endian 16-bit sample file.
    Pack {
        input: PathBuf,
        output: Option<PathBuf>,
        #[structopt(short, default_value = "1")]
        shift: u32,
    },
    /// Expand a container back into raw samples.
    Unpack {
        input: PathBuf,
        output: Option<PathBuf>,
    },
}

fn main() {
    pretty_env_logger::init();

    match Qoi15Params::from_args() {
        Qoi15Params::Pack { input, output, shift } => {
            let output = output.unwrap_or_else(|| input.with_extension("q15"));
            let start = Instant::now();
            let summary = compress_file(&input, &output, shift).unwrap();
            println!(
                "packed {} samples into {} words in {:?} (ratio {:.3})",
                summary.sample_count,
                summary.word_count,
                start.elapsed(),
                summary.word_count as f64 / summary.sample_count.max(1) as f64,
            );
        }
        Qoi15Params::Unpack { input, output } => {
            let output = output.unwrap_or_else(|| input.with_extension("raw"));
            let start = Instant::now();
            let summary = decompress_file(&input, &output).unwrap();
            println!(
                "unpacked {} samples from {} words in {:?}",
                summary.sample_count,
                summary.word_count,
                start.elapsed(),
            );
        }
    }
}
