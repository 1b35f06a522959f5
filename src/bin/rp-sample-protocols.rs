//! Draw a few protocols per year from the corpus metadata
//!
//! The metadata is a gzipped, tab separated table with (at least) `document_name` and `year`.
//! The output has one `<document_name>.xml` per line, years in order, and is meant for pulling a
//! small but representative set of protocol files out of the corpus repository.

// argument parsing
#[macro_use] extern crate clap;
// logging
#[macro_use] extern crate log;
extern crate env_logger;
extern crate rand;
// lastly, this library
extern crate riksprot;

use std::path::PathBuf;
use clap::Arg;
use rand::SeedableRng;
use rand::rngs::StdRng;

use riksprot::errors::*;
use riksprot::sample::{self, SampleOpts};

pub fn main() {
    // Main can't return a Result, and the ? operator needs the enclosing function to return Result
    inner_main().expect("Could not recover. Exiting.");
}
pub fn inner_main() -> Result<()> {
    env_logger::init();
    let args = app_from_crate!()
        .arg(Arg::from_usage("--from [YEAR] 'first year to sample'").default_value("1970"))
        .arg(Arg::from_usage("--to [YEAR] 'year to stop before'").default_value("1980"))
        .arg(Arg::from_usage("-n, --per-year [N] 'protocols to draw per year'").default_value("1"))
        .arg(Arg::from_usage("-o, --output [FILE] 'where to write the names'").default_value("protocols.txt"))
        .arg_from_usage("--seed [SEED] 'seed for the draws, to get the same sample again'")
        .arg(Arg::from_usage("[metadata] 'protocol metadata, tab separated and gzipped'")
            .default_value(sample::DEFAULT_METADATA))
        .get_matches();

    let from = value_t!(args, "from", i32).unwrap_or_else(|e| e.exit());
    let to = value_t!(args, "to", i32).unwrap_or_else(|e| e.exit());
    if from >= to {
        return Err(Error::InvalidArgument(format!("no years between {} and {}", from, to)));
    }
    let opts = SampleOpts {
        years: (from..to).collect(),
        n_samples_per_year: value_t!(args, "per-year", usize).unwrap_or_else(|e| e.exit()),
        metadata: PathBuf::from(args.value_of("metadata").unwrap_or(sample::DEFAULT_METADATA)),
        output: PathBuf::from(args.value_of("output").unwrap_or("protocols.txt")),
    };

    let mut rng = if args.is_present("seed") {
        let seed = value_t!(args, "seed", u64).unwrap_or_else(|e| e.exit());
        info!("Sampling with seed {}", seed);
        StdRng::seed_from_u64(seed)
    } else {
        StdRng::from_entropy()
    };

    let written = sample::create_sample_n_titles(&opts, &mut rng)?;
    println!("{} protocols from {} to {} written to {}",
        written, from, to - 1, opts.output.display());
    Ok(())
}
