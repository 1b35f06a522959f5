//! Word trends over a vectorized corpus
//!
//! Loads `<folder>/<tag>_vector_data.npy` and its companions, computes how often the given words
//! are used per period (and per pivot group), and prints the first rows of the result.

// argument parsing
#[macro_use] extern crate clap;
// logging
#[macro_use] extern crate log;
extern crate env_logger;
// lastly, this library
extern crate riksprot;

use clap::Arg;
use riksprot::errors::*;
use riksprot::codecs::{IdentityCodecs, PersonCodecs};
use riksprot::corpus::VectorizedCorpus;
use riksprot::trends::{ComputeOpts, PropertyFilter, TrendsCompute, TrendsData};

pub fn main() {
    // Main can't return a Result, and the ? operator needs the enclosing function to return Result
    inner_main().expect("Could not recover. Exiting.");
}
pub fn inner_main() -> Result<()> {
    env_logger::init();
    let args = app_from_crate!()
        .arg_from_usage("<folder> 'folder holding the vectorized corpus'")
        .arg_from_usage("<tag> 'corpus tag, e.g. lemma'")
        .arg_from_usage("<words>... 'words to follow; |regex| matches every token it fits'")
        .arg(Arg::from_usage("-p, --pivot [KEY]... 'document property to split trends by, e.g. party_id'")
            .number_of_values(1))
        .arg(Arg::from_usage("-f, --filter [PAIR]... 'only documents with this property value, as KEY=VALUE'")
            .number_of_values(1))
        .arg(Arg::from_usage("--temporal-key [KEY] 'year, lustrum or decade'").default_value("year"))
        .arg(Arg::from_usage("--keyness [METRIC] 'only tf is computed locally'").default_value("tf"))
        .arg(Arg::from_usage("--top [N] 'most words to show'").default_value("100"))
        .arg(Arg::from_usage("--n-top [N] 'only consider this many of the most frequent words'")
            .default_value("100000"))
        .arg(Arg::from_usage("--rows [N] 'how many rows to print'").default_value("10"))
        .arg_from_usage("--normalize 'relative instead of absolute frequencies'")
        .arg_from_usage("--smooth 'average each period with its neighbours'")
        .arg_from_usage("--fill-gaps 'add empty periods'")
        .arg_from_usage("--unstack 'one row per period, pivot groups as columns'")
        .get_matches();

    let mut filter_opts = PropertyFilter::new();
    for pair in args.values_of("filter").into_iter().flat_map(|values| values) {
        let mut parts = pair.splitn(2, '=');
        match (parts.next(), parts.next()) {
            (Some(key), Some(value)) => filter_opts = filter_opts.with(key, value),
            _ => return Err(Error::InvalidArgument(format!("filter '{}' is not KEY=VALUE", pair))),
        }
    }

    let opts = ComputeOpts {
        fill_gaps: args.is_present("fill-gaps"),
        keyness: args.value_of("keyness").unwrap_or("tf").parse()?,
        normalize: args.is_present("normalize"),
        pivot_keys_id_names: args.values_of("pivot").into_iter()
            .flat_map(|values| values)
            .map(String::from)
            .collect(),
        filter_opts: filter_opts,
        smooth: args.is_present("smooth"),
        temporal_key: args.value_of("temporal-key").unwrap_or("year").parse()?,
        top_count: value_t!(args, "top", usize).unwrap_or_else(|e| e.exit()),
        unstack_tabular: args.is_present("unstack"),
        words: args.values_of("words").into_iter().flat_map(|values| values).map(String::from).collect(),
    };
    let n_top = value_t!(args, "n-top", usize).unwrap_or_else(|e| e.exit());
    let rows = value_t!(args, "rows", usize).unwrap_or_else(|e| e.exit());

    let corpus = VectorizedCorpus::load(args.value_of("folder").unwrap_or("."),
        args.value_of("tag").unwrap_or("lemma"))?;
    let mut trends_data = TrendsData::new(corpus, IdentityCodecs, n_top);
    trends_data.transform(&opts)?;

    let picked = trends_data.find_word_indices(&opts)?;
    if picked.is_empty() {
        warn!("None of {:?} are among the {} most frequent words", opts.words, n_top);
    }
    let trends = trends_data.extract(&picked)?;
    print!("{}", trends_data.person_codecs.decode(&trends.head(rows), true)?);
    Ok(())
}
