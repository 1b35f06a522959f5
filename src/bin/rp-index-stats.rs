//! Load a document index and say how big it is
//!
//! A quick check that a precomputed index (speech index, DTM document index) is where it should
//! be and parses.

// argument parsing
#[macro_use] extern crate clap;
// logging
extern crate env_logger;
// lastly, this library
extern crate riksprot;

use clap::Arg;
use riksprot::errors::*;
use riksprot::table::{read_document_index, read_speech_index};

pub fn main() {
    // Main can't return a Result, and the ? operator needs the enclosing function to return Result
    inner_main().expect("Could not recover. Exiting.");
}
pub fn inner_main() -> Result<()> {
    env_logger::init();
    let args = app_from_crate!()
        .arg_from_usage("<index> 'document index, delimited and possibly gzipped, or a .feather speech index'")
        .arg(Arg::from_usage("-d, --delimiter [CHAR] 'column separator'").default_value(";"))
        .get_matches();

    let delimiter = match args.value_of("delimiter").unwrap_or(";") {
        "\\t" | "tab" => b'\t',
        d if d.len() == 1 => d.as_bytes()[0],
        d => return Err(Error::InvalidArgument(format!("'{}' is not a single byte delimiter", d))),
    };
    let path = args.value_of("index").unwrap_or_default();
    let index = if path.ends_with(".feather") {
        read_speech_index(path)?
    } else {
        read_document_index(path, delimiter)?
    };

    let first = index.iter().map(|doc| doc.year).min();
    let last = index.iter().map(|doc| doc.year).max();
    match (first, last) {
        (Some(first), Some(last)) => println!("{} documents from {} to {}", index.len(), first, last),
        _ => println!("The index is empty"),
    }
    Ok(())
}
