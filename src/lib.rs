//! Helper functions for the Riksdag protocol corpus
//!
//! Sampling protocols from the corpus metadata, and loading precomputed data products (document
//! indices, document-term matrices) to look at word trends. The binaries are thin wrappers around
//! these modules.


#[macro_use] extern crate log;
#[cfg_attr(test, macro_use)] extern crate ndarray;
extern crate arrow;
extern crate byteorder;
extern crate csv;
extern crate farmhash;
extern crate flate2;
extern crate rand;
extern crate rayon;
extern crate regex;
#[cfg(test)] extern crate tempfile;
pub mod errors;
pub mod table;
pub mod sample;
pub mod numpy;
pub mod vocab;
pub mod corpus;
pub mod codecs;
pub mod trends;
