//
// Errors
//
use std::io;
use std::result;
use std::error;
use std::fmt;
use std::path::PathBuf;
use arrow::error::ArrowError;
use csv;
use regex;
use ndarray as nd;

/// Type alias for riksprot errors
pub type Result<X> = result::Result<X, Error>;

/// Wrapper for the kinds of errors occurring while reading tables and computing trends
#[derive(Debug)]
pub enum Error {
    InvalidArgument(String),
    InvalidDimensions(String),
    MissingColumn(String, PathBuf),
    MissingFile(PathBuf, io::Error),
    ShapeError(nd::ShapeError),
    IOError(io::Error),
    CsvError(csv::Error),
    ArrowError(ArrowError),
    BadField(String),
    RegexError(regex::Error),
    Unsupported(String),
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::InvalidArgument(ref info) => write!(f, "Invalid argument: {}", info),
            Error::InvalidDimensions(ref info) => write!(f, "Dimension Mismatch: {}", info),
            Error::MissingColumn(ref column, ref path) => write!(f,
                "The table {} has no column named '{}'. Check the delimiter and the header row.",
                path.display(), column),
            Error::MissingFile(ref path, ref err) => write!(f,
                "The file {} must already exist at this point but there was a problem opening it. \
                Wrong directory? Maybe missed a step? The OS error was: {}",
                path.display(), err),
            Error::ShapeError(ref err) => write!(f, "NDArray shape error: {:?}", err),
            Error::IOError(ref err) => write!(f, "IO error: {}", err),
            Error::CsvError(ref err) => write!(f, "Error reading table: {}", err),
            Error::ArrowError(ref err) => write!(f, "Error reading Arrow data: {}", err),
            Error::BadField(ref info) => write!(f, "Malformed field: {}", info),
            Error::RegexError(ref err) => write!(f, "Bad word pattern: {}", err),
            Error::Unsupported(ref info) => write!(f, "Not supported here: {}", info),
            Error::Other(ref info) => write!(f, "{}", info),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            Error::MissingFile(_, ref err) => Some(err),
            Error::ShapeError(ref err) => Some(err),
            Error::IOError(ref err) => Some(err),
            Error::CsvError(ref err) => Some(err),
            Error::ArrowError(ref err) => Some(err),
            Error::RegexError(ref err) => Some(err),
            _ => None,
        }
    }
}
//
// Convert everything else into Error
//
impl From<nd::ShapeError> for Error {
    fn from(err: nd::ShapeError) -> Self {
        Error::ShapeError(err)
    }
}
impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::IOError(err)
    }
}
impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::CsvError(err)
    }
}
impl From<ArrowError> for Error {
    fn from(err: ArrowError) -> Self {
        Error::ArrowError(err)
    }
}
impl From<regex::Error> for Error {
    fn from(err: regex::Error) -> Self {
        Error::RegexError(err)
    }
}

//
// Convert Error into a general io Error
//
impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::IOError(err) => err,
            other => io::Error::new(io::ErrorKind::Other, other),
        }
    }
}
