//! Read and write NDArrays as Numpy arrays
//!
//! Only what the corpus tooling stores is supported: 2-D, little-endian `f64`, C order.

use ndarray::prelude::*;
use ndarray as nd;
use std::fs::{self, File};
use std::path::Path;
use std::str;
use std::io::{BufReader, BufWriter, Read, Write};
use regex::bytes::Regex;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use errors::*;

const MAGIC: &'static [u8] = b"\x93NUMPY\x01\x00";

/// Write an array as a numpy array
pub fn write_matrix<S, P>(path: P, arr: &ArrayBase<S, Ix2>) -> Result<()>
    where S: nd::Data<Elem=f64>, P: AsRef<Path> {
    let header_nospace = format!("{{'descr': '<f8', 'fortran_order': False, 'shape': ({}, {}), }}",
        arr.shape()[0], arr.shape()[1]);
    let virtual_len =
        // Calculating how many bytes we have in the header, so we can get alignment
        header_nospace.len()
        + MAGIC.len() // The magic string and version number
        + 2 // An unsigned 2-byte integer for header length
        + 1 ; // Because there will be a \n added
    let padding_needed = (((virtual_len + 15) / 16) * 16) - virtual_len; // to get to the next 16

    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(MAGIC)?;
    writer.write_u16::<LittleEndian>((header_nospace.len()
        + padding_needed
        + 1) // newline
        as u16
        )?;
    write!(writer, "{}{}\n", header_nospace, " ".repeat(padding_needed))?;
    // Iterating in logical order writes C order whatever the memory layout is
    for x in arr.iter() {
        writer.write_f64::<LittleEndian>(*x)?;
    }
    writer.flush()?;
    Ok(())
}

/// Read a Numpy matrix into memory. Be careful if it's large. You could run out of memory.
pub fn read_matrix<P: AsRef<Path>>(path: P) -> Result<Array2<f64>> {
    let header_match = Regex::new(
        r"^(?-u:\x93)NUMPY\x01\x00(?s-u:..)\{'descr': ?'<f8', ?'fortran_order': ?False, ?'shape': ?\((\d+), ?(\d+)\),? ?\} *\n"
    )?;
    let path = path.as_ref();
    let mut reader = BufReader::new(File::open(path)
        .map_err(|err| Error::MissingFile(path.to_path_buf(), err))?);

    // The header is padded to a multiple of 16 and is short for 2-D arrays
    let mut head = [0u8; 128];
    let head_len = read_up_to(&mut reader, &mut head)?;
    let (skip, h, w) = {
        let captures = header_match.captures(&head[..head_len])
            .ok_or_else(|| helpful_complaint(path, &head[..head_len]))?;
        let dim = |ix: usize| -> Result<usize> {
            str::from_utf8(&captures[ix]).ok()
                .and_then(|digits| digits.parse().ok())
                .ok_or_else(|| helpful_complaint(path, &head[..head_len]))
        };
        (captures.get(0).map(|m| m.end()).unwrap_or(0), dim(1)?, dim(2)?)
    };

    // Check the shape against the file before trusting it with an allocation
    let body_len = h.checked_mul(w)
        .and_then(|n| n.checked_mul(8))
        .ok_or_else(|| Error::InvalidDimensions(format!(
            "The numpy file {} claims a {}x{} array, which is too large to address",
            path.display(), h, w)))?;
    let available = fs::metadata(path)?.len().saturating_sub(skip as u64);
    if (body_len as u64) > available {
        return Err(Error::InvalidDimensions(format!(
            "The numpy file {} is too short for a {}x{} array ({} bytes, needs {})",
            path.display(), h, w, available, body_len)));
    }

    // Whatever of the body came along with the header
    let mut body = &head[skip..head_len];
    let mut content = vec![0f64; h * w];
    {
        let mut chained = (&mut body).chain(&mut reader);
        chained.read_f64_into::<LittleEndian>(&mut content).map_err(|err| {
            Error::InvalidDimensions(format!(
                "The numpy file {} is too short for a {}x{} array ({})", path.display(), h, w, err))
        })?;
    }
    Ok(Array2::from_shape_vec((h, w), content)?)
}

fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}

/// Tell the user more info about the file
///
/// It seems verbose but you can see this error often so it save you time.
fn helpful_complaint(p: &Path, header: &[u8]) -> Error {
    let cap = ::std::cmp::min(header.len(), 100);
    let complaint = format!(
        "Expected {} to be an uncompressed numpy (.npy) file, but couldn't \
        parse the header. The first hundred bytes look like:

        {}


        As bytes, the header is as follows:

        {:?}


        It should look something like this example, where . are non-printable characters: \
        NUMPY..{{'descr': '<f8', 'fortran_order': False, 'shape': (34, 27), }}\
        Note: document-term matrices are stored as 2D little-endian 64-bit float matrices in C \
        order. Convert sparse or integer matrices before saving them.",
        p.display(),
        String::from_utf8_lossy(&header[..cap]),
        &header[..cap]);
    Error::Other(complaint)
}
