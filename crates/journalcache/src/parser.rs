//! Cache file format using nom
//!
//! File format:
//! ```text
//! JCACHE01
//! [version: u32]
//! ...records...
//! ```
//!
//! Record format (all integers little-endian):
//! ```text
//! [url_len: u32][url]
//! [status: u16]
//! [stored_at: i64, unix millis]
//! [header_count: u16]
//!   [name_len: u16][name][value_len: u32][value]   (header_count times)
//! [body_len: u32][body]
//! ```

use nom::{
    combinator::{map, map_res},
    multi::{count, length_data},
    number::complete::{le_i64, le_u16, le_u32},
    sequence::tuple,
    IResult,
};

use crate::error::{Error, Result};

/// Magic header for cache files
pub const CACHE_MAGIC: &[u8] = b"JCACHE01";

/// Current file format version
pub const CACHE_VERSION: u32 = 1;

/// Length of the file header in bytes
pub const HEADER_LEN: usize = CACHE_MAGIC.len() + 4;

/// One stored response
#[derive(Debug, Clone, PartialEq)]
pub struct CacheRecord {
    /// Request URL (the key)
    pub url: String,
    /// Response status
    pub status: u16,
    /// When the response was stored, unix millis
    pub stored_at: i64,
    /// Response headers
    pub headers: Vec<(String, String)>,
    /// Response body
    pub body: Vec<u8>,
}

/// Parse and validate a cache file header, returning the version
pub fn parse_header(input: &[u8]) -> Result<u32> {
    if input.len() < HEADER_LEN {
        return Err(Error::Parse("Input too short for header".to_string()));
    }

    if &input[0..CACHE_MAGIC.len()] != CACHE_MAGIC {
        return Err(Error::Parse("Invalid cache magic header".to_string()));
    }

    let v = &input[CACHE_MAGIC.len()..HEADER_LEN];
    let version = u32::from_le_bytes([v[0], v[1], v[2], v[3]]);
    if version != CACHE_VERSION {
        return Err(Error::Parse(format!("Unsupported cache version {}", version)));
    }
    Ok(version)
}

/// Create a cache file header
pub fn create_header() -> Vec<u8> {
    let mut header = Vec::with_capacity(HEADER_LEN);
    header.extend_from_slice(CACHE_MAGIC);
    header.extend_from_slice(&CACHE_VERSION.to_le_bytes());
    header
}

fn string_u16(input: &[u8]) -> IResult<&[u8], String> {
    map(map_res(length_data(le_u16), std::str::from_utf8), str::to_string)(input)
}

fn string_u32(input: &[u8]) -> IResult<&[u8], String> {
    map(map_res(length_data(le_u32), std::str::from_utf8), str::to_string)(input)
}

/// Parse a single record
pub fn parse_record(input: &[u8]) -> IResult<&[u8], CacheRecord> {
    let (input, (url, status, stored_at, header_count)) =
        tuple((string_u32, le_u16, le_i64, le_u16))(input)?;
    let (input, headers) = count(tuple((string_u16, string_u32)), header_count as usize)(input)?;
    let (input, body) = length_data(le_u32)(input)?;

    Ok((
        input,
        CacheRecord {
            url,
            status,
            stored_at,
            headers,
            body: body.to_vec(),
        },
    ))
}

/// Parse records until the input is exhausted or a record is cut short
///
/// Returns the records and how many bytes of `input` they covered. A torn
/// final write leaves trailing bytes that are not counted.
pub fn parse_records(mut input: &[u8]) -> (Vec<CacheRecord>, usize) {
    let total = input.len();
    let mut records = Vec::new();

    while !input.is_empty() {
        match parse_record(input) {
            Ok((rest, record)) => {
                records.push(record);
                input = rest;
            }
            Err(_) => break,
        }
    }

    (records, total - input.len())
}

fn length_prefix<T: TryFrom<usize>>(len: usize, what: &str) -> Result<T> {
    T::try_from(len).map_err(|_| Error::Parse(format!("{} too long to store: {}", what, len)))
}

/// Serialise a record
///
/// # Errors
/// * `Error::Parse` - A field is longer than its length prefix can describe
pub fn encode_record(record: &CacheRecord) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(32 + record.url.len() + record.body.len());

    let url_len: u32 = length_prefix(record.url.len(), "URL")?;
    buf.extend_from_slice(&url_len.to_le_bytes());
    buf.extend_from_slice(record.url.as_bytes());
    buf.extend_from_slice(&record.status.to_le_bytes());
    buf.extend_from_slice(&record.stored_at.to_le_bytes());
    let header_count: u16 = length_prefix(record.headers.len(), "header list")?;
    buf.extend_from_slice(&header_count.to_le_bytes());
    for (name, value) in &record.headers {
        let name_len: u16 = length_prefix(name.len(), "header name")?;
        let value_len: u32 = length_prefix(value.len(), "header value")?;
        buf.extend_from_slice(&name_len.to_le_bytes());
        buf.extend_from_slice(name.as_bytes());
        buf.extend_from_slice(&value_len.to_le_bytes());
        buf.extend_from_slice(value.as_bytes());
    }
    let body_len: u32 = length_prefix(record.body.len(), "body")?;
    buf.extend_from_slice(&body_len.to_le_bytes());
    buf.extend_from_slice(&record.body);

    Ok(buf)
}
