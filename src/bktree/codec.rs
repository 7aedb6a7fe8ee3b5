//! On-disk form of a BK-tree.
//!
//! The file is a gzip stream holding two bincode records: a fixed header
//! (magic + format version), then the body (node count and the recursive
//! node structure, each node followed by its distance-keyed children).
//! The header is decoded first so that a foreign or newer file is rejected
//! before any attempt to decode the tree itself.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use bincode::Options;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{BkNode, BkTree, Metric};
use crate::runtime::Error;

pub const INDEX_MAGIC: u32 = 0xB4CE_7AEE;
pub const INDEX_FORMAT_VERSION: u32 = 1;

/// Upper bound on the decoded size of an index body. Length prefixes past
/// this are rejected before anything is allocated for them
pub const INDEX_BODY_LIMIT: u64 = 1 << 30;

// Fixed-width little-endian integers, the layout of `bincode::serialize_into`
fn index_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .allow_trailing_bytes()
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub magic: u32,
    pub version: u32,
}

impl Header {
    fn current() -> Header {
        Header {
            magic: INDEX_MAGIC,
            version: INDEX_FORMAT_VERSION,
        }
    }
}

// Borrowing twin of `Body`, so that writing does not need to clone the tree.
// Box<T> and &T serialise identically, so the two are wire compatible
#[derive(Serialize)]
struct BodyRef<'a, T> {
    size: u64,
    root: Option<&'a BkNode<T>>,
}

#[derive(Deserialize)]
struct Body<T> {
    size: u64,
    root: Option<Box<BkNode<T>>>,
}

///////////////////////////////
/// Encode a tree onto a stream. The stream is not compressed here
pub fn write_tree<T, M, W>(tree: &BkTree<T, M>, mut writer: W) -> Result<(), Error>
where
    T: Serialize,
    M: Metric<T>,
    W: Write,
{
    index_options()
        .serialize_into(&mut writer, &Header::current())
        .map_err(|e| Error::parse_error("index header", Some(e.to_string())))?;

    let body = BodyRef {
        size: tree.len() as u64,
        root: tree.root(),
    };
    index_options()
        .serialize_into(&mut writer, &body)
        .map_err(|e| Error::parse_error("index body", Some(e.to_string())))?;
    Ok(())
}

///////////////////////////////
/// Decode a tree from a stream, attaching the given metric
pub fn read_tree<T, M, R>(reader: R, metric: M) -> Result<BkTree<T, M>, Error>
where
    T: DeserializeOwned,
    M: Metric<T>,
    R: Read,
{
    read_tree_with_limit(reader, metric, INDEX_BODY_LIMIT)
}

///////////////////////////////
/// Decode a tree whose body may take at most `limit` bytes
pub fn read_tree_with_limit<T, M, R>(
    mut reader: R,
    metric: M,
    limit: u64,
) -> Result<BkTree<T, M>, Error>
where
    T: DeserializeOwned,
    M: Metric<T>,
    R: Read,
{
    let header: Header = index_options()
        .deserialize_from(&mut reader)
        .map_err(|e| Error::parse_error("index header", Some(e.to_string())))?;
    if header.magic != INDEX_MAGIC {
        return Err(Error::parse_error(
            "index header",
            Some(format!("not a bcsplit index (magic {:#010x})", header.magic)),
        ));
    }
    if header.version != INDEX_FORMAT_VERSION {
        return Err(Error::parse_error(
            "index header",
            Some(format!(
                "format version {} is not supported, expected {}",
                header.version, INDEX_FORMAT_VERSION
            )),
        ));
    }

    let body: Body<T> = index_options()
        .with_limit(limit)
        .deserialize_from(&mut reader)
        .map_err(|e| Error::parse_error("index body", Some(e.to_string())))?;

    let tree = BkTree::from_parts(body.root, metric);
    if tree.len() as u64 != body.size {
        return Err(Error::parse_error(
            "index body",
            Some(format!(
                "header declares {} nodes but {} were decoded",
                body.size,
                tree.len()
            )),
        ));
    }
    Ok(tree)
}

///////////////////////////////
/// Write a gzip-compressed index file
pub fn save_tree<T, M, P>(tree: &BkTree<T, M>, path: P) -> Result<(), Error>
where
    T: Serialize,
    M: Metric<T>,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| Error::io(path, e))?;
    let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());

    write_tree(tree, &mut encoder).map_err(|e| Error::index_format(path, Some(e.to_string())))?;

    let mut inner = encoder.finish().map_err(|e| Error::io(path, e))?;
    inner.flush().map_err(|e| Error::io(path, e))?;

    debug!("Wrote index with {} entries to {}", tree.len(), path.display());
    Ok(())
}

///////////////////////////////
/// Read a gzip-compressed index file
pub fn load_tree<T, M, P>(path: P, metric: M) -> Result<BkTree<T, M>, Error>
where
    T: DeserializeOwned,
    M: Metric<T>,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::file_not_found(path)
        } else {
            Error::io(path, e)
        }
    })?;

    let decoder = GzDecoder::new(BufReader::new(file));
    let tree = read_tree(decoder, metric).map_err(|e| Error::index_format(path, Some(e.to_string())))?;

    debug!("Loaded index with {} entries from {}", tree.len(), path.display());
    Ok(tree)
}
