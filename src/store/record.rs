//! Fixed-shape stored value: the tuple (hash, inode, link_count, block_count).
//!
//! Serialized length is identical for every record and independent of path
//! (the path lives in the key, not the value).

/// Serialized length of a [`FileRecord`] in bytes.
pub const RECORD_LEN: usize = 32;

/// Metadata tuple stored per path. Does not contain the path itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FileRecord {
    pub hash: u64,
    pub inode: u64,
    pub link_count: u64,
    pub block_count: i64,
}

impl FileRecord {
    pub fn to_bytes(&self) -> [u8; RECORD_LEN] {
        let mut buf = [0u8; RECORD_LEN];
        buf[0..8].copy_from_slice(&self.hash.to_le_bytes());
        buf[8..16].copy_from_slice(&self.inode.to_le_bytes());
        buf[16..24].copy_from_slice(&self.link_count.to_le_bytes());
        buf[24..32].copy_from_slice(&self.block_count.to_le_bytes());
        buf
    }

    /// Decode a record from its on-disk byte layout. Returns `None` if `bytes`
    /// does not have the fixed record length.
    pub fn from_bytes(bytes: &[u8]) -> Option<FileRecord> {
        if bytes.len() != RECORD_LEN {
            return None;
        }
        let hash = u64::from_le_bytes(bytes[0..8].try_into().unwrap());
        let inode = u64::from_le_bytes(bytes[8..16].try_into().unwrap());
        let link_count = u64::from_le_bytes(bytes[16..24].try_into().unwrap());
        let block_count = i64::from_le_bytes(bytes[24..32].try_into().unwrap());
        Some(FileRecord {
            hash,
            inode,
            link_count,
            block_count,
        })
    }
}

/// Build the store key for `path`: the absolute path bytes plus a trailing NUL.
/// Key length is the byte length of the path plus one, never a code-point count.
pub fn store_key(path: &std::path::Path) -> Vec<u8> {
    use std::os::unix::ffi::OsStrExt;
    let mut key = Vec::with_capacity(path.as_os_str().len() + 1);
    key.extend_from_slice(path.as_os_str().as_bytes());
    key.push(0);
    key
}

/// Recover the path from a stored key by stripping the trailing NUL.
pub fn path_from_key(key: &[u8]) -> Option<&std::path::Path> {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;
    let stripped = key.strip_suffix(&[0u8])?;
    Some(std::path::Path::new(OsStr::from_bytes(stripped)))
}
