//! Minimal XDR encoding for a single-operation `MANAGE_DATA` transaction.
//!
//! Only the subset needed to derive a transaction hash is covered:
//! ed25519 source account, time-bound preconditions, no memo, one
//! operation without its own source account.

use sha2::{Digest, Sha256};

const KEY_TYPE_ED25519: i32 = 0;
const PRECOND_TIME: i32 = 1;
const MEMO_NONE: i32 = 0;
const MANAGE_DATA: i32 = 10;
const ENVELOPE_TYPE_TX: i32 = 2;

/// Maximum length of a data entry name and value.
pub const DATA_MAX_LEN: usize = 64;

/// Big-endian XDR writer with 4-byte alignment.
#[derive(Debug, Default)]
pub struct XdrWriter {
    buf: Vec<u8>,
}

impl XdrWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn int32(&mut self, v: i32) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub fn uint32(&mut self, v: u32) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub fn int64(&mut self, v: i64) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub fn uint64(&mut self, v: u64) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub fn fixed_opaque(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self.pad();
        self
    }

    /// Length-prefixed opaque (also used for `string<N>`).
    pub fn var_opaque(&mut self, bytes: &[u8]) -> &mut Self {
        self.uint32(bytes.len() as u32);
        self.fixed_opaque(bytes)
    }

    fn pad(&mut self) {
        let rem = self.buf.len() % 4;
        if rem != 0 {
            self.buf.resize(self.buf.len() + 4 - rem, 0);
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// A v1 transaction carrying one `MANAGE_DATA` operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManageDataTransaction {
    pub source: [u8; 32],
    pub fee: u32,
    pub sequence: i64,
    pub min_time: u64,
    pub max_time: u64,
    pub data_name: String,
    /// `None` deletes the entry.
    pub data_value: Option<Vec<u8>>,
}

impl ManageDataTransaction {
    pub fn to_xdr(&self) -> Vec<u8> {
        let mut w = XdrWriter::new();
        w.int32(KEY_TYPE_ED25519)
            .fixed_opaque(&self.source)
            .uint32(self.fee)
            .int64(self.sequence)
            .int32(PRECOND_TIME)
            .uint64(self.min_time)
            .uint64(self.max_time)
            .int32(MEMO_NONE);

        // operations<100>, one entry with no per-op source account
        w.uint32(1).uint32(0).int32(MANAGE_DATA);
        let name = self.data_name.as_bytes();
        w.var_opaque(&name[..name.len().min(DATA_MAX_LEN)]);
        match &self.data_value {
            Some(value) => {
                w.uint32(1).var_opaque(&value[..value.len().min(DATA_MAX_LEN)]);
            }
            None => {
                w.uint32(0);
            }
        }

        // ext
        w.int32(0);
        w.into_bytes()
    }

    /// Transaction hash under the given network passphrase.
    pub fn hash(&self, network_passphrase: &str) -> [u8; 32] {
        let network_id = Sha256::digest(network_passphrase.as_bytes());
        let mut hasher = Sha256::new();
        hasher.update(network_id);
        hasher.update(ENVELOPE_TYPE_TX.to_be_bytes());
        hasher.update(self.to_xdr());
        hasher.finalize().into()
    }
}
