//! Read and decrypt MobileSync (iOS device) backups.
//!
//! [`backup`] enumerates the backup directories under a MobileSync root and
//! probes their metadata. [`session`] opens an encrypted backup with a
//! passphrase and extracts files out of its container; the orchestration
//! side of that boundary is the [`session::Decryptor`] and
//! [`session::Session`] traits, so callers can be driven against scripted
//! engines in tests. The crate never mutates a backup.

pub mod backup;
pub mod error;
pub mod keybag;
pub mod manifest;
pub mod metadata;
pub mod session;
