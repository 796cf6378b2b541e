use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use aes::cipher::block_padding::{NoPadding, Pkcs7};
use aes::cipher::{BlockDecryptMut, KeyIvInit};
use rusqlite::OptionalExtension;

use crate::error::{Error, Result};
use crate::keybag::{self, ClassKeys, KeyBag};
use crate::manifest::FileRecord;

type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Backup payloads are encrypted AES-256-CBC with an all-zero IV.
const ZERO_IV: [u8; 16] = [0u8; 16];

/// Capability interface over the decryption engine.
///
/// Opening fails with [`Error::WrongPassword`] when the passphrase does not
/// check out (including key-unwrap integrity failures) and with other
/// variants for corrupt or incompatible containers, so callers branch on
/// the error kind rather than on message text. Workflow code is written
/// against this trait and can be driven by a scripted engine in tests.
pub trait Decryptor {
    type Session: Session;

    fn open(&self, backup_dir: &Path, passphrase: &str) -> Result<Self::Session>;
}

/// One open decryption pass over a backup container.
pub trait Session {
    /// Decrypt the file stored under `relative_path` in the container and
    /// write its plaintext to `output_path`. Fails with
    /// [`Error::FileNotFound`] when the container has no such file.
    fn extract(&mut self, relative_path: &str, output_path: &Path) -> Result<()>;
}

/// The standard engine: unlocks the backup key bag with the passphrase and
/// serves extractions out of the manifest database.
pub struct BackupOpener;

impl Decryptor for BackupOpener {
    type Session = EncryptedBackup;

    fn open(&self, backup_dir: &Path, passphrase: &str) -> Result<EncryptedBackup> {
        EncryptedBackup::open(backup_dir, passphrase)
    }
}

/// An encrypted backup with its key bag unlocked and its manifest database
/// decrypted and opened. Dropped at the end of the extraction pass; nothing
/// is persisted between runs.
pub struct EncryptedBackup {
    backup_dir: PathBuf,
    class_keys: ClassKeys,
    manifest_db: rusqlite::Connection,
    // Holds the decrypted manifest database on disk until the connection
    // above is dropped.
    _staging: tempfile::NamedTempFile,
}

impl EncryptedBackup {
    pub fn open<P: AsRef<Path>>(backup_dir: P, passphrase: &str) -> Result<EncryptedBackup> {
        let backup_dir = backup_dir.as_ref().to_path_buf();

        let manifest = plist::Value::from_file(backup_dir.join("Manifest.plist"))?;
        let manifest = manifest.as_dictionary().ok_or_else(|| {
            Error::InvalidFormat("Manifest.plist is not a dictionary".to_string())
        })?;
        let keybag_data = manifest
            .get("BackupKeyBag")
            .and_then(plist::Value::as_data)
            .ok_or_else(|| {
                Error::InvalidFormat("Manifest.plist carries no BackupKeyBag".to_string())
            })?;
        let manifest_key = manifest
            .get("ManifestKey")
            .and_then(plist::Value::as_data)
            .ok_or_else(|| {
                Error::InvalidFormat("Manifest.plist carries no ManifestKey".to_string())
            })?;

        let class_keys = KeyBag::parse(keybag_data)?.unlock(passphrase)?;

        // ManifestKey: four little-endian protection-class bytes, then the
        // wrapped key for Manifest.db.
        if manifest_key.len() <= 4 {
            return Err(Error::InvalidFormat("ManifestKey is too short".to_string()));
        }
        let class = u32::from_le_bytes([
            manifest_key[0],
            manifest_key[1],
            manifest_key[2],
            manifest_key[3],
        ]);
        let class_key = class_keys.get(&class).ok_or_else(|| {
            Error::InvalidFormat(format!("no class {class} key for the manifest database"))
        })?;
        let db_key = keybag::unwrap_key(class_key, &manifest_key[4..])?;

        let mut encrypted_db = fs::read(backup_dir.join("Manifest.db"))?;
        let plaintext = Aes256CbcDec::new_from_slices(&db_key, &ZERO_IV)?
            .decrypt_padded_mut::<Pkcs7>(&mut encrypted_db)?;

        let mut staging = tempfile::NamedTempFile::new()?;
        staging.write_all(plaintext)?;
        staging.flush()?;
        let manifest_db = rusqlite::Connection::open_with_flags(
            staging.path(),
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        )?;

        Ok(EncryptedBackup {
            backup_dir,
            class_keys,
            manifest_db,
            _staging: staging,
        })
    }

    /// iOS 10+ shards stored files into two-character subdirectories keyed
    /// by the file identifier; older backups keep them flat.
    fn stored_blob_path(&self, file_id: &str) -> Result<PathBuf> {
        if file_id.len() < 2 {
            return Err(Error::InvalidFormat(format!(
                "malformed file identifier: {file_id}"
            )));
        }
        let sharded = self.backup_dir.join(&file_id[..2]).join(file_id);
        if sharded.exists() {
            return Ok(sharded);
        }
        let flat = self.backup_dir.join(file_id);
        if flat.exists() {
            return Ok(flat);
        }
        Err(Error::FileNotFound(file_id.to_string()))
    }
}

impl Session for EncryptedBackup {
    fn extract(&mut self, relative_path: &str, output_path: &Path) -> Result<()> {
        let row = self
            .manifest_db
            .query_row(
                "SELECT fileID, file FROM Files WHERE relativePath = ?1 ORDER BY domain LIMIT 1",
                [relative_path],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, Vec<u8>>(1)?)),
            )
            .optional()?;
        let (file_id, record_blob) =
            row.ok_or_else(|| Error::FileNotFound(relative_path.to_string()))?;

        let record = FileRecord::from_blob(&record_blob)?;
        let wrapped_key = record.wrapped_key.ok_or_else(|| {
            Error::InvalidFormat(format!("{relative_path} carries no file key"))
        })?;
        let class_key = self.class_keys.get(&record.protection_class).ok_or_else(|| {
            Error::InvalidFormat(format!(
                "no class {} key for {relative_path}",
                record.protection_class
            ))
        })?;
        let file_key = keybag::unwrap_key(class_key, &wrapped_key)?;

        let mut data = fs::read(self.stored_blob_path(&file_id)?)?;
        let plaintext = Aes256CbcDec::new_from_slices(&file_key, &ZERO_IV)?
            .decrypt_padded_mut::<NoPadding>(&mut data)?;
        // The stored blob is padded to the cipher block; the record's Size
        // is the real plaintext length.
        let length = std::cmp::min(record.size as usize, plaintext.len());
        fs::write(output_path, &plaintext[..length])?;
        Ok(())
    }
}
