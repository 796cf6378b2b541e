use std::collections::BTreeMap;
use std::io::Read;

use byteorder::{BigEndian, ReadBytesExt};

use crate::error::{Error, Result};

/// KeyBag represents the `BackupKeyBag` blob carried in Manifest.plist.
///
/// The blob is a flat sequence of records:
/// ```text
/// tag                             53 41 4c 54               SALT
/// length                          xx xx xx xx (big endian)
/// value                           xx xx .. (length bytes)
/// ```
/// Global attributes come first (VERS, TYPE, UUID, HMCK, WRAP, SALT, ITER,
/// and on 10.2+ backups the double-protection fields DPWT/DPIC/DPSL),
/// followed by one block per protection class, each introduced by its own
/// UUID record and carrying CLAS, WRAP, KTYP and the wrapped class key
/// WPKY.
#[derive(Debug, Default)]
pub struct KeyBag {
    pub salt: Vec<u8>,
    pub iterations: u32,
    pub dp_salt: Vec<u8>,
    pub dp_iterations: u32,
    pub class_keys: Vec<ClassKey>,
}

/// One per-class entry from the key bag.
#[derive(Debug, Default)]
pub struct ClassKey {
    pub class: u32,
    pub wrap: u32,
    pub wrapped_key: Vec<u8>,
}

/// Class keys unwrapped with the passphrase-derived key-encryption key,
/// indexed by protection class.
pub type ClassKeys = BTreeMap<u32, [u8; 32]>;

/// WRAP flag bit marking a key as wrapped with the passphrase-derived key.
/// Bit 0x1 means wrapped with the device UID, which is unavailable off the
/// device, so those entries are skipped.
const WRAP_PASSPHRASE: u32 = 2;

impl KeyBag {
    pub fn parse(data: &[u8]) -> Result<KeyBag> {
        let mut reader = std::io::Cursor::new(data);
        let mut bag = KeyBag::default();
        let mut current: Option<ClassKey> = None;
        let mut seen_bag_uuid = false;

        loop {
            let mut tag = [0u8; 4];
            match reader.read_exact(&mut tag) {
                Ok(()) => {}
                Err(ref err) if err.kind() == std::io::ErrorKind::UnexpectedEof => break,
                Err(err) => return Err(err.into()),
            }
            let length = reader.read_u32::<BigEndian>()?;
            let mut value = vec![0u8; length as usize];
            reader.read_exact(&mut value)?;

            match &tag {
                // The first UUID names the bag itself; each later one opens
                // a class-key block.
                b"UUID" => {
                    if seen_bag_uuid {
                        if let Some(entry) = current.take() {
                            bag.class_keys.push(entry);
                        }
                        current = Some(ClassKey::default());
                    } else {
                        seen_bag_uuid = true;
                    }
                }
                b"SALT" => bag.salt = value,
                b"ITER" => bag.iterations = read_be_u32(&value)?,
                b"DPSL" => bag.dp_salt = value,
                b"DPIC" => bag.dp_iterations = read_be_u32(&value)?,
                b"CLAS" => {
                    if let Some(entry) = current.as_mut() {
                        entry.class = read_be_u32(&value)?;
                    }
                }
                b"WRAP" => {
                    // The global WRAP record arrives before any class block
                    // and is irrelevant here.
                    if let Some(entry) = current.as_mut() {
                        entry.wrap = read_be_u32(&value)?;
                    }
                }
                b"WPKY" => {
                    if let Some(entry) = current.as_mut() {
                        entry.wrapped_key = value;
                    }
                }
                _ => {} // VERS, TYPE, HMCK, KTYP, PBKY, DPWT
            }
        }
        if let Some(entry) = current.take() {
            bag.class_keys.push(entry);
        }

        if bag.salt.is_empty() || bag.iterations == 0 {
            return Err(Error::InvalidFormat(
                "key bag is missing SALT/ITER".to_string(),
            ));
        }
        Ok(bag)
    }

    /// Derive the key-encryption key from the passphrase and unwrap every
    /// passphrase-wrapped class key. An unwrap integrity failure means the
    /// passphrase is wrong.
    pub fn unlock(&self, passphrase: &str) -> Result<ClassKeys> {
        let mut kek = [0u8; 32];
        if self.dp_salt.is_empty() {
            // Pre-10.2 bags derive straight from the passphrase.
            derive(
                ring::pbkdf2::PBKDF2_HMAC_SHA1,
                self.iterations,
                &self.salt,
                passphrase.as_bytes(),
                &mut kek,
            )?;
        } else {
            let mut round1 = [0u8; 32];
            derive(
                ring::pbkdf2::PBKDF2_HMAC_SHA256,
                self.dp_iterations,
                &self.dp_salt,
                passphrase.as_bytes(),
                &mut round1,
            )?;
            derive(
                ring::pbkdf2::PBKDF2_HMAC_SHA1,
                self.iterations,
                &self.salt,
                &round1,
                &mut kek,
            )?;
        }

        let mut keys = ClassKeys::new();
        for entry in &self.class_keys {
            if entry.wrap & WRAP_PASSPHRASE == 0 {
                continue;
            }
            keys.insert(entry.class, unwrap_key(&kek, &entry.wrapped_key)?);
        }
        Ok(keys)
    }
}

/// AES-unwrap a 40-byte wrapped key with a 32-byte key-encryption key.
pub fn unwrap_key(kek: &[u8; 32], wrapped: &[u8]) -> Result<[u8; 32]> {
    if wrapped.len() != 40 {
        return Err(Error::InvalidFormat(format!(
            "wrapped key is {} bytes, expected 40",
            wrapped.len()
        )));
    }
    let kek = aes_kw::KekAes256::from(*kek);
    let mut key = [0u8; 32];
    kek.unwrap(wrapped, &mut key)?;
    Ok(key)
}

fn read_be_u32(value: &[u8]) -> Result<u32> {
    if value.len() != 4 {
        return Err(Error::InvalidFormat(format!(
            "expected a 4-byte integer record, got {} bytes",
            value.len()
        )));
    }
    Ok(u32::from_be_bytes([value[0], value[1], value[2], value[3]]))
}

fn derive(
    algorithm: ring::pbkdf2::Algorithm,
    iterations: u32,
    salt: &[u8],
    secret: &[u8],
    out: &mut [u8],
) -> Result<()> {
    let iterations = std::num::NonZeroU32::new(iterations).ok_or_else(|| {
        Error::InvalidFormat("key bag iteration count is zero".to_string())
    })?;
    ring::pbkdf2::derive(algorithm, iterations, salt, secret, out);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push_record(bag: &mut Vec<u8>, tag: &[u8; 4], value: &[u8]) {
        bag.extend_from_slice(tag);
        bag.extend_from_slice(&(value.len() as u32).to_be_bytes());
        bag.extend_from_slice(value);
    }

    fn sample_bag() -> Vec<u8> {
        let mut bag = Vec::new();
        push_record(&mut bag, b"VERS", &3u32.to_be_bytes());
        push_record(&mut bag, b"TYPE", &1u32.to_be_bytes());
        push_record(&mut bag, b"UUID", &[0xAA; 16]);
        push_record(&mut bag, b"WRAP", &1u32.to_be_bytes());
        push_record(&mut bag, b"SALT", &[0x01; 20]);
        push_record(&mut bag, b"ITER", &10u32.to_be_bytes());
        push_record(&mut bag, b"DPIC", &10u32.to_be_bytes());
        push_record(&mut bag, b"DPSL", &[0x02; 20]);
        // UID-wrapped class first: its WPKY is deliberately short, so any
        // attempt to unwrap it would surface as InvalidFormat.
        push_record(&mut bag, b"UUID", &[0xCC; 16]);
        push_record(&mut bag, b"CLAS", &5u32.to_be_bytes());
        push_record(&mut bag, b"WRAP", &1u32.to_be_bytes());
        push_record(&mut bag, b"WPKY", &[0x00; 8]);
        push_record(&mut bag, b"UUID", &[0xBB; 16]);
        push_record(&mut bag, b"CLAS", &3u32.to_be_bytes());
        push_record(&mut bag, b"WRAP", &2u32.to_be_bytes());
        push_record(&mut bag, b"WPKY", &[0x00; 40]);
        bag
    }

    #[test]
    fn parses_globals_and_class_blocks() {
        let bag = KeyBag::parse(&sample_bag()).unwrap();
        assert_eq!(bag.salt, vec![0x01; 20]);
        assert_eq!(bag.iterations, 10);
        assert_eq!(bag.dp_salt, vec![0x02; 20]);
        assert_eq!(bag.dp_iterations, 10);
        assert_eq!(bag.class_keys.len(), 2);
        assert_eq!(bag.class_keys[0].class, 5);
        assert_eq!(bag.class_keys[0].wrap, 1);
        assert_eq!(bag.class_keys[1].class, 3);
        assert_eq!(bag.class_keys[1].wrap, 2);
    }

    #[test]
    fn unlock_skips_device_wrapped_classes() {
        // Class 5 is UID-wrapped only; unlocking must not attempt it, and a
        // garbage WPKY on class 3 must read as a wrong passphrase.
        let bag = KeyBag::parse(&sample_bag()).unwrap();
        match bag.unlock("passphrase") {
            Err(Error::WrongPassword) => {}
            other => panic!("expected WrongPassword, got {:?}", other),
        }
    }

    #[test]
    fn rejects_bag_without_salt() {
        let mut bag = Vec::new();
        push_record(&mut bag, b"UUID", &[0xAA; 16]);
        push_record(&mut bag, b"ITER", &10u32.to_be_bytes());
        match KeyBag::parse(&bag) {
            Err(Error::InvalidFormat(_)) => {}
            other => panic!("expected InvalidFormat, got {:?}", other),
        }
    }
}
