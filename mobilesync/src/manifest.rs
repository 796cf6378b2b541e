use plist::Value;

use crate::error::{Error, Result};

/// FileRecord is the per-file metadata stored in the `file` column of the
/// manifest database, an NSKeyedArchiver-encoded plist.
///
/// The archive is a dictionary with a flat `$objects` array; inter-object
/// references are UID indexes into that array. `$top.root` points at the
/// file object, whose `EncryptionKey` field references an NSMutableData
/// whose `NS.data` holds four little-endian protection-class bytes
/// followed by the AES-wrapped per-file key. Unencrypted files (and
/// directory records) carry no `EncryptionKey`.
#[derive(Debug)]
pub struct FileRecord {
    pub size: u64,
    pub protection_class: u32,
    pub wrapped_key: Option<Vec<u8>>,
}

impl FileRecord {
    pub fn from_blob(blob: &[u8]) -> Result<FileRecord> {
        let archive = Value::from_reader(std::io::Cursor::new(blob))?;
        let root = archive
            .as_dictionary()
            .ok_or_else(|| invalid("file record is not an archive"))?;
        let objects = root
            .get("$objects")
            .and_then(Value::as_array)
            .ok_or_else(|| invalid("file record has no $objects"))?;
        let top = root
            .get("$top")
            .and_then(Value::as_dictionary)
            .and_then(|top| top.get("root"))
            .ok_or_else(|| invalid("file record has no root object"))?;
        let file = deref(objects, top)?
            .as_dictionary()
            .ok_or_else(|| invalid("root object is not a file"))?;

        let size = file
            .get("Size")
            .and_then(Value::as_unsigned_integer)
            .ok_or_else(|| invalid("file record has no Size"))?;
        let protection_class = file
            .get("ProtectionClass")
            .and_then(Value::as_unsigned_integer)
            .unwrap_or(0) as u32;

        let wrapped_key = match file.get("EncryptionKey") {
            Some(reference) => {
                let data = deref(objects, reference)?
                    .as_dictionary()
                    .and_then(|key| key.get("NS.data"))
                    .and_then(Value::as_data)
                    .ok_or_else(|| invalid("EncryptionKey carries no NS.data"))?;
                if data.len() <= 4 {
                    return Err(invalid("EncryptionKey data is too short"));
                }
                Some(data[4..].to_vec())
            }
            None => None,
        };

        Ok(FileRecord {
            size,
            protection_class,
            wrapped_key,
        })
    }
}

fn deref<'a>(objects: &'a [Value], reference: &Value) -> Result<&'a Value> {
    let index = match reference {
        Value::Uid(uid) => uid.get() as usize,
        _ => return Err(invalid("expected a UID reference")),
    };
    objects
        .get(index)
        .ok_or_else(|| invalid("dangling UID reference"))
}

fn invalid(msg: &str) -> Error {
    Error::InvalidFormat(msg.to_string())
}
