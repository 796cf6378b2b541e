//! Best-effort probes of the two small property lists every backup
//! directory carries. A backup written by a healthy device has both, but a
//! half-copied or damaged one may not; every failure here collapses to a
//! default so enumeration never aborts on a bad candidate.

use std::path::Path;

use plist::Value;

pub const UNKNOWN_DEVICE: &str = "Unknown Device";

/// Whether `Manifest.plist` marks the backup as encrypted. A missing file,
/// malformed plist, missing key or wrongly-typed value all read as
/// unencrypted.
pub fn read_is_encrypted(backup_dir: &Path) -> bool {
    read_key(&backup_dir.join("Manifest.plist"), "IsEncrypted")
        .and_then(|value| value.as_boolean())
        .unwrap_or(false)
}

/// The device name recorded in `Info.plist`, or [`UNKNOWN_DEVICE`].
pub fn read_device_name(backup_dir: &Path) -> String {
    read_key(&backup_dir.join("Info.plist"), "Device Name")
        .and_then(|value| value.as_string().map(str::to_string))
        .unwrap_or_else(|| UNKNOWN_DEVICE.to_string())
}

fn read_key(path: &Path, key: &str) -> Option<Value> {
    let value = Value::from_file(path).ok()?;
    value.as_dictionary()?.get(key).cloned()
}
