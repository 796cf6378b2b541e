use std::path::Path;

use mobilesync::session::Decryptor;

use crate::error::{Error, Result};

/// Password attempts permitted before giving up on an encrypted backup.
pub const MAX_ATTEMPTS: u32 = 3;

/// Prompt-and-open loop over the decryption engine.
///
/// An empty password is rejected locally and never counts against the
/// attempt budget; a wrong password consumes one attempt; any other open
/// failure aborts on the spot. A successful open stops the loop with
/// whatever budget remains.
pub fn open_with_retries<D, P>(
    decryptor: &D,
    backup_dir: &Path,
    mut read_password: P,
) -> Result<D::Session>
where
    D: Decryptor,
    P: FnMut() -> Result<String>,
{
    let mut remaining = MAX_ATTEMPTS;
    while remaining > 0 {
        let password = read_password()?;
        if password.is_empty() {
            println!("Password cannot be empty.");
            continue;
        }

        match decryptor.open(backup_dir, &password) {
            Ok(session) => {
                println!("Password accepted. Extracting files...");
                return Ok(session);
            }
            Err(mobilesync::error::Error::WrongPassword) => {
                println!("Incorrect password.");
                remaining -= 1;
                if remaining > 0 {
                    println!("Try again ({} attempt(s) remaining)", remaining);
                }
            }
            Err(err) => return Err(err.into()),
        }
    }
    Err(Error::MaxAttemptsReached)
}
