use std::path::Path;

use mobilesync::session::Session;

/// A database to pull out of the decrypted container. The friendly name
/// doubles as the output filename.
pub struct ExtractionTarget {
    pub friendly_name: &'static str,
    pub relative_path: &'static str,
}

/// The two artifacts this tool exists to recover.
pub const TARGETS: [ExtractionTarget; 2] = [
    ExtractionTarget {
        friendly_name: "sms.db",
        relative_path: "Library/SMS/sms.db",
    },
    ExtractionTarget {
        friendly_name: "CallHistory.storedata",
        relative_path: "Library/CallHistoryDB/CallHistory.storedata",
    },
];

/// Extract every target independently into `output_dir`. A target missing
/// from the container (a backup without call history, say) is reported and
/// skipped, never fatal. Returns the number of files extracted.
pub fn extract_all<S: Session>(session: &mut S, output_dir: &Path) -> usize {
    let mut extracted = 0;
    for target in &TARGETS {
        println!("\nExtracting {}...", target.friendly_name);
        let output_path = output_dir.join(target.friendly_name);
        match session.extract(target.relative_path, &output_path) {
            Ok(()) => {
                println!("  Saved to: {}", output_path.display());
                extracted += 1;
            }
            Err(err) => println!("  Skipped (not found or error): {}", err),
        }
    }
    extracted
}
