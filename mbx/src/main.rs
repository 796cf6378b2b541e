extern crate mbx;

use mbx::debug_eprintln;
use mbx::error::{Error, Result};
use mbx::{driver, extract, select, utils};

use mobilesync::backup;
use mobilesync::session::{BackupOpener, Decryptor};

fn main() {
    ctrlc::set_handler(|| {
        println!("\nCancelled.");
        std::process::exit(0);
    })
    .expect("failed to install the interrupt handler");

    if let Err(err) = run() {
        println!("{}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let matches = mbx::cli::parse_flags();
    utils::initialize_debug_from_args(&matches);

    println!("============================================================");
    println!("MobileSync Backup Extraction Tool");
    println!("============================================================");

    let root = utils::backup_root()?;
    debug_eprintln!("backup root: {:?}", root);
    let backups = backup::list_backups(&root)?;

    select::print_menu(&backups);
    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let index = select::read_selection(&mut input, backups.len())?;
    let selected = &backups[index];
    debug_eprintln!("selected backup {} at {:?}", selected.name, selected.path);

    let output_dir = utils::output_dir()?;
    println!("\nOutput folder: {}", output_dir.display());

    if !selected.is_encrypted {
        println!("\nThis backup is NOT encrypted; there is nothing to decrypt.");
        println!("Enable encrypted backups in Finder/iTunes, make a new backup, and run this again.");
        return Ok(());
    }

    println!("\nBackup is encrypted.");
    let opener = BackupOpener;
    let mut session = match matches.value_of("password") {
        Some(password) => {
            if password.is_empty() {
                return Err(Error::InputError("password cannot be empty".to_string()));
            }
            let session = opener.open(&selected.path, password)?;
            println!("Password accepted. Extracting files...");
            session
        }
        None => driver::open_with_retries(&opener, &selected.path, || {
            Ok(rpassword::prompt_password("Enter backup password: ")?)
        })?,
    };

    let count = extract::extract_all(&mut session, &output_dir);
    if count > 0 {
        println!(
            "\nDone! {} file(s) extracted to {}",
            count,
            output_dir.display()
        );
    } else {
        println!("\nNo files were extracted (the databases may be missing in this backup).");
    }
    Ok(())
}
