use std::io::{BufRead, Write};

use chrono::{DateTime, Local};

use mobilesync::backup::Backup;

use crate::error::{Error, Result};

/// Print the numbered backup menu, newest first.
pub fn print_menu(backups: &[Backup]) {
    println!("\nFound {} backup(s):\n----------------", backups.len());
    for (index, backup) in backups.iter().enumerate() {
        let date = DateTime::<Local>::from(backup.last_modified).format("%Y-%m-%d %I:%M %p");
        let status = if backup.is_encrypted {
            "encrypted"
        } else {
            "not encrypted"
        };
        println!(
            "  {}. [{}] {} ({})",
            index + 1,
            date,
            backup.device_name,
            status
        );
    }
}

/// Prompt until the user picks a backup: empty input selects the most
/// recent, otherwise a 1-based index into the list. Re-prompts on invalid
/// input without bound; end of input is an error rather than a spin.
pub fn read_selection<R: BufRead>(input: &mut R, count: usize) -> Result<usize> {
    loop {
        print!("\nSelect backup (1-{}) [Default: 1]: ", count);
        std::io::stdout().flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Err(Error::InputError("unexpected end of input".to_string()));
        }
        let line = line.trim();
        if line.is_empty() {
            return Ok(0);
        }
        match line.parse::<usize>() {
            Ok(choice) if choice >= 1 && choice <= count => return Ok(choice - 1),
            _ => println!("Invalid selection."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn empty_input_selects_most_recent() {
        assert_eq!(read_selection(&mut Cursor::new(b"\n"), 3).unwrap(), 0);
    }

    #[test]
    fn one_based_index_converts_to_zero_based() {
        assert_eq!(read_selection(&mut Cursor::new(b"1\n"), 3).unwrap(), 0);
        assert_eq!(read_selection(&mut Cursor::new(b"3\n"), 3).unwrap(), 2);
    }

    #[test]
    fn out_of_range_and_garbage_reprompt() {
        // 0 and count+1 are both rejected before a valid pick lands.
        let mut input = Cursor::new(&b"0\n4\nnope\n2\n"[..]);
        assert_eq!(read_selection(&mut input, 3).unwrap(), 1);
    }

    #[test]
    fn end_of_input_is_an_error() {
        match read_selection(&mut Cursor::new(b""), 3) {
            Err(Error::InputError(_)) => {}
            other => panic!("expected InputError, got {:?}", other),
        }
    }
}
