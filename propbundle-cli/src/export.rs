use propbundle::export::write_csv;
use propbundle_cli::Family;
use std::fs::File;
use std::io::{self, BufWriter};

/// Export the family as CSV to `output`, or to stdout.
pub fn run_export_command(family: &Family, output: Option<&str>) -> Result<(), String> {
    let group = family.session.group();
    match output {
        Some(path) => {
            let file = File::create(path).map_err(|e| format!("Cannot create {}: {}", path, e))?;
            write_csv(group, BufWriter::new(file))
                .map_err(|e| format!("Error writing {}: {}", path, e))?;
            eprintln!("Exported {} key(s) to {}", group.key_count(), path);
        }
        None => {
            write_csv(group, io::stdout().lock()).map_err(|e| format!("Error writing CSV: {}", e))?;
        }
    }
    Ok(())
}
