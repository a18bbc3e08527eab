use propbundle::{KeyOperationReport, Locale};
use propbundle_cli::Family;
use propbundle_cli::validation::{parse_locale, validate_key};
use tracing::info;

/// A single structural change to a bundle family.
#[derive(Debug, Clone)]
pub enum EditAction {
    Add { key: String },
    Set { locale: String, key: String, value: String },
    Rename { from: String, to: String },
    Copy { from: String, to: String },
    Remove { key: String },
    Comment { key: String },
    Uncomment { key: String },
}

/// Apply `action` to `family` and save every locale, unless `dry_run` is set.
pub fn run_edit_command(family: &mut Family, action: EditAction, dry_run: bool) -> Result<(), String> {
    let session = &mut family.session;
    let message = match &action {
        EditAction::Add { key } => {
            validate_key(key)?;
            if session.group().is_key(key.trim()) {
                return Err(format!("Key '{}' already exists", key));
            }
            let report = session.add_key(key).map_err(|e| e.to_string())?;
            describe(&format!("Added '{}'", key), &report)
        }
        EditAction::Set { locale, key, value } => {
            validate_key(key)?;
            let locale = parse_locale(locale)?;
            if session.add_locale(locale.clone()) {
                info!(locale = %locale.display_name(), "created locale");
            }
            let changed = session
                .set_value(&locale, key, value)
                .map_err(|e| e.to_string())?;
            if !changed {
                println!("'{}' already has this value in {}", key, locale.display_name());
                return Ok(());
            }
            format!("Set '{}' in {}", key, locale.display_name())
        }
        EditAction::Rename { from, to } => {
            validate_key(to)?;
            let report = session.rename_key(from, to).map_err(|e| e.to_string())?;
            require_key(from, &report)?;
            describe(&format!("Renamed '{}' to '{}'", from, to), &report)
        }
        EditAction::Copy { from, to } => {
            validate_key(to)?;
            let report = session.copy_key(from, to).map_err(|e| e.to_string())?;
            require_key(from, &report)?;
            describe(&format!("Copied '{}' to '{}'", from, to), &report)
        }
        EditAction::Remove { key } => {
            let report = session.remove_key(key);
            require_key(key, &report)?;
            describe(&format!("Removed '{}'", key), &report)
        }
        EditAction::Comment { key } => {
            let report = session.comment_key(key);
            require_key(key, &report)?;
            describe(&format!("Commented '{}'", key), &report)
        }
        EditAction::Uncomment { key } => {
            let report = session.uncomment_key(key);
            require_key(key, &report)?;
            describe(&format!("Uncommented '{}'", key), &report)
        }
    };

    if dry_run {
        println!("{} (dry run, nothing written)", message);
        return Ok(());
    }
    family.save()?;
    println!("{}", message);
    Ok(())
}

fn require_key(key: &str, report: &KeyOperationReport) -> Result<(), String> {
    if report.is_noop() {
        return Err(format!("Key '{}' not found or already in the requested state", key));
    }
    Ok(())
}

fn describe(action: &str, report: &KeyOperationReport) -> String {
    let mut message = format!("{} in {} locale(s)", action, report.applied.len());
    if !report.skipped.is_empty() {
        let skipped: Vec<String> = report.skipped.iter().map(Locale::display_name).collect();
        message.push_str(&format!("; skipped: {}", skipped.join(", ")));
    }
    message
}
