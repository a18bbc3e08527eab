use propbundle::BundleSource;
use propbundle_cli::Family;
use tracing::debug;

/// Regenerate every locale file of every family with the configured layout.
///
/// With `check`, nothing is written; the command fails if a file would change.
pub fn run_fmt_command(families: &mut [Family], check: bool) -> Result<(), String> {
    let mut changed = Vec::new();
    for family in families.iter_mut() {
        let locales: Vec<_> = family.session.group().locales().cloned().collect();
        for locale in locales {
            let Some(formatted) = family.session.generate(&locale) else {
                continue;
            };
            let current = family
                .source
                .read(&locale)
                .map_err(|e| format!("Error reading {}: {}", family.name(), e))?;
            if current.as_deref() == Some(formatted.as_str()) {
                debug!(path = %family.source.path(&locale).display(), "already formatted");
                continue;
            }
            let path = family.source.path(&locale);
            if !check {
                family
                    .source
                    .write(&locale, &formatted)
                    .map_err(|e| format!("Error writing {}: {}", path.display(), e))?;
            }
            changed.push(path.display().to_string());
        }
    }

    for path in &changed {
        if check {
            println!("would reformat {}", path);
        } else {
            println!("reformatted {}", path);
        }
    }
    if check && !changed.is_empty() {
        return Err(format!("{} file(s) need formatting", changed.len()));
    }
    if changed.is_empty() {
        println!("All files already formatted");
    }
    Ok(())
}
