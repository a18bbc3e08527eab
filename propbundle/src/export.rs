//! Tabular export of a bundle group.

use std::io::Write;

use crate::{error::Error, group::BundleGroup, locale::Locale};

/// Writes one CSV row per key with one column per locale.
///
/// The header row is `key` followed by the locale display names. Absent
/// entries are written as empty cells; commented entries keep their value.
pub fn write_csv<W: Write>(group: &BundleGroup, writer: W) -> Result<(), Error> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    let mut header = vec!["key".to_string()];
    header.extend(group.locales().map(Locale::display_name));
    wtr.write_record(&header)?;

    for key in group.keys() {
        let mut record = vec![key];
        for locale in group.locales() {
            let value = group
                .bundle_entry(locale, key)
                .map(|entry| entry.value.as_str())
                .unwrap_or_default();
            record.push(value);
        }
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{bundle::Bundle, types::BundleEntry};

    #[test]
    fn test_write_csv() {
        let mut group = BundleGroup::new();
        let mut root = Bundle::new();
        root.add_entry(BundleEntry::new("greeting", "Hello, world"));
        root.add_entry(BundleEntry::new("bye", "Bye"));
        group.add_bundle(Locale::root(), root);
        let mut fr = Bundle::new();
        fr.add_entry(BundleEntry::new("greeting", "Bonjour"));
        group.add_bundle(Locale::language("fr"), fr);

        let mut out = Vec::new();
        write_csv(&group, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "key,default,fr\nbye,Bye,\ngreeting,\"Hello, world\",Bonjour\n"
        );
    }
}
