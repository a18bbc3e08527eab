use propbundle::analysis::missing_value_status;
use propbundle::{BundleSession, KeyTreeItem, Locale};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const TRUNCATE_WIDTH: usize = 40;

/// Print every key with its value in each locale, one column per locale.
pub fn print_view(session: &BundleSession, locale: Option<&Locale>, full: bool) -> Result<(), String> {
    let group = session.group();
    let locales: Vec<&Locale> = match locale {
        Some(locale) => {
            let found = group
                .locales()
                .find(|candidate| *candidate == locale)
                .ok_or_else(|| format!("Locale '{}' not found", locale.display_name()))?;
            vec![found]
        }
        None => group.locales().collect(),
    };

    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut header = vec!["KEY".to_string()];
    header.extend(locales.iter().map(|locale| locale.display_name()));
    rows.push(header);

    for key in group.keys() {
        let mut row = vec![key.to_string()];
        for locale in &locales {
            let cell = match group.bundle_entry(locale, key) {
                Some(entry) if entry.commented => format!("# {}", entry.value),
                Some(entry) => entry.value.clone(),
                None => "-".to_string(),
            };
            let cell = cell.replace('\n', "\\n");
            row.push(if full { cell } else { truncate(&cell, TRUNCATE_WIDTH) });
        }
        rows.push(row);
    }

    let columns = rows[0].len();
    let widths: Vec<usize> = (0..columns)
        .map(|column| rows.iter().map(|row| row[column].width()).max().unwrap_or(0))
        .collect();

    for row in &rows {
        let mut line = String::new();
        for (column, cell) in row.iter().enumerate() {
            if column + 1 == columns {
                line.push_str(cell);
            } else {
                line.push_str(cell);
                line.push_str(&" ".repeat(widths[column] - cell.width() + 2));
            }
        }
        println!("{}", line.trim_end());
    }
    println!("\n{} key(s), {} locale(s)", group.key_count(), locales.len());
    Ok(())
}

/// Shorten `text` to at most `width` terminal columns, ending with `…`.
pub fn truncate(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

/// Print the key tree, one item per line, indented by depth.
///
/// Keys missing a value in some locale are marked with `*`; group nodes with
/// such keys below them are marked with `+`.
pub fn print_tree(session: &BundleSession) {
    let tree = session.tree();
    for root in tree.root_items() {
        print_item(session, root, 0);
    }
}

fn print_item(session: &BundleSession, item: &KeyTreeItem, depth: usize) {
    let tree = session.tree();
    if !item.is_visible() {
        return;
    }
    let status = missing_value_status(tree, session.group(), item);
    let marker = if status.missing {
        " *"
    } else if status.is_missing_children_value_only() {
        " +"
    } else {
        ""
    };
    let label = if session.group().is_key(item.id()) {
        item.name().to_string()
    } else {
        format!("{}/", item.name())
    };
    println!("{}{}{}", "  ".repeat(depth), label, marker);
    for child in tree.children(item.id()) {
        print_item(session, child, depth + 1);
    }
}
