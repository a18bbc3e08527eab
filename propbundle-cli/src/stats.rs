use propbundle::{BundleSession, BundleStats};

pub fn print_stats(session: &BundleSession, json_output: bool) -> Result<(), String> {
    let stats = BundleStats::compute(session.group());

    if json_output {
        let body = serde_json::to_string_pretty(&stats)
            .map_err(|e| format!("Error serializing to JSON: {}", e))?;
        println!("{}", body);
        return Ok(());
    }

    println!("=== Stats ===");
    println!("Locales: {}", stats.locales);
    println!("Keys: {}", stats.keys);

    for locale in &stats.per_locale {
        println!("\nLocale: {}", locale.locale);
        println!("  Entries: {}", locale.entries);
        println!("  Empty: {}", locale.empty);
        println!("  Commented: {}", locale.commented);
        println!("  Missing: {}", locale.missing);
        println!("  Completion: {:.2}%", locale.completion_percent);
    }
    Ok(())
}
