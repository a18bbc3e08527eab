use propbundle::analysis::{CommentedStatus, LocaleMatches};
use propbundle::{AnalysisReport, analyze};
use serde::Serialize;

use propbundle_cli::Family;

#[derive(Serialize)]
struct BundleCheck<'a> {
    bundle: &'a str,
    report: &'a AnalysisReport,
}

/// Run the enabled consistency checks on every family.
///
/// Returns an error when any family has missing, duplicate, or similar values,
/// so that the command fails in CI.
pub fn run_check_command(families: &[Family], json_output: bool) -> Result<(), String> {
    let reports: Vec<(String, AnalysisReport)> = families
        .iter()
        .map(|family| {
            (
                family.name(),
                analyze(family.session.group(), family.session.preferences()),
            )
        })
        .collect();

    if json_output {
        let body: Vec<_> = reports
            .iter()
            .map(|(name, report)| BundleCheck {
                bundle: name,
                report,
            })
            .collect();
        let text = serde_json::to_string_pretty(&body)
            .map_err(|e| format!("Error serializing to JSON: {}", e))?;
        println!("{}", text);
    } else {
        for (name, report) in &reports {
            print_report(name, report);
        }
    }

    let failing = reports.iter().filter(|(_, report)| report.has_problems()).count();
    if failing > 0 {
        return Err(format!("{} bundle(s) have problems", failing));
    }
    Ok(())
}

fn print_report(name: &str, report: &AnalysisReport) {
    println!("=== {} ({}) ===", name, report.locales.join(", "));
    for key in &report.keys {
        println!("{}", key.key);
        if !key.missing.is_empty() {
            println!("  missing: {}", key.missing.join(", "));
        }
        print_matches("duplicate of", &key.duplicates);
        print_matches("similar to", &key.similar);
        match key.commented {
            CommentedStatus::Active => {}
            CommentedStatus::PartlyCommented => println!("  commented in some locales"),
            CommentedStatus::Commented => println!("  commented in all locales"),
        }
    }
    let summary = &report.summary;
    println!(
        "{} key(s): {} missing, {} duplicate, {} similar, {} commented",
        summary.keys, summary.missing, summary.duplicates, summary.similar, summary.commented
    );
}

fn print_matches(label: &str, matches: &[LocaleMatches]) {
    for found in matches {
        println!("  {} [{}]: {}", label, found.locale, found.keys.join(", "));
    }
}
