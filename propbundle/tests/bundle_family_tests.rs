use indoc::indoc;
use propbundle::analysis::CommentedStatus;
use propbundle::export::write_csv;
use propbundle::{
    BundleSession, BundleSource, BundleStats, DeltaKind, DirectorySource, EventQueue, GroupSubject,
    KeyTreeItem, Locale, Preferences, SessionRegistry, analyze,
};
use std::fs;
use std::path::Path;

fn write_family(dir: &Path) {
    fs::write(
        dir.join("messages.properties"),
        indoc! {"
            # Application messages

            app.title = Bundle Editor
            app.quit = Quit
            dialog.ok = OK
            dialog.cancel = Cancel
            menu.close = Quit
        "},
    )
    .unwrap();
    fs::write(
        dir.join("messages_fr.properties"),
        indoc! {"
            app.title = \\u00c9diteur
            app.quit =
            dialog.ok = OK
            ##dialog.cancel = Annuler
        "},
    )
    .unwrap();
    // Latin-1 bytes, as older tools write them.
    fs::write(
        dir.join("messages_de.properties"),
        b"app.title = Bundle-Editor\napp.quit = Schlie\xdfen\n",
    )
    .unwrap();
}

fn load(dir: &Path) -> BundleSession {
    let source = DirectorySource::new(dir, "messages");
    BundleSession::load(&source, Preferences::default()).unwrap()
}

#[test]
fn loads_every_locale_of_a_directory() {
    let tmp = tempfile::tempdir().unwrap();
    write_family(tmp.path());
    let session = load(tmp.path());
    let group = session.group();

    let locales: Vec<String> = group.locales().map(Locale::display_name).collect();
    assert_eq!(locales, vec!["default", "de", "fr"]);
    assert_eq!(group.key_count(), 5);
    assert_eq!(
        group.bundle_entry(&Locale::language("fr"), "app.title").unwrap().value,
        "Éditeur"
    );
    assert_eq!(
        group.bundle_entry(&Locale::language("de"), "app.quit").unwrap().value,
        "Schließen"
    );
    assert!(group.bundle_entry(&Locale::language("fr"), "dialog.cancel").unwrap().commented);
    assert_eq!(
        group.bundle(&Locale::root()).unwrap().head_comment(),
        "# Application messages"
    );

    let roots: Vec<&str> = session.tree().root_items().into_iter().map(KeyTreeItem::id).collect();
    assert_eq!(roots, vec!["app", "dialog", "menu"]);
}

#[test]
fn analysis_reports_missing_duplicate_and_commented_keys() {
    let tmp = tempfile::tempdir().unwrap();
    write_family(tmp.path());
    let session = load(tmp.path());

    let report = analyze(session.group(), session.preferences());
    assert!(report.has_problems());

    let quit = report.keys.iter().find(|key| key.key == "app.quit").unwrap();
    assert_eq!(quit.missing, vec!["fr"]);
    assert_eq!(quit.duplicates[0].locale, "default");
    assert_eq!(quit.duplicates[0].keys, vec!["menu.close"]);

    let cancel = report.keys.iter().find(|key| key.key == "dialog.cancel").unwrap();
    assert_eq!(cancel.commented, CommentedStatus::PartlyCommented);
    assert_eq!(cancel.missing, vec!["de"]);
}

#[test]
fn stats_and_csv_export_cover_all_locales() {
    let tmp = tempfile::tempdir().unwrap();
    write_family(tmp.path());
    let session = load(tmp.path());

    let stats = BundleStats::compute(session.group());
    assert_eq!((stats.locales, stats.keys), (3, 5));
    let de = stats.per_locale.iter().find(|locale| locale.locale == "de").unwrap();
    assert_eq!((de.entries, de.missing), (2, 3));
    assert_eq!(de.completion_percent, 40.0);

    let mut out = Vec::new();
    write_csv(session.group(), &mut out).unwrap();
    let csv = String::from_utf8(out).unwrap();
    assert!(csv.starts_with("key,default,de,fr\n"));
    assert!(csv.contains("app.quit,Quit,Schließen,\n"));
}

#[test]
fn edits_are_saved_back_to_the_directory() {
    let tmp = tempfile::tempdir().unwrap();
    write_family(tmp.path());
    let mut session = load(tmp.path());
    let fr = Locale::language("fr");

    session.set_value(&fr, "app.quit", "Quitter").unwrap();
    session.rename_key("menu.close", "menu.exit").unwrap();
    session.uncomment_key("dialog.cancel");
    assert!(session.tree().item("menu.exit").is_some());
    assert!(session.tree().item("menu.close").is_none());

    let mut source = DirectorySource::new(tmp.path(), "messages");
    session.save(&mut source).unwrap();

    let saved = fs::read_to_string(tmp.path().join("messages_fr.properties")).unwrap();
    assert!(saved.starts_with("#Generated by propbundle\n"));
    assert!(saved.contains("app.quit  = Quitter\n"));
    assert!(saved.contains("dialog.cancel = Annuler\n"));
    assert!(!saved.contains("##"));

    let reloaded = load(tmp.path());
    assert!(reloaded.group().is_key("menu.exit"));
    assert_eq!(
        reloaded.group().bundle_entry(&fr, "app.title").unwrap().value,
        "Éditeur"
    );
    // Non-ASCII characters are written back as escapes.
    assert_eq!(
        source.read(&Locale::language("de")).unwrap().unwrap(),
        "#Generated by propbundle\n\napp.quit  = Schlie\\u00dfen\napp.title = Bundle-Editor\n"
    );
}

#[test]
fn reloading_a_changed_file_fires_only_the_differences() {
    let tmp = tempfile::tempdir().unwrap();
    write_family(tmp.path());
    let mut session = load(tmp.path());
    let queue = EventQueue::<GroupSubject>::new();
    session.group().add_listener(queue.clone());

    session.reload_locale(
        Locale::language("de"),
        "app.title = Bundle-Editor\napp.quit = Beenden\n",
    );
    let kinds: Vec<DeltaKind> = queue.drain().into_iter().map(|event| event.kind).collect();
    assert_eq!(kinds, vec![DeltaKind::Modify, DeltaKind::Modify]);
}

#[test]
fn move_key_between_open_sessions() {
    let tmp = tempfile::tempdir().unwrap();
    write_family(tmp.path());
    let other = tempfile::tempdir().unwrap();
    fs::write(other.path().join("labels.properties"), "label.name = Name\n").unwrap();
    fs::write(other.path().join("labels_fr.properties"), "label.name = Nom\n").unwrap();

    let mut registry = SessionRegistry::new();
    let messages = registry.open(load(tmp.path()));
    let labels = registry.open(
        BundleSession::load(
            &DirectorySource::new(other.path(), "labels"),
            Preferences::default(),
        )
        .unwrap(),
    );

    let report = registry.move_key(messages, labels, "app.title").unwrap();
    assert_eq!(report.applied, vec![Locale::root(), Locale::language("fr")]);
    assert_eq!(report.skipped, vec![Locale::language("de")]);

    let messages_group = registry.get(messages).unwrap().group();
    assert!(messages_group.bundle_entry(&Locale::root(), "app.title").is_none());
    assert!(messages_group.bundle_entry(&Locale::language("fr"), "app.title").is_none());
    assert_eq!(
        messages_group
            .bundle_entry(&Locale::language("de"), "app.title")
            .unwrap()
            .value,
        "Bundle-Editor"
    );
    let labels_session = registry.get(labels).unwrap();
    assert_eq!(
        labels_session
            .group()
            .bundle_entry(&Locale::language("fr"), "app.title")
            .unwrap()
            .value,
        "Éditeur"
    );
    assert!(labels_session.tree().item("app.title").is_some());
}
