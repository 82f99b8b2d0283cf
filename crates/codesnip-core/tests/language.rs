use codesnip_core::models::language::Language;

#[test]
fn labels_resolve_case_insensitively() {
    assert_eq!(Language::from_label("C++"), Language::Cpp);
    assert_eq!(Language::from_label("python"), Language::Python);
    assert_eq!(Language::from_label(" SQL "), Language::Sql);
}

#[test]
fn unknown_labels_are_kept_verbatim() {
    let lang = Language::from_label("Haskell");
    assert_eq!(lang, Language::Unknown("Haskell".to_string()));
    assert!(!lang.is_known());
    assert_eq!(lang.label(), "Haskell");
    assert_eq!(lang.slug(), "plaintext");
}

#[test]
fn serializes_as_its_label() {
    assert_eq!(serde_json::to_value(Language::CSharp).unwrap(), "C#");
    let back: Language = serde_json::from_value(serde_json::json!("Elixir")).unwrap();
    assert_eq!(serde_json::to_value(back).unwrap(), "Elixir");
}

#[test]
fn fixed_set_is_in_editor_order() {
    assert_eq!(Language::ALL.len(), 16);
    assert_eq!(Language::ALL[0], Language::default());
    assert_eq!(Language::ALL[15].label(), "Bash");
    assert!(Language::ALL.iter().all(Language::is_known));
}

#[test]
fn stored_labels_round_trip_exactly() {
    for label in ["python", " Go", "Elixir"] {
        let lang: Language = serde_json::from_value(serde_json::json!(label)).unwrap();
        assert!(!lang.is_known(), "{label}");
        assert_eq!(serde_json::to_value(lang).unwrap(), label);
    }
    let lang: Language = serde_json::from_value(serde_json::json!("C#")).unwrap();
    assert_eq!(lang, Language::CSharp);
}
