use std::fs;
use stroop_store::{JsonFileStore, ResultsMap, SessionStore, StoreError};

fn sample() -> ResultsMap {
    let mut data = ResultsMap::new();
    data.insert(
        "StroopResults_1".to_string(),
        vec![
            "2022.04.01-10::15::00".to_string(),
            "Quads&Rot&rot&rot&1&0.512".to_string(),
        ],
    );
    data
}

#[test]
fn saved_results_load_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("anna.stroop");
    let store = JsonFileStore::new();

    store.save(&path, &sample()).unwrap();
    assert_eq!(store.load(&path).unwrap(), sample());
}

#[test]
fn empty_file_loads_as_empty_map() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("new.stroop");
    fs::write(&path, "").unwrap();

    assert!(JsonFileStore::new().load(&path).unwrap().is_empty());
}

#[test]
fn garbage_is_a_decode_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.stroop");
    fs::write(&path, "[General]\nkey=value\n").unwrap();

    let err = JsonFileStore::new().load(&path).unwrap_err();
    assert!(matches!(err, StoreError::Decode { .. }));
}

#[test]
fn missing_file_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = JsonFileStore::new()
        .load(&dir.path().join("nobody.stroop"))
        .unwrap_err();
    assert!(matches!(err, StoreError::Read { .. }));
}

#[test]
fn rows_are_written_as_csv() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("anna.csv");
    let rows = vec![
        vec!["Versuchsperson".to_string(), "Text".to_string()],
        vec!["anna".to_string(), "Gr\u{fc}n, hell".to_string()],
    ];

    JsonFileStore::new().write_rows(&path, &rows).unwrap();
    let text = fs::read_to_string(&path).unwrap();
    assert_eq!(text, "Versuchsperson,Text\nanna,\"Gr\u{fc}n, hell\"\n");
}

#[test]
fn writing_into_missing_directory_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("anna.csv");
    let err = JsonFileStore::new().write_rows(&path, &[]).unwrap_err();
    assert!(matches!(err, StoreError::Write { .. }));
}
