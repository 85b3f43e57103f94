use clipstash::classify::{has_text_extension, TextClassifier};
use std::fs;
use std::path::Path;
use tempfile::tempdir;
use tracing::debug;

#[test]
fn test_registered_extension_is_text_regardless_of_size() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("big.py");
    fs::write(&path, vec![b'x'; 64]).unwrap();

    // Threshold far below the file size: the extension still wins.
    let classifier = TextClassifier::new(8);
    assert!(classifier.classify(&path), "Registered extension should be text");

    debug!("Test passed for registered extension precedence.");
}

#[test]
fn test_extension_match_is_case_insensitive() {
    assert!(has_text_extension(Path::new("/tmp/README.MD")));
    assert!(has_text_extension(Path::new("/tmp/Main.Rs")));
    assert!(!has_text_extension(Path::new("/tmp/image.PNG")));
    assert!(!has_text_extension(Path::new("/tmp/Makefile")));
}

#[test]
fn test_bare_dotfile_has_no_extension() {
    assert!(!has_text_extension(Path::new("/tmp/.env")));
    assert!(has_text_extension(Path::new("/tmp/local.env")));
}

#[test]
fn test_unknown_extension_uses_size_threshold() {
    let dir = tempdir().unwrap();
    let small = dir.path().join("small.bin");
    let exact = dir.path().join("exact.bin");
    let large = dir.path().join("large.bin");
    fs::write(&small, [0u8]).unwrap();
    fs::write(&exact, vec![0u8; 16]).unwrap();
    fs::write(&large, vec![0u8; 17]).unwrap();

    let classifier = TextClassifier::new(16);
    assert!(classifier.classify(&small), "1 byte file should be text");
    assert!(classifier.classify(&exact), "File at threshold should be text");
    assert!(!classifier.classify(&large), "File above threshold should be skipped");
}

#[test]
fn test_missing_file_is_not_text() {
    let dir = tempdir().unwrap();
    let classifier = TextClassifier::default();
    assert!(!classifier.classify(&dir.path().join("gone.bin")));
    // A registered extension never needs the size lookup.
    assert!(classifier.classify(&dir.path().join("gone.md")));
}

#[test]
fn test_classification_is_deterministic() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("data.dat");
    fs::write(&path, b"hello").unwrap();

    let classifier = TextClassifier::default();
    let first = classifier.classify(&path);
    for _ in 0..5 {
        assert_eq!(classifier.classify(&path), first);
    }
    assert_eq!(classifier.max_text_bytes(), 5 * 1024 * 1024);
}
