//! Configuration and vocabulary loading.

mod common;

use std::fs;

use tempfile::TempDir;

use pharmalens::config::RunLocation;
use pharmalens::error::{ConfigError, VocabularyError};
use pharmalens::{OcrEngineKind, PipelineConfig, SelectionPolicy};

use common::*;

#[test]
fn test_empty_object_yields_defaults() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("config.json");
    fs::write(&path, "{}")?;

    let config = PipelineConfig::load(&path)?;

    assert_eq!(config.detection.threshold, 0.5);
    assert_eq!(config.detection.input_size, 640);
    assert_eq!(config.classification.input_size, 224);
    assert_eq!(config.classification.selection, SelectionPolicy::Recency);
    assert_eq!(config.ocr.engine, OcrEngineKind::Ocrs);
    assert_eq!(config.ocr.languages, vec!["tur", "eng"]);
    assert!(!config.ocr.enabled);
    assert_eq!(config.inference.padding, 10);
    Ok(())
}

#[test]
fn test_sections_override_defaults() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("config.json");
    fs::write(
        &path,
        r#"{
            "vocabulary": "labels.txt",
            "classification": { "selection": "ordinal" },
            "ocr": { "engine": "tesseract", "enabled": true, "languages": ["eng"] },
            "inference": { "padding": 4 }
        }"#,
    )?;

    let config = PipelineConfig::load(&path)?;

    assert_eq!(config.vocabulary, std::path::PathBuf::from("labels.txt"));
    assert_eq!(config.classification.selection, SelectionPolicy::Ordinal);
    assert_eq!(config.ocr.engine, OcrEngineKind::Tesseract);
    assert!(config.ocr.enabled);
    assert_eq!(config.ocr.languages, vec!["eng"]);
    assert_eq!(config.inference.padding, 4);
    // Untouched fields keep their defaults
    assert_eq!(config.detection.threshold, 0.5);
    Ok(())
}

#[test]
fn test_invalid_values_are_rejected() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("config.json");

    fs::write(&path, r#"{ "detection": { "threshold": 1.2 } }"#)?;
    assert!(matches!(
        PipelineConfig::load(&path),
        Err(ConfigError::Invalid { .. })
    ));

    fs::write(&path, r#"{ "classification": { "std": [0.5, 0.0, 0.5] } }"#)?;
    assert!(matches!(
        PipelineConfig::load(&path),
        Err(ConfigError::Invalid { .. })
    ));

    fs::write(&path, "{ not json")?;
    assert!(matches!(
        PipelineConfig::load(&path),
        Err(ConfigError::Parse { .. })
    ));

    assert!(matches!(
        PipelineConfig::load(dir.path().join("missing.json")),
        Err(ConfigError::Io { .. })
    ));
    Ok(())
}

#[test]
fn test_detector_falls_back_to_training_run() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let run = RunLocation {
        runs_dir: dir.path().join("runs"),
        project: "packages".to_string(),
        name: "train".to_string(),
    };

    let mut config = PipelineConfig::default();
    config.detection.model = dir.path().join("missing.rten");
    config.detection.fallback_run = Some(run.clone());
    assert_eq!(config.detection.resolve_model(), None);

    let weights = run.weights();
    fs::create_dir_all(weights.parent().unwrap())?;
    fs::write(&weights, b"")?;
    assert_eq!(config.detection.resolve_model(), Some(weights));

    let primary = dir.path().join("primary.rten");
    fs::write(&primary, b"")?;
    config.detection.model = primary.clone();
    assert_eq!(config.detection.resolve_model(), Some(primary));
    Ok(())
}

#[test]
fn test_vocabulary_file_formats() -> anyhow::Result<()> {
    let dir = TempDir::new()?;

    let names = dir.path().join("names.json");
    fs::write(&names, r#"{ "names": ["parol", "ibuprol", "aspirin"] }"#)?;
    assert_eq!(Vocabulary::load(&names)?, vocabulary());

    let list = dir.path().join("list.json");
    fs::write(&list, r#"["parol", "ibuprol", "aspirin"]"#)?;
    assert_eq!(Vocabulary::load(&list)?, vocabulary());

    let text = dir.path().join("labels.txt");
    fs::write(&text, "# package names\nparol\n\n  ibuprol  \naspirin\n")?;
    let loaded = Vocabulary::load(&text)?;
    assert_eq!(loaded, vocabulary());
    assert_eq!(loaded.index_of("ibuprol"), Some(1));
    assert_eq!(loaded.get(2), Some("aspirin"));
    Ok(())
}

#[test]
fn test_bad_vocabularies_are_rejected() -> anyhow::Result<()> {
    let dir = TempDir::new()?;

    let empty = dir.path().join("empty.txt");
    fs::write(&empty, "# nothing here\n\n")?;
    assert!(matches!(Vocabulary::load(&empty), Err(VocabularyError::Empty)));

    assert!(matches!(
        Vocabulary::new(["parol", "aspirin", "parol"]),
        Err(VocabularyError::DuplicateLabel { .. })
    ));
    assert!(matches!(
        Vocabulary::new(["Parol", "aspirin", "parol"]),
        Err(VocabularyError::AmbiguousLabel { .. })
    ));
    assert!(matches!(
        Vocabulary::new(["Parol-500", "parol 500"]),
        Err(VocabularyError::AmbiguousLabel { .. })
    ));
    assert!(matches!(
        Vocabulary::new(["parol", "  "]),
        Err(VocabularyError::BlankLabel { index: 1 })
    ));

    let broken = dir.path().join("broken.json");
    fs::write(&broken, r#"{ "labels": 3 }"#)?;
    assert!(matches!(
        Vocabulary::load(&broken),
        Err(VocabularyError::Parse { .. })
    ));
    Ok(())
}
