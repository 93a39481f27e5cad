use std::io::Read as _;

use super::*;

fn scratch_dir(test: &str) -> PathBuf {
    let dir = std::env::temp_dir()
        .join("clipmill_zip_tests")
        .join(format!("{test}_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn zero_outputs_is_an_outcome_not_an_error() {
    let dir = scratch_dir("empty");
    let dest = dir.join("clips.zip");

    let outcome = ZipArchiver.pack(&[], &dest).unwrap();
    assert_eq!(outcome, PackOutcome::NothingToPackage);
    assert!(!dest.exists());
}

#[test]
fn archive_preserves_base_file_names_and_contents() {
    let dir = scratch_dir("roundtrip");
    let a = dir.join("combined_1.mp4");
    let b = dir.join("combined_2.mp4");
    std::fs::write(&a, b"first output").unwrap();
    std::fs::write(&b, b"second output").unwrap();

    let dest = dir.join("edited_clips.zip");
    let outcome = ZipArchiver.pack(&[a, b], &dest).unwrap();
    assert_eq!(outcome, PackOutcome::Archive(dest.clone()));

    let mut archive = zip::ZipArchive::new(std::fs::File::open(&dest).unwrap()).unwrap();
    assert_eq!(archive.len(), 2);

    let mut names: Vec<String> = (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_owned())
        .collect();
    names.sort();
    assert_eq!(names, vec!["combined_1.mp4", "combined_2.mp4"]);

    let mut contents = String::new();
    archive
        .by_name("combined_1.mp4")
        .unwrap()
        .read_to_string(&mut contents)
        .unwrap();
    assert_eq!(contents, "first output");
}

#[test]
fn missing_input_files_are_packaging_errors() {
    let dir = scratch_dir("missing");
    let dest = dir.join("clips.zip");

    let err = ZipArchiver
        .pack(&[dir.join("does_not_exist.mp4")], &dest)
        .unwrap_err();
    assert!(matches!(err, ClipmillError::Package(_)));
}
