use super::*;

fn minimal_job() -> &'static str {
    r#"
{
  "count": 3,
  "groups": [
    { "sources": ["a.mp4", { "path": "b.mp4", "duration_s": 12.5 }] }
  ]
}
"#
}

#[test]
fn parses_minimal_job_with_defaults() {
    let job = JobDef::from_reader(minimal_job().as_bytes()).unwrap();
    job.validate().unwrap();

    assert_eq!(job.count, 3);
    assert_eq!(job.seed, 0);
    assert_eq!(job.mode, GenerationMode::Random);
    assert_eq!(job.output_dir, PathBuf::from("clipmill_out"));
    assert_eq!(job.archive, "edited_clips.zip");
    assert_eq!(job.groups.len(), 1);
    assert_eq!(job.groups[0].display_name(0), "Group 1");

    match &job.groups[0].sources[1] {
        SourceDef::Probed { path, duration_s } => {
            assert_eq!(path, &PathBuf::from("b.mp4"));
            assert_eq!(*duration_s, 12.5);
        }
        other => panic!("expected probed source, got {other:?}"),
    }
}

#[test]
fn parses_full_job() {
    let json = r#"
{
  "count": 2,
  "seed": 7,
  "mode": "full-length",
  "output_dir": "out",
  "archive": "batch.zip",
  "groups": [
    {
      "name": "Intros",
      "sources": [{ "path": "intro.mp4", "duration_s": 30.0 }],
      "timings": "0, 5\n10, 15",
      "speeds": "1.0\n2.0",
      "captions": "one\ntwo"
    }
  ]
}
"#;
    let job = JobDef::from_reader(json.as_bytes()).unwrap();
    job.validate().unwrap();
    assert_eq!(job.mode, GenerationMode::FullLength);
    assert_eq!(job.groups[0].display_name(0), "Intros");
    assert_eq!(job.groups[0].timings.as_deref(), Some("0, 5\n10, 15"));
}

#[test]
fn malformed_json_is_a_parse_error() {
    let err = JobDef::from_reader("{not json".as_bytes()).unwrap_err();
    assert!(matches!(err, ClipmillError::Parse(_)));
}

#[test]
fn validate_rejects_structural_problems() {
    let mut job = JobDef::from_reader(minimal_job().as_bytes()).unwrap();
    job.count = 0;
    assert!(job.validate().is_err());

    let mut job = JobDef::from_reader(minimal_job().as_bytes()).unwrap();
    job.groups.clear();
    assert!(job.validate().is_err());

    let mut job = JobDef::from_reader(minimal_job().as_bytes()).unwrap();
    job.groups[0].sources.clear();
    assert!(job.validate().is_err());
}

#[test]
fn validate_rejects_duplicate_group_names() {
    let json = r#"
{
  "count": 1,
  "groups": [
    { "name": "Same", "sources": ["a.mp4"] },
    { "name": "Same", "sources": ["b.mp4"] }
  ]
}
"#;
    let job = JobDef::from_reader(json.as_bytes()).unwrap();
    let err = job.validate().unwrap_err();
    assert!(err.to_string().contains("duplicate group name"));
}

#[test]
fn validate_rejects_bad_probed_durations() {
    let json = r#"
{
  "count": 1,
  "groups": [
    { "sources": [{ "path": "a.mp4", "duration_s": -3.0 }] }
  ]
}
"#;
    let job = JobDef::from_reader(json.as_bytes()).unwrap();
    assert!(job.validate().is_err());
}
