use damper_config::artifact::{NodeArtifact, artifact_from_reader};
use damper_config::{ForestTask, ModelArtifact, load_artifact_json};
use rstest::rstest;

const FOREST: &str = r#"{
  "kind": "forest",
  "task": "classification",
  "n_features": 3,
  "trees": [
    {"nodes": [
      {"feature": 2, "threshold": 0.5, "left": 1, "right": 2},
      {"value": 0},
      {"value": 4}
    ]}
  ]
}"#;

#[test]
fn parses_forest_artifact() {
    let art = artifact_from_reader(FOREST.as_bytes()).expect("valid forest");
    assert_eq!(art.input_width(), 3);
    match art {
        ModelArtifact::Forest(f) => {
            assert_eq!(f.task, ForestTask::Classification);
            assert!(matches!(f.trees[0].nodes[0], NodeArtifact::Split { feature: 2, .. }));
            assert!(matches!(f.trees[0].nodes[2], NodeArtifact::Leaf { value } if value == 4.0));
        }
        other => panic!("expected forest, got {other:?}"),
    }
}

#[test]
fn parses_linear_artifact_with_default_bias() {
    let art = artifact_from_reader(r#"{"kind":"linear","weights":[0.5,-0.5]}"#.as_bytes())
        .expect("valid linear");
    match art {
        ModelArtifact::Linear(l) => {
            assert_eq!(l.weights, vec![0.5, -0.5]);
            assert_eq!(l.bias, 0.0);
            assert!(l.classes.is_none());
        }
        other => panic!("expected linear, got {other:?}"),
    }
}

#[rstest]
#[case(r#"{"kind":"linear","weights":[]}"#, "no weights")]
#[case(r#"{"kind":"forest","task":"regression","n_features":2,"trees":[]}"#, "no trees")]
#[case(
    r#"{"kind":"forest","task":"regression","n_features":2,"trees":[{"nodes":[{"feature":5,"threshold":0,"left":1,"right":2},{"value":1},{"value":2}]}]}"#,
    "out of range"
)]
#[case(
    r#"{"kind":"forest","task":"regression","n_features":2,"trees":[{"nodes":[{"feature":0,"threshold":0,"left":0,"right":1},{"value":1}]}]}"#,
    "child index 0 invalid"
)]
#[case(
    r#"{"kind":"forest","task":"classification","n_features":1,"trees":[{"nodes":[{"value":0.5}]}]}"#,
    "not a class id"
)]
#[case(r#"{"kind":"svm"}"#, "parse model artifact")]
fn rejects_structurally_invalid_artifacts(#[case] json: &str, #[case] needle: &str) {
    let err = artifact_from_reader(json.as_bytes()).expect_err("should reject");
    assert!(format!("{err}").contains(needle), "'{err}' lacks '{needle}'");
}

#[test]
fn load_from_missing_file_names_the_path() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_artifact_json(&dir.path().join("model.json")).unwrap_err();
    assert!(format!("{err}").contains("open model artifact"));
}
