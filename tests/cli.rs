use std::process::Command;

fn codebrief(dir: &std::path::Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_codebrief"));
    cmd.current_dir(dir).env_remove("RUST_LOG");
    cmd
}

#[test]
fn context_rejects_out_of_range_threshold() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.py"), "x = 1").unwrap();

    let output = codebrief(dir.path())
        .args(["context", ".", "a.py", "--threshold", "1.5"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("threshold"));
}

#[test]
fn context_fails_for_missing_folder() {
    let dir = tempfile::tempdir().unwrap();

    let output = codebrief(dir.path())
        .args(["context", "no-such-folder", "a.py"])
        .output()
        .unwrap();

    assert!(!output.status.success());
}

#[test]
fn invalid_config_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(".codebrief.toml"), "[retrieval]\ntop_n = 0\n").unwrap();

    let output = codebrief(dir.path()).args(["init"]).output().unwrap();

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("top_n"));
}

#[test]
fn overview_requires_summaries() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("briefs")).unwrap();

    let output = codebrief(dir.path())
        .args(["overview", "briefs"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("summary.txt"));
}
