use feedback_queue_scheduler::{load_tasks, LoadError, TaskSpec};
use std::{
    fs,
    path::Path,
    process::{Command, Stdio},
};
use tempfile::TempDir;

const BATCH: &str = "\
# arrival, priority, duration
0, 0, 3

0, 1, 2
this line is noise
5, 9, 1
";

fn write_batch(dir: &TempDir, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join("giris.txt");
    fs::write(&path, contents).unwrap();
    path
}

fn simulator(input: &Path, extra: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_mlfq-sim"))
        .arg(input)
        .args(["--quantum-ms", "0", "--drain-ms", "0", "--no-color", "-q"])
        .args(extra)
        .output()
        .unwrap()
}

#[test]
fn loads_only_well_formed_records() {
    let dir = TempDir::new().unwrap();
    let path = write_batch(&dir, BATCH);

    let tasks = load_tasks(&path).unwrap();
    assert_eq!(
        tasks,
        vec![
            TaskSpec::new(0, 0, 3),
            TaskSpec::new(0, 1, 2),
            TaskSpec::new(5, 9, 1),
        ]
    );
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = TempDir::new().unwrap();
    let err = load_tasks(&dir.path().join("absent.txt")).unwrap_err();
    assert!(matches!(err, LoadError::Io { .. }));
}

#[test]
fn file_without_records_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_batch(&dir, "# nothing here\n\n");
    assert!(matches!(load_tasks(&path), Err(LoadError::Empty { .. })));
}

#[test]
fn simulator_prints_one_line_per_transition() {
    let dir = TempDir::new().unwrap();
    let path = write_batch(&dir, BATCH);

    let output = simulator(&path, &["--levels", "4"]);
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<_> = stdout.lines().collect();
    // The priority-9 record does not fit four levels and is skipped.
    assert_eq!(
        lines,
        vec![
            "0.0000 s task dispatched (id:0000 priority:0 remaining:3 s)",
            "1.0000 s task running    (id:0000 priority:0 remaining:2 s)",
            "2.0000 s task running    (id:0000 priority:0 remaining:1 s)",
            "3.0000 s task completed  (id:0000 priority:0 remaining:0 s)",
            "3.0000 s task dispatched (id:0001 priority:1 remaining:2 s)",
            "4.0000 s task suspended  (id:0001 priority:1 remaining:1 s)",
            "4.0000 s task dispatched (id:0001 priority:2 remaining:1 s)",
            "5.0000 s task completed  (id:0001 priority:2 remaining:0 s)",
            "5 ticks (0 idle), 2 completed, 0 terminated, mean turnaround 4.00 ticks",
        ]
    );
}

#[test]
fn simulator_fails_without_input() {
    let dir = TempDir::new().unwrap();
    let output = simulator(&dir.path().join("absent.txt"), &[]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("cannot read task file"));
}

#[test]
fn simulator_rejects_a_single_level_bank() {
    let dir = TempDir::new().unwrap();
    let path = write_batch(&dir, BATCH);
    let output = simulator(&path, &["--levels", "1"]);
    assert_eq!(output.status.code(), Some(1));
}

#[cfg(target_os = "linux")]
#[test]
fn simulator_fails_when_event_output_cannot_be_written() {
    let dir = TempDir::new().unwrap();
    let path = write_batch(&dir, BATCH);
    let full = fs::OpenOptions::new().write(true).open("/dev/full").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_mlfq-sim"))
        .arg(&path)
        .args(["--quantum-ms", "0", "--drain-ms", "0", "--no-color", "-q"])
        .stdout(Stdio::from(full))
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("cannot write event output"));
}
