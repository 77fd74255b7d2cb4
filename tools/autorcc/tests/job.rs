//! End-to-end tests for rcc jobs.
//!
//! Each test builds a throwaway project with a `.qrc` file, a resource and a
//! fake rcc implemented as a shell script. The script is run through
//! `/bin/sh` (the configured rcc executable) with its own path as the first
//! option, and it logs every invocation so tests can count them.

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;

use autorcc::{BuildDecision, RccError, RccInfo, RebuildReason, process, run};
use autorcc::lister::RccLister;
use autorcc::wrapper::wrapper_content;
use filetime::FileTime;
use tempfile::TempDir;

/// Fake rcc: `--list` prints the resources, otherwise `-o <out> <qrc>` writes the output.
const FAKE_RCC: &str = r#"
log_dir=$(dirname "$0")
if [ "$1" = "--list" ]; then
  echo list >> "$log_dir/lists.log"
  printf 'res/icon.png\n'
  exit 0
fi
out=""
while [ $# -gt 1 ]; do
  if [ "$1" = "-o" ]; then out="$2"; shift; fi
  shift
done
echo run >> "$log_dir/runs.log"
printf '// generated from %s\n' "$1" > "$out"
"#;

/// Fake rcc that writes a partial output and then fails.
const FAILING_RCC: &str = r#"
out=""
while [ $# -gt 1 ]; do
  if [ "$1" = "-o" ]; then out="$2"; shift; fi
  shift
done
printf 'partial' > "$out"
echo "RCC Parse Error: broken resource" >&2
exit 1
"#;

/// A file time `secs` seconds in the past.
fn ago(secs: i64) -> FileTime {
    FileTime::from_unix_time(FileTime::now().unix_seconds() - secs, 0)
}

fn set_mtime(path: &Path, time: FileTime) {
    filetime::set_file_mtime(path, time).unwrap();
}

fn mtime(path: &Path) -> FileTime {
    FileTime::from_last_modification_time(&fs::metadata(path).unwrap())
}

struct Project {
    _dir: TempDir,
    root: PathBuf,
}

impl Project {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();

        fs::create_dir_all(root.join("src/res")).unwrap();
        fs::create_dir_all(root.join("build")).unwrap();
        fs::write(
            root.join("src/app.qrc"),
            "<RCC><qresource><file>res/icon.png</file></qresource></RCC>\n",
        )
        .unwrap();
        fs::write(root.join("src/res/icon.png"), "png").unwrap();
        fs::write(root.join("rcc.sh"), FAKE_RCC).unwrap();
        fs::write(root.join("fail.sh"), FAILING_RCC).unwrap();

        set_mtime(&root.join("src/app.qrc"), ago(1_000));
        set_mtime(&root.join("src/res/icon.png"), ago(1_000));

        Self { _dir: dir, root }
    }

    fn path(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }

    /// Write the info file with the given generator script and extra keys, then load it.
    fn info_with(&self, script: &str, extra: &str, config: Option<&str>) -> RccInfo {
        let root = self.root.display();
        let text = format!(
            r#"{extra}
build-dir = "{root}/build"
include-dir = "{root}/build/include"
rcc-executable = "/bin/sh"
rcc-list-options = ["{root}/rcc.sh", "--list"]
lock-file = "{root}/build/rcc.lock"
source = "{root}/src/app.qrc"
output-checksum = "a1b2"
output-name = "qrc_app.cpp"
options = ["{root}/{script}", "-name", "app"]
settings-file = "{root}/build/rcc.settings"
"#
        );
        let info_file = self.path("build/info.toml");
        fs::write(&info_file, text).unwrap();
        set_mtime(&info_file, ago(1_000));
        RccInfo::load(&info_file, config).unwrap()
    }

    fn info(&self) -> RccInfo {
        self.info_with("rcc.sh", "", None)
    }

    fn output(&self) -> PathBuf {
        self.path("build/a1b2/qrc_app.cpp")
    }

    fn log_lines(&self, name: &str) -> usize {
        fs::read_to_string(self.path(name)).map_or(0, |s| s.lines().count())
    }

    fn runs(&self) -> usize {
        self.log_lines("runs.log")
    }

    fn lists(&self) -> usize {
        self.log_lines("lists.log")
    }
}

// ---------------------------------------------------------------------------
// Single configuration
// ---------------------------------------------------------------------------

#[test]
fn first_run_generates_and_records_settings() {
    let project = Project::new();
    let info = project.info();

    let decision = run(&info).unwrap();

    assert_eq!(decision, BuildDecision::Rebuild(RebuildReason::OutputMissing));
    assert_eq!(project.runs(), 1);
    let generated = fs::read_to_string(project.output()).unwrap();
    assert!(generated.starts_with("// generated from"), "{generated}");

    let record = fs::read_to_string(project.path("build/rcc.settings")).unwrap();
    let digest = record.strip_prefix("rcc:").unwrap().strip_suffix('\n').unwrap();
    assert_eq!(digest.len(), 64);
    assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn unchanged_second_run_is_up_to_date() {
    let project = Project::new();
    let info = project.info();
    run(&info).unwrap();

    let settings = project.path("build/rcc.settings");
    let record = fs::read_to_string(&settings).unwrap();
    set_mtime(&project.output(), ago(500));
    set_mtime(&settings, ago(500));
    let output_time = mtime(&project.output());
    let settings_time = mtime(&settings);

    assert_eq!(run(&info).unwrap(), BuildDecision::UpToDate);

    assert_eq!(project.runs(), 1);
    assert_eq!(mtime(&project.output()), output_time);
    assert_eq!(mtime(&settings), settings_time);
    assert_eq!(fs::read_to_string(&settings).unwrap(), record);
}

#[test]
fn resources_are_listed_only_when_reached() {
    let project = Project::new();
    let info = project.info();

    // Output missing: decided before the resource scan.
    run(&info).unwrap();
    assert_eq!(project.lists(), 0);

    run(&info).unwrap();
    assert_eq!(project.lists(), 1);
}

#[test]
fn option_change_forces_rebuild() {
    let project = Project::new();
    run(&project.info()).unwrap();
    set_mtime(&project.output(), ago(500));

    let mut changed = project.info();
    changed.options.push("-no-compress".into());

    assert_eq!(
        run(&changed).unwrap(),
        BuildDecision::Rebuild(RebuildReason::SettingsChanged)
    );
    assert_eq!(project.runs(), 2);
    assert_eq!(project.lists(), 0);

    // The new settings are recorded, so the next run is quiet again.
    set_mtime(&project.output(), ago(500));
    assert_eq!(run(&changed).unwrap(), BuildDecision::UpToDate);
}

#[test]
fn deleted_output_is_rebuilt() {
    let project = Project::new();
    let info = project.info();
    run(&info).unwrap();

    fs::remove_file(project.output()).unwrap();

    assert_eq!(
        run(&info).unwrap(),
        BuildDecision::Rebuild(RebuildReason::OutputMissing)
    );
    assert!(project.output().exists());
}

#[test]
fn source_timestamp_decides_rebuild() {
    let project = Project::new();
    let info = project.info();
    run(&info).unwrap();
    set_mtime(&project.output(), ago(500));

    set_mtime(&info.source, ago(600));
    assert_eq!(run(&info).unwrap(), BuildDecision::UpToDate);

    set_mtime(&info.source, mtime(&project.output()));
    assert_eq!(run(&info).unwrap(), BuildDecision::UpToDate);

    set_mtime(&info.source, ago(400));
    assert_eq!(
        run(&info).unwrap(),
        BuildDecision::Rebuild(RebuildReason::SourceNewer(info.source.clone()))
    );
}

#[test]
fn newer_resource_is_rebuilt() {
    let project = Project::new();
    let info = project.info();
    run(&info).unwrap();
    set_mtime(&project.output(), ago(500));

    let icon = project.path("src/res/icon.png");
    set_mtime(&icon, ago(100));

    assert_eq!(
        run(&info).unwrap(),
        BuildDecision::Rebuild(RebuildReason::ResourceNewer(icon))
    );
}

#[test]
fn missing_explicit_resource_fails() {
    let project = Project::new();
    let mut info = project.info();
    info.inputs = vec![project.path("src/res/icon.png"), project.path("src/res/gone.png")];

    // Output missing: decided before the inputs are looked at.
    run(&info).unwrap();
    set_mtime(&project.output(), ago(500));

    let err = run(&info).unwrap_err();
    assert!(matches!(err, RccError::MissingResource { .. }), "{err:?}");
}

#[test]
fn newer_info_file_touches_output_only() {
    let project = Project::new();
    let info = project.info();
    run(&info).unwrap();
    set_mtime(&project.output(), ago(500));
    let content = fs::read_to_string(project.output()).unwrap();

    set_mtime(&info.info_file, ago(100));

    assert_eq!(run(&info).unwrap(), BuildDecision::TouchOnly);
    assert_eq!(project.runs(), 1);
    assert_eq!(fs::read_to_string(project.output()).unwrap(), content);
    assert!(mtime(&project.output()) > ago(100));
}

#[test]
fn failing_generator_leaves_no_output() {
    let project = Project::new();
    run(&project.info()).unwrap();
    assert!(project.output().exists());

    let failing = project.info_with("fail.sh", "", None);
    match run(&failing).unwrap_err() {
        RccError::ToolFailed { output, .. } => {
            assert!(output.contains("broken resource"), "{output}");
        }
        other => panic!("expected tool failure, got {other:?}"),
    }

    assert!(!project.output().exists());
    // The record was cleared when the change was detected and never rewritten.
    assert_eq!(fs::read_to_string(project.path("build/rcc.settings")).unwrap(), "");
}

#[test]
fn unlaunchable_generator_leaves_no_output() {
    let project = Project::new();
    let mut info = project.info();
    // Exists, but is not executable.
    info.executable = project.path("rcc.sh");

    fs::create_dir_all(project.path("build/a1b2")).unwrap();
    fs::write(project.output(), "// stale leftover").unwrap();

    let err = run(&info).unwrap_err();

    assert!(matches!(err, RccError::ToolLaunch { .. }), "{err:?}");
    assert!(!project.output().exists());
    assert_eq!(project.runs(), 0);
}

#[test]
fn failed_run_releases_the_lock() {
    let project = Project::new();
    let failing = project.info_with("fail.sh", "", None);
    assert!(run(&failing).is_err());

    let info = project.info();
    assert_eq!(
        run(&info).unwrap(),
        BuildDecision::Rebuild(RebuildReason::OutputMissing)
    );
}

#[test]
fn concurrent_jobs_generate_once() {
    let project = Project::new();
    let info = project.info();

    thread::scope(|s| {
        let a = s.spawn(|| run(&info));
        let b = s.spawn(|| run(&info));
        a.join().unwrap().unwrap();
        b.join().unwrap().unwrap();
    });

    assert_eq!(project.runs(), 1);
}

#[test]
fn qrc_parsing_lister_is_used_without_list_options() {
    let project = Project::new();
    let mut info = project.info();
    info.list_options.clear();
    run(&info).unwrap();
    set_mtime(&project.output(), ago(500));
    set_mtime(&project.path("src/res/icon.png"), ago(100));

    let lister = RccLister::new(&info.executable, Vec::new());
    assert_eq!(
        process(&info, &lister).unwrap(),
        BuildDecision::Rebuild(RebuildReason::ResourceNewer(project.path("src/res/icon.png")))
    );
    assert_eq!(project.lists(), 0);
}

// ---------------------------------------------------------------------------
// Multi configuration
// ---------------------------------------------------------------------------

#[test]
fn multi_config_publishes_wrapper() {
    let project = Project::new();
    let info = project.info_with("rcc.sh", "multi-config = true", Some("Debug"));

    run(&info).unwrap();

    let physical = project.path("build/include/a1b2/qrc_app_CMAKE_.cpp");
    assert!(physical.exists());
    assert_eq!(
        fs::read_to_string(project.output()).unwrap(),
        wrapper_content("a1b2/qrc_app_CMAKE_.cpp")
    );
}

#[test]
fn multi_config_rebuild_touches_unchanged_wrapper() {
    let project = Project::new();
    let info = project.info_with("rcc.sh", "multi-config = true", None);
    run(&info).unwrap();

    let wrapper = project.output();
    let content = fs::read_to_string(&wrapper).unwrap();
    set_mtime(&wrapper, ago(500));
    set_mtime(&info.output_path(), ago(500));
    set_mtime(&info.source, ago(100));

    assert_eq!(
        run(&info).unwrap(),
        BuildDecision::Rebuild(RebuildReason::SourceNewer(info.source.clone()))
    );

    assert_eq!(fs::read_to_string(&wrapper).unwrap(), content);
    assert!(mtime(&wrapper) > ago(100));
}

#[test]
fn multi_config_up_to_date_leaves_wrapper_alone() {
    let project = Project::new();
    let info = project.info_with("rcc.sh", "multi-config = true", None);
    run(&info).unwrap();

    let wrapper = project.output();
    set_mtime(&wrapper, ago(500));
    set_mtime(&info.output_path(), ago(500));
    let wrapper_time = mtime(&wrapper);

    assert_eq!(run(&info).unwrap(), BuildDecision::UpToDate);
    assert_eq!(mtime(&wrapper), wrapper_time);
}
