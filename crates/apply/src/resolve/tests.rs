use std::fs;

use pretty_assertions::assert_eq;

use super::*;
use crate::host::LogLevel;
use crate::testing::RecordingLog;

fn write(root: &Path, relative: &str) -> PathBuf {
	let path = root.join(relative);
	fs::create_dir_all(path.parent().unwrap()).expect("create parent");
	fs::write(&path, "export const x = 1;\n").expect("write file");
	path
}

fn target(path: &Path) -> ScanTarget {
	ScanTarget::from_path(&fs::canonicalize(path).expect("canonicalize")).unwrap()
}

fn resolver(log: &Arc<RecordingLog>) -> ScanTargetResolver {
	ScanTargetResolver::new(&ApplyConfig::default(), log.clone())
}

#[tokio::test]
async fn file_inside_directory_is_not_duplicated() {
	let temp = tempfile::tempdir().expect("tempdir");
	let dir_a = temp.path().join("a");
	let x = write(&dir_a, "x.ts");
	let y = write(&dir_a, "y.ts");
	let log = RecordingLog::new();

	let targets = resolver(&log).resolve(&[dir_a.clone(), x.clone()], &CancellationToken::new()).await;

	assert_eq!(targets, vec![target(&x), target(&y)]);
	assert!(log.records().is_empty());
}

#[tokio::test]
async fn first_seen_order_spans_inputs() {
	let temp = tempfile::tempdir().expect("tempdir");
	let root = temp.path();
	let top = write(root, "top.ts");
	let nested = write(root, "sub/nested.ts");
	let log = RecordingLog::new();

	let targets = resolver(&log)
		.resolve(&[root.join("sub"), root.to_path_buf()], &CancellationToken::new())
		.await;

	assert_eq!(targets, vec![target(&nested), target(&top)]);
}

#[tokio::test]
async fn directory_walk_is_depth_first_by_name() {
	let temp = tempfile::tempdir().expect("tempdir");
	let root = temp.path();
	let b = write(root, "b.ts");
	let inner = write(root, "a/z.ts");
	let c = write(root, "c.js");
	let log = RecordingLog::new();

	let targets = resolver(&log).resolve(&[root.to_path_buf()], &CancellationToken::new()).await;

	assert_eq!(targets, vec![target(&inner), target(&b), target(&c)]);
}

#[tokio::test]
async fn extensions_match_case_insensitively() {
	let temp = tempfile::tempdir().expect("tempdir");
	let root = temp.path();
	let upper = write(root, "Upper.TSX");
	write(root, "notes.md");
	write(root, "main.rs");
	let lonely = write(root, "README");
	let log = RecordingLog::new();

	let targets = resolver(&log)
		.resolve(&[root.to_path_buf(), lonely, root.join("notes.md")], &CancellationToken::new())
		.await;

	assert_eq!(targets, vec![target(&upper)]);
}

#[tokio::test]
async fn ignore_rules_and_hidden_entries_are_honored() {
	let temp = tempfile::tempdir().expect("tempdir");
	let root = temp.path();
	fs::write(root.join(".ignore"), "generated/\n").expect("write .ignore");
	let kept = write(root, "src/app.ts");
	write(root, "generated/app.ts");
	write(root, ".cache/app.ts");
	let log = RecordingLog::new();

	let targets = resolver(&log).resolve(&[root.to_path_buf()], &CancellationToken::new()).await;
	assert_eq!(targets, vec![target(&kept)]);

	let permissive = ApplyConfig {
		include_hidden: true,
		respect_ignore_files: false,
		..ApplyConfig::default()
	};
	let targets = ScanTargetResolver::new(&permissive, log.clone())
		.resolve(&[root.to_path_buf()], &CancellationToken::new())
		.await;
	assert_eq!(targets.len(), 3);
}

#[tokio::test]
async fn unreadable_input_is_logged_and_skipped() {
	let temp = tempfile::tempdir().expect("tempdir");
	let root = temp.path();
	let one = write(root, "one/a.ts");
	let two = write(root, "two.ts");
	let three = write(root, "three/b.js");
	let missing = root.join("missing");
	let log = RecordingLog::new();

	let targets = resolver(&log)
		.resolve(
			&[root.join("one"), missing.clone(), two.clone(), root.join("three")],
			&CancellationToken::new(),
		)
		.await;

	assert_eq!(targets, vec![target(&one), target(&two), target(&three)]);

	let records = log.records();
	assert_eq!(records.len(), 1);
	assert_eq!(records[0].level, LogLevel::Error);
	assert_eq!(records[0].message, "Failed to resolve scan target");
	assert_eq!(records[0].path.as_deref(), Some(missing.display().to_string().as_str()));
	assert!(records[0].error.is_some());
}

#[cfg(unix)]
#[tokio::test]
async fn unreadable_directory_root_is_logged_and_skipped() {
	use std::os::unix::fs::PermissionsExt;

	let temp = tempfile::tempdir().expect("tempdir");
	let root = temp.path();
	write(root, "locked/a.ts");
	let open = write(root, "open/b.ts");
	let locked = root.join("locked");
	fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).expect("chmod");
	if fs::read_dir(&locked).is_ok() {
		// Permission bits are not enforced, e.g. when running as root.
		fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).expect("chmod");
		return;
	}
	let log = RecordingLog::new();

	let targets = resolver(&log)
		.resolve(&[locked.clone(), root.join("open")], &CancellationToken::new())
		.await;
	fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).expect("chmod");

	assert_eq!(targets, vec![target(&open)]);
	let records = log.records();
	assert_eq!(records.len(), 1);
	assert_eq!(records[0].message, "Failed to resolve scan target");
	assert_eq!(records[0].path.as_deref(), Some(locked.display().to_string().as_str()));
}

#[tokio::test]
async fn cancelled_before_start_returns_nothing() {
	let temp = tempfile::tempdir().expect("tempdir");
	let file = write(temp.path(), "a.ts");
	let cancel = CancellationToken::new();
	cancel.cancel();
	let log = RecordingLog::new();

	let targets = resolver(&log).resolve(&[file], &cancel).await;

	assert!(targets.is_empty());
	assert!(log.records().is_empty());
}

#[test]
fn non_absolute_paths_are_not_targets() {
	assert!(matches!(ScanTarget::from_path(Path::new("relative.ts")), Err(Error::InvalidTarget(_))));
}
