//! End-to-end runs of the CLI commands against a temporary photo tree.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use dupesift::cli::Cli;
use dupesift::duplicates::{derive_statuses, GroupStatus};
use dupesift::error::ExitCode;
use dupesift::output::load_table;
use image::{ImageBuffer, Luma};
use tempfile::TempDir;

fn write_gradient(path: &Path, inverted: bool) {
    let img = ImageBuffer::from_fn(64, 64, |x, _| {
        let v = (x * 4) as u8;
        Luma([if inverted { 255 - v } else { v }])
    });
    img.save(path).unwrap();
}

struct Fixture {
    dir: TempDir,
    config: PathBuf,
    table: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let photos = dir.path().join("photos");
        fs::create_dir_all(photos.join("keep")).unwrap();
        fs::create_dir_all(photos.join("dump")).unwrap();
        write_gradient(&photos.join("keep").join("a.png"), false);
        write_gradient(&photos.join("dump").join("a.png"), false);
        write_gradient(&photos.join("dump").join("b.png"), true);

        // An explicit, empty config file keeps the user's settings out.
        let config = dir.path().join("config.toml");
        fs::write(&config, "").unwrap();
        let table = dir.path().join("file_list.csv");
        Self { dir, config, table }
    }

    fn photos(&self) -> PathBuf {
        self.dir.path().join("photos")
    }

    fn try_run(&self, args: &[&str]) -> anyhow::Result<ExitCode> {
        let mut argv = vec![
            "dupesift".to_string(),
            "-q".to_string(),
            "--config".to_string(),
            self.config.display().to_string(),
        ];
        argv.extend(args.iter().map(ToString::to_string));
        dupesift::run_app(Cli::try_parse_from(argv).unwrap())
    }

    fn run(&self, args: &[&str]) -> ExitCode {
        self.try_run(args).unwrap()
    }
}

#[test]
fn test_scan_priority_delete() {
    let fx = Fixture::new();
    let table = fx.table.display().to_string();
    let photos = fx.photos().display().to_string();

    assert_eq!(fx.run(&["scan", &photos, "-o", &table]), ExitCode::Success);
    let records = load_table(&fx.table).unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(
        derive_statuses(&records)[&1],
        GroupStatus::MultipleDuplicates
    );

    assert_eq!(fx.run(&["priority", "-t", &table, "./keep"]), ExitCode::Success);
    let records = load_table(&fx.table).unwrap();
    let marked: Vec<&str> = records
        .iter()
        .filter(|r| r.marked_for_deletion)
        .map(|r| r.directory.as_str())
        .collect();
    assert_eq!(marked, vec!["./dump"]);

    assert_eq!(
        fx.run(&["delete", "-t", &table, "--dry-run"]),
        ExitCode::Success
    );
    assert!(fx.photos().join("dump").join("a.png").exists());

    assert_eq!(
        fx.run(&["delete", "-t", &table, "--permanent", "-y"]),
        ExitCode::Success
    );
    assert!(!fx.photos().join("dump").join("a.png").exists());
    assert!(fx.photos().join("keep").join("a.png").exists());
    assert!(fx.photos().join("dump").join("b.png").exists());
}

#[test]
fn test_mark_and_status() {
    let fx = Fixture::new();
    let table = fx.table.display().to_string();
    let photos = fx.photos().display().to_string();
    fx.run(&["scan", &photos, "-o", &table]);

    let keep = fx.photos().join("keep").join("a.png").display().to_string();
    let dump = fx.photos().join("dump").join("a.png").display().to_string();
    fx.run(&["mark", "-t", &table, &keep, "--delete"]);
    fx.run(&["mark", "-t", &table, &dump, "--delete"]);

    let records = load_table(&fx.table).unwrap();
    assert_eq!(derive_statuses(&records)[&1], GroupStatus::AllToBeDeleted);

    fx.run(&["mark", "-t", &table, &keep, "--keep"]);
    let records = load_table(&fx.table).unwrap();
    assert_eq!(derive_statuses(&records)[&1], GroupStatus::OnlyOneFile);

    assert_eq!(fx.run(&["status", "-t", &table]), ExitCode::Success);
}

#[test]
fn test_mark_unknown_path_fails() {
    let fx = Fixture::new();
    let table = fx.table.display().to_string();
    let photos = fx.photos().display().to_string();
    fx.run(&["scan", &photos, "-o", &table]);

    let err = fx
        .try_run(&["mark", "-t", &table, "/nowhere.png", "--delete"])
        .unwrap_err();
    assert!(err.to_string().contains("/nowhere.png"));
    assert_eq!(ExitCode::for_error(&err), ExitCode::GeneralError);
}

#[test]
fn test_scan_without_duplicates() {
    let fx = Fixture::new();
    let table = fx.table.display().to_string();
    let keep = fx.photos().join("keep").display().to_string();

    assert_eq!(
        fx.run(&["scan", &keep, "-o", &table, "--no-separator"]),
        ExitCode::NoDuplicates
    );
    let text = fs::read_to_string(&fx.table).unwrap();
    assert_eq!(text.lines().count(), 2);
}

#[test]
fn test_scan_missing_root() {
    let fx = Fixture::new();
    let missing = fx.dir.path().join("nope").display().to_string();
    let err = fx.try_run(&["scan", &missing]).unwrap_err();
    assert!(format!("{:#}", err).contains("Path not found"));
}

#[test]
fn test_priority_rejects_table_with_repeated_path() {
    let fx = Fixture::new();
    let table = fx.table.display().to_string();
    let text = "File Name,Directory Path,File Path,File Size (bytes),Last Modified,Duplicate Group,Delete\n\
                a.jpg,./keep,/p/keep/a.jpg,10,N/A,1,No\n\
                a.jpg,./keep,/p/keep/a.jpg,10,N/A,1,No\n";
    fs::write(&fx.table, text).unwrap();

    let err = fx.try_run(&["priority", "-t", &table, "./keep"]).unwrap_err();
    assert!(format!("{:#}", err).contains("duplicate file path"));
    assert_eq!(fs::read_to_string(&fx.table).unwrap(), text);
}
