use std::path::Path;
use std::path::PathBuf;

use chrono::NaiveDate;
use tempdir::TempDir;

use super::*;
use crate::test_utils::create_sized_file;
use crate::test_utils::REAL_FS;

const GB: u64 = 1_000_000_000;

fn file(name: &str, size: u64) -> OutputFile {
    OutputFile::new(
        name,
        ScaleScheme::LastToken.parse(name).unwrap(),
        size,
    )
}

fn names(batch: &Batch) -> Vec<&str> {
    batch.files().iter().map(|f| f.name.as_str()).collect()
}

fn scenario() -> Vec<OutputFile> {
    vec![
        file("out_0.20000.art", 150 * GB),
        file("out_0.10000.log", GB),
        file("out_0.10000.art", 200 * GB),
    ]
}

#[test]
fn first_group_over_threshold_test() {
    let batches = plan_batches(scenario(), 150 * GB);

    assert_eq!(2, batches.len());
    assert_eq!(vec!["out_0.10000.art", "out_0.10000.log"], names(&batches[0]));
    assert_eq!("outputs_0.10000.tar", batches[0].name());
    assert_eq!(201 * GB, batches[0].size());
    assert_eq!(vec!["out_0.20000.art"], names(&batches[1]));
    assert_eq!("outputs_0.20000.tar", batches[1].name());
}

#[test]
fn groups_merge_below_threshold_test() {
    let batches = plan_batches(scenario(), 300 * GB);

    assert_eq!(1, batches.len());
    assert_eq!(
        vec!["out_0.10000.art", "out_0.10000.log", "out_0.20000.art"],
        names(&batches[0])
    );
    assert_eq!("outputs_0.10000_to_0.20000.tar", batches[0].name());
}

#[test]
fn scale_groups_never_split_test() {
    let mut files = vec![];

    for scale in ["0.1", "0.2", "0.3", "0.4"] {
        for kind in ["art", "log", "dat"] {
            files.push(file(&format!("out_{scale}.{kind}"), 4 * GB));
        }
    }

    let batches = plan_batches(files, 10 * GB);

    for batch in &batches {
        let scales = batch
            .files()
            .iter()
            .map(|f| f.scale.clone())
            .collect::<BTreeSet<_>>();

        for other in batches.iter().filter(|b| *b != batch) {
            assert!(other.files().iter().all(|f| !scales.contains(&f.scale)));
        }
    }

    assert_eq!(4, batches.len());
}

#[test]
fn overshoot_bounded_by_one_group_test() {
    let files = (1..=9)
        .map(|i| file(&format!("out_0.{i}0000.art"), i * GB))
        .collect::<Vec<OutputFile>>();

    let max = 5 * GB;

    for batch in plan_batches(files, max) {
        let last_group = batch.files().last().unwrap().size;
        assert!(batch.size() - last_group <= max);
    }
}

#[test]
fn no_files_no_batches_test() {
    assert!(plan_batches(vec![], GB).is_empty());
    assert_eq!("outputs.tar", Batch::default().name());
}

#[test]
fn list_output_files_test() {
    let tempdir = TempDir::new("archive_test").unwrap();
    create_sized_file(tempdir.path(), "out_0.10000.art", 10);
    create_sized_file(tempdir.path(), "out_0.10000.log", 5);
    create_sized_file(tempdir.path(), "stars_0.20000.log", 5);
    create_sized_file(tempdir.path(), "README", 1);
    std::fs::create_dir(tempdir.path().join("dir_0.3")).unwrap();

    let anchored =
        list_output_files(tempdir.path(), &ScaleScheme::LastToken, Some("art"), &REAL_FS).unwrap();

    assert_eq!(
        vec![
            OutputFile::new("out_0.10000.art", ScaleFactor::new("0.10000"), 10),
            OutputFile::new("out_0.10000.log", ScaleFactor::new("0.10000"), 5),
        ],
        anchored
    );

    let all = list_output_files(tempdir.path(), &ScaleScheme::LastToken, None, &REAL_FS).unwrap();

    assert_eq!(3, all.len());
    assert_eq!(Some(ScaleFactor::new("0.10000")), earliest_scale(&all));
    assert_eq!(
        1,
        without_scale(all, &ScaleFactor::new("0.10000")).len()
    );
}

#[test]
fn collision_test() {
    let tempdir = TempDir::new("archive_test").unwrap();
    let names: Vec<String> = plan_batches(scenario(), 150 * GB)
        .iter()
        .map(Batch::name)
        .collect();
    let exists = |name: &str| tempdir.path().join(name).exists();

    check_collisions(&names, "tape", exists).unwrap();

    create_sized_file(tempdir.path(), "outputs_0.20000.tar", 1);

    assert!(check_collisions(&names, "tape", exists)
        .is_err_and(|e| e.root_cause().to_string().contains("Archive naming collision")));
}

#[test]
fn collision_in_listing_test() {
    let listing = "outputs_0.10000.tar\nrun_notes.txt\n";
    let taken = |name: &str| listing.lines().any(|line| line == name);

    let fresh = vec!["outputs_0.20000.tar".to_string()];
    check_collisions(&fresh, "ranch:/tape", taken).unwrap();

    let names = vec![
        "outputs_0.20000.tar".to_string(),
        "outputs_0.10000.tar".to_string(),
    ];
    assert!(check_collisions(&names, "ranch:/tape", taken).is_err_and(|e| e
        .to_string()
        .contains("outputs_0.10000.tar already exists in ranch:/tape")));
}

#[test]
fn remote_mirror_path_test() {
    assert_eq!(
        PathBuf::from("art_runs/runs/test_run"),
        remote_mirror_path(Path::new("/scratch/01234/jdoe/art_runs/runs/test_run"), "jdoe").unwrap()
    );
    assert_eq!(
        PathBuf::from(""),
        remote_mirror_path(Path::new("/scratch/01234/jdoe"), "jdoe").unwrap()
    );
    assert!(remote_mirror_path(Path::new("/scratch/01234/other"), "jdoe").is_err());
}

#[test]
fn directory_archive_name_test() {
    let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();

    assert_eq!("run_2024_03_07.tar", directory_archive_name("run", date, false));
    assert_eq!("run.tar", directory_archive_name("run", date, true));
}

#[test]
fn log_archive_destination_test() {
    assert_eq!(
        PathBuf::from("art_runs/runs/production/tl_sfe010_hn20/run/log"),
        log_archive_destination("runtime_production_tl_sfe010_hn20_4567890").unwrap()
    );
    assert_eq!(
        PathBuf::from("art_runs/runs/production/tl_sfe010_hn20_fboost3/run/log"),
        log_archive_destination("runtime_production_tl_sfe010_hn20_fboost3_4567890").unwrap()
    );
    assert!(log_archive_destination("runtime_production").is_err());
}

#[test]
fn validate_log_dir_test() {
    let scratch = TempDir::new("scratch").unwrap();
    let good = scratch.path().join("runtime_production_tl_sfe010_hn20_1");
    std::fs::create_dir(&good).unwrap();

    validate_log_dir(&good, scratch.path()).unwrap();

    let misnamed = scratch.path().join("runtime_test_1");
    std::fs::create_dir(&misnamed).unwrap();
    assert!(validate_log_dir(&misnamed, scratch.path())
        .is_err_and(|e| e.root_cause().to_string().contains("Not a log directory")));

    assert!(validate_log_dir(
        &scratch.path().join("runtime_production_missing"),
        scratch.path()
    )
    .is_err_and(|e| e.root_cause().to_string().contains("does not exist")));

    assert!(validate_log_dir(&good.join("runtime_production_nested"), scratch.path())
        .is_err_and(|e| e.root_cause().to_string().contains("Not on scratch")));
}
