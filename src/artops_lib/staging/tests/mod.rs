use std::fs;
use std::path::Path;
use std::path::PathBuf;

use tempdir::TempDir;

use super::*;
use crate::test_utils::create_text_file;
use crate::test_utils::REAL_FS;

#[test]
fn plan_staging_test() {
    let tempdir = TempDir::new("staging").unwrap();
    for name in [
        "continuous_a0.1000.art",
        "continuous_a0.1000.dat",
        "continuous_a0.2000.art",
        "continuous_a0.2000.dat",
        "notes.txt",
    ] {
        create_text_file(tempdir.path(), name, name);
    }

    let plan = plan_staging(tempdir.path(), &ScaleScheme::continuous_outputs(), &REAL_FS).unwrap();

    assert_eq!(Some(ScaleFactor::new("0.2000")), plan.latest);
    assert_eq!(2, plan.groups);
    assert_eq!(
        vec![
            StageAction::Move,
            StageAction::Move,
            StageAction::Copy,
            StageAction::Copy
        ],
        plan.steps.iter().map(|s| s.action).collect::<Vec<_>>()
    );

    let out = tempdir.path().join("out");
    fs::create_dir(&out).unwrap();
    execute_plan(&plan, tempdir.path(), &out, &REAL_FS).unwrap();

    assert!(!tempdir.path().join("continuous_a0.1000.art").exists());
    assert!(tempdir.path().join("continuous_a0.2000.art").exists());
    assert!(out.join("continuous_a0.1000.art").exists());
    assert!(out.join("continuous_a0.2000.dat").exists());
    assert!(!out.join("notes.txt").exists());
}

#[test]
fn latest_is_numeric_test() {
    let tempdir = TempDir::new("staging").unwrap();
    create_text_file(tempdir.path(), "halos_a9.0000.list", "");
    create_text_file(tempdir.path(), "halos_a10.000.list", "");

    let plan = plan_staging(tempdir.path(), &ScaleScheme::halo_files(), &REAL_FS).unwrap();

    assert_eq!(Some(ScaleFactor::new("10.000")), plan.latest);
}

#[test]
fn empty_plan_test() {
    let tempdir = TempDir::new("staging").unwrap();

    let plan = plan_staging(tempdir.path(), &ScaleScheme::continuous_outputs(), &REAL_FS).unwrap();

    assert_eq!(StagePlan::default(), plan);
}

#[test]
fn production_dir_test() {
    check_production_dir(Path::new("/scratch/01234/jdoe/art_runs/runs/production")).unwrap();

    assert!(check_production_dir(Path::new("/scratch/01234/jdoe/art_runs/runs/test"))
        .is_err_and(|e| e.root_cause().to_string().contains("production runs")));
    assert!(check_production_dir(Path::new("/home/jdoe/production"))
        .is_err_and(|e| e.root_cause().to_string().contains("Not on scratch")));
}

#[test]
fn halo_analysis_root_test() {
    assert_eq!(
        PathBuf::from("/scratch/01234/art_runs/analysis/production"),
        halo_analysis_root(Path::new("/scratch/01234/jdoe/halos/production")).unwrap()
    );
    assert!(halo_analysis_root(Path::new("/production")).is_err());
}

#[test]
fn job_names_test() {
    assert_eq!(
        "tl_sfe010_hn20",
        job_name_from_runtime_dir("runtime_tl_sfe010_hn20_4567890")
    );
    assert_eq!("", job_name_from_runtime_dir("runtime"));

    assert_eq!(
        Some("tl_sfe010_hn20".to_string()),
        job_name_from_submit("#!/bin/bash\n#SBATCH --job-name=tl_sfe010_hn20\n")
    );
    assert_eq!(None, job_name_from_submit("#!/bin/bash\n"));
}

#[test]
fn stage_runtime_test() {
    let tempdir = TempDir::new("staging").unwrap();
    let dir = tempdir.path();

    let runtime = dir.join("runtime_tl_sfe010_4567890");
    fs::create_dir_all(runtime.join("log")).unwrap();
    fs::create_dir_all(dir.join("runtime_skipped_1").join("log")).unwrap();

    create_text_file(dir, "stdout_tl_sfe010_4567890", "stdout");
    create_text_file(dir, "submit_1.sh", "#SBATCH --job-name=tl_sfe010\n");
    create_text_file(dir, "submit_2.sh", "#SBATCH --job-name=tl_sfe020\n");

    let mut asked = vec![];
    let mut confirm = |question: &str| -> anyhow::Result<bool> {
        asked.push(question.to_string());
        Ok(question.contains("tl_sfe010"))
    };

    assert_eq!(1, stage_runtime(dir, &mut confirm, &REAL_FS).unwrap());
    assert_eq!(2, asked.len());

    assert_eq!(
        "stdout",
        fs::read_to_string(runtime.join("log").join("stdout.full.log")).unwrap()
    );
    assert!(runtime.join("submit_1.sh").exists());
    assert!(dir.join("submit_2.sh").exists());
}

#[test]
fn submit_script_matches_test() {
    let tempdir = TempDir::new("staging").unwrap();
    let dir = tempdir.path();

    assert!(find_submit_script(dir, "tl", &REAL_FS)
        .is_err_and(|e| e.root_cause().to_string().contains("No submit files")));

    create_text_file(dir, "submit_1.sh", "#SBATCH --job-name=tl\n");
    create_text_file(dir, "submit_2.sh", "#SBATCH --job-name=tl\n");

    assert!(find_submit_script(dir, "tl", &REAL_FS)
        .is_err_and(|e| e.root_cause().to_string().contains("Too many")));
}

/// A run directory with two output groups in `working_out`.
fn create_run(production: &Path, name: &str) -> PathBuf {
    let run = production.join(name).join("run");
    let working = run.join("working_out");

    fs::create_dir_all(&working).unwrap();
    fs::create_dir_all(run.join("out")).unwrap();

    create_text_file(&working, "continuous_a0.1000.art", "early");
    create_text_file(&working, "continuous_a0.2000.art", "late");

    run
}

#[test]
fn stage_run_outputs_test() {
    let tempdir = TempDir::new("staging").unwrap();
    let run = create_run(tempdir.path(), "a_run");

    stage_run_outputs(tempdir.path(), &REAL_FS).unwrap();

    assert!(run.join("out").join("continuous_a0.1000.art").exists());
    assert!(run.join("out").join("continuous_a0.2000.art").exists());
    assert!(!run.join("working_out").join("continuous_a0.1000.art").exists());
    assert!(run.join("working_out").join("continuous_a0.2000.art").exists());
}

#[test]
fn full_out_dir_moves_nothing_test() {
    let tempdir = TempDir::new("staging").unwrap();
    let first = create_run(tempdir.path(), "a_run");
    let second = create_run(tempdir.path(), "b_run");
    create_text_file(&second.join("out"), "leftover.art", "");

    assert!(stage_run_outputs(tempdir.path(), &REAL_FS)
        .is_err_and(|e| e.root_cause().to_string().contains("Out directory is not empty")));

    assert!(fs::read_dir(first.join("out")).unwrap().next().is_none());
    assert!(first.join("working_out").join("continuous_a0.1000.art").exists());
}
