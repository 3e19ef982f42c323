use std::fs;
use std::path::Path;

use tempdir::TempDir;

use super::*;
use crate::editor::answers::AnswerMap;
use crate::editor::answers::FixedAnswers;
use crate::test_utils::create_text_file;
use crate::test_utils::REAL_FS;

const SLURM: &str = "\
#!/bin/bash
#SBATCH --job-name=tl_sfe010
#SBATCH --partition=normal
#SBATCH --nodes=4
#SBATCH --ntasks-per-node=28
#SBATCH --cpus-per-task=2
#SBATCH --time=48:00:00
export REMORA_PERIOD=60
cp $WORK/configs/old.cfg old.cfg
remora ibrun ./art old.cfg -r=0.1 > log.txt
";

const TORQUE: &str = "\
#PBS -N tl_sfe010
#PBS -l walltime=8:00:00
#PBS -q long
#PBS -l select=4:ncpus=28:mpiprocs=28:model=bro
mpiexec -np 112 dplace -s1 -n28 -t1 ./art -config old.cfg -r=0.5 > log
";

fn run_dir(home: &Path) -> &Path {
    fs::create_dir_all(home.join("run")).unwrap();
    Path::new("run")
}

#[test]
fn update_defs_test() {
    let home = TempDir::new("home").unwrap();
    let defs = create_text_file(
        home.path(),
        "defs.h",
        "#define num_refinement_levels 8\n#define num_grid 256\n",
    );

    let mut answers = FixedAnswers::new(["9"]);

    assert_eq!(
        EditOutcome::Replaced,
        update_defs(home.path(), &mut answers, &REAL_FS).unwrap()
    );
    assert_eq!(
        "#define num_refinement_levels 9\n#define num_grid 256\n",
        fs::read_to_string(defs).unwrap()
    );
    assert_eq!(1, answers.asked.len());
}

#[test]
fn update_config_test() {
    let home = TempDir::new("home").unwrap();
    let run = run_dir(home.path());
    let outputs = home.path().join("out");

    let path = create_text_file(
        &home.path().join(run),
        "tl.cfg",
        &format!(
            "directory:outputs {}\nauni-stop 1.0\nsnapshot-epochs (0.1,1.0,0.05)\n",
            outputs.display()
        ),
    );

    let mut answers = AnswerMap::new().with("auni-stop", "0.25");

    update_config(home.path(), run, "tl.cfg", &mut answers, &REAL_FS).unwrap();

    assert!(outputs.is_dir());
    assert!(fs::read_to_string(path)
        .unwrap()
        .contains("auni-stop 0.25\n"));
}

#[test]
fn update_slurm_test() {
    let home = TempDir::new("home").unwrap();
    let run = run_dir(home.path());
    let path = create_text_file(&home.path().join(run), "submit.sh", SLURM);

    let mut answers = AnswerMap::new()
        .with("ranks-per-node", 14)
        .with("#SBATCH --time", "24:00:00")
        .with("ibrun", 0.2);

    update_slurm(
        home.path(),
        run,
        "submit.sh",
        "new.cfg",
        Machine::Frontera,
        &mut answers,
        &REAL_FS,
    )
    .unwrap();

    assert_eq!(
        "\
#!/bin/bash
#SBATCH --job-name=tl_sfe010
#SBATCH --partition=normal
#SBATCH --nodes=4
#SBATCH --ntasks-per-node=14
#SBATCH --cpus-per-task=4
#SBATCH --time=24:00:00
export REMORA_PERIOD=60
cp $WORK/configs/new.cfg new.cfg
remora ibrun ./art new.cfg -r=0.2 > log.txt
",
        fs::read_to_string(path).unwrap()
    );
}

#[test]
fn slurm_uneven_ranks_test() {
    let home = TempDir::new("home").unwrap();
    let run = run_dir(home.path());
    let path = create_text_file(&home.path().join(run), "submit.sh", SLURM);

    let mut answers = AnswerMap::new().with("ranks-per-node", 5);

    assert!(update_slurm(
        home.path(),
        run,
        "submit.sh",
        "new.cfg",
        Machine::Frontera,
        &mut answers,
        &REAL_FS,
    )
    .is_err_and(|e| e.root_cause().to_string().contains("Uneven")));
    assert_eq!(SLURM, fs::read_to_string(path).unwrap());
}

#[test]
fn slurm_bad_queue_test() {
    let home = TempDir::new("home").unwrap();
    let run = run_dir(home.path());
    create_text_file(&home.path().join(run), "submit.sh", SLURM);

    let mut answers = AnswerMap::new().with("queue", "skx-normal");

    assert!(update_slurm(
        home.path(),
        run,
        "submit.sh",
        "new.cfg",
        Machine::Anvil,
        &mut answers,
        &REAL_FS,
    )
    .is_err());
}

#[test]
fn missing_directive_test() {
    let home = TempDir::new("home").unwrap();
    let run = run_dir(home.path());
    create_text_file(&home.path().join(run), "submit.sh", "#SBATCH --nodes=4\n");

    assert!(update_slurm(
        home.path(),
        run,
        "submit.sh",
        "new.cfg",
        Machine::Frontera,
        &mut AnswerMap::new(),
        &REAL_FS,
    )
    .is_err_and(|e| e.root_cause().to_string().contains("Directive not found")));
}

#[test]
fn update_torque_test() {
    let home = TempDir::new("home").unwrap();
    let run = run_dir(home.path());
    let path = create_text_file(&home.path().join(run), "submit.pbs", TORQUE);

    let mut answers = AnswerMap::new()
        .with("nodes", 10)
        .with("ranks-per-node", 14)
        .with("mpiexec", "-r=0.6");

    update_torque(home.path(), run, "submit.pbs", "new.cfg", &mut answers, &REAL_FS).unwrap();

    assert_eq!(
        "\
#PBS -N tl_sfe010
#PBS -l walltime=8:00:00
#PBS -q long
#PBS -l select=10:ncpus=28:mpiprocs=14:model=bro
mpiexec -np 140 dplace -s1 -n14 -t2 ./art -config new.cfg -r=0.6 > log
",
        fs::read_to_string(path).unwrap()
    );
}

#[test]
fn torque_unknown_model_test() {
    let home = TempDir::new("home").unwrap();
    let run = run_dir(home.path());
    create_text_file(&home.path().join(run), "submit.pbs", TORQUE);

    let mut answers = AnswerMap::new().with("model", "has");

    assert!(
        update_torque(home.path(), run, "submit.pbs", "new.cfg", &mut answers, &REAL_FS)
            .is_err_and(|e| e.root_cause().to_string().contains("Model not supported"))
    );
}

#[test]
fn update_run_test() {
    let home = TempDir::new("home").unwrap();
    run_dir(home.path());

    create_text_file(home.path(), "defs.h", "#define num_refinement_levels 8\n");
    let config = create_text_file(
        &home.path().join("run"),
        "config.cfg",
        "\
auni-stop 1.0
max-dark-matter-level 4
sf:min-level 5
refinement id=0 weight=1 from-level=0 to-level=4 0.5
refinement id=8 weight=1 from-level=5 to-level=10 0.5
max-dt-myr 1.0
",
    );
    let submit = create_text_file(
        &home.path().join("run"),
        "submit.sh",
        "\
#SBATCH --partition=skx-normal
#SBATCH --ntasks-per-node=48
#SBATCH --cpus-per-task=1
#SBATCH --time=48:00:00
#SBATCH --nodes=4
work_dir=/old/home
ibrun ./art config.cfg -r=0.1
",
    );

    let mut answers = AnswerMap::new()
        .with("#define num_refinement_levels", 10)
        .with("ranks-per-node", 24)
        .with("ibrun", 0.3);

    update_run(home.path(), Machine::Stampede2, &mut answers, &REAL_FS).unwrap();

    assert_eq!(
        "\
auni-stop 1.0
max-dark-matter-level 6
sf:min-level 7
refinement id=0 weight=1 from-level=0 to-level=6 0.5
refinement id=8 weight=1 from-level=7 to-level=10 0.5
max-dt-myr 1.0
",
        fs::read_to_string(config).unwrap()
    );

    assert_eq!(
        format!(
            "\
#SBATCH --partition=skx-normal
#SBATCH --ntasks-per-node=24
#SBATCH --cpus-per-task=2
#SBATCH --time=48:00:00
#SBATCH --nodes=4
work_dir={}
ibrun ./art config.cfg -r=0.3
",
            home.path().display()
        ),
        fs::read_to_string(submit).unwrap()
    );
}

#[test]
fn pbs_select_test() {
    let select = pbs_select(TORQUE, Path::new("submit.pbs")).unwrap();

    assert_eq!(Some(&"4".to_string()), select.get("select"));
    assert_eq!(Some(&"bro".to_string()), select.get("model"));
    assert!(pbs_select("#PBS -q long\n", Path::new("submit.pbs")).is_err());
}
