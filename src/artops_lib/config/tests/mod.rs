use std::path::PathBuf;

use tempdir::TempDir;

use super::machine::model_cpus;
use super::machine::Machine;
use super::*;
use crate::test_utils::create_text_file;
use crate::test_utils::REAL_FS;

#[test]
fn missing_file_gives_defaults_test() {
    let dir = TempDir::new("config_folder").unwrap();

    let config = Config::from_file(&dir.path().join("artops.toml"), &REAL_FS).unwrap();

    assert_eq!(Config::default(), config);
    assert_eq!(300_000_000_000, config.archive.max_size);
    assert_eq!(Some("art".to_string()), config.archive.anchor_extension);
    assert_eq!("globus", config.transfer.command);
}

#[test]
fn all_values_test() {
    let dir = TempDir::new("config_folder").unwrap();
    let path = create_text_file(
        dir.path(),
        "artops.toml",
        r#"
machine = "frontera"
username = "jdoe"
scratch = "/scratch1/01234/jdoe"

[archive]
max_size = 1000
remote_root = "/archive/projects/p1"
host_env = "ARCHIVE_HOST"
anchor_extension = "dat"

[transfer]
command = "/usr/local/bin/globus"
home_alias = "/home/"

[dt_history]
script = "python plot.py"
destination = "laptop"
"#,
    );

    let config = Config::from_file(&path, &REAL_FS).unwrap();

    assert_eq!(Some(Machine::Frontera), config.machine);
    assert_eq!("jdoe", config.username().unwrap());
    assert_eq!(
        PathBuf::from("/scratch1/01234/jdoe"),
        config.scratch().unwrap()
    );
    assert_eq!(1000, config.archive.max_size);
    assert_eq!(PathBuf::from("/archive/projects/p1"), config.archive.remote_root);
    assert_eq!("ARCHIVE_HOST", config.archive.host_env);
    assert_eq!(Some("dat".to_string()), config.archive.anchor_extension);
    assert_eq!("/usr/local/bin/globus", config.transfer.command);
    assert_eq!("/home/", config.transfer.home_alias);
    assert_eq!("python plot.py", config.dt_history.script);
    assert_eq!("laptop", config.dt_history.destination);
}

#[test]
fn partial_section_test() {
    let dir = TempDir::new("config_folder").unwrap();
    let path = create_text_file(dir.path(), "artops.toml", "[archive]\nmax_size = 5\n");

    let config = Config::from_file(&path, &REAL_FS).unwrap();

    assert_eq!(5, config.archive.max_size);
    assert_eq!("ARCHIVER", config.archive.host_env);
    assert_eq!(DtHistoryConfig::default(), config.dt_history);
}

#[test]
fn unknown_key_test() {
    let dir = TempDir::new("config_folder").unwrap();
    let path = create_text_file(dir.path(), "artops.toml", "[archive]\nmax_sise = 5\n");

    assert!(Config::from_file(&path, &REAL_FS).is_err());
}

#[test]
fn scratch_required_test() {
    assert!(Config::default()
        .scratch()
        .is_err_and(|e| e.root_cause().to_string().contains("No scratch directory")));
}

#[test]
fn machine_test() {
    assert_eq!(
        Some(Machine::Stampede2),
        Machine::from_hostname("login1.stampede2.tacc.utexas.edu")
    );
    assert_eq!(
        Some(Machine::Frontera),
        Machine::from_hostname("login3.frontera.tacc.utexas.edu")
    );
    assert_eq!(Some(Machine::Anvil), Machine::from_hostname("login05.anvil.rcac.purdue.edu"));
    assert_eq!(Some(Machine::Pleiades), Machine::from_hostname("pfe21"));
    assert_eq!(None, Machine::from_hostname("macbook.local"));

    assert_eq!(48, Machine::Stampede2.node_cpus("skx-normal").unwrap());
    assert_eq!(68, Machine::Stampede2.node_cpus("normal").unwrap());
    assert_eq!(56, Machine::Frontera.node_cpus("normal").unwrap());
    assert_eq!(128, Machine::Anvil.node_cpus("wide").unwrap());
    assert!(Machine::Pleiades.node_cpus("long").is_err());

    assert_eq!(28, model_cpus("bro").unwrap());
    assert!(model_cpus("has").is_err());
}
