use std::collections::BTreeSet;
use std::ffi::OsStr;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use anyhow::anyhow;
use anyhow::Context;
use anyhow::Result;
use glob::glob;
use glob::Pattern;
use log::debug;
use log::info;

use crate::archive::list_output_files;
use crate::bailc;
use crate::constants::PRODUCTION_DIR;
use crate::error::ctx;
use crate::file_system::FileOperations;
use crate::scale::ScaleFactor;
use crate::scale::ScaleScheme;

/// What happens to one staged file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageAction {
    /// Moved away.
    Move,

    /// Copied, the original stays for the next restart.
    Copy,
}

/// One file to stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageStep {
    /// The file name, the same in the source and target directory.
    pub name: String,

    /// See [StageAction].
    pub action: StageAction,
}

/// How the outputs of one directory are staged.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StagePlan {
    /// The numerically latest scale factor.
    pub latest: Option<ScaleFactor>,

    /// How many distinct scale factors were found.
    pub groups: usize,

    /// Sorted by file name.
    pub steps: Vec<StageStep>,
}

/// Plan staging of the files in `dir`.
///
/// Every file is moved except those of the latest scale factor, which are
/// copied so the next run can restart from them.
pub fn plan_staging(
    dir: &Path,
    scheme: &ScaleScheme,
    fs: &impl FileOperations,
) -> Result<StagePlan> {
    let files = list_output_files(dir, scheme, None, fs)?;

    let latest = files
        .iter()
        .map(|f| &f.scale)
        .max_by(|a, b| a.cmp_value(b))
        .cloned();

    let groups = files.iter().map(|f| &f.scale).collect::<BTreeSet<_>>().len();

    let steps = files
        .into_iter()
        .map(|f| StageStep {
            action: if Some(&f.scale) == latest.as_ref() {
                StageAction::Copy
            } else {
                StageAction::Move
            },
            name: f.name,
        })
        .collect();

    Ok(StagePlan {
        latest,
        groups,
        steps,
    })
}

/// Carry out `plan` from `source` into `target`.
pub fn execute_plan(
    plan: &StagePlan,
    source: &Path,
    target: &Path,
    fs: &impl FileOperations,
) -> Result<()> {
    for step in &plan.steps {
        let from = source.join(&step.name);
        let to = target.join(&step.name);

        match step.action {
            StageAction::Move => fs.move_file(&from, &to)?,
            StageAction::Copy => fs.copy_file(&from, &to)?,
        }
    }

    Ok(())
}

/// Check that `dir` is a `production` directory on scratch.
pub fn check_production_dir(dir: &Path) -> Result<()> {
    if dir.file_name() != Some(OsStr::new(PRODUCTION_DIR)) {
        bailc!(
            "Only works for production runs", ;
            "{dir:?} is not a `{PRODUCTION_DIR}` directory", ;
            "cd into the directory holding the production runs",
        );
    }

    let mut components = dir.components();

    if components.next() != Some(Component::RootDir)
        || components.next() != Some(Component::Normal("scratch".as_ref()))
    {
        bailc!(
            "Not on scratch", ;
            "{dir:?} is not below /scratch", ;
            "",
        );
    }

    Ok(())
}

/// The run directories of a production directory.
pub fn run_dirs(production: &Path, fs: &impl FileOperations) -> Result<Vec<PathBuf>> {
    Ok(fs
        .list_dir(production)?
        .into_iter()
        .filter(|p| p.is_dir())
        .collect())
}

/// `stage outputs`: for every run, move `run/working_out` into `run/out`,
/// keeping the latest output in place.
///
/// Runs whose outputs hold a single scale factor did not progress and are
/// skipped.
pub fn stage_outputs(production: &Path, fs: &impl FileOperations) -> Result<()> {
    check_production_dir(production)?;
    stage_run_outputs(production, fs)
}

/// Stage the outputs of every run in `production`.
///
/// Every run is checked and planned before anything is moved.
pub fn stage_run_outputs(production: &Path, fs: &impl FileOperations) -> Result<()> {
    let mut plans = vec![];

    for run in run_dirs(production, fs)? {
        let out = run.join("run").join("out");
        let working = run.join("run").join("working_out");
        let name = run.file_name().unwrap_or_default().to_string_lossy();

        if !fs.list_dir(&out)?.is_empty() {
            bailc!(
                "Out directory is not empty", ;
                "{out:?} of {} already holds files", name;
                "Archive or remove them first, nothing was moved",
            );
        }

        let plan = plan_staging(&working, &ScaleScheme::continuous_outputs(), fs)?;

        match &plan.latest {
            Some(latest) => info!("Last output for {name} at a = {latest}"),
            None => info!("No outputs for {name}"),
        }

        if plan.groups <= 1 {
            debug!("{name} did not progress, nothing to stage");
            continue;
        }

        plans.push((plan, working, out));
    }

    for (plan, working, out) in &plans {
        execute_plan(plan, working, out, fs)?;
    }

    Ok(())
}

/// Where the halos of a production directory are analysed:
/// `<scratch>/art_runs/analysis/production`.
pub fn halo_analysis_root(production: &Path) -> Result<PathBuf> {
    match production.ancestors().nth(3) {
        Some(scratch) => Ok(scratch.join("art_runs").join("analysis").join(PRODUCTION_DIR)),
        None => bailc!(
            "Not on scratch", ;
            "{production:?} is too shallow to find the scratch directory", ;
            "",
        ),
    }
}

/// `stage halos`: move every run's `run/halos` into the analysis tree,
/// keeping the latest halos in place.
pub fn stage_halos(production: &Path, fs: &impl FileOperations) -> Result<()> {
    check_production_dir(production)?;
    let analysis = halo_analysis_root(production)?;

    for run in run_dirs(production, fs)? {
        let Some(name) = run.file_name() else {
            continue;
        };

        let halos = run.join("run").join("halos");
        let target = analysis.join(name).join("run").join("halos");

        let plan = plan_staging(&halos, &ScaleScheme::halo_files(), fs)?;
        info!(
            "Staging {} halo files of {name:?} into {target:?}",
            plan.steps.len()
        );

        fs.create_dir_all(&target)?;
        execute_plan(&plan, &halos, &target, fs)?;
    }

    Ok(())
}

/// The job name encoded in a runtime directory name,
/// `runtime_<job name>_<job id>`.
pub fn job_name_from_runtime_dir(dir_name: &str) -> String {
    let base = dir_name.replacen("runtime_", "", 1);

    match base.rsplit_once('_') {
        Some((name, _)) => name.to_string(),
        None => String::new(),
    }
}

/// The `#SBATCH --job-name` of a submission script.
pub fn job_name_from_submit(text: &str) -> Option<String> {
    text.lines()
        .find(|line| line.starts_with("#SBATCH --job-name"))
        .and_then(|line| line.trim().rsplit('=').next())
        .map(str::to_string)
}

/// The one `submit_*.sh` in `dir` for `job_name`.
pub fn find_submit_script(dir: &Path, job_name: &str, fs: &impl FileOperations) -> Result<PathBuf> {
    let Some(dir_str) = dir.to_str() else {
        bailc!(
            "Path is not valid UTF-8", ;
            "Could not search {dir:?} for submission scripts", ;
            "",
        );
    };

    let pattern = format!("{}/submit_*.sh", Pattern::escape(dir_str));
    let mut matches = vec![];

    for path in glob(&pattern).map_err(|e| anyhow!("could not expand {pattern}: {e}"))? {
        let path = path.with_context(ctx!(
          "Could not read an entry while searching {dir:?}", ;
          "",
        ))?;

        if job_name_from_submit(&fs.read_utf8(&path)?).as_deref() == Some(job_name) {
            matches.push(path);
        }
    }

    match matches.len() {
        1 => Ok(matches.remove(0)),
        0 => bailc!(
            "No submit files found", ;
            "No submit_*.sh in {dir:?} has the job name `{}`", job_name;
            "",
        ),
        n => bailc!(
            "Too many submit files found", ;
            "{n} submit_*.sh files in {dir:?} have the job name `{}`", job_name;
            "Remove the stale copies",
        ),
    }
}

/// `stage runtime`: move the stdout file and the submission script of
/// every confirmed `runtime*` directory into it.
///
/// Returns the number of directories handled.
pub fn stage_runtime(
    dir: &Path,
    confirm: &mut dyn FnMut(&str) -> Result<bool>,
    fs: &impl FileOperations,
) -> Result<usize> {
    let mut handled = 0;

    for runtime in fs.list_dir(dir)? {
        let Some(name) = runtime.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        if !name.starts_with("runtime") || !runtime.is_dir() {
            continue;
        }

        if !confirm(&format!("Handle {name}?"))? {
            continue;
        }

        let submit = find_submit_script(dir, &job_name_from_runtime_dir(name), fs)?;

        let stdout = dir.join(name.replacen("runtime_", "stdout_", 1));
        fs.move_file(&stdout, &runtime.join("log").join("stdout.full.log"))?;

        if let Some(file_name) = submit.file_name() {
            fs.move_file(&submit, &runtime.join(file_name))?;
        }

        handled += 1;
    }

    Ok(handled)
}

#[cfg(test)]
#[path = "tests/mod.rs"]
mod tests;
