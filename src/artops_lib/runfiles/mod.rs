//! The edits made to a simulation's input files before every submission.
//!
//! Each workflow is a fixed list of [Selector]s run through
//! [update_file]. Values that several lines depend on (queue, node model,
//! nodes and ranks per node) are asked once up front and checked for
//! consistency before anything is edited.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use anyhow::Result;
use log::debug;
use log::info;

use crate::bailc;
use crate::config::machine::model_cpus;
use crate::config::machine::Machine;
use crate::editor::answers::normalize;
use crate::editor::answers::Question;
use crate::editor::rewrite::current_value;
use crate::editor::rewrite::parse_select;
use crate::editor::rewrite::token_spans;
use crate::editor::rewrite::NodeLayout;
use crate::editor::rewrite::Rewrite;
use crate::editor::selector::LineMatch;
use crate::editor::update_file;
use crate::editor::validate::check_count;
use crate::editor::validate::check_integer;
use crate::editor::validate::ValueRule;
use crate::editor::AnswerProvider;
use crate::editor::EditOutcome;
use crate::editor::Selector;
use crate::error::ctx;
use crate::file_system::FileOperations;

/// The refinement depth in `defs.h`.
const NUM_LEVELS: &str = "#define num_refinement_levels";

/// Start of the `#PBS` resource request line.
const PBS_SELECT: &str = "#PBS -l select";

/// Timestep controls offered on every run update.
const TIMESTEP_FLOATS: [&str; 6] = [
    "reduce-timestep-factor:deep-decrement",
    "reduce-timestep-factor:shallow-decrement",
    "tolerance-for-timestep-increase",
    "max-timestep-increment",
    "min-timestep-decrement",
    "max-dt-myr",
];

/// Ask one of the up-front questions, keeping `current` on a blank answer.
pub fn ask_upfront(
    answers: &mut dyn AnswerProvider,
    key: &str,
    label: &str,
    current: &str,
    rule: ValueRule,
    fs: &impl FileOperations,
) -> Result<String> {
    let answer = normalize(answers.answer(&Question {
        key: key.to_string(),
        prompt: format!("{label} = {current}"),
        current: current.to_string(),
    })?);

    let value = answer.unwrap_or_else(|| current.to_string());
    rule.check(&value, fs)?;

    Ok(value)
}

/// The current value of a directive, failing if the file has none.
pub fn directive(text: &str, selector: &Selector, path: &Path) -> Result<String> {
    match current_value(text, selector) {
        Some(value) => Ok(value),
        None => bailc!(
            "Directive not found", ;
            "{path:?} has no `{}` line", selector.name;
            "",
        ),
    }
}

/// The resource request of a `#PBS` script, keyed by field.
pub fn pbs_select(text: &str, path: &Path) -> Result<BTreeMap<String, String>> {
    let request = text
        .lines()
        .filter(|line| line.starts_with(PBS_SELECT))
        .last()
        .and_then(|line| token_spans(line).pop().map(|span| &line[span]));

    match request {
        Some(request) => parse_select(request),
        None => bailc!(
            "Directive not found", ;
            "{path:?} has no `{PBS_SELECT}` line", ;
            "",
        ),
    }
}

/// Selectors for `defs.h`.
pub fn defs_selectors() -> Vec<Selector> {
    vec![Selector::prefix(NUM_LEVELS, ValueRule::Integer)]
}

/// Selectors for a run's config file.
pub fn config_selectors() -> Vec<Selector> {
    vec![
        Selector::prefix("directory:outputs", ValueRule::Directory),
        Selector::prefix("snapshot-epochs", ValueRule::Epochs),
        Selector::prefix("auni-stop", ValueRule::Float),
        Selector::prefix("max-dark-matter-level", ValueRule::Integer),
        Selector::prefix("sf:min-level", ValueRule::Integer),
    ]
}

/// Selectors for a slurm submission script, once queue and ranks are known.
pub fn slurm_selectors(
    machine: Machine,
    partition: &str,
    layout: NodeLayout,
    config: &str,
) -> Vec<Selector> {
    vec![
        Selector::prefix_separated("#SBATCH --job-name", "=", ValueRule::Name),
        Selector::prefix_separated("#SBATCH --time", "=", ValueRule::Walltime),
        Selector::prefix_separated("#SBATCH --nodes", "=", ValueRule::Integer),
        Selector::prefix_separated("export REMORA_PERIOD", "=", ValueRule::Integer),
        Selector::prefix_separated("#SBATCH --partition", "=", ValueRule::Queue(machine))
            .with_answer(partition),
        Selector::prefix_separated("#SBATCH --ntasks-per-node", "=", ValueRule::Integer)
            .with_answer(layout.ranks_per_node),
        Selector::prefix_separated("#SBATCH --cpus-per-task", "=", ValueRule::Integer)
            .with_answer(layout.cpus_per_task()),
        Selector::new(
            "cp",
            LineMatch::PrefixContaining {
                prefix: "cp".to_string(),
                token: ".cfg".to_string(),
            },
            ValueRule::Any,
            Rewrite::ConfigCopy {
                config: config.to_string(),
            },
        ),
        Selector::new(
            "ibrun",
            LineMatch::Contains {
                token: "ibrun".to_string(),
            },
            ValueRule::Any,
            Rewrite::Ibrun {
                config: Some(config.to_string()),
            },
        ),
    ]
}

/// Selectors for a PBS submission script, once the resources are known.
pub fn torque_selectors(
    nodes: u64,
    model: &str,
    layout: NodeLayout,
    config: &str,
) -> Vec<Selector> {
    vec![
        Selector::prefix("#PBS -N", ValueRule::Name),
        Selector::prefix_separated("#PBS -l walltime", "=", ValueRule::Walltime),
        Selector::prefix("#PBS -q", ValueRule::Queue(Machine::Pleiades)),
        Selector::new(
            PBS_SELECT,
            LineMatch::Prefix(PBS_SELECT.to_string()),
            ValueRule::Any,
            Rewrite::ResourceSelect {
                nodes,
                model: model.to_string(),
                layout,
            },
        ),
        Selector::new(
            "mpiexec",
            LineMatch::Prefix("mpiexec".to_string()),
            ValueRule::Any,
            Rewrite::Mpiexec {
                nodes,
                layout,
                config: config.to_string(),
            },
        ),
    ]
}

/// A `refinement` line picked by its `id=` token, with one keyed field.
fn refinement_level(name: &str, id: &str, key: &str, level: i64) -> Selector {
    Selector::new(
        name,
        LineMatch::PrefixContaining {
            prefix: "refinement".to_string(),
            token: format!("id={id}"),
        },
        ValueRule::Integer,
        Rewrite::KeyedFields(vec![key.to_string()]),
    )
    .with_answer(level)
}

/// Selectors for `run/config.cfg`, with the levels derived from
/// `num_levels`.
pub fn run_config_selectors(num_levels: i64) -> Vec<Selector> {
    let mut selectors = vec![
        Selector::prefix("auni-stop", ValueRule::Float),
        Selector::prefix("max-dark-matter-level", ValueRule::Integer).with_answer(num_levels - 4),
        Selector::prefix("sf:min-level", ValueRule::Integer).with_answer(num_levels - 3),
        refinement_level("dm-lagrangian", "0", "to-level", num_levels - 4),
        refinement_level("jeans", "8", "from-level", num_levels - 3),
    ];

    for name in TIMESTEP_FLOATS {
        selectors.push(Selector::prefix(name, ValueRule::Float));
    }

    selectors.push(Selector::prefix("time-refinement-factor:max", ValueRule::Integer));
    selectors
}

/// Selectors for `run/submit.sh`.
pub fn run_submit_selectors(
    machine: Machine,
    partition: &str,
    layout: NodeLayout,
    home: &Path,
) -> Vec<Selector> {
    vec![
        Selector::prefix_separated("#SBATCH --partition", "=", ValueRule::Queue(machine))
            .with_answer(partition),
        Selector::prefix_separated("#SBATCH --ntasks-per-node", "=", ValueRule::Integer)
            .with_answer(layout.ranks_per_node),
        Selector::prefix_separated("#SBATCH --cpus-per-task", "=", ValueRule::Integer)
            .with_answer(layout.cpus_per_task()),
        Selector::prefix_separated("#SBATCH --time", "=", ValueRule::Walltime),
        Selector::prefix_separated("#SBATCH --nodes", "=", ValueRule::Integer),
        Selector::new(
            "ibrun",
            LineMatch::Prefix("ibrun ./art".to_string()),
            ValueRule::Any,
            Rewrite::Ibrun { config: None },
        ),
        Selector::prefix_separated("work_dir", "=", ValueRule::Directory)
            .with_answer(home.display()),
    ]
}

/// Ask for the queue and ranks per node of a slurm script and derive the
/// node layout.
pub fn slurm_layout(
    text: &str,
    path: &Path,
    machine: Machine,
    answers: &mut dyn AnswerProvider,
    fs: &impl FileOperations,
) -> Result<(String, NodeLayout)> {
    let queue_rule = ValueRule::Queue(machine);

    let partition = directive(
        text,
        &Selector::prefix_separated("#SBATCH --partition", "=", queue_rule),
        path,
    )?;
    let ranks = directive(
        text,
        &Selector::prefix_separated("#SBATCH --ntasks-per-node", "=", ValueRule::Integer),
        path,
    )?;

    let partition = ask_upfront(answers, "queue", "queue", &partition, queue_rule, fs)?;
    let ranks = ask_upfront(
        answers,
        "ranks-per-node",
        "MPI ranks per node",
        &ranks,
        ValueRule::Any,
        fs,
    )?;

    let layout = NodeLayout::new(check_count(&ranks)?, machine.node_cpus(&partition)?)?;
    debug!("Using {layout:?} on {partition}");

    Ok((partition, layout))
}

/// `update defs`.
pub fn update_defs(
    home: &Path,
    answers: &mut dyn AnswerProvider,
    fs: &impl FileOperations,
) -> Result<EditOutcome> {
    update_file(&home.join("defs.h"), &defs_selectors(), answers, fs)
}

/// `update config`.
pub fn update_config(
    home: &Path,
    run_dir: &Path,
    config_file: &str,
    answers: &mut dyn AnswerProvider,
    fs: &impl FileOperations,
) -> Result<EditOutcome> {
    update_file(&home.join(run_dir).join(config_file), &config_selectors(), answers, fs)
}

/// `update slurm`.
pub fn update_slurm(
    home: &Path,
    run_dir: &Path,
    submit_file: &str,
    config_file: &str,
    machine: Machine,
    answers: &mut dyn AnswerProvider,
    fs: &impl FileOperations,
) -> Result<EditOutcome> {
    let path = home.join(run_dir).join(submit_file);
    let text = fs.read_utf8(&path)?;

    let (partition, layout) = slurm_layout(&text, &path, machine, answers, fs)?;

    update_file(
        &path,
        &slurm_selectors(machine, &partition, layout, config_file),
        answers,
        fs,
    )
}

/// `update torque`.
pub fn update_torque(
    home: &Path,
    run_dir: &Path,
    submit_file: &str,
    config_file: &str,
    answers: &mut dyn AnswerProvider,
    fs: &impl FileOperations,
) -> Result<EditOutcome> {
    let path = home.join(run_dir).join(submit_file);
    let select = pbs_select(&fs.read_utf8(&path)?, &path)?;

    let field = |key: &str| -> Result<String> {
        match select.get(key) {
            Some(value) => Ok(value.clone()),
            None => bailc!(
                "Directive not found", ;
                "The resource request in {path:?} has no `{key}`", ;
                "",
            ),
        }
    };

    let model = ask_upfront(answers, "model", "node model", &field("model")?, ValueRule::Name, fs)?;
    let nodes = ask_upfront(
        answers,
        "nodes",
        "number of nodes",
        &field("select")?,
        ValueRule::Any,
        fs,
    )?;
    let ranks = ask_upfront(
        answers,
        "ranks-per-node",
        "MPI ranks per node",
        &field("mpiprocs")?,
        ValueRule::Any,
        fs,
    )?;

    let nodes = check_count(&nodes)?;
    let layout = NodeLayout::new(check_count(&ranks)?, model_cpus(&model)?)?;
    debug!("Using {nodes} nodes with {layout:?}");

    update_file(
        &path,
        &torque_selectors(nodes, &model, layout, config_file),
        answers,
        fs,
    )
}

/// `update run`: `defs.h`, then `run/config.cfg` with levels derived from
/// the new refinement depth, then `run/submit.sh`.
///
/// In a dry run the refinement depth is read from the unchanged `defs.h`.
pub fn update_run(
    home: &Path,
    machine: Machine,
    answers: &mut dyn AnswerProvider,
    fs: &impl FileOperations,
) -> Result<()> {
    let defs = home.join("defs.h");
    update_file(&defs, &defs_selectors(), answers, fs)?;

    let levels = directive(&fs.read_utf8(&defs)?, &defs_selectors()[0], &defs)?;
    let levels = check_integer(&levels).with_context(ctx!(
      "Could not read the refinement depth from {defs:?}", ;
      "",
    ))?;
    info!("Deriving levels from {levels} refinement levels");

    let run = home.join("run");
    update_file(&run.join("config.cfg"), &run_config_selectors(levels), answers, fs)?;

    let submit = run.join("submit.sh");
    let text = fs.read_utf8(&submit)?;
    let (partition, layout) = slurm_layout(&text, &submit, machine, answers, fs)?;

    update_file(
        &submit,
        &run_submit_selectors(machine, &partition, layout, home),
        answers,
        fs,
    )?;

    Ok(())
}

#[cfg(test)]
#[path = "tests/mod.rs"]
mod tests;
