use std::fmt::Display;

use anyhow::Context;
use anyhow::Result;
use serde::Deserialize;

use crate::bailc;
use crate::constants::ANVIL_QUEUES;
use crate::constants::FRONTERA_QUEUES;
use crate::constants::PLEIADES_QUEUES;
use crate::constants::SKX_NODE_CPUS;
use crate::constants::STAMPEDE2_QUEUES;

/// The HPC systems runs are set up on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Machine {
    /// NASA Pleiades, PBS/Torque.
    Pleiades,

    /// TACC Stampede2, Slurm.
    Stampede2,

    /// TACC Frontera, Slurm.
    Frontera,

    /// Purdue Anvil, Slurm.
    Anvil,
}

impl Machine {
    /// Guess the machine from the host name of a login node.
    pub fn from_hostname(hostname: &str) -> Option<Machine> {
        if hostname.contains("stampede2") {
            Some(Machine::Stampede2)
        } else if hostname.contains("frontera") {
            Some(Machine::Frontera)
        } else if hostname.contains("anvil") {
            Some(Machine::Anvil)
        } else if hostname.contains("pleiades") || hostname.starts_with("pfe") {
            Some(Machine::Pleiades)
        } else {
            None
        }
    }

    /// The queues (partitions) jobs may be submitted to.
    pub fn queues(&self) -> &'static [&'static str] {
        match self {
            Machine::Pleiades => &PLEIADES_QUEUES,
            Machine::Stampede2 => &STAMPEDE2_QUEUES,
            Machine::Frontera => &FRONTERA_QUEUES,
            Machine::Anvil => &ANVIL_QUEUES,
        }
    }

    /// Cores available on one node of the given partition.
    pub fn node_cpus(&self, partition: &str) -> Result<u64> {
        if partition.contains("skx") {
            return Ok(SKX_NODE_CPUS);
        }

        match self {
            Machine::Stampede2 => Ok(68),
            Machine::Frontera => Ok(56),
            Machine::Anvil => Ok(128),
            Machine::Pleiades => bailc!(
                "Node size depends on the node model", ;
                "Pleiades nodes are selected by model, not by queue", ;
                "Use the torque submission workflow",
            ),
        }
    }
}

/// Cores on a Pleiades node of the given model.
pub fn model_cpus(model: &str) -> Result<u64> {
    match model {
        "bro" => Ok(28),
        other => bailc!(
            "Model not supported yet", ;
            "Unknown node model `{}`", other;
            "Supported models are: bro",
        ),
    }
}

impl Display for Machine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Machine::Pleiades => "pleiades",
            Machine::Stampede2 => "stampede2",
            Machine::Frontera => "frontera",
            Machine::Anvil => "anvil",
        };

        write!(f, "{name}")
    }
}
