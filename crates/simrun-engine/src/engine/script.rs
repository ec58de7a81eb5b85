//! Batch job script rendering and submission-output parsing.

use std::fmt::Write as _;
use std::path::PathBuf;

use crate::config::types::SchedulerKind;

/// Parameters of one job script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobScript {
    pub scheduler: SchedulerKind,
    pub job_name: String,
    pub nodes: i32,
    pub tasks_per_node: i32,
    pub gpus_per_node: i32,
    pub walltime: String,
    pub partition: Option<String>,
    pub account: Option<String>,
    pub email: Option<String>,
    pub output: PathBuf,
    pub workdir: PathBuf,
    pub binary: PathBuf,
}

impl JobScript {
    /// Render the complete script text.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::from("#!/usr/bin/env bash\n");
        match self.scheduler {
            SchedulerKind::Slurm => self.render_slurm_directives(&mut out),
            SchedulerKind::Pbs => self.render_pbs_directives(&mut out),
        }
        out.push('\n');
        out.push_str("set -euo pipefail\n\n");
        let _ = writeln!(out, "cd {}", shell_quote(&self.workdir.to_string_lossy()));
        let binary = shell_quote(&self.binary.to_string_lossy());
        match self.scheduler {
            SchedulerKind::Slurm => {
                let _ = writeln!(out, "srun {binary}");
            }
            SchedulerKind::Pbs => {
                let ranks = i64::from(self.nodes) * i64::from(self.tasks_per_node);
                let _ = writeln!(out, "mpirun -np {ranks} {binary}");
            }
        }
        out
    }

    fn render_slurm_directives(&self, out: &mut String) {
        let _ = writeln!(out, "#SBATCH --job-name={}", self.job_name);
        let _ = writeln!(out, "#SBATCH --nodes={}", self.nodes);
        let _ = writeln!(out, "#SBATCH --ntasks-per-node={}", self.tasks_per_node);
        if self.gpus_per_node > 0 {
            let _ = writeln!(out, "#SBATCH --gpus-per-node={}", self.gpus_per_node);
        }
        let _ = writeln!(out, "#SBATCH --time={}", self.walltime);
        if let Some(partition) = &self.partition {
            let _ = writeln!(out, "#SBATCH --partition={partition}");
        }
        if let Some(account) = &self.account {
            let _ = writeln!(out, "#SBATCH --account={account}");
        }
        if let Some(email) = &self.email {
            let _ = writeln!(out, "#SBATCH --mail-user={email}");
            out.push_str("#SBATCH --mail-type=END,FAIL\n");
        }
        let _ = writeln!(out, "#SBATCH --output={}", shell_quote(&self.output.to_string_lossy()));
    }

    fn render_pbs_directives(&self, out: &mut String) {
        let _ = writeln!(out, "#PBS -N {}", self.job_name);
        let mut select = format!(
            "#PBS -l nodes={}:ppn={}",
            self.nodes, self.tasks_per_node
        );
        if self.gpus_per_node > 0 {
            let _ = write!(select, ":gpus={}", self.gpus_per_node);
        }
        out.push_str(&select);
        out.push('\n');
        let _ = writeln!(out, "#PBS -l walltime={}", self.walltime);
        if let Some(queue) = &self.partition {
            let _ = writeln!(out, "#PBS -q {queue}");
        }
        if let Some(account) = &self.account {
            let _ = writeln!(out, "#PBS -A {account}");
        }
        if let Some(email) = &self.email {
            let _ = writeln!(out, "#PBS -M {email}");
            out.push_str("#PBS -m ae\n");
        }
        let _ = writeln!(out, "#PBS -o {}", shell_quote(&self.output.to_string_lossy()));
        out.push_str("#PBS -j oe\n");
    }
}

/// Extract the job id from the submission command's standard output.
#[must_use]
pub fn parse_job_id(scheduler: SchedulerKind, stdout: &str) -> Option<String> {
    match scheduler {
        // "Submitted batch job 12345"
        SchedulerKind::Slurm => stdout
            .lines()
            .find_map(|line| line.trim().strip_prefix("Submitted batch job "))
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty()),
        // "12345.pbs-server"
        SchedulerKind::Pbs => stdout.split_whitespace().next().map(str::to_string),
    }
}

fn shell_quote(value: &str) -> String {
    if !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "/._-+:=@".contains(c))
    {
        value.to_string()
    } else {
        format!("'{}'", value.replace('\'', r"'\''"))
    }
}
