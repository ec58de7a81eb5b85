use anyhow::Result;

use simrun_engine::config::types::EngineSettings;
use simrun_engine::EngineRegistry;

/// Execute the `engines` command: list registered execution engines.
pub fn execute() -> Result<()> {
    let registry = EngineRegistry::builtin(&EngineSettings::default());
    for name in registry.names() {
        let summary = match name {
            "local" => "run targets on this machine, optionally through an MPI launcher",
            "batch" => "submit one job script per target to SLURM or PBS",
            _ => "",
        };
        println!("  {name:8} {summary}");
    }
    Ok(())
}
