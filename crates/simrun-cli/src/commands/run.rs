use anyhow::Result;

use simrun_engine::{CaseFileLoader, Console, EngineRegistry, RunOrchestrator, RunReport};

use crate::options::JobArgs;

/// Execute the `run` command: validate, then build and dispatch every target.
pub fn execute(args: &JobArgs) -> Result<()> {
    let job = args.resolve()?;
    let registry = EngineRegistry::builtin(&job.settings);
    let builder = job.builder();
    let console = Console::stdout();

    let orchestrator =
        RunOrchestrator::new(&registry, &CaseFileLoader, builder.as_ref(), &console);
    let report = orchestrator.run(&job.request)?;

    if let RunReport::Completed { engine, dispatched } = report {
        println!();
        println!(
            "Job '{}' finished on the {engine} engine.",
            job.request.job_name
        );
        for (target, outcome) in &dispatched {
            println!("  {target:18} {outcome}");
        }
    }

    Ok(())
}
