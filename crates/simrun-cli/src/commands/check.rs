use anyhow::Result;

use simrun_engine::{
    CaseFileLoader, CheckReport, Console, EngineRegistry, PrebuiltBuilder, RunOrchestrator,
};

use crate::options::JobArgs;

/// Execute the `check` command: validate job options without building or dispatching.
pub fn execute(args: &JobArgs) -> Result<()> {
    let job = args.resolve()?;
    let registry = EngineRegistry::builtin(&job.settings);
    let console = Console::stdout();

    let orchestrator =
        RunOrchestrator::new(&registry, &CaseFileLoader, &PrebuiltBuilder, &console);
    match orchestrator.check(&job.request)? {
        CheckReport::NoTargets => println!("\nNothing to check."),
        CheckReport::Valid { engine, .. } => {
            println!("\nAll checks passed for the {engine} engine.");
        }
    }
    Ok(())
}
