use super::args::{Cli, Command, PhasesArgs, SeedArgs, SeedOpts, ShuffleArgs};
use crate::exit_codes;
use anyhow::Context;
use randomly_core::{
    FileSeedCache, RandomlyConfig, RandomlyPlugin, ReseedError, SeedCache, TestItem,
};
use std::fs;
use tracing::debug;

pub fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Seed(args) => cmd_seed(args),
        Command::Shuffle(args) => cmd_shuffle(args),
        Command::Phases(args) => cmd_phases(args),
    }
}

fn build_plugin(opts: &SeedOpts, reset_seed: bool, reorganize: bool) -> RandomlyPlugin {
    let cache = opts.cache_dir.as_ref().map(FileSeedCache::new);
    let plugin = RandomlyPlugin::configure(
        RandomlyConfig {
            requested: opts.seed,
            reset_seed,
            reorganize,
        },
        opts.worker_seed,
        cache.as_ref().map(|c| c as &dyn SeedCache),
    );
    debug!(seed = plugin.seed(), "configured run");
    plugin
}

fn cmd_seed(args: SeedArgs) -> anyhow::Result<i32> {
    let plugin = build_plugin(&args.seed, true, true);
    match plugin.report_header() {
        Ok(header) => println!("{header}"),
        Err(e) => return callback_failure(&e),
    }
    Ok(exit_codes::SUCCESS)
}

fn cmd_shuffle(args: ShuffleArgs) -> anyhow::Result<i32> {
    let plugin = build_plugin(&args.seed, !args.dont_reset_seed, !args.dont_reorganize);

    let raw = fs::read_to_string(&args.manifest)
        .with_context(|| format!("reading manifest {}", args.manifest.display()))?;
    let items: Vec<TestItem> = serde_json::from_str(&raw)
        .with_context(|| format!("parsing manifest {}", args.manifest.display()))?;

    let header = match plugin.report_header() {
        Ok(header) => header,
        Err(e) => return callback_failure(&e),
    };
    println!("{header}");

    let ordered = match plugin.collection_modifyitems(items) {
        Ok(ordered) => ordered,
        Err(e) => return callback_failure(&e),
    };
    for item in &ordered {
        println!("{}", item.id);
    }
    Ok(exit_codes::SUCCESS)
}

fn cmd_phases(args: PhasesArgs) -> anyhow::Result<i32> {
    let plugin = build_plugin(&args.seed, true, true);
    println!("Using --randomly-seed={}", plugin.seed());
    for node_id in &args.node_ids {
        let phases = plugin
            .runtest_setup(node_id)
            .and_then(|setup| {
                let call = plugin.runtest_call(node_id)?;
                let teardown = plugin.runtest_teardown(node_id)?;
                Ok((setup, call, teardown))
            });
        match phases {
            Ok((Some(setup), Some(call), Some(teardown))) => {
                println!("{node_id} setup={setup} call={call} teardown={teardown}");
            }
            Ok(_) => println!("{node_id} (reseeding disabled)"),
            Err(e) => return callback_failure(&e),
        }
    }
    Ok(exit_codes::SUCCESS)
}

fn callback_failure(e: &ReseedError) -> anyhow::Result<i32> {
    eprintln!("error: {e}");
    Ok(exit_codes::RUN_FAILED)
}
