// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

#![deny(clippy::all, clippy::pedantic)]

use args::{CmdArgs, Job, Parser, Plan};
use config::{Configuration, IndexMode};
use filter::FilterExpr;
use miette::{IntoDiagnostic, WrapErr};
use patch::{Anchor, PatchError, snippet};
use std::path::Path;
use synth::{CombinedBlocks, NarrowOptions, OverlappingOptions, SimpleOptions, SynthError, narrow};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Run the synthesis of `job`, along with the index discipline its result must follow.
fn synthesize(job: &Job) -> Result<(Configuration, IndexMode), SynthError> {
    match job {
        Job::NonOverlapping { count, options } => Ok((
            synth::assemble_non_overlapping(*count, options)?,
            IndexMode::Exclusive,
        )),
        Job::Overlapping { count } => Ok((
            synth::assemble_overlapping(*count, &OverlappingOptions::default())?,
            IndexMode::Shared,
        )),
        Job::Narrow { count, options } => {
            Ok((narrow::assemble(*count, options)?.config, IndexMode::Shared))
        }
        Job::Experiment { count, experiment } => {
            info!("Running experiment {experiment}");
            Ok((experiment.synthesize(*count)?.config, IndexMode::Shared))
        }
    }
}

fn configure(job: &Job, out: &Path) -> miette::Result<()> {
    let (config, mode) = synthesize(job)
        .into_diagnostic()
        .wrap_err("Failed to synthesize configuration")?;
    config
        .validate(mode)
        .into_diagnostic()
        .wrap_err("Synthesized an inconsistent configuration")?;
    config.write_to(out).into_diagnostic()
}

fn patch_edits(filters: &[FilterExpr]) -> Result<Vec<(Anchor, String)>, PatchError> {
    Ok(vec![
        (Anchor::subscriptions()?, snippet::subscriptions(filters.len())),
        (Anchor::callbacks()?, snippet::callbacks(filters.len())),
        (Anchor::filter_attribute()?, snippet::filter_attribute(filters)),
    ])
}

fn patch_source(count: usize, source: &Path) -> miette::Result<()> {
    let filters = SimpleOptions::ipv4_all_protocols()
        .filters(count)
        .into_diagnostic()
        .wrap_err("Failed to build filters")?;
    let edits = patch_edits(&filters).into_diagnostic()?;
    patch::patch_file(source, &edits)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to patch {}", source.display()))
}

fn run(plan: &Plan) -> miette::Result<()> {
    match plan {
        Plan::Configure { job, out } => configure(job, out),
        Plan::FilterList { count, out } => {
            let list = synth::filter_list(*count, &SimpleOptions::ipv4_all_protocols())
                .into_diagnostic()
                .wrap_err("Failed to build filters")?;
            config::write_text(out, &list).into_diagnostic()?;
            info!("Wrote {count} filters to {}", out.display());
            Ok(())
        }
        Plan::CombinedBlocks { base, count } => {
            let combined = CombinedBlocks::new(*base, *count).into_diagnostic()?;
            println!("{}", combined.expression);
            println!("----");
            println!("{}", combined.literals);
            Ok(())
        }
        Plan::CombinedNarrow { count } => {
            let synthesis = narrow::assemble(*count, &NarrowOptions::default()).into_diagnostic()?;
            println!("\"{}\"", synth::combined_filters(&synthesis.config));
            Ok(())
        }
        Plan::Patch { count, source } => patch_source(*count, source),
        Plan::Sweep { start, end } => {
            for count in synth::powers_of_two(*start, *end) {
                println!("{count}");
            }
            Ok(())
        }
    }
}

fn main() -> miette::Result<()> {
    // a missing .env file is fine
    let _ = dotenvy::dotenv();
    init_logging();
    let args = CmdArgs::parse();
    let plan = args.plan()?;
    run(&plan)
}
