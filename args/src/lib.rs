// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Command line of the subscription generator, and its resolution into a [`Plan`].

#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

pub use clap::Parser;
use clap::Subcommand;

use addrspace::{AddressBlock, InvalidPrefixLen, PrefixLen};
use std::path::PathBuf;
use std::str::FromStr;
use synth::{Experiment, ExperimentName, NarrowOptions, SimpleOptions};
use tracing::debug;

/// Where the filter list lands, relative to the engine checkout
pub const FILTER_LIST_PATH: &str = "examples/benchmark/filter_strs.txt";
/// The source file patched by default, relative to the engine checkout
pub const PATCH_SOURCE_PATH: &str = "examples/basic/src/main.rs";

/// Errors resulting from incomplete or inconsistent command lines
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum ArgsError {
    #[error("Missing configuration: set ${var} or pass --{flag}")]
    MissingConfiguration {
        var: &'static str,
        flag: &'static str,
    },
    #[error(transparent)]
    InvalidPrefixLen(#[from] InvalidPrefixLen),
    #[error("Experiment {0} requires --prefix")]
    MissingPrefix(ExperimentName),
}

#[derive(Parser, Debug)]
#[command(name = "subgen")]
#[command(
    about = "Generate subscription configurations for a traffic monitoring engine",
    long_about = None
)]
pub struct CmdArgs {
    #[arg(
        long,
        env = "IN_FILE",
        value_name = "PATH",
        global = true,
        help = "File receiving the generated output (overwritten)"
    )]
    out: Option<PathBuf>,

    #[arg(
        long,
        env = "RETINA_HOME",
        value_name = "DIR",
        global = true,
        help = "Checkout of the monitoring engine, used to locate default paths"
    )]
    home: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Shard the address space evenly: one `addr = <block>` filter per subscription
    Simple {
        #[arg(
            short = 'n',
            long,
            default_value_t = 2,
            help = "Number of subscriptions (a power of two)"
        )]
        count: usize,
    },
    /// Shard the address space evenly, matching http, tls and dns only
    Ipv4 {
        #[arg(
            short = 'n',
            long,
            default_value_t = 2,
            help = "Number of subscriptions (a power of two)"
        )]
        count: usize,
    },
    /// Shard the address space by destination, into 2^PREFIX_LEN subscriptions
    DstSharded {
        #[arg(
            long,
            default_value_t = 0,
            value_parser = clap::value_parser!(u8).range(0..=32),
            help = "Length of the destination prefixes"
        )]
        prefix_len: u8,
    },
    /// Stack every subscription on the same filter
    Overlapping {
        #[arg(short = 'n', long, default_value_t = 50, help = "Number of subscriptions")]
        count: usize,
    },
    /// Mix protocol filters with client and server address filters
    Narrow {
        #[arg(short = 'n', long, default_value_t = 50, help = "Number of subscriptions")]
        count: usize,
        #[arg(long, help = "Enumerate decoy address ranges around narrow matches")]
        narrow: bool,
        #[arg(long, help = "Include the HTTP filters")]
        http: bool,
        #[arg(
            long,
            value_name = "LEN",
            value_parser = clap::value_parser!(u8).range(0..=32),
            help = "Match <base>/LEN instead of a single host in narrow mode"
        )]
        ip_prefix: Option<u8>,
    },
    /// Run one of the named experiment setups
    Experiment {
        #[arg(value_parser = ExperimentName::from_str, help = "Experiment name")]
        name: ExperimentName,
        #[arg(short = 'n', long, default_value_t = 50, help = "Number of subscriptions")]
        count: usize,
        #[arg(
            long,
            value_name = "LEN",
            value_parser = clap::value_parser!(u8).range(0..=32),
            help = "Prefix length of the narrow matches (non-overlapping-narrowish)"
        )]
        prefix: Option<u8>,
        #[arg(long, help = "Include the HTTP filters (non-overlapping-narrowish)")]
        http: bool,
    },
    /// Write one filter per block, one per line
    FilterList {
        #[arg(short = 'n', long, default_value_t = 2, help = "Number of filters (a power of two)")]
        count: usize,
    },
    /// Print the blocks of a partition as a single filter and as Rust literals
    Combined {
        #[arg(
            long,
            default_value_t = 2,
            value_parser = clap::value_parser!(u8).range(0..=32),
            help = "Length of the prefixes"
        )]
        prefix_len: u8,
        #[arg(
            long,
            value_name = "COUNT",
            conflicts_with = "prefix_len",
            help = "Print the filters of a narrow configuration of COUNT subscriptions instead"
        )]
        narrow: Option<usize>,
    },
    /// Inject subscriptions, callbacks and filters in a source file
    Patch {
        #[arg(
            short = 'n',
            long,
            default_value_t = 2,
            help = "Number of subscriptions (a power of two)"
        )]
        count: usize,
        #[arg(long, value_name = "PATH", help = "Source file to patch")]
        source: Option<PathBuf>,
    },
    /// List the subscription counts of a sweep: the powers of two between START and END
    Sweep {
        #[arg(long, default_value_t = 2)]
        start: usize,
        #[arg(long, default_value_t = 256)]
        end: usize,
    },
}

/// A synthesis producing a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Job {
    NonOverlapping {
        count: usize,
        options: SimpleOptions,
    },
    Overlapping {
        count: usize,
    },
    Narrow {
        count: usize,
        options: NarrowOptions,
    },
    Experiment {
        count: usize,
        experiment: Experiment,
    },
}

/// What to do, with every path resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    Configure { job: Job, out: PathBuf },
    FilterList { count: usize, out: PathBuf },
    CombinedBlocks { base: AddressBlock, count: usize },
    CombinedNarrow { count: usize },
    Patch { count: usize, source: PathBuf },
    Sweep { start: usize, end: usize },
}

impl CmdArgs {
    #[must_use]
    pub fn command(&self) -> &Command {
        &self.command
    }

    fn out(&self) -> Result<PathBuf, ArgsError> {
        self.out.clone().ok_or(ArgsError::MissingConfiguration {
            var: "IN_FILE",
            flag: "out",
        })
    }

    fn under_home(&self, relative: &str) -> Result<PathBuf, ArgsError> {
        self.home
            .as_deref()
            .map(|home| home.join(relative))
            .ok_or(ArgsError::MissingConfiguration {
                var: "RETINA_HOME",
                flag: "home",
            })
    }

    fn configure(&self, job: Job) -> Result<Plan, ArgsError> {
        Ok(Plan::Configure {
            job,
            out: self.out()?,
        })
    }

    /// Resolve the command line into a plan.
    ///
    /// Paths are resolved first: nothing is synthesized when one is missing.
    pub fn plan(&self) -> Result<Plan, ArgsError> {
        let plan = match &self.command {
            Command::Simple { count } => self.configure(Job::NonOverlapping {
                count: *count,
                options: SimpleOptions::default(),
            })?,
            Command::Ipv4 { count } => self.configure(Job::NonOverlapping {
                count: *count,
                options: SimpleOptions::ipv4_protocols(),
            })?,
            Command::DstSharded { prefix_len } => self.configure(Job::NonOverlapping {
                count: 1 << *prefix_len,
                options: SimpleOptions::dst_sharded(),
            })?,
            Command::Overlapping { count } => {
                self.configure(Job::Overlapping { count: *count })?
            }
            Command::Narrow {
                count,
                narrow,
                http,
                ip_prefix,
            } => self.configure(Job::Narrow {
                count: *count,
                options: NarrowOptions {
                    use_broad_ranges: !narrow,
                    include_http_filters: *http,
                    ip_prefix_override: ip_prefix.map(PrefixLen::try_new).transpose()?,
                    ..NarrowOptions::default()
                },
            })?,
            Command::Experiment {
                name,
                count,
                prefix,
                http,
            } => {
                let prefix = prefix.map(PrefixLen::try_new).transpose()?;
                let experiment = Experiment::from_name(*name, prefix, *http)
                    .ok_or(ArgsError::MissingPrefix(*name))?;
                self.configure(Job::Experiment {
                    count: *count,
                    experiment,
                })?
            }
            Command::FilterList { count } => Plan::FilterList {
                count: *count,
                out: match &self.out {
                    Some(out) => out.clone(),
                    None => self.under_home(FILTER_LIST_PATH)?,
                },
            },
            Command::Combined {
                narrow: Some(count),
                ..
            } => Plan::CombinedNarrow { count: *count },
            Command::Combined {
                prefix_len,
                narrow: None,
            } => Plan::CombinedBlocks {
                base: AddressBlock::ROOT,
                count: 1 << *prefix_len,
            },
            Command::Patch { count, source } => Plan::Patch {
                count: *count,
                source: match source {
                    Some(source) => source.clone(),
                    None => self.under_home(PATCH_SOURCE_PATH)?,
                },
            },
            Command::Sweep { start, end } => Plan::Sweep {
                start: *start,
                end: *end,
            },
        };
        debug!("Resolved plan: {plan:?}");
        Ok(plan)
    }
}
