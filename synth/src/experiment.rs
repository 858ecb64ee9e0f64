// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Named experiment setups, mapped onto the assemblers.

use crate::errors::SynthError;
use crate::narrow::{self, NarrowOptions, Synthesis};
use crate::simple::{OverlappingOptions, assemble_overlapping};
use addrspace::PrefixLen;
use std::fmt::{Display, Formatter};

/// Experiment names, as typed on a command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString, strum::EnumIter)]
#[strum(serialize_all = "kebab-case")]
pub enum ExperimentName {
    NonOverlapping,
    NonOverlappingNarrow,
    NonOverlappingMisses,
    OverlappingNarrow,
    NonOverlappingNarrowish,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Experiment {
    /// Real pools, with the protocol filters
    NonOverlapping,
    /// Decoy pools around single-host narrow matches
    NonOverlappingNarrow,
    /// Like [`Experiment::NonOverlappingNarrow`], plus a user-agent filter that never matches
    NonOverlappingMisses,
    /// Every subscription on the same narrow filter
    OverlappingNarrow,
    /// Decoy pools around narrow matches of a given prefix length
    NonOverlappingNarrowish { prefix: PrefixLen, http: bool },
}

impl Experiment {
    /// Build an experiment from its name. `prefix` is only required (and used) by
    /// [`ExperimentName::NonOverlappingNarrowish`], and so is `http`.
    #[must_use]
    pub fn from_name(name: ExperimentName, prefix: Option<PrefixLen>, http: bool) -> Option<Self> {
        Some(match name {
            ExperimentName::NonOverlapping => Experiment::NonOverlapping,
            ExperimentName::NonOverlappingNarrow => Experiment::NonOverlappingNarrow,
            ExperimentName::NonOverlappingMisses => Experiment::NonOverlappingMisses,
            ExperimentName::OverlappingNarrow => Experiment::OverlappingNarrow,
            ExperimentName::NonOverlappingNarrowish => {
                Experiment::NonOverlappingNarrowish { prefix: prefix?, http }
            }
        })
    }

    #[must_use]
    pub fn name(&self) -> ExperimentName {
        match self {
            Experiment::NonOverlapping => ExperimentName::NonOverlapping,
            Experiment::NonOverlappingNarrow => ExperimentName::NonOverlappingNarrow,
            Experiment::NonOverlappingMisses => ExperimentName::NonOverlappingMisses,
            Experiment::OverlappingNarrow => ExperimentName::OverlappingNarrow,
            Experiment::NonOverlappingNarrowish { .. } => ExperimentName::NonOverlappingNarrowish,
        }
    }

    /// Options of the asymmetric assembler, for the experiments that use it.
    #[must_use]
    pub fn narrow_options(&self) -> Option<NarrowOptions> {
        let (use_broad_ranges, include_http_filters, ip_prefix_override) = match *self {
            Experiment::NonOverlapping => (true, true, None),
            Experiment::NonOverlappingNarrow => (false, false, None),
            Experiment::NonOverlappingMisses => (false, true, None),
            Experiment::OverlappingNarrow => return None,
            Experiment::NonOverlappingNarrowish { prefix, http } => (false, http, Some(prefix)),
        };
        Some(NarrowOptions {
            use_broad_ranges,
            include_http_filters,
            ip_prefix_override,
            ..NarrowOptions::default()
        })
    }

    /// Synthesize the configuration of the experiment for `count` subscriptions.
    pub fn synthesize(&self, count: usize) -> Result<Synthesis, SynthError> {
        match self.narrow_options() {
            Some(options) => narrow::assemble(count, &options),
            None => Ok(Synthesis {
                config: assemble_overlapping(count, &OverlappingOptions::default())?,
                notice: None,
            }),
        }
    }
}

impl Display for Experiment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Experiment::NonOverlappingNarrowish { prefix, http } => {
                write!(f, "{} /{prefix}", self.name())?;
                if *http {
                    write!(f, " with http")?;
                }
                Ok(())
            }
            _ => write!(f, "{}", self.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn names() {
        for name in ExperimentName::iter() {
            assert_eq!(ExperimentName::from_str(&name.to_string()).unwrap(), name);
            let prefix = Some(PrefixLen::new_assert(24));
            let experiment = Experiment::from_name(name, prefix, false).unwrap();
            assert_eq!(experiment.name(), name);
        }
        assert_eq!(
            ExperimentName::from_str("non-overlapping-narrowish").unwrap(),
            ExperimentName::NonOverlappingNarrowish
        );
        assert_eq!(
            Experiment::from_name(ExperimentName::NonOverlappingNarrowish, None, true),
            None
        );
    }

    #[test]
    fn experiments_map_onto_assemblers() {
        let config = Experiment::OverlappingNarrow.synthesize(3).unwrap().config;
        assert_eq!(
            config.filters.get("ipv4.src_addr = 16.0.0.2 and http"),
            Some([0, 1, 2].as_slice())
        );

        let config = Experiment::NonOverlappingMisses.synthesize(4).unwrap().config;
        assert_eq!(
            config.filters.filters().last(),
            Some("http.user_agent = 'asdfg'")
        );

        let narrowish = Experiment::NonOverlappingNarrowish {
            prefix: PrefixLen::new_assert(16),
            http: false,
        };
        assert_eq!(narrowish.to_string(), "non-overlapping-narrowish /16");
        let config = narrowish.synthesize(3).unwrap().config;
        assert_eq!(
            config.filters.filters().collect::<Vec<_>>(),
            vec![
                "ipv4.src_addr = 16.0.0.0/16 and http",
                "ipv4.dst_addr = 48.0.0.0/16 and http",
                "tls",
            ]
        );

        let config = Experiment::NonOverlapping.synthesize(4).unwrap().config;
        assert_eq!(config.filters.filters().next(), Some("http"));
    }
}
