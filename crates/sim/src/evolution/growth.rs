//! Population growth and bottleneck models.
//!
//! Each generation the growth model maps the previous target size to the
//! next one. The multi-bottleneck model keeps iterator state (which schedule
//! element is active) that travels with the population across generations.

use crate::errors::{ConfigError, SimulationError};
use crate::simulation::parameters::GrowthConfig;
use serde::{Deserialize, Serialize};

/// How the population target size changes over generations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PopGrowthModel {
    /// Constant target size.
    None,
    /// Multiply by the growth rate each generation, optionally capped by a
    /// maximum population size (reaching the cap finishes the tribe).
    Exponential,
    /// Logistic growth toward the carrying capacity.
    Capacity,
    /// Exponential growth with a single configured bottleneck window and a
    /// second growth rate afterwards, clamped to the carrying capacity.
    Founders,
    /// An ordered schedule of growth/bottleneck ranges parsed from the
    /// multiple-bottlenecks option.
    MultiBottleneck,
}

/// One element of a multi-bottleneck schedule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bottleneck {
    /// Growth rate before this bottleneck; 1.0 means no growth.
    pub growth_rate: f64,
    /// Population cap before this bottleneck; 0 means no cap.
    pub max_pop: u32,
    /// Starting generation; 0 means no more bottlenecks.
    pub start: u32,
    /// Pinned population size during the bottleneck window.
    pub pop_size: u32,
    /// Window length in generations; when passed, the schedule advances.
    pub gens: u32,
}

/// The parsed multi-bottleneck schedule plus the active element.
#[derive(Debug, Clone, PartialEq)]
pub struct Bottlenecks {
    list: Vec<Bottleneck>,
    current: usize,
}

impl Bottlenecks {
    /// Parse the comma-separated 5-tuple syntax
    /// `growth-rate:max-pop:bottle-start:bottle-size:bottle-gens,...`.
    /// Only the growth rate is required; trailing fields default to zero.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let usage = "multiple_bottlenecks must be like: growth-rate:max-pop:bottle-start:bottle-size:bottle-gens,...";
        if text.trim().is_empty() {
            return Err(ConfigError::Parse(usage.to_string()));
        }
        let mut list = Vec::new();
        for (i, tuple) in text.split(',').enumerate() {
            let element = i + 1;
            let parts: Vec<&str> = tuple.trim().split(':').collect();
            if parts.is_empty() || parts.len() > 5 {
                return Err(ConfigError::Parse(usage.to_string()));
            }
            let growth_rate: f64 = parts[0].trim().parse().map_err(|e| {
                ConfigError::Parse(format!(
                    "bad growth-rate in element {element} of multiple_bottlenecks: {e}"
                ))
            })?;
            if growth_rate <= 0.0 {
                return Err(ConfigError::Parse(format!(
                    "growth-rate in multiple_bottlenecks must be > 0.0, not {growth_rate}"
                )));
            }
            let mut fields = [0u32; 4];
            for (f, name) in ["max-pop", "bottle-start", "bottle-size", "bottle-gens"]
                .iter()
                .enumerate()
            {
                if let Some(part) = parts.get(f + 1) {
                    fields[f] = part.trim().parse().map_err(|e| {
                        ConfigError::Parse(format!(
                            "bad {name} in element {element} of multiple_bottlenecks: {e}"
                        ))
                    })?;
                }
            }
            list.push(Bottleneck {
                growth_rate,
                max_pop: fields[0],
                start: fields[1],
                pop_size: fields[2],
                gens: fields[3],
            });
        }
        Ok(Self { list, current: 0 })
    }

    /// The active schedule element.
    pub fn current(&self) -> Bottleneck {
        self.list[self.current]
    }

    /// Step to the next element. Past the end, a synthetic no-growth
    /// element (rate 1.0, no bottleneck) applies from then on.
    pub fn advance(&mut self) -> Bottleneck {
        if self.current >= self.list.len() - 1 {
            return Bottleneck {
                growth_rate: 1.0,
                max_pop: 0,
                start: 0,
                pop_size: 0,
                gens: 0,
            };
        }
        self.current += 1;
        self.list[self.current]
    }
}

impl PopGrowthModel {
    /// Compute the target size for generation `gen_num` from the previous
    /// generation's target.
    pub fn next_target_size(
        &self,
        cfg: &GrowthConfig,
        prev_target: u32,
        bottlenecks: Option<&mut Bottlenecks>,
        gen_num: u32,
    ) -> Result<u32, SimulationError> {
        match self {
            Self::None => Ok(prev_target),
            Self::Exponential => {
                Ok((cfg.pop_growth_rate * prev_target as f64).ceil() as u32)
            }
            Self::Capacity => {
                // ceil(prev * (1 + r * (1 - prev/K)))
                let prev = prev_target as f64;
                let target = prev
                    * (1.0
                        + cfg.pop_growth_rate * (1.0 - prev / cfg.carrying_capacity as f64));
                Ok(target.ceil() as u32)
            }
            Self::Founders => {
                let target = if cfg.bottleneck_generation == 0 || gen_num < cfg.bottleneck_generation
                {
                    (cfg.pop_growth_rate * prev_target as f64).ceil() as u32
                } else if gen_num
                    < cfg.bottleneck_generation + cfg.num_bottleneck_generations
                {
                    cfg.bottleneck_pop_size
                } else {
                    (cfg.pop_growth_rate2 * prev_target as f64).ceil() as u32
                };
                Ok(target.min(cfg.carrying_capacity))
            }
            Self::MultiBottleneck => {
                let Some(bottlenecks) = bottlenecks else {
                    return Err(SimulationError::BottleneckOrder { generation: gen_num });
                };
                let mut cur = bottlenecks.current();
                if cur.start > 0 && gen_num >= cur.start + cur.gens {
                    // Past the current element's range, move to the next.
                    cur = bottlenecks.advance();
                }

                let mut target = if cur.start == 0 || gen_num < cur.start {
                    (cur.growth_rate * prev_target as f64).ceil() as u32
                } else if gen_num < cur.start + cur.gens {
                    cur.pop_size
                } else {
                    // Only reachable when this element's range does not lie
                    // past the previous element's range.
                    return Err(SimulationError::BottleneckOrder { generation: gen_num });
                };
                if cur.max_pop != 0 {
                    target = target.min(cur.max_pop);
                }
                Ok(target)
            }
        }
    }
}
