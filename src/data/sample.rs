//! Synthetic purchase-history generation.
//!
//! A hidden market level follows a geometric random walk with drift. Each item
//! has a lognormal base price and is ordered on random days; an observed price
//! is `base × market(day) × noise`, where noise is lognormal with occasional
//! jumps that mimic data-entry errors. The hidden market path is returned too,
//! so callers can check how well an index recovers it.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use chrono::{Days, NaiveDate};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::{LogNormal, Normal, Poisson};

use crate::domain::{CurvePoint, Observation};
use crate::error::{IndexError, Result};

/// Parameters of a synthetic sample.
#[derive(Debug, Clone)]
pub struct SampleConfig {
    pub n_items: usize,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub seed: u64,
    /// Expected yearly market drift (`0.08` = +8% per year).
    pub annual_drift: f64,
    /// Daily log-volatility of the market level.
    pub daily_vol: f64,
    /// Log-sigma of per-order price noise.
    pub noise: f64,
    /// Mean number of orders per item (at least one order is always drawn).
    pub mean_orders: f64,
    /// Probability that an order is recorded twice on the same day.
    pub duplicate_prob: f64,
    /// Probability that a price is off by a factor `exp(±jump_k)`.
    pub jump_prob: f64,
    pub jump_k: f64,
}

impl SampleConfig {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            n_items: 50,
            start,
            end,
            seed: 42,
            annual_drift: 0.08,
            daily_vol: 0.002,
            noise: 0.05,
            mean_orders: 6.0,
            duplicate_prob: 0.05,
            jump_prob: 0.02,
            jump_k: 1.5,
        }
    }

    fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(IndexError::InvalidConfig(msg.to_string()));
        if self.n_items == 0 {
            return invalid("Sample item count must be > 0.");
        }
        if self.start > self.end {
            return invalid("Sample start date must not be after end date.");
        }
        if !(self.annual_drift.is_finite() && self.annual_drift > -1.0) {
            return invalid("Annual drift must be finite and > -100%.");
        }
        if !(self.daily_vol.is_finite() && self.daily_vol >= 0.0) {
            return invalid("Daily volatility must be finite and >= 0.");
        }
        if !(self.noise.is_finite() && self.noise >= 0.0) {
            return invalid("Noise must be finite and >= 0.");
        }
        if !(self.mean_orders.is_finite() && self.mean_orders >= 1.0) {
            return invalid("Mean orders per item must be >= 1.");
        }
        if !(0.0..1.0).contains(&self.duplicate_prob) || !(0.0..1.0).contains(&self.jump_prob) {
            return invalid("Probabilities must be within [0, 1).");
        }
        if !(self.jump_k.is_finite() && self.jump_k >= 0.0) {
            return invalid("Jump magnitude must be finite and >= 0.");
        }
        Ok(())
    }
}

/// Generated observations plus the hidden market level (1.0 on `start`).
#[derive(Debug, Clone)]
pub struct SampleData {
    pub observations: Vec<Observation>,
    pub market: Vec<CurvePoint>,
}

pub fn generate_sample(config: &SampleConfig) -> Result<SampleData> {
    config.validate()?;

    let mut rng = StdRng::seed_from_u64(sample_seed(config));
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| IndexError::InvalidConfig(format!("Noise distribution error: {e}")))?;
    let base_price = LogNormal::new(100.0_f64.ln(), 1.0)
        .map_err(|e| IndexError::InvalidConfig(format!("Price distribution error: {e}")))?;

    let market = market_path(config, &mut rng, &normal);

    // Orders beyond the first one per item.
    let extra_orders = if config.mean_orders > 1.0 {
        Some(
            Poisson::new(config.mean_orders - 1.0)
                .map_err(|e| IndexError::InvalidConfig(format!("Order distribution error: {e}")))?,
        )
    } else {
        None
    };

    let correction = jump_mean_correction(config.noise, config.jump_prob, config.jump_k);
    let mut observations = Vec::new();

    for i in 0..config.n_items {
        let item_id = format!("item-{:04}", i + 1);
        let base: f64 = base_price.sample(&mut rng);
        let n_orders = 1 + extra_orders
            .as_ref()
            .map(|p| p.sample(&mut rng) as usize)
            .unwrap_or(0);

        for _ in 0..n_orders {
            let offset = rng.gen_range(0..market.len());
            let day = market[offset];
            let copies = if rng.r#gen::<f64>() < config.duplicate_prob { 2 } else { 1 };
            for _ in 0..copies {
                let z = normal.sample(&mut rng);
                let jump = sample_jump(&mut rng, config.jump_prob, config.jump_k);
                let exponent = config.noise * z + jump - correction;
                observations.push(Observation {
                    item_id: item_id.clone(),
                    date: day.date,
                    price: base * day.coefficient * exponent.exp(),
                });
            }
        }
    }

    observations.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.item_id.cmp(&b.item_id)));

    Ok(SampleData {
        observations,
        market,
    })
}

fn market_path(config: &SampleConfig, rng: &mut StdRng, normal: &Normal<f64>) -> Vec<CurvePoint> {
    let n_days = ((config.end - config.start).num_days() + 1) as usize;
    let mu = (1.0 + config.annual_drift).ln() / 365.0;
    let sigma = config.daily_vol;

    let mut out = Vec::with_capacity(n_days);
    let mut level = 1.0_f64;
    for offset in 0..n_days {
        let date = config
            .start
            .checked_add_days(Days::new(offset as u64))
            .unwrap_or(config.end);
        out.push(CurvePoint {
            date,
            coefficient: level,
        });
        let z = normal.sample(rng);
        level *= (mu + sigma * z - 0.5 * sigma * sigma).exp();
    }
    out
}

// Mean correction so E[exp(log-noise)] == 1.0 (keeps prices unbiased).
fn jump_mean_correction(sigma: f64, p: f64, k: f64) -> f64 {
    let p_half = 0.5 * p;
    let m1 = (1.0 - p) + p_half * k.exp() + p_half * (-k).exp();
    0.5 * sigma * sigma + m1.ln()
}

fn sample_jump(rng: &mut StdRng, p: f64, k: f64) -> f64 {
    let roll: f64 = rng.r#gen();
    if roll < 0.5 * p {
        k
    } else if roll < p {
        -k
    } else {
        0.0
    }
}

fn sample_seed(config: &SampleConfig) -> u64 {
    let mut hasher = DefaultHasher::new();
    config.seed.hash(&mut hasher);
    config.n_items.hash(&mut hasher);
    config.start.hash(&mut hasher);
    config.end.hash(&mut hasher);
    config.annual_drift.to_bits().hash(&mut hasher);
    config.daily_vol.to_bits().hash(&mut hasher);
    config.noise.to_bits().hash(&mut hasher);
    config.mean_orders.to_bits().hash(&mut hasher);
    config.duplicate_prob.to_bits().hash(&mut hasher);
    config.jump_prob.to_bits().hash(&mut hasher);
    config.jump_k.to_bits().hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn sample_is_reproducible() {
        let config = SampleConfig::new(d(2020, 1, 1), d(2021, 12, 31));
        let a = generate_sample(&config).unwrap();
        let b = generate_sample(&config).unwrap();
        assert_eq!(a.observations, b.observations);

        let other = SampleConfig { seed: 7, ..config };
        let c = generate_sample(&other).unwrap();
        assert_ne!(a.observations, c.observations);
    }

    #[test]
    fn sample_respects_bounds() {
        let config = SampleConfig {
            n_items: 20,
            ..SampleConfig::new(d(2020, 1, 1), d(2020, 12, 31))
        };
        let data = generate_sample(&config).unwrap();

        assert_eq!(data.market.len(), 366);
        assert_eq!(data.market[0].coefficient, 1.0);
        assert!(data.observations.len() >= 20);
        for o in &data.observations {
            assert!(o.date >= config.start && o.date <= config.end);
            assert!(o.price.is_finite() && o.price > 0.0);
        }
        for w in data.observations.windows(2) {
            assert!(w[0].date <= w[1].date);
        }
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = SampleConfig {
            n_items: 0,
            ..SampleConfig::new(d(2020, 1, 1), d(2020, 12, 31))
        };
        assert!(matches!(generate_sample(&config), Err(IndexError::InvalidConfig(_))));
    }

    #[test]
    fn jump_correction_zero_without_noise() {
        assert!(jump_mean_correction(0.0, 0.0, 2.0).abs() < 1e-15);
    }
}
