use std::collections::HashMap;

use crate::models::{PricingRate, UsageCounts};

/// Caller-supplied pricing rule with full access to the usage tuple.
pub type PricingFn = Box<dyn Fn(&str, &UsageCounts) -> f64 + Send + Sync>;

// ── Built-in rates ($/million tokens) ─────────────────────────────────────────

const OPUS_4: PricingRate = PricingRate {
    input: 15.00,
    output: 75.00,
    cache_write: 18.75,
    cache_read: 1.50,
};

const SONNET_4: PricingRate = PricingRate {
    input: 3.00,
    output: 15.00,
    cache_write: 3.75,
    cache_read: 0.30,
};

const HAIKU_3_5: PricingRate = PricingRate {
    input: 0.80,
    output: 4.00,
    cache_write: 1.00,
    cache_read: 0.08,
};

/// Family substrings checked in order against the lowercased model string.
/// The `claude-`-prefixed forms come first so the longer identifier wins
/// when both would match.
const BUILTIN_RATES: &[(&str, PricingRate)] = &[
    ("claude-opus-4", OPUS_4),
    ("claude-sonnet-4", SONNET_4),
    ("claude-haiku-3.5", HAIKU_3_5),
    ("opus-4", OPUS_4),
    ("sonnet-4", SONNET_4),
    ("haiku-3.5", HAIKU_3_5),
];

// ── PricingEngine ─────────────────────────────────────────────────────────────

/// Resolves a model identifier and a token-usage tuple to a cost in USD.
///
/// Resolution order, first match wins:
/// 1. An override function registered for the exact model string.
/// 2. An override rate row registered for the exact model string.
/// 3. The built-in rate table, matched by case-insensitive substring
///    against the known family identifiers.
/// 4. Zero. Unknown models never estimate a nonzero cost.
///
/// Engines are caller-owned configuration objects; there is no process-wide
/// instance. Reads take no locks, so registering overrides while other
/// threads compute costs requires external synchronisation.
#[derive(Default)]
pub struct PricingEngine {
    /// Override functions keyed by exact model string.
    override_fns: HashMap<String, PricingFn>,
    /// Override rate rows keyed by exact model string.
    override_rates: HashMap<String, PricingRate>,
}

/// Cost of one usage tuple at the given rate row, absent counts as zero.
/// Summed per category with no intermediate rounding.
fn rate_cost(rate: &PricingRate, usage: &UsageCounts) -> f64 {
    const PER_MILLION: f64 = 1_000_000.0;
    usage.input_tokens.unwrap_or(0) as f64 * rate.input / PER_MILLION
        + usage.output_tokens.unwrap_or(0) as f64 * rate.output / PER_MILLION
        + usage.cache_creation_tokens.unwrap_or(0) as f64 * rate.cache_write / PER_MILLION
        + usage.cache_read_tokens.unwrap_or(0) as f64 * rate.cache_read / PER_MILLION
}

impl PricingEngine {
    /// Create an engine with no overrides registered.
    pub fn new() -> Self {
        Self::default()
    }

    // ── Overrides ────────────────────────────────────────────────────────────

    /// Register an override function for an exact model string.
    ///
    /// The function receives the model string and the full usage tuple and
    /// takes precedence over every table lookup for that model.
    pub fn register_pricing_fn<F>(&mut self, model: impl Into<String>, pricing_fn: F)
    where
        F: Fn(&str, &UsageCounts) -> f64 + Send + Sync + 'static,
    {
        self.override_fns.insert(model.into(), Box::new(pricing_fn));
    }

    /// Remove an override function. Returns whether one was registered.
    pub fn unregister_pricing_fn(&mut self, model: &str) -> bool {
        self.override_fns.remove(model).is_some()
    }

    /// Register an override rate row for an exact model string.
    pub fn set_rate(&mut self, model: impl Into<String>, rate: PricingRate) {
        self.override_rates.insert(model.into(), rate);
    }

    /// Remove an override rate row. Returns whether one was registered.
    pub fn remove_rate(&mut self, model: &str) -> bool {
        self.override_rates.remove(model).is_some()
    }

    // ── Lookup ───────────────────────────────────────────────────────────────

    /// First built-in rate row whose family substring occurs in the
    /// lowercased model string.
    fn builtin_rate(model: &str) -> Option<PricingRate> {
        let lower = model.to_lowercase();
        BUILTIN_RATES
            .iter()
            .find(|(family, _)| lower.contains(family))
            .map(|(_, rate)| *rate)
    }

    /// Whether the model belongs to a known built-in family.
    ///
    /// Overrides are deliberately ignored here: this answers "do we ship
    /// rates for this model", not "can a cost be produced".
    pub fn is_model_supported(&self, model: &str) -> bool {
        Self::builtin_rate(model).is_some()
    }

    /// The rate row that would price this model, override table first,
    /// then the built-in families. `None` when neither knows the model.
    pub fn pricing_info(&self, model: &str) -> Option<PricingRate> {
        self.override_rates
            .get(model)
            .copied()
            .or_else(|| Self::builtin_rate(model))
    }

    // ── Cost ─────────────────────────────────────────────────────────────────

    /// Cost in USD for one usage tuple under this engine's configuration.
    pub fn cost(&self, model: &str, usage: &UsageCounts) -> f64 {
        if let Some(pricing_fn) = self.override_fns.get(model) {
            return pricing_fn(model, usage);
        }
        if let Some(rate) = self.override_rates.get(model) {
            return rate_cost(rate, usage);
        }
        match Self::builtin_rate(model) {
            Some(rate) => rate_cost(&rate, usage),
            None => 0.0,
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
