//! Financial cost/benefit parameters of the re-identification game.
//!
//! The publisher gains `publisher_benefit` per released record and loses
//! `publisher_loss` per successful re-identification. A rational adversary
//! pays `adversary_cost` per attack and gains `adversary_gain` on success.

use serde::{Deserialize, Serialize};

use super::config::ConfigError;

/// Scalar risk parameters. All values are finite and non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinancialConfiguration {
    pub adversary_cost: f64,
    pub adversary_gain: f64,
    pub publisher_loss: f64,
    pub publisher_benefit: f64,
}

impl Default for FinancialConfiguration {
    fn default() -> Self {
        Self {
            adversary_cost: 4.0,
            adversary_gain: 300.0,
            publisher_loss: 300.0,
            publisher_benefit: 1200.0,
        }
    }
}

impl FinancialConfiguration {
    /// Create a validated configuration.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidFinancialParameter` for negative or
    /// non-finite values.
    pub fn new(
        adversary_cost: f64,
        adversary_gain: f64,
        publisher_loss: f64,
        publisher_benefit: f64,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            adversary_cost,
            adversary_gain,
            publisher_loss,
            publisher_benefit,
        };
        config.validate()?;
        Ok(config)
    }

    #[must_use]
    pub fn with_adversary_cost(mut self, value: f64) -> Self {
        self.adversary_cost = value;
        self
    }

    #[must_use]
    pub fn with_adversary_gain(mut self, value: f64) -> Self {
        self.adversary_gain = value;
        self
    }

    #[must_use]
    pub fn with_publisher_loss(mut self, value: f64) -> Self {
        self.publisher_loss = value;
        self
    }

    #[must_use]
    pub fn with_publisher_benefit(mut self, value: f64) -> Self {
        self.publisher_benefit = value;
        self
    }

    /// Check that every parameter is finite and non-negative.
    ///
    /// # Errors
    /// Returns the first offending parameter.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let params = [
            ("adversary_cost", self.adversary_cost),
            ("adversary_gain", self.adversary_gain),
            ("publisher_loss", self.publisher_loss),
            ("publisher_benefit", self.publisher_benefit),
        ];
        for (name, value) in params {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidFinancialParameter { name, value });
            }
        }
        Ok(())
    }

    /// Probability that an attack on a class of `class_size` records
    /// re-identifies its target.
    #[must_use]
    pub fn success_probability(class_size: usize) -> f64 {
        if class_size == 0 {
            0.0
        } else {
            1.0 / class_size as f64
        }
    }

    /// Expected payout of a single attack for the adversary.
    #[must_use]
    pub fn adversary_payout(&self, success_probability: f64) -> f64 {
        self.adversary_gain * success_probability - self.adversary_cost
    }

    /// Whether a rational adversary attacks.
    #[must_use]
    pub fn is_attack_profitable(&self, success_probability: f64) -> bool {
        self.adversary_payout(success_probability) > 0.0
    }

    /// Publisher's expected net per record when an attack always happens,
    /// ignoring information loss.
    #[must_use]
    pub fn publisher_net_under_attack(&self, success_probability: f64) -> f64 {
        self.publisher_benefit - self.publisher_loss * success_probability
    }

    /// Publisher's expected payout per released record, given its normalized
    /// information loss and the success probability of an attack on it.
    ///
    /// The loss term only applies when the adversary would attack.
    #[must_use]
    pub fn publisher_payout(&self, information_loss: f64, success_probability: f64) -> f64 {
        let benefit = self.publisher_benefit * (1.0 - information_loss);
        if self.is_attack_profitable(success_probability) {
            benefit - self.publisher_loss * success_probability
        } else {
            benefit
        }
    }

    /// Payout of an unmodified, unattacked record.
    #[must_use]
    pub fn max_publisher_payout(&self) -> f64 {
        self.publisher_benefit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn config2() -> FinancialConfiguration {
        FinancialConfiguration::new(20.0, 120.0, 3000.0, 1200.0).expect("Should be valid")
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(FinancialConfiguration::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_negative_parameters() {
        let result = FinancialConfiguration::new(-1.0, 1.0, 1.0, 1.0);
        assert!(matches!(
            result,
            Err(ConfigError::InvalidFinancialParameter {
                name: "adversary_cost",
                ..
            })
        ));
        let nan = FinancialConfiguration::default().with_publisher_loss(f64::NAN);
        assert!(nan.validate().is_err());
    }

    #[test]
    fn test_attack_profitability_threshold() {
        let config = config2();
        // gain / cost = 6: classes of six or more are not worth attacking.
        assert!(config.is_attack_profitable(FinancialConfiguration::success_probability(5)));
        assert!(!config.is_attack_profitable(FinancialConfiguration::success_probability(6)));
    }

    #[test]
    fn test_publisher_payout() {
        let config = config2();
        // Unprofitable attack: only information loss reduces the payout.
        assert_relative_eq!(config.publisher_payout(0.25, 1.0 / 10.0), 900.0);
        // Profitable attack on a unique record.
        assert_relative_eq!(config.publisher_payout(0.0, 1.0), 1200.0 - 3000.0);
        assert_relative_eq!(config.publisher_net_under_attack(0.5), -300.0);
        assert_relative_eq!(config.max_publisher_payout(), 1200.0);
    }

    #[test]
    fn test_empty_class_has_zero_probability() {
        assert_eq!(FinancialConfiguration::success_probability(0), 0.0);
    }
}
