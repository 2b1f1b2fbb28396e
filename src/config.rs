use clap::Parser;

use crate::sizing::risk::check_adjustment;
use crate::sizing::{KellyErrors, Locale, RiskAdjustment};

/// Kelly-criterion position sizing calculator
#[derive(Parser, Debug, Clone)]
#[command(name = "kelly-sizer", version, about)]
pub struct Config {
    /// Calculator listen address
    #[arg(long, env = "DASHBOARD_ADDR", default_value = "127.0.0.1:8080")]
    pub dashboard_addr: String,

    /// SQLite trade journal path
    #[arg(long, env = "DATABASE_PATH", default_value = "kelly.db")]
    pub database_path: String,

    /// Default fractional Kelly multiplier, in (0, 1]
    #[arg(long, env = "KELLY_FRACTION", default_value = "1.0")]
    pub kelly_fraction: f64,

    /// Default cap on the recommended fraction of capital, in (0, 1]
    #[arg(long, env = "MAX_POSITION_FRACTION", default_value = "1.0")]
    pub max_position_fraction: f64,

    /// Language for error and warning messages
    #[arg(long, env = "KELLY_LOCALE", value_parser = parse_locale, default_value = "en")]
    pub locale: Locale,
}

fn parse_locale(s: &str) -> Result<Locale, String> {
    match s.to_ascii_lowercase().as_str() {
        "en" => Ok(Locale::En),
        "zh" | "zh-cn" => Ok(Locale::Zh),
        other => Err(format!("unsupported locale '{}' (expected en or zh)", other)),
    }
}

impl Config {
    /// Risk policy applied when a request does not supply one.
    pub fn default_adjustment(&self) -> RiskAdjustment {
        RiskAdjustment::new(self.kelly_fraction, self.max_position_fraction)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let mut errors = Vec::new();
        check_adjustment(&self.default_adjustment(), &mut errors);
        if let Some(errors) = KellyErrors::from_vec(errors) {
            anyhow::bail!("invalid default risk adjustment: {}", errors);
        }
        if self.database_path.trim().is_empty() {
            anyhow::bail!("database_path must not be empty");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        let mut argv = vec!["kelly-sizer"];
        argv.extend_from_slice(args);
        Config::try_parse_from(argv).expect("arguments parse")
    }

    #[test]
    fn test_defaults_are_full_kelly() {
        let config = parse(&[]);
        assert_eq!(config.default_adjustment(), RiskAdjustment::default());
        assert_eq!(config.locale, Locale::En);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_half_kelly_with_cap() {
        let config = parse(&[
            "--kelly-fraction",
            "0.5",
            "--max-position-fraction",
            "0.2",
            "--locale",
            "zh",
        ]);
        assert_eq!(config.default_adjustment(), RiskAdjustment::new(0.5, 0.2));
        assert_eq!(config.locale, Locale::Zh);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_locale_parsing() {
        assert_eq!(parse(&["--locale", "ZH-CN"]).locale, Locale::Zh);
        assert!(Config::try_parse_from(["kelly-sizer", "--locale", "fr"]).is_err());
    }

    #[test]
    fn test_out_of_range_defaults_rejected() {
        let config = parse(&["--kelly-fraction", "0", "--max-position-fraction", "1.5"]);
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("fractionMultiplier"));
        assert!(err.contains("maxPositionFraction"));
    }
}
