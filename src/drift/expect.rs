use std::fmt;

use super::result::DriftResult;

/// A caller expectation the drift result did not meet.
#[derive(Debug, Clone, PartialEq)]
pub enum Violation {
    DriftDetected { exit_code: i32 },
    BreakingChanges { count: u64, score: f64 },
    TooManyBreaking { count: u64, max: u64 },
    LowCompatibility { score: f64, min: f64 },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DriftDetected { exit_code } => {
                write!(f, "schema drift detected (tool exit {exit_code})")
            }
            Self::BreakingChanges { count, score } => {
                write!(f, "{count} breaking changes! Compatibility: {score}%")
            }
            Self::TooManyBreaking { count, max } => {
                write!(f, "{count} breaking changes exceed the allowed {max}")
            }
            Self::LowCompatibility { score, min } => {
                write!(f, "compatibility {score}% is below the required {min}%")
            }
        }
    }
}

impl std::error::Error for Violation {}

impl Violation {
    /// The message as a test suite would print it for endpoint `key`.
    pub fn for_key(&self, key: &str) -> String {
        match self {
            Self::BreakingChanges { .. } => format!("{key} has {self}"),
            _ => format!("{key}: {self}"),
        }
    }
}

impl DriftResult {
    pub fn ensure_no_drift(&self) -> Result<(), Violation> {
        if self.has_drift {
            return Err(Violation::DriftDetected {
                exit_code: self.exit_code,
            });
        }
        Ok(())
    }

    pub fn ensure_no_breaking(&self) -> Result<(), Violation> {
        if self.has_breaking {
            return Err(Violation::BreakingChanges {
                count: self.breaking_count,
                score: self.compatibility_score,
            });
        }
        Ok(())
    }

    pub fn ensure_max_breaking(&self, max: u64) -> Result<(), Violation> {
        if self.breaking_count > max {
            return Err(Violation::TooManyBreaking {
                count: self.breaking_count,
                max,
            });
        }
        Ok(())
    }

    pub fn ensure_min_compatibility(&self, min: f64) -> Result<(), Violation> {
        if self.compatibility_score < min {
            return Err(Violation::LowCompatibility {
                score: self.compatibility_score,
                min,
            });
        }
        Ok(())
    }
}

/// Bundle of expectations checked together, as the CLI does.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Expectations {
    pub allow_drift: bool,
    pub allow_breaking: bool,
    pub max_breaking: Option<u64>,
    pub min_compatibility: Option<f64>,
}

impl Expectations {
    pub fn evaluate(&self, result: &DriftResult) -> Vec<Violation> {
        let mut violations = Vec::new();
        if !self.allow_drift
            && let Err(violation) = result.ensure_no_drift()
        {
            violations.push(violation);
        }
        if !self.allow_breaking
            && let Err(violation) = result.ensure_no_breaking()
        {
            violations.push(violation);
        }
        if let Some(max) = self.max_breaking
            && let Err(violation) = result.ensure_max_breaking(max)
        {
            violations.push(violation);
        }
        if let Some(min) = self.min_compatibility
            && let Err(violation) = result.ensure_min_compatibility(min)
        {
            violations.push(violation);
        }
        violations
    }
}
