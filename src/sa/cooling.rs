//! Cooling schedules.
//!
//! Each schedule is a pure function of the initial temperature, the outer
//! iteration index and a parameter list. All return `T0` at iteration 0.
//!
//! | Schedule        | `T(n)` for `n >= 1`         | Params   |
//! |-----------------|-----------------------------|----------|
//! | `Logarithmic`   | `T0 / ln(n + params[0])`    | offset   |
//! | `InverseLinear` | `T0 / n`                    | none     |
//! | `Exponential`   | `T0 * exp(-n * params[0])`  | rate     |

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Temperature as a function of the outer iteration index.
///
/// # References
///
/// - Logarithmic: Geman & Geman (1984), convergence in probability
/// - Exponential: Kirkpatrick et al. (1983)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CoolingSchedule {
    /// `T = T0 / ln(n + params[0])`.
    #[default]
    Logarithmic,

    /// `T = T0 / n`.
    InverseLinear,

    /// `T = T0 * exp(-n * params[0])`.
    Exponential,
}

impl CoolingSchedule {
    pub const ALL: [CoolingSchedule; 3] = [
        CoolingSchedule::Logarithmic,
        CoolingSchedule::InverseLinear,
        CoolingSchedule::Exponential,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CoolingSchedule::Logarithmic => "logarithmic",
            CoolingSchedule::InverseLinear => "inverse-linear",
            CoolingSchedule::Exponential => "exponential",
        }
    }

    /// Number of entries this schedule reads from `params`.
    pub fn param_count(self) -> usize {
        match self {
            CoolingSchedule::Logarithmic | CoolingSchedule::Exponential => 1,
            CoolingSchedule::InverseLinear => 0,
        }
    }

    /// Temperature at outer iteration `iteration`.
    ///
    /// # Errors
    /// [`Error::MissingParameter`] if the schedule needs `params[0]` and
    /// `params` is empty.
    pub fn temperature(self, t0: f64, iteration: usize, params: &[f64]) -> Result<f64> {
        let param = match self.param_count() {
            0 => 0.0,
            _ => *params.first().ok_or(Error::MissingParameter {
                schedule: self.name(),
                index: 0,
            })?,
        };
        if iteration == 0 {
            return Ok(t0);
        }

        let n = iteration as f64;
        let t = match self {
            CoolingSchedule::Logarithmic => t0 / (n + param).ln(),
            CoolingSchedule::InverseLinear => t0 / n,
            CoolingSchedule::Exponential => t0 * (-n * param).exp(),
        };
        Ok(t)
    }

    /// Like [`temperature`](Self::temperature), also appending the result
    /// to `trace`.
    pub fn temperature_traced(
        self,
        t0: f64,
        iteration: usize,
        params: &[f64],
        trace: &mut Vec<f64>,
    ) -> Result<f64> {
        let t = self.temperature(t0, iteration, params)?;
        trace.push(t);
        Ok(t)
    }
}

impl fmt::Display for CoolingSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CoolingSchedule {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "logarithmic" | "log" => Ok(CoolingSchedule::Logarithmic),
            "inverse-linear" | "inverse_linear" | "inverse" => Ok(CoolingSchedule::InverseLinear),
            "exponential" | "exp" => Ok(CoolingSchedule::Exponential),
            other => Err(Error::Configuration(format!(
                "unknown cooling schedule '{other}'"
            ))),
        }
    }
}

/// Legacy numeric schedule ids: 1 logarithmic, 2 inverse-linear,
/// 3 exponential.
impl TryFrom<u8> for CoolingSchedule {
    type Error = Error;

    fn try_from(id: u8) -> Result<Self> {
        match id {
            1 => Ok(CoolingSchedule::Logarithmic),
            2 => Ok(CoolingSchedule::InverseLinear),
            3 => Ok(CoolingSchedule::Exponential),
            other => Err(Error::Configuration(format!(
                "unknown cooling schedule id {other}"
            ))),
        }
    }
}
