use std::error::Error;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

const FINAL_SLIP_PREFIX: &str = "final_slip_";
const SLIP_TIME_PREFIX: &str = "slip_time_";

/// Vertex fields a kinematic fault can report.
///
/// Names are matched case-insensitively. Source names in `final_slip_<source>` and
/// `slip_time_<source>` keep their case.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum VertexFieldRequest {
    /// Cumulative slip.
    Slip,
    StrikeDir,
    DipDir,
    NormalDir,
    FinalSlip(String),
    SlipTime(String),
    /// Change in fault tractions, from the Lagrange multipliers of the current displacement.
    TractionChange,
}

/// A vertex field name that does not match any [`VertexFieldRequest`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownFieldName {
    pub name: String,
}

impl Display for UnknownFieldName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "unknown vertex field name '{}'", self.name)
    }
}

impl Error for UnknownFieldName {}

fn strip_prefix_ignore_case<'a>(name: &'a str, prefix: &str) -> Option<&'a str> {
    let head = name.get(..prefix.len())?;
    let tail = &name[prefix.len()..];
    (head.eq_ignore_ascii_case(prefix) && !tail.is_empty()).then_some(tail)
}

impl FromStr for VertexFieldRequest {
    type Err = UnknownFieldName;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let request = match name.to_ascii_lowercase().as_str() {
            "slip" => Self::Slip,
            "strike_dir" => Self::StrikeDir,
            "dip_dir" => Self::DipDir,
            "normal_dir" => Self::NormalDir,
            "traction_change" => Self::TractionChange,
            _ => {
                if let Some(source) = strip_prefix_ignore_case(name, FINAL_SLIP_PREFIX) {
                    Self::FinalSlip(source.to_string())
                } else if let Some(source) = strip_prefix_ignore_case(name, SLIP_TIME_PREFIX) {
                    Self::SlipTime(source.to_string())
                } else {
                    return Err(UnknownFieldName { name: name.to_string() });
                }
            }
        };
        Ok(request)
    }
}

impl Display for VertexFieldRequest {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Slip => write!(f, "slip"),
            Self::StrikeDir => write!(f, "strike_dir"),
            Self::DipDir => write!(f, "dip_dir"),
            Self::NormalDir => write!(f, "normal_dir"),
            Self::FinalSlip(source) => write!(f, "{}{}", FINAL_SLIP_PREFIX, source),
            Self::SlipTime(source) => write!(f, "{}{}", SLIP_TIME_PREFIX, source),
            Self::TractionChange => write!(f, "traction_change"),
        }
    }
}
