use serde::{Deserialize, Serialize};
use std::fmt;

/// Defines session phases and their ordering
pub trait Phase: Copy + Clone + PartialEq + Send + Sync + fmt::Debug + Default {
    fn next(&self) -> Option<Self>;
    fn eye(&self) -> Option<Eye>;
    fn label(&self) -> String;

    fn requires_response(&self) -> bool {
        true
    }

    fn is_practice(&self) -> bool {
        false
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Eye {
    Left,
    Right,
}

impl Eye {
    pub fn as_str(&self) -> &'static str {
        match self {
            Eye::Left => "left",
            Eye::Right => "right",
        }
    }

    /// The eye that has to be covered while this one is tested.
    pub fn fellow(&self) -> Eye {
        match self {
            Eye::Left => Eye::Right,
            Eye::Right => Eye::Left,
        }
    }
}

impl fmt::Display for Eye {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The stimulus property a staircase adapts.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Size,
    Contrast,
}

impl Dimension {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Size => "size",
            Dimension::Contrast => "contrast",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Phases of the adaptive (threshold seeking) session.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
pub enum AdaptivePhase {
    #[default]
    Practice,
    Staircase(Eye, Dimension),
}

impl AdaptivePhase {
    pub fn dimension(&self) -> Option<Dimension> {
        match self {
            AdaptivePhase::Practice => None,
            AdaptivePhase::Staircase(_, dimension) => Some(*dimension),
        }
    }
}

impl Phase for AdaptivePhase {
    fn next(&self) -> Option<Self> {
        use AdaptivePhase::*;
        use Dimension::*;
        Some(match self {
            Practice => Staircase(Eye::Left, Size),
            Staircase(Eye::Left, Size) => Staircase(Eye::Left, Contrast),
            Staircase(Eye::Left, Contrast) => Staircase(Eye::Right, Size),
            Staircase(Eye::Right, Size) => Staircase(Eye::Right, Contrast),
            Staircase(Eye::Right, Contrast) => return None,
        })
    }

    fn eye(&self) -> Option<Eye> {
        match self {
            AdaptivePhase::Practice => None,
            AdaptivePhase::Staircase(eye, _) => Some(*eye),
        }
    }

    fn label(&self) -> String {
        match self {
            AdaptivePhase::Practice => "practice".to_string(),
            AdaptivePhase::Staircase(eye, dimension) => format!("{eye}_eye_{dimension}"),
        }
    }

    fn is_practice(&self) -> bool {
        matches!(self, AdaptivePhase::Practice)
    }
}

/// Phases of the fixed-level sweep session.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
pub enum SweepPhase {
    #[default]
    Practice,
    Response(Eye),
    Passive(Eye),
}

impl Phase for SweepPhase {
    fn next(&self) -> Option<Self> {
        use SweepPhase::*;
        Some(match self {
            Practice => Response(Eye::Left),
            Response(eye) => Passive(*eye),
            Passive(Eye::Left) => Response(Eye::Right),
            Passive(Eye::Right) => return None,
        })
    }

    fn eye(&self) -> Option<Eye> {
        match self {
            SweepPhase::Practice => None,
            SweepPhase::Response(eye) | SweepPhase::Passive(eye) => Some(*eye),
        }
    }

    fn label(&self) -> String {
        match self {
            SweepPhase::Practice => "practice".to_string(),
            SweepPhase::Response(eye) => format!("{eye}_eye_response"),
            SweepPhase::Passive(eye) => format!("{eye}_eye_no_response"),
        }
    }

    fn requires_response(&self) -> bool {
        !matches!(self, SweepPhase::Passive(_))
    }

    fn is_practice(&self) -> bool {
        matches!(self, SweepPhase::Practice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walk<P: Phase>() -> Vec<P> {
        let mut phases = vec![P::default()];
        while let Some(next) = phases.last().and_then(|p| p.next()) {
            phases.push(next);
        }
        phases
    }

    #[test]
    fn adaptive_phases_run_size_before_contrast_per_eye() {
        let labels: Vec<String> = walk::<AdaptivePhase>().iter().map(|p| p.label()).collect();
        assert_eq!(
            labels,
            [
                "practice",
                "left_eye_size",
                "left_eye_contrast",
                "right_eye_size",
                "right_eye_contrast"
            ]
        );
    }

    #[test]
    fn sweep_passive_blocks_take_no_response() {
        let phases = walk::<SweepPhase>();
        assert_eq!(phases.len(), 5);
        let passive: Vec<_> = phases.iter().filter(|p| !p.requires_response()).collect();
        assert_eq!(passive, [&SweepPhase::Passive(Eye::Left), &SweepPhase::Passive(Eye::Right)]);
    }

    #[test]
    fn fellow_eye_is_the_other_one() {
        assert_eq!(Eye::Left.fellow(), Eye::Right);
        assert_eq!(Eye::Right.fellow(), Eye::Left);
    }
}
