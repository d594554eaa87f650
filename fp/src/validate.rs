//! Cross-validation of a fetched plot/visual template pair

use std::fmt;

use templatestore::{PlotTemplate, VisualTemplate};
use thiserror::Error;
use tracing::debug;

/// Which half of the consistency invariant a pair broke
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InconsistentField {
    /// The visual template renders a different plot
    PlotId { plot_id: String, plot_template_id: String },
    /// The templates point at different containers
    ContainerId {
        plot_container_id: String,
        visual_container_id: String,
    },
}

impl fmt::Display for InconsistentField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InconsistentField::PlotId {
                plot_id,
                plot_template_id,
            } => write!(
                f,
                "plot_id's in plot template and visual template do not match ({plot_id} != {plot_template_id})"
            ),
            InconsistentField::ContainerId {
                plot_container_id,
                visual_container_id,
            } => write!(
                f,
                "container_id's in plot template and visual template do not match ({plot_container_id} != {visual_container_id})"
            ),
        }
    }
}

/// Permanent request-shape errors; retrying the same request cannot succeed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error(
        "Valid plotTemplateId '{plot_id}' but invalid visualTemplateId for object '{object_id}'; create a new visual template"
    )]
    OrphanPlotTemplate { object_id: String, plot_id: String },

    #[error(
        "Invalid plotTemplateId but valid visualTemplateId '{visual_id}' for object '{object_id}'; associate the visual template with a new plot template"
    )]
    OrphanVisualTemplate { object_id: String, visual_id: String },

    #[error("Both plotTemplateId and visualTemplateId are invalid for this objectId")]
    BothMissing,

    #[error("{field}")]
    Inconsistent { field: InconsistentField },
}

/// Check presence of both templates and that they reference each other
pub fn validate(
    plot: Option<PlotTemplate>,
    visual: Option<VisualTemplate>,
) -> Result<(PlotTemplate, VisualTemplate), ValidationError> {
    debug!(plot = ?plot, visual = ?visual, "validate: called");
    let (plot, visual) = match (plot, visual) {
        (Some(plot), Some(visual)) => (plot, visual),
        (Some(plot), None) => {
            return Err(ValidationError::OrphanPlotTemplate {
                object_id: plot.object_id,
                plot_id: plot.plot_id,
            });
        }
        (None, Some(visual)) => {
            return Err(ValidationError::OrphanVisualTemplate {
                object_id: visual.object_id,
                visual_id: visual.visual_id,
            });
        }
        (None, None) => return Err(ValidationError::BothMissing),
    };

    if plot.plot_id != visual.plot_template_id {
        return Err(ValidationError::Inconsistent {
            field: InconsistentField::PlotId {
                plot_id: plot.plot_id,
                plot_template_id: visual.plot_template_id,
            },
        });
    }

    if plot.container_id != visual.container_id {
        return Err(ValidationError::Inconsistent {
            field: InconsistentField::ContainerId {
                plot_container_id: plot.container_id,
                visual_container_id: visual.container_id,
            },
        });
    }

    Ok((plot, visual))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn plot(plot_id: &str, container_id: &str) -> PlotTemplate {
        PlotTemplate {
            object_id: "form-7".to_string(),
            plot_id: plot_id.to_string(),
            container_id: container_id.to_string(),
        }
    }

    fn visual(plot_template_id: &str, container_id: &str) -> VisualTemplate {
        VisualTemplate {
            object_id: "form-7".to_string(),
            visual_id: "V1".to_string(),
            plot_template_id: plot_template_id.to_string(),
            container_id: container_id.to_string(),
        }
    }

    #[test]
    fn test_consistent_pair_passes() {
        let (p, v) = validate(Some(plot("P1", "C1")), Some(visual("P1", "C1"))).unwrap();
        assert_eq!(p.plot_id, "P1");
        assert_eq!(v.visual_id, "V1");
    }

    #[test]
    fn test_orphan_plot() {
        let err = validate(Some(plot("P1", "C1")), None).unwrap_err();
        assert_eq!(
            err,
            ValidationError::OrphanPlotTemplate {
                object_id: "form-7".to_string(),
                plot_id: "P1".to_string()
            }
        );
        assert!(err.to_string().contains("create a new visual template"));
    }

    #[test]
    fn test_orphan_visual() {
        let err = validate(None, Some(visual("P1", "C1"))).unwrap_err();
        assert!(matches!(err, ValidationError::OrphanVisualTemplate { .. }));
    }

    #[test]
    fn test_both_missing() {
        assert_eq!(validate(None, None).unwrap_err(), ValidationError::BothMissing);
    }

    #[test]
    fn test_plot_id_mismatch() {
        let err = validate(Some(plot("P1", "C1")), Some(visual("P2", "C1"))).unwrap_err();
        assert_eq!(
            err,
            ValidationError::Inconsistent {
                field: InconsistentField::PlotId {
                    plot_id: "P1".to_string(),
                    plot_template_id: "P2".to_string()
                }
            }
        );
        assert!(err.to_string().contains("plot_id's"));
    }

    #[test]
    fn test_container_mismatch() {
        let err = validate(Some(plot("P1", "C1")), Some(visual("P1", "C2"))).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::Inconsistent {
                field: InconsistentField::ContainerId { .. }
            }
        ));
        assert!(err.to_string().contains("container_id's"));
    }

    #[test]
    fn test_both_fields_mismatch_reports_plot_id() {
        let err = validate(Some(plot("P1", "C1")), Some(visual("P2", "C2"))).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::Inconsistent {
                field: InconsistentField::PlotId { .. }
            }
        ));
    }

    proptest! {
        #[test]
        fn prop_outcome_is_total(
            has_plot in any::<bool>(),
            has_visual in any::<bool>(),
            plot_id in "[a-c]",
            plot_template_id in "[a-c]",
            plot_container in "[x-z]",
            visual_container in "[x-z]",
        ) {
            let p = has_plot.then(|| plot(&plot_id, &plot_container));
            let v = has_visual.then(|| visual(&plot_template_id, &visual_container));

            match (has_plot, has_visual, validate(p, v)) {
                (true, false, Err(ValidationError::OrphanPlotTemplate { .. })) => {}
                (false, true, Err(ValidationError::OrphanVisualTemplate { .. })) => {}
                (false, false, Err(ValidationError::BothMissing)) => {}
                (true, true, Err(ValidationError::Inconsistent { .. })) => {
                    prop_assert!(plot_id != plot_template_id || plot_container != visual_container);
                }
                (true, true, Ok(_)) => {
                    prop_assert_eq!(&plot_id, &plot_template_id);
                    prop_assert_eq!(&plot_container, &visual_container);
                }
                (p, v, outcome) => prop_assert!(false, "unexpected {:?} for plot={} visual={}", outcome, p, v),
            }
        }

        #[test]
        fn prop_any_mismatch_is_inconsistent(
            plot_id in "[a-z]{1,4}",
            plot_template_id in "[a-z]{1,4}",
            plot_container in "[a-z]{1,4}",
            visual_container in "[a-z]{1,4}",
        ) {
            prop_assume!(plot_id != plot_template_id || plot_container != visual_container);
            let result = validate(
                Some(plot(&plot_id, &plot_container)),
                Some(visual(&plot_template_id, &visual_container)),
            );
            let is_inconsistent = matches!(result, Err(ValidationError::Inconsistent { .. }));
            prop_assert!(is_inconsistent);
        }
    }
}
