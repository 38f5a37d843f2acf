//! Lexical normalization rules independent of reference data.

use crate::domain::TargetField;

const UNSPECIFIED_GRID_PHRASES: [&str; 3] = ["cannot specify", "can't specify", "cannot be specified"];

/// Normalized value for `field`, or `None` when no rule applies.
///
/// Every rule's output is a fixed point of the same rule, so applying the
/// table twice changes nothing.
pub(super) fn normalize(field: &TargetField, value: &str) -> Option<&'static str> {
    let trimmed = value.trim();
    match field {
        TargetField::WidthUom if trimmed.eq_ignore_ascii_case("inches") => Some("\""),
        TargetField::Uom
            if trimmed.eq_ignore_ascii_case("yd") || trimmed.eq_ignore_ascii_case("yds") =>
        {
            Some("Yards")
        }
        TargetField::MaterialMasterGrid => {
            let lowered = value.to_lowercase();
            UNSPECIFIED_GRID_PHRASES
                .iter()
                .any(|phrase| lowered.contains(phrase))
                .then_some("No Grid")
        }
        TargetField::SourceType if trimmed.is_empty() => Some("Nominated"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(TargetField::WidthUom, "inches", Some("\""))]
    #[case(TargetField::WidthUom, " INCHES ", Some("\""))]
    #[case(TargetField::WidthUom, "cm", None)]
    #[case(TargetField::Uom, "Yds", Some("Yards"))]
    #[case(TargetField::Uom, "yd", Some("Yards"))]
    #[case(TargetField::Uom, "Yards", None)]
    #[case(TargetField::MaterialMasterGrid, "Customer cannot specify grid", Some("No Grid"))]
    #[case(TargetField::MaterialMasterGrid, "CAN'T SPECIFY", Some("No Grid"))]
    #[case(TargetField::MaterialMasterGrid, "grid cannot be specified", Some("No Grid"))]
    #[case(TargetField::MaterialMasterGrid, "Grid A", None)]
    #[case(TargetField::SourceType, "", Some("Nominated"))]
    #[case(TargetField::SourceType, "   ", Some("Nominated"))]
    #[case(TargetField::SourceType, "Open", None)]
    #[case(TargetField::Other("Notes".to_owned()), "inches", None)]
    fn applies_rule_table(
        #[case] field: TargetField,
        #[case] value: &str,
        #[case] expected: Option<&str>,
    ) {
        assert_eq!(normalize(&field, value), expected);
    }

    #[rstest]
    #[case(TargetField::WidthUom, "inches")]
    #[case(TargetField::Uom, "yds")]
    #[case(TargetField::MaterialMasterGrid, "cannot specify")]
    #[case(TargetField::SourceType, " ")]
    fn outputs_are_fixed_points(#[case] field: TargetField, #[case] value: &str) {
        let once = normalize(&field, value).expect("rule applies");
        assert_eq!(normalize(&field, once).unwrap_or(once), once);
    }
}
