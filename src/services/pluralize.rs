//! Unit pluralization for shopping-list phrasing.
//!
//! A unit carries a singular name and up to two plural forms; numeric
//! thresholds pick the form ("1 шт", "3 штуки", "10 штук"). Some units
//! never take a count at all ("по вкусу").

use crate::config::PluralizationConfig;

/// The forms of one unit, borrowed from catalog data.
#[derive(Debug, Clone, Copy)]
pub struct UnitForms<'a> {
    pub singular: &'a str,
    pub first: Option<&'a str>,
    pub second: Option<&'a str>,
}

/// Render `amount` of a unit according to the configured thresholds.
/// Missing plural forms fall back to the singular name.
#[must_use]
pub fn phrase(policy: &PluralizationConfig, forms: &UnitForms<'_>, amount: i64) -> String {
    if policy
        .invariant_units
        .iter()
        .any(|u| u == forms.singular)
    {
        return forms.singular.to_string();
    }

    let unit = if amount <= policy.singular_max {
        forms.singular
    } else if amount < policy.second_form_min {
        forms.first.unwrap_or(forms.singular)
    } else {
        forms.second.unwrap_or(forms.singular)
    };

    format!("{amount} {unit}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> PluralizationConfig {
        PluralizationConfig {
            singular_max: 1,
            second_form_min: 5,
            invariant_units: vec!["по вкусу".to_string()],
        }
    }

    const PIECES: UnitForms<'_> = UnitForms {
        singular: "шт",
        first: Some("штуки"),
        second: Some("штук"),
    };

    #[test]
    fn singular_at_threshold() {
        assert_eq!(phrase(&policy(), &PIECES, 1), "1 шт");
    }

    #[test]
    fn first_form_between_thresholds() {
        assert_eq!(phrase(&policy(), &PIECES, 3), "3 штуки");
    }

    #[test]
    fn second_form_at_and_above_threshold() {
        assert_eq!(phrase(&policy(), &PIECES, 5), "5 штук");
        assert_eq!(phrase(&policy(), &PIECES, 10), "10 штук");
    }

    #[test]
    fn invariant_unit_renders_bare() {
        let forms = UnitForms {
            singular: "по вкусу",
            first: None,
            second: None,
        };
        assert_eq!(phrase(&policy(), &forms, 3), "по вкусу");
    }

    #[test]
    fn missing_forms_fall_back_to_singular() {
        let forms = UnitForms {
            singular: "г",
            first: None,
            second: None,
        };
        assert_eq!(phrase(&policy(), &forms, 200), "200 г");
    }
}
