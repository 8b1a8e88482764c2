//! Policy predicate kinds
//!
//! A predicate is a typed decision function over `(action, target_resource)`
//! returning whether it fires, plus an optional rationale. Predicates are
//! data-driven and parsed once at startup; a policy file that fails to parse
//! raises `ConfigError` rather than being silently skipped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sentinel_core::{ActionType, Resource};

/// A recurring weekly time window, evaluated against the UTC instant on the
/// proposed action. Weekdays are `0 = Monday .. 6 = Sunday`. The window is
/// represented as a single range of "minutes since Monday 00:00 UTC"; same-day,
/// forward multi-day, and Sunday-into-Monday wrap-around windows all fall out
/// of one modular comparison rather than three special cases.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TimeWindowSpec {
    pub start_weekday: u8,
    pub start_minute: u32,
    pub end_weekday: u8,
    pub end_minute: u32,
}

const MINUTES_PER_WEEK: u32 = 7 * 24 * 60;

impl TimeWindowSpec {
    fn weekly_minute(weekday: u8, minute: u32) -> u32 {
        (weekday as u32 % 7) * 1440 + (minute % 1440)
    }

    /// Start inclusive, end exclusive, per the policy predicate contract.
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        let t = Self::weekly_minute(at.weekday().num_days_from_monday() as u8, minute_of_day(at));
        let start = Self::weekly_minute(self.start_weekday, self.start_minute);
        let end = Self::weekly_minute(self.end_weekday, self.end_minute);

        if start == end {
            // Degenerate zero-width window: never fires.
            false
        } else if start < end {
            t >= start && t < end
        } else {
            // Wraps across the week boundary (e.g. Saturday -> Monday).
            t >= start || t < end
        }
    }
}

fn minute_of_day(at: DateTime<Utc>) -> u32 {
    use chrono::Timelike;
    at.hour() * 60 + at.minute()
}

/// One of the six predicate kinds the Policy Evaluator understands
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PolicyPredicate {
    /// Fires if the target's tag `tag` equals `value` and the action type is in `action_types`
    TagMatch {
        tag: String,
        value: String,
        action_types: Vec<ActionType>,
    },

    /// Fires if the action type is in `action_types`
    ActionIn { action_types: Vec<ActionType> },

    /// Fires if the action's timestamp falls inside the recurring weekly window
    TimeWindow(TimeWindowSpec),

    /// Fires if the target's resource type is in `resource_types`
    ResourceTypeIn { resource_types: Vec<String> },

    /// Fires if the target's `environment` tag is `production` or `prod`
    EnvRequiresReview,

    /// Fires if the target has at least `min_dependents` dependents and the action is destructive
    MinDependents { min_dependents: u32 },
}

impl PolicyPredicate {
    /// Evaluate this predicate against a proposed action and its (possibly
    /// unresolved) target resource. A missing resource makes every
    /// resource-attribute predicate (`tag_match`, `env_requires_review`,
    /// `min_dependents`) fail closed (does not fire) rather than panic.
    pub fn fires(
        &self,
        action_type: ActionType,
        resource_type: &str,
        timestamp: DateTime<Utc>,
        resource: Option<&Resource>,
    ) -> bool {
        match self {
            Self::TagMatch {
                tag,
                value,
                action_types,
            } => {
                action_types.contains(&action_type)
                    && resource
                        .and_then(|r| r.tags.get(tag))
                        .is_some_and(|v| v == value)
            }
            Self::ActionIn { action_types } => action_types.contains(&action_type),
            Self::TimeWindow(spec) => spec.contains(timestamp),
            Self::ResourceTypeIn { resource_types } => {
                resource_types.iter().any(|rt| rt == resource_type)
            }
            Self::EnvRequiresReview => resource
                .and_then(Resource::environment)
                .is_some_and(|env| env == "production" || env == "prod"),
            Self::MinDependents { min_dependents } => {
                action_type.is_destructive()
                    && resource.is_some_and(|r| r.dependents.len() as u32 >= *min_dependents)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn monday_17_20() -> TimeWindowSpec {
        TimeWindowSpec {
            start_weekday: 0,
            start_minute: 17 * 60,
            end_weekday: 0,
            end_minute: 20 * 60,
        }
    }

    fn on_monday(hour: u32, minute: u32, second: u32) -> DateTime<Utc> {
        // 2024-01-01 is a Monday.
        Utc.with_ymd_and_hms(2024, 1, 1, hour, minute, second).unwrap()
    }

    #[test]
    fn same_day_window_boundaries() {
        let window = monday_17_20();
        assert!(!window.contains(on_monday(16, 59, 59)));
        assert!(window.contains(on_monday(17, 0, 0)));
        assert!(window.contains(on_monday(19, 59, 59)));
        assert!(!window.contains(on_monday(20, 0, 0)));
    }

    #[test]
    fn wrap_around_window_spans_week_boundary() {
        // Saturday 22:00 -> Monday 06:00
        let window = TimeWindowSpec {
            start_weekday: 5,
            start_minute: 22 * 60,
            end_weekday: 0,
            end_minute: 6 * 60,
        };

        // Sunday at noon: inside the wrap.
        let sunday_noon = Utc.with_ymd_and_hms(2024, 1, 7, 12, 0, 0).unwrap();
        assert!(window.contains(sunday_noon));

        // Monday 05:59: still inside.
        assert!(window.contains(on_monday(5, 59, 0)));

        // Monday 06:00: window just closed.
        assert!(!window.contains(on_monday(6, 0, 0)));

        // Wednesday: well outside the wrap.
        let wednesday = Utc.with_ymd_and_hms(2024, 1, 3, 12, 0, 0).unwrap();
        assert!(!window.contains(wednesday));
    }

    #[test]
    fn forward_multi_day_window() {
        // Tuesday 09:00 -> Thursday 17:00
        let window = TimeWindowSpec {
            start_weekday: 1,
            start_minute: 9 * 60,
            end_weekday: 3,
            end_minute: 17 * 60,
        };

        let wednesday_noon = Utc.with_ymd_and_hms(2024, 1, 3, 12, 0, 0).unwrap();
        assert!(window.contains(wednesday_noon));
        assert!(!window.contains(on_monday(12, 0, 0)));
    }
}
