//! Shared column resolution by role.
//!
//! The derived analyses (cohort, churn, funnel, forecast) all need to find
//! "the user column" or "the date column" without an explicit schema. One
//! alias table lives here so every caller resolves columns the same way.

use crate::{
    infer::ColumnKind,
    profile::ColumnProfile,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Date,
    Value,
    Stage,
}

impl Role {
    fn aliases(&self) -> &'static [&'static str] {
        match self {
            Role::User => &["user", "customer", "account", "member", "client", "email"],
            Role::Date => &["date", "created", "timestamp", "time", "day", "occurred"],
            Role::Value => &["value", "amount", "revenue", "total", "price", "count", "quantity"],
            Role::Stage => &["stage", "step", "funnel", "phase", "status", "state"],
        }
    }

    /// Column kinds acceptable for this role, in preference order.
    fn preferred_kinds(&self) -> &'static [ColumnKind] {
        match self {
            Role::User => &[
                ColumnKind::Identifier,
                ColumnKind::Categorical,
                ColumnKind::Text,
            ],
            Role::Date => &[ColumnKind::DateTime],
            Role::Value => &[ColumnKind::Numeric],
            Role::Stage => &[ColumnKind::Categorical],
        }
    }
}

/// Resolve the column playing `role`, preferring an alias-name match of the
/// right kind, then any column of an acceptable kind.
pub fn resolve<'a>(profiles: &'a [ColumnProfile], role: Role) -> Option<&'a ColumnProfile> {
    let kinds = role.preferred_kinds();
    for kind in kinds {
        if let Some(profile) = profiles.iter().find(|p| {
            p.kind == *kind && name_matches(&p.name, role.aliases())
        }) {
            return Some(profile);
        }
    }
    kinds
        .iter()
        .find_map(|kind| profiles.iter().find(|p| p.kind == *kind))
}

fn name_matches(name: &str, aliases: &[&str]) -> bool {
    let lowered = name.to_ascii_lowercase();
    aliases.iter().any(|alias| lowered.contains(alias))
}
