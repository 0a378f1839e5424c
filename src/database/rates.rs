use bigdecimal::{BigDecimal, Zero};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use uuid::Uuid;

use crate::error::Error;
use crate::models::ProjectRole;

/// The rate that applies "right now" for an (employee, project) pair. Always
/// read live from the assignment and role tables; callers decide whether to
/// snapshot it onto an invoice line.
#[derive(Debug, Clone)]
pub struct ResolvedRate {
    pub rate: BigDecimal,
    pub role_name: Option<String>,
}

impl ResolvedRate {
    fn unassigned() -> Self {
        ResolvedRate {
            rate: BigDecimal::zero(),
            role_name: None,
        }
    }
}

/// A missing assignment, an assignment without a role, or a role row that
/// disappeared underneath us all resolve to rate 0 instead of failing.
pub(super) async fn resolve_rate(
    conn: &mut AsyncPgConnection,
    employee: Uuid,
    project: Uuid,
) -> Result<ResolvedRate, Error> {
    let assignment: Option<Option<Uuid>> = {
        use crate::schema::employee_projects::dsl::*;

        employee_projects
            .filter(employee_id.eq(employee).and(project_id.eq(project)))
            .select(role_id)
            .first(conn)
            .await
            .optional()?
    };

    let Some(Some(assigned_role)) = assignment else {
        return Ok(ResolvedRate::unassigned());
    };

    let role: Option<ProjectRole> = {
        use crate::schema::project_roles::dsl::*;

        project_roles
            .find(assigned_role)
            .first(conn)
            .await
            .optional()?
    };

    Ok(match role {
        Some(role) => ResolvedRate {
            rate: role.hourly_rate_usd,
            role_name: Some(role.name),
        },
        None => ResolvedRate::unassigned(),
    })
}
