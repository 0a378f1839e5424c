use super::DatabaseConnection;
use crate::api::projects::{AssignEmployee, CreateRole, UpdateRole};
use crate::api::time_entries::{CreateTimeEntry, TimeEntryFilter, UpdateTimeEntry};
use crate::error::Error;
use crate::models::*;

use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use uuid::Uuid;

async fn project_by_id(conn: &mut AsyncPgConnection, project: Uuid) -> Result<Project, Error> {
    use crate::schema::projects::dsl::*;

    projects
        .find(project)
        .first(conn)
        .await
        .optional()?
        .ok_or(Error::NotFound("project"))
}

/// A linked entry is already represented on an invoice line; letting it
/// change or disappear would silently falsify the invoice's recorded hours.
async fn entry_is_billed(conn: &mut AsyncPgConnection, entry: Uuid) -> Result<bool, Error> {
    use crate::schema::invoice_time_entries::dsl::*;

    Ok(diesel::select(diesel::dsl::exists(
        invoice_time_entries.filter(time_entry_id.eq(entry)),
    ))
    .get_result(conn)
    .await?)
}

impl DatabaseConnection {
    pub async fn list_roles(&mut self, project: Uuid) -> Result<Vec<ProjectRole>, Error> {
        use crate::schema::project_roles::dsl::*;

        Ok(project_roles
            .filter(project_id.eq(project))
            .order(name.asc())
            .load(&mut self.0)
            .await?)
    }

    pub async fn create_role(
        &mut self,
        project: Uuid,
        request: CreateRole,
    ) -> Result<ProjectRole, Error> {
        project_by_id(&mut self.0, project).await?;

        use crate::schema::project_roles::dsl::*;

        Ok(diesel::insert_into(project_roles)
            .values(&NewProjectRole {
                project_id: project,
                name: request.name,
                hourly_rate_usd: request.hourly_rate_usd,
            })
            .returning(project_roles::all_columns())
            .get_result(&mut self.0)
            .await?)
    }

    /// Changing a rate here deliberately does NOT touch existing invoice
    /// lines; recalculation is the explicit way to re-derive snapshots.
    pub async fn update_role(
        &mut self,
        role: Uuid,
        request: UpdateRole,
    ) -> Result<ProjectRole, Error> {
        use crate::schema::project_roles::dsl::*;

        let current: ProjectRole = project_roles
            .find(role)
            .first(&mut self.0)
            .await
            .optional()?
            .ok_or(Error::NotFound("role"))?;

        Ok(diesel::update(project_roles.find(role))
            .set((
                name.eq(request.name.unwrap_or(current.name)),
                hourly_rate_usd.eq(request.hourly_rate_usd.unwrap_or(current.hourly_rate_usd)),
            ))
            .returning(project_roles::all_columns())
            .get_result(&mut self.0)
            .await?)
    }

    pub async fn delete_role(&mut self, role: Uuid) -> Result<(), Error> {
        self.0
            .transaction::<_, Error, _>(|conn| {
                async move {
                    let assigned: i64 = {
                        use crate::schema::employee_projects::dsl::*;
                        employee_projects
                            .filter(role_id.eq(role))
                            .count()
                            .get_result(conn)
                            .await?
                    };
                    if assigned > 0 {
                        return Err(Error::RoleInUse);
                    }

                    let deleted = {
                        use crate::schema::project_roles::dsl::*;
                        diesel::delete(project_roles.find(role)).execute(conn).await?
                    };
                    if deleted == 0 {
                        return Err(Error::NotFound("role"));
                    }

                    Ok(())
                }
                .scope_boxed()
            })
            .await
    }

    /// Upserts the single (employee, project) assignment; assigning again
    /// replaces the role.
    pub async fn assign_employee(
        &mut self,
        project: Uuid,
        request: AssignEmployee,
    ) -> Result<ProjectAssignment, Error> {
        self.0
            .transaction::<_, Error, _>(|conn| {
                async move {
                    project_by_id(conn, project).await?;

                    {
                        use crate::schema::employees::dsl::*;
                        employees
                            .find(request.employee_id)
                            .first::<Employee>(conn)
                            .await
                            .optional()?
                            .ok_or(Error::NotFound("employee"))?;
                    }

                    if let Some(role) = request.role_id {
                        use crate::schema::project_roles::dsl::*;
                        let owner: Option<Uuid> = project_roles
                            .find(role)
                            .select(project_id)
                            .first(conn)
                            .await
                            .optional()?;
                        match owner {
                            None => return Err(Error::NotFound("role")),
                            Some(owner) if owner != project => {
                                return Err(Error::Validation(
                                    "role does not belong to this project",
                                ))
                            }
                            Some(_) => {}
                        }
                    }

                    {
                        use crate::schema::employee_projects::dsl::*;

                        Ok(diesel::insert_into(employee_projects)
                            .values(&NewProjectAssignment {
                                employee_id: request.employee_id,
                                project_id: project,
                                role_id: request.role_id,
                                assigned_by: request.assigned_by,
                            })
                            .on_conflict((employee_id, project_id))
                            .do_update()
                            .set((
                                role_id.eq(request.role_id),
                                assigned_by.eq(request.assigned_by),
                                assigned_at.eq(diesel::dsl::now),
                            ))
                            .returning(employee_projects::all_columns())
                            .get_result(conn)
                            .await?)
                    }
                }
                .scope_boxed()
            })
            .await
    }

    pub async fn unassign_employee(&mut self, project: Uuid, employee: Uuid) -> Result<(), Error> {
        use crate::schema::employee_projects::dsl::*;

        let deleted = diesel::delete(
            employee_projects.filter(employee_id.eq(employee).and(project_id.eq(project))),
        )
        .execute(&mut self.0)
        .await?;
        if deleted == 0 {
            return Err(Error::NotFound("assignment"));
        }

        Ok(())
    }

    pub async fn list_time_entries(
        &mut self,
        filter: TimeEntryFilter,
    ) -> Result<Vec<TimeEntry>, Error> {
        use crate::schema::time_entries::dsl::*;

        let mut query = time_entries.order(date.desc()).into_boxed();
        if let Some(project) = filter.project_id {
            query = query.filter(project_id.eq(project));
        }
        if let Some(employee) = filter.employee_id {
            query = query.filter(employee_id.eq(employee));
        }

        Ok(query.load(&mut self.0).await?)
    }

    /// Hours on internal projects are never billable, whatever the caller
    /// asked for.
    pub async fn create_time_entry(
        &mut self,
        request: CreateTimeEntry,
    ) -> Result<TimeEntry, Error> {
        let project = project_by_id(&mut self.0, request.project_id).await?;

        {
            use crate::schema::employees::dsl::*;
            employees
                .find(request.employee_id)
                .first::<Employee>(&mut self.0)
                .await
                .optional()?
                .ok_or(Error::NotFound("employee"))?;
        }

        use crate::schema::time_entries::dsl::*;

        Ok(diesel::insert_into(time_entries)
            .values(&NewTimeEntry {
                employee_id: request.employee_id,
                project_id: request.project_id,
                date: request.date,
                hours: request.hours,
                billable: request.billable && !project.is_internal,
                status: TimeEntryStatus::Normal,
                notes: request.notes,
            })
            .returning(time_entries::all_columns())
            .get_result(&mut self.0)
            .await?)
    }

    pub async fn update_time_entry(
        &mut self,
        entry: Uuid,
        request: UpdateTimeEntry,
    ) -> Result<TimeEntry, Error> {
        self.0
            .transaction::<_, Error, _>(|conn| {
                async move {
                    let current: TimeEntry = {
                        use crate::schema::time_entries::dsl::*;
                        time_entries
                            .find(entry)
                            .first(conn)
                            .await
                            .optional()?
                            .ok_or(Error::NotFound("time entry"))?
                    };
                    if entry_is_billed(conn, entry).await? {
                        return Err(Error::DuplicateBilling);
                    }

                    let project = project_by_id(conn, current.project_id).await?;

                    use crate::schema::time_entries::dsl::*;

                    Ok(diesel::update(time_entries.find(entry))
                        .set((
                            date.eq(request.date.unwrap_or(current.date)),
                            hours.eq(request.hours.unwrap_or(current.hours)),
                            billable.eq(request.billable.unwrap_or(current.billable)
                                && !project.is_internal),
                            status.eq(request.status.unwrap_or(current.status)),
                            notes.eq(request.notes.or(current.notes)),
                        ))
                        .returning(time_entries::all_columns())
                        .get_result(conn)
                        .await?)
                }
                .scope_boxed()
            })
            .await
    }

    pub async fn delete_time_entry(&mut self, entry: Uuid) -> Result<(), Error> {
        self.0
            .transaction::<_, Error, _>(|conn| {
                async move {
                    if entry_is_billed(conn, entry).await? {
                        return Err(Error::DuplicateBilling);
                    }

                    let deleted = {
                        use crate::schema::time_entries::dsl::*;
                        diesel::delete(time_entries.find(entry)).execute(conn).await?
                    };
                    if deleted == 0 {
                        return Err(Error::NotFound("time entry"));
                    }

                    Ok(())
                }
                .scope_boxed()
            })
            .await
    }
}
