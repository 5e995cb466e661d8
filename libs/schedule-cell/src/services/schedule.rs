use chrono::{NaiveDate, Utc};
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use room_cell::{Room, RoomService, RoomStatus};
use shared_config::AppConfig;
use shared_database::{eq_filter, SupabaseClient};
use shared_models::auth::User;
use shared_models::pagination::{Page, PageQuery};
use staff_cell::{AccountService, StaffKind, UserStatus};

use crate::models::{
    CreateScheduleRequest, Schedule, ScheduleError, ScheduleSearchQuery, ScheduleSlot, ScheduleStatus,
    UpdateScheduleRequest,
};
use crate::services::generator::{date_bounds, expand, find_conflicts};

const TABLE: &str = "schedules";

pub struct ScheduleService {
    supabase: SupabaseClient,
    rooms: RoomService,
    accounts: AccountService,
}

impl ScheduleService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            rooms: RoomService::new(config),
            accounts: AccountService::new(config),
        }
    }

    pub async fn list_schedules(
        &self,
        query: ScheduleSearchQuery,
        auth_token: Option<&str>,
    ) -> Result<Page<Schedule>, ScheduleError> {
        debug!("Listing schedules: {:?}", query);

        let mut query_parts = vec!["select=*".to_string()];
        if let Some(staff_type) = query.staff_type {
            query_parts.push(format!("staff_type=eq.{}", staff_type.as_str()));
        }
        if let Some(staff_id) = query.staff_id {
            query_parts.push(format!("staff_id=eq.{}", staff_id));
        }
        if let Some(room_id) = query.room_id {
            query_parts.push(format!("room_id=eq.{}", room_id));
        }
        if let Some(status) = query.status {
            query_parts.push(format!("status=eq.{}", status.as_str()));
        }
        if let Some(date_from) = query.date_from {
            query_parts.push(format!("work_date=gte.{}", date_from));
        }
        if let Some(date_to) = query.date_to {
            query_parts.push(format!("work_date=lte.{}", date_to));
        }
        query_parts.push("order=work_date.asc,start_time.asc".to_string());

        let schedules: Vec<Schedule> = self.supabase
            .select(TABLE, &query_parts.join("&"), auth_token)
            .await?;

        Ok(Page::paginate(schedules, &PageQuery { page: query.page, per_page: query.per_page }))
    }

    pub async fn get_schedule(&self, schedule_id: Uuid, auth_token: &str) -> Result<Schedule, ScheduleError> {
        self.supabase
            .select_one(TABLE, &eq_filter("id", &schedule_id.to_string()), Some(auth_token))
            .await?
            .ok_or(ScheduleError::NotFound)
    }

    /// The caller's own schedules, resolved from the account id in the token.
    pub async fn my_schedules(
        &self,
        user: &User,
        kind: StaffKind,
        mut query: ScheduleSearchQuery,
        auth_token: &str,
    ) -> Result<Page<Schedule>, ScheduleError> {
        let staff_id = self.accounts
            .staff_id_for_user(kind, &user.id, auth_token)
            .await?
            .ok_or(ScheduleError::NoStaffProfile(kind.label()))?;

        query.staff_id = Some(staff_id);
        query.staff_type = Some(kind);
        self.list_schedules(query, Some(auth_token)).await
    }

    async fn schedulable_room(&self, room_id: Uuid, auth_token: &str) -> Result<Room, ScheduleError> {
        let room = self.rooms.get_room(room_id, auth_token).await?;
        if room.status == RoomStatus::Maintenance {
            return Err(ScheduleError::RoomUnderMaintenance(room.room_number));
        }
        Ok(room)
    }

    async fn ensure_staff(&self, kind: StaffKind, staff_id: Uuid, auth_token: &str) -> Result<(), ScheduleError> {
        match self.accounts.staff_status(kind, staff_id, auth_token).await? {
            None => Err(ScheduleError::UnknownStaff(kind.label())),
            Some(UserStatus::Inactive) => Err(ScheduleError::InactiveStaff(kind.label())),
            Some(UserStatus::Active) => Ok(()),
        }
    }

    /// Active rows in `[from, to]` that belong to the staff member or the room.
    async fn bookings_between(
        &self,
        slot: &ScheduleSlot,
        from: NaiveDate,
        to: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<Schedule>, ScheduleError> {
        let query = format!(
            "select=*&work_date=gte.{}&work_date=lte.{}&status=neq.cancelled&or=(and(staff_id.eq.{},staff_type.eq.{}),room_id.eq.{})",
            from,
            to,
            slot.staff_id,
            slot.staff_type.as_str(),
            slot.room_id
        );
        Ok(self.supabase.select(TABLE, &query, Some(auth_token)).await?)
    }

    async fn ensure_no_conflicts(
        &self,
        slots: &[ScheduleSlot],
        exclude_id: Option<Uuid>,
        auth_token: &str,
    ) -> Result<(), ScheduleError> {
        let Some((from, to)) = date_bounds(slots) else {
            return Ok(());
        };

        let existing = self.bookings_between(&slots[0], from, to, auth_token).await?;
        let conflicts = find_conflicts(slots, &existing, exclude_id);
        if !conflicts.is_empty() {
            warn!("Rejecting schedule with {} conflicts", conflicts.len());
            return Err(ScheduleError::Conflicts(conflicts));
        }
        Ok(())
    }

    pub async fn create_schedules(
        &self,
        request: CreateScheduleRequest,
        auth_token: &str,
    ) -> Result<Vec<Schedule>, ScheduleError> {
        let slots = expand(&request)?;
        debug!("Expanded schedule request into {} rows", slots.len());

        tokio::try_join!(
            self.ensure_staff(request.staff_type, request.staff_id, auth_token),
            self.schedulable_room(request.room_id, auth_token),
        )?;
        self.ensure_no_conflicts(&slots, None, auth_token).await?;

        let now = Utc::now().to_rfc3339();
        let rows: Vec<Value> = slots
            .iter()
            .map(|slot| {
                json!({
                    "staff_id": slot.staff_id,
                    "staff_type": slot.staff_type,
                    "room_id": slot.room_id,
                    "work_date": slot.work_date,
                    "start_time": slot.start_time,
                    "end_time": slot.end_time,
                    "status": ScheduleStatus::Scheduled,
                    "notes": request.notes,
                    "created_at": now,
                    "updated_at": now
                })
            })
            .collect();

        let created: Vec<Schedule> = self.supabase.insert(TABLE, Value::Array(rows), Some(auth_token)).await?;
        if created.is_empty() {
            return Err(ScheduleError::WriteFailed("create"));
        }

        info!(
            "Created {} schedules for {} {}",
            created.len(),
            request.staff_type.as_str(),
            request.staff_id
        );
        Ok(created)
    }

    pub async fn update_schedule(
        &self,
        schedule_id: Uuid,
        request: UpdateScheduleRequest,
        auth_token: &str,
    ) -> Result<Schedule, ScheduleError> {
        let existing = self.get_schedule(schedule_id, auth_token).await?;

        let (start_time, end_time) = match request.shift {
            Some(shift) => (shift.start_time(), shift.end_time()),
            None => (
                request.start_time.unwrap_or(existing.start_time),
                request.end_time.unwrap_or(existing.end_time),
            ),
        };
        if start_time >= end_time {
            return Err(ScheduleError::Validation("Start time must be before end time".to_string()));
        }

        let slot = ScheduleSlot {
            staff_id: existing.staff_id,
            staff_type: existing.staff_type,
            room_id: request.room_id.unwrap_or(existing.room_id),
            work_date: request.work_date.unwrap_or(existing.work_date),
            start_time,
            end_time,
        };
        let status = request.status.unwrap_or(existing.status);

        if slot.room_id != existing.room_id {
            self.schedulable_room(slot.room_id, auth_token).await?;
        }

        let moved = slot.room_id != existing.room_id
            || slot.work_date != existing.work_date
            || slot.start_time != existing.start_time
            || slot.end_time != existing.end_time;
        let reactivated = existing.status == ScheduleStatus::Cancelled && status != ScheduleStatus::Cancelled;
        if status != ScheduleStatus::Cancelled && (moved || reactivated) {
            self.ensure_no_conflicts(std::slice::from_ref(&slot), Some(schedule_id), auth_token).await?;
        }

        let mut update_data = serde_json::Map::new();
        update_data.insert("work_date".to_string(), json!(slot.work_date));
        update_data.insert("start_time".to_string(), json!(slot.start_time));
        update_data.insert("end_time".to_string(), json!(slot.end_time));
        update_data.insert("room_id".to_string(), json!(slot.room_id));
        update_data.insert("status".to_string(), json!(status));
        if let Some(notes) = request.notes {
            update_data.insert("notes".to_string(), json!(notes));
        }
        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let updated: Vec<Schedule> = self.supabase
            .update(TABLE, &eq_filter("id", &schedule_id.to_string()), Value::Object(update_data), Some(auth_token))
            .await?;

        info!("Updated schedule {}", schedule_id);
        updated.into_iter().next().ok_or(ScheduleError::NotFound)
    }

    pub async fn delete_schedule(&self, schedule_id: Uuid, auth_token: &str) -> Result<(), ScheduleError> {
        let deleted = self.supabase
            .delete(TABLE, &eq_filter("id", &schedule_id.to_string()), Some(auth_token))
            .await?;
        if deleted.is_empty() {
            return Err(ScheduleError::NotFound);
        }

        info!("Deleted schedule {}", schedule_id);
        Ok(())
    }
}
