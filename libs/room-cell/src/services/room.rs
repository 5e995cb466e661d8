use std::collections::HashSet;

use chrono::Utc;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{blocking_references, eq_filter, DependencyCheck, SupabaseClient};
use shared_models::pagination::{Page, PageQuery};
use shared_utils::validation::require_non_empty;

use crate::models::{
    AvailableRoomsQuery, CreateRoomRequest, Room, RoomBooking, RoomError, RoomSearchQuery,
    RoomStatus, UpdateRoomRequest,
};

const TABLE: &str = "rooms";

pub const ROOM_DEPENDENCIES: [DependencyCheck; 3] = [
    DependencyCheck::new("schedules", "room_id", "schedules"),
    DependencyCheck::new("appointments", "room_id", "appointments"),
    DependencyCheck::new("test_results", "room_id", "test results"),
];

pub struct RoomService {
    supabase: SupabaseClient,
}

impl RoomService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn list_rooms(
        &self,
        query: RoomSearchQuery,
        auth_token: &str,
    ) -> Result<Page<Room>, RoomError> {
        debug!("Listing rooms: {:?}", query);

        let mut query_parts = vec!["select=*".to_string()];
        if let Some(room_type) = query.room_type {
            query_parts.push(format!("room_type=eq.{}", room_type.as_str()));
        }
        if let Some(status) = query.status {
            query_parts.push(format!("status=eq.{}", status.as_str()));
        }
        if let Some(specialty_id) = query.specialty_id {
            query_parts.push(format!("specialty_id=eq.{}", specialty_id));
        }
        query_parts.push("order=room_number.asc".to_string());

        let rooms: Vec<Room> = self.supabase
            .select(TABLE, &query_parts.join("&"), Some(auth_token))
            .await?;

        let needle = query.name.as_deref().map(str::trim).filter(|n| !n.is_empty());
        let filtered = rooms
            .into_iter()
            .filter(|room| needle.map_or(true, |n| room.room_number.contains(n)))
            .collect();

        Ok(Page::paginate(filtered, &PageQuery { page: query.page, per_page: query.per_page }))
    }

    pub async fn get_room(&self, room_id: Uuid, auth_token: &str) -> Result<Room, RoomError> {
        self.supabase
            .select_one(TABLE, &eq_filter("id", &room_id.to_string()), Some(auth_token))
            .await?
            .ok_or(RoomError::NotFound)
    }

    async fn ensure_unique_number(
        &self,
        room_number: &str,
        exclude_id: Option<Uuid>,
        auth_token: &str,
    ) -> Result<(), RoomError> {
        let mut filter = eq_filter("room_number", room_number);
        if let Some(id) = exclude_id {
            filter.push_str(&format!("&id=neq.{}", id));
        }

        if self.supabase.exists(TABLE, &filter, Some(auth_token)).await? {
            return Err(RoomError::DuplicateNumber(room_number.to_string()));
        }
        Ok(())
    }

    fn validate_capacity(capacity: i32) -> Result<(), RoomError> {
        if capacity <= 0 {
            return Err(RoomError::Validation("Capacity must be greater than zero".to_string()));
        }
        Ok(())
    }

    pub async fn create_room(
        &self,
        request: CreateRoomRequest,
        auth_token: &str,
    ) -> Result<Room, RoomError> {
        let room_number = request.room_number.trim().to_string();
        require_non_empty("Room number", &room_number).map_err(RoomError::Validation)?;
        Self::validate_capacity(request.capacity)?;
        self.ensure_unique_number(&room_number, None, auth_token).await?;

        let now = Utc::now().to_rfc3339();
        let data = json!({
            "room_number": room_number,
            "room_type": request.room_type,
            "capacity": request.capacity,
            "status": request.status.unwrap_or_default(),
            "specialty_id": request.specialty_id,
            "notes": request.notes,
            "created_at": now,
            "updated_at": now
        });

        let created: Vec<Room> = self.supabase.insert(TABLE, data, Some(auth_token)).await?;
        let room = created.into_iter().next().ok_or(RoomError::WriteFailed("create"))?;

        info!("Created room {} ({})", room.room_number, room.id);
        Ok(room)
    }

    pub async fn update_room(
        &self,
        room_id: Uuid,
        request: UpdateRoomRequest,
        auth_token: &str,
    ) -> Result<Room, RoomError> {
        let existing = self.get_room(room_id, auth_token).await?;

        let mut update_data = serde_json::Map::new();

        if let Some(room_number) = request.room_number.as_deref().map(str::trim) {
            require_non_empty("Room number", room_number).map_err(RoomError::Validation)?;
            if room_number != existing.room_number {
                self.ensure_unique_number(room_number, Some(room_id), auth_token).await?;
            }
            update_data.insert("room_number".to_string(), json!(room_number));
        }
        if let Some(room_type) = request.room_type {
            update_data.insert("room_type".to_string(), json!(room_type));
        }
        if let Some(capacity) = request.capacity {
            Self::validate_capacity(capacity)?;
            update_data.insert("capacity".to_string(), json!(capacity));
        }
        if let Some(status) = request.status {
            update_data.insert("status".to_string(), json!(status));
        }
        if let Some(specialty_id) = request.specialty_id {
            update_data.insert("specialty_id".to_string(), json!(specialty_id));
        }
        if let Some(notes) = request.notes {
            update_data.insert("notes".to_string(), json!(notes));
        }

        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let updated: Vec<Room> = self.supabase
            .update(TABLE, &eq_filter("id", &room_id.to_string()), Value::Object(update_data), Some(auth_token))
            .await?;

        info!("Updated room {}", room_id);
        updated.into_iter().next().ok_or(RoomError::NotFound)
    }

    pub async fn update_status(
        &self,
        room_id: Uuid,
        status: RoomStatus,
        auth_token: &str,
    ) -> Result<Room, RoomError> {
        let updated: Vec<Room> = self.supabase
            .update(
                TABLE,
                &eq_filter("id", &room_id.to_string()),
                json!({
                    "status": status,
                    "updated_at": Utc::now().to_rfc3339()
                }),
                Some(auth_token),
            )
            .await?;

        info!("Room {} is now {}", room_id, status.as_str());
        updated.into_iter().next().ok_or(RoomError::NotFound)
    }

    /// Rooms marked available with no active schedule overlapping the requested window.
    pub async fn list_available_rooms(
        &self,
        query: AvailableRoomsQuery,
        auth_token: &str,
    ) -> Result<Vec<Room>, RoomError> {
        if query.start_time >= query.end_time {
            return Err(RoomError::Validation("Start time must be before end time".to_string()));
        }

        let mut room_query = "select=*&status=eq.available&order=room_number.asc".to_string();
        if let Some(room_type) = query.room_type {
            room_query.push_str(&format!("&room_type=eq.{}", room_type.as_str()));
        }
        let bookings_query = format!(
            "select=room_id,start_time,end_time&work_date=eq.{}&status=neq.cancelled",
            query.work_date
        );

        let (rooms, bookings) = tokio::try_join!(
            self.supabase.select::<Room>(TABLE, &room_query, Some(auth_token)),
            self.supabase.select::<RoomBooking>("schedules", &bookings_query, Some(auth_token)),
        )?;

        let taken: HashSet<Uuid> = bookings
            .into_iter()
            .filter(|b| b.start_time < query.end_time && query.start_time < b.end_time)
            .map(|b| b.room_id)
            .collect();

        Ok(rooms.into_iter().filter(|room| !taken.contains(&room.id)).collect())
    }

    pub async fn delete_room(&self, room_id: Uuid, auth_token: &str) -> Result<(), RoomError> {
        let id = room_id.to_string();

        let blocking = blocking_references(&self.supabase, &ROOM_DEPENDENCIES, &id, Some(auth_token)).await?;
        if !blocking.is_empty() {
            warn!("Refusing to delete room {}: referenced by {:?}", id, blocking);
            return Err(RoomError::InUse(blocking));
        }

        let deleted = self.supabase.delete(TABLE, &eq_filter("id", &id), Some(auth_token)).await?;
        if deleted.is_empty() {
            return Err(RoomError::NotFound);
        }

        info!("Deleted room {}", id);
        Ok(())
    }
}
