//! Room registry and lifecycle
//!
//! Tracks every running room and the players in them. Each room runs on its
//! own spawned task; rooms share no mutable state with each other.

use std::sync::Arc;

use hashbrown::HashMap;
use tokio::sync::{watch, RwLock};
use uuid::Uuid;

use crate::game::state::PlayerId;
use crate::health::ServerStats;
use crate::lobby::room::{start_room_loop, GameRoom, RoomError};

/// A running room and its driver task
pub struct RoomHandle {
    pub room: Arc<RwLock<GameRoom>>,
    shutdown_tx: watch::Sender<bool>,
    task: tokio::task::JoinHandle<()>,
}

/// Lobby manager for all game rooms
pub struct LobbyManager {
    rooms: HashMap<Uuid, RoomHandle>,
    player_rooms: HashMap<PlayerId, Uuid>,
    max_rooms: usize,
    max_humans_per_room: usize,
    stats: Arc<ServerStats>,
}

impl LobbyManager {
    pub fn new(max_rooms: usize, max_humans_per_room: usize, stats: Arc<ServerStats>) -> Self {
        Self {
            rooms: HashMap::new(),
            player_rooms: HashMap::new(),
            max_rooms,
            max_humans_per_room,
            stats,
        }
    }

    /// Create a new room and start its tick driver
    pub fn create_room(&mut self, name: String) -> Result<Uuid, ManagerError> {
        if self.rooms.len() >= self.max_rooms {
            return Err(ManagerError::TooManyRooms);
        }

        let room = GameRoom::new(name, self.max_humans_per_room);
        let id = room.id();
        let room = Arc::new(RwLock::new(room));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = start_room_loop(room.clone(), self.stats.clone(), shutdown_rx);

        self.rooms.insert(
            id,
            RoomHandle {
                room,
                shutdown_tx,
                task,
            },
        );
        Ok(id)
    }

    /// Find a room with space for another human, creating one if needed
    pub async fn find_or_create_room(&mut self) -> Result<Uuid, ManagerError> {
        for (id, handle) in &self.rooms {
            if !handle.room.read().await.is_full() {
                return Ok(*id);
            }
        }
        self.create_room(format!("Game {}", self.rooms.len() + 1))
    }

    pub fn get_room(&self, room_id: Uuid) -> Option<Arc<RwLock<GameRoom>>> {
        self.rooms.get(&room_id).map(|h| h.room.clone())
    }

    /// Join a player to a room; returns the assigned player id
    pub async fn join_room(
        &mut self,
        room_id: Uuid,
        username: Option<String>,
    ) -> Result<PlayerId, ManagerError> {
        let handle = self
            .rooms
            .get(&room_id)
            .ok_or(ManagerError::RoomNotFound)?;

        let player_id = handle
            .room
            .write()
            .await
            .add_player(username)
            .map_err(ManagerError::RoomError)?;
        self.player_rooms.insert(player_id.clone(), room_id);
        Ok(player_id)
    }

    /// Leave the current room; empty rooms are shut down and dropped
    pub async fn leave_room(&mut self, player_id: &str) -> Result<(), ManagerError> {
        let room_id = self
            .player_rooms
            .remove(player_id)
            .ok_or(ManagerError::NotInRoom)?;

        let mut drop_room = false;
        if let Some(handle) = self.rooms.get(&room_id) {
            let mut room = handle.room.write().await;
            room.remove_player(player_id);
            drop_room = room.is_empty();
        }

        if drop_room {
            self.shutdown_room(room_id).await;
        }
        Ok(())
    }

    pub fn get_player_room(&self, player_id: &str) -> Option<Uuid> {
        self.player_rooms.get(player_id).copied()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn total_player_count(&self) -> usize {
        self.player_rooms.len()
    }

    /// Stop one room's driver and drop it
    pub async fn shutdown_room(&mut self, room_id: Uuid) {
        if let Some(handle) = self.rooms.remove(&room_id) {
            let _ = handle.shutdown_tx.send(true);
            let _ = handle.task.await;
            self.player_rooms.retain(|_, r| *r != room_id);
        }
    }

    /// Refresh the process-wide gauges from every room's world
    pub async fn refresh_stats(&self) {
        use std::sync::atomic::Ordering;

        let mut total = 0u64;
        let mut humans = 0u64;
        let mut bots = 0u64;
        for handle in self.rooms.values() {
            let room = handle.room.read().await;
            let state = room.game_state();
            total += state.len() as u64;
            humans += state.human_count() as u64;
            bots += state.bot_count() as u64;
        }
        self.stats.rooms_active.store(self.rooms.len() as u64, Ordering::Relaxed);
        self.stats.players_total.store(total, Ordering::Relaxed);
        self.stats.players_human.store(humans, Ordering::Relaxed);
        self.stats.players_bot.store(bots, Ordering::Relaxed);
    }

    /// Stop every room; called on server shutdown
    pub async fn shutdown_all_rooms(&mut self) {
        let ids: Vec<Uuid> = self.rooms.keys().copied().collect();
        for id in ids {
            self.shutdown_room(id).await;
        }
        self.player_rooms.clear();
    }
}

/// Manager errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ManagerError {
    #[error("Too many rooms")]
    TooManyRooms,
    #[error("Room not found")]
    RoomNotFound,
    #[error("Not in a room")]
    NotInRoom,
    #[error("Room error: {0}")]
    RoomError(#[from] RoomError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_room() {
        let mut manager = LobbyManager::new(10, 10, Arc::new(ServerStats::new()));
        let room_id = manager.create_room("Test Room".to_string()).unwrap();

        assert!(manager.get_room(room_id).is_some());
        assert_eq!(manager.room_count(), 1);
        manager.shutdown_all_rooms().await;
    }

    #[tokio::test]
    async fn test_max_rooms() {
        let mut manager = LobbyManager::new(2, 10, Arc::new(ServerStats::new()));
        manager.create_room("Room 1".to_string()).unwrap();
        manager.create_room("Room 2".to_string()).unwrap();

        let result = manager.create_room("Room 3".to_string());
        assert!(matches!(result, Err(ManagerError::TooManyRooms)));
        manager.shutdown_all_rooms().await;
    }

    #[tokio::test]
    async fn test_join_and_leave_room() {
        let mut manager = LobbyManager::new(10, 10, Arc::new(ServerStats::new()));
        let room_id = manager.create_room("Test".to_string()).unwrap();

        let player_id = manager
            .join_room(room_id, Some("alice".to_string()))
            .await
            .unwrap();
        assert_eq!(manager.get_player_room(&player_id), Some(room_id));
        assert_eq!(manager.total_player_count(), 1);

        manager.leave_room(&player_id).await.unwrap();
        assert!(manager.get_player_room(&player_id).is_none());
        // Emptied room is dropped
        assert_eq!(manager.room_count(), 0);
        manager.shutdown_all_rooms().await;
    }

    #[tokio::test]
    async fn test_leave_unknown_player() {
        let mut manager = LobbyManager::new(10, 10, Arc::new(ServerStats::new()));
        let result = manager.leave_room("ghost").await;
        assert!(matches!(result, Err(ManagerError::NotInRoom)));
    }

    #[tokio::test]
    async fn test_find_or_create_room() {
        let mut manager = LobbyManager::new(10, 10, Arc::new(ServerStats::new()));

        let room_id1 = manager.find_or_create_room().await.unwrap();
        assert_eq!(manager.room_count(), 1);

        let room_id2 = manager.find_or_create_room().await.unwrap();
        assert_eq!(room_id1, room_id2);
        manager.shutdown_all_rooms().await;
    }

    #[tokio::test]
    async fn test_full_room_spills_over() {
        let mut manager = LobbyManager::new(10, 1, Arc::new(ServerStats::new()));
        let room_id1 = manager.find_or_create_room().await.unwrap();
        manager
            .join_room(room_id1, Some("p1".to_string()))
            .await
            .unwrap();

        let room_id2 = manager.find_or_create_room().await.unwrap();
        assert_ne!(room_id1, room_id2);
        assert_eq!(manager.room_count(), 2);
        manager.shutdown_all_rooms().await;
    }

    #[tokio::test]
    async fn test_shutdown_all_rooms() {
        let mut manager = LobbyManager::new(10, 10, Arc::new(ServerStats::new()));
        let room_id = manager.create_room("Test".to_string()).unwrap();
        manager
            .join_room(room_id, Some("p1".to_string()))
            .await
            .unwrap();

        manager.shutdown_all_rooms().await;
        assert_eq!(manager.room_count(), 0);
        assert_eq!(manager.total_player_count(), 0);
    }
}
