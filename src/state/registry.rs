use indexmap::IndexMap;

use crate::state::{
    game::{ConnectionId, Player},
    state_machine::GameError,
};

/// Players currently connected, kept in join order.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    players: IndexMap<ConnectionId, Player>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `connection_id` under `display_name`.
    ///
    /// Names are compared case-sensitively and exactly; a connection may only join once.
    pub fn join(
        &mut self,
        connection_id: ConnectionId,
        display_name: String,
    ) -> Result<&Player, GameError> {
        if self.players.contains_key(&connection_id) {
            return Err(GameError::AlreadyJoined);
        }
        if self
            .players
            .values()
            .any(|player| player.display_name == display_name)
        {
            return Err(GameError::NameTaken(display_name));
        }

        let player = self
            .players
            .entry(connection_id)
            .or_insert(Player::new(connection_id, display_name));
        Ok(&*player)
    }

    /// Remove a player; unknown connections are ignored.
    pub fn leave(&mut self, connection_id: &ConnectionId) -> Option<Player> {
        self.players.shift_remove(connection_id)
    }

    /// Zero every score and per-game counter.
    pub fn reset_scores(&mut self) {
        for player in self.players.values_mut() {
            player.score = 0;
            player.questions_answered = 0;
            player.correct_answers = 0;
        }
    }

    pub fn get(&self, connection_id: &ConnectionId) -> Option<&Player> {
        self.players.get(connection_id)
    }

    pub fn get_mut(&mut self, connection_id: &ConnectionId) -> Option<&mut Player> {
        self.players.get_mut(connection_id)
    }

    /// Players in join order.
    pub fn snapshot(&self) -> Vec<Player> {
        self.players.values().cloned().collect()
    }

    /// Players by score, best first. Equal scores keep join order.
    pub fn standings(&self) -> Vec<Player> {
        let mut ranked = self.snapshot();
        ranked.sort_by(|a, b| b.score.cmp(&a.score));
        ranked
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}
