use game_types::{PlayerId, PlayerScore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    id: PlayerId,
    name: String,
    score: u32,
    streak: u32,
    join_seq: u64,
}

impl Player {
    fn new(id: PlayerId, name: String, join_seq: u64) -> Self {
        Self {
            id,
            name,
            score: 0,
            streak: 0,
            join_seq,
        }
    }

    pub fn id(&self) -> PlayerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn join_seq(&self) -> u64 {
        self.join_seq
    }

    pub(crate) fn add_points(&mut self, points: u32) {
        self.score = self.score.saturating_add(points);
    }

    pub(crate) fn set_streak(&mut self, streak: u32) {
        self.streak = streak;
    }

    pub(crate) fn reset(&mut self) {
        self.score = 0;
        self.streak = 0;
    }

    pub fn to_score(&self) -> PlayerScore {
        PlayerScore {
            name: self.name.clone(),
            score: self.score,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    Added,
    /// A player with the same display name was already seated; their entry now
    /// belongs to the new connection.
    Rejoined { previous_id: PlayerId },
    AlreadyPresent,
}

/// Connected players in join order.
#[derive(Debug, Default)]
pub struct Roster {
    players: Vec<Player>,
    next_join_seq: u64,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_player(&mut self, id: PlayerId, name: &str) -> JoinOutcome {
        if self.players.iter().any(|p| p.id == id) {
            return JoinOutcome::AlreadyPresent;
        }

        if let Some(existing) = self.players.iter_mut().find(|p| p.name == name) {
            let previous_id = existing.id;
            existing.id = id;
            return JoinOutcome::Rejoined { previous_id };
        }

        self.players
            .push(Player::new(id, name.to_string(), self.next_join_seq));
        self.next_join_seq += 1;
        JoinOutcome::Added
    }

    pub fn remove_player(&mut self, id: PlayerId) -> Option<Player> {
        let index = self.players.iter().position(|p| p.id == id)?;
        Some(self.players.remove(index))
    }

    pub fn list(&self) -> &[Player] {
        &self.players
    }

    pub fn find(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub(crate) fn find_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    pub(crate) fn players_mut(&mut self) -> impl Iterator<Item = &mut Player> {
        self.players.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn scores(&self) -> Vec<PlayerScore> {
        self.players.iter().map(Player::to_score).collect()
    }

    /// Highest score first; equal scores keep join order.
    pub fn ranking(&self) -> Vec<PlayerScore> {
        let mut ordered: Vec<&Player> = self.players.iter().collect();
        ordered.sort_by_key(|p| p.join_seq);
        ordered.sort_by(|a, b| b.score.cmp(&a.score));
        ordered.into_iter().map(Player::to_score).collect()
    }

    pub(crate) fn reset_scores(&mut self) {
        for player in &mut self.players {
            player.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_add_and_find_player() {
        let mut roster = Roster::new();
        let id = Uuid::new_v4();

        assert_eq!(roster.add_player(id, "Ana"), JoinOutcome::Added);

        let player = roster.find(id).unwrap();
        assert_eq!(player.name(), "Ana");
        assert_eq!(player.score(), 0);
        assert_eq!(player.streak(), 0);
        assert!(roster.find(Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_same_name_reuses_entry() {
        let mut roster = Roster::new();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        roster.add_player(first, "Ana");
        roster.find_mut(first).unwrap().add_points(10);

        let outcome = roster.add_player(second, "Ana");
        assert_eq!(outcome, JoinOutcome::Rejoined { previous_id: first });
        assert_eq!(roster.len(), 1);
        assert!(roster.find(first).is_none());
        assert_eq!(roster.find(second).unwrap().score(), 10);
    }

    #[test]
    fn test_duplicate_id_is_noop() {
        let mut roster = Roster::new();
        let id = Uuid::new_v4();

        roster.add_player(id, "Ana");
        assert_eq!(roster.add_player(id, "Beto"), JoinOutcome::AlreadyPresent);
        assert_eq!(roster.len(), 1);
        assert_eq!(roster.find(id).unwrap().name(), "Ana");
    }

    #[test]
    fn test_remove_missing_player_is_noop() {
        let mut roster = Roster::new();
        let id = Uuid::new_v4();
        roster.add_player(id, "Ana");

        assert!(roster.remove_player(Uuid::new_v4()).is_none());
        assert_eq!(roster.len(), 1);

        let removed = roster.remove_player(id).unwrap();
        assert_eq!(removed.name(), "Ana");
        assert!(roster.is_empty());
    }

    #[test]
    fn test_list_keeps_join_order() {
        let mut roster = Roster::new();
        for name in ["Ana", "Beto", "Carla"] {
            roster.add_player(Uuid::new_v4(), name);
        }

        let names: Vec<&str> = roster.list().iter().map(Player::name).collect();
        assert_eq!(names, vec!["Ana", "Beto", "Carla"]);
    }

    #[test]
    fn test_ranking_breaks_ties_by_join_order() {
        let mut roster = Roster::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        roster.add_player(a, "A");
        roster.add_player(b, "B");
        roster.add_player(c, "C");

        roster.find_mut(a).unwrap().add_points(20);
        roster.find_mut(b).unwrap().add_points(20);
        roster.find_mut(c).unwrap().add_points(30);

        let ranking: Vec<String> = roster.ranking().into_iter().map(|p| p.name).collect();
        assert_eq!(ranking, vec!["C", "A", "B"]);
    }

    #[test]
    fn test_rejoined_player_keeps_join_position() {
        let mut roster = Roster::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        roster.add_player(a, "A");
        roster.add_player(b, "B");

        // A reconnects on a fresh connection; ties must still favour A.
        let a2 = Uuid::new_v4();
        roster.add_player(a2, "A");

        let ranking: Vec<String> = roster.ranking().into_iter().map(|p| p.name).collect();
        assert_eq!(ranking, vec!["A", "B"]);
    }

    #[test]
    fn test_reset_scores() {
        let mut roster = Roster::new();
        let id = Uuid::new_v4();
        roster.add_player(id, "Ana");
        roster.find_mut(id).unwrap().add_points(15);
        roster.find_mut(id).unwrap().set_streak(2);

        roster.reset_scores();

        let player = roster.find(id).unwrap();
        assert_eq!(player.score(), 0);
        assert_eq!(player.streak(), 0);
    }
}
