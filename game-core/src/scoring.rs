use std::time::Duration;

use game_types::PlayerId;

use crate::Roster;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreRules {
    pub base_points: u32,
    /// Guesses strictly faster than this earn the speed bonus.
    pub speed_bonus_window: Duration,
    pub speed_bonus_points: u32,
    /// Streak (before the guess) needed for the streak bonus.
    pub streak_bonus_threshold: u32,
    pub streak_bonus_points: u32,
}

impl Default for ScoreRules {
    fn default() -> Self {
        Self {
            base_points: 10,
            speed_bonus_window: Duration::from_secs(20),
            speed_bonus_points: 5,
            streak_bonus_threshold: 2,
            streak_bonus_points: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Award {
    pub points: u32,
    pub new_score: u32,
    pub new_streak: u32,
}

#[derive(Debug, Clone)]
pub struct ScoringEngine {
    rules: ScoreRules,
}

impl ScoringEngine {
    pub fn new(rules: ScoreRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &ScoreRules {
        &self.rules
    }

    /// Points for a correct guess made `elapsed` into the round by a player
    /// whose streak was `streak_before`.
    pub fn points_for(&self, elapsed: Duration, streak_before: u32) -> u32 {
        let mut points = self.rules.base_points;

        if elapsed < self.rules.speed_bonus_window {
            points = points.saturating_add(self.rules.speed_bonus_points);
        }

        if streak_before >= self.rules.streak_bonus_threshold {
            points = points.saturating_add(self.rules.streak_bonus_points);
        }

        points
    }

    /// Credits a correct guess: the guesser gains points and extends their
    /// streak, every other player's streak drops to zero.
    ///
    /// Returns `None` when the guesser is no longer in the roster.
    pub fn award(&self, roster: &mut Roster, guesser: PlayerId, elapsed: Duration) -> Option<Award> {
        let streak_before = roster.find(guesser)?.streak();
        let points = self.points_for(elapsed, streak_before);

        let mut award = None;
        for player in roster.players_mut() {
            if player.id() == guesser {
                player.add_points(points);
                player.set_streak(streak_before.saturating_add(1));
                award = Some(Award {
                    points,
                    new_score: player.score(),
                    new_streak: player.streak(),
                });
            } else {
                player.set_streak(0);
            }
        }

        tracing::debug!(
            "Awarded {} points to {} (streak {} -> {})",
            points,
            guesser,
            streak_before,
            streak_before.saturating_add(1)
        );
        award
    }
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self::new(ScoreRules::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn roster_with(names: &[&str]) -> (Roster, Vec<PlayerId>) {
        let mut roster = Roster::new();
        let ids: Vec<PlayerId> = names
            .iter()
            .map(|name| {
                let id = Uuid::new_v4();
                roster.add_player(id, name);
                id
            })
            .collect();
        (roster, ids)
    }

    #[test]
    fn test_fast_guess_without_streak() {
        let engine = ScoringEngine::default();
        assert_eq!(engine.points_for(Duration::from_secs(15), 0), 15);
    }

    #[test]
    fn test_fast_guess_with_streak() {
        let engine = ScoringEngine::default();
        assert_eq!(engine.points_for(Duration::from_secs(15), 3), 20);
    }

    #[test]
    fn test_slow_guess_without_streak() {
        let engine = ScoringEngine::default();
        assert_eq!(engine.points_for(Duration::from_secs(45), 0), 10);
    }

    #[test]
    fn test_bonus_boundaries() {
        let engine = ScoringEngine::default();

        // The speed window is exclusive, the streak threshold inclusive.
        assert_eq!(engine.points_for(Duration::from_secs(20), 0), 10);
        assert_eq!(engine.points_for(Duration::from_millis(19_999), 0), 15);
        assert_eq!(engine.points_for(Duration::from_secs(30), 1), 10);
        assert_eq!(engine.points_for(Duration::from_secs(30), 2), 15);
    }

    #[test]
    fn test_custom_rules() {
        let engine = ScoringEngine::new(ScoreRules {
            base_points: 100,
            speed_bonus_window: Duration::from_secs(5),
            speed_bonus_points: 50,
            streak_bonus_threshold: 1,
            streak_bonus_points: 25,
        });

        assert_eq!(engine.points_for(Duration::from_secs(4), 1), 175);
        assert_eq!(engine.points_for(Duration::from_secs(6), 0), 100);
    }

    #[test]
    fn test_oversized_rules_saturate_instead_of_overflowing() {
        let config = crate::GameConfig {
            scoring: ScoreRules {
                base_points: u32::MAX,
                speed_bonus_points: 5,
                streak_bonus_points: u32::MAX,
                ..ScoreRules::default()
            },
            ..crate::GameConfig::default()
        };
        assert!(config.validate().is_ok());

        let engine = ScoringEngine::new(config.scoring);
        assert_eq!(engine.points_for(Duration::from_secs(1), 0), u32::MAX);
        assert_eq!(engine.points_for(Duration::from_secs(1), 5), u32::MAX);
    }

    #[test]
    fn test_award_updates_guesser_and_resets_others() {
        let engine = ScoringEngine::default();
        let (mut roster, ids) = roster_with(&["Ana", "Beto", "Carla"]);
        roster.find_mut(ids[1]).unwrap().set_streak(4);
        roster.find_mut(ids[2]).unwrap().set_streak(1);

        let award = engine
            .award(&mut roster, ids[0], Duration::from_secs(10))
            .unwrap();

        assert_eq!(award.points, 15);
        assert_eq!(award.new_score, 15);
        assert_eq!(award.new_streak, 1);
        assert_eq!(roster.find(ids[1]).unwrap().streak(), 0);
        assert_eq!(roster.find(ids[2]).unwrap().streak(), 0);
        assert_eq!(roster.find(ids[1]).unwrap().score(), 0);
    }

    #[test]
    fn test_streak_bonus_kicks_in_on_third_consecutive_guess() {
        let engine = ScoringEngine::default();
        let (mut roster, ids) = roster_with(&["Ana", "Beto"]);
        let slow = Duration::from_secs(40);

        let first = engine.award(&mut roster, ids[0], slow).unwrap();
        let second = engine.award(&mut roster, ids[0], slow).unwrap();
        let third = engine.award(&mut roster, ids[0], slow).unwrap();

        assert_eq!(first.points, 10);
        assert_eq!(second.points, 10);
        assert_eq!(third.points, 15);
        assert_eq!(third.new_score, 35);
        assert_eq!(third.new_streak, 3);
    }

    #[test]
    fn test_award_for_unknown_player() {
        let engine = ScoringEngine::default();
        let (mut roster, ids) = roster_with(&["Ana"]);
        roster.find_mut(ids[0]).unwrap().set_streak(2);

        assert!(engine
            .award(&mut roster, Uuid::new_v4(), Duration::from_secs(1))
            .is_none());
        assert_eq!(roster.find(ids[0]).unwrap().streak(), 2);
    }
}
