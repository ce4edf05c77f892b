//! Tests for the battle store

#[cfg(test)]
mod tests {
    use crate::store::{reduce, BattleAction, BattleState, BattleStore, TransitionError};
    use clash_events::{
        Difficulty, FinalScore, Language, MatchId, MatchStatus, PlayerId, PlayerPatch,
        PlayerState, PlayerSummary, Problem, ProblemId,
    };
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn summary(id: &str) -> PlayerSummary {
        PlayerSummary {
            id: PlayerId::new(id),
            display_name: id.to_uppercase(),
        }
    }

    fn problem(id: &str) -> Problem {
        Problem {
            id: ProblemId::new(id),
            title: format!("Problem {id}"),
            description: "Sum two numbers".to_string(),
            input_format: None,
            output_format: None,
            constraints: None,
            difficulty: Difficulty::Easy,
            rating: 800,
            time_limit_ms: 1000,
            memory_limit_mb: 256,
            test_cases: Vec::new(),
        }
    }

    fn match_found(room: &str) -> BattleAction {
        BattleAction::MatchFound {
            match_id: MatchId::new(room),
            players: vec![summary("p1"), summary("p2")],
        }
    }

    fn game_start() -> BattleAction {
        BattleAction::GameStart {
            match_id: None,
            problems: vec![problem("a"), problem("b")],
            players: Vec::new(),
        }
    }

    fn in_progress() -> BattleStore {
        let mut store = BattleStore::new(Some(PlayerId::new("p1")));
        assert!(store.dispatch(match_found("room-1")));
        assert!(store.dispatch(game_start()));
        store
    }

    fn scores(state: &BattleState) -> Vec<(&str, i64)> {
        state
            .players
            .iter()
            .map(|player| (player.id.as_str(), player.score))
            .collect()
    }

    #[test]
    fn test_unknown_local_player_has_no_opponent() {
        let mut store = BattleStore::new(None);
        store.dispatch(BattleAction::MatchFound {
            match_id: MatchId::new("room-1"),
            players: vec![summary("p1"), summary("p2")],
        });

        assert!(store.state().local().is_none());
        assert!(store.state().opponent().is_none());
        assert!(!store.dispatch(BattleAction::CodeChange("x".into())));
    }

    #[test]
    fn test_lifecycle_happy_path() {
        let mut store = in_progress();
        assert_eq!(store.state().status, MatchStatus::InProgress);
        assert_eq!(store.state().current_problem().unwrap().id, ProblemId::new("a"));
        assert_eq!(store.state().local().unwrap().display_name, "P1");
        assert_eq!(store.state().opponent().unwrap().id, PlayerId::new("p2"));

        assert!(store.dispatch(BattleAction::MatchCompleted {
            match_id: Some(MatchId::new("room-1")),
            final_scores: vec![
                FinalScore { player_id: PlayerId::new("p1"), score: 300 },
                FinalScore { player_id: PlayerId::new("p2"), score: 100 },
            ],
            winner: None,
        }));

        let state = store.state();
        assert_eq!(state.status, MatchStatus::Completed);
        assert_eq!(state.winner, Some(PlayerId::new("p1")));
        assert_eq!(scores(state), vec![("p1", 300), ("p2", 100)]);

        assert!(store.dispatch(BattleAction::Reset));
        assert_eq!(store.state(), &BattleState::for_player("p1"));
        assert_eq!(store.revision(), 4);
    }

    #[test]
    fn test_state_update_when_idle_is_noop() {
        let mut store = BattleStore::new(Some(PlayerId::new("p1")));
        let before = store.state().clone();

        let accepted = store.dispatch(PlayerPatch::for_player("p1").with_score(10));

        assert!(!accepted);
        assert_eq!(store.state(), &before);
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn test_state_update_merges_only_target_player() {
        let mut store = in_progress();

        assert!(store.dispatch(PlayerPatch::for_player("p1").with_score(10)));

        assert_eq!(scores(store.state()), vec![("p1", 10), ("p2", 0)]);
        assert_eq!(store.state().status, MatchStatus::InProgress);
    }

    #[test]
    fn test_state_update_keeps_absent_fields() {
        let mut store = in_progress();
        store.dispatch(PlayerPatch::for_player("p2").with_code("int main() {}"));
        store.dispatch(PlayerPatch::for_player("p2").with_language(Language::Java));

        let opponent = store.state().opponent().unwrap();
        assert_eq!(opponent.code, "int main() {}");
        assert_eq!(opponent.language, Language::Java);
    }

    #[test]
    fn test_state_update_for_unknown_player_is_rejected() {
        let store = in_progress();
        let result = reduce(
            store.state(),
            &BattleAction::StateUpdate(PlayerPatch::for_player("ghost").with_score(1)),
        );
        assert_eq!(result, Err(TransitionError::UnknownPlayer(PlayerId::new("ghost"))));
    }

    #[test]
    fn test_second_match_found_is_rejected() {
        let mut store = BattleStore::new(Some(PlayerId::new("p1")));
        assert!(store.dispatch(match_found("room-1")));

        let result = store.try_dispatch(&match_found("room-2"));

        assert_eq!(
            result,
            Err(TransitionError::IllegalTransition {
                action: "MATCH_FOUND",
                status: MatchStatus::Waiting,
            })
        );
        assert_eq!(store.state().match_id, Some(MatchId::new("room-1")));
    }

    #[test]
    fn test_events_for_another_match_are_rejected() {
        let mut store = BattleStore::new(Some(PlayerId::new("p1")));
        store.dispatch(match_found("room-1"));

        let accepted = store.dispatch(BattleAction::GameStart {
            match_id: Some(MatchId::new("room-2")),
            problems: vec![problem("a")],
            players: Vec::new(),
        });

        assert!(!accepted);
        assert_eq!(store.state().status, MatchStatus::Waiting);
    }

    #[test]
    fn test_game_start_resync_keeps_selected_problem() {
        let mut store = in_progress();
        assert!(store.dispatch(BattleAction::SelectProblem(1)));
        assert!(store.dispatch(game_start()));
        assert_eq!(store.state().current_problem_index, 1);

        assert!(!store.dispatch(BattleAction::SelectProblem(2)));
        assert_eq!(store.state().current_problem_index, 1);
    }

    #[test]
    fn test_completed_match_ignores_player_updates() {
        let mut store = in_progress();
        store.dispatch(BattleAction::MatchCompleted {
            match_id: None,
            final_scores: vec![FinalScore { player_id: PlayerId::new("p1"), score: 50 }],
            winner: Some(PlayerId::new("p1")),
        });
        let before = store.state().clone();

        assert!(!store.dispatch(PlayerPatch::for_player("p2").with_score(999)));
        assert!(!store.dispatch(BattleAction::LanguageChange(Language::Python)));
        assert_eq!(store.state(), &before);
    }

    #[test]
    fn test_local_edits_need_a_local_player() {
        let mut store = BattleStore::new(None);
        store.dispatch(match_found("room-1"));
        store.dispatch(game_start());

        assert_eq!(
            store.try_dispatch(&BattleAction::CodeChange("x".into())),
            Err(TransitionError::NoLocalPlayer)
        );

        let mut store = in_progress();
        assert!(store.dispatch(BattleAction::LanguageChange(Language::Python)));
        assert!(store.dispatch(BattleAction::CodeChange("print(1)".into())));
        let local = store.state().local().unwrap();
        assert_eq!(local.language, Language::Python);
        assert_eq!(local.code, "print(1)");
    }

    #[test]
    fn test_tied_final_scores_leave_no_winner() {
        let mut store = in_progress();
        store.dispatch(BattleAction::MatchCompleted {
            match_id: None,
            final_scores: vec![
                FinalScore { player_id: PlayerId::new("p1"), score: 10 },
                FinalScore { player_id: PlayerId::new("p2"), score: 10 },
            ],
            winner: None,
        });
        assert_eq!(store.state().winner, None);
    }

    #[test]
    fn test_toggle_maximized_in_any_status() {
        let mut store = BattleStore::default();
        assert!(store.dispatch(BattleAction::ToggleMaximized));
        assert!(store.state().is_maximized);
        assert!(store.dispatch(BattleAction::ToggleMaximized));
        assert!(!store.state().is_maximized);
    }

    fn random_action(rng: &mut StdRng) -> BattleAction {
        match rng.gen_range(0..10) {
            0 => match_found(if rng.gen_bool(0.5) { "room-1" } else { "room-2" }),
            1 => game_start(),
            2 => BattleAction::StateUpdate(
                PlayerPatch::for_player(if rng.gen_bool(0.5) { "p1" } else { "p2" })
                    .with_score(rng.gen_range(0..500)),
            ),
            3 => BattleAction::LanguageChange(Language::ALL[rng.gen_range(0..Language::ALL.len())]),
            4 => BattleAction::CodeChange("code".to_string()),
            5 => BattleAction::SelectProblem(rng.gen_range(0..3)),
            6 => BattleAction::ToggleMaximized,
            7 | 8 => BattleAction::MatchCompleted {
                match_id: None,
                final_scores: Vec::new(),
                winner: None,
            },
            _ => BattleAction::Reset,
        }
    }

    #[test]
    fn test_status_never_regresses_except_on_reset() {
        let mut rng = StdRng::seed_from_u64(0xC1A5);

        for _ in 0..200 {
            let mut state = BattleState::for_player("p1");
            for _ in 0..40 {
                let action = random_action(&mut rng);
                let Ok(next) = reduce(&state, &action) else {
                    continue;
                };
                if matches!(action, BattleAction::Reset) {
                    assert_eq!(next.status, MatchStatus::Idle);
                    assert_eq!(next.local_player, state.local_player);
                } else {
                    assert!(
                        next.status >= state.status,
                        "{} moved {} → {}",
                        action.name(),
                        state.status,
                        next.status
                    );
                }
                state = next;
            }
        }
    }

    #[test]
    fn test_players_from_game_start_replace_roster() {
        let mut store = BattleStore::new(Some(PlayerId::new("p1")));
        store.dispatch(match_found("room-1"));
        let mut p1 = PlayerState::from_summary(&summary("p1"));
        p1.score = 5;

        store.dispatch(BattleAction::GameStart {
            match_id: Some(MatchId::new("room-1")),
            problems: vec![problem("a")],
            players: vec![p1],
        });

        assert_eq!(scores(store.state()), vec![("p1", 5)]);
    }
}
