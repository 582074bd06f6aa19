use std::sync::Arc;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Identifier of a game template inside the catalog.
pub type GameId = u32;

/// Read-only source of game templates that sessions are created from.
pub trait GameCatalog: Send + Sync {
    /// Look up a template by identifier.
    fn find_game(&self, id: GameId) -> Option<GameTemplate>;
    /// List every template, in catalog order.
    fn list_games(&self) -> Vec<GameTemplate>;
}

/// Static definition of a trivia game.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GameTemplate {
    pub id: GameId,
    #[validate(length(min = 1, message = "game name must not be empty"))]
    pub name: String,
    #[validate(length(min = 1, message = "a game needs at least one question"), nested)]
    pub questions: Vec<Question>,
}

/// One question of a game template.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_correct_answer"))]
pub struct Question {
    pub id: u32,
    pub text: String,
    /// Identifier of the entry in `answers` that is the right one.
    pub correct_answer_id: u32,
    #[validate(length(min = 1, message = "a question needs at least one answer"))]
    pub answers: Vec<Answer>,
}

/// Possible answer to a [`Question`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Answer {
    pub id: u32,
    pub text: String,
}

fn validate_correct_answer(question: &Question) -> Result<(), ValidationError> {
    if question
        .answers
        .iter()
        .any(|answer| answer.id == question.correct_answer_id)
    {
        return Ok(());
    }

    let mut err = ValidationError::new("correct_answer_id");
    err.message = Some(
        format!(
            "correct answer {} is not one of the answers of question {}",
            question.correct_answer_id, question.id
        )
        .into(),
    );
    Err(err)
}

/// In-memory catalog backed by the templates loaded from configuration.
#[derive(Debug, Clone)]
pub struct StaticCatalog {
    games: Arc<[GameTemplate]>,
}

impl StaticCatalog {
    pub fn new(games: Vec<GameTemplate>) -> Self {
        Self {
            games: games.into(),
        }
    }
}

impl GameCatalog for StaticCatalog {
    fn find_game(&self, id: GameId) -> Option<GameTemplate> {
        self.games.iter().find(|game| game.id == id).cloned()
    }

    fn list_games(&self) -> Vec<GameTemplate> {
        self.games.to_vec()
    }
}

/// Catalog shipped with the binary when no configuration provides one.
pub fn builtin_games() -> Vec<GameTemplate> {
    vec![GameTemplate {
        id: 1,
        name: "Simple Game".into(),
        questions: vec![Question {
            id: 1,
            text: "What is the first letter of the Alphabet?".into(),
            correct_answer_id: 3,
            answers: vec![
                Answer {
                    id: 1,
                    text: "C".into(),
                },
                Answer {
                    id: 2,
                    text: "Z".into(),
                },
                Answer {
                    id: 3,
                    text: "A".into(),
                },
                Answer {
                    id: 4,
                    text: "X".into(),
                },
            ],
        }],
    }]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_games_are_valid() {
        for game in builtin_games() {
            assert!(game.validate().is_ok(), "{} should validate", game.name);
        }
    }

    #[test]
    fn correct_answer_must_exist() {
        let mut game = builtin_games().remove(0);
        game.questions[0].correct_answer_id = 42;
        assert!(game.validate().is_err());
    }

    #[test]
    fn game_without_questions_is_rejected() {
        let game = GameTemplate {
            id: 7,
            name: "Empty".into(),
            questions: Vec::new(),
        };
        assert!(game.validate().is_err());
    }

    #[test]
    fn static_catalog_finds_by_id() {
        let catalog = StaticCatalog::new(builtin_games());
        assert_eq!(
            catalog.find_game(1).map(|game| game.name),
            Some("Simple Game".to_string())
        );
        assert!(catalog.find_game(2).is_none());
        assert_eq!(catalog.list_games().len(), 1);
    }
}
