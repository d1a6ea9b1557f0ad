//! Conversation contexts and the narrator prompts built from them

use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Narrator persona for the per-creature margin notes
const NOTES_PROMPT: &str = r#"Ты — Геральт из Ривии, ведьмак школы Волка. Ты делаешь заметки на полях своего бестиария.
Пользователь — ученик ведьмака или читатель, который задаёт вопросы о конкретном монстре.

Твоя задача:
1. Дай чёткий, практический совет по уничтожению этой твари
2. Расскажи о её повадках, слабостях и особенностях
3. Поделись личным опытом встречи с этим существом
4. Говори как настоящий ведьмак: цинично, с сарказмом, но с заботой об ученике
5. Используй сленг ведьмака: "кроны", "знаки", "масла", "бомбы", "зелья"
6. Отвечай от первого лица, как будто пишешь пером на бумаге
7. Не используй мат, но можешь использовать "проклятье", "черт", "холера"

Твой стиль:
- "Серебряный для чудовищ, стальной для людей... но для этой твари нужно кое-что ещё."
- "Если увидишь это — беги или готовься драться."
- "Из моего опыта: лучше перестраховаться."
- Кратко, по делу, но с историями из прошлого."#;

/// Narrator persona for the contracts board
const BOARD_PROMPT: &str = r#"Ты — Геральт из Ривии, стоишь у доски объявлений.
Пользователь — кмет, горожанин или староста, который хочет повесить заказ или обсудить существующий.

Твоя задача:
1. Выясни детали заказа (кого убить, где видели, какая награда)
2. Торгуйся, если цена слишком мала (но в меру)
3. Принимай заказ, если условия подходят
4. Давай практические советы по выполнению контракта

Твой стиль:
- Циничный, прямой, профессиональный
- Используй сленг: "кроны", "новоградские орены", "утопцы", "трупоеды"
- Не используй мат, но можешь использовать "зараза", "холера", "проклятье"
- Отвечай на каждый вопрос развернуто, если это касается дела
- Если спрашивают глупость — ответь с сарказмом

Пример диалога:
Пользователь: "У нас в подвале кто-то скребется."
Геральт: "Скребется? Это может быть что угодно, от крыс до фледера. Если это фледер, то с вас сто крон, не меньше. Ведите, показывайте.""#;

const BOARD_OPENING: &str =
    "Подходи, не бойся. Читай, что написано. Ищешь работы или хочешь, чтобы я кого-то убил? Пиши своё объявление.";

/// Creature data interpolated into the notes prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatureInfo {
    pub name: String,
    pub class_name: String,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub description: String,
}

/// Which prompt family a conversation uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextKind {
    Notes,
    Board,
}

impl ContextKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ContextKind::Notes => "notes",
            ContextKind::Board => "board",
        }
    }
}

/// Context a conversation is created in
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatContext {
    Notes { creature: Option<CreatureInfo> },
    Board,
}

impl ChatContext {
    pub fn notes(creature: Option<CreatureInfo>) -> Self {
        ChatContext::Notes { creature }
    }

    pub fn kind(&self) -> ContextKind {
        match self {
            ChatContext::Notes { .. } => ContextKind::Notes,
            ChatContext::Board => ContextKind::Board,
        }
    }

    /// Name of the creature under discussion; blank names count as absent
    pub fn creature_name(&self) -> Option<&str> {
        match self {
            ChatContext::Notes {
                creature: Some(creature),
            } => Some(creature.name.trim()).filter(|name| !name.is_empty()),
            _ => None,
        }
    }

    /// System message for a fresh session
    pub fn system_prompt(&self) -> String {
        match self {
            ChatContext::Notes {
                creature: Some(creature),
            } => {
                let mut prompt = String::from(NOTES_PROMPT);
                let _ = write!(
                    prompt,
                    "\n\nТЕКУЩАЯ ТВАРЬ:\nИмя: {}\nКласс: {}\nСлабости: {}\nОписание: {}\n\nОтвечай именно об этой твари!",
                    creature.name,
                    creature.class_name,
                    creature.weaknesses.join(", "),
                    creature.description,
                );
                prompt
            }
            ChatContext::Notes { creature: None } => NOTES_PROMPT.to_string(),
            ChatContext::Board => BOARD_PROMPT.to_string(),
        }
    }

    /// Scripted first assistant line shown before the user says anything
    pub fn opening_line(&self) -> String {
        match self {
            ChatContext::Notes { .. } => {
                let subject = self
                    .creature_name()
                    .map_or_else(|| "этот монстр".to_string(), str::to_lowercase);
                format!(
                    "Заинтересовал {subject}? Спрашивай, пока я добрый. У меня есть пара историй про эту тварь."
                )
            }
            ChatContext::Board => BOARD_OPENING.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ghoul() -> CreatureInfo {
        CreatureInfo {
            name: "Гуль".to_string(),
            class_name: "Трупоед".to_string(),
            weaknesses: vec!["Масло против трупоедов".to_string(), "Игни".to_string()],
            description: "Питается падалью.".to_string(),
        }
    }

    #[test]
    fn test_notes_prompt_interpolates_creature() {
        let prompt = ChatContext::notes(Some(ghoul())).system_prompt();
        assert!(prompt.starts_with(NOTES_PROMPT));
        assert!(prompt.contains("Имя: Гуль"));
        assert!(prompt.contains("Класс: Трупоед"));
        assert!(prompt.contains("Слабости: Масло против трупоедов, Игни"));
        assert!(prompt.contains("Описание: Питается падалью."));
    }

    #[test]
    fn test_notes_without_creature_uses_bare_template() {
        let ctx = ChatContext::Notes { creature: None };
        assert_eq!(ctx.system_prompt(), NOTES_PROMPT);
        assert!(ctx.opening_line().starts_with("Заинтересовал этот монстр?"));
    }

    #[test]
    fn test_opening_lowercases_name() {
        let line = ChatContext::notes(Some(ghoul())).opening_line();
        assert!(line.starts_with("Заинтересовал гуль?"));
    }

    #[test]
    fn test_blank_name_uses_generic_phrases() {
        for name in ["", "   "] {
            let ctx = ChatContext::notes(Some(CreatureInfo {
                name: name.to_string(),
                ..ghoul()
            }));
            assert_eq!(ctx.creature_name(), None);
            assert!(ctx.opening_line().starts_with("Заинтересовал этот монстр?"));
        }
    }

    #[test]
    fn test_board_context() {
        assert_eq!(ChatContext::Board.system_prompt(), BOARD_PROMPT);
        assert_eq!(ChatContext::Board.opening_line(), BOARD_OPENING);
        assert_eq!(ChatContext::Board.kind(), ContextKind::Board);
        assert_eq!(ChatContext::Board.creature_name(), None);
    }

    #[test]
    fn test_creature_info_wire_format() {
        let info: CreatureInfo = serde_json::from_str(
            r#"{"name":"Гуль","className":"Трупоед","weaknesses":["Игни"],"description":"d"}"#,
        )
        .unwrap();
        assert_eq!(info.class_name, "Трупоед");
    }
}
