//! Save/load behaviour through the session.
//!
//! Covers the title screen flows (new game confirmation, loading, corrupted
//! saves) against both the in-memory and the file store.

use aventura_core::persist::SAVE_KEY;
use aventura_core::{
    CombatMenu, FileStore, GamePhase, GameSession, GameSnapshot, MemoryStore, NewCharacter,
    NewGame, SaveStore, ScriptedNarrator, SessionError, Speaker, TurnResult,
};
use serde_json::json;
use tempfile::TempDir;

fn opening_with_goblin() -> ScriptedNarrator {
    ScriptedNarrator::new().reply_json(json!({
        "storyText": "Un goblin te corta el paso.",
        "encounter": {"name": "Goblin", "description": "Rabioso.", "hp": 10, "attack": 3, "defense": 1}
    }))
}

/// Play a short game on the given store and return its final snapshot.
async fn play_short_game<S: SaveStore>(store: S) -> GameSnapshot {
    let narrator = opening_with_goblin().reply_json(json!({
        "storyText": "El goblin te hiere.",
        "playerUpdate": {"currentHp": 11},
        "enemyUpdate": {"currentHp": 6}
    }));
    let mut session = GameSession::new(narrator, store);
    session.request_new_game(true).await.unwrap();
    session
        .start_game(NewCharacter::new("Aldric", "Enano", "Guerrero"))
        .await
        .unwrap();
    session
        .player_action("USAR HABILIDAD Golpe Poderoso")
        .await
        .unwrap();
    session.snapshot().unwrap()
}

#[tokio::test]
async fn test_load_restores_saved_game() {
    let store = MemoryStore::new();
    let saved = play_short_game(store.clone()).await;

    let mut session = GameSession::new(ScriptedNarrator::new(), store.clone());
    assert!(session.has_saved_game().await);
    session.load_game().await.unwrap();

    assert_eq!(session.phase(), GamePhase::Playing);
    assert_eq!(session.combat_menu(), CombatMenu::Main);
    assert_eq!(session.snapshot().unwrap(), saved);

    let c = session.character().unwrap();
    assert_eq!(c.current_hp, 11);
    assert_eq!(c.skill("Golpe Poderoso").unwrap().turns_until_ready, 3);
    assert!(session.is_in_combat());
    assert_eq!(session.enemy().unwrap().current_hp, 6);
    assert_eq!(session.story_log().messages()[1].speaker, Speaker::Player);
}

#[tokio::test]
async fn test_load_from_file_store() {
    let temp = TempDir::new().unwrap();
    let store = FileStore::new(temp.path().join("partidas"));
    let saved = play_short_game(store.clone()).await;

    let expected_path = temp
        .path()
        .join("partidas")
        .join(format!("{SAVE_KEY}.json"));
    assert_eq!(store.path(), expected_path.as_path());
    assert!(expected_path.exists());

    let reopened = FileStore::new(temp.path().join("partidas"));
    let mut session = GameSession::new(ScriptedNarrator::new(), reopened);
    session.load_game().await.unwrap();
    assert_eq!(session.snapshot().unwrap(), saved);
}

#[tokio::test]
async fn test_load_starts_fresh_narrator_session() {
    let store = MemoryStore::new();
    play_short_game(store.clone()).await;

    let narrator = ScriptedNarrator::new().reply(TurnResult::narration("Retomas la lucha."));
    let mut session = GameSession::new(narrator, store);
    session.load_game().await.unwrap();

    assert_eq!(session.narrator().sessions(), &["Aldric"]);
    // Loading does not ask for an opening scene.
    assert!(session.narrator().received().is_empty());

    session.player_action("ATACAR").await.unwrap();
    assert_eq!(session.narrator().received(), &["ATACAR"]);
    assert_eq!(session.story_log().last().unwrap().text, "Retomas la lucha.");
}

#[tokio::test]
async fn test_resave_is_byte_stable() {
    let store = MemoryStore::new();
    play_short_game(store.clone()).await;
    let first = store.contents().await.unwrap();

    let mut session = GameSession::new(ScriptedNarrator::new(), store.clone());
    session.load_game().await.unwrap();
    session.save().await.unwrap();

    assert_eq!(store.contents().await.unwrap(), first);
}

#[tokio::test]
async fn test_missing_save() {
    let mut session = GameSession::new(ScriptedNarrator::new(), MemoryStore::new());
    assert!(!session.has_saved_game().await);

    let err = session.load_game().await.unwrap_err();
    assert!(matches!(err, SessionError::NoSavedGame));
    assert_eq!(session.phase(), GamePhase::Title);
}

#[tokio::test]
async fn test_corrupted_save_is_deleted() {
    let store = MemoryStore::with_contents("{\"character\": ");
    let mut session = GameSession::new(ScriptedNarrator::new(), store.clone());

    let err = session.load_game().await.unwrap_err();
    assert!(matches!(err, SessionError::CorruptedSave));
    assert_eq!(session.phase(), GamePhase::Title);
    assert!(session.character().is_none());
    assert!(store.contents().await.is_none());
    assert!(!session.has_saved_game().await);
}

#[tokio::test]
async fn test_save_breaking_invariants_is_corrupted() {
    let store = MemoryStore::new();
    let mut snapshot = play_short_game(store.clone()).await;
    snapshot.character.current_hp = snapshot.character.max_hp + 1;
    store.write(&snapshot.to_json().unwrap()).await.unwrap();

    let mut session = GameSession::new(ScriptedNarrator::new(), store.clone());
    assert!(matches!(
        session.load_game().await,
        Err(SessionError::CorruptedSave)
    ));
    assert!(store.contents().await.is_none());
}

#[tokio::test]
async fn test_corrupted_file_is_deleted() {
    let temp = TempDir::new().unwrap();
    let store = FileStore::new(temp.path());
    tokio::fs::write(store.path(), "no es json").await.unwrap();

    let mut session = GameSession::new(ScriptedNarrator::new(), store.clone());
    assert!(matches!(
        session.load_game().await,
        Err(SessionError::CorruptedSave)
    ));
    assert!(!store.path().exists());
}

#[tokio::test]
async fn test_new_game_needs_confirmation_over_existing_save() {
    let store = MemoryStore::new();
    play_short_game(store.clone()).await;

    let mut session = GameSession::new(ScriptedNarrator::new(), store.clone());
    let step = session.request_new_game(false).await.unwrap();
    assert_eq!(step, NewGame::NeedsConfirmation);
    assert_eq!(session.phase(), GamePhase::Title);
    assert!(store.contents().await.is_some());

    let step = session.request_new_game(true).await.unwrap();
    assert_eq!(step, NewGame::Ready);
    assert_eq!(session.phase(), GamePhase::CharacterCreation);
    assert!(store.contents().await.is_none());
}

#[tokio::test]
async fn test_start_game_cannot_bypass_confirmation() {
    let store = MemoryStore::new();
    play_short_game(store.clone()).await;
    let saved = store.contents().await;

    let mut session = GameSession::new(opening_with_goblin(), store.clone());
    let err = session
        .start_game(NewCharacter::new("Intruso", "Humano", "Guerrero"))
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::NotCreatingCharacter));
    assert_eq!(session.phase(), GamePhase::Title);
    assert_eq!(store.contents().await, saved);

    // Declining the confirmation keeps the creation step locked too.
    session.request_new_game(false).await.unwrap();
    assert!(session
        .start_game(NewCharacter::new("Intruso", "Humano", "Guerrero"))
        .await
        .is_err());
    assert_eq!(store.contents().await, saved);
}

#[tokio::test]
async fn test_start_game_after_confirmed_new_game() {
    let store = MemoryStore::new();
    play_short_game(store.clone()).await;

    let mut session = GameSession::new(opening_with_goblin(), store.clone());
    assert_eq!(
        session.request_new_game(true).await.unwrap(),
        NewGame::Ready
    );
    session
        .start_game(NewCharacter::new("Brenna", "Elfo", "Mago"))
        .await
        .unwrap();

    assert_eq!(session.phase(), GamePhase::Playing);
    let stored = GameSnapshot::from_json(&store.contents().await.unwrap()).unwrap();
    assert_eq!(stored.character.name, "Brenna");
    assert_eq!(stored.story_log.len(), 1);
}

#[tokio::test]
async fn test_new_game_without_save_needs_no_confirmation() {
    let mut session = GameSession::new(ScriptedNarrator::new(), MemoryStore::new());
    let step = session.request_new_game(false).await.unwrap();
    assert_eq!(step, NewGame::Ready);
    assert_eq!(session.phase(), GamePhase::CharacterCreation);
}

#[tokio::test]
async fn test_saved_json_uses_camel_case_fields() {
    let store = MemoryStore::new();
    play_short_game(store.clone()).await;

    let saved: serde_json::Value =
        serde_json::from_str(&store.contents().await.unwrap()).unwrap();
    assert_eq!(saved["isInCombat"], json!(true));
    assert_eq!(saved["character"]["xpToNextLevel"], json!(100));
    assert_eq!(saved["character"]["currentHp"], json!(11));
    assert_eq!(saved["enemy"]["maxHp"], json!(10));
    assert!(saved["storyLog"].is_array());
    assert_eq!(
        saved["character"]["skills"][0]["turnsUntilReady"],
        json!(3)
    );
}
