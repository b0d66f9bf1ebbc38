//! The line-oriented game loop.
//!
//! Output conventions:
//! - `[DM]` lines are narration, `[SISTEMA]` lines are client messages
//! - `[COMBATE]` shows both sides' pools while fighting
//! - `[ERROR]` lines are user-facing errors; play continues after them

use aventura_core::session::{INTERRUPTED_TEXT, OPENING_FAILURE_TEXT, SAVED_MESSAGE};
use aventura_core::{
    CharacterClass, CombatMenu, GamePhase, GameSession, Narrator, NewCharacter, NewGame,
    PlayerAction, SaveStore, Speaker, TurnReport, RACES,
};
use crossterm::style::Stylize;
use std::io::{self, BufRead, Lines, StdinLock, Write};
use std::path::{Path, PathBuf};

/// Story lines shown when a saved game is resumed.
const RECAP_LINES: usize = 6;

/// Line source for all prompts.
struct Input {
    lines: Lines<StdinLock<'static>>,
}

impl Input {
    fn new() -> Self {
        Self {
            lines: io::stdin().lock().lines(),
        }
    }

    /// Prompt and read one trimmed line. `None` at end of input.
    fn ask(&mut self, prompt: &str) -> Option<String> {
        print!("{prompt}");
        io::stdout().flush().ok();
        match self.lines.next()? {
            Ok(line) => Some(line.trim().to_string()),
            Err(e) => {
                eprintln!("Error reading input: {e}");
                None
            }
        }
    }
}

enum Flow {
    Continue,
    Quit,
}

/// Run the game until the player quits or input ends.
pub async fn run<N: Narrator, S: SaveStore>(
    mut session: GameSession<N, S>,
    audio_path: PathBuf,
) -> anyhow::Result<()> {
    let mut input = Input::new();

    println!("{}", "=== Dungeon Master IA ===".bold().dark_yellow());
    println!();

    loop {
        let has_save = session.has_saved_game().await;
        println!("  1. Nueva partida");
        if has_save {
            println!("  2. Cargar partida");
        }
        println!("  0. Salir");

        let Some(choice) = input.ask("> ") else {
            return Ok(());
        };

        match choice.as_str() {
            "1" => {
                if !new_game(&mut session, &mut input).await {
                    continue;
                }
            }
            "2" if has_save => match session.load_game().await {
                Ok(()) => print_recap(&session),
                Err(e) => {
                    error(&e.to_string());
                    continue;
                }
            },
            "0" | "#salir" => return Ok(()),
            _ => continue,
        }

        if let Flow::Quit = play(&mut session, &mut input, &audio_path).await {
            return Ok(());
        }
    }
}

/// Confirm, create the character and narrate the opening. Returns false if
/// the player backed out.
async fn new_game<N: Narrator, S: SaveStore>(
    session: &mut GameSession<N, S>,
    input: &mut Input,
) -> bool {
    match session.request_new_game(false).await {
        Ok(NewGame::Ready) => {}
        Ok(NewGame::NeedsConfirmation) => {
            let answer = input
                .ask("¿Estás seguro de que quieres empezar una nueva partida? Se borrará todo tu progreso guardado. (s/n) ")
                .unwrap_or_default();
            if !answer.eq_ignore_ascii_case("s") {
                return false;
            }
            if let Err(e) = session.request_new_game(true).await {
                error(&e.to_string());
                return false;
            }
        }
        Err(e) => {
            error(&e.to_string());
            return false;
        }
    }

    loop {
        let Some(new) = create_character(input) else {
            return false;
        };
        system("El Dungeon Master prepara tu aventura...");
        match session.start_game(new).await {
            Ok(report) => {
                print_report(&report);
                return true;
            }
            Err(e) => error(&e.to_string()),
        }
    }
}

fn create_character(input: &mut Input) -> Option<NewCharacter> {
    println!("{}", "--- Crea tu personaje ---".bold());
    let name = input.ask("Nombre: ")?;

    for (i, race) in RACES.iter().enumerate() {
        println!("  {}. {race}", i + 1);
    }
    let race = pick(&input.ask("Raza: ")?, &RACES).unwrap_or(RACES[0]);

    for (i, class) in CharacterClass::ALL.iter().enumerate() {
        let data = class.data();
        println!(
            "  {:>2}. {:<10} PS {:>2}  PM {:>2}  ATQ {}  DEF {}",
            i + 1,
            class.name(),
            data.max_hp,
            data.max_mp,
            data.attack,
            data.defense
        );
    }
    let class_input = input.ask("Clase: ")?;
    let names: Vec<&str> = CharacterClass::ALL.iter().map(|c| c.name()).collect();
    let class = pick(&class_input, &names)
        .map(str::to_string)
        .unwrap_or(class_input);

    Some(NewCharacter::new(name, race, class))
}

/// Resolve a 1-based number against a list; anything else is returned as
/// typed if it names an entry.
fn pick<'a>(choice: &str, options: &[&'a str]) -> Option<&'a str> {
    if let Ok(n) = choice.parse::<usize>() {
        return n.checked_sub(1).and_then(|i| options.get(i)).copied();
    }
    options.iter().find(|o| o.eq_ignore_ascii_case(choice)).copied()
}

async fn play<N: Narrator, S: SaveStore>(
    session: &mut GameSession<N, S>,
    input: &mut Input,
    audio_path: &Path,
) -> Flow {
    system("Escribe tu acción, o #ayuda para ver los comandos.");

    while session.phase() == GamePhase::Playing {
        if session.is_in_combat() {
            print_combat_status(session);
            print_menu(session);
        }

        let Some(line) = input.ask("> ") else {
            return Flow::Quit;
        };
        if line.is_empty() {
            continue;
        }

        if let Some(command) = line.strip_prefix('#') {
            if let Flow::Quit = run_command(session, command).await {
                return Flow::Quit;
            }
            continue;
        }

        let action = menu_selection(session, &line).unwrap_or(line);
        match session.player_action(&action).await {
            Ok(report) => {
                print_report(&report);
                if let Some(audio) = &report.audio {
                    match tokio::fs::write(audio_path, audio).await {
                        Ok(()) => system(&format!("Narración guardada en {}", audio_path.display())),
                        Err(e) => tracing::warn!(error = %e, "Could not write narration audio"),
                    }
                }
            }
            Err(e) => error(&e.to_string()),
        }
    }
    Flow::Continue
}

async fn run_command<N: Narrator, S: SaveStore>(
    session: &mut GameSession<N, S>,
    command: &str,
) -> Flow {
    let parts: Vec<&str> = command.split_whitespace().collect();
    match parts.first().copied() {
        Some("salir") => return Flow::Quit,
        Some("estado") => print_sheet(session),
        Some("guardar") => match session.save().await {
            Ok(()) => system(SAVED_MESSAGE),
            Err(e) => error(&e.to_string()),
        },
        Some("menu") => {
            let menu = match parts.get(1).copied() {
                Some("main") | Some("principal") | None => CombatMenu::Main,
                Some("magia") => CombatMenu::Magic,
                Some("inventario") => CombatMenu::Inventory,
                Some("habilidades") => CombatMenu::Skills,
                Some(other) => {
                    error(&format!("Menú desconocido: {other}"));
                    return Flow::Continue;
                }
            };
            if !session.open_menu(menu) {
                error("Los menús de combate solo están disponibles durante un combate.");
            }
        }
        Some("voz") => {
            let enabled = !session.speech_enabled();
            session.set_speech_enabled(enabled);
            if session.speech_enabled() {
                system("Narrador ON");
            } else if enabled {
                error("La narración por voz no está disponible (falta OPENAI_API_KEY).");
            } else {
                system("Narrador OFF");
            }
        }
        Some("ayuda") => print_help(),
        _ => error("Comando desconocido. Escribe #ayuda para ver los comandos."),
    }
    Flow::Continue
}

/// A number typed while a combat submenu is open picks from that menu.
fn menu_selection<N: Narrator, S: SaveStore>(
    session: &GameSession<N, S>,
    line: &str,
) -> Option<String> {
    let index = line.parse::<usize>().ok()?.checked_sub(1)?;
    let character = session.character()?;
    let action = match session.combat_menu() {
        CombatMenu::Main => {
            let primitives = [PlayerAction::Attack, PlayerAction::Defend, PlayerAction::Flee];
            primitives.get(index)?.clone()
        }
        CombatMenu::Magic => PlayerAction::CastSpell(character.spells.get(index)?.name.clone()),
        CombatMenu::Inventory => {
            PlayerAction::UseItem(character.inventory.get(index)?.name.clone())
        }
        CombatMenu::Skills => PlayerAction::UseSkill(character.skills.get(index)?.name.clone()),
    };
    Some(action.to_string())
}

// ============================================================================
// Output
// ============================================================================

fn system(text: &str) {
    println!("{} {text}", "[SISTEMA]".dark_grey());
}

fn error(text: &str) {
    println!("{} {}", "[ERROR]".red().bold(), text.red());
}

fn print_report(report: &TurnReport) {
    for (i, event) in report.events.iter().enumerate() {
        let text = event.to_message().text;
        if i == 0 {
            println!("{}", "[DM]".dark_yellow().bold());
            for para in text.split("\n\n") {
                println!("{para}");
            }
        } else {
            println!("{}", text.yellow().bold());
        }
    }
    if report.combat_started {
        system("¡Comienza el combate!");
    }
    if report.combat_ended {
        system("El combate ha terminado.");
    }
    if let Some(e) = &report.error {
        let line = match report.action {
            Some(_) => INTERRUPTED_TEXT,
            None => OPENING_FAILURE_TEXT,
        };
        println!("{} {line}", "[DM]".dark_yellow().bold());
        error(e);
    }
    if let Some(e) = &report.save_error {
        error(e);
    }
    println!();
}

fn print_recap<N: Narrator, S: SaveStore>(session: &GameSession<N, S>) {
    let log = session.story_log().messages();
    let start = log.len().saturating_sub(RECAP_LINES);
    for message in &log[start..] {
        match message.speaker {
            Speaker::Dm => println!("{} {}", "[DM]".dark_yellow().bold(), message.text),
            Speaker::Player => println!("{} {}", ">".cyan(), message.text),
        }
    }
    println!();
}

fn print_combat_status<N: Narrator, S: SaveStore>(session: &GameSession<N, S>) {
    let Some(c) = session.character() else {
        return;
    };
    let enemy = session
        .enemy()
        .map(|e| format!(" | {} PS {}/{}", e.name, e.current_hp, e.max_hp))
        .unwrap_or_default();
    println!(
        "{} PS {}/{}  PM {}/{}{enemy}",
        "[COMBATE]".red().bold(),
        c.current_hp,
        c.max_hp,
        c.current_mp,
        c.max_mp
    );
}

fn print_menu<N: Narrator, S: SaveStore>(session: &GameSession<N, S>) {
    let Some(c) = session.character() else {
        return;
    };
    match session.combat_menu() {
        CombatMenu::Main => {
            println!("  1. ATACAR  2. DEFENDER  3. HUIR   (#menu magia | inventario | habilidades)");
        }
        CombatMenu::Magic => {
            for (i, spell) in c.spells.iter().enumerate() {
                let line = format!("  {}. {} ({} PM)", i + 1, spell.name, spell.cost);
                if spell.affordable(c.current_mp) {
                    println!("{line}");
                } else {
                    println!("{}", line.dark_grey());
                }
            }
        }
        CombatMenu::Inventory => {
            for (i, item) in c.inventory.iter().enumerate() {
                println!("  {}. {} x{}", i + 1, item.name, item.quantity);
            }
        }
        CombatMenu::Skills => {
            for (i, skill) in c.skills.iter().enumerate() {
                if skill.is_ready() {
                    println!("  {}. {}", i + 1, skill.name);
                } else {
                    let line = format!(
                        "  {}. {} (lista en {} turnos)",
                        i + 1,
                        skill.name,
                        skill.turns_until_ready
                    );
                    println!("{}", line.dark_grey());
                }
            }
        }
    }
}

fn print_sheet<N: Narrator, S: SaveStore>(session: &GameSession<N, S>) {
    let Some(c) = session.character() else {
        return;
    };
    println!("{}", format!("{} - {} {}", c.name, c.race, c.class).bold());
    println!("  Nivel {}  XP {}/{}", c.level, c.xp, c.xp_to_next_level);
    println!("  PS {}/{}  PM {}/{}", c.current_hp, c.max_hp, c.current_mp, c.max_mp);
    println!("  Ataque {}  Defensa {}", c.attack, c.defense);
    if !c.inventory.is_empty() {
        let items: Vec<String> = c
            .inventory
            .iter()
            .map(|i| format!("{} x{}", i.name, i.quantity))
            .collect();
        println!("  Inventario: {}", items.join(", "));
    }
    if !c.spells.is_empty() {
        let spells: Vec<String> = c
            .spells
            .iter()
            .map(|s| format!("{} ({} PM)", s.name, s.cost))
            .collect();
        println!("  Hechizos: {}", spells.join(", "));
    }
    for skill in &c.skills {
        println!("  Habilidad: {} (enfriamiento {})", skill.name, skill.cooldown);
    }
    if let Some(e) = session.enemy() {
        println!(
            "  Enemigo: {} PS {}/{}  ATQ {}  DEF {}",
            e.name, e.current_hp, e.max_hp, e.attack, e.defense
        );
    }
}

fn print_help() {
    println!("[AYUDA]");
    println!("  #estado                                  - Hoja de personaje");
    println!("  #guardar                                 - Guardar la partida");
    println!("  #menu <main|magia|inventario|habilidades> - Cambiar el menú de combate");
    println!("  #voz                                     - Activar o desactivar la narración por voz");
    println!("  #salir                                   - Salir del juego");
    println!("  En combate: ATACAR, DEFENDER, HUIR, LANZAR <hechizo>, USAR <objeto>,");
    println!("  USAR HABILIDAD <habilidad>, o el número de una opción del menú.");
    println!("  (cualquier otra cosa se envía como acción al Dungeon Master)");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick_by_number_or_name() {
        let options = ["Humano", "Elfo", "Enano"];
        assert_eq!(pick("2", &options), Some("Elfo"));
        assert_eq!(pick("enano", &options), Some("Enano"));
        assert_eq!(pick("0", &options), None);
        assert_eq!(pick("9", &options), None);
        assert_eq!(pick("Orco", &options), None);
    }
}
