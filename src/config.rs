/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD, or the
/// XDG/system data dirs). Falls back to defaults if the file is missing
/// or incomplete. A broken file is not fatal: defaults are used and the
/// problem is kept in `warnings` until the logger is up.

use log::LevelFilter;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "mageknight";

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub screen: ScreenConfig,
    pub level: LevelConfig,
    pub player: PlayerConfig,
    pub sword: SwordConfig,
    pub enemy: EnemyConfig,
    pub combat: CombatConfig,
    pub particles: ParticleConfig,
    pub controls: ControlsConfig,
    pub gamepad: GamepadConfig,
    pub sound: SoundConfig,
    /// `None` → embedded level.
    pub level_file: Option<PathBuf>,
    pub assets_dir: PathBuf,
    pub log_file: PathBuf,
    pub log_level: LevelFilter,
    pub frame_rate: u32,
    /// Problems found while loading, logged once logging is up.
    pub warnings: Vec<String>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ScreenConfig {
    #[serde(default = "default_viewport_width")]
    pub viewport_width: u32,
    #[serde(default = "default_viewport_height")]
    pub viewport_height: u32,
    /// World units per terminal column.
    #[serde(default = "default_cell_width")]
    pub cell_width: u32,
    /// World units per terminal row.
    #[serde(default = "default_cell_height")]
    pub cell_height: u32,
}

#[derive(Deserialize, Clone, Debug)]
pub struct LevelConfig {
    #[serde(default = "default_tile_size")]
    pub tile_size: u32,
    /// Used when the level has no `S` marker.
    #[serde(default = "default_spawn")]
    pub default_spawn: [f32; 2],
    /// Enemies below this y are removed.
    #[serde(default = "default_fallout_y")]
    pub fallout_y: f32,
}

#[derive(Deserialize, Clone, Debug)]
pub struct PlayerConfig {
    #[serde(default = "default_player_speed")]
    pub speed: f32,
    #[serde(default = "default_player_gravity")]
    pub gravity: f32,
    #[serde(default = "default_jump_speed")]
    pub jump_speed: f32,
    #[serde(default = "default_body_size")]
    pub width: u32,
    #[serde(default = "default_body_size")]
    pub height: u32,
    #[serde(default = "default_max_health")]
    pub max_health: i32,
    #[serde(default = "default_player_fps")]
    pub animation_fps: f32,
    #[serde(default = "default_footstep_interval")]
    pub footstep_interval_ms: f32,
    #[serde(default = "default_respawn_delay")]
    pub respawn_delay_frames: u32,
}

#[derive(Deserialize, Clone, Debug)]
pub struct SwordConfig {
    #[serde(default = "default_sword_x_offset")]
    pub x_offset: f32,
    #[serde(default = "default_sword_y_offset")]
    pub y_offset: f32,
    #[serde(default = "default_sword_size")]
    pub size: u32,
    #[serde(default = "default_sword_fps")]
    pub animation_fps: f32,
}

#[derive(Deserialize, Clone, Debug)]
pub struct EnemyConfig {
    #[serde(default = "default_body_size")]
    pub width: u32,
    #[serde(default = "default_body_size")]
    pub height: u32,
    #[serde(default = "default_enemy_speed")]
    pub speed: f32,
    #[serde(default = "default_enemy_gravity")]
    pub gravity: f32,
    /// Cycled through in spawn order.
    #[serde(default = "default_patrol_distances")]
    pub patrol_distances: Vec<f32>,
    #[serde(default = "default_look_ahead")]
    pub look_ahead: f32,
    /// Frames per walk-animation step.
    #[serde(default = "default_enemy_anim_ticks")]
    pub animation_ticks: u32,
}

#[derive(Deserialize, Clone, Debug)]
pub struct CombatConfig {
    #[serde(default = "default_invulnerable_frames")]
    pub invulnerable_frames: u32,
    #[serde(default = "default_knockback_x")]
    pub knockback_x: f32,
    #[serde(default = "default_knockback_y")]
    pub knockback_y: f32,
    #[serde(default = "default_contact_damage")]
    pub contact_damage: i32,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ParticleConfig {
    #[serde(default = "default_particle_capacity")]
    pub capacity: usize,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ControlsConfig {
    #[serde(default = "default_primary_keys")]
    pub primary: KeyBindings,
    #[serde(default = "default_alternate_keys")]
    pub alternate: KeyBindings,
}

/// Key names per action: a single character (`"a"`) or a named key
/// (`"space"`, `"left"`, `"esc"`, ...).
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct KeyBindings {
    #[serde(default)]
    pub move_left: Vec<String>,
    #[serde(default)]
    pub move_right: Vec<String>,
    #[serde(default)]
    pub jump: Vec<String>,
    #[serde(default)]
    pub attack: Vec<String>,
    #[serde(default)]
    pub pause: Vec<String>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct GamepadConfig {
    #[serde(default = "default_pad_jump")]
    pub jump: Vec<String>,
    #[serde(default = "default_pad_attack")]
    pub attack: Vec<String>,
    #[serde(default = "default_pad_pause")]
    pub pause: Vec<String>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct SoundConfig {
    #[serde(default = "default_music_volume")]
    pub music_volume: f32,
    #[serde(default = "default_sfx_volume")]
    pub sfx_volume: f32,
    #[serde(default = "default_music_on")]
    pub music: bool,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    general: TomlGeneral,
    #[serde(default)]
    screen: ScreenConfig,
    #[serde(default)]
    level: LevelConfig,
    #[serde(default)]
    player: PlayerConfig,
    #[serde(default)]
    sword: SwordConfig,
    #[serde(default)]
    enemy: EnemyConfig,
    #[serde(default)]
    combat: CombatConfig,
    #[serde(default)]
    particles: ParticleConfig,
    #[serde(default)]
    controls: ControlsConfig,
    #[serde(default)]
    gamepad: GamepadConfig,
    #[serde(default)]
    sound: SoundConfig,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default)]
    level_file: Option<String>,
    #[serde(default = "default_assets_dir")]
    assets_dir: String,
    #[serde(default = "default_log_file")]
    log_file: String,
    #[serde(default = "default_log_level")]
    log_level: String,
    #[serde(default = "default_frame_rate")]
    frame_rate: u32,
}

// ── Defaults ──

fn default_viewport_width() -> u32 { 640 }
fn default_viewport_height() -> u32 { 480 }
fn default_cell_width() -> u32 { 16 }
fn default_cell_height() -> u32 { 32 }

fn default_tile_size() -> u32 { 32 }
fn default_spawn() -> [f32; 2] { [50.0, 50.0] }
fn default_fallout_y() -> f32 { 2000.0 }

fn default_player_speed() -> f32 { 4.0 }
fn default_player_gravity() -> f32 { 1.0 }
fn default_jump_speed() -> f32 { -20.0 }
fn default_body_size() -> u32 { 64 }
fn default_max_health() -> i32 { 100 }
fn default_player_fps() -> f32 { 6.0 }
fn default_footstep_interval() -> f32 { 300.0 }
fn default_respawn_delay() -> u32 { 30 }      // half a second at 60 Hz

fn default_sword_x_offset() -> f32 { 20.0 }
fn default_sword_y_offset() -> f32 { 5.0 }
fn default_sword_size() -> u32 { 32 }
fn default_sword_fps() -> f32 { 15.0 }

fn default_enemy_speed() -> f32 { 1.0 }
fn default_enemy_gravity() -> f32 { 0.5 }
fn default_patrol_distances() -> Vec<f32> { vec![150.0, 200.0, 250.0] }
fn default_look_ahead() -> f32 { 4.0 }
fn default_enemy_anim_ticks() -> u32 { 10 }

fn default_invulnerable_frames() -> u32 { 60 }
fn default_knockback_x() -> f32 { 10.0 }
fn default_knockback_y() -> f32 { -8.0 }
fn default_contact_damage() -> i32 { 1 }

fn default_particle_capacity() -> usize { 64 }

fn keys(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn default_primary_keys() -> KeyBindings {
    KeyBindings {
        move_left: keys(&["a"]),
        move_right: keys(&["d"]),
        jump: keys(&["space", "w"]),
        attack: keys(&["j"]),
        pause: keys(&["esc"]),
    }
}

fn default_alternate_keys() -> KeyBindings {
    KeyBindings {
        move_left: keys(&["left"]),
        move_right: keys(&["right"]),
        jump: keys(&["up"]),
        attack: keys(&["z"]),
        pause: keys(&["p"]),
    }
}

fn default_pad_jump() -> Vec<String> { keys(&["A"]) }
fn default_pad_attack() -> Vec<String> { keys(&["X", "B"]) }
fn default_pad_pause() -> Vec<String> { keys(&["Start"]) }

fn default_music_volume() -> f32 { 0.7 }
fn default_sfx_volume() -> f32 { 1.0 }
fn default_music_on() -> bool { true }

fn default_assets_dir() -> String { "assets".into() }
fn default_log_file() -> String { format!("{APP_DIR}.log") }
fn default_log_level() -> String { "info".into() }
fn default_frame_rate() -> u32 { 60 }

impl Default for ScreenConfig {
    fn default() -> Self {
        ScreenConfig {
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
            cell_width: default_cell_width(),
            cell_height: default_cell_height(),
        }
    }
}

impl Default for LevelConfig {
    fn default() -> Self {
        LevelConfig {
            tile_size: default_tile_size(),
            default_spawn: default_spawn(),
            fallout_y: default_fallout_y(),
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        PlayerConfig {
            speed: default_player_speed(),
            gravity: default_player_gravity(),
            jump_speed: default_jump_speed(),
            width: default_body_size(),
            height: default_body_size(),
            max_health: default_max_health(),
            animation_fps: default_player_fps(),
            footstep_interval_ms: default_footstep_interval(),
            respawn_delay_frames: default_respawn_delay(),
        }
    }
}

impl Default for SwordConfig {
    fn default() -> Self {
        SwordConfig {
            x_offset: default_sword_x_offset(),
            y_offset: default_sword_y_offset(),
            size: default_sword_size(),
            animation_fps: default_sword_fps(),
        }
    }
}

impl Default for EnemyConfig {
    fn default() -> Self {
        EnemyConfig {
            width: default_body_size(),
            height: default_body_size(),
            speed: default_enemy_speed(),
            gravity: default_enemy_gravity(),
            patrol_distances: default_patrol_distances(),
            look_ahead: default_look_ahead(),
            animation_ticks: default_enemy_anim_ticks(),
        }
    }
}

impl Default for CombatConfig {
    fn default() -> Self {
        CombatConfig {
            invulnerable_frames: default_invulnerable_frames(),
            knockback_x: default_knockback_x(),
            knockback_y: default_knockback_y(),
            contact_damage: default_contact_damage(),
        }
    }
}

impl Default for ParticleConfig {
    fn default() -> Self {
        ParticleConfig { capacity: default_particle_capacity() }
    }
}

impl Default for ControlsConfig {
    fn default() -> Self {
        ControlsConfig {
            primary: default_primary_keys(),
            alternate: default_alternate_keys(),
        }
    }
}

impl Default for GamepadConfig {
    fn default() -> Self {
        GamepadConfig {
            jump: default_pad_jump(),
            attack: default_pad_attack(),
            pause: default_pad_pause(),
        }
    }
}

impl Default for SoundConfig {
    fn default() -> Self {
        SoundConfig {
            music_volume: default_music_volume(),
            sfx_volume: default_sfx_volume(),
            music: default_music_on(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            level_file: None,
            assets_dir: default_assets_dir(),
            log_file: default_log_file(),
            log_level: default_log_level(),
            frame_rate: default_frame_rate(),
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::resolve(TomlConfig::default(), &[], Vec::new())
    }
}

/// Zero sizes and counts fall back to the default, with a warning.
fn require_size(value: &mut u32, key: &str, default: u32, warnings: &mut Vec<String>) {
    if *value == 0 {
        warnings.push(format!("{key} must be positive, using {default}"));
        *value = default;
    }
}

/// Rates must be finite and above zero; NaN is rejected too.
fn require_rate(value: &mut f32, key: &str, default: f32, warnings: &mut Vec<String>) {
    if !(value.is_finite() && *value > 0.0) {
        warnings.push(format!("{key} must be positive, using {default}"));
        *value = default;
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory,
    /// (3) `~/.local/share/mageknight`, (4) `/usr/share/mageknight`.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let mut warnings = Vec::new();
        let toml_cfg = load_toml(&search_dirs, &mut warnings);
        GameConfig::resolve(toml_cfg, &search_dirs, warnings)
    }

    /// Parse a config document directly. Relative paths stay relative.
    #[cfg(test)]
    pub fn from_toml_str(text: &str) -> Self {
        let mut warnings = Vec::new();
        let toml_cfg = parse_toml(text, "config.toml", &mut warnings);
        GameConfig::resolve(toml_cfg, &[], warnings)
    }

    fn resolve(toml_cfg: TomlConfig, search_dirs: &[PathBuf], mut warnings: Vec<String>) -> Self {
        let general = toml_cfg.general;

        let log_level = general.log_level.parse::<LevelFilter>().unwrap_or_else(|_| {
            warnings.push(format!("unknown log_level '{}', using info", general.log_level));
            LevelFilter::Info
        });

        let mut level = toml_cfg.level;
        require_size(&mut level.tile_size, "level.tile_size", default_tile_size(), &mut warnings);

        let mut player = toml_cfg.player;
        require_size(&mut player.width, "player.width", default_body_size(), &mut warnings);
        require_size(&mut player.height, "player.height", default_body_size(), &mut warnings);
        if player.max_health <= 0 {
            warnings.push(format!(
                "player.max_health must be positive, using {}", default_max_health()
            ));
            player.max_health = default_max_health();
        }
        require_rate(&mut player.animation_fps, "player.animation_fps", default_player_fps(), &mut warnings);

        let mut sword = toml_cfg.sword;
        require_size(&mut sword.size, "sword.size", default_sword_size(), &mut warnings);
        require_rate(&mut sword.animation_fps, "sword.animation_fps", default_sword_fps(), &mut warnings);

        let mut enemy = toml_cfg.enemy;
        require_size(&mut enemy.width, "enemy.width", default_body_size(), &mut warnings);
        require_size(&mut enemy.height, "enemy.height", default_body_size(), &mut warnings);
        if enemy.patrol_distances.is_empty() {
            warnings.push("enemy.patrol_distances is empty, using defaults".into());
            enemy.patrol_distances = default_patrol_distances();
        }

        let mut frame_rate = general.frame_rate;
        require_size(&mut frame_rate, "general.frame_rate", default_frame_rate(), &mut warnings);

        GameConfig {
            screen: toml_cfg.screen,
            level,
            player,
            sword,
            enemy,
            combat: toml_cfg.combat,
            particles: toml_cfg.particles,
            controls: toml_cfg.controls,
            gamepad: toml_cfg.gamepad,
            sound: toml_cfg.sound,
            level_file: general.level_file.map(|f| find_path(&f, search_dirs, Path::is_file)),
            assets_dir: find_path(&general.assets_dir, search_dirs, Path::is_dir),
            log_file: PathBuf::from(general.log_file),
            log_level,
            frame_rate,
            warnings,
        }
    }

    /// Patrol distance for the `index`-th enemy spawn.
    pub fn patrol_distance(&self, index: usize) -> f32 {
        let d = &self.enemy.patrol_distances;
        d[index % d.len()]
    }
}

/// Absolute paths are taken as-is; relative ones are looked up in each
/// candidate dir and fall back to CWD-relative.
fn find_path(name: &str, search_dirs: &[PathBuf], exists: fn(&Path) -> bool) -> PathBuf {
    let path = PathBuf::from(name);
    if path.is_absolute() {
        return path;
    }
    search_dirs.iter()
        .map(|d| d.join(name))
        .find(|p| exists(p))
        .unwrap_or(path)
}

/// Candidate directories to search: exe dir + CWD + data dirs (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    // 3. XDG data home
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share").join(APP_DIR);
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    // 4. System data directory
    let sys = PathBuf::from("/usr/share").join(APP_DIR);
    if sys.is_dir() && !dirs.iter().any(|d| d == &sys) {
        dirs.push(sys);
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// First readable config.toml in the candidate directories wins.
fn load_toml(search_dirs: &[PathBuf], warnings: &mut Vec<String>) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if !path.exists() {
            continue;
        }
        match std::fs::read_to_string(&path) {
            Ok(text) => return parse_toml(&text, &path.display().to_string(), warnings),
            Err(e) => warnings.push(format!("could not read {}: {e}", path.display())),
        }
    }
    TomlConfig::default()
}

fn parse_toml(text: &str, origin: &str, warnings: &mut Vec<String>) -> TomlConfig {
    match toml::from_str::<TomlConfig>(text) {
        Ok(cfg) => cfg,
        Err(e) => {
            warnings.push(format!("{origin} parse error, using default settings: {e}"));
            TomlConfig::default()
        }
    }
}
