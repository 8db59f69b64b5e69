//! External configuration loader.
//!
//! Reads `config.toml` from the executable's directory (or CWD).
//! Falls back to sensible defaults if the file is missing or incomplete.
//! Problems found while loading are collected in `warnings` and logged once
//! tracing is up, since the log file location itself comes from here.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub timing: TimingConfig,
    pub script: ScriptConfig,
    pub audio: AudioConfig,
    pub gamepad: GamepadConfig,
    /// `None` = use the message compiled into the binary.
    pub message_file: Option<PathBuf>,
    pub seed: Option<u64>,
    pub log_file: PathBuf,
    pub warnings: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct TimingConfig {
    pub intro_fade: Duration,
    pub type_in: Duration,
    pub prompt: Duration,
    pub scramble_tick: Duration,
    pub scramble_max_ticks: u32,
    pub scramble_budget: Duration,
    pub message_converge: Duration,
    pub art_converge: Duration,
    pub converge_pause: Duration,
    pub epilogue_char: Duration,
    pub epilogue_line_pause: Duration,
    pub closing_pause: Duration,
    pub fade_delay: Duration,
    pub fade_steps: u32,
    pub fade_step: Duration,
    pub settle: Duration,
}

#[derive(Clone, Debug)]
pub struct ScriptConfig {
    pub prompt: String,
    pub epilogue: Vec<String>,
    pub closing: String,
}

#[derive(Clone, Debug)]
pub struct AudioConfig {
    pub music_volume: f32,
    pub effects_volume: f32,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    script: TomlScript,
    #[serde(default)]
    audio: TomlAudio,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_intro_fade")]
    intro_fade_ms: u64,
    #[serde(default = "default_type_in")]
    type_in_ms: u64,
    #[serde(default = "default_prompt_ms")]
    prompt_ms: u64,
    #[serde(default = "default_scramble_tick")]
    scramble_tick_ms: u64,
    #[serde(default = "default_scramble_max_ticks")]
    scramble_max_ticks: u32,
    #[serde(default = "default_scramble_budget")]
    scramble_budget_ms: u64,
    #[serde(default = "default_message_converge")]
    message_converge_ms: u64,
    #[serde(default = "default_art_converge")]
    art_converge_ms: u64,
    #[serde(default = "default_converge_pause")]
    converge_pause_ms: u64,
    #[serde(default = "default_epilogue_char")]
    epilogue_char_ms: u64,
    #[serde(default = "default_epilogue_line_pause")]
    epilogue_line_pause_ms: u64,
    #[serde(default = "default_closing_pause")]
    closing_pause_ms: u64,
    #[serde(default = "default_fade_delay")]
    fade_delay_ms: u64,
    #[serde(default = "default_fade_steps")]
    fade_steps: u32,
    #[serde(default = "default_fade_step")]
    fade_step_ms: u64,
    #[serde(default = "default_settle")]
    settle_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlScript {
    #[serde(default = "default_prompt")]
    prompt: String,
    #[serde(default = "default_epilogue")]
    epilogue: Vec<String>,
    #[serde(default = "default_closing")]
    closing: String,
}

#[derive(Deserialize, Debug)]
struct TomlAudio {
    #[serde(default = "default_music_volume")]
    music_volume: f32,
    #[serde(default = "default_effects_volume")]
    effects_volume: f32,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_confirm")]
    confirm: Vec<String>,
    #[serde(default = "default_cancel")]
    cancel: Vec<String>,
}

#[derive(Deserialize, Debug, Default)]
struct TomlGeneral {
    #[serde(default)]
    message_file: Option<String>,
    #[serde(default)]
    seed: Option<u64>,
    #[serde(default)]
    log_file: Option<String>,
}

// ── Defaults ──

fn default_intro_fade() -> u64 { 500 }
fn default_type_in() -> u64 { 10 }
fn default_prompt_ms() -> u64 { 50 }
fn default_scramble_tick() -> u64 { 10 }
fn default_scramble_max_ticks() -> u32 { 100 }
fn default_scramble_budget() -> u64 { 1000 }
fn default_message_converge() -> u64 { 2 }
fn default_art_converge() -> u64 { 3 }
fn default_converge_pause() -> u64 { 1000 }
fn default_epilogue_char() -> u64 { 50 }
fn default_epilogue_line_pause() -> u64 { 800 }
fn default_closing_pause() -> u64 { 1500 }
fn default_fade_delay() -> u64 { 300 }
fn default_fade_steps() -> u32 { 8 }
fn default_fade_step() -> u64 { 60 }
fn default_settle() -> u64 { 2000 }

fn default_prompt() -> String { "\n\nHit Enter To Decrypt...".into() }

fn default_epilogue() -> Vec<String> {
    [
        "being here at all is a privilege",
        "a chance that not everyone your age is given",
        "only a few of the people you grew up with get to sit where you sit",
        "that is a gift, and it is also a responsibility",
        "because you are students",
        "MORE THAN STUDENTS",
        "YOU ARE WHAT COMES NEXT",
        "THE GENERATION THAT CARRIES IT FORWARD",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_closing() -> String {
    "Keep your spirit up through every semester.\n\
     Every challenge is a chance to grow.\n\
     Be more than clever: be someone people can rely on.\n\
     The future is already in your hands.\n\
     Study with patience, build with sincerity.\n\
     Reach as high as you can.\n\
     \n\
     -- the night shift"
        .into()
}

fn default_music_volume() -> f32 { 0.5 }
fn default_effects_volume() -> f32 { 0.3 }

fn default_confirm() -> Vec<String> { vec!["Start".into(), "A".into()] }
fn default_cancel() -> Vec<String> { vec!["Select".into()] }

const DEFAULT_LOG_FILE: &str = "cipherscroll.log";

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            intro_fade_ms: default_intro_fade(),
            type_in_ms: default_type_in(),
            prompt_ms: default_prompt_ms(),
            scramble_tick_ms: default_scramble_tick(),
            scramble_max_ticks: default_scramble_max_ticks(),
            scramble_budget_ms: default_scramble_budget(),
            message_converge_ms: default_message_converge(),
            art_converge_ms: default_art_converge(),
            converge_pause_ms: default_converge_pause(),
            epilogue_char_ms: default_epilogue_char(),
            epilogue_line_pause_ms: default_epilogue_line_pause(),
            closing_pause_ms: default_closing_pause(),
            fade_delay_ms: default_fade_delay(),
            fade_steps: default_fade_steps(),
            fade_step_ms: default_fade_step(),
            settle_ms: default_settle(),
        }
    }
}

impl Default for TomlScript {
    fn default() -> Self {
        TomlScript {
            prompt: default_prompt(),
            epilogue: default_epilogue(),
            closing: default_closing(),
        }
    }
}

impl Default for TomlAudio {
    fn default() -> Self {
        TomlAudio {
            music_volume: default_music_volume(),
            effects_volume: default_effects_volume(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            confirm: default_confirm(),
            cancel: default_cancel(),
        }
    }
}

// ── Conversion ──

/// Tick intervals of zero would spin the scheduler; clamp to 1 ms.
fn tick(ms: u64) -> Duration {
    Duration::from_millis(ms.max(1))
}

fn pause(ms: u64) -> Duration {
    Duration::from_millis(ms)
}

impl From<&TomlTiming> for TimingConfig {
    fn from(t: &TomlTiming) -> Self {
        TimingConfig {
            intro_fade: pause(t.intro_fade_ms),
            type_in: tick(t.type_in_ms),
            prompt: tick(t.prompt_ms),
            scramble_tick: tick(t.scramble_tick_ms),
            scramble_max_ticks: t.scramble_max_ticks,
            scramble_budget: pause(t.scramble_budget_ms),
            message_converge: tick(t.message_converge_ms),
            art_converge: tick(t.art_converge_ms),
            converge_pause: pause(t.converge_pause_ms),
            epilogue_char: tick(t.epilogue_char_ms),
            epilogue_line_pause: pause(t.epilogue_line_pause_ms),
            closing_pause: pause(t.closing_pause_ms),
            fade_delay: pause(t.fade_delay_ms),
            fade_steps: t.fade_steps,
            fade_step: tick(t.fade_step_ms),
            settle: pause(t.settle_ms),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        TimingConfig::from(&TomlTiming::default())
    }
}

impl Default for ScriptConfig {
    fn default() -> Self {
        let s = TomlScript::default();
        ScriptConfig { prompt: s.prompt, epilogue: s.epilogue, closing: s.closing }
    }
}

// ── Loading ──

impl AppConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let mut warnings = Vec::new();
        let toml_cfg = load_toml(&search_dirs, &mut warnings);
        Self::from_toml(toml_cfg, &search_dirs, warnings)
    }

    /// Parse a config document directly (no file search).
    #[cfg(test)]
    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        let toml_cfg = toml::from_str::<TomlConfig>(text)?;
        Ok(Self::from_toml(toml_cfg, &[], Vec::new()))
    }

    fn from_toml(toml_cfg: TomlConfig, search_dirs: &[PathBuf], mut warnings: Vec<String>) -> Self {
        // Resolve message file against the search dirs, like a data file.
        let message_file = toml_cfg.general.message_file.as_deref().map(|name| {
            let path = PathBuf::from(name);
            if path.is_absolute() {
                path
            } else {
                search_dirs.iter()
                    .map(|d| d.join(name))
                    .find(|p| p.is_file())
                    .unwrap_or(path)
            }
        });

        let audio = AudioConfig {
            music_volume: clamp_volume(toml_cfg.audio.music_volume, "music_volume", &mut warnings),
            effects_volume: clamp_volume(toml_cfg.audio.effects_volume, "effects_volume", &mut warnings),
        };

        if toml_cfg.script.epilogue.is_empty() {
            warnings.push("script.epilogue is empty; epilogue will only show the closing text".into());
        }

        AppConfig {
            timing: TimingConfig::from(&toml_cfg.timing),
            script: ScriptConfig {
                prompt: toml_cfg.script.prompt,
                epilogue: toml_cfg.script.epilogue,
                closing: toml_cfg.script.closing,
            },
            audio,
            gamepad: GamepadConfig {
                confirm: toml_cfg.gamepad.confirm,
                cancel: toml_cfg.gamepad.cancel,
            },
            message_file,
            seed: toml_cfg.general.seed,
            log_file: PathBuf::from(
                toml_cfg.general.log_file.unwrap_or_else(|| DEFAULT_LOG_FILE.into()),
            ),
            warnings,
        }
    }
}

fn clamp_volume(v: f32, key: &str, warnings: &mut Vec<String>) -> f32 {
    if (0.0..=1.0).contains(&v) {
        v
    } else {
        warnings.push(format!("audio.{key} = {v} out of range, clamped to 0.0..=1.0"));
        v.clamp(0.0, 1.0)
    }
}

/// Candidate directories to search: exe dir + CWD + data paths (deduplicated).
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

    // 3. XDG data home (~/.local/share/cipherscroll)
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/cipherscroll");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    // 4. System data directory
    let sys = PathBuf::from("/usr/share/cipherscroll");
    if sys.is_dir() && !dirs.iter().any(|d| d == &sys) {
        dirs.push(sys);
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf], warnings: &mut Vec<String>) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        warnings.push(format!(
                            "{} parse error, using defaults: {e}",
                            path.display()
                        ));
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    warnings.push(format!("could not read {}: {e}", path.display()));
                }
            }
        }
    }
    TomlConfig::default()
}
