use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

pub fn jot_home() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".jot"))
}

pub fn ensure_jot_home() -> Result<PathBuf> {
    let dir = jot_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSection {
    pub base_url: String,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiSection {
                base_url: "http://127.0.0.1:8000".to_string(),
                timeout_secs: 10,
            },
        }
    }
}

fn config_path() -> Result<PathBuf> {
    Ok(ensure_jot_home()?.join("config.toml"))
}

/// Read ~/.jot/config.toml, writing the defaults on first use.
pub fn read_config() -> Result<Config> {
    let p = config_path()?;
    if !p.exists() {
        let config = Config::default();
        write_config(&config)?;
        return Ok(config);
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn write_config(config: &Config) -> Result<()> {
    let p = config_path()?;
    let s = toml::to_string_pretty(config)?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthState {
    pub token: Option<String>,
}

fn auth_path() -> Result<PathBuf> {
    Ok(ensure_jot_home()?.join("auth.json"))
}

pub fn load_auth() -> Result<AuthState> {
    let p = auth_path()?;
    if !p.exists() {
        return Ok(AuthState::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    Ok(serde_json::from_str(&s)?)
}

pub fn save_auth(auth: &AuthState) -> Result<()> {
    let p = auth_path()?;
    let s = serde_json::to_string_pretty(auth)?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

fn prompt_secret(label: &str) -> Result<String> {
    // Minimal portable secret prompt: just stdin.
    print!("{}: ", label);
    io::stdout().flush().ok();
    let mut s = String::new();
    io::stdin().read_line(&mut s)?;
    Ok(s.trim().to_string())
}

/// Store the API token the remote collection expects as a bearer header.
/// Obtaining the token is the identity provider's business, not ours.
pub fn paste_token() -> Result<()> {
    let token = prompt_secret("Paste API token")?;
    if token.is_empty() {
        bail!("no token entered");
    }
    save_auth(&AuthState { token: Some(token) })?;
    println!("Saved token to ~/.jot/auth.json");
    Ok(())
}

pub fn clear_token() -> Result<()> {
    save_auth(&AuthState::default())?;
    println!("Cleared stored token");
    Ok(())
}
