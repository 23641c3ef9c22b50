use std::collections::HashMap;
use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::{
  Context,
  anyhow
};
use chrono_tz::Tz;
use taskmedic_core::datetime::parse_timezone;
use tracing::{
  debug,
  info,
  trace,
  warn
};

pub const RC_ENV: &str = "TASKMEDICRC";

const KNOWN_KEYS: [&str; 4] = [
  "data.location",
  "display.timezone",
  "list.highlight",
  "color"
];

#[derive(Debug, Clone)]
pub struct Config {
  map: HashMap<String, String>,
  pub source: Option<PathBuf>
}

impl Default for Config {
  fn default() -> Self {
    let defaults = [
      "~/.taskmedic",
      "UTC",
      "off",
      "on"
    ];
    let map = KNOWN_KEYS
      .iter()
      .zip(defaults)
      .map(|(key, value)| {
        (key.to_string(), value.to_string())
      })
      .collect();
    Self {
      map,
      source: None
    }
  }
}

impl Config {
  #[tracing::instrument(skip(
    rc_override
  ))]
  pub fn load(
    rc_override: Option<&Path>
  ) -> anyhow::Result<Self> {
    let mut cfg = Config::default();

    let rc =
      resolve_rc_path(rc_override)?;
    if let Some(path) = rc {
      info!(rc = %path.display(), "loading taskmedicrc");
      cfg.load_file(&path)?;
    } else {
      debug!(
        "no taskmedicrc found; using \
         defaults"
      );
    }

    Ok(cfg)
  }

  #[tracing::instrument(skip(
    self, overrides
  ))]
  pub fn apply_overrides<I>(
    &mut self,
    overrides: I
  ) where
    I: IntoIterator<
      Item = (String, String)
    >
  {
    for (k, v) in overrides {
      let key = k
        .strip_prefix("rc.")
        .unwrap_or(&k)
        .to_string();
      debug!(key = %key, value = %v, "applying override");
      self.map.insert(key, v);
    }
  }

  pub fn get(
    &self,
    key: &str
  ) -> Option<String> {
    self.map.get(key).cloned()
  }

  pub fn get_bool(
    &self,
    key: &str
  ) -> Option<bool> {
    self
      .map
      .get(key)
      .map(|v| parse_bool(v))
  }

  pub fn timezone(
    &self
  ) -> anyhow::Result<Tz> {
    let raw = self
      .get("display.timezone")
      .unwrap_or_else(|| {
        "UTC".to_string()
      });
    parse_timezone(&raw).ok_or_else(
      || {
        anyhow!(
          "invalid display.timezone: \
           {raw}"
        )
      }
    )
  }

  pub fn highlight(&self) -> bool {
    self
      .get_bool("list.highlight")
      .unwrap_or(false)
  }

  /// Reads one rc file. Lines are
  /// `key = value`; `#` starts a comment.
  #[tracing::instrument(skip(self))]
  fn load_file(
    &mut self,
    path: &Path
  ) -> anyhow::Result<()> {
    let path = expand_tilde(path);
    let text =
      fs::read_to_string(&path)
        .with_context(|| {
          format!(
            "failed to read {}",
            path.display()
          )
        })?;

    for (line_num, raw_line) in
      text.lines().enumerate()
    {
      let line = raw_line
        .split_once('#')
        .map_or(raw_line, |(before, _)| {
          before
        })
        .trim();
      if line.is_empty() {
        continue;
      }

      let (k, v) = line
        .split_once('=')
        .ok_or_else(|| {
          anyhow!(
            "invalid config line \
             {}:{}: {}",
            path.display(),
            line_num + 1,
            raw_line
          )
        })?;

      let key = k.trim();
      if !KNOWN_KEYS.contains(&key) {
        warn!(
          file = %path.display(),
          line = line_num + 1,
          key,
          "unknown taskmedicrc key"
        );
      }
      trace!(key, value = %v.trim(), "loaded config key");
      self.map.insert(
        key.to_string(),
        v.trim().to_string()
      );
    }

    self.source = Some(path);
    Ok(())
  }
}

#[tracing::instrument(skip(
  cfg,
  override_dir
))]
pub fn resolve_data_dir(
  cfg: &Config,
  override_dir: Option<&Path>
) -> anyhow::Result<PathBuf> {
  let dir = if let Some(path) =
    override_dir
  {
    path.to_path_buf()
  } else if let Some(cfg_value) =
    cfg.get("data.location")
  {
    expand_tilde(Path::new(&cfg_value))
  } else {
    default_data_dir()?
  };

  if !dir.exists() {
    info!(dir = %dir.display(), "creating data directory");
    fs::create_dir_all(&dir)
      .with_context(|| {
        format!(
          "failed to create {}",
          dir.display()
        )
      })?;
  }

  Ok(dir)
}

#[tracing::instrument(skip(
  override_path
))]
fn resolve_rc_path(
  override_path: Option<&Path>
) -> anyhow::Result<Option<PathBuf>> {
  if let Some(path) = override_path {
    return Ok(Some(path.to_path_buf()));
  }

  if let Ok(rc_env) =
    std::env::var(RC_ENV)
  {
    if rc_env == "/dev/null" {
      return Ok(None);
    }
    return Ok(Some(PathBuf::from(
      rc_env
    )));
  }

  let Some(home) = dirs::home_dir()
  else {
    warn!(
      "cannot determine home \
       directory; skipping \
       taskmedicrc"
    );
    return Ok(None);
  };
  let candidate =
    home.join(".taskmedicrc");
  if candidate.exists() {
    return Ok(Some(candidate));
  }

  Ok(None)
}

fn default_data_dir()
-> anyhow::Result<PathBuf> {
  let home = dirs::home_dir()
    .ok_or_else(|| {
      anyhow!(
        "cannot determine home \
         directory"
      )
    })?;
  Ok(home.join(".taskmedic"))
}

fn expand_tilde(
  path: &Path
) -> PathBuf {
  let text = path.to_string_lossy();
  if let Some(rest) =
    text.strip_prefix("~/")
    && let Some(home) = dirs::home_dir()
  {
    return home.join(rest);
  }
  path.to_path_buf()
}

fn parse_bool(s: &str) -> bool {
  matches!(
    s.trim()
      .to_ascii_lowercase()
      .as_str(),
    "1" | "y" | "yes" | "on" | "true"
  )
}

#[cfg(test)]
mod tests {
  use tempfile::tempdir;

  use super::*;

  #[test]
  fn rc_file_with_comments_and_overrides(
  ) {
    let dir =
      tempdir().expect("tempdir");
    let rc = dir.path().join("main.rc");
    fs::write(
      &rc,
      "# shift laptop\n\
       display.timezone = Europe/London # local\n\
       \n\
       list.highlight = yes\n\
       pager = less\n"
    )
    .expect("write rc");

    let mut cfg = Config::load(Some(&rc))
      .expect("load config");
    assert_eq!(
      cfg.source.as_deref(),
      Some(rc.as_path())
    );
    assert!(cfg.highlight());
    assert_eq!(
      cfg.timezone().expect("timezone"),
      chrono_tz::Europe::London
    );
    assert_eq!(
      cfg.get("pager").as_deref(),
      Some("less")
    );

    cfg.apply_overrides(vec![(
      "rc.display.timezone".to_string(),
      "Mars/Olympus".to_string()
    )]);
    assert!(cfg.timezone().is_err());
  }

  #[test]
  fn malformed_line_is_reported_with_location(
  ) {
    let dir =
      tempdir().expect("tempdir");
    let rc = dir.path().join("bad.rc");
    fs::write(&rc, "color on\n")
      .expect("write rc");

    let err = Config::load(Some(&rc))
      .expect_err("invalid line");
    assert!(
      format!("{err:#}")
        .contains("bad.rc:1")
    );
  }

  #[test]
  fn defaults_cover_every_known_key() {
    let cfg = Config::default();
    assert_eq!(
      cfg.get("data.location").as_deref(),
      Some("~/.taskmedic")
    );
    assert!(!cfg.highlight());
    assert_eq!(
      cfg.timezone().expect("utc"),
      chrono_tz::UTC
    );
  }
}
