use std::collections::BTreeMap;
use std::fs;
use std::path::{
  Path,
  PathBuf
};
use std::time::Duration;

use anyhow::{
  Context,
  anyhow
};
use tracing::{
  debug,
  info,
  trace,
  warn
};

use crate::booking::BookingDomain;
use crate::scheduler::OutsideMonthPolicy;

const RC_ENV_VAR: &str = "COURTSIDERC";
const RC_FILE_NAME: &str = ".courtsiderc";

#[derive(Debug, Clone)]
pub struct Config {
  map:              BTreeMap<String, String>,
  pub loaded_files: Vec<PathBuf>
}

/// Connection settings for the booking
/// backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiSettings {
  pub base_url: String,
  pub session:  Option<String>,
  pub timeout:  Duration
}

impl Default for Config {
  fn default() -> Self {
    let mut map = BTreeMap::new();
    for (k, v) in [
      ("api.url", "http://localhost:5000"),
      ("api.timeout_secs", "30"),
      ("timezone", "Asia/Kolkata"),
      ("color", "on"),
      ("calendar.outside_month", "ignore"),
      ("default.domain", "turf")
    ] {
      map.insert(
        k.to_string(),
        v.to_string()
      );
    }
    Config {
      map,
      loaded_files: vec![]
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

    let rc = resolve_rc_path(rc_override)?;
    if let Some(path) = rc {
      info!(rc = %path.display(), "loading courtsiderc");
      cfg.load_file(&path)?;
    } else {
      warn!(
        "no courtsiderc found; using \
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

  pub fn iter(
    &self
  ) -> impl Iterator<Item = (&String, &String)>
  {
    self.map.iter()
  }

  pub fn api_settings(
    &self
  ) -> anyhow::Result<ApiSettings> {
    let base_url = self
      .get("api.url")
      .map(|url| {
        url.trim().trim_end_matches('/').to_string()
      })
      .filter(|url| !url.is_empty())
      .ok_or_else(|| {
        anyhow!("api.url is not set")
      })?;

    let session = self
      .get("api.session")
      .map(|s| s.trim().to_string())
      .filter(|s| !s.is_empty());

    let timeout_raw = self
      .get("api.timeout_secs")
      .unwrap_or_else(|| {
        "30".to_string()
      });
    let timeout_secs: u64 = timeout_raw
      .trim()
      .parse()
      .with_context(|| {
        format!(
          "invalid api.timeout_secs: \
           {timeout_raw}"
        )
      })?;

    Ok(ApiSettings {
      base_url,
      session,
      timeout: Duration::from_secs(
        timeout_secs.max(1)
      )
    })
  }

  pub fn outside_month_policy(
    &self
  ) -> anyhow::Result<OutsideMonthPolicy>
  {
    self
      .get("calendar.outside_month")
      .map(|raw| raw.parse())
      .unwrap_or(Ok(
        OutsideMonthPolicy::Ignore
      ))
  }

  pub fn default_domain(
    &self
  ) -> anyhow::Result<BookingDomain> {
    self
      .get("default.domain")
      .map(|raw| raw.parse())
      .unwrap_or(Ok(BookingDomain::Turf))
  }

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

    self
      .loaded_files
      .push(path.clone());

    let base_dir = path
      .parent()
      .map(|p| p.to_path_buf())
      .unwrap_or_else(|| {
        PathBuf::from(".")
      });

    for (line_num, raw_line) in
      text.lines().enumerate()
    {
      let mut line = raw_line.trim();
      if line.is_empty()
        || line.starts_with('#')
      {
        continue;
      }

      if let Some((before, _)) =
        line.split_once('#')
      {
        line = before.trim();
      }

      if line.is_empty() {
        continue;
      }

      if let Some(include_rest) =
        line.strip_prefix("include ")
      {
        let include_path =
          resolve_include_path(
            &base_dir,
            include_rest.trim()
          )?;
        debug!(
            file = %path.display(),
            include = %include_path.display(),
            line = line_num + 1,
            "processing include"
        );

        if include_path.exists() {
          self
            .load_file(&include_path)?;
        } else {
          warn!(include = %include_path.display(), "include file does not exist; skipping");
        }
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

      let key = k.trim().to_string();
      let value = v.trim().to_string();
      trace!(key = %key, "loaded config key");
      self.map.insert(key, value);
    }

    Ok(())
  }
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
    std::env::var(RC_ENV_VAR)
  {
    if rc_env == "/dev/null" {
      return Ok(None);
    }
    return Ok(Some(PathBuf::from(
      rc_env
    )));
  }

  let Some(home) = dirs::home_dir() else {
    warn!(
      "cannot determine home \
       directory; skipping \
       courtsiderc lookup"
    );
    return Ok(None);
  };
  let candidate = home.join(RC_FILE_NAME);
  if candidate.exists() {
    return Ok(Some(candidate));
  }

  Ok(None)
}

fn resolve_include_path(
  base_dir: &Path,
  include: &str
) -> anyhow::Result<PathBuf> {
  if include.trim().is_empty() {
    return Err(anyhow!(
      "include path cannot be empty"
    ));
  }

  let raw = PathBuf::from(include);
  let expanded = expand_tilde(&raw);
  if expanded.is_absolute() {
    Ok(expanded)
  } else {
    Ok(base_dir.join(expanded))
  }
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
