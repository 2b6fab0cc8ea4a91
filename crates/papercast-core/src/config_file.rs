use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::Config;

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub timeouts: Option<TimeoutsConfig>,
    pub quality: Option<QualityConfig>,
    pub segmentation: Option<SegmentationFileConfig>,
    pub http: Option<HttpConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimeoutsConfig {
    pub html_ms: Option<u64>,
    pub pdf_ms: Option<u64>,
    pub pdf_parse_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QualityConfig {
    pub min_content_chars: Option<usize>,
    pub redirect_markers: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SegmentationFileConfig {
    pub min_marker_gap: Option<usize>,
    pub min_body_chars: Option<usize>,
    pub pdf_min_body_chars: Option<usize>,
    /// Strategy names appended after the default chain (e.g. `"all_caps"`).
    pub extra_strategies: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HttpConfig {
    pub user_agent: Option<String>,
    pub max_redirects: Option<usize>,
}

/// Platform config directory path: `<config_dir>/papercast/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("papercast").join("config.toml"))
}

/// Load config by cascading CWD `.papercast.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".papercast.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring invalid config file");
            None
        }
    }
}

/// Pick the overlay's value when present, else the base's.
fn pick<S, T>(
    base: &Option<S>,
    overlay: &Option<S>,
    field: impl Fn(&S) -> Option<T>,
) -> Option<T> {
    overlay
        .as_ref()
        .and_then(&field)
        .or_else(|| base.as_ref().and_then(&field))
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    ConfigFile {
        timeouts: Some(TimeoutsConfig {
            html_ms: pick(&base.timeouts, &overlay.timeouts, |t| t.html_ms),
            pdf_ms: pick(&base.timeouts, &overlay.timeouts, |t| t.pdf_ms),
            pdf_parse_ms: pick(&base.timeouts, &overlay.timeouts, |t| t.pdf_parse_ms),
        }),
        quality: Some(QualityConfig {
            min_content_chars: pick(&base.quality, &overlay.quality, |q| q.min_content_chars),
            redirect_markers: pick(&base.quality, &overlay.quality, |q| {
                q.redirect_markers.clone()
            }),
        }),
        segmentation: Some(SegmentationFileConfig {
            min_marker_gap: pick(&base.segmentation, &overlay.segmentation, |s| {
                s.min_marker_gap
            }),
            min_body_chars: pick(&base.segmentation, &overlay.segmentation, |s| {
                s.min_body_chars
            }),
            pdf_min_body_chars: pick(&base.segmentation, &overlay.segmentation, |s| {
                s.pdf_min_body_chars
            }),
            extra_strategies: pick(&base.segmentation, &overlay.segmentation, |s| {
                s.extra_strategies.clone()
            }),
        }),
        http: Some(HttpConfig {
            user_agent: pick(&base.http, &overlay.http, |h| h.user_agent.clone()),
            max_redirects: pick(&base.http, &overlay.http, |h| h.max_redirects),
        }),
    }
}

impl ConfigFile {
    /// Overwrite the fields of `config` that this file sets.
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(t) = &self.timeouts {
            if let Some(v) = t.html_ms {
                config.html_timeout_ms = v;
            }
            if let Some(v) = t.pdf_ms {
                config.pdf_timeout_ms = v;
            }
            if let Some(v) = t.pdf_parse_ms {
                config.pdf_parse_timeout_ms = v;
            }
        }
        if let Some(q) = &self.quality {
            if let Some(v) = q.min_content_chars {
                config.min_content_chars = v;
            }
            if let Some(v) = &q.redirect_markers {
                config.redirect_markers = v.clone();
            }
        }
        if let Some(h) = &self.http {
            if let Some(v) = &h.user_agent {
                config.user_agent = v.clone();
            }
            if let Some(v) = h.max_redirects {
                config.max_redirects = v;
            }
        }
    }
}
