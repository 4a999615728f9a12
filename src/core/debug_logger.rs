use std::collections::HashMap;
use std::env;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Local;
use flate2::{write::GzEncoder, Compression};
use fs2::FileExt;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

// Default rotation policy
const LOG_ROTATION_SIZE_MB: u64 = 8;
const MAX_ARCHIVES: u32 = 5;
const ROTATION_CHECK_INTERVAL: u32 = 200;

pub const DEBUG_ENV_VAR: &str = "OCSTATUS_DEBUG";
pub const LOG_PATH_ENV_VAR: &str = "OCSTATUS_LOG_PATH";

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LogEntry {
    pub timestamp: String,              // ISO-8601 with timezone
    pub level: String,                  // DEBUG, ERROR, NETWORK, SECURITY
    pub component: String,
    pub event: String,
    pub message: String,                // Redacted
    pub correlation_id: Option<String>, // Tracks one discovery sequence
    pub fields: HashMap<String, Value>,
}

/// When the active log file is archived and how many archives are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationPolicy {
    pub max_bytes: u64,
    pub max_archives: u32,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            max_bytes: LOG_ROTATION_SIZE_MB * 1024 * 1024,
            max_archives: MAX_ARCHIVES,
        }
    }
}

struct RotatingLogger {
    log_path: PathBuf,
    policy: RotationPolicy,
    write_count: AtomicU32,
}

impl RotatingLogger {
    fn new(log_path: PathBuf, policy: RotationPolicy) -> Self {
        if let Some(parent) = log_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        Self {
            log_path,
            policy,
            write_count: AtomicU32::new(0),
        }
    }

    fn write_with_rotation(&self, json_line: &str) -> Result<(), std::io::Error> {
        if self.write_count.fetch_add(1, Ordering::Relaxed) % ROTATION_CHECK_INTERVAL == 0 {
            let _ = self.rotate_if_needed(); // Rotation errors never stop logging
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;

        writeln!(file, "{}", json_line)?;
        Ok(())
    }

    fn rotate_if_needed(&self) -> Result<(), std::io::Error> {
        if !self.needs_rotation()? {
            return Ok(());
        }

        // Advisory lock: only one process rotates at a time
        let lock_path = self.log_path.with_extension("lock");
        let lock_file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)?;

        if lock_file.try_lock_exclusive().is_ok() {
            if self.needs_rotation()? {
                self.perform_rotation()?;
            }
            let _ = std::fs::remove_file(&lock_path);
        }
        Ok(())
    }

    fn needs_rotation(&self) -> Result<bool, std::io::Error> {
        if !self.log_path.exists() {
            return Ok(false);
        }

        let metadata = std::fs::metadata(&self.log_path)?;
        Ok(metadata.len() >= self.policy.max_bytes)
    }

    fn base_name(&self) -> String {
        self.log_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_else(|| "ocstatus-debug".to_string())
    }

    fn log_dir(&self) -> &Path {
        self.log_path.parent().unwrap_or_else(|| Path::new("."))
    }

    fn perform_rotation(&self) -> Result<(), std::io::Error> {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let archive_path = self
            .log_dir()
            .join(format!("{}.{}.gz", self.base_name(), timestamp));

        let temp_path = self.log_path.with_extension("rotating");
        std::fs::rename(&self.log_path, &temp_path)?;

        let source_file = File::open(&temp_path)?;
        let target_file = File::create(&archive_path)?;
        let mut encoder = GzEncoder::new(target_file, Compression::default());
        std::io::copy(&mut BufReader::new(source_file), &mut encoder)?;
        encoder.finish()?;

        std::fs::remove_file(&temp_path)?;

        let _ = self.cleanup_old_archives();
        Ok(())
    }

    fn cleanup_old_archives(&self) -> Result<(), std::io::Error> {
        let prefix = format!("{}.", self.base_name());

        let mut archives = Vec::new();
        for entry in std::fs::read_dir(self.log_dir())? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_string();

            if name.starts_with(&prefix) && name.ends_with(".gz") {
                archives.push((entry.path(), entry.metadata()?.modified()?));
            }
        }

        // Keep only the most recent archives
        let keep = self.policy.max_archives as usize;
        archives.sort_by_key(|(_, modified)| *modified);
        if archives.len() > keep {
            let to_remove = archives.len() - keep;
            for (path, _) in archives.iter().take(to_remove) {
                let _ = std::fs::remove_file(path);
            }
        }

        Ok(())
    }
}

/// JSON Lines debug logger, enabled through `OCSTATUS_DEBUG`
pub struct DebugLogger {
    enabled: bool,
    rotating_logger: Option<Arc<Mutex<RotatingLogger>>>,
    session_id: String,
    redaction_patterns: Vec<Regex>,
}

impl DebugLogger {
    pub fn new() -> Self {
        let enabled = Self::parse_debug_enabled();
        Self::build(enabled, Self::get_log_path(), RotationPolicy::default())
    }

    /// Logger writing to an explicit path regardless of the environment
    pub fn with_path(log_path: PathBuf, enabled: bool) -> Self {
        Self::build(enabled, log_path, RotationPolicy::default())
    }

    /// Enabled logger at an explicit path with its own rotation policy
    pub fn with_rotation(log_path: PathBuf, policy: RotationPolicy) -> Self {
        Self::build(true, log_path, policy)
    }

    /// Logger that never writes
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            rotating_logger: None,
            session_id: Self::new_session_id(),
            redaction_patterns: Vec::new(),
        }
    }

    fn build(enabled: bool, log_path: PathBuf, policy: RotationPolicy) -> Self {
        let rotating_logger = if enabled {
            Some(Arc::new(Mutex::new(RotatingLogger::new(log_path, policy))))
        } else {
            None
        };

        Self {
            enabled,
            rotating_logger,
            session_id: Self::new_session_id(),
            redaction_patterns: Self::compile_redaction_patterns(),
        }
    }

    fn new_session_id() -> String {
        Uuid::new_v4().to_string()[..8].to_string()
    }

    /// Supports: true/false, 1/0, yes/no, on/off (case insensitive)
    fn parse_debug_enabled() -> bool {
        env::var(DEBUG_ENV_VAR)
            .map(|v| matches!(v.trim().to_lowercase().as_str(), "true" | "1" | "yes" | "on"))
            .unwrap_or(false)
    }

    fn get_log_path() -> PathBuf {
        if let Ok(path) = env::var(LOG_PATH_ENV_VAR) {
            if !path.trim().is_empty() {
                return PathBuf::from(path);
            }
        }

        let mut log_path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        log_path.push(".ocstatus");
        log_path.push("ocstatus-debug.log");
        log_path
    }

    fn compile_redaction_patterns() -> Vec<Regex> {
        let patterns = [
            r"(?i)authorization[:\s]+[^\s\n]+",
            r"(?i)bearer[:\s]+[^\s\n]+",
            r"(?i)token[:\s=]+[^\s\n&]+",
            r"(?i)password[:\s=]+[^\s\n&]+",
            r"(?i)secret[:\s=]+[^\s\n&]+",
            r"://[^/\s@]+@", // URL userinfo
        ];

        patterns
            .iter()
            .filter_map(|pattern| Regex::new(pattern).ok())
            .collect()
    }

    fn redact_sensitive_data(&self, text: &str) -> String {
        let mut redacted = text.to_string();
        for regex in &self.redaction_patterns {
            let replacement = if regex.as_str().starts_with("://") {
                "://[REDACTED]@"
            } else {
                "[REDACTED]"
            };
            redacted = regex.replace_all(&redacted, replacement).to_string();
        }
        redacted
    }

    fn log_sync(
        &self,
        level: &str,
        component: &str,
        event: &str,
        message: &str,
        correlation_id: Option<String>,
        fields: HashMap<String, Value>,
    ) {
        if !self.enabled {
            return;
        }

        let entry = LogEntry {
            timestamp: Local::now().to_rfc3339(),
            level: level.to_string(),
            component: component.to_string(),
            event: event.to_string(),
            message: self.redact_sensitive_data(message),
            correlation_id: correlation_id.or_else(|| Some(self.session_id.clone())),
            fields,
        };

        if let Some(logger) = &self.rotating_logger {
            if let Ok(logger) = logger.lock() {
                if let Ok(json_line) = serde_json::to_string(&entry) {
                    let _ = logger.write_with_rotation(&json_line); // Never crash on logging errors
                }
            }
        }
    }

    pub fn debug_sync(&self, component: &str, event: &str, message: &str) {
        self.log_sync("DEBUG", component, event, message, None, HashMap::new());
    }

    pub fn error_sync(&self, component: &str, event: &str, message: &str) {
        self.log_sync("ERROR", component, event, message, None, HashMap::new());
    }

    // Typed discovery events

    pub fn probe_start(&self, method: &str, location: &str, timeout_ms: u64, correlation_id: &str) {
        let mut fields = HashMap::new();
        fields.insert("method".to_string(), Value::String(method.to_string()));
        fields.insert("location".to_string(), Value::String(self.redact_sensitive_data(location)));
        fields.insert("timeout_ms".to_string(), Value::Number(timeout_ms.into()));

        self.log_sync(
            "NETWORK",
            "StatusRequester",
            "probe_start",
            &format!("Probing {} location {}", method, location),
            Some(correlation_id.to_string()),
            fields,
        );
    }

    pub fn probe_end(
        &self,
        method: &str,
        http_status: Option<u16>,
        duration_ms: u64,
        correlation_id: &str,
    ) {
        let mut fields = HashMap::new();
        fields.insert("method".to_string(), Value::String(method.to_string()));
        fields.insert("duration_ms".to_string(), Value::Number(duration_ms.into()));
        if let Some(code) = http_status {
            fields.insert("http_status".to_string(), Value::Number(code.into()));
        }

        let status = http_status
            .map(|code| code.to_string())
            .unwrap_or_else(|| "no_response".to_string());
        self.log_sync(
            "NETWORK",
            "StatusRequester",
            "probe_end",
            &format!("Probe {} completed: {} ({}ms)", method, status, duration_ms),
            Some(correlation_id.to_string()),
            fields,
        );
    }

    pub fn redirect_hop(&self, from: &str, to: &str, hop: u32, correlation_id: &str) {
        let mut fields = HashMap::new();
        fields.insert("from".to_string(), Value::String(self.redact_sensitive_data(from)));
        fields.insert("to".to_string(), Value::String(self.redact_sensitive_data(to)));
        fields.insert("hop".to_string(), Value::Number(hop.into()));

        self.log_sync(
            "NETWORK",
            "StatusRequester",
            "redirect_hop",
            &format!("Redirect {} -> {}", from, to),
            Some(correlation_id.to_string()),
            fields,
        );
    }

    pub fn downgrade_detected(&self, from: &str, to: &str, correlation_id: &str) {
        let mut fields = HashMap::new();
        fields.insert("from".to_string(), Value::String(self.redact_sensitive_data(from)));
        fields.insert("to".to_string(), Value::String(self.redact_sensitive_data(to)));

        self.log_sync(
            "SECURITY",
            "StatusRequester",
            "downgrade_detected",
            &format!("Secure chain redirected to insecure location {}", to),
            Some(correlation_id.to_string()),
            fields,
        );
    }

    pub fn discovery_result(&self, label: &str, base_url: Option<&str>, correlation_id: &str) {
        let mut fields = HashMap::new();
        fields.insert("result".to_string(), Value::String(label.to_string()));
        if let Some(base_url) = base_url {
            fields.insert(
                "base_url".to_string(),
                Value::String(self.redact_sensitive_data(base_url)),
            );
        }

        self.log_sync(
            "NETWORK",
            "DiscoverySession",
            "discovery_result",
            &format!("Discovery finished: {}", label),
            Some(correlation_id.to_string()),
            fields,
        );
    }

    /// Fresh correlation id for one discovery sequence
    pub fn new_correlation_id(&self) -> String {
        format!("{}-{}", self.session_id, Self::new_session_id())
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn get_session_id(&self) -> &str {
        &self.session_id
    }
}

impl Default for DebugLogger {
    fn default() -> Self {
        Self::new()
    }
}

// Factory function
pub fn get_debug_logger() -> DebugLogger {
    DebugLogger::new()
}
