use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};
use std::sync::{Arc, OnceLock};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

const QUEUE_CAPACITY: usize = 128;
const MAX_LOG_BYTES: u64 = 2 * 1024 * 1024;

pub struct Telemetry {
    app_name: String,
    app_version: String,
    session_id: String,
    usage_enabled: AtomicBool,
    crash_enabled: AtomicBool,
    sender: SyncSender<UsageEvent>,
}

#[derive(Serialize)]
struct UsageEvent {
    kind: String,
    at_unix_millis: i64,
    app: String,
    version: String,
    session_id: String,
    properties: BTreeMap<String, String>,
}

#[derive(Serialize)]
struct CrashReport {
    at_unix_millis: i64,
    app: String,
    version: String,
    session_id: String,
    message: String,
    location: Option<String>,
    backtrace: Option<String>,
}

static TELEMETRY: OnceLock<Arc<Telemetry>> = OnceLock::new();

/// Reads `JDKWATCH_TELEMETRY` / `JDKWATCH_TELEMETRY_CRASH` and installs the
/// global instance. Safe to call more than once; later calls only refresh
/// the enable flags.
pub fn init_with_env(app_name: &'static str, app_version: &'static str) -> Arc<Telemetry> {
    let usage_enabled = env_flag("JDKWATCH_TELEMETRY");
    let crash_enabled = env_flag("JDKWATCH_TELEMETRY_CRASH");

    if let Some(existing) = TELEMETRY.get() {
        existing.usage_enabled.store(usage_enabled, Ordering::Relaxed);
        existing.crash_enabled.store(crash_enabled, Ordering::Relaxed);
        return Arc::clone(existing);
    }

    let (sender, receiver) = sync_channel(QUEUE_CAPACITY);
    let telemetry = Arc::new(Telemetry {
        app_name: app_name.to_string(),
        app_version: app_version.to_string(),
        session_id: new_session_id(),
        usage_enabled: AtomicBool::new(usage_enabled),
        crash_enabled: AtomicBool::new(crash_enabled),
        sender,
    });

    start_writer_thread(Arc::clone(&telemetry), receiver);
    install_panic_hook(Arc::clone(&telemetry));

    let _ = TELEMETRY.set(Arc::clone(&telemetry));
    telemetry
}

pub fn event(kind: &str, properties: &[(&str, &str)]) {
    if let Some(telemetry) = TELEMETRY.get() {
        telemetry.event(kind, properties);
    }
}

impl Telemetry {
    fn event(&self, kind: &str, properties: &[(&str, &str)]) {
        if !self.usage_enabled.load(Ordering::Relaxed) {
            return;
        }
        let mut map = BTreeMap::new();
        for (key, value) in properties {
            if !key.trim().is_empty() {
                map.insert((*key).to_string(), (*value).to_string());
            }
        }
        let event = UsageEvent {
            kind: kind.to_string(),
            at_unix_millis: now_millis(),
            app: self.app_name.clone(),
            version: self.app_version.clone(),
            session_id: self.session_id.clone(),
            properties: map,
        };
        // Dropping on a full queue is preferable to stalling the caller.
        let _ = self.sender.try_send(event);
    }

    fn crash_report(&self, message: String, location: Option<String>, backtrace: Option<String>) {
        if !self.crash_enabled.load(Ordering::Relaxed) {
            return;
        }
        let report = CrashReport {
            at_unix_millis: now_millis(),
            app: self.app_name.clone(),
            version: self.app_version.clone(),
            session_id: self.session_id.clone(),
            message,
            location,
            backtrace,
        };
        write_crash_report(&self.app_name, &report);
    }
}

fn start_writer_thread(telemetry: Arc<Telemetry>, receiver: Receiver<UsageEvent>) {
    std::thread::spawn(move || {
        while let Ok(event) = receiver.recv() {
            write_event(&telemetry.app_name, &event);
        }
    });
}

fn install_panic_hook(telemetry: Arc<Telemetry>) {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let message = if let Some(msg) = info.payload().downcast_ref::<&str>() {
            (*msg).to_string()
        } else if let Some(msg) = info.payload().downcast_ref::<String>() {
            msg.clone()
        } else {
            "panic".to_string()
        };
        let location = info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()));
        let backtrace = Some(format!("{:?}", std::backtrace::Backtrace::capture()));
        telemetry.crash_report(message, location, backtrace);
        default_hook(info);
    }));
}

fn write_event(app_name: &str, event: &UsageEvent) {
    let dir = data_dir().join("telemetry").join(app_name);
    if let Err(err) = fs::create_dir_all(&dir) {
        eprintln!("telemetry: failed to create {}: {err}", dir.display());
        return;
    }

    let path = dir.join("events.jsonl");
    if rotate_if_needed(&path).is_err() {
        return;
    }

    let mut file = match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(file) => file,
        Err(err) => {
            eprintln!("telemetry: failed to open {}: {err}", path.display());
            return;
        }
    };
    if let Ok(line) = serde_json::to_string(event) {
        let _ = writeln!(file, "{line}");
    }
}

fn rotate_if_needed(path: &Path) -> std::io::Result<()> {
    if let Ok(meta) = fs::metadata(path) {
        if meta.len() >= MAX_LOG_BYTES {
            let rotated = path.with_extension("jsonl.1");
            let _ = fs::remove_file(&rotated);
            fs::rename(path, rotated)?;
        }
    }
    Ok(())
}

fn write_crash_report(app_name: &str, report: &CrashReport) {
    let dir = data_dir().join("telemetry").join(app_name).join("crashes");
    if fs::create_dir_all(&dir).is_err() {
        return;
    }
    let filename = format!(
        "crash-{}-{}.json",
        report.at_unix_millis,
        std::process::id()
    );
    if let Ok(file) = OpenOptions::new()
        .create(true)
        .write(true)
        .open(dir.join(filename))
    {
        let _ = serde_json::to_writer_pretty(file, report);
    }
}

// Duplicated from jdkwatch-util to keep this crate dependency-free at the
// bottom of the workspace.
fn data_dir() -> PathBuf {
    if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".local/share/jdkwatch")
    } else {
        PathBuf::from("/tmp/jdkwatch")
    }
}

fn env_flag(name: &str) -> bool {
    match std::env::var(name) {
        Ok(value) => matches!(
            value.to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
        Err(_) => false,
    }
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

fn new_session_id() -> String {
    format!("{:x}-{:x}", now_millis(), std::process::id())
}
