//! Start/stop lifecycle and the public logging entry points

use chrono::Local;
use oxidelog_core::{EngineConfig, Error, Level, RequestMeta, Result, ACCESS_LOG_NAME, APP_LOG_NAME};
use parking_lot::{Mutex, RwLock};
use std::fmt::Display;
use std::panic::Location;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use crate::dispatcher::Dispatcher;
use crate::format;
use crate::purge::PurgeScheduler;
use crate::stream::Stream;

/// Everything that exists only while the engine is running
struct RunState {
    config: Arc<EngineConfig>,
    app_stream: Arc<Stream>,
    app: Dispatcher,
    access: Dispatcher,
    purgers: Vec<PurgeScheduler>,
}

/// Asynchronous log engine writing `application.log` and `access.log`.
///
/// The configuration is fixed at construction and can only be replaced while
/// the engine is stopped. Logging calls format on the caller's thread and
/// hand the line to a worker pool; they never touch the disk themselves and
/// never report write failures.
///
/// With more than one worker per stream (the default is 5), lines may land
/// in the file out of submission order. Configure a single worker when
/// strict ordering matters.
///
/// A message submitted while `stop` is in progress may be dropped.
pub struct Engine {
    running: AtomicBool,
    /// Start/stop lock; also holds the configuration used by the next start
    lifecycle: Mutex<EngineConfig>,
    state: RwLock<Option<RunState>>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            running: AtomicBool::new(false),
            lifecycle: Mutex::new(config),
            state: RwLock::new(None),
        }
    }

    /// Open both streams and launch the workers and purge loops.
    ///
    /// A no-op when already running. On error the engine stays stopped.
    pub fn start(&self) -> Result<()> {
        let next = self.lifecycle.lock();
        if self.running.load(Ordering::Acquire) {
            return Ok(());
        }

        next.validate()?;
        let config = Arc::new(next.clone());

        let app_stream = Arc::new(Stream::open(
            &config.app.folder,
            APP_LOG_NAME,
            config.app.max_size_bytes(),
            config.mirror_to_stdout,
        )?);
        let access_stream = Arc::new(Stream::open(
            &config.access.folder,
            ACCESS_LOG_NAME,
            config.access.max_size_bytes(),
            config.mirror_to_stdout,
        )?);

        let app = Dispatcher::spawn(
            "app",
            Arc::clone(&app_stream),
            config.workers,
            config.app_channel_capacity,
        )?;
        let access = match Dispatcher::spawn(
            "access",
            access_stream,
            config.workers,
            config.access_channel_capacity,
        ) {
            Ok(access) => access,
            Err(e) => {
                app.shutdown();
                return Err(e);
            }
        };

        let mut purgers = Vec::with_capacity(2);
        for (stream, base_name) in [(&config.app, APP_LOG_NAME), (&config.access, ACCESS_LOG_NAME)] {
            match PurgeScheduler::spawn(&stream.folder, base_name, stream.max_age_days, config.purge_interval()) {
                Ok(Some(purger)) => purgers.push(purger),
                Ok(None) => {}
                Err(e) => error!("Unable to start purge routine for {}: {}", base_name, e),
            }
        }

        *self.state.write() = Some(RunState {
            config: Arc::clone(&config),
            app_stream,
            app,
            access,
            purgers,
        });
        self.running.store(true, Ordering::Release);

        info!(
            "Log engine started (app: {}, access: {}, {} workers per stream)",
            config.app.folder.display(),
            config.access.folder.display(),
            config.workers
        );
        Ok(())
    }

    /// Stop accepting messages, drain what is queued, and wait for every
    /// worker to exit. A no-op when already stopped.
    pub fn stop(&self) {
        let _lifecycle = self.lifecycle.lock();
        self.running.store(false, Ordering::Release);

        // Producers blocked on a full channel finish their send before this
        // lock is granted, so their lines are drained below.
        let Some(state) = self.state.write().take() else {
            return;
        };

        state.app.shutdown();
        state.access.shutdown();
        for purger in state.purgers {
            purger.stop();
        }

        info!("Log engine stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Copy of the configuration the next start will use
    pub fn config(&self) -> EngineConfig {
        self.lifecycle.lock().clone()
    }

    /// Replace the configuration. Only allowed while stopped.
    pub fn reconfigure(&self, config: EngineConfig) -> Result<()> {
        let mut current = self.lifecycle.lock();
        if self.running.load(Ordering::Acquire) {
            return Err(Error::AlreadyRunning);
        }
        config.validate()?;
        *current = config;
        Ok(())
    }

    #[track_caller]
    pub fn debug(&self, message: impl Display) {
        self.submit_app(Level::Debug, message, Location::caller());
    }

    #[track_caller]
    pub fn info(&self, message: impl Display) {
        self.submit_app(Level::Info, message, Location::caller());
    }

    #[track_caller]
    pub fn warn(&self, message: impl Display) {
        self.submit_app(Level::Warn, message, Location::caller());
    }

    #[track_caller]
    pub fn error(&self, message: impl Display) {
        self.submit_app(Level::Error, message, Location::caller());
    }

    /// Queue a message at `level`. `Level::Fatal` is queued like any other
    /// level here; use [`Engine::fatal`] to write synchronously and exit.
    #[track_caller]
    pub fn log(&self, level: Level, message: impl Display) {
        self.submit_app(level, message, Location::caller());
    }

    /// Write the message synchronously on the calling thread, then exit the
    /// process with status 1.
    ///
    /// Lines still queued for the workers are not flushed. When the engine is
    /// not running the line goes to stderr instead, and the process still
    /// exits: calling `fatal` on a stopped engine is never a no-op.
    #[track_caller]
    pub fn fatal(&self, message: impl Display) -> ! {
        if let Err(e) = self.write_fatal(message, Location::caller()) {
            eprintln!("Unable to write fatal message: {}", e);
        }
        std::process::exit(1)
    }

    /// Queue an access record. Blocks until a worker takes it when the
    /// access channel has no capacity.
    pub fn log_access(&self, request: &RequestMeta, status: u16, content_length: u64, duration: Duration) {
        if !self.running.load(Ordering::Acquire) {
            return;
        }
        let state = self.state.read();
        if let Some(state) = state.as_ref() {
            let line = format::access_line(&Local::now(), request, status, content_length, duration);
            state.access.submit(line);
        }
    }

    fn submit_app(&self, level: Level, message: impl Display, location: &'static Location<'static>) {
        if !self.running.load(Ordering::Acquire) {
            return;
        }
        let state = self.state.read();
        let Some(state) = state.as_ref() else {
            return;
        };

        let location = state.config.caller_location.then_some(location);
        if let Some(line) = format::app_line(state.config.min_level, level, &Local::now(), message, location) {
            state.app.submit(line);
        }
    }

    fn write_fatal(&self, message: impl Display, location: &'static Location<'static>) -> Result<()> {
        let state = self.state.read();
        match state.as_ref() {
            Some(state) => {
                let location = state.config.caller_location.then_some(location);
                match format::app_line(state.config.min_level, Level::Fatal, &Local::now(), message, location) {
                    Some(line) => state.app_stream.write(&line),
                    None => Ok(()),
                }
            }
            None => {
                let line = format::app_line(Level::Debug, Level::Fatal, &Local::now(), message, Some(location));
                eprint!("{}", line.unwrap_or_default());
                Ok(())
            }
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn quiet_config(dir: &Path) -> EngineConfig {
        EngineConfig::new()
            .with_log_folder(dir)
            .with_mirror_to_stdout(false)
            .with_caller_location(false)
    }

    #[test]
    fn test_start_stop_cycle() {
        let dir = TempDir::new().unwrap();
        let engine = Engine::new(quiet_config(dir.path()));

        assert!(!engine.is_running());
        engine.start().unwrap();
        assert!(engine.is_running());
        assert!(dir.path().join("application.log").exists());
        assert!(dir.path().join("access.log").exists());

        engine.stop();
        assert!(!engine.is_running());
    }

    #[test]
    fn test_start_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let engine = Engine::new(quiet_config(dir.path()));

        engine.start().unwrap();
        engine.start().unwrap();
        engine.info("once");
        engine.stop();

        let content = fs::read_to_string(dir.path().join("application.log")).unwrap();
        assert_eq!(content.matches("once").count(), 1);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let engine = Engine::new(quiet_config(dir.path()));

        engine.stop();
        engine.start().unwrap();
        engine.stop();
        engine.stop();
        assert!(!engine.is_running());
    }

    #[test]
    fn test_concurrent_stop_drains_once() {
        let dir = TempDir::new().unwrap();
        let engine = Arc::new(Engine::new(quiet_config(dir.path())));
        engine.start().unwrap();

        for i in 0..200 {
            engine.info(format!("queued-{}", i));
        }

        let barrier = Arc::new(std::sync::Barrier::new(2));
        let stoppers: Vec<_> = (0..2)
            .map(|_| {
                let engine = Arc::clone(&engine);
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    engine.stop();
                })
            })
            .collect();
        for stopper in stoppers {
            stopper.join().unwrap();
        }

        assert!(!engine.is_running());
        let content = fs::read_to_string(dir.path().join("application.log")).unwrap();
        assert_eq!(content.lines().count(), 200);
        for i in 0..200 {
            assert!(content.contains(&format!("queued-{}\n", i)));
        }

        // Still usable after the racing stops
        engine.start().unwrap();
        engine.stop();
    }

    #[test]
    fn test_start_failure_leaves_engine_stopped() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "x").unwrap();

        let engine = Engine::new(quiet_config(dir.path()).with_app_log_folder(&blocker));
        let result = engine.start();

        assert!(matches!(result, Err(Error::StartupIo { .. })));
        assert!(!engine.is_running());
        engine.info("dropped");
    }

    #[test]
    fn test_submit_while_stopped_is_dropped() {
        let dir = TempDir::new().unwrap();
        let engine = Engine::new(quiet_config(dir.path()));

        engine.info("before start");
        engine.start().unwrap();
        engine.stop();
        engine.error("after stop");
        engine.log_access(&RequestMeta::new("GET", "/", "HTTP/1.1", "127.0.0.1"), 200, 0, Duration::ZERO);

        let content = fs::read_to_string(dir.path().join("application.log")).unwrap();
        assert!(content.is_empty());
        let access = fs::read_to_string(dir.path().join("access.log")).unwrap();
        assert!(access.is_empty());
    }

    #[test]
    fn test_reconfigure_only_while_stopped() {
        let dir = TempDir::new().unwrap();
        let engine = Engine::new(quiet_config(dir.path()));

        engine.start().unwrap();
        let result = engine.reconfigure(quiet_config(dir.path()).with_min_level(Level::Error));
        assert!(matches!(result, Err(Error::AlreadyRunning)));
        engine.stop();

        engine
            .reconfigure(quiet_config(dir.path()).with_min_level(Level::Error))
            .unwrap();
        assert_eq!(engine.config().min_level, Level::Error);
    }

    #[test]
    fn test_caller_location_annotation() {
        let dir = TempDir::new().unwrap();
        let engine = Engine::new(quiet_config(dir.path()).with_caller_location(true));

        engine.start().unwrap();
        let line = line!() + 1;
        engine.warn("located");
        engine.stop();

        let content = fs::read_to_string(dir.path().join("application.log")).unwrap();
        assert!(content.contains(&format!("WARN located at {}:{}\n", file!(), line)));
    }

    #[test]
    fn test_write_fatal_is_synchronous() {
        let dir = TempDir::new().unwrap();
        let engine = Engine::new(quiet_config(dir.path()).with_min_level(Level::Error));

        engine.start().unwrap();
        engine.write_fatal("boom", Location::caller()).unwrap();

        // Visible before stop: no worker involved
        let content = fs::read_to_string(dir.path().join("application.log")).unwrap();
        assert!(content.contains("FATAL boom"));
        engine.stop();
    }

    #[test]
    fn test_write_fatal_while_stopped_skips_file() {
        let dir = TempDir::new().unwrap();
        let engine = Engine::new(quiet_config(dir.path()));

        engine.start().unwrap();
        engine.stop();
        // Goes to stderr; the caller still exits afterwards
        engine.write_fatal("late", Location::caller()).unwrap();

        let content = fs::read_to_string(dir.path().join("application.log")).unwrap();
        assert!(!content.contains("late"));
    }

    #[test]
    fn test_restart_after_stop() {
        let dir = TempDir::new().unwrap();
        let engine = Engine::new(quiet_config(dir.path()));

        engine.start().unwrap();
        engine.info("first run");
        engine.stop();
        engine.start().unwrap();
        engine.info("second run");
        engine.stop();

        let content = fs::read_to_string(dir.path().join("application.log")).unwrap();
        assert!(content.contains("first run"));
        assert!(content.contains("second run"));
    }
}
