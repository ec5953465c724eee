//! Scripted runner, child and fetcher used by the unit tests

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use ct_core::traits::{ChildProcess, CommandRunner, Fetcher};
use ct_core::{CommandOutcome, CommandSpec, SetupConfig, SetupError, Settings};

type Rule = Box<dyn Fn(&CommandSpec) -> Option<Result<CommandOutcome, SetupError>> + Send + Sync>;

/// Runner that records every command and answers from rules
///
/// Rules are tried in insertion order; the first that returns `Some` wins.
/// Commands no rule matches succeed with exit code 0.
#[derive(Default)]
pub struct FakeRunner {
    rules: Mutex<Vec<Rule>>,
    calls: Mutex<Vec<CommandSpec>>,
    spawned: Mutex<Vec<(CommandSpec, Arc<ChildState>)>>,
    stalled: Mutex<Vec<String>>,
    agent_exit: Mutex<Option<i32>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail commands whose rendered form starts with `prefix`
    pub fn fail(self, prefix: &str, code: i32, stderr: &str) -> Self {
        let prefix = prefix.to_string();
        let stderr = stderr.to_string();
        self.rule(move |spec| {
            spec.to_string().starts_with(&prefix).then(|| {
                Ok(CommandOutcome {
                    code: Some(code),
                    stdout: String::new(),
                    stderr: stderr.clone(),
                })
            })
        })
    }

    /// Make commands whose rendered form starts with `prefix` unstartable
    pub fn missing(self, prefix: &str) -> Self {
        let prefix = prefix.to_string();
        self.rule(move |spec| {
            spec.to_string().starts_with(&prefix).then(|| {
                Err(SetupError::Spawn {
                    program: spec.program.clone(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
                })
            })
        })
    }

    /// Answer commands starting with `prefix` with the given stdout
    pub fn stdout(self, prefix: &str, stdout: &str) -> Self {
        let prefix = prefix.to_string();
        let stdout = stdout.to_string();
        self.rule(move |spec| {
            spec.to_string().starts_with(&prefix).then(|| {
                Ok(CommandOutcome {
                    code: Some(0),
                    stdout: stdout.clone(),
                    stderr: String::new(),
                })
            })
        })
    }

    /// Commands starting with `prefix` never complete
    pub fn stall(self, prefix: &str) -> Self {
        self.stalled.lock().unwrap().push(prefix.to_string());
        self
    }

    /// Spawned processes whose program ends in `cloudflared` exit on their own
    pub fn agent_exits_with(self, code: i32) -> Self {
        *self.agent_exit.lock().unwrap() = Some(code);
        self
    }

    fn rule<F>(self, rule: F) -> Self
    where
        F: Fn(&CommandSpec) -> Option<Result<CommandOutcome, SetupError>> + Send + Sync + 'static,
    {
        self.rules.lock().unwrap().push(Box::new(rule));
        self
    }

    /// Rendered command lines run to completion, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    pub fn call_specs(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }

    /// Processes spawned so far
    pub fn spawned(&self) -> Vec<(CommandSpec, Arc<ChildState>)> {
        self.spawned.lock().unwrap().clone()
    }

    pub fn ran(&self, prefix: &str) -> bool {
        self.calls().iter().any(|c| c.starts_with(prefix))
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutcome, SetupError> {
        self.calls.lock().unwrap().push(spec.clone());
        let rendered = spec.to_string();
        let stalled = self
            .stalled
            .lock()
            .unwrap()
            .iter()
            .any(|prefix| rendered.starts_with(prefix.as_str()));
        if stalled {
            std::future::pending::<()>().await;
        }

        let rules = self.rules.lock().unwrap();
        for rule in rules.iter() {
            if let Some(result) = rule(spec) {
                return result;
            }
        }
        Ok(CommandOutcome::exited(0))
    }

    async fn spawn(&self, spec: &CommandSpec) -> Result<Box<dyn ChildProcess>, SetupError> {
        let exit = if spec.program.ends_with("cloudflared") {
            *self.agent_exit.lock().unwrap()
        } else {
            None
        };
        let state = Arc::new(ChildState {
            terminated: AtomicBool::new(false),
            exit,
            notify: Notify::new(),
        });
        self.spawned
            .lock()
            .unwrap()
            .push((spec.clone(), Arc::clone(&state)));
        Ok(Box::new(FakeChild { state }))
    }
}

/// Shared view of a fake child
#[derive(Debug)]
pub struct ChildState {
    terminated: AtomicBool,
    exit: Option<i32>,
    notify: Notify,
}

impl ChildState {
    pub fn was_terminated(&self) -> bool {
        self.terminated.load(Ordering::SeqCst)
    }
}

struct FakeChild {
    state: Arc<ChildState>,
}

#[async_trait]
impl ChildProcess for FakeChild {
    fn id(&self) -> Option<u32> {
        Some(4242)
    }

    fn terminate(&mut self) {
        self.state.terminated.store(true, Ordering::SeqCst);
        self.state.notify.notify_one();
    }

    async fn wait(&mut self) -> Result<Option<i32>, SetupError> {
        if let Some(code) = self.state.exit {
            return Ok(Some(code));
        }
        while !self.state.was_terminated() {
            self.state.notify.notified().await;
        }
        Ok(None)
    }
}

/// Fetcher serving canned bodies by URL
#[derive(Default)]
pub struct FakeFetcher {
    bodies: HashMap<String, Vec<u8>>,
    requests: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: &str, body: Vec<u8>) -> Self {
        self.bodies.insert(url.to_string(), body);
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for FakeFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, SetupError> {
        self.requests.lock().unwrap().push(url.to_string());
        self.bodies
            .get(url)
            .cloned()
            .ok_or_else(|| SetupError::AgentInstall(format!("no fixture for {}", url)))
    }
}

/// Settings rooted in a scratch directory
pub fn settings_in(dir: &Path) -> Settings {
    let mut config = SetupConfig::default();
    config.agent.install_dir = dir.join("bin");
    Settings::resolve(config, dir.to_path_buf())
}

/// Create the login credential file under `dir`
pub fn write_credentials(settings: &Settings) {
    std::fs::create_dir_all(settings.credentials_dir()).unwrap();
    std::fs::write(settings.credential_file(), "cert").unwrap();
}
