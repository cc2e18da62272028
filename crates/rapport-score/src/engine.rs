//! The scoring-engine seam.
//!
//! The reputation algorithm itself lives outside this crate. Anything that
//! turns a sequence of [`EngineNode`]s into per-entity scores can implement
//! [`ScoringEngine`]; the contract only promises that the same input multiset
//! yields the same output.
//!
//! [`CommandEngine`] drives an external program over stdio:
//!
//! ```text
//! stdin   [{"rater_id":1,"target_id":7,"depth":2,"score":9}, ...]
//! stdout  {"7": 0.8125, "1": 0.4}
//! ```

use std::collections::HashMap;
use std::io::Write;
use std::process::{Command, Stdio};

use tracing::{debug, instrument};

use crate::translate::{EngineKey, EngineNode};

/// Errors from invoking a scoring engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to spawn engine `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("engine i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode engine input: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("engine exited with {status}: {stderr}")]
    Exit { status: String, stderr: String },

    #[error("engine output is not a score map: {0}")]
    Decode(#[source] serde_json::Error),
}

/// A scoring engine.
pub trait ScoringEngine {
    /// Key type of the engine's result map.
    type Key: EngineKey;

    /// Score the neighborhood described by `nodes`.
    ///
    /// # Errors
    ///
    /// Returns an [`EngineError`] if the engine cannot produce a result.
    fn score(&self, nodes: &[EngineNode]) -> Result<HashMap<Self::Key, f64>, EngineError>;
}

impl<E: ScoringEngine + ?Sized> ScoringEngine for &E {
    type Key = E::Key;

    fn score(&self, nodes: &[EngineNode]) -> Result<HashMap<Self::Key, f64>, EngineError> {
        (**self).score(nodes)
    }
}

/// Runs an external program as the scoring engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandEngine {
    program: String,
    args: Vec<String>,
}

impl CommandEngine {
    pub fn new(program: impl Into<String>, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Build from a `[program, args...]` vector, as stored in config.
    ///
    /// Returns `None` for an empty vector.
    #[must_use]
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self::new(program.clone(), args.iter().cloned()))
    }

    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }
}

impl ScoringEngine for CommandEngine {
    type Key = String;

    #[instrument(skip_all, fields(program = %self.program, nodes = nodes.len()))]
    fn score(&self, nodes: &[EngineNode]) -> Result<HashMap<String, f64>, EngineError> {
        let input = serde_json::to_vec(nodes).map_err(EngineError::Encode)?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| EngineError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        // stdin is fed from its own thread: the child may fill stdout before
        // it has read all of its input.
        let stdin = child.stdin.take();
        let (output, written) = std::thread::scope(|scope| {
            let writer = scope.spawn(move || -> std::io::Result<()> {
                if let Some(mut stdin) = stdin {
                    stdin.write_all(&input)?;
                }
                Ok(())
            });
            let output = child.wait_with_output();
            let written = writer
                .join()
                .unwrap_or_else(|_| Err(std::io::Error::other("stdin writer panicked")));
            (output, written)
        });
        let output = output?;

        if !output.status.success() {
            return Err(EngineError::Exit {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        // A successful child may exit without draining stdin.
        if let Err(err) = written
            && err.kind() != std::io::ErrorKind::BrokenPipe
        {
            return Err(EngineError::Io(err));
        }

        let scores: HashMap<String, f64> =
            serde_json::from_slice(&output.stdout).map_err(EngineError::Decode)?;
        debug!(scores = scores.len(), "engine returned");
        Ok(scores)
    }
}
