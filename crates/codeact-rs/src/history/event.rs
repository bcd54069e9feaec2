//! Event types: what the user or agent did, and what the environment said back.
//!
//! Actions and observations are closed sum types. The renderer and the
//! decoder both `match` on them exhaustively, so adding a variant fails to
//! compile until every consumer handles it.

use serde::{Deserialize, Serialize};

/// Who produced an event.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    User,
    #[default]
    Agent,
}

/// Something the user or the agent asked for.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// Run a shell command in the sandbox.
    RunCommand {
        command: String,
        #[serde(default)]
        thought: String,
    },
    /// Run a cell in the sandbox's IPython kernel.
    RunIpython {
        code: String,
        #[serde(default)]
        thought: String,
        /// Snippet the kernel runs before the first cell.
        #[serde(default)]
        kernel_init_code: String,
    },
    /// Drive the sandbox browser with one or more browser commands.
    BrowseInteractive {
        browser_actions: String,
        #[serde(default)]
        thought: String,
    },
    /// Plain conversational message.
    Message {
        content: String,
        #[serde(default)]
        wait_for_response: bool,
    },
    /// Condensed stand-in for a span of earlier events.
    Summarize { summary: String },
    /// End the task.
    Finish {
        #[serde(default)]
        thought: String,
    },
}

impl Action {
    pub fn run_command(command: impl Into<String>, thought: impl Into<String>) -> Self {
        Action::RunCommand {
            command: command.into(),
            thought: thought.into(),
        }
    }

    pub fn run_ipython(
        code: impl Into<String>,
        thought: impl Into<String>,
        kernel_init_code: impl Into<String>,
    ) -> Self {
        Action::RunIpython {
            code: code.into(),
            thought: thought.into(),
            kernel_init_code: kernel_init_code.into(),
        }
    }

    pub fn browse(browser_actions: impl Into<String>, thought: impl Into<String>) -> Self {
        Action::BrowseInteractive {
            browser_actions: browser_actions.into(),
            thought: thought.into(),
        }
    }

    pub fn message(content: impl Into<String>, wait_for_response: bool) -> Self {
        Action::Message {
            content: content.into(),
            wait_for_response,
        }
    }

    pub fn finish(thought: impl Into<String>) -> Self {
        Action::Finish {
            thought: thought.into(),
        }
    }

    /// Short snake_case name of the variant, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Action::RunCommand { .. } => "run_command",
            Action::RunIpython { .. } => "run_ipython",
            Action::BrowseInteractive { .. } => "browse_interactive",
            Action::Message { .. } => "message",
            Action::Summarize { .. } => "summarize",
            Action::Finish { .. } => "finish",
        }
    }

    pub fn is_finish(&self) -> bool {
        matches!(self, Action::Finish { .. })
    }
}

/// Result the environment reported for an earlier action.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Observation {
    CommandOutput {
        content: String,
        command_id: i64,
        exit_code: i32,
    },
    IpythonOutput {
        content: String,
    },
    BrowserOutput {
        content: String,
    },
    Summary {
        content: String,
    },
}

impl Observation {
    pub fn content(&self) -> &str {
        match self {
            Observation::CommandOutput { content, .. }
            | Observation::IpythonOutput { content }
            | Observation::BrowserOutput { content }
            | Observation::Summary { content } => content,
        }
    }
}

/// One immutable entry in a task's history.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
    Action {
        #[serde(default)]
        source: Source,
        action: Action,
    },
    Observation {
        #[serde(default)]
        source: Source,
        observation: Observation,
    },
}

impl Event {
    pub fn action(source: Source, action: Action) -> Self {
        Event::Action { source, action }
    }

    /// Observations always come back through the agent's sandbox.
    pub fn observation(observation: Observation) -> Self {
        Event::Observation {
            source: Source::Agent,
            observation,
        }
    }

    pub fn source(&self) -> Source {
        match self {
            Event::Action { source, .. } | Event::Observation { source, .. } => *source,
        }
    }
}
