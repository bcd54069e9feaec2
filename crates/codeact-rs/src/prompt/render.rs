//! History renderer: turns the live [`History`] into the prompt message list.
//!
//! Layout of a rendered prompt:
//!
//! 1. System message (preamble, command reference, closing instructions).
//! 2. User message holding the worked example.
//! 3. One message per renderable event, in history order.
//!
//! The most recent user message then gets an iteration reminder appended,
//! unless it is the `/exit` sentinel. Rendering is a pure function of the
//! history snapshot and the iteration counters.

use super::observation::{
    DEFAULT_MAX_OBSERVATION_CHARS, redact_inline_images, truncate_observation,
};
use super::templates;
use crate::agent::config::AgentConfig;
use crate::history::{Action, Event, History, Observation, Source};
use crate::{Message, MessageRole};

/// User input that ends the task without another completion.
pub const EXIT_SENTINEL: &str = "/exit";

/// Renders histories into prompt messages.
#[derive(Debug, Clone)]
pub struct PromptRenderer {
    system_message: String,
    in_context_example: String,
    observation_max_chars: usize,
}

impl Default for PromptRenderer {
    fn default() -> Self {
        Self::new(true)
    }
}

impl PromptRenderer {
    /// Create a renderer. `enable_github` toggles the collaboration addendum
    /// in the system message.
    pub fn new(enable_github: bool) -> Self {
        Self {
            system_message: templates::system_message(enable_github),
            in_context_example: templates::in_context_example(),
            observation_max_chars: DEFAULT_MAX_OBSERVATION_CHARS,
        }
    }

    pub fn from_config(config: &AgentConfig) -> Self {
        Self::new(config.enable_github).with_observation_max_chars(config.observation_max_chars)
    }

    /// Override the per-observation character ceiling.
    pub fn with_observation_max_chars(mut self, max_chars: usize) -> Self {
        self.observation_max_chars = max_chars;
        self
    }

    pub fn system_message(&self) -> &str {
        &self.system_message
    }

    /// Render the full prompt for one turn.
    pub fn render(&self, history: &History, iteration: u32, max_iterations: u32) -> Vec<Message> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(Message::system(self.system_message.clone()));
        messages.push(Message::user(self.in_context_example.clone()));
        messages.extend(history.iter().filter_map(|event| self.event_message(event)));

        if let Some(latest) = messages
            .iter_mut()
            .rev()
            .find(|m| m.role == MessageRole::User)
        {
            if latest.content.trim() == EXIT_SENTINEL {
                return messages;
            }
            latest
                .content
                .push_str(&iteration_reminder(i64::from(max_iterations) - i64::from(iteration)));
        }

        messages
    }

    /// Render a single event, or `None` for events that never reach the prompt.
    pub fn event_message(&self, event: &Event) -> Option<Message> {
        match event {
            Event::Action { source, action } => action_message(*source, action),
            Event::Observation { observation, .. } => Some(self.observation_message(observation)),
        }
    }

    fn observation_message(&self, observation: &Observation) -> Message {
        let max = self.observation_max_chars;
        let body = match observation {
            Observation::CommandOutput {
                content,
                command_id,
                exit_code,
            } => format!(
                "{}\n[Command {command_id} finished with exit code {exit_code}]",
                truncate_observation(content, max)
            ),
            Observation::IpythonOutput { content } => {
                truncate_observation(&redact_inline_images(content), max)
            }
            Observation::BrowserOutput { content } | Observation::Summary { content } => {
                truncate_observation(content, max)
            }
        };
        Message::user(format!("OBSERVATION:\n{body}"))
    }
}

fn action_message(source: Source, action: &Action) -> Option<Message> {
    let content = match action {
        Action::RunCommand { command, thought } => {
            format!("{thought}\n<execute_bash>\n{command}\n</execute_bash>")
        }
        Action::RunIpython { code, thought, .. } => {
            format!("{thought}\n<execute_ipython>\n{code}\n</execute_ipython>")
        }
        Action::BrowseInteractive {
            browser_actions,
            thought,
        } => format!("{thought}\n<execute_browse>\n{browser_actions}\n</execute_browse>"),
        Action::Message { content, .. } => content.clone(),
        Action::Summarize { summary } => summary.clone(),
        Action::Finish { .. } => return None,
    };
    let role = match source {
        Source::User => MessageRole::User,
        Source::Agent => MessageRole::Assistant,
    };
    Some(Message { role, content })
}

/// Reminder appended to the latest user message.
///
/// `remaining` goes negative once a task runs past its budget.
pub fn iteration_reminder(remaining: i64) -> String {
    format!(
        "\n\nENVIRONMENT REMINDER: You have {remaining} turns left to complete the task."
    )
}

/// The most recent message with the `user` role.
pub fn latest_user_message(messages: &[Message]) -> Option<&Message> {
    messages.iter().rev().find(|m| m.role == MessageRole::User)
}

/// Whether the latest user message is the `/exit` sentinel.
pub fn is_exit_request(messages: &[Message]) -> bool {
    latest_user_message(messages).is_some_and(|m| m.content.trim() == EXIT_SENTINEL)
}

/// Total characters across all message bodies.
pub fn total_chars(messages: &[Message]) -> usize {
    messages.iter().map(|m| m.content.chars().count()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::observation::TRUNCATION_MARKER;

    fn user_says(text: &str) -> Event {
        Event::action(Source::User, Action::message(text, false))
    }

    #[test]
    fn empty_history_renders_preamble_and_example() {
        let renderer = PromptRenderer::default();
        let messages = renderer.render(&History::new(), 0, 10);

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, MessageRole::System);
        assert_eq!(messages[1].role, MessageRole::User);
        // The example is the only user message, so it carries the reminder.
        assert!(messages[1].content.ends_with(&iteration_reminder(10)));
    }

    #[test]
    fn actions_render_with_markup_and_role() {
        let history = History::from_events([
            user_says("list files"),
            Event::action(Source::Agent, Action::run_command("ls", "Let me look.")),
            Event::action(
                Source::Agent,
                Action::run_ipython("print(1)", "Compute.", "from agentskills import *"),
            ),
            Event::action(Source::Agent, Action::browse("goto('x')", "Browse.")),
        ]);
        let messages = PromptRenderer::default().render(&history, 0, 5);

        assert_eq!(messages.len(), 6);
        assert_eq!(messages[2].role, MessageRole::User);
        assert!(messages[2].content.starts_with("list files"));
        assert_eq!(messages[3].role, MessageRole::Assistant);
        assert_eq!(
            messages[3].content,
            "Let me look.\n<execute_bash>\nls\n</execute_bash>"
        );
        assert_eq!(
            messages[4].content,
            "Compute.\n<execute_ipython>\nprint(1)\n</execute_ipython>"
        );
        assert_eq!(
            messages[5].content,
            "Browse.\n<execute_browse>\ngoto('x')\n</execute_browse>"
        );
    }

    #[test]
    fn command_output_gets_exit_annotation() {
        let history = History::from_events([Event::observation(Observation::CommandOutput {
            content: "file.txt".into(),
            command_id: 3,
            exit_code: 1,
        })]);
        let messages = PromptRenderer::default().render(&history, 2, 5);
        let last = messages.last().unwrap();

        assert_eq!(last.role, MessageRole::User);
        assert_eq!(
            last.content,
            format!(
                "OBSERVATION:\nfile.txt\n[Command 3 finished with exit code 1]{}",
                iteration_reminder(3)
            )
        );
    }

    #[test]
    fn ipython_output_is_redacted_then_truncated() {
        let renderer = PromptRenderer::default().with_observation_max_chars(40);
        let content = format!(
            "{}\n![image](data:image/png;base64,{})\n",
            "a".repeat(10),
            "Q".repeat(500)
        );
        let message = renderer
            .event_message(&Event::observation(Observation::IpythonOutput { content }))
            .unwrap();

        assert!(message.content.starts_with("OBSERVATION:\naaaaaaaaaa\n![image]"));
        assert!(message.content.contains(TRUNCATION_MARKER));
        assert!(!message.content.contains("QQQQ"));
    }

    #[test]
    fn command_output_is_truncated_before_annotation() {
        let renderer = PromptRenderer::default().with_observation_max_chars(20);
        let content = format!("{}{}", "a".repeat(30), "z".repeat(30));
        let message = renderer
            .event_message(&Event::observation(Observation::CommandOutput {
                content,
                command_id: 7,
                exit_code: 0,
            }))
            .unwrap();

        assert_eq!(
            message.content,
            format!(
                "OBSERVATION:\naaaaaaaaaa{TRUNCATION_MARKER}zzzzzzzzzz\n[Command 7 finished with exit code 0]"
            )
        );
    }

    #[test]
    fn browser_output_is_truncated() {
        let renderer = PromptRenderer::default().with_observation_max_chars(20);
        let content = format!("{}{}", "<p>".repeat(10), "</p>".repeat(10));
        let message = renderer
            .event_message(&Event::observation(Observation::BrowserOutput { content }))
            .unwrap();

        assert_eq!(
            message.content,
            format!("OBSERVATION:\n<p><p><p><{TRUNCATION_MARKER}p></p></p>")
        );
    }

    #[test]
    fn summary_and_finish_rendering() {
        let renderer = PromptRenderer::default();
        let summary = renderer
            .event_message(&Event::action(
                Source::Agent,
                Action::Summarize {
                    summary: "Installed flask.".into(),
                },
            ))
            .unwrap();
        assert_eq!(summary.role, MessageRole::Assistant);
        assert_eq!(summary.content, "Installed flask.");

        let observed = renderer
            .event_message(&Event::observation(Observation::Summary {
                content: "earlier work".into(),
            }))
            .unwrap();
        assert_eq!(observed.content, "OBSERVATION:\nearlier work");

        assert!(
            renderer
                .event_message(&Event::action(Source::Agent, Action::finish("done")))
                .is_none()
        );
    }

    #[test]
    fn reminder_goes_on_latest_user_message_only() {
        let history = History::from_events([
            user_says("first"),
            Event::action(Source::Agent, Action::message("ok", false)),
            user_says("second"),
            Event::action(Source::Agent, Action::message("sure", false)),
        ]);
        let messages = PromptRenderer::default().render(&history, 7, 10);

        assert_eq!(messages[2].content, "first");
        assert_eq!(
            messages[4].content,
            format!("second{}", iteration_reminder(3))
        );
        assert_eq!(messages[5].content, "sure");
    }

    #[test]
    fn exit_sentinel_suppresses_reminder() {
        let history = History::from_events([user_says("  /exit\n")]);
        let messages = PromptRenderer::default().render(&history, 0, 10);

        assert_eq!(messages.last().unwrap().content, "  /exit\n");
        assert!(is_exit_request(&messages));
    }

    #[test]
    fn rendering_does_not_touch_history() {
        let history = History::from_events([user_says("hi")]);
        let renderer = PromptRenderer::default();
        let first = renderer.render(&history, 1, 4);
        let second = renderer.render(&history, 1, 4);
        assert_eq!(first, second);
        assert_eq!(history.iter().next(), Some(&user_says("hi")));
    }

    #[test]
    fn overrun_budget_reports_negative_remaining() {
        let messages = PromptRenderer::default().render(&History::new(), 12, 10);
        assert!(messages[1].content.ends_with(&iteration_reminder(-2)));
        assert!(messages[1].content.contains("You have -2 turns left"));
    }

    #[test]
    fn github_toggle_reaches_system_message() {
        let without = PromptRenderer::new(false);
        assert!(!without.system_message().contains("GITHUB_TOKEN"));
        assert!(PromptRenderer::new(true).system_message().contains("GITHUB_TOKEN"));
    }

    #[test]
    fn total_chars_sums_bodies() {
        let messages = vec![Message::user("abc"), Message::assistant("dé")];
        assert_eq!(total_chars(&messages), 5);
    }
}
