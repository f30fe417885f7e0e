//! Full-screen adaptive test with live proctoring.
//!
//! Terminal focus, paste and copy events are forwarded to a [`SignalHub`]
//! so the proctor records the same violations a browser tab would: losing
//! focus counts as a tab switch plus a blur, bracketed paste and `Ctrl+V`
//! as paste attempts, `Ctrl+C` as a copy attempt, and the first `Esc` as
//! leaving fullscreen.

use anyhow::Result;
use chrono::{DateTime, Utc};
use ratatui::{
    DefaultTerminal, Frame,
    crossterm::{
        event::{
            self, DisableBracketedPaste, DisableFocusChange, EnableBracketedPaste,
            EnableFocusChange, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers,
        },
        execute,
    },
    layout::{Constraint, Flex, Layout, Margin, Position, Rect},
    style::{Style, Stylize},
    symbols::scrollbar,
    text::{Line, Span},
    widgets::{
        Block, Clear, List, ListDirection, ListItem, Padding, Paragraph, Scrollbar,
        ScrollbarOrientation, Wrap,
    },
};
use skillatics::api::ApiClient;
use skillatics::proctor::{NoCamera, ProctorCollector, ProctorSignal, SignalHub, ViolationSummary};
use skillatics::test_session::{
    SectionFilter, SessionError, SessionResult, TestOutcome, TestPhase, TestSessionFlow,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::commands::{TestCommand, parse_test_command};
use crate::render::option_label;

mod widgets;

use widgets::{ScrollableList, UserInput};

const HELP: &str = "\
a, b, c ... or 1, 2, 3 ...
        Select an option.
answer <option>
        Select an option and submit it.
submit
        Submit the selected option.
status
        Record the proctoring counts in the history.
quit
        Abandon the test.

Focus changes, paste, Ctrl+C and Esc are recorded as proctoring violations.
";
const MAX_LOG_RECORDS: usize = 1024;
const POLL_TIMEOUT: Duration = Duration::from_millis(100);

/// Environment signals a terminal event stands for
fn proctor_signals(event: &Event) -> Vec<ProctorSignal> {
    match event {
        Event::FocusLost => vec![
            ProctorSignal::VisibilityChanged { hidden: true },
            ProctorSignal::WindowBlur,
        ],
        Event::FocusGained => vec![ProctorSignal::VisibilityChanged { hidden: false }],
        Event::Paste(_) => vec![ProctorSignal::Paste],
        Event::Key(KeyEvent {
            code: KeyCode::Char(c),
            modifiers,
            kind: KeyEventKind::Press,
            ..
        }) if modifiers.contains(KeyModifiers::CONTROL) => match c.to_ascii_lowercase() {
            'c' => vec![ProctorSignal::Copy],
            'v' => vec![ProctorSignal::Paste],
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

#[derive(Clone)]
enum RecordKind {
    Alert,
    Error,
    Test,
    You,
}

/// A timestamped history line with an importance label.
#[derive(Clone)]
struct Record {
    datetime: DateTime<Utc>,
    kind: RecordKind,
    content: String,
}

impl Record {
    fn new(kind: RecordKind, content: String) -> Self {
        Self {
            datetime: Utc::now(),
            kind,
            content,
        }
    }
}

impl From<Record> for ListItem<'_> {
    fn from(val: Record) -> Self {
        let repr = match val.kind {
            RecordKind::Alert => "ALERT".light_magenta(),
            RecordKind::Error => "ERROR".light_red(),
            RecordKind::Test => "TEST".light_yellow(),
            RecordKind::You => "YOU".light_green(),
        };

        let msg = vec![
            format!("[{} ", val.datetime.format("%H:%M:%S")).into(),
            Span::styled(format!("{repr:5}"), repr.style),
            format!("]: {}", val.content).into(),
        ];

        ListItem::new(Line::from(msg))
    }
}

/// Results of the background start and submit calls
enum FlowUpdate {
    Started(SessionResult<TestPhase>),
    Submitted(SessionResult<TestPhase>),
}

/// What the test ended with, for printing after the terminal is restored
#[derive(Debug, Clone)]
pub struct TestSummary {
    pub outcome: Option<TestOutcome>,
    pub violations: ViolationSummary,
}

/// TUI App state
pub struct TestTui {
    section: SectionFilter,
    flow: Arc<TestSessionFlow<ApiClient>>,
    hub: SignalHub,
    proctor: ProctorCollector,
    /// Last phase read from the flow
    phase: TestPhase,
    /// Whether to display the help menu window
    show_help_menu: bool,
    help_handle: ScrollableList,
    /// History of recorded messages
    log_handle: ScrollableList,
    user_input: UserInput,
    /// Violations already copied into the history
    seen_violations: usize,
    /// Set by the first `Esc` during a question; the second one quits
    exit_armed: bool,
}

impl TestTui {
    pub fn new(api: ApiClient, section: SectionFilter) -> Self {
        let mut help_handle = ScrollableList::new(MAX_LOG_RECORDS);
        help_handle.push("".into());
        for line in HELP.lines() {
            help_handle.push(line.into());
        }
        help_handle.push("".into());
        help_handle.jump_to_first();

        Self {
            section,
            flow: Arc::new(TestSessionFlow::new(api)),
            hub: SignalHub::default(),
            proctor: ProctorCollector::new(Arc::new(NoCamera)),
            phase: TestPhase::Idle,
            show_help_menu: false,
            help_handle,
            log_handle: ScrollableList::new(MAX_LOG_RECORDS),
            user_input: UserInput::new(),
            seen_violations: 0,
            exit_armed: false,
        }
    }

    fn add_log(&mut self, kind: RecordKind, content: impl Into<String>) {
        let record = Record::new(kind, content.into());
        self.log_handle.push(record.into());
    }

    fn is_answering(&self) -> bool {
        matches!(self.phase, TestPhase::Active(_))
    }

    // === Flow ===

    fn spawn_start(&self, tx: &mpsc::UnboundedSender<FlowUpdate>) {
        let flow = self.flow.clone();
        let tx = tx.clone();
        let section = self.section;
        tokio::spawn(async move {
            let _ = tx.send(FlowUpdate::Started(flow.start(section).await));
        });
    }

    fn spawn_submit(&mut self, tx: &mpsc::UnboundedSender<FlowUpdate>) {
        if self.flow.is_busy() {
            self.add_log(RecordKind::Error, SessionError::RequestInFlight.user_message());
            return;
        }
        let flow = self.flow.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(FlowUpdate::Submitted(flow.submit().await));
        });
    }

    fn apply(&mut self, update: FlowUpdate) {
        let result = match update {
            FlowUpdate::Started(result) => result,
            FlowUpdate::Submitted(result) => result,
        };
        self.phase = self.flow.phase();

        match result {
            Ok(TestPhase::Active(active)) => {
                self.add_log(
                    RecordKind::Test,
                    format!("Question {} ready", active.answered + 1),
                );
            }
            Ok(TestPhase::Complete(outcome)) => {
                self.add_log(
                    RecordKind::Test,
                    format!(
                        "Test complete: {} of {} correct, score {:.2}%",
                        outcome.correct_questions, outcome.total_questions, outcome.score
                    ),
                );
                self.collect_violations();
                self.proctor.deactivate();
                self.add_log(RecordKind::Test, "Proctoring stopped. Press Enter to leave");
            }
            Ok(_) | Err(SessionError::Stale) => {}
            Err(e) => self.add_log(RecordKind::Error, e.user_message()),
        }
    }

    /// Copy newly recorded violations into the history
    fn collect_violations(&mut self) {
        self.proctor.pump();
        let fresh: Vec<String> = self.proctor.violations()[self.seen_violations..]
            .iter()
            .map(|v| v.description.clone())
            .collect();
        self.seen_violations += fresh.len();
        for description in fresh {
            self.add_log(RecordKind::Alert, description);
        }
    }

    // === Input ===

    fn select(&mut self, index: usize) -> bool {
        match self.flow.select_index(index) {
            Ok(()) => {
                self.phase = self.flow.phase();
                if let TestPhase::Active(active) = &self.phase
                    && let Some(option) = active.selected.clone()
                {
                    self.add_log(
                        RecordKind::You,
                        format!("Selected {}) {option}", option_label(index)),
                    );
                }
                true
            }
            Err(e) => {
                self.add_log(RecordKind::Error, e.user_message());
                false
            }
        }
    }

    /// Handle one entered line; true when the user is done
    fn handle_command(&mut self, input: &str, tx: &mpsc::UnboundedSender<FlowUpdate>) -> bool {
        if input.trim().is_empty() {
            return matches!(self.phase, TestPhase::Complete(_) | TestPhase::Error(_));
        }

        match parse_test_command(input) {
            Ok(TestCommand::Choose(index)) => {
                self.select(index);
            }
            Ok(TestCommand::Answer(index)) => {
                if self.select(index) {
                    self.spawn_submit(tx);
                }
            }
            Ok(TestCommand::Submit) => self.spawn_submit(tx),
            Ok(TestCommand::Status) => {
                self.collect_violations();
                let summary = self.proctor.counts();
                self.add_log(
                    RecordKind::Test,
                    format!(
                        "{} violation(s): tab switches {}, fullscreen exits {}, copy {}, paste {}",
                        summary.total_violations,
                        summary.tab_switches,
                        summary.fullscreen_exits,
                        summary.copy_attempts,
                        summary.paste_attempts
                    ),
                );
            }
            Ok(TestCommand::Help) => self.show_help_menu = !self.show_help_menu,
            Ok(TestCommand::Quit) => return true,
            Err(e) => self.add_log(RecordKind::Error, e.to_string()),
        }
        false
    }

    /// Handle one terminal event; true when the user is done
    fn handle_event(&mut self, event: Event, tx: &mpsc::UnboundedSender<FlowUpdate>) -> bool {
        let Event::Key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            ..
        }) = event
        else {
            return false;
        };

        match modifiers {
            KeyModifiers::CONTROL => match code {
                KeyCode::Home => self.log_handle.jump_to_first(),
                KeyCode::End => self.log_handle.jump_to_last(),
                KeyCode::Char('q') => return true,
                _ => {}
            },
            KeyModifiers::NONE | KeyModifiers::SHIFT => match code {
                KeyCode::Enter => {
                    self.exit_armed = false;
                    let user_input = self.user_input.submit();
                    return self.handle_command(&user_input, tx);
                }
                KeyCode::Char(to_insert) => self.user_input.input(to_insert),
                KeyCode::Backspace => self.user_input.backspace(),
                KeyCode::Delete => self.user_input.delete(),
                KeyCode::Left => self.user_input.move_left(),
                KeyCode::Right => self.user_input.move_right(),
                KeyCode::Up => {
                    if self.show_help_menu {
                        self.help_handle.move_up();
                    } else {
                        self.log_handle.move_up();
                    }
                }
                KeyCode::Down => {
                    if self.show_help_menu {
                        self.help_handle.move_down();
                    } else {
                        self.log_handle.move_down();
                    }
                }
                KeyCode::Home => self.user_input.jump_to_first(),
                KeyCode::End => self.user_input.jump_to_last(),
                KeyCode::Tab => self.show_help_menu = !self.show_help_menu,
                KeyCode::Esc => {
                    if self.show_help_menu {
                        self.show_help_menu = false;
                    } else if self.exit_armed || !self.is_answering() {
                        return true;
                    } else {
                        self.hub
                            .emit(ProctorSignal::FullscreenChanged { fullscreen: false });
                        self.exit_armed = true;
                        self.add_log(
                            RecordKind::Alert,
                            "Left fullscreen. Press Esc again to abandon the test",
                        );
                    }
                }
                _ => {}
            },
            _ => {}
        }
        false
    }

    // === Drawing ===

    /// Render the question, outcome or status text
    fn draw_question(&self, frame: &mut Frame, area: Rect) {
        let block = Block::bordered().padding(Padding::horizontal(1));

        let (block, lines): (Block, Vec<Line>) = match &self.phase {
            TestPhase::Idle | TestPhase::Loading => (
                block.title(" question  "),
                vec![Line::from("Loading question...".italic())],
            ),
            TestPhase::Active(active) => {
                let question = &active.question;
                let mut lines = vec![Line::from(question.text.clone().bold()), Line::from("")];
                for (i, option) in question.options.iter().enumerate() {
                    let selected = active.selected.as_deref() == Some(option.as_str());
                    let text = format!("{} {}) {option}", if selected { '>' } else { ' ' }, option_label(i));
                    lines.push(if selected {
                        Line::from(text.bold().light_green())
                    } else {
                        Line::from(text)
                    });
                }

                let mut footer = String::new();
                if let Some(difficulty) = active.difficulty.or(question.difficulty) {
                    footer.push_str(&format!(" difficulty {difficulty} "));
                }
                if let Some(topic) = &question.topic {
                    footer.push_str(&format!(" {topic} "));
                }
                (
                    block
                        .title(format!(" question {}  ", active.answered + 1))
                        .title_bottom(footer),
                    lines,
                )
            }
            TestPhase::Complete(outcome) => (
                block.title(" result  "),
                vec![
                    Line::from("Test complete".bold()),
                    Line::from(""),
                    Line::from(format!("Score: {:.2}%", outcome.score)),
                    Line::from(format!(
                        "Correct: {} of {}",
                        outcome.correct_questions, outcome.total_questions
                    )),
                    Line::from(""),
                    Line::from("Press Enter to leave".italic()),
                ],
            ),
            TestPhase::Error(message) => (
                block.title(" question  "),
                vec![
                    Line::from(message.clone().light_red()),
                    Line::from(""),
                    Line::from("Press Enter to leave".italic()),
                ],
            ),
        };

        let question = Paragraph::new(lines).wrap(Wrap { trim: false }).block(block);
        frame.render_widget(question, area);
    }

    /// Render the proctoring counters
    fn draw_proctor(&self, frame: &mut Frame, area: Rect) {
        let summary = self.proctor.counts();
        let status = if self.proctor.is_active() {
            "● recording".green()
        } else {
            "○ stopped".dark_gray()
        };
        let camera = if self.proctor.has_camera() {
            "on".green()
        } else {
            "unavailable".yellow()
        };

        let count = |label: &'static str, n: usize| {
            let value = if n > 0 {
                n.to_string().light_red()
            } else {
                n.to_string().into()
            };
            Line::from(vec![format!("{label:<16}").into(), value])
        };

        let lines = vec![
            Line::from(status),
            Line::from(vec!["camera          ".into(), camera]),
            Line::from(""),
            count("tab switches", summary.tab_switches),
            count("fullscreen exits", summary.fullscreen_exits),
            count("copy attempts", summary.copy_attempts),
            count("paste attempts", summary.paste_attempts),
            count("total", summary.total_violations),
        ];

        let proctor = Paragraph::new(lines).block(
            Block::bordered()
                .padding(Padding::horizontal(1))
                .title(" proctoring  "),
        );
        frame.render_widget(proctor, area);
    }

    /// Render the log/history window with scrollbar
    fn draw_log(&mut self, frame: &mut Frame, area: Rect) {
        let log_records = self.log_handle.list_items.clone();
        let log_records = List::new(log_records)
            .direction(ListDirection::BottomToTop)
            .block(Block::bordered().title(" history  "));
        frame.render_stateful_widget(log_records, area, &mut self.log_handle.list_state);

        frame.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .symbols(scrollbar::VERTICAL)
                .begin_symbol(None)
                .end_symbol(None),
            area.inner(Margin {
                vertical: 1,
                horizontal: 1,
            }),
            &mut self.log_handle.scroll_state,
        );
    }

    fn draw_user_input(&self, frame: &mut Frame, area: Rect) {
        let user_input = Paragraph::new(self.user_input.value.as_str())
            .style(Style::default())
            .block(Block::bordered().title(format!(" {} test  ", self.section).light_green()));
        frame.render_widget(user_input, area);
        frame.set_cursor_position(Position::new(
            area.x + self.user_input.char_idx as u16 + 1,
            area.y + 1,
        ));
    }

    fn draw_help_bar(&self, frame: &mut Frame, area: Rect) {
        let phase = match &self.phase {
            TestPhase::Active(_) if self.flow.is_busy() => "● Submitting".yellow(),
            TestPhase::Active(_) => "● Answering".green(),
            TestPhase::Complete(_) => "● Complete".light_blue(),
            TestPhase::Error(_) => "● Error".red(),
            TestPhase::Idle | TestPhase::Loading => "● Loading".yellow(),
        };

        let help_message = vec![
            phase,
            " | press ".into(),
            "Tab".bold().white(),
            " for help, ".into(),
            "Enter".bold().white(),
            " to send an answer, ".into(),
            "Ctrl+Q".bold().white(),
            " to quit".into(),
        ];
        frame.render_widget(Paragraph::new(Line::from(help_message)), area);
    }

    fn draw_help_menu(&mut self, frame: &mut Frame) {
        let vertical = Layout::vertical([Constraint::Max(18)]).flex(Flex::Center);
        let horizontal = Layout::horizontal([Constraint::Max(84)]).flex(Flex::Center);
        let [help_menu_area] = vertical.areas(frame.area());
        let [help_menu_area] = horizontal.areas(help_menu_area);
        frame.render_widget(Clear, help_menu_area);

        let help_items = self.help_handle.list_items.clone();
        let help_items = List::new(help_items)
            .direction(ListDirection::BottomToTop)
            .block(Block::bordered().title(" commands  "));
        frame.render_stateful_widget(help_items, help_menu_area, &mut self.help_handle.list_state);

        frame.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .symbols(scrollbar::VERTICAL)
                .begin_symbol(None)
                .end_symbol(None),
            help_menu_area.inner(Margin {
                vertical: 1,
                horizontal: 1,
            }),
            &mut self.help_handle.scroll_state,
        );
    }

    fn draw(&mut self, frame: &mut Frame) {
        let window = Layout::vertical([
            Constraint::Min(6),    // Question + history
            Constraint::Length(3), // User input area
            Constraint::Length(1), // Help bar
        ]);
        let [top_area, user_input_area, help_area] = window.areas(frame.area());

        let [view_area, log_area] =
            Layout::vertical([Constraint::Percentage(60), Constraint::Percentage(40)])
                .areas(top_area);
        let [question_area, proctor_area] =
            Layout::horizontal([Constraint::Percentage(70), Constraint::Percentage(30)])
                .areas(view_area);

        self.draw_question(frame, question_area);
        self.draw_proctor(frame, proctor_area);
        self.draw_log(frame, log_area);
        self.draw_user_input(frame, user_input_area);
        self.draw_help_bar(frame, help_area);

        if self.show_help_menu {
            self.draw_help_menu(frame);
        }
    }

    // === Main loop ===

    async fn event_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        let (tx, mut rx) = mpsc::unbounded_channel::<FlowUpdate>();

        self.proctor.activate(&self.hub).await;
        self.phase = TestPhase::Loading;
        self.add_log(RecordKind::Test, format!("Starting {} test", self.section));
        self.spawn_start(&tx);

        loop {
            terminal.draw(|frame| self.draw(frame))?;

            if event::poll(POLL_TIMEOUT)? {
                let event = event::read()?;
                for signal in proctor_signals(&event) {
                    self.hub.emit(signal);
                }
                if self.handle_event(event, &tx) {
                    break;
                }
            }

            while let Ok(update) = rx.try_recv() {
                self.apply(update);
            }
            self.collect_violations();
        }

        if !matches!(self.phase, TestPhase::Complete(_)) {
            self.flow.reset();
        }
        Ok(())
    }

    /// Run the test until it completes or the user leaves.
    ///
    /// The caller owns terminal init and restore.
    pub async fn run(mut self, mut terminal: DefaultTerminal) -> Result<TestSummary> {
        execute!(std::io::stdout(), EnableFocusChange, EnableBracketedPaste)?;
        let result = self.event_loop(&mut terminal).await;
        if let Err(e) = execute!(std::io::stdout(), DisableBracketedPaste, DisableFocusChange) {
            log::warn!("Failed to restore terminal modes: {e}");
        }

        self.proctor.pump();
        let violations = self.proctor.summary();
        self.proctor.deactivate();
        result?;

        let outcome = match self.phase {
            TestPhase::Complete(outcome) => Some(outcome),
            _ => None,
        };
        Ok(TestSummary {
            outcome,
            violations,
        })
    }
}
