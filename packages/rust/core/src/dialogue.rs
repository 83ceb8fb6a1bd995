//! The per-session dialogue state machine.
//!
//! [`transition`] is pure: it takes the current [`DialogueState`] and an
//! [`Event`], and returns the next state, the replies to send, and at most one
//! [`Action`] needing the backend. The [`Engine`](crate::Engine) performs the
//! action and feeds its outcome back in as another event.

use chrono::NaiveDate;
use tracing::debug;

use pilelog_shared::{
    AppConfig, Locale, PendingRecord, PileDrivingRecord, SubmissionResult, midnight_utc,
};

use crate::grouping::{GROUP_LABEL_DELIMITER, Group, compute_groups, find_group_by_label};
use crate::messages::Messages;
use crate::reply::Outgoing;

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Deployment-wide values the dialogue needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogueSettings {
    /// Menu size above which piles are grouped into ranges.
    pub max_groups: usize,
    pub locale: Locale,
    pub project_id: i64,
    pub pile_field_id: Option<i64>,
}

impl From<&AppConfig> for DialogueSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            max_groups: config.dialogue.max_groups,
            locale: config.dialogue.locale,
            project_id: config.project.id,
            pile_field_id: config.project.pile_field_id,
        }
    }
}

impl Default for DialogueSettings {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl DialogueSettings {
    pub fn messages(&self) -> Messages {
        Messages::new(self.locale)
    }
}

// ---------------------------------------------------------------------------
// States
// ---------------------------------------------------------------------------

/// Which prompt the session is waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Idle,
    SelectingPile,
    SelectingDate,
    EnteringElevation,
    EnteringOperator,
    EnteringNotes,
}

/// Dialogue state. Each variant carries exactly the answers collected so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DialogueState {
    #[default]
    Idle,
    SelectingPile(PileSelection),
    SelectingDate {
        pile_number: String,
    },
    EnteringElevation {
        pile_number: String,
        start_date: NaiveDate,
    },
    EnteringOperator {
        pile_number: String,
        start_date: NaiveDate,
        fact_pile_head: i64,
    },
    EnteringNotes {
        pile_number: String,
        start_date: NaiveDate,
        fact_pile_head: i64,
        recorded_by: Option<String>,
    },
}

impl DialogueState {
    pub fn step(&self) -> Step {
        match self {
            Self::Idle => Step::Idle,
            Self::SelectingPile(_) => Step::SelectingPile,
            Self::SelectingDate { .. } => Step::SelectingDate,
            Self::EnteringElevation { .. } => Step::EnteringElevation,
            Self::EnteringOperator { .. } => Step::EnteringOperator,
            Self::EnteringNotes { .. } => Step::EnteringNotes,
        }
    }

    /// The record as collected so far.
    pub fn pending_record(&self, settings: &DialogueSettings) -> PendingRecord {
        let mut record = PendingRecord {
            project_id: settings.project_id,
            pile_field_id: settings.pile_field_id,
            ..Default::default()
        };

        match self {
            Self::Idle | Self::SelectingPile(_) => {}
            Self::SelectingDate { pile_number } => {
                record.pile_number = Some(pile_number.clone());
            }
            Self::EnteringElevation {
                pile_number,
                start_date,
            } => {
                record.pile_number = Some(pile_number.clone());
                record.start_date = Some(*start_date);
            }
            Self::EnteringOperator {
                pile_number,
                start_date,
                fact_pile_head,
            } => {
                record.pile_number = Some(pile_number.clone());
                record.start_date = Some(*start_date);
                record.fact_pile_head = Some(*fact_pile_head);
            }
            Self::EnteringNotes {
                pile_number,
                start_date,
                fact_pile_head,
                recorded_by,
            } => {
                record.pile_number = Some(pile_number.clone());
                record.start_date = Some(*start_date);
                record.fact_pile_head = Some(*fact_pile_head);
                record.recorded_by = recorded_by.clone();
            }
        }

        record
    }

    /// Range menus shown so far; empty outside pile selection.
    pub fn navigation_history(&self) -> &[Vec<Group>] {
        match self {
            Self::SelectingPile(selection) => selection.history(),
            _ => &[],
        }
    }
}

/// Drill-down progress while choosing a pile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PileSelection {
    candidates: Vec<String>,
    history: Vec<Vec<Group>>,
    /// Piles selectable directly from the current menu.
    offered: Vec<String>,
    /// Whether the current menu lists piles rather than ranges.
    flat: bool,
}

impl PileSelection {
    fn new(candidates: Vec<String>) -> Self {
        Self {
            candidates,
            history: Vec::new(),
            offered: Vec::new(),
            flat: false,
        }
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    pub fn history(&self) -> &[Vec<Group>] {
        &self.history
    }

    pub fn offered(&self) -> &[String] {
        &self.offered
    }

    pub fn is_flat(&self) -> bool {
        self.flat
    }

    /// Build the menu for `subset`, recording range levels in the history.
    fn present(&mut self, subset: Vec<String>, settings: &DialogueSettings) -> Outgoing {
        let msgs = settings.messages();

        if subset.len() <= settings.max_groups {
            self.flat = true;
            self.offered = subset;
            return Outgoing::column(msgs.choose_pile(), self.offered.iter().cloned());
        }

        let groups = compute_groups(&subset, settings.max_groups);
        self.flat = false;
        self.offered = groups
            .iter()
            .filter(|group| group.is_singleton())
            .map(|group| group.first().to_string())
            .collect();
        let labels: Vec<String> = groups.iter().map(Group::button_label).collect();

        debug!(
            level = self.history.len() + 1,
            piles = subset.len(),
            groups = groups.len(),
            "showing pile ranges"
        );
        self.history.push(groups);

        Outgoing::column(msgs.choose_group(), labels)
    }

    fn accepts(&self, text: &str) -> bool {
        self.offered.iter().any(|pile| pile == text)
            || (!self.flat && self.candidates.iter().any(|pile| pile == text))
    }
}

// ---------------------------------------------------------------------------
// Events and actions
// ---------------------------------------------------------------------------

/// Slash commands understood by the bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    NewRecord,
    Skip,
}

impl Command {
    /// Parse the leading token of `text`, ignoring a `@botname` suffix.
    pub fn parse(text: &str) -> Option<Self> {
        let token = text.split_whitespace().next()?;
        let name = token.strip_prefix('/')?;
        let name = name.split('@').next().unwrap_or(name);

        match name {
            "start" => Some(Self::Start),
            "help" => Some(Self::Help),
            "newrecord" => Some(Self::NewRecord),
            "skip" => Some(Self::Skip),
            _ => None,
        }
    }
}

/// Input to the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Command(Command),
    Text(String),
    /// Outcome of [`Action::FetchPiles`]; the error is already rendered as text.
    PilesFetched(Result<Vec<String>, String>),
    /// Outcome of [`Action::Submit`].
    Submitted {
        record: PileDrivingRecord,
        result: SubmissionResult,
    },
}

impl Event {
    /// Classify operator text. `/skip` only counts as a command on optional steps.
    pub fn from_input(text: &str, step: Step) -> Self {
        let text = text.trim();
        match Command::parse(text) {
            Some(Command::Skip)
                if !matches!(step, Step::EnteringOperator | Step::EnteringNotes) =>
            {
                Self::Text(text.to_string())
            }
            Some(command) => Self::Command(command),
            None => Self::Text(text.to_string()),
        }
    }
}

/// Backend work requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    FetchPiles { project_id: i64 },
    Submit(PileDrivingRecord),
}

/// Result of one step of the machine.
#[derive(Debug)]
pub struct Transition {
    pub state: DialogueState,
    pub replies: Vec<Outgoing>,
    pub action: Option<Action>,
}

impl Transition {
    fn to(state: DialogueState, reply: Outgoing) -> Self {
        Self {
            state,
            replies: vec![reply],
            action: None,
        }
    }

    fn with(state: DialogueState, action: Action) -> Self {
        Self {
            state,
            replies: Vec::new(),
            action: Some(action),
        }
    }
}

// ---------------------------------------------------------------------------
// Transition function
// ---------------------------------------------------------------------------

/// Advance the dialogue by one event. `today` anchors the date choices.
pub fn transition(
    state: DialogueState,
    event: Event,
    settings: &DialogueSettings,
    today: NaiveDate,
) -> Transition {
    let msgs = settings.messages();

    match event {
        Event::Command(Command::Start) => Transition::to(state, Outgoing::text(msgs.welcome())),
        Event::Command(Command::Help) => Transition::to(state, Outgoing::text(msgs.help())),
        Event::Command(Command::NewRecord) => Transition::with(
            DialogueState::Idle,
            Action::FetchPiles {
                project_id: settings.project_id,
            },
        ),
        Event::Command(Command::Skip) => match state {
            DialogueState::EnteringOperator {
                pile_number,
                start_date,
                fact_pile_head,
            } => Transition::to(
                DialogueState::EnteringNotes {
                    pile_number,
                    start_date,
                    fact_pile_head,
                    recorded_by: None,
                },
                Outgoing::text(msgs.enter_notes()),
            ),
            DialogueState::EnteringNotes {
                pile_number,
                start_date,
                fact_pile_head,
                recorded_by,
            } => submit(
                settings,
                pile_number,
                start_date,
                fact_pile_head,
                recorded_by,
                None,
            ),
            other => on_text(other, "/skip".to_string(), settings, today),
        },
        Event::Text(text) => on_text(state, text, settings, today),
        Event::PilesFetched(Ok(piles)) if piles.is_empty() => {
            Transition::to(DialogueState::Idle, Outgoing::clearing(msgs.no_piles()))
        }
        Event::PilesFetched(Ok(piles)) => {
            let mut selection = PileSelection::new(piles.clone());
            let reply = selection.present(piles, settings);
            Transition::to(DialogueState::SelectingPile(selection), reply)
        }
        Event::PilesFetched(Err(error)) => Transition::to(
            DialogueState::Idle,
            Outgoing::clearing(msgs.piles_unavailable(&error)),
        ),
        Event::Submitted { record, result } => {
            let text = if result.success {
                msgs.submitted(
                    &record.pile_number,
                    record.start_date.date_naive(),
                    record.fact_pile_head,
                )
            } else {
                msgs.submit_failed(&result.server_message)
            };
            Transition::to(DialogueState::Idle, Outgoing::clearing(text))
        }
    }
}

fn on_text(
    state: DialogueState,
    text: String,
    settings: &DialogueSettings,
    today: NaiveDate,
) -> Transition {
    let msgs = settings.messages();

    match state {
        DialogueState::Idle => Transition::to(DialogueState::Idle, Outgoing::text(msgs.guidance())),

        DialogueState::SelectingPile(mut selection) => {
            if selection.accepts(&text) {
                return Transition::to(
                    DialogueState::SelectingDate { pile_number: text },
                    date_menu(settings),
                );
            }

            if text.contains(GROUP_LABEL_DELIMITER) {
                let members = find_group_by_label(selection.history(), &text)
                    .map(|group| group.members().to_vec());
                return match members {
                    Some(members) => {
                        let reply = selection.present(members, settings);
                        Transition::to(DialogueState::SelectingPile(selection), reply)
                    }
                    None => Transition::to(
                        DialogueState::SelectingPile(selection),
                        Outgoing::text(msgs.invalid_group()),
                    ),
                };
            }

            Transition::to(
                DialogueState::SelectingPile(selection),
                Outgoing::text(msgs.invalid_pile()),
            )
        }

        DialogueState::SelectingDate { pile_number } => {
            let chosen = if text == msgs.today() {
                Some(today)
            } else if text == msgs.yesterday() {
                today.pred_opt()
            } else {
                None
            };

            match chosen {
                Some(start_date) => Transition::to(
                    DialogueState::EnteringElevation {
                        pile_number,
                        start_date,
                    },
                    Outgoing::clearing(msgs.date_chosen(start_date)),
                ),
                None => Transition {
                    state: DialogueState::SelectingDate { pile_number },
                    replies: vec![Outgoing::text(msgs.invalid_date()), date_menu(settings)],
                    action: None,
                },
            }
        }

        DialogueState::EnteringElevation {
            pile_number,
            start_date,
        } => match text.trim().parse::<i64>() {
            Ok(fact_pile_head) => Transition::to(
                DialogueState::EnteringOperator {
                    pile_number,
                    start_date,
                    fact_pile_head,
                },
                Outgoing::text(msgs.enter_operator()),
            ),
            Err(_) => Transition::to(
                DialogueState::EnteringElevation {
                    pile_number,
                    start_date,
                },
                Outgoing::text(msgs.invalid_number()),
            ),
        },

        DialogueState::EnteringOperator {
            pile_number,
            start_date,
            fact_pile_head,
        } => Transition::to(
            DialogueState::EnteringNotes {
                pile_number,
                start_date,
                fact_pile_head,
                recorded_by: non_empty(text),
            },
            Outgoing::text(msgs.enter_notes()),
        ),

        DialogueState::EnteringNotes {
            pile_number,
            start_date,
            fact_pile_head,
            recorded_by,
        } => submit(
            settings,
            pile_number,
            start_date,
            fact_pile_head,
            recorded_by,
            non_empty(text),
        ),
    }
}

/// Finish the flow: the session returns to idle while the record is posted.
fn submit(
    settings: &DialogueSettings,
    pile_number: String,
    start_date: NaiveDate,
    fact_pile_head: i64,
    recorded_by: Option<String>,
    notes: Option<String>,
) -> Transition {
    let record = PileDrivingRecord {
        project_id: settings.project_id,
        pile_number,
        pile_field_id: settings.pile_field_id.unwrap_or(0),
        start_date: midnight_utc(start_date),
        fact_pile_head,
        recorded_by: recorded_by.unwrap_or_default(),
        notes,
    };
    Transition::with(DialogueState::Idle, Action::Submit(record))
}

fn date_menu(settings: &DialogueSettings) -> Outgoing {
    let msgs = settings.messages();
    Outgoing::menu(
        msgs.choose_date(),
        vec![vec![msgs.today().to_string(), msgs.yesterday().to_string()]],
    )
}

fn non_empty(text: String) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
