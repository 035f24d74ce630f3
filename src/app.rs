use crate::backend::TestCase;
use crate::registry::IngestionRegistry;
use crate::scripts::{ScriptState, ScriptStates, fallback_case_key};
use crate::session::Session;

const MAX_STATUS_LINES: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    KnowledgeBase,
    TestCases,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub kind: StatusKind,
    pub text: String,
}

/// All mutable state for one client instance. One `App` per session; the
/// whole view is redrawn from it after every mutation, so it is the only
/// source of truth the render loop may consult.
#[derive(Debug)]
pub struct App {
    pub running: bool,
    session: Session,
    page: Page,
    knowledge_input: String,
    knowledge_cursor: usize,
    query_input: String,
    query_cursor: usize,
    registry: IngestionRegistry,
    cases: Vec<TestCase>,
    scripts: ScriptStates,
    selected: usize,
    expanded: Option<String>,
    status: Vec<StatusLine>,
    busy: Option<String>,
}

impl Default for App {
    fn default() -> Self {
        Self::with_session(Session::new())
    }
}

impl App {
    pub fn with_session(session: Session) -> Self {
        Self {
            running: true,
            session,
            page: Page::KnowledgeBase,
            knowledge_input: String::new(),
            knowledge_cursor: 0,
            query_input: String::new(),
            query_cursor: 0,
            registry: IngestionRegistry::default(),
            cases: Vec::new(),
            scripts: ScriptStates::default(),
            selected: 0,
            expanded: None,
            status: Vec::new(),
            busy: None,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn page(&self) -> Page {
        self.page
    }

    pub fn registry(&self) -> &IngestionRegistry {
        &self.registry
    }

    pub fn scripts(&self) -> &ScriptStates {
        &self.scripts
    }

    pub fn cases(&self) -> &[TestCase] {
        &self.cases
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn status_lines(&self) -> &[StatusLine] {
        &self.status
    }

    pub fn busy(&self) -> Option<&str> {
        self.busy.as_deref()
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    pub fn switch_page(&mut self) {
        self.page = match self.page {
            Page::KnowledgeBase => Page::TestCases,
            Page::TestCases => Page::KnowledgeBase,
        };
    }

    // --- text input -------------------------------------------------------

    pub fn knowledge_input(&self) -> &str {
        &self.knowledge_input
    }

    pub fn query_input(&self) -> &str {
        &self.query_input
    }

    pub fn input_cursor(&self) -> usize {
        match self.page {
            Page::KnowledgeBase => self.knowledge_cursor,
            Page::TestCases => self.query_cursor,
        }
    }

    fn active_input(&mut self) -> (&mut String, &mut usize) {
        match self.page {
            Page::KnowledgeBase => (&mut self.knowledge_input, &mut self.knowledge_cursor),
            Page::TestCases => (&mut self.query_input, &mut self.query_cursor),
        }
    }

    pub fn input_char(&mut self, c: char) {
        let (input, cursor) = self.active_input();
        let byte_index = char_to_byte_index(input, *cursor);
        input.insert(byte_index, c);
        *cursor += 1;
    }

    pub fn backspace(&mut self) {
        let (input, cursor) = self.active_input();
        if *cursor == 0 {
            return;
        }
        let byte_index = char_to_byte_index(input, *cursor - 1);
        input.remove(byte_index);
        *cursor -= 1;
    }

    pub fn cursor_left(&mut self) {
        let (_, cursor) = self.active_input();
        *cursor = cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        let (input, cursor) = self.active_input();
        let len = input.chars().count();
        *cursor = (*cursor + 1).min(len);
    }

    // --- status log -------------------------------------------------------

    pub fn push_status(&mut self, kind: StatusKind, text: impl Into<String>) {
        self.status.push(StatusLine {
            kind,
            text: text.into(),
        });
        if self.status.len() > MAX_STATUS_LINES {
            let overflow = self.status.len() - MAX_STATUS_LINES;
            self.status.drain(..overflow);
        }
    }

    pub fn push_info(&mut self, text: impl Into<String>) {
        self.push_status(StatusKind::Info, text);
    }

    pub fn push_success(&mut self, text: impl Into<String>) {
        self.push_status(StatusKind::Success, text);
    }

    pub fn push_warning(&mut self, text: impl Into<String>) {
        self.push_status(StatusKind::Warning, text);
    }

    pub fn push_error(&mut self, text: impl Into<String>) {
        self.push_status(StatusKind::Error, text);
    }

    pub fn set_busy(&mut self, text: impl Into<String>) {
        self.busy = Some(text.into());
    }

    pub fn clear_busy(&mut self) {
        self.busy = None;
    }

    // --- ingestion --------------------------------------------------------

    pub fn record_ingested<I, S>(&mut self, filenames: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.registry.record_success(filenames);
    }

    // --- test case collection --------------------------------------------

    /// Explicitly discards the displayed collection and every script state
    /// before a new generation request goes out, so stale per-item state can
    /// never leak into the next collection.
    pub fn begin_new_collection(&mut self) {
        self.cases.clear();
        self.scripts.reset_for_new_collection();
        self.expanded = None;
        self.selected = 0;
    }

    pub fn install_test_cases(&mut self, cases: Vec<TestCase>) {
        self.cases = cases;
        self.selected = 0;
    }

    /// Addressing key for the case at `index`: the backend id when present,
    /// otherwise a fallback derived from the index and the collection
    /// generation.
    pub fn case_key(&self, index: usize) -> Option<String> {
        let case = self.cases.get(index)?;
        Some(match case.test_id.as_deref() {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => fallback_case_key(self.scripts.generation(), index),
        })
    }

    pub fn case_for_key(&self, key: &str) -> Option<&TestCase> {
        (0..self.cases.len())
            .find(|&index| self.case_key(index).as_deref() == Some(key))
            .and_then(|index| self.cases.get(index))
    }

    pub fn selected_case(&self) -> Option<&TestCase> {
        self.cases.get(self.selected)
    }

    pub fn selected_key(&self) -> Option<String> {
        self.case_key(self.selected)
    }

    pub fn move_selection_up(&mut self) {
        if self.page == Page::TestCases {
            self.selected = self.selected.saturating_sub(1);
        }
    }

    pub fn move_selection_down(&mut self) {
        if self.page == Page::TestCases && !self.cases.is_empty() {
            self.selected = (self.selected + 1).min(self.cases.len() - 1);
        }
    }

    // --- expansion hint ---------------------------------------------------

    pub fn expanded_key(&self) -> Option<&str> {
        self.expanded.as_deref()
    }

    pub fn toggle_expanded(&mut self) {
        let Some(key) = self.selected_key() else {
            return;
        };
        if self.expanded.as_deref() == Some(key.as_str()) {
            self.expanded = None;
        } else {
            self.expanded = Some(key);
        }
    }

    // --- script generation ------------------------------------------------

    /// Intent half of script generation: transitions the selected case to
    /// `InFlight` and points the expansion hint at it. The network call is
    /// NOT issued here; the render loop claims the pending dispatch after the
    /// next draw. Triggering again while in flight changes nothing.
    pub fn request_script_for_selected(&mut self) {
        if self.page != Page::TestCases {
            return;
        }
        let Some(key) = self.selected_key() else {
            self.push_warning("No test case selected.");
            return;
        };
        if self.scripts.request(&key) {
            self.expanded = Some(key);
        }
    }

    /// Single-shot claim of the pending dispatch, handed to the loop.
    pub fn take_pending_script(&mut self) -> Option<String> {
        self.scripts.take_pending()
    }

    /// Effect half: stores the outcome. The expansion hint stays on the item
    /// so the result is visible immediately.
    pub fn resolve_script(&mut self, key: &str, outcome: Result<String, String>) {
        self.scripts.resolve(key, outcome);
    }

    pub fn script_state_for(&self, index: usize) -> &ScriptState {
        match self.case_key(index) {
            Some(key) => self.scripts.state(&key),
            None => &ScriptState::NotRequested,
        }
    }
}

fn char_to_byte_index(text: &str, char_index: usize) -> usize {
    text.char_indices()
        .nth(char_index)
        .map(|(byte_index, _)| byte_index)
        .unwrap_or(text.len())
}

#[cfg(test)]
#[path = "../tests/unit/app_tests.rs"]
mod tests;
