//! Presentational collaborators, without rendering.
//!
//! These hold only transient UI state (a draft title, edit mode, the query
//! controls) and forward intents to the store. None of them talks to the
//! network.

use crate::query::{SortDirection, SortField, ViewQuery};
use crate::state::TodoState;
use crate::types::{Todo, TodoDraft};

/// What the list should show for the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListRender<'a> {
    Loading,
    Empty,
    Rows(&'a [Todo]),
}

pub struct ListView;

impl ListView {
    pub fn render(state: &TodoState) -> ListRender<'_> {
        if state.is_loading() {
            ListRender::Loading
        } else if state.todos().is_empty() {
            ListRender::Empty
        } else {
            ListRender::Rows(state.todos())
        }
    }
}

/// Per-row display/edit state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemView {
    todo: Todo,
    editing: bool,
    working_title: String,
}

impl ItemView {
    pub fn new(todo: Todo) -> Self {
        Self {
            working_title: todo.title.clone(),
            todo,
            editing: false,
        }
    }

    pub fn todo(&self) -> &Todo {
        &self.todo
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn working_title(&self) -> &str {
        &self.working_title
    }

    /// Title click.
    pub fn begin_edit(&mut self) {
        self.editing = true;
    }

    pub fn set_working_title(&mut self, title: impl Into<String>) {
        self.working_title = title.into();
    }

    /// Throw the draft away and go back to display mode.
    pub fn cancel(&mut self) {
        self.working_title = self.todo.title.clone();
        self.editing = false;
    }

    /// Leave edit mode and hand back the edited todo for the store's update.
    /// Outside edit mode this does nothing.
    pub fn commit(&mut self) -> Option<Todo> {
        if !self.editing {
            return None;
        }
        self.editing = false;
        Some(Todo {
            title: self.working_title.clone(),
            ..self.todo.clone()
        })
    }

    /// The row's todo changed in the store (e.g. a confirmed update or a
    /// rollback); the working title follows it.
    pub fn sync_from(&mut self, todo: &Todo) {
        if &self.todo != todo {
            self.todo = todo.clone();
            self.working_title = todo.title.clone();
        }
    }
}

/// The "add todo" form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateForm {
    draft: String,
}

impl CreateForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, title: impl Into<String>) {
        self.draft = title.into();
    }

    /// Submission is disabled for a blank draft and while a save is running.
    pub fn can_submit(&self, state: &TodoState) -> bool {
        !self.draft.trim().is_empty() && !state.is_saving()
    }

    pub fn submit(&mut self, state: &TodoState) -> Option<TodoDraft> {
        if !self.can_submit(state) {
            return None;
        }
        let title = std::mem::take(&mut self.draft);
        Some(TodoDraft::new(title))
    }
}

/// Sort and search controls. Every setter reports whether the query
/// changed, which is the signal to fetch again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryForm {
    query: ViewQuery,
}

impl QueryForm {
    pub fn new(query: ViewQuery) -> Self {
        Self { query }
    }

    pub fn query(&self) -> &ViewQuery {
        &self.query
    }

    pub fn set_sort_field(&mut self, field: SortField) -> bool {
        replace_if_changed(&mut self.query.sort_field, field)
    }

    pub fn set_sort_direction(&mut self, direction: SortDirection) -> bool {
        replace_if_changed(&mut self.query.sort_direction, direction)
    }

    pub fn set_query_string(&mut self, text: impl Into<String>) -> bool {
        replace_if_changed(&mut self.query.query_string, text.into())
    }

    /// Empty the search box.
    pub fn clear_search(&mut self) -> bool {
        self.set_query_string(String::new())
    }
}

fn replace_if_changed<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Action;

    fn todo(title: &str) -> Todo {
        Todo {
            id: "rec1".to_string(),
            title: title.to_string(),
            is_completed: false,
            created_time: None,
        }
    }

    #[test]
    fn list_render_modes() {
        let mut state = TodoState::new();
        assert_eq!(ListView::render(&state), ListRender::Empty);
        state.apply(Action::FetchStart { seq: 1 });
        assert_eq!(ListView::render(&state), ListRender::Loading);
        state.apply(Action::FetchSuccess {
            seq: 1,
            todos: vec![todo("A")],
        });
        assert!(matches!(ListView::render(&state), ListRender::Rows(rows) if rows.len() == 1));
    }

    #[test]
    fn cancel_discards_draft() {
        let mut item = ItemView::new(todo("Original"));
        item.begin_edit();
        item.set_working_title("Changed");
        item.cancel();
        assert!(!item.is_editing());
        assert_eq!(item.working_title(), "Original");
    }

    #[test]
    fn commit_yields_edited_todo() {
        let mut item = ItemView::new(todo("Original"));
        assert!(item.commit().is_none());
        item.begin_edit();
        item.set_working_title("Changed");
        let edited = item.commit().unwrap();
        assert_eq!(edited.title, "Changed");
        assert_eq!(edited.id, "rec1");
        assert!(!item.is_editing());
    }

    #[test]
    fn sync_resets_working_title() {
        let mut item = ItemView::new(todo("Original"));
        item.set_working_title("stale");
        item.sync_from(&todo("Server"));
        assert_eq!(item.working_title(), "Server");
    }

    #[test]
    fn create_form_gates_blank_and_in_flight() {
        let mut state = TodoState::new();
        let mut form = CreateForm::new();
        form.set_draft("   ");
        assert!(!form.can_submit(&state));
        form.set_draft("Buy milk");
        state.apply(Action::CreateStart);
        assert!(form.submit(&state).is_none());
        state.apply(Action::CreateFailure("x".to_string()));
        let draft = form.submit(&state).unwrap();
        assert_eq!(draft, TodoDraft::new("Buy milk"));
        assert_eq!(form.draft(), "");
    }

    #[test]
    fn query_form_reports_changes_only() {
        let mut form = QueryForm::default();
        assert!(!form.set_sort_field(SortField::CreatedTime));
        assert!(form.set_sort_field(SortField::Title));
        assert!(form.set_sort_direction(SortDirection::Asc));
        assert!(form.set_query_string("milk"));
        assert!(!form.set_query_string("milk"));
        assert!(form.clear_search());
        assert_eq!(form.query().sort_field, SortField::Title);
    }
}
